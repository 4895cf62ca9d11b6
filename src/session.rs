//! 日志会话
//!
//! `Session` 持有当前使用的后端和配置。应用可以自行创建并注入 `Session`，
//! 也可以使用 `global` 模块提供的进程级会话。

use crate::backend::{Backend, DefaultBackend};
use crate::config::{Config, ConfigOption};
use crate::context::Context;
use crate::error::{LoggingError, Result};
use crate::keys::Keys;
use crate::level::Level;
use crate::logger::Logger;
use std::sync::{Arc, Mutex, MutexGuard};

/// 创建新后端的工厂
pub type BackendFactory = Arc<dyn Fn() -> Arc<dyn Backend> + Send + Sync>;

struct SessionState {
    backend: Option<Arc<dyn Backend>>,
    config: Arc<Config>,
    ready: bool,
}

/// 日志会话
///
/// 后端和配置在一次加锁内发布：`init` 成功返回后，任何线程创建 logger
/// 时看到的都是已经完整初始化的后端。
pub struct Session {
    state: Mutex<SessionState>,
    factory: BackendFactory,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// 使用 `DefaultBackend` 的会话
    pub fn new() -> Self {
        Self::with_backend_factory(Arc::new(|| {
            Arc::new(DefaultBackend::new()) as Arc<dyn Backend>
        }))
    }

    /// 使用自定义后端工厂的会话，每次 `init` 都会创建新的后端
    pub fn with_backend_factory(factory: BackendFactory) -> Self {
        Self {
            state: Mutex::new(SessionState {
                backend: None,
                config: Arc::new(Config::default()),
                ready: false,
            }),
            factory,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// 应用配置选项并初始化新的后端
    pub fn init(&self, options: impl IntoIterator<Item = ConfigOption>) -> Result<()> {
        let backend = (self.factory)();
        self.init_with(backend, options)
    }

    /// 使用指定的后端初始化
    pub fn init_with(
        &self,
        backend: Arc<dyn Backend>,
        options: impl IntoIterator<Item = ConfigOption>,
    ) -> Result<()> {
        let mut config = Config::new();
        config.apply(options);
        config.validate()?;

        backend.init(config.clone())?;

        let mut state = self.lock();
        state.backend = Some(backend);
        state.config = Arc::new(config);
        state.ready = true;
        tracing::debug!(config = %state.config, "logging initialized");

        Ok(())
    }

    /// 初始化失败时 panic
    pub fn must_init(&self, options: impl IntoIterator<Item = ConfigOption>) {
        if let Err(e) = self.init(options) {
            panic!("{}", e);
        }
    }

    /// 设置后端，需要再次初始化后才能创建 logger
    pub fn set_backend(&self, backend: Arc<dyn Backend>) {
        let mut state = self.lock();
        state.backend = Some(backend);
        state.ready = false;
    }

    /// 当前使用的配置
    pub fn current_config(&self) -> Arc<Config> {
        self.lock().config.clone()
    }

    /// 使用当前配置的提取函数从上下文中取出字段
    pub fn keys_ctx(&self, ctx: &Context) -> Keys {
        self.current_config().context_keys(ctx)
    }

    fn snapshot(&self) -> Result<(Arc<dyn Backend>, Arc<Config>)> {
        let state = self.lock();
        match (&state.backend, state.ready) {
            (None, _) => Err(LoggingError::BackendNotSet),
            (Some(_), false) => Err(LoggingError::NotInitialized),
            (Some(backend), true) => Ok((backend.clone(), state.config.clone())),
        }
    }

    /// 创建 logger，未指定级别时使用 `DEFAULT_LEVEL`
    pub fn new_logger(&self, level: Option<Level>) -> Result<Box<dyn Logger>> {
        let (backend, _) = self.snapshot()?;
        backend.new_logger(level)
    }

    /// 创建命名 logger
    ///
    /// 级别优先级：配置中该名称的级别 > 传入的级别 > 全局配置级别。
    pub fn new_named_logger(&self, name: &str, level: Option<Level>) -> Result<Box<dyn Logger>> {
        let (backend, config) = self.snapshot()?;
        backend.new_named_logger(name, Some(config.level_for_named(name, level)))
    }

    /// 创建 logger，附加上下文字段，上下文结束时同步输出
    pub fn new_logger_ctx(&self, ctx: &Context, level: Option<Level>) -> Result<Box<dyn Logger>> {
        let (backend, config) = self.snapshot()?;
        let logger = backend.new_logger_ctx(ctx, level)?;
        Ok(logger.with_keys(config.context_keys(ctx)))
    }

    /// 创建命名 logger，附加上下文字段，上下文结束时同步输出
    pub fn new_named_logger_ctx(
        &self,
        ctx: &Context,
        name: &str,
        level: Option<Level>,
    ) -> Result<Box<dyn Logger>> {
        let (backend, config) = self.snapshot()?;
        let logger =
            backend.new_named_logger_ctx(ctx, name, Some(config.level_for_named(name, level)))?;
        Ok(logger.with_keys(config.context_keys(ctx)))
    }
}
