//! 日志后端
//!
//! `Backend` 是可替换的日志引擎边界；`DefaultBackend` 是内置实现，
//! 负责格式化日志并写入 writer 注册表中的输出流。

use crate::config::Config;
use crate::context::Context;
use crate::error::{LoggingError, Result};
use crate::formatter::{self, LogFormatter};
use crate::keys::{FieldValue, Key, Keys};
use crate::level::{Level, DEFAULT_LEVEL};
use crate::logger::Logger;
use crate::record::{Caller, Record};
use crate::target::Target;
use crate::writer::{writers, LockedWriter};
use once_cell::sync::Lazy;
use std::backtrace::Backtrace;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Runtime;

/// 日志引擎需要实现的接口
pub trait Backend: Send + Sync {
    /// 使用配置初始化后端，重复初始化返回 `AlreadyConfigured`
    fn init(&self, config: Config) -> Result<()>;

    /// 初始化失败时 panic
    fn must_init(&self, config: Config) {
        if let Err(e) = self.init(config) {
            panic!("{}", e);
        }
    }

    /// 创建 logger，未指定级别时使用 `DEFAULT_LEVEL`
    fn new_logger(&self, level: Option<Level>) -> Result<Box<dyn Logger>>;

    /// 创建命名 logger，配置中的命名级别优先于传入的级别
    fn new_named_logger(&self, name: &str, level: Option<Level>) -> Result<Box<dyn Logger>>;

    /// 创建 logger，上下文结束时自动同步输出
    fn new_logger_ctx(&self, ctx: &Context, level: Option<Level>) -> Result<Box<dyn Logger>>;

    /// 创建命名 logger，上下文结束时自动同步输出
    fn new_named_logger_ctx(
        &self,
        ctx: &Context,
        name: &str,
        level: Option<Level>,
    ) -> Result<Box<dyn Logger>>;

    /// 后端当前使用的配置，未初始化时为 `None`
    fn config(&self) -> Option<Config>;
}

/// 初始化后不再变化的后端状态
struct Core {
    config: Config,
    writer: Arc<LockedWriter>,
    formatter: Box<dyn LogFormatter>,
    add_caller: bool,
    add_stacktrace: bool,
    sync_waiters: AtomicUsize,
}

impl Core {
    fn build(config: Config) -> Result<Self> {
        let writer = writers().resolve(&config.output)?;
        let formatter = formatter::for_config(&config);
        let add_caller = matches!(config.level, Level::Trace | Level::Debug);
        // 只有控制台输出附带调用栈
        let add_stacktrace = config.output == Target::Stdout;

        Ok(Self {
            config,
            writer,
            formatter,
            add_caller,
            add_stacktrace,
            sync_waiters: AtomicUsize::new(0),
        })
    }

    fn emit(&self, record: Record) -> Result<()> {
        let mut line = self.formatter.format(&record)?;
        line.push('\n');
        self.writer.write_entry(line.as_bytes())
    }
}

/// 内置日志后端
///
/// 状态只有未配置和已配置两种；未配置时创建 logger 会先用默认配置初始化，
/// 与显式 `init` 使用同一把锁。
#[derive(Default)]
pub struct DefaultBackend {
    state: Mutex<Option<Arc<Core>>>,
}

impl DefaultBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_configured(&self) -> bool {
        self.lock().is_some()
    }

    /// 仍在等待上下文结束的同步任务数量
    pub fn pending_sync_waiters(&self) -> usize {
        self.lock()
            .as_ref()
            .map_or(0, |core| core.sync_waiters.load(Ordering::SeqCst))
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<Core>>> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// 返回已初始化的状态，未初始化时使用默认配置初始化
    fn core(&self) -> Result<Arc<Core>> {
        let mut state = self.lock();
        if let Some(core) = state.as_ref() {
            return Ok(core.clone());
        }

        let core = Arc::new(Core::build(Config::default())?);
        tracing::debug!(config = %core.config, "backend initialized with defaults");
        *state = Some(core.clone());

        Ok(core)
    }

    fn make_logger(core: Arc<Core>, name: Option<&str>, level: Level) -> CoreLogger {
        CoreLogger {
            core,
            level,
            name: name.map(str::to_string),
            fields: Arc::new(Vec::new()),
            with_caller: false,
        }
    }

    fn named_level(core: &Core, name: &str, level: Option<Level>) -> Level {
        core.config
            .custom_levels
            .get(name)
            .copied()
            .or(level)
            .unwrap_or(DEFAULT_LEVEL)
    }
}

impl Backend for DefaultBackend {
    fn init(&self, config: Config) -> Result<()> {
        if self.is_configured() {
            return Err(LoggingError::AlreadyConfigured);
        }

        config.validate()?;
        // 打开输出时不持有后端锁
        let core = Arc::new(Core::build(config)?);

        let mut state = self.lock();
        if state.is_some() {
            return Err(LoggingError::AlreadyConfigured);
        }
        tracing::debug!(config = %core.config, "backend initialized");
        *state = Some(core);

        Ok(())
    }

    fn new_logger(&self, level: Option<Level>) -> Result<Box<dyn Logger>> {
        let core = self.core()?;
        let level = level.unwrap_or(DEFAULT_LEVEL);
        Ok(Box::new(Self::make_logger(core, None, level)))
    }

    fn new_named_logger(&self, name: &str, level: Option<Level>) -> Result<Box<dyn Logger>> {
        let core = self.core()?;
        let level = Self::named_level(&core, name, level);
        Ok(Box::new(Self::make_logger(core, Some(name), level)))
    }

    fn new_logger_ctx(&self, ctx: &Context, level: Option<Level>) -> Result<Box<dyn Logger>> {
        let core = self.core()?;
        let level = level.unwrap_or(DEFAULT_LEVEL);
        spawn_sync_on_done(ctx, &core);
        Ok(Box::new(Self::make_logger(core, None, level)))
    }

    fn new_named_logger_ctx(
        &self,
        ctx: &Context,
        name: &str,
        level: Option<Level>,
    ) -> Result<Box<dyn Logger>> {
        let core = self.core()?;
        let level = Self::named_level(&core, name, level);
        spawn_sync_on_done(ctx, &core);
        Ok(Box::new(Self::make_logger(core, Some(name), level)))
    }

    fn config(&self) -> Option<Config> {
        self.lock().as_ref().map(|core| core.config.clone())
    }
}

/// 没有外部 tokio 运行时时，所有等待任务共用的运行时
static SYNC_RUNTIME: Lazy<Option<Runtime>> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("logfacade-sync")
        .enable_all()
        .build()
        .map_err(|e| tracing::warn!(error = %e, "failed to build sync runtime"))
        .ok()
});

/// 存活期间计入 `Core::sync_waiters`
struct SyncWaiter(Arc<Core>);

impl SyncWaiter {
    fn register(core: &Arc<Core>) -> Self {
        core.sync_waiters.fetch_add(1, Ordering::SeqCst);
        Self(core.clone())
    }
}

impl Drop for SyncWaiter {
    fn drop(&mut self) {
        self.0.sync_waiters.fetch_sub(1, Ordering::SeqCst);
    }
}

/// 上下文结束后同步一次输出流，错误被忽略
///
/// 有 tokio 运行时时在当前运行时中等待，否则交给共用的运行时。
/// 后台上下文永远不会结束，不启动等待；上下文的所有副本被释放后等待任务随之结束。
fn spawn_sync_on_done(ctx: &Context, core: &Arc<Core>) {
    let Some(watch) = ctx.watch() else {
        return;
    };

    let waiter = SyncWaiter::register(core);
    let wait = async move {
        if watch.wait().await {
            if let Err(e) = waiter.0.writer.sync() {
                tracing::debug!(error = %e, "sync on context done failed");
            }
        }
    };

    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(wait);
        }
        Err(_) => match SYNC_RUNTIME.as_ref() {
            Some(runtime) => {
                runtime.spawn(wait);
            }
            None => tracing::warn!("no runtime available, context sync skipped"),
        },
    }
}

/// `DefaultBackend` 创建的 logger
#[derive(Clone)]
struct CoreLogger {
    core: Arc<Core>,
    level: Level,
    name: Option<String>,
    fields: Arc<Vec<(Key, FieldValue)>>,
    with_caller: bool,
}

impl CoreLogger {
    fn fork(&self, extra: impl IntoIterator<Item = (Key, FieldValue)>) -> Self {
        let mut fields = Vec::clone(&self.fields);
        fields.extend(extra);
        Self {
            fields: Arc::new(fields),
            ..self.clone()
        }
    }
}

impl Logger for CoreLogger {
    fn level(&self) -> Level {
        self.level
    }

    fn log(&self, level: Level, args: fmt::Arguments<'_>, caller: Option<Caller>) {
        if !self.core.config.level.is_enabled_for_level(level) {
            return;
        }

        let mut record = Record::new(level, args.to_string());
        if let Some(name) = &self.name {
            record = record.with_logger(name.clone());
        }
        if self.core.add_caller || self.with_caller {
            record.caller = caller;
        }
        if level == Level::Fatal && self.core.add_stacktrace {
            record = record.with_stacktrace(Backtrace::force_capture().to_string());
        }
        record.fields = Vec::clone(&self.fields);

        if let Err(e) = self.core.emit(record) {
            tracing::warn!(error = %e, output = %self.core.config.output, "write log entry failed");
        }
    }

    fn with_keys(&self, keys: Keys) -> Box<dyn Logger> {
        let mut keys: Vec<(Key, FieldValue)> = keys.into_iter().collect();
        keys.sort_by(|a, b| a.0.cmp(&b.0));
        Box::new(self.fork(keys))
    }

    fn with_key(&self, key: &str, value: FieldValue) -> Box<dyn Logger> {
        Box::new(self.fork([(Key::new(key), value)]))
    }

    fn with_error(&self, err: &dyn std::error::Error) -> Box<dyn Logger> {
        let mut logger = self.fork([(Key::ERROR, FieldValue::from(err.to_string()))]);
        logger.with_caller = true;
        Box::new(logger)
    }

    fn with_level(&self, level: Level) -> Box<dyn Logger> {
        Box::new(Self {
            level,
            ..self.clone()
        })
    }

    fn with_context(&self, ctx: &Context) -> Box<dyn Logger> {
        self.with_keys(self.core.config.context_keys(ctx))
    }

    fn sync(&self) -> Result<()> {
        self.core.writer.sync()
    }
}
