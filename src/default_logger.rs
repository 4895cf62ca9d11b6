use crate::context::Context;
use crate::error::Result;
use crate::global;
use crate::keys::{FieldValue, Keys};
use crate::level::{Level, DEFAULT_LEVEL};
use crate::logger::Logger;
use crate::record::Caller;
use once_cell::sync::OnceCell;
use std::fmt;

/// 默认 logger
///
/// 首次使用时才从进程级会话创建内部 logger，级别为当前配置的全局级别。
/// 适合不需要定制的场景，需要时仍可以通过 `with_*` 派生完整的 logger。
///
/// 进程级会话未初始化时，首次使用会 panic。
#[derive(Default)]
pub struct DefaultLogger {
    inner: OnceCell<Box<dyn Logger>>,
}

impl DefaultLogger {
    pub const fn new() -> Self {
        Self {
            inner: OnceCell::new(),
        }
    }

    fn logger(&self) -> &dyn Logger {
        self.inner
            .get_or_init(|| global::new_logger(Some(global::current_config().level)))
            .as_ref()
    }

    /// 使用当前配置创建命名 logger
    pub fn with_name(&self, name: &str) -> Box<dyn Logger> {
        self.logger();
        global::new_named_logger(name, Some(global::current_config().level))
    }
}

impl Logger for DefaultLogger {
    /// 总是返回 `DEFAULT_LEVEL`，派生出的 logger 才会报告实际级别
    fn level(&self) -> Level {
        DEFAULT_LEVEL
    }

    fn is_enabled_for_level(&self, level: Level) -> bool {
        self.logger().is_enabled_for_level(level)
    }

    fn log(&self, level: Level, args: fmt::Arguments<'_>, caller: Option<Caller>) {
        self.logger().log(level, args, caller)
    }

    fn with_keys(&self, keys: Keys) -> Box<dyn Logger> {
        self.logger().with_keys(keys)
    }

    fn with_key(&self, key: &str, value: FieldValue) -> Box<dyn Logger> {
        self.logger().with_key(key, value)
    }

    fn with_error(&self, err: &dyn std::error::Error) -> Box<dyn Logger> {
        self.logger().with_error(err)
    }

    fn with_level(&self, level: Level) -> Box<dyn Logger> {
        self.logger().with_level(level)
    }

    /// 创建新的上下文 logger，级别为当前配置的全局级别
    fn with_context(&self, ctx: &Context) -> Box<dyn Logger> {
        self.logger();
        global::new_logger_ctx(ctx, Some(global::current_config().level))
    }

    fn sync(&self) -> Result<()> {
        self.logger().sync()
    }
}
