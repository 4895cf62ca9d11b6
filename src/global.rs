use crate::config::{Config, ConfigOption};
use crate::context::Context;
use crate::error::Result;
use crate::keys::Keys;
use crate::level::Level;
use crate::logger::Logger;
use crate::session::Session;
use std::sync::Arc;

/// 进程级日志会话
static GLOBAL_SESSION: once_cell::sync::Lazy<Session> = once_cell::sync::Lazy::new(Session::new);

/// 获取进程级会话
pub fn global_session() -> &'static Session {
    &GLOBAL_SESSION
}

/// 初始化进程级会话
///
/// # 示例
///
/// ```ignore
/// use logfacade::{init, with_level, with_target, Level};
///
/// fn main() -> logfacade::Result<()> {
///     init(vec![with_level(Level::Debug), with_target("/var/log/app.log")])?;
///     Ok(())
/// }
/// ```
pub fn init(options: impl IntoIterator<Item = ConfigOption>) -> Result<()> {
    global_session().init(options)
}

/// 初始化进程级会话，失败时 panic
pub fn must_init(options: impl IntoIterator<Item = ConfigOption>) {
    global_session().must_init(options)
}

/// 进程级会话当前使用的配置
pub fn current_config() -> Arc<Config> {
    global_session().current_config()
}

/// 使用进程级配置的提取函数从上下文中取出字段
pub fn keys_ctx(ctx: &Context) -> Keys {
    global_session().keys_ctx(ctx)
}

// ========== 创建 logger，未初始化时 panic ==========

/// 创建 logger，未指定级别时使用 `DEFAULT_LEVEL`
///
/// 未调用 `init` 时 panic。
pub fn new_logger(level: Option<Level>) -> Box<dyn Logger> {
    or_panic(try_new_logger(level))
}

/// 创建命名 logger，未调用 `init` 时 panic
pub fn new_named_logger(name: &str, level: Option<Level>) -> Box<dyn Logger> {
    or_panic(try_new_named_logger(name, level))
}

/// 创建带上下文字段的 logger，未调用 `init` 时 panic
pub fn new_logger_ctx(ctx: &Context, level: Option<Level>) -> Box<dyn Logger> {
    or_panic(try_new_logger_ctx(ctx, level))
}

/// 创建带上下文字段的命名 logger，未调用 `init` 时 panic
pub fn new_named_logger_ctx(ctx: &Context, name: &str, level: Option<Level>) -> Box<dyn Logger> {
    or_panic(try_new_named_logger_ctx(ctx, name, level))
}

// ========== 创建 logger，返回错误 ==========

pub fn try_new_logger(level: Option<Level>) -> Result<Box<dyn Logger>> {
    global_session().new_logger(level)
}

pub fn try_new_named_logger(name: &str, level: Option<Level>) -> Result<Box<dyn Logger>> {
    global_session().new_named_logger(name, level)
}

pub fn try_new_logger_ctx(ctx: &Context, level: Option<Level>) -> Result<Box<dyn Logger>> {
    global_session().new_logger_ctx(ctx, level)
}

pub fn try_new_named_logger_ctx(
    ctx: &Context,
    name: &str,
    level: Option<Level>,
) -> Result<Box<dyn Logger>> {
    global_session().new_named_logger_ctx(ctx, name, level)
}

fn or_panic(result: Result<Box<dyn Logger>>) -> Box<dyn Logger> {
    match result {
        Ok(logger) => logger,
        Err(e) => panic!("{}", e),
    }
}
