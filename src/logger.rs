//! Logger 接口与日志宏
//!
//! ```ignore
//! use logfacade::{info, Logger};
//!
//! let logger = logfacade::new_named_logger("http", None);
//! logger.info("server started");
//! info!(logger, "listening on {}", addr);
//! logger.with_key("peer", peer.into()).warn("slow client");
//! ```

use crate::context::Context;
use crate::error::Result;
use crate::keys::{FieldValue, Keys};
use crate::level::Level;
use crate::record::Caller;
use std::fmt;
use std::panic::Location;

/// 日志记录器
///
/// 所有 `with_*` 方法都返回新的 logger，新 logger 与原 logger 共享底层输出，
/// 但拥有各自的字段集合和级别，原 logger 不会被修改。
pub trait Logger: Send + Sync {
    /// 当前 logger 的级别
    fn level(&self) -> Level;

    /// 该级别的消息是否会被当前 logger 输出
    fn is_enabled_for_level(&self, level: Level) -> bool {
        self.level().is_enabled_for_level(level)
    }

    /// 输出一条日志，不检查 logger 级别，只受全局配置级别约束
    fn log(&self, level: Level, args: fmt::Arguments<'_>, caller: Option<Caller>);

    /// 附加一组字段
    fn with_keys(&self, keys: Keys) -> Box<dyn Logger>;

    /// 附加单个字段
    fn with_key(&self, key: &str, value: FieldValue) -> Box<dyn Logger>;

    /// 附加错误信息，之后的日志总是带上调用位置
    fn with_error(&self, err: &dyn std::error::Error) -> Box<dyn Logger>;

    /// 复制当前 logger 并设置新的级别
    fn with_level(&self, level: Level) -> Box<dyn Logger>;

    /// 附加上下文中通过提取函数取出的字段
    fn with_context(&self, ctx: &Context) -> Box<dyn Logger>;

    /// 把缓冲的日志写入底层输出
    fn sync(&self) -> Result<()>;

    #[track_caller]
    fn trace(&self, msg: &str) {
        if self.is_enabled_for_level(Level::Trace) {
            self.log(Level::Trace, format_args!("{}", msg), Some(call_site()));
        }
    }

    #[track_caller]
    fn tracef(&self, args: fmt::Arguments<'_>) {
        if self.is_enabled_for_level(Level::Trace) {
            self.log(Level::Trace, args, Some(call_site()));
        }
    }

    #[track_caller]
    fn debug(&self, msg: &str) {
        if self.is_enabled_for_level(Level::Debug) {
            self.log(Level::Debug, format_args!("{}", msg), Some(call_site()));
        }
    }

    #[track_caller]
    fn debugf(&self, args: fmt::Arguments<'_>) {
        if self.is_enabled_for_level(Level::Debug) {
            self.log(Level::Debug, args, Some(call_site()));
        }
    }

    #[track_caller]
    fn info(&self, msg: &str) {
        if self.is_enabled_for_level(Level::Info) {
            self.log(Level::Info, format_args!("{}", msg), Some(call_site()));
        }
    }

    #[track_caller]
    fn infof(&self, args: fmt::Arguments<'_>) {
        if self.is_enabled_for_level(Level::Info) {
            self.log(Level::Info, args, Some(call_site()));
        }
    }

    #[track_caller]
    fn warn(&self, msg: &str) {
        if self.is_enabled_for_level(Level::Warn) {
            self.log(Level::Warn, format_args!("{}", msg), Some(call_site()));
        }
    }

    #[track_caller]
    fn warnf(&self, args: fmt::Arguments<'_>) {
        if self.is_enabled_for_level(Level::Warn) {
            self.log(Level::Warn, args, Some(call_site()));
        }
    }

    /// 错误日志不受 logger 级别限制
    #[track_caller]
    fn error(&self, msg: &str) {
        self.log(Level::Error, format_args!("{}", msg), Some(call_site()));
    }

    #[track_caller]
    fn errorf(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args, Some(call_site()));
    }

    /// 输出致命错误后以状态码 1 退出进程
    #[track_caller]
    fn fatal(&self, msg: &str) -> ! {
        self.log(Level::Fatal, format_args!("{}", msg), Some(call_site()));
        exit_after_fatal(self)
    }

    #[track_caller]
    fn fatalf(&self, args: fmt::Arguments<'_>) -> ! {
        self.log(Level::Fatal, args, Some(call_site()));
        exit_after_fatal(self)
    }
}

impl fmt::Debug for dyn Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level())
            .finish()
    }
}

#[track_caller]
fn call_site() -> Caller {
    let location = Location::caller();
    Caller::new(location.file(), location.line())
}

fn exit_after_fatal<L: Logger + ?Sized>(logger: &L) -> ! {
    let _ = logger.sync();
    std::process::exit(1)
}

/// 以 TRACE 级别输出格式化日志
///
/// ```ignore
/// trace!(logger, "entering {}", name);
/// ```
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {{
        #[allow(unused_imports)]
        use $crate::Logger as _;
        let logger = &$logger;
        if logger.is_enabled_for_level($crate::Level::Trace) {
            logger.log($crate::Level::Trace, format_args!($($arg)+), Some($crate::caller!()));
        }
    }};
}

/// 以 DEBUG 级别输出格式化日志
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {{
        #[allow(unused_imports)]
        use $crate::Logger as _;
        let logger = &$logger;
        if logger.is_enabled_for_level($crate::Level::Debug) {
            logger.log($crate::Level::Debug, format_args!($($arg)+), Some($crate::caller!()));
        }
    }};
}

/// 以 INFO 级别输出格式化日志
///
/// ```ignore
/// info!(logger, "user {} logged in", user_id);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {{
        #[allow(unused_imports)]
        use $crate::Logger as _;
        let logger = &$logger;
        if logger.is_enabled_for_level($crate::Level::Info) {
            logger.log($crate::Level::Info, format_args!($($arg)+), Some($crate::caller!()));
        }
    }};
}

/// 以 WARN 级别输出格式化日志
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {{
        #[allow(unused_imports)]
        use $crate::Logger as _;
        let logger = &$logger;
        if logger.is_enabled_for_level($crate::Level::Warn) {
            logger.log($crate::Level::Warn, format_args!($($arg)+), Some($crate::caller!()));
        }
    }};
}

/// 以 ERROR 级别输出格式化日志，不受 logger 级别限制
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {{
        #[allow(unused_imports)]
        use $crate::Logger as _;
        let logger = &$logger;
        logger.log($crate::Level::Error, format_args!($($arg)+), Some($crate::caller!()));
    }};
}

/// 以 FATAL 级别输出格式化日志并退出进程
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {{
        #[allow(unused_imports)]
        use $crate::Logger as _;
        let logger = &$logger;
        logger.fatalf(format_args!($($arg)+))
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// 只记录输出内容的 logger
    #[derive(Clone)]
    struct RecordingLogger {
        level: Level,
        entries: Arc<Mutex<Vec<(Level, String, Option<Caller>)>>>,
    }

    impl RecordingLogger {
        fn new(level: Level) -> Self {
            Self {
                level,
                entries: Arc::default(),
            }
        }

        fn entries(&self) -> Vec<(Level, String, Option<Caller>)> {
            self.entries.lock().unwrap().clone()
        }
    }

    impl Logger for RecordingLogger {
        fn level(&self) -> Level {
            self.level
        }

        fn log(&self, level: Level, args: fmt::Arguments<'_>, caller: Option<Caller>) {
            self.entries
                .lock()
                .unwrap()
                .push((level, args.to_string(), caller));
        }

        fn with_keys(&self, _keys: Keys) -> Box<dyn Logger> {
            Box::new(self.clone())
        }

        fn with_key(&self, _key: &str, _value: FieldValue) -> Box<dyn Logger> {
            Box::new(self.clone())
        }

        fn with_error(&self, _err: &dyn std::error::Error) -> Box<dyn Logger> {
            Box::new(self.clone())
        }

        fn with_level(&self, level: Level) -> Box<dyn Logger> {
            Box::new(Self {
                level,
                entries: self.entries.clone(),
            })
        }

        fn with_context(&self, _ctx: &Context) -> Box<dyn Logger> {
            Box::new(self.clone())
        }

        fn sync(&self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_leveled_methods_respect_logger_level() {
        let logger = RecordingLogger::new(Level::Warn);
        logger.trace("t");
        logger.debug("d");
        logger.info("i");
        logger.warn("w");
        logger.errorf(format_args!("e{}", 1));

        let entries = logger.entries();
        let messages: Vec<&str> = entries.iter().map(|(_, m, _)| m.as_str()).collect();
        assert_eq!(messages, vec!["w", "e1"]);
        assert_eq!(entries[0].0, Level::Warn);
        assert_eq!(entries[1].0, Level::Error);
    }

    #[test]
    fn test_error_ignores_logger_level() {
        let logger = RecordingLogger::new(Level::Fatal);
        logger.error("still logged");
        assert_eq!(logger.entries().len(), 1);
    }

    #[test]
    fn test_methods_record_call_site() {
        let logger = RecordingLogger::new(Level::Trace);
        let line = line!() + 1;
        logger.info("here");

        let entries = logger.entries();
        let caller = entries[0].2.unwrap();
        assert!(caller.file.ends_with("logger.rs"));
        assert_eq!(caller.line, line);
    }

    #[test]
    fn test_macros() {
        let logger: Box<dyn Logger> = Box::new(RecordingLogger::new(Level::Info));
        let recorder = RecordingLogger {
            level: Level::Info,
            entries: Arc::default(),
        };
        let boxed: Box<dyn Logger> = Box::new(recorder.clone());

        crate::debug!(boxed, "hidden {}", 1);
        crate::info!(boxed, "user {} logged in", "alice");
        crate::warn!(boxed, "slow {}ms", 1500);
        crate::error!(boxed, "failed: {}", "timeout");
        crate::info!(logger, "other logger");

        let entries = recorder.entries();
        let messages: Vec<&str> = entries.iter().map(|(_, m, _)| m.as_str()).collect();
        assert_eq!(
            messages,
            vec!["user alice logged in", "slow 1500ms", "failed: timeout"]
        );
        assert!(entries.iter().all(|(_, _, caller)| caller.is_some()));
    }

    #[test]
    fn test_with_level_forks_logger() {
        let logger = RecordingLogger::new(Level::Info);
        let verbose = logger.with_level(Level::Trace);

        assert_eq!(logger.level(), Level::Info);
        assert_eq!(verbose.level(), Level::Trace);
        assert!(verbose.is_enabled_for_level(Level::Trace));
        assert!(!logger.is_enabled_for_level(Level::Trace));
    }
}
