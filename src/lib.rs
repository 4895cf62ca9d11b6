//! logfacade - 可替换后端的日志门面
//!
//! 应用代码只依赖 `Logger` 接口和少量进程级入口函数，日志引擎通过 `Backend`
//! 接口注入。
//!
//! ## 模块
//!
//! - **level / format / target**: 日志级别、输出格式、输出目标
//! - **config**: 日志配置，支持 YAML / JSON5 / TOML
//! - **context**: 调用上下文以及上下文字段提取
//! - **writer**: 输出流注册表，同一输出只打开一次，写入互斥
//! - **backend**: 后端接口与内置实现
//! - **session / global**: 可注入的日志会话与进程级会话
//!
//! ## 示例
//!
//! ```ignore
//! use logfacade::{info, init, new_named_logger, with_level, Level, Logger};
//!
//! init(vec![with_level(Level::Debug)])?;
//!
//! let logger = new_named_logger("http", None);
//! logger.info("server started");
//! info!(logger, "listening on {}", "0.0.0.0:8080");
//! ```

pub mod backend;
pub mod config;
pub mod context;
pub mod default_logger;
pub mod error;
pub mod format;
pub mod formatter;
pub mod global;
pub mod keys;
pub mod level;
pub mod logger;
pub mod record;
pub mod session;
pub mod syslog;
pub mod target;
pub mod writer;

// 重新导出主要的公共 API
pub use backend::{Backend, DefaultBackend};
pub use config::{
    with_context_extractors, with_custom_level, with_format, with_level, with_target, Config,
    ConfigOption,
};
pub use context::{CancellationToken, Context, ContextExtractorFunc};
pub use default_logger::DefaultLogger;
pub use error::{ErrorKind, LoggingError, Result};
pub use format::{Format, DEFAULT_FORMAT};
pub use formatter::{JsonFormatter, LogFormatter, SyslogFormatter, TextFormatter};
pub use global::{
    current_config, global_session, init, keys_ctx, must_init, new_logger, new_logger_ctx,
    new_named_logger, new_named_logger_ctx, try_new_logger, try_new_logger_ctx,
    try_new_named_logger, try_new_named_logger_ctx,
};
pub use keys::{FieldValue, Key, Keys};
pub use level::{Level, DEFAULT_LEVEL};
pub use logger::Logger;
pub use record::{Caller, Record};
pub use session::{BackendFactory, Session};
pub use syslog::{Network, SyslogWriter};
pub use target::{Target, DEFAULT_OUTPUT};
pub use writer::{output, writers, LockedWriter, Sink, WriterAdapter, WriterName, WritersRegistry};
