use crate::config::Config;
use crate::error::{LoggingError, Result};
use crate::format::Format;
use crate::keys::Key;
use crate::level::Level;
use crate::record::Record;
use crate::target::Target;
use std::fmt::Write;

/// 控制台格式的时间戳
pub const TIMESTAMP_FORMAT_CONSOLE: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// 日志格式化器
///
/// 负责将 Record 格式化为一行文本，不包含行尾换行符
pub trait LogFormatter: Send + Sync {
    fn format(&self, record: &Record) -> Result<String>;
}

/// 根据配置选择格式化器，syslog 输出总是使用 syslog 格式
pub fn for_config(config: &Config) -> Box<dyn LogFormatter> {
    match (&config.output, config.format) {
        (Target::Syslog, _) => Box::new(SyslogFormatter::new()),
        (_, Format::Text) => Box::new(TextFormatter),
        (_, Format::Json) => Box::new(JsonFormatter),
    }
}

/// 文本格式化器
///
/// `2024-01-02 15:04:05.000000 info name file.rs:12 message {"k":"v"}`
pub struct TextFormatter;

impl LogFormatter for TextFormatter {
    fn format(&self, record: &Record) -> Result<String> {
        let capacity = 64
            + record.message.len()
            + record.logger.as_ref().map_or(0, String::len)
            + record.fields.len() * 16;
        let mut result = String::with_capacity(capacity);

        write!(result, "{}", record.timestamp.format(TIMESTAMP_FORMAT_CONSOLE))
            .map_err(|e| LoggingError::Io(std::io::Error::other(e)))?;
        result.push(' ');
        result.push_str(record.level.as_str());

        if let Some(logger) = &record.logger {
            result.push(' ');
            result.push_str(logger);
        }

        if let Some(caller) = &record.caller {
            result.push(' ');
            result.push_str(&caller.to_string());
        }

        result.push(' ');
        result.push_str(&record.message);

        if !record.fields.is_empty() {
            let fields: serde_json::Map<String, serde_json::Value> = record
                .fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_json()))
                .collect();
            result.push(' ');
            result.push_str(&serde_json::to_string(&fields).map_err(json_err)?);
        }

        if let Some(stacktrace) = &record.stacktrace {
            result.push('\n');
            result.push_str(stacktrace);
        }

        Ok(result)
    }
}

/// JSON 格式化器，每条日志一个 JSON 对象
pub struct JsonFormatter;

impl LogFormatter for JsonFormatter {
    fn format(&self, record: &Record) -> Result<String> {
        serde_json::to_string(record).map_err(json_err)
    }
}

/// RFC 5424 syslog 格式化器
///
/// 消息体为 JSON，其中 `ts` 为 Unix 纪元秒。
pub struct SyslogFormatter {
    hostname: String,
    app: String,
    pid: u32,
}

/// user 设施
const FACILITY_USER: u8 = 1;

impl SyslogFormatter {
    pub fn new() -> Self {
        let app = std::env::args()
            .next()
            .and_then(|arg0| {
                std::path::Path::new(&arg0)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "-".to_string());

        Self {
            hostname: "localhost".to_string(),
            app,
            pid: std::process::id(),
        }
    }

    /// 指定应用名
    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        self.app = app.into();
        self
    }

    /// syslog 严重程度
    pub fn severity(level: Level) -> u8 {
        match level {
            Level::Trace | Level::Debug => 7,
            Level::Info => 6,
            Level::Warn => 4,
            Level::Error => 3,
            Level::Panic | Level::Fatal => 2,
        }
    }

    pub fn priority(level: Level) -> u8 {
        FACILITY_USER * 8 + Self::severity(level)
    }
}

impl Default for SyslogFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl LogFormatter for SyslogFormatter {
    fn format(&self, record: &Record) -> Result<String> {
        let mut body = serde_json::to_value(record).map_err(json_err)?;
        if let Some(object) = body.as_object_mut() {
            object.insert(
                Key::TIMESTAMP.to_string(),
                serde_json::Value::from(record.epoch_timestamp()),
            );
        }

        Ok(format!(
            "<{}>1 {} {} {} {} - - {}",
            Self::priority(record.level),
            record.rfc3339_timestamp(),
            self.hostname,
            self.app,
            self.pid,
            body
        ))
    }
}

fn json_err(e: serde_json::Error) -> LoggingError {
    LoggingError::Io(e.into())
}
