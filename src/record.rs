use crate::keys::{FieldValue, Key};
use crate::level::Level;
use chrono::{DateTime, Local, SecondsFormat};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// 调用位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub file: &'static str,
    pub line: u32,
}

impl Caller {
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }

    /// 只保留最后一级目录和文件名
    pub fn short_file(&self) -> &'static str {
        let file = self.file;
        let mut separators = file.rmatch_indices(['/', '\\']).map(|(i, _)| i);
        separators.next();
        match separators.next() {
            Some(i) => &file[i + 1..],
            None => file,
        }
    }
}

/// 记录当前调用位置
#[macro_export]
macro_rules! caller {
    () => {
        $crate::record::Caller::new(file!(), line!())
    };
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.short_file(), self.line)
    }
}

impl Serialize for Caller {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// 一条待输出的日志
#[derive(Debug, Clone)]
pub struct Record {
    pub level: Level,
    pub message: String,
    /// logger 名称，未命名 logger 为空
    pub logger: Option<String>,
    pub timestamp: DateTime<Local>,
    pub caller: Option<Caller>,
    /// 结构化字段，按附加顺序排列
    pub fields: Vec<(Key, FieldValue)>,
    pub stacktrace: Option<String>,
}

impl Record {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            logger: None,
            timestamp: Local::now(),
            caller: None,
            fields: Vec::new(),
            stacktrace: None,
        }
    }

    pub fn with_logger(mut self, logger: impl Into<String>) -> Self {
        self.logger = Some(logger.into());
        self
    }

    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    pub fn with_field(mut self, key: impl Into<Key>, value: impl Into<FieldValue>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    pub fn with_stacktrace(mut self, stacktrace: impl Into<String>) -> Self {
        self.stacktrace = Some(stacktrace.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// RFC 3339 纳秒精度时间戳
    pub fn rfc3339_timestamp(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, false)
    }

    /// Unix 纪元秒，带小数部分
    pub fn epoch_timestamp(&self) -> f64 {
        self.timestamp.timestamp() as f64
            + f64::from(self.timestamp.timestamp_subsec_nanos()) / 1e9
    }
}

impl Serialize for Record {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(&Key::TIMESTAMP, &self.rfc3339_timestamp())?;
        map.serialize_entry(&Key::LEVEL, self.level.as_str())?;
        if let Some(logger) = &self.logger {
            map.serialize_entry(&Key::LOGGER, logger)?;
        }
        if let Some(caller) = &self.caller {
            map.serialize_entry(&Key::CALLER, caller)?;
        }
        map.serialize_entry(&Key::MESSAGE, &self.message)?;
        if let Some(stacktrace) = &self.stacktrace {
            map.serialize_entry(&Key::STACKTRACE, stacktrace)?;
        }
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
