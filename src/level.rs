use crate::error::LoggingError;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 日志级别
///
/// 数值越大越严重，比较即数值比较。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// 最详细的日志
    Trace = 0,
    /// 调试信息
    Debug = 1,
    /// 一般信息
    Info = 2,
    /// 警告信息
    Warn = 3,
    /// 错误信息
    Error = 4,
    /// 应用 panic 级别
    Panic = 5,
    /// 致命错误，记录后进程退出
    Fatal = 6,
}

/// 未显式指定时使用的级别
pub const DEFAULT_LEVEL: Level = Level::Info;

impl Level {
    /// 全部级别，按严重程度升序
    pub const ALL: [Level; 7] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Panic,
        Level::Fatal,
    ];

    /// 规范的小写名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Panic => "panic",
            Level::Fatal => "fatal",
        }
    }

    /// 以当前级别为阈值时，`level` 级别的消息是否应当输出
    pub fn is_enabled_for_level(self, level: Level) -> bool {
        level >= self
    }
}

impl Default for Level {
    fn default() -> Self {
        DEFAULT_LEVEL
    }
}

impl FromStr for Level {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" | "t" | "trc" => Ok(Level::Trace),
            "debug" | "d" | "dbg" => Ok(Level::Debug),
            "info" | "i" | "inf" => Ok(Level::Info),
            "warn" | "warning" | "w" | "wrn" => Ok(Level::Warn),
            "error" | "e" | "err" => Ok(Level::Error),
            "panic" | "p" => Ok(Level::Panic),
            "fatal" | "f" => Ok(Level::Fatal),
            _ => Err(LoggingError::UnrecognizedLevel(s.to_string())),
        }
    }
}

impl TryFrom<i64> for Level {
    type Error = LoggingError;

    fn try_from(value: i64) -> Result<Self, LoggingError> {
        match value {
            0 => Ok(Level::Trace),
            1 => Ok(Level::Debug),
            2 => Ok(Level::Info),
            3 => Ok(Level::Warn),
            4 => Ok(Level::Error),
            5 => Ok(Level::Panic),
            6 => Ok(Level::Fatal),
            _ => Err(LoggingError::UnknownLevelValue(value)),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Level {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct LevelVisitor;

        impl Visitor<'_> for LevelVisitor {
            type Value = Level;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a level name or a level number between 0 and 6")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Level, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Level, E> {
                Level::try_from(v).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Level, E> {
                let v = i64::try_from(v).map_err(E::custom)?;
                Level::try_from(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(LevelVisitor)
    }
}
