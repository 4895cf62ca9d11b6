use crate::error::LoggingError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// 日志输出目标
///
/// 三个保留值 `stdout`、`stderr`、`syslog`，其余任意字符串都视为文件路径。
/// 路径在这里不做存在性或可写性检查，真正打开发生在 writer 注册表中。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Target {
    #[default]
    Stdout,
    Stderr,
    Syslog,
    File(String),
}

/// 未显式指定时使用的输出目标
pub const DEFAULT_OUTPUT: Target = Target::Stdout;

impl Target {
    /// 输出标识，同时也是 writer 注册表中的名称
    pub fn as_str(&self) -> &str {
        match self {
            Target::Stdout => "stdout",
            Target::Stderr => "stderr",
            Target::Syslog => "syslog",
            Target::File(path) => path,
        }
    }

    /// 空路径是唯一的非法取值
    pub fn validate(&self) -> Result<(), LoggingError> {
        match self {
            Target::File(path) if path.is_empty() => Err(LoggingError::EmptyOutput),
            _ => Ok(()),
        }
    }
}

impl From<&str> for Target {
    fn from(value: &str) -> Self {
        match value {
            "stdout" => Target::Stdout,
            "stderr" => Target::Stderr,
            "syslog" => Target::Syslog,
            path => Target::File(path.to_string()),
        }
    }
}

impl From<String> for Target {
    fn from(value: String) -> Self {
        Target::from(value.as_str())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Target {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Target::from(String::deserialize(deserializer)?))
    }
}
