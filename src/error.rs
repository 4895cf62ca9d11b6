use thiserror::Error;

/// 日志模块统一错误类型
///
/// 所有错误信息都以 `logging:` 开头，调用方可以直接通过类型判断
/// 是否来自日志子系统，无需匹配字符串。
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("logging: unrecognized level: {0:?}")]
    UnrecognizedLevel(String),

    #[error("logging: unknown level value {0}")]
    UnknownLevelValue(i64),

    #[error("logging: unexpected format `{0}`, want `text` or `json`")]
    InvalidFormat(String),

    #[error("logging: output empty, want 'stdout', 'stderr', 'syslog' or file path")]
    EmptyOutput,

    #[error("logging: invalid {field}: {source}")]
    InvalidConfig {
        field: String,
        #[source]
        source: Box<LoggingError>,
    },

    #[error("logging: already configured")]
    AlreadyConfigured,

    #[error("logging: set backend first")]
    BackendNotSet,

    #[error("logging: init first")]
    NotInitialized,

    #[error("logging: empty writer name")]
    EmptyWriterName,

    #[error("logging: writer {0} already registered")]
    WriterExists(String),

    #[error("logging: writer {0} unknown")]
    WriterUnknown(String),

    #[error("logging: stream closed")]
    Closed,

    #[error("logging: open output `{output}`: {source}")]
    Open {
        output: String,
        #[source]
        source: std::io::Error,
    },

    #[error("logging: connect syslog {addr}: {source}")]
    Syslog {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("logging: io: {0}")]
    Io(#[from] std::io::Error),

    #[error("logging: parse config: {0}")]
    Parse(String),
}

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 配置非法（级别、格式、输出目标），可恢复
    Configuration,
    /// 生命周期错误（重复初始化、未初始化、writer 名称冲突或不存在）
    Lifecycle,
    /// 输出打开或写入失败
    Io,
    /// 向已关闭的 writer 写入
    Closed,
}

impl LoggingError {
    /// 返回错误所属分类
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoggingError::UnrecognizedLevel(_)
            | LoggingError::UnknownLevelValue(_)
            | LoggingError::InvalidFormat(_)
            | LoggingError::EmptyOutput
            | LoggingError::InvalidConfig { .. }
            | LoggingError::Parse(_) => ErrorKind::Configuration,
            LoggingError::AlreadyConfigured
            | LoggingError::BackendNotSet
            | LoggingError::NotInitialized
            | LoggingError::EmptyWriterName
            | LoggingError::WriterExists(_)
            | LoggingError::WriterUnknown(_) => ErrorKind::Lifecycle,
            LoggingError::Open { .. } | LoggingError::Syslog { .. } | LoggingError::Io(_) => {
                ErrorKind::Io
            }
            LoggingError::Closed => ErrorKind::Closed,
        }
    }

    /// 包装配置字段校验错误
    pub(crate) fn invalid(field: impl Into<String>, source: LoggingError) -> Self {
        LoggingError::InvalidConfig {
            field: field.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, LoggingError>;
