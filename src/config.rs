//! 日志配置
//!
//! 可以从 YAML / JSON5 / TOML 文档加载：
//!
//! ```yaml
//! level: info          # trace|debug|info|warn|error|panic|fatal
//! format: text         # text|json
//! output: stdout       # stdout|stderr|syslog|<file-path>
//! customLevels:
//!   db: warn
//! ```
//!
//! 配置一旦交给 `init` 就视为不可变，会话内部保存自己的一份拷贝。

use crate::context::{Context, ContextExtractorFunc};
use crate::error::{LoggingError, Result};
use crate::format::{Format, DEFAULT_FORMAT};
use crate::keys::{Key, Keys};
use crate::level::{Level, DEFAULT_LEVEL};
use crate::target::{Target, DEFAULT_OUTPUT};
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use std::collections::HashMap;
use std::fmt;

/// 日志配置
#[derive(Clone, Serialize, Deserialize, SmartDefault)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// 全局日志级别
    #[default(DEFAULT_LEVEL)]
    pub level: Level,

    /// 输出格式
    #[default(DEFAULT_FORMAT)]
    pub format: Format,

    /// 输出目标
    #[default(DEFAULT_OUTPUT)]
    pub output: Target,

    /// 按 logger 名称覆盖的级别，优先于调用处传入的级别
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub custom_levels: HashMap<String, Level>,

    #[serde(skip)]
    context_extractors: HashMap<Key, ContextExtractorFunc>,
}

/// 配置选项，按传入顺序依次作用于 `Config`
pub type ConfigOption = Box<dyn FnOnce(&mut Config) + Send>;

impl Config {
    /// 使用默认值创建配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 依次应用配置选项，后面的选项覆盖前面对同一字段的修改
    pub fn apply(&mut self, options: impl IntoIterator<Item = ConfigOption>) {
        for option in options {
            option(self);
        }
    }

    /// 校验配置，遇到第一个错误即返回
    pub fn validate(&self) -> Result<()> {
        self.output
            .validate()
            .map_err(|e| LoggingError::invalid("output", e))?;
        self.format
            .validate()
            .map_err(|e| LoggingError::invalid("format", e))?;
        check_level(self.level).map_err(|e| LoggingError::invalid("level", e))?;

        for (name, level) in &self.custom_levels {
            check_level(*level)
                .map_err(|e| LoggingError::invalid(format!("customLevels.{}", name), e))?;
        }

        Ok(())
    }

    /// 计算命名 logger 的级别
    ///
    /// 优先级：`custom_levels` 中的配置 > 调用处传入的级别 > 全局级别。
    /// 注意配置中的命名级别总是胜出，即使调用处显式传入了级别。
    pub fn level_for_named(&self, name: &str, level: Option<Level>) -> Level {
        match self.custom_levels.get(name) {
            Some(custom) => *custom,
            None => level.unwrap_or(self.level),
        }
    }

    /// 运行所有已注册的提取函数，收集上下文中的字段
    ///
    /// 值为空的字段不会出现在结果中。
    pub fn context_keys(&self, ctx: &Context) -> Keys {
        let mut keys = Keys::with_capacity(self.context_extractors.len());
        for extractor in self.context_extractors.values() {
            if let (key, Some(value)) = extractor(ctx) {
                if !value.is_null() {
                    keys.insert(key, value);
                }
            }
        }
        keys
    }

    /// 已注册提取函数的字段名
    pub fn context_extractor_keys(&self) -> Vec<Key> {
        self.context_extractors.keys().cloned().collect()
    }

    /// 从 JSON 字符串加载配置（支持 JSON5 格式）
    pub fn from_json(json_str: &str) -> Result<Self> {
        json5::from_str(json_str).map_err(|e| LoggingError::Parse(e.to_string()))
    }

    /// 从 YAML 字符串加载配置
    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        serde_yaml::from_str(yaml_str).map_err(|e| LoggingError::Parse(e.to_string()))
    }

    /// 从 TOML 字符串加载配置
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| LoggingError::Parse(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| LoggingError::Parse(e.to_string()))
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| LoggingError::Parse(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| LoggingError::Parse(e.to_string()))
    }
}

fn check_level(level: Level) -> Result<()> {
    Level::try_from(level as i64).map(|_| ())
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let custom_levels: Vec<String> = self
            .custom_levels
            .iter()
            .map(|(name, level)| format!("{}='{}'", name, level))
            .collect();

        write!(
            f,
            "level='{}',format='{}',output='{}',customLevels={{{}}}",
            self.level,
            self.format,
            self.output,
            custom_levels.join(",")
        )
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("level", &self.level)
            .field("format", &self.format)
            .field("output", &self.output)
            .field("custom_levels", &self.custom_levels)
            .field("context_extractors", &self.context_extractor_keys())
            .finish()
    }
}

/// 设置全局日志级别
pub fn with_level(level: Level) -> ConfigOption {
    Box::new(move |config: &mut Config| config.level = level)
}

/// 设置输出格式
pub fn with_format(format: Format) -> ConfigOption {
    Box::new(move |config: &mut Config| config.format = format)
}

/// 设置输出目标
pub fn with_target(target: impl Into<Target>) -> ConfigOption {
    let target = target.into();
    Box::new(move |config: &mut Config| config.output = target)
}

/// 为指定名称的 logger 设置级别
pub fn with_custom_level(name: impl Into<String>, level: Level) -> ConfigOption {
    let name = name.into();
    Box::new(move |config: &mut Config| {
        config.custom_levels.insert(name, level);
    })
}

/// 注册上下文字段提取函数
///
/// 字段名通过在空上下文上调用一次提取函数得到；同名字段后注册的覆盖先注册的。
pub fn with_context_extractors(
    extractors: impl IntoIterator<Item = ContextExtractorFunc>,
) -> ConfigOption {
    let extractors: Vec<ContextExtractorFunc> = extractors.into_iter().collect();
    Box::new(move |config: &mut Config| {
        let ctx = Context::background();
        for extractor in extractors {
            let (key, _) = extractor(&ctx);
            config.context_extractors.insert(key, extractor);
        }
    })
}
