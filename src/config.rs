//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `CLERK__*` 覆盖（双下划线表示嵌套，如 `CLERK__LLM__PROVIDER=openai`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub store: StoreSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            agent: AgentSection::default(),
            llm: LlmSection::default(),
            store: StoreSection::default(),
        }
    }
}

/// [agent] 段：单轮步数上限与默认语言
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    /// 单条用户消息允许的 路由→Worker 迭代上限，超出视为该轮致命错误
    pub max_steps_per_turn: usize,
    /// 会话默认 locale（写入 meta）
    pub locale: String,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_steps_per_turn: 25,
            locale: "en".to_string(),
        }
    }
}

/// [llm] 段：NLU 后端选择
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：openai / mock；无 API Key 时自动退回 mock
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// OpenAI 兼容端点，未设置时用官方默认
    pub base_url: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

/// [store] 段：SQLite 数据库路径
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub database_path: PathBuf,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("clerk.db"),
        }
    }
}

/// 从 config 目录加载配置，环境变量 CLERK__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 CLERK__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("CLERK")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
