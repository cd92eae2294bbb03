use serde::{Deserialize, Serialize};

use crate::configs::*;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub douyin: DouyinConfig,
    #[serde(default)]
    pub article: ArticleConfig,
    #[serde(default)]
    pub mail: Option<MailConfig>,
    #[serde(default)]
    pub qinglong: Option<QinglongConfig>,
    pub logging: Option<LoggingConfig>,
}

impl Config {
    /// Reads `config.toml` (falling back to `config.default.toml`) from the
    /// working directory. A missing file is not an error: every section has
    /// workable defaults except the credentialed services, which stay off.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = if std::path::Path::new("config.toml").exists() {
            "config.toml"
        } else if std::path::Path::new("config.default.toml").exists() {
            "config.default.toml"
        } else {
            return Ok(Self::default());
        };

        let config_str = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&config_str)?;
        Ok(config)
    }
}
