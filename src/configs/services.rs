use serde::{Deserialize, Serialize};

/// Upstream parse service for short-video share links. Defaults match the
/// currently deployed endpoint; the secret is part of its reverse
/// engineered signing scheme and changes when the service does.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DouyinConfig {
    #[serde(default = "default_parse_api")]
    pub api_url: String,
    #[serde(default = "default_parse_origin")]
    pub origin: String,
    #[serde(default = "default_parse_secret")]
    pub secret: String,
}

impl Default for DouyinConfig {
    fn default() -> Self {
        Self {
            api_url: default_parse_api(),
            origin: default_parse_origin(),
            secret: default_parse_secret(),
        }
    }
}

fn default_parse_api() -> String {
    "https://dy.kukutool.com/api/parse".to_string()
}

fn default_parse_origin() -> String {
    "https://dy.kukutool.com".to_string()
}

fn default_parse_secret() -> String {
    "5Q0NvQxD0zdQ5RLQy5xs".to_string()
}

/// How scraped article images are relayed back to the chat platform.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageRelayMode {
    /// Forward by MD5 through the platform emoji API.
    #[default]
    Emoji,
    /// Send the raw image as a base64 attachment.
    Base64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ArticleConfig {
    #[serde(default)]
    pub relay: ImageRelayMode,
}

/// Temporary mailbox to watch plus the relay target naming.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MailConfig {
    #[serde(default = "default_mail_api")]
    pub api_base: String,
    /// Mailbox address, e.g. `aafob@mailto.plus`.
    pub address: String,
    #[serde(default)]
    pub epin: String,
    #[serde(default = "default_mail_limit")]
    pub limit: u32,
}

fn default_mail_api() -> String {
    "https://tempmail.plus/api".to_string()
}

fn default_mail_limit() -> u32 {
    20
}

/// Qinglong job scheduler open API credentials.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct QinglongConfig {
    pub url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Environment variable receiving collected credentials.
    #[serde(default = "default_env_name")]
    pub env_name: String,
}

fn default_env_name() -> String {
    "xiaomi".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn douyin_defaults_fill_in() {
        let config: DouyinConfig = toml::from_str("").unwrap();
        assert_eq!(config.api_url, "https://dy.kukutool.com/api/parse");
        assert_eq!(config.secret.len(), 20);
    }

    #[test]
    fn relay_mode_parses_lowercase() {
        let config: ArticleConfig = toml::from_str("relay = \"base64\"").unwrap();
        assert_eq!(config.relay, ImageRelayMode::Base64);
        assert_eq!(ArticleConfig::default().relay, ImageRelayMode::Emoji);
    }

    #[test]
    fn mail_config_requires_only_address() {
        let config: MailConfig = toml::from_str("address = \"abc@mailto.plus\"").unwrap();
        assert_eq!(config.api_base, "https://tempmail.plus/api");
        assert_eq!(config.limit, 20);
        assert_eq!(config.epin, "");
    }
}
