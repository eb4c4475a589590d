use std::env;
use std::net::{AddrParseError, SocketAddr};

use thiserror::Error;

const DEFAULT_ADDR: &str = "0.0.0.0:25917";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("无效的监听地址 {value}: {source}")]
    InvalidAddr { value: String, source: AddrParseError },

    #[error("环境变量 {name} 的值 {value} 不是有效的布尔值")]
    InvalidBool { name: &'static str, value: String },
}

/// 服务器配置，从环境变量读取
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `BINGO_ADDR`，默认 0.0.0.0:25917
    pub addr: SocketAddr,
    /// `BINGO_SEED_TEMPLATES`，启动时是否载入内置主题，默认 true
    pub seed_templates: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let addr_value = lookup("BINGO_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_value
            .parse::<SocketAddr>()
            .map_err(|source| ConfigError::InvalidAddr { value: addr_value.clone(), source })?;

        let seed_templates = match lookup("BINGO_SEED_TEMPLATES") {
            None => true,
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(ConfigError::InvalidBool { name: "BINGO_SEED_TEMPLATES", value }),
            },
        };

        Ok(ServerConfig { addr, seed_templates })
    }
}
