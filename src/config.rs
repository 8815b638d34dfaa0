use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub ollama_timeout_secs: u64,
    pub max_generation_attempts: u32,
    pub retry_delay_ms: u64,
    pub client_max_attempts: u32,
    pub client_retry_delay_ms: u64,
    pub database_url: Option<String>,
    pub catalog_path: Option<String>,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            ollama_url: get_env("OLLAMA_URL")?,
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3".to_string()),
            ollama_timeout_secs: get_env_parse_or("OLLAMA_TIMEOUT_SECS", 30)?,
            max_generation_attempts: get_env_parse_or("MAX_GENERATION_ATTEMPTS", 10)?,
            retry_delay_ms: get_env_parse_or("RETRY_DELAY_MS", 500)?,
            client_max_attempts: get_env_parse_or("CLIENT_MAX_ATTEMPTS", 3)?,
            client_retry_delay_ms: get_env_parse_or("CLIENT_RETRY_DELAY_MS", 1000)?,
            database_url: env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            catalog_path: env::var("CATALOG_PATH").ok().filter(|v| !v.is_empty()),
        })
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            max_attempts: self.max_generation_attempts.max(1),
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            rng_seed: None,
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.ollama_url.clone(),
            model: self.ollama_model.clone(),
            timeout: Duration::from_secs(self.ollama_timeout_secs),
            max_attempts: self.client_max_attempts.max(1),
            retry_delay: Duration::from_millis(self.client_retry_delay_ms),
        }
    }
}

/// Tunables for the generation loop.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub max_attempts: u32,
    pub retry_delay: Duration,
    /// Fixed seed for reproducible runs; `None` draws from OS entropy.
    pub rng_seed: Option<u64>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            retry_delay: Duration::from_millis(500),
            rng_seed: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "llama3".to_string(),
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
