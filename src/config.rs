use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub max_body_bytes: usize,
    pub cors_allowed_origins: Vec<String>,
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            data_dir: PathBuf::from("data"),
            max_body_bytes: 1024 * 1024,
            cors_allowed_origins: Vec::new(),
            log_json: false,
        }
    }
}

impl ServerConfig {
    /// Reads `SCHOOLD_*` variables; anything unset or unparsable keeps its default.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            bind_addr: env::var("SCHOOLD_BIND").unwrap_or(d.bind_addr),
            data_dir: env::var("SCHOOLD_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(d.data_dir),
            max_body_bytes: env_usize("SCHOOLD_MAX_BODY_BYTES", d.max_body_bytes),
            cors_allowed_origins: env_list("SCHOOLD_CORS_ORIGINS"),
            log_json: env_bool("SCHOOLD_LOG_JSON", d.log_json),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| parse_bool(&v))
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_list(name: &str) -> Vec<String> {
    env::var(name).map(|v| split_list(&v)).unwrap_or_default()
}
