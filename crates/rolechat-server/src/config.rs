use rolechat_ai::{LlmProvider, LlmSettings};
use rolechat_core::streaming::StreamSettings;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_ENV: &str = "ROLECHAT_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "rolechat.toml";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Database file; `None` means the default data directory
    pub db_path: Option<PathBuf>,
    pub jwt_secret: String,
    pub llm: LlmSettings,
    pub stream: StreamSettings,
    pub personas_file: Option<PathBuf>,
    pub log_json: bool,
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    storage: StorageSection,
    #[serde(default)]
    auth: AuthSection,
    #[serde(default)]
    llm: LlmSettings,
    #[serde(default)]
    stream: StreamSettings,
    #[serde(default)]
    personas: PersonasSection,
    #[serde(default)]
    log: LogSection,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct StorageSection {
    #[serde(default)]
    path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct AuthSection {
    #[serde(default)]
    jwt_secret: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct PersonasSection {
    #[serde(default)]
    file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct LogSection {
    #[serde(default)]
    json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl ServerConfig {
    pub fn load() -> anyhow::Result<Self> {
        if let Some(file_config) = load_from_file()? {
            return Self::from_file(file_config);
        }

        Self::from_env()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn from_file(file: FileConfig) -> anyhow::Result<Self> {
        // The secret may live outside the file.
        let jwt_secret = file
            .auth
            .jwt_secret
            .filter(|s| !s.trim().is_empty())
            .or_else(|| env_non_empty("ROLECHAT_JWT_SECRET"));

        Ok(Self {
            host: file.server.host,
            port: file.server.port,
            db_path: file.storage.path,
            jwt_secret: require_secret(jwt_secret)?,
            llm: file.llm,
            stream: file.stream,
            personas_file: file.personas.file,
            log_json: file.log.json || env_flag("ROLECHAT_LOG_JSON"),
        })
    }

    fn from_env() -> anyhow::Result<Self> {
        let host = env::var("ROLECHAT_SERVER_HOST").unwrap_or_else(|_| default_host());
        let port = env::var("ROLECHAT_SERVER_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or_else(default_port);

        let mut llm = LlmSettings::default();
        if let Some(provider) = env_non_empty("ROLECHAT_LLM_PROVIDER") {
            llm.provider = LlmProvider::parse(&provider)?;
        }
        llm.model = env_non_empty("ROLECHAT_LLM_MODEL");
        llm.base_url = env_non_empty("ROLECHAT_LLM_BASE_URL");

        let defaults = StreamSettings::default();
        let stream = StreamSettings {
            heartbeat_secs: env_parse("ROLECHAT_HEARTBEAT_SECS").unwrap_or(defaults.heartbeat_secs),
            flush_threshold: env_parse("ROLECHAT_FLUSH_THRESHOLD").unwrap_or(defaults.flush_threshold),
            history_limit: env_parse("ROLECHAT_HISTORY_LIMIT").unwrap_or(defaults.history_limit),
        };

        Ok(Self {
            host,
            port,
            db_path: env_non_empty("ROLECHAT_DB_PATH").map(PathBuf::from),
            jwt_secret: require_secret(env_non_empty("ROLECHAT_JWT_SECRET"))?,
            llm,
            stream,
            personas_file: env_non_empty("ROLECHAT_PERSONAS_FILE").map(PathBuf::from),
            log_json: env_flag("ROLECHAT_LOG_JSON"),
        })
    }
}

fn require_secret(secret: Option<String>) -> anyhow::Result<String> {
    secret.ok_or_else(|| {
        anyhow::anyhow!("JWT secret is required (set [auth].jwt_secret or ROLECHAT_JWT_SECRET)")
    })
}

fn env_non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_non_empty(name).and_then(|value| value.parse().ok())
}

fn env_flag(name: &str) -> bool {
    env_non_empty(name)
        .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn load_from_file() -> anyhow::Result<Option<FileConfig>> {
    let config_path = env::var(CONFIG_ENV).ok();
    let path = if let Some(path) = config_path {
        Some(path)
    } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
        Some(DEFAULT_CONFIG_FILE.to_string())
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(None);
    };

    let contents = fs::read_to_string(&path)
        .map_err(|err| anyhow::anyhow!("Failed to read config {}: {}", path, err))?;
    Ok(Some(parse_config(&contents, &path)?))
}

fn parse_config(contents: &str, path: &str) -> anyhow::Result<FileConfig> {
    toml::from_str(contents).map_err(|err| anyhow::anyhow!("Failed to parse config {}: {}", path, err))
}
