use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub gemini: GeminiConfig,
    pub wallet: WalletConfig,
    pub search: SearchConfig,
    pub location: LocationConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub project_id: String,
    pub location: String,
    pub model: String,
    pub credentials_path: PathBuf,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct WalletConfig {
    pub issuer_id: String,
    pub credentials_path: PathBuf,
    /// Frontend origins embedded in the save-to-wallet token claims.
    pub origins: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Optional on purpose: the price handler degrades to an explicit
    /// unavailability message when credentials are absent.
    pub api_key: Option<SecretString>,
    pub engine_id: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LocationConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub gemini_project_id: Option<String>,
    pub gemini_location: Option<String>,
    pub gemini_model: Option<String>,
    pub gemini_credentials_path: Option<PathBuf>,
    pub wallet_issuer_id: Option<String>,
    pub wallet_credentials_path: Option<PathBuf>,
    pub search_api_key: Option<String>,
    pub search_engine_id: Option<String>,
    /// Skips the credentials-file existence checks; used by tests that never
    /// open the files.
    pub skip_credential_file_checks: bool,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://receiptly.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            gemini: GeminiConfig {
                project_id: String::new(),
                location: String::new(),
                model: "gemini-1.5-flash-001".to_string(),
                credentials_path: PathBuf::from("gemini-credentials.json"),
                timeout_secs: 60,
            },
            wallet: WalletConfig {
                issuer_id: String::new(),
                credentials_path: PathBuf::from("google-wallet-credentials.json"),
                origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:3001".to_string(),
                ],
            },
            search: SearchConfig { api_key: None, engine_id: None, timeout_secs: 10 },
            location: LocationConfig {
                endpoint: "https://ipapi.co/json/".to_string(),
                timeout_secs: 5,
            },
            server: ServerConfig {
                bind_address: "0.0.0.0".to_string(),
                port: 5001,
                health_check_port: 8080,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("receiptly.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        let skip_file_checks = options.overrides.skip_credential_file_checks;
        config.apply_overrides(options.overrides);
        config.validate(skip_file_checks)?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(gemini) = patch.gemini {
            if let Some(project_id) = gemini.project_id {
                self.gemini.project_id = project_id;
            }
            if let Some(location) = gemini.location {
                self.gemini.location = location;
            }
            if let Some(model) = gemini.model {
                self.gemini.model = model;
            }
            if let Some(credentials_path) = gemini.credentials_path {
                self.gemini.credentials_path = PathBuf::from(credentials_path);
            }
            if let Some(timeout_secs) = gemini.timeout_secs {
                self.gemini.timeout_secs = timeout_secs;
            }
        }

        if let Some(wallet) = patch.wallet {
            if let Some(issuer_id) = wallet.issuer_id {
                self.wallet.issuer_id = issuer_id;
            }
            if let Some(credentials_path) = wallet.credentials_path {
                self.wallet.credentials_path = PathBuf::from(credentials_path);
            }
            if let Some(origins) = wallet.origins {
                self.wallet.origins = origins;
            }
        }

        if let Some(search) = patch.search {
            if let Some(api_key_value) = search.api_key {
                self.search.api_key = Some(secret_value(api_key_value));
            }
            if let Some(engine_id) = search.engine_id {
                self.search.engine_id = Some(engine_id);
            }
            if let Some(timeout_secs) = search.timeout_secs {
                self.search.timeout_secs = timeout_secs;
            }
        }

        if let Some(location) = patch.location {
            if let Some(endpoint) = location.endpoint {
                self.location.endpoint = endpoint;
            }
            if let Some(timeout_secs) = location.timeout_secs {
                self.location.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("RECEIPTLY_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("RECEIPTLY_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("RECEIPTLY_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("RECEIPTLY_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("RECEIPTLY_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("RECEIPTLY_GEMINI_PROJECT_ID") {
            self.gemini.project_id = value;
        }
        if let Some(value) = read_env("RECEIPTLY_GEMINI_LOCATION") {
            self.gemini.location = value;
        }
        if let Some(value) = read_env("RECEIPTLY_GEMINI_MODEL") {
            self.gemini.model = value;
        }
        if let Some(value) = read_env("RECEIPTLY_GEMINI_CREDENTIALS_PATH") {
            self.gemini.credentials_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("RECEIPTLY_GEMINI_TIMEOUT_SECS") {
            self.gemini.timeout_secs = parse_u64("RECEIPTLY_GEMINI_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("RECEIPTLY_WALLET_ISSUER_ID") {
            self.wallet.issuer_id = value;
        }
        if let Some(value) = read_env("RECEIPTLY_WALLET_CREDENTIALS_PATH") {
            self.wallet.credentials_path = PathBuf::from(value);
        }

        if let Some(value) = read_env("RECEIPTLY_SEARCH_API_KEY") {
            self.search.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("RECEIPTLY_SEARCH_ENGINE_ID") {
            self.search.engine_id = Some(value);
        }
        if let Some(value) = read_env("RECEIPTLY_SEARCH_TIMEOUT_SECS") {
            self.search.timeout_secs = parse_u64("RECEIPTLY_SEARCH_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("RECEIPTLY_LOCATION_ENDPOINT") {
            self.location.endpoint = value;
        }
        if let Some(value) = read_env("RECEIPTLY_LOCATION_TIMEOUT_SECS") {
            self.location.timeout_secs = parse_u64("RECEIPTLY_LOCATION_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("RECEIPTLY_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("RECEIPTLY_SERVER_PORT") {
            self.server.port = parse_u16("RECEIPTLY_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("RECEIPTLY_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("RECEIPTLY_SERVER_HEALTH_CHECK_PORT", &value)?;
        }

        let log_level =
            read_env("RECEIPTLY_LOGGING_LEVEL").or_else(|| read_env("RECEIPTLY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("RECEIPTLY_LOGGING_FORMAT").or_else(|| read_env("RECEIPTLY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(project_id) = overrides.gemini_project_id {
            self.gemini.project_id = project_id;
        }
        if let Some(location) = overrides.gemini_location {
            self.gemini.location = location;
        }
        if let Some(model) = overrides.gemini_model {
            self.gemini.model = model;
        }
        if let Some(path) = overrides.gemini_credentials_path {
            self.gemini.credentials_path = path;
        }
        if let Some(issuer_id) = overrides.wallet_issuer_id {
            self.wallet.issuer_id = issuer_id;
        }
        if let Some(path) = overrides.wallet_credentials_path {
            self.wallet.credentials_path = path;
        }
        if let Some(api_key) = overrides.search_api_key {
            self.search.api_key = Some(secret_value(api_key));
        }
        if let Some(engine_id) = overrides.search_engine_id {
            self.search.engine_id = Some(engine_id);
        }
    }

    pub fn validate(&self, skip_credential_file_checks: bool) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_gemini(&self.gemini, skip_credential_file_checks)?;
        validate_wallet(&self.wallet, skip_credential_file_checks)?;
        validate_search(&self.search)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("receiptly.toml"), PathBuf::from("config/receiptly.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_gemini(gemini: &GeminiConfig, skip_file_checks: bool) -> Result<(), ConfigError> {
    if gemini.project_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "gemini.project_id is required (the Google Cloud project hosting the model)"
                .to_string(),
        ));
    }
    if gemini.location.trim().is_empty() {
        return Err(ConfigError::Validation(
            "gemini.location is required (the Vertex AI inference region, e.g. us-central1)"
                .to_string(),
        ));
    }
    if gemini.model.trim().is_empty() {
        return Err(ConfigError::Validation("gemini.model is required".to_string()));
    }
    if gemini.timeout_secs == 0 || gemini.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "gemini.timeout_secs must be in range 1..=300".to_string(),
        ));
    }
    if !skip_file_checks && !gemini.credentials_path.exists() {
        return Err(ConfigError::Validation(format!(
            "gemini.credentials_path not found: `{}`",
            gemini.credentials_path.display()
        )));
    }

    Ok(())
}

fn validate_wallet(wallet: &WalletConfig, skip_file_checks: bool) -> Result<(), ConfigError> {
    if wallet.issuer_id.trim().is_empty() {
        return Err(ConfigError::Validation(
            "wallet.issuer_id is required. Get it from the Google Pay & Wallet console"
                .to_string(),
        ));
    }
    if !skip_file_checks && !wallet.credentials_path.exists() {
        return Err(ConfigError::Validation(format!(
            "wallet.credentials_path not found: `{}`",
            wallet.credentials_path.display()
        )));
    }
    if wallet.origins.is_empty() {
        return Err(ConfigError::Validation(
            "wallet.origins must list at least one frontend origin".to_string(),
        ));
    }

    Ok(())
}

fn validate_search(search: &SearchConfig) -> Result<(), ConfigError> {
    // Absent credentials are fine (the handler degrades); present-but-empty or
    // half-configured credentials are a misconfiguration worth failing on.
    let key_present = search
        .api_key
        .as_ref()
        .map(|value| !value.expose_secret().trim().is_empty())
        .unwrap_or(false);
    let key_blank = search.api_key.is_some() && !key_present;
    if key_blank {
        return Err(ConfigError::Validation("search.api_key must not be blank".to_string()));
    }

    let engine_present =
        search.engine_id.as_ref().map(|value| !value.trim().is_empty()).unwrap_or(false);
    if search.engine_id.is_some() && !engine_present {
        return Err(ConfigError::Validation("search.engine_id must not be blank".to_string()));
    }

    if key_present != engine_present {
        return Err(ConfigError::Validation(
            "search.api_key and search.engine_id must be configured together".to_string(),
        ));
    }

    if search.timeout_secs == 0 || search.timeout_secs > 60 {
        return Err(ConfigError::Validation(
            "search.timeout_secs must be in range 1..=60".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }
    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }
    if server.health_check_port == server.port {
        return Err(ConfigError::Validation(
            "server.health_check_port must differ from server.port".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    gemini: Option<GeminiPatch>,
    wallet: Option<WalletPatch>,
    search: Option<SearchPatch>,
    location: Option<LocationPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct GeminiPatch {
    project_id: Option<String>,
    location: Option<String>,
    model: Option<String>,
    credentials_path: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct WalletPatch {
    issuer_id: Option<String>,
    credentials_path: Option<String>,
    origins: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPatch {
    api_key: Option<String>,
    engine_id: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LocationPatch {
    endpoint: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
