use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use leadsift_core::rules::{ContactPolicy, PolicyPreset, RecencyMode};
use leadsift_core::CoreError;
use serde::Deserialize;
use thiserror::Error;

const APP_DIR: &str = "leadsift";
const CONFIG_FILENAME: &str = "config.toml";

pub const DEFAULT_DAYS_BACK: u32 = 60;
pub const DEFAULT_MAX_MESSAGES: usize = 1000;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_INITIAL_DELAY_MS: u64 = 500;
pub const DEFAULT_RETRY_BACKOFF_FACTOR: u32 = 2;

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub policy: PolicyPreset,
    pub recency: RecencyMode,
    pub owner_addresses: Vec<String>,
    pub owner_domains: Vec<String>,
    pub exclude_domains: Vec<String>,
    pub fetch: FetchConfig,
    pub export: ExportConfig,
    pub accounts: Vec<EmailAccountConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub days_back: u32,
    pub max_messages: usize,
    pub retry_attempts: u32,
    pub retry_initial_delay_ms: u64,
    pub retry_backoff_factor: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportConfig {
    pub min_score: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAccountConfig {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password_env: String,
    pub tls: EmailTlsConfig,
    pub mailboxes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailTlsConfig {
    Tls,
    StartTls,
    None,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            days_back: DEFAULT_DAYS_BACK,
            max_messages: DEFAULT_MAX_MESSAGES,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_initial_delay_ms: DEFAULT_RETRY_INITIAL_DELAY_MS,
            retry_backoff_factor: DEFAULT_RETRY_BACKOFF_FACTOR,
        }
    }
}

impl AppConfig {
    /// Builds the aggregation policy for `preset`, layering the owner,
    /// exclusion and export settings from this config on top of it.
    pub fn contact_policy(
        &self,
        preset: PolicyPreset,
        recency: RecencyMode,
    ) -> std::result::Result<ContactPolicy, CoreError> {
        let mut policy = ContactPolicy::preset(preset)
            .with_owner(&self.owner_addresses, &self.owner_domains)?
            .with_excluded_domains(&self.exclude_domains)
            .with_recency(recency);
        if let Some(min_score) = self.export.min_score {
            policy.scoring.min_score = min_score;
        }
        Ok(policy)
    }

    /// Like [`AppConfig::contact_policy`], with the account's login added
    /// to the owner addresses when it is an email address.
    pub fn account_policy(
        &self,
        preset: PolicyPreset,
        recency: RecencyMode,
        account: &EmailAccountConfig,
    ) -> std::result::Result<ContactPolicy, CoreError> {
        let policy = self.contact_policy(preset, recency)?;
        let login = account.username.trim();
        if !login.contains('@') {
            return Ok(policy);
        }
        policy.with_owner([login], Vec::<String>::new())
    }

    pub fn account(&self, name: &str) -> Option<&EmailAccountConfig> {
        let name = name.trim();
        self.accounts
            .iter()
            .find(|account| account.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing home directory")]
    MissingHomeDir,
    #[error("invalid config path: {0}")]
    InvalidConfigPath(PathBuf),
    #[error("config file not found: {0}")]
    MissingConfigFile(PathBuf),
    #[error("config file permissions too permissive: {0}")]
    InsecurePermissions(PathBuf),
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),
    #[error("invalid recency mode: {0}")]
    InvalidRecency(String),
    #[error("invalid owner address: {0}")]
    InvalidOwnerAddress(String),
    #[error("invalid fetch.{field} value: {value}")]
    InvalidFetchField { field: &'static str, value: i64 },
    #[error("invalid email account name: {0}")]
    InvalidEmailAccountName(String),
    #[error("duplicate email account name: {0}")]
    DuplicateEmailAccountName(String),
    #[error("invalid email account {account}: {field} {reason}")]
    InvalidEmailAccountField {
        account: String,
        field: &'static str,
        reason: &'static str,
    },
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    policy: Option<String>,
    recency: Option<String>,
    owner_addresses: Option<Vec<String>>,
    owner_domains: Option<Vec<String>>,
    exclude_domains: Option<Vec<String>>,
    fetch: Option<FetchFile>,
    export: Option<ExportFile>,
    accounts: Option<Vec<AccountFile>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FetchFile {
    days_back: Option<i64>,
    max_messages: Option<i64>,
    retry_attempts: Option<i64>,
    retry_initial_delay_ms: Option<i64>,
    retry_backoff_factor: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExportFile {
    min_score: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AccountFile {
    name: String,
    host: String,
    port: Option<u16>,
    username: String,
    password_env: String,
    tls: Option<EmailTlsConfig>,
    mailboxes: Option<Vec<String>>,
}

/// Loads the config. An explicit path must exist; the default location is
/// optional and falls back to built-in defaults.
pub fn load(config_path: Option<PathBuf>) -> Result<AppConfig> {
    let explicit = config_path.is_some();
    let path = match resolve_config_path(config_path) {
        Ok(path) => path,
        Err(ConfigError::MissingHomeDir | ConfigError::InvalidConfigPath(_)) if !explicit => {
            return Ok(AppConfig::default());
        }
        Err(err) => return Err(err),
    };
    Ok(load_at_path(&path, explicit)?.unwrap_or_default())
}

pub fn resolve_config_path(custom: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = custom {
        return non_empty(path);
    }
    let base = match env::var_os("XDG_CONFIG_HOME") {
        Some(dir) => non_empty(PathBuf::from(dir))?,
        None => dirs::home_dir()
            .map(|home| home.join(".config"))
            .ok_or(ConfigError::MissingHomeDir)?,
    };
    Ok(base.join(APP_DIR).join(CONFIG_FILENAME))
}

fn non_empty(path: PathBuf) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        Err(ConfigError::InvalidConfigPath(path))
    } else {
        Ok(path)
    }
}

fn load_at_path(path: &Path, required: bool) -> Result<Option<AppConfig>> {
    match (path.exists(), required) {
        (false, true) => return Err(ConfigError::MissingConfigFile(path.to_path_buf())),
        (false, false) => return Ok(None),
        _ => {}
    }

    ensure_permissions(path)?;
    let read_error = |source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    };
    let contents = fs::read_to_string(path).map_err(read_error)?;
    let parsed = toml::from_str::<ConfigFile>(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    merge_config(parsed).map(Some)
}

fn merge_config(parsed: ConfigFile) -> Result<AppConfig> {
    let mut config = AppConfig::default();

    if let Some(policy) = parsed.policy {
        config.policy =
            PolicyPreset::parse(&policy).map_err(|_| ConfigError::InvalidPolicy(policy))?;
    }

    if let Some(recency) = parsed.recency {
        config.recency =
            RecencyMode::parse(&recency).map_err(|_| ConfigError::InvalidRecency(recency))?;
    }

    if let Some(addresses) = parsed.owner_addresses {
        for address in addresses {
            let trimmed = address.trim();
            if trimmed.is_empty() || !trimmed.contains('@') {
                return Err(ConfigError::InvalidOwnerAddress(address));
            }
            config.owner_addresses.push(trimmed.to_lowercase());
        }
    }

    config.owner_domains = clean_list(parsed.owner_domains);
    config.exclude_domains = clean_list(parsed.exclude_domains);

    if let Some(fetch) = parsed.fetch {
        if let Some(days) = fetch.days_back {
            config.fetch.days_back = positive(days, "days_back")?;
        }
        if let Some(max) = fetch.max_messages {
            config.fetch.max_messages = positive(max, "max_messages")? as usize;
        }
        if let Some(attempts) = fetch.retry_attempts {
            if !(0..=10).contains(&attempts) {
                return Err(ConfigError::InvalidFetchField {
                    field: "retry_attempts",
                    value: attempts,
                });
            }
            config.fetch.retry_attempts = attempts as u32;
        }
        if let Some(delay) = fetch.retry_initial_delay_ms {
            if delay < 0 {
                return Err(ConfigError::InvalidFetchField {
                    field: "retry_initial_delay_ms",
                    value: delay,
                });
            }
            config.fetch.retry_initial_delay_ms = delay as u64;
        }
        if let Some(factor) = fetch.retry_backoff_factor {
            config.fetch.retry_backoff_factor = positive(factor, "retry_backoff_factor")?;
        }
    }

    if let Some(export) = parsed.export {
        config.export.min_score = export.min_score;
    }

    if let Some(accounts) = parsed.accounts {
        let mut names = HashSet::new();
        for account in accounts {
            let account = merge_account(account)?;
            if !names.insert(account.name.to_ascii_lowercase()) {
                return Err(ConfigError::DuplicateEmailAccountName(account.name));
            }
            config.accounts.push(account);
        }
    }

    Ok(config)
}

fn merge_account(account: AccountFile) -> Result<EmailAccountConfig> {
    let name = account.name.trim().to_string();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(ConfigError::InvalidEmailAccountName(account.name));
    }
    let field_error = |field: &'static str, reason: &'static str| {
        ConfigError::InvalidEmailAccountField {
            account: name.clone(),
            field,
            reason,
        }
    };

    let host = account.host.trim().to_string();
    if host.is_empty() {
        return Err(field_error("host", "cannot be empty"));
    }
    let username = account.username.trim().to_string();
    if username.is_empty() {
        return Err(field_error("username", "cannot be empty"));
    }
    let password_env = account.password_env.trim().to_string();
    if password_env.is_empty() {
        return Err(field_error("password_env", "cannot be empty"));
    }
    let tls = account.tls.unwrap_or(EmailTlsConfig::Tls);
    let port = match account.port {
        Some(0) => return Err(field_error("port", "must be positive")),
        Some(port) => port,
        None => match tls {
            EmailTlsConfig::Tls => 993,
            EmailTlsConfig::StartTls | EmailTlsConfig::None => 143,
        },
    };
    let mailboxes = clean_list_preserving_case(account.mailboxes);
    let mailboxes = if mailboxes.is_empty() {
        vec!["INBOX".to_string()]
    } else {
        mailboxes
    };

    Ok(EmailAccountConfig {
        name,
        host,
        port,
        username,
        password_env,
        tls,
        mailboxes,
    })
}

fn positive(value: i64, field: &'static str) -> Result<u32> {
    if value <= 0 || value > i64::from(u32::MAX) {
        return Err(ConfigError::InvalidFetchField { field, value });
    }
    Ok(value as u32)
}

fn clean_list(values: Option<Vec<String>>) -> Vec<String> {
    clean_list_preserving_case(values)
        .into_iter()
        .map(|value| value.trim_start_matches('@').to_lowercase())
        .collect()
}

fn clean_list_preserving_case(values: Option<Vec<String>>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values.unwrap_or_default() {
        let trimmed = value.trim();
        if !trimmed.is_empty() && !out.iter().any(|existing| existing == trimmed) {
            out.push(trimmed.to_string());
        }
    }
    out
}

/// Group or world access to the config file is refused.
#[cfg(unix)]
fn ensure_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = fs::metadata(path)
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .permissions()
        .mode();
    if mode & 0o077 == 0 {
        Ok(())
    } else {
        Err(ConfigError::InsecurePermissions(path.to_path_buf()))
    }
}

#[cfg(not(unix))]
fn ensure_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
