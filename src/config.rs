use crate::api::Session;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::{self, Write};
use std::path::Path;

const ENV_FILE: &str = ".env";
const TOKEN_VAR: &str = "BIZBOOKER_TOKEN";
const USER_ID_VAR: &str = "BIZBOOKER_USER_ID";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub tui: TuiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout() -> u64 { 10_000 }

#[derive(Debug, Deserialize, Clone)]
pub struct ListingConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Rows of look-ahead before the end of the list that trigger the next page.
    #[serde(default = "default_sentinel_threshold")]
    pub sentinel_threshold: usize,
}

fn default_page_size() -> u32 { 10 }
fn default_sentinel_threshold() -> usize { 3 }

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            sentinel_threshold: default_sentinel_threshold(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TuiConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

fn default_tick_ms() -> u64 { 100 }

impl Default for TuiConfig {
    fn default() -> Self {
        Self { tick_ms: default_tick_ms() }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .with_context(|| "Failed to parse config TOML")?;
        if config.listing.page_size == 0 {
            anyhow::bail!("listing.page_size must be at least 1");
        }
        Ok(config)
    }

    /// Load .env file into process environment. Real env vars take precedence.
    pub fn load_env_file() {
        let content = match std::fs::read_to_string(Path::new(ENV_FILE)) {
            Ok(c) => c,
            Err(_) => return,
        };
        for (key, value) in parse_env(&content) {
            if std::env::var(&key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }

    /// Session from `BIZBOOKER_TOKEN` / `BIZBOOKER_USER_ID`, without prompting.
    pub fn session_from_env() -> Session {
        let token = std::env::var(TOKEN_VAR).ok().map(|v| sanitize_key(&v));
        let user_id = std::env::var(USER_ID_VAR).ok().map(|v| sanitize_key(&v));
        Session::new(token, user_id)
    }

    /// Like [`Self::session_from_env`], but asks for whatever is missing.
    /// Prompted values are saved to .env for future runs.
    pub fn login_session(need_user_id: bool) -> Result<Session> {
        let token = match std::env::var(TOKEN_VAR) {
            Ok(t) if !t.trim().is_empty() => sanitize_key(&t),
            _ => {
                let t = prompt("BizBooker access token")?;
                save_env_var(TOKEN_VAR, &t);
                t
            }
        };
        let user_id = match std::env::var(USER_ID_VAR) {
            Ok(u) if !u.trim().is_empty() => Some(sanitize_key(&u)),
            _ if need_user_id => {
                let u = prompt("BizBooker user id")?;
                save_env_var(USER_ID_VAR, &u);
                Some(u)
            }
            _ => None,
        };
        Ok(Session::new(Some(token), user_id))
    }
}

/// KEY=VALUE lines; blank lines and `#` comments skipped, quotes and BOM stripped.
fn parse_env(content: &str) -> Vec<(String, String)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    content
        .lines()
        .map(|line| line.trim().trim_matches('\r'))
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}

fn prompt(label: &str) -> Result<String> {
    print!("  {} > ", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let value = sanitize_key(&input);
    if value.is_empty() {
        anyhow::bail!("{} cannot be empty", label);
    }
    Ok(value)
}

/// Strip carriage returns, BOM, and other invisible chars from a key value.
fn sanitize_key(raw: &str) -> String {
    raw.replace(['\r', '\u{feff}', '\u{200b}'], "")
        .trim()
        .to_string()
}

/// Append a KEY=VALUE line to .env and set it in the current process.
fn save_env_var(key: &str, value: &str) {
    std::env::set_var(key, value);
    let path = Path::new(ENV_FILE);
    let mut contents = std::fs::read_to_string(path).unwrap_or_default();
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    contents.push_str(&format!("{}={}\n", key, value));
    if let Err(e) = std::fs::write(path, contents) {
        tracing::warn!(error = %e, "could not persist {} to .env", key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parses() {
        let config = Config::load(Path::new("config.toml")).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.listing.page_size, 10);
        assert_eq!(config.listing.sentinel_threshold, 3);
        assert_eq!(config.tui.tick_ms, 100);
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = Config::parse("[api]\nbase_url = \"http://api.test\"\n").unwrap();
        assert_eq!(config.api.request_timeout_ms, 10_000);
        assert_eq!(config.listing.page_size, 10);
        assert_eq!(config.tui.tick_ms, 100);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let toml = "[api]\nbase_url = \"http://api.test\"\n[listing]\npage_size = 0\n";
        assert!(Config::parse(toml).is_err());
    }

    #[test]
    fn test_parse_env_lines() {
        let parsed = parse_env("\u{feff}# creds\nBIZBOOKER_TOKEN=\"abc\"\r\n\nBIZBOOKER_USER_ID = '7'\nbogus\n");
        assert_eq!(
            parsed,
            vec![
                ("BIZBOOKER_TOKEN".to_string(), "abc".to_string()),
                ("BIZBOOKER_USER_ID".to_string(), "7".to_string()),
            ]
        );
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("\u{feff}tok\u{200b}en\r\n"), "token");
    }
}
