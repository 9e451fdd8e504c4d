use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok()
}

/// Key lookup for one profile: tries {PROFILE}_{KEY} first, falls back to {KEY}.
/// Empty values count as unset.
struct Profiled<'a> {
    profile: &'a str,
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl Profiled<'_> {
    fn opt(&self, key: &str) -> Option<String> {
        let get = |k: &str| (self.lookup)(k).filter(|s| !s.is_empty());
        if !self.profile.is_empty() {
            if let Some(v) = get(&format!("{}_{}", self.profile, key)) {
                return Some(v);
            }
        }
        get(key)
    }

    fn or(&self, key: &str, default: &str) -> String {
        self.opt(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T: FromStr>(&self, key: &str, default: T) -> T {
        self.opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub site: SiteConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `ONCALL_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("ONCALL_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        Self::from_lookup(profile, env_opt)
    }

    /// Build config for `profile`, reading keys through `lookup` instead of
    /// the process environment.
    pub fn from_lookup(profile: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let profile = profile.to_uppercase();
        let env = Profiled {
            profile: &profile,
            lookup: &lookup,
        };
        Self {
            server: ServerConfig::from_profiled(&env),
            site: SiteConfig::from_profiled(&env),
            profile,
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Static site directory, always with a trailing separator.
    pub fn www_dir(&self) -> PathBuf {
        let mut www = self.site.data_path.join(&self.site.www_path).into_os_string();
        if !www.to_string_lossy().ends_with(std::path::MAIN_SEPARATOR) {
            www.push(std::path::MAIN_SEPARATOR_STR);
        }
        PathBuf::from(www)
    }

    /// Resolve a path from config or a source list against the data root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.site.data_path.join(path)
        }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:      {}:{}", self.server.host, self.server.port);
        tracing::info!("  data:        {}", self.site.data_path.display());
        tracing::info!("  www:         {}", self.www_dir().display());
        tracing::info!(
            "  rotations:   dir={}, urls={}",
            self.resolve(&self.site.rotations_dir).display(),
            self.site.rotation_urls.len()
        );
        tracing::info!("  events:      dir={}", self.resolve(&self.site.events_dir).display());
        tracing::info!(
            "  sources:     {}",
            self.site
                .sources_file
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(directory scan)".to_string())
        );
    }

    /// Return a view safe for API responses.
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "server": { "host": self.server.host, "port": self.server.port },
            "site": {
                "www": self.www_dir(),
                "rotation_urls": self.site.rotation_urls.len(),
                "sources_file": self.site.sources_file.is_some(),
                "fetch_timeout_secs": self.site.fetch_timeout_secs,
            },
        })
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_profiled(env: &Profiled<'_>) -> Self {
        Self {
            host: env.or("HOST", "0.0.0.0"),
            port: env.parsed("PORT", 8080),
            cors_origin: env.or("CORS_ORIGIN", "*"),
        }
    }
}

// ── Site data ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub data_path: PathBuf,
    pub www_path: PathBuf,
    pub rotations_dir: PathBuf,
    pub events_dir: PathBuf,
    pub rotation_urls: Vec<String>,
    pub sources_file: Option<PathBuf>,
    pub fetch_timeout_secs: u64,
}

impl SiteConfig {
    fn from_profiled(env: &Profiled<'_>) -> Self {
        let rotation_urls = env
            .opt("ROTATION_URLS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            data_path: PathBuf::from(env.or("KO_DATA_PATH", "/var/run/ko/")),
            www_path: PathBuf::from(env.or("WWW_PATH", "www")),
            rotations_dir: PathBuf::from(env.or("ROTATIONS_DIR", "rotations")),
            events_dir: PathBuf::from(env.or("EVENTS_DIR", "events")),
            rotation_urls,
            sources_file: env.opt("SOURCES_FILE").map(PathBuf::from),
            fetch_timeout_secs: env.parsed("FETCH_TIMEOUT_SECS", 10),
        }
    }
}

// ── YAML source list ──────────────────────────────────────────

/// Explicit list of rotation sources, read from `SOURCES_FILE`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceList {
    #[serde(default)]
    pub rotations: Vec<SourceSpec>,
    #[serde(default)]
    pub events: Vec<SourceSpec>,
}

/// One entry of the source list; exactly one of `path` or `url` must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub url: Option<String>,
}

impl SourceList {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let list: SourceList = serde_yaml::from_str(text)?;
        for spec in list.rotations.iter().chain(&list.events) {
            if spec.path.is_some() == spec.url.is_some() {
                return Err(ConfigError::InvalidSource(format!(
                    "source {} must set exactly one of `path` or `url`",
                    spec.name.as_deref().unwrap_or("(unnamed)")
                )));
            }
        }
        Ok(list)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: std::collections::HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn profile_prefix_wins_over_plain_key() {
        let config = Config::from_lookup(
            "staging",
            vars(&[
                ("PORT", "8181"),
                ("STAGING_PORT", "9191"),
                ("HOST", "127.0.0.1"),
                ("STAGING_ROTATION_URLS", "https://a.example/x.txt, ,https://b.example/y.txt"),
            ]),
        );
        assert_eq!(config.profile_label(), "STAGING");
        assert_eq!(config.server.port, 9191);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(
            config.site.rotation_urls,
            vec!["https://a.example/x.txt", "https://b.example/y.txt"]
        );
    }

    #[test]
    fn defaults_apply_when_unset_or_empty() {
        let config = Config::from_lookup("", vars(&[("CORS_ORIGIN", "")]));
        assert_eq!(config.profile_label(), "default");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.cors_origin, "*");
        assert_eq!(config.site.data_path, PathBuf::from("/var/run/ko/"));
        assert_eq!(config.site.rotations_dir, PathBuf::from("rotations"));
        assert!(config.site.sources_file.is_none());
    }

    #[test]
    fn unparseable_numbers_fall_back_to_defaults() {
        let config = Config::from_lookup("", vars(&[("FETCH_TIMEOUT_SECS", "soon"), ("PORT", "-1")]));
        assert_eq!(config.site.fetch_timeout_secs, 10);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn www_dir_has_trailing_separator() {
        let mut config = Config::from_lookup("", vars(&[]));
        config.site.data_path = PathBuf::from("/srv/ko");
        config.site.www_path = PathBuf::from("www");
        let www = config.www_dir();
        assert!(www.to_string_lossy().ends_with(std::path::MAIN_SEPARATOR));
        assert!(www.starts_with("/srv/ko/www"));
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        let mut config = Config::from_lookup("", vars(&[]));
        config.site.data_path = PathBuf::from("/srv/ko");
        assert_eq!(config.resolve(Path::new("rotations")), PathBuf::from("/srv/ko/rotations"));
        assert_eq!(config.resolve(Path::new("/etc/rot.txt")), PathBuf::from("/etc/rot.txt"));
    }

    #[test]
    fn source_list_parses_paths_and_urls() {
        let list = SourceList::from_yaml(
            r#"
rotations:
  - name: serving
    path: rotations/serving.txt
  - url: https://example.com/eventing.txt
events:
  - path: events/toc.txt
"#,
        )
        .unwrap();
        assert_eq!(list.rotations.len(), 2);
        assert_eq!(list.rotations[0].name.as_deref(), Some("serving"));
        assert_eq!(list.rotations[1].url.as_deref(), Some("https://example.com/eventing.txt"));
        assert_eq!(list.events[0].path, Some(PathBuf::from("events/toc.txt")));
    }

    #[test]
    fn source_list_requires_exactly_one_location() {
        let err = SourceList::from_yaml(
            "rotations:\n  - name: both\n    path: a.txt\n    url: https://x/a.txt\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSource(_)));

        let err = SourceList::from_yaml("events:\n  - name: neither\n").unwrap_err();
        assert!(err.to_string().contains("neither"));
    }

    #[test]
    fn source_list_rejects_bad_yaml() {
        let err = SourceList::from_yaml("rotations: {{{{").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }
}
