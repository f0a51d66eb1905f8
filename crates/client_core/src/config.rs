use std::{path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use url::Url;

const DEFAULT_SETTINGS_FILE: &str = "dashboard";
const ENV_PREFIX: &str = "APP";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    Token,
    Bearer,
}

impl AuthScheme {
    pub fn header_prefix(self) -> &'static str {
        match self {
            AuthScheme::Token => "Token",
            AuthScheme::Bearer => "Bearer",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub api_base_url: String,
    pub auth_scheme: AuthScheme,
    /// Environment variable the default credential provider reads.
    pub token_env: String,
    pub request_timeout_secs: u64,
    /// Overrides the resource's default page size.
    pub page_size: Option<u32>,
    /// Overrides the resource's default search quiet period.
    pub debounce_ms: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000".into(),
            auth_scheme: AuthScheme::Token,
            token_env: "DASHBOARD_TOKEN".into(),
            request_timeout_secs: 30,
            page_size: None,
            debounce_ms: None,
        }
    }
}

impl EngineSettings {
    pub fn base_url(&self) -> anyhow::Result<Url> {
        let url = Url::parse(self.api_base_url.trim())
            .with_context(|| format!("invalid api_base_url '{}'", self.api_base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("api_base_url must start with http:// or https://");
        }
        Ok(url)
    }

    pub fn debounce_override(&self) -> Option<Duration> {
        self.debounce_ms.map(Duration::from_millis)
    }
}

/// Defaults, then `dashboard.toml` (or `path`), then `APP__*` variables.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<EngineSettings> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name(DEFAULT_SETTINGS_FILE).required(false),
    };

    let settings: EngineSettings = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("failed to read dashboard settings")?
        .try_deserialize()
        .context("failed to parse dashboard settings")?;

    settings.base_url()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use std::{
        env, fs,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let settings = EngineSettings::default();
        assert_eq!(settings.auth_scheme, AuthScheme::Token);
        assert_eq!(
            settings.base_url().expect("url").as_str(),
            "http://127.0.0.1:8000/"
        );
        assert_eq!(settings.debounce_override(), None);
    }

    #[test]
    fn rejects_non_http_base_url() {
        let settings = EngineSettings {
            api_base_url: "ftp://example.com".into(),
            ..EngineSettings::default()
        };
        assert!(settings.base_url().is_err());
    }

    #[test]
    fn reads_explicit_settings_file() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let dir = env::temp_dir().join(format!("dashboard_settings_test_{suffix}"));
        fs::create_dir_all(&dir).expect("temp dir");
        let path = dir.join("dashboard.toml");
        fs::write(
            &path,
            "api_base_url = \"https://api.example.org\"\nauth_scheme = \"bearer\"\ndebounce_ms = 450\npage_size = 50\n",
        )
        .expect("write settings");

        let settings = load_settings(Some(&path)).expect("load settings");
        assert_eq!(settings.api_base_url, "https://api.example.org");
        assert_eq!(settings.auth_scheme, AuthScheme::Bearer);
        assert_eq!(settings.debounce_override(), Some(Duration::from_millis(450)));
        assert_eq!(settings.page_size, Some(50));
        assert_eq!(settings.request_timeout_secs, 30);

        fs::remove_dir_all(dir).expect("cleanup");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let path = env::temp_dir().join("dashboard_settings_does_not_exist.toml");
        assert!(load_settings(Some(&path)).is_err());
    }
}
