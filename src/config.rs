//! Configuration management

use anyhow::Result;
use reqwest::Url;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Address the proxy listens on
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    /// Path of the SQLite database file (parent directory created if missing)
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Base URL of the upstream collector API
    #[serde(default = "default_proxied_url")]
    pub proxied_url: String,
    /// Log one line per forwarded request/response
    #[serde(default)]
    pub log_requests: bool,
    /// Dump headers and bodies of every proxied exchange (implies log_requests)
    #[serde(default)]
    pub debug_log: bool,
    /// Answer submission requests locally instead of contacting the upstream
    #[serde(default)]
    pub do_not_submit_attacks: bool,
}

fn default_listen_address() -> String {
    "0.0.0.0:8161".to_string()
}

fn default_database_path() -> String {
    "data/attacks.db".to_string()
}

fn default_proxied_url() -> String {
    "https://api.netwatch.team".to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("NETWATCH_PROXY").try_parsing(true));

        let settings = builder.build()?;
        let mut config: Config = settings.try_deserialize()?;

        // Debug logging always includes request logging.
        config.log_requests = config.log_requests || config.debug_log;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.listen_address.is_empty() {
            anyhow::bail!("Listen address cannot be empty");
        }
        if self.database_path.is_empty() {
            anyhow::bail!("Database path cannot be empty");
        }
        if self.proxied_url.is_empty() {
            anyhow::bail!("Proxied URL must be set");
        }
        if let Err(e) = Url::parse(&self.proxied_url) {
            anyhow::bail!("Could not parse proxied URL '{}': {}", self.proxied_url, e);
        }

        Ok(())
    }

    /// The upstream base URL, already validated by `load`.
    pub fn upstream_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.proxied_url)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            database_path: default_database_path(),
            proxied_url: default_proxied_url(),
            log_requests: false,
            debug_log: false,
            do_not_submit_attacks: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.upstream_url().unwrap().scheme(), "https");
    }

    #[test]
    fn rejects_unparseable_upstream() {
        let config = Config {
            proxied_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_upstream() {
        let config = Config {
            proxied_url: String::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
