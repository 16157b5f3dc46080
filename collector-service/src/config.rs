use serde::Deserialize;
use std::{fs, time::Duration};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub inverter_endpoint: String,
    /// Empty disables P1 collection.
    pub p1_endpoint: String,
    pub request_timeout_secs: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            inverter_endpoint: "http://192.168.1.50/real_time_data.xml".to_string(),
            p1_endpoint: String::new(),
            request_timeout_secs: 10,
        }
    }
}

impl SourcesConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn p1_enabled(&self) -> bool {
        !self.p1_endpoint.trim().is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Full connection string; takes precedence over the discrete fields.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            user: "solar_user".to_string(),
            password: String::new(),
            name: "solar_inverter".to_string(),
            max_connections: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// node-exporter textfile the run's metrics are written to.
    pub textfile_path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sources: SourcesConfig,
    pub database: DatabaseConfig,
    pub log_level: String,
    pub metrics: Option<MetricsConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sources: SourcesConfig::default(),
            database: DatabaseConfig::default(),
            log_level: "info".to_string(),
            metrics: None,
        }
    }
}

impl AppConfig {
    /// Load `.env`, then the TOML file named by `COLLECTOR_CONFIG` (if any),
    /// then apply environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let _ = dotenvy::dotenv();

        let base = match env::var("COLLECTOR_CONFIG") {
            Ok(path) => {
                let contents = fs::read_to_string(&path)
                    .map_err(|e| anyhow::anyhow!("failed to read {path}: {e}"))?;
                toml::from_str(&contents)?
            }
            Err(_) => AppConfig::default(),
        };

        base.with_overrides(|key| env::var(key).ok())
    }

    /// Apply `KEY=value` overrides (the collector's environment variables)
    /// using `lookup` to resolve each key.
    pub fn with_overrides<F>(mut self, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SOLAR_XML_ENDPOINT") {
            self.sources.inverter_endpoint = v;
        }
        if let Some(v) = lookup("P1_ENDPOINT") {
            self.sources.p1_endpoint = v;
        }
        if let Some(v) = lookup("REQUEST_TIMEOUT") {
            self.sources.request_timeout_secs = v
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid REQUEST_TIMEOUT '{v}': {e}"))?;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.log_level = v.trim().to_lowercase();
        }
        if let Some(v) = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            self.database.url = Some(v);
        }
        if let Some(v) = lookup("DB_HOST") {
            self.database.host = v;
        }
        if let Some(v) = lookup("DB_PORT") {
            self.database.port = v
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid DB_PORT '{v}': {e}"))?;
        }
        if let Some(v) = lookup("DB_USER") {
            self.database.user = v;
        }
        if let Some(v) = lookup("DB_PASSWORD") {
            self.database.password = v;
        }
        if let Some(v) = lookup("DB_NAME") {
            self.database.name = v;
        }
        if let Some(v) = lookup("DB_MAX_CONNECTIONS") {
            self.database.max_connections = v
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid DB_MAX_CONNECTIONS '{v}': {e}"))?;
        }
        if let Some(v) = lookup("METRICS_TEXTFILE").filter(|v| !v.trim().is_empty()) {
            self.metrics = Some(MetricsConfig { textfile_path: v });
        }

        if self.sources.request_timeout_secs == 0 {
            anyhow::bail!("request timeout must be at least one second");
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_disable_p1() {
        let cfg = AppConfig::default().with_overrides(lookup(&[])).unwrap();

        assert_eq!(cfg.sources.inverter_endpoint, "http://192.168.1.50/real_time_data.xml");
        assert!(!cfg.sources.p1_enabled());
        assert_eq!(cfg.sources.request_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.metrics.is_none());
    }

    #[test]
    fn environment_overrides_apply() {
        let cfg = AppConfig::default()
            .with_overrides(lookup(&[
                ("SOLAR_XML_ENDPOINT", "http://10.0.0.5/real_time_data.xml"),
                ("P1_ENDPOINT", "http://10.0.0.6/api/v1/data"),
                ("REQUEST_TIMEOUT", "3"),
                ("LOG_LEVEL", "DEBUG"),
                ("DB_HOST", "db.lan"),
                ("DB_PORT", "6543"),
                ("DB_PASSWORD", "secret"),
                ("METRICS_TEXTFILE", "/var/lib/node_exporter/collector.prom"),
            ]))
            .unwrap();

        assert_eq!(cfg.sources.inverter_endpoint, "http://10.0.0.5/real_time_data.xml");
        assert!(cfg.sources.p1_enabled());
        assert_eq!(cfg.sources.request_timeout_secs, 3);
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.database.host, "db.lan");
        assert_eq!(cfg.database.port, 6543);
        assert_eq!(cfg.database.password, "secret");
        assert_eq!(cfg.database.user, "solar_user");
        assert_eq!(
            cfg.metrics.map(|m| m.textfile_path).as_deref(),
            Some("/var/lib/node_exporter/collector.prom")
        );
    }

    #[test]
    fn blank_p1_endpoint_stays_disabled() {
        let cfg = AppConfig::default()
            .with_overrides(lookup(&[("P1_ENDPOINT", "  ")]))
            .unwrap();
        assert!(!cfg.sources.p1_enabled());
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        assert!(AppConfig::default()
            .with_overrides(lookup(&[("REQUEST_TIMEOUT", "ten")]))
            .is_err());
        assert!(AppConfig::default()
            .with_overrides(lookup(&[("REQUEST_TIMEOUT", "0")]))
            .is_err());
        assert!(AppConfig::default()
            .with_overrides(lookup(&[("DB_PORT", "-1")]))
            .is_err());
    }

    #[test]
    fn toml_file_then_env() {
        let toml_src = r#"
            log_level = "warn"

            [sources]
            inverter_endpoint = "http://inverter.lan/real_time_data.xml"
            p1_endpoint = "http://p1.lan/api/v1/data"

            [database]
            url = "postgres://collector:pw@db.lan/solar"
            max_connections = 4
        "#;
        let base: AppConfig = toml::from_str(toml_src).unwrap();
        let cfg = base
            .with_overrides(lookup(&[("P1_ENDPOINT", "")]))
            .unwrap();

        assert_eq!(cfg.log_level, "warn");
        assert_eq!(cfg.sources.inverter_endpoint, "http://inverter.lan/real_time_data.xml");
        assert_eq!(cfg.sources.request_timeout_secs, 10);
        assert!(!cfg.sources.p1_enabled());
        assert_eq!(cfg.database.url.as_deref(), Some("postgres://collector:pw@db.lan/solar"));
        assert_eq!(cfg.database.max_connections, 4);
        assert_eq!(cfg.database.name, "solar_inverter");
    }
}
