//! Network tile source configuration parsed from environment variables.

use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_TILE_HOST: &str = "tile.openstreetmap.org";
pub const DEFAULT_TILE_PORT: u16 = 80;
pub const DEFAULT_TILE_URI: &str = "/{z}/{x}/{y}.png";
pub const DEFAULT_TILE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TILE_MAX_ZOOM: u32 = 19;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSourceConfig {
    pub host: String,
    pub port: u16,
    /// Request path with `{z}`, `{x}` and `{y}` placeholders.
    pub uri_template: String,
    /// Applies to connecting and to every read/write; `None` blocks forever.
    pub timeout: Option<Duration>,
    pub max_zoom: u32,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_TILE_HOST.to_string(),
            port: DEFAULT_TILE_PORT,
            uri_template: DEFAULT_TILE_URI.to_string(),
            timeout: Some(Duration::from_secs(DEFAULT_TILE_TIMEOUT_SECS)),
            max_zoom: DEFAULT_TILE_MAX_ZOOM,
        }
    }
}

impl HttpSourceConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `HYDROMAP_TILE_HOST`: default `tile.openstreetmap.org`
    /// - `HYDROMAP_TILE_PORT`: default 80
    /// - `HYDROMAP_TILE_URI`: default `/{z}/{x}/{y}.png`
    /// - `HYDROMAP_TILE_TIMEOUT_SECS`: default 30, `0` disables the timeout
    /// - `HYDROMAP_TILE_MAX_ZOOM`: default 19
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HYDROMAP_TILE_HOST").unwrap_or_else(|| DEFAULT_TILE_HOST.to_string());
        let port = parse_var(&lookup, "HYDROMAP_TILE_PORT", DEFAULT_TILE_PORT)?;
        let uri_template =
            lookup("HYDROMAP_TILE_URI").unwrap_or_else(|| DEFAULT_TILE_URI.to_string());
        let timeout_secs =
            parse_var(&lookup, "HYDROMAP_TILE_TIMEOUT_SECS", DEFAULT_TILE_TIMEOUT_SECS)?;
        let max_zoom = parse_var(&lookup, "HYDROMAP_TILE_MAX_ZOOM", DEFAULT_TILE_MAX_ZOOM)?;

        let config = Self {
            host,
            port,
            uri_template,
            timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
            max_zoom,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.uri_template;
        let placeholders = ["{z}", "{x}", "{y}"].iter().all(|p| t.contains(p));
        if !t.starts_with('/') || !placeholders {
            return Err(ConfigError::UriTemplate(t.clone()));
        }
        if self.host.is_empty() || self.host.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidValue {
                var: "HYDROMAP_TILE_HOST".into(),
                value: self.host.clone(),
            });
        }
        if self.max_zoom > 30 {
            return Err(ConfigError::InvalidValue {
                var: "HYDROMAP_TILE_MAX_ZOOM".into(),
                value: self.max_zoom.to_string(),
            });
        }
        Ok(())
    }

    /// Request path for a tile.
    pub fn uri(&self, zoom: u32, x: u32, y: u32) -> String {
        self.uri_template
            .replace("{z}", &zoom.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

fn parse_var<F, T>(lookup: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var: var.to_string(),
            value: raw,
        }),
    }
}
