use std::path::PathBuf;

/// File name of the DuckDB database inside `data_dir`.
pub const DB_FILE_NAME: &str = "glimpse.db";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: String,
    pub geoip_path: String,
    pub duckdb_memory_limit: String,
    /// Explicit HS256 secret. When unset the server uses the one persisted in
    /// the store's settings table.
    pub token_secret: Option<String>,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            port: lookup("GLIMPSE_PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            data_dir: lookup("GLIMPSE_DATA_DIR").unwrap_or_else(|| "./data".to_string()),
            geoip_path: lookup("GLIMPSE_GEOIP_PATH")
                .unwrap_or_else(|| "./GeoLite2-City.mmdb".to_string()),
            duckdb_memory_limit: {
                let raw = lookup("GLIMPSE_DUCKDB_MEMORY").unwrap_or_else(|| "1GB".to_string());
                validate_memory_limit(&raw)?;
                raw
            },
            token_secret: lookup("GLIMPSE_TOKEN_SECRET").filter(|s| !s.trim().is_empty()),
            cors_origins: lookup("GLIMPSE_CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }

    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(DB_FILE_NAME)
    }
}

/// DuckDB memory limits look like `512MB` or `2GB`. The value ends up inside a
/// `SET memory_limit` statement, so nothing else is allowed through.
fn validate_memory_limit(raw: &str) -> Result<(), String> {
    let upper = raw.trim().to_ascii_uppercase();
    let digits = upper
        .strip_suffix("GB")
        .or_else(|| upper.strip_suffix("MB"))
        .ok_or_else(|| format!("invalid GLIMPSE_DUCKDB_MEMORY {raw:?}: expected e.g. 1GB"))?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!(
            "invalid GLIMPSE_DUCKDB_MEMORY {raw:?}: expected e.g. 1GB"
        ));
    }
    Ok(())
}
