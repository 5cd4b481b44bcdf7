use anyhow::Result;

use crate::backend::rand_hex;
use crate::DuckDbBackend;

const TOKEN_SECRET_KEY: &str = "token_secret";

impl DuckDbBackend {
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT value FROM settings WHERE key = ?1")?;
        let mut rows = stmt.query(duckdb::params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get::<_, String>(0)?)),
            None => Ok(None),
        }
    }

    pub async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
            duckdb::params![key, value],
        )?;
        Ok(())
    }

    /// Return the persisted token signing secret, generating it on first use.
    pub async fn ensure_token_secret(&self) -> Result<String> {
        if let Some(secret) = self.get_setting(TOKEN_SECRET_KEY).await? {
            return Ok(secret);
        }
        let secret = rand_hex(32);
        self.set_setting(TOKEN_SECRET_KEY, &secret).await?;
        tracing::info!("generated new token secret");
        Ok(secret)
    }
}
