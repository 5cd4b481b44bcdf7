use anyhow::{Context, Result};
use chrono::Utc;
use duckdb::Connection;
use uuid::Uuid;

use glimpse_core::application::Application;

use crate::backend::{bind_timestamp, read_timestamp};
use crate::DuckDbBackend;

const APP_COLUMNS: &str =
    "id, tracking_id, user_id, name, CAST(created_at AS VARCHAR) AS created_at";

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).with_context(|| format!("stored id {raw:?} is not a uuid"))
}

fn map_app_row(row: &duckdb::Row<'_>) -> duckdb::Result<(String, String, String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn into_app(raw: (String, String, String, String, String)) -> Result<Application> {
    let (id, tracking_id, user_id, name, created_at) = raw;
    Ok(Application {
        id: parse_uuid(&id)?,
        tracking_id: parse_uuid(&tracking_id)?,
        owner_id: parse_uuid(&user_id)?,
        name,
        created_at: read_timestamp(&created_at)?,
    })
}

/// Whether `owner_id` already has an app called `name`, ignoring `except`.
fn name_taken(
    conn: &Connection,
    owner_id: Uuid,
    name: &str,
    except: Option<Uuid>,
) -> Result<bool> {
    let except = except.map(|id| id.to_string()).unwrap_or_default();
    let count: i64 = conn
        .prepare("SELECT COUNT(*) FROM apps WHERE user_id = ?1 AND name = ?2 AND tracking_id <> ?3")?
        .query_row(
            duckdb::params![owner_id.to_string(), name, except],
            |row| row.get(0),
        )?;
    Ok(count > 0)
}

impl DuckDbBackend {
    /// Insert the user if the email is new and return its id.
    pub async fn upsert_user(&self, email: &str) -> Result<Uuid> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO users (id, email, created_at) VALUES (?1, ?2, CAST(?3 AS TIMESTAMP)) \
             ON CONFLICT (email) DO NOTHING",
            duckdb::params![Uuid::new_v4().to_string(), email, bind_timestamp(&Utc::now())],
        )?;
        let id: String = conn
            .prepare("SELECT id FROM users WHERE email = ?1")?
            .query_row(duckdb::params![email], |row| row.get(0))?;
        parse_uuid(&id)
    }

    pub async fn find_app_by_tracking_id(&self, tracking_id: Uuid) -> Result<Option<Application>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {APP_COLUMNS} FROM apps WHERE tracking_id = ?1"
        ))?;
        let mut rows = stmt.query_map(duckdb::params![tracking_id.to_string()], map_app_row)?;
        let app = rows.next().transpose()?.map(into_app).transpose()?;
        Ok(app)
    }

    pub async fn find_app_by_owner_and_name(
        &self,
        owner_id: Uuid,
        name: &str,
    ) -> Result<Option<Application>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {APP_COLUMNS} FROM apps WHERE user_id = ?1 AND name = ?2"
        ))?;
        let mut rows = stmt.query_map(duckdb::params![owner_id.to_string(), name], map_app_row)?;
        let app = rows.next().transpose()?.map(into_app).transpose()?;
        Ok(app)
    }

    /// Insert `app` unless its owner already uses the name. Returns `false` on
    /// a clash.
    pub async fn insert_app(&self, app: &Application) -> Result<bool> {
        let conn = self.conn.lock().await;
        if name_taken(&conn, app.owner_id, &app.name, None)? {
            return Ok(false);
        }
        conn.execute(
            "INSERT INTO apps (id, tracking_id, user_id, name, created_at) \
             VALUES (?1, ?2, ?3, ?4, CAST(?5 AS TIMESTAMP))",
            duckdb::params![
                app.id.to_string(),
                app.tracking_id.to_string(),
                app.owner_id.to_string(),
                app.name,
                bind_timestamp(&app.created_at),
            ],
        )?;
        Ok(true)
    }

    pub async fn list_apps(&self, owner_id: Uuid) -> Result<Vec<Application>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {APP_COLUMNS} FROM apps WHERE user_id = ?1 ORDER BY apps.created_at ASC, name ASC"
        ))?;
        let rows = stmt.query_map(duckdb::params![owner_id.to_string()], map_app_row)?;
        let apps = rows
            .map(|row| row.map_err(anyhow::Error::from).and_then(into_app))
            .collect::<Result<Vec<_>>>()?;
        Ok(apps)
    }

    /// Rename the app. Returns `false` when another app of the same owner
    /// already uses `name`. Renaming an app to its current name succeeds.
    pub async fn rename_app(&self, tracking_id: Uuid, name: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let owner: String = conn
            .prepare("SELECT user_id FROM apps WHERE tracking_id = ?1")?
            .query_row(duckdb::params![tracking_id.to_string()], |row| row.get(0))
            .context("app to rename does not exist")?;
        if name_taken(&conn, parse_uuid(&owner)?, name, Some(tracking_id))? {
            return Ok(false);
        }
        conn.execute(
            "UPDATE apps SET name = ?1 WHERE tracking_id = ?2",
            duckdb::params![name, tracking_id.to_string()],
        )?;
        Ok(true)
    }

    /// Delete the app and every event recorded for it.
    pub async fn delete_app(&self, tracking_id: Uuid) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let id = tracking_id.to_string();
        tx.execute("DELETE FROM events WHERE tracking_id = ?1", duckdb::params![id])?;
        tx.execute("DELETE FROM apps WHERE tracking_id = ?1", duckdb::params![id])?;
        tx.commit()?;
        tracing::info!(%tracking_id, "app deleted");
        Ok(())
    }
}
