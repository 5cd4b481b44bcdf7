use std::sync::Arc;

use thiserror::Error;

use glimpse_core::application::Application;
use glimpse_core::store::EventStore;

use crate::auth::{AuthorizedApp, Caller};

/// Longest accepted application name, in characters.
pub const MAX_APP_NAME_CHARS: usize = 100;

#[derive(Debug, Error)]
pub enum AppsError {
    #[error("name must be between 1 and {MAX_APP_NAME_CHARS} characters")]
    InvalidName,

    #[error("an app named {0:?} already exists")]
    AppExists(String),

    #[error("storage failure: {0}")]
    Storage(#[source] anyhow::Error),
}

/// Application management for an authenticated owner.
pub struct AppService {
    store: Arc<dyn EventStore>,
}

fn validate_name(raw: &str) -> Result<String, AppsError> {
    let name = raw.trim();
    let chars = name.chars().count();
    if chars == 0 || chars > MAX_APP_NAME_CHARS {
        return Err(AppsError::InvalidName);
    }
    Ok(name.to_string())
}

impl AppService {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_app(&self, caller: &Caller, name: &str) -> Result<Application, AppsError> {
        let name = validate_name(name)?;
        let app = Application::new(caller.user_id(), name);
        let inserted = self
            .store
            .insert_app(&app)
            .await
            .map_err(AppsError::Storage)?;
        if !inserted {
            return Err(AppsError::AppExists(app.name));
        }
        tracing::info!(tracking_id = %app.tracking_id, "app created");
        Ok(app)
    }

    pub async fn list_apps(&self, caller: &Caller) -> Result<Vec<Application>, AppsError> {
        self.store
            .list_apps(caller.user_id())
            .await
            .map_err(AppsError::Storage)
    }

    #[tracing::instrument(skip(self))]
    pub async fn update_app(
        &self,
        authorized: &AuthorizedApp,
        name: &str,
    ) -> Result<Application, AppsError> {
        let name = validate_name(name)?;
        let renamed = self
            .store
            .rename_app(authorized.tracking_id(), &name)
            .await
            .map_err(AppsError::Storage)?;
        if !renamed {
            return Err(AppsError::AppExists(name));
        }
        self.store
            .find_app_by_tracking_id(authorized.tracking_id())
            .await
            .map_err(AppsError::Storage)?
            .ok_or_else(|| {
                AppsError::Storage(anyhow::anyhow!(
                    "app {} vanished during rename",
                    authorized.tracking_id()
                ))
            })
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_app(&self, authorized: &AuthorizedApp) -> Result<(), AppsError> {
        self.store
            .delete_app(authorized.tracking_id())
            .await
            .map_err(AppsError::Storage)
    }
}
