use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::AuthError;
use crate::store::AuthStore;
use crate::types::{CreateSettingRequest, Setting, SettingCategory, UpdateSettingRequest};

#[derive(Clone)]
pub struct SettingsManager {
    store: Arc<dyn AuthStore>,
}

impl SettingsManager {
    pub fn new(store: Arc<dyn AuthStore>) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        req: &CreateSettingRequest,
        actor: Option<&str>,
    ) -> Result<Setting, AuthError> {
        let key = req.key.trim();
        if key.is_empty() {
            return Err(AuthError::InvalidInput("setting key is required".into()));
        }
        let req = CreateSettingRequest {
            key: key.to_string(),
            description: req.description.trim().to_string(),
            ..req.clone()
        };
        let setting = self.store.create_setting(&req, actor).await?;
        tracing::info!(setting = %setting.key, locked = !setting.is_modifiable, "created setting");
        Ok(setting)
    }

    pub async fn get(&self, key: &str) -> Result<Setting, AuthError> {
        self.store.get_setting(key).await
    }

    pub async fn list(&self, category: Option<SettingCategory>) -> Result<Vec<Setting>, AuthError> {
        let settings = self.store.list_settings().await?;
        Ok(settings
            .into_iter()
            .filter(|s| category.is_none_or(|c| s.category == c))
            .collect())
    }

    pub async fn list_by_category(
        &self,
    ) -> Result<BTreeMap<SettingCategory, Vec<Setting>>, AuthError> {
        let mut grouped: BTreeMap<SettingCategory, Vec<Setting>> = BTreeMap::new();
        for s in self.store.list_settings().await? {
            grouped.entry(s.category).or_default().push(s);
        }
        Ok(grouped)
    }

    /// Value, description and category; the key is immutable.
    pub async fn update(
        &self,
        key: &str,
        req: &UpdateSettingRequest,
        actor: Option<&str>,
    ) -> Result<Setting, AuthError> {
        self.writable(key).await?;
        let setting = self.store.update_setting(key, req, actor).await?;
        tracing::info!(setting = key, "updated setting");
        Ok(setting)
    }

    pub async fn set_value(
        &self,
        key: &str,
        value: serde_json::Value,
        actor: Option<&str>,
    ) -> Result<Setting, AuthError> {
        let req = UpdateSettingRequest {
            value: Some(value),
            ..Default::default()
        };
        self.update(key, &req, actor).await
    }

    pub async fn delete(&self, key: &str) -> Result<(), AuthError> {
        self.writable(key).await?;
        self.store.delete_setting(key).await?;
        tracing::info!(setting = key, "deleted setting");
        Ok(())
    }

    async fn writable(&self, key: &str) -> Result<Setting, AuthError> {
        let current = self.store.get_setting(key).await?;
        if !current.is_modifiable {
            return Err(AuthError::SettingLocked(current.key));
        }
        Ok(current)
    }
}
