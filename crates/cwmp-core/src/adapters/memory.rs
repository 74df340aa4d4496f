//! In-memory parameter store
//!
//! Keeps the parameter tree in a map and records every device action it is
//! asked to perform. Useful for embedding the session core without a real
//! data model backend and for exercising it in tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use super::{DeviceAction, ParameterStore};
use crate::errors::{StoreError, StoreResult};

/// Action performed through the store, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    Download { url: String, size: String },
    Simple(DeviceAction),
    Execute,
}

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<String, String>,
    notifications: HashMap<String, String>,
    actions: Vec<StoreAction>,
    failing: Option<StoreError>,
}

/// Thread-safe map-backed [`ParameterStore`]
#[derive(Debug, Clone, Default)]
pub struct MemoryParameterStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style value seed
    pub fn with_value(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.write().values.insert(name.into(), value.into());
        self
    }

    /// Builder-style notification level seed
    pub fn with_notification(self, name: impl Into<String>, level: impl Into<String>) -> Self {
        self.inner.write().notifications.insert(name.into(), level.into());
        self
    }

    /// Make every subsequent operation fail with `error` (`None` to recover)
    pub fn set_failing(&self, error: Option<StoreError>) {
        self.inner.write().failing = error;
    }

    pub fn value(&self, name: &str) -> Option<String> {
        self.inner.read().values.get(name).cloned()
    }

    pub fn notification(&self, name: &str) -> Option<String> {
        self.inner.read().notifications.get(name).cloned()
    }

    pub fn actions(&self) -> Vec<StoreAction> {
        self.inner.read().actions.clone()
    }

    fn check(&self) -> StoreResult<()> {
        match &self.inner.read().failing {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ParameterStore for MemoryParameterStore {
    async fn get_value(&self, name: &str) -> StoreResult<Option<String>> {
        self.check()?;
        Ok(self.value(name))
    }

    async fn get_notification(&self, name: &str) -> StoreResult<Option<String>> {
        self.check()?;
        Ok(self.notification(name))
    }

    async fn set_value(&self, name: &str, value: &str) -> StoreResult<()> {
        self.check()?;
        debug!("store: {} = {}", name, value);
        self.inner.write().values.insert(name.to_string(), value.to_string());
        Ok(())
    }

    async fn set_notification(&self, name: &str, level: &str) -> StoreResult<()> {
        self.check()?;
        self.inner
            .write()
            .notifications
            .insert(name.to_string(), level.to_string());
        Ok(())
    }

    async fn download(&self, url: &str, size: &str) -> StoreResult<()> {
        self.check()?;
        self.inner.write().actions.push(StoreAction::Download {
            url: url.to_string(),
            size: size.to_string(),
        });
        Ok(())
    }

    async fn simple_action(&self, action: DeviceAction) -> StoreResult<()> {
        self.check()?;
        self.inner.write().actions.push(StoreAction::Simple(action));
        Ok(())
    }

    async fn execute_action(&self) -> StoreResult<()> {
        self.check()?;
        self.inner.write().actions.push(StoreAction::Execute);
        Ok(())
    }
}
