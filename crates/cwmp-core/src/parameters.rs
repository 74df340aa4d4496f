//! Management-server parameter writes
//!
//! A handful of parameters under `InternetGatewayDevice.ManagementServer`
//! configure the CWMP client itself. Writes to them are still stored like any
//! other parameter, but they also update the session core:
//!
//! | parameter              | effect                                        |
//! |------------------------|-----------------------------------------------|
//! | Username, Password     | configuration reload pending                  |
//! | URL                    | reload pending, next event is `4 VALUE CHANGE`|
//! | PeriodicInformEnable   | periodic informs switched on/off              |
//! | PeriodicInformInterval | new interval, periodic timer restarted now    |
//!
//! The reload itself is deferred to [`ConfigReloadGate::reload_if_pending`],
//! so a batch of writes touching several of these causes one reload.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::adapters::{ConfigLoader, DeviceAction, ParameterStore, RpcHost};
use crate::errors::{Result, StoreResult};
use crate::event::{EventCode, EventRegister};
use crate::periodic::{parse_flag, parse_integer, PeriodicScheduler};
use crate::timer::Dispatcher;

const MANAGEMENT_SERVER_PREFIX: &str = "InternetGatewayDevice.ManagementServer.";

/// Parameters the session core reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagementParameter {
    Username,
    Password,
    Url,
    PeriodicInformEnable,
    PeriodicInformInterval,
}

impl ManagementParameter {
    pub const ALL: [ManagementParameter; 5] = [
        ManagementParameter::Username,
        ManagementParameter::Password,
        ManagementParameter::Url,
        ManagementParameter::PeriodicInformEnable,
        ManagementParameter::PeriodicInformInterval,
    ];

    /// Full dotted parameter path
    pub fn name(&self) -> &'static str {
        match self {
            ManagementParameter::Username => "InternetGatewayDevice.ManagementServer.Username",
            ManagementParameter::Password => "InternetGatewayDevice.ManagementServer.Password",
            ManagementParameter::Url => "InternetGatewayDevice.ManagementServer.URL",
            ManagementParameter::PeriodicInformEnable => {
                "InternetGatewayDevice.ManagementServer.PeriodicInformEnable"
            }
            ManagementParameter::PeriodicInformInterval => {
                "InternetGatewayDevice.ManagementServer.PeriodicInformInterval"
            }
        }
    }

    /// Exact, case-sensitive match on the full path
    pub fn from_name(name: &str) -> Option<Self> {
        if !name.starts_with(MANAGEMENT_SERVER_PREFIX) {
            return None;
        }
        Self::ALL.into_iter().find(|parameter| parameter.name() == name)
    }
}

/// Defers configuration reloads until a batch of writes is done
#[derive(Debug, Clone, Default)]
pub struct ConfigReloadGate {
    pending: bool,
}

impl ConfigReloadGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_pending(&mut self) {
        self.pending = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Reload through `loader` if a write asked for it
    ///
    /// Returns whether a reload ran. The flag stays set when the reload
    /// fails so the next call tries again.
    pub async fn reload_if_pending(&mut self, loader: &dyn ConfigLoader) -> Result<bool> {
        if !self.pending {
            return Ok(false);
        }
        loader.reload().await?;
        self.pending = false;
        info!("configuration reloaded");
        Ok(true)
    }
}

/// Intercepts parameter writes on behalf of the session core
///
/// Borrows the pieces of session state a write can touch. The orchestrator
/// builds one for each direct write and lends one to the codec for each ACS
/// request it handles.
pub struct ParameterChangeHandler<'a> {
    pub(crate) store: &'a dyn ParameterStore,
    pub(crate) loader: &'a dyn ConfigLoader,
    pub(crate) event: &'a mut EventRegister,
    pub(crate) reload: &'a mut ConfigReloadGate,
    pub(crate) periodic: &'a mut PeriodicScheduler,
    pub(crate) dispatcher: &'a mut dyn Dispatcher,
}

impl<'a> ParameterChangeHandler<'a> {
    /// Apply management side effects for `name`, then store the value
    ///
    /// The store's result is returned as is; side effects are applied even if
    /// the store rejects the write.
    pub async fn on_write(&mut self, name: &str, value: &str) -> StoreResult<()> {
        debug!("parameter write {} = {}", name, value);

        match ManagementParameter::from_name(name) {
            Some(ManagementParameter::Username) | Some(ManagementParameter::Password) => {
                self.reload.mark_pending();
            }
            Some(ManagementParameter::Url) => {
                self.reload.mark_pending();
                self.event.set(EventCode::ValueChange);
            }
            Some(ManagementParameter::PeriodicInformEnable) => {
                self.periodic.on_enabled_changed(parse_flag(value));
            }
            Some(ManagementParameter::PeriodicInformInterval) => {
                self.periodic
                    .on_interval_changed(parse_integer(value), &mut *self.dispatcher);
            }
            None => {}
        }

        self.store.set_value(name, value).await
    }
}

#[async_trait]
impl<'a> RpcHost for ParameterChangeHandler<'a> {
    async fn get_parameter_value(&mut self, name: &str) -> StoreResult<Option<String>> {
        self.store.get_value(name).await
    }

    async fn get_parameter_notification(&mut self, name: &str) -> StoreResult<Option<String>> {
        self.store.get_notification(name).await
    }

    async fn set_parameter_value(&mut self, name: &str, value: &str) -> StoreResult<()> {
        self.on_write(name, value).await
    }

    async fn set_parameter_notification(&mut self, name: &str, level: &str) -> StoreResult<()> {
        self.store.set_notification(name, level).await
    }

    async fn download(&mut self, url: &str, size: &str) -> StoreResult<()> {
        info!("download requested: {} ({} bytes)", url, size);
        self.store.download(url, size).await
    }

    async fn reboot(&mut self) -> StoreResult<()> {
        info!("reboot requested");
        self.store.simple_action(DeviceAction::Reboot).await
    }

    async fn factory_reset(&mut self) -> StoreResult<()> {
        info!("factory reset requested");
        self.store.simple_action(DeviceAction::FactoryReset).await
    }

    async fn execute_action(&mut self) -> StoreResult<()> {
        self.store.execute_action().await
    }

    async fn reload_changes(&mut self) -> Result<()> {
        self.reload.reload_if_pending(self.loader).await.map(|_| ())
    }

    fn event(&self) -> EventCode {
        self.event.current()
    }
}
