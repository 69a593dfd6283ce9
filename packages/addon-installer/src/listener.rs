//! Host-global add-on change events.
//!
//! The host fires these for any add-on, including ones changed from outside
//! the page (the browser's own add-on manager, another tab). The listener
//! turns each into an `INSTALL_STATE` dispatch so the store tracks them too.

use std::sync::Arc;

use tracing::{error, info};

use crate::actions::{InstallAction, InstallStatePayload};
use crate::error::Result;
use crate::events::{AddonChangeEvent, ChangeEventKind};
use crate::manager::{addon_status, ExtensionManager};
use crate::store::Dispatcher;
use crate::types::InstallationStatus;

pub struct ChangeListener {
    manager: Arc<dyn ExtensionManager>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl ChangeListener {
    pub fn new(manager: Arc<dyn ExtensionManager>, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            manager,
            dispatcher,
        }
    }

    /// Parse a raw host event name and handle it.
    pub async fn handle_raw(&self, guid: &str, kind: &str, needs_restart: bool) -> Result<()> {
        let kind = kind.parse::<ChangeEventKind>()?;
        self.handle(AddonChangeEvent {
            id: guid.to_string(),
            kind,
            needs_restart,
        })
        .await
    }

    pub async fn handle(&self, event: AddonChangeEvent) -> Result<()> {
        info!(
            guid = %event.id,
            kind = event.kind.as_str(),
            needs_restart = event.needs_restart,
            "change event received"
        );

        let status = match event.kind {
            ChangeEventKind::OperationCancelled => {
                self.refresh(&event.id).await;
                return Ok(());
            }
            // Transitional, the settled event follows.
            ChangeEventKind::Enabling | ChangeEventKind::Disabling => return Ok(()),
            // No handle exists before install or after uninstall.
            ChangeEventKind::Installing => {
                self.dispatch(&event.id, InstallationStatus::Installing, true);
                return Ok(());
            }
            ChangeEventKind::Uninstalled => {
                self.dispatch(&event.id, InstallationStatus::Uninstalled, true);
                return Ok(());
            }
            ChangeEventKind::Enabled => InstallationStatus::Enabled,
            ChangeEventKind::Disabled => InstallationStatus::Disabled,
            ChangeEventKind::Installed => InstallationStatus::Installed,
            ChangeEventKind::Uninstalling => InstallationStatus::Uninstalling,
        };

        let can_uninstall = self
            .manager
            .get_addon(&event.id)
            .await?
            .map_or(true, |addon| addon.can_uninstall);
        self.dispatch(&event.id, status, can_uninstall);
        Ok(())
    }

    /// Re-read the host's view of `guid` after a cancelled operation.
    async fn refresh(&self, guid: &str) {
        match self.manager.get_addon(guid).await {
            Ok(Some(addon)) => {
                self.dispatch(guid, addon_status(&addon), addon.can_uninstall);
            }
            Ok(None) => {
                error!(guid = %guid, "no add-on handle after onOperationCancelled");
            }
            Err(e) => {
                error!(guid = %guid, error = %e, "unexpected error after onOperationCancelled");
            }
        }
    }

    fn dispatch(&self, guid: &str, status: InstallationStatus, can_uninstall: bool) {
        self.dispatcher
            .dispatch(InstallAction::InstallState(InstallStatePayload {
                guid: guid.to_string(),
                status,
                url: None,
                error: None,
                can_uninstall: Some(can_uninstall),
            }));
    }
}

impl std::fmt::Debug for ChangeListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeListener").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InstallerError, ManagerError};
    use crate::testing::{MockExtensionManager, RecordingDispatcher};
    use crate::types::{AddonType, ClientAddon};

    const GUID: &str = "@listened";

    fn listener(manager: MockExtensionManager) -> (ChangeListener, Arc<RecordingDispatcher>) {
        let dispatcher = Arc::new(RecordingDispatcher::new());
        (
            ChangeListener::new(Arc::new(manager), dispatcher.clone()),
            dispatcher,
        )
    }

    #[tokio::test]
    async fn test_installing_and_uninstalled_skip_lookup() {
        let manager = MockExtensionManager::new();
        let (listener, dispatcher) = listener(manager);

        listener
            .handle(AddonChangeEvent::new(GUID, ChangeEventKind::Installing))
            .await
            .unwrap();
        assert_eq!(dispatcher.last_status(GUID), Some(InstallationStatus::Installing));

        listener
            .handle(AddonChangeEvent::new(GUID, ChangeEventKind::Uninstalled))
            .await
            .unwrap();
        assert_eq!(dispatcher.last_status(GUID), Some(InstallationStatus::Uninstalled));
        assert!(dispatcher.store().get(GUID).unwrap().can_uninstall);
    }

    #[tokio::test]
    async fn test_settled_events_copy_can_uninstall() {
        let (listener, dispatcher) = listener(MockExtensionManager::new().with_addon(
            ClientAddon::new(GUID, AddonType::Extension).with_can_uninstall(false),
        ));

        listener
            .handle(AddonChangeEvent::new(GUID, ChangeEventKind::Disabled))
            .await
            .unwrap();

        assert_eq!(
            dispatcher.actions(),
            vec![InstallAction::InstallState(InstallStatePayload {
                guid: GUID.into(),
                status: InstallationStatus::Disabled,
                url: None,
                error: None,
                can_uninstall: Some(false),
            })]
        );
    }

    #[tokio::test]
    async fn test_event_status_mapping() {
        let (listener, dispatcher) = listener(
            MockExtensionManager::new().with_addon(ClientAddon::new(GUID, AddonType::Extension)),
        );

        for (kind, status) in [
            (ChangeEventKind::Enabled, InstallationStatus::Enabled),
            (ChangeEventKind::Installed, InstallationStatus::Installed),
            (ChangeEventKind::Uninstalling, InstallationStatus::Uninstalling),
        ] {
            listener.handle(AddonChangeEvent::new(GUID, kind)).await.unwrap();
            assert_eq!(dispatcher.last_status(GUID), Some(status));
        }
    }

    #[tokio::test]
    async fn test_failed_lookup_is_returned() {
        let (listener, dispatcher) = listener(MockExtensionManager::new());

        let err = listener
            .handle(AddonChangeEvent::new(GUID, ChangeEventKind::Enabled))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            InstallerError::Manager(ManagerError::NotFound { .. })
        ));
        assert!(dispatcher.actions().is_empty());
    }

    #[tokio::test]
    async fn test_transitional_events_are_ignored() {
        let (listener, dispatcher) = listener(MockExtensionManager::new());

        listener
            .handle(AddonChangeEvent::new(GUID, ChangeEventKind::Enabling))
            .await
            .unwrap();
        listener
            .handle(AddonChangeEvent::new(GUID, ChangeEventKind::Disabling))
            .await
            .unwrap();

        assert!(dispatcher.actions().is_empty());
    }

    #[tokio::test]
    async fn test_operation_cancelled_requeries_host() {
        let (listener, dispatcher) = listener(MockExtensionManager::new().with_addon(
            ClientAddon::new(GUID, AddonType::StaticTheme).disabled(),
        ));
        dispatcher.dispatch(InstallAction::set_status(GUID, InstallationStatus::Uninstalling));

        listener
            .handle(AddonChangeEvent::new(GUID, ChangeEventKind::OperationCancelled))
            .await
            .unwrap();

        assert_eq!(dispatcher.last_status(GUID), Some(InstallationStatus::Disabled));
    }

    #[tokio::test]
    async fn test_operation_cancelled_lookup_failure_is_logged() {
        let (listener, dispatcher) = listener(MockExtensionManager::new());

        listener
            .handle(AddonChangeEvent::new(GUID, ChangeEventKind::OperationCancelled))
            .await
            .unwrap();

        assert!(dispatcher.actions().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_event_name() {
        let (listener, dispatcher) = listener(MockExtensionManager::new());

        let err = listener
            .handle_raw(GUID, "onExploded", false)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "unknown global event: onExploded");
        assert!(dispatcher.actions().is_empty());

        listener.handle_raw(GUID, "onInstalling", true).await.unwrap();
        assert_eq!(dispatcher.actions().len(), 1);
    }
}
