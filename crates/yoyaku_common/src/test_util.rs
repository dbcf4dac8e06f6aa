// --- File: crates/yoyaku_common/src/test_util.rs ---
//! Recording collaborator doubles for tests. Enabled by the `test-util`
//! feature.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::error::{AlertError, IdentityError, NotifyError};
use crate::models::{ExternalIdentity, OperationalAlert};
use crate::services::{AlertSink, BoxFuture, IdentityProvider, Notifier};

/// Identity provider that accepts a fixed set of authorization codes.
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    codes: Mutex<HashMap<String, ExternalIdentity>>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `code` exchange to the given identity.
    pub fn accept(&self, code: &str, identity_id: &str, display_name: &str) {
        if let Ok(mut codes) = self.codes.lock() {
            codes.insert(
                code.to_string(),
                ExternalIdentity {
                    identity_id: identity_id.to_string(),
                    display_name: display_name.to_string(),
                },
            );
        }
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn authorization_url(&self, state: &str) -> Result<String, IdentityError> {
        Ok(format!("https://login.invalid/authorize?state={state}"))
    }

    fn exchange_auth_code(&self, code: &str) -> BoxFuture<'_, ExternalIdentity, IdentityError> {
        let code = code.to_string();
        Box::pin(async move {
            self.codes
                .lock()
                .map_err(|_| IdentityError::ExchangeFailed("provider lock poisoned".to_string()))?
                .get(&code)
                .cloned()
                .ok_or_else(|| IdentityError::ExchangeFailed(format!("unknown code {code}")))
        })
    }
}

/// Notifier that records every message it accepts. Identities registered
/// with [`RecordingNotifier::fail_for`] are rejected instead.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, identity_id: &str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(identity_id.to_string());
        }
    }

    /// `(identity_id, text)` pairs in send order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn push_notification(&self, identity_id: &str, text: &str) -> BoxFuture<'_, (), NotifyError> {
        let identity_id = identity_id.to_string();
        let text = text.to_string();
        Box::pin(async move {
            let rejected = self
                .failing
                .lock()
                .map(|failing| failing.contains(&identity_id))
                .unwrap_or(false);
            if rejected {
                return Err(NotifyError::Rejected {
                    status: 400,
                    body: format!("unknown recipient {}", identity_id),
                });
            }
            self.sent
                .lock()
                .map_err(|_| NotifyError::Transport("recorder lock poisoned".to_string()))?
                .push((identity_id, text));
            Ok(())
        })
    }
}

/// Alert sink that records every alert it receives.
#[derive(Debug, Default)]
pub struct RecordingAlertSink {
    alerts: Mutex<Vec<OperationalAlert>>,
}

impl RecordingAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<OperationalAlert> {
        self.alerts.lock().map(|alerts| alerts.clone()).unwrap_or_default()
    }
}

impl AlertSink for RecordingAlertSink {
    fn send_operational_alert(&self, alert: OperationalAlert) -> BoxFuture<'_, (), AlertError> {
        Box::pin(async move {
            self.alerts
                .lock()
                .map_err(|_| AlertError::Transport("recorder lock poisoned".to_string()))?
                .push(alert);
            Ok(())
        })
    }
}
