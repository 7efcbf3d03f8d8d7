use models::{Alert, ChannelPrefs};
use pipeline::PreferenceLookup;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Capability for caching processed alerts by id. The pipeline assumes
/// an injectable store; persistence beyond process lifetime is someone
/// else's concern.
pub trait AlertStore: Send + Sync + 'static {
    fn get(&self, alert_id: &str) -> Option<Alert>;
    fn put(&self, alert: Alert);
}

impl<T: AlertStore> AlertStore for Arc<T> {
    fn get(&self, alert_id: &str) -> Option<Alert> {
        (**self).get(alert_id)
    }
    fn put(&self, alert: Alert) {
        (**self).put(alert)
    }
}

/// In-memory alert cache, safe for concurrent requests.
#[derive(Debug, Default)]
pub struct MemoryStore(Mutex<HashMap<String, Alert>>);

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AlertStore for MemoryStore {
    fn get(&self, alert_id: &str) -> Option<Alert> {
        self.0.lock().unwrap().get(alert_id).cloned()
    }

    fn put(&self, alert: Alert) {
        self.0.lock().unwrap().insert(alert.id.clone(), alert);
    }
}

/// Shared per-recipient notification preferences, updated out of band
/// and consulted by every channel resolution.
#[derive(Debug, Default)]
pub struct PreferenceStore(Mutex<HashMap<String, ChannelPrefs>>);

impl PreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, recipient: impl Into<String>, prefs: ChannelPrefs) {
        self.0.lock().unwrap().insert(recipient.into(), prefs);
    }

    pub fn remove(&self, recipient: &str) {
        self.0.lock().unwrap().remove(recipient);
    }
}

impl PreferenceLookup for PreferenceStore {
    fn prefs(&self, recipient: &str) -> Option<ChannelPrefs> {
        self.0.lock().unwrap().get(recipient).copied()
    }
}
