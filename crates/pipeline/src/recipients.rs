use models::{Alert, Channel, ChannelPrefs, Severity};
use std::collections::{BTreeMap, HashMap};

/// Capability for looking up a recipient's notification opt-ins.
/// Implemented by plain maps for request-scoped preferences and by the
/// worker's shared preference store.
pub trait PreferenceLookup {
    fn prefs(&self, recipient: &str) -> Option<ChannelPrefs>;
}

impl PreferenceLookup for BTreeMap<String, ChannelPrefs> {
    fn prefs(&self, recipient: &str) -> Option<ChannelPrefs> {
        self.get(recipient).copied()
    }
}

impl PreferenceLookup for HashMap<String, ChannelPrefs> {
    fn prefs(&self, recipient: &str) -> Option<ChannelPrefs> {
        self.get(recipient).copied()
    }
}

impl<L: PreferenceLookup> PreferenceLookup for &L {
    fn prefs(&self, recipient: &str) -> Option<ChannelPrefs> {
        (*self).prefs(recipient)
    }
}

/// Who must be told about this alert: the owning user when one is set,
/// plus the on-call distribution address for critical and emergency
/// severities.
pub fn recipients(alert: &Alert, on_call: &str) -> Vec<String> {
    let mut recipients = Vec::new();

    if !alert.user_id.is_empty() {
        recipients.push(alert.user_id.clone());
    }
    if matches!(alert.severity, Severity::Critical | Severity::Emergency) {
        recipients.push(on_call.to_string());
    }

    recipients
}

/// The channels one recipient is notified through, in stable insertion
/// order: the mandatory IN_APP default, then severity-driven additions,
/// then preference opt-ins. Duplicates are never added.
pub fn channels(
    recipient: &str,
    severity: Severity,
    prefs: &impl PreferenceLookup,
) -> Vec<Channel> {
    let mut channels = vec![Channel::InApp];

    match severity {
        Severity::Critical | Severity::Emergency => {
            channels.push(Channel::Email);
            channels.push(Channel::Push);
            if severity == Severity::Emergency {
                channels.push(Channel::Sms);
            }
        }
        Severity::Warning => channels.push(Channel::Email),
        Severity::Info => (),
    }

    if let Some(pref) = prefs.prefs(recipient) {
        if pref.email_enabled && !channels.contains(&Channel::Email) {
            channels.push(Channel::Email);
        }
        if pref.sms_enabled && !channels.contains(&Channel::Sms) {
            channels.push(Channel::Sms);
        }
    }

    channels
}
