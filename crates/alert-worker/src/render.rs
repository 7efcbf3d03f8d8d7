use models::{Alert, Channel};

// SMS bodies are clipped to this many characters of the alert message.
const SMS_MESSAGE_CHARS: usize = 100;

pub fn subject(alert: &Alert) -> String {
    format!("[{}] {}", alert.severity, alert.title)
}

pub fn body(alert: &Alert, channel: Channel) -> String {
    match channel {
        Channel::Sms => {
            let clipped: String = alert.message.chars().take(SMS_MESSAGE_CHARS).collect();
            format!("{}: {}", alert.title, clipped)
        }
        Channel::Email | Channel::Push | Channel::InApp | Channel::Webhook => format!(
            "Type: {}\nSeverity: {}\n\n{}\n\nFarm: {}\nTime: {}",
            alert.alert_type,
            alert.severity,
            alert.message,
            alert.farm_id,
            alert.created_at.format("%d/%m/%Y %H:%M"),
        ),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;
    use models::{AlertType, Severity};

    fn alert(message: &str) -> Alert {
        Alert {
            id: "a1".to_string(),
            alert_type: AlertType::Climate,
            severity: Severity::Critical,
            title: "Frost warning".to_string(),
            message: message.to_string(),
            source: String::new(),
            farm_id: "farm-9".to_string(),
            user_id: String::new(),
            created_at: Utc::now(),
            metadata: Default::default(),
        }
    }

    #[test]
    fn test_subject_carries_severity() {
        assert_eq!(subject(&alert("m")), "[CRITICAL] Frost warning");
    }

    #[test]
    fn test_sms_body_is_clipped_on_char_boundaries() {
        let long = "ä".repeat(300);
        let body = body(&alert(&long), Channel::Sms);
        assert_eq!(body, format!("Frost warning: {}", "ä".repeat(100)));
    }

    #[test]
    fn test_full_body_includes_context() {
        let body = body(&alert("Temperature below 2C"), Channel::Email);
        assert!(body.contains("Type: CLIMATE"));
        assert!(body.contains("Severity: CRITICAL"));
        assert!(body.contains("Temperature below 2C"));
        assert!(body.contains("Farm: farm-9"));
    }
}
