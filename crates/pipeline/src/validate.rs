use chrono::{DateTime, Utc};
use models::{Alert, AlertDraft, AlertType, Severity};

/// A single violated field of an inbound alert draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    MissingId,
    MissingType,
    UnknownType(String),
    MissingSeverity,
    UnknownSeverity(String),
    MissingTitle,
    MissingMessage,
}

impl Violation {
    /// The draft field this violation concerns.
    pub fn field(&self) -> &'static str {
        match self {
            Violation::MissingId => "id",
            Violation::MissingType | Violation::UnknownType(_) => "type",
            Violation::MissingSeverity | Violation::UnknownSeverity(_) => "severity",
            Violation::MissingTitle => "title",
            Violation::MissingMessage => "message",
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::MissingId => f.write_str("alert id is required"),
            Violation::MissingType => f.write_str("alert type is required"),
            Violation::UnknownType(t) => write!(f, "unknown alert type {t:?}"),
            Violation::MissingSeverity => f.write_str("alert severity is required"),
            Violation::UnknownSeverity(s) => write!(f, "unknown alert severity {s:?}"),
            Violation::MissingTitle => f.write_str("alert title is required"),
            Violation::MissingMessage => f.write_str("alert message is required"),
        }
    }
}

/// Check the required fields of a draft, returning violations in field
/// order (id, type, severity, title, message). Empty means valid.
pub fn violations(draft: &AlertDraft) -> Vec<Violation> {
    let mut violations = Vec::new();

    if draft.id.is_empty() {
        violations.push(Violation::MissingId);
    }
    if draft.alert_type.is_empty() {
        violations.push(Violation::MissingType);
    } else if AlertType::parse(&draft.alert_type).is_none() {
        violations.push(Violation::UnknownType(draft.alert_type.clone()));
    }
    if draft.severity.is_empty() {
        violations.push(Violation::MissingSeverity);
    } else if Severity::parse(&draft.severity).is_none() {
        violations.push(Violation::UnknownSeverity(draft.severity.clone()));
    }
    if draft.title.is_empty() {
        violations.push(Violation::MissingTitle);
    }
    if draft.message.is_empty() {
        violations.push(Violation::MissingMessage);
    }

    violations
}

/// Parse a draft into a typed Alert, or return its violations.
/// A draft without a creation timestamp is stamped with `now`.
pub fn parse_draft(draft: &AlertDraft, now: DateTime<Utc>) -> Result<Alert, Vec<Violation>> {
    let found = violations(draft);
    if !found.is_empty() {
        return Err(found);
    }

    Ok(Alert {
        id: draft.id.clone(),
        alert_type: AlertType::parse(&draft.alert_type).expect("type was validated"),
        severity: Severity::parse(&draft.severity).expect("severity was validated"),
        title: draft.title.clone(),
        message: draft.message.clone(),
        source: draft.source.clone(),
        farm_id: draft.farm_id.clone(),
        user_id: draft.user_id.clone(),
        created_at: draft.created_at.unwrap_or(now),
        metadata: draft.metadata.clone(),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn valid_draft() -> AlertDraft {
        AlertDraft {
            id: "a1".to_string(),
            alert_type: "CLIMATE".to_string(),
            severity: "WARNING".to_string(),
            title: "Frost risk".to_string(),
            message: "Temperature dropping below 2C overnight".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_draft_has_no_violations() {
        assert!(violations(&valid_draft()).is_empty());
    }

    #[test]
    fn test_empty_draft_reports_all_fields_in_order() {
        let found = violations(&AlertDraft::default());
        let fields: Vec<_> = found.iter().map(Violation::field).collect();
        assert_eq!(fields, vec!["id", "type", "severity", "title", "message"]);
    }

    #[test]
    fn test_unknown_type_and_severity_are_violations() {
        let mut draft = valid_draft();
        draft.alert_type = "VOLCANO".to_string();
        draft.severity = "MILD".to_string();

        let found = violations(&draft);
        assert_eq!(
            found,
            vec![
                Violation::UnknownType("VOLCANO".to_string()),
                Violation::UnknownSeverity("MILD".to_string()),
            ]
        );
        assert_eq!(
            found[0].to_string(),
            r#"unknown alert type "VOLCANO""#.to_string()
        );
    }

    #[test]
    fn test_parse_stamps_missing_created_at() {
        let now = Utc::now();
        let alert = parse_draft(&valid_draft(), now).unwrap();
        assert_eq!(alert.created_at, now);
        assert_eq!(alert.alert_type, AlertType::Climate);
        assert_eq!(alert.severity, Severity::Warning);

        let mut draft = valid_draft();
        let explicit = now - chrono::Duration::minutes(10);
        draft.created_at = Some(explicit);
        assert_eq!(parse_draft(&draft, now).unwrap().created_at, explicit);
    }

    #[test]
    fn test_parse_rejects_invalid_draft() {
        let mut draft = valid_draft();
        draft.title.clear();
        let err = parse_draft(&draft, Utc::now()).unwrap_err();
        assert_eq!(err, vec![Violation::MissingTitle]);
    }
}
