//! Policy health flags

use serde::Serialize;
use serde_json::Value;

/// Trigger keys under `general`, checked in order
const TRIGGER_KEYS: [&str; 8] = [
    "trigger_checkin",
    "trigger_enrollment_complete",
    "trigger_startup",
    "trigger_network_state_changed",
    "trigger_login",
    "trigger_logout",
    "trigger_other",
    "custom_triggers",
];

/// Enablement, trigger and Self Service state of one policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PolicyFlags {
    pub enabled: bool,
    pub any_trigger: bool,
    pub self_service_enabled: bool,
    /// `general.name` from the detail payload
    pub name: Option<String>,
    pub frequency: Option<String>,
}

impl PolicyFlags {
    /// Nothing can ever run this policy.
    pub fn is_untriggered(&self) -> bool {
        !self.any_trigger && !self.self_service_enabled
    }

    /// Enabled and offered in Self Service.
    pub fn is_active_self_service(&self) -> bool {
        self.enabled && self.self_service_enabled
    }
}

/// Read the health flags from a policy detail payload.
///
/// Accepts both `{"policy": {...}}` and the unwrapped record. Missing
/// sections read as all-false.
pub fn extract_policy_flags(detail: &Value) -> PolicyFlags {
    let root = detail.get("policy").unwrap_or(detail);
    let general = root.get("general").filter(|v| v.is_object());
    let self_service = root.get("self_service").filter(|v| v.is_object());

    let field = |key: &str| general.and_then(|g| g.get(key)).filter(|v| !v.is_null());

    let any_trigger = TRIGGER_KEYS.iter().any(|&key| {
        let value = match (field(key), key) {
            (None, "custom_triggers") => field("other_triggers")
                .filter(|v| is_present(v))
                .or_else(|| field("other_trigger")),
            (value, _) => value,
        };
        value.is_some_and(truthy)
    });

    PolicyFlags {
        enabled: field("enabled").is_some_and(truthy),
        any_trigger,
        self_service_enabled: self_service
            .and_then(|s| s.get("use_for_self_service"))
            .is_some_and(truthy),
        name: field("name").map(text),
        frequency: field("frequency").map(text),
    }
}

/// Loose boolean reading used for Jamf flag fields.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        ),
        Value::Array(items) => !items.is_empty(),
        Value::Null | Value::Object(_) => false,
    }
}

/// Whether a value holds anything at all (non-empty, non-zero, non-false).
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthy() {
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!(1)));
        assert!(truthy(&json!(0.5)));
        assert!(truthy(&json!(" Yes ")));
        assert!(truthy(&json!("ON")));
        assert!(truthy(&json!(["Every15"])));

        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("false")));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!([])));
        assert!(!truthy(&json!({"a": 1})));
        assert!(!truthy(&json!(null)));
    }

    #[test]
    fn test_wrapped_policy_flags() {
        let detail = json!({"policy": {
            "general": {
                "name": "Install Zoom",
                "enabled": true,
                "trigger_checkin": false,
                "trigger_login": "true",
                "frequency": "Once per computer"
            },
            "self_service": {"use_for_self_service": false}
        }});

        let flags = extract_policy_flags(&detail);
        assert!(flags.enabled);
        assert!(flags.any_trigger);
        assert!(!flags.self_service_enabled);
        assert_eq!(flags.name.as_deref(), Some("Install Zoom"));
        assert_eq!(flags.frequency.as_deref(), Some("Once per computer"));
        assert!(!flags.is_untriggered());
        assert!(!flags.is_active_self_service());
    }

    #[test]
    fn test_unwrapped_self_service_policy() {
        let detail = json!({
            "general": {"enabled": "true", "trigger_checkin": false},
            "self_service": {"use_for_self_service": "true"}
        });

        let flags = extract_policy_flags(&detail);
        assert!(!flags.any_trigger);
        assert!(flags.self_service_enabled);
        assert!(!flags.is_untriggered());
        assert!(flags.is_active_self_service());
    }

    #[test]
    fn test_untriggered_ignores_enabled() {
        let disabled = extract_policy_flags(&json!({"policy": {"general": {"enabled": false}}}));
        let enabled = extract_policy_flags(&json!({"policy": {"general": {"enabled": true}}}));

        assert!(disabled.is_untriggered());
        assert!(enabled.is_untriggered());
    }

    #[test]
    fn test_custom_trigger_fallbacks() {
        let via_other_triggers =
            extract_policy_flags(&json!({"general": {"other_triggers": ["install-zoom"]}}));
        assert!(via_other_triggers.any_trigger);

        let via_other_trigger =
            extract_policy_flags(&json!({"general": {"other_triggers": "", "other_trigger": "yes"}}));
        assert!(via_other_trigger.any_trigger);

        // A present other_triggers shadows other_trigger even when not truthy
        let shadowed = extract_policy_flags(
            &json!({"general": {"other_triggers": "nightly", "other_trigger": "true"}}),
        );
        assert!(!shadowed.any_trigger);

        // A present custom_triggers disables the fallback
        let explicit = extract_policy_flags(
            &json!({"general": {"custom_triggers": [], "other_triggers": ["x"]}}),
        );
        assert!(!explicit.any_trigger);
    }

    #[test]
    fn test_missing_sections() {
        assert_eq!(extract_policy_flags(&json!({})), PolicyFlags::default());
        assert_eq!(
            extract_policy_flags(&json!({"policy": {"general": "oops", "self_service": 3}})),
            PolicyFlags::default()
        );
        assert_eq!(extract_policy_flags(&json!([1, 2])), PolicyFlags::default());
    }
}
