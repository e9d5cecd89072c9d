//! Report entry display models

use serde::Serialize;
use tabled::Tabled;

use super::common::{MAX_NAME_WIDTH, or_dash, truncate_string};
use crate::audit::{GroupSummary, ObjectSummary, PolicySummary};

/// Policy, profile, script or package row.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct ObjectDisplay {
    #[tabled(rename = "ID")]
    pub id: i64,

    #[tabled(rename = "NAME")]
    pub name: String,
}

impl From<&ObjectSummary> for ObjectDisplay {
    fn from(item: &ObjectSummary) -> Self {
        Self {
            id: item.id,
            name: truncate_string(&item.name, MAX_NAME_WIDTH),
        }
    }
}

/// Computer group row.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct GroupDisplay {
    #[tabled(rename = "ID")]
    pub id: i64,

    #[tabled(rename = "NAME")]
    pub name: String,

    /// "smart", "static" or "--" when the listing did not say
    #[tabled(rename = "TYPE")]
    pub group_type: String,
}

impl From<&GroupSummary> for GroupDisplay {
    fn from(group: &GroupSummary) -> Self {
        let group_type = match group.is_smart {
            Some(true) => "smart",
            Some(false) => "static",
            None => "--",
        };
        Self {
            id: group.id,
            name: truncate_string(&group.name, MAX_NAME_WIDTH),
            group_type: group_type.to_string(),
        }
    }
}

/// Policy health row.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct PolicyDisplay {
    #[tabled(rename = "ID")]
    pub id: i64,

    #[tabled(rename = "NAME")]
    pub name: String,

    #[tabled(rename = "FREQUENCY")]
    pub frequency: String,
}

impl From<&PolicySummary> for PolicyDisplay {
    fn from(policy: &PolicySummary) -> Self {
        Self {
            id: policy.id,
            name: truncate_string(&policy.name, MAX_NAME_WIDTH),
            frequency: or_dash(policy.frequency.as_deref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_display_type() {
        let smart = GroupDisplay::from(&GroupSummary {
            id: 1,
            name: "All Managed".to_string(),
            is_smart: Some(true),
        });
        let unknown = GroupDisplay::from(&GroupSummary {
            id: 2,
            name: "Lab".to_string(),
            is_smart: None,
        });

        assert_eq!(smart.group_type, "smart");
        assert_eq!(unknown.group_type, "--");
    }

    #[test]
    fn test_policy_display_frequency() {
        let display = PolicyDisplay::from(&PolicySummary {
            id: 9,
            name: "Install Zoom".to_string(),
            frequency: None,
        });

        assert_eq!(display.id, 9);
        assert_eq!(display.frequency, "--");
    }

    #[test]
    fn test_object_display_truncates_long_names() {
        let display = ObjectDisplay::from(&ObjectSummary {
            id: 3,
            name: "x".repeat(100),
        });

        assert_eq!(display.name.chars().count(), MAX_NAME_WIDTH);
        assert!(display.name.ends_with("..."));
    }
}
