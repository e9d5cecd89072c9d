//! Inventory object models

use serde::{Deserialize, Serialize};

/// Kind of Jamf Pro object the auditor works with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Policy,
    Profile,
    Script,
    Package,
    Group,
}

impl ObjectKind {
    /// Classic API collection segment (`/JSSResource/{segment}`)
    pub fn resource_path(&self) -> &'static str {
        match self {
            ObjectKind::Policy => "policies",
            ObjectKind::Profile => "osxconfigurationprofiles",
            ObjectKind::Script => "scripts",
            ObjectKind::Package => "packages",
            ObjectKind::Group => "computergroups",
        }
    }

    /// Top-level key holding the collection in a listing payload
    pub fn collection_key(&self) -> &'static str {
        match self {
            ObjectKind::Policy => "policies",
            ObjectKind::Profile => "os_x_configuration_profiles",
            ObjectKind::Script => "scripts",
            ObjectKind::Package => "packages",
            ObjectKind::Group => "computer_groups",
        }
    }

    /// Singular key used when a listing wraps its items one level down
    pub fn item_key(&self) -> &'static str {
        match self {
            ObjectKind::Policy => "policy",
            ObjectKind::Profile => "configuration_profile",
            ObjectKind::Script => "script",
            ObjectKind::Package => "package",
            ObjectKind::Group => "computer_group",
        }
    }

    /// Root element of the XML document accepted by PUT
    pub fn xml_root(&self) -> &'static str {
        match self {
            ObjectKind::Policy => "policy",
            ObjectKind::Profile => "os_x_configuration_profile",
            ObjectKind::Script => "script",
            ObjectKind::Package => "package",
            ObjectKind::Group => "computer_group",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::Policy => write!(f, "Policy"),
            ObjectKind::Profile => write!(f, "Profile"),
            ObjectKind::Script => write!(f, "Script"),
            ObjectKind::Package => write!(f, "Package"),
            ObjectKind::Group => write!(f, "Computer Group"),
        }
    }
}

/// One listed inventory record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryObject {
    /// Identifier, unique within its kind
    pub id: i64,

    /// Display name (empty when the listing omits it)
    pub name: String,

    /// Object kind
    pub kind: ObjectKind,

    /// Smart group flag (computer groups only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_smart: Option<bool>,
}

impl InventoryObject {
    pub fn new(kind: ObjectKind, id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            is_smart: None,
        }
    }
}
