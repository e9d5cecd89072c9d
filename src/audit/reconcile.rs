//! Reconciliation of inventory against scopes and references
//!
//! Everything here is pure: the same [`AuditInput`] always produces the same
//! [`AuditReport`], with every list sorted by id.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::flags::PolicyFlags;
use super::references::ReferenceSet;
use super::scope::ScopeRecord;
use crate::client::{InventoryObject, ObjectKind};

/// Everything gathered from the server for one audit run
#[derive(Debug, Clone, Default)]
pub struct AuditInput {
    pub policies: Vec<InventoryObject>,
    pub profiles: Vec<InventoryObject>,
    pub scripts: Vec<InventoryObject>,
    pub packages: Vec<InventoryObject>,
    pub groups: Vec<InventoryObject>,
    /// Parsed scopes of fetched policies and profiles
    pub scopes: BTreeMap<(ObjectKind, i64), ScopeRecord>,
    /// References per fetched policy
    pub references: BTreeMap<i64, ReferenceSet>,
    /// Health flags per fetched policy
    pub flags: BTreeMap<i64, PolicyFlags>,
    /// Objects whose detail or scope could not be fetched
    pub unfetched: BTreeSet<(ObjectKind, i64)>,
}

/// Object totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditStats {
    pub policies_total: usize,
    pub profiles_total: usize,
    pub scripts_total: usize,
    pub packages_total: usize,
    pub groups_total: usize,
    pub failed_fetches: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectSummary {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub id: i64,
    pub name: String,
    pub is_smart: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicySummary {
    pub id: i64,
    pub name: String,
    pub frequency: Option<String>,
}

/// Result of one audit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub stats: AuditStats,
    pub unscoped_policies: Vec<ObjectSummary>,
    pub unscoped_profiles: Vec<ObjectSummary>,
    pub unused_scripts: Vec<ObjectSummary>,
    pub unused_packages: Vec<ObjectSummary>,
    pub unused_groups: Vec<GroupSummary>,
    pub policies_no_triggers_and_not_selfservice: Vec<PolicySummary>,
    pub active_policies_selfservice_enabled: Vec<PolicySummary>,
}

impl AuditReport {
    /// Objects eligible for the archive category.
    ///
    /// Unused scripts and packages are left out when `include_unused` is
    /// false. Groups are never archived.
    pub fn archive_targets(&self, include_unused: bool) -> Vec<InventoryObject> {
        let mut targets = Vec::new();
        let mut push = |kind: ObjectKind, items: &[ObjectSummary]| {
            targets.extend(
                items
                    .iter()
                    .map(|item| InventoryObject::new(kind, item.id, item.name.clone())),
            );
        };

        push(ObjectKind::Policy, &self.unscoped_policies);
        push(ObjectKind::Profile, &self.unscoped_profiles);
        if include_unused {
            push(ObjectKind::Script, &self.unused_scripts);
            push(ObjectKind::Package, &self.unused_packages);
        }
        targets
    }
}

/// Reconcile inventory against scopes and references.
pub fn reconcile(input: &AuditInput) -> AuditReport {
    let used_scripts: BTreeSet<i64> = input
        .references
        .values()
        .flat_map(|r| r.script_ids.iter().copied())
        .collect();
    let used_packages: BTreeSet<i64> = input
        .references
        .values()
        .flat_map(|r| r.package_ids.iter().copied())
        .collect();
    let used_groups: BTreeSet<i64> = input
        .scopes
        .values()
        .flat_map(|scope| scope.referenced_groups())
        .collect();

    let listed_names: BTreeMap<i64, &str> = input
        .policies
        .iter()
        .map(|p| (p.id, p.name.as_str()))
        .collect();

    AuditReport {
        stats: AuditStats {
            policies_total: input.policies.len(),
            profiles_total: input.profiles.len(),
            scripts_total: input.scripts.len(),
            packages_total: input.packages.len(),
            groups_total: input.groups.len(),
            failed_fetches: input.unfetched.len(),
        },
        unscoped_policies: unscoped(input, &input.policies),
        unscoped_profiles: unscoped(input, &input.profiles),
        unused_scripts: unused(&input.scripts, &used_scripts),
        unused_packages: unused(&input.packages, &used_packages),
        unused_groups: sorted(
            input
                .groups
                .iter()
                .filter(|g| !used_groups.contains(&g.id))
                .map(|g| GroupSummary {
                    id: g.id,
                    name: g.name.clone(),
                    is_smart: g.is_smart,
                })
                .collect::<Vec<_>>(),
            |g| g.id,
        ),
        policies_no_triggers_and_not_selfservice: policy_health(
            input,
            &listed_names,
            PolicyFlags::is_untriggered,
        ),
        active_policies_selfservice_enabled: policy_health(
            input,
            &listed_names,
            PolicyFlags::is_active_self_service,
        ),
    }
}

fn unscoped(input: &AuditInput, objects: &[InventoryObject]) -> Vec<ObjectSummary> {
    let items = objects
        .iter()
        .filter(|o| !input.unfetched.contains(&(o.kind, o.id)))
        .filter(|o| {
            !input
                .scopes
                .get(&(o.kind, o.id))
                .is_some_and(ScopeRecord::is_reachable)
        })
        .map(summary)
        .collect::<Vec<_>>();
    sorted(items, |o| o.id)
}

fn unused(objects: &[InventoryObject], used: &BTreeSet<i64>) -> Vec<ObjectSummary> {
    let items = objects
        .iter()
        .filter(|o| !used.contains(&o.id))
        .map(summary)
        .collect::<Vec<_>>();
    sorted(items, |o| o.id)
}

fn policy_health(
    input: &AuditInput,
    listed_names: &BTreeMap<i64, &str>,
    matches: fn(&PolicyFlags) -> bool,
) -> Vec<PolicySummary> {
    // `flags` is keyed by id, so this is already in id order
    input
        .flags
        .iter()
        .filter(|(_, flags)| matches(flags))
        .map(|(&id, flags)| PolicySummary {
            id,
            name: flags
                .name
                .clone()
                .or_else(|| listed_names.get(&id).map(|n| n.to_string()))
                .unwrap_or_default(),
            frequency: flags.frequency.clone(),
        })
        .collect()
}

fn summary(object: &InventoryObject) -> ObjectSummary {
    ObjectSummary {
        id: object.id,
        name: object.name.clone(),
    }
}

fn sorted<T>(mut items: Vec<T>, key: impl Fn(&T) -> i64) -> Vec<T> {
    items.sort_by_key(key);
    items
}
