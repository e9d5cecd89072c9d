//! Audit orchestration
//!
//! Lists every kind, fetches policy details and scopes through the bounded
//! worker pool, then hands everything to [`reconcile`].

use std::collections::BTreeMap;

use indicatif::ProgressBar;
use log::{debug, warn};
use serde::Serialize;

use super::flags::{PolicyFlags, extract_policy_flags};
use super::listing::list_objects;
use super::reconcile::{AuditInput, AuditReport, reconcile};
use super::references::{ReferenceSet, collect_references};
use super::scope::{ScopeRecord, parse_scope};
use crate::client::{DEFAULT_CONCURRENCY, FetchOutcome, InventoryApi, ObjectKind, fetch_all};
use crate::error::{Error, Result};

/// Tuning for one audit run
#[derive(Clone)]
pub struct AuditOptions {
    /// Width of the detail fetch pool
    pub concurrency: usize,
    /// Advanced once per fetched policy or profile
    pub progress: ProgressBar,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            progress: ProgressBar::hidden(),
        }
    }
}

/// Everything the audit derives from one policy
#[derive(Debug, Clone)]
pub struct PolicyInsight {
    pub scope: ScopeRecord,
    pub references: ReferenceSet,
    pub flags: PolicyFlags,
}

/// A policy or profile that could not be fetched
#[derive(Debug)]
pub struct FetchFailure {
    pub kind: ObjectKind,
    pub id: i64,
    pub error: Error,
}

/// Report plus the per-object failures behind it
#[derive(Debug)]
pub struct AuditRun {
    pub report: AuditReport,
    pub failures: Vec<FetchFailure>,
}

impl std::fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}: {}", self.kind, self.id, self.error)
    }
}

impl AuditRun {
    /// Whether the script and package usage sets are incomplete.
    pub fn references_incomplete(&self) -> bool {
        self.failures.iter().any(|f| f.kind == ObjectKind::Policy)
    }
}

/// Why a policy is or is not flagged
#[derive(Debug, Serialize)]
pub struct PolicyInspection {
    pub policy_id: i64,
    pub scope: ScopeRecord,
    pub flags: PolicyFlags,
    pub scripts_found: Vec<i64>,
    pub packages_found: Vec<i64>,
}

/// Scope of a single profile
#[derive(Debug, Serialize)]
pub struct ProfileInspection {
    pub profile_id: i64,
    pub scope: ScopeRecord,
}

/// Fetch the detail and scope of one policy and derive its insight.
pub async fn fetch_policy_insight<A>(api: &A, id: i64) -> Result<PolicyInsight>
where
    A: InventoryApi + ?Sized,
{
    let (detail, scope_xml) = tokio::try_join!(
        api.get_detail(ObjectKind::Policy, id),
        api.get_scope_xml(ObjectKind::Policy, id),
    )?;

    Ok(PolicyInsight {
        scope: parse_scope(&scope_xml),
        references: collect_references(&detail),
        flags: extract_policy_flags(&detail),
    })
}

async fn fetch_profile_scope<A>(api: &A, id: i64) -> Result<ScopeRecord>
where
    A: InventoryApi + ?Sized,
{
    let xml = api.get_scope_xml(ObjectKind::Profile, id).await?;
    Ok(parse_scope(&xml))
}

/// Run a full audit.
///
/// Listing failures and authentication failures abort the run. Any other
/// per-object failure is logged, excluded from the report and returned in
/// [`AuditRun::failures`].
pub async fn run_audit<A>(api: &A, options: &AuditOptions) -> Result<AuditRun>
where
    A: InventoryApi + ?Sized,
{
    let (policies, profiles, scripts, packages, groups) = tokio::try_join!(
        list_objects(api, ObjectKind::Policy),
        list_objects(api, ObjectKind::Profile),
        list_objects(api, ObjectKind::Script),
        list_objects(api, ObjectKind::Package),
        list_objects(api, ObjectKind::Group),
    )?;

    debug!(
        "Inventory: {} policies, {} profiles, {} scripts, {} packages, {} groups",
        policies.len(),
        profiles.len(),
        scripts.len(),
        packages.len(),
        groups.len()
    );

    let progress = &options.progress;
    progress.set_length((policies.len() + profiles.len()) as u64);

    let policy_outcome = fetch_all(
        policies.iter().map(|p| p.id).collect(),
        |id| {
            let progress = progress.clone();
            async move {
                let result = fetch_policy_insight(api, id).await;
                progress.inc(1);
                result
            }
        },
        options.concurrency,
    )
    .await;

    let mut failures = Vec::new();
    let policy_results = absorb_failures(ObjectKind::Policy, policy_outcome, &mut failures)
        .inspect_err(|_| progress.finish_and_clear())?;

    let profile_outcome = fetch_all(
        profiles.iter().map(|p| p.id).collect(),
        |id| {
            let progress = progress.clone();
            async move {
                let result = fetch_profile_scope(api, id).await;
                progress.inc(1);
                result
            }
        },
        options.concurrency,
    )
    .await;

    progress.finish_and_clear();
    let profile_results = absorb_failures(ObjectKind::Profile, profile_outcome, &mut failures)?;

    let mut input = AuditInput {
        policies,
        profiles,
        scripts,
        packages,
        groups,
        ..Default::default()
    };

    for (id, insight) in policy_results {
        input.scopes.insert((ObjectKind::Policy, id), insight.scope);
        input.references.insert(id, insight.references);
        input.flags.insert(id, insight.flags);
    }
    for (id, scope) in profile_results {
        input.scopes.insert((ObjectKind::Profile, id), scope);
    }
    input.unfetched = failures.iter().map(|f| (f.kind, f.id)).collect();

    Ok(AuditRun {
        report: reconcile(&input),
        failures,
    })
}

/// Split off failures, aborting on the first fatal one.
fn absorb_failures<T>(
    kind: ObjectKind,
    mut outcome: FetchOutcome<T>,
    failures: &mut Vec<FetchFailure>,
) -> Result<BTreeMap<i64, T>> {
    if let Some(fatal) = outcome.take_fatal() {
        return Err(fatal);
    }

    for (id, error) in outcome.failures {
        let failure = FetchFailure { kind, id, error };
        warn!("detail fetch failed for {}", failure);
        failures.push(failure);
    }
    Ok(outcome.successes)
}

/// Explain how one policy is evaluated.
pub async fn inspect_policy<A>(api: &A, id: i64) -> Result<PolicyInspection>
where
    A: InventoryApi + ?Sized,
{
    let insight = fetch_policy_insight(api, id).await?;

    Ok(PolicyInspection {
        policy_id: id,
        scope: insight.scope,
        flags: insight.flags,
        scripts_found: insight.references.script_ids.into_iter().collect(),
        packages_found: insight.references.package_ids.into_iter().collect(),
    })
}

/// Parse the scope of one profile.
pub async fn inspect_profile<A>(api: &A, id: i64) -> Result<ProfileInspection>
where
    A: InventoryApi + ?Sized,
{
    Ok(ProfileInspection {
        profile_id: id,
        scope: fetch_profile_scope(api, id).await?,
    })
}
