//! Archive category moves

use log::{debug, error};
use quick_xml::escape::escape;

use crate::client::{InventoryApi, InventoryObject, ObjectKind};
use crate::error::{Error, Result};

/// Default archive category name
pub const DEFAULT_ARCHIVE_CATEGORY: &str = "z_Archive";

/// Outcome of an [`archive_all`] pass
#[derive(Debug, Default)]
pub struct ArchiveSummary {
    pub moved: Vec<InventoryObject>,
    pub failed: Vec<(InventoryObject, Error)>,
}

/// Category-only XML body for `kind`.
///
/// `legacy` selects the older element layout still required by some
/// servers for scripts and packages. Returns `None` when the kind has no
/// such body.
pub fn category_body(kind: ObjectKind, category: &str, legacy: bool) -> Option<String> {
    let name = escape(category);
    let inner = match (kind, legacy) {
        (ObjectKind::Policy | ObjectKind::Profile, false) => {
            format!("<general><category><name>{name}</name></category></general>")
        }
        (ObjectKind::Script | ObjectKind::Package, false) => {
            format!("<category><name>{name}</name></category>")
        }
        (ObjectKind::Script, true) => format!("<category_name>{name}</category_name>"),
        (ObjectKind::Package, true) => format!("<category>{name}</category>"),
        _ => return None,
    };
    let root = kind.xml_root();
    Some(format!("<{root}>{inner}</{root}>"))
}

/// Move one object into `category`.
///
/// Scripts and packages fall back to the legacy body when the first update
/// fails with a non-fatal error. Re-archiving is a plain overwrite, so
/// repeating the call is harmless.
pub async fn archive<A>(api: &A, object: &InventoryObject, category: &str) -> Result<()>
where
    A: InventoryApi + ?Sized,
{
    let body = category_body(object.kind, category, false).ok_or_else(|| {
        Error::Other(format!("{} objects cannot be archived", object.kind))
    })?;

    let first = api.put_xml(object.kind, object.id, &body).await;
    let err = match first {
        Ok(()) => return Ok(()),
        Err(err) if err.is_fatal() => return Err(err),
        Err(err) => err,
    };

    match category_body(object.kind, category, true) {
        Some(legacy) => {
            debug!(
                "{} {} rejected category body ({}), retrying legacy layout",
                object.kind, object.id, err
            );
            api.put_xml(object.kind, object.id, &legacy).await
        }
        None => Err(err),
    }
}

/// Archive every target independently.
///
/// A failed move is logged and recorded; the rest still run. A fatal error
/// (credentials rejected) stops the pass.
pub async fn archive_all<A>(
    api: &A,
    targets: &[InventoryObject],
    category: &str,
) -> Result<ArchiveSummary>
where
    A: InventoryApi + ?Sized,
{
    let mut summary = ArchiveSummary::default();

    for object in targets {
        match archive(api, object, category).await {
            Ok(()) => {
                debug!("[moved] {} {} -> {}", object.kind, object.id, category);
                summary.moved.push(object.clone());
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                error!("move {} {} failed: {}", object.kind, object.id, err);
                summary.failed.push((object.clone(), err));
            }
        }
    }

    Ok(summary)
}
