//! Script and package references in policy detail payloads

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value};

use super::listing::coerce_id;

/// Script and package ids a policy refers to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReferenceSet {
    pub script_ids: BTreeSet<i64>,
    pub package_ids: BTreeSet<i64>,
}

impl ReferenceSet {
    fn add(&mut self, context: Context, id: i64) {
        if context.script {
            self.script_ids.insert(id);
        }
        if context.package {
            self.package_ids.insert(id);
        }
    }
}

/// Which reference kinds the current path points into
#[derive(Debug, Clone, Copy, Default)]
struct Context {
    script: bool,
    package: bool,
}

impl Context {
    fn of(path: &[String]) -> Self {
        path.iter().fold(Self::default(), |ctx, segment| {
            let segment = segment.to_ascii_lowercase();
            Self {
                script: ctx.script || segment.contains("script"),
                package: ctx.package || segment.contains("package"),
            }
        })
    }

    fn any(&self) -> bool {
        self.script || self.package
    }
}

/// Collect every script and package id referenced anywhere in `detail`.
///
/// A node is in script (package) context when any key or list index on its
/// path contains "script" ("package"), case-insensitive. In context, the
/// collector takes the `id` of mappings, bare integers and numeric strings.
/// This over-collects on purpose: a stray numeric field under a
/// script-named key still counts as a reference.
pub fn collect_references(detail: &Value) -> ReferenceSet {
    let mut refs = ReferenceSet::default();
    let mut path = Vec::new();
    visit(detail, &mut path, &mut refs);
    refs
}

fn visit(node: &Value, path: &mut Vec<String>, refs: &mut ReferenceSet) {
    match node {
        Value::Object(map) => {
            visit_mapping_id(map, path, refs);
            for (key, child) in map {
                path.push(key.clone());
                visit(child, path, refs);
                path.pop();
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                path.push(index.to_string());
                visit(child, path, refs);
                path.pop();
            }
        }
        Value::Number(n) => {
            let context = Context::of(path);
            if let (true, Some(id)) = (context.any(), n.as_i64()) {
                refs.add(context, id);
            }
        }
        Value::String(s) => {
            let context = Context::of(path);
            if let (true, Ok(id)) = (context.any(), s.trim().parse::<i64>()) {
                refs.add(context, id);
            }
        }
        Value::Bool(_) | Value::Null => {}
    }
}

fn visit_mapping_id(map: &Map<String, Value>, path: &[String], refs: &mut ReferenceSet) {
    let context = Context::of(path);
    if !context.any() {
        return;
    }
    if let Some(id) = map.get("id").and_then(coerce_id) {
        refs.add(context, id);
    }
}
