//! Scope parsing and reachability

use std::collections::BTreeSet;

use log::debug;
use quick_xml::Reader;
use quick_xml::events::Event;
use serde::Serialize;

/// Deployment targeting of a policy or profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScopeRecord {
    #[serde(rename = "all_computers")]
    pub all_targets: bool,
    #[serde(rename = "targets_groups")]
    pub target_groups: BTreeSet<i64>,
    #[serde(rename = "targets_computers")]
    pub target_computers: BTreeSet<i64>,
    #[serde(rename = "targets_buildings")]
    pub target_buildings: BTreeSet<i64>,
    #[serde(rename = "targets_departments")]
    pub target_departments: BTreeSet<i64>,
    #[serde(rename = "excl_groups")]
    pub excluded_groups: BTreeSet<i64>,
    #[serde(rename = "excl_computers")]
    pub excluded_computers: BTreeSet<i64>,
}

impl ScopeRecord {
    /// Whether the object is deployed to anything.
    ///
    /// Exclusion-only scopes count as configured.
    pub fn is_reachable(&self) -> bool {
        self.all_targets
            || !self.target_groups.is_empty()
            || !self.target_computers.is_empty()
            || !self.target_buildings.is_empty()
            || !self.target_departments.is_empty()
            || !self.excluded_groups.is_empty()
            || !self.excluded_computers.is_empty()
    }

    /// Groups referenced as targets or exclusions
    pub fn referenced_groups(&self) -> impl Iterator<Item = i64> + '_ {
        self.target_groups
            .iter()
            .chain(self.excluded_groups.iter())
            .copied()
    }

    /// Record one text node found at `path` (relative to `<scope>`).
    fn absorb(&mut self, path: &[String], text: &str) {
        let path: Vec<&str> = path.iter().map(String::as_str).collect();
        let ids = match path.as_slice() {
            ["all_computers"] => {
                self.all_targets = text.eq_ignore_ascii_case("true");
                return;
            }
            ["computer_groups", "computer_group", "id"] => &mut self.target_groups,
            ["computers", "computer", "id"] => &mut self.target_computers,
            ["buildings", "building", "id"] => &mut self.target_buildings,
            ["departments", "department", "id"] => &mut self.target_departments,
            ["exclusions", "computer_groups", "computer_group", "id"] => &mut self.excluded_groups,
            ["exclusions", "computers", "computer", "id"] => &mut self.excluded_computers,
            _ => return,
        };
        if let Ok(id) = text.parse::<i64>() {
            ids.insert(id);
        }
    }
}

/// Parse the first `<scope>` element of an XML document.
///
/// Malformed XML or a missing scope element yields the empty (unreachable)
/// record. Non-integer ids are skipped.
pub fn parse_scope(xml: &str) -> ScopeRecord {
    match read_scope(xml) {
        Ok(Some(record)) => record,
        Ok(None) => {
            debug!("[scope] document has no <scope> element");
            ScopeRecord::default()
        }
        Err(e) => {
            debug!("[scope] malformed scope XML: {}", e);
            ScopeRecord::default()
        }
    }
}

fn read_scope(xml: &str) -> Result<Option<ScopeRecord>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut path: Vec<String> = Vec::new();
    // Depth of the open <scope> element, while inside it
    let mut scope_depth: Option<usize> = None;
    let mut record: Option<ScopeRecord> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                path.push(name);
                if record.is_none() && path.last().is_some_and(|n| n == "scope") {
                    scope_depth = Some(path.len());
                    record = Some(ScopeRecord::default());
                }
            }
            Event::End(_) => {
                if scope_depth == Some(path.len()) {
                    scope_depth = None;
                }
                path.pop();
            }
            Event::Text(t) => {
                if let (Some(depth), Some(rec)) = (scope_depth, record.as_mut()) {
                    let text = t.unescape()?;
                    rec.absorb(&path[depth..], text.trim());
                }
            }
            Event::CData(c) => {
                if let (Some(depth), Some(rec)) = (scope_depth, record.as_mut()) {
                    let text = String::from_utf8_lossy(&c);
                    rec.absorb(&path[depth..], text.trim());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !path.is_empty() {
        return Err(quick_xml::Error::Syntax(
            quick_xml::errors::SyntaxError::UnclosedTag,
        ));
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLICY_SCOPE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<policy>
  <scope>
    <all_computers>false</all_computers>
    <computers>
      <computer><id>101</id><name>lab-01</name></computer>
    </computers>
    <computer_groups>
      <computer_group><id>5</id><name>Pilot</name></computer_group>
      <computer_group><id>abc</id><name>Broken</name></computer_group>
    </computer_groups>
    <buildings>
      <building><id>2</id></building>
    </buildings>
    <departments>
      <department><id>8</id></department>
    </departments>
    <exclusions>
      <computers><computer><id>102</id></computer></computers>
      <computer_groups><computer_group><id>6</id></computer_group></computer_groups>
    </exclusions>
  </scope>
</policy>"#;

    #[test]
    fn test_parse_full_scope() {
        let scope = parse_scope(POLICY_SCOPE);

        assert!(!scope.all_targets);
        assert_eq!(scope.target_computers, BTreeSet::from([101]));
        assert_eq!(scope.target_groups, BTreeSet::from([5]));
        assert_eq!(scope.target_buildings, BTreeSet::from([2]));
        assert_eq!(scope.target_departments, BTreeSet::from([8]));
        assert_eq!(scope.excluded_computers, BTreeSet::from([102]));
        assert_eq!(scope.excluded_groups, BTreeSet::from([6]));
        assert!(scope.is_reachable());
        assert_eq!(scope.referenced_groups().collect::<Vec<_>>(), vec![5, 6]);
    }

    #[test]
    fn test_all_computers_flag() {
        let scope = parse_scope(
            "<os_x_configuration_profile><scope><all_computers> TRUE </all_computers></scope></os_x_configuration_profile>",
        );
        assert!(scope.all_targets);
        assert!(scope.is_reachable());
    }

    #[test]
    fn test_empty_scope_is_unreachable() {
        let scope = parse_scope(
            "<policy><scope><all_computers>false</all_computers><computers/><computer_groups/></scope></policy>",
        );
        assert_eq!(scope, ScopeRecord::default());
        assert!(!scope.is_reachable());
    }

    #[test]
    fn test_each_single_field_makes_reachable() {
        let setters: Vec<fn(&mut ScopeRecord)> = vec![
            |s| s.all_targets = true,
            |s| {
                s.target_groups.insert(1);
            },
            |s| {
                s.target_computers.insert(1);
            },
            |s| {
                s.target_buildings.insert(1);
            },
            |s| {
                s.target_departments.insert(1);
            },
            |s| {
                s.excluded_groups.insert(1);
            },
            |s| {
                s.excluded_computers.insert(1);
            },
        ];

        assert!(!ScopeRecord::default().is_reachable());
        for set in setters {
            let mut scope = ScopeRecord::default();
            set(&mut scope);
            assert!(scope.is_reachable(), "{scope:?}");
        }
    }

    #[test]
    fn test_exclusion_only_scope_is_reachable() {
        let scope = parse_scope(
            "<policy><scope><exclusions><computer_groups><computer_group><id>9</id></computer_group></computer_groups></exclusions></scope></policy>",
        );
        assert!(scope.target_groups.is_empty());
        assert_eq!(scope.excluded_groups, BTreeSet::from([9]));
        assert!(scope.is_reachable());
    }

    #[test]
    fn test_missing_scope_element() {
        assert_eq!(
            parse_scope("<policy><general><id>1</id></general></policy>"),
            ScopeRecord::default()
        );
    }

    #[test]
    fn test_malformed_xml_yields_empty_record() {
        assert_eq!(
            parse_scope("<policy><scope><all_computers>true</all_computers></scope>"),
            ScopeRecord::default()
        );
        assert_eq!(
            parse_scope("<policy><scope><all_computers>true</wrong></scope></policy>"),
            ScopeRecord::default()
        );
        assert_eq!(parse_scope(""), ScopeRecord::default());
    }

    #[test]
    fn test_only_first_scope_is_used() {
        let scope = parse_scope(
            "<root><scope><computers><computer><id>1</id></computer></computers></scope><scope><all_computers>true</all_computers></scope></root>",
        );
        assert!(!scope.all_targets);
        assert_eq!(scope.target_computers, BTreeSet::from([1]));
    }

    #[test]
    fn test_nested_exclusion_ids_not_counted_as_targets() {
        let scope = parse_scope(
            "<policy><scope><exclusions><computers><computer><id>4</id></computer></computers></exclusions></scope></policy>",
        );
        assert!(scope.target_computers.is_empty());
        assert_eq!(scope.excluded_computers, BTreeSet::from([4]));
    }

    #[test]
    fn test_cdata_values_are_read() {
        let scope = parse_scope(
            "<policy><scope><all_computers><![CDATA[false]]></all_computers><computer_groups><computer_group><id><![CDATA[5]]></id></computer_group></computer_groups></scope></policy>",
        );
        assert!(!scope.all_targets);
        assert_eq!(scope.target_groups, BTreeSet::from([5]));
        assert!(scope.is_reachable());
    }
}
