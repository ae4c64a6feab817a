//! Switch routing: pick a node output by the contact's group membership.

use crate::types::Contact;

/// The explicit catch-all output identifier.
pub const DEFAULT_OUTPUT: &str = "default";

/// Resolve the switch output for a contact.
///
/// Outputs are tried in their configured order — the order is the priority.
/// The first output the contact belongs to wins.  When nothing matches, an
/// explicit `"default"` output is taken if configured; otherwise `None` is
/// returned so branch resolution can fall back to an untagged edge instead
/// of dead-ending the run.  Empty outputs mean "not configured", not an
/// error.
pub fn route_by_group(contact: &Contact, configured_outputs: &[String]) -> Option<String> {
    if configured_outputs.is_empty() {
        return None;
    }

    let groups = contact.group_set();
    for output in configured_outputs {
        if groups.contains(output.as_str()) {
            return Some(output.clone());
        }
    }

    if configured_outputs.iter().any(|o| o == DEFAULT_OUTPUT) {
        return Some(DEFAULT_OUTPUT.to_owned());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact_in(primary: Option<&str>, groups: &[&str]) -> Contact {
        Contact {
            id: "c1".into(),
            name: "Iris".into(),
            phone: None,
            email: None,
            language: None,
            primary_group_id: primary.map(str::to_owned),
            group_ids: groups.iter().map(|g| g.to_string()).collect(),
        }
    }

    fn outputs(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn configured_order_is_the_priority() {
        let contact = contact_in(None, &["a", "b"]);
        assert_eq!(
            route_by_group(&contact, &outputs(&["b", "a"])),
            Some("b".into())
        );
        assert_eq!(
            route_by_group(&contact, &outputs(&["a", "b"])),
            Some("a".into())
        );
    }

    #[test]
    fn legacy_primary_group_matches() {
        let contact = contact_in(Some("hot"), &[]);
        assert_eq!(
            route_by_group(&contact, &outputs(&["hot", "cold"])),
            Some("hot".into())
        );
    }

    #[test]
    fn falls_back_to_default_output() {
        let contact = contact_in(None, &["unrelated"]);
        assert_eq!(
            route_by_group(&contact, &outputs(&["hot", "default"])),
            Some("default".into())
        );
    }

    #[test]
    fn no_match_and_no_default_returns_none() {
        let contact = contact_in(None, &["unrelated"]);
        assert_eq!(route_by_group(&contact, &outputs(&["hot", "cold"])), None);
    }

    #[test]
    fn empty_outputs_are_not_configured() {
        let contact = contact_in(Some("hot"), &[]);
        assert_eq!(route_by_group(&contact, &[]), None);
    }
}
