//! Relation resolution

use crate::core::options::RelationsOption;

/// Resolve the relations to load
///
/// First match wins: the override list (even empty), a route option of
/// `false` (no relation), a route list. `None` leaves the choice to the
/// entity's default relations.
pub fn resolve_relations(
    override_relations: Option<&[String]>,
    route_option: Option<&RelationsOption>,
) -> Option<Vec<String>> {
    if let Some(relations) = override_relations {
        return Some(relations.to_vec());
    }
    match route_option {
        Some(RelationsOption::Toggle(false)) => Some(Vec::new()),
        Some(RelationsOption::List(relations)) => Some(relations.clone()),
        Some(RelationsOption::Toggle(true)) | None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_override_wins_even_when_empty() {
        let route = RelationsOption::List(strings(&["writer"]));
        assert_eq!(
            resolve_relations(Some(&[][..]), Some(&route)),
            Some(Vec::new())
        );
        let over = strings(&["category"]);
        assert_eq!(
            resolve_relations(Some(over.as_slice()), Some(&RelationsOption::Toggle(false))),
            Some(over.clone())
        );
    }

    #[test]
    fn test_route_option() {
        assert_eq!(
            resolve_relations(None, Some(&RelationsOption::Toggle(false))),
            Some(Vec::new())
        );
        assert_eq!(
            resolve_relations(None, Some(&RelationsOption::List(strings(&["writer"])))),
            Some(strings(&["writer"]))
        );
    }

    #[test]
    fn test_entity_default() {
        assert_eq!(resolve_relations(None, None), None);
        assert_eq!(resolve_relations(None, Some(&RelationsOption::Toggle(true))), None);
    }
}
