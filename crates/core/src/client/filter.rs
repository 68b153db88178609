//! Strict resolution of requested identifiers against a listing
//!
//! Unlike a plain filter, every requested identifier must match: the first
//! missing one fails the whole call with a `NotFound` naming it. Results
//! follow the order of the request, not of the listing. Requesting nothing
//! returns the listing untouched.

use std::collections::HashMap;

use storectl_domain::{ApiError, Resource, Result};

/// Select `items` matching `ids`, in `ids` order
///
/// # Errors
///
/// Returns `ApiError::NotFound` for the first ID with no match.
pub fn filter_by_ids<R>(items: Vec<R>, ids: &[R::Id]) -> Result<Vec<R>>
where
    R: Resource + Clone,
{
    if ids.is_empty() {
        return Ok(items);
    }

    let by_id: HashMap<&R::Id, &R> = items.iter().map(|item| (item.id(), item)).collect();

    ids.iter()
        .map(|id| {
            by_id
                .get(id)
                .map(|item| (*item).clone())
                .ok_or_else(|| ApiError::not_found_id(R::KIND, id))
        })
        .collect()
}

/// Select `items` whose name matches `names`, in `names` order
///
/// # Errors
///
/// Returns `ApiError::NotFound` for the first name with no match.
pub fn filter_by_names<R, S>(items: Vec<R>, names: &[S]) -> Result<Vec<R>>
where
    R: Resource + Clone,
    S: AsRef<str>,
{
    if names.is_empty() {
        return Ok(items);
    }

    let by_name: HashMap<&str, &R> = items.iter().map(|item| (item.name(), item)).collect();

    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            by_name
                .get(name)
                .map(|item| (*item).clone())
                .ok_or_else(|| ApiError::not_found_name(R::KIND, name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use storectl_domain::{Node, NodeId};

    use super::*;
    use crate::testing::fixtures;

    fn listing() -> Vec<Node> {
        vec![fixtures::node(1, "alpha"), fixtures::node(2, "beta"), fixtures::node(3, "gamma")]
    }

    fn ids(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_empty_request_returns_listing_unchanged() {
        let result = filter_by_ids(listing(), &[]).unwrap();
        assert_eq!(ids(&result), vec!["node-1", "node-2", "node-3"]);

        let result = filter_by_names::<Node, &str>(listing(), &[]).unwrap();
        assert_eq!(ids(&result), vec!["node-1", "node-2", "node-3"]);
    }

    #[test]
    fn test_result_follows_request_order() {
        let requested = vec![fixtures::node_id(3), fixtures::node_id(1)];
        let result = filter_by_ids(listing(), &requested).unwrap();
        assert_eq!(ids(&result), vec!["node-3", "node-1"]);

        let result = filter_by_names(listing(), &["beta", "gamma"]).unwrap();
        assert_eq!(ids(&result), vec!["node-2", "node-3"]);
    }

    #[test]
    fn test_first_missing_id_is_reported() {
        let requested = vec![fixtures::node_id(1), NodeId::new("node-9"), NodeId::new("node-8")];
        let err = filter_by_ids(listing(), &requested).unwrap_err();
        assert_eq!(err, ApiError::NotFound("node with id \"node-9\" not found".into()));
    }

    #[test]
    fn test_first_missing_name_is_reported() {
        let err = filter_by_names(listing(), &["alpha", "delta", "epsilon"]).unwrap_err();
        assert_eq!(err, ApiError::NotFound("node with name \"delta\" not found".into()));
    }

    #[test]
    fn test_missing_identifier_in_empty_listing() {
        let err = filter_by_names(Vec::<Node>::new(), &["alpha"]).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn test_duplicate_requests_yield_duplicate_entries() {
        let result = filter_by_names(listing(), &["alpha", "alpha"]).unwrap();
        assert_eq!(ids(&result), vec!["node-1", "node-1"]);
    }
}
