//! Resume filter: skip customers that already have a stored result.

use std::collections::HashMap;

use pdl_core::{ResultStore, WorkItem};

use crate::{Result, TRACING_TARGET_PIPELINE, WorkerError};

/// Keeps the items whose customer is absent from `processed`, in input order.
///
/// `processed` maps customer id to the provider code of its stored result.
pub fn compute_remaining(items: Vec<WorkItem>, processed: &HashMap<String, String>) -> Vec<WorkItem> {
    items
        .into_iter()
        .filter(|item| !processed.contains_key(&item.customer_id))
        .collect()
}

/// Loads the processed set from `store` and filters `items` against it.
///
/// A store failure is fatal: resuming without the set would repeat billed calls.
pub async fn load_remaining(store: &dyn ResultStore, items: Vec<WorkItem>) -> Result<Vec<WorkItem>> {
    let processed = store
        .processed_customers()
        .await
        .map_err(WorkerError::Resume)?;

    let total = items.len();
    let remaining = compute_remaining(items, &processed);

    tracing::info!(
        target: TRACING_TARGET_PIPELINE,
        total,
        already_processed = processed.len(),
        remaining = remaining.len(),
        "Resume filter applied"
    );

    Ok(remaining)
}

#[cfg(test)]
mod tests {
    use pdl_test::MemoryStore;

    use super::*;

    fn item(customer_id: &str) -> WorkItem {
        WorkItem::new(customer_id, "1", format!("img/{customer_id}.jpg"), "A", "5")
    }

    fn ids(items: &[WorkItem]) -> Vec<&str> {
        items.iter().map(|i| i.customer_id.as_str()).collect()
    }

    #[test]
    fn test_filters_processed_preserving_order() {
        let items = vec![item("C1"), item("C2"), item("C3"), item("C4")];
        let processed = HashMap::from([
            ("C2".to_owned(), "SUCCESS".to_owned()),
            ("C9".to_owned(), "SUCCESS".to_owned()),
        ]);

        let remaining = compute_remaining(items, &processed);
        assert_eq!(ids(&remaining), ["C1", "C3", "C4"]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let items = vec![item("C1"), item("C2"), item("C3")];
        let processed = HashMap::from([("C1".to_owned(), "SUCCESS".to_owned())]);

        let first = compute_remaining(items.clone(), &processed);
        let second = compute_remaining(items, &processed);
        assert_eq!(first, second);
        assert_eq!(ids(&first), ["C2", "C3"]);

        let refiltered = compute_remaining(first.clone(), &processed);
        assert_eq!(refiltered, first);
    }

    #[tokio::test]
    async fn test_load_remaining_from_store() {
        let store = MemoryStore::new().with_processed("C001", "SUCCESS");
        let remaining = load_remaining(&store, vec![item("C001"), item("C002")])
            .await
            .unwrap();
        assert_eq!(ids(&remaining), ["C002"]);
    }
}
