//! Result persister.

use pdl_core::{OcrResponse, OcrResult, Result, ResultStore, WorkItem};

use crate::TRACING_TARGET_HANDLER;

/// Stores the extraction for `item` if `response` is a success.
///
/// Returns `Ok(false)` without writing anything for any other provider code;
/// the audit record is then the only trace of the call.
pub async fn persist_ocr_result(
    store: &dyn ResultStore,
    item: &WorkItem,
    response: &OcrResponse,
) -> Result<bool> {
    let Some(result) = OcrResult::from_response(item, response) else {
        return Ok(false);
    };

    store.insert_ocr_result(&result).await?;
    tracing::debug!(
        target: TRACING_TARGET_HANDLER,
        customer_id = %item.customer_id,
        result_id = %result.id,
        "OCR result stored"
    );

    Ok(true)
}

#[cfg(test)]
mod tests {
    use pdl_core::{ErrorKind, OcrReply};
    use pdl_test::{MemoryStore, status_body, success_body};

    use super::*;

    fn item() -> WorkItem {
        WorkItem::new("C002", "1", "img/b.jpg", "A2", "556")
    }

    #[tokio::test]
    async fn test_success_inserts_one_row() {
        let store = MemoryStore::new();
        let reply = OcrReply::from_raw(success_body("ABCDE1234F", "RAVI", "01/01/1990", "SURESH"), 1)
            .unwrap();

        assert!(persist_ocr_result(&store, &item(), &reply.response).await.unwrap());

        let rows = store.results();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].customer_id, "C002");
        assert_eq!(rows[0].pan_number, "ABCDE1234F");
        assert_eq!(rows[0].father_name, "SURESH");
    }

    #[tokio::test]
    async fn test_non_success_is_noop() {
        let store = MemoryStore::new();
        let reply = OcrReply::from_raw(status_body("OCR_NO_RESULT"), 1).unwrap();

        assert!(!persist_ocr_result(&store, &item(), &reply.response).await.unwrap());
        assert!(store.results().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let store = MemoryStore::new();
        store.fail_inserts();
        let reply = OcrReply::from_raw(success_body("P", "N", "B", "F"), 1).unwrap();

        let error = persist_ocr_result(&store, &item(), &reply.response)
            .await
            .unwrap_err();
        assert_eq!(error.kind, ErrorKind::Persistence);
    }
}
