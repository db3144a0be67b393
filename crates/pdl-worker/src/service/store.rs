//! [`ResultStore`] backed by the Postgres crate.

use std::collections::HashMap;

use pdl_core::{AuditRecord, Error, OcrResult, Result, ResultStore};
use pdl_postgres::model::{NewCustOcrResult, NewThirdServiceRecord, ProcessedCustomer};
use pdl_postgres::{OcrResultRepository, PgClient, PgError, ServiceRecordRepository};
use uuid::Uuid;

/// Result store writing to `cust_ocr_results` and `third_service_records`.
///
/// Every insert runs on its own pooled connection in its own implicit
/// transaction.
#[derive(Debug, Clone)]
pub struct PgResultStore {
    client: PgClient,
}

impl PgResultStore {
    /// Creates a store over a connected client.
    pub fn new(client: PgClient) -> Self {
        Self { client }
    }
}

fn persistence(error: PgError) -> Error {
    let transient = error.is_transient();
    Error::persistence(error).with_context(if transient {
        "postgres (transient)"
    } else {
        "postgres"
    })
}

fn new_ocr_result(result: &OcrResult) -> NewCustOcrResult {
    NewCustOcrResult {
        id: result.id,
        customer_id: result.customer_id.clone(),
        business_type: result.business_type.clone(),
        provider_code: result.provider_code.clone(),
        provider_message: result.provider_message.clone(),
        pan_number: result.pan_number.clone(),
        customer_name: result.name.clone(),
        birthday: result.birthday.clone(),
        father_name: result.father_name.clone(),
        inserted_at: result.inserted_at.into(),
        updated_at: result.updated_at.into(),
    }
}

fn new_service_record(record: &AuditRecord) -> NewThirdServiceRecord {
    NewThirdServiceRecord {
        id: Uuid::new_v4(),
        app_no: record.app_no.clone(),
        regist_no: record.regist_no.clone(),
        transaction_id: record.transaction_id.clone(),
        service_name: record.service_name.clone(),
        inst_user_no: record.inst_user_no.clone(),
        request_time: record.request_time.into(),
        response_time: record.response_time.into(),
        response_status: record.response_status.code().to_owned(),
        response_code: record.response_code.clone(),
        response_message: record.response_message.clone(),
        is_pay: record.is_pay.code().to_owned(),
        remark: record.remark.clone(),
    }
}

/// Maps customer id to the provider code of its stored result.
fn processed_map(rows: Vec<ProcessedCustomer>) -> HashMap<String, String> {
    let mut processed = HashMap::with_capacity(rows.len());
    for row in rows {
        processed.entry(row.customer_id).or_insert(row.provider_code);
    }
    processed
}

#[async_trait::async_trait]
impl ResultStore for PgResultStore {
    async fn processed_customers(&self) -> Result<HashMap<String, String>> {
        let mut conn = self.client.get_connection().await.map_err(persistence)?;
        let rows = conn
            .list_processed_customers()
            .await
            .map_err(persistence)?;
        Ok(processed_map(rows))
    }

    async fn insert_ocr_result(&self, result: &OcrResult) -> Result<()> {
        let mut conn = self.client.get_connection().await.map_err(persistence)?;
        conn.create_cust_ocr_result(new_ocr_result(result))
            .await
            .map_err(persistence)?;
        Ok(())
    }

    async fn insert_audit_record(&self, record: &AuditRecord) -> Result<()> {
        let mut conn = self.client.get_connection().await.map_err(persistence)?;
        conn.create_third_service_record(new_service_record(record))
            .await
            .map_err(persistence)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pdl_core::{OcrReply, WorkItem};

    use super::*;

    fn item() -> WorkItem {
        WorkItem::new("C002", "1", "img/b.jpg", "A2", "556")
    }

    #[test]
    fn test_ocr_result_mapping() {
        let raw = r#"{"code":"SUCCESS","message":"OK","data":{"cardType":"PAN_FRONT","values":{"idNumber":"ABCDE1234F","name":"RAVI","birthday":"01/01/1990","fatherName":"SURESH"}}}"#;
        let reply = OcrReply::from_raw(raw, 1).unwrap();
        let result = OcrResult::from_response(&item(), &reply.response).unwrap();

        let row = new_ocr_result(&result);
        assert_eq!(row.id, result.id);
        assert_eq!(row.customer_name, "RAVI");
        assert_eq!(row.pan_number, "ABCDE1234F");
        assert_eq!(jiff::Timestamp::from(row.inserted_at), result.inserted_at);
    }

    #[test]
    fn test_processed_map_keys_customer_to_provider_code() {
        let row = |customer: &str, code: &str| ProcessedCustomer {
            customer_id: customer.to_owned(),
            provider_code: code.to_owned(),
        };

        let processed = processed_map(vec![
            row("C001", "SUCCESS"),
            row("C003", "SUCCESS"),
            row("C001", "ERROR"),
        ]);

        assert_eq!(processed.len(), 2);
        assert_eq!(processed["C001"], "SUCCESS");
        assert_eq!(processed["C003"], "SUCCESS");

        let remaining = crate::compute_remaining(
            vec![item(), WorkItem::new("C001", "1", "img/a.jpg", "A1", "555")],
            &processed,
        );
        assert_eq!(remaining, vec![item()]);
    }

    #[test]
    fn test_service_record_mapping() {
        let raw = r#"{"code":"OCR_NO_RESULT","transactionId":"tx-9","pricingStrategy":"PAY"}"#;
        let reply = OcrReply::from_raw(raw, 1).unwrap();
        let record = AuditRecord::answered(&item(), pdl_core::audit::now(), &reply);

        let row = new_service_record(&record);
        assert_eq!(row.app_no, "A2");
        assert_eq!(row.regist_no, "556");
        assert_eq!(row.response_status, "10000001");
        assert_eq!(row.is_pay, "10000001");
        assert_eq!(row.remark, raw);
    }
}
