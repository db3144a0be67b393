use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::model::{CustOcrResult, NewCustOcrResult, ProcessedCustomer};
use crate::{PgConnection, PgError, PgResult, TRACING_TARGET_QUERY, schema};

/// Repository for OCR result rows.
pub trait OcrResultRepository {
    /// Inserts a new OCR result.
    fn create_cust_ocr_result(
        &mut self,
        new_result: NewCustOcrResult,
    ) -> impl Future<Output = PgResult<CustOcrResult>> + Send;

    /// Lists the customer id and provider code of every customer with a stored result.
    ///
    /// A customer stored more than once is listed once, with its earliest row.
    fn list_processed_customers(
        &mut self,
    ) -> impl Future<Output = PgResult<Vec<ProcessedCustomer>>> + Send;
}

impl OcrResultRepository for PgConnection {
    async fn create_cust_ocr_result(
        &mut self,
        new_result: NewCustOcrResult,
    ) -> PgResult<CustOcrResult> {
        use schema::cust_ocr_results;

        let result = diesel::insert_into(cust_ocr_results::table)
            .values(&new_result)
            .returning(CustOcrResult::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        tracing::debug!(
            target: TRACING_TARGET_QUERY,
            customer_id = %result.customer_id,
            "Stored OCR result"
        );

        Ok(result)
    }

    async fn list_processed_customers(&mut self) -> PgResult<Vec<ProcessedCustomer>> {
        use schema::cust_ocr_results::dsl::*;

        let rows = cust_ocr_results
            .select(ProcessedCustomer::as_select())
            .distinct_on(customer_id)
            .order((customer_id, inserted_at))
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(rows)
    }
}
