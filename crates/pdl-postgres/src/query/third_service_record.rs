use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::model::{NewThirdServiceRecord, ThirdServiceRecord};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for third-party call audit rows.
pub trait ServiceRecordRepository {
    /// Inserts a new audit record.
    fn create_third_service_record(
        &mut self,
        new_record: NewThirdServiceRecord,
    ) -> impl Future<Output = PgResult<ThirdServiceRecord>> + Send;

    /// Lists audit records for an application, oldest first.
    fn list_service_records_by_app_no(
        &mut self,
        application_no: &str,
    ) -> impl Future<Output = PgResult<Vec<ThirdServiceRecord>>> + Send;
}

impl ServiceRecordRepository for PgConnection {
    async fn create_third_service_record(
        &mut self,
        new_record: NewThirdServiceRecord,
    ) -> PgResult<ThirdServiceRecord> {
        use schema::third_service_records;

        diesel::insert_into(third_service_records::table)
            .values(&new_record)
            .returning(ThirdServiceRecord::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)
    }

    async fn list_service_records_by_app_no(
        &mut self,
        application_no: &str,
    ) -> PgResult<Vec<ThirdServiceRecord>> {
        use schema::third_service_records::dsl::*;

        third_service_records
            .filter(app_no.eq(application_no))
            .order(created_at.asc())
            .select(ThirdServiceRecord::as_select())
            .load(self)
            .await
            .map_err(PgError::from)
    }
}
