//! Single-call operations.
//!
//! Each method builds one payload and sends it with
//! [`execute`](EngageClient::execute), so a `SUCCESS` of false is an error.

use async_trait::async_trait;
use engage_transport::Transport;

use super::core::EngageClient;
use crate::error::Result;
use crate::job::{JobReport, JobStatusSource};
use crate::payload::{self, CreatedFrom, TableColumn};
use crate::response::Response;

impl<T: Transport + 'static> EngageClient<T> {
    /// Status of a background job.
    pub async fn get_job_status(&self, job_id: &str) -> Result<JobReport> {
        let response = self.execute(payload::get_job_status(job_id)).await?;
        let raw_status = response.require("JOB_STATUS")?;
        Ok(JobReport::new(
            job_id,
            raw_status,
            response.field("JOB_DESCRIPTION").filter(|d| !d.is_empty()),
        ))
    }

    /// Lists visible to the API user.
    pub async fn get_lists(&self, visibility: u8, list_type: u8) -> Result<Response> {
        self.execute(payload::get_lists(visibility, list_type)).await
    }

    /// Recalculate a query, optionally notifying `email`.
    pub async fn calculate_query(&self, query_id: u64, email: Option<&str>) -> Result<Response> {
        self.execute(payload::calculate_query(query_id, email)).await
    }

    /// Add (or update) a recipient.
    pub async fn add_recipient(
        &self,
        list_id: u64,
        email: &str,
        columns: &[(&str, &str)],
        created_from: CreatedFrom,
    ) -> Result<Response> {
        self.execute(payload::add_recipient(list_id, email, columns, created_from))
            .await
    }

    /// Update a recipient, optionally changing the address.
    pub async fn update_recipient(
        &self,
        list_id: u64,
        old_email: &str,
        new_email: Option<&str>,
        columns: &[(&str, &str)],
        created_from: CreatedFrom,
    ) -> Result<Response> {
        self.execute(payload::update_recipient(
            list_id,
            old_email,
            new_email,
            columns,
            created_from,
        ))
        .await
    }

    /// Remove a recipient from a list.
    pub async fn remove_recipient(&self, list_id: u64, email: &str) -> Result<Response> {
        self.execute(payload::remove_recipient(list_id, email)).await
    }

    /// Add a recipient through the double opt-in process.
    pub async fn double_opt_in_recipient(
        &self,
        list_id: u64,
        email: &str,
        columns: &[(&str, &str)],
    ) -> Result<Response> {
        self.execute(payload::double_opt_in_recipient(list_id, email, columns))
            .await
    }

    /// Opt a recipient out of a list.
    pub async fn opt_out_recipient(&self, list_id: u64, email: &str) -> Result<Response> {
        self.execute(payload::opt_out_recipient(list_id, email)).await
    }

    /// Insert or update relational table rows.
    pub async fn insert_update_relational_table(
        &self,
        table_id: u64,
        rows: &[Vec<(&str, &str)>],
    ) -> Result<Response> {
        self.execute(payload::insert_update_relational_table(table_id, rows))
            .await
    }

    /// Create a relational table.
    pub async fn create_table(&self, table_name: &str, columns: &[TableColumn]) -> Result<Response> {
        self.execute(payload::create_table(table_name, columns)?).await
    }

    /// Associate a relational table with a list.
    pub async fn join_table(
        &self,
        list_id: u64,
        table_id: u64,
        mappings: &[(&str, &str)],
    ) -> Result<Response> {
        self.execute(payload::join_table(list_id, table_id, mappings))
            .await
    }
}

#[async_trait]
impl<T: Transport + 'static> JobStatusSource for EngageClient<T> {
    async fn job_status(&self, job_id: &str) -> Result<JobReport> {
        self.get_job_status(job_id).await
    }
}
