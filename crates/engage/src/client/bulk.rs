//! Bulk export and import orchestration.
//!
//! Exports: submit the request, read `FILE_PATH` and `JOB_ID`, poll the job,
//! and download the file once it is ready. Imports: stage the map and source
//! files in `upload`, then submit the request naming them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use engage_transfer::{BulkTransferService, TransferMode, download_file, upload_files};
use engage_transport::Transport;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use super::core::EngageClient;
use crate::error::Result;
use crate::payload::{self, ImportKind, RawRecipientDataOptions, RequestBody};
use crate::response::Response;

/// A downloaded export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferArtifact {
    /// File name in the remote `download` directory
    pub remote_file_name: String,
    /// Where the file was written
    pub local_path: PathBuf,
    /// Bytes written locally
    pub bytes: u64,
}

impl<T: Transport + 'static> EngageClient<T> {
    /// Export `columns` of every recipient in `list_id` and download the CSV
    /// (text mode) to `destination`.
    pub async fn export_list(
        &self,
        list_id: u64,
        columns: &[&str],
        destination: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> Result<TransferArtifact> {
        self.export(
            payload::export_list(list_id, columns),
            destination.as_ref(),
            TransferMode::Text,
            cancel,
        )
        .await
    }

    /// Run a raw recipient data export and download the result (binary mode)
    /// to `destination`.
    pub async fn raw_recipient_data_export(
        &self,
        options: &RawRecipientDataOptions,
        destination: impl AsRef<Path>,
        cancel: &CancellationToken,
    ) -> Result<TransferArtifact> {
        self.export(
            payload::raw_recipient_data_export(options),
            destination.as_ref(),
            TransferMode::Binary,
            cancel,
        )
        .await
    }

    /// Upload `map_file` then `source_file` and start a list import.
    ///
    /// The import request is only sent after both uploads succeed. The job is
    /// not polled; the returned response carries its `JOB_ID`.
    pub async fn import_list(
        &self,
        map_file: impl AsRef<Path>,
        source_file: impl AsRef<Path>,
    ) -> Result<Response> {
        self.import(ImportKind::List, map_file.as_ref(), source_file.as_ref())
            .await
    }

    /// Upload `map_file` then `source_file` and start a relational table import.
    pub async fn import_table(
        &self,
        map_file: impl AsRef<Path>,
        source_file: impl AsRef<Path>,
    ) -> Result<Response> {
        self.import(ImportKind::Table, map_file.as_ref(), source_file.as_ref())
            .await
    }

    #[instrument(skip_all, fields(operation = body.operation(), destination = %destination.display()))]
    async fn export(
        &self,
        body: RequestBody,
        destination: &Path,
        mode: TransferMode,
        cancel: &CancellationToken,
    ) -> Result<TransferArtifact> {
        let transfer = self.transfer_service()?;

        let response = self.execute(body).await?;
        let file_path = response.require("FILE_PATH")?;
        let job_id = response.require("JOB_ID")?;
        let remote_file_name = remote_base_name(&file_path).to_string();
        info!(job_id = %job_id, file = %remote_file_name, "export submitted");

        let destination = destination.to_path_buf();
        self.inner
            .poller
            .await_completion(self, &job_id, cancel, move |_report| {
                fetch_artifact(transfer, remote_file_name, destination, mode)
            })
            .await
    }

    #[instrument(skip_all, fields(kind = ?kind))]
    async fn import(&self, kind: ImportKind, map_file: &Path, source_file: &Path) -> Result<Response> {
        let transfer = self.transfer_service()?;
        let names = upload_files(transfer.as_ref(), &[map_file, source_file], TransferMode::Text).await?;

        let (map_name, source_name) = (&names[0], &names[1]);
        let body = match kind {
            ImportKind::List => payload::import_list(map_name, source_name),
            ImportKind::Table => payload::import_table(map_name, source_name),
        };
        let response = self.execute(body).await?;
        info!(
            map = %map_name,
            source = %source_name,
            job_id = %response.field("JOB_ID").unwrap_or_default(),
            "import submitted"
        );
        Ok(response)
    }
}

async fn fetch_artifact(
    transfer: Arc<dyn BulkTransferService>,
    remote_file_name: String,
    local_path: PathBuf,
    mode: TransferMode,
) -> Result<TransferArtifact> {
    let bytes = download_file(transfer.as_ref(), &remote_file_name, &local_path, mode).await?;
    Ok(TransferArtifact {
        remote_file_name,
        local_path,
        bytes,
    })
}

/// Export paths are reported relative to the transfer root; only the name
/// inside `download` is needed.
fn remote_base_name(file_path: &str) -> &str {
    file_path
        .rsplit(['/', '\\'])
        .find(|part| !part.is_empty())
        .unwrap_or(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_base_name() {
        assert_eq!(remote_base_name("export_123.csv"), "export_123.csv");
        assert_eq!(remote_base_name("/download/export_123.csv"), "export_123.csv");
        assert_eq!(remote_base_name("download\\raw.zip"), "raw.zip");
        assert_eq!(remote_base_name("dir/"), "dir");
    }
}
