//! Scoped transfer helpers.
//!
//! Each helper opens exactly one session, runs its transfers in order and
//! closes the session whatever the outcome. The first transfer failure stops
//! the remaining transfers.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{TransferError, TransferResult};
use crate::traits::{BulkTransferService, RemoteDirectory, TransferMode, TransferSession};

/// Remote file name for a local path: its base name.
///
/// The remote host resolves names relative to the fixed directory, so any
/// local directory components are dropped.
pub fn remote_name_for(path: &Path) -> TransferResult<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| TransferError::InvalidPath {
            path: path.to_path_buf(),
            reason: "path has no UTF-8 file name".to_string(),
        })
}

/// Upload `files` in order into the `upload` directory.
///
/// Returns the remote names (base names) in the same order. When a transfer
/// fails, later files are not sent and the error is returned after the
/// session has been closed.
pub async fn upload_files(
    service: &dyn BulkTransferService,
    files: &[&Path],
    mode: TransferMode,
) -> TransferResult<Vec<String>> {
    // Resolve every name before touching the network
    let names = files
        .iter()
        .map(|path| remote_name_for(path))
        .collect::<TransferResult<Vec<_>>>()?;

    let mut session = service.open(RemoteDirectory::Upload).await?;

    let mut outcome = Ok(());
    for (path, name) in files.iter().zip(&names) {
        match session.put(path, name, mode).await {
            Ok(bytes) => debug!(file = %name, bytes, "uploaded"),
            Err(e) => {
                outcome = Err(e);
                break;
            }
        }
    }

    release(session, outcome).await?;
    info!(files = names.len(), "upload complete");
    Ok(names)
}

/// Download `remote_name` from the `download` directory into `destination`.
///
/// After the transfer the local file must exist and be non-empty; the
/// channel offers no checksum, so this is the only integrity signal.
pub async fn download_file(
    service: &dyn BulkTransferService,
    remote_name: &str,
    destination: &Path,
    mode: TransferMode,
) -> TransferResult<u64> {
    let mut session = service.open(RemoteDirectory::Download).await?;
    let outcome = session.get(remote_name, destination, mode).await;
    let written = release(session, outcome).await?;

    verify_local_file(destination).await?;
    info!(file = %remote_name, bytes = written, destination = %destination.display(), "download complete");
    Ok(written)
}

/// Close the session, preferring the transfer error over a close error.
async fn release<T>(
    session: Box<dyn TransferSession>,
    outcome: TransferResult<T>,
) -> TransferResult<T> {
    match (outcome, session.close().await) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(value), Err(close_err)) => {
            // The payload already made it across; a failing QUIT does not undo that
            warn!(error = %close_err, "failed to close transfer session cleanly");
            Ok(value)
        }
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            warn!(error = %close_err, "failed to close transfer session after error");
            Err(e)
        }
    }
}

async fn verify_local_file(path: &Path) -> TransferResult<()> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if !meta.is_file() => Err(TransferError::Integrity {
            path: path.to_path_buf(),
            reason: "destination is not a regular file".to_string(),
        }),
        Ok(meta) if meta.len() == 0 => Err(TransferError::Integrity {
            path: path.to_path_buf(),
            reason: "downloaded file is empty".to_string(),
        }),
        Ok(_) => Ok(()),
        Err(e) => Err(TransferError::Integrity {
            path: path.to_path_buf(),
            reason: format!("downloaded file is missing: {e}"),
        }),
    }
}
