//! Shared test doubles: a scripted transport and an in-memory transfer service.
//!
//! Both can write into one [`EventLog`] so tests can assert the interleaving
//! of remote calls and file transfers.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use engage::{ClientBuilder, Credentials, EngageClient, PollPolicy};
use engage_transfer::{
    BulkTransferService, RemoteDirectory, TransferError, TransferMode, TransferResult,
    TransferSession,
};
use engage_transport::{Transport, TransportError, TransportRequest, TransportResult};
use parking_lot::Mutex;

pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn envelope(result: &str) -> String {
    format!("<Envelope><Body><RESULT>{result}</RESULT></Body></Envelope>")
}

pub fn ok(fields: &str) -> String {
    envelope(&format!("<SUCCESS>TRUE</SUCCESS>{fields}"))
}

pub fn fault(message: &str) -> String {
    format!(
        "<Envelope><Body><RESULT><SUCCESS>false</SUCCESS></RESULT><Fault><Request/><FaultCode/>\
         <FaultString><![CDATA[{message}]]></FaultString></Fault></Body></Envelope>"
    )
}

pub fn login_ok(session_id: &str) -> String {
    ok(&format!(
        "<SESSIONID>{session_id}</SESSIONID><ORGANIZATION_ID>1</ORGANIZATION_ID>\
         <SESSION_ENCODING>;jsessionid={session_id}</SESSION_ENCODING>"
    ))
}

pub fn job_status(job_id: &str, status: &str) -> String {
    ok(&format!(
        "<JOB_ID>{job_id}</JOB_ID><JOB_STATUS>{status}</JOB_STATUS><JOB_DESCRIPTION>Export</JOB_DESCRIPTION>"
    ))
}

enum Reply {
    Body(String),
    Failure(String),
}

/// Transport answering from a script, first in first out.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<TransportRequest>>,
    log: Option<EventLog>,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("pending", &self.script.lock().len())
            .finish()
    }
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_log(log: EventLog) -> Arc<Self> {
        Arc::new(Self {
            log: Some(log),
            ..Self::default()
        })
    }

    pub fn reply(&self, body: impl Into<String>) -> &Self {
        self.script.lock().push_back(Reply::Body(body.into()));
        self
    }

    pub fn fail(&self, message: &str) -> &Self {
        self.script.lock().push_back(Reply::Failure(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.requests().iter().map(|r| r.body_text().into_owned()).collect()
    }

    /// Operation element of every request sent so far.
    pub fn operations(&self) -> Vec<String> {
        self.requests().iter().map(|r| operation_of(&r.body_text())).collect()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.operations().iter().filter(|op| *op == operation).count()
    }
}

pub fn operation_of(body: &str) -> String {
    body.strip_prefix("<Envelope><Body><")
        .and_then(|rest| rest.split(['>', '/']).next())
        .unwrap_or_default()
        .to_string()
}

impl Transport for MockTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Bytes>> + Send + '_>> {
        if let Some(log) = &self.log {
            log.lock().push(format!("send {}", operation_of(&request.body_text())));
        }
        self.requests.lock().push(request);
        let reply = self.script.lock().pop_front();
        Box::pin(async move {
            match reply {
                Some(Reply::Body(body)) => Ok(Bytes::from(body)),
                Some(Reply::Failure(message)) => Err(TransportError::ConnectionFailed(message)),
                None => Err(TransportError::ConnectionFailed("script exhausted".into())),
            }
        })
    }
}

/// In-memory transfer service. Records every open/put/get/close.
#[derive(Debug, Default)]
pub struct MockTransfer {
    log: EventLog,
    downloads: Mutex<HashMap<String, Vec<u8>>>,
    uploads: Arc<Mutex<HashMap<String, (Vec<u8>, TransferMode)>>>,
    fail_open: bool,
    fail_put: Option<String>,
}

impl MockTransfer {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    pub fn with_download(self, name: &str, contents: &[u8]) -> Self {
        self.downloads.lock().insert(name.to_string(), contents.to_vec());
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn failing_put(mut self, remote_name: &str) -> Self {
        self.fail_put = Some(remote_name.to_string());
        self
    }

    pub fn uploads(&self) -> Arc<Mutex<HashMap<String, (Vec<u8>, TransferMode)>>> {
        self.uploads.clone()
    }
}

#[async_trait]
impl BulkTransferService for MockTransfer {
    async fn open(&self, directory: RemoteDirectory) -> TransferResult<Box<dyn TransferSession>> {
        self.log.lock().push(format!("open {directory}"));
        if self.fail_open {
            return Err(TransferError::Connection("connection refused".into()));
        }
        Ok(Box::new(MockSession {
            directory,
            log: self.log.clone(),
            downloads: self.downloads.lock().clone(),
            uploads: self.uploads.clone(),
            fail_put: self.fail_put.clone(),
        }))
    }
}

struct MockSession {
    directory: RemoteDirectory,
    log: EventLog,
    downloads: HashMap<String, Vec<u8>>,
    uploads: Arc<Mutex<HashMap<String, (Vec<u8>, TransferMode)>>>,
    fail_put: Option<String>,
}

#[async_trait]
impl TransferSession for MockSession {
    async fn put(&mut self, local: &Path, remote_name: &str, mode: TransferMode) -> TransferResult<u64> {
        self.log
            .lock()
            .push(format!("put {}/{remote_name} {mode:?}", self.directory));
        if self.fail_put.as_deref() == Some(remote_name) {
            return Err(TransferError::Transfer {
                file: remote_name.to_string(),
                reason: "552 quota exceeded".into(),
            });
        }
        let contents = tokio::fs::read(local).await?;
        let len = contents.len() as u64;
        self.uploads
            .lock()
            .insert(remote_name.to_string(), (contents, mode));
        Ok(len)
    }

    async fn get(&mut self, remote_name: &str, local: &Path, mode: TransferMode) -> TransferResult<u64> {
        self.log
            .lock()
            .push(format!("get {}/{remote_name} {mode:?}", self.directory));
        let contents = self
            .downloads
            .get(remote_name)
            .cloned()
            .ok_or_else(|| TransferError::Transfer {
                file: remote_name.to_string(),
                reason: "550 not found".into(),
            })?;
        tokio::fs::write(local, &contents).await?;
        Ok(contents.len() as u64)
    }

    async fn close(self: Box<Self>) -> TransferResult<()> {
        self.log.lock().push(format!("close {}", self.directory));
        Ok(())
    }
}

pub fn client(transport: &Arc<MockTransport>) -> EngageClient<Arc<MockTransport>> {
    ClientBuilder::new(transport.clone())
        .with_credentials(Credentials::new("api-user", "secret"))
        .build()
}

pub fn bulk_client(
    transport: &Arc<MockTransport>,
    transfer: MockTransfer,
    policy: PollPolicy,
) -> EngageClient<Arc<MockTransport>> {
    ClientBuilder::new(transport.clone())
        .with_credentials(Credentials::new("api-user", "secret"))
        .with_transfer(transfer)
        .with_poll_policy(policy)
        .build()
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().clone()
}
