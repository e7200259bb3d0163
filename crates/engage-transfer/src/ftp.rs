//! Passive-mode FTP transfer service.
//!
//! Only the subset of RFC 959 the transfer host needs: `USER`/`PASS`, `CWD`,
//! `TYPE A|I`, `PASV`, `STOR`, `RETR` and `QUIT`. Active mode is not
//! supported; the host misbehaves without passive data connections.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{TransferError, TransferResult};
use crate::traits::{BulkTransferService, RemoteDirectory, TransferMode, TransferSession};

/// Default FTP control port.
pub const DEFAULT_FTP_PORT: u16 = 21;

/// Connection settings for the transfer host.
#[derive(Clone)]
pub struct FtpConfig {
    /// Host name or IP address
    pub host: String,
    /// Control port (default 21)
    pub port: Option<u16>,
    /// Login name
    pub username: String,
    /// Password
    pub password: String,
    /// Timeout for establishing control and data connections
    pub connect_timeout: Duration,
    /// Timeout for a single server reply or data read
    pub io_timeout: Duration,
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_io_timeout() -> Duration {
    Duration::from_secs(300)
}

impl fmt::Debug for FtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("connect_timeout", &self.connect_timeout)
            .field("io_timeout", &self.io_timeout)
            .finish()
    }
}

impl FtpConfig {
    /// Create a configuration with the default port and timeouts.
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: None,
            username: username.into(),
            password: password.into(),
            connect_timeout: default_connect_timeout(),
            io_timeout: default_io_timeout(),
        }
    }

    /// Override the control port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Effective control port.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_FTP_PORT)
    }
}

/// [`BulkTransferService`] speaking passive-mode FTP.
#[derive(Debug, Clone)]
pub struct FtpTransferService {
    config: FtpConfig,
}

impl FtpTransferService {
    /// Create a new service. No connection is made until a session is opened.
    pub fn new(config: FtpConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BulkTransferService for FtpTransferService {
    async fn open(&self, directory: RemoteDirectory) -> TransferResult<Box<dyn TransferSession>> {
        let address = (self.config.host.as_str(), self.config.port());
        let stream = timeout(self.config.connect_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| TransferError::Connection(format!("timed out connecting to {}", self.config.host)))?
            .map_err(|e| TransferError::Connection(format!("{}: {e}", self.config.host)))?;

        let peer = stream.peer_addr()?.ip();
        let mut session = FtpSession {
            control: BufReader::new(stream),
            peer,
            config: self.config.clone(),
        };

        if let Err(e) = session.prepare(directory).await {
            session.quit_quietly().await;
            return Err(e);
        }

        info!(host = %self.config.host, directory = %directory, "transfer session opened");
        Ok(Box::new(session))
    }
}

/// A parsed control-channel reply.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Reply {
    code: u16,
    text: String,
}

impl Reply {
    fn is_preliminary(&self) -> bool {
        (100..200).contains(&self.code)
    }

    fn is_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.text)
    }
}

/// Parse the three-digit code at the start of a reply line.
///
/// Returns the code and whether the line opens a multi-line reply (`123-`).
fn parse_reply_line(line: &str) -> Option<(u16, bool)> {
    let code = line.get(..3)?.parse::<u16>().ok()?;
    let multiline = line.as_bytes().get(3) == Some(&b'-');
    Some((code, multiline))
}

/// Extract the data port from a `227 Entering Passive Mode (h1,h2,h3,h4,p1,p2)` reply.
fn parse_pasv_port(text: &str) -> Option<u16> {
    let start = text.find('(')?;
    let end = text[start..].find(')')? + start;
    let fields = text[start + 1..end]
        .split(',')
        .map(|part| part.trim().parse::<u8>())
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    if fields.len() != 6 {
        return None;
    }
    Some(u16::from(fields[4]) * 256 + u16::from(fields[5]))
}

/// Size of one read from disk or from the data connection.
const CHUNK_SIZE: usize = 64 * 1024;

/// Convert bare `\n` into `\r\n` for ASCII-mode uploads.
///
/// `previous_cr` remembers whether the last byte of the previous chunk was
/// `\r`, so a `\r\n` split across chunks is not doubled.
fn to_network_text(chunk: &[u8], previous_cr: &mut bool, out: &mut Vec<u8>) {
    for &byte in chunk {
        if byte == b'\n' && !*previous_cr {
            out.push(b'\r');
        }
        out.push(byte);
        *previous_cr = byte == b'\r';
    }
}

/// Sibling of `local` that receives a download until it is complete.
fn partial_path(local: &Path) -> TransferResult<PathBuf> {
    let name = local.file_name().ok_or_else(|| TransferError::InvalidPath {
        path: local.to_path_buf(),
        reason: "destination has no file name".to_string(),
    })?;
    let mut partial = name.to_os_string();
    partial.push(".part");
    Ok(local.with_file_name(partial))
}

/// Drop `\r` that precede `\n` for ASCII-mode downloads.
///
/// `pending_cr` carries a trailing `\r` across chunk boundaries.
fn from_network_text(chunk: &[u8], pending_cr: &mut bool, out: &mut Vec<u8>) {
    for &byte in chunk {
        if *pending_cr {
            *pending_cr = false;
            if byte != b'\n' {
                out.push(b'\r');
            }
        }
        if byte == b'\r' {
            *pending_cr = true;
        } else {
            out.push(byte);
        }
    }
}

struct FtpSession {
    control: BufReader<TcpStream>,
    peer: IpAddr,
    config: FtpConfig,
}

impl fmt::Debug for FtpSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtpSession")
            .field("peer", &self.peer)
            .finish()
    }
}

impl FtpSession {
    /// Greeting, login and change into `directory`.
    async fn prepare(&mut self, directory: RemoteDirectory) -> TransferResult<()> {
        let greeting = self.read_reply().await?;
        if greeting.code != 220 {
            return Err(TransferError::Connection(format!(
                "unexpected greeting: {greeting}"
            )));
        }

        self.login().await?;

        let reply = self.command(&format!("CWD {}", directory.as_str())).await?;
        if !reply.is_completion() {
            return Err(TransferError::Directory {
                directory: directory.to_string(),
                reason: reply.to_string(),
            });
        }
        Ok(())
    }

    async fn read_reply(&mut self) -> TransferResult<Reply> {
        timeout(self.config.io_timeout, self.read_reply_inner())
            .await
            .map_err(|_| TransferError::Timeout("waiting for server reply".to_string()))?
    }

    async fn read_reply_inner(&mut self) -> TransferResult<Reply> {
        let mut line = String::new();
        if self.control.read_line(&mut line).await? == 0 {
            return Err(TransferError::Connection(
                "control connection closed by server".to_string(),
            ));
        }
        let first = line.trim_end().to_string();
        let (code, multiline) = parse_reply_line(&first)
            .ok_or_else(|| TransferError::Protocol(format!("malformed reply: {first}")))?;

        let mut text = first.get(4..).unwrap_or_default().to_string();
        if multiline {
            let terminator = format!("{code} ");
            loop {
                line.clear();
                if self.control.read_line(&mut line).await? == 0 {
                    return Err(TransferError::Protocol(
                        "connection closed inside multi-line reply".to_string(),
                    ));
                }
                let current = line.trim_end();
                if current.starts_with(&terminator) || current == code.to_string() {
                    break;
                }
                text.push('\n');
                text.push_str(current);
            }
        }

        debug!(code, "ftp reply");
        Ok(Reply { code, text })
    }

    async fn command(&mut self, command: &str) -> TransferResult<Reply> {
        // Never log the password
        let verb = command.split(' ').next().unwrap_or_default();
        debug!(verb, "ftp command");

        let control = self.control.get_mut();
        control.write_all(command.as_bytes()).await?;
        control.write_all(b"\r\n").await?;
        control.flush().await?;
        self.read_reply().await
    }

    async fn login(&mut self) -> TransferResult<()> {
        let reply = self
            .command(&format!("USER {}", self.config.username))
            .await?;
        let reply = match reply.code {
            230 => return Ok(()),
            331 | 332 => {
                let password = self.config.password.clone();
                self.command(&format!("PASS {password}")).await?
            }
            _ => return Err(TransferError::Authentication(reply.to_string())),
        };
        match reply.code {
            230 | 202 => Ok(()),
            _ => Err(TransferError::Authentication(reply.to_string())),
        }
    }

    async fn set_mode(&mut self, mode: TransferMode) -> TransferResult<()> {
        let command = match mode {
            TransferMode::Text => "TYPE A",
            TransferMode::Binary => "TYPE I",
        };
        let reply = self.command(command).await?;
        if !reply.is_completion() {
            return Err(TransferError::Protocol(format!("{command} rejected: {reply}")));
        }
        Ok(())
    }

    /// Enter passive mode and open the data connection.
    ///
    /// The data connection goes to the control peer's address; the address
    /// advertised in the 227 reply is often a private one behind NAT.
    async fn open_data(&mut self) -> TransferResult<TcpStream> {
        let reply = self.command("PASV").await?;
        if reply.code != 227 {
            return Err(TransferError::Protocol(format!("PASV rejected: {reply}")));
        }
        let port = parse_pasv_port(&reply.text)
            .ok_or_else(|| TransferError::Protocol(format!("malformed PASV reply: {reply}")))?;

        let address = SocketAddr::new(self.peer, port);
        timeout(self.config.connect_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| TransferError::Timeout("opening data connection".to_string()))?
            .map_err(|e| TransferError::Connection(format!("data connection to {address}: {e}")))
    }

    /// Send a transfer command and require a 1xx "opening data connection" reply.
    async fn start_transfer(&mut self, command: &str, file: &str) -> TransferResult<()> {
        let reply = self.command(command).await?;
        if !reply.is_preliminary() {
            return Err(TransferError::Transfer {
                file: file.to_string(),
                reason: reply.to_string(),
            });
        }
        Ok(())
    }

    /// Read the final 2xx reply after the data connection was closed.
    async fn finish_transfer(&mut self, file: &str) -> TransferResult<()> {
        let reply = self.read_reply().await?;
        if !reply.is_completion() {
            return Err(TransferError::Transfer {
                file: file.to_string(),
                reason: reply.to_string(),
            });
        }
        Ok(())
    }

    async fn quit_quietly(&mut self) {
        let _ = self.command("QUIT").await;
        let _ = self.control.get_mut().shutdown().await;
    }

    /// Stream `local` over `data`, converting line endings in text mode.
    /// Returns the number of bytes read from disk.
    async fn send_file(
        &self,
        local: &mut File,
        data: &mut TcpStream,
        remote_name: &str,
        mode: TransferMode,
    ) -> TransferResult<u64> {
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut converted = Vec::with_capacity(CHUNK_SIZE + CHUNK_SIZE / 32);
        let mut previous_cr = false;
        let mut size = 0u64;

        loop {
            let read = local.read(&mut buffer).await?;
            if read == 0 {
                break;
            }
            size += read as u64;
            let chunk = match mode {
                TransferMode::Binary => &buffer[..read],
                TransferMode::Text => {
                    converted.clear();
                    to_network_text(&buffer[..read], &mut previous_cr, &mut converted);
                    &converted[..]
                }
            };
            timeout(self.config.io_timeout, data.write_all(chunk))
                .await
                .map_err(|_| TransferError::Timeout(format!("uploading {remote_name}")))??;
        }
        timeout(self.config.io_timeout, data.shutdown())
            .await
            .map_err(|_| TransferError::Timeout(format!("uploading {remote_name}")))??;
        Ok(size)
    }

    /// RETR `remote_name` into `target` and wait for the final reply.
    async fn receive(
        &mut self,
        remote_name: &str,
        target: &Path,
        mode: TransferMode,
    ) -> TransferResult<u64> {
        self.set_mode(mode).await?;
        let mut data = self.open_data().await?;
        self.start_transfer(&format!("RETR {remote_name}"), remote_name)
            .await?;

        let mut file = File::create(target).await?;
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut converted = Vec::new();
        let mut pending_cr = false;
        let mut written = 0u64;

        loop {
            let read = timeout(self.config.io_timeout, data.read(&mut buffer))
                .await
                .map_err(|_| TransferError::Timeout(format!("downloading {remote_name}")))??;
            if read == 0 {
                break;
            }
            let chunk = match mode {
                TransferMode::Binary => &buffer[..read],
                TransferMode::Text => {
                    converted.clear();
                    from_network_text(&buffer[..read], &mut pending_cr, &mut converted);
                    &converted[..]
                }
            };
            file.write_all(chunk).await?;
            written += chunk.len() as u64;
        }
        if pending_cr {
            file.write_all(b"\r").await?;
            written += 1;
        }
        file.flush().await?;
        drop(file);
        drop(data);

        self.finish_transfer(remote_name).await?;
        Ok(written)
    }
}

#[async_trait]
impl TransferSession for FtpSession {
    async fn put(
        &mut self,
        local: &Path,
        remote_name: &str,
        mode: TransferMode,
    ) -> TransferResult<u64> {
        let mut file = File::open(local).await?;

        self.set_mode(mode).await?;
        let mut data = self.open_data().await?;
        self.start_transfer(&format!("STOR {remote_name}"), remote_name)
            .await?;

        let size = self.send_file(&mut file, &mut data, remote_name, mode).await?;
        drop(data);

        self.finish_transfer(remote_name).await?;
        debug!(file = %remote_name, bytes = size, "stored");
        Ok(size)
    }

    async fn get(
        &mut self,
        remote_name: &str,
        local: &Path,
        mode: TransferMode,
    ) -> TransferResult<u64> {
        // The destination is only replaced once the server confirms the transfer
        let partial = partial_path(local)?;
        let written = match self.receive(remote_name, &partial, mode).await {
            Ok(written) => written,
            Err(e) => {
                discard_partial(&partial).await;
                return Err(e);
            }
        };
        if let Err(e) = tokio::fs::rename(&partial, local).await {
            discard_partial(&partial).await;
            return Err(e.into());
        }

        debug!(file = %remote_name, bytes = written, "retrieved");
        Ok(written)
    }

    async fn close(mut self: Box<Self>) -> TransferResult<()> {
        let reply = self.command("QUIT").await;
        let _ = self.control.get_mut().shutdown().await;
        reply.map(|_| ())
    }
}

async fn discard_partial(partial: &Path) {
    match tokio::fs::remove_file(partial).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %partial.display(), error = %e, "failed to remove partial download"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reply_line() {
        assert_eq!(parse_reply_line("220 Service ready"), Some((220, false)));
        assert_eq!(parse_reply_line("230-Welcome"), Some((230, true)));
        assert_eq!(parse_reply_line("2x0 nope"), None);
        assert_eq!(parse_reply_line("22"), None);
    }

    #[test]
    fn test_parse_pasv_port() {
        let text = "Entering Passive Mode (192,168,1,10,195,80).";
        assert_eq!(parse_pasv_port(text), Some(195 * 256 + 80));
        assert_eq!(parse_pasv_port("Entering Passive Mode"), None);
        assert_eq!(parse_pasv_port("(1,2,3)"), None);
        assert_eq!(parse_pasv_port("(1,2,3,4,300,1)"), None);
    }

    fn network_text(chunks: &[&[u8]]) -> Vec<u8> {
        let mut previous_cr = false;
        let mut out = Vec::new();
        for chunk in chunks {
            to_network_text(chunk, &mut previous_cr, &mut out);
        }
        out
    }

    #[test]
    fn test_to_network_text() {
        assert_eq!(network_text(&[b"a\nb\r\nc"]), b"a\r\nb\r\nc".to_vec());
    }

    #[test]
    fn test_to_network_text_across_chunks() {
        // Bare newline opening the next chunk
        assert_eq!(network_text(&[b"a", b"\nb"]), b"a\r\nb".to_vec());
        // CRLF split over two chunks is kept as is
        assert_eq!(network_text(&[b"a\r", b"\nb"]), b"a\r\nb".to_vec());
        assert_eq!(network_text(&[b"a\n", b"\n"]), b"a\r\n\r\n".to_vec());
    }

    #[test]
    fn test_partial_path_is_sibling() {
        let partial = partial_path(Path::new("/tmp/out/export.csv")).unwrap();
        assert_eq!(partial, PathBuf::from("/tmp/out/export.csv.part"));
        assert!(partial_path(Path::new("/")).is_err());
    }

    #[test]
    fn test_from_network_text_across_chunks() {
        let mut pending = false;
        let mut out = Vec::new();
        from_network_text(b"a\r", &mut pending, &mut out);
        from_network_text(b"\nb\rc", &mut pending, &mut out);
        assert!(!pending);
        assert_eq!(out, b"a\nb\rc".to_vec());
    }

    #[test]
    fn test_config_debug_redacts_password() {
        let config = FtpConfig::new("ftp.example.com", "user", "hunter2");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert_eq!(config.port(), DEFAULT_FTP_PORT);
        assert_eq!(config.with_port(2121).port(), 2121);
    }
}
