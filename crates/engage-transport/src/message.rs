//! Request envelope passed to a transport.

use bytes::Bytes;

/// One outbound call: the serialized XML envelope plus the session encoding.
///
/// The encoding is call metadata. It is never spliced into the XML body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// The serialized `<Envelope>` document.
    pub body: Bytes,

    /// Session encoding returned at login, if a session exists.
    pub session_encoding: Option<String>,
}

impl TransportRequest {
    /// Creates a request without session context (used for `Login`).
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            session_encoding: None,
        }
    }

    /// Attaches a session encoding to the request.
    #[must_use]
    pub fn with_session_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.session_encoding = Some(encoding.into());
        self
    }

    /// Returns the size of the body in bytes.
    pub fn size(&self) -> usize {
        self.body.len()
    }

    /// Returns the body as UTF-8 text, replacing invalid sequences.
    pub fn body_text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_without_session() {
        let request = TransportRequest::new("<Envelope/>");
        assert_eq!(request.size(), 11);
        assert!(request.session_encoding.is_none());
        assert_eq!(request.body_text(), "<Envelope/>");
    }

    #[test]
    fn test_request_with_session() {
        let request = TransportRequest::new("<Envelope/>").with_session_encoding(";jsessionid=X");
        assert_eq!(request.session_encoding.as_deref(), Some(";jsessionid=X"));
    }
}
