//! Response interpretation.
//!
//! Every reply is an `<Envelope><Body><RESULT>...</RESULT></Body></Envelope>`
//! document. Success is the text of the first `SUCCESS` element; failures
//! carry a `<Fault><FaultString>` whose text is usually wrapped in CDATA.

use std::borrow::Cow;
use std::fmt;

use bytes::Bytes;
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{EngageError, Result};

const NO_RESPONSE: &str = "no response received";
const NO_FAULT: &str = "request failed without a fault message";

/// A parsed reply. Interpretation happens once, at construction.
#[derive(Clone)]
pub struct Response {
    raw: Bytes,
    success: bool,
    fault: Option<String>,
}

impl Response {
    /// Interpret a raw reply body. Never fails: empty or unparseable input is
    /// simply an unsuccessful response.
    pub fn parse(raw: impl Into<Bytes>) -> Self {
        let raw = raw.into();
        let success = first_element_text(&raw, "SUCCESS")
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"));
        let fault = if success {
            None
        } else {
            first_element_text(&raw, "FaultString")
                .map(|text| strip_cdata(&text))
                .filter(|text| !text.is_empty())
        };
        Self {
            raw,
            success,
            fault,
        }
    }

    /// Whether the server reported `SUCCESS` = true (any casing).
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Human-readable failure reason, or `None` for a successful response.
    pub fn error_message(&self) -> Option<String> {
        if self.success {
            return None;
        }
        if self.raw.iter().all(u8::is_ascii_whitespace) {
            return Some(NO_RESPONSE.to_string());
        }
        Some(self.fault.clone().unwrap_or_else(|| NO_FAULT.to_string()))
    }

    /// Text of the first element named `name`, trimmed, with CDATA unwrapped.
    pub fn field(&self, name: &str) -> Option<String> {
        first_element_text(&self.raw, name).map(|text| strip_cdata(&text))
    }

    /// Like [`field`](Self::field) but missing or empty values are an error.
    pub fn require(&self, name: &'static str) -> Result<String> {
        self.field(name)
            .filter(|value| !value.is_empty())
            .ok_or(EngageError::MalformedResponse { field: name })
    }

    /// The raw reply body.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// The raw reply body as text.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("success", &self.success)
            .field("fault", &self.fault)
            .field("raw_len", &self.raw.len())
            .finish()
    }
}

/// Remove CDATA markers that survived as literal text, then trim.
pub(crate) fn strip_cdata(text: &str) -> String {
    text.replace("<![CDATA[", "")
        .replace("]]>", "")
        .trim()
        .to_string()
}

/// Concatenated text (including CDATA sections) of the first element whose
/// local name is `name`. Returns `None` if the element is absent or the
/// document breaks before it closes.
fn first_element_text(xml: &[u8], name: &str) -> Option<String> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if depth > 0 {
                    depth += 1;
                } else if e.local_name().as_ref() == name.as_bytes() {
                    depth = 1;
                }
            }
            Ok(Event::Empty(e)) if depth == 0 && e.local_name().as_ref() == name.as_bytes() => {
                return Some(String::new());
            }
            Ok(Event::Text(t)) if depth > 0 => match t.unescape() {
                Ok(value) => text.push_str(&value),
                Err(_) => text.push_str(&String::from_utf8_lossy(&t)),
            },
            Ok(Event::CData(c)) if depth > 0 => text.push_str(&String::from_utf8_lossy(&c)),
            Ok(Event::End(_)) if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return Some(text.trim().to_string());
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
        buf.clear();
    }
}
