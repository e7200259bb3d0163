//! Request payload builders.
//!
//! Builders stay at the string level: they know element names and nesting,
//! not the business meaning of lists or recipients. Every text value goes
//! through XML escaping.

mod map_file;
mod raw_export;
mod recipient;

use std::fmt::{self, Display};

use quick_xml::escape::escape;

pub use map_file::{
    ColumnDefinition, ColumnMapping, ColumnType, FileType, ImportAction, ImportInfo, ImportKind,
    map_file, write_map_file,
};
pub use raw_export::{EventType, ExportFormat, RawRecipientDataOptions, raw_recipient_data_export};
pub use recipient::{
    CreatedFrom, TableColumn, add_recipient, create_table, double_opt_in_recipient,
    insert_update_relational_table, join_table, opt_out_recipient, remove_recipient,
    update_recipient,
};

/// One operation element, ready to be wrapped in an envelope.
///
/// ```
/// use engage::RequestBody;
///
/// let body = RequestBody::new("GetJobStatus").field("JOB_ID", 77);
/// assert_eq!(
///     body.to_envelope(),
///     "<Envelope><Body><GetJobStatus><JOB_ID>77</JOB_ID></GetJobStatus></Body></Envelope>"
/// );
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct RequestBody {
    operation: &'static str,
    inner: String,
    redacted: bool,
}

impl RequestBody {
    /// Start an operation element.
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            inner: String::new(),
            redacted: false,
        }
    }

    /// Operation element name.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Append `<tag>value</tag>` with `value` escaped.
    #[must_use]
    pub fn field(mut self, tag: &str, value: impl Display) -> Self {
        push_element(&mut self.inner, tag, &value.to_string());
        self
    }

    /// Append the field only when a value is present.
    #[must_use]
    pub fn optional_field<V: Display>(self, tag: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.field(tag, value),
            None => self,
        }
    }

    /// Append an empty flag element, `<tag/>`.
    #[must_use]
    pub fn flag(mut self, tag: &str) -> Self {
        self.inner.push('<');
        self.inner.push_str(tag);
        self.inner.push_str("/>");
        self
    }

    /// Append a `<COLUMN><NAME>..</NAME><VALUE>..</VALUE></COLUMN>` pair.
    #[must_use]
    pub fn name_value_column(mut self, name: &str, value: &str) -> Self {
        self.inner.push_str("<COLUMN>");
        push_element(&mut self.inner, "NAME", name);
        push_element(&mut self.inner, "VALUE", value);
        self.inner.push_str("</COLUMN>");
        self
    }

    /// Append a pre-built fragment. Callers are responsible for escaping.
    #[must_use]
    pub(crate) fn fragment(mut self, xml: &str) -> Self {
        self.inner.push_str(xml);
        self
    }

    /// Hide the body from `Debug` output (used for credentials).
    #[must_use]
    pub(crate) fn redacted(mut self) -> Self {
        self.redacted = true;
        self
    }

    /// Serialize the full `<Envelope><Body>...</Body></Envelope>` document.
    pub fn to_envelope(&self) -> String {
        format!(
            "<Envelope><Body><{op}>{inner}</{op}></Body></Envelope>",
            op = self.operation,
            inner = self.inner
        )
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("RequestBody");
        debug.field("operation", &self.operation);
        if self.redacted {
            debug.field("inner", &"<redacted>");
        } else {
            debug.field("inner", &self.inner);
        }
        debug.finish()
    }
}

pub(crate) fn push_element(out: &mut String, tag: &str, value: &str) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    out.push_str(&escape(value));
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Whether `name` can be used verbatim as an element name.
pub(crate) fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

/// `<Login>` with the API credentials.
pub fn login(username: &str, password: &str) -> RequestBody {
    RequestBody::new("Login")
        .field("USERNAME", username)
        .field("PASSWORD", password)
        .redacted()
}

/// `<Logout/>`.
pub fn logout() -> RequestBody {
    RequestBody::new("Logout")
}

/// `<GetJobStatus>` for a background job.
pub fn get_job_status(job_id: &str) -> RequestBody {
    RequestBody::new("GetJobStatus").field("JOB_ID", job_id)
}

/// `<GetLists>`. Visibility is 0 (private) or 1 (shared); list type selects
/// databases, queries, contact lists and so on.
pub fn get_lists(visibility: u8, list_type: u8) -> RequestBody {
    RequestBody::new("GetLists")
        .field("VISIBILITY", visibility)
        .field("LIST_TYPE", list_type)
}

/// `<CalculateQuery>`, optionally notifying `email` when done.
pub fn calculate_query(query_id: u64, email: Option<&str>) -> RequestBody {
    RequestBody::new("CalculateQuery")
        .field("QUERY_ID", query_id)
        .optional_field("EMAIL", email)
}

/// `<ExportList>` of every recipient as CSV, limited to `columns`.
pub fn export_list(list_id: u64, columns: &[&str]) -> RequestBody {
    let mut export_columns = String::new();
    for column in columns {
        push_element(&mut export_columns, "COLUMN", column);
    }
    RequestBody::new("ExportList")
        .field("LIST_ID", list_id)
        .field("EXPORT_TYPE", "ALL")
        .field("EXPORT_FORMAT", "CSV")
        .flag("ADD_TO_STORED_FILES")
        .fragment(&format!("<EXPORT_COLUMNS>{export_columns}</EXPORT_COLUMNS>"))
}

/// `<ImportList>` naming files already staged in the `upload` directory.
pub fn import_list(map_file: &str, source_file: &str) -> RequestBody {
    RequestBody::new("ImportList")
        .field("MAP_FILE", map_file)
        .field("SOURCE_FILE", source_file)
}

/// `<ImportTable>` naming files already staged in the `upload` directory.
pub fn import_table(map_file: &str, source_file: &str) -> RequestBody {
    RequestBody::new("ImportTable")
        .field("MAP_FILE", map_file)
        .field("SOURCE_FILE", source_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_are_escaped() {
        let body = RequestBody::new("RemoveRecipient").field("EMAIL", "a&b<c>@example.com");
        assert_eq!(
            body.to_envelope(),
            "<Envelope><Body><RemoveRecipient><EMAIL>a&amp;b&lt;c&gt;@example.com</EMAIL>\
             </RemoveRecipient></Body></Envelope>"
        );
    }

    #[test]
    fn test_login_is_redacted_in_debug() {
        let body = login("api-user", "hunter2");
        assert!(body.to_envelope().contains("<PASSWORD>hunter2</PASSWORD>"));
        assert!(!format!("{body:?}").contains("hunter2"));
    }

    #[test]
    fn test_logout_envelope() {
        assert_eq!(
            logout().to_envelope(),
            "<Envelope><Body><Logout></Logout></Body></Envelope>"
        );
    }

    #[test]
    fn test_export_list() {
        let xml = export_list(123456, &["EMAIL", "FIRST_NAME"]).to_envelope();
        assert!(xml.contains("<LIST_ID>123456</LIST_ID>"));
        assert!(xml.contains("<ADD_TO_STORED_FILES/>"));
        assert!(xml.contains(
            "<EXPORT_COLUMNS><COLUMN>EMAIL</COLUMN><COLUMN>FIRST_NAME</COLUMN></EXPORT_COLUMNS>"
        ));
    }

    #[test]
    fn test_calculate_query_optional_email() {
        let without = calculate_query(9, None).to_envelope();
        assert!(!without.contains("EMAIL"));
        let with = calculate_query(9, Some("ops@example.com")).to_envelope();
        assert!(with.contains("<EMAIL>ops@example.com</EMAIL>"));
    }

    #[test]
    fn test_import_uses_given_names() {
        let xml = import_table("map.xml", "rows.csv").to_envelope();
        assert!(xml.contains("<ImportTable><MAP_FILE>map.xml</MAP_FILE><SOURCE_FILE>rows.csv</SOURCE_FILE></ImportTable>"));
    }

    #[test]
    fn test_element_names() {
        assert!(is_element_name("INCLUDE_SEEDS"));
        assert!(is_element_name("_x.y-z"));
        assert!(!is_element_name(""));
        assert!(!is_element_name("1ABC"));
        assert!(!is_element_name("A B"));
        assert!(!is_element_name("A><B"));
    }
}
