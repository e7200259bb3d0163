//! Recipient and relational table payloads.

use crate::error::{EngageError, Result};
use crate::payload::{RequestBody, map_file::ColumnType, push_element};
use quick_xml::escape::escape;

/// How a recipient entered the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreatedFrom {
    /// Imported from a list
    Imported,
    /// Added manually
    #[default]
    Manual,
    /// Opted in
    OptedIn,
    /// Created from a tracking list
    Tracking,
}

impl CreatedFrom {
    fn code(self) -> u8 {
        match self {
            Self::Imported => 0,
            Self::Manual => 1,
            Self::OptedIn => 2,
            Self::Tracking => 3,
        }
    }
}

fn with_columns(mut body: RequestBody, columns: &[(&str, &str)]) -> RequestBody {
    for (name, value) in columns {
        body = body.name_value_column(name, value);
    }
    body
}

/// `<AddRecipient>`, updating the recipient if it already exists.
pub fn add_recipient(
    list_id: u64,
    email: &str,
    columns: &[(&str, &str)],
    created_from: CreatedFrom,
) -> RequestBody {
    let body = RequestBody::new("AddRecipient")
        .field("LIST_ID", list_id)
        .field("CREATED_FROM", created_from.code())
        .field("UPDATE_IF_FOUND", "true")
        .name_value_column("EMAIL", email);
    with_columns(body, columns)
}

/// `<UpdateRecipient>`. Without `new_email` the address stays the same.
pub fn update_recipient(
    list_id: u64,
    old_email: &str,
    new_email: Option<&str>,
    columns: &[(&str, &str)],
    created_from: CreatedFrom,
) -> RequestBody {
    let body = RequestBody::new("UpdateRecipient")
        .field("LIST_ID", list_id)
        .field("CREATED_FROM", created_from.code())
        .field("OLD_EMAIL", old_email)
        .name_value_column("EMAIL", new_email.unwrap_or(old_email));
    with_columns(body, columns)
}

/// `<RemoveRecipient>`.
pub fn remove_recipient(list_id: u64, email: &str) -> RequestBody {
    RequestBody::new("RemoveRecipient")
        .field("LIST_ID", list_id)
        .field("EMAIL", email)
}

/// `<DoubleOptInRecipient>`.
pub fn double_opt_in_recipient(list_id: u64, email: &str, columns: &[(&str, &str)]) -> RequestBody {
    let body = RequestBody::new("DoubleOptInRecipient")
        .field("LIST_ID", list_id)
        .name_value_column("EMAIL", email);
    with_columns(body, columns)
}

/// `<OptOutRecipient>`.
pub fn opt_out_recipient(list_id: u64, email: &str) -> RequestBody {
    RequestBody::new("OptOutRecipient")
        .field("LIST_ID", list_id)
        .field("EMAIL", email)
}

/// `<InsertUpdateRelationalTable>`; each row is a list of `(column, value)`.
///
/// Values are sent as CDATA. A value containing `]]>` is split across two
/// sections so it cannot terminate the section early.
pub fn insert_update_relational_table(table_id: u64, rows: &[Vec<(&str, &str)>]) -> RequestBody {
    let mut xml = String::from("<ROWS>");
    for row in rows {
        xml.push_str("<ROW>");
        for (name, value) in row {
            xml.push_str("<COLUMN name=\"");
            xml.push_str(&escape(*name));
            xml.push_str("\"><![CDATA[");
            xml.push_str(&value.replace("]]>", "]]]]><![CDATA[>"));
            xml.push_str("]]></COLUMN>");
        }
        xml.push_str("</ROW>");
    }
    xml.push_str("</ROWS>");

    RequestBody::new("InsertUpdateRelationalTable")
        .field("TABLE_ID", table_id)
        .fragment(&xml)
}

/// Column of a relational table created through [`create_table`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    /// Column name
    pub name: String,
    /// Data type
    pub column_type: ColumnType,
    /// Whether a value is mandatory
    pub is_required: bool,
    /// Whether the column is part of the key
    pub key_column: bool,
}

/// `<CreateTable>` with the given columns. At least one column is required.
pub fn create_table(table_name: &str, columns: &[TableColumn]) -> Result<RequestBody> {
    if columns.is_empty() {
        return Err(EngageError::InvalidOption(format!(
            "table '{table_name}' needs at least one column"
        )));
    }

    let mut xml = String::from("<COLUMNS>");
    for column in columns {
        xml.push_str("<COLUMN>");
        push_element(&mut xml, "NAME", &column.name);
        push_element(&mut xml, "TYPE", column.column_type.name());
        if column.is_required {
            push_element(&mut xml, "IS_REQUIRED", "true");
        }
        if column.key_column {
            push_element(&mut xml, "KEY_COLUMN", "true");
        }
        xml.push_str("</COLUMN>");
    }
    xml.push_str("</COLUMNS>");

    Ok(RequestBody::new("CreateTable")
        .field("TABLE_NAME", table_name)
        .fragment(&xml))
}

/// `<JoinTable>` associating a relational table with a list.
/// `mappings` pairs list fields with table fields.
pub fn join_table(list_id: u64, table_id: u64, mappings: &[(&str, &str)]) -> RequestBody {
    let mut xml = String::new();
    for (list_field, table_field) in mappings {
        xml.push_str("<MAP_FIELD>");
        push_element(&mut xml, "LIST_FIELD", list_field);
        push_element(&mut xml, "TABLE_FIELD", table_field);
        xml.push_str("</MAP_FIELD>");
    }
    RequestBody::new("JoinTable")
        .field("TABLE_ID", table_id)
        .field("LIST_ID", list_id)
        .fragment(&xml)
}
