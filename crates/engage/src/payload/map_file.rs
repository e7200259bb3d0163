//! Import map files.
//!
//! A map file tells an import job how to read the source file: target
//! list/table metadata, column definitions and the source-column mapping.

use std::path::Path;

use crate::error::{EngageError, Result};
use crate::payload::push_element;

/// What an import targets. Selects the `LIST_*` or `TABLE_*` element family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// A database or contact list
    List,
    /// A relational table
    Table,
}

impl ImportKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::List => "LIST",
            Self::Table => "TABLE",
        }
    }
}

/// How the import treats existing rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportAction {
    /// Create a new list; stop if it exists
    Create,
    /// Only add new recipients
    AddOnly,
    /// Only update existing recipients
    UpdateOnly,
    /// Add new and update existing recipients
    AddAndUpdate,
    /// Opt out recipients already in the list
    OptOut,
}

impl ImportAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::AddOnly => "ADD_ONLY",
            Self::UpdateOnly => "UPDATE_ONLY",
            Self::AddAndUpdate => "ADD_AND_UPDATE",
            Self::OptOut => "OPT_OUT",
        }
    }
}

/// Source file delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileType {
    /// Comma-separated
    #[default]
    Csv,
    /// Tab-separated
    Tab,
    /// Pipe-separated
    Pipe,
}

impl FileType {
    fn code(self) -> u8 {
        match self {
            Self::Csv => 0,
            Self::Tab => 1,
            Self::Pipe => 2,
        }
    }
}

/// Column data types. Some calls want the numeric code, some the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Free text
    Text,
    /// Yes/No
    YesNo,
    /// Number
    Numeric,
    /// Date
    Date,
    /// Time
    Time,
    /// Country
    Country,
    /// Single selection
    Selection,
    /// Segmenting field
    Segmenting,
    /// System email field; only valid for `EMAIL`
    Email,
}

impl ColumnType {
    /// Numeric code used in map files.
    pub const fn code(self) -> u8 {
        match self {
            Self::Text => 0,
            Self::YesNo => 1,
            Self::Numeric => 2,
            Self::Date => 3,
            Self::Time => 4,
            Self::Country => 5,
            Self::Selection => 6,
            Self::Segmenting => 8,
            Self::Email => 9,
        }
    }

    /// Name used by table definitions.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::YesNo => "YESNO",
            Self::Numeric => "NUMERIC",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Country => "COUNTRY",
            Self::Selection => "SELECTION",
            Self::Segmenting => "SEGMENTING",
            Self::Email => "EMAIL",
        }
    }

    /// Reverse of [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<Self> {
        [
            Self::Text,
            Self::YesNo,
            Self::Numeric,
            Self::Date,
            Self::Time,
            Self::Country,
            Self::Selection,
            Self::Segmenting,
            Self::Email,
        ]
        .into_iter()
        .find(|t| t.name().eq_ignore_ascii_case(name))
    }
}

/// Target metadata for the `<LIST_INFO>` / `<TABLE_INFO>` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportInfo {
    /// Import action
    pub action: ImportAction,
    /// Target name (used when creating)
    pub name: Option<String>,
    /// Target id (used when updating)
    pub id: Option<u64>,
    /// Source file delimiter
    pub file_type: FileType,
    /// Whether the first source line holds headers
    pub has_headers: bool,
    /// 0 = private, 1 = shared
    pub visibility: Option<u8>,
}

impl ImportInfo {
    /// Import into an existing target.
    pub fn existing(action: ImportAction, id: u64) -> Self {
        Self {
            action,
            name: None,
            id: Some(id),
            file_type: FileType::Csv,
            has_headers: true,
            visibility: None,
        }
    }
}

/// One column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    /// Column name; written upper-case
    pub name: String,
    /// Data type
    pub column_type: ColumnType,
    /// Whether a value is mandatory
    pub is_required: bool,
    /// Whether the column is part of the unique key
    pub key_column: bool,
}

/// Maps a 1-based source column to a target column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    /// 1-based position in the source file
    pub index: u32,
    /// Target column name; written upper-case
    pub name: String,
    /// Whether the column is imported
    pub include: bool,
}

/// Serialize a map file document.
///
/// At least one column definition and one mapping are required.
pub fn map_file(
    kind: ImportKind,
    info: &ImportInfo,
    columns: &[ColumnDefinition],
    mappings: &[ColumnMapping],
) -> Result<String> {
    if columns.is_empty() || mappings.is_empty() {
        return Err(EngageError::InvalidOption(
            "map file needs at least one column and one mapping".into(),
        ));
    }
    if let Some(bad) = mappings.iter().find(|m| m.index == 0) {
        return Err(EngageError::InvalidOption(format!(
            "mapping for '{}' has index 0; source columns start at 1",
            bad.name
        )));
    }

    let prefix = kind.prefix();
    let mut xml = format!("<{prefix}_IMPORT><{prefix}_INFO>");
    push_element(&mut xml, "ACTION", info.action.as_str());
    if let Some(name) = &info.name {
        push_element(&mut xml, &format!("{prefix}_NAME"), name);
    }
    if let Some(id) = info.id {
        push_element(&mut xml, &format!("{prefix}_ID"), &id.to_string());
    }
    push_element(&mut xml, "FILE_TYPE", &info.file_type.code().to_string());
    push_element(&mut xml, "HASHEADERS", bool_text(info.has_headers));
    if let Some(visibility) = info.visibility {
        push_element(&mut xml, &format!("{prefix}_VISIBILITY"), &visibility.to_string());
    }
    xml.push_str(&format!("</{prefix}_INFO><COLUMNS>"));

    for column in columns {
        xml.push_str("<COLUMN>");
        push_element(&mut xml, "NAME", &column.name.to_uppercase());
        push_element(&mut xml, "TYPE", &column.column_type.code().to_string());
        push_element(&mut xml, "IS_REQUIRED", bool_text(column.is_required));
        push_element(&mut xml, "KEY_COLUMN", bool_text(column.key_column));
        xml.push_str("</COLUMN>");
    }
    xml.push_str("</COLUMNS><MAPPING>");

    for mapping in mappings {
        xml.push_str("<COLUMN>");
        push_element(&mut xml, "INDEX", &mapping.index.to_string());
        push_element(&mut xml, "NAME", &mapping.name.to_uppercase());
        push_element(&mut xml, "INCLUDE", bool_text(mapping.include));
        xml.push_str("</COLUMN>");
    }
    xml.push_str(&format!("</MAPPING></{prefix}_IMPORT>"));
    Ok(xml)
}

/// Serialize a map file and write it to `path`, replacing any existing file.
pub async fn write_map_file(
    path: &Path,
    kind: ImportKind,
    info: &ImportInfo,
    columns: &[ColumnDefinition],
    mappings: &[ColumnMapping],
) -> Result<()> {
    let mut contents = map_file(kind, info, columns, mappings)?;
    contents.push('\n');
    tokio::fs::write(path, contents).await?;
    Ok(())
}

fn bool_text(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
