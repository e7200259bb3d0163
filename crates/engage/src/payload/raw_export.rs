//! `RawRecipientDataExport` options.

use std::collections::BTreeSet;

use crate::error::{EngageError, Result};
use crate::payload::{RequestBody, is_element_name, push_element};

/// Names that cannot be supplied through [`RawRecipientDataOptions::extra`]:
/// the column list is built separately and `FIELDS` is reserved.
const RESERVED: &[&str] = &["COLUMNS", "FIELDS"];

/// Names covered by typed setters.
const TYPED: &[&str] = &[
    "MAILING_ID",
    "REPORT_ID",
    "CAMPAIGN_ID",
    "LIST_ID",
    "EVENT_DATE_START",
    "EVENT_DATE_END",
    "SEND_DATE_START",
    "SEND_DATE_END",
    "EXPORT_FORMAT",
    "EMAIL",
    "MOVE_TO_FTP",
    "INCLUDE_CHILDREN",
    "EXCLUDE_DELETED",
];

/// Output format of a raw export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated
    Csv,
    /// Tab-separated
    Tab,
    /// Pipe-separated
    Pipe,
}

impl ExportFormat {
    fn code(self) -> u8 {
        match self {
            Self::Csv => 0,
            Self::Tab => 1,
            Self::Pipe => 2,
        }
    }
}

/// Event filters, emitted as empty flag elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum EventType {
    AllEventTypes,
    Sent,
    Suppressed,
    Opens,
    Clicks,
    Optins,
    Optouts,
    Forwards,
    Attachments,
    Conversions,
    Clickstreams,
    HardBounces,
    SoftBounces,
    ReplyAbuse,
    ReplyCoa,
    ReplyOther,
    MailBlocks,
    MailingRestrictions,
}

impl EventType {
    /// Every filter, in element order.
    pub const ALL: [Self; 18] = [
        Self::AllEventTypes,
        Self::Sent,
        Self::Suppressed,
        Self::Opens,
        Self::Clicks,
        Self::Optins,
        Self::Optouts,
        Self::Forwards,
        Self::Attachments,
        Self::Conversions,
        Self::Clickstreams,
        Self::HardBounces,
        Self::SoftBounces,
        Self::ReplyAbuse,
        Self::ReplyCoa,
        Self::ReplyOther,
        Self::MailBlocks,
        Self::MailingRestrictions,
    ];

    /// Element name for the flag.
    pub const fn element(self) -> &'static str {
        match self {
            Self::AllEventTypes => "ALL_EVENT_TYPES",
            Self::Sent => "SENT",
            Self::Suppressed => "SUPPRESSED",
            Self::Opens => "OPENS",
            Self::Clicks => "CLICKS",
            Self::Optins => "OPTINS",
            Self::Optouts => "OPTOUTS",
            Self::Forwards => "FORWARDS",
            Self::Attachments => "ATTACHMENTS",
            Self::Conversions => "CONVERSIONS",
            Self::Clickstreams => "CLICKSTREAMS",
            Self::HardBounces => "HARD_BOUNCES",
            Self::SoftBounces => "SOFT_BOUNCES",
            Self::ReplyAbuse => "REPLY_ABUSE",
            Self::ReplyCoa => "REPLY_COA",
            Self::ReplyOther => "REPLY_OTHER",
            Self::MailBlocks => "MAIL_BLOCKS",
            Self::MailingRestrictions => "MAILING_RESTRICTIONS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ExtraValue {
    Flag,
    Text(String),
}

/// Filters and columns for a raw recipient data export.
///
/// Known options have typed setters. Anything else the endpoint accepts goes
/// through [`extra`](Self::extra) / [`extra_flag`](Self::extra_flag), which
/// refuse reserved names, names that have a typed setter, and names that are
/// not valid element names.
///
/// ```
/// use engage::payload::{EventType, RawRecipientDataOptions};
///
/// let options = RawRecipientDataOptions::new()
///     .mailing_id(42)
///     .event_type(EventType::Opens)
///     .column("CustomerId")
///     .extra_flag("INCLUDE_SEEDS")?;
/// # Ok::<(), engage::EngageError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecipientDataOptions {
    mailing_id: Option<u64>,
    report_id: Option<u64>,
    campaign_id: Option<u64>,
    list_id: Option<u64>,
    event_date_range: Option<(String, String)>,
    send_date_range: Option<(String, String)>,
    export_format: Option<ExportFormat>,
    email: Option<String>,
    move_to_ftp: bool,
    include_children: bool,
    exclude_deleted: bool,
    event_types: BTreeSet<EventType>,
    columns: Vec<String>,
    extras: Vec<(String, ExtraValue)>,
}

impl RawRecipientDataOptions {
    /// Empty option set: no filters, no columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one mailing.
    #[must_use]
    pub fn mailing_id(mut self, id: u64) -> Self {
        self.mailing_id = Some(id);
        self
    }

    /// Restrict to one mailing report.
    #[must_use]
    pub fn report_id(mut self, id: u64) -> Self {
        self.report_id = Some(id);
        self
    }

    /// Restrict to one campaign.
    #[must_use]
    pub fn campaign_id(mut self, id: u64) -> Self {
        self.campaign_id = Some(id);
        self
    }

    /// Restrict to mailings sent to one list.
    #[must_use]
    pub fn list_id(mut self, id: u64) -> Self {
        self.list_id = Some(id);
        self
    }

    /// Event window, `MM/DD/YYYY HH:MM:SS` on both ends.
    #[must_use]
    pub fn event_date_range(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.event_date_range = Some((start.into(), end.into()));
        self
    }

    /// Send window, `MM/DD/YYYY HH:MM:SS` on both ends.
    #[must_use]
    pub fn send_date_range(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.send_date_range = Some((start.into(), end.into()));
        self
    }

    /// Output format; the server default is CSV.
    #[must_use]
    pub fn export_format(mut self, format: ExportFormat) -> Self {
        self.export_format = Some(format);
        self
    }

    /// Address notified when the export is ready.
    #[must_use]
    pub fn notify_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Place the file in the transfer `download` directory.
    #[must_use]
    pub fn move_to_ftp(mut self) -> Self {
        self.move_to_ftp = true;
        self
    }

    /// Include child mailings of the selected mailing.
    #[must_use]
    pub fn include_children(mut self) -> Self {
        self.include_children = true;
        self
    }

    /// Skip recipients deleted since the event.
    #[must_use]
    pub fn exclude_deleted(mut self) -> Self {
        self.exclude_deleted = true;
        self
    }

    /// Add an event filter. Adding the same filter twice has no effect.
    #[must_use]
    pub fn event_type(mut self, event: EventType) -> Self {
        self.event_types.insert(event);
        self
    }

    /// Add a database column to the export.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>) -> Self {
        self.columns.push(name.into());
        self
    }

    /// Add an option without a typed setter, as `<NAME>value</NAME>`.
    pub fn extra(mut self, name: &str, value: impl Into<String>) -> Result<Self> {
        let name = self.check_extra(name)?;
        self.extras.push((name, ExtraValue::Text(value.into())));
        Ok(self)
    }

    /// Add an option without a typed setter, as `<NAME/>`.
    pub fn extra_flag(mut self, name: &str) -> Result<Self> {
        let name = self.check_extra(name)?;
        self.extras.push((name, ExtraValue::Flag));
        Ok(self)
    }

    fn check_extra(&self, name: &str) -> Result<String> {
        let upper = name.to_ascii_uppercase();
        let rejection = if RESERVED.contains(&upper.as_str()) {
            Some("is reserved")
        } else if TYPED.contains(&upper.as_str())
            || EventType::ALL.iter().any(|e| e.element() == upper)
        {
            Some("has a typed setter")
        } else if !is_element_name(&upper) {
            Some("is not a valid element name")
        } else if self.extras.iter().any(|(existing, _)| *existing == upper) {
            Some("was already given")
        } else {
            None
        };

        match rejection {
            Some(reason) => Err(EngageError::InvalidOption(format!(
                "'{name}' {reason} in RawRecipientDataOptions"
            ))),
            None => Ok(upper),
        }
    }

    /// Columns requested so far.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// `<RawRecipientDataExport>` built from `options`.
pub fn raw_recipient_data_export(options: &RawRecipientDataOptions) -> RequestBody {
    let mut body = RequestBody::new("RawRecipientDataExport")
        .optional_field("MAILING_ID", options.mailing_id)
        .optional_field("REPORT_ID", options.report_id)
        .optional_field("CAMPAIGN_ID", options.campaign_id)
        .optional_field("LIST_ID", options.list_id);

    if let Some((start, end)) = &options.event_date_range {
        body = body.field("EVENT_DATE_START", start).field("EVENT_DATE_END", end);
    }
    if let Some((start, end)) = &options.send_date_range {
        body = body.field("SEND_DATE_START", start).field("SEND_DATE_END", end);
    }
    body = body
        .optional_field("EXPORT_FORMAT", options.export_format.map(ExportFormat::code))
        .optional_field("EMAIL", options.email.as_deref());

    for (enabled, tag) in [
        (options.move_to_ftp, "MOVE_TO_FTP"),
        (options.include_children, "INCLUDE_CHILDREN"),
        (options.exclude_deleted, "EXCLUDE_DELETED"),
    ] {
        if enabled {
            body = body.flag(tag);
        }
    }
    for event in &options.event_types {
        body = body.flag(event.element());
    }
    for (name, value) in &options.extras {
        body = match value {
            ExtraValue::Flag => body.flag(name),
            ExtraValue::Text(text) => body.field(name, text),
        };
    }

    if !options.columns.is_empty() {
        let mut columns = String::from("<COLUMNS>");
        for column in &options.columns {
            columns.push_str("<COLUMN>");
            push_element(&mut columns, "NAME", column);
            columns.push_str("</COLUMN>");
        }
        columns.push_str("</COLUMNS>");
        body = body.fragment(&columns);
    }
    body
}
