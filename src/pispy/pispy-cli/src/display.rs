//! Display rows and the per-field classifier that produces them.

use serde::Serialize;
use std::borrow::Cow;
use url::Url;

/// The media type under which descriptions are rendered as markdown.
pub const MARKDOWN_CONTENT_TYPE: &str = "text/markdown";

/// Shown in rows that are always present when their field is empty.
pub const EMPTY_PLACEHOLDER: &str = "None";

// ============================================================================
// Display model
// ============================================================================

/// How a row's value should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowKind {
    PlainText,
    /// An absolute URL the user can open.
    Link,
    /// Rich text (markdown).
    LongText,
}

/// One labelled value in a [`DisplaySection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRow {
    pub label: String,
    pub value: String,
    pub kind: RowKind,
    /// Package names this row cross-references. Activating one of them
    /// starts a lookup of that package.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

impl DisplayRow {
    pub fn new(label: impl Into<String>, value: impl Into<String>, kind: RowKind) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            kind,
            references: Vec::new(),
        }
    }

    pub fn with_references(mut self, references: Vec<String>) -> Self {
        self.references = references;
        self
    }
}

/// A titled group of rows: the package details, its description, or one
/// distribution file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplaySection {
    pub title: String,
    pub rows: Vec<DisplayRow>,
}

impl DisplaySection {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            rows: Vec::new(),
        }
    }

    /// Append the row if the classifier produced one.
    pub fn push(&mut self, row: Option<DisplayRow>) {
        self.rows.extend(row);
    }
}

// ============================================================================
// Field classifier
// ============================================================================

/// A field value as seen by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<'a> {
    Absent,
    Text(Cow<'a, str>),
    Count(i64),
    Flag(bool),
}

impl<'a> Field<'a> {
    /// Join a list of strings; an empty list becomes an empty (suppressed) text.
    pub fn joined(items: &[String], separator: &str) -> Field<'a> {
        Field::Text(Cow::Owned(items.join(separator)))
    }
}

impl<'a> From<&'a str> for Field<'a> {
    fn from(value: &'a str) -> Self {
        Field::Text(Cow::Borrowed(value))
    }
}

impl From<String> for Field<'_> {
    fn from(value: String) -> Self {
        Field::Text(Cow::Owned(value))
    }
}

impl<'a, T: Into<Field<'a>>> From<Option<T>> for Field<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Field::Absent, Into::into)
    }
}

impl From<i64> for Field<'_> {
    fn from(value: i64) -> Self {
        Field::Count(value)
    }
}

impl From<bool> for Field<'_> {
    fn from(value: bool) -> Self {
        Field::Flag(value)
    }
}

/// How the caller would like a text field shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    Plain,
    /// A link, if the value turns out to be a URL.
    Link,
    /// Free-text description with the package's declared content type.
    Description { markdown: bool },
}

/// Decide whether and how to show a field.
///
/// Returns `None` for absent values and for text that is empty after
/// trimming. Counts are grouped by thousands and flags render as `Yes`/`No`;
/// both always produce a row.
pub fn classify(label: &str, value: Field<'_>, presentation: Presentation) -> Option<DisplayRow> {
    match value {
        Field::Absent => None,
        Field::Text(text) if text.trim().is_empty() => None,
        Field::Text(text) => {
            let kind = match presentation {
                Presentation::Plain => RowKind::PlainText,
                Presentation::Link if is_url_like(&text) => RowKind::Link,
                Presentation::Link => RowKind::PlainText,
                Presentation::Description { markdown: true } => RowKind::LongText,
                Presentation::Description { markdown: false } => RowKind::PlainText,
            };
            Some(DisplayRow::new(label, text.into_owned(), kind))
        }
        Field::Count(n) => Some(DisplayRow::new(label, group_thousands(n), RowKind::PlainText)),
        Field::Flag(flag) => Some(DisplayRow::new(label, yes_no(flag), RowKind::PlainText)),
    }
}

/// Shorthand for a plain-text row.
pub fn plain<'a>(label: &str, value: impl Into<Field<'a>>) -> Option<DisplayRow> {
    classify(label, value.into(), Presentation::Plain)
}

/// Shorthand for a row that should be a link when the value is a URL.
pub fn link<'a>(label: &str, value: impl Into<Field<'a>>) -> Option<DisplayRow> {
    classify(label, value.into(), Presentation::Link)
}

/// Like [`classify`], but always yields a row: an empty field is shown as
/// [`EMPTY_PLACEHOLDER`] in plain text.
pub fn fixed<'a>(label: &str, value: impl Into<Field<'a>>, presentation: Presentation) -> DisplayRow {
    classify(label, value.into(), presentation)
        .unwrap_or_else(|| DisplayRow::new(label, EMPTY_PLACEHOLDER, RowKind::PlainText))
}

/// True when the value parses as an absolute URL (one with a scheme).
pub fn is_url_like(value: &str) -> bool {
    Url::parse(value.trim()).is_ok()
}

/// Whether a `description_content_type` denotes markdown. Parameters such as
/// `; charset=UTF-8` are ignored.
pub fn is_markdown(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case(MARKDOWN_CONTENT_TYPE))
}

/// `1234567` -> `"1,234,567"`.
pub fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        grouped.push('-');
    }
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}
