//! Paragraph view of a document and the batch requests that mutate it.
//!
//! Offsets are in UTF-16 code units, as the Docs API counts them. The body starts at
//! index 1; index 0 belongs to the leading section break.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamedStyle {
    #[serde(rename = "HEADING_1")]
    Heading1,
    #[serde(rename = "HEADING_2")]
    Heading2,
    #[serde(rename = "NORMAL_TEXT")]
    NormalText,
    /// Titles, deeper headings, anything else the document may use.
    #[serde(other, skip_serializing)]
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub start: usize,
    pub end: usize,
    /// Concatenated text runs, trailing newline included.
    pub text: String,
    pub style: NamedStyle,
    /// Link targets carried by any of the paragraph's runs.
    pub links: Vec<String>,
}

impl Paragraph {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Length of `s` in document offsets.
pub fn units(s: &str) -> usize {
    s.encode_utf16().count()
}

// ── Batch requests ──

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    InsertText(InsertText),
    UpdateParagraphStyle(UpdateParagraphStyle),
    UpdateTextStyle(UpdateTextStyle),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsertText {
    pub location: Location,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Location {
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    pub start_index: usize,
    pub end_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateParagraphStyle {
    pub range: Range,
    pub paragraph_style: ParagraphStyle,
    pub fields: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphStyle {
    pub named_style_type: NamedStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTextStyle {
    pub range: Range,
    pub text_style: TextStyle,
    pub fields: &'static str,
}

/// With `link` unset and `fields: "link"`, the update clears any link in the range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Link {
    pub url: String,
}

impl Request {
    pub fn insert_text(index: usize, text: impl Into<String>) -> Self {
        Request::InsertText(InsertText {
            location: Location { index },
            text: text.into(),
        })
    }

    pub fn paragraph_style(start: usize, end: usize, style: NamedStyle) -> Self {
        Request::UpdateParagraphStyle(UpdateParagraphStyle {
            range: Range {
                start_index: start,
                end_index: end,
            },
            paragraph_style: ParagraphStyle {
                named_style_type: style,
            },
            fields: "namedStyleType",
        })
    }

    pub fn link(start: usize, end: usize, url: impl Into<String>) -> Self {
        Self::text_link(start, end, Some(Link { url: url.into() }))
    }

    pub fn unlink(start: usize, end: usize) -> Self {
        Self::text_link(start, end, None)
    }

    fn text_link(start: usize, end: usize, link: Option<Link>) -> Self {
        Request::UpdateTextStyle(UpdateTextStyle {
            range: Range {
                start_index: start,
                end_index: end,
            },
            text_style: TextStyle { link },
            fields: "link",
        })
    }
}
