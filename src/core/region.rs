//! Marker-delimited generated regions.
//!
//! A region is a view over host-file text:
//!
//! ```text
//! <anything>
//! # GENERATED:BEGIN:<marker>
//! <body>
//!     # GENERATED:END:<marker>
//! <anything>
//! ```
//!
//! The host file's own grammar is never parsed. Only the delimiter pair is
//! located, and only the text strictly between the delimiters is replaced.
//! Horizontal indentation in front of the end delimiter belongs to the
//! delimiter line and survives a splice.
//!
//! Splicing is idempotent: `splice(splice(t, b), b) == splice(t, b)`.

use crate::core::error::RolewireError;
use std::ops::Range;

pub const BEGIN_TOKEN: &str = "# GENERATED:BEGIN";
pub const END_TOKEN: &str = "# GENERATED:END";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub marker: String,
}

/// Byte offsets of a located region inside its host text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionSpan {
    /// Replaceable text, from just after the begin delimiter to the start of
    /// the end delimiter's indentation.
    pub body: Range<usize>,
    /// Indentation preceding the end delimiter on its own line.
    pub end_indent: Range<usize>,
}

impl Region {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn begin_delimiter(&self) -> String {
        format!("{}:{}", BEGIN_TOKEN, self.marker)
    }

    pub fn end_delimiter(&self) -> String {
        format!("{}:{}", END_TOKEN, self.marker)
    }

    /// Find the unique begin/end pair for this marker.
    pub fn locate(&self, text: &str) -> Result<RegionSpan, RolewireError> {
        let begin = self.begin_delimiter();
        let end = self.end_delimiter();
        let begins = delimiter_offsets(text, &begin);
        let ends = delimiter_offsets(text, &end);

        if begins.len() > 1 || ends.len() > 1 {
            return Err(RolewireError::DuplicateMarker(format!(
                "{} ({}x) ... {} ({}x)",
                begin,
                begins.len(),
                end,
                ends.len()
            )));
        }

        let (begin_at, end_at) = match (begins.first(), ends.first()) {
            (Some(b), Some(e)) => (*b, *e),
            (None, None) => {
                return Err(RolewireError::MarkerNotFound(format!("{} ... {}", begin, end)));
            }
            (Some(_), None) => {
                return Err(RolewireError::MarkerNotFound(format!(
                    "{} present but {} missing",
                    begin, end
                )));
            }
            (None, Some(_)) => {
                return Err(RolewireError::MarkerNotFound(format!(
                    "{} present but {} missing",
                    end, begin
                )));
            }
        };

        let body_start = begin_at + begin.len();
        if end_at < body_start {
            return Err(RolewireError::MarkerNotFound(format!("{} appears before {}", end, begin)));
        }

        let indent_start = text[body_start..end_at]
            .rfind(|c: char| c != ' ' && c != '\t')
            .map(|i| body_start + i)
            .filter(|&i| text.as_bytes()[i] == b'\n')
            .map(|i| i + 1)
            .unwrap_or(end_at);

        Ok(RegionSpan {
            body: body_start..indent_start,
            end_indent: indent_start..end_at,
        })
    }

    /// Current body with the delimiter-adjacent newlines stripped.
    pub fn current_body<'t>(&self, text: &'t str) -> Result<&'t str, RolewireError> {
        let span = self.locate(text)?;
        let raw = &text[span.body];
        let raw = raw.strip_prefix('\n').unwrap_or(raw);
        Ok(raw.strip_suffix('\n').unwrap_or(raw))
    }

    /// Replace the region body, normalizing to exactly one newline on each
    /// side of `body`. Everything outside the region is left byte-identical.
    pub fn splice(&self, text: &str, body: &str) -> Result<String, RolewireError> {
        let span = self.locate(text)?;
        let indent = &text[span.end_indent.clone()];

        let mut out = String::with_capacity(text.len() + body.len());
        out.push_str(&text[..span.body.start]);
        out.push('\n');
        out.push_str(body);
        out.push('\n');
        out.push_str(indent);
        out.push_str(&text[span.end_indent.end..]);
        Ok(out)
    }
}

/// Offsets of `delimiter` occurrences that end on a token boundary, so that
/// `ROLE_MENU` does not match inside `ROLE_MENU_CASE`.
fn delimiter_offsets(text: &str, delimiter: &str) -> Vec<usize> {
    text.match_indices(delimiter)
        .filter(|(at, _)| {
            text[at + delimiter.len()..]
                .chars()
                .next()
                .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        })
        .map(|(at, _)| at)
        .collect()
}
