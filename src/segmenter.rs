//! Splitting SQL text into named statements.
//!
//! Statements are introduced by a marker comment followed by their name, and
//! run until the next marker or the end of the input:
//!
//! ```text
//! -- query: FindUserById
//! -- Finds a user by primary key.
//! SELECT * FROM user WHERE id = :id;
//! ```
//!
//! Anything before the first marker is ignored. Lines of a body that are
//! themselves comments (`--` after optional leading whitespace) are removed
//! from the emitted SQL, every other line is kept verbatim.

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::ParseError;
use crate::statements::{Statements, is_valid_statement_name};

/// The marker token recognised by [`Segmenter::default`].
pub const DEFAULT_MARKER: &str = "-- query:";

/// Whitespace that may precede a marker, including line breaks.
const MARKER_PREFIX: &str = r"[ \t\n\r\x0C\x0B]*";

static DEFAULT_MARKER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| marker_pattern(DEFAULT_MARKER).expect("valid regex"));

static NEW_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r?\n").expect("valid regex"));

static COMMENT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t\n\r\x0C\x0B]*--").expect("valid regex"));

fn marker_pattern(token: &str) -> Result<Regex, ParseError> {
    if token.trim().is_empty() {
        return Err(ParseError::InvalidMarker(
            "marker token must not be blank".to_owned(),
        ));
    }
    Regex::new(&format!("{MARKER_PREFIX}{}", regex::escape(token)))
        .map_err(|error| ParseError::InvalidMarker(error.to_string()))
}

/// Returns whether `line` is a SQL comment line.
#[must_use]
pub fn is_comment_line(line: &str) -> bool {
    COMMENT_LINE.is_match(line)
}

/// Drops comment lines and joins the remaining ones with `\n`.
///
/// Blank lines are kept, so applying it to its own output is a no-op.
///
/// # Examples
///
/// ```
/// use sqload::strip_comment_lines;
///
/// let sql = strip_comment_lines(["-- Find all users", "SELECT *", "  -- indented", "FROM user;"]);
/// assert_eq!(sql, "SELECT *\nFROM user;");
/// ```
pub fn strip_comment_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> String {
    lines
        .into_iter()
        .filter(|line| !is_comment_line(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Splits text into [`Statements`] using a configurable marker.
#[derive(Debug, Clone)]
pub struct Segmenter {
    marker: Regex,
    strict: bool,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER_PATTERN.clone(),
            strict: false,
        }
    }
}

impl Segmenter {
    /// Creates a segmenter recognising [`DEFAULT_MARKER`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a segmenter recognising `token` instead of [`DEFAULT_MARKER`].
    ///
    /// The token is matched literally.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidMarker`] if `token` is blank.
    pub fn with_marker(token: &str) -> Result<Self, ParseError> {
        Ok(Self {
            marker: marker_pattern(token)?,
            strict: false,
        })
    }

    /// When enabled, a name declared twice fails with
    /// [`ParseError::DuplicateStatementName`] instead of overwriting.
    #[must_use]
    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Returns whether duplicate names are rejected.
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        self.strict
    }

    /// Splits `text` into named statements.
    ///
    /// Text without any marker yields an empty mapping.
    ///
    /// # Errors
    ///
    /// * [`ParseError::InvalidStatementName`] if a marker declares a name that is
    ///   empty or contains characters outside of `[A-Za-z0-9_]`.
    /// * [`ParseError::DuplicateStatementName`] if strict mode is enabled and a
    ///   name is declared twice.
    ///
    /// No partial mapping is returned on error.
    pub fn segment(&self, text: &str) -> Result<Statements, ParseError> {
        let mut statements = Statements::new();
        // The first piece precedes any marker and is never a statement.
        for piece in self.marker.split(text).skip(1) {
            let mut lines = NEW_LINE.split(piece.trim_end());
            let name = lines.next().unwrap_or_default().trim();
            if !is_valid_statement_name(name) {
                return Err(ParseError::InvalidStatementName(name.to_owned()));
            }
            if self.strict && statements.contains(name) {
                return Err(ParseError::DuplicateStatementName(name.to_owned()));
            }
            statements.insert(name, strip_comment_lines(lines));
        }
        Ok(statements)
    }
}

/// Splits `text` into named statements using [`DEFAULT_MARKER`].
///
/// # Errors
///
/// Returns [`ParseError::InvalidStatementName`] if a marker declares an invalid name.
///
/// # Examples
///
/// ```
/// use sqload::segment;
///
/// let statements = segment("-- query: A\nSELECT 1;\n-- query: B\nSELECT 2;").unwrap();
/// assert_eq!(statements.get("A"), Some("SELECT 1;"));
/// assert_eq!(statements.get("B"), Some("SELECT 2;"));
/// ```
pub fn segment(text: &str) -> Result<Statements, ParseError> {
    Segmenter::default().segment(text)
}
