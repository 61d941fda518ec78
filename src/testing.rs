//! Testing utilities for checking segmentation against a reference model.
//!
//! This module is gated behind the `testing` feature.
//!
//! # Provided helpers
//!
//! - [`FuzzDocument`]: an arbitrary, well-formed query file
//! - [`FuzzDocument::render`]: the document's text and the statements it must yield
//! - [`assert_document_roundtrip`]: segment a rendered document and compare with the model
//! - [`check_segment_invariants`]: properties that hold for any input text

use arbitrary::Arbitrary;

use crate::errors::ParseError;
use crate::segmenter::{DEFAULT_MARKER, is_comment_line, segment, strip_comment_lines};
use crate::statements::{Statements, is_valid_statement_name};

const NAME_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_";
// No '-' so body lines never look like comments, no ':' so comments never look like markers.
const TEXT_ALPHABET: &[u8] = b"SELECTFROMWHEREabcdefghijklmnopqrstuvwxyz0123456789 \t_,;()*='";

fn pick(bytes: &[u8], alphabet: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| char::from(alphabet[usize::from(*byte) % alphabet.len()]))
        .collect()
}

/// A line of a statement body.
#[derive(Debug, Clone, Arbitrary)]
pub enum FuzzLine {
    /// SQL text, kept in the output.
    Sql(Vec<u8>),
    /// A comment line with the given indentation, removed from the output.
    Comment(u8, Vec<u8>),
    /// A line holding only whitespace.
    Blank(u8),
}

impl FuzzLine {
    fn render(&self) -> String {
        match self {
            FuzzLine::Sql(text) => {
                let text = pick(text, TEXT_ALPHABET);
                // Keep the line non-blank so it is never confused with `Blank`.
                format!("x{text}")
            }
            FuzzLine::Comment(indent, text) => format!(
                "{}-- {}",
                " ".repeat(usize::from(*indent % 8)),
                pick(text, TEXT_ALPHABET)
            ),
            FuzzLine::Blank(width) => " ".repeat(usize::from(*width % 4)),
        }
    }
}

/// A named statement of a [`FuzzDocument`].
#[derive(Debug, Clone, Arbitrary)]
pub struct FuzzStatement {
    /// Bytes mapped onto `[A-Za-z0-9_]` to form the name.
    pub name: Vec<u8>,
    /// Indentation of the marker line.
    pub indent: u8,
    /// Body lines.
    pub lines: Vec<FuzzLine>,
}

impl FuzzStatement {
    /// The statement name, never empty.
    #[must_use]
    pub fn name(&self) -> String {
        let name = pick(&self.name, NAME_ALPHABET);
        if name.is_empty() { "q".to_owned() } else { name }
    }
}

/// A well-formed query file.
#[derive(Debug, Clone, Arbitrary)]
pub struct FuzzDocument {
    /// Lines preceding the first marker.
    pub prelude: Vec<FuzzLine>,
    /// The statements, possibly sharing names.
    pub statements: Vec<FuzzStatement>,
}

impl FuzzDocument {
    /// Renders the document, returning its text and the statements a correct
    /// segmenter extracts from it.
    #[must_use]
    pub fn render(&self) -> (String, Statements) {
        let mut lines: Vec<String> = self.prelude.iter().map(FuzzLine::render).collect();
        let mut expected = Statements::new();
        for statement in &self.statements {
            let name = statement.name();
            let indent = " ".repeat(usize::from(statement.indent % 8));
            lines.push(format!("{indent}{DEFAULT_MARKER} {name}"));
            let body: Vec<String> = statement.lines.iter().map(FuzzLine::render).collect();
            lines.extend(body.iter().cloned());

            // Whitespace ahead of the next marker belongs to the marker.
            let raw = body.join("\n");
            expected.insert(name, strip_comment_lines(raw.trim_end().split('\n')));
        }
        (lines.join("\n"), expected)
    }
}

/// Segments the rendered `document` and asserts it matches the model.
///
/// # Panics
///
/// Panics if segmentation fails or yields different statements.
pub fn assert_document_roundtrip(document: &FuzzDocument) {
    let (text, expected) = document.render();
    let statements = segment(&text).unwrap_or_else(|error| panic!("{error} in {text:?}"));
    assert_eq!(statements, expected, "segmenting {text:?}");
}

/// Checks the properties that hold for the segmentation of any text.
///
/// # Panics
///
/// Panics if one of them is violated.
pub fn check_segment_invariants(text: &str) {
    match segment(text) {
        Ok(statements) => {
            assert!(statements.len() <= text.matches(DEFAULT_MARKER).count());
            for (name, body) in &statements {
                assert!(is_valid_statement_name(name), "invalid name {name:?}");
                assert!(
                    !body.split('\n').any(is_comment_line),
                    "comment line left in {body:?}"
                );
                assert_eq!(&strip_comment_lines(body.split('\n')), body);
            }
        }
        Err(ParseError::InvalidStatementName(name)) => {
            assert!(!is_valid_statement_name(&name));
        }
        Err(error) => panic!("unexpected error {error}"),
    }
}
