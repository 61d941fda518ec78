//! The name to SQL mapping produced by segmentation.

use core::ops::Index;

use indexmap::IndexMap;
use indexmap::map::{IntoIter, Iter};

use crate::errors::ParseError;

/// Returns whether `name` is a valid statement name, i.e. matches `^[A-Za-z0-9_]+$`.
///
/// # Examples
///
/// ```
/// use sqload::is_valid_statement_name;
///
/// assert!(is_valid_statement_name("FindUserById"));
/// assert!(is_valid_statement_name("find_user_2"));
/// assert!(!is_valid_statement_name(""));
/// assert!(!is_valid_statement_name("Find User"));
/// ```
#[must_use]
pub fn is_valid_statement_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
}

/// Named SQL statements, in the order their names were first declared.
///
/// Inserting an existing name replaces its body but keeps its position:
/// the last declaration wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct Statements {
    inner: IndexMap<String, String>,
}

impl Statements {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct statement names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if no statement was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the body of the statement called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).map(String::as_str)
    }

    /// Returns true if a statement called `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    /// Inserts a statement, returning the body it replaced, if any.
    pub fn insert(&mut self, name: impl Into<String>, body: impl Into<String>) -> Option<String> {
        self.inner.insert(name.into(), body.into())
    }

    /// Iterates over `(name, body)` pairs in declaration order.
    pub fn iter(&self) -> Iter<'_, String, String> {
        self.inner.iter()
    }

    /// Iterates over the statement names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    /// Merges `other` into `self`; statements of `other` overwrite same-named ones.
    pub fn merge(&mut self, other: Statements) {
        self.inner.extend(other.inner);
    }

    /// Merges `other` into `self`, rejecting any name declared by both.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::DuplicateStatementName`] for the first shared name,
    /// in which case `self` is left unchanged.
    pub fn merge_strict(&mut self, other: Statements) -> Result<(), ParseError> {
        if let Some(name) = other.names().find(|name| self.contains(name)) {
            return Err(ParseError::DuplicateStatementName(name.to_owned()));
        }
        self.merge(other);
        Ok(())
    }

    /// Consumes the mapping, returning the underlying map.
    #[must_use]
    pub fn into_inner(self) -> IndexMap<String, String> {
        self.inner
    }
}

impl Index<&str> for Statements {
    type Output = str;

    fn index(&self, name: &str) -> &str {
        match self.get(name) {
            Some(body) => body,
            None => panic!("no statement named {name:?}"),
        }
    }
}

impl<N: Into<String>, B: Into<String>> FromIterator<(N, B)> for Statements {
    fn from_iter<I: IntoIterator<Item = (N, B)>>(iter: I) -> Self {
        let mut statements = Self::new();
        statements.extend(iter);
        statements
    }
}

impl<N: Into<String>, B: Into<String>> Extend<(N, B)> for Statements {
    fn extend<I: IntoIterator<Item = (N, B)>>(&mut self, iter: I) {
        for (name, body) in iter {
            self.insert(name, body);
        }
    }
}

impl IntoIterator for Statements {
    type Item = (String, String);
    type IntoIter = IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a> IntoIterator for &'a Statements {
    type Item = (&'a String, &'a String);
    type IntoIter = Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}
