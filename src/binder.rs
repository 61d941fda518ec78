//! Copying named statements into the fields of a record.
//!
//! A record opts in by implementing [`QueryTarget`], listing its fields and the
//! statement name (tag) each one should receive. The
//! [`query_struct!`](crate::query_struct) macro writes that implementation
//! from `#[query("Name")]` field attributes.

use std::borrow::Cow;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::errors::BindError;
use crate::statements::Statements;

/// A field type able to receive SQL text.
pub trait QueryField {
    /// Replaces the field's value with `sql`.
    fn assign(&mut self, sql: &str);
}

impl QueryField for String {
    fn assign(&mut self, sql: &str) {
        self.clear();
        self.push_str(sql);
    }
}

impl QueryField for Box<str> {
    fn assign(&mut self, sql: &str) {
        *self = sql.into();
    }
}

impl QueryField for Arc<str> {
    fn assign(&mut self, sql: &str) {
        *self = sql.into();
    }
}

impl QueryField for Cow<'static, str> {
    fn assign(&mut self, sql: &str) {
        *self = Cow::Owned(sql.to_owned());
    }
}

impl<T: QueryField + Default> QueryField for Option<T> {
    fn assign(&mut self, sql: &str) {
        self.get_or_insert_with(T::default).assign(sql);
    }
}

/// Where a tagged field's SQL goes.
pub enum Slot<'a> {
    /// The field accepts SQL text.
    Text(&'a mut dyn QueryField),
    /// The field is tagged but cannot receive SQL text.
    ReadOnly,
}

impl core::fmt::Debug for Slot<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Slot::Text(_) => f.write_str("Text"),
            Slot::ReadOnly => f.write_str("ReadOnly"),
        }
    }
}

/// A field of a [`QueryTarget`] together with its tag.
#[derive(Debug)]
pub struct Binding<'a> {
    /// The field identifier, used in error messages.
    pub field: &'static str,
    /// The statement name the field receives. Empty tags are ignored.
    pub tag: &'a str,
    /// The field itself.
    pub slot: Slot<'a>,
}

impl<'a> Binding<'a> {
    /// Binds a writable field.
    pub fn text<F: QueryField + 'a>(field: &'static str, tag: &'a str, slot: &'a mut F) -> Self {
        Self {
            field,
            tag,
            slot: Slot::Text(slot),
        }
    }

    /// Declares a tagged field that cannot receive SQL text.
    #[must_use]
    pub fn read_only(field: &'static str, tag: &'a str) -> Self {
        Self {
            field,
            tag,
            slot: Slot::ReadOnly,
        }
    }
}

/// A record whose fields receive named statements.
pub trait QueryTarget {
    /// The record's bindings, in field declaration order.
    fn bindings(&mut self) -> Vec<Binding<'_>>;
}

/// Copies the statements named by `target`'s tags into its fields.
///
/// Fields sharing a tag are resolved by the last of them in declaration order;
/// the earlier ones are left untouched. Bodies are assigned verbatim.
///
/// # Errors
///
/// * [`BindError::QueryNotFound`] for the first tag missing from `statements`.
/// * [`BindError::FieldNotAssignable`] if a matched field is [`Slot::ReadOnly`].
///
/// On error the fields processed so far keep their new values.
pub fn bind<T: QueryTarget + ?Sized>(
    statements: &Statements,
    target: &mut T,
) -> Result<(), BindError> {
    let mut by_tag: IndexMap<&str, Binding<'_>> = IndexMap::new();
    for binding in target.bindings() {
        if binding.tag.is_empty() {
            continue;
        }
        by_tag.shift_remove(binding.tag);
        by_tag.insert(binding.tag, binding);
    }

    for (tag, binding) in by_tag {
        let sql = statements
            .get(tag)
            .ok_or_else(|| BindError::QueryNotFound(tag.to_owned()))?;
        match binding.slot {
            Slot::Text(field) => field.assign(sql),
            Slot::ReadOnly => return Err(BindError::FieldNotAssignable(binding.field)),
        }
    }
    Ok(())
}

/// Builds a default `T` and binds `statements` into it.
///
/// # Errors
///
/// See [`bind`].
pub fn bind_new<T: QueryTarget + Default>(statements: &Statements) -> Result<T, BindError> {
    let mut target = T::default();
    bind(statements, &mut target)?;
    Ok(target)
}
