//! Reflective binder over in-memory records
//!
//! A record type lists its members once as [`Accessor`]s. Binding the list
//! to a schema definition produces an [`AccessorTable`] that maps every leaf
//! ident to exactly one member, so mismatches surface when the node is
//! built, never halfway through an edit. Records are flat: containers and
//! lists under a reflected definition must be served by a decorator.

use super::{ChildRequest, EditRequest, FieldRequest, ListEntry, ListRequest, Node, NodeRef};
use super::ValueHandle;
use crate::errors::{NodeError, Result};
use crate::meta::Meta;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Getter/setter pair for one record member
pub struct Accessor<T> {
    pub member: &'static str,
    pub get: fn(&T) -> Option<Value>,
    pub set: Option<fn(&mut T, Value) -> std::result::Result<(), String>>,
}

impl<T> Accessor<T> {
    pub fn read_only(member: &'static str, get: fn(&T) -> Option<Value>) -> Self {
        Self {
            member,
            get,
            set: None,
        }
    }

    pub fn read_write(
        member: &'static str,
        get: fn(&T) -> Option<Value>,
        set: fn(&mut T, Value) -> std::result::Result<(), String>,
    ) -> Self {
        Self {
            member,
            get,
            set: Some(set),
        }
    }
}

/// A record type that can be served through [`Reflect`]
pub trait Record: Clone + 'static {
    fn accessors() -> Vec<Accessor<Self>>;
}

/// Member name a schema ident binds to: `-` becomes `_`, then lowercase
pub fn normalize_ident(ident: &str) -> String {
    ident.replace('-', "_").to_lowercase()
}

/// Leaf ident to accessor table for one (record type, definition) pairing
pub struct AccessorTable<T> {
    by_ident: HashMap<String, Accessor<T>>,
}

impl<T: Record> AccessorTable<T> {
    /// Bind `T`'s accessors to the leaves of `meta`
    ///
    /// Definitions named in `virtual_fields` are served by someone else
    /// (usually a decorator) and may go unbound.
    ///
    /// # Errors
    ///
    /// `NodeError::InvalidSchema` when a leaf has no member, two leaves
    /// normalize to the same member, or a container or list is not virtual.
    pub fn bind(meta: &Meta, virtual_fields: &[&str]) -> Result<Self> {
        let mut members: HashMap<&'static str, Accessor<T>> = T::accessors()
            .into_iter()
            .map(|a| (a.member, a))
            .collect();
        let mut claimed: HashMap<String, String> = HashMap::new();
        let mut by_ident = HashMap::new();

        for leaf in meta.definitions() {
            if virtual_fields.contains(&leaf.ident()) {
                continue;
            }
            if !leaf.is_leaf() {
                return Err(NodeError::InvalidSchema {
                    ident: leaf.ident().to_string(),
                    reason: "records bind leaves only; serve nested data from a decorator"
                        .to_string(),
                });
            }
            let member = normalize_ident(leaf.ident());
            if let Some(other) = claimed.insert(member.clone(), leaf.ident().to_string()) {
                return Err(NodeError::InvalidSchema {
                    ident: leaf.ident().to_string(),
                    reason: format!("collides with '{}' on member '{}'", other, member),
                });
            }
            let accessor = members
                .remove(member.as_str())
                .ok_or_else(|| NodeError::InvalidSchema {
                    ident: leaf.ident().to_string(),
                    reason: format!("record has no member '{}'", member),
                })?;
            by_ident.insert(leaf.ident().to_string(), accessor);
        }
        Ok(Self { by_ident })
    }

    fn get(&self, ident: &str) -> Option<&Accessor<T>> {
        self.by_ident.get(ident)
    }
}

/// Node serving one record's members as leaves
///
/// Writes go to a staged copy opened by `begin_edit` and land on the record
/// at `end_edit`; `abort_edit` drops them.
pub struct Reflect<T: Record> {
    record: Rc<RefCell<T>>,
    staged: RefCell<Option<T>>,
    table: AccessorTable<T>,
}

impl<T: Record> Reflect<T> {
    /// # Errors
    ///
    /// See [`AccessorTable::bind`].
    pub fn new(record: Rc<RefCell<T>>, meta: &Meta, virtual_fields: &[&str]) -> Result<Self> {
        Ok(Self {
            record,
            staged: RefCell::new(None),
            table: AccessorTable::bind(meta, virtual_fields)?,
        })
    }

    pub fn record(&self) -> &Rc<RefCell<T>> {
        &self.record
    }
}

/// Reflective node over `record` for the container definition `meta`
///
/// # Errors
///
/// See [`AccessorTable::bind`].
pub fn reflect<T: Record>(record: Rc<RefCell<T>>, meta: &Meta) -> Result<NodeRef> {
    Ok(Rc::new(Reflect::new(record, meta, &[])?))
}

impl<T: Record> Node for Reflect<T> {
    fn child(&self, _r: &ChildRequest<'_>) -> Result<Option<NodeRef>> {
        Ok(None)
    }

    fn next(&self, _r: &ListRequest<'_>) -> Result<Option<ListEntry>> {
        Ok(None)
    }

    fn field(&self, r: &FieldRequest<'_>, hnd: &mut ValueHandle) -> Result<()> {
        let ident = r.meta.ident();
        let accessor = self.table.get(ident).ok_or_else(|| NodeError::InvalidSchema {
            ident: ident.to_string(),
            reason: "leaf is not bound to a record member".to_string(),
        })?;

        if !r.write {
            hnd.val = match self.staged.borrow().as_ref() {
                Some(staged) => (accessor.get)(staged),
                None => (accessor.get)(&self.record.borrow()),
            };
            return Ok(());
        }

        let set = accessor.set.ok_or_else(|| NodeError::ReadOnly {
            ident: ident.to_string(),
        })?;
        let value = hnd.val.clone().ok_or_else(|| NodeError::TypeMismatch {
            ident: ident.to_string(),
            expected: "a value".to_string(),
            reason: "record members cannot be cleared".to_string(),
        })?;
        let mismatch = |reason: String| NodeError::TypeMismatch {
            ident: ident.to_string(),
            expected: r
                .meta
                .format()
                .map_or("value", |f| f.ident())
                .to_string(),
            reason,
        };

        let mut staged = self.staged.borrow_mut();
        match staged.as_mut() {
            Some(record) => set(record, value).map_err(mismatch),
            // outside an edit pair the write lands directly
            None => set(&mut self.record.borrow_mut(), value).map_err(mismatch),
        }
    }

    fn begin_edit(&self, _r: &EditRequest<'_>) -> Result<()> {
        let mut staged = self.staged.borrow_mut();
        if staged.is_none() {
            *staged = Some(self.record.borrow().clone());
        }
        Ok(())
    }

    fn end_edit(&self, _r: &EditRequest<'_>) -> Result<()> {
        if let Some(staged) = self.staged.borrow_mut().take() {
            *self.record.borrow_mut() = staged;
        }
        Ok(())
    }

    fn abort_edit(&self, _r: &EditRequest<'_>) -> Result<()> {
        self.staged.borrow_mut().take();
        Ok(())
    }
}
