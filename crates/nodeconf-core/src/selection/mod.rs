//! Selections: a schema position bound to a data node
//!
//! A [`Selection`] is the cursor every operation works through. It is cheap
//! to clone, carries its ancestry for path rendering and deletes, and never
//! caches anything about the data below it.
//!
//! ## Example
//!
//! ```
//! use nodeconf_core::meta::MetaBuilder;
//! use nodeconf_core::node::tree::TreeNode;
//! use nodeconf_core::{Selection, Value};
//! use serde_json::json;
//!
//! let module = MetaBuilder::module("test")
//!     .definition(
//!         MetaBuilder::list("hobbies")
//!             .key("name")
//!             .definition(MetaBuilder::leaf("name", "string"))
//!             .definition(MetaBuilder::leaf("level", "uint8")),
//!     )
//!     .build()
//!     .unwrap();
//! let data = TreeNode::from_json(json!({"hobbies": [{"name": "fishing", "level": 2}]}));
//! let root = Selection::new(module, data.node()).unwrap();
//!
//! let fishing = root.find("hobbies=fishing").unwrap();
//! fishing.set("level", 3u64).unwrap();
//! assert_eq!(fishing.get("level").unwrap(), Some(Value::UInt(3)));
//! ```

pub mod edit;
pub mod path;

pub use edit::Strategy;

use crate::errors::{NodeError, Result};
use crate::meta::{Kind, Meta, MetaRef};
use crate::node::{
    find_entry, leaf_format, read_field, write_field, ChildRequest, Children, EditRequest, Node,
    NodeRef, RemoveRequest,
};
use crate::value::Value;
use crate::{log_op_end, log_op_error, log_op_start};
use edit::{within_edit, Editor};
use path::{positional_segment, Segment};
use std::fmt;
use std::rc::Rc;
use std::time::Instant;

/// What the selection's node stands for
#[derive(Debug, Clone, PartialEq)]
pub enum Position {
    /// A module or container
    Container,
    /// A list as a whole
    List,
    /// One entry of a list
    ListItem { row: usize, key: Option<Vec<Value>> },
}

/// Cursor over data shaped by a schema definition
#[derive(Clone)]
pub struct Selection {
    pub(crate) meta: MetaRef,
    pub(crate) node: NodeRef,
    pub(crate) position: Position,
    pub(crate) parent: Option<Rc<Selection>>,
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("ident", &self.meta.ident())
            .field("position", &self.position)
            .field("path", &self.path())
            .finish()
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

impl Selection {
    /// Root selection over a module or container
    ///
    /// # Errors
    ///
    /// `NodeError::InvalidSchema` when `meta` is a list or leaf.
    pub fn new(meta: MetaRef, node: NodeRef) -> Result<Self> {
        if !matches!(meta.kind(), Kind::Module | Kind::Container) {
            return Err(NodeError::InvalidSchema {
                ident: meta.ident().to_string(),
                reason: format!(
                    "root selections need a module or container, not a {}",
                    meta.kind().as_str()
                ),
            });
        }
        Ok(Self {
            meta,
            node,
            position: Position::Container,
            parent: None,
        })
    }

    pub(crate) fn whole_list(meta: MetaRef, node: NodeRef, parent: Selection) -> Self {
        Self {
            meta,
            node,
            position: Position::List,
            parent: Some(Rc::new(parent)),
        }
    }

    pub fn meta(&self) -> &MetaRef {
        &self.meta
    }

    pub fn node(&self) -> &NodeRef {
        &self.node
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn parent(&self) -> Option<&Selection> {
        self.parent.as_deref()
    }

    /// Key of a list-item selection
    pub fn key(&self) -> Option<&[Value]> {
        match &self.position {
            Position::ListItem { key, .. } => key.as_deref(),
            _ => None,
        }
    }

    /// Selection at `path`, relative to this one
    ///
    /// # Errors
    ///
    /// - `NodeError::InvalidPath` for malformed paths or segments that
    ///   cannot apply here (leaves, key predicates on containers, wrong key
    ///   counts, stepping below a whole list)
    /// - `NodeError::SchemaNotFound` for idents the schema does not define
    /// - `NodeError::DataNotFound` when the schema resolves but the data
    ///   has nothing there
    pub fn find(&self, path: &str) -> Result<Selection> {
        log_op_start!("find", path = path);
        let start = Instant::now();

        let found = self.find_impl(path).map_err(|e| {
            log_op_error!("find", e.clone(), duration_ms = elapsed_ms(start), path = path);
            e
        })?;

        log_op_end!("find", duration_ms = elapsed_ms(start), path = path);
        Ok(found)
    }

    fn find_impl(&self, path: &str) -> Result<Selection> {
        let mut sel = self.clone();
        for segment in path::parse(path)? {
            sel = sel.step(&segment)?;
        }
        Ok(sel)
    }

    fn step(&self, segment: &Segment) -> Result<Selection> {
        let invalid = |reason: String| NodeError::InvalidPath {
            segment: segment.to_string(),
            reason,
        };
        if self.position == Position::List {
            return Err(invalid(format!(
                "'{}' is a whole list; select an entry with {}=<key>",
                self.meta.ident(),
                self.meta.ident()
            )));
        }

        let def = self.meta.resolve(&segment.ident)?;
        let not_found = || NodeError::DataNotFound {
            path: self.child_path(segment),
        };

        match def.kind() {
            Kind::Leaf => Err(invalid(format!(
                "'{}' is a leaf; read it with get()",
                def.ident()
            ))),
            Kind::Container | Kind::Module => {
                if segment.keys.is_some() {
                    return Err(invalid("only lists take key predicates".to_string()));
                }
                let node = self
                    .node
                    .child(&ChildRequest {
                        meta: &def,
                        new: false,
                    })?
                    .ok_or_else(not_found)?;
                Ok(Selection {
                    meta: def,
                    node,
                    position: Position::Container,
                    parent: Some(Rc::new(self.clone())),
                })
            }
            Kind::List => {
                let node = self
                    .node
                    .child(&ChildRequest {
                        meta: &def,
                        new: false,
                    })?
                    .ok_or_else(not_found)?;
                let list = Selection::whole_list(def, node, self.clone());
                match &segment.keys {
                    None => Ok(list),
                    Some(keys) => list.select_entry(keys, segment),
                }
            }
        }
    }

    fn select_entry(&self, keys: &[String], segment: &Segment) -> Result<Selection> {
        let invalid = |reason: String| NodeError::InvalidPath {
            segment: segment.to_string(),
            reason,
        };
        let key_metas = self.meta.key_metas();
        if key_metas.is_empty() {
            return Err(invalid(format!(
                "list '{}' declares no key",
                self.meta.ident()
            )));
        }
        if keys.len() != key_metas.len() {
            return Err(invalid(format!(
                "expected {} key value(s), got {}",
                key_metas.len(),
                keys.len()
            )));
        }
        let key = key_metas
            .iter()
            .zip(keys)
            .map(|(meta, text)| {
                leaf_format(meta)?
                    .parse(meta.ident(), text)
                    .map_err(|e| invalid(e.to_string()))
            })
            .collect::<Result<Vec<Value>>>()?;

        let (row, entry) = find_entry(self.node.as_ref(), &self.meta, &key)?.ok_or_else(|| {
            NodeError::DataNotFound {
                path: self.parent_path_with(segment),
            }
        })?;
        Ok(Selection {
            meta: self.meta.clone(),
            node: entry.node,
            position: Position::ListItem {
                row,
                key: entry.key.or(Some(key)),
            },
            parent: Some(Rc::new(self.clone())),
        })
    }

    fn child_path(&self, segment: &Segment) -> String {
        join_path(&self.path(), &segment.to_string())
    }

    fn parent_path_with(&self, segment: &Segment) -> String {
        let base = self.parent.as_deref().map(Selection::path).unwrap_or_default();
        join_path(&base, &segment.to_string())
    }

    /// Path of this selection from its root, in `find` syntax
    ///
    /// An entry without key values renders as `ident[row]`. That segment
    /// names the entry for display only; `find` rejects it as `InvalidPath`.
    pub fn path(&self) -> String {
        let mut segments = Vec::new();
        let mut cur = Some(self);
        while let Some(sel) = cur {
            match &sel.position {
                Position::ListItem { row, key } => {
                    let text = match key {
                        Some(key) => Segment {
                            ident: sel.meta.ident().to_string(),
                            keys: Some(key.iter().map(ToString::to_string).collect()),
                        }
                        .to_string(),
                        None => positional_segment(sel.meta.ident(), *row),
                    };
                    segments.push(text);
                    // the whole-list parent renders as part of this segment
                    cur = sel.parent.as_deref().and_then(|list| list.parent.as_deref());
                    continue;
                }
                _ if sel.parent.is_some() => segments.push(sel.meta.ident().to_string()),
                _ => {}
            }
            cur = sel.parent.as_deref();
        }
        segments.reverse();
        segments.join("/")
    }

    fn require_fields(&self, ident: &str) -> Result<()> {
        if self.position == Position::List {
            return Err(NodeError::InvalidPath {
                segment: ident.to_string(),
                reason: format!(
                    "'{}' is a whole list; fields belong to its entries",
                    self.meta.ident()
                ),
            });
        }
        Ok(())
    }

    /// Read one leaf of this container or list entry
    ///
    /// # Errors
    ///
    /// `NodeError::SchemaNotFound` for unknown idents, `NodeError::InvalidPath`
    /// for non-leaves or whole-list selections, plus node failures.
    pub fn get(&self, ident: &str) -> Result<Option<Value>> {
        self.require_fields(ident)?;
        let def = self.meta.resolve(ident)?;
        read_field(self.node.as_ref(), &def)
    }

    /// Write one leaf inside its own edit pair
    ///
    /// # Errors
    ///
    /// - `NodeError::TypeMismatch` when the value does not fit the leaf
    /// - `NodeError::KeyImmutable` for key leaves of a list entry
    /// - `NodeError::SchemaNotFound` / `NodeError::InvalidPath` as for `get`
    /// - whatever the node reports, including edit rejections
    pub fn set(&self, ident: &str, value: impl Into<Value>) -> Result<()> {
        self.require_fields(ident)?;
        let def = self.meta.resolve(ident)?;
        let format = leaf_format(&def)?;
        if matches!(self.position, Position::ListItem { .. }) && self.meta.is_key(ident) {
            return Err(NodeError::KeyImmutable {
                ident: ident.to_string(),
            });
        }
        let value = format.coerce(ident, value.into())?;
        let r = EditRequest {
            meta: &self.meta,
            new: false,
            edit_root: true,
        };
        within_edit(self.node.as_ref(), &r, || {
            write_field(self.node.as_ref(), &def, Some(value))
        })
    }

    /// Entries of a whole-list selection, lazily, in backend order
    ///
    /// # Errors
    ///
    /// `NodeError::InvalidPath` unless this is a whole-list selection.
    pub fn entries(&self) -> Result<impl Iterator<Item = Result<Selection>>> {
        if self.position != Position::List {
            return Err(NodeError::InvalidPath {
                segment: self.meta.ident().to_string(),
                reason: "only whole-list selections have entries".to_string(),
            });
        }
        let parent = Rc::new(self.clone());
        let entries = Children::owned_entries(self.node.clone(), self.meta.clone());
        Ok(entries.enumerate().map(move |(row, entry)| {
            entry.map(|entry| Selection {
                meta: parent.meta.clone(),
                node: entry.node,
                position: Position::ListItem {
                    row,
                    key: entry.key,
                },
                parent: Some(parent.clone()),
            })
        }))
    }

    /// Copy this selection's data into `to`, rejecting existing list keys
    ///
    /// # Errors
    ///
    /// `NodeError::DuplicateEntry` when `to` already has an entry with a
    /// copied key, plus any read, write or edit failure.
    pub fn insert_into(&self, to: NodeRef) -> Result<()> {
        self.run_edit(Strategy::Insert, to.as_ref(), true)
    }

    /// Copy this selection's data into `to`, merging with what is there
    ///
    /// # Errors
    ///
    /// Any read, write or edit failure.
    pub fn upsert_into(&self, to: NodeRef) -> Result<()> {
        self.run_edit(Strategy::Upsert, to.as_ref(), true)
    }

    /// Copy data from `from` into this selection, rejecting existing keys
    ///
    /// # Errors
    ///
    /// See [`Selection::insert_into`].
    pub fn insert_from(&self, from: NodeRef) -> Result<()> {
        self.run_edit(Strategy::Insert, from.as_ref(), false)
    }

    /// Copy data from `from` into this selection, merging
    ///
    /// # Errors
    ///
    /// Any read, write or edit failure.
    pub fn upsert_from(&self, from: NodeRef) -> Result<()> {
        self.run_edit(Strategy::Upsert, from.as_ref(), false)
    }

    /// Copy data from `from` into what already exists here
    ///
    /// # Errors
    ///
    /// Any read, write or edit failure.
    pub fn update_from(&self, from: NodeRef) -> Result<()> {
        self.run_edit(Strategy::Update, from.as_ref(), false)
    }

    fn run_edit(&self, strategy: Strategy, other: &dyn Node, outward: bool) -> Result<()> {
        let path = self.path();
        log_op_start!("edit", strategy = strategy.as_str(), path = path.as_str());
        let start = Instant::now();

        self.run_edit_impl(strategy, other, outward).map_err(|e| {
            log_op_error!(
                "edit",
                e.clone(),
                duration_ms = elapsed_ms(start),
                strategy = strategy.as_str(),
                path = path.as_str()
            );
            e
        })?;

        log_op_end!(
            "edit",
            duration_ms = elapsed_ms(start),
            strategy = strategy.as_str(),
            path = path.as_str()
        );
        Ok(())
    }

    fn run_edit_impl(&self, strategy: Strategy, other: &dyn Node, outward: bool) -> Result<()> {
        let editor = Editor::new(strategy);
        let list_defs;
        // a whole list exchanges data through the node of its parent
        let (node, meta, defs): (&dyn Node, &Meta, &[MetaRef]) = match &self.position {
            Position::List => {
                let parent = self.parent.as_deref().ok_or_else(|| NodeError::InvalidPath {
                    segment: self.meta.ident().to_string(),
                    reason: "whole-list selection has no parent".to_string(),
                })?;
                list_defs = [self.meta.clone()];
                (parent.node.as_ref(), parent.meta.as_ref(), &list_defs[..])
            }
            _ => (self.node.as_ref(), self.meta.as_ref(), self.meta.definitions()),
        };
        if outward {
            editor.edit(node, other, meta, defs, false)
        } else {
            let skip_keys = matches!(self.position, Position::ListItem { .. });
            editor.edit(other, node, meta, defs, skip_keys)
        }
    }

    /// Remove the selected container, list or list entry from its parent
    ///
    /// # Errors
    ///
    /// `NodeError::InvalidPath` for root selections, `NodeError::DataNotFound`
    /// when the data is already gone, plus node failures.
    pub fn delete(&self) -> Result<()> {
        let path = self.path();
        log_op_start!("delete", path = path.as_str());
        let start = Instant::now();

        self.delete_impl().map_err(|e| {
            log_op_error!("delete", e.clone(), duration_ms = elapsed_ms(start), path = path.as_str());
            e
        })?;

        log_op_end!("delete", duration_ms = elapsed_ms(start), path = path.as_str());
        Ok(())
    }

    fn delete_impl(&self) -> Result<()> {
        let parent = self.parent.as_deref().ok_or_else(|| NodeError::InvalidPath {
            segment: self.meta.ident().to_string(),
            reason: "the root selection cannot be deleted".to_string(),
        })?;
        let r = EditRequest {
            meta: &parent.meta,
            new: false,
            edit_root: true,
        };
        match &self.position {
            Position::ListItem { row, key } => {
                // rows shift as entries come and go; the key is authoritative
                let row = match key {
                    Some(key) => {
                        find_entry(parent.node.as_ref(), &self.meta, key)?
                            .ok_or_else(|| NodeError::DataNotFound { path: self.path() })?
                            .0
                    }
                    None => *row,
                };
                within_edit(parent.node.as_ref(), &r, || {
                    parent.node.remove(&RemoveRequest {
                        meta: &self.meta,
                        row: Some(row),
                        key: key.as_deref(),
                    })
                })
            }
            _ => within_edit(parent.node.as_ref(), &r, || {
                parent.node.remove(&RemoveRequest {
                    meta: &self.meta,
                    row: None,
                    key: None,
                })
            }),
        }
    }
}

fn join_path(base: &str, segment: &str) -> String {
    if base.is_empty() {
        segment.to_string()
    } else {
        format!("{}/{}", base, segment)
    }
}
