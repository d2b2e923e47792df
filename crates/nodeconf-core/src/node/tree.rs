//! In-memory JSON tree backend
//!
//! `TreeNode` is a cursor (a JSON pointer) into a document shared by every
//! node handed out from it. The outermost pair of an edit checkpoints the
//! whole document; aborting restores the checkpoint, so a failed edit leaves
//! nothing behind.

use super::json::{leaf_from_json, lookup_child};
use super::{ChildRequest, EditRequest, FieldRequest, ListEntry, ListRequest, Node, NodeRef};
use super::{RemoveRequest, ValueHandle};
use crate::errors::{NodeError, Result};
use crate::meta::Kind;
use serde_json::{Map, Value as Json};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct Document {
    value: RefCell<Json>,
    checkpoints: RefCell<Vec<Json>>,
}

/// Read/write node over a plain JSON tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    doc: Rc<Document>,
    pointer: String,
}

impl Default for TreeNode {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeNode {
    /// Empty object document
    pub fn new() -> Self {
        Self::from_json(Json::Object(Map::new()))
    }

    pub fn from_json(value: Json) -> Self {
        Self {
            doc: Rc::new(Document {
                value: RefCell::new(value),
                checkpoints: RefCell::new(Vec::new()),
            }),
            pointer: String::new(),
        }
    }

    pub fn node(&self) -> NodeRef {
        Rc::new(self.clone())
    }

    /// Current JSON at this node's position (`null` once it was removed)
    pub fn to_json(&self) -> Json {
        self.doc
            .value
            .borrow()
            .pointer(&self.pointer)
            .cloned()
            .unwrap_or(Json::Null)
    }

    fn at(&self, token: &str) -> TreeNode {
        TreeNode {
            doc: self.doc.clone(),
            pointer: format!("{}/{}", self.pointer, escape(token)),
        }
    }

    fn with_mut<R>(&self, f: impl FnOnce(&mut Json) -> Result<R>) -> Result<R> {
        let mut root = self.doc.value.borrow_mut();
        let target = root
            .pointer_mut(&self.pointer)
            .ok_or_else(|| NodeError::DataNotFound {
                path: self.pointer.clone(),
            })?;
        f(target)
    }
}

fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

fn shape_error(ident: &str, expected: &str) -> NodeError {
    NodeError::TypeMismatch {
        ident: ident.to_string(),
        expected: expected.to_string(),
        reason: "existing data has a different shape".to_string(),
    }
}

impl Node for TreeNode {
    fn child(&self, r: &ChildRequest<'_>) -> Result<Option<NodeRef>> {
        let ident = r.meta.ident();
        let exists = {
            let root = self.doc.value.borrow();
            match root.pointer(&self.pointer) {
                Some(here) => lookup_child(here, r.meta)?.is_some(),
                None => false,
            }
        };
        if exists {
            return Ok(Some(self.at(ident).node()));
        }
        if !r.new {
            return Ok(None);
        }
        let empty = match r.meta.kind() {
            Kind::List => Json::Array(Vec::new()),
            _ => Json::Object(Map::new()),
        };
        self.with_mut(|here| match here {
            Json::Object(map) => {
                map.insert(ident.to_string(), empty);
                Ok(())
            }
            _ => Err(shape_error(ident, "object")),
        })?;
        Ok(Some(self.at(ident).node()))
    }

    fn next(&self, r: &ListRequest<'_>) -> Result<Option<ListEntry>> {
        if r.new {
            let mut entry = Map::new();
            if let Some(key) = r.key {
                for (ident, value) in r.meta.key_idents().iter().zip(key) {
                    entry.insert(ident.clone(), value.to_json());
                }
            }
            let row = self.with_mut(|here| match here {
                Json::Array(items) => {
                    items.push(Json::Object(entry));
                    Ok(items.len() - 1)
                }
                _ => Err(shape_error(r.meta.ident(), "array")),
            })?;
            return Ok(Some(ListEntry {
                node: self.at(&row.to_string()).node(),
                key: r.key.map(<[_]>::to_vec),
            }));
        }

        let len = match self.doc.value.borrow().pointer(&self.pointer) {
            Some(Json::Array(items)) => items.len(),
            Some(Json::Null) | None => 0,
            Some(_) => return Err(shape_error(r.meta.ident(), "array")),
        };
        if r.row >= len {
            return Ok(None);
        }
        Ok(Some(ListEntry {
            node: self.at(&r.row.to_string()).node(),
            key: None,
        }))
    }

    fn field(&self, r: &FieldRequest<'_>, hnd: &mut ValueHandle) -> Result<()> {
        let ident = r.meta.ident();
        if !r.write {
            let root = self.doc.value.borrow();
            hnd.val = match root.pointer(&self.pointer).and_then(|here| here.get(ident)) {
                Some(raw) => leaf_from_json(r.meta, raw)?,
                None => None,
            };
            return Ok(());
        }
        let val = hnd.val.clone();
        self.with_mut(|here| match here {
            Json::Object(map) => {
                match val {
                    Some(v) => {
                        map.insert(ident.to_string(), v.to_json());
                    }
                    None => {
                        map.remove(ident);
                    }
                }
                Ok(())
            }
            _ => Err(shape_error(ident, "object")),
        })
    }

    fn remove(&self, r: &RemoveRequest<'_>) -> Result<()> {
        let ident = r.meta.ident();
        self.with_mut(|here| match (here, r.row) {
            (Json::Array(items), Some(row)) if row < items.len() => {
                items.remove(row);
                Ok(())
            }
            (Json::Object(map), None) => map
                .remove(ident)
                .map(|_| ())
                .ok_or_else(|| NodeError::DataNotFound {
                    path: ident.to_string(),
                }),
            _ => Err(NodeError::DataNotFound {
                path: match r.row {
                    Some(row) => format!("{}[{}]", ident, row),
                    None => ident.to_string(),
                },
            }),
        })
    }

    fn begin_edit(&self, r: &EditRequest<'_>) -> Result<()> {
        if r.edit_root {
            let snapshot = self.doc.value.borrow().clone();
            self.doc.checkpoints.borrow_mut().push(snapshot);
        }
        Ok(())
    }

    fn end_edit(&self, r: &EditRequest<'_>) -> Result<()> {
        if r.edit_root {
            self.doc.checkpoints.borrow_mut().pop();
        }
        Ok(())
    }

    fn abort_edit(&self, r: &EditRequest<'_>) -> Result<()> {
        if r.edit_root {
            if let Some(snapshot) = self.doc.checkpoints.borrow_mut().pop() {
                *self.doc.value.borrow_mut() = snapshot;
            }
        }
        Ok(())
    }
}
