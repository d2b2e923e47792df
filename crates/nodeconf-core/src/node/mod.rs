//! Data node abstraction
//!
//! A [`Node`] answers questions about the data at one schema position: which
//! children exist, what a field holds, how to create or remove things. The
//! schema definition is always passed in by the caller; nodes never own it.
//!
//! Backends:
//! - [`tree::TreeNode`]: plain in-memory JSON tree, transactional
//! - [`json::JsonReader`] / [`json::JsonWriter`]: streaming document binders
//! - [`reflect::Reflect`]: binder over an in-memory record
//! - [`extend::Extend`]: decorator intercepting fields, children and edits

pub mod extend;
pub mod json;
pub mod reflect;
pub mod tree;

use crate::errors::{NodeError, Result};
use crate::meta::{Format, Meta, MetaRef};
use crate::value::{keys_match, Value};
use std::rc::Rc;

/// Shared handle to a data node
pub type NodeRef = Rc<dyn Node>;

/// Lookup or creation of a container, or of a list as a whole
#[derive(Debug, Clone, Copy)]
pub struct ChildRequest<'a> {
    pub meta: &'a Meta,
    pub new: bool,
}

/// Enumeration or creation of list entries
///
/// When reading, `row` selects the entry and `key` is only a hint. When
/// `new` is set the node appends an entry carrying `key`.
#[derive(Debug, Clone, Copy)]
pub struct ListRequest<'a> {
    pub meta: &'a Meta,
    pub row: usize,
    pub key: Option<&'a [Value]>,
    pub new: bool,
}

/// Read (`write == false`) or write of one leaf
#[derive(Debug, Clone, Copy)]
pub struct FieldRequest<'a> {
    pub meta: &'a Meta,
    pub write: bool,
}

/// In/out slot for field values; `None` means absent (or clear, on write)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueHandle {
    pub val: Option<Value>,
}

/// Begin/end/abort of an edit on one node
///
/// `meta` is the definition of the node's own position. `edit_root` is set
/// on the outermost pair of one edit only.
#[derive(Debug, Clone, Copy)]
pub struct EditRequest<'a> {
    pub meta: &'a Meta,
    pub new: bool,
    pub edit_root: bool,
}

/// Removal of a container or list child (`row == None`, `meta` is the child
/// definition) or of one list entry (`row == Some`, sent to the list node)
#[derive(Debug, Clone, Copy)]
pub struct RemoveRequest<'a> {
    pub meta: &'a Meta,
    pub row: Option<usize>,
    pub key: Option<&'a [Value]>,
}

/// One list entry: its node plus its key values when known
#[derive(Clone)]
pub struct ListEntry {
    pub node: NodeRef,
    pub key: Option<Vec<Value>>,
}

impl std::fmt::Debug for ListEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListEntry").field("key", &self.key).finish()
    }
}

/// Capability interface every backing store implements
///
/// Every `begin_edit` the engine issues is closed by exactly one `end_edit`
/// or `abort_edit`, innermost first.
pub trait Node {
    /// Container or whole-list node for `r.meta`, created when `r.new`
    ///
    /// # Errors
    ///
    /// Backend failures, or shape conflicts in the underlying data.
    fn child(&self, r: &ChildRequest<'_>) -> Result<Option<NodeRef>>;

    /// List entry at `r.row`, or a new entry when `r.new`
    ///
    /// # Errors
    ///
    /// Backend failures.
    fn next(&self, r: &ListRequest<'_>) -> Result<Option<ListEntry>>;

    /// Read into or write from `hnd`
    ///
    /// # Errors
    ///
    /// `NodeError::TypeMismatch` for values the backend cannot hold,
    /// `NodeError::ReadOnly` for fields it does not accept writes for.
    fn field(&self, r: &FieldRequest<'_>, hnd: &mut ValueHandle) -> Result<()>;

    /// # Errors
    ///
    /// `NodeError::ReadOnly` unless the backend supports removal.
    fn remove(&self, r: &RemoveRequest<'_>) -> Result<()> {
        Err(NodeError::ReadOnly {
            ident: r.meta.ident().to_string(),
        })
    }

    /// # Errors
    ///
    /// `NodeError::BackendRejected` when the backend refuses the edit.
    fn begin_edit(&self, _r: &EditRequest<'_>) -> Result<()> {
        Ok(())
    }

    /// Commit point; side effects happen here
    ///
    /// # Errors
    ///
    /// `NodeError::BackendRejected` when the backend refuses to commit.
    /// Backends that cannot roll back must reject here.
    fn end_edit(&self, _r: &EditRequest<'_>) -> Result<()> {
        Ok(())
    }

    /// Discard whatever the matching `begin_edit` opened
    ///
    /// # Errors
    ///
    /// Backend failures while discarding.
    fn abort_edit(&self, _r: &EditRequest<'_>) -> Result<()> {
        Ok(())
    }
}

/// Format of a leaf definition
///
/// # Errors
///
/// `NodeError::InvalidPath` when `meta` is not a leaf.
pub fn leaf_format(meta: &Meta) -> Result<Format> {
    meta.format().ok_or_else(|| NodeError::InvalidPath {
        segment: meta.ident().to_string(),
        reason: format!("'{}' is a {}, not a leaf", meta.ident(), meta.kind().as_str()),
    })
}

/// Read one leaf; absent is `Ok(None)`
///
/// # Errors
///
/// Propagates node failures.
pub fn read_field(node: &dyn Node, meta: &Meta) -> Result<Option<Value>> {
    leaf_format(meta)?;
    let mut hnd = ValueHandle::default();
    node.field(&FieldRequest { meta, write: false }, &mut hnd)?;
    Ok(hnd.val)
}

/// Write one leaf after coercing the value to the leaf's format
///
/// # Errors
///
/// `NodeError::TypeMismatch` when coercion fails, before the node sees the
/// value, plus whatever the node reports.
pub fn write_field(node: &dyn Node, meta: &Meta, value: Option<Value>) -> Result<()> {
    let format = leaf_format(meta)?;
    let val = value
        .map(|v| format.coerce(meta.ident(), v))
        .transpose()?;
    let mut hnd = ValueHandle { val };
    node.field(&FieldRequest { meta, write: true }, &mut hnd)
}

/// Key values of a list entry, read through its key leaves
///
/// `None` for keyless lists or entries missing a key field.
///
/// # Errors
///
/// Propagates node failures.
pub fn entry_key(entry: &dyn Node, list: &Meta) -> Result<Option<Vec<Value>>> {
    let key_metas = list.key_metas();
    if key_metas.is_empty() {
        return Ok(None);
    }
    let mut key = Vec::with_capacity(key_metas.len());
    for k in &key_metas {
        match read_field(entry, k)? {
            Some(v) => key.push(v),
            None => return Ok(None),
        }
    }
    Ok(Some(key))
}

/// First entry of `list_node` whose key equals `key`, with its row
///
/// # Errors
///
/// Propagates node failures.
pub fn find_entry(
    list_node: &dyn Node,
    list: &MetaRef,
    key: &[Value],
) -> Result<Option<(usize, ListEntry)>> {
    for (row, entry) in Children::entries(list_node, list.clone()).enumerate() {
        let entry = entry?;
        if let Some(k) = &entry.key {
            if keys_match(k, key) {
                return Ok(Some((row, entry)));
            }
        }
    }
    Ok(None)
}

/// Lazy sequence of child data for one container or list definition
///
/// Containers yield at most one element. Lists yield their entries in the
/// backend's order, keys filled in from the key leaves when the backend did
/// not supply them.
pub struct Children<'n> {
    state: ChildrenState<'n>,
}

enum ChildrenState<'n> {
    Single(Option<NodeRef>),
    List {
        list: ListSource<'n>,
        meta: MetaRef,
        row: usize,
        done: bool,
    },
}

enum ListSource<'n> {
    Borrowed(&'n dyn Node),
    Owned(NodeRef),
}

impl ListSource<'_> {
    fn node(&self) -> &dyn Node {
        match self {
            ListSource::Borrowed(n) => *n,
            ListSource::Owned(n) => n.as_ref(),
        }
    }
}

impl<'n> Children<'n> {
    /// Children of `parent` for the container or list definition `meta`
    ///
    /// # Errors
    ///
    /// `NodeError::InvalidPath` for leaf definitions, plus node failures
    /// while looking the child up.
    pub fn of(parent: &dyn Node, meta: &MetaRef) -> Result<Children<'static>> {
        if meta.is_leaf() {
            return Err(NodeError::InvalidPath {
                segment: meta.ident().to_string(),
                reason: "leaves have no children".to_string(),
            });
        }
        let found = parent.child(&ChildRequest {
            meta,
            new: false,
        })?;
        let state = match found {
            Some(list) if meta.is_list() => ChildrenState::List {
                list: ListSource::Owned(list),
                meta: meta.clone(),
                row: 0,
                done: false,
            },
            other => ChildrenState::Single(other),
        };
        Ok(Children { state })
    }

    /// Entries of an already looked-up list node
    pub fn entries(list_node: &'n dyn Node, meta: MetaRef) -> Self {
        Children {
            state: ChildrenState::List {
                list: ListSource::Borrowed(list_node),
                meta,
                row: 0,
                done: false,
            },
        }
    }

    /// Entries of an owned list node
    pub fn owned_entries(list_node: NodeRef, meta: MetaRef) -> Children<'static> {
        Children {
            state: ChildrenState::List {
                list: ListSource::Owned(list_node),
                meta,
                row: 0,
                done: false,
            },
        }
    }
}

impl Iterator for Children<'_> {
    type Item = Result<ListEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.state {
            ChildrenState::Single(node) => node.take().map(|node| Ok(ListEntry { node, key: None })),
            ChildrenState::List {
                list,
                meta,
                row,
                done,
            } => {
                if *done {
                    return None;
                }
                let request = ListRequest {
                    meta,
                    row: *row,
                    key: None,
                    new: false,
                };
                let result = match list.node().next(&request) {
                    Ok(Some(mut entry)) => {
                        *row += 1;
                        if entry.key.is_none() {
                            match entry_key(entry.node.as_ref(), meta) {
                                Ok(key) => entry.key = key,
                                Err(e) => {
                                    *done = true;
                                    return Some(Err(e));
                                }
                            }
                        }
                        Ok(entry)
                    }
                    Ok(None) => {
                        *done = true;
                        return None;
                    }
                    Err(e) => {
                        *done = true;
                        Err(e)
                    }
                };
                Some(result)
            }
        }
    }
}

/// Children of `parent` for `meta`, see [`Children`]
///
/// # Errors
///
/// See [`Children::of`].
pub fn children(parent: &dyn Node, meta: &MetaRef) -> Result<Children<'static>> {
    Children::of(parent, meta)
}
