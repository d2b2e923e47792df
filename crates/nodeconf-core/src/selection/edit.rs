//! Subtree copy between nodes
//!
//! ## Atomicity Contract
//!
//! One edit runs inside a single `edit_root` pair on the destination. Every
//! destination node the copy opens gets its own nested pair, closed
//! innermost first. When anything inside a pair fails, or `end_edit`
//! itself rejects, that node is sent `abort_edit` and the error travels
//! outward, aborting each enclosing pair in turn. Backends that stage
//! writes (or checkpoint at the edit root) therefore never expose a
//! partially copied subtree.

use crate::errors::{NodeError, Result};
use crate::meta::{Kind, Meta, MetaRef};
use crate::node::{
    find_entry, read_field, write_field, ChildRequest, Children, EditRequest, ListEntry,
    ListRequest, Node, NodeRef,
};

/// How an edit treats data already present at the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Create everything; an existing list key is a `DuplicateEntry` error
    Insert,
    /// Create what is missing, merge into what exists
    Upsert,
    /// Only touch containers and entries that already exist
    Update,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Insert => "insert",
            Strategy::Upsert => "upsert",
            Strategy::Update => "update",
        }
    }
}

/// Run `f` inside a begin/end pair on `node`, aborting on any failure
///
/// The error returned is always the first one raised; a failing
/// `abort_edit` is logged and otherwise ignored.
pub(crate) fn within_edit<T>(
    node: &dyn Node,
    r: &EditRequest<'_>,
    f: impl FnOnce() -> Result<T>,
) -> Result<T> {
    node.begin_edit(r)?;
    let outcome = f().and_then(|value| node.end_edit(r).map(|()| value));
    if outcome.is_err() {
        if let Err(abort_err) = node.abort_edit(r) {
            tracing::warn!(
                ident = r.meta.ident(),
                error = %abort_err,
                "abort_edit failed after edit error"
            );
        }
    }
    outcome
}

pub(crate) struct Editor {
    strategy: Strategy,
}

impl Editor {
    pub(crate) fn new(strategy: Strategy) -> Self {
        Self { strategy }
    }

    /// Copy `defs` (children of `parent`) from `from` into `to`
    ///
    /// `skip_keys` leaves the key leaves of `to` alone; set when `to` is an
    /// existing list entry.
    pub(crate) fn edit(
        &self,
        from: &dyn Node,
        to: &dyn Node,
        parent: &Meta,
        defs: &[MetaRef],
        skip_keys: bool,
    ) -> Result<()> {
        let r = EditRequest {
            meta: parent,
            new: false,
            edit_root: true,
        };
        within_edit(to, &r, || self.copy(from, to, parent, defs, skip_keys))
    }

    fn copy(
        &self,
        from: &dyn Node,
        to: &dyn Node,
        parent: &Meta,
        defs: &[MetaRef],
        skip_keys: bool,
    ) -> Result<()> {
        for def in defs {
            match def.kind() {
                Kind::Leaf => {
                    if skip_keys && parent.is_key(def.ident()) {
                        continue;
                    }
                    if let Some(value) = read_field(from, def)? {
                        write_field(to, def, Some(value))?;
                    }
                }
                Kind::List => self.copy_list(from, to, def)?,
                Kind::Container | Kind::Module => self.copy_container(from, to, def)?,
            }
        }
        Ok(())
    }

    /// Existing destination child, or a new one unless updating
    fn open(&self, to: &dyn Node, def: &Meta) -> Result<Option<(NodeRef, bool)>> {
        if let Some(existing) = to.child(&ChildRequest {
            meta: def,
            new: false,
        })? {
            return Ok(Some((existing, false)));
        }
        if self.strategy == Strategy::Update {
            return Ok(None);
        }
        let created = to
            .child(&ChildRequest {
                meta: def,
                new: true,
            })?
            .ok_or_else(|| NodeError::BackendRejected {
                op: "child".to_string(),
                reason: format!("node did not create '{}'", def.ident()),
            })?;
        Ok(Some((created, true)))
    }

    fn copy_container(&self, from: &dyn Node, to: &dyn Node, def: &MetaRef) -> Result<()> {
        let src = match from.child(&ChildRequest {
            meta: def,
            new: false,
        })? {
            Some(src) => src,
            None => return Ok(()),
        };
        let (dst, created) = match self.open(to, def)? {
            Some(opened) => opened,
            None => return Ok(()),
        };
        let r = EditRequest {
            meta: def,
            new: created,
            edit_root: false,
        };
        within_edit(dst.as_ref(), &r, || {
            self.copy(src.as_ref(), dst.as_ref(), def, def.definitions(), false)
        })
    }

    fn copy_list(&self, from: &dyn Node, to: &dyn Node, def: &MetaRef) -> Result<()> {
        let src = match from.child(&ChildRequest {
            meta: def,
            new: false,
        })? {
            Some(src) => src,
            None => return Ok(()),
        };
        let (dst, created) = match self.open(to, def)? {
            Some(opened) => opened,
            None => return Ok(()),
        };
        let r = EditRequest {
            meta: def,
            new: created,
            edit_root: false,
        };
        within_edit(dst.as_ref(), &r, || {
            for entry in Children::entries(src.as_ref(), def.clone()) {
                self.copy_entry(&entry?, dst.as_ref(), def, created)?;
            }
            Ok(())
        })
    }

    fn copy_entry(
        &self,
        entry: &ListEntry,
        dst_list: &dyn Node,
        def: &MetaRef,
        list_is_new: bool,
    ) -> Result<()> {
        let existing = match (&entry.key, list_is_new) {
            (Some(key), false) => find_entry(dst_list, def, key)?,
            _ => None,
        };

        if let Some((_, found)) = existing {
            if self.strategy == Strategy::Insert {
                return Err(NodeError::DuplicateEntry {
                    ident: def.ident().to_string(),
                    key: entry
                        .key
                        .iter()
                        .flatten()
                        .map(ToString::to_string)
                        .collect(),
                });
            }
            let r = EditRequest {
                meta: def,
                new: false,
                edit_root: false,
            };
            return within_edit(found.node.as_ref(), &r, || {
                self.copy(
                    entry.node.as_ref(),
                    found.node.as_ref(),
                    def,
                    def.definitions(),
                    true,
                )
            });
        }

        if self.strategy == Strategy::Update {
            return Ok(());
        }
        let created = dst_list
            .next(&ListRequest {
                meta: def,
                row: 0,
                key: entry.key.as_deref(),
                new: true,
            })?
            .ok_or_else(|| NodeError::BackendRejected {
                op: "next".to_string(),
                reason: format!("node did not create an entry in '{}'", def.ident()),
            })?;
        let r = EditRequest {
            meta: def,
            new: true,
            edit_root: false,
        };
        within_edit(created.node.as_ref(), &r, || {
            self.copy(
                entry.node.as_ref(),
                created.node.as_ref(),
                def,
                def.definitions(),
                false,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::MetaBuilder;
    use crate::node::tree::TreeNode;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records the begin/end/abort sequence it sees
    struct Journal {
        base: NodeRef,
        log: Rc<RefCell<Vec<String>>>,
        reject_end: bool,
    }

    impl Node for Journal {
        fn child(&self, r: &ChildRequest<'_>) -> Result<Option<NodeRef>> {
            self.base.child(r)
        }
        fn next(&self, r: &ListRequest<'_>) -> Result<Option<ListEntry>> {
            self.base.next(r)
        }
        fn field(
            &self,
            r: &crate::node::FieldRequest<'_>,
            hnd: &mut crate::node::ValueHandle,
        ) -> Result<()> {
            self.base.field(r, hnd)
        }
        fn begin_edit(&self, r: &EditRequest<'_>) -> Result<()> {
            self.log.borrow_mut().push("begin".to_string());
            self.base.begin_edit(r)
        }
        fn end_edit(&self, r: &EditRequest<'_>) -> Result<()> {
            self.log.borrow_mut().push("end".to_string());
            if self.reject_end {
                return Err(NodeError::BackendRejected {
                    op: "end_edit".to_string(),
                    reason: "refused".to_string(),
                });
            }
            self.base.end_edit(r)
        }
        fn abort_edit(&self, r: &EditRequest<'_>) -> Result<()> {
            self.log.borrow_mut().push("abort".to_string());
            self.base.abort_edit(r)
        }
    }

    #[test]
    fn test_within_edit_aborts_when_end_rejects() {
        let meta = MetaBuilder::container("c").build().unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        let node = Journal {
            base: TreeNode::new().node(),
            log: log.clone(),
            reject_end: true,
        };
        let r = EditRequest {
            meta: &meta,
            new: false,
            edit_root: true,
        };
        let err = within_edit(&node, &r, || Ok(())).unwrap_err();
        assert!(matches!(err, NodeError::BackendRejected { .. }));
        assert_eq!(*log.borrow(), vec!["begin", "end", "abort"]);
    }

    #[test]
    fn test_within_edit_aborts_when_work_fails() {
        let meta = MetaBuilder::container("c").build().unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        let node = Journal {
            base: TreeNode::new().node(),
            log: log.clone(),
            reject_end: false,
        };
        let r = EditRequest {
            meta: &meta,
            new: false,
            edit_root: true,
        };
        let err = within_edit(&node, &r, || -> Result<()> {
            Err(NodeError::DataNotFound {
                path: "x".to_string(),
            })
        })
        .unwrap_err();
        assert!(matches!(err, NodeError::DataNotFound { .. }));
        assert_eq!(*log.borrow(), vec!["begin", "abort"]);
    }

    #[test]
    fn test_update_skips_missing_entries() {
        let root = MetaBuilder::module("m")
            .definition(
                MetaBuilder::list("birds")
                    .key("name")
                    .definition(MetaBuilder::leaf("name", "string"))
                    .definition(MetaBuilder::leaf("wingspan", "int32")),
            )
            .build()
            .unwrap();
        let src = TreeNode::from_json(json!({"birds": [
            {"name": "robin", "wingspan": 12},
            {"name": "wren", "wingspan": 5}
        ]}));
        let dst = TreeNode::from_json(json!({"birds": [{"name": "robin", "wingspan": 10}]}));
        Editor::new(Strategy::Update)
            .edit(
                src.node().as_ref(),
                dst.node().as_ref(),
                &root,
                root.definitions(),
                false,
            )
            .unwrap();
        assert_eq!(
            dst.to_json(),
            json!({"birds": [{"name": "robin", "wingspan": 12}]})
        );
    }
}
