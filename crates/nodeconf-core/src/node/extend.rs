//! Decorating node
//!
//! `Extend` wraps a base node and lets the caller intercept field access,
//! child lookups and the end of an edit. Each hook receives the base node so
//! it can delegate whatever it does not handle itself.

use super::{ChildRequest, EditRequest, FieldRequest, ListEntry, ListRequest, Node, NodeRef};
use super::{RemoveRequest, ValueHandle};
use crate::errors::Result;
use std::rc::Rc;

type OnField = Box<dyn Fn(&dyn Node, &FieldRequest<'_>, &mut ValueHandle) -> Result<()>>;
type OnChild = Box<dyn Fn(&dyn Node, &ChildRequest<'_>) -> Result<Option<NodeRef>>>;
type OnEndEdit = Box<dyn Fn(&dyn Node, &EditRequest<'_>) -> Result<()>>;

/// Decorator over a base node
///
/// ```
/// use nodeconf_core::meta::MetaBuilder;
/// use nodeconf_core::node::{extend::Extend, read_field, tree::TreeNode};
/// use nodeconf_core::Value;
///
/// let meta = MetaBuilder::container("device")
///     .definition(MetaBuilder::leaf("up", "boolean"))
///     .build()
///     .unwrap();
/// let node = Extend::new(TreeNode::new().node())
///     .on_field(|base, r, hnd| match r.meta.ident() {
///         "up" => {
///             hnd.val = Some(Value::Bool(true));
///             Ok(())
///         }
///         _ => base.field(r, hnd),
///     })
///     .node();
/// let up = meta.resolve("up").unwrap();
/// assert_eq!(read_field(node.as_ref(), &up).unwrap(), Some(Value::Bool(true)));
/// ```
pub struct Extend {
    base: NodeRef,
    on_field: Option<OnField>,
    on_child: Option<OnChild>,
    on_end_edit: Option<OnEndEdit>,
}

impl Extend {
    pub fn new(base: NodeRef) -> Self {
        Self {
            base,
            on_field: None,
            on_child: None,
            on_end_edit: None,
        }
    }

    pub fn on_field<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Node, &FieldRequest<'_>, &mut ValueHandle) -> Result<()> + 'static,
    {
        self.on_field = Some(Box::new(f));
        self
    }

    pub fn on_child<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Node, &ChildRequest<'_>) -> Result<Option<NodeRef>> + 'static,
    {
        self.on_child = Some(Box::new(f));
        self
    }

    pub fn on_end_edit<F>(mut self, f: F) -> Self
    where
        F: Fn(&dyn Node, &EditRequest<'_>) -> Result<()> + 'static,
    {
        self.on_end_edit = Some(Box::new(f));
        self
    }

    pub fn base(&self) -> &NodeRef {
        &self.base
    }

    pub fn node(self) -> NodeRef {
        Rc::new(self)
    }
}

impl Node for Extend {
    fn child(&self, r: &ChildRequest<'_>) -> Result<Option<NodeRef>> {
        match &self.on_child {
            Some(hook) => hook(self.base.as_ref(), r),
            None => self.base.child(r),
        }
    }

    fn next(&self, r: &ListRequest<'_>) -> Result<Option<ListEntry>> {
        self.base.next(r)
    }

    fn field(&self, r: &FieldRequest<'_>, hnd: &mut ValueHandle) -> Result<()> {
        match &self.on_field {
            Some(hook) => hook(self.base.as_ref(), r, hnd),
            None => self.base.field(r, hnd),
        }
    }

    fn remove(&self, r: &RemoveRequest<'_>) -> Result<()> {
        self.base.remove(r)
    }

    fn begin_edit(&self, r: &EditRequest<'_>) -> Result<()> {
        self.base.begin_edit(r)
    }

    fn end_edit(&self, r: &EditRequest<'_>) -> Result<()> {
        match &self.on_end_edit {
            Some(hook) => hook(self.base.as_ref(), r),
            None => self.base.end_edit(r),
        }
    }

    fn abort_edit(&self, r: &EditRequest<'_>) -> Result<()> {
        self.base.abort_edit(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::NodeError;
    use crate::meta::MetaBuilder;
    use crate::node::tree::TreeNode;
    use crate::node::{read_field, write_field};
    use crate::value::Value;
    use serde_json::json;

    #[test]
    fn test_unhandled_fields_delegate_to_base() {
        let meta = MetaBuilder::container("c")
            .definition(MetaBuilder::leaf("label", "string"))
            .definition(MetaBuilder::leaf("virtual", "string"))
            .build()
            .unwrap();
        let tree = TreeNode::from_json(json!({"label": "towhee"}));
        let node = Extend::new(tree.node())
            .on_field(|base, r, hnd| {
                if r.meta.ident() == "virtual" {
                    hnd.val = Some(Value::from("computed"));
                    return Ok(());
                }
                base.field(r, hnd)
            })
            .node();
        assert_eq!(
            read_field(node.as_ref(), &meta.resolve("label").unwrap()).unwrap(),
            Some(Value::from("towhee"))
        );
        assert_eq!(
            read_field(node.as_ref(), &meta.resolve("virtual").unwrap()).unwrap(),
            Some(Value::from("computed"))
        );
    }

    #[test]
    fn test_on_end_edit_rejection_surfaces() {
        let meta = MetaBuilder::container("c")
            .definition(MetaBuilder::leaf("label", "string"))
            .build()
            .unwrap();
        let node = Extend::new(TreeNode::new().node())
            .on_end_edit(|_, _| {
                Err(NodeError::BackendRejected {
                    op: "end_edit".to_string(),
                    reason: "device offline".to_string(),
                })
            })
            .node();
        let r = EditRequest {
            meta: &meta,
            new: false,
            edit_root: true,
        };
        node.begin_edit(&r).unwrap();
        write_field(
            node.as_ref(),
            &meta.resolve("label").unwrap(),
            Some(Value::from("x")),
        )
        .unwrap();
        let err = node.end_edit(&r).unwrap_err();
        assert!(matches!(err, NodeError::BackendRejected { .. }));
    }
}
