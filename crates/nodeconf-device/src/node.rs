//! The `call-home` container as a data node
//!
//! Options are served reflectively; `registered` is computed. An edit that
//! reaches `end_edit` commits the staged options and re-registers with
//! them. If registration fails the previous options come back and the edit
//! is rejected.

use crate::call_home::CallHome;
use nodeconf_core::meta::MetaBuilder;
use nodeconf_core::node::extend::Extend;
use nodeconf_core::node::reflect::Reflect;
use nodeconf_core::{Meta, MetaRef, NodeError, NodeRef, Result, Value};
use std::rc::Rc;

const REGISTERED: &str = "registered";

/// Schema of the `call-home` container
///
/// # Errors
///
/// Never in practice; the definition is fixed.
pub fn call_home_meta() -> Result<MetaRef> {
    MetaBuilder::container("call-home")
        .definition(MetaBuilder::leaf("device-id", "string"))
        .definition(MetaBuilder::leaf("address", "string"))
        .definition(MetaBuilder::leaf("endpoint", "string"))
        .definition(MetaBuilder::leaf("update-frequency-ms", "uint64"))
        .definition(MetaBuilder::leaf(REGISTERED, "boolean"))
        .build()
}

/// Data node for `ch` shaped by `meta`
///
/// # Errors
///
/// `NodeError::InvalidSchema` when a leaf of `meta` other than
/// `registered` has no matching option.
pub fn call_home_node(ch: &Rc<CallHome>, meta: &Meta) -> Result<NodeRef> {
    let base = Reflect::new(ch.options.clone(), meta, &[REGISTERED])?;

    let status = Rc::clone(ch);
    let apply = Rc::clone(ch);
    let node = Extend::new(Rc::new(base))
        .on_field(move |base, r, hnd| {
            if r.meta.ident() != REGISTERED {
                return base.field(r, hnd);
            }
            if r.write {
                return Err(NodeError::ReadOnly {
                    ident: REGISTERED.to_string(),
                });
            }
            hnd.val = Some(Value::Bool(status.registered()));
            Ok(())
        })
        .on_end_edit(move |base, r| {
            let previous = apply.options();
            base.end_edit(r)?;
            apply.apply_options(apply.options()).map_err(|e| {
                *apply.options.borrow_mut() = previous;
                NodeError::BackendRejected {
                    op: "call_home_apply".to_string(),
                    reason: e.to_string(),
                }
            })
        })
        .node();
    Ok(node)
}
