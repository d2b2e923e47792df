//! Self-describing snapshots
//!
//! A snapshot carries the schema of the captured subtree next to its data,
//! so it can be restored into a working selection without the module it
//! came from:
//!
//! ```json
//! { "meta": { "list-item": { "ident": "hobbies", "key": ["name"], "definitions": [...] } },
//!   "key": ["birding"],
//!   "data": { "hobbies": [ { "name": "birding", "favorite": { "label": "towhee" } } ] } }
//! ```
//!
//! Restored schema fragments belong to the selection they were restored
//! into and are never registered anywhere else.

use crate::errors::{NodeError, Result};
use crate::meta::codec::{describe, to_builder, BodyDoc};
use crate::meta::{Format, Kind, Meta, MetaBuilder, MetaRef};
use crate::node::tree::TreeNode;
use crate::node::{leaf_format, ChildRequest};
use crate::selection::{Position, Selection};
use crate::value::Value;
use crate::{log_op_end, log_op_error, log_op_start};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::io::Read;
use std::time::Instant;

/// Root definition of a snapshot, tagged by what was captured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RootDoc {
    Container(BodyDoc),
    List(BodyDoc),
    ListItem(BodyDoc),
}

impl RootDoc {
    pub fn body(&self) -> &BodyDoc {
        match self {
            RootDoc::Container(body) | RootDoc::List(body) | RootDoc::ListItem(body) => body,
        }
    }
}

/// The `meta` member of a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaSection {
    #[serde(flatten)]
    pub root: RootDoc,
    /// Key values nested here by older producers; read, never written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Vec<Json>>,
}

/// A complete snapshot document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub meta: MetaSection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Vec<Json>>,
    pub data: Map<String, Json>,
}

impl SnapshotDocument {
    /// Compact JSON text of the document
    ///
    /// # Errors
    ///
    /// `NodeError::Serialization` if encoding fails.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a document from JSON text
    ///
    /// # Errors
    ///
    /// `NodeError::Serialization` when the text is not JSON,
    /// `NodeError::MalformedSnapshot` when it is JSON of the wrong shape.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Json = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// # Errors
    ///
    /// `NodeError::MalformedSnapshot` when the value has the wrong shape.
    pub fn from_value(value: Json) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| malformed(e.to_string()))
    }

    /// Key values, wherever the producer put them
    pub fn key_values(&self) -> Option<&[Json]> {
        self.key.as_deref().or(self.meta.key.as_deref())
    }
}

fn malformed(reason: impl Into<String>) -> NodeError {
    NodeError::MalformedSnapshot {
        reason: reason.into(),
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Capture a selection's schema and data in one document
///
/// # Errors
///
/// Any failure reading the selection's data.
pub fn save(sel: &Selection) -> Result<SnapshotDocument> {
    let path = sel.path();
    log_op_start!("snapshot_save", path = path.as_str());
    let start = Instant::now();

    let doc = save_impl(sel).map_err(|e| {
        log_op_error!(
            "snapshot_save",
            e.clone(),
            duration_ms = elapsed_ms(start),
            path = path.as_str()
        );
        e
    })?;

    log_op_end!(
        "snapshot_save",
        duration_ms = elapsed_ms(start),
        path = path.as_str()
    );
    Ok(doc)
}

fn save_impl(sel: &Selection) -> Result<SnapshotDocument> {
    let tree = TreeNode::new();
    sel.insert_into(tree.node())?;
    let plain = tree.to_json();

    let ident = sel.meta().ident().to_string();
    let body = describe(sel.meta());
    let (root, key, value) = match sel.position() {
        Position::Container => (RootDoc::Container(body), None, plain),
        Position::List => {
            let items = plain
                .get(&ident)
                .cloned()
                .unwrap_or_else(|| Json::Array(Vec::new()));
            (RootDoc::List(body), None, items)
        }
        Position::ListItem { key, .. } => (
            RootDoc::ListItem(body),
            key.as_ref()
                .map(|k| k.iter().map(Value::to_json).collect::<Vec<_>>()),
            Json::Array(vec![plain]),
        ),
    };

    let mut data = Map::new();
    data.insert(ident, value);
    Ok(SnapshotDocument {
        meta: MetaSection { root, key: None },
        key,
        data,
    })
}

/// Rebuild a selection from a snapshot document
///
/// Containers restore to a container selection. Lists and list items
/// restore to a whole-list selection; a list item becomes a one-element
/// list holding that entry.
///
/// # Errors
///
/// `NodeError::MalformedSnapshot` for documents whose meta, key or data do
/// not agree, before any data node is built.
pub fn restore(doc: &SnapshotDocument) -> Result<Selection> {
    let ident = doc.meta.root.body().ident.clone();
    log_op_start!("snapshot_restore", ident = ident.as_str());
    let start = Instant::now();

    let sel = restore_impl(doc).map_err(|e| {
        log_op_error!(
            "snapshot_restore",
            e.clone(),
            duration_ms = elapsed_ms(start),
            ident = ident.as_str()
        );
        e
    })?;

    log_op_end!(
        "snapshot_restore",
        duration_ms = elapsed_ms(start),
        ident = ident.as_str()
    );
    Ok(sel)
}

/// Parse and restore a snapshot from JSON text
///
/// # Errors
///
/// See [`SnapshotDocument::from_json_str`] and [`restore`].
pub fn restore_str(text: &str) -> Result<Selection> {
    restore(&SnapshotDocument::from_json_str(text)?)
}

/// Parse and restore a snapshot from a byte stream
///
/// # Errors
///
/// See [`restore_str`].
pub fn restore_reader<R: Read>(reader: R) -> Result<Selection> {
    let value: Json = serde_json::from_reader(reader)?;
    restore(&SnapshotDocument::from_value(value)?)
}

fn restore_impl(doc: &SnapshotDocument) -> Result<Selection> {
    let body = doc.meta.root.body();
    let ident = body.ident.as_str();
    let data = doc
        .data
        .get(ident)
        .ok_or_else(|| malformed(format!("data has no member '{}'", ident)))?;
    let key = doc.key_values();

    if let RootDoc::Container(body) = &doc.meta.root {
        if key.is_some() {
            return Err(malformed("container snapshots carry no key"));
        }
        if !data.is_object() {
            return Err(malformed(format!("data for container '{}' is not an object", ident)));
        }
        let meta = to_builder(body, Kind::Container)
            .and_then(MetaBuilder::build_fragment)
            .map_err(|e| malformed(e.to_string()))?;
        return Selection::new(meta, TreeNode::from_json(data.clone()).node());
    }

    let is_item = matches!(doc.meta.root, RootDoc::ListItem(_));
    let wrapper = MetaBuilder::container(ident)
        .definition(to_builder(body, Kind::List).map_err(|e| malformed(e.to_string()))?)
        .build_fragment()
        .map_err(|e| malformed(e.to_string()))?;
    let list = wrapper.resolve(ident)?;

    let entries = match data {
        Json::Array(items) => items.clone(),
        Json::Object(_) if is_item => vec![data.clone()],
        _ => {
            return Err(malformed(format!(
                "data for list '{}' is not an array",
                ident
            )))
        }
    };
    if is_item || key.is_some() {
        check_keyed_entry(&list, key.unwrap_or(&[]), &entries)?;
    }

    let mut root = Map::new();
    root.insert(ident.to_string(), Json::Array(entries));
    let tree = TreeNode::from_json(Json::Object(root));
    let list_node = tree
        .node()
        .child(&ChildRequest {
            meta: &list,
            new: false,
        })?
        .ok_or_else(|| malformed("restored list is missing"))?;
    let parent = Selection::new(wrapper, tree.node())?;
    Ok(Selection::whole_list(list, list_node, parent))
}

/// A keyed snapshot holds exactly the one entry its key names
fn check_keyed_entry(list: &MetaRef, key: &[Json], entries: &[Json]) -> Result<()> {
    let declared = list.key_metas();
    if key.len() != declared.len() {
        return Err(malformed(format!(
            "key has {} value(s) but list '{}' declares {}",
            key.len(),
            list.ident(),
            declared.len()
        )));
    }
    let entry = match entries {
        [entry] => entry,
        _ => {
            return Err(malformed(format!(
                "a keyed snapshot holds one entry, found {}",
                entries.len()
            )))
        }
    };
    for (meta, raw) in declared.iter().zip(key) {
        let expected = key_value(meta, raw)?;
        let actual = entry
            .get(meta.ident())
            .map(|v| key_value(meta, v))
            .transpose()?;
        match actual {
            Some(actual) if actual.key_eq(&expected) => {}
            _ => {
                return Err(malformed(format!(
                    "entry does not carry key {}={}",
                    meta.ident(),
                    expected
                )))
            }
        }
    }
    Ok(())
}

/// Key value from JSON; numeric keys may arrive as text
fn key_value(meta: &Meta, raw: &Json) -> Result<Value> {
    let format = leaf_format(meta)?;
    let parsed = match raw {
        Json::String(text) if format != Format::String => format.parse(meta.ident(), text),
        _ => format.from_json(meta.ident(), raw),
    };
    parsed.map_err(|e| malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_meta_section_shape() {
        let doc = SnapshotDocument::from_value(json!({
            "meta": {"list": {"ident": "l", "definitions": []}, "key": ["a"]},
            "data": {"l": []}
        }))
        .unwrap();
        assert!(matches!(doc.meta.root, RootDoc::List(_)));
        assert_eq!(doc.key_values(), Some(&[json!("a")][..]));
    }

    #[test]
    fn test_unknown_kind_tag_is_malformed() {
        let err = SnapshotDocument::from_value(json!({
            "meta": {"choice": {"ident": "c"}},
            "data": {}
        }))
        .unwrap_err();
        assert!(matches!(err, NodeError::MalformedSnapshot { .. }));
    }

    #[test]
    fn test_missing_data_is_malformed() {
        let err = SnapshotDocument::from_value(json!({
            "meta": {"container": {"ident": "c"}}
        }))
        .unwrap_err();
        assert!(matches!(err, NodeError::MalformedSnapshot { .. }));
    }

    #[test]
    fn test_numeric_key_accepts_text() {
        let list = MetaBuilder::list("birds")
            .key("id")
            .definition(MetaBuilder::leaf("id", "uint32"))
            .build()
            .unwrap();
        check_keyed_entry(&list, &[json!("7")], &[json!({"id": 7})]).unwrap();
        check_keyed_entry(&list, &[json!(7)], &[json!({"id": 7})]).unwrap();
        assert!(check_keyed_entry(&list, &[json!(8)], &[json!({"id": 7})]).is_err());
    }
}
