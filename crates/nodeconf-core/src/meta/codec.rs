//! JSON definitions form of the schema
//!
//! The same shape is embedded in snapshot documents and accepted as a schema
//! source on its own:
//!
//! ```json
//! { "ident": "hobbies", "key": ["name"], "definitions": [
//!     { "ident": "name", "leaf": { "ident": "name", "type": { "ident": "string" } } },
//!     { "ident": "favorite", "container": { "ident": "favorite", "definitions": [] } } ] }
//! ```

use super::definition::{Kind, Meta, MetaBuilder, MetaRef};
use crate::errors::{NodeError, Result};
use serde::{Deserialize, Serialize};

/// Body of a container, list or module definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDoc {
    pub ident: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key: Vec<String>,
    #[serde(default)]
    pub definitions: Vec<DefinitionDoc>,
}

/// One entry of a `definitions` array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefinitionDoc {
    pub ident: String,
    #[serde(flatten)]
    pub body: DefinitionBody,
}

/// Kind tag of a definitions entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefinitionBody {
    Leaf(LeafDoc),
    Container(BodyDoc),
    List(BodyDoc),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafDoc {
    pub ident: String,
    #[serde(rename = "type")]
    pub data_type: TypeDoc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDoc {
    pub ident: String,
}

#[derive(Debug, Deserialize)]
struct ModuleDoc {
    module: BodyDoc,
}

/// Body document describing a definition and its subtree
pub fn describe(meta: &Meta) -> BodyDoc {
    BodyDoc {
        ident: meta.ident().to_string(),
        key: meta.key_idents().to_vec(),
        definitions: meta.definitions().iter().map(|d| describe_entry(d)).collect(),
    }
}

fn describe_entry(meta: &Meta) -> DefinitionDoc {
    let body = match meta.kind() {
        Kind::Leaf => DefinitionBody::Leaf(LeafDoc {
            ident: meta.ident().to_string(),
            data_type: TypeDoc {
                ident: meta
                    .data_type()
                    .map(|t| t.ident().to_string())
                    .unwrap_or_default(),
            },
        }),
        Kind::List => DefinitionBody::List(describe(meta)),
        Kind::Container | Kind::Module => DefinitionBody::Container(describe(meta)),
    };
    DefinitionDoc {
        ident: meta.ident().to_string(),
        body,
    }
}

/// Builder for a body document, the root taking the given kind
///
/// # Errors
///
/// Returns `NodeError::InvalidSchema` when an entry's outer ident disagrees
/// with the ident inside its kind body.
pub fn to_builder(doc: &BodyDoc, kind: Kind) -> Result<MetaBuilder> {
    let mut builder = match kind {
        Kind::Module => MetaBuilder::module(&doc.ident),
        Kind::Container => MetaBuilder::container(&doc.ident),
        Kind::List => MetaBuilder::list(&doc.ident),
        Kind::Leaf => {
            return Err(NodeError::InvalidSchema {
                ident: doc.ident.clone(),
                reason: "a definitions body cannot be a leaf".to_string(),
            })
        }
    };
    for key in &doc.key {
        builder = builder.key(key);
    }
    for entry in &doc.definitions {
        builder = builder.definition(entry_builder(entry)?);
    }
    Ok(builder)
}

fn entry_builder(entry: &DefinitionDoc) -> Result<MetaBuilder> {
    let inner_ident = match &entry.body {
        DefinitionBody::Leaf(leaf) => &leaf.ident,
        DefinitionBody::Container(body) | DefinitionBody::List(body) => &body.ident,
    };
    if inner_ident != &entry.ident {
        return Err(NodeError::InvalidSchema {
            ident: entry.ident.clone(),
            reason: format!("body ident '{}' does not match entry ident", inner_ident),
        });
    }
    match &entry.body {
        DefinitionBody::Leaf(leaf) => Ok(MetaBuilder::leaf(&leaf.ident, &leaf.data_type.ident)),
        DefinitionBody::Container(body) => to_builder(body, Kind::Container),
        DefinitionBody::List(body) => to_builder(body, Kind::List),
    }
}

/// Load a module from its JSON definitions form, `{"module": {...}}`
///
/// # Errors
///
/// Returns `NodeError::Serialization` for documents that do not parse and
/// `NodeError::InvalidSchema` for structurally invalid definitions.
pub fn load_module(json: &str) -> Result<MetaRef> {
    let doc: ModuleDoc = serde_json::from_str(json)?;
    to_builder(&doc.module, Kind::Module)?.build()
}
