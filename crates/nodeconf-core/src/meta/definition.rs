//! Schema definitions and the validating builder

use super::format::{DataType, Format};
use crate::errors::{NodeError, Result};
use std::collections::HashSet;
use std::sync::Arc;

/// Shared handle to an immutable definition
pub type MetaRef = Arc<Meta>;

/// Structural kind of a definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Module,
    Container,
    List,
    Leaf,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Module => "module",
            Kind::Container => "container",
            Kind::List => "list",
            Kind::Leaf => "leaf",
        }
    }
}

/// One node of the resolved schema tree
///
/// Child definitions keep their declaration order, which is the order every
/// traversal visits them in.
#[derive(Debug, PartialEq)]
pub struct Meta {
    ident: String,
    kind: Kind,
    definitions: Vec<MetaRef>,
    keys: Vec<String>,
    data_type: Option<DataType>,
}

impl Meta {
    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn definitions(&self) -> &[MetaRef] {
        &self.definitions
    }

    /// Child definition by ident
    pub fn find(&self, ident: &str) -> Option<&MetaRef> {
        self.definitions.iter().find(|d| d.ident == ident)
    }

    /// Child definition by ident
    ///
    /// # Errors
    ///
    /// Returns `NodeError::SchemaNotFound` naming this definition and the
    /// requested ident when no child matches.
    pub fn resolve(&self, ident: &str) -> Result<MetaRef> {
        self.find(ident)
            .cloned()
            .ok_or_else(|| NodeError::SchemaNotFound {
                parent: self.ident.clone(),
                ident: ident.to_string(),
            })
    }

    /// Declared key idents of a list, in declaration order
    pub fn key_idents(&self) -> &[String] {
        &self.keys
    }

    /// Key leaf definitions of a list, in declaration order
    pub fn key_metas(&self) -> Vec<MetaRef> {
        self.keys
            .iter()
            .filter_map(|k| self.find(k).cloned())
            .collect()
    }

    pub fn data_type(&self) -> Option<&DataType> {
        self.data_type.as_ref()
    }

    /// Format of a leaf's type; `None` for structural definitions
    pub fn format(&self) -> Option<Format> {
        self.data_type.as_ref().map(DataType::format)
    }

    pub fn is_list(&self) -> bool {
        self.kind == Kind::List
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == Kind::Leaf
    }

    /// Whether `ident` names one of this list's key leaves
    pub fn is_key(&self, ident: &str) -> bool {
        self.keys.iter().any(|k| k == ident)
    }
}

/// Builder for schema trees
///
/// ```
/// use nodeconf_core::meta::MetaBuilder;
///
/// let module = MetaBuilder::module("test")
///     .definition(
///         MetaBuilder::list("hobbies")
///             .key("name")
///             .definition(MetaBuilder::leaf("name", "string")),
///     )
///     .build()
///     .unwrap();
/// assert_eq!(module.resolve("hobbies").unwrap().key_idents(), ["name"]);
/// ```
#[derive(Debug, Clone)]
pub struct MetaBuilder {
    ident: String,
    kind: Kind,
    definitions: Vec<MetaBuilder>,
    keys: Vec<String>,
    type_ident: Option<String>,
}

impl MetaBuilder {
    fn with_kind(ident: impl Into<String>, kind: Kind) -> Self {
        Self {
            ident: ident.into(),
            kind,
            definitions: Vec::new(),
            keys: Vec::new(),
            type_ident: None,
        }
    }

    pub fn module(ident: impl Into<String>) -> Self {
        Self::with_kind(ident, Kind::Module)
    }

    pub fn container(ident: impl Into<String>) -> Self {
        Self::with_kind(ident, Kind::Container)
    }

    pub fn list(ident: impl Into<String>) -> Self {
        Self::with_kind(ident, Kind::List)
    }

    pub fn leaf(ident: impl Into<String>, type_ident: impl Into<String>) -> Self {
        let mut b = Self::with_kind(ident, Kind::Leaf);
        b.type_ident = Some(type_ident.into());
        b
    }

    /// Append a key ident (lists only)
    pub fn key(mut self, ident: impl Into<String>) -> Self {
        self.keys.push(ident.into());
        self
    }

    /// Append a child definition
    pub fn definition(mut self, child: MetaBuilder) -> Self {
        self.definitions.push(child);
        self
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Validate and freeze the tree
    ///
    /// Every list must declare at least one key.
    ///
    /// # Errors
    ///
    /// Returns `NodeError::InvalidSchema` naming the first offending
    /// definition.
    pub fn build(self) -> Result<MetaRef> {
        self.freeze(true, true)
    }

    /// Validate and freeze a detached fragment; keyless lists are accepted
    pub(crate) fn build_fragment(self) -> Result<MetaRef> {
        self.freeze(true, false)
    }

    fn freeze(self, is_root: bool, require_keys: bool) -> Result<MetaRef> {
        let invalid = |reason: String| NodeError::InvalidSchema {
            ident: if self.ident.is_empty() {
                "<empty>".to_string()
            } else {
                self.ident.clone()
            },
            reason,
        };

        if self.ident.is_empty() {
            return Err(invalid("ident must not be empty".to_string()));
        }
        if self.kind == Kind::Module && !is_root {
            return Err(invalid("modules may only appear at the root".to_string()));
        }
        if self.kind != Kind::List && !self.keys.is_empty() {
            return Err(invalid(format!(
                "only lists declare keys, found key on {}",
                self.kind.as_str()
            )));
        }

        let mut seen = HashSet::new();
        for child in &self.definitions {
            if !seen.insert(child.ident.as_str()) {
                return Err(invalid(format!("duplicate child ident '{}'", child.ident)));
            }
        }

        let data_type = match self.kind {
            Kind::Leaf => {
                if !self.definitions.is_empty() {
                    return Err(invalid("leaves have no child definitions".to_string()));
                }
                let type_ident = self
                    .type_ident
                    .as_deref()
                    .ok_or_else(|| invalid("leaf has no type".to_string()))?;
                Some(DataType::resolve(&self.ident, type_ident)?)
            }
            _ => None,
        };

        if self.kind == Kind::List {
            if require_keys && self.keys.is_empty() {
                return Err(invalid("list declares no key".to_string()));
            }
            let mut seen_keys = HashSet::new();
            for key in &self.keys {
                if !seen_keys.insert(key.as_str()) {
                    return Err(invalid(format!("duplicate key '{}'", key)));
                }
                let names_leaf = self
                    .definitions
                    .iter()
                    .any(|d| &d.ident == key && d.kind == Kind::Leaf);
                if !names_leaf {
                    return Err(invalid(format!("key '{}' does not name a child leaf", key)));
                }
            }
        }

        let definitions = self
            .definitions
            .into_iter()
            .map(|d| d.freeze(false, require_keys))
            .collect::<Result<Vec<_>>>()?;

        Ok(Arc::new(Meta {
            ident: self.ident,
            kind: self.kind,
            definitions,
            keys: self.keys,
            data_type,
        }))
    }
}
