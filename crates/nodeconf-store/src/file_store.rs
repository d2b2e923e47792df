//! File-backed persistence of selections
//!
//! Each namespace/module pair maps to one document,
//! `<var_dir>/<namespace>:<module>.json`, holding the plain data of the
//! selection that was written there. Writes replace the whole document.

use crate::atomic::atomic_write;
use crate::config::StoreConfig;
use crate::errors::{document_missing, from_node, invalid_name, io_error, serialization_error};
use crate::errors::Result;
use nodeconf_core::node::json::JsonReader;
use nodeconf_core::node::tree::TreeNode;
use nodeconf_core::{log_op_end, log_op_error, log_op_start, MetaRef, Selection};
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Directory of JSON documents keyed by namespace and module
#[derive(Debug, Clone)]
pub struct FileStore {
    var_dir: PathBuf,
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn check_name(op: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid_name(op, name, "name is empty"));
    }
    if name.contains(['/', '\\', ':']) || name == "." || name == ".." {
        return Err(invalid_name(op, name, "name may not contain '/', '\\' or ':'"));
    }
    Ok(())
}

impl FileStore {
    pub fn new(var_dir: impl Into<PathBuf>) -> Self {
        Self {
            var_dir: var_dir.into(),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.var_dir.clone())
    }

    pub fn var_dir(&self) -> &Path {
        &self.var_dir
    }

    /// Location of the document for `namespace` and `module`
    pub fn path_for(&self, namespace: &str, module: &str) -> PathBuf {
        self.var_dir.join(format!("{}:{}.json", namespace, module))
    }

    /// Store the data of `sel`, replacing any previous document
    ///
    /// # Errors
    ///
    /// `ERR_INVALID_PATH` for unusable names, engine errors raised while
    /// reading `sel`, and `ERR_IO` when the document cannot be written.
    pub fn write(&self, namespace: &str, module: &str, sel: &Selection) -> Result<()> {
        log_op_start!("file_store_write", namespace = namespace, module = module);
        let start = Instant::now();

        self.write_impl(namespace, module, sel).map_err(|e| {
            log_op_error!(
                "file_store_write",
                e.clone(),
                duration_ms = elapsed_ms(start),
                namespace = namespace,
                module = module
            );
            e
        })?;

        log_op_end!(
            "file_store_write",
            duration_ms = elapsed_ms(start),
            namespace = namespace,
            module = module
        );
        Ok(())
    }

    fn write_impl(&self, namespace: &str, module: &str, sel: &Selection) -> Result<()> {
        const OP: &str = "file_store_write";
        check_name(OP, namespace)?;
        check_name(OP, module)?;

        let tree = TreeNode::new();
        sel.insert_into(tree.node()).map_err(|e| from_node(OP, e))?;
        let mut text =
            serde_json::to_string_pretty(&tree.to_json()).map_err(|e| serialization_error(OP, e))?;
        text.push('\n');

        atomic_write(&self.path_for(namespace, module), text.as_bytes())
    }

    fn open(&self, op: &str, namespace: &str, module: &str) -> Result<JsonReader> {
        check_name(op, namespace)?;
        check_name(op, module)?;
        let path = self.path_for(namespace, module);
        let file = File::open(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => document_missing(op, &path),
            _ => io_error(op, e),
        })?;
        JsonReader::from_reader(BufReader::new(file)).map_err(|e| from_node(op, e))
    }

    /// Selection over the stored document, read-only
    ///
    /// # Errors
    ///
    /// `ERR_NOT_FOUND` when nothing was written for the pair, `ERR_IO` or
    /// `ERR_SERIALIZATION` when the document cannot be loaded.
    pub fn read(&self, namespace: &str, module: &str, meta: MetaRef) -> Result<Selection> {
        log_op_start!("file_store_read", namespace = namespace, module = module);
        let start = Instant::now();

        let sel = self
            .open("file_store_read", namespace, module)
            .and_then(|reader| {
                Selection::new(meta, reader.node()).map_err(|e| from_node("file_store_read", e))
            })
            .map_err(|e| {
                log_op_error!(
                    "file_store_read",
                    e.clone(),
                    duration_ms = elapsed_ms(start),
                    namespace = namespace,
                    module = module
                );
                e
            })?;

        log_op_end!(
            "file_store_read",
            duration_ms = elapsed_ms(start),
            namespace = namespace,
            module = module
        );
        Ok(sel)
    }

    /// Merge the stored document into a live selection
    ///
    /// # Errors
    ///
    /// As for [`FileStore::read`], plus any edit failure on `sel`.
    pub fn read_into(&self, namespace: &str, module: &str, sel: &Selection) -> Result<()> {
        log_op_start!("file_store_read", namespace = namespace, module = module);
        let start = Instant::now();

        self.open("file_store_read", namespace, module)
            .and_then(|reader| {
                sel.upsert_from(reader.node())
                    .map_err(|e| from_node("file_store_read", e))
            })
            .map_err(|e| {
                log_op_error!(
                    "file_store_read",
                    e.clone(),
                    duration_ms = elapsed_ms(start),
                    namespace = namespace,
                    module = module
                );
                e
            })?;

        log_op_end!(
            "file_store_read",
            duration_ms = elapsed_ms(start),
            namespace = namespace,
            module = module
        );
        Ok(())
    }
}
