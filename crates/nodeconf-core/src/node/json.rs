//! Streaming JSON binders
//!
//! `JsonReader` serves a parsed document read-only, coercing leaf values to
//! their formats as they are read. `JsonWriter` emits compact JSON as the
//! editor walks it, opening objects and arrays on `begin_edit` and closing
//! them on `end_edit`.

use super::{ChildRequest, EditRequest, FieldRequest, ListEntry, ListRequest, Node, NodeRef};
use super::ValueHandle;
use crate::errors::{NodeError, Result};
use crate::meta::{Kind, Meta};
use crate::value::Value;
use serde_json::Value as Json;
use std::cell::RefCell;
use std::io::{Read, Write};
use std::rc::Rc;

/// Child of `here` for a container or list definition; `null` counts as absent
pub(crate) fn lookup_child<'a>(here: &'a Json, meta: &Meta) -> Result<Option<&'a Json>> {
    let found = match here.get(meta.ident()) {
        None | Some(Json::Null) => return Ok(None),
        Some(found) => found,
    };
    let expected = match meta.kind() {
        Kind::List => "array",
        _ => "object",
    };
    let shape_ok = match meta.kind() {
        Kind::List => found.is_array(),
        _ => found.is_object(),
    };
    if !shape_ok {
        return Err(NodeError::TypeMismatch {
            ident: meta.ident().to_string(),
            expected: expected.to_string(),
            reason: "document holds a different shape here".to_string(),
        });
    }
    Ok(Some(found))
}

/// Leaf value of a raw JSON scalar; `null` counts as absent
pub(crate) fn leaf_from_json(meta: &Meta, raw: &Json) -> Result<Option<Value>> {
    if raw.is_null() {
        return Ok(None);
    }
    let format = super::leaf_format(meta)?;
    format.from_json(meta.ident(), raw).map(Some)
}

/// Read-only node over a parsed JSON document
#[derive(Debug, Clone)]
pub struct JsonReader {
    root: Rc<Json>,
    pointer: String,
}

impl JsonReader {
    /// # Errors
    ///
    /// `NodeError::Serialization` when the text is not JSON.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(Self::from_value(serde_json::from_str(text)?))
    }

    /// # Errors
    ///
    /// `NodeError::Serialization` when the stream is not JSON.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(Self::from_value(serde_json::from_reader(reader)?))
    }

    pub fn from_value(value: Json) -> Self {
        Self {
            root: Rc::new(value),
            pointer: String::new(),
        }
    }

    pub fn node(&self) -> NodeRef {
        Rc::new(self.clone())
    }

    fn here(&self) -> Option<&Json> {
        self.root.pointer(&self.pointer)
    }

    fn at(&self, token: &str) -> JsonReader {
        JsonReader {
            root: self.root.clone(),
            pointer: format!("{}/{}", self.pointer, token.replace('~', "~0").replace('/', "~1")),
        }
    }
}

impl Node for JsonReader {
    fn child(&self, r: &ChildRequest<'_>) -> Result<Option<NodeRef>> {
        let found = match self.here() {
            Some(here) => lookup_child(here, r.meta)?.is_some(),
            None => false,
        };
        if found {
            return Ok(Some(self.at(r.meta.ident()).node()));
        }
        if r.new {
            return Err(NodeError::ReadOnly {
                ident: r.meta.ident().to_string(),
            });
        }
        Ok(None)
    }

    fn next(&self, r: &ListRequest<'_>) -> Result<Option<ListEntry>> {
        if r.new {
            return Err(NodeError::ReadOnly {
                ident: r.meta.ident().to_string(),
            });
        }
        let len = self.here().and_then(Json::as_array).map_or(0, Vec::len);
        if r.row >= len {
            return Ok(None);
        }
        Ok(Some(ListEntry {
            node: self.at(&r.row.to_string()).node(),
            key: None,
        }))
    }

    fn field(&self, r: &FieldRequest<'_>, hnd: &mut ValueHandle) -> Result<()> {
        if r.write {
            return Err(NodeError::ReadOnly {
                ident: r.meta.ident().to_string(),
            });
        }
        hnd.val = match self.here().and_then(|here| here.get(r.meta.ident())) {
            Some(raw) => leaf_from_json(r.meta, raw)?,
            None => None,
        };
        Ok(())
    }
}

struct Emitter<W: Write> {
    out: W,
    // one "nothing written yet" flag per open object/array
    first: Vec<bool>,
}

impl<W: Write> Emitter<W> {
    fn raw(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes())?;
        Ok(())
    }

    fn separator(&mut self) -> Result<()> {
        let needs_comma = match self.first.last_mut() {
            Some(first) => !std::mem::replace(first, false),
            None => false,
        };
        if needs_comma {
            self.raw(",")?;
        }
        Ok(())
    }

    fn open(&mut self, token: &str) -> Result<()> {
        self.raw(token)?;
        self.first.push(true);
        Ok(())
    }

    fn close(&mut self, token: &str) -> Result<()> {
        self.first.pop();
        self.raw(token)
    }

    fn member(&mut self, ident: &str) -> Result<()> {
        self.separator()?;
        let name = serde_json::to_string(ident)?;
        self.raw(&name)?;
        self.raw(":")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Root,
    Container,
    List,
    Entry,
}

/// Streaming writer of compact JSON
///
/// ```
/// use nodeconf_core::meta::MetaBuilder;
/// use nodeconf_core::node::json::{JsonReader, JsonWriter};
/// use nodeconf_core::Selection;
///
/// let module = MetaBuilder::module("m")
///     .definition(MetaBuilder::leaf("name", "string"))
///     .build()
///     .unwrap();
/// let input = JsonReader::parse(r#"{"name":"robin"}"#).unwrap();
/// let writer = JsonWriter::new(Vec::new());
/// Selection::new(module, input.node())
///     .unwrap()
///     .insert_into(writer.node())
///     .unwrap();
/// let out = writer.into_inner().unwrap();
/// assert_eq!(String::from_utf8(out).unwrap(), r#"{"name":"robin"}"#);
/// ```
pub struct JsonWriter<W: Write + 'static> {
    emitter: Rc<RefCell<Emitter<W>>>,
}

impl<W: Write + 'static> JsonWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            emitter: Rc::new(RefCell::new(Emitter {
                out,
                first: Vec::new(),
            })),
        }
    }

    /// Root node; the whole document is one object
    pub fn node(&self) -> NodeRef {
        self.at(Position::Root)
    }

    fn at(&self, position: Position) -> NodeRef {
        Rc::new(WriterNode {
            emitter: self.emitter.clone(),
            position,
        })
    }

    /// Flush and hand back the output
    ///
    /// # Errors
    ///
    /// `NodeError::Io` when flushing fails or a node from this writer is
    /// still alive.
    pub fn into_inner(self) -> Result<W> {
        let cell = Rc::try_unwrap(self.emitter)
            .map_err(|_| NodeError::Io("writer nodes are still in use".to_string()))?;
        let mut emitter = cell.into_inner();
        emitter.out.flush()?;
        Ok(emitter.out)
    }
}

/// Write the plain form of a selection's data as compact JSON
///
/// # Errors
///
/// Propagates failures of the underlying edit.
pub fn to_json_string(sel: &crate::selection::Selection) -> Result<String> {
    let writer = JsonWriter::new(Vec::new());
    sel.insert_into(writer.node())?;
    let bytes = writer.into_inner()?;
    String::from_utf8(bytes).map_err(|e| NodeError::Serialization(e.to_string()))
}

struct WriterNode<W: Write + 'static> {
    emitter: Rc<RefCell<Emitter<W>>>,
    position: Position,
}

impl<W: Write + 'static> WriterNode<W> {
    fn spawn(&self, position: Position) -> NodeRef {
        Rc::new(WriterNode {
            emitter: self.emitter.clone(),
            position,
        })
    }
}

impl<W: Write + 'static> Node for WriterNode<W> {
    fn child(&self, r: &ChildRequest<'_>) -> Result<Option<NodeRef>> {
        if !r.new {
            return Ok(None);
        }
        self.emitter.borrow_mut().member(r.meta.ident())?;
        let position = match r.meta.kind() {
            Kind::List => Position::List,
            _ => Position::Container,
        };
        Ok(Some(self.spawn(position)))
    }

    fn next(&self, r: &ListRequest<'_>) -> Result<Option<ListEntry>> {
        if !r.new {
            return Ok(None);
        }
        Ok(Some(ListEntry {
            node: self.spawn(Position::Entry),
            key: r.key.map(<[_]>::to_vec),
        }))
    }

    fn field(&self, r: &FieldRequest<'_>, hnd: &mut ValueHandle) -> Result<()> {
        if !r.write {
            hnd.val = None;
            return Ok(());
        }
        if let Some(v) = &hnd.val {
            let text = serde_json::to_string(&v.to_json())?;
            let mut emitter = self.emitter.borrow_mut();
            emitter.member(r.meta.ident())?;
            emitter.raw(&text)?;
        }
        Ok(())
    }

    fn begin_edit(&self, _r: &EditRequest<'_>) -> Result<()> {
        let mut emitter = self.emitter.borrow_mut();
        match self.position {
            Position::Root | Position::Container => emitter.open("{"),
            Position::List => emitter.open("["),
            Position::Entry => {
                emitter.separator()?;
                emitter.open("{")
            }
        }
    }

    fn end_edit(&self, _r: &EditRequest<'_>) -> Result<()> {
        let mut emitter = self.emitter.borrow_mut();
        match self.position {
            Position::List => emitter.close("]"),
            _ => emitter.close("}"),
        }
    }
}
