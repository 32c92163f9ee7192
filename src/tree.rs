//! Cursor traits over a hierarchical document and root-type resolution.
//!
//! The codec is independent of any concrete markup syntax: everything it
//! needs from a document is expressed by [`TreeReader`] (descend, ascend,
//! read names/attributes/text, annotate errors with the cursor position) and
//! [`TreeWriter`] (the same structure in reverse). Concrete XML/JSON/binary
//! cursors live outside this crate; [`crate::mem`] provides the in-memory
//! reference implementation.

use crate::error::{ConversionError, Error};
use crate::mapper::MapperChain;
use crate::typekey::TypeKey;

/// Attribute carrying an explicit type name on a node, resolved through the
/// mapper chain when the node name itself is not the registered alias.
pub const TYPE_ATTRIBUTE: &str = "class";

/// Pull cursor positioned over a hierarchical node sequence.
pub trait TreeReader {
    /// Name of the node the cursor currently points at.
    fn node_name(&self) -> &str;

    /// Value of the named attribute on the current node, if present.
    fn attribute(&self, name: &str) -> Option<&str>;

    /// Text content of the current node.
    fn text(&self) -> &str;

    /// Whether the current node has children the cursor has not visited yet.
    fn has_more_children(&self) -> bool;

    /// Descend into the next unvisited child of the current node.
    fn move_down(&mut self) -> Result<(), Error>;

    /// Ascend back to the parent node.
    fn move_up(&mut self) -> Result<(), Error>;

    /// Append diagnostics describing the current cursor position.
    ///
    /// Called while a conversion failure is being enriched; implementations
    /// typically add a path and, for textual formats, line information.
    fn append_errors(&self, error: &mut ConversionError) {
        let _ = error;
    }
}

/// Push cursor emitting a hierarchical node sequence.
pub trait TreeWriter {
    /// Open a child node with the given name.
    fn start_node(&mut self, name: &str) -> Result<(), Error>;

    /// Add an attribute to the currently open node.
    fn add_attribute(&mut self, name: &str, value: &str) -> Result<(), Error>;

    /// Set the text content of the currently open node.
    fn set_text(&mut self, text: &str) -> Result<(), Error>;

    /// Close the currently open node.
    fn end_node(&mut self) -> Result<(), Error>;
}

/// Resolve the concrete type to instantiate for the node under the cursor.
///
/// The explicit [`TYPE_ATTRIBUTE`] wins over the node name; either is
/// resolved through the mapper chain's alias table. Fails with
/// [`Error::UnknownAlias`] when neither resolves.
///
/// Called by:
/// - The unmarshalling driver once per document, for the root node.
pub fn read_node_type(reader: &dyn TreeReader, mapper: &MapperChain) -> Result<TypeKey, Error> {
    let name = match reader.attribute(TYPE_ATTRIBUTE) {
        Some(explicit) => explicit,
        None => reader.node_name(),
    };
    mapper
        .type_for_alias(name)
        .ok_or_else(|| Error::UnknownAlias {
            name: name.to_owned(),
        })
}
