//! In-memory tree and the reference implementations of both cursor traits.
use crate::error::{ConversionError, Error};
use crate::tree::{TreeReader, TreeWriter};

/// One element node: name, attributes, text content and child nodes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Node>,
}

impl Node {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Node {
            name: name.into(),
            attributes: Vec::new(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style: attach an attribute.
    pub fn attr<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Builder-style: set the text content.
    pub fn text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = text.into();
        self
    }

    /// Builder-style: append a child node.
    pub fn child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn text_content(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }
}

struct Frame<'a> {
    node: &'a Node,
    next_child: usize,
}

/// Cursor reading an in-memory [`Node`] tree.
///
/// The root frame is stored apart from the descent so the cursor always has
/// somewhere to stand.
pub struct MemReader<'a> {
    root: Frame<'a>,
    descent: Vec<Frame<'a>>,
}

impl<'a> MemReader<'a> {
    pub fn new(root: &'a Node) -> Self {
        MemReader {
            root: Frame {
                node: root,
                next_child: 0,
            },
            descent: Vec::new(),
        }
    }

    fn top(&self) -> &Frame<'a> {
        self.descent.last().unwrap_or(&self.root)
    }

    fn top_mut(&mut self) -> &mut Frame<'a> {
        self.descent.last_mut().unwrap_or(&mut self.root)
    }

    /// Slash-separated node names from the root to the cursor.
    fn path(&self) -> String {
        let mut path = String::new();
        path.push('/');
        path.push_str(&self.root.node.name);
        for frame in &self.descent {
            path.push('/');
            path.push_str(&frame.node.name);
        }
        path
    }
}

impl TreeReader for MemReader<'_> {
    fn node_name(&self) -> &str {
        &self.top().node.name
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.top().node.attribute(name)
    }

    fn text(&self) -> &str {
        &self.top().node.text
    }

    fn has_more_children(&self) -> bool {
        let frame = self.top();
        frame.next_child < frame.node.children.len()
    }

    fn move_down(&mut self) -> Result<(), Error> {
        let frame = self.top_mut();
        let node = frame.node;
        let Some(child) = node.children.get(frame.next_child) else {
            return Err(Error::tree(format!(
                "no more children under `{}`",
                node.name
            )));
        };
        frame.next_child += 1;
        self.descent.push(Frame {
            node: child,
            next_child: 0,
        });
        Ok(())
    }

    fn move_up(&mut self) -> Result<(), Error> {
        if self.descent.pop().is_none() {
            return Err(Error::tree("already at the root node"));
        }
        Ok(())
    }

    fn append_errors(&self, error: &mut ConversionError) {
        error.add("path", self.path());
    }
}

/// Writer assembling an in-memory [`Node`] tree.
#[derive(Default)]
pub struct MemWriter {
    open: Vec<Node>,
    finished: Option<Node>,
}

impl MemWriter {
    pub fn new() -> Self {
        MemWriter::default()
    }

    /// The completed document.
    ///
    /// Fails when nodes are still open or no root was ever written.
    pub fn into_node(self) -> Result<Node, Error> {
        if !self.open.is_empty() {
            return Err(Error::tree("document has unclosed nodes"));
        }
        self.finished
            .ok_or_else(|| Error::tree("document has no root node"))
    }
}

impl TreeWriter for MemWriter {
    fn start_node(&mut self, name: &str) -> Result<(), Error> {
        if self.open.is_empty() && self.finished.is_some() {
            return Err(Error::tree("document already has a root node"));
        }
        self.open.push(Node::new(name));
        Ok(())
    }

    fn add_attribute(&mut self, name: &str, value: &str) -> Result<(), Error> {
        match self.open.last_mut() {
            Some(node) => {
                node.attributes.push((name.to_owned(), value.to_owned()));
                Ok(())
            }
            None => Err(Error::tree("attribute written outside of a node")),
        }
    }

    fn set_text(&mut self, text: &str) -> Result<(), Error> {
        match self.open.last_mut() {
            Some(node) => {
                node.text = text.to_owned();
                Ok(())
            }
            None => Err(Error::tree("text written outside of a node")),
        }
    }

    fn end_node(&mut self) -> Result<(), Error> {
        let Some(node) = self.open.pop() else {
            return Err(Error::tree("end_node without a matching start_node"));
        };
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.finished = Some(node),
        }
        Ok(())
    }
}
