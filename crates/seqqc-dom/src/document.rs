//! Arena-backed document tree
//!
//! Elements are addressed by [`NodeId`] handles into an arena owned by the
//! [`Document`]. Removing an element detaches it; the arena never shrinks,
//! so handles stay valid (but detached elements are invisible to queries).

use crate::error::DomError;
use crate::selector::Selector;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Document shared between the controls of one page
pub type SharedDocument = Arc<Mutex<Document>>;

/// Wrap a document for sharing
#[inline]
#[must_use]
pub fn shared(document: Document) -> SharedDocument {
    Arc::new(Mutex::new(document))
}

/// Handle of an element in a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attributes: IndexMap<String, String>,
    styles: IndexMap<String, String>,
    text: String,
    hidden: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            id: None,
            classes: Vec::new(),
            attributes: IndexMap::new(),
            styles: IndexMap::new(),
            text: String::new(),
            hidden: false,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// In-memory document
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Element>,
    root: NodeId,
    title: String,
}

impl Document {
    /// Create an empty document with a `body` root
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Element::new("body")],
            root: NodeId(0),
            title: String::new(),
        }
    }

    /// Root element
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Page title
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Set the page title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    // ---- tree ----

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.push(Element::new(tag));
        NodeId(self.nodes.len() - 1)
    }

    /// Create an element and append it to `parent`
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let node = self.create_element(tag);
        self.append_child(parent, node);
        node
    }

    /// Append `child` as last child of `parent`, moving it if attached
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `node` right before `reference` among its siblings
    ///
    /// # Errors
    /// `DomError::Detached` if `reference` has no parent.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) -> Result<(), DomError> {
        let parent = self.nodes[reference.0]
            .parent
            .ok_or(DomError::Detached(reference))?;
        self.detach(node);
        let siblings = &mut self.nodes[parent.0].children;
        let index = siblings
            .iter()
            .position(|c| *c == reference)
            .unwrap_or(siblings.len());
        siblings.insert(index, node);
        self.nodes[node.0].parent = Some(parent);
        Ok(())
    }

    /// Remove `node` (and its subtree) from the tree
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != node);
        }
    }

    /// Remove every child of `node`
    pub fn remove_children(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.nodes[node.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
        self.nodes[node.0].text.clear();
    }

    /// Parent element
    #[inline]
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// Child elements in order
    #[inline]
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Check if the element is reachable from the root
    #[must_use]
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == self.root {
                return true;
            }
            current = self.nodes[n.0].parent;
        }
        false
    }

    /// Descendants of `node` in document (preorder) order, excluding `node`
    #[must_use]
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[node.0].children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.nodes[n.0].children.iter().rev().copied());
        }
        out
    }

    /// Nearest element with `tag`, starting at `node` itself
    #[must_use]
    pub fn closest(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(n) = current {
            if self.nodes[n.0].tag.eq_ignore_ascii_case(tag) {
                return Some(n);
            }
            current = self.nodes[n.0].parent;
        }
        None
    }

    /// Attached element carrying `id`
    #[must_use]
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .find(|n| self.nodes[n.0].id.as_deref() == Some(id))
    }

    /// Attached element carrying `id`, as an error when missing
    ///
    /// # Errors
    /// `DomError::MissingElement` if no element has this id.
    pub fn require_element_by_id(&self, id: &str) -> Result<NodeId, DomError> {
        self.get_element_by_id(id)
            .ok_or_else(|| DomError::MissingElement(id.to_string()))
    }

    /// Descendants of `scope` carrying `class`
    #[must_use]
    pub fn find_by_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| self.has_class(*n, class))
            .collect()
    }

    /// Direct children of `node` carrying `class`
    #[must_use]
    pub fn children_with_class(&self, node: NodeId, class: &str) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|c| self.has_class(*c, class))
            .collect()
    }

    /// Descendants of `scope` matching `selector`, in document order
    #[must_use]
    pub fn select(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| selector.matches(self, *n))
            .collect()
    }

    /// Parse `selector` and match it against the whole document
    ///
    /// # Errors
    /// `DomError::InvalidSelector` if the selector text cannot be parsed.
    pub fn query(&self, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let selector = Selector::parse(selector)?;
        Ok(self.select(self.root, &selector))
    }

    // ---- element data ----

    /// Tag name (lower case)
    #[inline]
    #[must_use]
    pub fn tag(&self, node: NodeId) -> &str {
        &self.nodes[node.0].tag
    }

    /// Element id
    #[inline]
    #[must_use]
    pub fn id(&self, node: NodeId) -> Option<&str> {
        self.nodes[node.0].id.as_deref()
    }

    /// Set the element id
    pub fn set_id(&mut self, node: NodeId, id: impl Into<String>) {
        self.nodes[node.0].id = Some(id.into());
    }

    /// Classes in the order they were added
    #[inline]
    #[must_use]
    pub fn classes(&self, node: NodeId) -> &[String] {
        &self.nodes[node.0].classes
    }

    /// Check for a class
    #[must_use]
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes[node.0].classes.iter().any(|c| c == class)
    }

    /// Add a class unless already present
    pub fn add_class(&mut self, node: NodeId, class: &str) {
        if !self.has_class(node, class) {
            self.nodes[node.0].classes.push(class.to_string());
        }
    }

    /// Remove a class
    pub fn remove_class(&mut self, node: NodeId, class: &str) {
        self.nodes[node.0].classes.retain(|c| c != class);
    }

    /// Remove every class for which `predicate` holds, returning them
    pub fn remove_classes_where<F>(&mut self, node: NodeId, predicate: F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        let (removed, kept) = std::mem::take(&mut self.nodes[node.0].classes)
            .into_iter()
            .partition(|c| predicate(c));
        self.nodes[node.0].classes = kept;
        removed
    }

    /// Attribute value
    #[must_use]
    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        match name {
            "id" => self.id(node),
            _ => self.nodes[node.0].attributes.get(name).map(String::as_str),
        }
    }

    /// Set an attribute
    pub fn set_attr(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        if name == "id" {
            self.set_id(node, value);
        } else {
            self.nodes[node.0]
                .attributes
                .insert(name.to_string(), value.into());
        }
    }

    /// Remove an attribute
    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        self.nodes[node.0].attributes.shift_remove(name);
    }

    /// Inline style property
    #[must_use]
    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.nodes[node.0].styles.get(property).map(String::as_str)
    }

    /// Set an inline style property; an empty value removes it
    pub fn set_style(&mut self, node: NodeId, property: &str, value: &str) {
        let styles = &mut self.nodes[node.0].styles;
        if value.is_empty() {
            styles.shift_remove(property);
        } else {
            styles.insert(property.to_string(), value.to_string());
        }
    }

    /// Own text of the element
    #[inline]
    #[must_use]
    pub fn text(&self, node: NodeId) -> &str {
        &self.nodes[node.0].text
    }

    /// Set the own text of the element
    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) {
        self.nodes[node.0].text = text.into();
    }

    /// Text of the element and its subtree, concatenated in document order
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        std::iter::once(node)
            .chain(self.descendants(node))
            .map(|n| self.nodes[n.0].text.as_str())
            .collect()
    }

    /// Check if the element is hidden
    #[inline]
    #[must_use]
    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.nodes[node.0].hidden
    }

    /// Show or hide the element
    pub fn set_hidden(&mut self, node: NodeId, hidden: bool) {
        self.nodes[node.0].hidden = hidden;
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
