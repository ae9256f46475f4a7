use std::fmt;
use thiserror::Error;

/// Why a document operation could not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("document has no head element")]
    NoHead,
    #[error("document handle is detached")]
    Detached,
    #[error("node is no longer in the document")]
    UnknownNode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A `<link>` element whose `rel` contains "icon".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconLink {
    pub id: NodeId,
    pub rel: String,
    /// Resolved against the document location, as the `href` property reads.
    pub href: String,
    pub attributes: Vec<(String, String)>,
}

impl IconLink {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A `<link>` to be appended to the document head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpec {
    pub rel: String,
    pub href: String,
    pub attributes: Vec<(String, String)>,
}

impl LinkSpec {
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }
}

/// Element node added to the document subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedNode {
    pub tag: String,
    pub rel: Option<String>,
}

impl AddedNode {
    pub fn is_icon_link(&self) -> bool {
        self.tag.eq_ignore_ascii_case("link")
            && self
                .rel
                .as_deref()
                .is_some_and(|rel| rel.to_ascii_lowercase().contains("icon"))
    }
}

/// One child-list change in the document subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationRecord {
    pub added: Vec<AddedNode>,
    pub removed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    /// `pushState`-style forward navigation.
    Push,
    /// `replaceState`-style rewrite of the current entry.
    Replace,
    /// Back/forward traversal.
    Traverse,
}

pub type MutationCallback = Box<dyn Fn(&[MutationRecord])>;
pub type NavigationListener = Box<dyn Fn(NavigationKind)>;

/// The slice of a live document the controller works against.
///
/// Handles are shared and single-threaded, so every method takes `&self`.
/// Implementations may deliver mutation records to observers synchronously,
/// from inside `append_link` / `remove_link`.
pub trait Document {
    fn location(&self) -> Result<String, DomError>;
    fn has_head(&self) -> bool;
    /// Every `<link>` whose `rel` contains "icon", in document order.
    fn icon_links(&self) -> Result<Vec<IconLink>, DomError>;
    fn append_link(&self, link: &LinkSpec) -> Result<NodeId, DomError>;
    fn remove_link(&self, id: NodeId) -> Result<(), DomError>;
    /// Subscribes to child-list mutations of the whole document subtree.
    fn observe(&self, callback: MutationCallback) -> Result<(), DomError>;
}

/// Same-document navigation notifications offered by the embedding layer.
pub trait NavigationSource {
    fn subscribe(&self, listener: NavigationListener) -> Result<(), DomError>;
}
