use super::to_absolute_url;
use super::types::{
    AddedNode, Document, DomError, IconLink, LinkSpec, MutationCallback, MutationRecord,
    NavigationKind, NavigationListener, NavigationSource, NodeId,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use url::Url;

#[derive(Debug, Clone)]
struct Node {
    id: NodeId,
    tag: String,
    rel: Option<String>,
    href: Option<String>,
    attributes: Vec<(String, String)>,
}

#[derive(Debug)]
struct PageState {
    location: String,
    history: Vec<String>,
    has_head: bool,
    detached: bool,
    nodes: Vec<Node>,
    next_id: u64,
}

/// In-memory document with a head, a location and a session history.
///
/// Mutation observers run synchronously inside the mutating call, which is the
/// harshest delivery order a controller can face. History methods change the
/// location without a reload and notify navigation listeners afterwards.
pub struct MemoryPage {
    state: RefCell<PageState>,
    observers: RefCell<Vec<Rc<dyn Fn(&[MutationRecord])>>>,
    listeners: RefCell<Vec<Rc<dyn Fn(NavigationKind)>>>,
    appended_links: Cell<usize>,
}

impl MemoryPage {
    pub fn new(location: impl Into<String>) -> Self {
        let location = location.into();
        Self {
            state: RefCell::new(PageState {
                history: vec![location.clone()],
                location,
                has_head: true,
                detached: false,
                nodes: Vec::new(),
                next_id: 1,
            }),
            observers: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
            appended_links: Cell::new(0),
        }
    }

    pub fn without_head(self) -> Self {
        self.state.borrow_mut().has_head = false;
        self
    }

    pub fn detach(&self) {
        self.state.borrow_mut().detached = true;
    }

    pub fn remove_head(&self) {
        let mut state = self.state.borrow_mut();
        state.has_head = false;
        state.nodes.clear();
    }

    /// Number of `<link>` elements ever appended, by anyone.
    pub fn appended_links(&self) -> usize {
        self.appended_links.get()
    }

    pub fn history(&self) -> Vec<String> {
        self.state.borrow().history.clone()
    }

    /// Appends a non-link element, e.g. a script or a div.
    pub fn append_element(&self, tag: &str) -> Result<NodeId, DomError> {
        let id = self.insert(Node {
            id: NodeId(0),
            tag: tag.to_string(),
            rel: None,
            href: None,
            attributes: Vec::new(),
        })?;
        self.notify(&[MutationRecord {
            added: vec![AddedNode {
                tag: tag.to_string(),
                rel: None,
            }],
            removed: 0,
        }]);
        Ok(id)
    }

    pub fn push_state(&self, url: &str) -> Result<(), DomError> {
        self.navigate(url, NavigationKind::Push)
    }

    pub fn replace_state(&self, url: &str) -> Result<(), DomError> {
        self.navigate(url, NavigationKind::Replace)
    }

    /// Back/forward to an entry already in the history.
    pub fn traverse(&self, url: &str) -> Result<(), DomError> {
        self.navigate(url, NavigationKind::Traverse)
    }

    fn navigate(&self, url: &str, kind: NavigationKind) -> Result<(), DomError> {
        {
            let mut state = self.state.borrow_mut();
            if state.detached {
                return Err(DomError::Detached);
            }
            let target = Url::parse(&state.location)
                .and_then(|base| base.join(url))
                .map(String::from)
                .unwrap_or_else(|_| url.to_string());
            match kind {
                NavigationKind::Push => state.history.push(target.clone()),
                NavigationKind::Replace => {
                    if let Some(current) = state.history.last_mut() {
                        *current = target.clone();
                    }
                }
                NavigationKind::Traverse => {}
            }
            state.location = target;
        }
        let listeners: Vec<_> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(kind);
        }
        Ok(())
    }

    fn insert(&self, mut node: Node) -> Result<NodeId, DomError> {
        let mut state = self.state.borrow_mut();
        if state.detached {
            return Err(DomError::Detached);
        }
        if !state.has_head {
            return Err(DomError::NoHead);
        }
        node.id = NodeId(state.next_id);
        state.next_id += 1;
        let id = node.id;
        state.nodes.push(node);
        Ok(id)
    }

    fn notify(&self, records: &[MutationRecord]) {
        // Observers may mutate the page again; hold no borrow while they run.
        let observers: Vec<_> = self.observers.borrow().clone();
        for observer in observers {
            observer(records);
        }
    }
}

impl Document for MemoryPage {
    fn location(&self) -> Result<String, DomError> {
        let state = self.state.borrow();
        if state.detached {
            return Err(DomError::Detached);
        }
        Ok(state.location.clone())
    }

    fn has_head(&self) -> bool {
        let state = self.state.borrow();
        !state.detached && state.has_head
    }

    fn icon_links(&self) -> Result<Vec<IconLink>, DomError> {
        let state = self.state.borrow();
        if state.detached {
            return Err(DomError::Detached);
        }
        let links = state
            .nodes
            .iter()
            .filter(|node| node.tag == "link")
            .filter(|node| {
                node.rel
                    .as_deref()
                    .is_some_and(|rel| rel.to_ascii_lowercase().contains("icon"))
            })
            .map(|node| IconLink {
                id: node.id,
                rel: node.rel.clone().unwrap_or_default(),
                href: node
                    .href
                    .as_deref()
                    .map(|href| to_absolute_url(href, &state.location))
                    .unwrap_or_default(),
                attributes: node.attributes.clone(),
            })
            .collect();
        Ok(links)
    }

    fn append_link(&self, link: &LinkSpec) -> Result<NodeId, DomError> {
        let id = self.insert(Node {
            id: NodeId(0),
            tag: "link".to_string(),
            rel: Some(link.rel.clone()),
            href: Some(link.href.clone()),
            attributes: link.attributes.clone(),
        })?;
        self.appended_links.set(self.appended_links.get() + 1);
        self.notify(&[MutationRecord {
            added: vec![AddedNode {
                tag: "link".to_string(),
                rel: Some(link.rel.clone()),
            }],
            removed: 0,
        }]);
        Ok(id)
    }

    fn remove_link(&self, id: NodeId) -> Result<(), DomError> {
        {
            let mut state = self.state.borrow_mut();
            if state.detached {
                return Err(DomError::Detached);
            }
            let idx = state
                .nodes
                .iter()
                .position(|node| node.id == id)
                .ok_or(DomError::UnknownNode)?;
            state.nodes.remove(idx);
        }
        self.notify(&[MutationRecord {
            added: Vec::new(),
            removed: 1,
        }]);
        Ok(())
    }

    fn observe(&self, callback: MutationCallback) -> Result<(), DomError> {
        if self.state.borrow().detached {
            return Err(DomError::Detached);
        }
        self.observers.borrow_mut().push(Rc::from(callback));
        Ok(())
    }
}

impl NavigationSource for MemoryPage {
    fn subscribe(&self, listener: NavigationListener) -> Result<(), DomError> {
        if self.state.borrow().detached {
            return Err(DomError::Detached);
        }
        self.listeners.borrow_mut().push(Rc::from(listener));
        Ok(())
    }
}
