//! Per-document favicon enforcement.
//!
//! A [`Controller`] installs the desired icon links and keeps them installed:
//! host-page icon insertions are treated as interference and answered with a
//! debounced reapply, and same-document navigations re-assert the icon against
//! the new location. Nothing here ever surfaces an error to the caller.

pub mod state;

pub use self::state::{EnforcementSnapshot, EnforcementState};

use crate::config::EnforcementConfig;
use crate::dom::{
    to_absolute_url, Document, DomError, IconLink, LinkSpec, MutationRecord, NavigationKind,
    NavigationSource,
};
use crate::scheduler::Scheduler;
use std::rc::{Rc, Weak};
use tracing::{debug, info, trace};

/// Relations installed for every override, one link each.
pub const ICON_RELS: [&str; 4] = [
    "icon",
    "shortcut icon",
    "apple-touch-icon",
    "apple-touch-icon-precomposed",
];

const MARKER_VALUE: &str = "1";

/// Cheap handle to the per-document enforcement controller.
#[derive(Clone)]
pub struct Controller {
    inner: Rc<Inner>,
}

struct Inner {
    document: Rc<dyn Document>,
    navigation: Rc<dyn NavigationSource>,
    scheduler: Rc<dyn Scheduler>,
    config: EnforcementConfig,
    state: EnforcementState,
}

impl Controller {
    pub fn new(
        document: Rc<dyn Document>,
        navigation: Rc<dyn NavigationSource>,
        scheduler: Rc<dyn Scheduler>,
        config: EnforcementConfig,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                document,
                navigation,
                scheduler,
                config,
                state: EnforcementState::default(),
            }),
        }
    }

    /// Sets up observation and navigation tracking once, then applies `url`.
    pub fn activate_and_apply(&self, url: &str) {
        self.inner.ensure_observer();
        self.inner.ensure_navigation_subscription();
        self.inner.apply(url);
    }

    /// Sets up observation once, then clears the override.
    pub fn activate_and_clear(&self) {
        self.inner.ensure_observer();
        self.inner.clear();
    }

    /// Records `url` as the desired icon and installs it unless the
    /// document's icon links already point at it.
    pub fn apply(&self, url: &str) {
        self.inner.apply(url);
    }

    /// Removes controller-owned links only and forgets the desired icon.
    pub fn clear(&self) {
        self.inner.clear();
    }

    pub fn snapshot(&self) -> EnforcementSnapshot {
        self.inner.state.snapshot()
    }

    pub fn marker_attribute(&self) -> &str {
        &self.inner.config.marker_attribute
    }

    /// Whether `link` was installed by a controller.
    pub fn owns(&self, link: &IconLink) -> bool {
        self.inner.owns(link)
    }
}

impl Inner {
    fn apply(&self, url: &str) {
        if url.is_empty() {
            return;
        }
        self.state.set_desired(Some(url.to_string()));

        match self.icons_correct(url) {
            Ok(true) => trace!(url = %url, "Icon links already current"),
            Ok(false) => self.install_or_log(url),
            Err(e) => debug!(url = %url, error = %e, "Cannot inspect icon links"),
        }
    }

    fn clear(&self) {
        let _guard = self.state.suppress();
        if let Err(e) = self.remove_owned_links() {
            debug!(error = %e, "Cannot remove owned icon links");
        }
        self.state.set_desired(None);
    }

    /// Correct means at least one icon link, and every icon link pointing at `url`.
    fn icons_correct(&self, url: &str) -> Result<bool, DomError> {
        let expected = to_absolute_url(url, &self.document.location()?);
        let links = self.document.icon_links()?;
        Ok(!links.is_empty() && links.iter().all(|link| link.href == expected))
    }

    fn install_or_log(&self, url: &str) {
        match self.install(url) {
            Ok(location) => info!(url = %url, %location, "Favicon override installed"),
            Err(e) => debug!(url = %url, error = %e, "Favicon override skipped"),
        }
    }

    /// Evicts every icon link, then adds one owned link per relation.
    fn install(&self, url: &str) -> Result<String, DomError> {
        if !self.document.has_head() {
            return Err(DomError::NoHead);
        }
        let location = self.document.location()?;
        let href = to_absolute_url(url, &location);

        let _guard = self.state.suppress();
        for link in self.document.icon_links()? {
            self.evict(&link)?;
        }
        for rel in ICON_RELS {
            let spec = LinkSpec::new(rel, href.clone())
                .with_attribute(self.config.marker_attribute.clone(), MARKER_VALUE);
            self.document.append_link(&spec)?;
        }
        self.state.set_last_applied_location(location.clone());
        Ok(location)
    }

    fn remove_owned_links(&self) -> Result<(), DomError> {
        for link in self.document.icon_links()? {
            if self.owns(&link) {
                self.evict(&link)?;
            }
        }
        Ok(())
    }

    /// Removes `link`. A link the page already dropped counts as removed.
    fn evict(&self, link: &IconLink) -> Result<(), DomError> {
        match self.document.remove_link(link.id) {
            Err(DomError::UnknownNode) => {
                trace!(node = ?link.id, "Icon link already gone");
                Ok(())
            }
            result => result,
        }
    }

    fn owns(&self, link: &IconLink) -> bool {
        link.attribute(&self.config.marker_attribute) == Some(MARKER_VALUE)
    }

    fn on_mutations(self: &Rc<Self>, records: &[MutationRecord]) {
        if self.state.is_suppressed() {
            return;
        }
        let interference = records
            .iter()
            .flat_map(|record| record.added.iter())
            .any(|node| node.is_icon_link());
        if interference {
            debug!("Host page touched icon links");
            self.schedule_reapply();
        }
    }

    /// At most one reapply is pending; bursts collapse into it.
    fn schedule_reapply(self: &Rc<Self>) {
        if self.state.desired().is_none() || self.state.pending_reapply().is_some() {
            return;
        }
        let weak = Rc::downgrade(self);
        let timer = self.scheduler.set_timeout(
            self.config.debounce(),
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.reapply();
                }
            }),
        );
        trace!(%timer, "Reapply scheduled");
        self.state.set_pending_reapply(Some(timer));
    }

    fn reapply(&self) {
        self.state.set_pending_reapply(None);
        let Some(url) = self.state.desired() else {
            return;
        };
        match self.icons_correct(&url) {
            Ok(true) => trace!(url = %url, "Interference settled on its own"),
            Ok(false) => self.install_or_log(&url),
            Err(e) => debug!(url = %url, error = %e, "Cannot inspect icon links"),
        }
    }

    fn on_navigation(&self, kind: NavigationKind) {
        let Some(url) = self.state.desired() else {
            return;
        };
        let location = match self.document.location() {
            Ok(location) => location,
            Err(e) => {
                debug!(error = %e, "Cannot read location after navigation");
                return;
            }
        };
        if location != self.state.last_applied_location() {
            debug!(?kind, %location, "Same-document navigation, reapplying");
            self.apply(&url);
        }
    }

    fn ensure_observer(self: &Rc<Self>) {
        if self.state.observer_active() {
            return;
        }
        let weak: Weak<Self> = Rc::downgrade(self);
        let result = self.document.observe(Box::new(move |records: &[MutationRecord]| {
            if let Some(inner) = weak.upgrade() {
                inner.on_mutations(records);
            }
        }));
        match result {
            Ok(()) => self.state.mark_observer_active(),
            Err(e) => debug!(error = %e, "Cannot observe document"),
        }
    }

    fn ensure_navigation_subscription(self: &Rc<Self>) {
        if self.state.navigation_subscribed() {
            return;
        }
        let weak: Weak<Self> = Rc::downgrade(self);
        let result = self.navigation.subscribe(Box::new(move |kind: NavigationKind| {
            if let Some(inner) = weak.upgrade() {
                inner.on_navigation(kind);
            }
        }));
        match result {
            Ok(()) => self.state.mark_navigation_subscribed(),
            Err(e) => debug!(error = %e, "Cannot subscribe to navigation"),
        }
    }
}
