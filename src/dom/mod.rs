pub mod memory;
pub mod types;

pub use self::memory::MemoryPage;
pub use self::types::{
    AddedNode, Document, DomError, IconLink, LinkSpec, MutationCallback, MutationRecord,
    NavigationKind, NavigationListener, NavigationSource, NodeId,
};

use url::Url;

/// Resolves `href` against `base` the way an `href` property reads.
///
/// `data:` URLs pass through untouched, and anything that cannot be resolved
/// is returned as given.
pub fn to_absolute_url(href: &str, base: &str) -> String {
    if href.starts_with("data:") {
        return href.to_string();
    }
    Url::parse(base)
        .and_then(|base| base.join(href))
        .or_else(|_| Url::parse(href))
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}
