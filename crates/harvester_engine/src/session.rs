use harvester_core::Position;

use crate::{Locator, SessionError};

/// A browsing context showing the feed.
///
/// Implementations own scroll position and element lookup. A harvest assumes
/// nothing else moves the document while it runs.
pub trait DocumentSession {
    type Node: ItemNode;

    /// Shows the feed, reusing an already signed-in context. Idempotent.
    fn go_to_feed(&mut self) -> Result<(), SessionError>;

    fn scroll_to(&mut self, offset: u64) -> Result<(), SessionError>;

    /// Scrolls to the current bottom of the rendered content, which triggers
    /// lazy loading of further items.
    fn scroll_to_bottom(&mut self) -> Result<(), SessionError>;

    fn scroll_offset(&mut self) -> Result<u64, SessionError>;

    fn has_element(&mut self, locator: &Locator) -> Result<bool, SessionError>;

    /// The item at `position` inside the feed container, or `None` when the
    /// rendered window has no element there yet.
    fn find_item(
        &mut self,
        feed: &Locator,
        position: Position,
    ) -> Result<Option<Self::Node>, SessionError>;

    fn advertisement_elements(&mut self, locator: &Locator)
        -> Result<Vec<AdElement>, SessionError>;
}

/// Handle to the document subtree of one feed item.
///
/// Lookups are relative to the item. A missing element is `Ok(None)`.
pub trait ItemNode {
    fn text(&mut self, locator: &Locator) -> Result<Option<String>, SessionError>;

    fn texts(&mut self, locator: &Locator) -> Result<Vec<String>, SessionError>;

    fn attr(&mut self, locator: &Locator, name: &str) -> Result<Option<String>, SessionError>;

    /// Hovers / scrolls the element into view so lazily revealed content renders.
    /// Succeeds when nothing matches.
    fn reveal(&mut self, locator: &Locator) -> Result<(), SessionError>;
}

/// Rendered text lines and target of one sidebar ad anchor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdElement {
    pub lines: Vec<String>,
    pub href: Option<String>,
}
