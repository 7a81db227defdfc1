use std::borrow::Cow;
use std::fmt;

use harvester_core::Position;
use scraper::Selector;

use crate::SessionError;

/// A CSS selector naming elements in the rendered document.
///
/// Selector lists are fine anywhere, including for the feed container: items
/// are addressed relative to the container element, never by extending its
/// selector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator(Cow<'static, str>);

impl Locator {
    pub const fn from_static(css: &'static str) -> Self {
        Self(Cow::Borrowed(css))
    }

    pub fn css(css: impl Into<String>) -> Self {
        Self(Cow::Owned(css.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `position`-th `div` child, queried from the feed container element.
    pub fn feed_item(position: Position) -> Locator {
        Locator::css(format!(":scope > div:nth-of-type({position})"))
    }

    /// Parses the selector for in-process document queries.
    pub fn selector(&self) -> Result<Selector, SessionError> {
        Selector::parse(self.as_str())
            .map_err(|err| SessionError::invalid_locator(self, format!("{err:?}")))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locators for the home feed markup.
pub mod locators {
    use super::Locator;

    pub const FEED: Locator = Locator::from_static(r#"div[role="feed"]"#);
    pub const SIDEBAR_AD: Locator =
        Locator::from_static(r#"a[aria-label="Advertiser"][rel="nofollow noopener"]"#);
    pub const LOGIN_EMAIL: Locator = Locator::from_static("#email");
    pub const LOGIN_PASSWORD: Locator = Locator::from_static("#pass");
    pub const LOGIN_BUTTON: Locator = Locator::from_static(r#"[name="login"]"#);
    pub const HOME_LINK: Locator = Locator::from_static(r#"a[aria-label="Home"]"#);

    pub const AUTHOR: Locator = Locator::from_static("h2 strong, h3 strong, h4 strong");
    pub const AUTHOR_LINK: Locator = Locator::from_static("h2 a[href], h3 a[href], h4 a[href]");
    pub const MESSAGE: Locator = Locator::from_static(
        r#"div[data-ad-preview="message"], div[data-ad-comet-preview="message"]"#,
    );
    pub const PERMALINK: Locator = Locator::from_static(
        r#"a[href*="/posts/"], a[href*="/permalink/"], a[href*="story_fbid"]"#,
    );
    /// The timestamp is the permalink's label; it only gains its full text on hover.
    pub const TIMESTAMP_LINK: Locator = PERMALINK;
    pub const REACTION_COUNT: Locator = Locator::from_static(r#"[aria-label^="All reactions"] span"#);
    pub const ENGAGEMENT: Locator = Locator::from_static(r#"div[role="button"] span"#);
    pub const SPONSORED_MARKER: Locator =
        Locator::from_static(r#"a[aria-label="Sponsored"], span[data-sponsored="true"]"#);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_items_are_addressed_relative_to_the_container() {
        let item = Locator::feed_item(3);
        assert_eq!(item.as_str(), ":scope > div:nth-of-type(3)");
        assert!(!item.as_str().contains(','));
        assert!(item.selector().is_ok());
    }

    #[test]
    fn builtin_locators_parse() {
        for locator in [
            locators::FEED,
            locators::SIDEBAR_AD,
            locators::AUTHOR,
            locators::AUTHOR_LINK,
            locators::MESSAGE,
            locators::PERMALINK,
            locators::REACTION_COUNT,
            locators::ENGAGEMENT,
            locators::SPONSORED_MARKER,
        ] {
            assert!(locator.selector().is_ok(), "{locator} should parse");
        }
    }

    #[test]
    fn malformed_css_is_an_invalid_locator() {
        let err = Locator::css("div[").selector().unwrap_err();
        assert!(matches!(err, SessionError::InvalidLocator { .. }));
    }
}
