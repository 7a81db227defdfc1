use harvester_core::SidebarAd;

use crate::{AdElement, DocumentSession, Locator, SessionError};

/// Snapshot of the sidebar ads currently rendered. No ads is an empty list.
pub fn current_ads<S: DocumentSession + ?Sized>(
    session: &mut S,
    locator: &Locator,
) -> Result<Vec<SidebarAd>, SessionError> {
    let elements = session.advertisement_elements(locator)?;
    Ok(elements.into_iter().filter_map(to_ad).collect())
}

/// First rendered line is the advertiser text, the second the displayed link.
fn to_ad(element: AdElement) -> Option<SidebarAd> {
    let mut lines = element
        .lines
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty());
    let text = lines.next()?;
    let link = lines
        .next()
        .or(element.href)
        .unwrap_or_default();
    Some(SidebarAd { text, link })
}
