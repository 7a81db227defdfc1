use std::time::Duration;

use crate::Position;

/// Work the harvest driver must perform against the document session.
///
/// Effects are executed in order; the ones that observe the document report
/// back with a [`crate::Msg`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Reset the scroll position to the top of the document.
    ScrollToTop,
    /// Look up the feed container; answered by `FeedLocated` or a fatal abort.
    LocateFeed,
    /// Look up the item at `position`; answered by `ProbeFound`/`ProbeMissing`.
    Probe { position: Position },
    /// Materialize and yield the item at `position`; answered by `Emitted`.
    Emit { position: Position },
    /// Scroll to the current bottom of the content, then wait `settle`;
    /// answered by `ScrollSettled`.
    ScrollToBottom { settle: Duration },
    /// Block the control thread.
    Sleep(Duration),
    /// The sequence ends.
    Finish,
}
