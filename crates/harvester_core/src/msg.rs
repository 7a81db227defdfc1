#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    /// Begin (or restart) a harvest from the top of the feed.
    Start,
    /// The feed container exists in the document.
    FeedLocated,
    /// The item at the current position has a backing element.
    ProbeFound,
    /// No element exists yet at the current position.
    ProbeMissing,
    /// The item at the current position was handed to the consumer.
    Emitted,
    /// A scroll-to-bottom was issued and the settle wait has elapsed.
    ScrollSettled,
}
