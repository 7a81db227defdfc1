use crate::{Phase, Position};

/// Read-only progress snapshot of one harvest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HarvestView {
    pub phase: Phase,
    /// Next position to be probed.
    pub position: Position,
    pub emitted: u64,
    /// Scroll-to-bottom triggers issued so far.
    pub scroll_cycles: u64,
    pub scroll_failures: u32,
    pub load_failures: u32,
}
