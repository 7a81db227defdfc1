//! Harvester engine: document sessions, field extraction, and the harvest driver.
mod ads;
#[cfg(feature = "chrome")]
mod chrome;
mod decode;
mod engine;
mod extract;
mod locator;
mod materialize;
mod session;
mod snapshot;
mod types;

pub use ads::current_ads;
#[cfg(feature = "chrome")]
pub use chrome::{ChromeNode, ChromeSession, ChromeSettings, Credentials};
pub use decode::{decode_snapshot, DecodeError};
pub use engine::{FeedHarvest, FeedHarvester, HarvestSettings, Sleeper, ThreadSleeper};
pub use extract::{parse_count, ExtractFn, FieldRegistry};
pub use locator::{locators, Locator};
pub use materialize::materialize;
pub use session::{AdElement, DocumentSession, ItemNode};
pub use snapshot::{SnapshotError, SnapshotNode, SnapshotSession};
pub use types::{FieldError, FieldResult, HarvestError, SessionError};
