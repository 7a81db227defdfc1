//! Harvester core: feed data model and the pure harvest state machine.
mod effect;
mod field;
mod msg;
mod record;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use field::{normalize_fields, Field, FieldValue, UnknownField};
pub use msg::Msg;
pub use record::{ItemRecord, SidebarAd};
pub use state::{HarvestState, Phase, Position, RetryPolicy};
pub use update::update;
pub use view_model::HarvestView;
