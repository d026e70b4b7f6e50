pub mod devices;
pub mod positions;

pub use devices::DeviceStore;
pub use positions::{ApplyOutcome, PositionStore};
