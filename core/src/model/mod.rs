pub mod device;
pub mod envelope;
pub mod position;

pub use device::{DeviceId, DeviceRecord};
pub use envelope::Envelope;
pub use position::{PositionId, PositionRecord};
