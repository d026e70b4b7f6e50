//! Live-tracking map core for the fleet monitoring client.
//!
//! The crate reconciles polled position batches into a latest-position store,
//! keeps one marker overlay per device in sync with that store, overlays
//! historical routes and maintains a single selection highlight. Transport,
//! projection and drawing are reached through the traits in [`prelude`].

pub mod map;
pub mod model;
pub mod prelude;
pub mod store;
pub mod telemetry;
pub mod tracking;

pub use prelude::{MapError, MapResult, MapSurface, PositionTransport, Projection, TransportError};
pub use tracking::{LiveStop, LiveUpdates, MapController, MapEvent, OverlayKey};
