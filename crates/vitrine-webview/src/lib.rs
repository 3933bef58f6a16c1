//! Rendering surfaces for the display shell.
//!
//! Wraps the `wry` engine to provide:
//! - One WebView per content window and per tracked popup
//! - Typed surface events (navigation, page load, popup requests, close)
//! - Interception of new-window requests for the popup broker
//! - The per-origin session record store

pub mod events;
pub mod profile;
pub mod surface;

pub use events::{PageLoadState, SurfaceEvent, SurfaceKey};
pub use profile::ProfileStore;
pub use surface::{SurfaceConfig, SurfaceHandle, SurfaceManager, SurfaceRegistry};
