//! Layout persistence for the display shell.
//!
//! A layout is a named, ordered list of window specs (id, url, pixel
//! geometry) stored as JSON. Views are the normalized variant: window
//! placements as screen fractions, resolved against the actual screen
//! size at apply time.

pub mod paths;
pub mod profile;
pub mod store;
pub mod views;

pub use profile::{LayoutProfile, WindowSpec};
pub use store::LayoutStore;
pub use views::{View, ViewPlacement, ViewStore};
