//! Live window state: the registry that owns every content window, and the
//! edit-mode controller that turns pointer input into geometry mutations.

pub mod edit;
pub mod registry;

pub use edit::{EditModeController, HitZone, PointerEvent};
pub use registry::{ContentWindow, InteractionState, RegistryEvent, WindowRegistry};
