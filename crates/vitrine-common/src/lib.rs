pub mod errors;
pub mod events;
pub mod id;
pub mod notifications;
pub mod types;

pub use errors::{ConfigError, CorrelationError, LayoutError, PersistenceError, VitrineError};
pub use events::{EventBus, ShellEvent};
pub use id::{PopupId, WindowId};
pub use notifications::{Notification, NotificationLevel, NotificationQueue};
pub use types::Geometry;

pub type Result<T> = std::result::Result<T, VitrineError>;
