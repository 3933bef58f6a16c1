//! Shell configuration: TOML settings plus the optional credential file.

pub mod credentials;
pub mod loader;
pub mod paths;
pub mod schema;
pub mod validation;

pub use credentials::Credentials;
pub use loader::{load_config, load_from_path};
pub use schema::{GeneralConfig, PopupConfig, ShellConfig, SurfaceSection};
