//! Top-level shell coordinator.
//!
//! Implements `winit::application::ApplicationHandler` to drive the main
//! event loop: one frameless native window + webview surface per content
//! window, tracked popup windows for authentication flows, and the pumps
//! that feed surface/timer events into the registry and the broker.

mod commands;
mod core;
mod event_handler;
mod init;
mod popups;

pub use core::{Shell, ShellUserEvent};
