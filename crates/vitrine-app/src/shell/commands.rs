//! The shell's command surface: toggle edit mode, save layout, reload
//! all, quit. Bound to Ctrl+E / Ctrl+S / Ctrl+R / Ctrl+Q.

use winit::event::{ElementState, KeyEvent};
use winit::keyboard::Key;

use vitrine_common::{Notification, ShellEvent};

use super::core::Shell;

/// Commands a key press can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    ToggleEditMode,
    SaveLayout,
    ReloadAll,
    Quit,
}

/// Resolve a character key (with modifier state) to a command.
pub fn command_for_key(ch: &str, ctrl: bool) -> Option<ShellCommand> {
    if !ctrl {
        return None;
    }
    match ch.to_ascii_lowercase().as_str() {
        "e" => Some(ShellCommand::ToggleEditMode),
        "s" => Some(ShellCommand::SaveLayout),
        "r" => Some(ShellCommand::ReloadAll),
        "q" => Some(ShellCommand::Quit),
        _ => None,
    }
}

impl Shell {
    pub(super) fn handle_keyboard_input(&mut self, event: KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        let Key::Character(ch) = &event.logical_key else {
            return;
        };

        let ctrl = self.modifiers.control_key();
        match command_for_key(ch.as_str(), ctrl) {
            Some(ShellCommand::ToggleEditMode) => self.toggle_edit_mode(),
            Some(ShellCommand::SaveLayout) => {
                let name = self.layout_name.clone();
                self.save_current_layout(&name);
            }
            Some(ShellCommand::ReloadAll) => self.reload_all(),
            Some(ShellCommand::Quit) => self.quit(),
            None => {}
        }
    }

    /// Toggle drag/resize mode for all content windows.
    pub(super) fn toggle_edit_mode(&mut self) {
        let enabled = self.edit.toggle(&mut self.registry);
        tracing::info!(enabled, "edit mode toggled");
        // Surfaces swallow pointer input; hide them while editing so the
        // native windows receive the drag.
        self.surface_registry.set_content_visibility(!enabled);
        self.event_bus
            .publish(ShellEvent::EditModeChanged { enabled });
        self.notifications.push(Notification::info(if enabled {
            "edit mode: drag to move, corner to resize"
        } else {
            "edit mode off"
        }));
    }

    /// Persist the registry snapshot under a layout name. Store failures
    /// are surfaced but never stop the shell.
    pub(super) fn save_current_layout(&mut self, name: &str) {
        let snapshot = self.registry.snapshot();
        match self.store.save(name, &snapshot) {
            Ok(()) => {
                self.event_bus.publish(ShellEvent::LayoutChanged);
                self.notifications.push(Notification::info(format!(
                    "layout \"{name}\" saved ({} windows)",
                    snapshot.len()
                )));
            }
            Err(e) => {
                tracing::error!("layout save failed: {e}");
                self.notifications
                    .push(Notification::error(format!("layout save failed: {e}")));
            }
        }
    }

    /// Fan out a reload to every content surface. Tracked popups and their
    /// sessions are left untouched; a completion reload issued later wins.
    pub(super) fn reload_all(&mut self) {
        tracing::info!("reloading all content windows");
        self.surface_registry.reload_all_content();
        self.notifications.push(Notification::info("reloading all"));
    }

    pub(super) fn quit(&mut self) {
        tracing::info!("quit requested");
        self.event_bus.publish(ShellEvent::Shutdown);
        self.should_exit = true;
    }
}
