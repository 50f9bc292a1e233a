use anyhow::{Context, Result};
use global_hotkey::{
    GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
    hotkey::{Code, HotKey, Modifiers},
};
use wbt_types::Command;

/// One global key combination and the command it fires
#[derive(Debug, Clone, Copy)]
pub struct Binding {
    pub command: Command,
    pub modifiers: Option<Modifiers>,
    pub code: Code,
    /// Shown in the help text
    pub label: &'static str,
}

impl Binding {
    const fn new(
        command: Command,
        modifiers: Option<Modifiers>,
        code: Code,
        label: &'static str,
    ) -> Self {
        Self {
            command,
            modifiers,
            code,
            label,
        }
    }

    fn hotkey(&self) -> HotKey {
        HotKey::new(self.modifiers, self.code)
    }
}

pub fn default_bindings() -> Vec<Binding> {
    let ctrl_shift = Some(Modifiers::CONTROL | Modifiers::SHIFT);
    vec![
        Binding::new(Command::TriggerRecognition, None, Code::F2, "F2"),
        Binding::new(Command::SelectRegion, None, Code::F3, "F3"),
        Binding::new(Command::CycleSearchMode, None, Code::PageUp, "Page Up"),
        Binding::new(Command::CycleSortMode, None, Code::PageDown, "Page Down"),
        Binding::new(Command::ClearHistory, ctrl_shift, Code::Delete, "Ctrl+Shift+Delete"),
        Binding::new(Command::UndoLast, ctrl_shift, Code::KeyZ, "Ctrl+Shift+Z"),
        Binding::new(Command::ToggleAutoMode, None, Code::F1, "F1"),
        Binding::new(Command::ToggleDisplay, None, Code::F4, "F4"),
        Binding::new(Command::ShowHelp, None, Code::F5, "F5"),
        Binding::new(Command::Quit, ctrl_shift, Code::KeyQ, "Ctrl+Shift+Q"),
    ]
}

/// Owns the registered global hotkeys. Keep it on the thread that polls it.
pub struct HotkeyManager {
    manager: GlobalHotKeyManager,
    registered: Vec<(HotKey, Command)>,
}

impl HotkeyManager {
    pub fn new() -> Result<Self> {
        Self::with_bindings(&default_bindings())
    }

    /// Registers every binding; one that is already taken elsewhere is
    /// skipped with a warning instead of failing the whole surface
    pub fn with_bindings(bindings: &[Binding]) -> Result<Self> {
        let manager = GlobalHotKeyManager::new().context("Failed to create hotkey manager")?;

        let mut registered = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let hotkey = binding.hotkey();
            match manager.register(hotkey) {
                Ok(()) => registered.push((hotkey, binding.command)),
                Err(e) => tracing::warn!(
                    key = binding.label,
                    command = ?binding.command,
                    "Failed to register hotkey: {e}"
                ),
            }
        }

        Ok(Self {
            manager,
            registered,
        })
    }

    /// Next pressed command, if any (non-blocking)
    pub fn poll(&self) -> Option<Command> {
        let receiver = GlobalHotKeyEvent::receiver();
        while let Ok(event) = receiver.try_recv() {
            if !matches!(event.state, HotKeyState::Pressed) {
                continue;
            }
            if let Some((_, command)) = self.registered.iter().find(|(hk, _)| hk.id() == event.id) {
                tracing::debug!(?command, "hotkey pressed");
                return Some(*command);
            }
            tracing::debug!(id = event.id, "hotkey event for unknown id");
        }
        None
    }
}

impl Drop for HotkeyManager {
    fn drop(&mut self) {
        for (hotkey, _) in &self.registered {
            let _ = self.manager.unregister(*hotkey);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_every_command_bound_once() {
        let bindings = default_bindings();
        let commands: HashSet<Command> = bindings.iter().map(|b| b.command).collect();
        assert_eq!(commands.len(), Command::ALL.len());
        assert_eq!(bindings.len(), Command::ALL.len());

        let ids: HashSet<u32> = bindings.iter().map(|b| b.hotkey().id()).collect();
        assert_eq!(ids.len(), bindings.len());
    }
}
