use std::collections::VecDeque;
use std::io::{self, Write};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use kanal::{AsyncReceiver, AsyncSender, ReceiveErrorTimeout, Sender};
use wbt_config::ui::UiConfig;
use wbt_ocr::{HotkeyManager, default_bindings};
use wbt_types::{AppEvent, CaptureRegion, Command, LogLevel, UiEvent};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const BACKLOG: usize = 200;

/// Starts the UI thread. It owns the hotkeys and the console and never runs
/// pipeline work.
pub fn spawn_ui(
    app_to_ui_rx: AsyncReceiver<UiEvent>,
    ui_to_app_tx: AsyncSender<AppEvent>,
    config: UiConfig,
) -> anyhow::Result<JoinHandle<()>> {
    let rx = app_to_ui_rx.to_sync();
    let tx = ui_to_app_tx.to_sync();
    let handle = thread::Builder::new()
        .name("wbt-ui".into())
        .spawn(move || ui_loop(rx, tx, config))?;
    Ok(handle)
}

fn ui_loop(rx: kanal::Receiver<UiEvent>, tx: Sender<AppEvent>, config: UiConfig) {
    let hotkeys = match HotkeyManager::new() {
        Ok(manager) => Some(manager),
        Err(e) => {
            tracing::error!("Hotkeys unavailable: {e:#}");
            None
        }
    };
    let select_key = default_bindings()
        .into_iter()
        .find(|b| b.command == Command::SelectRegion)
        .map_or("the select key", |b| b.label);

    let mut console = Console::new(io::stdout(), config.log_visible);
    let mut picker = RegionPicker::default();

    'ui: loop {
        if let Some(manager) = &hotkeys {
            while let Some(command) = manager.poll() {
                let event = if picker.is_active() {
                    picker_input(&mut picker, &mut console, command, select_key)
                } else {
                    Some(AppEvent::Command(command))
                };
                if let Some(event) = event
                    && !post(&tx, event)
                {
                    break 'ui;
                }
            }
        }

        match rx.recv_timeout(POLL_INTERVAL) {
            Ok(UiEvent::Close) => break,
            Ok(UiEvent::SelectRegion) => {
                console.show_region(None);
                console.line(LogLevel::Info, &picker.begin(select_key));
            }
            Ok(event) => console.handle(event),
            Err(ReceiveErrorTimeout::Timeout) => {}
            Err(_) => break,
        }
    }

    tracing::debug!("UI thread stopping");
}

/// A hotkey pressed while a selection is in progress
fn picker_input(
    picker: &mut RegionPicker,
    console: &mut Console<impl Write>,
    command: Command,
    select_key: &str,
) -> Option<AppEvent> {
    if command != Command::SelectRegion {
        picker.cancel();
        return Some(AppEvent::RegionSelected(None));
    }
    let position = match wbt_io::pointer_position() {
        Ok(position) => position,
        Err(e) => {
            tracing::warn!("Failed to read pointer position: {e}");
            picker.cancel();
            return Some(AppEvent::RegionSelected(None));
        }
    };
    match picker.corner(position) {
        PickStep::Next => {
            console.line(
                LogLevel::Info,
                &format!("Now move to the bottom-right corner and press {select_key}"),
            );
            None
        }
        PickStep::Done(region) => Some(AppEvent::RegionSelected(region)),
    }
}

/// Never blocks the UI thread. Returns false once the app side is gone.
fn post(tx: &Sender<AppEvent>, event: AppEvent) -> bool {
    match tx.try_send(event) {
        Ok(true) => true,
        Ok(false) => {
            tracing::warn!("App is busy, input dropped");
            true
        }
        Err(_) => false,
    }
}

/// Two-press corner selection using the pointer position
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegionPicker {
    #[default]
    Idle,
    FirstCorner,
    SecondCorner((i32, i32)),
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PickStep {
    Next,
    /// `None` for a zero-area selection
    Done(Option<CaptureRegion>),
}

impl RegionPicker {
    pub(crate) fn begin(&mut self, key: &str) -> String {
        *self = RegionPicker::FirstCorner;
        format!(
            "Select region: move the pointer to the top-left corner of the letters and press {key}"
        )
    }

    pub(crate) fn is_active(&self) -> bool {
        !matches!(self, RegionPicker::Idle)
    }

    pub(crate) fn corner(&mut self, position: (i32, i32)) -> PickStep {
        match *self {
            RegionPicker::Idle => PickStep::Done(None),
            RegionPicker::FirstCorner => {
                *self = RegionPicker::SecondCorner(position);
                PickStep::Next
            }
            RegionPicker::SecondCorner(first) => {
                *self = RegionPicker::Idle;
                PickStep::Done(CaptureRegion::from_corners(first, position))
            }
        }
    }

    pub(crate) fn cancel(&mut self) {
        *self = RegionPicker::Idle;
    }
}

/// Log display with a visibility toggle. Lines arriving while hidden are
/// kept and replayed when it is shown again.
pub(crate) struct Console<W: Write> {
    out: W,
    visible: bool,
    hidden: VecDeque<String>,
}

impl<W: Write> Console<W> {
    pub(crate) fn new(out: W, visible: bool) -> Self {
        Self {
            out,
            visible,
            hidden: VecDeque::new(),
        }
    }

    pub(crate) fn handle(&mut self, event: UiEvent) {
        match event {
            UiEvent::Log { level, message } => self.line(level, &message),
            UiEvent::ShowHelp(text) => {
                self.set_visible(true);
                self.write(&text);
            }
            UiEvent::ToggleDisplay => self.set_visible(!self.visible),
            UiEvent::ShowRegion(region) => self.show_region(region),
            UiEvent::SelectRegion | UiEvent::Close => {}
        }
    }

    pub(crate) fn line(&mut self, level: LogLevel, message: &str) {
        let tag = match level {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARN",
            LogLevel::Error => "ERROR",
        };
        let line = format!(
            "{} [{tag:<5}] {message}",
            chrono::Local::now().format("%H:%M:%S")
        );
        if self.visible {
            self.write(&line);
        } else {
            if self.hidden.len() == BACKLOG {
                self.hidden.pop_front();
            }
            self.hidden.push_back(line);
        }
    }

    pub(crate) fn show_region(&mut self, region: Option<CaptureRegion>) {
        match region {
            Some(region) => self.line(LogLevel::Info, &format!("Watching region {region}")),
            None => self.line(LogLevel::Info, "Region overlay hidden"),
        }
    }

    fn set_visible(&mut self, visible: bool) {
        if visible == self.visible {
            return;
        }
        self.visible = visible;
        if visible {
            while let Some(line) = self.hidden.pop_front() {
                self.write(&line);
            }
        }
    }

    fn write(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}").and_then(|()| self.out.flush()) {
            tracing::debug!("console write failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(console: &Console<Vec<u8>>) -> String {
        String::from_utf8(console.out.clone()).unwrap()
    }

    #[test]
    fn test_picker_two_presses() {
        let mut picker = RegionPicker::default();
        assert!(!picker.is_active());
        picker.begin("F3");
        assert!(picker.is_active());

        assert_eq!(picker.corner((300, 240)), PickStep::Next);
        let step = picker.corner((100, 200));
        assert_eq!(
            step,
            PickStep::Done(Some(CaptureRegion {
                left: 100,
                top: 200,
                width: 200,
                height: 40,
            }))
        );
        assert!(!picker.is_active());
    }

    #[test]
    fn test_picker_zero_area_and_cancel() {
        let mut picker = RegionPicker::default();
        picker.begin("F3");
        picker.corner((5, 5));
        assert_eq!(picker.corner((5, 90)), PickStep::Done(None));

        picker.begin("F3");
        picker.cancel();
        assert_eq!(picker.corner((1, 1)), PickStep::Done(None));
    }

    #[test]
    fn test_hidden_lines_replay_on_show() {
        let mut console = Console::new(Vec::new(), true);
        console.handle(UiEvent::info("first"));
        console.handle(UiEvent::ToggleDisplay);
        console.handle(UiEvent::warn("while hidden"));
        assert!(!output(&console).contains("while hidden"));

        console.handle(UiEvent::ToggleDisplay);
        let out = output(&console);
        assert!(out.contains("[INFO ] first"));
        assert!(out.contains("[WARN ] while hidden"));
    }

    #[test]
    fn test_help_forces_display() {
        let mut console = Console::new(Vec::new(), false);
        console.handle(UiEvent::error("boom"));
        console.handle(UiEvent::ShowHelp("HELP TEXT".into()));
        let out = output(&console);
        assert!(out.contains("[ERROR] boom"));
        assert!(out.ends_with("HELP TEXT\n"));
    }
}
