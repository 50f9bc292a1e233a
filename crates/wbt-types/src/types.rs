use std::fmt;

use serde::{Deserialize, Serialize};

/// Events flowing from the hotkey/UI thread into the app event loop
#[derive(Debug, Clone)]
pub enum AppEvent {
    Command(Command),
    /// Result of a region selection requested through [`UiEvent::SelectRegion`]
    RegionSelected(Option<CaptureRegion>),
}

/// Everything a user can ask for, independent of how it is bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    TriggerRecognition,
    SelectRegion,
    CycleSearchMode,
    CycleSortMode,
    ClearHistory,
    UndoLast,
    ToggleAutoMode,
    ToggleDisplay,
    ShowHelp,
    Quit,
}

impl Command {
    pub const ALL: [Command; 10] = [
        Command::TriggerRecognition,
        Command::SelectRegion,
        Command::CycleSearchMode,
        Command::CycleSortMode,
        Command::ClearHistory,
        Command::UndoLast,
        Command::ToggleAutoMode,
        Command::ToggleDisplay,
        Command::ShowHelp,
        Command::Quit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Command::TriggerRecognition => "Fetch Suggestions",
            Command::SelectRegion => "Select Region",
            Command::CycleSearchMode => "Change Search Mode",
            Command::CycleSortMode => "Change Sort Mode",
            Command::ClearHistory => "Clear History",
            Command::UndoLast => "Undo Last Word",
            Command::ToggleAutoMode => "Toggle Auto Mode",
            Command::ToggleDisplay => "Toggle This Log",
            Command::ShowHelp => "Show This Window",
            Command::Quit => "Quit Application",
        }
    }
}

/// Messages for the UI thread. Only that thread renders anything.
#[derive(Debug, Clone)]
pub enum UiEvent {
    Log { level: LogLevel, message: String },
    ShowHelp(String),
    ToggleDisplay,
    SelectRegion,
    ShowRegion(Option<CaptureRegion>),
    Close,
}

impl UiEvent {
    pub fn info(message: impl Into<String>) -> Self {
        UiEvent::Log {
            level: LogLevel::Info,
            message: message.into(),
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        UiEvent::Log {
            level: LogLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        UiEvent::Log {
            level: LogLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

/// Screen rectangle in pixels. Replaced wholesale on reselection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    /// Normalizes two drag corners into a region; `None` for a zero-area drag
    pub fn from_corners(a: (i32, i32), b: (i32, i32)) -> Option<Self> {
        let (x1, x2) = (a.0.min(b.0), a.0.max(b.0));
        let (y1, y2) = (a.1.min(b.1), a.1.max(b.1));
        let width = (x2 - x1) as u32;
        let height = (y2 - y1) as u32;
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            left: x1,
            top: y1,
            width,
            height,
        })
    }
}

impl fmt::Display for CaptureRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} at ({}, {})",
            self.width, self.height, self.left, self.top
        )
    }
}

/// How the recognized letters are matched against the word list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchMode {
    StartsWith,
    EndsWith,
    Contains,
    Rhymes,
    RelatedWords,
}

impl SearchMode {
    pub const ALL: [SearchMode; 5] = [
        SearchMode::StartsWith,
        SearchMode::EndsWith,
        SearchMode::Contains,
        SearchMode::Rhymes,
        SearchMode::RelatedWords,
    ];

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|m| *m == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            SearchMode::StartsWith => "Starts With",
            SearchMode::EndsWith => "Ends With",
            SearchMode::Contains => "Contains",
            SearchMode::Rhymes => "Rhymes",
            SearchMode::RelatedWords => "Related Words",
        }
    }
}

impl Default for SearchMode {
    fn default() -> Self {
        SearchMode::Contains
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortMode {
    Shortest,
    Longest,
    Random,
    /// Crude complexity heuristic, not corpus frequency
    Frequency,
}

impl SortMode {
    pub const ALL: [SortMode; 4] = [
        SortMode::Shortest,
        SortMode::Longest,
        SortMode::Random,
        SortMode::Frequency,
    ];

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|m| *m == self).unwrap_or(0)
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            SortMode::Shortest => "Shortest",
            SortMode::Longest => "Longest",
            SortMode::Random => "Random",
            SortMode::Frequency => "Frequency",
        }
    }
}

impl Default for SortMode {
    fn default() -> Self {
        SortMode::Random
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of the most recent lookup call, shown as an indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderStatus {
    #[default]
    Online,
    Offline,
    Timeout,
    Error,
}

impl ProviderStatus {
    pub fn label(self) -> &'static str {
        match self {
            ProviderStatus::Online => "[OK] Online",
            ProviderStatus::Offline => "[XX] Offline",
            ProviderStatus::Timeout => "[--] Timeout",
            ProviderStatus::Error => "[!!] Error",
        }
    }
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
