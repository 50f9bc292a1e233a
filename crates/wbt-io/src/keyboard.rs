use std::thread;
use std::time::Duration;

use enigo::{Direction, Enigo, Key, Keyboard, Mouse, Settings};

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("nothing to type")]
    EmptyWord,

    #[error("keyboard backend unavailable: {0}")]
    Backend(String),

    #[error("key event failed: {0}")]
    KeySimulation(String),
}

/// Types a word into the focused window. Blocking.
pub trait ActionEmitter: Send + Sync {
    fn emit(&self, word: &str) -> Result<(), EmitError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keystroke {
    Char(char),
    Submit,
}

/// One click per character, then one submit
pub(crate) fn keystrokes(word: &str) -> Result<Vec<Keystroke>, EmitError> {
    if word.is_empty() {
        return Err(EmitError::EmptyWord);
    }
    Ok(word
        .chars()
        .map(Keystroke::Char)
        .chain(std::iter::once(Keystroke::Submit))
        .collect())
}

/// `enigo` backed emitter with a fixed pause after each key
#[derive(Debug, Clone)]
pub struct EnigoEmitter {
    key_delay: Duration,
}

impl EnigoEmitter {
    pub fn new(key_delay: Duration) -> Self {
        Self { key_delay }
    }
}

impl ActionEmitter for EnigoEmitter {
    fn emit(&self, word: &str) -> Result<(), EmitError> {
        let plan = keystrokes(word)?;

        // Enigo is not Send, so each call builds its own handle
        let mut enigo =
            Enigo::new(&Settings::default()).map_err(|e| EmitError::Backend(e.to_string()))?;

        for stroke in plan {
            let key = match stroke {
                Keystroke::Char(c) => Key::Unicode(c),
                Keystroke::Submit => Key::Return,
            };
            enigo
                .key(key, Direction::Click)
                .map_err(|e| EmitError::KeySimulation(e.to_string()))?;
            thread::sleep(self.key_delay);
        }

        tracing::debug!(word, "keystrokes sent");
        Ok(())
    }
}

/// Current mouse pointer position in screen pixels
pub fn pointer_position() -> Result<(i32, i32), EmitError> {
    let enigo = Enigo::new(&Settings::default()).map_err(|e| EmitError::Backend(e.to_string()))?;
    enigo
        .location()
        .map_err(|e| EmitError::Backend(e.to_string()))
}
