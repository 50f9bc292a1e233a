mod capture;
mod hotkey;
mod ocr;

pub use capture::{RawImage, ScreenCapture, XcapCapture};
pub use hotkey::{Binding, HotkeyManager, default_bindings};
pub use ocr::{OcrError, Recognizer, TesseractRecognizer, preprocess};
