use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, GrayImage, ImageEncoder, RgbaImage};

use crate::capture::RawImage;

const LETTER_WHITELIST: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    /// Startup cannot continue without the engine
    #[error("tesseract not found (looked for {0}); install it or set TESSERACT_PATH")]
    EngineMissing(String),
}

/// Turns captured pixels into best-effort raw text. Blocking.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, image: &RawImage) -> Result<String>;
}

/// Runs the `tesseract` binary in single-line mode on a preprocessed capture
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    command: PathBuf,
    threshold: u8,
}

impl TesseractRecognizer {
    /// Uses `explicit` if given, else `tesseract` from PATH, else the default
    /// Windows install location. Fails if none of them answers `--version`.
    pub fn locate(explicit: Option<&Path>, threshold: u8) -> Result<Self, OcrError> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        match explicit {
            Some(path) => candidates.push(path.to_path_buf()),
            None => {
                candidates.push(PathBuf::from("tesseract"));
                if cfg!(windows) {
                    candidates.push(PathBuf::from(r"C:\Program Files\Tesseract-OCR\tesseract.exe"));
                }
            }
        }

        for candidate in &candidates {
            let probe = Command::new(candidate)
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
            if matches!(probe, Ok(status) if status.success()) {
                tracing::info!(path = %candidate.display(), "tesseract found");
                return Ok(Self {
                    command: candidate.clone(),
                    threshold,
                });
            }
        }

        let tried = candidates
            .iter()
            .map(|c| c.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(OcrError::EngineMissing(tried))
    }
}

impl Recognizer for TesseractRecognizer {
    fn recognize(&self, image: &RawImage) -> Result<String> {
        let prepared = preprocess(image, self.threshold)?;
        let png = encode_png(&prepared)?;

        let mut child = Command::new(&self.command)
            .args(["stdin", "stdout", "--psm", "7", "-c"])
            .arg(format!("tessedit_char_whitelist={LETTER_WHITELIST}"))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to start tesseract")?;

        // Tesseract reads all of stdin before writing anything
        child
            .stdin
            .take()
            .context("tesseract stdin unavailable")?
            .write_all(&png)
            .context("Failed to send image to tesseract")?;

        let output = child
            .wait_with_output()
            .context("Failed to wait for tesseract")?;
        if !output.status.success() {
            bail!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Grayscale, stretch contrast to the full range, then binarize at `threshold`
pub fn preprocess(image: &RawImage, threshold: u8) -> Result<GrayImage> {
    let rgba = RgbaImage::from_raw(image.width, image.height, image.data.clone())
        .context("Pixel buffer does not match its dimensions")?;
    let mut gray = image::DynamicImage::ImageRgba8(rgba).into_luma8();

    let (lo, hi) = gray
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p.0[0]), hi.max(p.0[0])));
    let span = hi.saturating_sub(lo);

    for pixel in gray.pixels_mut() {
        let value = pixel.0[0];
        let stretched = if span == 0 {
            value
        } else {
            ((value - lo) as u32 * 255 / span as u32) as u8
        };
        pixel.0[0] = if stretched < threshold { 0 } else { 255 };
    }

    Ok(gray)
}

fn encode_png(image: &GrayImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    PngEncoder::new(&mut buffer)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::L8,
        )
        .context("Failed to encode PNG")?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RawImage {
        RawImage {
            data: rgba.repeat((width * height) as usize),
            width,
            height,
        }
    }

    #[test]
    fn test_preprocess_binarizes() {
        // Left half dark gray, right half light gray
        let mut image = solid(4, 1, [60, 60, 60, 255]);
        image.data[8..].copy_from_slice(&[200, 200, 200, 255, 200, 200, 200, 255]);

        let gray = preprocess(&image, 140).unwrap();
        let values: Vec<u8> = gray.pixels().map(|p| p.0[0]).collect();
        assert_eq!(values, vec![0, 0, 255, 255]);
    }

    #[test]
    fn test_preprocess_rejects_bad_buffer() {
        let image = RawImage {
            data: vec![0; 7],
            width: 2,
            height: 2,
        };
        assert!(preprocess(&image, 140).is_err());
    }

    #[test]
    fn test_missing_engine_is_reported() {
        let missing = Path::new("/definitely/not/here/tesseract");
        match TesseractRecognizer::locate(Some(missing), 140) {
            Err(OcrError::EngineMissing(tried)) => assert!(tried.contains("not/here")),
            Ok(_) => panic!("nonexistent binary accepted"),
        }
    }
}
