//! One-shot capture + recognition check:
//! cargo run -p wbt-ocr --bin test_ocr -- <left> <top> <width> <height>

use anyhow::{Context, Result};
use wbt_ocr::{Recognizer, ScreenCapture, TesseractRecognizer, XcapCapture};
use wbt_types::CaptureRegion;

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("debug").init();

    let args: Vec<i64> = std::env::args()
        .skip(1)
        .map(|a| a.parse().context("arguments must be integers"))
        .collect::<Result<_>>()?;
    let region = match args.as_slice() {
        [left, top, width, height] => CaptureRegion {
            left: *left as i32,
            top: *top as i32,
            width: *width as u32,
            height: *height as u32,
        },
        _ => CaptureRegion {
            left: 0,
            top: 0,
            width: 400,
            height: 80,
        },
    };

    tracing::info!("1. Capturing {region}");
    let start = std::time::Instant::now();
    let image = XcapCapture.capture(region)?;
    tracing::info!("   {}x{} in {:?}", image.width, image.height, start.elapsed());

    let prepared = wbt_ocr::preprocess(&image, 140)?;
    prepared.save("test_capture.png")?;
    tracing::info!("   Saved preprocessed capture to test_capture.png");

    tracing::info!("2. Running tesseract");
    let recognizer = TesseractRecognizer::locate(None, 140)?;
    let start = std::time::Instant::now();
    match recognizer.recognize(&image) {
        Ok(text) => {
            tracing::info!("   {:?}", start.elapsed());
            for line in text.lines().take(5) {
                tracing::info!("   > {}", line);
            }
        }
        Err(e) => tracing::error!("   Failed: {e:#}"),
    }

    Ok(())
}
