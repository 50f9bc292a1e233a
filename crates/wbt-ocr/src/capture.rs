use anyhow::{Context, Result, bail};
use wbt_types::CaptureRegion;
use xcap::Monitor;

/// Captured pixels, RGBA8, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Grabs the pixels under a screen region. Blocking.
pub trait ScreenCapture: Send + Sync {
    fn capture(&self, region: CaptureRegion) -> Result<RawImage>;
}

/// Monitor capture through `xcap`, cropped to the region
#[derive(Debug, Default, Clone, Copy)]
pub struct XcapCapture;

impl ScreenCapture for XcapCapture {
    fn capture(&self, region: CaptureRegion) -> Result<RawImage> {
        let monitors = Monitor::all().context("Failed to get monitors")?;

        let monitor = monitors
            .iter()
            .find(|m| within(region, (m.x(), m.y(), m.width(), m.height())))
            .or(monitors.first())
            .context("No monitor found")?;

        let origin = |edge: i32, start: i32| u32::try_from(i64::from(edge) - i64::from(start));
        let (Ok(origin_x), Ok(origin_y)) =
            (origin(region.left, monitor.x()), origin(region.top, monitor.y()))
        else {
            bail!("Region {region} lies outside every monitor");
        };

        let image = monitor.capture_image().context("Failed to capture screen")?;

        let cropped = xcap::image::imageops::crop_imm(
            &image,
            origin_x,
            origin_y,
            region.width,
            region.height,
        )
        .to_image();

        if cropped.width() == 0 || cropped.height() == 0 {
            bail!("Region {region} is empty after clipping to the monitor");
        }

        Ok(RawImage {
            width: cropped.width(),
            height: cropped.height(),
            data: cropped.into_raw(),
        })
    }
}

/// Whether `region` lies fully inside the monitor at `(x, y)` of `width` by
/// `height`
fn within(region: CaptureRegion, (x, y, width, height): (i32, i32, u32, u32)) -> bool {
    let (left, top) = (i64::from(region.left), i64::from(region.top));
    let (x, y) = (i64::from(x), i64::from(y));
    left >= x
        && top >= y
        && left + i64::from(region.width) <= x + i64::from(width)
        && top + i64::from(region.height) <= y + i64::from(height)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONITOR: (i32, i32, u32, u32) = (0, 0, 1920, 1080);

    fn region(left: i32, top: i32, width: u32, height: u32) -> CaptureRegion {
        CaptureRegion {
            left,
            top,
            width,
            height,
        }
    }

    #[test]
    fn test_region_within_monitor() {
        assert!(within(region(100, 200, 300, 40), MONITOR));
        assert!(within(region(1620, 1040, 300, 40), MONITOR));
        assert!(!within(region(1621, 1040, 300, 40), MONITOR));
        assert!(!within(region(-1, 0, 10, 10), MONITOR));
        // Second monitor to the left of the primary one
        assert!(within(region(-1500, 100, 300, 40), (-1920, 0, 1920, 1080)));
    }

    #[test]
    fn test_huge_regions_do_not_wrap() {
        assert!(!within(region(0, 0, u32::MAX, 40), MONITOR));
        assert!(!within(region(0, 0, 300, i32::MAX as u32 + 1), MONITOR));
        assert!(!within(region(i32::MAX, i32::MAX, 1, 1), MONITOR));
        assert!(!within(
            region(i32::MAX - 10, 0, 20, 20),
            (i32::MAX - 100, 0, u32::MAX, 1080)
        ));
    }
}
