//! Default installer window background.

use crate::bundler::error::{Error, Result};
use image::{Rgb, RgbImage};
use std::path::Path;

const TOP: [u8; 3] = [250, 250, 252];
const BOTTOM: [u8; 3] = [226, 230, 236];

/// Renders the background used when no `--background` is given.
///
/// A soft vertical gradient with a chevron between the app and
/// `Applications` positions, hinting at drag-to-install.
pub fn render_default(width: u32, height: u32, arrow_from: u32, arrow_to: u32, arrow_y: u32) -> RgbImage {
    let mut img = RgbImage::from_fn(width, height, |_, y| {
        let t = if height > 1 {
            y as f32 / (height - 1) as f32
        } else {
            0.0
        };
        let mut px = [0u8; 3];
        for (c, slot) in px.iter_mut().enumerate() {
            *slot = (f32::from(TOP[c]) + (f32::from(BOTTOM[c]) - f32::from(TOP[c])) * t).round() as u8;
        }
        Rgb(px)
    });

    draw_chevron(&mut img, arrow_from, arrow_to, arrow_y);
    img
}

/// Draws a small `>` halfway between the two icon columns.
fn draw_chevron(img: &mut RgbImage, from: u32, to: u32, y: u32) {
    let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
    if hi - lo < 40 {
        return;
    }

    let cx = lo + (hi - lo) / 2;
    let arm = 14i64;
    let color = Rgb([150, 156, 166]);

    for i in 0..=arm {
        for thickness in 0..3 {
            let x = i64::from(cx) - arm / 2 + i + thickness;
            for dy in [i - arm, arm - i] {
                let py = i64::from(y) + dy;
                if x >= 0 && py >= 0 && (x as u32) < img.width() && (py as u32) < img.height() {
                    img.put_pixel(x as u32, py as u32, color);
                }
            }
        }
    }
}

/// Renders and saves the default background as PNG.
pub async fn write_default(
    path: &Path,
    width: u32,
    height: u32,
    arrow_from: u32,
    arrow_to: u32,
    arrow_y: u32,
) -> Result<()> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        render_default(width, height, arrow_from, arrow_to, arrow_y).save(&path)
    })
    .await
    .map_err(|e| Error::GenericError(format!("Background rendering task failed: {}", e)))??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_runs_top_to_bottom() {
        let img = render_default(660, 400, 180, 480, 170);
        assert_eq!(img.dimensions(), (660, 400));
        assert_eq!(img.get_pixel(0, 0).0, TOP);
        assert_eq!(img.get_pixel(0, 399).0, BOTTOM);
    }

    #[test]
    fn chevron_is_drawn_between_icons() {
        let img = render_default(660, 400, 180, 480, 170);
        let marked = (300..360).any(|x| img.get_pixel(x, 170).0 == [150, 156, 166]);
        assert!(marked);
    }

    #[tokio::test]
    async fn writes_png() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("background.png");
        write_default(&path, 100, 80, 10, 90, 40).await.unwrap();
        let loaded = image::open(&path).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (100, 80));
    }
}
