use anyhow::{Context, Result};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use xcap::Window;

/// Normalized screen region (0.0-1.0 coordinates relative to game window)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Calibrated regions for a 1920x1080 reference resolution. Everything is
/// stored as fractions so any window size works.
pub mod regions {
    use super::ScreenRegion;

    pub const SHOP_SLOTS: usize = 5;
    pub const BENCH_SLOTS: usize = 9;

    /// Full shop card: art plus the name/cost strip at the bottom.
    pub fn shop_slot(index: usize) -> ScreenRegion {
        let slot_width = 0.0724;
        let slot_height = 0.167;
        let start_x = 0.284;
        let stride = 0.0755;
        ScreenRegion {
            x: start_x + (index as f64) * stride,
            y: 0.769,
            width: slot_width,
            height: slot_height,
        }
    }

    /// Name text strip at the bottom of a shop card, for OCR.
    pub fn shop_name(index: usize) -> ScreenRegion {
        let card = shop_slot(index);
        ScreenRegion {
            x: card.x + card.width * 0.05,
            y: card.y + card.height * 0.78,
            width: card.width * 0.75,
            height: card.height * 0.17,
        }
    }

    /// Bench slot. The bench is a single row of nine slots above the HUD.
    pub fn bench_slot(index: usize) -> ScreenRegion {
        let start_x = 0.172;
        let stride = 0.0724;
        ScreenRegion {
            x: start_x + (index as f64) * stride,
            y: 0.713,
            width: 0.066,
            height: 0.098,
        }
    }

    /// Gold counter (yellow number near bottom-center)
    pub fn gold() -> ScreenRegion {
        ScreenRegion {
            x: 0.870,
            y: 0.880,
            width: 0.035,
            height: 0.025,
        }
    }

    /// Player level indicator (left of shop area)
    pub fn level() -> ScreenRegion {
        ScreenRegion {
            x: 0.255,
            y: 0.890,
            width: 0.020,
            height: 0.025,
        }
    }

    /// Stage indicator (top-center, e.g. "3-2")
    pub fn stage() -> ScreenRegion {
        ScreenRegion {
            x: 0.465,
            y: 0.005,
            width: 0.070,
            height: 0.030,
        }
    }
}

/// Status of the capture loop, published alongside frames
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureStatus {
    pub is_capturing: bool,
    pub window_found: bool,
    pub window_title: Option<String>,
    pub resolution: Option<(u32, u32)>,
    pub last_capture_ms: Option<u64>,
}

/// Game window titles to search for
const GAME_WINDOW_TITLES: &[&str] = &[
    "league of legends (tm) client",
    "league of legends",
    "teamfight tactics",
    "tft",
];

/// Find the game window, preferring an explicit title override when set.
pub fn find_game_window(title_override: Option<&str>) -> Option<Window> {
    let windows = match Window::all() {
        Ok(w) => w,
        Err(e) => {
            warn!("Failed to enumerate windows: {}", e);
            return None;
        }
    };

    for window in windows {
        let title = match window.title() {
            Ok(t) => t.to_lowercase(),
            Err(_) => continue,
        };
        let hit = match title_override {
            Some(wanted) => title.contains(&wanted.to_lowercase()),
            None => GAME_WINDOW_TITLES.iter().any(|t| title.contains(t)),
        };
        if hit {
            debug!("Found game window: {}", title);
            return Some(window);
        }
    }
    None
}

/// List all visible window titles, for the `windows` CLI command.
pub fn list_window_titles() -> Vec<String> {
    match Window::all() {
        Ok(windows) => windows
            .into_iter()
            .filter_map(|w| w.title().ok())
            .filter(|t| !t.is_empty())
            .collect(),
        Err(e) => {
            warn!("Failed to enumerate windows: {}", e);
            Vec::new()
        }
    }
}

fn capture_frame(window: &Window) -> Result<RgbaImage> {
    window
        .capture_image()
        .context("Failed to capture window image")
}

/// Crop a region from a captured frame using normalized coordinates
pub fn crop_region(frame: &RgbaImage, region: &ScreenRegion) -> RgbaImage {
    let (w, h) = (frame.width(), frame.height());
    let x = (region.x * w as f64) as u32;
    let y = (region.y * h as f64) as u32;
    let rw = (region.width * w as f64) as u32;
    let rh = (region.height * h as f64) as u32;

    let x = x.min(w.saturating_sub(1));
    let y = y.min(h.saturating_sub(1));
    let rw = rw.min(w - x).max(1);
    let rh = rh.min(h - y).max(1);

    image::imageops::crop_imm(frame, x, y, rw, rh).to_image()
}

/// Background capture loop. Publishes frames and status through watch
/// channels; a missing window publishes a default status and keeps polling.
pub async fn capture_loop(
    frame_tx: watch::Sender<Option<Arc<RgbaImage>>>,
    status_tx: watch::Sender<CaptureStatus>,
    capture_interval: Duration,
    title_override: Option<String>,
    stop: Arc<AtomicBool>,
) {
    info!("Capture loop started, interval: {:?}", capture_interval);

    let mut last_capture = Instant::now();

    loop {
        if stop.load(Ordering::Relaxed) {
            info!("Capture loop stopping (stop signal received)");
            break;
        }

        let override_ref = title_override.clone();
        // xcap is sync; keep both discovery and capture off the runtime
        let captured = tokio::task::spawn_blocking(move || {
            let window = find_game_window(override_ref.as_deref())?;
            let title = window.title().unwrap_or_default();
            Some((capture_frame(&window), title))
        })
        .await;

        match captured {
            Ok(Some((Ok(frame), title))) => {
                let resolution = (frame.width(), frame.height());
                let now = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_millis() as u64;

                let _ = status_tx.send(CaptureStatus {
                    is_capturing: true,
                    window_found: true,
                    window_title: Some(title),
                    resolution: Some(resolution),
                    last_capture_ms: Some(now),
                });
                let _ = frame_tx.send(Some(Arc::new(frame)));
                last_capture = Instant::now();
            }
            Ok(Some((Err(e), title))) => {
                warn!("Capture of '{}' failed: {}", title, e);
                let _ = status_tx.send(CaptureStatus {
                    window_found: true,
                    window_title: Some(title),
                    ..Default::default()
                });
            }
            Ok(None) => {
                let _ = status_tx.send(CaptureStatus::default());
            }
            Err(e) => {
                warn!("Capture task panicked: {}", e);
            }
        }

        let elapsed = last_capture.elapsed();
        if elapsed < capture_interval {
            tokio::time::sleep(capture_interval - elapsed).await;
        } else {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    let _ = status_tx.send(CaptureStatus::default());
    info!("Capture loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shop_and_bench_regions_in_bounds() {
        for i in 0..regions::SHOP_SLOTS {
            let r = regions::shop_slot(i);
            assert!(r.x >= 0.0 && r.x + r.width <= 1.01);
            let n = regions::shop_name(i);
            assert!(n.y > r.y, "name strip sits below the card art");
        }
        for i in 0..regions::BENCH_SLOTS {
            let r = regions::bench_slot(i);
            assert!(r.x >= 0.0 && r.x + r.width <= 1.01);
            assert!(r.y < regions::shop_slot(0).y, "bench sits above the shop");
        }
    }

    #[test]
    fn test_crop_region() {
        let img = RgbaImage::new(1920, 1080);
        let region = ScreenRegion {
            x: 0.5,
            y: 0.5,
            width: 0.1,
            height: 0.1,
        };
        let cropped = crop_region(&img, &region);
        assert_eq!(cropped.width(), 192);
        assert_eq!(cropped.height(), 108);
    }

    #[test]
    fn test_crop_region_clamps_overflow() {
        let img = RgbaImage::new(100, 100);
        let region = ScreenRegion {
            x: 0.95,
            y: 0.95,
            width: 0.5,
            height: 0.5,
        };
        let cropped = crop_region(&img, &region);
        assert!(cropped.width() <= 5);
        assert!(cropped.height() <= 5);
    }
}
