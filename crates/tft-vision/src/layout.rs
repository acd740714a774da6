use image::RgbaImage;
use tft_capture::{regions, ScreenRegion};
use tracing::debug;

/// Where the game UI elements sit in this frame. Shop cards are detected
/// dynamically; everything else uses the calibrated reference regions,
/// which hold up well because the HUD scales uniformly with the window.
#[derive(Debug, Clone)]
pub struct DetectedLayout {
    pub shop_slots: Vec<ScreenRegion>,
    pub bench_slots: Vec<ScreenRegion>,
    pub gold: ScreenRegion,
    pub level: ScreenRegion,
    pub stage: ScreenRegion,
    /// Normalized y of the HUD top boundary
    pub hud_top: f64,
}

pub fn detect_layout(frame: &RgbaImage) -> DetectedLayout {
    let h = frame.height();
    let hud_top_px = find_hud_top(frame);
    let hud_top = hud_top_px as f64 / h as f64;
    debug!("HUD boundary at y={} ({:.1}%)", hud_top_px, hud_top * 100.0);

    let shop_slots = match find_shop_cards(frame, hud_top_px) {
        Some(cards) => {
            debug!("Detected {} shop card(s) dynamically", cards.len());
            cards
        }
        None => {
            debug!("Shop card detection failed, using calibrated regions");
            (0..regions::SHOP_SLOTS).map(regions::shop_slot).collect()
        }
    };

    DetectedLayout {
        shop_slots,
        bench_slots: (0..regions::BENCH_SLOTS).map(regions::bench_slot).collect(),
        gold: regions::gold(),
        level: regions::level(),
        stage: regions::stage(),
        hud_top,
    }
}

/// Name text strip at the bottom of a detected shop card.
pub fn name_strip(card: &ScreenRegion) -> ScreenRegion {
    ScreenRegion {
        x: card.x + card.width * 0.05,
        y: card.y + card.height * 0.78,
        width: card.width * 0.75,
        height: card.height * 0.17,
    }
}

/// Mean brightness of sampled pixels in one row (middle 60% of the width).
fn row_brightness(frame: &RgbaImage, y: u32) -> f64 {
    let w = frame.width();
    let step = (w / 50).max(1);
    let mut sum = 0.0;
    let mut count = 0u32;
    let mut x = w / 5;
    while x < w * 4 / 5 {
        let px = frame.get_pixel(x, y);
        sum += (px[0] as f64 + px[1] as f64 + px[2] as f64) / 3.0;
        count += 1;
        x += step;
    }
    sum / count.max(1) as f64
}

fn window_brightness(frame: &RgbaImage, start_y: u32, rows: u32) -> f64 {
    let h = frame.height();
    let end = (start_y + rows).min(h);
    if start_y >= end {
        return 0.0;
    }
    (start_y..end).map(|y| row_brightness(frame, y)).sum::<f64>() / (end - start_y) as f64
}

/// The HUD bar is a dark strip between the board and the shop cards,
/// always around 74-90% of frame height. Find the strongest brightness
/// drop in that band where the region below is genuinely dark.
fn find_hud_top(frame: &RgbaImage) -> u32 {
    let h = frame.height();
    let search_top = (h as f64 * 0.74) as u32;
    let search_bottom = (h as f64 * 0.90) as u32;
    let window = 5u32;

    let mut best_drop = 0.0;
    let mut best_y = (h as f64 * 0.80) as u32;

    let end = search_bottom.saturating_sub(window * 2);
    for y in search_top..end.max(search_top) {
        let above = window_brightness(frame, y, window);
        let below = window_brightness(frame, y + window, window);
        let drop = above - below;
        if drop > best_drop && drop > 5.0 && below < 55.0 {
            best_drop = drop;
            best_y = y + window;
        }
    }

    best_y
}

/// Detect the five shop cards as bright column segments in the card band.
/// Returns None when the profile doesn't look like a card row (shop closed,
/// combat overlay, loading screen).
fn find_shop_cards(frame: &RgbaImage, hud_top: u32) -> Option<Vec<ScreenRegion>> {
    let (w, h) = (frame.width(), frame.height());
    let hud_h = h.saturating_sub(hud_top);
    if hud_h < 20 {
        return None;
    }

    let band_top = hud_top + hud_h / 4;
    let band_bottom = h.saturating_sub(8);
    if band_top >= band_bottom {
        return None;
    }

    // Per-column brightness over the card band
    let y_step = ((band_bottom - band_top) / 15).max(1);
    let profile: Vec<f64> = (0..w)
        .map(|x| {
            let mut sum = 0.0;
            let mut count = 0u32;
            let mut y = band_top;
            while y < band_bottom {
                let px = frame.get_pixel(x, y);
                sum += (px[0] as f64 + px[1] as f64 + px[2] as f64) / 3.0;
                count += 1;
                y += y_step;
            }
            sum / count.max(1) as f64
        })
        .collect();

    let smoothed = smooth(&profile, (w as usize / 200).max(3));

    // Threshold between the dark gaps and the bright cards
    let dark = percentile(&smoothed, 40);
    let bright = percentile(&smoothed, 85);
    let threshold = dark + (bright - dark) * 0.35;

    let min_card_width = (w as usize / 64).max(20);
    let segments = bright_segments(&smoothed, threshold, min_card_width);
    if segments.is_empty() {
        return None;
    }

    // Evenly divide the full card span into five; detection of individual
    // gaps is unreliable when cards share border highlights.
    let span_start = segments[0].0;
    let span_end = segments.last().map(|s| s.1)?;
    let card_width = (span_end - span_start) / regions::SHOP_SLOTS;
    if card_width < min_card_width {
        return None;
    }
    let gap = (card_width as f64 * 0.03) as usize;

    let card_top = find_card_top(frame, hud_top, (span_start + span_end) / 2);
    let y = card_top as f64 / h as f64;
    let height = band_bottom as f64 / h as f64 - y;

    let wf = w as f64;
    Some(
        (0..regions::SHOP_SLOTS)
            .map(|i| {
                let s = span_start + i * card_width + gap;
                let e = span_start + (i + 1) * card_width - gap;
                ScreenRegion {
                    x: s as f64 / wf,
                    y,
                    width: (e - s) as f64 / wf,
                    height,
                }
            })
            .collect(),
    )
}

fn smooth(data: &[f64], window: usize) -> Vec<f64> {
    let half = window / 2;
    (0..data.len())
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(data.len());
            data[lo..hi].iter().sum::<f64>() / (hi - lo) as f64
        })
        .collect()
}

fn percentile(data: &[f64], pct: usize) -> f64 {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted[(sorted.len() - 1) * pct / 100]
}

/// Contiguous runs above the threshold, at least `min_width` wide.
fn bright_segments(profile: &[f64], threshold: f64, min_width: usize) -> Vec<(usize, usize)> {
    let mut segments = Vec::new();
    let mut start = None;

    for (i, &val) in profile.iter().enumerate() {
        match (start, val > threshold) {
            (None, true) => start = Some(i),
            (Some(s), false) => {
                if i - s >= min_width {
                    segments.push((s, i));
                }
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        if profile.len() - s >= min_width {
            segments.push((s, profile.len()));
        }
    }
    segments
}

/// First row below the HUD boundary where the card column lights up.
fn find_card_top(frame: &RgbaImage, hud_top: u32, mid_x: usize) -> u32 {
    let h = frame.height();
    let x = (mid_x as u32).min(frame.width().saturating_sub(1));
    for y in hud_top..h {
        let px = frame.get_pixel(x, y);
        let b = (px[0] as f64 + px[1] as f64 + px[2] as f64) / 3.0;
        if b > 45.0 {
            return y;
        }
    }
    hud_top
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Board / dark HUD bar / bright cards / dark bottom edge
    fn synthetic_frame() -> RgbaImage {
        let mut frame = RgbaImage::new(400, 200);
        let fill = |f: &mut RgbaImage, y0: u32, y1: u32, v: u8| {
            for y in y0..y1 {
                for x in 0..400 {
                    f.put_pixel(x, y, image::Rgba([v, v, v, 255]));
                }
            }
        };
        fill(&mut frame, 0, 150, 150); // board
        fill(&mut frame, 150, 160, 15); // HUD bar
        fill(&mut frame, 160, 192, 120); // card row
        fill(&mut frame, 192, 200, 10); // bottom edge

        // Dark gaps between the five cards
        for gap_x in [0, 78, 158, 238, 318, 396] {
            for x in gap_x..(gap_x + 4).min(400) {
                for y in 160..192 {
                    frame.put_pixel(x, y, image::Rgba([12, 12, 12, 255]));
                }
            }
        }
        frame
    }

    #[test]
    fn test_find_hud_top() {
        let frame = synthetic_frame();
        let hud_top = find_hud_top(&frame);
        assert!(
            (149..=153).contains(&hud_top),
            "HUD top should be ~150, got {}",
            hud_top
        );
    }

    #[test]
    fn test_detect_layout_finds_five_cards() {
        let frame = synthetic_frame();
        let layout = detect_layout(&frame);
        assert_eq!(layout.shop_slots.len(), 5);
        assert_eq!(layout.bench_slots.len(), 9);
        for slot in &layout.shop_slots {
            assert!(slot.y > layout.hud_top);
            assert!(slot.width > 0.0);
        }
    }

    #[test]
    fn test_bright_segments() {
        let profile = vec![
            10.0, 10.0, 10.0, 80.0, 80.0, 80.0, 80.0, 10.0, 10.0, 80.0, 80.0, 80.0, 10.0,
        ];
        let segments = bright_segments(&profile, 50.0, 3);
        assert_eq!(segments, vec![(3, 7), (9, 12)]);
    }

    #[test]
    fn test_smooth_spreads_peaks() {
        let data = vec![0.0, 0.0, 100.0, 100.0, 0.0, 0.0];
        let result = smooth(&data, 3);
        assert!(result[2] > 30.0 && result[2] < 100.0);
    }
}
