use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::RgbaImage;
use tokio::sync::watch;
use tracing::{info, warn};

use tft_capture::CaptureStatus;
use tft_data::{ChampionIndex, GameData};
use tft_state::GameState;
use tft_vision::{ChampionMatcher, TextReader, VisionResult};

use crate::config::AppConfig;

/// Owns the capture → vision → state pipeline tasks.
pub struct Pipeline {
    stop: Arc<AtomicBool>,
    status_rx: watch::Receiver<CaptureStatus>,
    vision_rx: watch::Receiver<Option<VisionResult>>,
}

impl Pipeline {
    /// Spawn the capture loop and the vision loop. The matcher loads on a
    /// blocking task since template decoding is pure CPU work.
    pub fn start(config: &AppConfig, data: Arc<GameData>, index: Arc<ChampionIndex>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));

        let (frame_tx, frame_rx) = watch::channel::<Option<Arc<RgbaImage>>>(None);
        let (status_tx, status_rx) = watch::channel(CaptureStatus::default());
        let (vision_tx, vision_rx) = watch::channel::<Option<VisionResult>>(None);

        tokio::spawn(tft_capture::capture_loop(
            frame_tx,
            status_tx,
            config.capture_interval(),
            config.capture.window_title.clone(),
            stop.clone(),
        ));

        let data_dir = config.data_dir();
        let stop_vision = stop.clone();
        let mut vision_frame_rx = frame_rx;
        tokio::spawn(async move {
            let init_data = data.clone();
            let init = tokio::task::spawn_blocking(move || {
                let matcher = match ChampionMatcher::load(&data_dir, &init_data) {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("Failed to load champion templates: {}. Recognition disabled.", e);
                        return None;
                    }
                };
                let reader = TextReader::new();
                info!(
                    "Vision ready: {} templates, OCR {}",
                    matcher.template_count(),
                    if reader.is_available() { "enabled" } else { "disabled" }
                );
                Some((Arc::new(matcher), Arc::new(reader)))
            })
            .await;

            let Ok(Some((matcher, reader))) = init else {
                warn!("Vision loop not started");
                return;
            };

            let mut last_shop: Vec<String> = Vec::new();

            loop {
                if stop_vision.load(Ordering::Relaxed) {
                    break;
                }
                if vision_frame_rx.changed().await.is_err() {
                    break;
                }

                let frame = vision_frame_rx.borrow().clone();
                let Some(frame) = frame else { continue };

                let m = matcher.clone();
                let r = reader.clone();
                let idx = index.clone();
                let processed = tokio::task::spawn_blocking(move || {
                    tft_vision::process_frame(&frame, &m, &r, &idx)
                })
                .await;

                if let Ok(vision) = processed {
                    let shop: Vec<String> = vision
                        .shop
                        .iter()
                        .filter_map(|s| s.champion.clone())
                        .collect();
                    if !shop.is_empty() && shop != last_shop {
                        info!("Shop: {}", shop.join(", "));
                        last_shop = shop;
                    }
                    let _ = vision_tx.send(Some(vision));
                }
            }
        });

        info!("Pipeline started");
        Self {
            stop,
            status_rx,
            vision_rx,
        }
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
        info!("Pipeline stop requested");
    }

    pub fn capture_status(&self) -> CaptureStatus {
        self.status_rx.borrow().clone()
    }

    pub fn latest_vision(&self) -> Option<VisionResult> {
        self.vision_rx.borrow().clone()
    }

    /// Latest screen-derived game state; empty when nothing was captured yet.
    pub fn latest_state(&self) -> GameState {
        self.latest_vision()
            .map(VisionResult::into_state)
            .unwrap_or_default()
    }
}
