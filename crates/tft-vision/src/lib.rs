use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

mod champion_matcher;
mod layout;
mod ocr;

pub use champion_matcher::{ChampionMatcher, MatchResult};
pub use layout::{detect_layout, name_strip, DetectedLayout};
pub use ocr::TextReader;

use tft_data::ChampionIndex;
use tft_state::{GameState, ShopSlot};

/// Confidence assigned to a shop read that only OCR could produce
const OCR_ONLY_CONFIDENCE: f64 = 0.5;

/// Everything the vision pass extracted from one frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisionResult {
    pub shop: Vec<ShopRead>,
    /// Bench slots left to right; None for empty slots
    pub bench: Vec<Option<String>>,
    pub gold: Option<u32>,
    pub level: Option<u32>,
    pub stage: Option<String>,
}

/// One shop card read
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopRead {
    pub slot_index: usize,
    pub champion: Option<String>,
    pub cost: Option<u32>,
    pub confidence: f64,
}

impl VisionResult {
    /// Fold the vision read into a game state for the advisor.
    pub fn into_state(self) -> GameState {
        GameState {
            gold: self.gold,
            level: self.level,
            health: None,
            stage: self.stage,
            shop: self
                .shop
                .into_iter()
                .map(|s| ShopSlot {
                    index: s.slot_index,
                    champion: s.champion,
                    cost: s.cost,
                    confidence: s.confidence,
                })
                .collect(),
            bench: self.bench.into_iter().flatten().collect(),
            board: Vec::new(),
            target_comp: None,
        }
    }
}

/// Run template matching and OCR over one captured frame.
///
/// Shop cards are read twice: template match against champion art, and OCR
/// of the card's name strip fuzzy-resolved through the champion index. A
/// template hit wins; agreement between the two raises confidence; OCR
/// alone fills slots the matcher missed.
pub fn process_frame(
    frame: &RgbaImage,
    matcher: &ChampionMatcher,
    reader: &TextReader,
    index: &ChampionIndex,
) -> VisionResult {
    let layout = detect_layout(frame);
    let mut result = VisionResult::default();

    for (i, card) in layout.shop_slots.iter().enumerate() {
        let crop = tft_capture::crop_region(frame, card);
        let template_hit = matcher.match_champion(&crop);

        let ocr_name = reader
            .read_name(&tft_capture::crop_region(frame, &name_strip(card)))
            .and_then(|raw| index.resolve(&raw).map(String::from));

        let read = match (template_hit, ocr_name) {
            (Some(hit), Some(name)) if hit.champion == name => ShopRead {
                slot_index: i,
                champion: Some(hit.champion),
                cost: hit.cost,
                confidence: (hit.confidence + 0.15).min(1.0),
            },
            (Some(hit), _) => ShopRead {
                slot_index: i,
                champion: Some(hit.champion),
                cost: hit.cost,
                confidence: hit.confidence,
            },
            (None, Some(name)) => ShopRead {
                slot_index: i,
                champion: Some(name),
                cost: None,
                confidence: OCR_ONLY_CONFIDENCE,
            },
            (None, None) => ShopRead {
                slot_index: i,
                champion: None,
                cost: None,
                confidence: 0.0,
            },
        };
        result.shop.push(read);
    }

    for slot in &layout.bench_slots {
        let crop = tft_capture::crop_region(frame, slot);
        result
            .bench
            .push(matcher.match_champion(&crop).map(|m| m.champion));
    }

    result.gold = reader.read_number(&tft_capture::crop_region(frame, &layout.gold));
    result.level = reader.read_number(&tft_capture::crop_region(frame, &layout.level));
    result.stage = reader.read_stage(&tft_capture::crop_region(frame, &layout.stage));

    debug!(
        "Frame processed: {} shop reads, gold={:?}, level={:?}, stage={:?}",
        result.shop.iter().filter(|s| s.champion.is_some()).count(),
        result.gold,
        result.level,
        result.stage
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_state_flattens_bench() {
        let vision = VisionResult {
            shop: vec![ShopRead {
                slot_index: 0,
                champion: Some("Jinx".into()),
                cost: Some(4),
                confidence: 0.8,
            }],
            bench: vec![Some("Vi".into()), None, Some("Caitlyn".into())],
            gold: Some(32),
            level: Some(6),
            stage: Some("3-2".into()),
        };
        let state = vision.into_state();
        assert_eq!(state.bench, vec!["Vi", "Caitlyn"]);
        assert_eq!(state.gold, Some(32));
        assert_eq!(state.shop_champions(), vec!["Jinx"]);
    }

    #[test]
    fn test_process_frame_on_blank_image() {
        let frame = RgbaImage::new(640, 360);
        let data = tft_data::GameData::default();
        let matcher = ChampionMatcher::load(std::path::Path::new("/nonexistent"), &data).unwrap();
        let reader = TextReader::new();
        let index = ChampionIndex::new(["Jinx"]);

        let result = process_frame(&frame, &matcher, &reader, &index);
        assert_eq!(result.shop.len(), 5);
        assert!(result.shop.iter().all(|s| s.champion.is_none()));
        assert_eq!(result.bench.len(), 9);
    }
}
