use anyhow::{Context, Result};
use image::{GrayImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

use tft_data::GameData;

/// Templates and crops are both resized to this square before comparison
const MATCH_SIZE: u32 = 48;

/// Minimum NCC score to accept a match
const MIN_CONFIDENCE: f64 = 0.4;

/// Crops with a pixel std-dev below this are treated as empty slots
const EMPTY_SLOT_STD: f64 = 5.0;

/// Best template hit for one slot crop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub champion: String,
    pub cost: Option<u32>,
    pub confidence: f64,
}

struct ChampionTemplate {
    champion: String,
    cost: Option<u32>,
    gray: GrayImage,
    mean: f64,
    std_dev: f64,
}

/// Matches slot crops against champion art templates.
///
/// Templates live in `data_dir/templates/champions/*.png`; the file stem
/// (underscores for spaces) names the champion. Stems that don't resolve
/// against the registry are kept as-is so matching still works with a
/// stale champions.json.
pub struct ChampionMatcher {
    templates: Vec<ChampionTemplate>,
}

impl ChampionMatcher {
    pub fn load(data_dir: &Path, data: &GameData) -> Result<Self> {
        let templates_dir = data_dir.join("templates").join("champions");
        let mut templates = Vec::new();

        if !templates_dir.is_dir() {
            warn!(
                "No template directory at {}. Champion recognition disabled.",
                templates_dir.display()
            );
            return Ok(Self { templates });
        }

        let entries = std::fs::read_dir(&templates_dir)
            .with_context(|| format!("Read {}", templates_dir.display()))?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("png") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let display_name = stem.replace('_', " ");

            let (champion, cost) = match data.champion(&display_name) {
                Some(c) => (c.name.clone(), Some(c.cost)),
                None => {
                    debug!("Template '{}' not in champion registry", display_name);
                    (display_name.clone(), None)
                }
            };

            match load_template(&path, champion, cost) {
                Ok(tmpl) => templates.push(tmpl),
                Err(e) => warn!("Failed to load template {}: {}", path.display(), e),
            }
        }

        info!(
            "ChampionMatcher loaded {} templates from {}",
            templates.len(),
            templates_dir.display()
        );
        Ok(Self { templates })
    }

    /// Match a slot crop against all templates; None means no confident hit
    /// or an (almost) empty slot.
    pub fn match_champion(&self, slot_image: &RgbaImage) -> Option<MatchResult> {
        if self.templates.is_empty() {
            return None;
        }

        let gray = image::imageops::grayscale(slot_image);
        let resized = image::imageops::resize(
            &gray,
            MATCH_SIZE,
            MATCH_SIZE,
            image::imageops::FilterType::Triangle,
        );
        let (input_mean, input_std) = compute_stats(&resized);

        if input_std < EMPTY_SLOT_STD {
            return None;
        }

        let mut best_score = f64::NEG_INFINITY;
        let mut best_idx = 0;
        for (i, tmpl) in self.templates.iter().enumerate() {
            let score = normalized_cross_correlation(
                &resized,
                input_mean,
                input_std,
                &tmpl.gray,
                tmpl.mean,
                tmpl.std_dev,
            );
            if score > best_score {
                best_score = score;
                best_idx = i;
            }
        }

        if best_score >= MIN_CONFIDENCE {
            let tmpl = &self.templates[best_idx];
            Some(MatchResult {
                champion: tmpl.champion.clone(),
                cost: tmpl.cost,
                confidence: best_score,
            })
        } else {
            None
        }
    }

    pub fn template_count(&self) -> usize {
        self.templates.len()
    }
}

fn load_template(path: &Path, champion: String, cost: Option<u32>) -> Result<ChampionTemplate> {
    let img = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let gray = img.to_luma8();
    let resized = image::imageops::resize(
        &gray,
        MATCH_SIZE,
        MATCH_SIZE,
        image::imageops::FilterType::Triangle,
    );
    let (mean, std_dev) = compute_stats(&resized);

    Ok(ChampionTemplate {
        champion,
        cost,
        gray: resized,
        mean,
        std_dev,
    })
}

fn compute_stats(img: &GrayImage) -> (f64, f64) {
    let n = (img.width() * img.height()) as f64;
    if n == 0.0 {
        return (0.0, 0.0);
    }
    let mean = img.pixels().map(|p| p[0] as f64).sum::<f64>() / n;
    let variance = img
        .pixels()
        .map(|p| (p[0] as f64 - mean).powi(2))
        .sum::<f64>()
        / n;
    (mean, variance.sqrt())
}

/// Zero-mean normalized cross-correlation between two same-sized images,
/// in [-1.0, 1.0].
fn normalized_cross_correlation(
    img: &GrayImage,
    img_mean: f64,
    img_std: f64,
    tmpl: &GrayImage,
    tmpl_mean: f64,
    tmpl_std: f64,
) -> f64 {
    debug_assert_eq!(img.dimensions(), tmpl.dimensions());

    let denom = img_std * tmpl_std;
    if denom < 1e-10 {
        return 0.0;
    }

    let n = (img.width() * img.height()) as f64;
    let cross: f64 = img
        .pixels()
        .zip(tmpl.pixels())
        .map(|(ip, tp)| (ip[0] as f64 - img_mean) * (tp[0] as f64 - tmpl_mean))
        .sum();

    cross / (n * denom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textured(seed: u32) -> GrayImage {
        GrayImage::from_fn(MATCH_SIZE, MATCH_SIZE, |x, y| {
            image::Luma([((x * 7 + y * 13 + seed) % 256) as u8])
        })
    }

    #[test]
    fn test_ncc_identical_is_one() {
        let img = textured(0);
        let (mean, std) = compute_stats(&img);
        let score = normalized_cross_correlation(&img, mean, std, &img, mean, std);
        assert!((score - 1.0).abs() < 0.001, "got {}", score);
    }

    #[test]
    fn test_ncc_unrelated_is_low() {
        let img1 =
            GrayImage::from_fn(MATCH_SIZE, MATCH_SIZE, |x, _| image::Luma([(x % 256) as u8]));
        let img2 =
            GrayImage::from_fn(MATCH_SIZE, MATCH_SIZE, |_, y| image::Luma([(y % 256) as u8]));
        let (m1, s1) = compute_stats(&img1);
        let (m2, s2) = compute_stats(&img2);
        let score = normalized_cross_correlation(&img1, m1, s1, &img2, m2, s2);
        assert!(score < 0.5, "got {}", score);
    }

    #[test]
    fn test_uniform_crop_is_empty_slot() {
        let matcher = ChampionMatcher {
            templates: vec![ChampionTemplate {
                champion: "Jinx".to_string(),
                cost: Some(4),
                gray: textured(3),
                mean: 0.0,
                std_dev: 1.0,
            }],
        };
        let img = RgbaImage::from_pixel(100, 100, image::Rgba([128, 128, 128, 255]));
        assert!(matcher.match_champion(&img).is_none());
    }

    #[test]
    fn test_matching_template_wins() {
        let art = textured(5);
        let (mean, std_dev) = compute_stats(&art);
        let matcher = ChampionMatcher {
            templates: vec![
                ChampionTemplate {
                    champion: "Vi".to_string(),
                    cost: Some(3),
                    gray: GrayImage::from_fn(MATCH_SIZE, MATCH_SIZE, |x, _| {
                        image::Luma([(x % 256) as u8])
                    }),
                    mean: 127.0,
                    std_dev: 60.0,
                },
                ChampionTemplate {
                    champion: "Jinx".to_string(),
                    cost: Some(4),
                    gray: art.clone(),
                    mean,
                    std_dev,
                },
            ],
        };

        // Feed the Jinx art back in as an RGBA crop
        let crop = RgbaImage::from_fn(MATCH_SIZE, MATCH_SIZE, |x, y| {
            let v = art.get_pixel(x, y)[0];
            image::Rgba([v, v, v, 255])
        });
        let result = matcher.match_champion(&crop).unwrap();
        assert_eq!(result.champion, "Jinx");
        assert!(result.confidence > 0.9);
    }
}
