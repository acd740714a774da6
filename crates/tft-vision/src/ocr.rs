use image::{GrayImage, RgbaImage};
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, warn};

/// Upscale factor applied to crops before OCR; the in-game text is tiny
const OCR_SCALE: u32 = 3;

/// Reads text from cropped game UI regions using the Tesseract CLI.
/// Degrades gracefully when Tesseract is not installed.
pub struct TextReader {
    tesseract_available: bool,
    temp_dir: PathBuf,
}

impl TextReader {
    pub fn new() -> Self {
        let tesseract_available = check_tesseract();
        if tesseract_available {
            debug!("Tesseract OCR available");
        } else {
            warn!("Tesseract not found. OCR disabled. Install with: brew install tesseract");
        }

        let temp_dir = std::env::temp_dir().join("tft_copilot_ocr");
        let _ = std::fs::create_dir_all(&temp_dir);

        Self {
            tesseract_available,
            temp_dir,
        }
    }

    pub fn is_available(&self) -> bool {
        self.tesseract_available
    }

    /// Read a number (gold count, level) from a cropped region
    pub fn read_number(&self, image: &RgbaImage) -> Option<u32> {
        let text = self.recognize(image, Some("0123456789"))?;
        let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    }

    /// Read a stage string (e.g. "3-2") from a cropped region
    pub fn read_stage(&self, image: &RgbaImage) -> Option<String> {
        let text = self.recognize(image, Some("0123456789-"))?;
        // Stage must look like digit-digit
        if text.contains('-') && text.len() >= 3 {
            Some(text)
        } else {
            None
        }
    }

    /// Read a champion name from a shop card's text strip. Returns the raw
    /// recognized text; fuzzy resolution against the registry happens in
    /// the caller.
    pub fn read_name(&self, image: &RgbaImage) -> Option<String> {
        let text = self.recognize(image, None)?;
        let cleaned: String = text
            .chars()
            .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace() || *c == '\'')
            .collect();
        let cleaned = cleaned.trim().to_string();
        if cleaned.len() >= 2 {
            Some(cleaned)
        } else {
            None
        }
    }

    fn recognize(&self, image: &RgbaImage, whitelist: Option<&str>) -> Option<String> {
        if !self.tesseract_available {
            return None;
        }
        let processed = preprocess_for_ocr(image);

        let temp_path = self.temp_dir.join("ocr_input.png");
        if processed.save(&temp_path).is_err() {
            return None;
        }

        let mut cmd = Command::new("tesseract");
        cmd.arg(&temp_path)
            .arg("stdout")
            .arg("--psm")
            .arg("7"); // single text line
        if let Some(chars) = whitelist {
            cmd.arg("-c").arg(format!("tessedit_char_whitelist={}", chars));
        }

        let output = cmd.output().ok()?;
        if !output.status.success() {
            return None;
        }

        let text = String::from_utf8(output.stdout).ok()?;
        let trimmed = text.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            debug!("OCR result: '{}'", trimmed);
            Some(trimmed)
        }
    }
}

impl Default for TextReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Pre-process a crop for OCR: upscale, grayscale, then threshold so the
/// bright in-game text becomes dark on a white background (Tesseract's
/// preference).
fn preprocess_for_ocr(image: &RgbaImage) -> GrayImage {
    let gray = image::imageops::grayscale(image);
    let upscaled = image::imageops::resize(
        &gray,
        gray.width() * OCR_SCALE,
        gray.height() * OCR_SCALE,
        image::imageops::FilterType::Lanczos3,
    );

    let (w, h) = upscaled.dimensions();
    GrayImage::from_fn(w, h, |x, y| {
        if upscaled.get_pixel(x, y)[0] > 140 {
            image::Luma([0u8])
        } else {
            image::Luma([255u8])
        }
    })
}

fn check_tesseract() -> bool {
    Command::new("tesseract")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_inverts_and_upscales() {
        let img = RgbaImage::from_fn(10, 10, |x, _| {
            if x < 5 {
                image::Rgba([200, 200, 200, 255]) // bright text
            } else {
                image::Rgba([30, 30, 30, 255]) // dark background
            }
        });
        let processed = preprocess_for_ocr(&img);
        assert_eq!(processed.dimensions(), (30, 30));
        assert_eq!(processed.get_pixel(0, 0)[0], 0); // text is black
        assert_eq!(processed.get_pixel(29, 0)[0], 255); // background is white
    }

    #[test]
    fn test_reader_without_tesseract_returns_none() {
        let reader = TextReader {
            tesseract_available: false,
            temp_dir: std::env::temp_dir(),
        };
        let img = RgbaImage::new(10, 10);
        assert!(reader.read_number(&img).is_none());
        assert!(reader.read_name(&img).is_none());
    }
}
