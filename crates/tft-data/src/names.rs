use std::collections::HashMap;

use levenshtein::levenshtein;
use tracing::debug;

/// Words stripped from voice/OCR segments before name resolution
const FILLER_WORDS: &[&str] = &[
    "with", "plus", "also", "have", "got", "a", "an", "the", "is", "are", "my",
];

/// Hand-maintained short names players actually say. Generated aliases
/// (lowercase and no-space variants) are added on top of these.
const SHORT_NAMES: &[(&str, &str)] = &[
    ("mf", "miss fortune"),
    ("gp", "gangplank"),
    ("ez", "ezreal"),
    ("tf", "twisted fate"),
    ("cait", "caitlyn"),
    ("ww", "warwick"),
    ("kat", "katarina"),
    ("asol", "aurelion sol"),
];

/// Fuzzy lookup from noisy OCR text or free-form speech to canonical
/// champion names.
#[derive(Debug, Clone, Default)]
pub struct ChampionIndex {
    /// Canonical display names, as loaded from the registry
    canonical: Vec<String>,
    /// Lowercased alias -> index into `canonical`
    aliases: HashMap<String, usize>,
}

impl ChampionIndex {
    pub fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut index = Self::default();
        for name in names {
            index.insert(name);
        }
        index
    }

    fn insert(&mut self, name: &str) {
        let idx = self.canonical.len();
        self.canonical.push(name.to_string());

        let lower = name.to_lowercase();
        self.aliases.insert(lower.clone(), idx);
        if lower.contains(' ') {
            self.aliases.insert(lower.replace(' ', ""), idx);
        }
        for (short, full) in SHORT_NAMES {
            if *full == lower {
                self.aliases.insert((*short).to_string(), idx);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }

    /// Resolve one noisy name to a canonical champion name.
    /// Tries exact alias, then substring, then bounded edit distance.
    pub fn resolve(&self, input: &str) -> Option<&str> {
        let cleaned = input.trim().to_lowercase();
        if cleaned.is_empty() {
            return None;
        }

        if let Some(&idx) = self.aliases.get(cleaned.as_str()) {
            return Some(&self.canonical[idx]);
        }

        // Substring: an alias appearing inside the segment ("a jinx maybe").
        // Short aliases are excluded, they match too eagerly inside words.
        for (alias, &idx) in &self.aliases {
            if alias.len() >= 4 && cleaned.contains(alias.as_str()) {
                return Some(&self.canonical[idx]);
            }
        }

        self.resolve_fuzzy(&cleaned)
    }

    /// Edit-distance match against canonical names. The allowed distance
    /// scales with name length, rejecting anything beyond a third of the
    /// characters; inputs under 3 chars never fuzzy-match.
    fn resolve_fuzzy(&self, cleaned: &str) -> Option<&str> {
        if cleaned.len() < 3 {
            return None;
        }

        let mut best: Option<(usize, usize)> = None;
        for (idx, name) in self.canonical.iter().enumerate() {
            let dist = levenshtein(cleaned, &name.to_lowercase());
            if best.map_or(true, |(d, _)| dist < d) {
                best = Some((dist, idx));
            }
        }

        let (dist, idx) = best?;
        let max_dist = (self.canonical[idx].len() / 3).max(1);
        if dist <= max_dist {
            debug!(
                "Fuzzy-resolved '{}' -> '{}' (distance {})",
                cleaned, self.canonical[idx], dist
            );
            Some(&self.canonical[idx])
        } else {
            None
        }
    }

    /// Pull every recognizable champion name out of a free-text snippet,
    /// e.g. "jinx, vi and a caitlyn". Order is preserved, duplicates dropped.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();

        for segment in split_segments(&text.to_lowercase()) {
            let words: Vec<&str> = segment
                .split_whitespace()
                .filter(|w| !FILLER_WORDS.contains(w))
                .collect();
            if words.is_empty() {
                continue;
            }
            let cleaned = words.join(" ");

            if let Some(name) = self.resolve(&cleaned) {
                push_unique(&mut found, name);
                continue;
            }

            // Segment as a whole failed; try each word on its own so
            // "sell warwick maybe" still yields Warwick.
            for word in words {
                if word.len() >= 3 {
                    if let Some(name) = self.resolve(word) {
                        push_unique(&mut found, name);
                        break;
                    }
                }
            }
        }

        found
    }
}

fn split_segments(text: &str) -> Vec<String> {
    text.replace(" and ", ",")
        .replace(" plus ", ",")
        .replace(" & ", ",")
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn push_unique(found: &mut Vec<String>, name: &str) {
    if !found.iter().any(|f| f == name) {
        found.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> ChampionIndex {
        ChampionIndex::new([
            "Jinx",
            "Vi",
            "Caitlyn",
            "Miss Fortune",
            "Twisted Fate",
            "Warwick",
        ])
    }

    #[test]
    fn test_exact_and_alias() {
        let idx = index();
        assert_eq!(idx.resolve("jinx"), Some("Jinx"));
        assert_eq!(idx.resolve("MISS FORTUNE"), Some("Miss Fortune"));
        assert_eq!(idx.resolve("missfortune"), Some("Miss Fortune"));
        assert_eq!(idx.resolve("mf"), Some("Miss Fortune"));
        assert_eq!(idx.resolve("ww"), Some("Warwick"));
    }

    #[test]
    fn test_fuzzy_tolerates_ocr_noise() {
        let idx = index();
        // Dropped and substituted characters, typical tesseract output
        assert_eq!(idx.resolve("caitlin"), Some("Caitlyn"));
        assert_eq!(idx.resolve("warwik"), Some("Warwick"));
        assert_eq!(idx.resolve("miss fortun"), Some("Miss Fortune"));
    }

    #[test]
    fn test_no_false_positive() {
        let idx = index();
        assert_eq!(idx.resolve(""), None);
        assert_eq!(idx.resolve("zz"), None);
        assert_eq!(idx.resolve("completely unrelated"), None);
    }

    #[test]
    fn test_extract_list() {
        let idx = index();
        let got = idx.extract("I have jinx, vi and a caitlyn");
        assert_eq!(got, vec!["Jinx", "Vi", "Caitlyn"]);
    }

    #[test]
    fn test_extract_dedupes() {
        let idx = index();
        let got = idx.extract("jinx and jinx and warwick");
        assert_eq!(got, vec!["Jinx", "Warwick"]);
    }

    #[test]
    fn test_extract_ignores_filler() {
        let idx = index();
        let got = idx.extract("got the twisted fate plus warwick");
        assert_eq!(got, vec!["Twisted Fate", "Warwick"]);
    }
}
