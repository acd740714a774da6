//! Turns free-form transcript text ("I have 50 gold, level 7, with Jinx and
//! Vi on my board") into a partial state update. Champion mentions are
//! resolved through the fuzzy name index so misheard names still land.

use regex::Regex;
use tft_data::ChampionIndex;
use tracing::debug;

/// Partial game state recognized in one utterance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub gold: Option<u32>,
    pub level: Option<u32>,
    pub health: Option<u32>,
    pub stage: Option<String>,
    pub board: Vec<String>,
    pub bench: Vec<String>,
    pub shop: Vec<String>,
    pub target_comp: Option<String>,
}

const BOARD_KEYWORDS: &[&str] = &["on my board", "on board", "my board has"];
const BENCH_KEYWORDS: &[&str] = &["on my bench", "on bench", "bench has"];
const SHOP_KEYWORDS: &[&str] = &["in shop", "shop has", "shop shows", "can buy"];
const COMP_KEYWORDS: &[&str] = &[
    "want to play",
    "trying to play",
    "going for",
    "trying to build",
];

/// Words that end a champion-list section when they appear after a keyword
const SECTION_STOPS: &[&str] = &[
    "on my board",
    "on board",
    "on my bench",
    "on bench",
    "bench has",
    "in shop",
    "shop has",
    "shop shows",
    "can buy",
    "want to play",
    "trying to",
    "going for",
    "playing",
];

impl StateUpdate {
    /// Parse one utterance. Returns None when nothing state-like was found,
    /// so the caller can fall through to question answering.
    pub fn parse(text: &str, index: &ChampionIndex) -> Option<Self> {
        let q = text.to_lowercase();
        let mut update = Self::default();

        update.gold = capture_number(&q, r"(?:i have|with|got)\s*(\d+)\s*gold");
        update.level = capture_number(&q, r"(?:level|lvl)\s*(\d+)");
        update.health = capture_number(&q, r"(?:health|hp|life)\s*(?:is\s*)?(\d+)")
            .or_else(|| capture_number(&q, r"(\d+)\s*(?:health|hp)"));
        update.stage = capture_text(&q, r"(?:round|stage)\s*(\d+[-–]\d+)");

        if let Some(section) = find_section(&q, BOARD_KEYWORDS) {
            update.board = index.extract(section);
        }
        if update.board.is_empty() {
            // "with X and Y on my board" puts the names before the keyword
            if let Some(names) = capture_text(&q, r"with\s+([a-z\s,]+?)\s+on\s+(?:my\s+)?board")
            {
                update.board = index.extract(&names);
            }
        }

        if let Some(section) = find_section(&q, BENCH_KEYWORDS) {
            update.bench = index.extract(section);
        }
        if update.bench.is_empty() {
            if let Some(names) = capture_text(&q, r"([a-z\s,]+?)\s+benched") {
                update.bench = index.extract(&names);
            }
        }

        if let Some(section) = find_section(&q, SHOP_KEYWORDS) {
            update.shop = index.extract(section);
        }

        for keyword in COMP_KEYWORDS {
            if let Some(pos) = q.find(keyword) {
                let after = &q[pos + keyword.len()..];
                let comp: String = after
                    .chars()
                    .take_while(|c| c.is_ascii_alphabetic() || c.is_whitespace())
                    .collect();
                let comp = comp.trim();
                if !comp.is_empty() {
                    update.target_comp = Some(comp.to_string());
                }
                break;
            }
        }

        if update == Self::default() {
            None
        } else {
            debug!("Parsed state update from '{}': {:?}", text, update);
            Some(update)
        }
    }
}

fn capture_number(q: &str, pattern: &str) -> Option<u32> {
    let re = Regex::new(pattern).expect("static regex");
    re.captures(q)?.get(1)?.as_str().parse().ok()
}

fn capture_text(q: &str, pattern: &str) -> Option<String> {
    let re = Regex::new(pattern).expect("static regex");
    Some(re.captures(q)?.get(1)?.as_str().to_string())
}

/// Slice out the text after the first matching section keyword, ending at
/// the next section keyword so "bench has vi in shop jinx" splits cleanly.
fn find_section<'a>(q: &'a str, keywords: &[&str]) -> Option<&'a str> {
    for keyword in keywords {
        if let Some(pos) = q.find(keyword) {
            let after = &q[pos + keyword.len()..];
            let mut end = after.len();
            for stop in SECTION_STOPS {
                if let Some(stop_pos) = after.find(stop) {
                    end = end.min(stop_pos);
                }
            }
            return Some(&after[..end]);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> ChampionIndex {
        ChampionIndex::new(["Jinx", "Vi", "Caitlyn", "Ekko", "Jayce", "Warwick"])
    }

    #[test]
    fn test_parse_numbers() {
        let u = StateUpdate::parse("I have 50 gold, level 7 and 30 hp", &index()).unwrap();
        assert_eq!(u.gold, Some(50));
        assert_eq!(u.level, Some(7));
        assert_eq!(u.health, Some(30));
    }

    #[test]
    fn test_parse_stage() {
        let u = StateUpdate::parse("round 4-2, I have 40 gold", &index()).unwrap();
        assert_eq!(u.stage.as_deref(), Some("4-2"));
        assert_eq!(u.gold, Some(40));
    }

    #[test]
    fn test_board_with_pattern() {
        let u = StateUpdate::parse("with jinx and vi on my board", &index()).unwrap();
        assert_eq!(u.board, vec!["Jinx", "Vi"]);
    }

    #[test]
    fn test_sections_do_not_bleed() {
        let u = StateUpdate::parse(
            "my board has jinx and vi, bench has caitlyn, shop shows jayce",
            &index(),
        )
        .unwrap();
        assert_eq!(u.board, vec!["Jinx", "Vi"]);
        assert_eq!(u.bench, vec!["Caitlyn"]);
        assert_eq!(u.shop, vec!["Jayce"]);
    }

    #[test]
    fn test_benched_suffix() {
        let u = StateUpdate::parse("caitlyn and ekko benched", &index()).unwrap();
        assert_eq!(u.bench, vec!["Caitlyn", "Ekko"]);
    }

    #[test]
    fn test_target_comp() {
        let u = StateUpdate::parse("i'm going for enforcers this game", &index()).unwrap();
        assert_eq!(u.target_comp.as_deref(), Some("enforcers this game"));
    }

    #[test]
    fn test_non_state_text_is_none() {
        assert!(StateUpdate::parse("should I reroll now?", &index()).is_none());
        assert!(StateUpdate::parse("", &index()).is_none());
    }
}
