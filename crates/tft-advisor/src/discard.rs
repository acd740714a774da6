//! Which owned champions are safe to sell, given the comps still in play.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tft_data::GameData;

use crate::synergy::comps_in_play;

/// Keeping gold at or above this earns maximum interest
pub const INTEREST_CAP: u32 = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellAdvice {
    pub sell: Vec<String>,
    pub keep: Vec<String>,
    /// Spoken-ready phrasing of the advice
    pub message: String,
}

/// A champion is safe to sell when no comp the player could plausibly be
/// building (any comp sharing a unit with the roster) wants it.
pub fn sell_advice(roster: &[String], gold: Option<u32>, data: &GameData) -> SellAdvice {
    let usable: HashSet<String> = comps_in_play(roster, data)
        .into_iter()
        .flat_map(|m| m.overlap.into_iter().chain(m.missing))
        .map(|u| u.to_lowercase())
        .collect();

    let mut sell = Vec::new();
    let mut keep = Vec::new();
    for name in roster {
        if usable.contains(&name.to_lowercase()) {
            keep.push(name.clone());
        } else {
            sell.push(name.clone());
        }
    }

    let mut message = if sell.is_empty() {
        "All of those fit into at least one common comp - keep them for now.".to_string()
    } else {
        format!(
            "Sell: {}. Keep the others for potential comp synergies.",
            sell.join(", ")
        )
    };

    match gold {
        Some(g) if g < INTEREST_CAP => {
            message.push_str(&format!(
                " You have less than {} gold - avoid spending below {} to maximize interest.",
                INTEREST_CAP, INTEREST_CAP
            ));
        }
        Some(_) => {
            message.push_str(&format!(
                " Good job saving at least {} gold for interest.",
                INTEREST_CAP
            ));
        }
        None => {}
    }

    SellAdvice { sell, keep, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tft_data::CompData;

    fn data() -> GameData {
        let mut data = GameData::default();
        data.comps = vec![CompData {
            name: "Sniper Squad".into(),
            units: vec!["Jinx".into(), "Caitlyn".into(), "Vi".into()],
            traits: vec![],
        }];
        data
    }

    #[test]
    fn test_off_comp_champion_is_sold() {
        let data = data();
        let roster = vec!["Jinx".to_string(), "Garen".to_string()];
        let advice = sell_advice(&roster, None, &data);
        assert_eq!(advice.sell, vec!["Garen"]);
        assert_eq!(advice.keep, vec!["Jinx"]);
        assert!(advice.message.starts_with("Sell: Garen"));
    }

    #[test]
    fn test_comp_units_not_on_roster_still_protected() {
        // Vi is missing from the roster but wanted by an in-play comp, so
        // buying her later stays an option; owning her would mean keeping her.
        let data = data();
        let roster = vec!["Jinx".to_string(), "Vi".to_string()];
        let advice = sell_advice(&roster, None, &data);
        assert!(advice.sell.is_empty());
        assert!(advice.message.contains("keep them"));
    }

    #[test]
    fn test_gold_interest_notes() {
        let data = data();
        let roster = vec!["Jinx".to_string()];
        let low = sell_advice(&roster, Some(30), &data);
        assert!(low.message.contains("less than 50 gold"));
        let high = sell_advice(&roster, Some(60), &data);
        assert!(high.message.contains("at least 50 gold"));
        let unknown = sell_advice(&roster, None, &data);
        assert!(!unknown.message.contains("gold"));
    }

    #[test]
    fn test_no_comps_in_play_sells_everything() {
        let data = data();
        let roster = vec!["Garen".to_string(), "Darius".to_string()];
        let advice = sell_advice(&roster, None, &data);
        assert_eq!(advice.sell.len(), 2);
        assert!(advice.keep.is_empty());
    }
}
