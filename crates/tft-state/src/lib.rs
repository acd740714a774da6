use serde::{Deserialize, Serialize};

mod parse;

pub use parse::StateUpdate;

/// The full game state the assistant reasons about, assembled from screen
/// capture and/or spoken input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameState {
    pub gold: Option<u32>,
    pub level: Option<u32>,
    pub health: Option<u32>,
    /// Stage string as shown in game, e.g. "4-2"
    pub stage: Option<String>,
    pub shop: Vec<ShopSlot>,
    /// Champion names on the bench
    pub bench: Vec<String>,
    /// Champion names fielded on the board
    pub board: Vec<String>,
    /// Comp the player said they are going for
    pub target_comp: Option<String>,
}

/// One shop card as read from the screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopSlot {
    pub index: usize,
    pub champion: Option<String>,
    pub cost: Option<u32>,
    pub confidence: f64,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a parsed update. Scalars overwrite when present; champion
    /// lists replace only when the update actually named champions.
    pub fn apply(&mut self, update: StateUpdate) {
        if update.gold.is_some() {
            self.gold = update.gold;
        }
        if update.level.is_some() {
            self.level = update.level;
        }
        if update.health.is_some() {
            self.health = update.health;
        }
        if update.stage.is_some() {
            self.stage = update.stage;
        }
        if !update.board.is_empty() {
            self.board = update.board;
        }
        if !update.bench.is_empty() {
            self.bench = update.bench;
        }
        if !update.shop.is_empty() {
            self.shop = update
                .shop
                .into_iter()
                .enumerate()
                .map(|(index, champion)| ShopSlot {
                    index,
                    champion: Some(champion),
                    cost: None,
                    confidence: 1.0,
                })
                .collect();
        }
        if update.target_comp.is_some() {
            self.target_comp = update.target_comp;
        }
    }

    /// Every champion the player owns, board first.
    pub fn roster(&self) -> Vec<String> {
        let mut roster = self.board.clone();
        for name in &self.bench {
            if !roster.iter().any(|r| r == name) {
                roster.push(name.clone());
            }
        }
        roster
    }

    /// Champion names currently offered in the shop.
    pub fn shop_champions(&self) -> Vec<String> {
        self.shop
            .iter()
            .filter_map(|s| s.champion.clone())
            .collect()
    }

    /// One-line summary used in prompts and logs.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(stage) = &self.stage {
            parts.push(format!("Stage: {}", stage));
        }
        if let Some(level) = self.level {
            parts.push(format!("Level: {}", level));
        }
        if let Some(gold) = self.gold {
            parts.push(format!("Gold: {}", gold));
        }
        if let Some(health) = self.health {
            parts.push(format!("Health: {}", health));
        }
        if !self.board.is_empty() {
            parts.push(format!("Board: {}", self.board.join(", ")));
        }
        if !self.bench.is_empty() {
            parts.push(format!("Bench: {}", self.bench.join(", ")));
        }
        let shop = self.shop_champions();
        if !shop.is_empty() {
            parts.push(format!("Shop: {}", shop.join(", ")));
        }
        if let Some(comp) = &self.target_comp {
            parts.push(format!("Target comp: {}", comp));
        }
        if parts.is_empty() {
            "No game state information available".to_string()
        } else {
            parts.join(" | ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_dedupes_across_board_and_bench() {
        let state = GameState {
            board: vec!["Jinx".into(), "Vi".into()],
            bench: vec!["Vi".into(), "Caitlyn".into()],
            ..Default::default()
        };
        assert_eq!(state.roster(), vec!["Jinx", "Vi", "Caitlyn"]);
    }

    #[test]
    fn test_apply_keeps_unset_fields() {
        let mut state = GameState {
            gold: Some(30),
            board: vec!["Jinx".into()],
            ..Default::default()
        };
        state.apply(StateUpdate {
            level: Some(7),
            ..Default::default()
        });
        assert_eq!(state.gold, Some(30));
        assert_eq!(state.level, Some(7));
        assert_eq!(state.board, vec!["Jinx"]);
    }

    #[test]
    fn test_summary_mentions_sections() {
        let state = GameState {
            gold: Some(50),
            stage: Some("4-2".into()),
            board: vec!["Jinx".into()],
            ..Default::default()
        };
        let s = state.summary();
        assert!(s.contains("Gold: 50"));
        assert!(s.contains("Stage: 4-2"));
        assert!(s.contains("Jinx"));
    }

    #[test]
    fn test_serde_round_trip() {
        let state = GameState {
            gold: Some(10),
            shop: vec![ShopSlot {
                index: 0,
                champion: Some("Vi".into()),
                cost: Some(3),
                confidence: 0.9,
            }],
            ..Default::default()
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: GameState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.shop[0].champion.as_deref(), Some("Vi"));
    }
}
