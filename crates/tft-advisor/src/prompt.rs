//! Assembles the context prompt sent to the language model.

use serde_json::json;
use tft_data::GameData;
use tft_state::GameState;
use tracing::warn;

/// Hard cap on prompt size; anything longer is truncated with a marker
pub const MAX_PROMPT_CHARS: usize = 30_000;

const SYSTEM_CONTEXT: &str = "You are a Teamfight Tactics assistant. \
You know the player's current board, bench, shop, and gold from JSON, \
and the list of meta comps with their units. \
Answer the question dynamically based on that data and be concise. \
Provide strategic advice about team composition, economy management, \
and positioning when relevant.";

/// System context + JSON data context + the user's question.
pub fn build_prompt(state: &GameState, data: &GameData, question: &str) -> String {
    let context = json!({
        "game_state": state,
        "comps": data.comps,
    });
    let context_json =
        serde_json::to_string_pretty(&context).unwrap_or_else(|_| "{}".to_string());

    let prompt = format!(
        "{}\n\nDATA CONTEXT (JSON):\n{}\n\nUSER QUESTION:\n{}",
        SYSTEM_CONTEXT, context_json, question
    );

    if prompt.len() > MAX_PROMPT_CHARS {
        warn!(
            "Prompt is {} chars, truncating to {}",
            prompt.len(),
            MAX_PROMPT_CHARS
        );
        let mut cut = MAX_PROMPT_CHARS;
        while !prompt.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &prompt[..cut])
    } else {
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tft_data::CompData;

    #[test]
    fn test_prompt_contains_state_and_question() {
        let state = GameState {
            gold: Some(50),
            board: vec!["Jinx".into()],
            ..Default::default()
        };
        let mut data = GameData::default();
        data.comps.push(CompData {
            name: "Sniper Squad".into(),
            units: vec!["Jinx".into()],
            traits: vec![],
        });

        let prompt = build_prompt(&state, &data, "should I roll down?");
        assert!(prompt.contains("Teamfight Tactics assistant"));
        assert!(prompt.contains("\"Jinx\""));
        assert!(prompt.contains("Sniper Squad"));
        assert!(prompt.ends_with("should I roll down?"));
    }

    #[test]
    fn test_prompt_truncated_at_cap() {
        let state = GameState::default();
        let mut data = GameData::default();
        for i in 0..2000 {
            data.comps.push(CompData {
                name: format!("Comp {}", i),
                units: vec!["SomeChampionWithALongName".into(); 8],
                traits: vec![],
            });
        }
        let prompt = build_prompt(&state, &data, "hello?");
        assert!(prompt.len() <= MAX_PROMPT_CHARS + 3);
        assert!(prompt.ends_with("..."));
    }
}
