use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{error, info};

use tft_advisor::Advisor;
use tft_data::{ChampionIndex, GameData};
use tft_state::{GameState, StateUpdate};

use crate::pipeline::Pipeline;
use crate::speech::Speaker;

/// Interactive loop. Each line is first offered to the state parser, and
/// any recognized game-state info merges into the manual state; the line
/// is then routed to the advisor as a question.
pub async fn run(
    advisor: &Advisor,
    data: &GameData,
    index: &ChampionIndex,
    pipeline: Option<&Pipeline>,
    speaker: &Speaker,
) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    let mut manual = GameState::new();

    println!("Tell me about your game or ask a question. Examples:");
    println!("  I have 50 gold, level 7, with Jinx and Vi on my board");
    println!("  what should I sell?");
    println!("  should I reroll?");
    println!("Ctrl-D to quit.");

    loop {
        let line = match editor.readline("tft> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line);

        let update = StateUpdate::parse(line, index);
        let is_question = line.contains('?') || update.is_none();

        if let Some(update) = update {
            manual.apply(update);
            info!("Manual state updated: {}", manual.summary());
            if !is_question {
                println!("Noted. {}", manual.summary());
                continue;
            }
        }

        let state = effective_state(pipeline, &manual);
        match advisor.answer(&state, data, index, line).await {
            Ok(answer) => {
                println!("{}", answer);
                speaker.speak(&answer).await;
            }
            Err(e) => {
                error!("Advisor error: {:#}", e);
                let apology = "Sorry, I'm having trouble connecting to the AI service.";
                println!("{}", apology);
                speaker.speak(apology).await;
            }
        }
    }

    Ok(())
}

/// Live screen state overlaid with whatever the player told us directly;
/// spoken input wins over vision on conflicts.
fn effective_state(pipeline: Option<&Pipeline>, manual: &GameState) -> GameState {
    let mut state = pipeline.map(|p| p.latest_state()).unwrap_or_default();

    if manual.gold.is_some() {
        state.gold = manual.gold;
    }
    if manual.level.is_some() {
        state.level = manual.level;
    }
    if manual.health.is_some() {
        state.health = manual.health;
    }
    if manual.stage.is_some() {
        state.stage = manual.stage.clone();
    }
    if !manual.board.is_empty() {
        state.board = manual.board.clone();
    }
    if !manual.bench.is_empty() {
        state.bench = manual.bench.clone();
    }
    if !manual.shop.is_empty() {
        state.shop = manual.shop.clone();
    }
    if manual.target_comp.is_some() {
        state.target_comp = manual.target_comp.clone();
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_state_prefers_manual() {
        let manual = GameState {
            gold: Some(70),
            board: vec!["Jinx".into()],
            ..Default::default()
        };
        let state = effective_state(None, &manual);
        assert_eq!(state.gold, Some(70));
        assert_eq!(state.board, vec!["Jinx"]);
    }
}
