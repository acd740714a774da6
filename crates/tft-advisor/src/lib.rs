use anyhow::Result;
use regex::Regex;
use tracing::{debug, info};

pub mod discard;
pub mod llm;
pub mod prompt;
pub mod synergy;

pub use discard::{sell_advice, SellAdvice, INTEREST_CAP};
pub use llm::{LlmClient, LlmConfig};
pub use synergy::{active_traits, comps_in_play, trait_tally, CompMatch};

use tft_data::{ChampionIndex, GameData};
use tft_state::GameState;

const NO_LLM_FALLBACK: &str = "Sorry, I can only advise on selling, rerolling, leveling, \
or managing gold without an AI key. Try asking 'what should I sell?', 'should I reroll?', \
or 'when to level up?'.";

/// Routes a question to the rules engine or the language model.
///
/// Inventory, econ, and synergy questions are answered locally from the
/// data files; everything else is forwarded to the LLM with the assembled
/// game context.
pub struct Advisor {
    llm: Option<LlmClient>,
}

impl Advisor {
    pub fn new(llm: Option<LlmClient>) -> Self {
        if llm.is_none() {
            info!("Advisor running without an LLM client; rules engine only");
        }
        Self { llm }
    }

    pub async fn answer(
        &self,
        state: &GameState,
        data: &GameData,
        index: &ChampionIndex,
        query: &str,
    ) -> Result<String> {
        let q = query.to_lowercase();

        if q.contains("sell") {
            return Ok(self.answer_sell(&q, state, data, index));
        }
        if q.contains("reroll") || q.contains("roll down") {
            return Ok(reroll_advice(state));
        }
        if q.contains("level") && (q.contains("when") || q.contains("should")) {
            return Ok(leveling_advice(state));
        }
        if q.contains("interest") || (q.contains("save") && q.contains("gold")) {
            return Ok(interest_advice(state));
        }
        if q.contains("trait") || q.contains("synerg") || q.contains("comp") {
            return Ok(synergy_summary(state, data));
        }

        match &self.llm {
            Some(llm) => {
                let prompt = prompt::build_prompt(state, data, query);
                llm.generate(&prompt).await
            }
            None => Ok(NO_LLM_FALLBACK.to_string()),
        }
    }

    /// "I have X and Y, what should I sell": champions can be named in
    /// the question or come from the tracked roster.
    fn answer_sell(
        &self,
        q: &str,
        state: &GameState,
        data: &GameData,
        index: &ChampionIndex,
    ) -> String {
        let named = Regex::new(r"i have (.+?)\s*[,.]?\s*what should i sell")
            .expect("static regex")
            .captures(q)
            .and_then(|c| c.get(1))
            .map(|m| index.extract(m.as_str()))
            .unwrap_or_default();

        let roster = if named.is_empty() {
            state.roster()
        } else {
            named
        };
        debug!("Sell query over roster: {:?}", roster);

        if roster.is_empty() {
            return "Tell me which champions you have first, for example: \
                    'I have Jinx and Vi, what should I sell?'"
                .to_string();
        }

        sell_advice(&roster, state.gold, data).message
    }
}

fn reroll_advice(state: &GameState) -> String {
    match state.gold {
        Some(g) if g > INTEREST_CAP => format!(
            "You have {} gold - rerolling down to {} keeps your full interest. \
             Roll if you're hunting upgrades, stop at {}.",
            g, INTEREST_CAP, INTEREST_CAP
        ),
        Some(g) => format!(
            "You only have {} gold - below the {} interest cap. \
             Only reroll if you're about to lose streak or need to stabilize.",
            g, INTEREST_CAP
        ),
        None => "I don't know your gold yet. As a rule: reroll above 50 gold, \
                 hold below it unless you're stabilizing."
            .to_string(),
    }
}

fn leveling_advice(state: &GameState) -> String {
    let base = "Standard tempo: level to 5 at stage 2-1, 6 at 3-2, 7 at 4-1, \
                and 8 around 4-5 if your economy allows.";
    match (state.level, state.gold) {
        (Some(level), Some(gold)) => format!(
            "You're level {} with {} gold. {} Keep {} gold banked after leveling when you can.",
            level, gold, base, INTEREST_CAP
        ),
        _ => base.to_string(),
    }
}

fn interest_advice(state: &GameState) -> String {
    match state.gold {
        Some(g) if g >= INTEREST_CAP => format!(
            "You have {} gold - you're at maximum interest. Good job; spend anything above {} freely.",
            g, INTEREST_CAP
        ),
        Some(g) => format!(
            "You have {} gold. Interest pays 1 per 10 banked up to {}, so every 10 you save \
             compounds. Avoid dipping below a breakpoint unless you must.",
            g, INTEREST_CAP
        ),
        None => format!(
            "Interest pays 1 gold per 10 banked, capped at {}. Park your economy there when stable.",
            INTEREST_CAP
        ),
    }
}

fn synergy_summary(state: &GameState, data: &GameData) -> String {
    let roster = state.roster();
    if roster.is_empty() {
        return "I don't see any champions on your board or bench yet.".to_string();
    }

    let mut parts = Vec::new();

    let active = active_traits(&roster, data);
    if active.is_empty() {
        parts.push("No traits are active yet.".to_string());
    } else {
        let listed: Vec<String> = active
            .iter()
            .map(|(name, count)| format!("{} ({})", name, count))
            .collect();
        parts.push(format!("Active traits: {}.", listed.join(", ")));
    }

    let comps = comps_in_play(&roster, data);
    if comps.is_empty() {
        parts.push("None of the meta comps overlap your roster.".to_string());
    } else {
        let top: Vec<String> = comps
            .iter()
            .take(3)
            .map(|m| {
                format!(
                    "{} ({} of {} units)",
                    m.name,
                    m.overlap.len(),
                    m.overlap.len() + m.missing.len()
                )
            })
            .collect();
        parts.push(format!("Closest comps: {}.", top.join(", ")));
    }

    parts.join(" ")
}
