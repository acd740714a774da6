//! Trait counting and comp inference over a partial roster.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tft_data::GameData;

/// Activation threshold assumed for traits missing from traits.json
const DEFAULT_BREAK: u32 = 2;

/// How strongly a known comp overlaps the player's roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompMatch {
    pub name: String,
    /// Roster champions the comp wants, canonical comp spelling
    pub overlap: Vec<String>,
    /// Comp units the player does not own yet
    pub missing: Vec<String>,
}

/// Count trait occurrences across a roster. Unknown champions contribute
/// nothing; duplicate copies of a champion count once.
pub fn trait_tally(roster: &[String], data: &GameData) -> HashMap<String, u32> {
    let mut seen: Vec<String> = Vec::new();
    let mut tally: HashMap<String, u32> = HashMap::new();

    for name in roster {
        let key = name.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);

        if let Some(champ) = data.champion(name) {
            for t in &champ.traits {
                *tally.entry(t.clone()).or_insert(0) += 1;
            }
        }
    }
    tally
}

/// Traits that have reached their lowest activation breakpoint, sorted by
/// count descending then name.
pub fn active_traits(roster: &[String], data: &GameData) -> Vec<(String, u32)> {
    let mut active: Vec<(String, u32)> = trait_tally(roster, data)
        .into_iter()
        .filter(|(name, count)| {
            let needed = data
                .trait_def(name)
                .map(|t| t.first_break())
                .unwrap_or(DEFAULT_BREAK);
            *count >= needed
        })
        .collect();

    active.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    active
}

/// Comps the player could plausibly be building: any comp sharing at least
/// one unit with the roster, ranked by overlap (more shared units first)
/// and completeness (fewer missing units first).
pub fn comps_in_play(roster: &[String], data: &GameData) -> Vec<CompMatch> {
    let owned: Vec<String> = roster.iter().map(|r| r.to_lowercase()).collect();

    let mut matches: Vec<CompMatch> = data
        .comps
        .iter()
        .filter_map(|comp| {
            let mut overlap = Vec::new();
            let mut missing = Vec::new();
            for unit in &comp.units {
                if owned.contains(&unit.to_lowercase()) {
                    overlap.push(unit.clone());
                } else {
                    missing.push(unit.clone());
                }
            }
            if overlap.is_empty() {
                None
            } else {
                Some(CompMatch {
                    name: comp.name.clone(),
                    overlap,
                    missing,
                })
            }
        })
        .collect();

    matches.sort_by(|a, b| {
        b.overlap
            .len()
            .cmp(&a.overlap.len())
            .then_with(|| a.missing.len().cmp(&b.missing.len()))
            .then_with(|| a.name.cmp(&b.name))
    });
    matches
}
