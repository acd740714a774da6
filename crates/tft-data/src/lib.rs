use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub mod fetch;
mod names;

pub use names::ChampionIndex;

/// Champion reference data scraped from the stats page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChampionData {
    pub name: String,
    pub cost: u32,
    pub traits: Vec<String>,
}

/// Trait definition with activation thresholds (e.g. [2, 4, 6])
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitData {
    pub name: String,
    pub breaks: Vec<u32>,
}

impl TraitData {
    /// Lowest unit count at which the trait turns on. Unknown traits
    /// default to 2 elsewhere; a trait with no breaks listed is always on.
    pub fn first_break(&self) -> u32 {
        self.breaks.first().copied().unwrap_or(1)
    }
}

/// How many units of a trait a comp fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitCount {
    pub name: String,
    pub count: u32,
}

/// A named target composition and its constituent units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompData {
    pub name: String,
    pub units: Vec<String>,
    #[serde(default)]
    pub traits: Vec<TraitCount>,
}

/// Game data registry loaded from the data directory
#[derive(Debug, Clone, Default)]
pub struct GameData {
    pub champions: HashMap<String, ChampionData>,
    pub traits: HashMap<String, TraitData>,
    pub comps: Vec<CompData>,
}

const CHAMPIONS_FILE: &str = "champions.json";
const TRAITS_FILE: &str = "traits.json";
const COMPS_FILE: &str = "comps.json";

impl GameData {
    /// Load the registry from the data directory. Missing files leave the
    /// corresponding section empty; malformed JSON is an error.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let mut data = Self::default();

        let champions_path = data_dir.join(CHAMPIONS_FILE);
        if champions_path.exists() {
            let content = fs::read_to_string(&champions_path)
                .with_context(|| format!("Failed to read {}", champions_path.display()))?;
            let champs: Vec<ChampionData> = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", champions_path.display()))?;
            for champ in champs {
                data.champions.insert(champ.name.to_lowercase(), champ);
            }
            tracing::info!("Loaded {} champions", data.champions.len());
        } else {
            tracing::warn!(
                "No {} found at {}. Run `tft-copilot fetch` first.",
                CHAMPIONS_FILE,
                data_dir.display()
            );
        }

        let traits_path = data_dir.join(TRAITS_FILE);
        if traits_path.exists() {
            let content = fs::read_to_string(&traits_path)
                .with_context(|| format!("Failed to read {}", traits_path.display()))?;
            let traits: Vec<TraitData> = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", traits_path.display()))?;
            for t in traits {
                data.traits.insert(t.name.to_lowercase(), t);
            }
            tracing::info!("Loaded {} traits", data.traits.len());
        }

        let comps_path = data_dir.join(COMPS_FILE);
        if comps_path.exists() {
            let content = fs::read_to_string(&comps_path)
                .with_context(|| format!("Failed to read {}", comps_path.display()))?;
            data.comps = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", comps_path.display()))?;
            tracing::info!("Loaded {} comps", data.comps.len());
        }

        Ok(data)
    }

    /// Write the registry back out. Each file is written to a temp path and
    /// renamed into place so a crash never leaves half a file behind.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;

        let mut champs: Vec<&ChampionData> = self.champions.values().collect();
        champs.sort_by(|a, b| a.name.cmp(&b.name));
        write_json(&data_dir.join(CHAMPIONS_FILE), &champs)?;

        let mut traits: Vec<&TraitData> = self.traits.values().collect();
        traits.sort_by(|a, b| a.name.cmp(&b.name));
        write_json(&data_dir.join(TRAITS_FILE), &traits)?;

        write_json(&data_dir.join(COMPS_FILE), &self.comps)?;

        tracing::info!(
            "Saved {} champions, {} traits, {} comps to {}",
            self.champions.len(),
            self.traits.len(),
            self.comps.len(),
            data_dir.display()
        );
        Ok(())
    }

    /// Case-insensitive exact lookup by champion name
    pub fn champion(&self, name: &str) -> Option<&ChampionData> {
        self.champions.get(&name.to_lowercase())
    }

    /// Case-insensitive trait lookup
    pub fn trait_def(&self, name: &str) -> Option<&TraitData> {
        self.traits.get(&name.to_lowercase())
    }

    /// Build the fuzzy name index over the loaded champions
    pub fn name_index(&self) -> ChampionIndex {
        ChampionIndex::new(self.champions.values().map(|c| c.name.as_str()))
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(value).context("Serialize data file")?;
    fs::write(&tmp, content).with_context(|| format!("Write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Persist {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GameData {
        let mut data = GameData::default();
        for (name, cost, traits) in [
            ("Jinx", 4, vec!["Sniper", "Rebel"]),
            ("Vi", 3, vec!["Brawler", "Enforcer"]),
            ("Caitlyn", 1, vec!["Sniper", "Enforcer"]),
        ] {
            data.champions.insert(
                name.to_lowercase(),
                ChampionData {
                    name: name.to_string(),
                    cost,
                    traits: traits.into_iter().map(String::from).collect(),
                },
            );
        }
        data.traits.insert(
            "sniper".to_string(),
            TraitData {
                name: "Sniper".to_string(),
                breaks: vec![2, 4],
            },
        );
        data.comps.push(CompData {
            name: "Sniper Squad".to_string(),
            units: vec!["Jinx".to_string(), "Caitlyn".to_string()],
            traits: vec![TraitCount {
                name: "Sniper".to_string(),
                count: 2,
            }],
        });
        data
    }

    #[test]
    fn test_load_nonexistent() {
        let data = GameData::load(Path::new("/nonexistent")).unwrap();
        assert!(data.champions.is_empty());
        assert!(data.comps.is_empty());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let data = sample();
        data.save(dir.path()).unwrap();

        let loaded = GameData::load(dir.path()).unwrap();
        assert_eq!(loaded.champions.len(), 3);
        assert_eq!(loaded.champion("JINX").unwrap().cost, 4);
        assert_eq!(loaded.comps.len(), 1);
        assert_eq!(loaded.trait_def("Sniper").unwrap().first_break(), 2);
    }

    #[test]
    fn test_malformed_json_is_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CHAMPIONS_FILE), "{not json").unwrap();
        assert!(GameData::load(dir.path()).is_err());
    }
}
