//! Refreshes the reference data files from the web.
//!
//! The stats site is a Next.js app, so instead of scraping markup we pull
//! the `__NEXT_DATA__` JSON blob embedded in each page and deserialize the
//! parts we care about. Data files are ephemeral and regenerated per run.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::{ChampionData, CompData, GameData, TraitCount, TraitData};

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub champions_url: String,
    pub comps_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Pause between consecutive page fetches
    pub rate_limit: Duration,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            champions_url: "https://tftactics.gg/db/champion-stats/".to_string(),
            comps_url: "https://tftactics.gg/tierlist/team-comps/".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            rate_limit: Duration::from_millis(300),
            user_agent: "tft-copilot/0.1".to_string(),
        }
    }
}

/// Fetch champions, traits, and comps, then write them to `data_dir`.
pub async fn refresh(cfg: &FetchConfig, data_dir: &Path) -> Result<GameData> {
    let client = reqwest::Client::builder()
        .timeout(cfg.timeout)
        .user_agent(&cfg.user_agent)
        .build()
        .context("Build HTTP client")?;

    info!("Fetching champion data from {}", cfg.champions_url);
    let champions_page = get_with_retry(&client, &cfg.champions_url, cfg).await?;
    let (champions, traits) = parse_champion_page(&champions_page)?;

    tokio::time::sleep(cfg.rate_limit).await;

    info!("Fetching comp data from {}", cfg.comps_url);
    let comps_page = get_with_retry(&client, &cfg.comps_url, cfg).await?;
    let comps = parse_comps_page(&comps_page)?;

    let mut data = GameData::default();
    for champ in champions {
        data.champions.insert(champ.name.to_lowercase(), champ);
    }
    for t in traits {
        data.traits.insert(t.name.to_lowercase(), t);
    }
    data.comps = comps;

    if data.champions.is_empty() {
        bail!("Champion page parsed but contained no champions");
    }

    data.save(data_dir)?;
    Ok(data)
}

/// GET a page, retrying with a linearly growing delay. Rate-limit
/// responses (429) double the wait before the next attempt.
async fn get_with_retry(client: &reqwest::Client, url: &str, cfg: &FetchConfig) -> Result<String> {
    let mut last_err = None;

    for attempt in 1..=cfg.max_retries {
        match client.get(url).send().await {
            Ok(resp) if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS => {
                warn!("Rate limited by {} (attempt {})", url, attempt);
                tokio::time::sleep(cfg.retry_delay * attempt * 2).await;
                last_err = Some(anyhow::anyhow!("HTTP 429 from {}", url));
            }
            Ok(resp) => match resp.error_for_status() {
                Ok(resp) => {
                    return resp
                        .text()
                        .await
                        .with_context(|| format!("Read body from {}", url));
                }
                Err(e) => {
                    warn!("GET {} failed: {} (attempt {})", url, e, attempt);
                    tokio::time::sleep(cfg.retry_delay * attempt).await;
                    last_err = Some(e.into());
                }
            },
            Err(e) => {
                warn!("GET {} failed: {} (attempt {})", url, e, attempt);
                tokio::time::sleep(cfg.retry_delay * attempt).await;
                last_err = Some(e.into());
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("GET {} failed", url)))
        .with_context(|| format!("Failed after {} attempts", cfg.max_retries))
}

// Wire format of the embedded Next.js payload. Only the fields we read.

#[derive(Debug, Deserialize)]
struct NextData {
    props: NextProps,
}

#[derive(Debug, Deserialize)]
struct NextProps {
    #[serde(rename = "pageProps")]
    page_props: PageProps,
}

#[derive(Debug, Deserialize, Default)]
struct PageProps {
    #[serde(default)]
    champions: Vec<WireChampion>,
    #[serde(default)]
    traits: Vec<WireTrait>,
    #[serde(default)]
    comps: Vec<WireComp>,
}

#[derive(Debug, Deserialize)]
struct WireChampion {
    name: String,
    cost: u32,
    #[serde(default)]
    traits: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireTrait {
    name: String,
    #[serde(default, alias = "breakpoints")]
    breaks: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct WireComp {
    #[serde(alias = "title")]
    name: String,
    #[serde(default)]
    units: Vec<String>,
    #[serde(default)]
    traits: Vec<WireTraitCount>,
}

#[derive(Debug, Deserialize)]
struct WireTraitCount {
    name: String,
    count: u32,
}

fn extract_next_data(page: &str) -> Result<NextData> {
    // The payload sits in a single script tag; non-greedy so trailing
    // scripts on the page don't get swallowed.
    let re = Regex::new(r#"(?s)<script id="__NEXT_DATA__"[^>]*>(.*?)</script>"#)
        .expect("static regex");
    let caps = re
        .captures(page)
        .context("__NEXT_DATA__ script tag not found")?;
    serde_json::from_str(caps.get(1).expect("capture group").as_str())
        .context("Failed to parse __NEXT_DATA__ JSON")
}

fn parse_champion_page(page: &str) -> Result<(Vec<ChampionData>, Vec<TraitData>)> {
    let next = extract_next_data(page)?;

    let champions = next
        .props
        .page_props
        .champions
        .into_iter()
        .map(|c| ChampionData {
            name: c.name,
            cost: c.cost,
            traits: c.traits,
        })
        .collect::<Vec<_>>();

    let traits = next
        .props
        .page_props
        .traits
        .into_iter()
        .map(|t| TraitData {
            name: t.name,
            breaks: t.breaks,
        })
        .collect::<Vec<_>>();

    info!("Parsed {} champions, {} traits", champions.len(), traits.len());
    Ok((champions, traits))
}

fn parse_comps_page(page: &str) -> Result<Vec<CompData>> {
    let next = extract_next_data(page)?;

    let comps = next
        .props
        .page_props
        .comps
        .into_iter()
        .filter(|c| !c.units.is_empty())
        .map(|c| CompData {
            name: c.name,
            units: c.units,
            traits: c
                .traits
                .into_iter()
                .map(|t| TraitCount {
                    name: t.name,
                    count: t.count,
                })
                .collect(),
        })
        .collect::<Vec<_>>();

    info!("Parsed {} comps", comps.len());
    Ok(comps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_with(json: &str) -> String {
        format!(
            "<html><head></head><body>\
             <script id=\"__NEXT_DATA__\" type=\"application/json\">{}</script>\
             <script>var other = 1;</script></body></html>",
            json
        )
    }

    #[test]
    fn test_parse_champion_page() {
        let page = page_with(
            r#"{"props":{"pageProps":{
                "champions":[
                    {"name":"Jinx","cost":4,"traits":["Sniper","Rebel"]},
                    {"name":"Vi","cost":3,"traits":["Brawler"]}
                ],
                "traits":[{"name":"Sniper","breakpoints":[2,4]}]
            }}}"#,
        );
        let (champs, traits) = parse_champion_page(&page).unwrap();
        assert_eq!(champs.len(), 2);
        assert_eq!(champs[0].name, "Jinx");
        assert_eq!(champs[0].cost, 4);
        assert_eq!(traits[0].breaks, vec![2, 4]);
    }

    #[test]
    fn test_parse_comps_page_skips_empty() {
        let page = page_with(
            r#"{"props":{"pageProps":{"comps":[
                {"title":"Sniper Squad","units":["Jinx","Caitlyn"],
                 "traits":[{"name":"Sniper","count":2}]},
                {"title":"Broken Entry","units":[]}
            ]}}}"#,
        );
        let comps = parse_comps_page(&page).unwrap();
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].name, "Sniper Squad");
        assert_eq!(comps[0].traits[0].count, 2);
    }

    #[test]
    fn test_missing_payload_is_error() {
        assert!(extract_next_data("<html><body>nothing here</body></html>").is_err());
    }
}
