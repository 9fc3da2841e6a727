use crate::Result;
use crate::game::Secret;
use crate::mask;
use anyhow::Context;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// On-disk catalog format: named pools of uppercase words and phrases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogData {
    pub pools: HashMap<String, Vec<String>>,
}

/// The source of campaign secrets. Pools exist for curation and the manager
/// CLI; draws come uniformly from the aggregate list, so levels share one
/// pool of phrases.
#[derive(Debug, Clone)]
pub struct WordCatalog {
    pools: HashMap<String, Vec<String>>,
    all_phrases: Vec<String>,
}

impl WordCatalog {
    pub fn new() -> Self {
        let file_path = crate::config::Config::get().catalog.file_path.clone();
        let mut catalog = WordCatalog {
            pools: HashMap::new(),
            all_phrases: Vec::new(),
        };

        if let Err(e) = catalog.load_from_file(&file_path) {
            tracing::warn!("could not load catalog file {}: {}, using built-in phrases", file_path, e);
            catalog.load_default_phrases();
        }

        catalog
    }

    pub fn from_pools(pools: HashMap<String, Vec<String>>) -> Self {
        let mut catalog = WordCatalog {
            pools: normalize_pools(pools),
            all_phrases: Vec::new(),
        };
        catalog.update_all_phrases();
        catalog
    }

    /// Load the catalog from a JSON file, replacing current contents.
    pub fn load_from_file(&mut self, path: &str) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read catalog file: {}", path))?;

        let data: CatalogData =
            serde_json::from_str(&content).with_context(|| "cannot parse catalog file")?;

        self.pools = normalize_pools(data.pools);
        self.update_all_phrases();

        Ok(())
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let data = CatalogData {
            pools: self.pools.clone(),
        };

        let content =
            serde_json::to_string_pretty(&data).with_context(|| "cannot serialize catalog")?;

        std::fs::write(path, content)
            .with_context(|| format!("cannot write catalog file: {}", path))?;

        Ok(())
    }

    fn load_default_phrases(&mut self) {
        self.pools.clear();

        self.pools.insert(
            "animals".to_string(),
            vec![
                "CAT", "DOG", "ELEPHANT", "KANGAROO", "OCTOPUS", "GIRAFFE", "PENGUIN",
                "CROCODILE", "HEDGEHOG", "FLAMINGO",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        );

        self.pools.insert(
            "places".to_string(),
            vec![
                "LIGHTHOUSE", "VOLCANO", "RAINFOREST", "SUBMARINE", "GRAND CANYON",
                "EIFFEL TOWER", "NORTH POLE", "GREAT BARRIER REEF",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        );

        self.pools.insert(
            "sayings".to_string(),
            vec![
                "BREAK A LEG",
                "PIECE OF CAKE",
                "DON'T CRY OVER SPILT MILK",
                "ONCE IN A BLUE MOON",
                "THE EARLY BIRD GETS THE WORM",
                "A BLESSING IN DISGUISE",
                "IT'S NOT ROCKET SCIENCE",
                "HAPPY-GO-LUCKY",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        );

        self.update_all_phrases();
    }

    fn update_all_phrases(&mut self) {
        self.all_phrases.clear();
        for phrases in self.pools.values() {
            self.all_phrases.extend(phrases.clone());
        }
    }

    /// Draw one secret uniformly at random. Repeats across calls are allowed.
    pub fn pick(&self) -> Result<Secret> {
        let mut rng = rand::rng();
        let phrase = self.all_phrases.choose(&mut rng).ok_or_else(|| {
            crate::Error::EmptyCatalog("no phrases loaded".to_string())
        })?;
        Secret::new(phrase)
    }

    /// Draw from a single named pool.
    pub fn pick_from_pool(&self, pool: &str) -> Result<Secret> {
        let phrases = self.pools.get(pool).ok_or_else(|| {
            crate::Error::EmptyCatalog(format!("no such pool: {}", pool))
        })?;
        let mut rng = rand::rng();
        let phrase = phrases.choose(&mut rng).ok_or_else(|| {
            crate::Error::EmptyCatalog(format!("pool '{}' is empty", pool))
        })?;
        Secret::new(phrase)
    }

    pub fn pools(&self) -> Vec<&String> {
        self.pools.keys().collect()
    }

    pub fn pool_phrases(&self, pool: &str) -> Option<&Vec<String>> {
        self.pools.get(pool)
    }

    pub fn pool_phrase_count(&self, pool: &str) -> usize {
        self.pools.get(pool).map(|phrases| phrases.len()).unwrap_or(0)
    }

    pub fn phrase_count(&self) -> usize {
        self.all_phrases.len()
    }

    pub fn add_phrase(&mut self, pool: &str, phrase: &str) {
        self.pools
            .entry(pool.to_string())
            .or_default()
            .push(phrase.to_uppercase());
        self.update_all_phrases();
    }

    pub fn add_pool(&mut self, pool: &str) {
        self.pools.entry(pool.to_string()).or_default();
    }

    pub fn remove_pool(&mut self, pool: &str) {
        self.pools.remove(pool);
        self.update_all_phrases();
    }

    pub fn stats(&self) -> CatalogStats {
        let mut pool_stats = HashMap::new();
        for (pool, phrases) in &self.pools {
            pool_stats.insert(pool.clone(), phrases.len());
        }

        CatalogStats {
            total_phrases: self.all_phrases.len(),
            total_pools: self.pools.len(),
            pool_stats,
        }
    }

    /// Startup integrity pass. Production data must come back clean; an
    /// entirely empty catalog is the fatal case the server checks for.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.all_phrases.is_empty() {
            errors.push("catalog has no phrases".to_string());
        }

        for (pool, phrases) in &self.pools {
            if phrases.is_empty() {
                errors.push(format!("pool '{}' has no phrases", pool));
            }

            for (i, phrase) in phrases.iter().enumerate() {
                if phrase.trim().is_empty() {
                    errors.push(format!("pool '{}' entry {} is blank", pool, i + 1));
                    continue;
                }

                for c in phrase.chars() {
                    let allowed =
                        c.is_ascii_uppercase() || c == ' ' || mask::PASS_THROUGH.contains(&c);
                    if !allowed {
                        errors.push(format!(
                            "pool '{}' entry {} contains unsupported character {:?}",
                            pool,
                            i + 1,
                            c
                        ));
                        break;
                    }
                }
            }
        }

        errors
    }
}

fn normalize_pools(pools: HashMap<String, Vec<String>>) -> HashMap<String, Vec<String>> {
    pools
        .into_iter()
        .map(|(pool, phrases)| {
            let phrases = phrases.into_iter().map(|p| p.to_uppercase()).collect();
            (pool, phrases)
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct CatalogStats {
    pub total_phrases: usize,
    pub total_pools: usize,
    pub pool_stats: HashMap<String, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pools(entries: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        entries
            .iter()
            .map(|(pool, phrases)| {
                (
                    pool.to_string(),
                    phrases.iter().map(|p| p.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn pick_draws_from_the_aggregate_list() {
        let catalog = WordCatalog::from_pools(pools(&[("animals", &["cat"])]));
        let secret = catalog.pick().unwrap();
        assert_eq!(secret.to_string(), "CAT");
    }

    #[test]
    fn empty_catalog_cannot_pick() {
        let catalog = WordCatalog::from_pools(HashMap::new());
        assert!(matches!(
            catalog.pick(),
            Err(crate::Error::EmptyCatalog(_))
        ));
    }

    #[test]
    fn phrases_are_uppercased_on_load() {
        let catalog = WordCatalog::from_pools(pools(&[("sayings", &["break a leg"])]));
        let secret = catalog.pick_from_pool("sayings").unwrap();
        assert_eq!(secret.to_string(), "BREAK A LEG");
    }

    #[test]
    fn pick_from_missing_or_empty_pool_fails() {
        let catalog = WordCatalog::from_pools(pools(&[("empty", &[])]));
        assert!(catalog.pick_from_pool("nope").is_err());
        assert!(catalog.pick_from_pool("empty").is_err());
    }

    #[test]
    fn validate_flags_bad_entries() {
        let catalog = WordCatalog::from_pools(pools(&[
            ("ok", &["DON'T-STOP"]),
            ("bad", &["ROUTE 66", "  "]),
            ("empty", &[]),
        ]));
        let errors = catalog.validate();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("'empty'")));
        assert!(errors.iter().any(|e| e.contains("unsupported character")));
        assert!(errors.iter().any(|e| e.contains("blank")));
    }

    #[test]
    fn validate_accepts_clean_data() {
        let catalog =
            WordCatalog::from_pools(pools(&[("sayings", &["ONCE IN A BLUE MOON", "WHY?"])]));
        assert!(catalog.validate().is_empty());
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let path = path.to_str().unwrap();

        let mut catalog = WordCatalog::from_pools(pools(&[("animals", &["CAT", "DOG"])]));
        catalog.add_phrase("animals", "ferret");
        catalog.save_to_file(path).unwrap();

        let mut loaded = WordCatalog::from_pools(HashMap::new());
        loaded.load_from_file(path).unwrap();
        assert_eq!(loaded.phrase_count(), 3);
        assert!(loaded
            .pool_phrases("animals")
            .unwrap()
            .contains(&"FERRET".to_string()));
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut catalog = WordCatalog::from_pools(HashMap::new());
        assert!(catalog.load_from_file("/definitely/not/here.json").is_err());
    }
}
