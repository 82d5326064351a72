//! Closed lookup tables used to label cluster statistics.
//!
//! Both tables are plain configuration data: the defaults below can be replaced
//! from the `[analytics]` section of the config file. Lookups never fail; ids
//! and countries the tables do not know resolve to a generic fallback.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::ClusterId;

/// Region name used for countries no configured region lists.
pub const OTHER_REGION: &str = "Other";

/// Display metadata for one cluster id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClusterProfile {
    pub id: ClusterId,
    pub name: String,
    /// CSS hex color used by the map frontend.
    pub color: String,
}

impl ClusterProfile {
    fn new(id: ClusterId, name: &str, color: &str) -> Self {
        Self {
            id,
            name: name.into(),
            color: color.into(),
        }
    }

    /// The three modeled development tiers.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(0, "Low Digital Development", "#F76C5E"),
            Self::new(1, "Medium Digital Development", "#A8D5BA"),
            Self::new(2, "High Digital Development", "#2E86AB"),
        ]
    }
}

/// A named group of countries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Region {
    pub name: String,
    pub countries: Vec<String>,
}

impl Region {
    fn new(name: &str, countries: &[&str]) -> Self {
        Self {
            name: name.into(),
            countries: countries.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("Europe", &["Germany", "France", "UK", "Italy", "Spain"]),
            Self::new("Asia", &["China", "Japan", "India", "South Korea"]),
            Self::new("Americas", &["USA", "Canada", "Brazil", "Mexico"]),
        ]
    }
}

/// Name and color lookup keyed by cluster id.
#[derive(Debug, Clone)]
pub struct ClusterLabels {
    profiles: BTreeMap<ClusterId, ClusterProfile>,
    fallback_color: String,
}

impl ClusterLabels {
    pub fn new(profiles: &[ClusterProfile], fallback_color: impl Into<String>) -> Self {
        Self {
            profiles: profiles.iter().map(|p| (p.id, p.clone())).collect(),
            fallback_color: fallback_color.into(),
        }
    }

    pub fn name(&self, cluster: ClusterId) -> String {
        self.profiles
            .get(&cluster)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| format!("Cluster {cluster}"))
    }

    pub fn color(&self, cluster: ClusterId) -> String {
        self.profiles
            .get(&cluster)
            .map(|p| p.color.clone())
            .unwrap_or_else(|| self.fallback_color.clone())
    }
}

/// Country → region lookup.
#[derive(Debug, Clone)]
pub struct RegionTable {
    by_country: BTreeMap<String, String>,
}

impl RegionTable {
    /// Build the reverse index. A country listed twice keeps its first region.
    pub fn new(regions: &[Region]) -> Self {
        let mut by_country = BTreeMap::new();
        for region in regions {
            for country in &region.countries {
                by_country
                    .entry(country.clone())
                    .or_insert_with(|| region.name.clone());
            }
        }
        Self { by_country }
    }

    /// Region of `country` (exact match), or [`OTHER_REGION`].
    pub fn region_of(&self, country: &str) -> &str {
        self.by_country
            .get(country)
            .map(String::as_str)
            .unwrap_or(OTHER_REGION)
    }

    /// Count countries per region. Regions with no members are omitted.
    pub fn distribution<'a>(
        &self,
        countries: impl IntoIterator<Item = &'a str>,
    ) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for country in countries {
            *counts.entry(self.region_of(country).to_string()).or_insert(0) += 1;
        }
        counts
    }
}
