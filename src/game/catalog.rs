//! Crop Catalog
//!
//! Static table of crop archetypes and the synergy bonuses between them.
//! Both are configuration data: a match takes its catalog from `GameConfig`.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;
use crate::game::config::{ConfigError, ScoringConfig};

// =============================================================================
// ARCHETYPE
// =============================================================================

/// Width x height occupancy in grid cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    /// Cells along x
    pub width: u32,
    /// Cells along y
    pub height: u32,
}

impl Footprint {
    /// Create a footprint.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Number of cells covered.
    #[inline]
    pub fn area(&self) -> u32 {
        self.width.saturating_mul(self.height)
    }
}

/// Display rarity derived from spawn weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RarityTier {
    /// Weight above 0.8
    Common,
    /// Weight in (0.6, 0.8]
    Uncommon,
    /// Weight in (0.4, 0.6]
    Rare,
    /// Weight at or below 0.4
    Legendary,
}

/// Immutable crop species definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CropArchetype {
    /// Unique key
    pub name: String,
    /// Cells covered from the origin
    pub footprint: Footprint,
    /// Turns to mature (0 = harvestable immediately)
    pub growth_duration: u32,
    /// Points before growth bonus
    pub base_value: u32,
    /// Relative spawn weight, higher is more common
    pub rarity_weight: f64,
}

impl CropArchetype {
    /// Create an archetype.
    pub fn new(
        name: impl Into<String>,
        footprint: Footprint,
        growth_duration: u32,
        base_value: u32,
        rarity_weight: f64,
    ) -> Self {
        Self {
            name: name.into(),
            footprint,
            growth_duration,
            base_value,
            rarity_weight,
        }
    }

    /// Rarity tier for display.
    pub fn rarity_tier(&self) -> RarityTier {
        if self.rarity_weight <= 0.4 {
            RarityTier::Legendary
        } else if self.rarity_weight <= 0.6 {
            RarityTier::Rare
        } else if self.rarity_weight <= 0.8 {
            RarityTier::Uncommon
        } else {
            RarityTier::Common
        }
    }

    /// Growth bonus earned on a full-term harvest.
    pub fn growth_bonus(&self, scoring: &ScoringConfig) -> u32 {
        let bonus = u64::from(self.growth_duration) * u64::from(scoring.age_bonus_percent) / 100;
        u32::try_from(bonus).unwrap_or(u32::MAX)
    }

    /// `(base_value, growth_bonus)` as shown on a crop card.
    pub fn value_preview(&self, scoring: &ScoringConfig) -> (u32, u32) {
        (self.base_value, self.growth_bonus(scoring))
    }
}

// =============================================================================
// SYNERGY TABLE
// =============================================================================

/// Unordered pair of archetype names.
///
/// Order is normalized at construction, so `(a, b)` and `(b, a)` are the same key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey(String, String);

impl PairKey {
    /// Build a normalized key.
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self(a.to_owned(), b.to_owned())
        } else {
            Self(b.to_owned(), a.to_owned())
        }
    }

    /// Names in normalized order.
    pub fn names(&self) -> (&str, &str) {
        (&self.0, &self.1)
    }
}

/// One entry of the synergy table as written in config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynergyPair {
    /// First archetype name
    pub a: String,
    /// Second archetype name
    pub b: String,
    /// Bonus per adjacent cell pair
    pub bonus: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct SynergyTableDef {
    same_type_bonus: u32,
    default_bonus: u32,
    #[serde(default)]
    pairs: Vec<SynergyPair>,
}

/// Symmetric adjacency bonus lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SynergyTableDef", into = "SynergyTableDef")]
pub struct SynergyTable {
    same_type_bonus: u32,
    default_bonus: u32,
    pairs: BTreeMap<PairKey, u32>,
}

impl SynergyTable {
    /// Table with no listed pairs. `default_bonus` must be positive.
    pub fn uniform(same_type_bonus: u32, default_bonus: u32) -> Result<Self, ConfigError> {
        if default_bonus == 0 {
            return Err(ConfigError::Invalid("default synergy bonus must be positive".into()));
        }
        Ok(Self {
            same_type_bonus,
            default_bonus,
            pairs: BTreeMap::new(),
        })
    }

    /// Add or replace a cross-type pair.
    pub fn with_pair(mut self, a: &str, b: &str, bonus: u32) -> Result<Self, ConfigError> {
        if a == b {
            return Err(ConfigError::Invalid(format!(
                "synergy pair {a}-{a} duplicates the same-type bonus"
            )));
        }
        self.pairs.insert(PairKey::new(a, b), bonus);
        Ok(self)
    }

    /// Bonus for one adjacent cell pair between archetypes `a` and `b`.
    pub fn bonus(&self, a: &str, b: &str) -> u32 {
        if a == b {
            return self.same_type_bonus;
        }
        self.pairs
            .get(&PairKey::new(a, b))
            .copied()
            .unwrap_or(self.default_bonus)
    }

    /// Bonus for two crops of the same archetype.
    pub fn same_type_bonus(&self) -> u32 {
        self.same_type_bonus
    }

    /// Bonus for unlisted cross-type pairs.
    pub fn default_bonus(&self) -> u32 {
        self.default_bonus
    }
}

impl Default for SynergyTable {
    fn default() -> Self {
        let mut pairs = BTreeMap::new();
        pairs.insert(PairKey::new("Wheat", "Corn"), 5);
        pairs.insert(PairKey::new("Carrot", "Berry Bush"), 6);
        pairs.insert(PairKey::new("Pumpkin", "Wheat"), 4);
        pairs.insert(PairKey::new("Corn", "Pumpkin"), 5);
        Self {
            same_type_bonus: 3,
            default_bonus: 1,
            pairs,
        }
    }
}

impl TryFrom<SynergyTableDef> for SynergyTable {
    type Error = ConfigError;

    fn try_from(def: SynergyTableDef) -> Result<Self, Self::Error> {
        let mut table = Self::uniform(def.same_type_bonus, def.default_bonus)?;
        for pair in def.pairs {
            table = table.with_pair(&pair.a, &pair.b, pair.bonus)?;
        }
        Ok(table)
    }
}

impl From<SynergyTable> for SynergyTableDef {
    fn from(table: SynergyTable) -> Self {
        Self {
            same_type_bonus: table.same_type_bonus,
            default_bonus: table.default_bonus,
            pairs: table
                .pairs
                .into_iter()
                .map(|(PairKey(a, b), bonus)| SynergyPair { a, b, bonus })
                .collect(),
        }
    }
}

// =============================================================================
// CATALOG
// =============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
struct CatalogDef {
    archetypes: Vec<CropArchetype>,
    #[serde(default)]
    synergy: SynergyTable,
}

/// Archetype table with weighted selection and synergy lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CatalogDef", into = "CatalogDef")]
pub struct CropCatalog {
    archetypes: Vec<CropArchetype>,
    synergy: SynergyTable,
    /// Running sum of rarity weights, parallel to `archetypes`
    cumulative: Vec<f64>,
}

impl CropCatalog {
    /// Build a validated catalog.
    pub fn new(archetypes: Vec<CropArchetype>, synergy: SynergyTable) -> Result<Self, ConfigError> {
        if archetypes.is_empty() {
            return Err(ConfigError::Invalid("catalog has no archetypes".into()));
        }

        let mut seen = BTreeSet::new();
        for archetype in &archetypes {
            if !seen.insert(archetype.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate archetype {}", archetype.name
                )));
            }
            if archetype.footprint.width == 0 || archetype.footprint.height == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{} has an empty footprint", archetype.name
                )));
            }
            if archetype.base_value == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{} has no base value", archetype.name
                )));
            }
            if !archetype.rarity_weight.is_finite() || archetype.rarity_weight <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} has a non-positive rarity weight", archetype.name
                )));
            }
        }

        let cumulative = cumulative_weights(&archetypes);
        Ok(Self {
            archetypes,
            synergy,
            cumulative,
        })
    }

    /// Look up an archetype by name.
    pub fn get(&self, name: &str) -> Option<&CropArchetype> {
        self.archetypes.iter().find(|a| a.name == name)
    }

    /// All archetypes in declaration order.
    pub fn archetypes(&self) -> &[CropArchetype] {
        &self.archetypes
    }

    /// Number of archetypes.
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    /// Always false for a validated catalog.
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    /// Synergy table.
    pub fn synergy(&self) -> &SynergyTable {
        &self.synergy
    }

    /// Pick an archetype with probability proportional to its rarity weight.
    ///
    /// Binary search over the cumulative weights, so fractional weights are exact.
    pub fn weighted_random_archetype(&self, rng: &mut DeterministicRng) -> &CropArchetype {
        let total = self.cumulative.last().copied().unwrap_or(0.0);
        let roll = rng.next_unit_f64() * total;
        let idx = self
            .cumulative
            .partition_point(|&c| c <= roll)
            .min(self.archetypes.len().saturating_sub(1));
        &self.archetypes[idx]
    }

    /// Synergy bonus for one adjacent cell pair.
    pub fn synergy_bonus(&self, a: &CropArchetype, b: &CropArchetype) -> u32 {
        self.synergy.bonus(&a.name, &b.name)
    }
}

impl Default for CropCatalog {
    fn default() -> Self {
        let archetypes = default_archetypes();
        let cumulative = cumulative_weights(&archetypes);
        Self {
            archetypes,
            synergy: SynergyTable::default(),
            cumulative,
        }
    }
}

fn cumulative_weights(archetypes: &[CropArchetype]) -> Vec<f64> {
    let mut total = 0.0;
    archetypes
        .iter()
        .map(|a| {
            total += a.rarity_weight;
            total
        })
        .collect()
}

impl TryFrom<CatalogDef> for CropCatalog {
    type Error = ConfigError;

    fn try_from(def: CatalogDef) -> Result<Self, Self::Error> {
        Self::new(def.archetypes, def.synergy)
    }
}

impl From<CropCatalog> for CatalogDef {
    fn from(catalog: CropCatalog) -> Self {
        Self {
            archetypes: catalog.archetypes,
            synergy: catalog.synergy,
        }
    }
}

/// Reference crop set.
fn default_archetypes() -> Vec<CropArchetype> {
    vec![
        CropArchetype::new("Wheat", Footprint::new(1, 1), 2, 8, 1.0),
        CropArchetype::new("Corn", Footprint::new(1, 2), 3, 20, 0.8),
        CropArchetype::new("Pumpkin", Footprint::new(2, 2), 4, 45, 0.4),
        CropArchetype::new("Carrot", Footprint::new(1, 1), 0, 12, 0.9),
        CropArchetype::new("Berry Bush", Footprint::new(2, 1), 3, 28, 0.6),
    ]
}
