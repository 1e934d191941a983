use anyhow::Error;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use crate::config::config::FusionConfig;

const DEFAULT_CONFLICTS: [((char, char), char); 21] = [
    (('H', 'S'), 'A'),
    (('C', 'Y'), 'C'),
    (('R', 'D'), 'D'),
    (('B', 'F'), 'F'),
    (('U', 'F'), 'F'),
    (('X', 'I'), 'I'),
    (('X', 'Y'), 'I'),
    (('M', 'S'), 'M'),
    (('M', 'X'), 'M'),
    (('N', 'M'), 'N'),
    (('N', 'G'), 'N'),
    (('S', 'T'), 'T'),
    (('H', 'T'), 'T'),
    (('U', 'K'), 'U'),
    (('V', 'K'), 'V'),
    (('H', 'C'), 'X'),
    (('G', 'C'), 'X'),
    (('P', 'M'), 'P'),
    (('G', 'S'), 'P'),
    (('G', 'M'), 'P'),
    (('Q', 'M'), 'Q'),
];

/// ConflictTable maps known (model, geometry) disagreements to the letter that wins.
///
/// Lookups are asymmetric: `(H, S)` and `(S, H)` are different keys.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictTable {
    entries: Vec<((char, char), char)>,
}

impl ConflictTable {
    /// from_entries builds a table, keeping the first occurrence of each key.
    ///
    /// # Arguments
    /// * `entries` - `((model, geometry), resolved)` triples in priority order
    ///
    /// # Returns
    /// * `Result<ConflictTable, Error>` - fails when one key maps to two different letters
    pub fn from_entries<I>(entries: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = ((char, char), char)>,
    {
        let mut table: Vec<((char, char), char)> = Vec::new();
        for (key, resolved) in entries {
            match table.iter().find(|(k, _)| *k == key) {
                Some((_, existing)) if *existing == resolved => {
                    warn!(model = %key.0, geometry = %key.1, "duplicate conflict entry ignored");
                }
                Some((_, existing)) => {
                    return Err(Error::msg(format!(
                        "conflict entry ({}, {}) maps to both {} and {}", key.0, key.1, existing, resolved
                    )))
                }
                None => table.push((key, resolved)),
            }
        }
        Ok(ConflictTable { entries: table })
    }

    pub fn lookup(&self, model: char, geometry: char) -> Option<char> {
        self.entries
            .iter()
            .find(|((m, g), _)| *m == model && *g == geometry)
            .map(|(_, resolved)| *resolved)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ConflictTable {
    fn default() -> Self {
        ConflictTable { entries: DEFAULT_CONFLICTS.to_vec() }
    }
}

/// FusionRule records which branch of the decision table settled a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FusionRule {
    NoGeometry,
    Agreement,
    ConflictTable,
    ConfidentModel,
    ReliableGeometry,
    ModelFallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FusionOutcome {
    pub resolved: Option<char>,
    pub rule: FusionRule,
    pub model: Option<char>,
    pub geometry: Option<char>,
    pub confidence: f32,
    pub alternatives: Vec<(char, f32)>,
}

impl FusionOutcome {
    /// is_reportable is true when the frame is worth surfacing to the caller.
    pub fn is_reportable(&self, config: &FusionConfig) -> bool {
        self.confidence > config.report_confidence_threshold || self.resolved.is_some()
    }
}

/// FusionResolver reconciles the learned model with the geometry rules.
#[derive(Debug, Clone)]
pub struct FusionResolver {
    config: FusionConfig,
    conflicts: ConflictTable,
}

impl Default for FusionResolver {
    fn default() -> Self {
        FusionResolver::new(FusionConfig::new(), ConflictTable::default())
    }
}

impl FusionResolver {
    pub fn new(config: FusionConfig, conflicts: ConflictTable) -> Self {
        FusionResolver { config, conflicts }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// resolve picks the final letter for one frame.
    ///
    /// # Arguments
    /// * `model` - top-1 letter of the learned classifier, if any
    /// * `confidence` - its confidence
    /// * `alternatives` - ranked top-k of the learned classifier
    /// * `geometry` - letter from the geometry rules, if any
    ///
    /// # Returns
    /// * `FusionOutcome`
    pub fn resolve(
        &self,
        model: Option<char>,
        confidence: f32,
        alternatives: Vec<(char, f32)>,
        geometry: Option<char>,
    ) -> FusionOutcome {
        let (resolved, rule) = self.decide(model, confidence, geometry);
        debug!(?model, ?geometry, confidence, ?resolved, ?rule, "fused frame");
        FusionOutcome { resolved, rule, model, geometry, confidence, alternatives }
    }

    fn decide(&self, model: Option<char>, confidence: f32, geometry: Option<char>) -> (Option<char>, FusionRule) {
        let geo = match geometry {
            None => return (model, FusionRule::NoGeometry),
            Some(geo) => geo,
        };
        if model == Some(geo) {
            return (Some(geo), FusionRule::Agreement)
        }
        if let Some(resolved) = model.and_then(|m| self.conflicts.lookup(m, geo)) {
            return (Some(resolved), FusionRule::ConflictTable)
        }
        if model.is_some() && confidence > self.config.confident_model_threshold {
            return (model, FusionRule::ConfidentModel)
        }
        if self.config.reliable_geometry_letters.contains(&geo) {
            return (Some(geo), FusionRule::ReliableGeometry)
        }
        (model, FusionRule::ModelFallback)
    }
}
