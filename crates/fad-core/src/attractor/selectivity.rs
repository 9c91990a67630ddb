//! Selectivity & Catchability
//!
//! Per-bin selectivity curves and the environmental catchability penalty.

use std::fmt;
use std::sync::Arc;

use fad_events::TilePos;

use crate::biology::StructuredAbundance;

/// Selectivity multipliers for one species, subdivision × bin.
///
/// A single row applies to every subdivision.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectivityCurve {
    rows: Vec<Vec<f64>>,
}

impl SelectivityCurve {
    pub fn from_bins(bins: Vec<f64>) -> Self {
        Self { rows: vec![bins] }
    }

    pub fn from_matrix(rows: Vec<Vec<f64>>) -> Self {
        assert!(!rows.is_empty(), "selectivity needs at least one row");
        Self { rows }
    }

    /// Every bin fully selected.
    pub fn flat(bins: usize) -> Self {
        Self::from_bins(vec![1.0; bins])
    }

    pub fn at(&self, subdivision: usize, bin: usize) -> f64 {
        let row = if self.rows.len() == 1 { 0 } else { subdivision };
        self.rows[row][bin]
    }

    /// Abundance that this curve makes available.
    pub fn filter(&self, abundance: &StructuredAbundance) -> StructuredAbundance {
        let mut selected = abundance.clone();
        for sub in 0..abundance.num_subdivisions() {
            for bin in 0..abundance.num_bins() {
                selected.set(sub, bin, abundance.get(sub, bin) * self.at(sub, bin));
            }
        }
        selected
    }
}

/// Environmental value at a tile (temperature, FAD density, ...).
pub type EnvironmentalMap = Arc<dyn Fn(TilePos) -> f64 + Send + Sync>;

/// One environmental layer of the catchability penalty.
#[derive(Clone)]
pub struct EnvironmentalLayer {
    pub name: String,
    pub threshold: f64,
    pub penalty: f64,
    pub values: EnvironmentalMap,
}

impl fmt::Debug for EnvironmentalLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentalLayer")
            .field("name", &self.name)
            .field("threshold", &self.threshold)
            .field("penalty", &self.penalty)
            .finish_non_exhaustive()
    }
}

/// Scales attraction by species catchability and environmental suitability.
#[derive(Debug, Clone, Default)]
pub struct CatchabilityPenalty {
    catchabilities: Vec<f64>,
    layers: Vec<EnvironmentalLayer>,
}

impl CatchabilityPenalty {
    pub fn new(catchabilities: Vec<f64>) -> Self {
        Self {
            catchabilities,
            layers: Vec::new(),
        }
    }

    /// Builder: add an environmental layer
    pub fn with_layer(
        mut self,
        name: impl Into<String>,
        threshold: f64,
        penalty: f64,
        values: impl Fn(TilePos) -> f64 + Send + Sync + 'static,
    ) -> Self {
        assert!(threshold > 0.0, "environmental threshold must be positive");
        self.layers.push(EnvironmentalLayer {
            name: name.into(),
            threshold,
            penalty,
            values: Arc::new(values),
        });
        self
    }

    /// Product of `min(1, value / threshold)^penalty` over all layers.
    pub fn environmental_penalty(&self, tile: TilePos) -> f64 {
        self.layers
            .iter()
            .map(|layer| ((layer.values)(tile) / layer.threshold).min(1.0).powf(layer.penalty))
            .product()
    }

    /// Catchability of a species at a tile. Zero when the penalty is not a
    /// positive finite number.
    pub fn multiplier(&self, species_index: usize, tile: TilePos) -> f64 {
        let penalty = self.environmental_penalty(tile);
        if !penalty.is_finite() || penalty <= 0.0 {
            return 0.0;
        }
        let catchability = self.catchabilities.get(species_index).copied().unwrap_or(1.0);
        catchability * penalty
    }
}
