//! Attraction Probability
//!
//! Chance that a species is attracted to a FAD on a given day.

use serde::{Deserialize, Serialize};

/// Per-species daily attraction probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttractionProbability {
    /// Fixed probability per species index
    Constant { probabilities: Vec<f64> },
    /// `1 - exp(-(b0·B + b1·B·F)^k)` where B is the selectable local
    /// biomass of the species and F the total biomass already on the FAD
    CompressedExponential {
        b0: Vec<f64>,
        b1: Vec<f64>,
        k: Vec<f64>,
    },
}

impl AttractionProbability {
    pub fn constant(probabilities: Vec<f64>) -> Self {
        AttractionProbability::Constant { probabilities }
    }

    /// Probability in [0, 1] for `species_index`.
    pub fn probability(&self, species_index: usize, local_biomass: f64, fad_biomass: f64) -> f64 {
        let p = match self {
            AttractionProbability::Constant { probabilities } => probabilities[species_index],
            AttractionProbability::CompressedExponential { b0, b1, k } => {
                let x = b0[species_index] * local_biomass
                    + b1[species_index] * local_biomass * fad_biomass;
                if x <= 0.0 {
                    0.0
                } else {
                    1.0 - (-x.powf(k[species_index])).exp()
                }
            }
        };
        p.clamp(0.0, 1.0)
    }

    /// Number of species the parameters cover.
    pub fn num_species(&self) -> usize {
        match self {
            AttractionProbability::Constant { probabilities } => probabilities.len(),
            AttractionProbability::CompressedExponential { b0, .. } => b0.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_is_clamped() {
        let p = AttractionProbability::constant(vec![0.3, 1.5, -0.2]);
        assert_eq!(p.probability(0, 100.0, 0.0), 0.3);
        assert_eq!(p.probability(1, 100.0, 0.0), 1.0);
        assert_eq!(p.probability(2, 100.0, 0.0), 0.0);
    }

    #[test]
    fn test_compressed_exponential() {
        let p = AttractionProbability::CompressedExponential {
            b0: vec![0.01],
            b1: vec![0.0],
            k: vec![1.0],
        };
        // x = 0.01 * 100 = 1
        let expected = 1.0 - (-1.0f64).exp();
        assert!((p.probability(0, 100.0, 0.0) - expected).abs() < 1e-12);
        assert_eq!(p.probability(0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_fad_biomass_raises_probability() {
        let p = AttractionProbability::CompressedExponential {
            b0: vec![0.001],
            b1: vec![0.0001],
            k: vec![2.0],
        };
        let empty = p.probability(0, 50.0, 0.0);
        let loaded = p.probability(0, 50.0, 200.0);
        assert!(loaded > empty);
    }
}
