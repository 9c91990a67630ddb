//! Biomass Attractors
//!
//! Attractors for tiles that track one biomass figure per species.

use crate::biology::LocalBiology;
use crate::capacity::CarryingCapacity;
use crate::error::{FadError, FadResult};

use super::AttractionGates;

fn check_rates(rates: &[f64]) -> FadResult<()> {
    match rates.iter().find(|r| !(0.0..=1.0).contains(*r)) {
        Some(bad) => Err(FadError::InvalidAttractor(format!(
            "attraction rate {} is outside [0, 1]",
            bad
        ))),
        None => Ok(()),
    }
}

/// Attracts a fixed fraction of the local biomass of each species.
#[derive(Debug, Clone)]
pub struct LinearBiomassAttractor {
    pub(crate) gates: AttractionGates,
    rates: Vec<f64>,
}

impl LinearBiomassAttractor {
    pub fn new(rates: Vec<f64>, gates: AttractionGates) -> FadResult<Self> {
        check_rates(&rates)?;
        Ok(Self { gates, rates })
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    pub(crate) fn attract(&self, tile: &LocalBiology) -> Option<LocalBiology> {
        let local = tile.as_biomass()?;
        Some(LocalBiology::Biomass(
            local.iter().zip(&self.rates).map(|(b, rate)| b * rate).collect(),
        ))
    }
}

/// Attraction slows down logistically as the FAD fills up.
///
/// Per species: `rate × (1 + F) × (1 − F/K)`, floored at zero and capped by
/// the local biomass. With split capacities F and K are the species' own
/// held biomass and capacity, otherwise the FAD totals.
#[derive(Debug, Clone)]
pub struct LogisticBiomassAttractor {
    pub(crate) gates: AttractionGates,
    rates: Vec<f64>,
}

impl LogisticBiomassAttractor {
    pub fn new(rates: Vec<f64>, gates: AttractionGates) -> FadResult<Self> {
        if let Some(bad) = rates.iter().find(|r| r.is_nan() || **r < 0.0) {
            return Err(FadError::InvalidAttractor(format!(
                "logistic rate {} must be non-negative",
                bad
            )));
        }
        Ok(Self { gates, rates })
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    pub(crate) fn attract(
        &self,
        tile: &LocalBiology,
        capacity: &CarryingCapacity,
        held: &[f64],
    ) -> Option<LocalBiology> {
        let local = tile.as_biomass()?;
        let held_total: f64 = held.iter().sum();
        let attracted = local
            .iter()
            .enumerate()
            .map(|(s, available)| {
                let (f, k) = match capacity.for_species(s) {
                    Some(k) => (held[s], k),
                    None => (held_total, capacity.total()),
                };
                if k <= 0.0 {
                    return 0.0;
                }
                let growth = self.rates[s] * (1.0 + f) * (1.0 - f / k);
                growth.max(0.0).min(*available)
            })
            .collect();
        Some(LocalBiology::Biomass(attracted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_rates_are_validated() {
        assert!(LinearBiomassAttractor::new(vec![0.5, 1.2], AttractionGates::default()).is_err());
        assert!(LinearBiomassAttractor::new(vec![0.0, 1.0], AttractionGates::default()).is_ok());
    }

    #[test]
    fn test_linear_fraction() {
        let attractor = LinearBiomassAttractor::new(vec![0.1, 0.5], AttractionGates::default()).unwrap();
        let attracted = attractor.attract(&LocalBiology::Biomass(vec![200.0, 10.0])).unwrap();
        assert_eq!(attracted, LocalBiology::Biomass(vec![20.0, 5.0]));
    }

    #[test]
    fn test_logistic_growth() {
        let attractor = LogisticBiomassAttractor::new(vec![2.0], AttractionGates::default()).unwrap();
        let capacity = CarryingCapacity::per_species(vec![100.0]);
        let tile = LocalBiology::Biomass(vec![1000.0]);

        // F = 0: 2 * 1 * 1
        let empty = attractor.attract(&tile, &capacity, &[0.0]).unwrap();
        assert_eq!(empty, LocalBiology::Biomass(vec![2.0]));

        // F = 50: 2 * 51 * 0.5
        let half = attractor.attract(&tile, &capacity, &[50.0]).unwrap();
        assert_eq!(half, LocalBiology::Biomass(vec![51.0]));

        // Over capacity floors at zero
        let over = attractor.attract(&tile, &capacity, &[120.0]).unwrap();
        assert_eq!(over, LocalBiology::Biomass(vec![0.0]));
    }

    #[test]
    fn test_logistic_capped_by_local_biomass() {
        let attractor = LogisticBiomassAttractor::new(vec![10.0], AttractionGates::default()).unwrap();
        let capacity = CarryingCapacity::global(1000.0);
        let attracted = attractor
            .attract(&LocalBiology::Biomass(vec![3.0]), &capacity, &[100.0])
            .unwrap();
        assert_eq!(attracted, LocalBiology::Biomass(vec![3.0]));
    }
}
