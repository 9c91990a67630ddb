//! Abundance Attractors
//!
//! Attractors for tiles that track abundance by subdivision × bin.

use fad_events::SimTime;
use rand::Rng;

use crate::biology::{GlobalBiology, LocalBiology, StructuredAbundance};
use crate::capacity::CarryingCapacity;
use crate::error::{FadError, FadResult};
use crate::fad::Fad;

use super::probability::AttractionProbability;
use super::selectivity::{CatchabilityPenalty, SelectivityCurve};
use super::{AttractionContext, AttractionGates, DailyAttraction};

/// Each species is attracted or not by an independent daily draw; when it
/// is, a fixed fraction of the selectable local abundance moves over.
#[derive(Debug, Clone)]
pub struct ProbabilisticAbundanceAttractor {
    pub(crate) gates: AttractionGates,
    probability: AttractionProbability,
    rates: Vec<f64>,
    selectivity: Vec<SelectivityCurve>,
    min_abundance: Option<Vec<StructuredAbundance>>,
}

impl ProbabilisticAbundanceAttractor {
    pub fn new(
        probability: AttractionProbability,
        rates: Vec<f64>,
        selectivity: Vec<SelectivityCurve>,
        gates: AttractionGates,
    ) -> FadResult<Self> {
        if rates.len() != selectivity.len() || rates.len() != probability.num_species() {
            return Err(FadError::InvalidAttractor(format!(
                "{} rates, {} selectivity curves and {} probabilities do not line up",
                rates.len(),
                selectivity.len(),
                probability.num_species()
            )));
        }
        if let Some(bad) = rates.iter().find(|r| !(0.0..=1.0).contains(*r)) {
            return Err(FadError::InvalidAttractor(format!(
                "attraction rate {} is outside [0, 1]",
                bad
            )));
        }
        Ok(Self {
            gates,
            probability,
            rates,
            selectivity,
            min_abundance: None,
        })
    }

    /// Builder: the tile must hold at least this much in every bin
    pub fn with_min_abundance(mut self, thresholds: Vec<StructuredAbundance>) -> Self {
        self.min_abundance = Some(thresholds);
        self
    }

    fn below_threshold(&self, local: &[StructuredAbundance]) -> bool {
        let Some(thresholds) = &self.min_abundance else {
            return false;
        };
        local.iter().zip(thresholds).any(|(tile, threshold)| {
            (0..tile.num_subdivisions()).any(|sub| {
                (0..tile.num_bins()).any(|bin| threshold.get(sub, bin) > tile.get(sub, bin))
            })
        })
    }

    pub(crate) fn attract<R: Rng + ?Sized>(
        &self,
        tile: &LocalBiology,
        held: &[f64],
        biology: &GlobalBiology,
        rng: &mut R,
    ) -> Option<LocalBiology> {
        let local = tile.as_abundance()?;
        if self.below_threshold(local) {
            return None;
        }
        let fad_biomass: f64 = held.iter().sum();
        let mut attracted = Vec::with_capacity(local.len());
        for species in biology.species() {
            let s = species.index();
            let selected = self.selectivity[s].filter(&local[s]);
            let probability = self
                .probability
                .probability(s, selected.biomass(species), fad_biomass);
            let drawn = rng.gen::<f64>() < probability;
            let mut out = StructuredAbundance::zeros_for(species);
            if drawn {
                for sub in 0..species.num_subdivisions() {
                    for bin in 0..species.num_bins() {
                        let available = local[s].get(sub, bin);
                        out.set(sub, bin, (selected.get(sub, bin) * self.rates[s]).min(available));
                    }
                }
            }
            attracted.push(out);
        }
        Some(LocalBiology::Abundance(attracted))
    }
}

/// Attraction driven by what the fleet actually lands.
///
/// Once a day the ocean-wide abundance is filtered by each species'
/// selectivity and turned into "fish per kg landed" for every bin. A FAD then
/// asks for `capacity / days_to_fill` kg per species, split across bins in
/// those proportions.
#[derive(Debug, Clone)]
pub struct SelectivityAbundanceAttractor {
    pub(crate) gates: AttractionGates,
    selectivity: Vec<SelectivityCurve>,
    days_to_fill: u32,
    min_abundance_threshold: Option<f64>,
    catchability: Option<CatchabilityPenalty>,
}

impl SelectivityAbundanceAttractor {
    pub fn new(
        selectivity: Vec<SelectivityCurve>,
        days_to_fill: u32,
        gates: AttractionGates,
    ) -> FadResult<Self> {
        if days_to_fill == 0 {
            return Err(FadError::InvalidAttractor(
                "days_to_fill must be positive".to_string(),
            ));
        }
        Ok(Self {
            gates,
            selectivity,
            days_to_fill,
            min_abundance_threshold: None,
            catchability: None,
        })
    }

    /// Builder: cancel attraction when a bin holds less than this many
    /// days' worth of the FAD's daily step
    pub fn with_min_abundance_threshold(mut self, threshold: f64) -> FadResult<Self> {
        if threshold.is_nan() || threshold < 0.0 {
            return Err(FadError::InvalidAttractor(format!(
                "minimum abundance threshold {} must be non-negative",
                threshold
            )));
        }
        self.min_abundance_threshold = Some(threshold);
        Ok(self)
    }

    /// Builder: scale attraction by catchability and environment
    pub fn with_catchability(mut self, catchability: CatchabilityPenalty) -> Self {
        self.catchability = Some(catchability);
        self
    }

    pub fn days_to_fill(&self) -> u32 {
        self.days_to_fill
    }

    pub(crate) fn refresh_daily(
        &self,
        time: SimTime,
        ocean: &[StructuredAbundance],
        biology: &GlobalBiology,
    ) -> DailyAttraction {
        let per_kg = biology
            .species()
            .iter()
            .map(|species| {
                let s = species.index();
                let selected = self.selectivity[s].filter(&ocean[s]);
                let mut step = StructuredAbundance::zeros_for(species);
                let selected_weight = selected.biomass(species);
                if selected_weight <= 0.0 {
                    return step;
                }
                for sub in 0..species.num_subdivisions() {
                    for bin in 0..species.num_bins() {
                        let weight = species.weight(sub, bin);
                        if weight <= 0.0 {
                            continue;
                        }
                        let share = selected.get(sub, bin) * weight / selected_weight;
                        step.set(sub, bin, (share / weight).max(0.0));
                    }
                }
                step
            })
            .collect();
        DailyAttraction {
            day: time.day(),
            per_kg,
        }
    }

    /// Daily target in kg for one species.
    fn daily_target(&self, capacity: &CarryingCapacity, species_index: usize, num_species: usize) -> f64 {
        let capacity = capacity
            .for_species(species_index)
            .unwrap_or_else(|| capacity.total() / num_species as f64);
        assert!(
            capacity.is_finite(),
            "selectivity attraction needs a finite carrying capacity"
        );
        capacity / self.days_to_fill as f64
    }

    pub(crate) fn attract(
        &self,
        tile: &LocalBiology,
        fad: &Fad,
        daily: Option<&DailyAttraction>,
        ctx: &AttractionContext<'_>,
    ) -> Option<LocalBiology> {
        let daily = match daily {
            Some(d) => d,
            None => panic!("selectivity attraction ran before any daily snapshot was published"),
        };
        assert_eq!(
            daily.day,
            ctx.time.day(),
            "daily attraction snapshot is stale"
        );
        let local = tile.as_abundance()?;
        let num_species = ctx.biology.size();
        let mut attracted = Vec::with_capacity(num_species);
        for species in ctx.biology.species() {
            let s = species.index();
            let target = self.daily_target(fad.carrying_capacity(), s, num_species);
            let multiplier = self
                .catchability
                .as_ref()
                .map_or(1.0, |c| c.multiplier(s, fad.location()));
            let mut out = StructuredAbundance::zeros_for(species);
            for sub in 0..species.num_subdivisions() {
                for bin in 0..species.num_bins() {
                    let available = local[s].get(sub, bin);
                    let step = daily.per_kg[s].get(sub, bin) * target;
                    if let Some(threshold) = self.min_abundance_threshold {
                        if step * threshold > available {
                            return None;
                        }
                    }
                    out.set(sub, bin, (step * multiplier).min(available));
                }
            }
            attracted.push(out);
        }
        Some(LocalBiology::Abundance(attracted))
    }
}
