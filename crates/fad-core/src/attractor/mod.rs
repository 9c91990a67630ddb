//! Fish Attraction
//!
//! Attractors decide how much fish leaves a tile for a FAD each day. They are
//! a closed set of strategies sharing one entry point, [`FishAttractor::attract`],
//! which applies the common gates first and the capacity-aware scaling last.

pub mod abundance;
pub mod biomass;
pub mod probability;
pub mod selectivity;

use std::fmt;
use std::sync::Arc;

use bevy_ecs::prelude::*;
use fad_events::{SimTime, TilePos};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::biology::{GlobalBiology, LocalBiology, StructuredAbundance, EPSILON};
use crate::capacity::{fit_factors, CarryingCapacity};
use crate::fad::Fad;

pub use abundance::{ProbabilisticAbundanceAttractor, SelectivityAbundanceAttractor};
pub use biomass::{LinearBiomassAttractor, LogisticBiomassAttractor};
pub use probability::AttractionProbability;
pub use selectivity::{CatchabilityPenalty, SelectivityCurve};

/// Handle of an attractor in the [`AttractorRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttractorId(pub usize);

/// What an attractor needs to know about the world.
#[derive(Debug, Clone, Copy)]
pub struct AttractionContext<'a> {
    pub time: SimTime,
    pub biology: &'a GlobalBiology,
}

/// Fish pulled from a tile toward a FAD.
#[derive(Debug, Clone, PartialEq)]
pub struct Attraction {
    pub biology: LocalBiology,
    /// Total weight of `biology` in kg
    pub total_weight: f64,
}

/// Predicate over the FAD's current tile.
pub type TileHurdle = Arc<dyn Fn(TilePos) -> bool + Send + Sync>;

/// Checks every attractor runs before computing anything.
#[derive(Clone, Default)]
pub struct AttractionGates {
    min_soak_days: u32,
    hurdle: Option<TileHurdle>,
}

impl fmt::Debug for AttractionGates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttractionGates")
            .field("min_soak_days", &self.min_soak_days)
            .field("hurdle", &self.hurdle.is_some())
            .finish()
    }
}

impl AttractionGates {
    pub fn new(min_soak_days: u32) -> Self {
        Self {
            min_soak_days,
            hurdle: None,
        }
    }

    /// Builder: only attract on tiles passing `hurdle`
    pub fn with_hurdle(mut self, hurdle: impl Fn(TilePos) -> bool + Send + Sync + 'static) -> Self {
        self.hurdle = Some(Arc::new(hurdle));
        self
    }

    pub fn min_soak_days(&self) -> u32 {
        self.min_soak_days
    }

    /// True when the FAD may attract today given what it already holds.
    pub fn allows(&self, fad: &Fad, held: &[f64], time: SimTime) -> bool {
        if !fad.can_attract_fish() || fad.carrying_capacity().is_dud() {
            return false;
        }
        if fad.soak_time_days(time) < self.min_soak_days {
            return false;
        }
        if fad.carrying_capacity().is_full(held) {
            return false;
        }
        match &self.hurdle {
            Some(hurdle) => hurdle(fad.location()),
            None => true,
        }
    }
}

/// Abundance attracted per kg of daily target, per species.
///
/// Published once per day and shared read-only by every FAD of the attractor.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAttraction {
    pub day: u32,
    pub per_kg: Vec<StructuredAbundance>,
}

#[derive(Debug, Clone)]
pub enum FishAttractor {
    LinearBiomass(LinearBiomassAttractor),
    LogisticBiomass(LogisticBiomassAttractor),
    ProbabilisticAbundance(ProbabilisticAbundanceAttractor),
    SelectivityAbundance(SelectivityAbundanceAttractor),
}

impl FishAttractor {
    pub fn gates(&self) -> &AttractionGates {
        match self {
            FishAttractor::LinearBiomass(a) => &a.gates,
            FishAttractor::LogisticBiomass(a) => &a.gates,
            FishAttractor::ProbabilisticAbundance(a) => &a.gates,
            FishAttractor::SelectivityAbundance(a) => &a.gates,
        }
    }

    /// True when the attractor reads a daily snapshot.
    pub fn uses_daily_snapshot(&self) -> bool {
        matches!(self, FishAttractor::SelectivityAbundance(_))
    }

    /// True when FADs using this attractor hold structured abundance.
    pub fn works_on_abundance(&self) -> bool {
        matches!(
            self,
            FishAttractor::ProbabilisticAbundance(_) | FishAttractor::SelectivityAbundance(_)
        )
    }

    /// Builds today's snapshot, for attractors that use one.
    pub fn refresh_daily(
        &self,
        time: SimTime,
        ocean: &[StructuredAbundance],
        biology: &GlobalBiology,
    ) -> Option<DailyAttraction> {
        match self {
            FishAttractor::SelectivityAbundance(a) => Some(a.refresh_daily(time, ocean, biology)),
            _ => None,
        }
    }

    /// Fish the FAD would pull from `tile` right now, or `None` when it
    /// cannot attract.
    ///
    /// The result never takes the FAD past its carrying capacity.
    pub fn attract<R: Rng + ?Sized>(
        &self,
        tile: &LocalBiology,
        fad: &Fad,
        daily: Option<&DailyAttraction>,
        ctx: &AttractionContext<'_>,
        rng: &mut R,
    ) -> Option<Attraction> {
        let held = fad.held_biomass(ctx.biology);
        if !self.gates().allows(fad, &held, ctx.time) {
            return None;
        }
        let raw = match self {
            FishAttractor::LinearBiomass(a) => a.attract(tile)?,
            FishAttractor::LogisticBiomass(a) => a.attract(tile, fad.carrying_capacity(), &held)?,
            FishAttractor::ProbabilisticAbundance(a) => a.attract(tile, &held, ctx.biology, rng)?,
            FishAttractor::SelectivityAbundance(a) => a.attract(tile, fad, daily, ctx)?,
        };
        fit_to_capacity(raw, fad.carrying_capacity(), &held, ctx.biology)
    }
}

/// Scales `raw` so that adding it to `held` stays within `capacity`.
pub fn fit_to_capacity(
    mut raw: LocalBiology,
    capacity: &CarryingCapacity,
    held: &[f64],
    biology: &GlobalBiology,
) -> Option<Attraction> {
    let attracted = raw.biomass_per_species(biology);
    let factors = fit_factors(capacity, held, &attracted);
    for (species_index, factor) in factors.iter().enumerate() {
        if *factor != 1.0 {
            raw.scale_species(species_index, *factor);
        }
    }
    let total_weight = raw.total_biomass(biology);
    if total_weight < 0.0 {
        assert!(
            total_weight > -EPSILON,
            "attracted a negative weight of fish ({})",
            total_weight
        );
        return None;
    }
    if total_weight == 0.0 {
        return None;
    }
    Some(Attraction {
        biology: raw,
        total_weight,
    })
}

/// Resource: every attractor in the simulation and today's snapshots
#[derive(Resource, Debug, Default)]
pub struct AttractorRegistry {
    attractors: Vec<FishAttractor>,
    daily: Vec<Option<Arc<DailyAttraction>>>,
}

impl AttractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, attractor: FishAttractor) -> AttractorId {
        self.attractors.push(attractor);
        self.daily.push(None);
        AttractorId(self.attractors.len() - 1)
    }

    pub fn get(&self, id: AttractorId) -> Option<&FishAttractor> {
        self.attractors.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.attractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attractors.is_empty()
    }

    /// Publishes a fresh snapshot for every attractor that uses one.
    pub fn refresh_daily(
        &mut self,
        time: SimTime,
        ocean: &[StructuredAbundance],
        biology: &GlobalBiology,
    ) -> usize {
        let mut refreshed = 0;
        for (attractor, slot) in self.attractors.iter().zip(self.daily.iter_mut()) {
            if let Some(snapshot) = attractor.refresh_daily(time, ocean, biology) {
                *slot = Some(Arc::new(snapshot));
                refreshed += 1;
            }
        }
        if refreshed > 0 {
            tracing::debug!("Refreshed {} daily attraction snapshot(s) on day {}", refreshed, time.day());
        }
        refreshed
    }

    /// Latest snapshot published for `id`.
    pub fn daily(&self, id: AttractorId) -> Option<Arc<DailyAttraction>> {
        self.daily.get(id.0).and_then(|d| d.clone())
    }

    /// Runs the FAD's attractor against `tile`.
    ///
    /// Panics if the FAD refers to an attractor that was never registered.
    pub fn attract<R: Rng + ?Sized>(
        &self,
        tile: &LocalBiology,
        fad: &Fad,
        ctx: &AttractionContext<'_>,
        rng: &mut R,
    ) -> Option<Attraction> {
        let id = fad.attractor();
        let attractor = match self.attractors.get(id.0) {
            Some(a) => a,
            None => panic!("{} refers to unregistered attractor {:?}", fad.id(), id),
        };
        let daily = self.daily[id.0].as_deref();
        attractor.attract(tile, fad, daily, ctx, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biology::Species;
    use crate::fad::{Fad, FadStore};
    use fad_events::{FadId, VesselId};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn biology() -> GlobalBiology {
        GlobalBiology::new(vec![
            Species::biomass_only(0, "Skipjack tuna"),
            Species::biomass_only(1, "Yellowfin tuna"),
        ])
    }

    fn biomass_fad(capacity: CarryingCapacity) -> Fad {
        Fad::new(
            FadId(1),
            VesselId(1),
            AttractorId(0),
            0,
            TilePos::new(0, 0),
            capacity,
            FadStore::Aggregating(LocalBiology::empty_biomass(2)),
            vec![0.0, 0.0],
        )
    }

    fn linear(rate: f64) -> FishAttractor {
        FishAttractor::LinearBiomass(
            LinearBiomassAttractor::new(vec![rate, rate], AttractionGates::default()).unwrap(),
        )
    }

    #[test]
    fn test_dud_never_attracts() {
        let biology = biology();
        let ctx = AttractionContext { time: SimTime::new(5, 1), biology: &biology };
        let mut rng = SmallRng::seed_from_u64(9);
        let fad = biomass_fad(CarryingCapacity::per_species(vec![0.0, 0.0]));
        let tile = LocalBiology::Biomass(vec![1000.0, 1000.0]);
        for _ in 0..20 {
            assert!(linear(0.5).attract(&tile, &fad, None, &ctx, &mut rng).is_none());
        }
    }

    #[test]
    fn test_zero_capacity_species_stays_empty() {
        let biology = biology();
        let ctx = AttractionContext { time: SimTime::new(1, 1), biology: &biology };
        let mut rng = SmallRng::seed_from_u64(9);
        let fad = biomass_fad(CarryingCapacity::per_species(vec![1000.0, 0.0]));
        let tile = LocalBiology::Biomass(vec![500.0, 500.0]);
        let attraction = linear(0.1).attract(&tile, &fad, None, &ctx, &mut rng).unwrap();
        assert_eq!(attraction.biology, LocalBiology::Biomass(vec![50.0, 0.0]));
        assert!((attraction.total_weight - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_scaled_to_remaining_room() {
        let biology = biology();
        let ctx = AttractionContext { time: SimTime::new(1, 1), biology: &biology };
        let mut rng = SmallRng::seed_from_u64(9);
        let fad = Fad::new(
            FadId(2),
            VesselId(1),
            AttractorId(0),
            0,
            TilePos::new(0, 0),
            CarryingCapacity::global(100.0),
            FadStore::Aggregating(LocalBiology::Biomass(vec![60.0, 20.0])),
            vec![0.0, 0.0],
        );
        let tile = LocalBiology::Biomass(vec![500.0, 500.0]);
        let attraction = linear(0.1).attract(&tile, &fad, None, &ctx, &mut rng).unwrap();
        // 100 attracted, only 20 of room left
        assert!((attraction.total_weight - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_min_soak_days_gate() {
        let biology = biology();
        let mut rng = SmallRng::seed_from_u64(9);
        let fad = biomass_fad(CarryingCapacity::global(100.0));
        let tile = LocalBiology::Biomass(vec![500.0, 500.0]);
        let attractor = FishAttractor::LinearBiomass(
            LinearBiomassAttractor::new(vec![0.1, 0.1], AttractionGates::new(3)).unwrap(),
        );
        let early = AttractionContext { time: SimTime::new(2, 1), biology: &biology };
        assert!(attractor.attract(&tile, &fad, None, &early, &mut rng).is_none());
        let later = AttractionContext { time: SimTime::new(3, 1), biology: &biology };
        assert!(attractor.attract(&tile, &fad, None, &later, &mut rng).is_some());
    }

    #[test]
    fn test_hurdle_gate() {
        let biology = biology();
        let ctx = AttractionContext { time: SimTime::new(1, 1), biology: &biology };
        let mut rng = SmallRng::seed_from_u64(9);
        let fad = biomass_fad(CarryingCapacity::global(100.0));
        let tile = LocalBiology::Biomass(vec![500.0, 500.0]);
        let attractor = FishAttractor::LinearBiomass(
            LinearBiomassAttractor::new(
                vec![0.1, 0.1],
                AttractionGates::default().with_hurdle(|tile| tile.x > 0),
            )
            .unwrap(),
        );
        assert!(attractor.attract(&tile, &fad, None, &ctx, &mut rng).is_none());
    }

    #[test]
    fn test_lost_fad_never_attracts() {
        let biology = biology();
        let ctx = AttractionContext { time: SimTime::new(1, 1), biology: &biology };
        let mut rng = SmallRng::seed_from_u64(9);
        let mut fad = biomass_fad(CarryingCapacity::global(100.0));
        fad.lose();
        let tile = LocalBiology::Biomass(vec![500.0, 500.0]);
        assert!(linear(0.1).attract(&tile, &fad, None, &ctx, &mut rng).is_none());
    }

    #[test]
    fn test_abundance_tile_is_ignored_by_biomass_attractor() {
        let biology = biology();
        let ctx = AttractionContext { time: SimTime::new(1, 1), biology: &biology };
        let mut rng = SmallRng::seed_from_u64(9);
        let fad = biomass_fad(CarryingCapacity::global(100.0));
        let tile = LocalBiology::empty_abundance(&biology);
        assert!(linear(0.1).attract(&tile, &fad, None, &ctx, &mut rng).is_none());
    }

    #[test]
    fn test_fads_share_one_daily_snapshot() {
        let biology = GlobalBiology::new(vec![Species::with_bin_weights(0, "Skipjack tuna", vec![1.0, 2.0])]);
        let mut registry = AttractorRegistry::new();
        let id = registry.register(FishAttractor::SelectivityAbundance(
            SelectivityAbundanceAttractor::new(
                vec![SelectivityCurve::from_bins(vec![0.5, 1.0])],
                10,
                AttractionGates::default(),
            )
            .unwrap(),
        ));
        let ocean = vec![StructuredAbundance::from_bins(vec![100.0, 50.0])];
        let today = SimTime::new(4, 1);
        assert_eq!(registry.refresh_daily(today, &ocean, &biology), 1);

        let fad = |serial: u32| {
            Fad::new(
                FadId::new(VesselId(1), serial),
                VesselId(1),
                id,
                0,
                TilePos::new(serial as i32, 0),
                CarryingCapacity::per_species(vec![500.0]),
                FadStore::Aggregating(LocalBiology::empty_abundance(&biology)),
                vec![0.0],
            )
        };
        let tile = LocalBiology::Abundance(vec![StructuredAbundance::from_bins(vec![1000.0, 1000.0])]);
        let ctx = AttractionContext { time: today, biology: &biology };
        let mut rng = SmallRng::seed_from_u64(4);

        let first = registry.daily(id).unwrap();
        let a = registry.attract(&tile, &fad(1), &ctx, &mut rng).unwrap();
        let second = registry.daily(id).unwrap();
        let b = registry.attract(&tile, &fad(2), &ctx, &mut rng).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(a.biology, b.biology);

        registry.refresh_daily(SimTime::new(5, 1), &ocean, &biology);
        let tomorrow = registry.daily(id).unwrap();
        assert!(!Arc::ptr_eq(&first, &tomorrow));
        assert_eq!(tomorrow.day, 5);
    }

    #[test]
    #[should_panic(expected = "negative weight")]
    fn test_negative_weight_panics() {
        let biology = biology();
        let raw = LocalBiology::Biomass(vec![-1.0, 0.0]);
        fit_to_capacity(raw, &CarryingCapacity::global(100.0), &[0.0, 0.0], &biology);
    }

    #[test]
    fn test_negative_noise_is_discarded() {
        let biology = biology();
        let raw = LocalBiology::Biomass(vec![-1e-9, 0.0]);
        assert!(fit_to_capacity(raw, &CarryingCapacity::global(100.0), &[0.0, 0.0], &biology).is_none());
    }
}
