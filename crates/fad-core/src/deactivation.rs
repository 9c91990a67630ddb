//! FAD Deactivation
//!
//! Yearly sweep that loses excess FADs when an active-FAD limit drops below
//! what a vessel has at sea.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use bevy_ecs::prelude::*;
use fad_events::{FadId, LossCause, SimTime, DAYS_PER_YEAR};
use rand::{Rng, RngCore};

use crate::biology::GlobalBiology;
use crate::fad::Fad;
use crate::manager::FadManager;
use crate::regulation::Regulation;

/// Orders two FADs; the one that compares less goes first.
pub type FadComparator = Arc<dyn Fn(&Fad, &Fad) -> Ordering + Send + Sync>;

/// Scores a FAD; lower scores go first.
pub type FadEvaluator = Arc<dyn Fn(&Fad, &mut dyn RngCore) -> f64 + Send + Sync>;

/// Which FADs are deactivated first.
#[derive(Clone)]
pub enum FadRanking {
    Comparator(FadComparator),
    /// Every FAD is scored once before sorting
    Evaluator(FadEvaluator),
}

impl fmt::Debug for FadRanking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FadRanking::Comparator(_) => f.write_str("FadRanking::Comparator"),
            FadRanking::Evaluator(_) => f.write_str("FadRanking::Evaluator"),
        }
    }
}

impl FadRanking {
    pub fn oldest_first() -> Self {
        FadRanking::Comparator(Arc::new(|a: &Fad, b: &Fad| {
            a.step_deployed()
                .cmp(&b.step_deployed())
                .then_with(|| a.id().cmp(&b.id()))
        }))
    }

    pub fn newest_first() -> Self {
        FadRanking::Comparator(Arc::new(|a: &Fad, b: &Fad| {
            b.step_deployed()
                .cmp(&a.step_deployed())
                .then_with(|| b.id().cmp(&a.id()))
        }))
    }

    /// Emptiest FADs first, with uniform noise of up to `noise` kg added to
    /// the held biomass.
    pub fn least_biomass_first(biology: GlobalBiology, noise: f64) -> Self {
        FadRanking::Evaluator(Arc::new(move |fad: &Fad, rng: &mut dyn RngCore| {
            let held: f64 = fad.held_biomass(&biology).iter().sum();
            let jitter = if noise > 0.0 { rng.gen_range(0.0..noise) } else { 0.0 };
            held + jitter
        }))
    }

    /// Ids of `fads` in deactivation order.
    pub fn rank(&self, fads: Vec<&Fad>, rng: &mut dyn RngCore) -> Vec<FadId> {
        match self {
            FadRanking::Comparator(compare) => {
                let mut fads = fads;
                fads.sort_by(|a, b| compare(a, b));
                fads.into_iter().map(Fad::id).collect()
            }
            FadRanking::Evaluator(evaluate) => {
                let mut scored: Vec<(f64, FadId)> =
                    fads.into_iter().map(|fad| (evaluate(fad, &mut *rng), fad.id())).collect();
                scored.sort_by(|a, b| a.0.total_cmp(&b.0));
                scored.into_iter().map(|(_, id)| id).collect()
            }
        }
    }
}

/// When the next sweep is due, in days
#[derive(Debug, Clone)]
pub struct SweepTracker {
    /// Day of the next sweep
    pub next_day: u32,
    /// Days between sweeps
    pub interval: u32,
}

impl Default for SweepTracker {
    fn default() -> Self {
        Self {
            next_day: 1,
            interval: DAYS_PER_YEAR,
        }
    }
}

impl SweepTracker {
    /// Check if a sweep should run on `day`
    pub fn should_sweep(&self, day: u32) -> bool {
        day >= self.next_day
    }

    /// Mark that a sweep ran on `day`
    pub fn mark_swept(&mut self, day: u32) {
        self.next_day = day + self.interval;
    }
}

/// Resource: the yearly deactivation control loop
#[derive(Resource, Debug, Clone)]
pub struct FadDeactivationStrategy {
    ranking: FadRanking,
    pub tracker: SweepTracker,
}

impl FadDeactivationStrategy {
    pub fn new(ranking: FadRanking) -> Self {
        Self {
            ranking,
            tracker: SweepTracker::default(),
        }
    }

    pub fn ranking(&self) -> &FadRanking {
        &self.ranking
    }

    /// Loses FADs until the vessel meets every active-FAD limit that applies
    /// this year. Returns the FADs lost.
    pub fn deactivate_excess(
        &self,
        manager: &mut FadManager,
        regulation: &dyn Regulation,
        time: SimTime,
        biology: &GlobalBiology,
        rng: &mut dyn RngCore,
    ) -> Vec<Fad> {
        let mut lost = Vec::new();
        let limits = regulation.active_fad_limits(manager.vessel(), time.year());
        for limit in limits {
            let deployed = manager.num_deployed_fads();
            if deployed <= limit {
                continue;
            }
            let excess = deployed - limit;
            let ranked = self.ranking.rank(manager.deployed_fads().collect(), rng);
            for id in ranked.into_iter().take(excess) {
                if let Some(fad) = manager.lose_fad(id, LossCause::Regulation, time, biology) {
                    lost.push(fad);
                }
            }
            tracing::info!(
                "{} deactivated {} FAD(s) to meet a limit of {}",
                manager.vessel_id(),
                excess,
                limit
            );
        }
        lost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::attractor::AttractorId;
    use crate::biology::Species;
    use crate::capacity::{CapacityDistribution, CarryingCapacityInitializer};
    use crate::initializer::{FadInitializer, StoreKind};
    use crate::regulation::{ActiveFadLimit, VesselProfile};
    use fad_events::{TilePos, VesselId};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn biology() -> GlobalBiology {
        GlobalBiology::new(vec![Species::biomass_only(0, "Skipjack tuna")])
    }

    fn manager_with_fads(count: i32) -> FadManager {
        let biology = biology();
        let initializer = FadInitializer::new(
            CarryingCapacityInitializer::global(CapacityDistribution::fixed(100.0).unwrap()),
            AttractorId(0),
            StoreKind::Biomass,
            vec![0.0],
        );
        let mut manager = FadManager::new(VesselProfile::new(VesselId(1), "class_6a"), initializer, 100);
        let mut rng = SmallRng::seed_from_u64(1);
        for day in 0..count {
            manager
                .deploy(TilePos::new(day, 0), SimTime::new(day as u64, 1), &biology, &mut rng)
                .unwrap();
        }
        manager
    }

    #[test]
    fn test_sweep_schedule() {
        let mut tracker = SweepTracker::default();
        assert!(!tracker.should_sweep(0));
        assert!(tracker.should_sweep(1));
        tracker.mark_swept(1);
        assert!(!tracker.should_sweep(365));
        assert!(tracker.should_sweep(366));
    }

    #[test]
    fn test_oldest_first_deactivation() {
        let biology = biology();
        let mut manager = manager_with_fads(5);
        let regulation = ActiveFadLimit::new(HashMap::from([("class_6a".to_string(), 3)]));
        let strategy = FadDeactivationStrategy::new(FadRanking::oldest_first());
        let mut rng = SmallRng::seed_from_u64(2);

        let lost = strategy.deactivate_excess(&mut manager, &regulation, SimTime::new(400, 1), &biology, &mut rng);
        let lost_steps: Vec<u64> = lost.iter().map(Fad::step_deployed).collect();
        assert_eq!(lost_steps, vec![0, 1]);
        assert!(lost.iter().all(Fad::is_lost));
        assert_eq!(manager.num_deployed_fads(), 3);
    }

    #[test]
    fn test_newest_first_ranking() {
        let manager = manager_with_fads(3);
        let mut rng = SmallRng::seed_from_u64(2);
        let ranked = FadRanking::newest_first().rank(manager.deployed_fads().collect(), &mut rng);
        let ids = manager.deployed_ids();
        assert_eq!(ranked, vec![ids[2], ids[1], ids[0]]);
    }

    #[test]
    fn test_within_limit_is_untouched() {
        let biology = biology();
        let mut manager = manager_with_fads(2);
        let regulation = ActiveFadLimit::new(HashMap::from([("class_6a".to_string(), 3)]));
        let strategy = FadDeactivationStrategy::new(FadRanking::oldest_first());
        let mut rng = SmallRng::seed_from_u64(2);
        let lost = strategy.deactivate_excess(&mut manager, &regulation, SimTime::default(), &biology, &mut rng);
        assert!(lost.is_empty());
        assert_eq!(manager.num_deployed_fads(), 2);
    }

    #[test]
    fn test_evaluator_scores_each_fad_once() {
        use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

        let manager = manager_with_fads(4);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let ranking = FadRanking::Evaluator(Arc::new(move |fad: &Fad, _rng: &mut dyn RngCore| {
            counter.fetch_add(1, AtomicOrdering::SeqCst);
            -(fad.step_deployed() as f64)
        }));
        let mut rng = SmallRng::seed_from_u64(3);
        let ranked = ranking.rank(manager.deployed_fads().collect(), &mut rng);
        assert_eq!(calls.load(AtomicOrdering::SeqCst), 4);
        assert_eq!(ranked.first(), manager.deployed_ids().last());
    }
}
