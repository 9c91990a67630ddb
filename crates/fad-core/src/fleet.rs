//! Scripted Fleet
//!
//! A simple vessel behavior used to drive scenarios: each day every vessel
//! deploys as many FADs as it is allowed (up to a daily cap) on random sea
//! tiles, and every few days sets on its fullest FAD.

use bevy_ecs::prelude::*;
use fad_events::{ActionClass, FadId, SimTime, TilePos};
use rand::Rng;

use crate::attractor::AttractionContext;
use crate::biology::GlobalBiology;
use crate::config::FleetConfig;
use crate::manager::FadManager;
use crate::regulation::Regulation;
use crate::sea::SeaGrid;
use crate::systems::{ActiveRegulations, SimClock};
use crate::SimRng;

/// Resource: what the scripted vessels do each day
#[derive(Resource, Debug, Clone)]
pub struct FleetScript {
    pub deployments_per_day: usize,
    /// Days between sets; 0 never sets
    pub set_every_days: u32,
    pub retained_proportion: f64,
}

impl From<&FleetConfig> for FleetScript {
    fn from(config: &FleetConfig) -> Self {
        Self {
            deployments_per_day: config.deployments_per_day,
            set_every_days: config.set_every_days,
            retained_proportion: config.retained_proportion,
        }
    }
}

impl FleetScript {
    fn sets_on(&self, day: u32) -> bool {
        self.set_every_days > 0 && day > 0 && day % self.set_every_days == 0
    }
}

/// Resource: running totals of what the fleet landed
#[derive(Resource, Debug, Clone, Default)]
pub struct FleetLandings {
    /// Kept catch in kg, per species
    pub caught: Vec<f64>,
    pub sets: usize,
    pub deployments: usize,
}

impl FleetLandings {
    pub fn total_caught(&self) -> f64 {
        self.caught.iter().sum()
    }

    fn record_catch(&mut self, catch: &[f64]) {
        if self.caught.len() < catch.len() {
            self.caught.resize(catch.len(), 0.0);
        }
        for (total, amount) in self.caught.iter_mut().zip(catch) {
            *total += amount;
        }
        self.sets += 1;
    }
}

/// The deployed FAD holding the most fish, if any holds some.
fn fullest_fad(manager: &FadManager, biology: &GlobalBiology) -> Option<(FadId, TilePos)> {
    manager
        .deployed_fads()
        .map(|fad| (fad.held_biomass(biology).iter().sum::<f64>(), fad))
        .filter(|(held, _)| *held > 0.0)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, fad)| (fad.id(), fad.location()))
}

/// Runs the scripted vessels. Does nothing without a [`FleetScript`].
#[allow(clippy::too_many_arguments)]
/// Deployments a vessel may make today.
///
/// The permissible-action search returns the largest extra index `n` that
/// is still legal, so `n + 1` deployments fit under the limits.
fn deployments_allowed(
    manager: &FadManager,
    wanted: usize,
    regulation: &dyn Regulation,
    time: SimTime,
) -> usize {
    if wanted == 0 || !manager.is_allowed(ActionClass::FadDeployment, regulation, time, None) {
        return 0;
    }
    let n = manager.number_of_permissible_actions(ActionClass::FadDeployment, wanted, regulation, time);
    (n + 1).min(wanted).min(manager.num_fads_in_stock())
}

pub fn run_fleet(
    clock: Res<SimClock>,
    script: Option<Res<FleetScript>>,
    biology: Res<GlobalBiology>,
    regulations: Res<ActiveRegulations>,
    mut sea: ResMut<SeaGrid>,
    mut rng: ResMut<SimRng>,
    mut landings: Option<ResMut<FleetLandings>>,
    mut query: Query<&mut FadManager>,
) {
    let Some(script) = script else {
        return;
    };
    let time = clock.0;
    if !time.is_start_of_day() {
        return;
    }
    let tiles: Vec<TilePos> = sea.tiles().collect();
    if tiles.is_empty() {
        return;
    }
    let ctx = AttractionContext {
        time,
        biology: &biology,
    };
    let regulation = regulations.get();

    let mut managers: Vec<Mut<FadManager>> = query.iter_mut().collect();
    managers.sort_by_key(|manager| manager.vessel_id());
    for mut manager in managers {
        let allowed = deployments_allowed(&manager, script.deployments_per_day, regulation, time);
        for _ in 0..allowed {
            let tile = tiles[rng.0.gen_range(0..tiles.len())];
            match manager.deploy(tile, time, &biology, &mut rng.0) {
                Ok(_) => {
                    if let Some(landings) = landings.as_mut() {
                        landings.deployments += 1;
                    }
                }
                Err(e) => {
                    tracing::debug!("Deployment skipped: {}", e);
                    break;
                }
            }
        }

        if !script.sets_on(time.day()) {
            continue;
        }
        let Some((id, location)) = fullest_fad(&manager, &biology) else {
            continue;
        };
        if !manager.is_allowed(ActionClass::FadSet, regulation, time, Some(location)) {
            continue;
        }
        let Some(tile) = sea.biology_mut(location) else {
            continue;
        };
        match manager.fish_fad(id, tile, script.retained_proportion, &ctx, &mut rng.0) {
            Ok(outcome) => {
                let caught = outcome.catch.biomass_per_species(&biology);
                tracing::debug!(
                    "{} set on {} and kept {:.1} kg",
                    manager.vessel_id(),
                    id,
                    caught.iter().sum::<f64>()
                );
                if let Some(landings) = landings.as_mut() {
                    landings.record_catch(&caught);
                }
            }
            Err(e) => tracing::warn!("Set failed: {}", e),
        }
    }
}
