//! FAD Manager
//!
//! One per vessel: the FADs it has at sea, its spare stock, the yearly
//! action counter and the observers interested in what happens to its FADs.

use std::collections::{BTreeMap, HashMap};

use bevy_ecs::prelude::*;
use fad_events::{ActionClass, FadEvent, FadId, LossCause, SimTime, TilePos, VesselId};
use rand::Rng;

use crate::attractor::{Attraction, AttractionContext, AttractorRegistry};
use crate::biology::{GlobalBiology, LocalBiology};
use crate::error::{FadError, FadResult};
use crate::fad::Fad;
use crate::initializer::FadInitializer;
use crate::observers::{Observer, Observers};
use crate::regulation::{ActionCounts, ActionQuery, HypotheticalCounts, Regulation, VesselProfile};

/// Result of a set made on one of the vessel's own FADs.
#[derive(Debug, Clone, PartialEq)]
pub struct SetOutcome {
    /// The FAD, which is gone from the water after the set
    pub fad: Fad,
    pub catch: LocalBiology,
    pub released: LocalBiology,
    pub destroyed: LocalBiology,
}

/// Component: the FAD bookkeeping of one vessel
#[derive(Component)]
pub struct FadManager {
    vessel: VesselProfile,
    /// Keys carry a per-vessel serial, so iteration follows deployment order
    deployed: BTreeMap<FadId, Fad>,
    fads_in_stock: usize,
    next_serial: u32,
    actions: HashMap<(u32, ActionClass), usize>,
    initializer: FadInitializer,
    observers: Observers,
}

impl FadManager {
    pub fn new(vessel: VesselProfile, initializer: FadInitializer, fads_in_stock: usize) -> Self {
        Self {
            vessel,
            deployed: BTreeMap::new(),
            fads_in_stock,
            next_serial: 0,
            actions: HashMap::new(),
            initializer,
            observers: Observers::new(),
        }
    }

    pub fn vessel(&self) -> &VesselProfile {
        &self.vessel
    }

    pub fn vessel_id(&self) -> VesselId {
        self.vessel.id
    }

    pub fn num_fads_in_stock(&self) -> usize {
        self.fads_in_stock
    }

    pub fn set_num_fads_in_stock(&mut self, fads_in_stock: usize) {
        self.fads_in_stock = fads_in_stock;
    }

    /// An unused FAD went back on board.
    pub fn put_fad_back_in_stock(&mut self) {
        self.fads_in_stock += 1;
    }

    pub fn num_deployed_fads(&self) -> usize {
        self.deployed.len()
    }

    /// Deployed FADs in deployment order.
    pub fn deployed_fads(&self) -> impl Iterator<Item = &Fad> {
        self.deployed.values()
    }

    pub fn deployed_ids(&self) -> Vec<FadId> {
        self.deployed.keys().copied().collect()
    }

    pub fn get(&self, id: FadId) -> Option<&Fad> {
        self.deployed.get(&id)
    }

    pub fn get_mut(&mut self, id: FadId) -> Option<&mut Fad> {
        self.deployed.get_mut(&id)
    }

    pub fn fads_at(&self, tile: TilePos) -> impl Iterator<Item = &Fad> + '_ {
        self.deployed.values().filter(move |fad| fad.location() == tile)
    }

    pub fn register_observer(&mut self, kind: fad_events::EventKind, observer: Box<dyn Observer>) {
        self.observers.register(kind, observer);
    }

    pub fn observers(&self) -> &Observers {
        &self.observers
    }

    pub fn observers_mut(&mut self) -> &mut Observers {
        &mut self.observers
    }

    /// Publishes an event to the registered observers.
    pub fn react_to(&mut self, event: FadEvent) {
        self.observers.react_to(&event);
    }

    pub fn record_action(&mut self, action: ActionClass, year: u32) {
        *self.actions.entry((year, action)).or_insert(0) += 1;
    }

    /// Puts a new FAD in the water at `tile`.
    ///
    /// Fails without side effects when the stock is empty.
    pub fn deploy<R: Rng + ?Sized>(
        &mut self,
        tile: TilePos,
        time: SimTime,
        biology: &GlobalBiology,
        rng: &mut R,
    ) -> FadResult<&Fad> {
        if self.fads_in_stock == 0 {
            return Err(FadError::NoFadsInStock {
                vessel: self.vessel.id,
            });
        }
        self.fads_in_stock -= 1;
        self.next_serial += 1;
        let id = FadId::new(self.vessel.id, self.next_serial);
        let fad = self
            .initializer
            .make_fad(id, self.vessel.id, tile, time, biology, rng);
        let dud = fad.is_dud();
        self.deployed.insert(id, fad);
        self.record_action(ActionClass::FadDeployment, time.year());

        tracing::debug!("{} deployed {} at {}{}", self.vessel.id, id, tile, if dud { " (dud)" } else { "" });
        self.react_to(FadEvent::FadDeployed {
            time,
            vessel: self.vessel.id,
            fad: id,
            tile,
            dud,
        });
        Ok(&self.deployed[&id])
    }

    /// Removes a FAD for good, destroying whatever it held.
    ///
    /// Returns `None` if the FAD is not (or no longer) deployed.
    pub fn lose_fad(
        &mut self,
        id: FadId,
        cause: LossCause,
        time: SimTime,
        biology: &GlobalBiology,
    ) -> Option<Fad> {
        let mut fad = self.deployed.remove(&id)?;
        fad.lose();
        if let Some(destroyed) = fad.release_into_void() {
            let event = fish_lost_event(time, self.vessel.id, id, &destroyed, biology);
            self.react_to(event);
        }
        tracing::debug!("{} lost {} ({:?})", self.vessel.id, id, cause);
        self.react_to(FadEvent::FadLost {
            time,
            vessel: self.vessel.id,
            fad: id,
            cause,
        });
        Some(fad)
    }

    /// Hauls a FAD back on board and returns it to stock.
    pub fn pick_up_fad(&mut self, id: FadId, time: SimTime, biology: &GlobalBiology) -> Option<Fad> {
        let mut fad = self.deployed.remove(&id)?;
        if let Some(destroyed) = fad.release_into_void() {
            let event = fish_lost_event(time, self.vessel.id, id, &destroyed, biology);
            self.react_to(event);
        }
        self.put_fad_back_in_stock();
        self.react_to(FadEvent::FadPickedUp {
            time,
            vessel: self.vessel.id,
            fad: id,
        });
        Some(fad)
    }

    /// Lets one deployed FAD attract fish from its tile.
    pub fn aggregate_fish<R: Rng + ?Sized>(
        &mut self,
        id: FadId,
        tile: &mut LocalBiology,
        registry: &AttractorRegistry,
        ctx: &AttractionContext<'_>,
        rng: &mut R,
    ) -> Option<Attraction> {
        let fad = self.deployed.get_mut(&id)?;
        let attraction = fad.aggregate_fish(tile, registry, ctx, rng)?;
        let location = fad.location();
        let biomass = attraction.biology.biomass_per_species(ctx.biology);
        self.react_to(FadEvent::FishAttracted {
            time: ctx.time,
            vessel: self.vessel.id,
            fad: id,
            tile: location,
            biomass,
        });
        Some(attraction)
    }

    /// Sets on one of the vessel's FADs.
    ///
    /// Keeps `retained_proportion` of the catch, then lets each species of
    /// what remains go back to the tile or into the void. The FAD leaves the
    /// water afterwards.
    pub fn fish_fad<R: Rng + ?Sized>(
        &mut self,
        id: FadId,
        tile: &mut LocalBiology,
        retained_proportion: f64,
        ctx: &AttractionContext<'_>,
        rng: &mut R,
    ) -> FadResult<SetOutcome> {
        let vessel = self.vessel.id;
        let mut fad = self
            .deployed
            .remove(&id)
            .ok_or(FadError::UnknownFad { vessel, fad: id })?;
        let catch = fad.take_catch(tile, retained_proportion, ctx);
        let (released, destroyed) = match fad.release_remaining(Some(&mut *tile), rng) {
            Some(release) => (release.released, release.destroyed),
            None => (catch.empty_like(), catch.empty_like()),
        };
        fad.lose();
        self.record_action(ActionClass::FadSet, ctx.time.year());

        self.react_to(FadEvent::FadFished {
            time: ctx.time,
            vessel,
            fad: id,
            tile: fad.location(),
            caught: catch.biomass_per_species(ctx.biology),
            released: released.biomass_per_species(ctx.biology),
        });
        if !destroyed.is_empty() {
            let event = fish_lost_event(ctx.time, vessel, id, &destroyed, ctx.biology);
            self.react_to(event);
        }
        Ok(SetOutcome {
            fad,
            catch,
            released,
            destroyed,
        })
    }

    /// Daily aging of every deployed FAD. Returns how many turned off.
    pub fn react_to_day(&mut self, time: SimTime) -> usize {
        self.deployed
            .values_mut()
            .map(|fad| fad.react_to_day(time))
            .filter(|turned_off| *turned_off)
            .count()
    }

    fn query_permission(
        &self,
        action: ActionClass,
        regulation: &dyn Regulation,
        time: SimTime,
        tile: Option<TilePos>,
        extra: usize,
    ) -> bool {
        let counts = HypotheticalCounts::new(self, time.year(), action, extra);
        regulation.is_permitted(&ActionQuery {
            vessel: &self.vessel,
            action,
            time,
            tile,
            counts: &counts,
        })
    }

    /// Whether the regulation lets the vessel take `action` right now.
    pub fn is_allowed(
        &self,
        action: ActionClass,
        regulation: &dyn Regulation,
        time: SimTime,
        tile: Option<TilePos>,
    ) -> bool {
        self.query_permission(action, regulation, time, tile, 0)
    }

    /// Largest `n` in `[0, max_to_check]` for which the action would still be
    /// permitted with `n` more of them on this year's counter.
    ///
    /// Relies on permission being monotone in `n`. Nothing is recorded.
    pub fn number_of_permissible_actions(
        &self,
        action: ActionClass,
        max_to_check: usize,
        regulation: &dyn Regulation,
        time: SimTime,
    ) -> usize {
        let permits = |extra: usize| self.query_permission(action, regulation, time, None, extra);
        if !permits(0) {
            return 0;
        }
        if permits(max_to_check) {
            return max_to_check;
        }
        // permits(low) holds and permits(high) does not
        let (mut low, mut high) = (0, max_to_check);
        while high - low > 1 {
            let mid = low + (high - low) / 2;
            if permits(mid) {
                low = mid;
            } else {
                high = mid;
            }
        }
        low
    }

    /// Actions of `action` still allowed this year under the tightest yearly
    /// limit, or `None` if no limit applies.
    pub fn remaining_yearly_actions(
        &self,
        action: ActionClass,
        regulation: &dyn Regulation,
        year: u32,
    ) -> Option<usize> {
        let taken = self.actions_taken(year, action);
        regulation
            .yearly_action_limits(&self.vessel, action, year)
            .into_iter()
            .map(|limit| limit.saturating_sub(taken))
            .min()
    }

    /// True if some action class with a yearly limit still has room left.
    pub fn any_yearly_limited_action_remaining(&self, regulation: &dyn Regulation, year: u32) -> bool {
        ActionClass::all().iter().any(|action| {
            self.remaining_yearly_actions(*action, regulation, year)
                .is_some_and(|remaining| remaining > 0)
        })
    }

    /// FADs that can still be deployed before hitting the tightest active-FAD
    /// limit, or `None` if no limit applies.
    pub fn remaining_active_fads(&self, regulation: &dyn Regulation, year: u32) -> Option<usize> {
        regulation
            .active_fad_limits(&self.vessel, year)
            .into_iter()
            .map(|limit| limit.saturating_sub(self.deployed.len()))
            .min()
    }
}

impl ActionCounts for FadManager {
    fn actions_taken(&self, year: u32, action: ActionClass) -> usize {
        self.actions.get(&(year, action)).copied().unwrap_or(0)
    }

    fn active_fads(&self) -> usize {
        self.deployed.len()
    }
}

fn fish_lost_event(
    time: SimTime,
    vessel: VesselId,
    fad: FadId,
    destroyed: &LocalBiology,
    biology: &GlobalBiology,
) -> FadEvent {
    let lost = destroyed.biomass_per_species(biology);
    match destroyed.abundance_matrices() {
        Some(abundance) => FadEvent::AbundanceLost {
            time,
            vessel,
            fad,
            lost,
            abundance,
        },
        None => FadEvent::BiomassLost {
            time,
            vessel,
            fad,
            lost,
        },
    }
}
