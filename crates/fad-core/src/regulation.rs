//! Regulations
//!
//! Rules restricting what a vessel may do. The FAD manager only consumes
//! their verdicts and limit tables; the building blocks here cover the
//! common yearly quotas, active-FAD caps and seasonal closures.

use std::collections::HashMap;

use fad_events::{ActionClass, SimTime, TilePos, VesselId};

/// Who is asking for permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VesselProfile {
    pub id: VesselId,
    /// Regulatory class (e.g. a capacity class)
    pub class: String,
}

impl VesselProfile {
    pub fn new(id: VesselId, class: impl Into<String>) -> Self {
        Self {
            id,
            class: class.into(),
        }
    }
}

/// Action counts a regulation may inspect.
pub trait ActionCounts {
    /// Actions of `action` taken in `year`.
    fn actions_taken(&self, year: u32, action: ActionClass) -> usize;
    /// FADs currently deployed.
    fn active_fads(&self) -> usize;
}

/// Counts that pretend `extra` more actions of one class happened this year.
///
/// For deployments the extra actions also show up as extra active FADs.
pub struct HypotheticalCounts<'a> {
    inner: &'a dyn ActionCounts,
    year: u32,
    action: ActionClass,
    extra: usize,
}

impl<'a> HypotheticalCounts<'a> {
    pub fn new(inner: &'a dyn ActionCounts, year: u32, action: ActionClass, extra: usize) -> Self {
        Self {
            inner,
            year,
            action,
            extra,
        }
    }
}

impl ActionCounts for HypotheticalCounts<'_> {
    fn actions_taken(&self, year: u32, action: ActionClass) -> usize {
        let actual = self.inner.actions_taken(year, action);
        if year == self.year && action == self.action {
            actual + self.extra
        } else {
            actual
        }
    }

    fn active_fads(&self) -> usize {
        let actual = self.inner.active_fads();
        if self.action == ActionClass::FadDeployment {
            actual + self.extra
        } else {
            actual
        }
    }
}

/// A request to perform one regulated action.
pub struct ActionQuery<'a> {
    pub vessel: &'a VesselProfile,
    pub action: ActionClass,
    pub time: SimTime,
    pub tile: Option<TilePos>,
    pub counts: &'a dyn ActionCounts,
}

pub trait Regulation: Send + Sync {
    /// Whether the action may be taken.
    fn is_permitted(&self, query: &ActionQuery<'_>) -> bool;

    /// Active-FAD caps that apply to this vessel this year.
    fn active_fad_limits(&self, _vessel: &VesselProfile, _year: u32) -> Vec<usize> {
        Vec::new()
    }

    /// Yearly caps on `action` that apply to this vessel.
    fn yearly_action_limits(&self, _vessel: &VesselProfile, _action: ActionClass, _year: u32) -> Vec<usize> {
        Vec::new()
    }
}

/// Caps how many actions of one class a vessel may take per year.
#[derive(Debug, Clone)]
pub struct YearlyActionLimit {
    action: ActionClass,
    limits: HashMap<String, usize>,
}

impl YearlyActionLimit {
    pub fn new(action: ActionClass, limits: HashMap<String, usize>) -> Self {
        Self { action, limits }
    }

    fn limit_for(&self, vessel: &VesselProfile) -> Option<usize> {
        self.limits.get(&vessel.class).copied()
    }
}

impl Regulation for YearlyActionLimit {
    fn is_permitted(&self, query: &ActionQuery<'_>) -> bool {
        if query.action != self.action {
            return true;
        }
        match self.limit_for(query.vessel) {
            Some(limit) => query.counts.actions_taken(query.time.year(), self.action) < limit,
            None => true,
        }
    }

    fn yearly_action_limits(&self, vessel: &VesselProfile, action: ActionClass, _year: u32) -> Vec<usize> {
        if action != self.action {
            return Vec::new();
        }
        self.limit_for(vessel).into_iter().collect()
    }
}

/// Caps how many FADs a vessel may have at sea, optionally only in some years.
#[derive(Debug, Clone)]
pub struct ActiveFadLimit {
    limits: HashMap<String, usize>,
    first_year: Option<u32>,
    last_year: Option<u32>,
}

impl ActiveFadLimit {
    pub fn new(limits: HashMap<String, usize>) -> Self {
        Self {
            limits,
            first_year: None,
            last_year: None,
        }
    }

    /// Builder: only enforce from `first` to `last` (inclusive)
    pub fn in_years(mut self, first: Option<u32>, last: Option<u32>) -> Self {
        self.first_year = first;
        self.last_year = last;
        self
    }

    fn applies(&self, year: u32) -> bool {
        self.first_year.map_or(true, |first| year >= first)
            && self.last_year.map_or(true, |last| year <= last)
    }

    fn limit_for(&self, vessel: &VesselProfile, year: u32) -> Option<usize> {
        if !self.applies(year) {
            return None;
        }
        self.limits.get(&vessel.class).copied()
    }
}

impl Regulation for ActiveFadLimit {
    fn is_permitted(&self, query: &ActionQuery<'_>) -> bool {
        if query.action != ActionClass::FadDeployment {
            return true;
        }
        match self.limit_for(query.vessel, query.time.year()) {
            Some(limit) => query.counts.active_fads() < limit,
            None => true,
        }
    }

    fn active_fad_limits(&self, vessel: &VesselProfile, year: u32) -> Vec<usize> {
        self.limit_for(vessel, year).into_iter().collect()
    }
}

/// Forbids some actions between two days of the year (inclusive, may wrap
/// around the new year).
#[derive(Debug, Clone)]
pub struct SeasonalClosure {
    actions: Vec<ActionClass>,
    start_day: u32,
    end_day: u32,
}

impl SeasonalClosure {
    pub fn new(actions: Vec<ActionClass>, start_day: u32, end_day: u32) -> Self {
        Self {
            actions,
            start_day,
            end_day,
        }
    }

    pub fn is_closed(&self, day_of_year: u32) -> bool {
        if self.start_day <= self.end_day {
            (self.start_day..=self.end_day).contains(&day_of_year)
        } else {
            day_of_year >= self.start_day || day_of_year <= self.end_day
        }
    }
}

impl Regulation for SeasonalClosure {
    fn is_permitted(&self, query: &ActionQuery<'_>) -> bool {
        !(self.actions.contains(&query.action) && self.is_closed(query.time.day_of_year()))
    }
}

/// Every rule must agree.
#[derive(Default)]
pub struct RegulationSet {
    rules: Vec<Box<dyn Regulation>>,
}

impl RegulationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a rule
    pub fn with(mut self, rule: impl Regulation + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn push(&mut self, rule: Box<dyn Regulation>) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Regulation for RegulationSet {
    fn is_permitted(&self, query: &ActionQuery<'_>) -> bool {
        self.rules.iter().all(|rule| rule.is_permitted(query))
    }

    fn active_fad_limits(&self, vessel: &VesselProfile, year: u32) -> Vec<usize> {
        self.rules
            .iter()
            .flat_map(|rule| rule.active_fad_limits(vessel, year))
            .collect()
    }

    fn yearly_action_limits(&self, vessel: &VesselProfile, action: ActionClass, year: u32) -> Vec<usize> {
        self.rules
            .iter()
            .flat_map(|rule| rule.yearly_action_limits(vessel, action, year))
            .collect()
    }
}
