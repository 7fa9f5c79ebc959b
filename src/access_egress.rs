use std::collections::HashMap;
use std::fmt::Display;

use crate::cost::GeneralizedCost;
use crate::multicriteria::ParetoSet;
use crate::network::{StopIndex, Timestamp};
use crate::request::RaptorProfile;
use crate::utils;

/// The window during which an access or egress leg can start, e.g. a flex service or a bike-rental station.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpeningHours {
    pub opens: Timestamp,
    pub closes: Timestamp,
}

/// An access or egress leg produced by the street router. The core never computes these.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessEgress {
    /// The stop reached by an access leg, or left by an egress leg.
    pub stop: StopIndex,
    pub duration: i32,
    pub c1: GeneralizedCost,
    /// Rides already inside the leg, e.g. a flex trip.
    pub num_rides: u32,
    pub stop_reached_on_board: bool,
    /// Added to the duration when searching, but not part of the travel time.
    pub time_penalty: i32,
    pub opening_hours: Option<OpeningHours>,
}

impl AccessEgress {
    /// A walk leg, costed by its duration.
    pub fn walk(stop: StopIndex, duration: i32) -> Self {
        Self {
            stop,
            duration,
            c1: duration,
            num_rides: 0,
            stop_reached_on_board: false,
            time_penalty: 0,
            opening_hours: None,
        }
    }

    /// A leg with embedded rides that reaches the stop on board a vehicle.
    pub fn flex(stop: StopIndex, duration: i32, num_rides: u32) -> Self {
        Self { num_rides, stop_reached_on_board: true, ..Self::walk(stop, duration) }
    }

    pub fn with_c1(mut self, c1: GeneralizedCost) -> Self {
        self.c1 = c1;
        self
    }

    pub fn with_time_penalty(mut self, time_penalty: i32) -> Self {
        self.time_penalty = time_penalty;
        self
    }

    pub fn with_opening_hours(mut self, opens: Timestamp, closes: Timestamp) -> Self {
        self.opening_hours = Some(OpeningHours { opens, closes });
        self
    }

    pub fn with_free_on_board(mut self) -> Self {
        self.stop_reached_on_board = true;
        self
    }

    /// The duration used by the search, time penalty included.
    pub fn search_duration(&self) -> i32 { self.duration + self.time_penalty }

    pub fn has_rides(&self) -> bool { self.num_rides > 0 }

    pub fn has_opening_hours(&self) -> bool { self.opening_hours.is_some() }

    /// Earliest time the leg can start at or after `requested`, or `None` if it is closed for the rest of the day.
    pub fn earliest_departure_time(&self, requested: Timestamp) -> Option<Timestamp> {
        match self.opening_hours {
            None => Some(requested),
            Some(oh) if requested < oh.opens => Some(oh.opens),
            Some(oh) if requested <= oh.closes => Some(requested),
            Some(_) => None,
        }
    }

    /// Latest time the leg can end at or before `requested` in search time, penalty included. `None` if it was
    /// not open early enough.
    pub fn latest_arrival_time(&self, requested: Timestamp) -> Option<Timestamp> {
        self.latest_arrival_time_with(requested, self.search_duration())
    }

    /// Like [`latest_arrival_time`](Self::latest_arrival_time), but for the real leg, without the penalty.
    pub fn latest_leg_arrival_time(&self, requested: Timestamp) -> Option<Timestamp> {
        self.latest_arrival_time_with(requested, self.duration)
    }

    fn latest_arrival_time_with(&self, requested: Timestamp, duration: i32) -> Option<Timestamp> {
        let Some(oh) = self.opening_hours else {
            return Some(requested);
        };
        let departure = requested - duration;
        if departure > oh.closes {
            Some(oh.closes + duration)
        } else if departure >= oh.opens {
            Some(requested)
        } else {
            None
        }
    }
}

impl Display for AccessEgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.has_rides() {
            write!(f, "Flex+{} {}", self.num_rides, utils::get_duration_str(self.duration))?;
        } else {
            write!(f, "Walk {}", utils::get_duration_str(self.duration))?;
        }
        write!(f, " ${} ~ {}", self.c1, self.stop)?;
        if self.time_penalty != 0 {
            write!(f, " w/penalty({})", utils::get_duration_str(self.time_penalty))?;
        }
        if let Some(oh) = self.opening_hours {
            write!(f, " Open({} {})", utils::get_compact_time_str(oh.opens), utils::get_compact_time_str(oh.closes))?;
        }
        Ok(())
    }
}

/// True if `l` is better than `r` in at least one of the criteria used by the standard profiles.
fn standard_left_dominance(l: &AccessEgress, r: &AccessEgress) -> bool {
    (l.stop_reached_on_board && !r.stop_reached_on_board)
        || (!l.has_opening_hours() && r.has_opening_hours())
        || l.num_rides < r.num_rides
        || l.search_duration() < r.search_duration()
}

/// Keeps the optimal legs per stop for the standard and best-time profiles. Of two identical legs, the one
/// discovered first survives.
pub fn remove_none_optimal_paths_for_standard_raptor(paths: Vec<AccessEgress>) -> Vec<AccessEgress> {
    let mut stops = Vec::new();
    let mut by_stop: HashMap<StopIndex, ParetoSet<AccessEgress, _>> = HashMap::new();
    for path in paths {
        let set = by_stop.entry(path.stop).or_insert_with(|| {
            stops.push(path.stop);
            ParetoSet::new(standard_left_dominance as fn(&AccessEgress, &AccessEgress) -> bool)
        });
        set.add(path);
    }
    stops
        .into_iter()
        .filter_map(|stop| by_stop.remove(&stop))
        .flat_map(ParetoSet::into_vec)
        .collect()
}

fn filter_for_profile(paths: Vec<AccessEgress>, profile: RaptorProfile) -> Vec<AccessEgress> {
    if profile.is_multi_criteria() {
        paths
    } else {
        remove_none_optimal_paths_for_standard_raptor(paths)
    }
}

fn group_by_rides(paths: &[AccessEgress], on_board: bool) -> Vec<Vec<AccessEgress>> {
    let mut groups: Vec<Vec<AccessEgress>> = Vec::new();
    for path in paths.iter().filter(|p| p.stop_reached_on_board == on_board) {
        let rides = path.num_rides as usize;
        if groups.len() <= rides {
            groups.resize(rides + 1, Vec::new());
        }
        groups[rides].push(path.clone());
    }
    groups
}

/// Access legs grouped by the number of rides they contain, so they can be added in the matching round.
#[derive(Debug, Clone, Default)]
pub struct AccessPaths {
    arrived_on_street: Vec<Vec<AccessEgress>>,
    arrived_on_board: Vec<Vec<AccessEgress>>,
}

impl AccessPaths {
    pub fn create(paths: Vec<AccessEgress>, profile: RaptorProfile) -> Self {
        let paths = filter_for_profile(paths, profile);
        Self {
            arrived_on_street: group_by_rides(&paths, false),
            arrived_on_board: group_by_rides(&paths, true),
        }
    }

    pub fn arrived_on_street_by_num_of_rides(&self, rides: usize) -> &[AccessEgress] {
        self.arrived_on_street.get(rides).map_or(&[], Vec::as_slice)
    }

    pub fn arrived_on_board_by_num_of_rides(&self, rides: usize) -> &[AccessEgress] {
        self.arrived_on_board.get(rides).map_or(&[], Vec::as_slice)
    }

    pub fn calculate_max_number_of_rides(&self) -> usize {
        self.arrived_on_street.len().max(self.arrived_on_board.len()).saturating_sub(1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccessEgress> {
        self.arrived_on_street.iter().chain(self.arrived_on_board.iter()).flatten()
    }

    pub fn is_empty(&self) -> bool { self.iter().next().is_none() }
}

/// Egress legs indexed by the stop they leave from.
#[derive(Debug, Clone, Default)]
pub struct EgressPaths {
    by_stop: HashMap<StopIndex, Vec<AccessEgress>>,
    stops: Vec<StopIndex>,
}

impl EgressPaths {
    pub fn create(paths: Vec<AccessEgress>, profile: RaptorProfile) -> Self {
        let mut egress = Self::default();
        for path in filter_for_profile(paths, profile) {
            egress
                .by_stop
                .entry(path.stop)
                .or_insert_with(|| {
                    egress.stops.push(path.stop);
                    Vec::new()
                })
                .push(path);
        }
        egress
    }

    pub fn egresses_at(&self, stop: StopIndex) -> &[AccessEgress] {
        self.by_stop.get(&stop).map_or(&[], Vec::as_slice)
    }

    pub fn is_egress_stop(&self, stop: StopIndex) -> bool { self.by_stop.contains_key(&stop) }

    /// Stops with at least one egress leg, in discovery order.
    pub fn stops(&self) -> &[StopIndex] { &self.stops }

    pub fn iter(&self) -> impl Iterator<Item = &AccessEgress> {
        self.stops.iter().flat_map(|s| self.egresses_at(*s))
    }

    pub fn is_empty(&self) -> bool { self.stops.is_empty() }
}
