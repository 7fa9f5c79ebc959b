use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use log::info;
use thiserror::Error;

use crate::cost::GeneralizedCost;
use crate::transfer::{ConstrainedTransfer, Transfer, TransferConstraint, TripStopPos};
use crate::utils;

/// Seconds since the start of the service day. Signed, so it can also hold the search sentinels.
pub type Timestamp = i32;
pub type StopIndex = u32;
pub type RouteIndex = u32;
pub type TripIndex = u32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Unknown stop '{0}'.")]
    UnknownStop(String),
    #[error("Unknown trip '{0}'.")]
    UnknownTrip(String),
    #[error("Unknown route index {0}.")]
    UnknownRoute(RouteIndex),
    #[error("Trip '{0}' is already defined.")]
    DuplicateTrip(String),
    #[error("Route '{route}' has {expected} stops, but trip '{trip}' has {actual} stop times.")]
    StopCountMismatch { route: String, trip: String, expected: usize, actual: usize },
    #[error("Trip '{0}' goes back in time.")]
    DecreasingTimes(String),
    #[error("Trips '{0}' and '{1}' overtake each other on route '{2}'.")]
    OvertakingTrips(String, String, String),
    #[error("Stop '{stop}' is not visited by trip '{trip}'.")]
    StopNotInTrip { trip: String, stop: String },
    #[error("Invalid stop position {pos} in trip '{trip}'.")]
    InvalidStopPosition { trip: String, pos: usize },
    #[error("Unknown boarding restriction '{0}', expected one of B, A, BA or *.")]
    InvalidRestriction(String),
    #[error("Route must visit at least two stops.")]
    RouteTooShort,
    #[error(transparent)]
    InvalidTime(#[from] utils::TimeParseError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlobalTripIndex {
    pub route_idx: RouteIndex,
    pub trip_idx: TripIndex,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StopTime {
    pub arrival_time: Timestamp,
    pub departure_time: Timestamp,
}

impl StopTime {
    pub const fn at(time: Timestamp) -> Self {
        Self { arrival_time: time, departure_time: time }
    }
}

/// Whether passengers may board or alight at a route position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StopPermission {
    pub board: bool,
    pub alight: bool,
}

impl StopPermission {
    pub const BOTH: StopPermission = StopPermission { board: true, alight: true };

    fn parse(code: &str) -> Result<Self, NetworkError> {
        match code {
            "B" => Ok(StopPermission { board: true, alight: false }),
            "A" => Ok(StopPermission { board: false, alight: true }),
            "BA" | "AB" | "*" => Ok(Self::BOTH),
            "-" => Ok(StopPermission { board: false, alight: false }),
            other => Err(NetworkError::InvalidRestriction(other.to_string())),
        }
    }
}

pub struct Route {
    pub name: Arc<str>,
    pub num_stops: usize,
    pub num_trips: usize,
    pub slack_index: usize,
    pub route_stops_idx: usize,
    pub stop_times_idx: usize,
    pub trip_ids_idx: usize,
}

impl Route {
    pub fn get_stops<'a>(&self, route_stops: &'a [StopIndex]) -> &'a [StopIndex] {
        &route_stops[self.route_stops_idx..(self.route_stops_idx + self.num_stops)]
    }

    pub fn get_permissions<'a>(&self, permissions: &'a [StopPermission]) -> &'a [StopPermission] {
        &permissions[self.route_stops_idx..(self.route_stops_idx + self.num_stops)]
    }

    pub fn get_trip<'a>(&self, trip: usize, stop_times: &'a [StopTime]) -> &'a [StopTime] {
        let start = self.stop_times_idx + trip * self.num_stops;
        let end = start + self.num_stops;
        &stop_times[start..end]
    }
}

pub struct Stop {
    pub name: Box<str>,
    pub routes_idx: usize,
    pub num_routes: usize,
}

impl Stop {
    pub fn new(name: String) -> Self {
        Self {
            name: name.into_boxed_str(),
            routes_idx: 0,
            num_routes: 0,
        }
    }

    pub fn get_routes<'a>(&self, stop_routes: &'a [RouteIndex]) -> &'a [RouteIndex] {
        &stop_routes[self.routes_idx..(self.routes_idx + self.num_routes)]
    }
}

/// A view of one trip together with the pattern it runs on.
#[derive(Clone, Copy)]
pub struct TripSchedule<'a> {
    pub index: GlobalTripIndex,
    pub id: &'a str,
    pub route: &'a Route,
    pub stops: &'a [StopIndex],
    pub permissions: &'a [StopPermission],
    pub stop_times: &'a [StopTime],
}

impl<'a> TripSchedule<'a> {
    pub fn num_stops(&self) -> usize { self.stops.len() }

    pub fn stop(&self, pos: usize) -> StopIndex { self.stops[pos] }

    pub fn arrival(&self, pos: usize) -> Timestamp { self.stop_times[pos].arrival_time }

    pub fn departure(&self, pos: usize) -> Timestamp { self.stop_times[pos].departure_time }

    pub fn boarding_possible_at(&self, pos: usize) -> bool { self.permissions[pos].board }

    pub fn alighting_possible_at(&self, pos: usize) -> bool { self.permissions[pos].alight }

    pub fn slack_index(&self) -> usize { self.route.slack_index }

    /// First position at or after `start_pos` visiting `stop`.
    pub fn find_stop_pos_after(&self, start_pos: usize, stop: StopIndex) -> Option<usize> {
        (start_pos..self.num_stops()).find(|&pos| self.stops[pos] == stop)
    }

    /// Last position strictly before `end_pos` visiting `stop`.
    pub fn find_stop_pos_before(&self, end_pos: usize, stop: StopIndex) -> Option<usize> {
        (0..end_pos.min(self.num_stops())).rev().find(|&pos| self.stops[pos] == stop)
    }
}

impl Display for TripSchedule<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.route.name, utils::get_compact_time_str(self.departure(0)))
    }
}

pub struct Network {
    pub routes: Vec<Route>,
    pub stops: Vec<Stop>,
    pub stop_index: HashMap<String, StopIndex>,
    pub stop_times: Vec<StopTime>,
    pub stop_routes: Vec<RouteIndex>,
    pub route_stops: Vec<StopIndex>,
    pub route_stop_permissions: Vec<StopPermission>,
    pub trip_ids: Vec<Arc<str>>,
    trip_index: HashMap<Arc<str>, GlobalTripIndex>,
    transfers_from: Vec<Vec<Transfer>>,
    transfers_to: Vec<Vec<Transfer>>,
    constrained_from: HashMap<TripStopPos, Vec<ConstrainedTransfer>>,
    constrained_to: HashMap<TripStopPos, Vec<ConstrainedTransfer>>,
}

impl Network {
    pub fn stop_name(&self, stop: StopIndex) -> &str { &self.stops[stop as usize].name }

    pub fn get_stop_idx(&self, stop_id: &str) -> Option<StopIndex> { self.stop_index.get(stop_id).copied() }

    pub fn num_stops(&self) -> usize { self.stops.len() }

    pub fn num_routes(&self) -> usize { self.routes.len() }

    pub fn num_trips(&self, route_idx: RouteIndex) -> usize { self.routes[route_idx as usize].num_trips }

    pub fn get_stop_routes(&self, stop: StopIndex) -> &[RouteIndex] {
        self.stops[stop as usize].get_routes(&self.stop_routes)
    }

    pub fn get_trip(&self, trip: GlobalTripIndex) -> TripSchedule<'_> {
        let route = &self.routes[trip.route_idx as usize];
        TripSchedule {
            index: trip,
            id: &self.trip_ids[route.trip_ids_idx + trip.trip_idx as usize],
            route,
            stops: route.get_stops(&self.route_stops),
            permissions: route.get_permissions(&self.route_stop_permissions),
            stop_times: route.get_trip(trip.trip_idx as usize, &self.stop_times),
        }
    }

    pub fn find_trip(&self, trip_id: &str) -> Option<TripSchedule<'_>> {
        self.trip_index.get(trip_id).map(|&idx| self.get_trip(idx))
    }

    pub fn transfers_from(&self, stop: StopIndex) -> &[Transfer] { &self.transfers_from[stop as usize] }

    pub fn transfers_to(&self, stop: StopIndex) -> &[Transfer] { &self.transfers_to[stop as usize] }

    /// Constrained transfers leaving the given trip position.
    pub fn constrained_transfers_from(&self, from: TripStopPos) -> &[ConstrainedTransfer] {
        self.constrained_from.get(&from).map_or(&[], Vec::as_slice)
    }

    /// Constrained transfers arriving at the given trip position.
    pub fn constrained_transfers_to(&self, to: TripStopPos) -> &[ConstrainedTransfer] {
        self.constrained_to.get(&to).map_or(&[], Vec::as_slice)
    }

    pub fn find_constrained_transfer(&self, from: TripStopPos, to: TripStopPos) -> Option<&TransferConstraint> {
        self.constrained_transfers_from(from)
            .iter()
            .find(|tx| tx.to == to)
            .map(|tx| &tx.constraint)
    }

    pub fn print_stats(&self) {
        let num_trips: usize = self.routes.iter().map(|r| r.num_trips).sum();
        let num_transfers: usize = self.transfers_from.iter().map(Vec::len).sum();
        let num_constrained: usize = self.constrained_from.values().map(Vec::len).sum();
        info!(
            "Network: {} stops, {} routes, {} trips, {} stop times, {} transfers, {} constrained transfers",
            self.num_stops(),
            self.num_routes(),
            num_trips,
            self.stop_times.len(),
            num_transfers,
            num_constrained,
        );
    }
}

struct RouteDraft {
    name: String,
    stops: Vec<StopIndex>,
    permissions: Vec<StopPermission>,
    slack_index: usize,
    trips: Vec<(String, Vec<StopTime>)>,
}

enum StopRef {
    Stop(String),
    Pos(usize),
}

struct ConstrainedDraft {
    from_trip: String,
    from: StopRef,
    to_trip: String,
    to: StopRef,
    constraint: TransferConstraint,
}

/// Builds a [`Network`] from stops, route patterns, trips and transfers.
/// Trips and stops are referenced by their string ids, indices are assigned in `build`.
#[derive(Default)]
pub struct NetworkBuilder {
    stop_names: Vec<String>,
    stop_index: HashMap<String, StopIndex>,
    routes: Vec<RouteDraft>,
    transfers: Vec<Transfer>,
    constrained: Vec<ConstrainedDraft>,
}

impl NetworkBuilder {
    pub fn new() -> Self { Self::default() }

    /// Adds a stop if it does not exist yet, returning its index.
    pub fn add_stop(&mut self, name: &str) -> StopIndex {
        if let Some(&idx) = self.stop_index.get(name) {
            return idx;
        }
        let idx = self.stop_names.len() as StopIndex;
        self.stop_names.push(name.to_string());
        self.stop_index.insert(name.to_string(), idx);
        idx
    }

    pub fn stop(&self, name: &str) -> Result<StopIndex, NetworkError> {
        self.stop_index
            .get(name)
            .copied()
            .ok_or_else(|| NetworkError::UnknownStop(name.to_string()))
    }

    /// Adds a route pattern where boarding and alighting is allowed everywhere.
    pub fn add_route(&mut self, name: &str, stops: &[&str]) -> Result<RouteIndex, NetworkError> {
        let restrictions = vec!["*"; stops.len()].join(" ");
        self.add_route_with_restrictions(name, stops, &restrictions)
    }

    /// Adds a route pattern with per-position boarding restrictions, e.g. `"B * * A"`.
    pub fn add_route_with_restrictions(
        &mut self,
        name: &str,
        stops: &[&str],
        restrictions: &str,
    ) -> Result<RouteIndex, NetworkError> {
        if stops.len() < 2 {
            return Err(NetworkError::RouteTooShort);
        }
        let permissions = restrictions
            .split_whitespace()
            .map(StopPermission::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if permissions.len() != stops.len() {
            return Err(NetworkError::InvalidRestriction(restrictions.to_string()));
        }
        let stops = stops.iter().map(|s| self.add_stop(s)).collect();
        self.routes.push(RouteDraft {
            name: name.to_string(),
            stops,
            permissions,
            slack_index: 0,
            trips: Vec::new(),
        });
        Ok((self.routes.len() - 1) as RouteIndex)
    }

    pub fn set_slack_index(&mut self, route: RouteIndex, slack_index: usize) -> Result<(), NetworkError> {
        self.route_mut(route)?.slack_index = slack_index;
        Ok(())
    }

    fn route_mut(&mut self, route: RouteIndex) -> Result<&mut RouteDraft, NetworkError> {
        self.routes.get_mut(route as usize).ok_or(NetworkError::UnknownRoute(route))
    }

    pub fn add_trip(&mut self, route: RouteIndex, trip_id: &str, times: Vec<StopTime>) -> Result<(), NetworkError> {
        let draft = self.routes.get(route as usize).ok_or(NetworkError::UnknownRoute(route))?;
        if times.len() != draft.stops.len() {
            return Err(NetworkError::StopCountMismatch {
                route: draft.name.clone(),
                trip: trip_id.to_string(),
                expected: draft.stops.len(),
                actual: times.len(),
            });
        }
        let mut prev = Timestamp::MIN;
        for st in &times {
            if st.arrival_time < prev || st.departure_time < st.arrival_time {
                return Err(NetworkError::DecreasingTimes(trip_id.to_string()));
            }
            prev = st.departure_time;
        }
        if self.routes.iter().any(|r| r.trips.iter().any(|(id, _)| id == trip_id)) {
            return Err(NetworkError::DuplicateTrip(trip_id.to_string()));
        }
        self.route_mut(route)?.trips.push((trip_id.to_string(), times));
        Ok(())
    }

    /// Adds a trip from a space separated list of times, one per stop, e.g. `"10:00 10:10 10:25"`.
    /// Each stop uses the same arrival and departure time.
    pub fn add_trip_schedule(&mut self, route: RouteIndex, trip_id: &str, schedule: &str) -> Result<(), NetworkError> {
        let times = schedule
            .split_whitespace()
            .map(|t| utils::parse_time(t).map(StopTime::at))
            .collect::<Result<Vec<_>, _>>()?;
        self.add_trip(route, trip_id, times)
    }

    pub fn add_transfer(&mut self, from: &str, to: &str, duration: i32, c1: GeneralizedCost) -> Result<(), NetworkError> {
        let from_stop = self.stop(from)?;
        let to_stop = self.stop(to)?;
        self.transfers.push(Transfer { from_stop, to_stop, duration, c1 });
        Ok(())
    }

    /// Constrains the transfer between the first visit of `from_stop` in `from_trip` and the first visit of
    /// `to_stop` in `to_trip`.
    pub fn add_constrained_transfer(
        &mut self,
        from_trip: &str,
        from_stop: &str,
        to_trip: &str,
        to_stop: &str,
        constraint: TransferConstraint,
    ) {
        self.constrained.push(ConstrainedDraft {
            from_trip: from_trip.to_string(),
            from: StopRef::Stop(from_stop.to_string()),
            to_trip: to_trip.to_string(),
            to: StopRef::Stop(to_stop.to_string()),
            constraint,
        });
    }

    /// Constrains the transfer between two explicit stop positions, needed when a pattern visits a stop twice.
    pub fn add_constrained_transfer_at(
        &mut self,
        from_trip: &str,
        from_pos: usize,
        to_trip: &str,
        to_pos: usize,
        constraint: TransferConstraint,
    ) {
        self.constrained.push(ConstrainedDraft {
            from_trip: from_trip.to_string(),
            from: StopRef::Pos(from_pos),
            to_trip: to_trip.to_string(),
            to: StopRef::Pos(to_pos),
            constraint,
        });
    }

    pub fn build(self) -> Result<Network, NetworkError> {
        let mut stops: Vec<Stop> = self.stop_names.into_iter().map(Stop::new).collect();

        let mut routes = Vec::with_capacity(self.routes.len());
        let mut route_stops = Vec::new();
        let mut route_stop_permissions = Vec::new();
        let mut stop_times = Vec::new();
        let mut trip_ids: Vec<Arc<str>> = Vec::new();
        let mut trip_index = HashMap::new();

        for (route_idx, mut draft) in self.routes.into_iter().enumerate() {
            // Sort trips in route based on earliest departure time.
            draft.trips.sort_by_key(|(_, times)| times[0].departure_time);
            for pair in draft.trips.windows(2) {
                let (a_id, a) = &pair[0];
                let (b_id, b) = &pair[1];
                let overtakes = a
                    .iter()
                    .zip(b.iter())
                    .any(|(x, y)| x.arrival_time > y.arrival_time || x.departure_time > y.departure_time);
                if overtakes {
                    return Err(NetworkError::OvertakingTrips(a_id.clone(), b_id.clone(), draft.name));
                }
            }

            routes.push(Route {
                name: Arc::from(draft.name.as_str()),
                num_stops: draft.stops.len(),
                num_trips: draft.trips.len(),
                slack_index: draft.slack_index,
                route_stops_idx: route_stops.len(),
                stop_times_idx: stop_times.len(),
                trip_ids_idx: trip_ids.len(),
            });
            route_stops.extend_from_slice(&draft.stops);
            route_stop_permissions.extend_from_slice(&draft.permissions);

            for (trip_idx, (id, times)) in draft.trips.into_iter().enumerate() {
                let id: Arc<str> = Arc::from(id.as_str());
                trip_index.insert(
                    id.clone(),
                    GlobalTripIndex { route_idx: route_idx as RouteIndex, trip_idx: trip_idx as TripIndex },
                );
                trip_ids.push(id);
                stop_times.extend(times);
            }
        }

        // Index the routes for a given stop.
        let mut stop_routes = Vec::new();
        for (stop_idx, stop) in stops.iter_mut().enumerate() {
            stop.routes_idx = stop_routes.len();
            for (route_idx, route) in routes.iter().enumerate() {
                if route.get_stops(&route_stops).contains(&(stop_idx as StopIndex)) {
                    stop_routes.push(route_idx as RouteIndex);
                }
            }
            stop.num_routes = stop_routes.len() - stop.routes_idx;
        }

        let mut transfers_from = vec![Vec::new(); stops.len()];
        let mut transfers_to = vec![Vec::new(); stops.len()];
        for tx in self.transfers {
            transfers_from[tx.from_stop as usize].push(tx);
            transfers_to[tx.to_stop as usize].push(tx);
        }

        let mut network = Network {
            routes,
            stops,
            stop_index: self.stop_index,
            stop_times,
            stop_routes,
            route_stops,
            route_stop_permissions,
            trip_ids,
            trip_index,
            transfers_from,
            transfers_to,
            constrained_from: HashMap::new(),
            constrained_to: HashMap::new(),
        };

        for draft in self.constrained {
            let from = resolve_stop_ref(&network, &draft.from_trip, &draft.from)?;
            let to = resolve_stop_ref(&network, &draft.to_trip, &draft.to)?;
            let tx = ConstrainedTransfer { from, to, constraint: draft.constraint };
            network.constrained_from.entry(from).or_default().push(tx);
            network.constrained_to.entry(to).or_default().push(tx);
        }

        network.print_stats();
        Ok(network)
    }
}

fn resolve_stop_ref(network: &Network, trip_id: &str, stop: &StopRef) -> Result<TripStopPos, NetworkError> {
    let trip = network
        .find_trip(trip_id)
        .ok_or_else(|| NetworkError::UnknownTrip(trip_id.to_string()))?;
    let pos = match stop {
        StopRef::Pos(pos) if *pos < trip.num_stops() => *pos,
        StopRef::Pos(pos) => {
            return Err(NetworkError::InvalidStopPosition { trip: trip_id.to_string(), pos: *pos });
        }
        StopRef::Stop(name) => {
            let stop_idx = network
                .get_stop_idx(name)
                .ok_or_else(|| NetworkError::UnknownStop(name.clone()))?;
            trip.find_stop_pos_after(0, stop_idx).ok_or_else(|| NetworkError::StopNotInTrip {
                trip: trip_id.to_string(),
                stop: name.clone(),
            })?
        }
    };
    Ok(TripStopPos::new(trip.index, pos))
}
