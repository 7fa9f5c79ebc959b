use std::time::Duration;

use crate::access_egress::AccessEgress;
use crate::calculator::TIME_NOT_SET;
use crate::config::{CostParams, SlackProvider, TransferOptimizationConfig};
use crate::network::{StopIndex, Timestamp};
use crate::path::RaptorPath;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RaptorProfile {
    /// Pareto on departure time, arrival time and number of transfers.
    Standard,
    /// Only the best arrival times and number of transfers per stop. Produces no paths.
    BestTime,
    /// Adds generalized cost and pass-through to the standard criteria.
    #[default]
    MultiCriteria,
}

impl RaptorProfile {
    pub fn is_multi_criteria(self) -> bool { self == RaptorProfile::MultiCriteria }

    pub fn produces_paths(self) -> bool { self != RaptorProfile::BestTime }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SearchDirection {
    #[default]
    Forward,
    Reverse,
}

/// An ordered stop group a path has to visit, e.g. a station with several platforms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassThroughPoint {
    pub stops: Vec<StopIndex>,
}

impl PassThroughPoint {
    pub fn new(stops: Vec<StopIndex>) -> Self {
        Self { stops }
    }
}

/// Tracks pass-through progress in c2: the number of points not yet visited. Points must be visited in order.
#[derive(Clone, Debug, Default)]
pub struct PassThroughPoints {
    points: Vec<PassThroughPoint>,
}

impl PassThroughPoints {
    pub fn new(points: Vec<PassThroughPoint>) -> Self {
        Self { points }
    }

    pub fn is_empty(&self) -> bool { self.points.is_empty() }

    pub fn initial_c2(&self) -> u32 { self.points.len() as u32 }

    /// The c2 after visiting `stop`.
    pub fn update_c2(&self, c2: u32, stop: StopIndex) -> u32 {
        if c2 == 0 {
            return 0;
        }
        let next = self.points.len() - c2 as usize;
        if self.points[next].stops.contains(&stop) { c2 - 1 } else { c2 }
    }

    /// True if visiting the stops in order passes through every point.
    pub fn is_passed_by(&self, stops: impl IntoIterator<Item = StopIndex>) -> bool {
        stops
            .into_iter()
            .fold(self.initial_c2(), |c2, stop| self.update_c2(c2, stop))
            == 0
    }
}

#[derive(Clone, Debug)]
pub struct SearchParams {
    pub earliest_departure_time: Option<Timestamp>,
    pub latest_arrival_time: Option<Timestamp>,
    /// Seconds. Calculated from heuristics when not set.
    pub search_window: Option<i32>,
    pub max_number_of_transfers: usize,
    pub number_of_additional_transfers: usize,
    /// Seconds between two Range-Raptor iterations.
    pub iteration_step: i32,
    pub access_paths: Vec<AccessEgress>,
    pub egress_paths: Vec<AccessEgress>,
    pub pass_through_points: Vec<PassThroughPoint>,
    pub constrained_transfers: bool,
    /// The search stops between rounds when this is exceeded, returning what it found so far.
    pub timeout: Option<Duration>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            earliest_departure_time: None,
            latest_arrival_time: None,
            search_window: None,
            max_number_of_transfers: 12,
            number_of_additional_transfers: 5,
            iteration_step: 60,
            access_paths: Vec::new(),
            egress_paths: Vec::new(),
            pass_through_points: Vec::new(),
            constrained_transfers: true,
            timeout: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct RaptorRequest {
    pub profile: RaptorProfile,
    pub direction: SearchDirection,
    pub search_params: SearchParams,
    pub slack: SlackProvider,
    pub cost: CostParams,
    /// Runs the transfer optimization on the found paths when set.
    pub optimize_transfers: Option<TransferOptimizationConfig>,
}

impl RaptorRequest {
    pub fn new(access_paths: Vec<AccessEgress>, egress_paths: Vec<AccessEgress>) -> Self {
        let mut request = Self::default();
        request.search_params.access_paths = access_paths;
        request.search_params.egress_paths = egress_paths;
        request
    }

    pub fn with_profile(mut self, profile: RaptorProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_direction(mut self, direction: SearchDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_earliest_departure_time(mut self, time: Timestamp) -> Self {
        self.search_params.earliest_departure_time = Some(time);
        self
    }

    pub fn with_latest_arrival_time(mut self, time: Timestamp) -> Self {
        self.search_params.latest_arrival_time = Some(time);
        self
    }

    pub fn with_search_window(mut self, seconds: i32) -> Self {
        self.search_params.search_window = Some(seconds);
        self
    }

    pub fn with_slack(mut self, slack: SlackProvider) -> Self {
        self.slack = slack;
        self
    }

    pub fn with_cost(mut self, cost: CostParams) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_pass_through_points(mut self, points: Vec<PassThroughPoint>) -> Self {
        self.search_params.pass_through_points = points;
        self
    }

    pub fn with_transfer_optimization(mut self, config: TransferOptimizationConfig) -> Self {
        self.optimize_transfers = Some(config);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.search_params.timeout = Some(timeout);
        self
    }
}

/// Best arrival time and fewest transfers per stop, over all labels of the search.
#[derive(Clone, Debug, Default)]
pub struct StopArrivals {
    best_times: Vec<Timestamp>,
    best_rides: Vec<Option<usize>>,
}

impl StopArrivals {
    pub(crate) fn new(num_stops: usize) -> Self {
        Self {
            best_times: vec![TIME_NOT_SET; num_stops],
            best_rides: vec![None; num_stops],
        }
    }

    pub(crate) fn update(&mut self, stop: StopIndex, time: Timestamp, rides: usize, is_better: impl Fn(Timestamp, Timestamp) -> bool) {
        let stop = stop as usize;
        if self.best_times[stop] == TIME_NOT_SET || is_better(time, self.best_times[stop]) {
            self.best_times[stop] = time;
        }
        if self.best_rides[stop].map_or(true, |best| rides < best) {
            self.best_rides[stop] = Some(rides);
        }
    }

    pub fn reached(&self, stop: StopIndex) -> bool {
        self.best_times.get(stop as usize).is_some_and(|&t| t != TIME_NOT_SET)
    }

    pub fn best_arrival_time(&self, stop: StopIndex) -> Option<Timestamp> {
        self.best_times
            .get(stop as usize)
            .copied()
            .filter(|&t| t != TIME_NOT_SET)
    }

    /// Transfers of the path with the fewest rides reaching the stop. Zero for stops reached by access only.
    pub fn best_number_of_transfers(&self, stop: StopIndex) -> Option<usize> {
        self.best_rides
            .get(stop as usize)
            .copied()
            .flatten()
            .map(|rides| rides.saturating_sub(1))
    }
}

#[derive(Clone, Debug, Default)]
pub struct RaptorResponse {
    pub paths: Vec<RaptorPath>,
    pub stop_arrivals: StopArrivals,
    /// The search was stopped by its timeout before it completed.
    pub partial: bool,
    pub earliest_departure_time: Option<Timestamp>,
    pub latest_arrival_time: Option<Timestamp>,
    pub search_window: Option<i32>,
    pub iterations: usize,
}

impl RaptorResponse {
    pub fn is_empty(&self) -> bool { self.paths.is_empty() }
}
