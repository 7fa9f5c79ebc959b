use std::collections::HashMap;
use std::time::Instant;

use log::{debug, trace, warn};

use crate::access_egress::{AccessEgress, AccessPaths, EgressPaths};
use crate::calculator::TransitCalculator;
use crate::config::SlackProvider;
use crate::cost::CostCalculator;
use crate::multicriteria::{
    ArrivalIndex, ArrivalKind, ArrivalRef, ParetoComparator, ParetoSet, RouteBag, RouteBoarding,
    RouteBoardingComparator, StopArrival, StopArrivalComparator, StopBag,
};
use crate::network::{GlobalTripIndex, Network, RouteIndex, StopIndex, Timestamp, TripIndex};
use crate::path::{PathBuilder, PathError, PathPart, RaptorPath};
use crate::request::{PassThroughPoints, RaptorProfile, StopArrivals};
use crate::round_tracker::RoundTracker;
use crate::transfer::{ConstrainedTransfer, Transfer, TransferConstraint, TripStopPos};

/// Dominance of destination paths: later start, earlier end, fewer transfers and, for multi-criteria, lower cost.
#[derive(Clone, Copy, Debug)]
pub struct PathComparator {
    include_cost: bool,
}

impl PathComparator {
    pub fn new(profile: RaptorProfile) -> Self {
        Self { include_cost: profile.is_multi_criteria() }
    }
}

impl ParetoComparator<RaptorPath> for PathComparator {
    fn left_dominance_exist(&self, l: &RaptorPath, r: &RaptorPath) -> bool {
        l.start_time > r.start_time
            || l.end_time < r.end_time
            || l.number_of_transfers() < r.number_of_transfers()
            || (self.include_cost && l.c1 < r.c1)
    }
}

/// Dominance of destination arrivals for the best-time profile, which produces no paths.
#[derive(Clone, Copy, Debug)]
struct ArrivalTimeComparator<T: TransitCalculator>(T);

impl<T: TransitCalculator> ParetoComparator<(Timestamp, usize)> for ArrivalTimeComparator<T> {
    fn left_dominance_exist(&self, l: &(Timestamp, usize), r: &(Timestamp, usize)) -> bool {
        self.0.is_before(l.0, r.0) || l.1 < r.1
    }
}

/// Settings of one worker that do not come from the network.
#[derive(Clone, Debug, Default)]
pub struct WorkerConfig {
    pub max_number_of_transfers: usize,
    pub number_of_additional_transfers: usize,
    pub pass_through: PassThroughPoints,
    pub constrained_transfers: bool,
    /// Hard limit on arrivals: the latest arrival time (forward) or earliest departure time (reverse).
    pub search_time_limit: Option<Timestamp>,
    pub deadline: Option<Instant>,
}

pub struct WorkerResult {
    pub paths: Vec<RaptorPath>,
    pub stop_arrivals: StopArrivals,
    pub partial: bool,
    pub iterations: usize,
}

/// The Range-Raptor round loop for one request. All state is owned by the worker and dropped with it,
/// only the network is shared.
pub struct RangeRaptorWorker<'a, T: TransitCalculator> {
    network: &'a Network,
    calculator: T,
    profile: RaptorProfile,
    slack: &'a SlackProvider,
    cost: CostCalculator,
    config: WorkerConfig,
    access: Vec<AccessEgress>,
    access_on_street: Vec<Vec<usize>>,
    access_on_board: Vec<Vec<usize>>,
    max_access_rides: usize,
    egress: EgressPaths,
    round_tracker: RoundTracker,
    // Label arena, labels point to their parent by index.
    arrivals: Vec<StopArrival>,
    alive: Vec<bool>,
    bags: Vec<StopBag<T>>,
    round_arrivals: Vec<ArrivalIndex>,
    destination: ParetoSet<RaptorPath, PathComparator>,
    best_times_destination: ParetoSet<(Timestamp, usize), ArrivalTimeComparator<T>>,
    stop_arrivals: StopArrivals,
    iteration_time: Timestamp,
}

impl<'a, T: TransitCalculator> RangeRaptorWorker<'a, T> {
    /// `access` and `egress` are in search order: a reverse search starts from the egress legs.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        network: &'a Network,
        calculator: T,
        profile: RaptorProfile,
        slack: &'a SlackProvider,
        cost: CostCalculator,
        access: Vec<AccessEgress>,
        egress: Vec<AccessEgress>,
        config: WorkerConfig,
    ) -> Self {
        let access_paths = AccessPaths::create(access, profile);
        let max_access_rides = access_paths.calculate_max_number_of_rides();

        // Flatten the access legs so labels can refer to them by index.
        let mut flat = Vec::new();
        let mut access_on_street = vec![Vec::new(); max_access_rides + 1];
        let mut access_on_board = vec![Vec::new(); max_access_rides + 1];
        for rides in 0..=max_access_rides {
            for leg in access_paths.arrived_on_street_by_num_of_rides(rides) {
                access_on_street[rides].push(flat.len());
                flat.push(leg.clone());
            }
            for leg in access_paths.arrived_on_board_by_num_of_rides(rides) {
                access_on_board[rides].push(flat.len());
                flat.push(leg.clone());
            }
        }

        let num_stops = network.num_stops();
        let comparator = StopArrivalComparator::new(calculator, profile);
        Self {
            network,
            calculator,
            profile,
            slack,
            cost,
            round_tracker: RoundTracker::new(config.max_number_of_transfers, config.number_of_additional_transfers),
            config,
            access: flat,
            access_on_street,
            access_on_board,
            max_access_rides,
            egress: EgressPaths::create(egress, profile),
            arrivals: Vec::new(),
            alive: Vec::new(),
            bags: (0..num_stops).map(|_| StopBag::new(comparator)).collect(),
            round_arrivals: Vec::new(),
            destination: ParetoSet::new(PathComparator::new(profile)),
            best_times_destination: ParetoSet::new(ArrivalTimeComparator(calculator)),
            stop_arrivals: StopArrivals::new(num_stops),
            iteration_time: 0,
        }
    }

    /// Runs one Raptor search per iteration time. Labels are kept between iterations.
    pub fn route(mut self, iteration_times: &[Timestamp]) -> WorkerResult {
        let mut partial = false;
        let mut iterations = 0;

        'iterations: for &iteration_time in iteration_times {
            if self.deadline_exceeded() {
                partial = true;
                break;
            }
            iterations += 1;
            self.iteration_time = iteration_time;
            self.round_tracker.setup_iteration();
            self.round_arrivals.clear();

            // Round 0: access legs without rides.
            self.add_access(self.access_on_board[0].clone());
            self.add_access(self.access_on_street[0].clone());
            self.transfers_for_round();
            self.round_complete();

            while self.round_tracker.has_more_rounds() {
                if self.deadline_exceeded() {
                    partial = true;
                    break 'iterations;
                }
                let round = self.round_tracker.next_round();
                let previous = self.prepare_round();
                if previous.is_empty() && round > self.max_access_rides {
                    break;
                }

                self.scan_routes(round, &previous);
                if let Some(indices) = self.access_on_board.get(round).cloned() {
                    self.add_access(indices);
                }
                self.transfers_for_round();
                if let Some(indices) = self.access_on_street.get(round).cloned() {
                    self.add_access(indices);
                }
                trace!("Round {round}: {} new arrivals", self.round_arrivals.len());
                self.round_complete();
            }
        }

        if partial {
            warn!("Search timed out after {iterations} of {} iterations", iteration_times.len());
        }
        debug!(
            "Range-Raptor finished {iterations} iterations with {} labels and {} paths",
            self.arrivals.len(),
            self.destination.len(),
        );

        let mut paths = if self.profile.produces_paths() { self.destination.into_vec() } else { Vec::new() };
        paths.sort_by_key(|p| (p.end_time, p.number_of_transfers(), p.c1, -p.start_time));
        WorkerResult { paths, stop_arrivals: self.stop_arrivals, partial, iterations }
    }

    fn deadline_exceeded(&self) -> bool {
        self.config.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    fn exceeds_time_limit(&self, time: Timestamp, time_penalty: i32) -> bool {
        self.config
            .search_time_limit
            .is_some_and(|limit| self.calculator.is_after(self.calculator.minus_duration(time, time_penalty), limit))
    }

    /// Takes the arrivals of the round just completed that are still optimal.
    fn prepare_round(&mut self) -> Vec<ArrivalIndex> {
        let mut previous = std::mem::take(&mut self.round_arrivals);
        previous.retain(|&idx| self.alive[idx]);
        previous
    }

    fn add_arrival(&mut self, arrival: StopArrival) -> bool {
        if self.exceeds_time_limit(arrival.time, arrival.time_penalty) {
            return false;
        }
        let idx = self.arrivals.len();
        let alive = &mut self.alive;
        let added = self.bags[arrival.stop as usize]
            .add_and_notify(ArrivalRef::new(idx, &arrival), |removed| alive[removed.idx] = false);
        if added {
            let calculator = self.calculator;
            self.stop_arrivals
                .update(arrival.stop, arrival.time, arrival.rides, |a, b| calculator.is_before(a, b));
            self.arrivals.push(arrival);
            self.alive.push(true);
            self.round_arrivals.push(idx);
        }
        added
    }

    fn add_access(&mut self, indices: Vec<usize>) {
        for access_idx in indices {
            let access = &self.access[access_idx];
            // Opening hours may reject the iteration time.
            let Some(departure_time) = self.calculator.departure_time(access, self.iteration_time) else {
                continue;
            };
            let pass_through = &self.config.pass_through;
            let arrival = StopArrival {
                stop: access.stop,
                time: self.calculator.plus_duration(departure_time, access.search_duration()),
                rides: access.num_rides as usize,
                c1: access.c1,
                c2: pass_through.update_c2(pass_through.initial_c2(), access.stop),
                arrived_on_board: access.stop_reached_on_board,
                time_penalty: access.time_penalty,
                kind: ArrivalKind::Access { access_idx, departure_time },
                parent: None,
            };
            self.add_arrival(arrival);
        }
    }

    fn scan_routes(&mut self, round: usize, previous: &[ArrivalIndex]) {
        let network = self.network;

        // Group the arrivals of the previous round by stop, and find the routes serving them.
        let mut by_stop: HashMap<StopIndex, Vec<ArrivalIndex>> = HashMap::new();
        let mut marked_routes = vec![false; network.num_routes()];
        let mut routes = Vec::new();
        for &idx in previous {
            let stop = self.arrivals[idx].stop;
            by_stop.entry(stop).or_default().push(idx);
            for &route_idx in network.get_stop_routes(stop) {
                if !marked_routes[route_idx as usize] {
                    marked_routes[route_idx as usize] = true;
                    routes.push(route_idx);
                }
            }
        }

        for route_idx in routes {
            if network.num_trips(route_idx) > 0 {
                self.scan_route(round, route_idx, &by_stop);
            }
        }
    }

    fn scan_route(&mut self, round: usize, route_idx: RouteIndex, by_stop: &HashMap<StopIndex, Vec<ArrivalIndex>>) {
        let network = self.network;
        let calc = self.calculator;
        let route = &network.routes[route_idx as usize];
        let stops = route.get_stops(&network.route_stops);
        let alight_slack = calc.alight_slack(self.slack, route.slack_index);
        let pattern = network.get_trip(GlobalTripIndex { route_idx, trip_idx: 0 });

        let mut route_bag = RouteBag::new(RouteBoardingComparator::new(calc, self.profile));

        for pos in calc.stop_positions(route.num_stops) {
            let stop = stops[pos];

            if !self.config.pass_through.is_empty() {
                for boarding in route_bag.iter_mut() {
                    boarding.c2 = self.config.pass_through.update_c2(boarding.c2, stop);
                }
            }

            // Alight the trips we are on.
            if calc.alighting_possible_at(&pattern, pos) {
                for boarding in route_bag.iter() {
                    let trip_index = GlobalTripIndex { route_idx, trip_idx: boarding.trip_idx };
                    let trip = network.get_trip(trip_index);
                    let alight_time = calc.trip_alight_time(&trip, pos);
                    let arrival = StopArrival {
                        stop,
                        time: calc.stop_arrival_time(&trip, pos, alight_slack),
                        rides: round,
                        c1: boarding.c1 + self.cost.transit_cost(calc.duration(boarding.board_time, alight_time), alight_slack),
                        c2: boarding.c2,
                        arrived_on_board: true,
                        time_penalty: self.arrivals[boarding.boarding].time_penalty,
                        kind: ArrivalKind::Transit {
                            trip: trip_index,
                            board_pos: boarding.board_pos,
                            alight_pos: pos,
                            board_time: boarding.board_time,
                            constraint: boarding.constraint,
                        },
                        parent: Some(boarding.boarding),
                    };
                    self.add_arrival(arrival);
                }
            }

            // Can we catch a (better) trip at this stop?
            if calc.boarding_possible_at(&pattern, pos) {
                if let Some(labels) = by_stop.get(&stop) {
                    for &label in labels {
                        self.board(route_idx, pos, label, &mut route_bag);
                    }
                }
            }
        }
    }

    fn board(&self, route_idx: RouteIndex, pos: usize, label: ArrivalIndex, route_bag: &mut RouteBag<T>) {
        let network = self.network;
        let calc = self.calculator;
        let prev = &self.arrivals[label];
        let route = &network.routes[route_idx as usize];

        let mut slack = calc.board_slack(self.slack, route.slack_index);
        if prev.rides > 0 {
            slack += self.slack.transfer_slack;
        }
        let earliest_board_time = calc.plus_duration(prev.time, slack);

        // Constrained transfers from the trip we arrived on to this route and position.
        let mut constraints: Vec<&ConstrainedTransfer> = Vec::new();
        let mut source_arrival_time = prev.time;
        if self.config.constrained_transfers {
            if let ArrivalKind::Transit { trip, alight_pos, .. } = prev.kind {
                source_arrival_time = calc.trip_alight_time(&network.get_trip(trip), alight_pos);
                constraints = calc
                    .constrained_transfers(network, TripStopPos::new(trip, alight_pos))
                    .iter()
                    .filter(|tx| {
                        let target = calc.constrained_target(tx);
                        target.trip.route_idx == route_idx && target.stop_pos == pos
                    })
                    .collect();
            }
        }

        // Guaranteed and stay-seated transfers need no slack.
        for tx in constraints.iter().filter(|tx| tx.constraint.is_facilitated()) {
            let target = calc.constrained_target(tx);
            let board_time = calc.trip_board_time(&network.get_trip(target.trip), pos);
            if !calc.is_before(board_time, source_arrival_time)
                && tx.constraint.is_facilitated_for_wait(calc.duration(source_arrival_time, board_time))
            {
                self.add_route_boarding(route_bag, label, route_idx, target.trip.trip_idx, pos, Some(tx.constraint));
            }
        }

        let constraint_for = |trip_idx: TripIndex| {
            constraints
                .iter()
                .find(|tx| calc.constrained_target(tx).trip.trip_idx == trip_idx)
                .map(|tx| tx.constraint)
        };
        let blocked = |trip_idx: TripIndex| {
            constraint_for(trip_idx).is_some_and(|c| {
                c.is_not_allowed()
                    || c.min_transfer_time.is_some_and(|min| {
                        let trip = network.get_trip(GlobalTripIndex { route_idx, trip_idx });
                        calc.is_before(calc.trip_board_time(&trip, pos), calc.plus_duration(source_arrival_time, min))
                    })
            })
        };

        if let Some(trip_idx) = calc.find_trip(network, route_idx, pos, earliest_board_time, None, blocked) {
            let constraint = constraint_for(trip_idx).filter(|c| !c.is_regular());
            self.add_route_boarding(route_bag, label, route_idx, trip_idx, pos, constraint);
        }
    }

    fn add_route_boarding(
        &self,
        route_bag: &mut RouteBag<T>,
        label: ArrivalIndex,
        route_idx: RouteIndex,
        trip_idx: TripIndex,
        pos: usize,
        constraint: Option<TransferConstraint>,
    ) {
        let calc = self.calculator;
        let prev = &self.arrivals[label];
        let trip = self.network.get_trip(GlobalTripIndex { route_idx, trip_idx });
        let board_time = calc.trip_board_time(&trip, pos);
        let wait_time = calc.duration(prev.time, board_time);
        let c1 = prev.c1 + self.cost.boarding_cost(prev.rides == 0, wait_time, constraint.as_ref());

        route_bag.add(RouteBoarding {
            boarding: label,
            trip_idx,
            board_pos: pos,
            board_time,
            c1,
            relative_c1: c1 + self.cost.relative_transit_cost(calc.duration(0, board_time)),
            c2: prev.c2,
            constraint,
        });
    }

    /// Street transfers from the stops reached on board in this round.
    fn transfers_for_round(&mut self) {
        let network = self.network;
        let calc = self.calculator;
        let sources: Vec<ArrivalIndex> = self
            .round_arrivals
            .iter()
            .copied()
            .filter(|&idx| self.alive[idx] && self.arrivals[idx].arrived_on_board)
            .collect();

        for idx in sources {
            let prev = self.arrivals[idx];
            for tx in calc.transfers(network, prev.stop) {
                let target = calc.transfer_target(tx);
                let arrival = StopArrival {
                    stop: target,
                    time: calc.plus_duration(prev.time, tx.duration),
                    rides: prev.rides,
                    c1: prev.c1 + tx.c1,
                    c2: self.config.pass_through.update_c2(prev.c2, target),
                    arrived_on_board: false,
                    time_penalty: prev.time_penalty,
                    kind: ArrivalKind::Transfer { from_stop: prev.stop, duration: tx.duration, c1: tx.c1 },
                    parent: Some(idx),
                };
                self.add_arrival(arrival);
            }
        }
    }

    /// Checks the arrivals of this round against the egress legs and tells the round tracker if the
    /// destination was reached.
    fn round_complete(&mut self) {
        let calc = self.calculator;
        let mut reached = false;

        for i in 0..self.round_arrivals.len() {
            let idx = self.round_arrivals[i];
            if !self.alive[idx] {
                continue;
            }
            let arrival = self.arrivals[idx];
            // All pass-through points must be visited.
            if arrival.c2 != 0 {
                continue;
            }
            for egress in self.egress.egresses_at(arrival.stop) {
                // Walking twice in a row is not allowed.
                if !(egress.has_rides() || arrival.arrived_on_board) {
                    continue;
                }
                let Some(departure) =
                    calc.calculate_egress_departure_time(arrival.time, egress, self.slack.transfer_slack)
                else {
                    continue;
                };
                let destination_time = calc.plus_duration(departure, egress.search_duration());
                if self.exceeds_time_limit(destination_time, arrival.time_penalty + egress.time_penalty) {
                    continue;
                }

                if !self.profile.produces_paths() {
                    let rides = arrival.rides + egress.num_rides as usize;
                    reached |= self.best_times_destination.add((destination_time, rides));
                    continue;
                }
                match self.build_path(idx, egress) {
                    Ok(path) => reached |= self.destination.add(path),
                    Err(e) => debug!("Path to {} dropped: {e}", self.network.stop_name(egress.stop)),
                }
            }
        }
        self.round_tracker.round_complete(reached);
    }

    /// Follows the parent chain of a label back to its access leg and builds the path in forward order.
    fn build_path(&self, last: ArrivalIndex, search_egress: &AccessEgress) -> Result<RaptorPath, PathError> {
        let calc = self.calculator;

        let mut parts = Vec::new();
        let mut current = &self.arrivals[last];
        loop {
            match current.kind {
                ArrivalKind::Transit { trip, board_pos, alight_pos, constraint, .. } => {
                    let (board_pos, alight_pos) = calc.in_forward_order(board_pos, alight_pos);
                    parts.push(PathPart::Transit { trip, board_pos, alight_pos, constraint });
                }
                ArrivalKind::Transfer { from_stop, duration, c1 } => {
                    let (from_stop, to_stop) = calc.in_forward_order(from_stop, current.stop);
                    parts.push(PathPart::Transfer(Transfer { from_stop, to_stop, duration, c1 }));
                }
                ArrivalKind::Access { .. } => break,
            }
            match current.parent {
                Some(parent) => current = &self.arrivals[parent],
                None => break,
            }
        }
        let ArrivalKind::Access { access_idx, departure_time } = current.kind else {
            return Err(PathError::AccessNotAvailable(current.stop));
        };
        let builder = PathBuilder::new(self.network, self.slack, &self.cost);
        calc.map_path(&builder, parts, &self.access[access_idx], search_egress, departure_time, self.iteration_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::{ForwardCalculator, ReverseCalculator};
    use crate::config::CostParams;
    use crate::network::NetworkBuilder;
    use crate::path::PathLeg;
    use crate::utils::parse_time;

    fn t(time: &str) -> Timestamp {
        parse_time(time).unwrap()
    }

    fn network(constraint: Option<TransferConstraint>, l2_departure: &str) -> Network {
        let mut builder = NetworkBuilder::new();
        let r1 = builder.add_route("L1", &["A", "B", "C"]).unwrap();
        builder.add_trip_schedule(r1, "L1-1", "10:00 10:10 10:20").unwrap();
        builder.add_trip_schedule(r1, "L1-2", "10:30 10:40 10:50").unwrap();
        let r2 = builder.add_route("L2", &["C", "D"]).unwrap();
        builder.add_trip_schedule(r2, "L2-1", &format!("{l2_departure} 10:35")).unwrap();
        if let Some(constraint) = constraint {
            builder.add_constrained_transfer("L1-1", "C", "L2-1", "C", constraint);
        }
        builder.build().unwrap()
    }

    fn stop(network: &Network, name: &str) -> StopIndex {
        network.get_stop_idx(name).unwrap()
    }

    fn config(limit: Option<Timestamp>) -> WorkerConfig {
        WorkerConfig {
            max_number_of_transfers: 5,
            number_of_additional_transfers: 5,
            constrained_transfers: true,
            search_time_limit: limit,
            ..Default::default()
        }
    }

    fn forward(
        network: &Network,
        profile: RaptorProfile,
        egress_stop: &str,
        limit: Option<Timestamp>,
        times: &[Timestamp],
    ) -> WorkerResult {
        let slack = SlackProvider::default();
        let worker = RangeRaptorWorker::new(
            network,
            ForwardCalculator,
            profile,
            &slack,
            CostCalculator::new(CostParams::default()),
            vec![AccessEgress::walk(stop(network, "A"), 60)],
            vec![AccessEgress::walk(stop(network, egress_stop), 60)],
            config(limit),
        );
        worker.route(times)
    }

    #[test]
    fn single_ride() {
        let network = network(None, "10:25");
        let result = forward(&network, RaptorProfile::Standard, "C", None, &[t("09:58")]);
        assert_eq!(result.paths.len(), 1);
        let path = &result.paths[0];
        assert_eq!(path.start_time, t("09:59"));
        assert_eq!(path.end_time, t("10:21"));
        assert_eq!(path.number_of_transfers(), 0);
        assert_eq!(result.iterations, 1);
        assert!(!result.partial);
    }

    #[test]
    fn one_transfer() {
        let network = network(None, "10:25");
        let result = forward(&network, RaptorProfile::MultiCriteria, "D", None, &[t("09:58")]);
        assert_eq!(result.paths.len(), 1);
        let path = &result.paths[0];
        assert_eq!(path.end_time, t("10:36"));
        assert_eq!(path.number_of_transfers(), 1);
        assert_eq!(result.stop_arrivals.best_arrival_time(stop(&network, "D")), Some(t("10:35")));
        assert_eq!(result.stop_arrivals.best_number_of_transfers(stop(&network, "D")), Some(1));
    }

    #[test]
    fn range_iterations_find_later_departures() {
        let network = network(None, "10:25");
        let result = forward(&network, RaptorProfile::Standard, "C", None, &[t("10:28"), t("09:58")]);
        let times: Vec<_> = result.paths.iter().map(|p| (p.start_time, p.end_time)).collect();
        assert_eq!(times, vec![(t("09:59"), t("10:21")), (t("10:29"), t("10:51"))]);
        assert_eq!(result.iterations, 2);
    }

    #[test]
    fn arrival_limit_drops_late_paths() {
        let network = network(None, "10:25");
        let result = forward(&network, RaptorProfile::Standard, "C", Some(t("10:30")), &[t("10:28"), t("09:58")]);
        assert_eq!(result.paths.len(), 1);
        assert_eq!(result.paths[0].end_time, t("10:21"));
    }

    #[test]
    fn best_time_produces_no_paths() {
        let network = network(None, "10:25");
        let result = forward(&network, RaptorProfile::BestTime, "D", None, &[t("09:58")]);
        assert!(result.paths.is_empty());
        assert!(result.stop_arrivals.reached(stop(&network, "D")));
    }

    #[test]
    fn transfer_slack_is_respected() {
        // 10:20 + 2m transfer slack misses the 10:21 departure.
        let network = network(None, "10:21");
        let result = forward(&network, RaptorProfile::Standard, "D", None, &[t("09:58")]);
        assert!(result.paths.is_empty());
    }

    #[test]
    fn guaranteed_transfer_ignores_slack() {
        let network = network(Some(TransferConstraint::guaranteed()), "10:21");
        let result = forward(&network, RaptorProfile::Standard, "D", None, &[t("09:58")]);
        assert_eq!(result.paths.len(), 1);
        let path = &result.paths[0];
        assert_eq!(path.end_time, t("10:36"));
        let legs = path.transit_legs().collect::<Vec<_>>();
        assert_eq!(legs.len(), 2);
        assert_eq!(legs[0].constraint, None);
        assert_eq!(legs[1].constraint, Some(TransferConstraint::guaranteed()));
    }

    #[test]
    fn not_allowed_transfer_blocks_boarding() {
        let network = network(Some(TransferConstraint::not_allowed()), "10:25");
        let result = forward(&network, RaptorProfile::Standard, "D", None, &[t("09:58")]);
        assert!(result.paths.is_empty());
    }

    #[test]
    fn reverse_search_finds_the_same_path() {
        let network = network(None, "10:25");
        let slack = SlackProvider::default();
        let worker = RangeRaptorWorker::new(
            &network,
            ReverseCalculator,
            RaptorProfile::Standard,
            &slack,
            CostCalculator::default(),
            vec![AccessEgress::walk(stop(&network, "D"), 60)],
            vec![AccessEgress::walk(stop(&network, "A"), 60)],
            config(None),
        );
        let result = worker.route(&[t("10:40")]);
        assert_eq!(result.paths.len(), 1);
        let path = &result.paths[0];
        assert_eq!(path.start_time, t("09:59"));
        assert_eq!(path.end_time, t("10:36"));
        assert_eq!(path.number_of_transfers(), 1);
        assert!(matches!(path.legs.first(), Some(PathLeg::Access { access, .. }) if access.stop == stop(&network, "A")));
    }

    #[test]
    fn reverse_search_moves_constraint_to_the_boarded_trip() {
        let network = network(Some(TransferConstraint::guaranteed()), "10:21");
        let slack = SlackProvider::default();
        let worker = RangeRaptorWorker::new(
            &network,
            ReverseCalculator,
            RaptorProfile::Standard,
            &slack,
            CostCalculator::default(),
            vec![AccessEgress::walk(stop(&network, "D"), 60)],
            vec![AccessEgress::walk(stop(&network, "A"), 60)],
            config(None),
        );
        let result = worker.route(&[t("10:40")]);
        assert_eq!(result.paths.len(), 1);
        let legs = result.paths[0].transit_legs().collect::<Vec<_>>();
        assert_eq!(legs[0].constraint, None);
        assert_eq!(legs[1].constraint, Some(TransferConstraint::guaranteed()));
    }

    #[test]
    fn expired_deadline_returns_partial_result() {
        let network = network(None, "10:25");
        let slack = SlackProvider::default();
        let mut config = config(None);
        config.deadline = Some(Instant::now());
        let worker = RangeRaptorWorker::new(
            &network,
            ForwardCalculator,
            RaptorProfile::Standard,
            &slack,
            CostCalculator::default(),
            vec![AccessEgress::walk(stop(&network, "A"), 60)],
            vec![AccessEgress::walk(stop(&network, "C"), 60)],
            config,
        );
        let result = worker.route(&[t("09:58")]);
        assert!(result.partial);
        assert_eq!(result.iterations, 0);
    }
}
