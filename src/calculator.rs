//! Direction-aware time and transit arithmetic.
//!
//! The round loop is written once for both search directions. Everything that depends on the direction
//! goes through a [`TransitCalculator`].

use std::fmt::Debug;

use crate::access_egress::AccessEgress;
use crate::config::SlackProvider;
use crate::network::{Network, RouteIndex, StopIndex, Timestamp, TripIndex, TripSchedule};
use crate::path::{PathAnchor, PathBuilder, PathError, PathPart, RaptorPath};
use crate::transfer::{ConstrainedTransfer, Transfer, TripStopPos};

/// Marks a time that is not set. Never leaves a module, public APIs use `Option<Timestamp>`.
pub const TIME_NOT_SET: Timestamp = -999_999_999;

pub const UNREACHED_FORWARD: Timestamp = Timestamp::MAX;
pub const UNREACHED_REVERSE: Timestamp = Timestamp::MIN;

pub(crate) fn time_or_none(time: Timestamp) -> Option<Timestamp> {
    (time != TIME_NOT_SET).then_some(time)
}

pub trait TransitCalculator: Copy + Debug + Send + Sync {
    fn plus_duration(&self, time: Timestamp, duration: i32) -> Timestamp;

    fn minus_duration(&self, time: Timestamp, duration: i32) -> Timestamp;

    /// Duration from `start` to `end` in search order. Positive when `end` comes after `start`.
    fn duration(&self, start: Timestamp, end: Timestamp) -> i32;

    /// True if `subject` is strictly better (earlier in search order) than `candidate`.
    fn is_before(&self, subject: Timestamp, candidate: Timestamp) -> bool;

    /// True if `subject` is strictly worse (later in search order) than `candidate`.
    fn is_after(&self, subject: Timestamp, candidate: Timestamp) -> bool;

    /// Worse than every real time.
    fn unreached_time(&self) -> Timestamp;

    fn board_slack(&self, slack: &SlackProvider, slack_index: usize) -> i32;

    fn alight_slack(&self, slack: &SlackProvider, slack_index: usize) -> i32;

    /// The time a passenger boards the trip at `pos`, seen from the search.
    fn trip_board_time(&self, trip: &TripSchedule, pos: usize) -> Timestamp;

    /// The time a passenger leaves the trip at `pos`, seen from the search.
    fn trip_alight_time(&self, trip: &TripSchedule, pos: usize) -> Timestamp;

    fn boarding_possible_at(&self, trip: &TripSchedule, pos: usize) -> bool;

    fn alighting_possible_at(&self, trip: &TripSchedule, pos: usize) -> bool;

    /// Time-shifts an access leg (or an egress leg in a reverse search) starting at `requested`.
    fn departure_time(&self, path: &AccessEgress, requested: Timestamp) -> Option<Timestamp>;

    /// Iterates the stop positions of a pattern in search order.
    fn stop_positions(&self, num_stops: usize) -> StopPositions;

    /// Iteration departure (or arrival) times, in the order they must be searched.
    fn range_raptor_minutes(&self, edt: Timestamp, lat: Timestamp, search_window: i32, step: i32) -> Vec<Timestamp>;

    /// Street transfers leaving `stop` in search order.
    fn transfers<'a>(&self, network: &'a Network, stop: StopIndex) -> &'a [Transfer];

    /// The stop a transfer reaches, in search order.
    fn transfer_target(&self, transfer: &Transfer) -> StopIndex;

    /// Constrained transfers starting at the given trip position, in search order.
    fn constrained_transfers<'a>(&self, network: &'a Network, source: TripStopPos) -> &'a [ConstrainedTransfer];

    /// The trip position a constrained transfer leads to, in search order.
    fn constrained_target(&self, transfer: &ConstrainedTransfer) -> TripStopPos;

    /// The best trip at `pos` that can be boarded no earlier (in search order) than `earliest`.
    /// Only trips better than `on_trip` are considered, and `blocked` trips are skipped.
    fn find_trip<F>(
        &self,
        network: &Network,
        route_idx: RouteIndex,
        pos: usize,
        earliest: Timestamp,
        on_trip: Option<TripIndex>,
        blocked: F,
    ) -> Option<TripIndex>
    where
        F: Fn(TripIndex) -> bool;

    /// True if boarding `candidate` is better than boarding `current` on the same route.
    fn is_better_trip(&self, candidate: TripIndex, current: TripIndex) -> bool;

    /// Reorders a pair given in search order into forward (chronological) order.
    fn in_forward_order<T>(&self, first: T, second: T) -> (T, T);

    /// Builds a path from the parts of a label chain, listed from the last label back to the access.
    /// `anchor_time` is when the search access leg starts, in search order.
    fn map_path(
        &self,
        builder: &PathBuilder,
        parts: Vec<PathPart>,
        search_access: &AccessEgress,
        search_egress: &AccessEgress,
        anchor_time: Timestamp,
        iteration_time: Timestamp,
    ) -> Result<RaptorPath, PathError>;

    fn stop_arrival_time(&self, trip: &TripSchedule, pos: usize, alight_slack: i32) -> Timestamp {
        self.plus_duration(self.trip_alight_time(trip, pos), alight_slack)
    }

    /// When an egress leg can start after arriving at its stop. Legs with rides need the transfer slack first.
    fn calculate_egress_departure_time(
        &self,
        arrival_time: Timestamp,
        egress: &AccessEgress,
        transfer_slack: i32,
    ) -> Option<Timestamp> {
        self.departure_time(egress, self.calculate_egress_departure_time_without_time_shift(arrival_time, egress, transfer_slack))
    }

    fn calculate_egress_departure_time_without_time_shift(
        &self,
        arrival_time: Timestamp,
        egress: &AccessEgress,
        transfer_slack: i32,
    ) -> Timestamp {
        if egress.has_rides() {
            self.plus_duration(arrival_time, transfer_slack)
        } else {
            arrival_time
        }
    }

    /// The better of two times.
    fn best(&self, a: Timestamp, b: Timestamp) -> Timestamp {
        if self.is_before(b, a) { b } else { a }
    }

    /// The worse of two times.
    fn worst(&self, a: Timestamp, b: Timestamp) -> Timestamp {
        if self.is_after(b, a) { b } else { a }
    }
}

/// Stop positions of a pattern in search order.
#[derive(Clone, Debug)]
pub struct StopPositions {
    next: isize,
    end: isize,
    step: isize,
}

impl Iterator for StopPositions {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next == self.end {
            return None;
        }
        let pos = self.next as usize;
        self.next += self.step;
        Some(pos)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ForwardCalculator;

impl TransitCalculator for ForwardCalculator {
    fn plus_duration(&self, time: Timestamp, duration: i32) -> Timestamp { time + duration }

    fn minus_duration(&self, time: Timestamp, duration: i32) -> Timestamp { time - duration }

    fn duration(&self, start: Timestamp, end: Timestamp) -> i32 { end - start }

    fn is_before(&self, subject: Timestamp, candidate: Timestamp) -> bool { subject < candidate }

    fn is_after(&self, subject: Timestamp, candidate: Timestamp) -> bool { subject > candidate }

    fn unreached_time(&self) -> Timestamp { UNREACHED_FORWARD }

    fn board_slack(&self, slack: &SlackProvider, slack_index: usize) -> i32 { slack.board_slack(slack_index) }

    fn alight_slack(&self, slack: &SlackProvider, slack_index: usize) -> i32 { slack.alight_slack(slack_index) }

    fn trip_board_time(&self, trip: &TripSchedule, pos: usize) -> Timestamp { trip.departure(pos) }

    fn trip_alight_time(&self, trip: &TripSchedule, pos: usize) -> Timestamp { trip.arrival(pos) }

    fn boarding_possible_at(&self, trip: &TripSchedule, pos: usize) -> bool { trip.boarding_possible_at(pos) }

    fn alighting_possible_at(&self, trip: &TripSchedule, pos: usize) -> bool { trip.alighting_possible_at(pos) }

    fn departure_time(&self, path: &AccessEgress, requested: Timestamp) -> Option<Timestamp> {
        path.earliest_departure_time(requested)
    }

    fn stop_positions(&self, num_stops: usize) -> StopPositions {
        StopPositions { next: 0, end: num_stops as isize, step: 1 }
    }

    fn range_raptor_minutes(&self, edt: Timestamp, _lat: Timestamp, search_window: i32, step: i32) -> Vec<Timestamp> {
        let last = edt + search_window - step;
        if search_window <= 0 || last < edt {
            return vec![edt];
        }
        (0..)
            .map(|i| last - i * step)
            .take_while(|&t| t >= edt)
            .collect()
    }

    fn transfers<'a>(&self, network: &'a Network, stop: StopIndex) -> &'a [Transfer] { network.transfers_from(stop) }

    fn transfer_target(&self, transfer: &Transfer) -> StopIndex { transfer.to_stop }

    fn constrained_transfers<'a>(&self, network: &'a Network, source: TripStopPos) -> &'a [ConstrainedTransfer] {
        network.constrained_transfers_from(source)
    }

    fn constrained_target(&self, transfer: &ConstrainedTransfer) -> TripStopPos { transfer.to }

    fn find_trip<F>(
        &self,
        network: &Network,
        route_idx: RouteIndex,
        pos: usize,
        earliest: Timestamp,
        on_trip: Option<TripIndex>,
        blocked: F,
    ) -> Option<TripIndex>
    where
        F: Fn(TripIndex) -> bool,
    {
        let route = &network.routes[route_idx as usize];
        let limit = on_trip.map_or(route.num_trips, |t| t as usize);
        let departure = |trip: usize| route.get_trip(trip, &network.stop_times)[pos].departure_time;

        // Trips do not overtake each other, so departures at a position are sorted.
        let mut lo = 0;
        let mut hi = limit;
        while lo < hi {
            let mid = (lo + hi) / 2;
            if departure(mid) < earliest { lo = mid + 1 } else { hi = mid }
        }
        (lo..limit)
            .map(|t| t as TripIndex)
            .find(|&t| !blocked(t))
    }

    fn is_better_trip(&self, candidate: TripIndex, current: TripIndex) -> bool { candidate < current }

    fn in_forward_order<T>(&self, first: T, second: T) -> (T, T) { (first, second) }

    fn map_path(
        &self,
        builder: &PathBuilder,
        mut parts: Vec<PathPart>,
        search_access: &AccessEgress,
        search_egress: &AccessEgress,
        anchor_time: Timestamp,
        iteration_time: Timestamp,
    ) -> Result<RaptorPath, PathError> {
        parts.reverse();
        builder.build(search_access, &parts, search_egress, PathAnchor::Departure(anchor_time), iteration_time)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ReverseCalculator;

impl TransitCalculator for ReverseCalculator {
    fn plus_duration(&self, time: Timestamp, duration: i32) -> Timestamp { time - duration }

    fn minus_duration(&self, time: Timestamp, duration: i32) -> Timestamp { time + duration }

    fn duration(&self, start: Timestamp, end: Timestamp) -> i32 { start - end }

    fn is_before(&self, subject: Timestamp, candidate: Timestamp) -> bool { subject > candidate }

    fn is_after(&self, subject: Timestamp, candidate: Timestamp) -> bool { subject < candidate }

    fn unreached_time(&self) -> Timestamp { UNREACHED_REVERSE }

    fn board_slack(&self, slack: &SlackProvider, slack_index: usize) -> i32 { slack.alight_slack(slack_index) }

    fn alight_slack(&self, slack: &SlackProvider, slack_index: usize) -> i32 { slack.board_slack(slack_index) }

    fn trip_board_time(&self, trip: &TripSchedule, pos: usize) -> Timestamp { trip.arrival(pos) }

    fn trip_alight_time(&self, trip: &TripSchedule, pos: usize) -> Timestamp { trip.departure(pos) }

    fn boarding_possible_at(&self, trip: &TripSchedule, pos: usize) -> bool { trip.alighting_possible_at(pos) }

    fn alighting_possible_at(&self, trip: &TripSchedule, pos: usize) -> bool { trip.boarding_possible_at(pos) }

    fn departure_time(&self, path: &AccessEgress, requested: Timestamp) -> Option<Timestamp> {
        path.latest_arrival_time(requested)
    }

    fn stop_positions(&self, num_stops: usize) -> StopPositions {
        StopPositions { next: num_stops as isize - 1, end: -1, step: -1 }
    }

    fn range_raptor_minutes(&self, _edt: Timestamp, lat: Timestamp, search_window: i32, step: i32) -> Vec<Timestamp> {
        let first = lat - search_window + step;
        if search_window <= 0 || first > lat {
            return vec![lat];
        }
        (0..)
            .map(|i| first + i * step)
            .take_while(|&t| t <= lat)
            .collect()
    }

    fn transfers<'a>(&self, network: &'a Network, stop: StopIndex) -> &'a [Transfer] { network.transfers_to(stop) }

    fn transfer_target(&self, transfer: &Transfer) -> StopIndex { transfer.from_stop }

    fn constrained_transfers<'a>(&self, network: &'a Network, source: TripStopPos) -> &'a [ConstrainedTransfer] {
        network.constrained_transfers_to(source)
    }

    fn constrained_target(&self, transfer: &ConstrainedTransfer) -> TripStopPos { transfer.from }

    fn find_trip<F>(
        &self,
        network: &Network,
        route_idx: RouteIndex,
        pos: usize,
        latest: Timestamp,
        on_trip: Option<TripIndex>,
        blocked: F,
    ) -> Option<TripIndex>
    where
        F: Fn(TripIndex) -> bool,
    {
        let route = &network.routes[route_idx as usize];
        let lower = on_trip.map_or(0, |t| t as usize + 1);
        let arrival = |trip: usize| route.get_trip(trip, &network.stop_times)[pos].arrival_time;

        // First trip arriving after `latest`.
        let mut lo = lower;
        let mut hi = route.num_trips;
        while lo < hi {
            let mid = (lo + hi) / 2;
            if arrival(mid) <= latest { lo = mid + 1 } else { hi = mid }
        }
        (lower..lo)
            .rev()
            .map(|t| t as TripIndex)
            .find(|&t| !blocked(t))
    }

    fn is_better_trip(&self, candidate: TripIndex, current: TripIndex) -> bool { candidate > current }

    fn in_forward_order<T>(&self, first: T, second: T) -> (T, T) { (second, first) }

    fn map_path(
        &self,
        builder: &PathBuilder,
        mut parts: Vec<PathPart>,
        search_access: &AccessEgress,
        search_egress: &AccessEgress,
        anchor_time: Timestamp,
        iteration_time: Timestamp,
    ) -> Result<RaptorPath, PathError> {
        // The chain is already in forward order. A reverse search records a constraint on the trip that
        // precedes the transfer, move it to the trip boarded after the transfer.
        let mut carried = None;
        for part in parts.iter_mut() {
            if let PathPart::Transit { constraint, .. } = part {
                let own = constraint.take();
                *constraint = carried;
                carried = own;
            }
        }
        builder.build(search_egress, &parts, search_access, PathAnchor::Arrival(anchor_time), iteration_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::CostCalculator;
    use crate::network::NetworkBuilder;
    use crate::transfer::{TransferConstraint, TransferPriority};
    use crate::utils::parse_time;

    fn network() -> Network {
        let mut builder = NetworkBuilder::new();
        let r = builder.add_route_with_restrictions("L1", &["A", "B", "C"], "B * A").unwrap();
        builder.add_trip_schedule(r, "t1", "10:00 10:10 10:20").unwrap();
        builder.add_trip_schedule(r, "t2", "10:10 10:20 10:30").unwrap();
        builder.add_trip_schedule(r, "t3", "10:20 10:30 10:40").unwrap();
        builder.add_transfer("B", "C", 120, 120).unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn time_arithmetic() {
        let f = ForwardCalculator;
        let r = ReverseCalculator;
        assert_eq!(f.plus_duration(100, 10), 110);
        assert_eq!(r.plus_duration(100, 10), 90);
        assert_eq!(f.minus_duration(100, 10), 90);
        assert_eq!(r.minus_duration(100, 10), 110);
        assert_eq!(f.duration(100, 160), 60);
        assert_eq!(r.duration(160, 100), 60);
    }

    #[test]
    fn comparisons_are_strict() {
        for (calc_is_before, calc_is_after) in [
            (ForwardCalculator.is_before(5, 5), ForwardCalculator.is_after(5, 5)),
            (ReverseCalculator.is_before(5, 5), ReverseCalculator.is_after(5, 5)),
        ] {
            assert!(!calc_is_before);
            assert!(!calc_is_after);
        }
        assert!(ForwardCalculator.is_before(4, 5));
        assert!(ReverseCalculator.is_before(6, 5));
        assert!(ForwardCalculator.is_before(1_000_000, ForwardCalculator.unreached_time()));
        assert!(ReverseCalculator.is_before(-1_000_000, ReverseCalculator.unreached_time()));
    }

    #[test]
    fn slack_and_permissions_are_mirrored() {
        let network = network();
        let slack = SlackProvider::new(60, 30, 10);
        let trip = network.find_trip("t1").unwrap();

        assert_eq!(ForwardCalculator.board_slack(&slack, 0), 30);
        assert_eq!(ReverseCalculator.board_slack(&slack, 0), 10);
        assert_eq!(ForwardCalculator.stop_arrival_time(&trip, 1, 10), 10 * 3600 + 600 + 10);
        assert_eq!(ReverseCalculator.stop_arrival_time(&trip, 1, 30), 10 * 3600 + 600 - 30);

        assert!(ForwardCalculator.boarding_possible_at(&trip, 0));
        assert!(!ForwardCalculator.boarding_possible_at(&trip, 2));
        assert!(ReverseCalculator.boarding_possible_at(&trip, 2));
        assert!(!ReverseCalculator.alighting_possible_at(&trip, 2));
    }

    #[test]
    fn stop_positions() {
        assert_eq!(ForwardCalculator.stop_positions(3).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(ReverseCalculator.stop_positions(3).collect::<Vec<_>>(), vec![2, 1, 0]);
        assert_eq!(ReverseCalculator.stop_positions(0).count(), 0);
    }

    #[test]
    fn iteration_minutes() {
        assert_eq!(ForwardCalculator.range_raptor_minutes(600, 0, 180, 60), vec![720, 660, 600]);
        assert_eq!(ReverseCalculator.range_raptor_minutes(0, 600, 180, 60), vec![480, 540, 600]);
        assert_eq!(ForwardCalculator.range_raptor_minutes(600, 0, 0, 60), vec![600]);
        assert_eq!(ReverseCalculator.range_raptor_minutes(0, 600, 0, 60), vec![600]);
    }

    #[test]
    fn forward_trip_search() {
        let network = network();
        let f = ForwardCalculator;
        assert_eq!(f.find_trip(&network, 0, 1, 10 * 3600 + 600, None, |_| false), Some(0));
        assert_eq!(f.find_trip(&network, 0, 1, 10 * 3600 + 601, None, |_| false), Some(1));
        assert_eq!(f.find_trip(&network, 0, 1, 10 * 3600 + 601, None, |t| t == 1), Some(2));
        assert_eq!(f.find_trip(&network, 0, 1, 10 * 3600 + 601, Some(1), |_| false), None);
        assert_eq!(f.find_trip(&network, 0, 1, 11 * 3600, None, |_| false), None);
    }

    #[test]
    fn reverse_trip_search() {
        let network = network();
        let r = ReverseCalculator;
        assert_eq!(r.find_trip(&network, 0, 1, 10 * 3600 + 1800, None, |_| false), Some(2));
        assert_eq!(r.find_trip(&network, 0, 1, 10 * 3600 + 1799, None, |_| false), Some(1));
        assert_eq!(r.find_trip(&network, 0, 1, 10 * 3600 + 1799, None, |t| t == 1), Some(0));
        assert_eq!(r.find_trip(&network, 0, 1, 10 * 3600 + 1799, Some(1), |_| false), None);
        assert_eq!(r.find_trip(&network, 0, 1, 9 * 3600, None, |_| false), None);
    }

    #[test]
    fn transfers_follow_direction() {
        let network = network();
        let b = network.get_stop_idx("B").unwrap();
        let c = network.get_stop_idx("C").unwrap();
        let tx = ForwardCalculator.transfers(&network, b)[0];
        assert_eq!(ForwardCalculator.transfer_target(&tx), c);
        let tx = ReverseCalculator.transfers(&network, c)[0];
        assert_eq!(ReverseCalculator.transfer_target(&tx), b);
        assert!(ReverseCalculator.transfers(&network, b).is_empty());
    }

    #[test]
    fn egress_departure_adds_slack_only_with_rides() {
        let walk = AccessEgress::walk(0, 60);
        let flex = AccessEgress::flex(0, 60, 1);
        let f = ForwardCalculator;
        assert_eq!(f.calculate_egress_departure_time(1000, &walk, 120), Some(1000));
        assert_eq!(f.calculate_egress_departure_time(1000, &flex, 120), Some(1120));
        assert_eq!(ReverseCalculator.calculate_egress_departure_time(1000, &flex, 120), Some(880));

        let closed = AccessEgress::flex(0, 60, 1).with_opening_hours(0, 1100);
        assert_eq!(f.calculate_egress_departure_time(1000, &closed, 120), None);
        assert_eq!(f.calculate_egress_departure_time_without_time_shift(1000, &closed, 120), 1120);
    }

    #[test]
    fn both_directions_map_to_the_same_path() {
        let mut builder = NetworkBuilder::new();
        let r1 = builder.add_route("L1", &["A", "B", "C"]).unwrap();
        builder.add_trip_schedule(r1, "L1-1", "10:02 10:10 10:15").unwrap();
        let r2 = builder.add_route("L2", &["D", "E"]).unwrap();
        builder.add_trip_schedule(r2, "L2-1", "10:20 10:40").unwrap();
        builder.add_transfer("C", "D", 120, 240).unwrap();
        let network = builder.build().unwrap();
        let stop = |name| network.get_stop_idx(name).unwrap();
        let l1 = network.find_trip("L1-1").unwrap().index;
        let l2 = network.find_trip("L2-1").unwrap().index;
        let transfer = PathPart::Transfer(Transfer { from_stop: stop("C"), to_stop: stop("D"), duration: 120, c1: 240 });
        let recommended = Some(TransferConstraint::with_priority(TransferPriority::Recommended));

        let slack = SlackProvider::new(60, 0, 0);
        let cost = CostCalculator::default();
        let path_builder = PathBuilder::new(&network, &slack, &cost);
        let origin = AccessEgress::walk(stop("A"), 60);
        let destination = AccessEgress::walk(stop("E"), 60);

        // Forward chains end at the last ride and hold the constraint on the trip boarded after the transfer.
        let forward_parts = vec![
            PathPart::Transit { trip: l2, board_pos: 0, alight_pos: 1, constraint: recommended },
            transfer,
            PathPart::Transit { trip: l1, board_pos: 0, alight_pos: 2, constraint: None },
        ];
        let forward = ForwardCalculator
            .map_path(&path_builder, forward_parts, &origin, &destination, parse_time("9:00").unwrap(), 0)
            .unwrap();

        // Reverse chains are already in forward order and hold the constraint on the trip alighted before it.
        let reverse_parts = vec![
            PathPart::Transit { trip: l1, board_pos: 0, alight_pos: 2, constraint: recommended },
            transfer,
            PathPart::Transit { trip: l2, board_pos: 0, alight_pos: 1, constraint: None },
        ];
        let reverse = ReverseCalculator
            .map_path(&path_builder, reverse_parts, &destination, &origin, parse_time("11:00").unwrap(), 0)
            .unwrap();

        for path in [&forward, &reverse] {
            assert_eq!(path.access().map(|a| a.stop), Some(stop("A")));
            assert_eq!(path.egress().map(|e| e.stop), Some(stop("E")));
            let legs: Vec<_> = path.transit_legs().collect();
            assert_eq!(legs.len(), 2);
            assert_eq!((legs[0].trip, legs[0].constraint), (l1, None));
            assert_eq!((legs[1].trip, legs[1].constraint), (l2, recommended));
        }
        assert_eq!(forward.transit_legs().collect::<Vec<_>>(), reverse.transit_legs().collect::<Vec<_>>());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn reverse_chain_reproduces_forward_duration(
                start in 0i32..100_000,
                durations in prop::collection::vec(0i32..3_600, 0..20),
            ) {
                let f = ForwardCalculator;
                let r = ReverseCalculator;
                let end = durations.iter().fold(start, |t, &d| f.plus_duration(t, d));
                let back = durations.iter().rev().fold(end, |t, &d| r.plus_duration(t, d));
                prop_assert_eq!(back, start);
                prop_assert_eq!(f.duration(start, end), r.duration(end, back));
                let undone = durations.iter().fold(end, |t, &d| f.minus_duration(t, d));
                prop_assert_eq!(undone, start);
            }

            #[test]
            fn comparisons_mirror(a in -100_000i32..100_000, b in -100_000i32..100_000) {
                prop_assert_eq!(ForwardCalculator.is_before(a, b), ReverseCalculator.is_after(a, b));
                prop_assert_eq!(ForwardCalculator.is_after(a, b), ReverseCalculator.is_before(a, b));
                prop_assert!(!(ForwardCalculator.is_before(a, b) && ForwardCalculator.is_after(a, b)));
            }
        }
    }
}
