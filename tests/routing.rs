use std::time::Duration;

use proptest::prelude::*;

use dev_utils::{build_grid_network, get_example_date, get_example_request, route_all, stop_name};
use raptor::utils::parse_time;
use raptor::{
    AccessEgress, Network, NetworkBuilder, PassThroughPoint, RaptorError, RaptorPath, RaptorProfile, RaptorRequest,
    RaptorService, SearchDirection, SlackProvider, TransferConstraint, TransferOptimizationConfig, TransferPriority,
};

fn t(time: &str) -> i32 {
    parse_time(time).unwrap()
}

fn assert_chronological(path: &RaptorPath) {
    let mut time = path.start_time;
    for leg in &path.legs {
        assert!(leg.departure_time() >= time, "leg departs before the previous one arrives: {path:?}");
        assert!(leg.arrival_time() >= leg.departure_time());
        time = leg.arrival_time();
    }
    assert_eq!(time, path.end_time);
}

#[test]
fn grid_search_finds_valid_paths() {
    let network = build_grid_network(6, 10 * 60, 3).unwrap();
    let from = network.get_stop_idx(&stop_name(0, 0)).unwrap();
    let to = network.get_stop_idx(&stop_name(5, 5)).unwrap();
    let response = RaptorService::new(&network).route(&get_example_request(from, to)).unwrap();

    assert!(!response.is_empty());
    assert!(response.stop_arrivals.reached(to));
    for path in &response.paths {
        assert_chronological(path);
        assert!(path.start_time >= t("08:30"));
        assert!(path.number_of_transfers() <= 12);
        let start = path.start_date_time(get_example_date()).unwrap();
        assert_eq!(start.date(), get_example_date());
    }
    let ends: Vec<_> = response.paths.iter().map(|p| p.end_time).collect();
    assert!(ends.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn reverse_search_arrives_in_time() {
    let network = build_grid_network(6, 10 * 60, 5).unwrap();
    let service = RaptorService::new(&network);
    let from = network.get_stop_idx(&stop_name(0, 0)).unwrap();
    let to = network.get_stop_idx(&stop_name(3, 5)).unwrap();
    let edt = t("08:30");

    let forward = RaptorRequest::new(vec![AccessEgress::walk(from, 60)], vec![AccessEgress::walk(to, 60)])
        .with_profile(RaptorProfile::Standard)
        .with_earliest_departure_time(edt)
        .with_search_window(0);
    let forward = service.route(&forward).unwrap();
    let earliest_arrival = forward.paths.iter().map(|p| p.end_time).min().unwrap();

    let reverse = RaptorRequest::new(vec![AccessEgress::walk(from, 60)], vec![AccessEgress::walk(to, 60)])
        .with_profile(RaptorProfile::Standard)
        .with_direction(SearchDirection::Reverse)
        .with_latest_arrival_time(earliest_arrival)
        .with_search_window(0);
    let reverse = service.route(&reverse).unwrap();

    assert!(!reverse.is_empty());
    for path in &reverse.paths {
        assert_chronological(path);
        assert!(path.end_time <= earliest_arrival);
    }
    let latest_start = reverse.paths.iter().map(|p| p.start_time).max().unwrap();
    assert!(latest_start >= edt);
}

#[test]
fn parallel_searches_share_the_network() {
    let network = build_grid_network(5, 15 * 60, 11).unwrap();
    let requests: Vec<_> = dev_utils::random_stop_pairs(&network, 16, 2)
        .into_iter()
        .map(|(from, to)| get_example_request(from, to))
        .collect();
    let service = RaptorService::new(&network);

    let parallel = route_all(&network, &requests);
    assert_eq!(parallel.len(), requests.len());
    for (request, response) in requests.iter().zip(parallel) {
        let sequential = service.route(request).unwrap();
        assert_eq!(response.unwrap().paths, sequential.paths);
    }
}

/// T1 runs A to F and T2 runs C to H, two minutes apart. They can only be connected by the walks
/// between neighbouring stops, each with its own transfer priority.
fn priority_network() -> Network {
    let mut builder = NetworkBuilder::new();
    let r1 = builder.add_route("R1", &["A", "B", "C", "D", "E", "F"]).unwrap();
    builder.add_trip_schedule(r1, "T1", "10:02 10:10 10:15 10:20 10:25 10:30").unwrap();
    let r2 = builder.add_route("R2", &["C", "D", "E", "F", "G", "H"]).unwrap();
    builder.add_trip_schedule(r2, "T2", "10:13 10:18 10:24 10:30 10:36 10:40").unwrap();
    let transfers = [
        ("B", "C", 1, TransferConstraint::with_priority(TransferPriority::Allowed)),
        ("C", "D", 2, TransferConstraint::with_priority(TransferPriority::Recommended)),
        ("D", "E", 3, TransferConstraint::with_priority(TransferPriority::Preferred)),
    ];
    for (from, to, minutes, constraint) in transfers {
        builder.add_transfer(from, to, minutes * 60, minutes * 60).unwrap();
        builder.add_constrained_transfer("T1", from, "T2", to, constraint);
    }
    builder.build().unwrap()
}

#[test]
fn transfer_optimization_moves_transfer_to_recommended_stops() {
    let network = priority_network();
    let stop = |name| network.get_stop_idx(name).unwrap();
    let request = RaptorRequest::new(vec![AccessEgress::walk(stop("A"), 60)], vec![AccessEgress::walk(stop("E"), 60)])
        .with_earliest_departure_time(t("10:01"))
        .with_slack(SlackProvider::new(0, 0, 0))
        .with_transfer_optimization(TransferOptimizationConfig::default());
    let response = RaptorService::new(&network).route(&request).unwrap();

    let with_transfer: Vec<_> = response.paths.iter().filter(|p| p.number_of_transfers() == 1).collect();
    assert!(!with_transfer.is_empty());
    for path in with_transfer {
        assert_chronological(path);
        let legs: Vec<_> = path.transit_legs().collect();
        assert_eq!(network.stop_name(legs[0].alight_stop), "C");
        assert_eq!(network.stop_name(legs[1].board_stop), "D");
        assert_eq!(legs[1].constraint.map(|c| c.priority), Some(TransferPriority::Recommended));
    }
    // Staying on T1 all the way is slower but has no transfer.
    assert!(response.paths.iter().any(|p| p.number_of_transfers() == 0));
}

#[test]
fn pass_through_point_forces_the_slower_route() {
    let mut builder = NetworkBuilder::new();
    let fast = builder.add_route("Fast", &["A", "B", "D"]).unwrap();
    builder.add_trip_schedule(fast, "F1", "10:00 10:05 10:10").unwrap();
    let slow = builder.add_route("Slow", &["A", "C", "D"]).unwrap();
    builder.add_trip_schedule(slow, "S1", "10:00 10:10 10:20").unwrap();
    let network = builder.build().unwrap();
    let stop = |name| network.get_stop_idx(name).unwrap();
    let service = RaptorService::new(&network);

    let request = RaptorRequest::new(vec![AccessEgress::walk(stop("A"), 60)], vec![AccessEgress::walk(stop("D"), 60)])
        .with_earliest_departure_time(t("09:59"))
        .with_search_window(60);
    let response = service.route(&request).unwrap();
    assert_eq!(response.paths.len(), 1);
    assert_eq!(response.paths[0].end_time, t("10:11"));

    let request = request.with_pass_through_points(vec![PassThroughPoint::new(vec![stop("C")])]);
    let response = service.route(&request).unwrap();
    assert_eq!(response.paths.len(), 1);
    assert_eq!(response.paths[0].end_time, t("10:21"));
    assert!(response.paths[0].visited_stops(&network).any(|s| s == stop("C")));
}

#[test]
fn access_time_penalty_does_not_extend_opening_hours() {
    let mut builder = NetworkBuilder::new();
    let route = builder.add_route("R1", &["A", "B"]).unwrap();
    builder.add_trip_schedule(route, "T1", "10:10 10:20").unwrap();
    let network = builder.build().unwrap();
    let stop = |name| network.get_stop_idx(name).unwrap();

    let access = AccessEgress::walk(stop("A"), 60).with_time_penalty(600).with_opening_hours(t("09:00"), t("09:55"));
    let request = RaptorRequest::new(vec![access], vec![AccessEgress::walk(stop("B"), 60)])
        .with_profile(RaptorProfile::Standard)
        .with_slack(SlackProvider::new(0, 0, 0))
        .with_earliest_departure_time(t("09:50"))
        .with_search_window(600);
    let response = RaptorService::new(&network).route(&request).unwrap();

    assert!(!response.is_empty());
    for path in &response.paths {
        assert_chronological(path);
        assert_eq!(path.start_time, t("09:55"));
        assert_eq!(path.legs[0].departure_time(), t("09:55"));
        assert_eq!(path.end_time, t("10:21"));
    }
}

#[test]
fn zero_timeout_returns_partial_response() {
    let network = build_grid_network(4, 10 * 60, 1).unwrap();
    let from = network.get_stop_idx(&stop_name(0, 0)).unwrap();
    let to = network.get_stop_idx(&stop_name(3, 3)).unwrap();
    let request = get_example_request(from, to).with_timeout(Duration::ZERO);
    let response = RaptorService::new(&network).route(&request).unwrap();
    assert!(response.partial);
    assert!(response.is_empty());
}

#[test]
fn invalid_request_is_rejected() {
    let network = build_grid_network(3, 10 * 60, 1).unwrap();
    let mut request = get_example_request(0, 1);
    request.search_params.iteration_step = 0;
    let err = RaptorService::new(&network).route(&request).unwrap_err();
    assert!(matches!(err, RaptorError::InvalidRequest(_)));
    assert!(err.to_string().contains("iteration step"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn random_searches_give_consistent_paths(seed in 0u64..1000, from in 0u32..25, to in 0u32..25) {
        prop_assume!(from != to);
        let network = build_grid_network(5, 10 * 60, seed).unwrap();
        let request = get_example_request(from, to).with_profile(RaptorProfile::MultiCriteria);
        let response = RaptorService::new(&network).route(&request).unwrap();

        for path in &response.paths {
            assert_chronological(path);
            prop_assert!(path.start_time >= t("08:30"));
            prop_assert_eq!(path.access().map(|a| a.stop), Some(from));
            prop_assert_eq!(path.egress().map(|e| e.stop), Some(to));
        }
        // No path is better than another on every criterion.
        for a in &response.paths {
            for b in &response.paths {
                if a == b {
                    continue;
                }
                let dominates = a.start_time >= b.start_time
                    && a.end_time <= b.end_time
                    && a.number_of_transfers() <= b.number_of_transfers()
                    && a.c1 <= b.c1;
                prop_assert!(!dominates, "{:?} dominates {:?}", a, b);
            }
        }
    }
}
