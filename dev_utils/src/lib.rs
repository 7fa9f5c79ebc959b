use chrono::NaiveDate;
use rayon::prelude::*;
use raptor::network::{StopIndex, Timestamp};
use raptor::{
    utils, AccessEgress, Network, NetworkBuilder, NetworkError, RaptorError, RaptorProfile, RaptorRequest,
    RaptorResponse, RaptorService, TransferConstraint,
};

// Common example data for the tests and benchmarks.

pub fn get_example_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 10).unwrap_or_default()
}

pub fn get_example_start_time() -> Timestamp {
    8 * 3600 + 30 * 60
}

pub fn get_example_walk_time() -> i32 {
    3 * 60 // 3 minutes between neighbouring stops.
}

pub fn stop_name(row: usize, col: usize) -> String {
    format!("S{row}_{col}")
}

/// A `size` x `size` grid of stops with a bus line along every row and column, in both directions.
/// Travel times between stops are random (seeded), trips run every `headway` seconds from 06:00 to 11:00,
/// and every stop has a walking transfer to its neighbours on the diagonal.
pub fn build_grid_network(size: usize, headway: i32, seed: u64) -> Result<Network, NetworkError> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut builder = NetworkBuilder::new();

    let mut lines: Vec<(String, Vec<String>)> = Vec::new();
    for i in 0..size {
        let row: Vec<String> = (0..size).map(|c| stop_name(i, c)).collect();
        let col: Vec<String> = (0..size).map(|r| stop_name(r, i)).collect();
        for (name, stops) in [(format!("H{i}"), row), (format!("V{i}"), col)] {
            let mut back = stops.clone();
            back.reverse();
            lines.push((format!("{name}+"), stops));
            lines.push((format!("{name}-"), back));
        }
    }

    for (name, stops) in &lines {
        let stop_refs: Vec<&str> = stops.iter().map(String::as_str).collect();
        let route = builder.add_route(name, &stop_refs)?;
        let hops: Vec<i32> = (1..stops.len()).map(|_| rng.i32(2..=5) * 60).collect();
        let offset = rng.i32(0..(headway / 60).max(1)) * 60;

        let mut start = 6 * 3600 + offset;
        let mut n = 0;
        while start < 11 * 3600 {
            let mut time = start;
            let mut schedule = vec![utils::get_time_str(time)];
            for hop in &hops {
                time += hop;
                schedule.push(utils::get_time_str(time));
            }
            builder.add_trip_schedule(route, &format!("{name}-{n}"), &schedule.join(" "))?;
            start += headway;
            n += 1;
        }
    }

    let walk = get_example_walk_time();
    for r in 0..size.saturating_sub(1) {
        for c in 0..size.saturating_sub(1) {
            let a = stop_name(r, c);
            let b = stop_name(r + 1, c + 1);
            builder.add_transfer(&a, &b, walk, walk)?;
            builder.add_transfer(&b, &a, walk, walk)?;
        }
    }

    // The first trips of crossing lines wait for each other in the corner.
    if size > 1 {
        let corner = stop_name(0, size - 1);
        let down = format!("V{}+-0", size - 1);
        builder.add_constrained_transfer("H0+-0", &corner, &down, &corner, TransferConstraint::guaranteed());
    }

    builder.build()
}

pub fn get_example_network() -> Network {
    build_grid_network(12, 10 * 60, 7).expect("example network is valid")
}

/// Walking access and egress between two stops, leaving at the example start time.
pub fn get_example_request(from: StopIndex, to: StopIndex) -> RaptorRequest {
    RaptorRequest::new(vec![AccessEgress::walk(from, 60)], vec![AccessEgress::walk(to, 60)])
        .with_earliest_departure_time(get_example_start_time())
        .with_profile(RaptorProfile::Standard)
        .with_search_window(60 * 60)
}

/// From one corner of the grid to the opposite one.
pub fn get_example_scenario() -> (Network, StopIndex, Timestamp, StopIndex) {
    let network = get_example_network();
    let last = (network.num_stops() as f64).sqrt() as usize - 1;
    let start = network.get_stop_idx(&stop_name(0, 0)).expect("corner stop exists");
    let end = network.get_stop_idx(&stop_name(last, last)).expect("corner stop exists");
    (network, start, get_example_start_time(), end)
}

/// Random stop pairs for running many searches.
pub fn random_stop_pairs(network: &Network, count: usize, seed: u64) -> Vec<(StopIndex, StopIndex)> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let num_stops = network.num_stops() as StopIndex;
    (0..count)
        .map(|_| loop {
            let (from, to) = (rng.u32(0..num_stops), rng.u32(0..num_stops));
            if from != to {
                break (from, to);
            }
        })
        .collect()
}

/// Runs the requests in parallel against one shared network.
pub fn route_all(network: &Network, requests: &[RaptorRequest]) -> Vec<Result<RaptorResponse, RaptorError>> {
    let service = RaptorService::new(network);
    requests.par_iter().map(|request| service.route(request)).collect()
}
