use std::time::Instant;

use log::{debug, info};
use thiserror::Error;

use crate::access_egress::AccessEgress;
use crate::calculator::{ForwardCalculator, ReverseCalculator, TransitCalculator};
use crate::config::SearchWindowConfig;
use crate::cost::CostCalculator;
use crate::network::{Network, NetworkError};
use crate::path::PathError;
use crate::raptor::{RangeRaptorWorker, WorkerConfig, WorkerResult};
use crate::request::{PassThroughPoints, RaptorProfile, RaptorRequest, RaptorResponse, SearchDirection};
use crate::search_window::{RaptorSearchWindowCalculator, SearchWindowError};
use crate::transfer_optimization::{OptimizeTransferService, TransferGeneratorError};
use crate::trip_times_search::TripTimesSearchError;
use crate::utils;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RaptorError {
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    TripTimesSearch(#[from] TripTimesSearchError),
    #[error(transparent)]
    SearchWindow(#[from] SearchWindowError),
    #[error(transparent)]
    TransferGenerator(#[from] TransferGeneratorError),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Runs Raptor requests against a shared network. The service holds no per-request state, so one
/// service can be used from many threads at once.
#[derive(Clone)]
pub struct RaptorService<'a> {
    network: &'a Network,
    search_window_config: SearchWindowConfig,
}

impl<'a> RaptorService<'a> {
    pub fn new(network: &'a Network) -> Self {
        Self { network, search_window_config: SearchWindowConfig::default() }
    }

    pub fn with_search_window_config(mut self, config: SearchWindowConfig) -> Self {
        self.search_window_config = config;
        self
    }

    pub fn route(&self, request: &RaptorRequest) -> Result<RaptorResponse, RaptorError> {
        validate(request)?;
        let params = &request.search_params;

        if params.access_paths.is_empty() || params.egress_paths.is_empty() {
            debug!("No access or egress paths, nothing to search");
            return Ok(RaptorResponse::default());
        }
        let deadline = params.timeout.map(|timeout| Instant::now() + timeout);

        let Some((min_transit_time, min_wait_time)) = self.heuristics(request) else {
            debug!("Heuristic search found no path");
            return Ok(RaptorResponse {
                earliest_departure_time: params.earliest_departure_time,
                latest_arrival_time: params.latest_arrival_time,
                ..Default::default()
            });
        };

        let window = RaptorSearchWindowCalculator::new(self.search_window_config.clone())
            .with_heuristics(min_transit_time, min_wait_time)
            .with_search_params(params)
            .calculate()?;
        let (Some(edt), Some(lat), Some(search_window)) =
            (window.earliest_departure_time(), window.latest_arrival_time(), window.search_window())
        else {
            return Err(RaptorError::InvalidRequest("search window could not be resolved".to_string()));
        };

        let cost = CostCalculator::new(request.cost.clone());
        let pass_through = PassThroughPoints::new(params.pass_through_points.clone());
        let config = WorkerConfig {
            max_number_of_transfers: params.max_number_of_transfers,
            number_of_additional_transfers: params.number_of_additional_transfers,
            pass_through: pass_through.clone(),
            constrained_transfers: params.constrained_transfers,
            // Only a time given by the caller is a hard limit, calculated ones are not.
            search_time_limit: match request.direction {
                SearchDirection::Forward => params.latest_arrival_time,
                SearchDirection::Reverse => params.earliest_departure_time,
            },
            deadline,
        };

        let result = match request.direction {
            SearchDirection::Forward => self.run(
                ForwardCalculator,
                request,
                &cost,
                (edt, lat, search_window),
                &params.access_paths,
                &params.egress_paths,
                config,
            ),
            SearchDirection::Reverse => self.run(
                ReverseCalculator,
                request,
                &cost,
                (edt, lat, search_window),
                &params.egress_paths,
                &params.access_paths,
                config,
            ),
        };

        let mut paths = result.paths;
        if let Some(optimization) = &request.optimize_transfers {
            if request.profile.produces_paths() {
                paths = OptimizeTransferService::new(self.network, &request.slack, &cost, optimization.clone(), pass_through)
                    .optimize(paths);
            }
        }

        info!(
            "Found {} paths between {} and {} in {} iterations{}",
            paths.len(),
            utils::get_time_str(edt),
            utils::get_time_str(lat),
            result.iterations,
            if result.partial { " (timed out)" } else { "" },
        );

        Ok(RaptorResponse {
            paths,
            stop_arrivals: result.stop_arrivals,
            partial: result.partial,
            earliest_departure_time: Some(edt),
            latest_arrival_time: Some(lat),
            search_window: Some(search_window),
            iterations: result.iterations,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn run<T: TransitCalculator>(
        &self,
        calculator: T,
        request: &RaptorRequest,
        cost: &CostCalculator,
        (edt, lat, search_window): (i32, i32, i32),
        access: &[AccessEgress],
        egress: &[AccessEgress],
        config: WorkerConfig,
    ) -> WorkerResult {
        let iteration_times =
            calculator.range_raptor_minutes(edt, lat, search_window, request.search_params.iteration_step);
        debug!("Range-Raptor over {} iterations", iteration_times.len());
        RangeRaptorWorker::new(
            self.network,
            calculator,
            request.profile,
            &request.slack,
            cost.clone(),
            access.to_vec(),
            egress.to_vec(),
            config,
        )
        .route(&iteration_times)
    }

    /// A single-iteration standard search from the pinned end of the request. Returns the shortest
    /// travel time and the shortest wait before departure, or `None` if nothing is reachable.
    fn heuristics(&self, request: &RaptorRequest) -> Option<(i32, i32)> {
        let params = &request.search_params;
        let config = WorkerConfig {
            max_number_of_transfers: params.max_number_of_transfers,
            number_of_additional_transfers: params.number_of_additional_transfers,
            pass_through: PassThroughPoints::default(),
            constrained_transfers: params.constrained_transfers,
            search_time_limit: None,
            deadline: None,
        };
        let cost = CostCalculator::new(request.cost.clone());

        let (result, forward) = match (params.earliest_departure_time, params.latest_arrival_time) {
            (Some(edt), _) => {
                let worker = RangeRaptorWorker::new(
                    self.network,
                    ForwardCalculator,
                    RaptorProfile::Standard,
                    &request.slack,
                    cost,
                    params.access_paths.clone(),
                    params.egress_paths.clone(),
                    config,
                );
                (worker.route(&[edt]), true)
            }
            (None, Some(lat)) => {
                let worker = RangeRaptorWorker::new(
                    self.network,
                    ReverseCalculator,
                    RaptorProfile::Standard,
                    &request.slack,
                    cost,
                    params.egress_paths.clone(),
                    params.access_paths.clone(),
                    config,
                );
                (worker.route(&[lat]), false)
            }
            (None, None) => return None,
        };

        let min_transit_time = result.paths.iter().map(|p| p.duration()).min()?;
        let min_wait_time = result
            .paths
            .iter()
            .map(|p| if forward { p.start_time - p.iteration_time } else { p.iteration_time - p.end_time })
            .min()
            .unwrap_or(0)
            .max(0);
        debug!(
            "Heuristics: min transit time {}, min wait time {}",
            utils::get_duration_str(min_transit_time),
            utils::get_duration_str(min_wait_time),
        );
        Some((min_transit_time, min_wait_time))
    }
}

fn validate(request: &RaptorRequest) -> Result<(), RaptorError> {
    let params = &request.search_params;
    let invalid = |msg: &str| Err(RaptorError::InvalidRequest(msg.to_string()));

    if params.earliest_departure_time.is_none() && params.latest_arrival_time.is_none() {
        return invalid("earliest departure time or latest arrival time is required");
    }
    if request.direction == SearchDirection::Reverse && request.profile.is_multi_criteria() {
        return invalid("multi-criteria search is only supported in forward direction");
    }
    if !params.pass_through_points.is_empty() && !request.profile.is_multi_criteria() {
        return invalid("pass-through points require the multi-criteria profile");
    }
    if params.iteration_step <= 0 {
        return invalid("iteration step must be positive");
    }
    if params.search_window.is_some_and(|sw| sw < 0) {
        return invalid("search window can not be negative");
    }
    if let (Some(edt), Some(lat)) = (params.earliest_departure_time, params.latest_arrival_time) {
        if lat < edt {
            return invalid("latest arrival time is before earliest departure time");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_egress::AccessEgress;
    use crate::network::NetworkBuilder;
    use crate::utils::parse_time;

    fn t(time: &str) -> i32 {
        parse_time(time).unwrap()
    }

    fn network() -> Network {
        let mut builder = NetworkBuilder::new();
        let r1 = builder.add_route("L1", &["A", "B", "C"]).unwrap();
        for (i, start) in ["10:00", "10:15", "10:30", "10:45", "11:00"].iter().enumerate() {
            let start = t(start);
            let times = format!(
                "{} {} {}",
                utils::get_time_str(start),
                utils::get_time_str(start + 600),
                utils::get_time_str(start + 1200)
            );
            builder.add_trip_schedule(r1, &format!("L1-{i}"), &times).unwrap();
        }
        builder.build().unwrap()
    }

    fn request(network: &Network) -> RaptorRequest {
        RaptorRequest::new(
            vec![AccessEgress::walk(network.get_stop_idx("A").unwrap(), 60)],
            vec![AccessEgress::walk(network.get_stop_idx("C").unwrap(), 60)],
        )
    }

    #[test]
    fn invalid_requests() {
        let network = network();
        let service = RaptorService::new(&network);

        let err = service.route(&request(&network)).unwrap_err();
        assert!(matches!(err, RaptorError::InvalidRequest(_)));

        let reverse_mc = request(&network)
            .with_latest_arrival_time(t("11:00"))
            .with_direction(SearchDirection::Reverse);
        assert!(matches!(service.route(&reverse_mc), Err(RaptorError::InvalidRequest(_))));

        let pass_through = request(&network)
            .with_earliest_departure_time(t("10:00"))
            .with_profile(RaptorProfile::Standard)
            .with_pass_through_points(vec![crate::request::PassThroughPoint::new(vec![0])]);
        assert!(matches!(service.route(&pass_through), Err(RaptorError::InvalidRequest(_))));
    }

    #[test]
    fn empty_access_gives_empty_response() {
        let network = network();
        let request = RaptorRequest::default().with_earliest_departure_time(t("10:00"));
        let response = RaptorService::new(&network).route(&request).unwrap();
        assert!(response.is_empty());
        assert_eq!(response.iterations, 0);
    }

    #[test]
    fn search_window_is_calculated_from_heuristics() {
        let network = network();
        let request = request(&network).with_earliest_departure_time(t("09:59"));
        let response = RaptorService::new(&network).route(&request).unwrap();

        // 40m floor + half of the 22m travel time, rounded to 10 minutes.
        assert_eq!(response.search_window, Some(50 * 60));
        assert_eq!(response.earliest_departure_time, Some(t("09:59")));
        assert_eq!(response.latest_arrival_time, Some(t("09:59") + 50 * 60 + 22 * 60));
        assert_eq!(response.iterations, 50);

        // Departures 10:00 through 10:45 fit in the window.
        let starts: Vec<_> = response.paths.iter().map(|p| p.start_time).collect();
        assert_eq!(starts, vec![t("09:59"), t("10:14"), t("10:29"), t("10:44")]);
        assert!(!response.partial);
    }

    #[test]
    fn fixed_window_and_reverse_search() {
        let network = network();
        let request = request(&network)
            .with_profile(RaptorProfile::Standard)
            .with_direction(SearchDirection::Reverse)
            .with_latest_arrival_time(t("11:00"))
            .with_search_window(20 * 60);
        let response = RaptorService::new(&network).route(&request).unwrap();

        let ends: Vec<_> = response.paths.iter().map(|p| p.end_time).collect();
        assert_eq!(ends, vec![t("10:36"), t("10:51")]);
        assert_eq!(response.search_window, Some(20 * 60));
    }

    #[test]
    fn latest_arrival_time_is_a_hard_limit() {
        let network = network();
        let request = request(&network)
            .with_earliest_departure_time(t("09:59"))
            .with_latest_arrival_time(t("10:40"));
        let response = RaptorService::new(&network).route(&request).unwrap();
        assert!(response.paths.iter().all(|p| p.end_time <= t("10:40")));
        assert_eq!(response.paths.len(), 2);
    }
}
