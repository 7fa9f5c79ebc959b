use log::debug;
use thiserror::Error;

use crate::calculator::{time_or_none, TIME_NOT_SET};
use crate::config::SearchWindowConfig;
use crate::network::Timestamp;
use crate::request::SearchParams;
use crate::utils;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchWindowError {
    #[error("The heuristic min transit time must be set before the search window is calculated.")]
    MissingHeuristics,
    #[error("Duration can not be negative: {0}s.")]
    NegativeDuration(i32),
}

/// Rounds a duration up to a whole minute.
pub fn round_up_to_nearest_minute(seconds: i32) -> Result<i32, SearchWindowError> {
    if seconds < 0 {
        return Err(SearchWindowError::NegativeDuration(seconds));
    }
    Ok(((seconds + 59) / 60) * 60)
}

/// Calculates the search window and fills in the earliest departure or latest arrival time the caller did not set.
/// Used once per request: set heuristics and parameters, call [`calculate`](Self::calculate), read the result.
#[derive(Debug, Clone)]
pub struct RaptorSearchWindowCalculator {
    config: SearchWindowConfig,
    min_transit_time: Option<i32>,
    min_wait_time: i32,
    earliest_departure_time: Timestamp,
    latest_arrival_time: Timestamp,
    search_window: i32,
}

impl RaptorSearchWindowCalculator {
    pub fn new(config: SearchWindowConfig) -> Self {
        Self {
            config,
            min_transit_time: None,
            min_wait_time: 0,
            earliest_departure_time: TIME_NOT_SET,
            latest_arrival_time: TIME_NOT_SET,
            search_window: TIME_NOT_SET,
        }
    }

    pub fn with_heuristics(mut self, min_transit_time: i32, min_wait_time: i32) -> Self {
        self.min_transit_time = Some(min_transit_time);
        self.min_wait_time = min_wait_time;
        self
    }

    pub fn with_search_params(mut self, params: &SearchParams) -> Self {
        self.earliest_departure_time = params.earliest_departure_time.unwrap_or(TIME_NOT_SET);
        self.latest_arrival_time = params.latest_arrival_time.unwrap_or(TIME_NOT_SET);
        self.search_window = params.search_window.unwrap_or(TIME_NOT_SET);
        self
    }

    pub fn calculate(mut self) -> Result<Self, SearchWindowError> {
        let min_transit_time = self.min_transit_time.ok_or(SearchWindowError::MissingHeuristics)?;

        if self.search_window == TIME_NOT_SET {
            self.search_window = self.calculate_search_window(min_transit_time);
        }

        let travel_window = self.search_window + round_up_to_nearest_minute(min_transit_time)?;
        let edt_set = self.earliest_departure_time != TIME_NOT_SET;
        let lat_set = self.latest_arrival_time != TIME_NOT_SET;

        if edt_set && !lat_set {
            self.latest_arrival_time = self.earliest_departure_time + travel_window;
        } else if lat_set && !edt_set {
            self.earliest_departure_time = self.latest_arrival_time - travel_window;
        }

        debug!(
            "Search window {} (min transit {}, min wait {}), EDT {:?} LAT {:?}",
            utils::get_duration_str(self.search_window),
            utils::get_duration_str(min_transit_time),
            utils::get_duration_str(self.min_wait_time),
            self.earliest_departure_time().map(utils::get_time_str),
            self.latest_arrival_time().map(utils::get_time_str),
        );
        Ok(self)
    }

    fn calculate_search_window(&self, min_transit_time: i32) -> i32 {
        let edt_set = self.earliest_departure_time != TIME_NOT_SET;
        let lat_set = self.latest_arrival_time != TIME_NOT_SET;

        // Both ends are pinned, the window is whatever is left after the fastest trip.
        if edt_set && lat_set {
            let available = self.latest_arrival_time - self.earliest_departure_time - min_transit_time;
            return self.round_step(available as f64).max(0);
        }

        let window = self.config.min_window as f64
            + self.config.min_transit_time_coefficient * min_transit_time as f64
            + self.config.min_wait_time_coefficient * self.min_wait_time as f64;
        self.config.max_window.min(self.round_step(window))
    }

    /// Rounds half-up to the nearest step.
    fn round_step(&self, value: f64) -> i32 {
        let step = self.config.step.max(1);
        (value / step as f64 + 0.5).floor() as i32 * step
    }

    pub fn earliest_departure_time(&self) -> Option<Timestamp> { time_or_none(self.earliest_departure_time) }

    pub fn latest_arrival_time(&self) -> Option<Timestamp> { time_or_none(self.latest_arrival_time) }

    pub fn search_window(&self) -> Option<i32> { time_or_none(self.search_window) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EDT: Timestamp = 10 * 3600;

    fn params(edt: Option<Timestamp>, lat: Option<Timestamp>, search_window: Option<i32>) -> SearchParams {
        SearchParams {
            earliest_departure_time: edt,
            latest_arrival_time: lat,
            search_window,
            ..SearchParams::default()
        }
    }

    fn calculator() -> RaptorSearchWindowCalculator {
        RaptorSearchWindowCalculator::new(SearchWindowConfig::default())
    }

    #[test]
    fn round_up() {
        assert_eq!(round_up_to_nearest_minute(0), Ok(0));
        assert_eq!(round_up_to_nearest_minute(1), Ok(60));
        assert_eq!(round_up_to_nearest_minute(59), Ok(60));
        assert_eq!(round_up_to_nearest_minute(60), Ok(60));
        assert_eq!(round_up_to_nearest_minute(61), Ok(120));
        assert_eq!(round_up_to_nearest_minute(-1), Err(SearchWindowError::NegativeDuration(-1)));
    }

    #[test]
    fn missing_heuristics() {
        let result = calculator().with_search_params(&params(Some(EDT), None, None)).calculate();
        assert_eq!(result.err(), Some(SearchWindowError::MissingHeuristics));
    }

    #[test]
    fn window_from_heuristics() {
        // 40m + 0.5 * 10m = 45m, rounded half-up to the 10 minute step.
        let calc = calculator()
            .with_heuristics(600, 0)
            .with_search_params(&params(Some(EDT), None, None))
            .calculate()
            .unwrap();
        assert_eq!(calc.search_window(), Some(3000));
        assert_eq!(calc.earliest_departure_time(), Some(EDT));
        assert_eq!(calc.latest_arrival_time(), Some(EDT + 3000 + 600));
    }

    #[test]
    fn window_is_clamped_to_max() {
        let calc = calculator()
            .with_heuristics(30_000, 0)
            .with_search_params(&params(Some(EDT), None, None))
            .calculate()
            .unwrap();
        assert_eq!(calc.search_window(), Some(10_800));
    }

    #[test]
    fn both_times_pinned() {
        let calc = calculator()
            .with_heuristics(1_200, 0)
            .with_search_params(&params(Some(EDT), Some(EDT + 3_600), None))
            .calculate()
            .unwrap();
        assert_eq!(calc.search_window(), Some(2_400));
        assert_eq!(calc.latest_arrival_time(), Some(EDT + 3_600));

        // No upper clamp.
        let calc = calculator()
            .with_heuristics(0, 0)
            .with_search_params(&params(Some(EDT), Some(EDT + 6 * 3_600), None))
            .calculate()
            .unwrap();
        assert_eq!(calc.search_window(), Some(6 * 3_600));

        let calc = calculator()
            .with_heuristics(7_200, 0)
            .with_search_params(&params(Some(EDT), Some(EDT + 3_600), None))
            .calculate()
            .unwrap();
        assert_eq!(calc.search_window(), Some(0));
    }

    #[test]
    fn earliest_departure_from_latest_arrival() {
        let calc = calculator()
            .with_heuristics(601, 0)
            .with_search_params(&params(None, Some(EDT), Some(1_800)))
            .calculate()
            .unwrap();
        assert_eq!(calc.search_window(), Some(1_800));
        assert_eq!(calc.earliest_departure_time(), Some(EDT - 1_800 - 660));
    }

    #[test]
    fn wait_time_coefficient() {
        let config = SearchWindowConfig { min_wait_time_coefficient: 1.0, ..SearchWindowConfig::default() };
        let calc = RaptorSearchWindowCalculator::new(config)
            .with_heuristics(0, 1_500)
            .with_search_params(&params(Some(EDT), None, None))
            .calculate()
            .unwrap();
        // 40m + 25m = 65m, rounds half-up to 70m.
        assert_eq!(calc.search_window(), Some(4_200));
    }
}
