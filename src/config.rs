//! Search and optimization parameters.

use chrono::Duration;

use crate::cost::GeneralizedCost;

/// Board, alight and transfer slack in seconds.
///
/// Board and alight slack can be overridden per slack index, routes pick their slack index when the
/// network is built (e.g. one index per transit mode).
#[derive(Debug, Clone, PartialEq)]
pub struct SlackProvider {
    pub transfer_slack: i32,
    pub board_slack: i32,
    pub alight_slack: i32,
    board_slack_overrides: Vec<Option<i32>>,
    alight_slack_overrides: Vec<Option<i32>>,
}

impl SlackProvider {
    pub fn new(transfer_slack: i32, board_slack: i32, alight_slack: i32) -> Self {
        Self {
            transfer_slack,
            board_slack,
            alight_slack,
            board_slack_overrides: Vec::new(),
            alight_slack_overrides: Vec::new(),
        }
    }

    pub fn with_transfer_slack(mut self, slack: Duration) -> Self {
        self.transfer_slack = slack.num_seconds() as i32;
        self
    }

    pub fn with_board_slack_for(mut self, slack_index: usize, slack: Duration) -> Self {
        set_override(&mut self.board_slack_overrides, slack_index, slack);
        self
    }

    pub fn with_alight_slack_for(mut self, slack_index: usize, slack: Duration) -> Self {
        set_override(&mut self.alight_slack_overrides, slack_index, slack);
        self
    }

    pub fn board_slack(&self, slack_index: usize) -> i32 {
        self.board_slack_overrides
            .get(slack_index)
            .copied()
            .flatten()
            .unwrap_or(self.board_slack)
    }

    pub fn alight_slack(&self, slack_index: usize) -> i32 {
        self.alight_slack_overrides
            .get(slack_index)
            .copied()
            .flatten()
            .unwrap_or(self.alight_slack)
    }
}

fn set_override(overrides: &mut Vec<Option<i32>>, slack_index: usize, slack: Duration) {
    if overrides.len() <= slack_index {
        overrides.resize(slack_index + 1, None);
    }
    overrides[slack_index] = Some(slack.num_seconds() as i32);
}

impl Default for SlackProvider {
    fn default() -> Self {
        Self::new(120, 0, 0)
    }
}

/// Generalized-cost factors. Costs are in the same unit as seconds of reluctance-weighted travel.
#[derive(Debug, Clone, PartialEq)]
pub struct CostParams {
    pub board_cost: GeneralizedCost,
    pub transfer_cost: GeneralizedCost,
    pub wait_reluctance: f64,
    pub transit_reluctance: f64,
}

impl Default for CostParams {
    fn default() -> Self {
        Self {
            board_cost: 600,
            transfer_cost: 0,
            wait_reluctance: 1.0,
            transit_reluctance: 1.0,
        }
    }
}

/// Parameters for the dynamic search window.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchWindowConfig {
    pub min_transit_time_coefficient: f64,
    pub min_wait_time_coefficient: f64,
    /// Lower bound added to the computed window (seconds).
    pub min_window: i32,
    /// Upper bound of the computed window (seconds).
    pub max_window: i32,
    /// The window is rounded to a multiple of this (seconds).
    pub step: i32,
}

impl SearchWindowConfig {
    pub fn new(min_transit_time_coefficient: f64, min_wait_time_coefficient: f64, min_window: Duration, max_window: Duration, step: Duration) -> Self {
        Self {
            min_transit_time_coefficient,
            min_wait_time_coefficient,
            min_window: min_window.num_seconds() as i32,
            max_window: max_window.num_seconds() as i32,
            step: step.num_seconds() as i32,
        }
    }
}

impl Default for SearchWindowConfig {
    fn default() -> Self {
        Self::new(0.5, 0.0, Duration::minutes(40), Duration::minutes(180), Duration::minutes(10))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferOptimizationConfig {
    pub optimize_transfer_priority: bool,
    pub optimize_transfer_wait_time: bool,
    /// `n` in the wait-time cost function, the cost of a zero-wait transfer relative to `t0`.
    pub min_safe_wait_time_factor: f64,
    /// `b` in the wait-time cost function.
    pub back_travel_wait_time_factor: f64,
}

impl Default for TransferOptimizationConfig {
    fn default() -> Self {
        Self {
            optimize_transfer_priority: true,
            optimize_transfer_wait_time: true,
            min_safe_wait_time_factor: 5.0,
            back_travel_wait_time_factor: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let slack = SlackProvider::default();
        assert_eq!(slack.transfer_slack, 120);
        assert_eq!(slack.board_slack(0), 0);
        assert_eq!(slack.alight_slack(3), 0);

        let cost = CostParams::default();
        assert_eq!(cost.board_cost, 600);
        assert_eq!(cost.transfer_cost, 0);

        let sw = SearchWindowConfig::default();
        assert_eq!(sw.min_window, 2400);
        assert_eq!(sw.max_window, 10_800);
        assert_eq!(sw.step, 600);

        let opt = TransferOptimizationConfig::default();
        assert!(opt.optimize_transfer_priority);
        assert_eq!(opt.min_safe_wait_time_factor, 5.0);
    }

    #[test]
    fn slack_overrides() {
        let slack = SlackProvider::new(60, 30, 10)
            .with_board_slack_for(2, Duration::minutes(2))
            .with_alight_slack_for(1, Duration::seconds(45));

        assert_eq!(slack.board_slack(0), 30);
        assert_eq!(slack.board_slack(2), 120);
        assert_eq!(slack.board_slack(5), 30);
        assert_eq!(slack.alight_slack(1), 45);
        assert_eq!(slack.alight_slack(2), 10);
    }

    #[test]
    fn transfer_slack_from_duration() {
        let slack = SlackProvider::default().with_transfer_slack(Duration::minutes(3));
        assert_eq!(slack.transfer_slack, 180);
    }
}
