use crate::config::CostParams;
use crate::transfer::TransferConstraint;

/// Generalized cost (c1), in "seconds of reluctance-weighted travel".
pub type GeneralizedCost = i32;

pub const ZERO_COST: GeneralizedCost = 0;

/// Computes the generalized cost of each part of a path. Used by the multi-criteria search and by the
/// path builder, so the optimizer and the search agree on what a path costs.
#[derive(Debug, Clone)]
pub struct CostCalculator {
    params: CostParams,
}

impl CostCalculator {
    pub fn new(params: CostParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &CostParams { &self.params }

    /// Cost of boarding after waiting `wait_time` seconds at the stop. The first boarding of a journey does not
    /// pay for waiting, the access leg is time-shifted to remove it.
    pub fn boarding_cost(&self, first_boarding: bool, wait_time: i32, constraint: Option<&TransferConstraint>) -> GeneralizedCost {
        if first_boarding {
            return self.params.board_cost;
        }
        let wait = self.wait_cost(wait_time);
        match constraint {
            Some(c) if c.stay_seated => wait,
            Some(c) if c.guaranteed => self.params.board_cost + wait,
            _ => self.params.board_cost + self.params.transfer_cost + wait,
        }
    }

    pub fn wait_cost(&self, wait_time: i32) -> GeneralizedCost {
        (self.params.wait_reluctance * wait_time as f64).round() as GeneralizedCost
    }

    /// Cost of riding `ride_time` seconds, alight slack included.
    pub fn transit_cost(&self, ride_time: i32, alight_slack: i32) -> GeneralizedCost {
        (self.params.transit_reluctance * (ride_time + alight_slack) as f64).round() as GeneralizedCost
    }

    /// Relative cost used to compare boardings of the same route in a round: the boarding cost minus the
    /// transit cost up to the boarding time, so that two labels on the same trip can be compared at any later stop.
    pub fn relative_transit_cost(&self, board_time_offset: i32) -> GeneralizedCost {
        -(self.params.transit_reluctance * board_time_offset as f64).round() as GeneralizedCost
    }

    pub fn egress_cost(&self, egress_c1: GeneralizedCost, wait_time: i32) -> GeneralizedCost {
        egress_c1 + self.wait_cost(wait_time)
    }
}

impl Default for CostCalculator {
    fn default() -> Self {
        Self::new(CostParams::default())
    }
}
