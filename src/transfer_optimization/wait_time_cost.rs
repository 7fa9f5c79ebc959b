use crate::config::TransferOptimizationConfig;

/// Share of the total in-vehicle time used as the minimum safe transfer time.
const MIN_SAFE_TRANSFER_TIME_SHARE: f64 = 0.0667;
const MIN_SAFE_TRANSFER_TIME_FLOOR: i32 = 60;

/// Cost of waiting at a transfer. Short waits are expensive, the cost drops as the wait approaches the
/// minimum safe transfer time `t0`:
///
/// `f(t) = n·t0 / (1 + (n - 1)·t/t0) - b·t`
///
/// where `n` is the cost factor at `t = 0` and `b` rewards waiting instead of travelling back.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransferWaitTimeCostCalculator {
    min_safe_wait_time_factor: f64,
    back_travel_wait_time_factor: f64,
    min_safe_transfer_time: i32,
}

impl TransferWaitTimeCostCalculator {
    pub fn new(config: &TransferOptimizationConfig) -> Self {
        Self {
            min_safe_wait_time_factor: config.min_safe_wait_time_factor,
            back_travel_wait_time_factor: config.back_travel_wait_time_factor,
            min_safe_transfer_time: MIN_SAFE_TRANSFER_TIME_FLOOR,
        }
    }

    pub fn min_safe_transfer_time(total_in_vehicle_time: i32) -> i32 {
        ((total_in_vehicle_time as f64 * MIN_SAFE_TRANSFER_TIME_SHARE).round() as i32).max(MIN_SAFE_TRANSFER_TIME_FLOOR)
    }

    /// Sets `t0` from the in-vehicle time of the path being optimized.
    pub fn with_total_in_vehicle_time(mut self, total_in_vehicle_time: i32) -> Self {
        self.min_safe_transfer_time = Self::min_safe_transfer_time(total_in_vehicle_time);
        self
    }

    pub fn cost(&self, wait_time: i32) -> i32 {
        let n = self.min_safe_wait_time_factor;
        let t0 = self.min_safe_transfer_time as f64;
        let t = wait_time.max(0) as f64;
        let avoid_short_wait = n * t0 / (1.0 + (n - 1.0) * t / t0);
        (avoid_short_wait - self.back_travel_wait_time_factor * t).round() as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculator() -> TransferWaitTimeCostCalculator {
        TransferWaitTimeCostCalculator::new(&TransferOptimizationConfig::default())
    }

    #[test]
    fn min_safe_transfer_time() {
        assert_eq!(TransferWaitTimeCostCalculator::min_safe_transfer_time(0), 60);
        assert_eq!(TransferWaitTimeCostCalculator::min_safe_transfer_time(600), 60);
        assert_eq!(TransferWaitTimeCostCalculator::min_safe_transfer_time(3600), 240);
    }

    #[test]
    fn cost_at_known_points() {
        let calc = calculator();
        // n·t0 at zero wait
        assert_eq!(calc.cost(0), 300);
        // t0 / (1 + 4) * 5 - t at t = t0
        assert_eq!(calc.cost(60), 0);
        assert_eq!(calc.cost(-10), 300);
    }

    #[test]
    fn cost_decreases_with_wait_time() {
        let calc = calculator().with_total_in_vehicle_time(3600);
        let costs: Vec<i32> = (0..10).map(|m| calc.cost(m * 60)).collect();
        assert!(costs.windows(2).all(|w| w[0] > w[1]), "{costs:?}");
    }
}
