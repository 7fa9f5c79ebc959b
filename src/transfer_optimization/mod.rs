//! Moves the transfers of Raptor paths to the best stops: highest transfer priority first, then the
//! lowest generalized cost, then the safest wait time.

pub mod domain_service;
pub mod filter;
pub mod generator;
pub mod leg_selector;
pub mod tail;
pub mod wait_time_cost;

use log::{debug, warn};

pub use domain_service::OptimizePathDomainService;
pub use generator::{TransferGenerator, TransferGeneratorError, TripStopTime, TripToTripTransfer};
pub use tail::OptimizedPathTail;
pub use wait_time_cost::TransferWaitTimeCostCalculator;

use crate::config::{SlackProvider, TransferOptimizationConfig};
use crate::cost::CostCalculator;
use crate::network::Network;
use crate::path::RaptorPath;
use crate::request::PassThroughPoints;

pub struct OptimizeTransferService<'a> {
    domain_service: OptimizePathDomainService<'a>,
}

impl<'a> OptimizeTransferService<'a> {
    pub fn new(
        network: &'a Network,
        slack: &'a SlackProvider,
        cost: &'a CostCalculator,
        config: TransferOptimizationConfig,
        pass_through: PassThroughPoints,
    ) -> Self {
        Self { domain_service: OptimizePathDomainService::new(network, slack, cost, config, pass_through) }
    }

    /// The optimized versions of one path.
    pub fn optimize_path(&self, path: &RaptorPath) -> Result<Vec<RaptorPath>, TransferGeneratorError> {
        self.domain_service.find_best_transit_path(path)
    }

    /// Optimizes every path. A path that can not be optimized is kept as it is.
    pub fn optimize(&self, paths: Vec<RaptorPath>) -> Vec<RaptorPath> {
        let num_paths = paths.len();
        let mut result: Vec<RaptorPath> = Vec::with_capacity(num_paths);

        for path in paths {
            let optimized = match self.optimize_path(&path) {
                Ok(optimized) if !optimized.is_empty() => optimized,
                Ok(_) => {
                    warn!("No optimized path passes through all points, keeping the original");
                    vec![path]
                }
                Err(e) => {
                    warn!("Transfer optimization failed, keeping the original path: {e}");
                    vec![path]
                }
            };
            for path in optimized {
                if !result.contains(&path) {
                    result.push(path);
                }
            }
        }
        debug!("Transfer optimization turned {num_paths} paths into {}", result.len());
        result
    }
}
