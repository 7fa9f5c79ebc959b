use log::{debug, trace};

use crate::config::{SlackProvider, TransferOptimizationConfig};
use crate::cost::CostCalculator;
use crate::network::Network;
use crate::path::{PathAnchor, PathBuilder, PathPart, RaptorPath, TransitLeg};
use crate::request::PassThroughPoints;
use crate::transfer_optimization::filter::PathTailFilter;
use crate::transfer_optimization::generator::{TransferGenerator, TransferGeneratorError};
use crate::transfer_optimization::leg_selector::TransitPathLegSelector;
use crate::transfer_optimization::tail::{OptimizedPathTail, TailContext};
use crate::transfer_optimization::wait_time_cost::TransferWaitTimeCostCalculator;

/// Finds where the transfers of a path should happen.
///
/// Raptor only knows at which stops a path changes trips. This service tries every possible transfer
/// point between each pair of trips and keeps the best combination. The combinations are built from the
/// end of the path (the tail) towards the start, and after each transfer only the best tails for each
/// boarding position are kept, so the work grows with the number of transfers times the number of
/// transfer points instead of exponentially.
///
/// ```text
/// Stop:     A     B     C     D     E     F     G
/// Line 1:  + --- + --------- +
/// Line 2:        + --- + --- + --- + --- +
/// Line 3:              + --------- + --- + --- +
/// ```
///
/// Boarding Line 2 at D leaves the transfers at E and F to Line 3, E is best. Boarding at B adds C,
/// which beats E. Going back to Line 1 the choice is then between `L1 ~ D ~ L2 ~ E ~ L3` and
/// `L1 ~ B ~ L2 ~ C ~ L3`.
pub struct OptimizePathDomainService<'a> {
    network: &'a Network,
    slack: &'a SlackProvider,
    cost: &'a CostCalculator,
    config: TransferOptimizationConfig,
    pass_through: PassThroughPoints,
}

impl<'a> OptimizePathDomainService<'a> {
    pub fn new(
        network: &'a Network,
        slack: &'a SlackProvider,
        cost: &'a CostCalculator,
        config: TransferOptimizationConfig,
        pass_through: PassThroughPoints,
    ) -> Self {
        Self { network, slack, cost, config, pass_through }
    }

    /// The best versions of `path`. Paths with less than two transit legs are returned unchanged. The
    /// result is empty if no version passes through the pass-through points.
    pub fn find_best_transit_path(&self, path: &RaptorPath) -> Result<Vec<RaptorPath>, TransferGeneratorError> {
        let transit_legs: Vec<&TransitLeg> = path.transit_legs().collect();
        let (Some(access), Some(egress)) = (path.access(), path.egress()) else {
            return Ok(vec![path.clone()]);
        };
        let (Some(first), Some(last)) = (transit_legs.first().copied(), transit_legs.last().copied()) else {
            return Ok(vec![path.clone()]);
        };
        if transit_legs.len() < 2 {
            return Ok(vec![path.clone()]);
        }

        let possible_transfers =
            TransferGenerator::new(self.network, self.slack).find_all_possible_transfers(&transit_legs)?;

        // Legs before the first and after the last transit leg are kept as they are.
        let parts = path.parts();
        let first_transit = parts.iter().position(|p| matches!(p, PathPart::Transit { .. })).unwrap_or(0);
        let last_transit = parts.iter().rposition(|p| matches!(p, PathPart::Transit { .. })).unwrap_or(0);
        let prefix = &parts[..first_transit];
        let trailing = parts[last_transit + 1..].to_vec();

        let ctx = TailContext {
            builder: PathBuilder::new(self.network, self.slack, self.cost),
            egress,
            wait_time_cost: self.config.optimize_transfer_wait_time.then(|| {
                TransferWaitTimeCostCalculator::new(&self.config).with_total_in_vehicle_time(path.in_vehicle_time())
            }),
        };
        let filter =
            PathTailFilter::new(self.config.optimize_transfer_priority, self.config.optimize_transfer_wait_time);

        let access_arrival = path.legs.first().map_or(path.start_time, |leg| leg.arrival_time());
        let mut tails = vec![OptimizedPathTail::new(last.trip, last.board_pos, last.alight_pos, trailing)];

        for i in (0..possible_transfers.len()).rev() {
            let from_leg = transit_legs[i];

            // Transfers arriving before the leg can be boarded are useless. Lists are sorted with the
            // latest departure first, so the earliest boarding is the last element of the previous list.
            let earliest_departure = if i == 0 {
                access_arrival
            } else {
                possible_transfers[i - 1].last().map_or(access_arrival, |tx| tx.to.time)
            };

            let mut selector = TransitPathLegSelector::new(&ctx, filter, tails);
            let mut next_tails = Vec::new();
            for tx in &possible_transfers[i] {
                if tx.from.time <= earliest_departure {
                    continue;
                }
                for tail in selector.next(tx.to.stop_pos) {
                    next_tails.push(tail.add_transit_and_transfer(&ctx, from_leg.trip, from_leg.board_pos, tx));
                }
            }
            trace!("{} tails after transfer {}", next_tails.len(), i + 1);
            tails = next_tails;
        }

        let tails = TransitPathLegSelector::new(&ctx, filter, tails).next(first.board_pos);

        let mut result = Vec::with_capacity(tails.len());
        for tail in tails {
            let mut parts = prefix.to_vec();
            parts.extend(tail.parts());
            match ctx.builder.build(access, &parts, egress, PathAnchor::Departure(path.start_time), path.iteration_time) {
                Ok(optimized) => result.push(optimized),
                Err(e) => debug!("Optimized path dropped: {e}"),
            }
        }

        if !self.pass_through.is_empty() {
            result.retain(|p| self.pass_through.is_passed_by(p.visited_stops(self.network)));
        }
        Ok(result)
    }
}
