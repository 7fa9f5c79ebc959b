use std::fmt::Display;

use log::trace;
use thiserror::Error;

use crate::config::SlackProvider;
use crate::network::{GlobalTripIndex, Network, StopIndex, Timestamp, TripSchedule};
use crate::path::TransitLeg;
use crate::transfer::{Transfer, TransferConstraint, TripStopPos};
use crate::utils;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferGeneratorError {
    #[error("No possible transfer from trip '{from_trip}' to trip '{to_trip}' (Raptor alighted at stop {stop}).")]
    NoTransferFound { from_trip: String, to_trip: String, stop: StopIndex },
}

/// A stop position in a trip, with the arrival (from side) or departure (to side) time there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TripStopTime {
    pub trip: GlobalTripIndex,
    pub stop_pos: usize,
    pub stop: StopIndex,
    pub time: Timestamp,
}

impl TripStopTime {
    fn arrival(trip: &TripSchedule, stop_pos: usize) -> Self {
        Self { trip: trip.index, stop_pos, stop: trip.stop(stop_pos), time: trip.arrival(stop_pos) }
    }

    fn departure(trip: &TripSchedule, stop_pos: usize) -> Self {
        Self { trip: trip.index, stop_pos, stop: trip.stop(stop_pos), time: trip.departure(stop_pos) }
    }

    pub fn trip_stop_pos(&self) -> TripStopPos { TripStopPos::new(self.trip, self.stop_pos) }
}

impl Display for TripStopTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} {}]", self.stop, utils::get_compact_time_str(self.time))
    }
}

/// One way to get from one trip to the next: alight `from`, optionally walk, board `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TripToTripTransfer {
    pub from: TripStopTime,
    pub to: TripStopTime,
    pub transfer: Option<Transfer>,
    pub constraint: Option<TransferConstraint>,
}

impl TripToTripTransfer {
    pub fn walk_duration(&self) -> i32 { self.transfer.map_or(0, |tx| tx.duration) }

    /// Time between arriving at the boarding stop and the departure.
    pub fn wait_time(&self) -> i32 { self.to.time - self.from.time - self.walk_duration() }

    pub fn same_stop(&self) -> bool { self.transfer.is_none() }
}

impl Display for TripToTripTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ~ {}", self.from, self.to)?;
        if let Some(tx) = &self.transfer {
            write!(f, " (walk {})", utils::get_duration_str(tx.duration))?;
        }
        if let Some(c) = &self.constraint {
            write!(f, " {c}")?;
        }
        Ok(())
    }
}

/// Finds every place two consecutive trips of a path can be connected.
pub struct TransferGenerator<'a> {
    network: &'a Network,
    slack: &'a SlackProvider,
}

impl<'a> TransferGenerator<'a> {
    pub fn new(network: &'a Network, slack: &'a SlackProvider) -> Self {
        Self { network, slack }
    }

    /// One list per pair of consecutive transit legs, each sorted on the board time of the next trip,
    /// latest first. Fails if a pair has no possible transfer.
    pub fn find_all_possible_transfers(
        &self,
        transit_legs: &[&TransitLeg],
    ) -> Result<Vec<Vec<TripToTripTransfer>>, TransferGeneratorError> {
        let mut result = Vec::with_capacity(transit_legs.len().saturating_sub(1));
        let Some(first) = transit_legs.first() else {
            return Ok(result);
        };
        let mut earliest_from_pos = first.board_pos + 1;

        for pair in transit_legs.windows(2) {
            let (from_leg, to_leg) = (pair[0], pair[1]);
            let from_trip = self.network.get_trip(from_leg.trip);
            let to_trip = self.network.get_trip(to_leg.trip);

            let mut transfers = self.find_transfers(&from_trip, earliest_from_pos, &to_trip, to_leg.alight_pos);
            if transfers.is_empty() {
                return Err(TransferGeneratorError::NoTransferFound {
                    from_trip: from_trip.id.to_string(),
                    to_trip: to_trip.id.to_string(),
                    stop: from_leg.alight_stop,
                });
            }
            transfers.sort_by(|a, b| b.to.time.cmp(&a.to.time).then(b.to.stop_pos.cmp(&a.to.stop_pos)));
            trace!("{} possible transfers from {} to {}", transfers.len(), from_trip.id, to_trip.id);

            // The next trip can only be left after the earliest place it can be boarded.
            earliest_from_pos = transfers.iter().map(|tx| tx.to.stop_pos).min().unwrap_or(0) + 1;
            result.push(transfers);
        }
        Ok(result)
    }

    fn find_transfers(
        &self,
        from_trip: &TripSchedule,
        earliest_from_pos: usize,
        to_trip: &TripSchedule,
        to_alight_pos: usize,
    ) -> Vec<TripToTripTransfer> {
        let mut result = Vec::new();

        for from_pos in earliest_from_pos..from_trip.num_stops() {
            if !from_trip.alighting_possible_at(from_pos) {
                continue;
            }
            let from = TripStopTime::arrival(from_trip, from_pos);

            // Same stop first, then street transfers.
            let candidates = std::iter::once((from.stop, None))
                .chain(self.network.transfers_from(from.stop).iter().map(|tx| (tx.to_stop, Some(*tx))));

            for (to_stop, walk) in candidates {
                for to_pos in 0..to_alight_pos {
                    if to_trip.stop(to_pos) != to_stop || !to_trip.boarding_possible_at(to_pos) {
                        continue;
                    }
                    let to = TripStopTime::departure(to_trip, to_pos);
                    let constraint = self
                        .network
                        .find_constrained_transfer(from.trip_stop_pos(), to.trip_stop_pos())
                        .copied();
                    let tx = TripToTripTransfer { from, to, transfer: walk, constraint };
                    if self.is_possible(from_trip, to_trip, &tx) {
                        result.push(tx);
                    }
                }
            }
        }
        result
    }

    fn is_possible(&self, from_trip: &TripSchedule, to_trip: &TripSchedule, tx: &TripToTripTransfer) -> bool {
        let walk = tx.walk_duration();
        let arrival = tx.from.time;
        let departure = tx.to.time;

        if let Some(constraint) = tx.constraint {
            if constraint.is_not_allowed() {
                return false;
            }
            if constraint.is_facilitated()
                && departure >= arrival + walk
                && constraint.is_facilitated_for_wait(departure - arrival)
            {
                return true;
            }
        }

        let regular = arrival
            + self.slack.alight_slack(from_trip.slack_index())
            + walk
            + self.slack.transfer_slack
            + self.slack.board_slack(to_trip.slack_index());

        // Minimum transfer time and slack are not added up.
        let earliest_departure = match tx.constraint.and_then(|c| c.min_transfer_time) {
            Some(min_transfer_time) => regular.max(arrival + min_transfer_time),
            None => regular,
        };
        departure >= earliest_departure
    }
}
