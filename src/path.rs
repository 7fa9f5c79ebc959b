use std::fmt::Display;

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::access_egress::AccessEgress;
use crate::config::SlackProvider;
use crate::cost::{CostCalculator, GeneralizedCost};
use crate::network::{GlobalTripIndex, Network, StopIndex, Timestamp, TripSchedule};
use crate::transfer::{Transfer, TransferConstraint};
use crate::trip_times_search::{self, TripTimesSearchError};
use crate::utils;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Access to stop {0} can not be time-shifted to reach the first boarding.")]
    AccessNotAvailable(StopIndex),
    #[error("Egress from stop {0} is not available when the path arrives.")]
    EgressNotAvailable(StopIndex),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitLeg {
    pub trip: GlobalTripIndex,
    pub board_stop: StopIndex,
    pub alight_stop: StopIndex,
    pub board_pos: usize,
    pub alight_pos: usize,
    pub board_time: Timestamp,
    pub alight_time: Timestamp,
    /// Constraint of the transfer that leads to this leg, if any.
    pub constraint: Option<TransferConstraint>,
    pub c1: GeneralizedCost,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathLeg {
    Access { access: AccessEgress, departure_time: Timestamp, arrival_time: Timestamp },
    Transit(TransitLeg),
    Transfer { transfer: Transfer, departure_time: Timestamp, arrival_time: Timestamp },
    Egress { egress: AccessEgress, departure_time: Timestamp, arrival_time: Timestamp },
}

impl PathLeg {
    pub fn departure_time(&self) -> Timestamp {
        match self {
            PathLeg::Access { departure_time, .. }
            | PathLeg::Transfer { departure_time, .. }
            | PathLeg::Egress { departure_time, .. } => *departure_time,
            PathLeg::Transit(leg) => leg.board_time,
        }
    }

    pub fn arrival_time(&self) -> Timestamp {
        match self {
            PathLeg::Access { arrival_time, .. }
            | PathLeg::Transfer { arrival_time, .. }
            | PathLeg::Egress { arrival_time, .. } => *arrival_time,
            PathLeg::Transit(leg) => leg.alight_time,
        }
    }

    pub fn as_transit(&self) -> Option<&TransitLeg> {
        match self {
            PathLeg::Transit(leg) => Some(leg),
            _ => None,
        }
    }
}

/// A path found by Raptor, always in forward (chronological) order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RaptorPath {
    pub legs: Vec<PathLeg>,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub c1: GeneralizedCost,
    /// Departure (or arrival, in a reverse search) of the Range-Raptor iteration that found the path.
    pub iteration_time: Timestamp,
}

impl RaptorPath {
    pub fn duration(&self) -> i32 { self.end_time - self.start_time }

    pub fn access(&self) -> Option<&AccessEgress> {
        match self.legs.first() {
            Some(PathLeg::Access { access, .. }) => Some(access),
            _ => None,
        }
    }

    pub fn egress(&self) -> Option<&AccessEgress> {
        match self.legs.last() {
            Some(PathLeg::Egress { egress, .. }) => Some(egress),
            _ => None,
        }
    }

    pub fn transit_legs(&self) -> impl Iterator<Item = &TransitLeg> {
        self.legs.iter().filter_map(PathLeg::as_transit)
    }

    /// Rides, access and egress rides included, minus one. Staying seated is not a transfer.
    pub fn number_of_transfers(&self) -> usize {
        let rides = self.transit_legs().count()
            + self.access().map_or(0, |a| a.num_rides as usize)
            + self.egress().map_or(0, |e| e.num_rides as usize);
        let stay_seated = self
            .transit_legs()
            .filter(|leg| leg.constraint.is_some_and(|c| c.stay_seated))
            .count();
        rides.saturating_sub(1 + stay_seated)
    }

    /// The legs between access and egress as path parts, for rebuilding the path.
    pub fn parts(&self) -> Vec<PathPart> {
        self.legs
            .iter()
            .filter_map(|leg| match leg {
                PathLeg::Transit(t) => Some(PathPart::Transit {
                    trip: t.trip,
                    board_pos: t.board_pos,
                    alight_pos: t.alight_pos,
                    constraint: t.constraint,
                }),
                PathLeg::Transfer { transfer, .. } => Some(PathPart::Transfer(*transfer)),
                PathLeg::Access { .. } | PathLeg::Egress { .. } => None,
            })
            .collect()
    }

    /// Time spent riding transit.
    pub fn in_vehicle_time(&self) -> i32 {
        self.transit_legs().map(|leg| leg.alight_time - leg.board_time).sum()
    }

    /// Stops visited by the path in order, including stops passed on board.
    pub fn visited_stops<'a>(&'a self, network: &'a Network) -> impl Iterator<Item = StopIndex> + 'a {
        self.legs.iter().flat_map(move |leg| -> Box<dyn Iterator<Item = StopIndex> + 'a> {
            match leg {
                PathLeg::Access { access, .. } => Box::new(std::iter::once(access.stop)),
                PathLeg::Transit(t) => {
                    let trip = network.get_trip(t.trip);
                    Box::new((t.board_pos..=t.alight_pos).map(move |pos| trip.stop(pos)))
                }
                PathLeg::Transfer { transfer, .. } => Box::new(std::iter::once(transfer.to_stop)),
                PathLeg::Egress { .. } => Box::new(std::iter::empty()),
            }
        })
    }

    pub fn start_date_time(&self, service_date: NaiveDate) -> Option<NaiveDateTime> {
        utils::to_date_time(service_date, self.start_time)
    }

    pub fn display<'a>(&'a self, network: &'a Network) -> PathDisplay<'a> {
        PathDisplay { path: self, network }
    }
}

fn access_egress_str(leg: &AccessEgress) -> String {
    if leg.has_rides() {
        format!("Flex {} {}x", utils::get_duration_str(leg.duration), leg.num_rides)
    } else {
        format!("Walk {}", utils::get_duration_str(leg.duration))
    }
}

pub struct PathDisplay<'a> {
    path: &'a RaptorPath,
    network: &'a Network,
}

impl Display for PathDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let network = self.network;
        writeln!(f, "-----------------------------------------------")?;
        for leg in &self.path.legs {
            match leg {
                PathLeg::Access { access, departure_time, .. } => writeln!(
                    f,
                    "Leave at {}, {} to {}.",
                    utils::get_time_str(*departure_time),
                    access_egress_str(access),
                    network.stop_name(access.stop),
                )?,
                PathLeg::Transit(t) => {
                    if let Some(constraint) = &t.constraint {
                        writeln!(f, "Transfer ({constraint}).")?;
                    }
                    writeln!(
                        f,
                        "Board at {} at {} ({} line).",
                        network.stop_name(t.board_stop),
                        utils::get_time_str(t.board_time),
                        network.get_trip(t.trip).route.name,
                    )?;
                    writeln!(f, "Arrive at {} at {}.", network.stop_name(t.alight_stop), utils::get_time_str(t.alight_time))?;
                }
                PathLeg::Transfer { transfer, .. } => writeln!(
                    f,
                    "Walk {} to {}.",
                    utils::get_duration_str(transfer.duration),
                    network.stop_name(transfer.to_stop),
                )?,
                PathLeg::Egress { egress, arrival_time, .. } => writeln!(
                    f,
                    "{} to destination, arrive at {}.",
                    access_egress_str(egress),
                    utils::get_time_str(*arrival_time),
                )?,
            }
        }
        writeln!(
            f,
            "Total journey time: {} minutes, {} transfers, cost {}.",
            self.path.duration() / 60,
            self.path.number_of_transfers(),
            self.path.c1,
        )?;
        writeln!(f, "-----------------------------------------------")
    }
}

/// One step of a path between the access and the egress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathPart {
    Transit { trip: GlobalTripIndex, board_pos: usize, alight_pos: usize, constraint: Option<TransferConstraint> },
    Transfer(Transfer),
}

impl PathPart {
    /// A ride on `trip` from `from_stop` to `to_stop`, boarding no earlier than `earliest_departure_time`.
    pub fn ride_after(
        trip: &TripSchedule,
        from_stop: StopIndex,
        to_stop: StopIndex,
        earliest_departure_time: Timestamp,
    ) -> Result<Self, TripTimesSearchError> {
        let times = trip_times_search::find_trip_times_after(trip, from_stop, to_stop, earliest_departure_time)?;
        Ok(PathPart::Transit { trip: trip.index, board_pos: times.board_pos, alight_pos: times.alight_pos, constraint: None })
    }

    /// A ride on `trip` from `from_stop` to `to_stop`, alighting no later than `latest_arrival_time`.
    pub fn ride_before(
        trip: &TripSchedule,
        from_stop: StopIndex,
        to_stop: StopIndex,
        latest_arrival_time: Timestamp,
    ) -> Result<Self, TripTimesSearchError> {
        let times = trip_times_search::find_trip_times_before(trip, from_stop, to_stop, latest_arrival_time)?;
        Ok(PathPart::Transit { trip: trip.index, board_pos: times.board_pos, alight_pos: times.alight_pos, constraint: None })
    }
}

/// The legs of a path after the access, with their cost.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathTail {
    pub legs: Vec<PathLeg>,
    pub c1: GeneralizedCost,
    pub end_time: Timestamp,
}

/// Where to anchor a path without transit legs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathAnchor {
    Departure(Timestamp),
    Arrival(Timestamp),
}

/// Computes leg times and the generalized cost of a path. The access leg is time-shifted to arrive just in
/// time for the first boarding, transfers and egress leave as soon as possible.
pub struct PathBuilder<'a> {
    network: &'a Network,
    slack: &'a SlackProvider,
    cost: &'a CostCalculator,
}

impl<'a> PathBuilder<'a> {
    pub fn new(network: &'a Network, slack: &'a SlackProvider, cost: &'a CostCalculator) -> Self {
        Self { network, slack, cost }
    }

    pub fn network(&self) -> &'a Network { self.network }

    pub fn build(
        &self,
        access: &AccessEgress,
        parts: &[PathPart],
        egress: &AccessEgress,
        anchor: PathAnchor,
        iteration_time: Timestamp,
    ) -> Result<RaptorPath, PathError> {
        let first_transit = parts.iter().enumerate().find_map(|(i, p)| match *p {
            PathPart::Transit { trip, board_pos, .. } => Some((i, trip, board_pos)),
            PathPart::Transfer(_) => None,
        });

        // Time the passenger is ready at the first stop after the access leg.
        let access_arrival = match (first_transit, anchor) {
            (Some((i, trip, board_pos)), _) => {
                let trip = self.network.get_trip(trip);
                let mut ready = trip.departure(board_pos) - self.slack.board_slack(trip.slack_index());
                if access.has_rides() {
                    ready -= self.slack.transfer_slack;
                }
                for part in parts[..i].iter().rev() {
                    if let PathPart::Transfer(tx) = part {
                        ready -= tx.duration;
                    }
                }
                access
                    .latest_leg_arrival_time(ready)
                    .ok_or(PathError::AccessNotAvailable(access.stop))?
            }
            (None, PathAnchor::Departure(t)) => {
                access.earliest_departure_time(t).ok_or(PathError::AccessNotAvailable(access.stop))? + access.duration
            }
            (None, PathAnchor::Arrival(t)) => {
                let egress_start = egress
                    .latest_leg_arrival_time(t)
                    .ok_or(PathError::EgressNotAvailable(egress.stop))?
                    - egress.duration;
                let transfers: i32 = parts
                    .iter()
                    .map(|p| match p {
                        PathPart::Transfer(tx) => tx.duration,
                        PathPart::Transit { .. } => 0,
                    })
                    .sum();
                let ready = egress_start - if egress.has_rides() { self.slack.transfer_slack } else { 0 } - transfers;
                access
                    .latest_leg_arrival_time(ready)
                    .ok_or(PathError::AccessNotAvailable(access.stop))?
            }
        };

        let start_time = access_arrival - access.duration;
        let mut legs = Vec::with_capacity(parts.len() + 2);
        legs.push(PathLeg::Access { access: access.clone(), departure_time: start_time, arrival_time: access_arrival });

        let tail = self.build_tail(access_arrival, !access.has_rides(), parts, egress)?;
        legs.extend(tail.legs);
        let c1 = access.c1 + tail.c1;
        let end_time = tail.end_time;
        Ok(RaptorPath { legs, start_time, end_time, c1, iteration_time })
    }

    /// Legs and cost from `time` at the first stop of `parts` to the end of the egress leg.
    pub fn build_tail(
        &self,
        time: Timestamp,
        first_boarding: bool,
        parts: &[PathPart],
        egress: &AccessEgress,
    ) -> Result<PathTail, PathError> {
        let mut legs = Vec::with_capacity(parts.len() + 1);
        let mut c1 = 0;
        let mut time = time;
        let mut first_boarding = first_boarding;

        for part in parts {
            match *part {
                PathPart::Transit { trip, board_pos, alight_pos, constraint } => {
                    let schedule = self.network.get_trip(trip);
                    let board_time = schedule.departure(board_pos);
                    let alight_time = schedule.arrival(alight_pos);
                    let alight_slack = self.slack.alight_slack(schedule.slack_index());
                    let leg_c1 = self.cost.boarding_cost(first_boarding, board_time - time, constraint.as_ref())
                        + self.cost.transit_cost(alight_time - board_time, alight_slack);
                    c1 += leg_c1;
                    first_boarding = false;
                    legs.push(PathLeg::Transit(TransitLeg {
                        trip,
                        board_stop: schedule.stop(board_pos),
                        alight_stop: schedule.stop(alight_pos),
                        board_pos,
                        alight_pos,
                        board_time,
                        alight_time,
                        constraint,
                        c1: leg_c1,
                    }));
                    time = alight_time + alight_slack;
                }
                PathPart::Transfer(transfer) => {
                    c1 += transfer.c1;
                    legs.push(PathLeg::Transfer {
                        transfer,
                        departure_time: time,
                        arrival_time: time + transfer.duration,
                    });
                    time += transfer.duration;
                }
            }
        }

        let ready = if egress.has_rides() { time + self.slack.transfer_slack } else { time };
        let egress_start = egress
            .earliest_departure_time(ready)
            .ok_or(PathError::EgressNotAvailable(egress.stop))?;
        c1 += self.cost.egress_cost(egress.c1, egress_start - time);
        let end_time = egress_start + egress.duration;
        legs.push(PathLeg::Egress { egress: egress.clone(), departure_time: egress_start, arrival_time: end_time });

        Ok(PathTail { legs, c1, end_time })
    }
}
