use std::fmt::Display;

use crate::cost::GeneralizedCost;
use crate::network::{GlobalTripIndex, StopIndex};
use crate::utils;

/// A street (walking) transfer between two stops with a precomputed duration and cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub from_stop: StopIndex,
    pub to_stop: StopIndex,
    pub duration: i32,
    pub c1: GeneralizedCost,
}

impl Display for Transfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Walk {} ${} ~ {}", utils::get_duration_str(self.duration), self.c1, self.to_stop)
    }
}

/// Priority of a constrained transfer. The variants are ordered from worst to best.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TransferPriority {
    NotAllowed,
    Allowed,
    Recommended,
    Preferred,
}

impl TransferPriority {
    /// Cost used when ranking transfers, lower is better.
    pub const fn cost(self) -> i32 {
        match self {
            TransferPriority::NotAllowed => 1_000_000,
            TransferPriority::Allowed => 40,
            TransferPriority::Recommended => 30,
            TransferPriority::Preferred => 20,
        }
    }
}

const STAY_SEATED_COST: i32 = 0;
const GUARANTEED_COST: i32 = 10;

/// Constraints attached to a transfer between two specific trips.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TransferConstraint {
    pub priority: TransferPriority,
    pub guaranteed: bool,
    pub stay_seated: bool,
    pub max_wait_time: Option<i32>,
    pub min_transfer_time: Option<i32>,
}

impl TransferConstraint {
    /// The constraint of a transfer nobody has said anything about.
    pub const REGULAR: TransferConstraint = TransferConstraint {
        priority: TransferPriority::Allowed,
        guaranteed: false,
        stay_seated: false,
        max_wait_time: None,
        min_transfer_time: None,
    };

    pub const fn with_priority(priority: TransferPriority) -> Self {
        TransferConstraint { priority, ..Self::REGULAR }
    }

    pub const fn not_allowed() -> Self {
        Self::with_priority(TransferPriority::NotAllowed)
    }

    pub const fn guaranteed() -> Self {
        TransferConstraint { guaranteed: true, ..Self::REGULAR }
    }

    pub const fn stay_seated() -> Self {
        TransferConstraint { stay_seated: true, ..Self::REGULAR }
    }

    pub const fn min_transfer_time(seconds: i32) -> Self {
        TransferConstraint { min_transfer_time: Some(seconds), ..Self::REGULAR }
    }

    pub const fn and_max_wait_time(mut self, seconds: i32) -> Self {
        self.max_wait_time = Some(seconds);
        self
    }

    pub const fn is_not_allowed(&self) -> bool {
        matches!(self.priority, TransferPriority::NotAllowed)
    }

    /// Guaranteed and stay-seated transfers are forced choices, they do not need any slack.
    pub const fn is_facilitated(&self) -> bool {
        self.guaranteed || self.stay_seated
    }

    pub fn is_regular(&self) -> bool {
        *self == Self::REGULAR
    }

    /// A facilitated transfer only holds if the wait does not exceed the max-wait-time.
    pub fn is_facilitated_for_wait(&self, wait_time: i32) -> bool {
        self.is_facilitated() && self.max_wait_time.map_or(true, |max| wait_time <= max)
    }

    /// Ranking cost, lower is better. Stay-seated and guaranteed outrank every priority.
    pub const fn priority_cost(&self) -> i32 {
        if self.stay_seated {
            STAY_SEATED_COST
        } else if self.guaranteed {
            GUARANTEED_COST
        } else {
            self.priority.cost()
        }
    }
}

impl Default for TransferConstraint {
    fn default() -> Self {
        Self::REGULAR
    }
}

impl Display for TransferConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.stay_seated {
            write!(f, "STAY_SEATED")?;
        } else if self.guaranteed {
            write!(f, "GUARANTEED")?;
        } else {
            let name = match self.priority {
                TransferPriority::NotAllowed => "NOT_ALLOWED",
                TransferPriority::Allowed => "ALLOWED",
                TransferPriority::Recommended => "RECOMMENDED",
                TransferPriority::Preferred => "PREFERRED",
            };
            write!(f, "{name}")?;
        }
        if let Some(min) = self.min_transfer_time {
            write!(f, " minTransferTime: {}", utils::get_duration_str(min))?;
        }
        if let Some(max) = self.max_wait_time {
            write!(f, " maxWaitTime: {}", utils::get_duration_str(max))?;
        }
        Ok(())
    }
}

/// A position in a specific trip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TripStopPos {
    pub trip: GlobalTripIndex,
    pub stop_pos: usize,
}

impl TripStopPos {
    pub const fn new(trip: GlobalTripIndex, stop_pos: usize) -> Self {
        Self { trip, stop_pos }
    }
}

/// A constraint bound to a trip-to-trip transfer. Overrides the default transfer between the two stops.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConstrainedTransfer {
    pub from: TripStopPos,
    pub to: TripStopPos,
    pub constraint: TransferConstraint,
}
