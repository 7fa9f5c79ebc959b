use crate::access_egress::AccessEgress;
use crate::cost::GeneralizedCost;
use crate::network::{GlobalTripIndex, Timestamp};
use crate::path::{PathBuilder, PathPart};
use crate::transfer::TransferConstraint;
use crate::transfer_optimization::generator::TripToTripTransfer;
use crate::transfer_optimization::wait_time_cost::TransferWaitTimeCostCalculator;

/// What every tail of one path shares while it is being optimized.
pub struct TailContext<'a> {
    pub builder: PathBuilder<'a>,
    pub egress: &'a AccessEgress,
    pub wait_time_cost: Option<TransferWaitTimeCostCalculator>,
}

/// The end of a path, from boarding the head trip to the destination. Tails are built backwards, one
/// transit leg and transfer at a time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptimizedPathTail {
    head_trip: GlobalTripIndex,
    head_board_pos: usize,
    head_alight_pos: usize,
    /// Legs after the head transit leg.
    rest: Vec<PathPart>,
    transfers: Vec<TripToTripTransfer>,
    c1: GeneralizedCost,
    priority_cost: i32,
    wait_time_cost: i32,
    break_tie_cost: i32,
}

impl OptimizedPathTail {
    /// A tail with the last transit leg of a path, followed by the legs leading to the egress.
    pub fn new(head_trip: GlobalTripIndex, board_pos: usize, alight_pos: usize, rest: Vec<PathPart>) -> Self {
        Self {
            head_trip,
            head_board_pos: board_pos,
            head_alight_pos: alight_pos,
            rest,
            transfers: Vec::new(),
            c1: 0,
            priority_cost: 0,
            wait_time_cost: 0,
            break_tie_cost: 0,
        }
    }

    pub fn head_trip(&self) -> GlobalTripIndex { self.head_trip }

    pub fn head_board_pos(&self) -> usize { self.head_board_pos }

    pub fn head_alight_pos(&self) -> usize { self.head_alight_pos }

    pub fn transfers(&self) -> &[TripToTripTransfer] { &self.transfers }

    /// Cost from boarding the head trip to the destination, without the boarding cost of the head.
    pub fn c1(&self) -> GeneralizedCost { self.c1 }

    pub fn priority_cost(&self) -> i32 { self.priority_cost }

    pub fn wait_time_cost(&self) -> i32 { self.wait_time_cost }

    /// Earlier transfers win ties.
    pub fn break_tie_cost(&self) -> i32 { self.break_tie_cost }

    /// The parts of the tail, starting with the head transit leg.
    pub fn parts(&self) -> Vec<PathPart> {
        let mut parts = Vec::with_capacity(self.rest.len() + 1);
        parts.push(PathPart::Transit {
            trip: self.head_trip,
            board_pos: self.head_board_pos,
            alight_pos: self.head_alight_pos,
            constraint: None,
        });
        parts.extend_from_slice(&self.rest);
        parts
    }

    /// Moves the boarding of the head trip and recalculates the cost. `None` if the egress can not be
    /// reached.
    pub fn board_at(&self, ctx: &TailContext, board_pos: usize) -> Option<Self> {
        let mut tail = self.clone();
        tail.head_board_pos = board_pos;
        tail.update_c1(ctx)?;
        Some(tail)
    }

    fn update_c1(&mut self, ctx: &TailContext) -> Option<()> {
        let parts = self.parts();
        let trip = ctx.builder.network().get_trip(self.head_trip);
        let board_time: Timestamp = trip.departure(self.head_board_pos);
        let tail = ctx.builder.build_tail(board_time, false, &parts, ctx.egress).ok()?;
        self.c1 = tail.c1;
        Some(())
    }

    /// A new tail riding `from_trip` to the transfer, then continuing with this tail boarded at the
    /// transfer. The new head is boarded at `from_board_pos` until it is moved.
    pub fn add_transit_and_transfer(
        &self,
        ctx: &TailContext,
        from_trip: GlobalTripIndex,
        from_board_pos: usize,
        tx: &TripToTripTransfer,
    ) -> Self {
        let mut rest = Vec::with_capacity(self.rest.len() + 2);
        if let Some(walk) = tx.transfer {
            rest.push(PathPart::Transfer(walk));
        }
        rest.push(PathPart::Transit {
            trip: self.head_trip,
            board_pos: tx.to.stop_pos,
            alight_pos: self.head_alight_pos,
            constraint: tx.constraint,
        });
        rest.extend_from_slice(&self.rest);

        let mut transfers = Vec::with_capacity(self.transfers.len() + 1);
        transfers.push(*tx);
        transfers.extend_from_slice(&self.transfers);

        let constraint = tx.constraint.unwrap_or(TransferConstraint::REGULAR);
        let wait_time_cost = ctx.wait_time_cost.map_or(0, |calc| calc.cost(tx.wait_time()));

        Self {
            head_trip: from_trip,
            head_board_pos: from_board_pos,
            head_alight_pos: tx.from.stop_pos,
            rest,
            transfers,
            c1: self.c1,
            priority_cost: self.priority_cost + constraint.priority_cost(),
            wait_time_cost: self.wait_time_cost + wait_time_cost,
            break_tie_cost: self.break_tie_cost + tx.from.time,
        }
    }
}
