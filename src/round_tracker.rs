/// Keeps track of the current round and of how many rounds the search may still run.
///
/// Round 0 is the access arrival, round 1 the first transit boarding. Once the destination is reached
/// in round `r`, the search continues at most `number_of_additional_transfers` rounds after it.
#[derive(Debug, Clone)]
pub struct RoundTracker {
    round: usize,
    round_max_limit: usize,
    number_of_additional_transfers: usize,
}

impl RoundTracker {
    /// `max_transfers` is the number of transfers allowed. One round is used by the access and one per ride.
    pub fn new(max_transfers: usize, number_of_additional_transfers: usize) -> Self {
        Self {
            round: 0,
            round_max_limit: max_transfers + 2,
            number_of_additional_transfers,
        }
    }

    pub fn round(&self) -> usize { self.round }

    pub fn round_max_limit(&self) -> usize { self.round_max_limit }

    pub fn has_more_rounds(&self) -> bool { self.round + 1 < self.round_max_limit }

    pub fn next_round(&mut self) -> usize {
        self.round += 1;
        self.round
    }

    pub fn setup_iteration(&mut self) {
        self.round = 0;
    }

    pub fn round_complete(&mut self, destination_reached: bool) {
        if destination_reached {
            self.round_max_limit = self
                .round_max_limit
                .min(self.round + self.number_of_additional_transfers + 1);
        }
    }
}
