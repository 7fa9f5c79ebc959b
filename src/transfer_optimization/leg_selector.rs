use crate::transfer_optimization::filter::PathTailFilter;
use crate::transfer_optimization::tail::{OptimizedPathTail, TailContext};

/// Selects the best tails that can be boarded at a stop position. Positions are expected in decreasing
/// order, each call then only adds the tails that became boardable.
pub struct TransitPathLegSelector<'a, 'b> {
    ctx: &'b TailContext<'a>,
    filter: PathTailFilter,
    /// Sorted on the alight position of the head, latest first.
    remaining: Vec<OptimizedPathTail>,
    next: usize,
    last_board_pos: Option<usize>,
}

impl<'a, 'b> TransitPathLegSelector<'a, 'b> {
    pub fn new(ctx: &'b TailContext<'a>, filter: PathTailFilter, mut tails: Vec<OptimizedPathTail>) -> Self {
        tails.sort_by(|a, b| b.head_alight_pos().cmp(&a.head_alight_pos()));
        Self { ctx, filter, remaining: tails, next: 0, last_board_pos: None }
    }

    /// The best tails whose head trip can be boarded at `board_pos`, boarded there. Empty when no tail
    /// alights after the position.
    pub fn next(&mut self, board_pos: usize) -> Vec<OptimizedPathTail> {
        if self.last_board_pos.is_some_and(|last| board_pos > last) {
            self.next = 0;
        }
        self.last_board_pos = Some(board_pos);

        while self.next < self.remaining.len() && self.remaining[self.next].head_alight_pos() > board_pos {
            self.next += 1;
        }
        let boarded = self.remaining[..self.next]
            .iter()
            .filter_map(|tail| tail.board_at(self.ctx, board_pos))
            .collect();
        self.filter.filter(boarded)
    }
}
