use std::cmp::Ordering;

use crate::transfer_optimization::tail::OptimizedPathTail;

/// Keeps the tails with the lowest cost, applying the criteria one after the other: transfer priority,
/// generalized cost, wait-time cost and finally the break-tie cost.
#[derive(Clone, Copy, Debug)]
pub struct PathTailFilter {
    transfer_priority: bool,
    wait_time: bool,
}

impl PathTailFilter {
    pub fn new(transfer_priority: bool, wait_time: bool) -> Self {
        Self { transfer_priority, wait_time }
    }

    fn compare(&self, l: &OptimizedPathTail, r: &OptimizedPathTail) -> Ordering {
        let priority = if self.transfer_priority { l.priority_cost().cmp(&r.priority_cost()) } else { Ordering::Equal };
        let wait_time = if self.wait_time { l.wait_time_cost().cmp(&r.wait_time_cost()) } else { Ordering::Equal };
        priority
            .then(l.c1().cmp(&r.c1()))
            .then(wait_time)
            .then(l.break_tie_cost().cmp(&r.break_tie_cost()))
    }

    pub fn filter(&self, tails: Vec<OptimizedPathTail>) -> Vec<OptimizedPathTail> {
        let mut result: Vec<OptimizedPathTail> = Vec::new();
        for tail in tails {
            match result.first().map(|best| self.compare(&tail, best)) {
                Some(Ordering::Greater) => {}
                Some(Ordering::Equal) => result.push(tail),
                Some(Ordering::Less) | None => {
                    result.clear();
                    result.push(tail);
                }
            }
        }
        result
    }
}
