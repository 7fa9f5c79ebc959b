use crate::calculator::TransitCalculator;
use crate::cost::GeneralizedCost;
use crate::network::{GlobalTripIndex, StopIndex, Timestamp, TripIndex};
use crate::request::RaptorProfile;
use crate::transfer::TransferConstraint;

/// Decides whether the left element is better than the right one in at least one criterion.
pub trait ParetoComparator<T> {
    fn left_dominance_exist(&self, left: &T, right: &T) -> bool;
}

impl<T, F: Fn(&T, &T) -> bool> ParetoComparator<T> for F {
    fn left_dominance_exist(&self, left: &T, right: &T) -> bool {
        self(left, right)
    }
}

/// A set of elements where no element dominates another. An element equal to an existing one in every
/// criterion is rejected, so the first one added wins.
#[derive(Clone, Debug)]
pub struct ParetoSet<T, C> {
    elements: Vec<T>,
    comparator: C,
}

impl<T, C: ParetoComparator<T>> ParetoSet<T, C> {
    pub const fn new(comparator: C) -> Self {
        Self { elements: Vec::new(), comparator }
    }

    /// Adds an element to the set, discarding the elements it dominates.
    /// Returns true if the element was added <=> the set was modified.
    pub fn add(&mut self, new_element: T) -> bool {
        let cmp = &self.comparator;

        // Check if the new element is dominated by, or equal to, any existing element.
        if self.elements.iter().any(|e| !cmp.left_dominance_exist(&new_element, e)) {
            return false;
        }

        // Remove dominated elements.
        self.elements
            .retain(|e| cmp.left_dominance_exist(e, &new_element));
        self.elements.push(new_element);
        true
    }

    /// Like [`add`](Self::add), but also calls `removed` for each element the new one pushes out.
    pub fn add_and_notify(&mut self, new_element: T, mut removed: impl FnMut(&T)) -> bool {
        let cmp = &self.comparator;
        if self.elements.iter().any(|e| !cmp.left_dominance_exist(&new_element, e)) {
            return false;
        }
        self.elements.retain(|e| {
            let keep = cmp.left_dominance_exist(e, &new_element);
            if !keep {
                removed(e);
            }
            keep
        });
        self.elements.push(new_element);
        true
    }

    /// True if the element would be added.
    pub fn qualify(&self, element: &T) -> bool {
        self.elements
            .iter()
            .all(|e| self.comparator.left_dominance_exist(element, e))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> { self.elements.iter() }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> { self.elements.iter_mut() }

    pub fn len(&self) -> usize { self.elements.len() }

    pub fn is_empty(&self) -> bool { self.elements.is_empty() }

    pub fn clear(&mut self) { self.elements.clear() }

    pub fn as_slice(&self) -> &[T] { &self.elements }

    pub fn into_vec(self) -> Vec<T> { self.elements }
}

/// Index of a [`StopArrival`] in the per-search arena.
pub type ArrivalIndex = usize;

/// How a stop was reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrivalKind {
    /// By an access leg, `access_idx` indexes the legs of the search. `departure_time` is when the leg starts.
    Access { access_idx: usize, departure_time: Timestamp },
    /// By riding `trip` from `board_pos` to `alight_pos`, both in search order. The constraint is set when the
    /// boarding used a constrained transfer.
    Transit {
        trip: GlobalTripIndex,
        board_pos: usize,
        alight_pos: usize,
        board_time: Timestamp,
        constraint: Option<TransferConstraint>,
    },
    /// By a street transfer from `from_stop`.
    Transfer { from_stop: StopIndex, duration: i32, c1: GeneralizedCost },
}

/// A label: one way to reach a stop. Labels form a tree through `parent`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StopArrival {
    pub stop: StopIndex,
    /// Arrival time in search order, alight slack included for transit arrivals.
    pub time: Timestamp,
    /// Number of rides so far, including rides inside an access leg.
    pub rides: usize,
    pub c1: GeneralizedCost,
    pub c2: u32,
    pub arrived_on_board: bool,
    /// Time penalty of the access leg, excluded when comparing with a hard arrival limit.
    pub time_penalty: i32,
    pub kind: ArrivalKind,
    pub parent: Option<ArrivalIndex>,
}

impl StopArrival {
    pub fn transit_trip(&self) -> Option<GlobalTripIndex> {
        match self.kind {
            ArrivalKind::Transit { trip, .. } => Some(trip),
            _ => None,
        }
    }

    pub fn is_transit(&self) -> bool { matches!(self.kind, ArrivalKind::Transit { .. }) }
}

/// The criteria of a label, copied into a bag so that bags can be compared without the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArrivalRef {
    pub idx: ArrivalIndex,
    pub time: Timestamp,
    pub rides: usize,
    pub c1: GeneralizedCost,
    pub c2: u32,
    pub arrived_on_board: bool,
}

impl ArrivalRef {
    pub fn new(idx: ArrivalIndex, arrival: &StopArrival) -> Self {
        Self {
            idx,
            time: arrival.time,
            rides: arrival.rides,
            c1: arrival.c1,
            c2: arrival.c2,
            arrived_on_board: arrival.arrived_on_board,
        }
    }
}

/// Dominance of stop arrivals. A walking arrival never dominates an arrival on board, so both survive and
/// the on-board one can still continue with a transfer.
#[derive(Clone, Copy, Debug)]
pub struct StopArrivalComparator<T: TransitCalculator> {
    calculator: T,
    include_cost: bool,
}

impl<T: TransitCalculator> StopArrivalComparator<T> {
    pub fn new(calculator: T, profile: RaptorProfile) -> Self {
        Self { calculator, include_cost: profile.is_multi_criteria() }
    }
}

impl<T: TransitCalculator> ParetoComparator<ArrivalRef> for StopArrivalComparator<T> {
    fn left_dominance_exist(&self, l: &ArrivalRef, r: &ArrivalRef) -> bool {
        self.calculator.is_before(l.time, r.time)
            || l.rides < r.rides
            || (l.arrived_on_board && !r.arrived_on_board)
            || (self.include_cost && (l.c1 < r.c1 || l.c2 < r.c2))
    }
}

pub type StopBag<T> = ParetoSet<ArrivalRef, StopArrivalComparator<T>>;

/// A boarding kept while a route is scanned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteBoarding {
    pub boarding: ArrivalIndex,
    pub trip_idx: TripIndex,
    pub board_pos: usize,
    pub board_time: Timestamp,
    /// Cost after boarding, waiting included.
    pub c1: GeneralizedCost,
    /// `c1` minus the transit cost up to the board time, comparable between boardings at different stops.
    pub relative_c1: GeneralizedCost,
    pub c2: u32,
    pub constraint: Option<TransferConstraint>,
}

/// Dominance of boardings on the same route: a better trip, a lower relative cost or a lower c2.
#[derive(Clone, Copy, Debug)]
pub struct RouteBoardingComparator<T: TransitCalculator> {
    calculator: T,
    include_cost: bool,
}

impl<T: TransitCalculator> RouteBoardingComparator<T> {
    pub fn new(calculator: T, profile: RaptorProfile) -> Self {
        Self { calculator, include_cost: profile.is_multi_criteria() }
    }
}

impl<T: TransitCalculator> ParetoComparator<RouteBoarding> for RouteBoardingComparator<T> {
    fn left_dominance_exist(&self, l: &RouteBoarding, r: &RouteBoarding) -> bool {
        self.calculator.is_better_trip(l.trip_idx, r.trip_idx)
            || (self.include_cost && (l.relative_c1 < r.relative_c1 || l.c2 < r.c2))
    }
}

pub type RouteBag<T> = ParetoSet<RouteBoarding, RouteBoardingComparator<T>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::{ForwardCalculator, ReverseCalculator};

    #[derive(Clone, Copy, Debug, PartialEq)]
    struct Vector(i32, i32);

    fn cmp(l: &Vector, r: &Vector) -> bool {
        l.0 < r.0 || l.1 < r.1
    }

    #[test]
    fn pareto_set_keeps_non_dominated() {
        let mut set = ParetoSet::new(cmp);
        assert!(set.add(Vector(5, 5)));
        assert!(set.add(Vector(3, 7)));
        assert!(!set.add(Vector(6, 6)));
        assert!(set.add(Vector(4, 4)));
        assert_eq!(set.as_slice(), &[Vector(3, 7), Vector(4, 4)]);
    }

    #[test]
    fn pareto_set_rejects_equal() {
        let mut set = ParetoSet::new(cmp);
        assert!(set.add(Vector(1, 1)));
        assert!(!set.add(Vector(1, 1)));
        assert_eq!(set.len(), 1);
        assert!(!set.qualify(&Vector(2, 1)));
        assert!(set.qualify(&Vector(0, 9)));
    }

    #[test]
    fn add_and_notify_reports_removed() {
        let mut set = ParetoSet::new(cmp);
        set.add(Vector(5, 5));
        set.add(Vector(2, 8));
        let mut removed = Vec::new();
        assert!(set.add_and_notify(Vector(1, 1), |v| removed.push(*v)));
        assert_eq!(removed, vec![Vector(5, 5), Vector(2, 8)]);
        assert_eq!(set.into_vec(), vec![Vector(1, 1)]);
    }

    fn arrival(time: Timestamp, rides: usize, c1: GeneralizedCost, on_board: bool) -> ArrivalRef {
        ArrivalRef { idx: 0, time, rides, c1, c2: 0, arrived_on_board: on_board }
    }

    #[test]
    fn standard_bag_ignores_cost() {
        let mut bag = StopBag::new(StopArrivalComparator::new(ForwardCalculator, RaptorProfile::Standard));
        assert!(bag.add(arrival(100, 1, 500, true)));
        assert!(!bag.add(arrival(100, 1, 10, true)));
        assert!(bag.add(arrival(90, 2, 10, true)));
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn multi_criteria_bag_keeps_cheaper() {
        let mut bag = StopBag::new(StopArrivalComparator::new(ForwardCalculator, RaptorProfile::MultiCriteria));
        assert!(bag.add(arrival(100, 1, 500, true)));
        assert!(bag.add(arrival(110, 1, 400, true)));
        assert!(!bag.add(arrival(110, 1, 450, true)));
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn walking_never_dominates_on_board() {
        let mut bag = StopBag::new(StopArrivalComparator::new(ForwardCalculator, RaptorProfile::Standard));
        assert!(bag.add(arrival(100, 1, 0, true)));
        assert!(!bag.add(arrival(101, 1, 0, false)));
        assert!(bag.add(arrival(99, 1, 0, false)));
        assert_eq!(bag.len(), 2);
    }

    #[test]
    fn reverse_bag_prefers_later_times() {
        let mut bag = StopBag::new(StopArrivalComparator::new(ReverseCalculator, RaptorProfile::Standard));
        assert!(bag.add(arrival(100, 1, 0, true)));
        assert!(bag.add(arrival(110, 1, 0, true)));
        assert_eq!(bag.as_slice()[0].time, 110);
    }

    #[test]
    fn route_bag_prefers_better_trip() {
        let boarding = |trip_idx, relative_c1| RouteBoarding {
            boarding: 0,
            trip_idx,
            board_pos: 0,
            board_time: 0,
            c1: relative_c1,
            relative_c1,
            c2: 0,
            constraint: None,
        };
        let mut bag = RouteBag::new(RouteBoardingComparator::new(ForwardCalculator, RaptorProfile::Standard));
        assert!(bag.add(boarding(3, 100)));
        assert!(bag.add(boarding(2, 500)));
        assert!(!bag.add(boarding(2, 50)));
        assert_eq!(bag.len(), 1);

        let mut bag = RouteBag::new(RouteBoardingComparator::new(ForwardCalculator, RaptorProfile::MultiCriteria));
        assert!(bag.add(boarding(3, 100)));
        assert!(bag.add(boarding(2, 500)));
        assert_eq!(bag.len(), 2);
    }
}
