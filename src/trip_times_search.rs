use thiserror::Error;

use crate::network::{StopIndex, Timestamp, TripSchedule};
use crate::utils;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TripTimesSearchError {
    #[error("No stops matching 'fromStop' found in trip '{trip}'. Search: {from_stop} -> {to_stop} at {time}.")]
    BoardStopNotFound { trip: String, from_stop: StopIndex, to_stop: StopIndex, time: String },
    #[error("No stops matching 'toStop' found in trip '{trip}'. Search: {from_stop} -> {to_stop} at {time}.")]
    AlightStopNotFound { trip: String, from_stop: StopIndex, to_stop: StopIndex, time: String },
}

impl TripTimesSearchError {
    fn board(trip: &TripSchedule, from_stop: StopIndex, to_stop: StopIndex, time: Timestamp) -> Self {
        Self::BoardStopNotFound { trip: trip.id.to_string(), from_stop, to_stop, time: utils::get_time_str(time) }
    }

    fn alight(trip: &TripSchedule, from_stop: StopIndex, to_stop: StopIndex, time: Timestamp) -> Self {
        Self::AlightStopNotFound { trip: trip.id.to_string(), from_stop, to_stop, time: utils::get_time_str(time) }
    }
}

/// Board and alight positions of a ride, with the scheduled times at those positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardAndAlightTime {
    pub board_pos: usize,
    pub alight_pos: usize,
    pub board_time: Timestamp,
    pub alight_time: Timestamp,
}

impl BoardAndAlightTime {
    pub fn new(trip: &TripSchedule, board_pos: usize, alight_pos: usize) -> Self {
        Self {
            board_pos,
            alight_pos,
            board_time: trip.departure(board_pos),
            alight_time: trip.arrival(alight_pos),
        }
    }
}

/// Boards at the first visit of `from_stop` departing at or after `earliest_departure_time`, and alights at
/// the first visit of `to_stop` after that.
pub fn find_trip_times_after(
    trip: &TripSchedule,
    from_stop: StopIndex,
    to_stop: StopIndex,
    earliest_departure_time: Timestamp,
) -> Result<BoardAndAlightTime, TripTimesSearchError> {
    let board_pos = (0..trip.num_stops())
        .find(|&pos| trip.stop(pos) == from_stop && trip.departure(pos) >= earliest_departure_time)
        .ok_or_else(|| TripTimesSearchError::board(trip, from_stop, to_stop, earliest_departure_time))?;

    let alight_pos = trip
        .find_stop_pos_after(board_pos + 1, to_stop)
        .ok_or_else(|| TripTimesSearchError::alight(trip, from_stop, to_stop, earliest_departure_time))?;

    Ok(BoardAndAlightTime::new(trip, board_pos, alight_pos))
}

/// Alights at the last visit of `to_stop` arriving at or before `latest_arrival_time`, and boards at the last
/// visit of `from_stop` before that.
pub fn find_trip_times_before(
    trip: &TripSchedule,
    from_stop: StopIndex,
    to_stop: StopIndex,
    latest_arrival_time: Timestamp,
) -> Result<BoardAndAlightTime, TripTimesSearchError> {
    let alight_pos = (0..trip.num_stops())
        .rev()
        .find(|&pos| trip.stop(pos) == to_stop && trip.arrival(pos) <= latest_arrival_time)
        .ok_or_else(|| TripTimesSearchError::alight(trip, from_stop, to_stop, latest_arrival_time))?;

    let board_pos = trip
        .find_stop_pos_before(alight_pos, from_stop)
        .ok_or_else(|| TripTimesSearchError::board(trip, from_stop, to_stop, latest_arrival_time))?;

    Ok(BoardAndAlightTime::new(trip, board_pos, alight_pos))
}

/// Finds the ride closest to an approximate board time, for when no exact bound is known.
///
/// Only meant for debugging and logging. Path mapping must use [`find_trip_times_after`] or
/// [`find_trip_times_before`].
pub fn find_trip_by_approximate_time(
    trip: &TripSchedule,
    from_stop: StopIndex,
    to_stop: StopIndex,
    approximate_time: Timestamp,
) -> Result<BoardAndAlightTime, TripTimesSearchError> {
    let mut board_pos = trip
        .find_stop_pos_after(0, from_stop)
        .ok_or_else(|| TripTimesSearchError::board(trip, from_stop, to_stop, approximate_time))?;
    let mut alight_pos = trip
        .find_stop_pos_after(board_pos + 1, to_stop)
        .ok_or_else(|| TripTimesSearchError::alight(trip, from_stop, to_stop, approximate_time))?;

    // A loop pattern may visit the stops again, take a later visit if it is closer to the time.
    loop {
        let Some(next_board) = trip.find_stop_pos_after(board_pos + 1, from_stop) else {
            break;
        };
        let Some(next_alight) = trip.find_stop_pos_after(next_board + 1, to_stop) else {
            break;
        };
        let best_diff = (trip.departure(board_pos) - approximate_time).abs();
        let next_diff = (trip.departure(next_board) - approximate_time).abs();
        let ride_time = trip.arrival(alight_pos) - trip.departure(board_pos);
        let total_time = trip.arrival(next_alight) - trip.departure(board_pos);

        if next_diff < best_diff && total_time < 4 * ride_time {
            board_pos = next_board;
            alight_pos = next_alight;
        } else {
            break;
        }
    }
    Ok(BoardAndAlightTime::new(trip, board_pos, alight_pos))
}
