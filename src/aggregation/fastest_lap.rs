use std::time::Duration;

use itertools::Itertools;
use log::debug;

use crate::{
    PaddockError,
    session::{Lap, SessionData},
};

/// A driver's fastest lap and its gap to the session's fastest lap.
#[derive(Clone, Debug, PartialEq)]
pub struct LapDelta {
    pub driver: String,
    pub team: String,
    pub lap_number: u32,
    pub lap_time: Duration,
    pub delta: Duration,
}

/// The lap with the minimum lap time for a driver. Laps without a recorded time are ignored.
pub fn fastest_lap<'a>(laps: impl IntoIterator<Item = &'a Lap>, driver: &str) -> Result<&'a Lap, PaddockError> {
    laps.into_iter()
        .filter(|lap| lap.driver == driver && lap.lap_time.is_some())
        .min_by_key(|lap| lap.lap_time)
        .ok_or_else(|| PaddockError::NoValidLap {
            driver: driver.to_string(),
        })
}

/// Fastest lap per driver, sorted ascending, with the gap to the first entry (the pole lap).
/// Drivers without a timed lap are left out; the aggregation only fails when nobody set a time.
pub fn qualifying_deltas(session: &SessionData) -> Result<Vec<LapDelta>, PaddockError> {
    let fastest_laps = session
        .lap_drivers()
        .iter()
        .filter_map(|driver| match fastest_lap(&session.laps, driver) {
            Ok(lap) => Some(lap),
            Err(e) => {
                debug!("Skipping driver in qualifying delta: {}", e);
                None
            }
        })
        .sorted_by_key(|lap| lap.lap_time)
        .collect_vec();

    let pole_time = fastest_laps
        .first()
        .and_then(|lap| lap.lap_time)
        .ok_or_else(|| PaddockError::NoValidLap {
            driver: "any driver".to_string(),
        })?;

    Ok(fastest_laps
        .into_iter()
        .filter_map(|lap| {
            let lap_time = lap.lap_time?;
            Some(LapDelta {
                driver: lap.driver.clone(),
                team: lap.team.clone(),
                lap_number: lap.lap_number,
                lap_time,
                delta: lap_time - pole_time,
            })
        })
        .collect())
}
