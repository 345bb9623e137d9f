use std::time::Duration;

use crate::{PaddockError, session::SessionData};

use super::fastest_lap::fastest_lap;

/// Telemetry of a driver's fastest lap, indexed by distance.
#[derive(Clone, Debug, PartialEq)]
pub struct DriverTrace {
    pub driver: String,
    pub team: String,
    pub lap_number: u32,
    pub lap_time: Duration,
    /// `[distance (m), speed (km/h)]`
    pub speed: Vec<[f64; 2]>,
    /// `[distance (m), throttle (%)]`
    pub throttle: Vec<[f64; 2]>,
    /// `[distance (m), 1 when braking else 0]`
    pub brake: Vec<[f64; 2]>,
}

fn fastest_lap_trace(session: &SessionData, driver: &str) -> Result<DriverTrace, PaddockError> {
    let lap = fastest_lap(&session.laps, driver)?;
    let samples = session
        .telemetry(driver, lap.lap_number)
        .filter(|samples| !samples.is_empty())
        .ok_or_else(|| PaddockError::NoTelemetry {
            driver: driver.to_string(),
            lap_number: lap.lap_number,
        })?;

    Ok(DriverTrace {
        driver: driver.to_string(),
        team: lap.team.clone(),
        lap_number: lap.lap_number,
        lap_time: lap.lap_time.unwrap_or_default(),
        speed: samples.iter().map(|s| [s.distance_m, s.speed_kph]).collect(),
        throttle: samples.iter().map(|s| [s.distance_m, s.throttle_pct]).collect(),
        brake: samples
            .iter()
            .map(|s| [s.distance_m, if s.brake { 1. } else { 0. }])
            .collect(),
    })
}

/// Fastest lap telemetry of two different drivers of the session.
pub fn head_to_head(
    session: &SessionData,
    driver1: &str,
    driver2: &str,
) -> Result<[DriverTrace; 2], PaddockError> {
    let drivers = session.lap_drivers();
    let known = |driver: &str| drivers.iter().any(|d| d == driver);
    if driver1.is_empty() || driver1 == driver2 || !known(driver1) || !known(driver2) {
        return Err(PaddockError::InvalidDriverSelection);
    }
    Ok([
        fastest_lap_trace(session, driver1)?,
        fastest_lap_trace(session, driver2)?,
    ])
}
