use std::time::Duration;

use itertools::Itertools;
use log::debug;

use crate::session::{SessionData, TelemetrySample};

pub const FIRST_TARGET_KPH: f64 = 100.;
pub const SECOND_TARGET_KPH: f64 = 200.;
const OPENING_LAP: u32 = 1;

/// Standing start acceleration of one driver. All times are relative to the start of the lap.
#[derive(Clone, Debug, PartialEq)]
pub struct AccelerationInterval {
    pub driver: String,
    pub team: String,
    /// Time of the lowest speed before launch
    pub start: Duration,
    pub at_100: Duration,
    pub at_200: Duration,
}

impl AccelerationInterval {
    pub fn zero_to_100(&self) -> Duration {
        self.at_100.saturating_sub(self.start)
    }

    pub fn hundred_to_200(&self) -> Duration {
        self.at_200.saturating_sub(self.at_100)
    }

    pub fn total(&self) -> Duration {
        self.zero_to_100() + self.hundred_to_200()
    }
}

/// The acceleration phase of a trace: from the first minimum speed up to and including the
/// first sample slower than its predecessor, or to the end when the car never slows down.
pub fn acceleration_window(samples: &[TelemetrySample]) -> &[TelemetrySample] {
    let Some(start) = samples
        .iter()
        .position_min_by(|a, b| a.speed_kph.total_cmp(&b.speed_kph))
    else {
        return &[];
    };

    let end = (start + 1..samples.len())
        .find(|&i| samples[i].speed_kph < samples[i - 1].speed_kph)
        .unwrap_or(samples.len() - 1);
    &samples[start..=end]
}

/// Time at which the window first reaches `target_kph`, interpolated linearly between the
/// first sample at or above the target and the sample before it. `None` when the target is
/// never reached or no sample below it precedes the crossing.
pub fn crossing_time(window: &[TelemetrySample], target_kph: f64) -> Option<Duration> {
    let after_idx = window.iter().position(|s| s.speed_kph >= target_kph)?;
    if after_idx == 0 {
        return None;
    }
    let before = &window[after_idx - 1];
    let after = &window[after_idx];

    if after.speed_kph == target_kph {
        return Some(after.time);
    }
    if after.speed_kph == before.speed_kph {
        return Some(before.time);
    }

    let speed_ratio = (target_kph - before.speed_kph) / (after.speed_kph - before.speed_kph);
    Some(before.time + (after.time - before.time).mul_f64(speed_ratio))
}

/// Extract the 0-100 and 100-200 km/h crossings from a driver's opening lap telemetry.
pub fn acceleration_interval(
    driver: &str,
    team: &str,
    samples: &[TelemetrySample],
) -> Option<AccelerationInterval> {
    let window = acceleration_window(samples);
    let start = window.first()?.time;
    let at_100 = crossing_time(window, FIRST_TARGET_KPH);
    let at_200 = crossing_time(window, SECOND_TARGET_KPH);
    match (at_100, at_200) {
        (Some(at_100), Some(at_200)) => Some(AccelerationInterval {
            driver: driver.to_string(),
            team: team.to_string(),
            start,
            at_100,
            at_200,
        }),
        _ => {
            debug!(
                "{} never crossed {}/{} km/h during the launch: {:?} / {:?}",
                driver, FIRST_TARGET_KPH, SECOND_TARGET_KPH, at_100, at_200
            );
            None
        }
    }
}

/// Sort by total time, then by 0-100 time.
pub fn rank_acceleration(intervals: Vec<AccelerationInterval>) -> Vec<AccelerationInterval> {
    intervals
        .into_iter()
        .sorted_by(|a, b| {
            a.total()
                .cmp(&b.total())
                .then_with(|| a.zero_to_100().cmp(&b.zero_to_100()))
        })
        .collect()
}

/// Ranked launch times for every driver with usable opening lap telemetry. Drivers without
/// telemetry or without both crossings are left out.
pub fn race_start_acceleration(session: &SessionData) -> Vec<AccelerationInterval> {
    let drivers = if session.drivers.is_empty() {
        session.lap_drivers()
    } else {
        session
            .drivers
            .iter()
            .map(|d| d.abbreviation.clone())
            .collect()
    };

    let intervals = drivers
        .iter()
        .filter_map(|driver| {
            let Some(samples) = session.telemetry(driver, OPENING_LAP) else {
                debug!("No opening lap telemetry for {}", driver);
                return None;
            };
            let team = session.team_of(driver).unwrap_or_default();
            acceleration_interval(driver, team, samples)
        })
        .collect();
    rank_acceleration(intervals)
}
