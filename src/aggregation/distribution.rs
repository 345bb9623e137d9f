use std::f64::consts::PI;

use itertools::Itertools;

use crate::session::{Compound, SessionData};

/// Number of classified drivers scoring points
pub const POINTS_FINISHERS: usize = 10;
const DENSITY_POINTS: usize = 64;
/// How many bandwidths the density curve extends past the extreme laps
const DENSITY_CUT: f64 = 2.;

#[derive(Clone, Debug, PartialEq)]
pub struct LapSample {
    pub lap_number: u32,
    pub seconds: f64,
    pub compound: Option<Compound>,
}

/// Quick lap times of one points finisher together with their estimated density.
#[derive(Clone, Debug, PartialEq)]
pub struct DriverLapDistribution {
    pub driver: String,
    pub team: String,
    pub position: Option<u32>,
    pub laps: Vec<LapSample>,
    /// `[lap time (s), density]` pairs, empty with fewer than two laps
    pub density: Vec<[f64; 2]>,
}

impl DriverLapDistribution {
    pub fn median_seconds(&self) -> Option<f64> {
        let sorted = self
            .laps
            .iter()
            .map(|l| l.seconds)
            .sorted_by(|a, b| a.total_cmp(b))
            .collect_vec();
        if sorted.is_empty() {
            return None;
        }
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Some((sorted[mid - 1] + sorted[mid]) / 2.)
        } else {
            Some(sorted[mid])
        }
    }
}

/// Quick laps of the top ten finishers, in finishing order.
pub fn race_lap_distribution(session: &SessionData) -> Vec<DriverLapDistribution> {
    let finishers: Vec<(String, Option<u32>)> = if session.drivers.is_empty() {
        session
            .lap_drivers()
            .into_iter()
            .map(|driver| (driver, None))
            .collect()
    } else {
        session
            .classification()
            .into_iter()
            .map(|d| (d.abbreviation.clone(), d.position))
            .collect()
    };

    finishers
        .into_iter()
        .take(POINTS_FINISHERS)
        .map(|(driver, position)| {
            let laps = session
                .laps_for(&driver)
                .filter(|lap| lap.is_quick)
                .filter_map(|lap| {
                    lap.lap_time.map(|time| LapSample {
                        lap_number: lap.lap_number,
                        seconds: time.as_secs_f64(),
                        compound: lap.compound,
                    })
                })
                .collect_vec();
            let seconds = laps.iter().map(|l| l.seconds).collect_vec();
            DriverLapDistribution {
                team: session.team_of(&driver).unwrap_or_default().to_string(),
                driver,
                position,
                density: kernel_density(&seconds, DENSITY_POINTS),
                laps,
            }
        })
        .collect()
}

/// Gaussian kernel density estimate with Scott's bandwidth, evaluated on `points` evenly
/// spaced values. Returns an empty curve when there is not enough spread to estimate one.
pub fn kernel_density(values: &[f64], points: usize) -> Vec<[f64; 2]> {
    let n = values.len();
    if n < 2 || points < 2 {
        return Vec::new();
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let bandwidth = variance.sqrt() * (n as f64).powf(-0.2);
    if bandwidth <= 0. || !bandwidth.is_finite() {
        return Vec::new();
    }

    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let lo = min - DENSITY_CUT * bandwidth;
    let hi = max + DENSITY_CUT * bandwidth;
    let step = (hi - lo) / (points - 1) as f64;
    let norm = 1. / (n as f64 * bandwidth * (2. * PI).sqrt());

    (0..points)
        .map(|i| {
            let x = lo + step * i as f64;
            let density = values
                .iter()
                .map(|v| (-0.5 * ((x - v) / bandwidth).powi(2)).exp())
                .sum::<f64>()
                * norm;
            [x, density]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{DriverInfo, EventInfo, Lap, SessionType};
    use std::time::Duration;

    fn race_lap(driver: &str, lap_number: u32, millis: Option<u64>, quick: bool) -> Lap {
        Lap {
            driver: driver.to_string(),
            team: format!("{} team", driver),
            lap_number,
            lap_time: millis.map(Duration::from_millis),
            sector1_time: None,
            sector2_time: None,
            sector3_time: None,
            compound: Some(Compound::Medium),
            is_quick: quick,
        }
    }

    #[test]
    fn test_only_quick_laps_of_top_ten_in_finishing_order() {
        let mut session = SessionData::new(EventInfo {
            name: "Test Grand Prix".to_string(),
            year: 2023,
            session: SessionType::Race,
        });
        // twelve drivers listed in reverse order of their result
        for position in (1..=12).rev() {
            let driver = format!("D{:02}", position);
            session.drivers.push(DriverInfo {
                abbreviation: driver.clone(),
                number: position,
                full_name: None,
                team: format!("{} team", driver),
                position: Some(position),
            });
            session.laps.push(race_lap(&driver, 1, Some(110_000), false));
            session.laps.push(race_lap(&driver, 2, Some(95_000), true));
            session.laps.push(race_lap(&driver, 3, Some(96_000), true));
            session.laps.push(race_lap(&driver, 4, None, true));
        }

        let distribution = race_lap_distribution(&session);
        assert_eq!(distribution.len(), POINTS_FINISHERS);
        assert_eq!(distribution[0].driver, "D01");
        assert_eq!(distribution[9].driver, "D10");
        assert_eq!(distribution[0].laps.len(), 2);
        assert_eq!(distribution[0].median_seconds(), Some(95.5));
        assert_eq!(distribution[0].density.len(), DENSITY_POINTS);
    }

    #[test]
    fn test_kernel_density_integrates_to_one() {
        let values = [95.1, 95.4, 95.3, 96.0, 95.8, 97.2, 95.5];
        let curve = kernel_density(&values, 512);
        let step = curve[1][0] - curve[0][0];
        let area: f64 = curve.iter().map(|[_, d]| d * step).sum();
        assert!((area - 1.).abs() < 0.05, "area was {}", area);
    }

    #[test]
    fn test_kernel_density_degenerate_input() {
        assert!(kernel_density(&[95.0], 64).is_empty());
        assert!(kernel_density(&[95.0, 95.0, 95.0], 64).is_empty());
    }
}
