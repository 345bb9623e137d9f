use std::{collections::HashMap, time::Duration};

use itertools::Itertools;

use crate::session::{Lap, Sector};

#[derive(Clone, Debug, PartialEq)]
pub struct SectorBest {
    pub driver: String,
    pub team: String,
    pub time: Duration,
    /// Gap to the fastest time in the same sector
    pub delta: Duration,
}

/// Personal best time per driver for one sector, sorted ascending. Each sector is ranked on
/// its own, so the order can differ between sectors. Drivers without a time in the sector
/// are left out.
pub fn sector_personal_bests(laps: &[Lap], sector: Sector) -> Vec<SectorBest> {
    let mut bests: HashMap<&str, (&str, Duration)> = HashMap::new();
    for lap in laps {
        let Some(time) = lap.sector_time(sector) else {
            continue;
        };
        bests
            .entry(lap.driver.as_str())
            .and_modify(|(_, best)| {
                if time < *best {
                    *best = time;
                }
            })
            .or_insert((lap.team.as_str(), time));
    }

    let ranked = bests
        .into_iter()
        .sorted_by(|a, b| a.1.1.cmp(&b.1.1).then_with(|| a.0.cmp(&b.0)))
        .collect_vec();
    let Some(fastest) = ranked.first().map(|(_, (_, time))| *time) else {
        return Vec::new();
    };

    ranked
        .into_iter()
        .map(|(driver, (team, time))| SectorBest {
            driver: driver.to_string(),
            team: team.to_string(),
            time,
            delta: time - fastest,
        })
        .collect()
}
