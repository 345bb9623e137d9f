use std::time::Duration;

use crate::aggregation::{
    AccelerationInterval, DriverLapDistribution, DriverTrace, LapDelta, SectorBest,
    format_lap_time,
};

use super::PanelKind;

#[derive(Clone, Debug, PartialEq)]
pub struct QualifyingDeltaChart {
    pub event_name: String,
    pub year: u16,
    pub pole_driver: String,
    pub pole_time: Duration,
    /// Fastest lap per driver, pole first
    pub entries: Vec<LapDelta>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SectorTimesChart {
    pub event_name: String,
    pub year: u16,
    /// Personal bests for sectors 1, 2 and 3, each sorted on its own
    pub sectors: [Vec<SectorBest>; 3],
}

#[derive(Clone, Debug, PartialEq)]
pub struct HeadToHeadChart {
    pub event_name: String,
    pub year: u16,
    pub traces: [DriverTrace; 2],
}

#[derive(Clone, Debug, PartialEq)]
pub struct RaceDistributionChart {
    pub event_name: String,
    pub year: u16,
    /// Points finishers in finishing order
    pub drivers: Vec<DriverLapDistribution>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AccelerationChart {
    pub event_name: String,
    pub year: u16,
    /// Ranked by total time, then 0-100
    pub intervals: Vec<AccelerationInterval>,
}

/// Result of a successful panel computation, ready to be drawn.
#[derive(Clone, Debug, PartialEq)]
pub enum ChartData {
    QualifyingDelta(QualifyingDeltaChart),
    SectorTimes(SectorTimesChart),
    HeadToHead(HeadToHeadChart),
    RaceDistribution(RaceDistributionChart),
    Acceleration(AccelerationChart),
}

impl ChartData {
    pub fn kind(&self) -> PanelKind {
        match self {
            ChartData::QualifyingDelta(_) => PanelKind::QualifyingDelta,
            ChartData::SectorTimes(_) => PanelKind::SectorTimes,
            ChartData::HeadToHead(_) => PanelKind::HeadToHead,
            ChartData::RaceDistribution(_) => PanelKind::RaceDistribution,
            ChartData::Acceleration(_) => PanelKind::Acceleration,
        }
    }

    pub fn title(&self) -> String {
        match self {
            ChartData::QualifyingDelta(chart) => format!(
                "{} {} Qualifying\nFastest Lap: {} ({})",
                chart.event_name,
                chart.year,
                format_lap_time(chart.pole_time),
                chart.pole_driver
            ),
            ChartData::SectorTimes(chart) => format!(
                "{} {} Qualifying - Personal Best Sector Times",
                chart.event_name, chart.year
            ),
            ChartData::HeadToHead(chart) => format!(
                "{} vs {} ({} {} Telemetry Analysis)",
                chart.traces[0].driver, chart.traces[1].driver, chart.year, chart.event_name
            ),
            ChartData::RaceDistribution(chart) => format!(
                "{} {} Race Lap Time Distributions",
                chart.event_name, chart.year
            ),
            ChartData::Acceleration(chart) => format!(
                "Acceleration Times ({} {} - Race)",
                chart.year, chart.event_name
            ),
        }
    }
}
