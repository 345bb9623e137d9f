pub mod charts;

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use log::{info, warn};

pub use charts::{
    AccelerationChart, ChartData, HeadToHeadChart, QualifyingDeltaChart, RaceDistributionChart,
    SectorTimesChart,
};

use crate::{
    PaddockError,
    aggregation::{
        head_to_head, qualifying_deltas, race_lap_distribution, race_start_acceleration,
        sector_personal_bests,
    },
    session::{
        FIRST_SEASON, Sector, SessionCache, SessionData, SessionKey, SessionProvider, SessionType,
    },
    writer::{session_file_path, write_session},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PanelKind {
    QualifyingDelta,
    SectorTimes,
    HeadToHead,
    RaceDistribution,
    Acceleration,
}

impl PanelKind {
    pub const ALL: [PanelKind; 5] = [
        PanelKind::QualifyingDelta,
        PanelKind::SectorTimes,
        PanelKind::HeadToHead,
        PanelKind::RaceDistribution,
        PanelKind::Acceleration,
    ];

    pub fn tab_name(&self) -> &'static str {
        match self {
            PanelKind::QualifyingDelta => "Qualifying Delta",
            PanelKind::SectorTimes => "Sector Times Analysis",
            PanelKind::HeadToHead => "Qualifying Head-to-Head",
            PanelKind::RaceDistribution => "Race Lap Distribution",
            PanelKind::Acceleration => "Acceleration Times",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PanelKind::QualifyingDelta => {
                "This plot shows the qualifying gap for each driver to the fastest driver."
            }
            PanelKind::SectorTimes => {
                "This plot shows the sector times for each driver across 3 sectors."
            }
            PanelKind::HeadToHead => {
                "This plot shows the qualifying head-to-head between two drivers."
            }
            PanelKind::RaceDistribution => {
                "This plot shows the lap time distribution for the top 10 finishers."
            }
            PanelKind::Acceleration => {
                "This plot shows the acceleration times for each driver during the start of the race."
            }
        }
    }

    pub fn session_type(&self) -> SessionType {
        match self {
            PanelKind::QualifyingDelta | PanelKind::SectorTimes | PanelKind::HeadToHead => {
                SessionType::Qualifying
            }
            PanelKind::RaceDistribution | PanelKind::Acceleration => SessionType::Race,
        }
    }
}

/// User action that triggers a chart.
#[derive(Clone, Debug, PartialEq)]
pub enum PanelRequest {
    QualifyingDelta,
    SectorTimes,
    HeadToHead { driver1: String, driver2: String },
    RaceDistribution,
    Acceleration,
}

impl PanelRequest {
    pub fn kind(&self) -> PanelKind {
        match self {
            PanelRequest::QualifyingDelta => PanelKind::QualifyingDelta,
            PanelRequest::SectorTimes => PanelKind::SectorTimes,
            PanelRequest::HeadToHead { .. } => PanelKind::HeadToHead,
            PanelRequest::RaceDistribution => PanelKind::RaceDistribution,
            PanelRequest::Acceleration => PanelKind::Acceleration,
        }
    }
}

/// Confirmed season and race.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    pub year: u16,
    pub race: String,
}

impl Selection {
    pub fn new(year: u16, race: &str) -> Result<Self, PaddockError> {
        if year < FIRST_SEASON {
            return Err(PaddockError::InvalidUserInput {
                field: "year".to_string(),
                reason: format!("data is available from {} onwards", FIRST_SEASON),
            });
        }
        let race = race.trim();
        if race.is_empty() {
            return Err(PaddockError::InvalidUserInput {
                field: "race".to_string(),
                reason: "race name is empty".to_string(),
            });
        }
        Ok(Self {
            year,
            race: race.to_string(),
        })
    }

    pub fn key(&self, session: SessionType) -> SessionKey {
        SessionKey::new(self.year, self.race.clone(), session)
    }
}

/// State shared by the panels: the confirmed selection and the last chart each panel produced.
#[derive(Default, Debug)]
pub struct SessionContext {
    selection: Option<Selection>,
    charts: HashMap<PanelKind, ChartData>,
}

impl SessionContext {
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn is_confirmed(&self) -> bool {
        self.selection.is_some()
    }

    pub fn chart(&self, kind: PanelKind) -> Option<&ChartData> {
        self.charts.get(&kind)
    }

    fn store(&mut self, chart: ChartData) -> &ChartData {
        let kind = chart.kind();
        self.charts.insert(kind, chart);
        &self.charts[&kind]
    }
}

/// Compute the chart for a request. Sessions come from the cache so panels sharing a session
/// only fetch it once.
pub fn compute<P: SessionProvider>(
    request: &PanelRequest,
    selection: &Selection,
    sessions: &mut SessionCache<P>,
) -> Result<ChartData, PaddockError> {
    let session = sessions.get_or_fetch(&selection.key(request.kind().session_type()))?;
    let event_name = session.event.name.clone();
    let year = session.event.year;

    let chart = match request {
        PanelRequest::QualifyingDelta => {
            let entries = qualifying_deltas(session)?;
            let pole = &entries[0];
            ChartData::QualifyingDelta(QualifyingDeltaChart {
                event_name,
                year,
                pole_driver: pole.driver.clone(),
                pole_time: pole.lap_time,
                entries,
            })
        }
        PanelRequest::SectorTimes => {
            let sectors = Sector::ALL.map(|sector| sector_personal_bests(&session.laps, sector));
            if sectors.iter().all(|s| s.is_empty()) {
                return Err(PaddockError::IncompleteSession {
                    reason: format!("{} {} has no sector times", year, event_name),
                });
            }
            ChartData::SectorTimes(SectorTimesChart {
                event_name,
                year,
                sectors,
            })
        }
        PanelRequest::HeadToHead { driver1, driver2 } => {
            ChartData::HeadToHead(HeadToHeadChart {
                traces: head_to_head(session, driver1, driver2)?,
                event_name,
                year,
            })
        }
        PanelRequest::RaceDistribution => {
            let drivers = race_lap_distribution(session);
            if drivers.iter().all(|d| d.laps.is_empty()) {
                return Err(PaddockError::IncompleteSession {
                    reason: format!("{} {} has no quick laps", year, event_name),
                });
            }
            ChartData::RaceDistribution(RaceDistributionChart {
                event_name,
                year,
                drivers,
            })
        }
        PanelRequest::Acceleration => {
            let intervals = race_start_acceleration(session);
            if intervals.is_empty() {
                return Err(PaddockError::IncompleteSession {
                    reason: format!(
                        "{} {} has no driver reaching 200 km/h on the opening lap",
                        year, event_name
                    ),
                });
            }
            ChartData::Acceleration(AccelerationChart {
                intervals,
                event_name,
                year,
            })
        }
    };
    Ok(chart)
}

/// Wires user selections to the session cache and the aggregations, keeping one chart per
/// panel. A failed generation leaves the panel's previous chart in place.
pub struct Dashboard<P: SessionProvider> {
    sessions: SessionCache<P>,
    context: SessionContext,
}

impl<P: SessionProvider> Dashboard<P> {
    pub fn new(provider: P) -> Self {
        Self {
            sessions: SessionCache::new(provider),
            context: SessionContext::default(),
        }
    }

    pub fn confirm_selection(&mut self, year: u16, race: &str) -> Result<&Selection, PaddockError> {
        let selection = Selection::new(year, race)?;
        info!("Confirmed selection: {} {}", selection.year, selection.race);
        Ok(self.context.selection.insert(selection))
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn sessions(&self) -> &SessionCache<P> {
        &self.sessions
    }

    pub fn sessions_mut(&mut self) -> &mut SessionCache<P> {
        &mut self.sessions
    }

    pub fn chart(&self, kind: PanelKind) -> Option<&ChartData> {
        self.context.chart(kind)
    }

    pub fn generate(&mut self, request: &PanelRequest) -> Result<&ChartData, PaddockError> {
        let selection = self
            .context
            .selection
            .clone()
            .ok_or(PaddockError::InvalidSelection)?;
        match compute(request, &selection, &mut self.sessions) {
            Ok(chart) => Ok(self.context.store(chart)),
            Err(e) => {
                warn!("Could not generate {:?}: {}", request.kind(), e);
                Err(e)
            }
        }
    }

    /// Qualifying session of the confirmed selection, fetched on first use
    pub fn qualifying_session(&mut self) -> Result<&SessionData, PaddockError> {
        let selection = self
            .context
            .selection
            .as_ref()
            .ok_or(PaddockError::InvalidSelection)?;
        let key = selection.key(SessionType::Qualifying);
        self.sessions.get_or_fetch(&key)
    }

    /// Drivers offered by the head-to-head selectors
    pub fn qualifying_drivers(&mut self) -> Result<Vec<String>, PaddockError> {
        Ok(self.qualifying_session()?.lap_drivers())
    }

    /// Write one session of the confirmed selection under `output_dir`, laid out the way
    /// [`FileSessionProvider`](crate::FileSessionProvider) reads it back.
    pub fn export_session(
        &mut self,
        session_type: SessionType,
        output_dir: &Path,
    ) -> Result<PathBuf, PaddockError> {
        let selection = self
            .context
            .selection
            .as_ref()
            .ok_or(PaddockError::InvalidSelection)?;
        let key = selection.key(session_type);
        let session = self.sessions.get_or_fetch(&key)?;
        let file = session_file_path(output_dir, session);
        write_session(&file, session)?;
        info!("Exported {} to {:?}", key, file);
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::session::{EventInfo, Lap, TelemetrySample};

    /// Serves a single qualifying session for any key asking for one.
    struct QualifyingOnly;

    impl SessionProvider for QualifyingOnly {
        fn fetch(&self, key: &SessionKey) -> Result<SessionData, PaddockError> {
            if key.session != SessionType::Qualifying {
                return Err(PaddockError::SessionNotFound {
                    year: key.year,
                    race: key.race.clone(),
                    session: key.session.to_string(),
                });
            }
            let lap = |driver: &str, millis: u64| Lap {
                driver: driver.to_string(),
                team: "Williams".to_string(),
                lap_number: 2,
                lap_time: Some(Duration::from_millis(millis)),
                sector1_time: None,
                sector2_time: None,
                sector3_time: None,
                compound: None,
                is_quick: true,
            };
            Ok(SessionData::new(EventInfo {
                name: "Monaco Grand Prix".to_string(),
                year: key.year,
                session: key.session,
            })
            .with_lap(lap("ALB", 72_100))
            .with_lap(lap("SAR", 72_900)))
        }
    }

    /// Serves race sessions where the opening lap tops out at `top_speed` km/h, except for
    /// 2023 which launches past 250 km/h.
    struct RaceStart {
        top_speed: f64,
    }

    impl SessionProvider for RaceStart {
        fn fetch(&self, key: &SessionKey) -> Result<SessionData, PaddockError> {
            let top_speed = if key.year == 2023 { 250. } else { self.top_speed };
            // 10 km/h every 100ms from a standstill
            let launch = (0..=(top_speed / 10.) as u64)
                .map(|i| TelemetrySample {
                    time: Duration::from_millis(i * 100),
                    distance_m: i as f64 * 2.,
                    speed_kph: i as f64 * 10.,
                    throttle_pct: 100.,
                    brake: false,
                })
                .collect();
            Ok(SessionData::new(EventInfo {
                name: "Bahrain Grand Prix".to_string(),
                year: key.year,
                session: key.session,
            })
            .with_lap(Lap {
                driver: "HUL".to_string(),
                team: "Haas F1 Team".to_string(),
                lap_number: 1,
                lap_time: Some(Duration::from_secs(99)),
                sector1_time: None,
                sector2_time: None,
                sector3_time: None,
                compound: None,
                is_quick: false,
            })
            .with_telemetry("HUL", 1, launch))
        }
    }

    #[test]
    fn test_selection_validation() {
        assert!(Selection::new(2018, "Monaco").is_ok());
        assert_eq!(Selection::new(2020, "  Monaco ").unwrap().race, "Monaco");
        assert!(matches!(
            Selection::new(2017, "Monaco"),
            Err(PaddockError::InvalidUserInput { .. })
        ));
        assert!(matches!(
            Selection::new(2021, ""),
            Err(PaddockError::InvalidUserInput { .. })
        ));
    }

    #[test]
    fn test_panel_sessions() {
        for kind in PanelKind::ALL {
            let expected = match kind {
                PanelKind::RaceDistribution | PanelKind::Acceleration => SessionType::Race,
                _ => SessionType::Qualifying,
            };
            assert_eq!(kind.session_type(), expected);
        }
    }

    #[test]
    fn test_sector_times_without_sectors_is_incomplete() {
        let mut dashboard = Dashboard::new(QualifyingOnly);
        dashboard.confirm_selection(2024, "Monaco").unwrap();

        assert!(dashboard.generate(&PanelRequest::QualifyingDelta).is_ok());
        assert!(matches!(
            dashboard.generate(&PanelRequest::SectorTimes),
            Err(PaddockError::IncompleteSession { .. })
        ));
        assert!(dashboard.chart(PanelKind::SectorTimes).is_none());
        assert!(matches!(
            dashboard.generate(&PanelRequest::RaceDistribution),
            Err(PaddockError::SessionNotFound { .. })
        ));
    }

    #[test]
    fn test_reconfirming_keeps_cached_charts() {
        let mut dashboard = Dashboard::new(QualifyingOnly);
        dashboard.confirm_selection(2024, "Monaco").unwrap();
        dashboard.generate(&PanelRequest::QualifyingDelta).unwrap();

        dashboard.confirm_selection(2023, "Monaco").unwrap();
        let Some(ChartData::QualifyingDelta(chart)) = dashboard.chart(PanelKind::QualifyingDelta)
        else {
            panic!("chart should survive a new selection");
        };
        assert_eq!(chart.year, 2024);
        assert_eq!(chart.pole_driver, "ALB");
        assert_eq!(chart.entries[1].delta, Duration::from_millis(800));
    }

    #[test]
    fn test_acceleration_without_launch_keeps_previous_chart() {
        let mut dashboard = Dashboard::new(RaceStart { top_speed: 180. });
        dashboard.confirm_selection(2023, "Bahrain").unwrap();
        let ChartData::Acceleration(chart) = dashboard.generate(&PanelRequest::Acceleration).unwrap()
        else {
            panic!("expected an acceleration chart");
        };
        assert_eq!(chart.intervals.len(), 1);
        assert_eq!(chart.intervals[0].zero_to_100(), Duration::from_secs(1));
        assert_eq!(chart.intervals[0].hundred_to_200(), Duration::from_secs(1));

        dashboard.confirm_selection(2024, "Bahrain").unwrap();
        assert!(matches!(
            dashboard.generate(&PanelRequest::Acceleration),
            Err(PaddockError::IncompleteSession { .. })
        ));
        let Some(ChartData::Acceleration(chart)) = dashboard.chart(PanelKind::Acceleration) else {
            panic!("previous chart should survive a failed generation");
        };
        assert_eq!(chart.year, 2023);
        assert_eq!(chart.intervals[0].driver, "HUL");
    }
}
