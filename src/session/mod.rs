pub mod cache;
pub mod provider;

use std::{collections::HashMap, fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

pub use cache::SessionCache;
pub use provider::{FileSessionProvider, SessionProvider};

use crate::PaddockError;

/// Earliest season with lap and car telemetry available.
pub const FIRST_SEASON: u16 = 2018;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionType {
    Qualifying,
    Race,
}

impl SessionType {
    /// Stem of the session file inside a race directory
    pub fn file_stem(&self) -> &'static str {
        match self {
            SessionType::Qualifying => "qualifying",
            SessionType::Race => "race",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionType::Qualifying => write!(f, "Qualifying"),
            SessionType::Race => write!(f, "Race"),
        }
    }
}

impl FromStr for SessionType {
    type Err = PaddockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "q" | "qualifying" => Ok(SessionType::Qualifying),
            "r" | "race" => Ok(SessionType::Race),
            other => Err(PaddockError::InvalidUserInput {
                field: "session".to_string(),
                reason: format!("unknown session type '{}'", other),
            }),
        }
    }
}

/// Normalize a race name for lookups: lowercase, every non alphanumeric char becomes `_`.
pub fn normalize_race_name(race: &str) -> String {
    race.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Identifies one session of one event.
#[derive(Clone, Debug)]
pub struct SessionKey {
    pub year: u16,
    pub race: String,
    pub session: SessionType,
}

impl SessionKey {
    pub fn new(year: u16, race: impl Into<String>, session: SessionType) -> Self {
        Self {
            year,
            race: race.into(),
            session,
        }
    }

    pub fn normalized_race(&self) -> String {
        normalize_race_name(&self.race)
    }
}

impl PartialEq for SessionKey {
    fn eq(&self, other: &Self) -> bool {
        self.year == other.year
            && self.session == other.session
            && self.normalized_race() == other.normalized_race()
    }
}

impl Eq for SessionKey {}

impl std::hash::Hash for SessionKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.year.hash(state);
        self.session.hash(state);
        self.normalized_race().hash(state);
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.year, self.race, self.session)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Compound {
    Soft,
    Medium,
    Hard,
    Intermediate,
    Wet,
}

impl Compound {
    pub const ALL: [Compound; 5] = [
        Compound::Soft,
        Compound::Medium,
        Compound::Hard,
        Compound::Intermediate,
        Compound::Wet,
    ];
}

impl fmt::Display for Compound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Compound::Soft => "SOFT",
            Compound::Medium => "MEDIUM",
            Compound::Hard => "HARD",
            Compound::Intermediate => "INTERMEDIATE",
            Compound::Wet => "WET",
        };
        write!(f, "{}", name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sector {
    One,
    Two,
    Three,
}

impl Sector {
    pub const ALL: [Sector; 3] = [Sector::One, Sector::Two, Sector::Three];

    pub fn number(&self) -> u8 {
        match self {
            Sector::One => 1,
            Sector::Two => 2,
            Sector::Three => 3,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventInfo {
    /// Official event name, e.g. "Belgian Grand Prix"
    pub name: String,
    pub year: u16,
    pub session: SessionType,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriverInfo {
    /// Three letter abbreviation used as the driver identifier
    pub abbreviation: String,
    pub number: u32,
    #[serde(default)]
    pub full_name: Option<String>,
    pub team: String,
    /// Classified position, absent for qualifying exports without results
    #[serde(default)]
    pub position: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    pub driver: String,
    pub team: String,
    pub lap_number: u32,
    #[serde(rename = "lap_time_s", with = "optional_seconds", default)]
    pub lap_time: Option<Duration>,
    #[serde(rename = "sector1_time_s", with = "optional_seconds", default)]
    pub sector1_time: Option<Duration>,
    #[serde(rename = "sector2_time_s", with = "optional_seconds", default)]
    pub sector2_time: Option<Duration>,
    #[serde(rename = "sector3_time_s", with = "optional_seconds", default)]
    pub sector3_time: Option<Duration>,
    #[serde(default, deserialize_with = "lenient_compound::deserialize")]
    pub compound: Option<Compound>,
    /// Representative lap: no pit stop, no neutralisation, close to the driver's pace
    #[serde(default)]
    pub is_quick: bool,
}

impl Lap {
    pub fn sector_time(&self, sector: Sector) -> Option<Duration> {
        match sector {
            Sector::One => self.sector1_time,
            Sector::Two => self.sector2_time,
            Sector::Three => self.sector3_time,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TelemetrySample {
    /// Time since the start of the lap
    pub time: Duration,
    /// Meters traveled since the start of the lap
    pub distance_m: f64,
    pub speed_kph: f64,
    /// Throttle use, 0=off throttle to 100=full throttle
    pub throttle_pct: f64,
    pub brake: bool,
}

/// Telemetry sample as stored in a session file. Distance is optional, some exports only
/// carry car data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedSample {
    pub time_s: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
    pub speed_kph: f64,
    #[serde(default)]
    pub throttle_pct: f64,
    #[serde(default)]
    pub brake: bool,
}

impl From<&TelemetrySample> for RecordedSample {
    fn from(value: &TelemetrySample) -> Self {
        Self {
            time_s: value.time.as_secs_f64(),
            distance_m: Some(value.distance_m),
            speed_kph: value.speed_kph,
            throttle_pct: value.throttle_pct,
            brake: value.brake,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub driver: String,
    pub lap_number: u32,
    pub samples: Vec<RecordedSample>,
}

/// One line of a session file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SessionRecord {
    Event(EventInfo),
    Driver(DriverInfo),
    Lap(Lap),
    Telemetry(TelemetryRecord),
}

/// Everything known about one session: the event, the drivers in classification order, all
/// timed laps and the car telemetry per lap.
#[derive(Clone, Debug)]
pub struct SessionData {
    pub event: EventInfo,
    pub drivers: Vec<DriverInfo>,
    pub laps: Vec<Lap>,
    telemetry: HashMap<(String, u32), Vec<TelemetrySample>>,
}

impl SessionData {
    pub fn new(event: EventInfo) -> Self {
        Self {
            event,
            drivers: Vec::new(),
            laps: Vec::new(),
            telemetry: HashMap::new(),
        }
    }

    pub fn with_driver(mut self, driver: DriverInfo) -> Self {
        self.drivers.push(driver);
        self
    }

    pub fn with_lap(mut self, lap: Lap) -> Self {
        self.laps.push(lap);
        self
    }

    pub fn with_telemetry(
        mut self,
        driver: &str,
        lap_number: u32,
        samples: Vec<TelemetrySample>,
    ) -> Self {
        self.insert_telemetry(driver, lap_number, samples);
        self
    }

    pub fn insert_telemetry(&mut self, driver: &str, lap_number: u32, samples: Vec<TelemetrySample>) {
        self.telemetry
            .insert((driver.to_string(), lap_number), samples);
    }

    pub fn telemetry(&self, driver: &str, lap_number: u32) -> Option<&[TelemetrySample]> {
        self.telemetry
            .get(&(driver.to_string(), lap_number))
            .map(|samples| samples.as_slice())
    }

    pub fn telemetry_traces(&self) -> impl Iterator<Item = (&str, u32, &[TelemetrySample])> {
        self.telemetry
            .iter()
            .map(|((driver, lap_number), samples)| (driver.as_str(), *lap_number, samples.as_slice()))
    }

    pub fn laps_for<'a, 'b>(
        &'a self,
        driver: &'b str,
    ) -> impl Iterator<Item = &'a Lap> + use<'a, 'b> {
        self.laps.iter().filter(move |lap| lap.driver == driver)
    }

    /// Drivers with at least one lap, in order of first appearance
    pub fn lap_drivers(&self) -> Vec<String> {
        let mut drivers: Vec<String> = Vec::new();
        for lap in &self.laps {
            if !drivers.contains(&lap.driver) {
                drivers.push(lap.driver.clone());
            }
        }
        drivers
    }

    /// Team of a driver, from the driver list first and the laps otherwise
    pub fn team_of(&self, driver: &str) -> Option<&str> {
        self.drivers
            .iter()
            .find(|d| d.abbreviation == driver)
            .map(|d| d.team.as_str())
            .or_else(|| self.laps_for(driver).next().map(|lap| lap.team.as_str()))
    }

    /// Drivers sorted by classified position. Unclassified drivers go last in provider order.
    pub fn classification(&self) -> Vec<&DriverInfo> {
        let mut drivers: Vec<&DriverInfo> = self.drivers.iter().collect();
        drivers.sort_by_key(|d| d.position.unwrap_or(u32::MAX));
        drivers
    }
}

mod optional_seconds {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&duration.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        match Option::<f64>::deserialize(deserializer)? {
            Some(secs) => Duration::try_from_secs_f64(secs)
                .map(Some)
                .map_err(D::Error::custom),
            None => Ok(None),
        }
    }
}

/// Compounds outside the known set (`UNKNOWN`, `TEST_UNKNOWN`) load as absent
mod lenient_compound {
    use serde::{
        Deserialize, Deserializer,
        de::{IntoDeserializer, value},
    };

    use super::Compound;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Compound>, D::Error> {
        let Some(name) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let name: value::StrDeserializer<'_, value::Error> = name.as_str().into_deserializer();
        Ok(Compound::deserialize(name).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_race_name() {
        assert_eq!(normalize_race_name("Belgian Grand Prix"), "belgian_grand_prix");
        assert_eq!(normalize_race_name("  São Paulo "), "são_paulo");
        assert_eq!(normalize_race_name("Emilia-Romagna"), "emilia_romagna");
    }

    #[test]
    fn test_session_key_equality_ignores_race_formatting() {
        let a = SessionKey::new(2023, "Belgian Grand Prix", SessionType::Race);
        let b = SessionKey::new(2023, "belgian grand prix", SessionType::Race);
        let c = SessionKey::new(2023, "Belgian Grand Prix", SessionType::Qualifying);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_session_type_from_str() {
        assert_eq!("Q".parse::<SessionType>().unwrap(), SessionType::Qualifying);
        assert_eq!("race".parse::<SessionType>().unwrap(), SessionType::Race);
        assert!(matches!(
            "sprint".parse::<SessionType>(),
            Err(PaddockError::InvalidUserInput { .. })
        ));
    }

    #[test]
    fn test_lap_deserializes_seconds_and_compound() {
        let lap: Lap = serde_json::from_str(
            r#"{"driver":"VER","team":"Red Bull Racing","lap_number":12,"lap_time_s":106.5,"sector1_time_s":31.25,"sector2_time_s":null,"compound":"INTERMEDIATE","is_quick":true}"#,
        )
        .unwrap();
        assert_eq!(lap.lap_time, Some(Duration::from_millis(106_500)));
        assert_eq!(lap.sector_time(Sector::One), Some(Duration::from_millis(31_250)));
        assert_eq!(lap.sector_time(Sector::Two), None);
        assert_eq!(lap.sector_time(Sector::Three), None);
        assert_eq!(lap.compound, Some(Compound::Intermediate));
        assert!(lap.is_quick);
    }

    #[test]
    fn test_unknown_compound_is_absent() {
        for compound in ["UNKNOWN", "TEST_UNKNOWN", "SUPERSOFT"] {
            let line = format!(
                r#"{{"driver":"SAR","team":"Williams","lap_number":3,"lap_time_s":92.1,"compound":"{}"}}"#,
                compound
            );
            let lap: Lap = serde_json::from_str(&line).unwrap();
            assert_eq!(lap.compound, None, "{}", compound);
            assert_eq!(lap.lap_time, Some(Duration::from_millis(92_100)));
        }

        let lap: Lap = serde_json::from_str(
            r#"{"driver":"SAR","team":"Williams","lap_number":3,"compound":null}"#,
        )
        .unwrap();
        assert_eq!(lap.compound, None);
    }

    #[test]
    fn test_team_of_falls_back_to_laps() {
        let mut session = SessionData::new(EventInfo {
            name: "Test Grand Prix".to_string(),
            year: 2023,
            session: SessionType::Race,
        })
        .with_driver(DriverInfo {
            abbreviation: "VER".to_string(),
            number: 1,
            full_name: None,
            team: "Red Bull Racing".to_string(),
            position: Some(1),
        });
        session.laps.push(Lap {
            driver: "ALB".to_string(),
            team: "Williams".to_string(),
            lap_number: 1,
            lap_time: None,
            sector1_time: None,
            sector2_time: None,
            sector3_time: None,
            compound: None,
            is_quick: false,
        });

        let driver = String::from("ALB");
        let team = session.team_of(&driver);
        drop(driver);
        assert_eq!(team, Some("Williams"));
        assert_eq!(session.team_of("VER"), Some("Red Bull Racing"));
        assert_eq!(session.team_of("HAM"), None);
        assert_eq!(session.laps_for("ALB").count(), 1);
    }

    #[test]
    fn test_classification_puts_unclassified_last() {
        let event = EventInfo {
            name: "Test Grand Prix".to_string(),
            year: 2023,
            session: SessionType::Race,
        };
        let driver = |abbreviation: &str, position: Option<u32>| DriverInfo {
            abbreviation: abbreviation.to_string(),
            number: 1,
            full_name: None,
            team: "Team".to_string(),
            position,
        };
        let session = SessionData::new(event)
            .with_driver(driver("DNF", None))
            .with_driver(driver("P2", Some(2)))
            .with_driver(driver("P1", Some(1)));
        let order: Vec<&str> = session
            .classification()
            .iter()
            .map(|d| d.abbreviation.as_str())
            .collect();
        assert_eq!(order, vec!["P1", "P2", "DNF"]);
    }
}
