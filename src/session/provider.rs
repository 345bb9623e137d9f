use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use log::{debug, info, warn};

use super::{
    EventInfo, RecordedSample, SessionData, SessionKey, SessionRecord, TelemetrySample,
    normalize_race_name,
};
use crate::PaddockError;

const SESSION_FILE_EXTENSION: &str = "jsonl";

/// Source of session data. Implementations return fully structured laps and telemetry for a
/// single session, or a fetch error when the session does not exist or has no data.
pub trait SessionProvider {
    fn fetch(&self, key: &SessionKey) -> Result<SessionData, PaddockError>;
}

/// Reads session exports laid out as `<data_dir>/<year>/<race>/<qualifying|race>.jsonl`.
pub struct FileSessionProvider {
    data_dir: PathBuf,
}

impl FileSessionProvider {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory names of the events available for a season, sorted
    pub fn available_races(&self, year: u16) -> Result<Vec<String>, PaddockError> {
        let year_dir = self.data_dir.join(year.to_string());
        if !year_dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut races = Self::race_dirs(&year_dir)?
            .into_iter()
            .filter_map(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.to_string())
            })
            .collect::<Vec<_>>();
        races.sort();
        Ok(races)
    }

    fn race_dirs(year_dir: &Path) -> Result<Vec<PathBuf>, PaddockError> {
        let entries = fs::read_dir(year_dir).map_err(|e| PaddockError::SessionLoadError {
            path: format!("{:?}", year_dir),
            source: e,
        })?;
        Ok(entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect())
    }

    /// Find the event directory for a race name. An exact normalized match wins, otherwise
    /// the query must be contained in exactly one directory name.
    fn resolve_race_dir(&self, key: &SessionKey) -> Result<PathBuf, PaddockError> {
        let not_found = || PaddockError::SessionNotFound {
            year: key.year,
            race: key.race.clone(),
            session: key.session.to_string(),
        };

        let query = key.normalized_race();
        if query.trim_matches('_').is_empty() {
            return Err(not_found());
        }

        let year_dir = self.data_dir.join(key.year.to_string());
        if !year_dir.is_dir() {
            debug!("No season directory at {:?}", year_dir);
            return Err(not_found());
        }

        let dirs = Self::race_dirs(&year_dir)?;
        let dir_name = |path: &PathBuf| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(normalize_race_name)
                .unwrap_or_default()
        };

        if let Some(exact) = dirs.iter().find(|path| dir_name(path) == query) {
            return Ok(exact.clone());
        }

        let mut candidates: Vec<&PathBuf> = dirs
            .iter()
            .filter(|path| dir_name(path).contains(&query))
            .collect();
        match candidates.len() {
            0 => Err(not_found()),
            1 => Ok(candidates.remove(0).clone()),
            _ => {
                let mut names: Vec<String> = candidates.iter().map(|p| dir_name(p)).collect();
                names.sort();
                Err(PaddockError::AmbiguousRace {
                    year: key.year,
                    race: key.race.clone(),
                    candidates: names.join(", "),
                })
            }
        }
    }
}

impl SessionProvider for FileSessionProvider {
    fn fetch(&self, key: &SessionKey) -> Result<SessionData, PaddockError> {
        let race_dir = self.resolve_race_dir(key)?;
        let session_file = race_dir
            .join(key.session.file_stem())
            .with_extension(SESSION_FILE_EXTENSION);
        if !session_file.is_file() {
            return Err(PaddockError::SessionNotFound {
                year: key.year,
                race: key.race.clone(),
                session: key.session.to_string(),
            });
        }
        load_session_jsonl(&session_file)
    }
}

/// Parse a session export. Every line is one externally tagged [`SessionRecord`].
pub fn load_session_jsonl(source_file: &Path) -> Result<SessionData, PaddockError> {
    let records = serde_jsonlines::json_lines(source_file)
        .map_err(|e| PaddockError::SessionLoadError {
            path: format!("{:?}", source_file),
            source: e,
        })?
        .collect::<Result<Vec<SessionRecord>, std::io::Error>>()
        .map_err(|e| PaddockError::SessionLoadError {
            path: format!("{:?}", source_file),
            source: e,
        })?;

    let mut event: Option<EventInfo> = None;
    let mut drivers = Vec::new();
    let mut laps = Vec::new();
    let mut traces = Vec::new();
    for record in records {
        match record {
            SessionRecord::Event(info) => event = Some(info),
            SessionRecord::Driver(driver) => drivers.push(driver),
            SessionRecord::Lap(lap) => laps.push(lap),
            SessionRecord::Telemetry(trace) => traces.push(trace),
        }
    }

    let event = event.ok_or_else(|| PaddockError::IncompleteSession {
        reason: format!("{:?} has no event record", source_file),
    })?;
    if laps.is_empty() {
        return Err(PaddockError::IncompleteSession {
            reason: format!("{} {} {} has no laps", event.year, event.name, event.session),
        });
    }

    let mut session = SessionData::new(event);
    session.drivers = drivers;
    session.laps = laps;
    for trace in traces {
        let samples = telemetry_from_records(&trace.samples);
        if samples.len() < trace.samples.len() {
            warn!(
                "Dropped {} invalid or out of order telemetry samples for {} lap {}",
                trace.samples.len() - samples.len(),
                trace.driver,
                trace.lap_number
            );
        }
        session.insert_telemetry(&trace.driver, trace.lap_number, samples);
    }

    info!(
        "Loaded {:?}: {} drivers, {} laps",
        source_file,
        session.drivers.len(),
        session.laps.len()
    );
    Ok(session)
}

/// Convert stored samples into a trace with strictly increasing timestamps. When any sample
/// lacks a distance, distance is integrated from speed for the whole trace.
pub fn telemetry_from_records(records: &[RecordedSample]) -> Vec<TelemetrySample> {
    let mut kept: Vec<(&RecordedSample, Duration)> = Vec::with_capacity(records.len());
    for record in records {
        // negative, non-finite and out of range timestamps
        let Ok(time) = Duration::try_from_secs_f64(record.time_s) else {
            continue;
        };
        if let Some((_, last)) = kept.last()
            && time <= *last
        {
            continue;
        }
        kept.push((record, time));
    }

    let has_distance = kept.iter().all(|(r, _)| r.distance_m.is_some());
    let mut samples: Vec<TelemetrySample> = kept
        .iter()
        .map(|(r, time)| TelemetrySample {
            time: *time,
            distance_m: r.distance_m.unwrap_or(0.),
            speed_kph: r.speed_kph,
            throttle_pct: r.throttle_pct,
            brake: r.brake,
        })
        .collect();
    if !has_distance {
        integrate_distance(&mut samples);
    }
    samples
}

/// Fill in traveled distance with the trapezoidal rule over speed.
pub fn integrate_distance(samples: &mut [TelemetrySample]) {
    let mut distance = 0.;
    let mut prev: Option<(Duration, f64)> = None;
    for sample in samples.iter_mut() {
        if let Some((prev_time, prev_speed)) = prev {
            let dt = (sample.time - prev_time).as_secs_f64();
            distance += (prev_speed + sample.speed_kph) / 2. / 3.6 * dt;
        }
        prev = Some((sample.time, sample.speed_kph));
        sample.distance_m = distance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Compound, SessionType};
    use std::io::Write;
    use tempfile::TempDir;

    const EVENT_LINE: &str =
        r#"{"Event":{"name":"Belgian Grand Prix","year":2023,"session":"Qualifying"}}"#;
    const LAP_LINE: &str = r#"{"Lap":{"driver":"VER","team":"Red Bull Racing","lap_number":3,"lap_time_s":106.5,"sector1_time_s":31.0,"sector2_time_s":46.0,"sector3_time_s":29.5,"compound":"SOFT","is_quick":true}}"#;

    fn write_session(dir: &Path, year: &str, race: &str, stem: &str, lines: &[&str]) {
        let race_dir = dir.join(year).join(race);
        fs::create_dir_all(&race_dir).unwrap();
        let mut file = fs::File::create(race_dir.join(format!("{}.jsonl", stem))).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
    }

    #[test]
    fn test_fetch_by_partial_race_name() {
        let temp_dir = TempDir::new().unwrap();
        write_session(
            temp_dir.path(),
            "2023",
            "belgian_grand_prix",
            "qualifying",
            &[EVENT_LINE, LAP_LINE],
        );
        let provider = FileSessionProvider::new(temp_dir.path().to_path_buf());

        let session = provider
            .fetch(&SessionKey::new(2023, "Belgian", SessionType::Qualifying))
            .unwrap();
        assert_eq!(session.event.name, "Belgian Grand Prix");
        assert_eq!(session.laps.len(), 1);
        assert_eq!(session.laps[0].lap_time, Some(Duration::from_millis(106_500)));
    }

    #[test]
    fn test_fetch_missing_session_type() {
        let temp_dir = TempDir::new().unwrap();
        write_session(
            temp_dir.path(),
            "2023",
            "belgian_grand_prix",
            "qualifying",
            &[EVENT_LINE, LAP_LINE],
        );
        let provider = FileSessionProvider::new(temp_dir.path().to_path_buf());

        let result = provider.fetch(&SessionKey::new(2023, "Belgian Grand Prix", SessionType::Race));
        assert!(matches!(result, Err(PaddockError::SessionNotFound { .. })));
        let result = provider.fetch(&SessionKey::new(2022, "Belgian Grand Prix", SessionType::Qualifying));
        assert!(matches!(result, Err(PaddockError::SessionNotFound { .. })));
    }

    #[test]
    fn test_fetch_ambiguous_race_name() {
        let temp_dir = TempDir::new().unwrap();
        for race in ["emilia_romagna_grand_prix", "italian_grand_prix"] {
            write_session(temp_dir.path(), "2023", race, "race", &[EVENT_LINE, LAP_LINE]);
        }
        let provider = FileSessionProvider::new(temp_dir.path().to_path_buf());

        let result = provider.fetch(&SessionKey::new(2023, "Grand Prix", SessionType::Race));
        assert!(matches!(result, Err(PaddockError::AmbiguousRace { .. })));
        assert_eq!(
            provider.available_races(2023).unwrap(),
            vec!["emilia_romagna_grand_prix", "italian_grand_prix"]
        );
    }

    #[test]
    fn test_session_without_laps_is_incomplete() {
        let temp_dir = TempDir::new().unwrap();
        write_session(temp_dir.path(), "2023", "monaco", "qualifying", &[EVENT_LINE]);
        let provider = FileSessionProvider::new(temp_dir.path().to_path_buf());

        let result = provider.fetch(&SessionKey::new(2023, "Monaco", SessionType::Qualifying));
        assert!(matches!(result, Err(PaddockError::IncompleteSession { .. })));
    }

    #[test]
    fn test_corrupted_session_file() {
        let temp_dir = TempDir::new().unwrap();
        write_session(
            temp_dir.path(),
            "2023",
            "monaco",
            "qualifying",
            &[EVENT_LINE, "{not json"],
        );
        let provider = FileSessionProvider::new(temp_dir.path().to_path_buf());

        let result = provider.fetch(&SessionKey::new(2023, "Monaco", SessionType::Qualifying));
        assert!(matches!(result, Err(PaddockError::SessionLoadError { .. })));
    }

    #[test]
    fn test_out_of_order_samples_are_dropped() {
        let sample = |time_s: f64, speed_kph: f64| RecordedSample {
            time_s,
            distance_m: Some(time_s * 10.),
            speed_kph,
            throttle_pct: 100.,
            brake: false,
        };
        let samples = telemetry_from_records(&[
            sample(0.0, 10.),
            sample(0.5, 20.),
            sample(0.5, 25.),
            sample(0.25, 15.),
            sample(1.0, 30.),
        ]);
        let speeds: Vec<f64> = samples.iter().map(|s| s.speed_kph).collect();
        assert_eq!(speeds, vec![10., 20., 30.]);
        assert_eq!(samples[2].distance_m, 10.);
    }

    #[test]
    fn test_unrepresentable_timestamps_are_dropped() {
        let sample = |time_s: f64| RecordedSample {
            time_s,
            distance_m: Some(1.),
            speed_kph: 100.,
            throttle_pct: 100.,
            brake: false,
        };
        let samples = telemetry_from_records(&[
            sample(-1.),
            sample(f64::NAN),
            sample(0.5),
            sample(1e20),
            sample(f64::INFINITY),
            sample(0.75),
        ]);
        let times: Vec<Duration> = samples.iter().map(|s| s.time).collect();
        assert_eq!(times, vec![Duration::from_millis(500), Duration::from_millis(750)]);
    }

    #[test]
    fn test_unknown_compound_loads() {
        let temp_dir = TempDir::new().unwrap();
        let unknown = LAP_LINE.replace(r#""compound":"SOFT""#, r#""compound":"UNKNOWN""#);
        let test_unknown = LAP_LINE
            .replace(r#""lap_number":3"#, r#""lap_number":4"#)
            .replace(r#""compound":"SOFT""#, r#""compound":"TEST_UNKNOWN""#);
        write_session(
            temp_dir.path(),
            "2023",
            "monaco",
            "qualifying",
            &[EVENT_LINE, &unknown, &test_unknown, LAP_LINE],
        );
        let provider = FileSessionProvider::new(temp_dir.path().to_path_buf());

        let session = provider
            .fetch(&SessionKey::new(2023, "Monaco", SessionType::Qualifying))
            .unwrap();
        let compounds: Vec<Option<Compound>> = session.laps.iter().map(|l| l.compound).collect();
        assert_eq!(compounds, vec![None, None, Some(Compound::Soft)]);
    }

    #[test]
    fn test_missing_distance_is_integrated() {
        let sample = |time_s: f64, speed_kph: f64| RecordedSample {
            time_s,
            distance_m: None,
            speed_kph,
            throttle_pct: 0.,
            brake: false,
        };
        // constant 36 km/h = 10 m/s
        let samples = telemetry_from_records(&[sample(0.0, 36.), sample(1.0, 36.), sample(3.0, 36.)]);
        assert_eq!(samples[0].distance_m, 0.);
        assert!((samples[1].distance_m - 10.).abs() < 1e-9);
        assert!((samples[2].distance_m - 30.).abs() < 1e-9);
    }
}
