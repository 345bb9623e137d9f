use std::{
    fs,
    io::BufWriter,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use serde_jsonlines::JsonLinesWriter;

use crate::{
    PaddockError,
    session::{RecordedSample, SessionData, SessionRecord, TelemetryRecord, normalize_race_name},
};

/// Where a session export lives inside a data directory
pub fn session_file_path(data_dir: &Path, session: &SessionData) -> PathBuf {
    data_dir
        .join(session.event.year.to_string())
        .join(normalize_race_name(&session.event.name))
        .join(session.event.session.file_stem())
        .with_extension("jsonl")
}

/// Write a session as JSON lines: the event first, then drivers, laps and telemetry traces
/// ordered by driver and lap.
pub fn write_session(file: &Path, session: &SessionData) -> Result<(), PaddockError> {
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).map_err(|e| PaddockError::WriterError { source: e })?;
    }
    let session_file = fs::File::create(file).map_err(|e| PaddockError::WriterError { source: e })?;
    let mut session_file_writer = JsonLinesWriter::new(BufWriter::new(session_file));

    let records = std::iter::once(SessionRecord::Event(session.event.clone()))
        .chain(session.drivers.iter().cloned().map(SessionRecord::Driver))
        .chain(session.laps.iter().cloned().map(SessionRecord::Lap))
        .chain(
            session
                .telemetry_traces()
                .sorted_by(|a, b| a.0.cmp(b.0).then(a.1.cmp(&b.1)))
                .map(|(driver, lap_number, samples)| {
                    SessionRecord::Telemetry(TelemetryRecord {
                        driver: driver.to_string(),
                        lap_number,
                        samples: samples.iter().map(RecordedSample::from).collect(),
                    })
                }),
        );

    session_file_writer
        .write_all(records)
        .map_err(|e| PaddockError::WriterError { source: e })?;
    session_file_writer
        .flush()
        .map_err(|e| PaddockError::WriterError { source: e })?;
    Ok(())
}
