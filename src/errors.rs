// Error types for paddock

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum PaddockError {
    // Selection errors
    #[snafu(display("Select the Year and the Race Name before generating a plot."))]
    InvalidSelection,
    #[snafu(display("Invalid user input: {field} - {reason}"))]
    InvalidUserInput { field: String, reason: String },
    #[snafu(display("Select two distinct drivers"))]
    InvalidDriverSelection,

    // Errors while fetching session data
    #[snafu(display("No {session} session found for {year} {race}"))]
    SessionNotFound {
        year: u16,
        race: String,
        session: String,
    },
    #[snafu(display("Race name {race} matches more than one event in {year}: {candidates}"))]
    AmbiguousRace {
        year: u16,
        race: String,
        candidates: String,
    },
    #[snafu(display("Error loading session file {path}"))]
    SessionLoadError { path: String, source: io::Error },
    #[snafu(display("Session data is incomplete: {reason}"))]
    IncompleteSession { reason: String },

    // Errors for degenerate session data
    #[snafu(display("No valid lap found for {driver}"))]
    NoValidLap { driver: String },
    #[snafu(display("No telemetry available for {driver} on lap {lap_number}"))]
    NoTelemetry { driver: String, lap_number: u32 },

    // Errors for the session writer
    #[snafu(display("Error writing session file"))]
    WriterError { source: io::Error },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },
}

impl PaddockError {
    /// Whether the error came from the data provider rather than from the user or the data itself.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            PaddockError::SessionNotFound { .. }
                | PaddockError::AmbiguousRace { .. }
                | PaddockError::SessionLoadError { .. }
                | PaddockError::IncompleteSession { .. }
        )
    }
}
