// Library interface for paddock
// This allows integration tests to access internal modules

pub mod aggregation;
pub mod errors;
pub mod panels;
pub mod session;
pub mod writer;

// Re-export commonly used types
pub use errors::PaddockError;
pub use panels::{ChartData, Dashboard, PanelKind, PanelRequest, SessionContext};
pub use session::{FileSessionProvider, SessionData, SessionKey, SessionProvider, SessionType};
