pub mod acceleration;
pub mod distribution;
pub mod fastest_lap;
pub mod head_to_head;
pub mod sectors;

use std::time::Duration;

pub use acceleration::{
    AccelerationInterval, acceleration_interval, race_start_acceleration, rank_acceleration,
};
pub use distribution::{DriverLapDistribution, LapSample, kernel_density, race_lap_distribution};
pub use fastest_lap::{LapDelta, fastest_lap, qualifying_deltas};
pub use head_to_head::{DriverTrace, head_to_head};
pub use sectors::{SectorBest, sector_personal_bests};

/// Format a lap time as `m:ss.mmm`
pub fn format_lap_time(time: Duration) -> String {
    let millis = time.as_millis();
    format!(
        "{}:{:02}.{:03}",
        millis / 60_000,
        (millis / 1000) % 60,
        millis % 1000
    )
}

/// Format a gap as `s.mmm`
pub fn format_delta(delta: Duration) -> String {
    format!("{}.{:03}", delta.as_secs(), delta.subsec_millis())
}
