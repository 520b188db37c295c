//! Turns fetched samples into the series the charts are drawn from.

pub mod group;
pub mod mppt;
pub mod sweep;

pub use group::{HostSeries, group_by_host};
pub use mppt::{MpptSeries, OffsetOverflow};
pub use sweep::build_curve;
