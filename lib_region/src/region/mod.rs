pub mod failover;
pub mod status;

pub use failover::{FailoverCoordinator, FailoverError, FailoverReport, RegionTopology};
pub use status::RegionStatusService;
