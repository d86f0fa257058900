pub mod network;
pub mod run;

pub use network::{ChannelObservation, Network, NetworkCategory};
pub use run::ReportRun;
