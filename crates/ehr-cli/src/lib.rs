//! Library side of the `ehr-codemap` command: configuration, logging,
//! the checkpointed normalization driver and the `map` flow.

pub mod config;
pub mod logging;
pub mod pipeline;
pub mod run;
pub mod types;
