mod error;
mod match_config;
pub mod match_run;
pub mod network;
mod rail_app;

pub use error::RailMatchAppError;
pub use match_config::{
    MatchConfiguration, MatchingConfig, MissingStopPolicy, NetworkConfig, OutputConfig,
    TopologyConfig, TripOptions, TripSource,
};
pub use rail_app::{RailMatchApp, RailMatchOperation};
