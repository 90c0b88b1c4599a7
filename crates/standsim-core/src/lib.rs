pub mod action;
pub mod assessment;
pub mod config;
pub mod dispatch;
pub mod encoder;
pub mod error;
pub mod features;
pub mod io;
pub mod job;
pub mod join;
pub mod keyword;
pub mod metrics;
pub mod output;
pub mod paths;
pub mod simulator;

pub use error::{Result, StandsimError};
