pub mod agents;
pub mod checkpoint;
pub mod config;
pub mod env;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod noise;
pub mod off_policy_algorithm;

pub use error::{Error, Result};

pub trait Algorithm {
    fn run(&mut self) -> Result<()>;
}
