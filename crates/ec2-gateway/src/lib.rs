//! ec2-gateway - lifecycle gateway for EC2 resources
//!
//! Requests become intents, intents become plans of provider calls with
//! compensation, and instance transitions are confirmed by polling before
//! anything is returned to the caller.

pub mod aws;
pub mod compensation;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod planner;
pub mod wait;

#[cfg(test)]
pub(crate) mod testing;

pub use error::GatewayError;
pub use gateway::{Execution, Gateway, GatewaySettings};
