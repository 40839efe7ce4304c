//! fck-nat AWS provider
//!
//! A NAT gateway substitute built on the fck-nat AMI: one auto-scaled NAT
//! instance per egress subnet, with private subnet default routes pointed at
//! the instance's network interface.
//!
//! ## Module Structure
//!
//! - `nat` - `NatProvider` trait and the `FckNatInstanceProvider` orchestrator
//! - `pref_set` - Zone-preferring gateway assignment
//! - `props` - Instance configuration
//! - `schemas` - Resource schemas and builders (EC2, IAM, AutoScaling, SSM)
//! - `user_data` - Bootstrap payload for NAT instances
//! - `cloudwatch` - Default CloudWatch agent configuration
//! - `connections` - Security group ingress management

pub mod cloudwatch;
pub mod connections;
pub mod error;
pub mod nat;
pub mod pref_set;
pub mod props;
pub mod schemas;
pub mod user_data;

// Re-export main types
pub use connections::{Connections, Peer, Port};
pub use error::NatError;
pub use nat::{
    ConfigureNatOptions, FckNatInstanceProvider, GatewayConfig, NatProvider, SubnetSpec,
};
pub use pref_set::PrefSet;
pub use props::{InstanceType, MachineImage, NatInstanceConfig, NatInstanceProps, SshCredential};
