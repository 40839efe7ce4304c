//! fck-nat Core
//!
//! Resource model and synthesis plumbing for the fck-nat NAT instance provider.
//! Resources are described as values and recorded into a plan; nothing here
//! talks to a cloud API.

pub mod effect;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod synth;
pub mod template;
