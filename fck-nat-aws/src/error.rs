//! Error types for NAT provisioning

use fck_nat_core::provider::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NatError {
    /// Invalid configuration, detected before any resource is provisioned
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Accessor used before the provider was configured
    #[error("{0}")]
    State(String),

    /// Gateway lookup on a table with no registrations
    #[error("Cannot pick, set is empty")]
    EmptyCollection,

    /// Failure reported by the provisioner
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl NatError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Error for an accessor called before `configure_nat`
    pub fn not_configured(accessor: &str) -> Self {
        Self::State(format!(
            "Pass the FckNatInstanceProvider to a Vpc before accessing '{}'",
            accessor
        ))
    }
}

pub type NatResult<T> = Result<T, NatError>;
