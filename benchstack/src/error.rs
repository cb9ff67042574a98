use crate::Str;

/// The three failure classes an operator can see. Everything else travels as
/// plain `anyhow` context on top of one of these.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configuration file is malformed or selects an unsupported
    /// combination. Raised before any resource is provisioned.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A provisioning call failed. The run stops at the first failure and
    /// nothing is rolled back.
    #[error("failed to provision `{name}`: {cause:#}")]
    ResourceProvisioningFailure { name: Str, cause: anyhow::Error },

    /// A manifest could not be decoded, transformed, or applied.
    #[error("{0}")]
    ManifestApplyFailure(String),
}
