//! Error types
//!
//! Every failure is terminal for the current attempt; there is no retry
//! policy anywhere in the crate. Variants carry the originating rusb error
//! so diagnostics survive the trip to the caller.

use thiserror::Error;

/// Errors raised while acquiring or driving the switch.
#[derive(Debug, PartialEq, Error)]
pub enum Error {
    /// Bus enumeration itself failed.
    #[error("Failed to enumerate USB devices: {0}")]
    Enumeration(#[source] rusb::Error),

    /// The active configuration descriptor could not be read.
    #[error("Failed to read active config descriptor: {0}")]
    ActiveConfig(#[source] rusb::Error),

    /// The bus or the device did not look like the fixed hardware we expect.
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// Opening a handle to the matched device failed.
    #[error("Failed to open device: {0}")]
    Open(#[source] rusb::Error),

    /// Querying kernel-driver state for the target interface failed.
    #[error("Failed to query kernel driver state: {0}")]
    DriverQuery(#[source] rusb::Error),

    /// Detaching the kernel driver from the target interface failed.
    #[error("Failed to detach kernel driver: {0}")]
    Detach(#[source] rusb::Error),

    /// Claiming the target interface failed.
    #[error("Failed to claim interface: {0}")]
    Claim(#[source] rusb::Error),

    /// A Set Report control transfer failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Mismatches between the bus contents and the assumed-fixed hardware
/// topology. Zero or multiple matching devices are failures by design: the
/// tool drives exactly one switch.
#[derive(Debug, PartialEq, Error)]
pub enum TopologyError {
    #[error("No matching KVM device found")]
    NoMatch,

    #[error("Found {0} matching KVM devices, expected exactly one")]
    MultipleMatches(usize),

    #[error("Unexpected number of interfaces: {0}, expected 2")]
    InterfaceCount(usize),

    #[error("Unexpected number of alternate settings: {0}, expected 1")]
    AltSettingCount(usize),
}

/// Failures of an individual Set Report transfer.
#[derive(Debug, PartialEq, Error)]
pub enum ProtocolError {
    /// The control transfer reported an error.
    #[error("Control transfer failed: {0}")]
    Transfer(#[source] rusb::Error),

    /// The transfer succeeded but wrote fewer bytes than the report length.
    #[error("Short write: sent {wrote} of {expected} bytes")]
    ShortWrite { wrote: usize, expected: usize },
}

/// Type alias for results within this crate.
pub type Result<T> = std::result::Result<T, Error>;
