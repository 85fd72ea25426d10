//! Errors produced by the GDS client protocols.

use chrono::{DateTime, Utc};
use thiserror::Error;

use opcua_types::StatusCode;

/// Error type for all GDS client operations.
///
/// Variants map to the failure classes of the individual protocols. None of
/// these are retried internally; retry and backoff policy belongs to the
/// caller, or to the session layer for transport-level concerns.
#[derive(Error, Debug)]
pub enum GdsError {
    /// Connecting to the discovery server failed, either because the
    /// configured endpoint URL is absent or malformed, or because secure
    /// channel or session establishment failed.
    #[error("Failed to connect to the discovery server: {0}")]
    Connection(StatusCode),

    /// The server rejected a method call: unknown object or method,
    /// mismatched arguments, or a service-level fault. The status code is
    /// the server's verdict, propagated verbatim.
    #[error("The discovery server rejected the request: {0}")]
    Fault(StatusCode),

    /// The server rebuilt its discovery index while an enumeration was in
    /// progress. Record IDs issued before the reset can no longer be used as
    /// a cursor, so the enumeration is terminated rather than risk skipping
    /// or duplicating entries. Start a new query to continue.
    #[error("Server index was reset at {observed}, invalidating the running query (baseline {previous})")]
    EnumerationInvalidated {
        /// Reset time the enumerator had previously observed.
        previous: DateTime<Utc>,
        /// Strictly newer reset time reported by the server.
        observed: DateTime<Utc>,
    },

    /// A privileged operation was attempted but administrator credentials
    /// could not be obtained or were rejected by the server. Any cached
    /// credentials have been cleared, so the next attempt will ask the
    /// credential provider again.
    #[error("Privileged operation unavailable: {0}")]
    PrivilegedOperationUnavailable(String),

    /// The trust list bytes were retrieved successfully but could not be
    /// decoded as a trust list structure.
    #[error("Failed to decode the retrieved trust list: {0}")]
    TransferDecode(String),

    /// The server answered a method call with output arguments that do not
    /// match the method's signature.
    #[error("Unexpected response from {method}: {details}")]
    UnexpectedResponse {
        /// Name of the remote method that produced the response.
        method: &'static str,
        /// What was wrong with it.
        details: String,
    },
}

impl GdsError {
    pub(crate) fn unexpected(method: &'static str, details: impl ToString) -> Self {
        Self::UnexpectedResponse {
            method,
            details: details.to_string(),
        }
    }
}
