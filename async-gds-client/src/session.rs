//! The session boundary: a connected OPC UA session that the GDS protocols
//! drive by invoking methods on it.
//!
//! Establishing the session itself, including endpoint selection, transport
//! security and keep-alive, is the responsibility of the implementor. The
//! protocols in this crate only require the small surface captured by
//! [`GdsSession`]: connect on demand, report connectivity, call methods,
//! and switch the active user identity.

use std::sync::Arc;

use async_trait::async_trait;

use opcua_types::{NodeId, StatusCode, Variant};

/// Client-side identity token representation.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityToken {
    /// Anonymous identity token.
    Anonymous,
    /// User name and password token.
    UserName(String, String),
    /// X509 token, references a certificate and private key path on disk.
    X509(std::path::PathBuf, std::path::PathBuf),
}

/// A connected session to an OPC UA server hosting a global discovery server.
///
/// The GDS protocols treat the session as a shared, single-caller resource:
/// one logical session, used by one caller context at a time. Identities are
/// handed around as `Arc<IdentityToken>` so that the elevation protocol can
/// compare them by pointer identity, the same way it would compare object
/// references in a managed runtime.
///
/// Implementations fold session-level notifications ("session closing",
/// "keep-alive degraded") into [`GdsSession::is_connected`]: once such a
/// notification is observed, `is_connected` must return `false` so the next
/// protocol call re-establishes the connection.
#[async_trait]
pub trait GdsSession: Send + Sync {
    /// Connect to the server at `endpoint_url`, establishing a secure channel
    /// and activating a session. Fails on a malformed URL or on any channel
    /// or session establishment error.
    async fn connect(&self, endpoint_url: &str) -> Result<(), StatusCode>;

    /// Whether the session is currently connected and usable.
    fn is_connected(&self) -> bool;

    /// Call a single method on the server, returning its output arguments in
    /// order. Fails when the object or method is unknown, when the input
    /// arguments do not match the method signature, or with the server's
    /// service-level fault code.
    async fn call_method(
        &self,
        object_id: NodeId,
        method_id: NodeId,
        args: Vec<Variant>,
    ) -> Result<Vec<Variant>, StatusCode>;

    /// The identity the session is currently activated with.
    fn current_identity(&self) -> Arc<IdentityToken>;

    /// Re-activate the session with a different identity. May fail, e.g. when
    /// the server rejects the credentials, in which case the previous
    /// identity remains active.
    async fn set_identity(
        &self,
        identity: Arc<IdentityToken>,
        preferred_locales: &[String],
    ) -> Result<(), StatusCode>;

    /// Index of `namespace_uri` in the server's namespace table.
    async fn namespace_index(&self, namespace_uri: &str) -> Result<u16, StatusCode>;
}
