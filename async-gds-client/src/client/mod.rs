//! The GDS client itself: session plumbing shared by all protocols, plus the
//! one-shot directory operations. The multi-step protocols live next door:
//! server enumeration behind [`ServerQuery`] and trust list retrieval behind
//! [`GdsClient::read_trust_list`].

mod certificates;
mod registration;

pub use certificates::CertificateBundle;

use std::sync::Arc;

use parking_lot::Mutex;

use opcua_types::{NodeId, StatusCode, TryFromVariant, Variant};

use crate::{
    ids, CredentialProvider, ElevationController, GdsClientConfig, GdsError, GdsSession,
    ServerQuery,
};

/// Client for a global discovery server.
///
/// Layers the GDS request protocols on top of a connected session: paginated
/// server enumeration, the certificate request workflow, trust list
/// retrieval, application registration, and privilege elevation for the
/// administrative calls.
///
/// The client is designed for one caller context at a time. It never retries
/// or times out on its own; transport-level policy belongs to the session
/// implementation, and retry policy for polling calls such as
/// [`finish_request`](GdsClient::finish_request) belongs to the caller.
pub struct GdsClient {
    pub(crate) session: Arc<dyn GdsSession>,
    pub(crate) config: GdsClientConfig,
    pub(crate) elevation: ElevationController,
    // Namespace table index of the GDS namespace, resolved lazily and
    // dropped again whenever the session is observed disconnected.
    gds_namespace_index: Mutex<Option<u16>>,
}

impl GdsClient {
    /// Create a client driving the given session. Privileged operations will
    /// fail until a credential provider is supplied with
    /// [`GdsClient::with_credential_provider`].
    pub fn new(session: Arc<dyn GdsSession>, config: GdsClientConfig) -> Self {
        let locales = config.preferred_locales.clone();
        Self {
            session,
            config,
            elevation: ElevationController::new(None, locales),
            gds_namespace_index: Mutex::new(None),
        }
    }

    /// Set the source of administrator credentials for privileged calls.
    pub fn with_credential_provider(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        let locales = self.config.preferred_locales.clone();
        self.elevation = ElevationController::new(Some(provider), locales);
        self
    }

    /// The configuration the client was created with.
    pub fn config(&self) -> &GdsClientConfig {
        &self.config
    }

    /// Begin building a query for servers on the network. See [`ServerQuery`].
    pub fn query_servers(&self) -> ServerQuery<'_> {
        ServerQuery::new(self)
    }

    /// Connect the session to the configured endpoint if it is not already
    /// connected. Called by every protocol entry point before its first
    /// remote invocation.
    pub(crate) async fn ensure_connected(&self) -> Result<(), GdsError> {
        if self.session.is_connected() {
            return Ok(());
        }
        // Whatever we resolved from the old session is stale now.
        *self.gds_namespace_index.lock() = None;
        if self.config.endpoint_url.is_empty() {
            return Err(GdsError::Connection(StatusCode::BadTcpEndpointUrlInvalid));
        }
        self.session
            .connect(&self.config.endpoint_url)
            .await
            .map_err(GdsError::Connection)
    }

    /// Resolve a method on the directory object into concrete node IDs,
    /// using the session's namespace table.
    pub(crate) async fn directory_method(
        &self,
        method: u32,
    ) -> Result<(NodeId, NodeId), GdsError> {
        let ns = {
            let cached = *self.gds_namespace_index.lock();
            match cached {
                Some(ns) => ns,
                None => {
                    let ns = self
                        .session
                        .namespace_index(ids::GDS_NAMESPACE_URI)
                        .await
                        .map_err(GdsError::Fault)?;
                    *self.gds_namespace_index.lock() = Some(ns);
                    ns
                }
            }
        };
        Ok((
            NodeId::new(ns, ids::objects::DIRECTORY),
            NodeId::new(ns, method),
        ))
    }

    /// Invoke a directory method.
    pub(crate) async fn call_directory(
        &self,
        method: u32,
        args: Vec<Variant>,
    ) -> Result<Vec<Variant>, GdsError> {
        self.ensure_connected().await?;
        let (object_id, method_id) = self.directory_method(method).await?;
        self.session
            .call_method(object_id, method_id, args)
            .await
            .map_err(GdsError::Fault)
    }

    /// Invoke a directory method that requires administrator privileges,
    /// wrapped in elevate and revert. The revert runs whether or not the
    /// call succeeded.
    pub(crate) async fn call_directory_elevated(
        &self,
        method: u32,
        args: Vec<Variant>,
    ) -> Result<Vec<Variant>, GdsError> {
        self.ensure_connected().await?;
        let (object_id, method_id) = self.directory_method(method).await?;
        let previous = self.elevation.elevate(self.session.as_ref()).await?;
        let result = self
            .session
            .call_method(object_id, method_id, args)
            .await
            .map_err(GdsError::Fault);
        self.elevation.revert(self.session.as_ref(), previous).await;
        result
    }
}

/// Pull the next output argument off `outputs` and cast it.
pub(crate) fn output_arg<T: TryFromVariant>(
    outputs: &mut std::vec::IntoIter<Variant>,
    method: &'static str,
) -> Result<T, GdsError> {
    let variant = outputs
        .next()
        .ok_or_else(|| GdsError::unexpected(method, "Too few output arguments"))?;
    T::try_from_variant(variant).map_err(|e| GdsError::unexpected(method, e))
}

/// Like [`output_arg`] for trailing array outputs the server may leave out
/// entirely or send as an empty variant.
pub(crate) fn optional_array_arg<T: TryFromVariant>(
    outputs: &mut std::vec::IntoIter<Variant>,
    method: &'static str,
) -> Result<Vec<T>, GdsError> {
    match outputs.next() {
        None => Ok(Vec::new()),
        Some(variant) => Option::<Vec<T>>::try_from_variant(variant)
            .map(Option::unwrap_or_default)
            .map_err(|e| GdsError::unexpected(method, e)),
    }
}
