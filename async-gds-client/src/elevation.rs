//! Temporary privilege elevation for administrative directory calls.
//!
//! Some directory methods require an administrator identity. Rather than
//! keeping the whole session elevated, the client swaps the administrator
//! identity in immediately before such a call and restores the previous
//! identity immediately after, whether or not the call succeeded.

use std::sync::Arc;

use async_trait::async_trait;
use log::warn;
use parking_lot::Mutex;

use crate::{GdsError, GdsSession, IdentityToken};

/// Administrator credentials handed out by a [`CredentialProvider`].
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    /// The administrator identity.
    pub identity: Arc<IdentityToken>,
    /// Whether the elevation controller may keep the identity for
    /// subsequent elevations, instead of asking the provider again.
    pub cache: bool,
}

/// Source of administrator credentials.
///
/// Supplied to the client at construction time. The provider is consulted
/// the first time an elevation needs credentials, and again whenever
/// previously supplied credentials were rejected by the server. Returning
/// [`AdminCredentials::cache`] `= true` lets the controller keep the
/// identity for later elevations.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Produce administrator credentials, typically by prompting a user or
    /// reading a credential store. `None` means no credentials could be
    /// supplied, e.g. the prompt was dismissed.
    async fn acquire(&self) -> Option<AdminCredentials>;
}

/// Identity to restore once a privileged call has completed, returned by
/// [`ElevationController::elevate`].
#[derive(Debug)]
pub struct PreviousIdentity {
    previous: Arc<IdentityToken>,
    admin: Arc<IdentityToken>,
}

/// Swaps the session identity to an administrator identity for the duration
/// of a privileged call, and guarantees an attempt to swap back.
///
/// The controller owns the cached administrator identity outright: it is
/// written only here, and cleared whenever applying it to the session fails
/// so that the next elevation asks the provider again. Identities are
/// compared by pointer, not value; the "currently elevated" test is whether
/// the session identity is the same object the controller handed out.
///
/// Nested elevation is not supported. Elevating while already elevated is a
/// no-op that returns the administrator identity itself as the previous
/// identity, so the matching revert leaves the session untouched and the
/// outermost revert still restores the true original identity.
pub struct ElevationController {
    provider: Option<Arc<dyn CredentialProvider>>,
    admin: Mutex<Option<Arc<IdentityToken>>>,
    preferred_locales: Vec<String>,
}

impl ElevationController {
    /// Create a controller that obtains credentials from `provider`.
    pub fn new(
        provider: Option<Arc<dyn CredentialProvider>>,
        preferred_locales: Vec<String>,
    ) -> Self {
        Self {
            provider,
            admin: Mutex::new(None),
            preferred_locales,
        }
    }

    /// Switch `session` to the administrator identity, returning the
    /// identity that was active before.
    ///
    /// Fails with [`GdsError::PrivilegedOperationUnavailable`] when no
    /// credentials can be obtained, or when the server rejects them; in the
    /// latter case the cached credentials are cleared first. On failure the
    /// privileged call must not proceed.
    pub async fn elevate(&self, session: &dyn GdsSession) -> Result<PreviousIdentity, GdsError> {
        let previous = session.current_identity();
        let cached = self.admin.lock().clone();

        if let Some(admin) = &cached {
            if Arc::ptr_eq(admin, &previous) {
                // Already elevated.
                return Ok(PreviousIdentity {
                    previous,
                    admin: admin.clone(),
                });
            }
        }

        let admin = match cached {
            Some(admin) => admin,
            None => {
                let Some(provider) = &self.provider else {
                    return Err(GdsError::PrivilegedOperationUnavailable(
                        "No credential provider is registered".to_owned(),
                    ));
                };
                let Some(credentials) = provider.acquire().await else {
                    return Err(GdsError::PrivilegedOperationUnavailable(
                        "The credential provider did not supply credentials".to_owned(),
                    ));
                };
                if credentials.cache {
                    *self.admin.lock() = Some(credentials.identity.clone());
                }
                credentials.identity
            }
        };

        if let Err(status) = session
            .set_identity(admin.clone(), &self.preferred_locales)
            .await
        {
            // Force the provider to be asked again next time.
            *self.admin.lock() = None;
            return Err(GdsError::PrivilegedOperationUnavailable(format!(
                "The server rejected the administrator credentials: {status}"
            )));
        }

        Ok(PreviousIdentity { previous, admin })
    }

    /// Restore the identity captured by [`ElevationController::elevate`].
    ///
    /// The restore only happens while the session is still activated with
    /// the administrator identity that was applied; if something else has
    /// changed the identity in the meantime it is left alone. A failed
    /// restore is logged and not propagated: the outcome of the privileged
    /// call itself must not be obscured by cleanup.
    pub async fn revert(&self, session: &dyn GdsSession, previous: PreviousIdentity) {
        if Arc::ptr_eq(&previous.previous, &previous.admin) {
            // No-op elevation, nothing to restore.
            return;
        }
        if !Arc::ptr_eq(&session.current_identity(), &previous.admin) {
            return;
        }
        if let Err(status) = session
            .set_identity(previous.previous, &self.preferred_locales)
            .await
        {
            warn!("Failed to revert from the administrator identity: {status}");
        }
    }

    /// Drop any cached administrator identity.
    pub fn clear_cached_credentials(&self) {
        *self.admin.lock() = None;
    }
}
