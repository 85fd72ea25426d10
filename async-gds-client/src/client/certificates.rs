//! The certificate lifecycle workflow: start a request, poll it to
//! completion, and the certificate group lookups that feed into it.
//!
//! Certificate requests are asynchronous on the server side. A start call
//! returns an opaque request id; the caller then polls
//! [`GdsClient::finish_request`] until the server has a certificate ready.
//! The client does not loop or sleep on the caller's behalf.

use opcua_types::{ByteString, NodeId, TryFromVariant, Variant, VariantScalarTypeId};

use crate::{ids, GdsError};

use super::{optional_array_arg, output_arg, GdsClient};

/// Result of a completed certificate request.
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateBundle {
    /// The issued certificate, DER encoded.
    pub certificate: ByteString,
    /// The private key, present only for key pair requests where the server
    /// generated the key.
    pub private_key: Option<ByteString>,
    /// Certificates of the issuing chain, in the order the server sent them.
    pub issuer_certificates: Vec<ByteString>,
}

impl GdsClient {
    /// Ask the directory to generate a new key pair and certificate for a
    /// registered application, returning the request id to poll with
    /// [`GdsClient::finish_request`].
    ///
    /// `private_key_format` is typically "PFX" or "PEM"; the password may be
    /// empty. Fails if `application_id` is not known to the server.
    #[allow(clippy::too_many_arguments)]
    pub async fn start_new_key_pair_request(
        &self,
        application_id: &NodeId,
        certificate_group_id: &NodeId,
        certificate_type_id: &NodeId,
        subject_name: &str,
        domain_names: &[String],
        private_key_format: &str,
        private_key_password: &str,
    ) -> Result<NodeId, GdsError> {
        const METHOD: &str = "StartNewKeyPairRequest";
        let domains: Vec<Variant> = domain_names.iter().map(|d| d.as_str().into()).collect();
        let outputs = self
            .call_directory_elevated(
                ids::methods::DIRECTORY_START_NEW_KEY_PAIR_REQUEST,
                vec![
                    application_id.clone().into(),
                    certificate_group_id.clone().into(),
                    certificate_type_id.clone().into(),
                    subject_name.into(),
                    Variant::from((VariantScalarTypeId::String, domains)),
                    private_key_format.into(),
                    private_key_password.into(),
                ],
            )
            .await?;
        output_arg(&mut outputs.into_iter(), METHOD)
    }

    /// Submit an externally produced certificate signing request. The
    /// request bytes are passed through opaque, returning the request id to
    /// poll with [`GdsClient::finish_request`].
    pub async fn start_signing_request(
        &self,
        application_id: &NodeId,
        certificate_group_id: &NodeId,
        certificate_type_id: &NodeId,
        certificate_request: ByteString,
    ) -> Result<NodeId, GdsError> {
        const METHOD: &str = "StartSigningRequest";
        let outputs = self
            .call_directory_elevated(
                ids::methods::DIRECTORY_START_SIGNING_REQUEST,
                vec![
                    application_id.clone().into(),
                    certificate_group_id.clone().into(),
                    certificate_type_id.clone().into(),
                    certificate_request.into(),
                ],
            )
            .await?;
        output_arg(&mut outputs.into_iter(), METHOD)
    }

    /// Poll a certificate request.
    ///
    /// Returns `None` while the server is still processing the request; the
    /// caller decides how often to retry. Once complete, the returned bundle
    /// carries the certificate, the private key when the server generated
    /// one, and the issuer chain exactly as the server ordered it.
    pub async fn finish_request(
        &self,
        application_id: &NodeId,
        request_id: &NodeId,
    ) -> Result<Option<CertificateBundle>, GdsError> {
        const METHOD: &str = "FinishRequest";
        let outputs = self
            .call_directory_elevated(
                ids::methods::DIRECTORY_FINISH_REQUEST,
                vec![application_id.clone().into(), request_id.clone().into()],
            )
            .await?;
        let mut outputs = outputs.into_iter();
        let certificate = output_arg::<Option<ByteString>>(&mut outputs, METHOD)?
            .unwrap_or_else(ByteString::null);
        if certificate.is_null_or_empty() {
            // Still pending. The server sends no key material with a
            // pending response, and none must be surfaced.
            return Ok(None);
        }
        let private_key: Option<ByteString> = match outputs.next() {
            None => None,
            Some(v) => Option::<ByteString>::try_from_variant(v)
                .map_err(|e| GdsError::unexpected(METHOD, e))?,
        };
        let issuer_certificates = optional_array_arg(&mut outputs, METHOD)?;
        Ok(Some(CertificateBundle {
            certificate,
            private_key: private_key.filter(|k| !k.is_null_or_empty()),
            issuer_certificates,
        }))
    }

    /// The certificate groups the directory manages for an application.
    pub async fn get_certificate_groups(
        &self,
        application_id: &NodeId,
    ) -> Result<Vec<NodeId>, GdsError> {
        const METHOD: &str = "GetCertificateGroups";
        let outputs = self
            .call_directory(
                ids::methods::DIRECTORY_GET_CERTIFICATE_GROUPS,
                vec![application_id.clone().into()],
            )
            .await?;
        optional_array_arg(&mut outputs.into_iter(), METHOD)
    }

    /// The node id of the trust list associated with one of an application's
    /// certificate groups. Feed the result to
    /// [`GdsClient::read_trust_list`](crate::GdsClient::read_trust_list).
    pub async fn get_trust_list(
        &self,
        application_id: &NodeId,
        certificate_group_id: &NodeId,
    ) -> Result<NodeId, GdsError> {
        const METHOD: &str = "GetTrustList";
        let outputs = self
            .call_directory(
                ids::methods::DIRECTORY_GET_TRUST_LIST,
                vec![
                    application_id.clone().into(),
                    certificate_group_id.clone().into(),
                ],
            )
            .await?;
        output_arg(&mut outputs.into_iter(), METHOD)
    }

    /// Whether the server wants the application to update a certificate,
    /// e.g. because the trust list changed or the certificate is expiring.
    pub async fn get_certificate_status(
        &self,
        application_id: &NodeId,
        certificate_group_id: &NodeId,
        certificate_type_id: &NodeId,
    ) -> Result<bool, GdsError> {
        const METHOD: &str = "GetCertificateStatus";
        let outputs = self
            .call_directory(
                ids::methods::DIRECTORY_GET_CERTIFICATE_STATUS,
                vec![
                    application_id.clone().into(),
                    certificate_group_id.clone().into(),
                    certificate_type_id.clone().into(),
                ],
            )
            .await?;
        output_arg(&mut outputs.into_iter(), METHOD)
    }

    /// Ask the directory to revoke a certificate it previously issued for
    /// the application.
    pub async fn revoke_certificate(
        &self,
        application_id: &NodeId,
        certificate: ByteString,
    ) -> Result<(), GdsError> {
        self.call_directory_elevated(
            ids::methods::DIRECTORY_REVOKE_CERTIFICATE,
            vec![application_id.clone().into(), certificate.into()],
        )
        .await?;
        Ok(())
    }
}
