//! Node identifiers defined by the OPC UA GDS information model.
//!
//! These live in the GDS namespace, whose index differs from server to
//! server; the client resolves the namespace index from the session's
//! namespace table before building concrete [`NodeId`]s from the numeric
//! identifiers below.
//!
//! [`NodeId`]: opcua_types::NodeId

/// URI of the GDS namespace containing the directory object and its methods.
pub const GDS_NAMESPACE_URI: &str = "http://opcfoundation.org/UA/GDS/";

/// Numeric identifiers of GDS objects.
pub mod objects {
    /// The directory object that all GDS methods are invoked on.
    pub const DIRECTORY: u32 = 141;
    /// Binary encoding node for `ApplicationRecordDataType`.
    pub const APPLICATION_RECORD_DATA_TYPE_ENCODING_DEFAULT_BINARY: u32 = 134;
}

/// Numeric identifiers of GDS data types.
pub mod data_types {
    /// `ApplicationRecordDataType`.
    pub const APPLICATION_RECORD_DATA_TYPE: u32 = 1;
}

/// Numeric identifiers of the directory object's methods.
pub mod methods {
    /// `FindApplications(applicationUri) -> applications`.
    pub const DIRECTORY_FIND_APPLICATIONS: u32 = 143;
    /// `RegisterApplication(application) -> applicationId`.
    pub const DIRECTORY_REGISTER_APPLICATION: u32 = 146;
    /// `UnregisterApplication(applicationId)`.
    pub const DIRECTORY_UNREGISTER_APPLICATION: u32 = 149;
    /// `QueryServers(startingRecordId, maxRecordsToReturn, applicationName,
    /// applicationUri, productUri, serverCapabilities)
    /// -> (lastCounterResetTime, servers)`.
    pub const DIRECTORY_QUERY_SERVERS: u32 = 151;
    /// `StartNewKeyPairRequest(applicationId, certificateGroupId,
    /// certificateTypeId, subjectName, domainNames, privateKeyFormat,
    /// privateKeyPassword) -> requestId`.
    pub const DIRECTORY_START_NEW_KEY_PAIR_REQUEST: u32 = 154;
    /// `StartSigningRequest(applicationId, certificateGroupId,
    /// certificateTypeId, certificateRequest) -> requestId`.
    pub const DIRECTORY_START_SIGNING_REQUEST: u32 = 157;
    /// `FinishRequest(applicationId, requestId)
    /// -> (certificate, privateKey, issuerCertificates)`.
    pub const DIRECTORY_FINISH_REQUEST: u32 = 163;
    /// `UpdateApplication(application)`.
    pub const DIRECTORY_UPDATE_APPLICATION: u32 = 200;
    /// `GetTrustList(applicationId, certificateGroupId) -> trustListId`.
    pub const DIRECTORY_GET_TRUST_LIST: u32 = 204;
    /// `GetApplication(applicationId) -> application`.
    pub const DIRECTORY_GET_APPLICATION: u32 = 216;
    /// `GetCertificateStatus(applicationId, certificateGroupId,
    /// certificateTypeId) -> updateRequired`.
    pub const DIRECTORY_GET_CERTIFICATE_STATUS: u32 = 222;
    /// `GetCertificateGroups(applicationId) -> certificateGroupIds`.
    pub const DIRECTORY_GET_CERTIFICATE_GROUPS: u32 = 508;
    /// `RevokeCertificate(applicationId, certificate)`.
    pub const DIRECTORY_REVOKE_CERTIFICATE: u32 = 995;
}
