//! An in-memory directory standing in for a GDS endpoint, scripted by the
//! protocol tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use gds_client::{
    ids, ApplicationRecordDataType, GdsClient, GdsClientConfig, GdsSession, IdentityToken,
};
use opcua_types::{
    BinaryEncodable, ByteString, ContextOwned, DateTime, MethodId, NodeId, ServerOnNetwork,
    StatusCode, TrustListDataType, TryFromVariant, Variant, VariantScalarTypeId,
};

/// Namespace index the mock assigns to the GDS namespace.
pub const GDS_NS: u16 = 2;

pub const ENDPOINT_URL: &str = "opc.tcp://localhost:58810";

/// Route log output through the test harness. Safe to call repeatedly.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Everything the scripted directory keeps between calls.
pub struct DirectoryState {
    pub servers: Vec<ServerOnNetwork>,
    pub reset_time: DateTime,
    /// Replace the reset time after this many QueryServers calls have been
    /// answered, simulating an index rebuild mid-enumeration.
    pub bump_reset_after: Option<(usize, DateTime)>,
    pub query_calls: usize,
    /// `(starting_record_id, max_records_to_return)` per QueryServers call.
    pub page_requests: Vec<(u32, u32)>,
    pub last_filters: Option<(String, String, String, Vec<String>)>,

    pub known_application: NodeId,
    pub certificate_groups: Vec<NodeId>,
    pub trust_list_node: NodeId,

    pub file_bytes: Vec<u8>,
    pub fail_open: bool,
    /// Fail the nth read call (1-based).
    pub fail_read_at: Option<usize>,
    pub open_handle: Option<u32>,
    pub next_handle: u32,
    pub read_pos: usize,
    pub open_calls: usize,
    pub read_calls: usize,
    pub close_calls: usize,

    /// FinishRequest answers "pending" this many times before completing.
    pub pending_polls: usize,
    pub issued_request: Option<NodeId>,
    pub certificate: ByteString,
    pub private_key: ByteString,
    pub issuer_certificates: Vec<ByteString>,

    pub registrations: Vec<ApplicationRecordDataType>,
    pub next_registration_id: u32,

    /// When set, administrative methods require the session to be activated
    /// with the administrator identity.
    pub require_admin: bool,
}

pub struct MockDirectory {
    connected: AtomicBool,
    pub connect_count: AtomicUsize,
    pub namespace_lookups: AtomicUsize,
    identity: Mutex<Arc<IdentityToken>>,
    /// Identity the directory accepts as administrator.
    pub admin: Arc<IdentityToken>,
    pub original: Arc<IdentityToken>,
    /// Every identity passed to `set_identity`, in order.
    pub identity_changes: Mutex<Vec<Arc<IdentityToken>>>,
    /// Number of `set_identity` calls to accept before rejecting the rest.
    /// `None` accepts everything.
    pub fail_identity_after: Mutex<Option<usize>>,
    pub state: Mutex<DirectoryState>,
}

impl MockDirectory {
    pub fn new() -> Arc<Self> {
        let original = Arc::new(IdentityToken::Anonymous);
        Arc::new(Self {
            connected: AtomicBool::new(false),
            connect_count: AtomicUsize::new(0),
            namespace_lookups: AtomicUsize::new(0),
            identity: Mutex::new(original.clone()),
            admin: Arc::new(IdentityToken::UserName(
                "appadmin".to_owned(),
                "demo".to_owned(),
            )),
            original,
            identity_changes: Mutex::new(Vec::new()),
            fail_identity_after: Mutex::new(None),
            state: Mutex::new(DirectoryState {
                servers: Vec::new(),
                reset_time: DateTime::now(),
                bump_reset_after: None,
                query_calls: 0,
                page_requests: Vec::new(),
                last_filters: None,
                known_application: NodeId::new(GDS_NS, 57u32),
                certificate_groups: vec![NodeId::new(GDS_NS, 615u32)],
                trust_list_node: NodeId::new(GDS_NS, 617u32),
                file_bytes: Vec::new(),
                fail_open: false,
                fail_read_at: None,
                open_handle: None,
                next_handle: 1,
                read_pos: 0,
                open_calls: 0,
                read_calls: 0,
                close_calls: 0,
                pending_polls: 0,
                issued_request: None,
                certificate: ByteString::from(vec![0xde, 0xad, 0xbe, 0xef]),
                private_key: ByteString::null(),
                issuer_certificates: Vec::new(),
                registrations: Vec::new(),
                next_registration_id: 5000,
                require_admin: false,
            }),
        })
    }

    pub fn mark_disconnected(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    fn check_admin(&self, state: &DirectoryState) -> Result<(), StatusCode> {
        if state.require_admin && !Arc::ptr_eq(&self.identity.lock().clone(), &self.admin) {
            return Err(StatusCode::BadUserAccessDenied);
        }
        Ok(())
    }

    fn query_servers(
        &self,
        state: &mut DirectoryState,
        args: Vec<Variant>,
    ) -> Result<Vec<Variant>, StatusCode> {
        let mut args = args.into_iter();
        let starting = take::<u32>(&mut args)?;
        let max_records = take::<u32>(&mut args)?;
        let application_name = take::<String>(&mut args)?;
        let application_uri = take::<String>(&mut args)?;
        let product_uri = take::<String>(&mut args)?;
        let capabilities = take_array::<String>(&mut args)?;

        state.query_calls += 1;
        state.page_requests.push((starting, max_records));
        state.last_filters = Some((application_name, application_uri, product_uri, capabilities));
        if let Some((after, bumped)) = state.bump_reset_after.clone() {
            if state.query_calls > after {
                state.reset_time = bumped;
            }
        }

        let page: Vec<Variant> = state
            .servers
            .iter()
            .filter(|s| s.record_id >= starting)
            .take(max_records as usize)
            .map(|s| Variant::from(s.clone()))
            .collect();
        Ok(vec![
            Variant::from(state.reset_time.clone()),
            Variant::from((VariantScalarTypeId::ExtensionObject, page)),
        ])
    }

    fn file_call(
        &self,
        state: &mut DirectoryState,
        method_id: &NodeId,
        args: Vec<Variant>,
    ) -> Result<Vec<Variant>, StatusCode> {
        let mut args = args.into_iter();
        if *method_id == NodeId::from(MethodId::FileType_Open) {
            let mode = take::<u8>(&mut args)?;
            if mode != 0x1 {
                return Err(StatusCode::BadInvalidArgument);
            }
            state.open_calls += 1;
            if state.fail_open {
                return Err(StatusCode::BadUserAccessDenied);
            }
            if state.open_handle.is_some() {
                return Err(StatusCode::BadInvalidState);
            }
            let handle = state.next_handle;
            state.next_handle += 1;
            state.open_handle = Some(handle);
            state.read_pos = 0;
            Ok(vec![handle.into()])
        } else if *method_id == NodeId::from(MethodId::FileType_Read) {
            let handle = take::<u32>(&mut args)?;
            let length = take::<i32>(&mut args)?;
            if state.open_handle != Some(handle) || length < 0 {
                return Err(StatusCode::BadInvalidArgument);
            }
            state.read_calls += 1;
            if state.fail_read_at == Some(state.read_calls) {
                return Err(StatusCode::BadUnexpectedError);
            }
            let end = state
                .file_bytes
                .len()
                .min(state.read_pos + length as usize);
            let chunk = state.file_bytes[state.read_pos..end].to_vec();
            state.read_pos = end;
            Ok(vec![ByteString::from(chunk).into()])
        } else if *method_id == NodeId::from(MethodId::FileType_Close) {
            let handle = take::<u32>(&mut args)?;
            if state.open_handle != Some(handle) {
                return Err(StatusCode::BadInvalidArgument);
            }
            state.close_calls += 1;
            state.open_handle = None;
            Ok(Vec::new())
        } else {
            Err(StatusCode::BadMethodInvalid)
        }
    }

    fn directory_call(
        &self,
        state: &mut DirectoryState,
        method: u32,
        args: Vec<Variant>,
    ) -> Result<Vec<Variant>, StatusCode> {
        use ids::methods::*;
        let mut args = args.into_iter();
        match method {
            DIRECTORY_QUERY_SERVERS => unreachable!("handled by caller"),
            DIRECTORY_START_NEW_KEY_PAIR_REQUEST | DIRECTORY_START_SIGNING_REQUEST => {
                self.check_admin(state)?;
                let application_id = take::<NodeId>(&mut args)?;
                if application_id != state.known_application {
                    return Err(StatusCode::BadNodeIdUnknown);
                }
                let request_id = NodeId::new(GDS_NS, 999u32);
                state.issued_request = Some(request_id.clone());
                Ok(vec![request_id.into()])
            }
            DIRECTORY_FINISH_REQUEST => {
                self.check_admin(state)?;
                let application_id = take::<NodeId>(&mut args)?;
                let request_id = take::<NodeId>(&mut args)?;
                if application_id != state.known_application
                    || state.issued_request != Some(request_id)
                {
                    return Err(StatusCode::BadNodeIdUnknown);
                }
                if state.pending_polls > 0 {
                    state.pending_polls -= 1;
                    return Ok(vec![
                        ByteString::null().into(),
                        ByteString::null().into(),
                        Variant::Empty,
                    ]);
                }
                let issuers: Vec<Variant> = state
                    .issuer_certificates
                    .iter()
                    .map(|c| Variant::from(c.clone()))
                    .collect();
                Ok(vec![
                    state.certificate.clone().into(),
                    state.private_key.clone().into(),
                    Variant::from((VariantScalarTypeId::ByteString, issuers)),
                ])
            }
            DIRECTORY_GET_CERTIFICATE_GROUPS => {
                let application_id = take::<NodeId>(&mut args)?;
                if application_id != state.known_application {
                    return Err(StatusCode::BadNodeIdUnknown);
                }
                let groups: Vec<Variant> = state
                    .certificate_groups
                    .iter()
                    .map(|g| Variant::from(g.clone()))
                    .collect();
                Ok(vec![Variant::from((VariantScalarTypeId::NodeId, groups))])
            }
            DIRECTORY_GET_TRUST_LIST => {
                let application_id = take::<NodeId>(&mut args)?;
                if application_id != state.known_application {
                    return Err(StatusCode::BadNodeIdUnknown);
                }
                Ok(vec![state.trust_list_node.clone().into()])
            }
            DIRECTORY_GET_CERTIFICATE_STATUS => {
                let application_id = take::<NodeId>(&mut args)?;
                if application_id != state.known_application {
                    return Err(StatusCode::BadNodeIdUnknown);
                }
                Ok(vec![false.into()])
            }
            DIRECTORY_REVOKE_CERTIFICATE => {
                self.check_admin(state)?;
                Ok(Vec::new())
            }
            DIRECTORY_REGISTER_APPLICATION => {
                self.check_admin(state)?;
                let mut record = take::<ApplicationRecordDataType>(&mut args)?;
                let id = NodeId::new(GDS_NS, state.next_registration_id);
                state.next_registration_id += 1;
                record.application_id = id.clone();
                state.registrations.push(record);
                Ok(vec![id.into()])
            }
            DIRECTORY_UPDATE_APPLICATION => {
                self.check_admin(state)?;
                let record = take::<ApplicationRecordDataType>(&mut args)?;
                let existing = state
                    .registrations
                    .iter_mut()
                    .find(|r| r.application_id == record.application_id)
                    .ok_or(StatusCode::BadNodeIdUnknown)?;
                *existing = record;
                Ok(Vec::new())
            }
            DIRECTORY_UNREGISTER_APPLICATION => {
                self.check_admin(state)?;
                let application_id = take::<NodeId>(&mut args)?;
                let before = state.registrations.len();
                state.registrations.retain(|r| r.application_id != application_id);
                if state.registrations.len() == before {
                    return Err(StatusCode::BadNodeIdUnknown);
                }
                Ok(Vec::new())
            }
            DIRECTORY_GET_APPLICATION => {
                let application_id = take::<NodeId>(&mut args)?;
                let record = state
                    .registrations
                    .iter()
                    .find(|r| r.application_id == application_id)
                    .ok_or(StatusCode::BadNodeIdUnknown)?;
                Ok(vec![Variant::from(record.clone())])
            }
            DIRECTORY_FIND_APPLICATIONS => {
                let uri = take::<String>(&mut args)?;
                let matches: Vec<Variant> = state
                    .registrations
                    .iter()
                    .filter(|r| r.application_uri.as_ref() == uri)
                    .map(|r| Variant::from(r.clone()))
                    .collect();
                Ok(vec![Variant::from((
                    VariantScalarTypeId::ExtensionObject,
                    matches,
                ))])
            }
            _ => Err(StatusCode::BadMethodInvalid),
        }
    }
}

#[async_trait]
impl GdsSession for MockDirectory {
    async fn connect(&self, endpoint_url: &str) -> Result<(), StatusCode> {
        if !endpoint_url.starts_with("opc.tcp://") {
            return Err(StatusCode::BadTcpEndpointUrlInvalid);
        }
        self.connect_count.fetch_add(1, Ordering::SeqCst);
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn call_method(
        &self,
        object_id: NodeId,
        method_id: NodeId,
        args: Vec<Variant>,
    ) -> Result<Vec<Variant>, StatusCode> {
        if !self.is_connected() {
            return Err(StatusCode::BadNotConnected);
        }
        let mut state = self.state.lock();
        if object_id == state.trust_list_node {
            return self.file_call(&mut state, &method_id, args);
        }
        if object_id != NodeId::new(GDS_NS, ids::objects::DIRECTORY) {
            return Err(StatusCode::BadNodeIdUnknown);
        }
        let Some(method) = method_id.as_u32() else {
            return Err(StatusCode::BadMethodInvalid);
        };
        if method_id.namespace != GDS_NS {
            return Err(StatusCode::BadMethodInvalid);
        }
        if method == ids::methods::DIRECTORY_QUERY_SERVERS {
            self.query_servers(&mut state, args)
        } else {
            self.directory_call(&mut state, method, args)
        }
    }

    fn current_identity(&self) -> Arc<IdentityToken> {
        self.identity.lock().clone()
    }

    async fn set_identity(
        &self,
        identity: Arc<IdentityToken>,
        _preferred_locales: &[String],
    ) -> Result<(), StatusCode> {
        self.identity_changes.lock().push(identity.clone());
        if let Some(allowed) = *self.fail_identity_after.lock() {
            if self.identity_changes.lock().len() > allowed {
                return Err(StatusCode::BadIdentityTokenRejected);
            }
        }
        *self.identity.lock() = identity;
        Ok(())
    }

    async fn namespace_index(&self, namespace_uri: &str) -> Result<u16, StatusCode> {
        self.namespace_lookups.fetch_add(1, Ordering::SeqCst);
        if namespace_uri == ids::GDS_NAMESPACE_URI {
            Ok(GDS_NS)
        } else {
            Err(StatusCode::BadNoMatch)
        }
    }
}

fn take<T: TryFromVariant>(args: &mut std::vec::IntoIter<Variant>) -> Result<T, StatusCode> {
    let v = args.next().ok_or(StatusCode::BadArgumentsMissing)?;
    T::try_from_variant(v).map_err(|_| StatusCode::BadInvalidArgument)
}

fn take_array<T: TryFromVariant>(
    args: &mut std::vec::IntoIter<Variant>,
) -> Result<Vec<T>, StatusCode> {
    let v = args.next().ok_or(StatusCode::BadArgumentsMissing)?;
    Option::<Vec<T>>::try_from_variant(v)
        .map(Option::unwrap_or_default)
        .map_err(|_| StatusCode::BadInvalidArgument)
}

/// Build a client over the mock with the default test configuration.
pub fn client_for(directory: &Arc<MockDirectory>) -> GdsClient {
    GdsClient::new(directory.clone(), GdsClientConfig::new(ENDPOINT_URL))
}

pub fn server_entry(record_id: u32) -> ServerOnNetwork {
    ServerOnNetwork {
        record_id,
        server_name: format!("Server {record_id}").into(),
        discovery_url: format!("opc.tcp://host{record_id}:4840").into(),
        server_capabilities: Some(vec!["DA".into()]),
    }
}

/// Encode a trust list whose binary form is exactly `total_len` bytes, by
/// sizing the single trusted certificate to pad it out. The fixed overhead
/// of the structure is 24 bytes.
pub fn trust_list_bytes(total_len: usize) -> (TrustListDataType, Vec<u8>) {
    assert!(total_len >= 24, "too small for the structure itself");
    let trust_list = TrustListDataType {
        specified_lists: 1,
        trusted_certificates: Some(vec![ByteString::from(vec![0xab; total_len - 24])]),
        trusted_crls: None,
        issuer_certificates: None,
        issuer_crls: None,
    };
    let ctx = ContextOwned::default();
    let mut bytes = Vec::new();
    BinaryEncodable::encode(&trust_list, &mut bytes, &ctx.context()).unwrap();
    assert_eq!(bytes.len(), total_len);
    (trust_list, bytes)
}

pub fn sample_record(uri: &str) -> ApplicationRecordDataType {
    ApplicationRecordDataType {
        application_id: NodeId::null(),
        application_uri: uri.into(),
        application_type: opcua_types::ApplicationType::Server,
        application_names: Some(vec![opcua_types::LocalizedText::new("en", "Sample")]),
        product_uri: "urn:sample:product".into(),
        discovery_urls: Some(vec!["opc.tcp://machine:4840".into()]),
        server_capabilities: Some(vec!["DA".into()]),
    }
}
