//! Structures exchanged with the directory that are not part of the core
//! OPC UA type set, plus the type loader that lets sessions decode them.

use opcua_types::{
    ApplicationType, Context, DynEncodable, EncodingResult, ExpandedMessageInfo, ExpandedNodeId,
    LocalizedText, NodeId, TypeLoader, TypeLoaderInstance, TypeLoaderPriority, UAString,
};

use crate::ids;

// The encoding derive macros generate paths relative to this.
mod opcua {
    pub(super) use opcua_types as types;
}

/// A directory entry describing one registered application, defined in the
/// GDS namespace as `ApplicationRecordDataType`.
///
/// Records are owned by the server; the client only ever holds snapshots.
/// The `application_id` is assigned by the server at registration time and
/// is null in a record that has not been registered yet.
#[derive(Debug, Clone, PartialEq, opcua_types::BinaryEncodable, opcua_types::BinaryDecodable)]
pub struct ApplicationRecordDataType {
    /// Server-assigned identity of the record.
    pub application_id: NodeId,
    /// Globally unique application instance URI.
    pub application_uri: UAString,
    /// Whether the application is a client, server, or both.
    pub application_type: ApplicationType,
    /// Localized names for the application.
    pub application_names: Option<Vec<LocalizedText>>,
    /// URI of the product the application is an instance of.
    pub product_uri: UAString,
    /// Discovery URLs for server applications.
    pub discovery_urls: Option<Vec<UAString>>,
    /// Server capability identifiers, e.g. "LDS" or "DA".
    pub server_capabilities: Option<Vec<UAString>>,
}

impl ExpandedMessageInfo for ApplicationRecordDataType {
    fn full_type_id(&self) -> ExpandedNodeId {
        ExpandedNodeId {
            node_id: NodeId::new(
                0,
                ids::objects::APPLICATION_RECORD_DATA_TYPE_ENCODING_DEFAULT_BINARY,
            ),
            namespace_uri: ids::GDS_NAMESPACE_URI.into(),
            server_index: 0,
        }
    }

    fn full_json_type_id(&self) -> ExpandedNodeId {
        ExpandedNodeId::null()
    }

    fn full_xml_type_id(&self) -> ExpandedNodeId {
        ExpandedNodeId::null()
    }

    fn full_data_type_id(&self) -> ExpandedNodeId {
        ExpandedNodeId {
            node_id: NodeId::new(0, ids::data_types::APPLICATION_RECORD_DATA_TYPE),
            namespace_uri: ids::GDS_NAMESPACE_URI.into(),
            server_index: 0,
        }
    }
}

static TYPES: std::sync::LazyLock<TypeLoaderInstance> = std::sync::LazyLock::new(|| {
    let mut inst = TypeLoaderInstance::new();
    inst.add_binary_type(
        ids::data_types::APPLICATION_RECORD_DATA_TYPE,
        ids::objects::APPLICATION_RECORD_DATA_TYPE_ENCODING_DEFAULT_BINARY,
        opcua_types::binary_decode_to_enc::<ApplicationRecordDataType>,
    );
    inst
});

/// Type loader for the structures in the GDS namespace.
///
/// Session implementations must register this so that extension objects
/// returned by the directory, e.g. from `GetApplication`, decode into
/// [`ApplicationRecordDataType`] rather than staying opaque.
#[derive(Debug, Clone, Copy)]
pub struct GdsTypeLoader;

impl TypeLoader for GdsTypeLoader {
    fn load_from_binary(
        &self,
        node_id: &NodeId,
        stream: &mut dyn std::io::Read,
        ctx: &Context<'_>,
    ) -> Option<EncodingResult<Box<dyn DynEncodable>>> {
        let idx = ctx.namespaces().get_index(ids::GDS_NAMESPACE_URI)?;
        if idx != node_id.namespace {
            return None;
        }
        let num_id = node_id.as_u32()?;
        TYPES.decode_binary(num_id, stream, ctx)
    }

    fn priority(&self) -> TypeLoaderPriority {
        TypeLoaderPriority::Generated
    }
}
