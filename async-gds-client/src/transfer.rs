//! Retrieval of trust lists over the OPC UA file transfer protocol.
//!
//! A trust list is exposed as a remote file object. Reading it is a strict
//! open, read chunks, close conversation against that object, with the file
//! handle scoped entirely to one call: handles are never kept or reused.

use log::warn;

use opcua_types::{
    BinaryDecodable, ByteString, ContextOwned, MethodId, NodeId, TrustListDataType, Variant,
};

use crate::{client::output_arg, GdsClient, GdsError};

/// File open mode bit for reading, per the OPC UA file type definition.
const OPEN_FILE_MODE_READ: u8 = 0x1;

impl GdsClient {
    /// Read and decode the trust list behind `trust_list_id`, a node id
    /// obtained from [`GdsClient::get_trust_list`].
    ///
    /// The file is read in fixed-size chunks until the server returns a
    /// short read. Whatever happens during reading, the file is closed
    /// again as long as the session still has a connection; a read error is
    /// surfaced in preference to any error from the close that follows it.
    pub async fn read_trust_list(
        &self,
        trust_list_id: &NodeId,
    ) -> Result<TrustListDataType, GdsError> {
        self.ensure_connected().await?;

        let file_handle = self.open_file(trust_list_id).await?;

        let read_result = self.read_to_end(trust_list_id, file_handle).await;

        // Guaranteed close attempt. Skipped only when the connection is
        // already gone, in which case the server has dropped the handle.
        let close_result = if self.session.is_connected() {
            self.close_file(trust_list_id, file_handle).await
        } else {
            Ok(())
        };

        let bytes = match read_result {
            Ok(bytes) => bytes,
            Err(read_error) => {
                if let Err(close_error) = close_result {
                    warn!("Failed to close trust list after read error: {close_error}");
                }
                return Err(read_error);
            }
        };
        close_result?;

        decode_trust_list(&bytes)
    }

    async fn open_file(&self, file_object: &NodeId) -> Result<u32, GdsError> {
        const METHOD: &str = "Open";
        let outputs = self
            .session
            .call_method(
                file_object.clone(),
                MethodId::FileType_Open.into(),
                vec![OPEN_FILE_MODE_READ.into()],
            )
            .await
            .map_err(GdsError::Fault)?;
        output_arg(&mut outputs.into_iter(), METHOD)
    }

    /// Read chunks until the server returns fewer bytes than asked for. A
    /// file of exactly N chunks costs one extra, empty read; that is the
    /// protocol's end-of-stream signal, there is no explicit marker.
    async fn read_to_end(
        &self,
        file_object: &NodeId,
        file_handle: u32,
    ) -> Result<Vec<u8>, GdsError> {
        const METHOD: &str = "Read";
        let chunk_size = self.config.file_chunk_size;
        let mut buffer = Vec::new();
        loop {
            let outputs = self
                .session
                .call_method(
                    file_object.clone(),
                    MethodId::FileType_Read.into(),
                    vec![file_handle.into(), Variant::from(chunk_size as i32)],
                )
                .await
                .map_err(GdsError::Fault)?;
            let chunk: ByteString = output_arg(&mut outputs.into_iter(), METHOD)?;
            let received = chunk.as_ref().len();
            buffer.extend_from_slice(chunk.as_ref());
            if (received as u32) < chunk_size {
                return Ok(buffer);
            }
        }
    }

    async fn close_file(&self, file_object: &NodeId, file_handle: u32) -> Result<(), GdsError> {
        self.session
            .call_method(
                file_object.clone(),
                MethodId::FileType_Close.into(),
                vec![file_handle.into()],
            )
            .await
            .map_err(GdsError::Fault)?;
        Ok(())
    }
}

/// Decode the assembled file contents as a trust list structure. Failing
/// here is distinct from failing to transfer the bytes in the first place.
fn decode_trust_list(bytes: &[u8]) -> Result<TrustListDataType, GdsError> {
    let ctx = ContextOwned::default();
    let mut stream = std::io::Cursor::new(bytes);
    TrustListDataType::decode(&mut stream, &ctx.context())
        .map_err(|e| GdsError::TransferDecode(e.to_string()))
}
