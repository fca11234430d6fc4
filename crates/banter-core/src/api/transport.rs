//! Transport trait definition for the streaming completion endpoint.

use banter_types::error::TransportError;
use bytes::Bytes;
use futures_util::Stream;

use std::pin::Pin;

use crate::api::request::RequestSpec;

/// Byte-chunk stream produced by an open transport.
///
/// Chunk boundaries are arbitrary; line reassembly happens downstream in
/// the stream assembler.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send + 'static>>;

/// Transport for sending a shaped request and reading the chunked response.
///
/// Implementations live in banter-infra (e.g., `HttpTransport`). Dropping
/// the returned stream closes the underlying connection; stream
/// cancellation relies on this.
pub trait Transport: Send + Sync {
    /// Send the request and open its response byte stream.
    ///
    /// Fails with `TransportError::Connect` when the endpoint is
    /// unreachable and `TransportError::Status` on a non-success response.
    /// Mid-stream failures surface as `Err` items inside the stream.
    fn open(
        &self,
        request: &RequestSpec,
    ) -> impl std::future::Future<Output = Result<ByteStream, TransportError>> + Send;
}
