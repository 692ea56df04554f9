//! Async message plumbing around a [`Server`].
//!
//! The engine itself is synchronous; this module only moves request texts in
//! and response texts out over whatever transport the caller has.

use std::fmt;

use async_trait::async_trait;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tracing::{debug, trace};

use crate::dispatch::Server;
use crate::error::JsonRpcTransportError;
use crate::value::JsonBackend;

/// A bidirectional channel of JSON-RPC message texts
#[async_trait]
pub trait MessageTransport: Send {
    /// Next inbound message, or `None` once the peer is gone
    async fn recv(&mut self) -> Option<Result<String, JsonRpcTransportError>>;

    async fn send(&mut self, message: String) -> Result<(), JsonRpcTransportError>;
}

/// [`MessageTransport`] over a stream of inbound texts and a sink for outbound ones
pub struct StreamTransport<S, K> {
    inbound: S,
    outbound: K,
}

impl<S, K> StreamTransport<S, K> {
    pub fn new(inbound: S, outbound: K) -> Self {
        Self { inbound, outbound }
    }

    pub fn into_inner(self) -> (S, K) {
        (self.inbound, self.outbound)
    }
}

#[async_trait]
impl<S, K> MessageTransport for StreamTransport<S, K>
where
    S: Stream<Item = String> + Unpin + Send,
    K: Sink<String> + Unpin + Send,
    K::Error: fmt::Display,
{
    async fn recv(&mut self) -> Option<Result<String, JsonRpcTransportError>> {
        self.inbound.next().await.map(Ok)
    }

    async fn send(&mut self, message: String) -> Result<(), JsonRpcTransportError> {
        self.outbound
            .send(message)
            .await
            .map_err(|e| JsonRpcTransportError::ProtocolError(e.to_string()))
    }
}

/// Feed every inbound message through `server`, sending back whatever response
/// it produces, until the transport runs dry.
///
/// Returns the number of messages handled. Transport failures end the loop.
pub async fn serve<B, T>(
    server: &mut Server<B>,
    transport: &mut T,
) -> Result<usize, JsonRpcTransportError>
where
    B: JsonBackend,
    T: MessageTransport + ?Sized,
{
    let mut handled = 0;
    while let Some(message) = transport.recv().await {
        let message = message?;
        handled += 1;
        match server.execute(&message) {
            Some(response) => transport.send(response).await?,
            None => trace!("No response for message"),
        }
    }
    debug!(handled, "Transport closed");
    Ok(handled)
}
