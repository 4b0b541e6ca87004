//! Zkvote transport related types.
//!
//! The transport carries point-to-point messages. Every message travels
//! on its own stream: the sender opens a stream tagged with a protocol
//! name, writes the whole body and closes it. The receiver dispatches the
//! stream to the [StreamHandler] registered for that protocol name, so
//! the direction of a request/response exchange is told apart by the
//! protocol name rather than by the message content.

use crate::*;
use std::sync::{Arc, Weak};

/// The receiving side of a single inbound stream.
pub trait InboundStream: 'static + Send + std::fmt::Debug {
    /// The peer that opened this stream.
    fn remote_peer(&self) -> PeerId;

    /// The protocol name the stream was opened with.
    fn protocol(&self) -> &str;

    /// Read the full stream body.
    fn read_to_end(&mut self) -> BoxFut<'_, ZkvResult<bytes::Bytes>>;

    /// Close the stream after a successful read.
    fn close(self: Box<Self>);

    /// Abort the stream after a failure.
    fn reset(self: Box<Self>);
}

/// Boxed [InboundStream].
pub type DynInboundStream = Box<dyn InboundStream>;

/// Handles inbound streams for one protocol name.
pub trait StreamHandler: 'static + Send + Sync + std::fmt::Debug {
    /// Handle one inbound stream. Each stream is handled in its own
    /// task, errors are to be handled (logged) by the implementation.
    fn handle_stream(&self, stream: DynInboundStream) -> BoxFut<'_, ()>;
}

/// Trait-object [StreamHandler].
pub type DynStreamHandler = Arc<dyn StreamHandler>;

/// A point-to-point stream transport.
pub trait Transport: 'static + Send + Sync + std::fmt::Debug {
    /// The id of the local peer.
    fn peer_id(&self) -> PeerId;

    /// Addresses at which the local peer can be reached.
    fn listen_addrs(&self) -> Vec<PeerAddr>;

    /// Register the handler for inbound streams of a protocol.
    /// Replaces any handler previously registered for the same protocol.
    fn set_stream_handler(&self, protocol: &str, handler: DynStreamHandler);

    /// Open a new stream to `peer` tagged with `protocol`, write `data`
    /// as the whole body and close the stream.
    ///
    /// Resolves once the data is handed to the remote side. It does not
    /// wait for the remote handler to process it.
    fn send(
        &self,
        peer: PeerId,
        protocol: &str,
        data: bytes::Bytes,
    ) -> BoxFut<'_, ZkvResult<()>>;
}

/// Trait-object [Transport].
pub type DynTransport = Arc<dyn Transport>;

/// A weak trait-object [Transport].
pub type WeakDynTransport = Weak<dyn Transport>;

/// A factory for creating Transport instances.
pub trait TransportFactory: 'static + Send + Sync + std::fmt::Debug {
    /// Help the builder construct a default config from the chosen
    /// module factories.
    fn default_config(&self, config: &mut Config) -> ZkvResult<()>;

    /// Construct a transport instance.
    fn create(
        &self,
        builder: Arc<Builder>,
    ) -> BoxFut<'static, ZkvResult<DynTransport>>;
}

/// Trait-object [TransportFactory].
pub type DynTransportFactory = Arc<dyn TransportFactory>;
