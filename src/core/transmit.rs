//! Purpose: Response-transmission capability handed to route handlers.
//! Exports: `ResponseTransmitter`, `Transmitter`, `Reply`, `ChannelTransmitter`, `channel`.
//! Role: Boundary between a handler's outcome and whatever delivers it to the caller.
//! Invariants: A transmitter is consumed by its first terminal reply.
//! Invariants: Delivery failures are logged, never surfaced to the handler.

use std::sync::mpsc;

use serde_json::Value;

use crate::core::jsonrpc::JsonRpcError;

/// Terminal outcome of one request.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Result(Value),
    Error(JsonRpcError),
}

impl Reply {
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }
}

/// Delivers exactly one outcome for a request back to its caller.
///
/// Both methods take `self` by box so a handler cannot send a second
/// terminal reply through the same transmitter.
pub trait ResponseTransmitter: Send {
    fn send(self: Box<Self>, result: Value);
    fn send_error(self: Box<Self>, error: JsonRpcError);
}

pub type Transmitter = Box<dyn ResponseTransmitter>;

/// Transmitter that forwards replies into an mpsc channel.
#[derive(Debug)]
pub struct ChannelTransmitter {
    sender: mpsc::Sender<Reply>,
}

impl ChannelTransmitter {
    pub fn new(sender: mpsc::Sender<Reply>) -> Self {
        Self { sender }
    }

    pub fn boxed(self) -> Transmitter {
        Box::new(self)
    }

    fn deliver(self, reply: Reply) {
        if self.sender.send(reply).is_err() {
            tracing::debug!("reply dropped: receiver closed");
        }
    }
}

impl ResponseTransmitter for ChannelTransmitter {
    fn send(self: Box<Self>, result: Value) {
        self.deliver(Reply::Result(result));
    }

    fn send_error(self: Box<Self>, error: JsonRpcError) {
        self.deliver(Reply::Error(error));
    }
}

pub fn channel() -> (ChannelTransmitter, mpsc::Receiver<Reply>) {
    let (sender, receiver) = mpsc::channel();
    (ChannelTransmitter::new(sender), receiver)
}
