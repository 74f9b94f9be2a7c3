use crate::error::{Error, Result};
use async_channel::Sender;
use std::{fmt::Debug, sync::Arc};

/// The delivery end of a subscription.
///
/// A connection is handed to the manager at subscription time and receives every
/// message the subscription yields, in emission order.
pub trait Connection<M>: Debug + Send + Sync {
    fn send(&self, message: M) -> Result<()>;
    fn close(&self) -> bool;
    fn is_closed(&self) -> bool;
}

pub type DynConnection<M> = Arc<dyn Connection<M>>;

/// Relays messages into an async channel.
#[derive(Clone, Debug)]
pub struct ChannelConnection<M> {
    sender: Sender<M>,
}

impl<M> ChannelConnection<M> {
    pub fn new(sender: Sender<M>) -> Self {
        Self { sender }
    }
}

impl<M> Connection<M> for ChannelConnection<M>
where
    M: Debug + Send + Sync,
{
    fn send(&self, message: M) -> Result<()> {
        match !self.is_closed() {
            true => Ok(self.sender.try_send(message)?),
            false => Err(Error::ConnectionClosed),
        }
    }

    fn close(&self) -> bool {
        self.sender.close()
    }

    fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Invokes a callback for every message.
pub struct CallbackConnection<M> {
    callback: Box<dyn Fn(M) + Send + Sync>,
}

impl<M> CallbackConnection<M> {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(M) + Send + Sync + 'static,
    {
        Self { callback: Box::new(callback) }
    }
}

impl<M> Debug for CallbackConnection<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackConnection").finish_non_exhaustive()
    }
}

impl<M> Connection<M> for CallbackConnection<M> {
    fn send(&self, message: M) -> Result<()> {
        (self.callback)(message);
        Ok(())
    }

    fn close(&self) -> bool {
        false
    }

    fn is_closed(&self) -> bool {
        false
    }
}
