//! Broadcast engine
//!
//! Fans one message out to a subset of the registry. Each recipient is
//! queued without waiting, and a failure for one recipient never stops
//! delivery to the rest.

use tracing::debug;

use crate::client::Client;
use crate::error::SendError;
use crate::message::ServerMessage;
use crate::registry::Registry;
use crate::types::ClientId;

/// Outcome of one fan-out
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Recipients the message was queued for
    pub delivered: usize,
    /// Recipients whose writer had already closed
    pub dropped: usize,
}

/// Deliver to every live session
pub fn send_to_all(registry: &Registry, msg: &ServerMessage) -> Delivery {
    fan_out(registry.clients(), msg)
}

/// Deliver to every live session except `exclude`
pub fn send_to_others(registry: &Registry, msg: &ServerMessage, exclude: ClientId) -> Delivery {
    let recipients = registry
        .clients()
        .into_iter()
        .filter(|c| c.id != exclude)
        .collect();
    fan_out(recipients, msg)
}

/// Deliver to a single session
pub fn send_to(registry: &Registry, id: ClientId, msg: ServerMessage) -> Delivery {
    match registry.get(id) {
        Some(client) => deliver(client, msg),
        None => {
            debug!("Unicast to unregistered client {} skipped", id);
            Delivery::default()
        }
    }
}

fn fan_out(recipients: Vec<&Client>, msg: &ServerMessage) -> Delivery {
    let mut total = Delivery::default();
    for client in recipients {
        let one = deliver(client, msg.clone());
        total.delivered += one.delivered;
        total.dropped += one.dropped;
    }
    total
}

fn deliver(client: &Client, msg: ServerMessage) -> Delivery {
    match client.send(msg) {
        Ok(()) => Delivery {
            delivered: 1,
            dropped: 0,
        },
        Err(SendError::ChannelClosed) => {
            debug!("Client {} writer already closed", client.id);
            Delivery {
                delivered: 0,
                dropped: 1,
            }
        }
    }
}
