//! Connection registry
//!
//! The single source of truth for which sessions are alive and what each
//! one is called. Owned by the `ChatServer` actor, so every operation here
//! already runs inside the actor's critical section.

use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::client::Client;
use crate::error::AppError;
use crate::message::{ServerMessage, UNKNOWN_NAME};
use crate::types::ClientId;

/// Capacity-bounded set of live sessions keyed by handle
#[derive(Debug)]
pub struct Registry {
    clients: HashMap<ClientId, Client>,
    max_clients: usize,
    next_seq: u64,
}

impl Registry {
    /// Create an empty registry holding at most `max_clients` sessions
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            max_clients,
            next_seq: 0,
        }
    }

    /// Insert a new unnamed session
    ///
    /// Fails without mutating anything when the registry is full or the
    /// handle is already present.
    pub fn add(
        &mut self,
        id: ClientId,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<&Client, AppError> {
        if self.clients.len() >= self.max_clients {
            return Err(AppError::CapacityExceeded {
                max: self.max_clients,
            });
        }
        if self.clients.contains_key(&id) {
            return Err(AppError::AlreadyRegistered(id));
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        let client = self
            .clients
            .entry(id)
            .or_insert_with(|| Client::new(id, seq, sender));
        Ok(&*client)
    }

    /// Remove a session; removing an absent handle is a no-op
    pub fn remove(&mut self, id: ClientId) -> Option<Client> {
        self.clients.remove(&id)
    }

    /// Set a session's display name
    pub fn rename(&mut self, id: ClientId, name: &str) -> Result<(), AppError> {
        let client = self.clients.get_mut(&id).ok_or(AppError::NotFound(id))?;
        client.set_display_name(name.to_string());
        Ok(())
    }

    /// Mark a session as named
    pub fn mark_named(&mut self, id: ClientId) -> Result<(), AppError> {
        let client = self.clients.get_mut(&id).ok_or(AppError::NotFound(id))?;
        client.named = true;
        Ok(())
    }

    /// Display name of a session, or "Unknown" if it is not registered
    pub fn name_of(&self, id: ClientId) -> &str {
        self.clients
            .get(&id)
            .map(Client::display_name)
            .unwrap_or(UNKNOWN_NAME)
    }

    pub fn get(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(&id)
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.clients.contains_key(&id)
    }

    /// Live sessions in registration order
    pub fn clients(&self) -> Vec<&Client> {
        let mut clients: Vec<&Client> = self.clients.values().collect();
        clients.sort_by_key(|c| c.seq);
        clients
    }

    /// Point-in-time view of `(handle, display name)` in registration order
    pub fn snapshot(&self) -> Vec<(ClientId, String)> {
        self.clients()
            .into_iter()
            .map(|c| (c.id, c.display_name.clone()))
            .collect()
    }

    /// Display names of named sessions in registration order
    ///
    /// Sessions still waiting on their first line are left out.
    pub fn names(&self) -> Vec<String> {
        self.clients()
            .into_iter()
            .filter(|c| c.named)
            .map(|c| c.display_name.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.clients.len()
    }

    pub fn capacity(&self) -> usize {
        self.max_clients
    }

    /// Drop every session, closing all outbound channels
    pub fn clear(&mut self) {
        self.clients.clear();
    }
}
