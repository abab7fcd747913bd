//! Concurrent map of live identities to their connections.
//!
//! [`ConnectionRegistry`] is the single piece of shared mutable state in the
//! relay. It is backed by a sharded [`DashMap`], so register, unregister and
//! resolve from independent connection tasks never contend on one global
//! lock and never block on I/O.

use dashmap::DashMap;

use super::{ConnectionHandle, ConnectionId, Delivery, OutboundEvent, Room, UserId};

/// Live registry of `UserId → ConnectionHandle` bindings.
///
/// # Invariants
///
/// - At most one entry per identity; a second registration replaces the
///   first (last registration wins).
/// - An entry is only removed by the connection that owns it, so a late
///   disconnect from a superseded connection cannot clear a newer binding.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: DashMap<UserId, ConnectionHandle>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Binds `user_id` to `handle`, joining the identity's room.
    ///
    /// Returns the previously registered handle, if any. The previous
    /// connection is not closed.
    pub fn register(&self, user_id: UserId, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        let connection_id = handle.id();
        let previous = self.entries.insert(user_id.clone(), handle);
        if let Some(stale) = &previous {
            tracing::warn!(
                %user_id,
                %connection_id,
                stale_connection_id = %stale.id(),
                "identity re-registered, previous connection superseded"
            );
        } else {
            tracing::debug!(%user_id, %connection_id, room = %Room::for_user(&user_id), "joined room");
        }
        previous
    }

    /// Removes the binding for `user_id` if it still belongs to
    /// `connection_id`. Idempotent.
    ///
    /// Returns `true` if an entry was removed.
    pub fn unregister(&self, user_id: &UserId, connection_id: ConnectionId) -> bool {
        let removed = self
            .entries
            .remove_if(user_id, |_, handle| handle.id() == connection_id)
            .is_some();
        if removed {
            tracing::debug!(%user_id, %connection_id, "left room");
        }
        removed
    }

    /// Returns the live connection for `user_id`, if any.
    #[must_use]
    pub fn resolve(&self, user_id: &UserId) -> Option<ConnectionHandle> {
        self.entries.get(user_id).map(|entry| entry.value().clone())
    }

    /// Returns the connection that is currently the member of `room`.
    #[must_use]
    pub fn resolve_room(&self, room: &Room) -> Option<ConnectionHandle> {
        room.owner().and_then(|owner| self.resolve(&owner))
    }

    /// Returns `true` if `user_id` has a live connection.
    #[must_use]
    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.entries.contains_key(user_id)
    }

    /// Returns `true` if `connection_id` is the connection registered for
    /// `user_id`.
    #[must_use]
    pub fn is_current(&self, user_id: &UserId, connection_id: ConnectionId) -> bool {
        self.entries
            .get(user_id)
            .is_some_and(|entry| entry.value().id() == connection_id)
    }

    /// Enqueues `event` on the connection in `room`.
    ///
    /// Returns `None` when nobody is in the room (a routing miss).
    pub fn deliver_to_room(&self, room: &Room, event: OutboundEvent) -> Option<Delivery> {
        // The handle is cloned out so the shard lock is released before enqueueing.
        let handle = self.resolve_room(room)?;
        Some(handle.deliver(event))
    }

    /// Returns a point-in-time copy of every binding except `user_id`'s.
    #[must_use]
    pub fn snapshot_except(&self, user_id: &UserId) -> Vec<(UserId, ConnectionHandle)> {
        self.entries
            .iter()
            .filter(|entry| entry.key() != user_id)
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Returns the identities that are currently online.
    #[must_use]
    pub fn online_users(&self) -> Vec<UserId> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Returns the number of registered identities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no identity is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
