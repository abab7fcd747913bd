//! Per-user delivery rooms.

use std::fmt;

use super::UserId;

/// Broadcast group holding the connection registered for one identity.
///
/// Rooms are named `user_{identity}`. Membership is derived from the
/// [`super::ConnectionRegistry`]: joining happens on register, leaving on
/// unregister.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Room(String);

impl Room {
    /// Returns the room owned by `user_id`.
    #[must_use]
    pub fn for_user(user_id: &UserId) -> Self {
        Self(format!("user_{user_id}"))
    }

    /// Returns the room name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the identity that owns this room, if the name is well formed.
    #[must_use]
    pub fn owner(&self) -> Option<UserId> {
        self.0
            .strip_prefix("user_")
            .filter(|id| !id.is_empty())
            .map(UserId::from)
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_name_is_prefixed() {
        let room = Room::for_user(&UserId::new("42"));
        assert_eq!(room.as_str(), "user_42");
        assert_eq!(room.owner(), Some(UserId::new("42")));
    }
}
