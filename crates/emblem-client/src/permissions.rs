//! Server permission bitfield.
//!
//! Roles combine permissions via OR; `ADMINISTRATOR` overrides every other
//! check. The bot only asks whether it can speak and whether it can manage
//! roles, but the field mirrors the platform's layout so the bits decode
//! as sent.

use bitflags::bitflags;

bitflags! {
    /// Server-level permissions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: i64 {
        /// View channels and read messages
        const VIEW_CHANNEL    = 1 << 0;
        /// Manage server settings, channels, roles
        const MANAGE_SERVER   = 1 << 1;
        /// Manage specific channels
        const MANAGE_CHANNELS = 1 << 2;
        /// Manage roles below your highest role
        const MANAGE_ROLES    = 1 << 3;
        /// Create invite links
        const CREATE_INVITES  = 1 << 4;
        /// Kick members
        const KICK_MEMBERS    = 1 << 5;
        /// Ban members
        const BAN_MEMBERS     = 1 << 6;

        /// Send messages in text channels
        const SEND_MESSAGES   = 1 << 12;
        /// Embed links
        const EMBED_LINKS     = 1 << 17;
        /// Add reactions to messages
        const ADD_REACTIONS   = 1 << 19;
        /// Manage messages (delete others' messages, pin)
        const MANAGE_MESSAGES = 1 << 22;
        /// Read message history
        const READ_MESSAGE_HISTORY = 1 << 23;

        /// Server owner / administrator (all permissions)
        const ADMINISTRATOR   = 1 << 40;
    }
}

impl Permissions {
    /// Check if administrator (overrides all other checks).
    pub fn is_admin(&self) -> bool {
        self.contains(Self::ADMINISTRATOR)
    }

    /// Check if these permissions allow an action.
    pub fn has(&self, required: Permissions) -> bool {
        self.is_admin() || self.contains(required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_requires_the_exact_bit() {
        let perms = Permissions::SEND_MESSAGES | Permissions::VIEW_CHANNEL;
        assert!(perms.has(Permissions::SEND_MESSAGES));
        assert!(!perms.has(Permissions::MANAGE_ROLES));
    }

    #[test]
    fn administrator_overrides_everything() {
        let perms = Permissions::ADMINISTRATOR;
        assert!(perms.has(Permissions::MANAGE_ROLES));
        assert!(perms.has(Permissions::SEND_MESSAGES));
    }

    #[test]
    fn unknown_bits_are_dropped_on_decode() {
        let raw = Permissions::SEND_MESSAGES.bits() | (1 << 60);
        let perms = Permissions::from_bits_truncate(raw);
        assert!(perms.has(Permissions::SEND_MESSAGES));
        assert!(!perms.has(Permissions::MANAGE_ROLES));
    }
}
