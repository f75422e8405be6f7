//! Discord permission bitmask checks for dashboard access.
//!
//! A user may manage a guild's dashboard iff their permission bitmask in
//! that guild carries Manage Guild or Administrator.

use crate::discord::UserGuild;

/// Manage Guild permission bit
pub const MANAGE_GUILD: u64 = 0x20;
/// Administrator permission bit
pub const ADMINISTRATOR: u64 = 0x8;

pub fn has_manage_guild(permissions: u64) -> bool {
    permissions & MANAGE_GUILD != 0
}

pub fn has_admin(permissions: u64) -> bool {
    permissions & ADMINISTRATOR != 0
}

/// Whether the bitmask grants dashboard access to a guild
pub fn can_manage(permissions: u64) -> bool {
    has_manage_guild(permissions) || has_admin(permissions)
}

/// Locate a guild in the caller's guild list by id
pub fn find_guild<'a>(guilds: &'a [UserGuild], guild_id: &str) -> Option<&'a UserGuild> {
    guilds.iter().find(|g| g.id == guild_id)
}
