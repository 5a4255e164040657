//! Deterministic position ownership (§3, §4.1): `owner(pos) = hash(pos) mod
//! world_size`. Every rank must agree on this without coordination, so the
//! hash itself has to be deterministic across processes -- see
//! [`crate::rules::GameRules::hash_position`].

use protocol::RankId;

/// The rank that owns a position, given its deterministic hash and the
/// fleet's fixed world size.
pub fn owner(position_hash: u64, world_size: u32) -> RankId {
    (position_hash % world_size as u64) as RankId
}
