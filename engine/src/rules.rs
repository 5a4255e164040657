//! The `GameRules` external interface (§6): successor enumeration,
//! primitive detection and value, and a deterministic position hash. An
//! implementation never sees the job protocol; it only answers questions
//! about individual positions.

use protocol::Outcome;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::hash::Hash;

/// A finite, two-player, perfect-information, zero-sum game.
pub trait GameRules: Send + Sync + 'static {
    /// An opaque game position. Cloneable, hashable and serializable since
    /// positions cross the wire as `LOOK_UP`/`DISTRIBUTE` payloads.
    type Position: Clone + Eq + Hash + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// The position every solve starts from.
    fn initial_position(&self) -> Self::Position;

    /// A deterministic hash, identical across every rank in the fleet.
    /// Defaults to a fixed-seed hasher rather than `HashMap`'s `RandomState`,
    /// which reseeds per process and would desynchronize ownership across
    /// ranks.
    fn hash_position(&self, position: &Self::Position) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::Hasher;
        let mut hasher = DefaultHasher::new();
        position.hash(&mut hasher);
        hasher.finish()
    }

    /// True for a terminal position whose value `primitive_value` defines directly.
    fn is_primitive(&self, position: &Self::Position) -> bool;

    /// The outcome of a primitive position, from the perspective of the
    /// player to move there. Only ever called when `is_primitive` holds.
    fn primitive_value(&self, position: &Self::Position) -> Outcome;

    /// The positions reachable in one ply. Must be non-empty for any
    /// non-primitive position; an empty result is a rules violation.
    fn successors(&self, position: &Self::Position) -> Vec<Self::Position>;
}
