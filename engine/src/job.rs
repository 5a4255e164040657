//! The engine-internal job representation (§3): a tagged enum, one variant
//! per kind, in dispatch-priority order. This is the in-process counterpart
//! to [`protocol::WireJob`]; the transport crate converts between the two
//! at the wire boundary, where a destination-addressed `Resolve` doesn't
//! need to carry its own destination twice.

use protocol::{JobId, Outcome, RankId, Remoteness};

#[derive(Clone, Debug)]
pub enum Job<Pos> {
    /// Broadcast once the root resolves the initial position. Halts the fleet.
    Finished,
    /// Resolve-or-expand request for a position this rank owns.
    LookUp {
        position: Pos,
        parent: RankId,
        job_id: JobId,
    },
    /// One child result, arriving at the rank that issued the matching
    /// `Distribute`. Routed by `job_id` into that rank's pending registry.
    Resolve {
        position: Pos,
        outcome: Outcome,
        remoteness: Remoteness,
        job_id: JobId,
    },
    /// Reply hop: forward a resolved value back to whoever asked for it.
    SendBack {
        position: Pos,
        outcome: Outcome,
        remoteness: Remoteness,
        parent: RankId,
        job_id: JobId,
    },
    /// Expand a non-primitive position into its successors.
    Distribute {
        position: Pos,
        parent: RankId,
        job_id: JobId,
    },
    /// Synthetic local job that forces a transport poll.
    CheckForUpdates,
}

impl<Pos> Job<Pos> {
    /// Dispatch priority: smaller is serviced first, matching
    /// [`protocol::JobKind::priority`].
    pub fn priority(&self) -> u8 {
        match self {
            Job::Finished => 0,
            Job::LookUp { .. } => 1,
            Job::Resolve { .. } => 2,
            Job::SendBack { .. } => 3,
            Job::Distribute { .. } => 4,
            Job::CheckForUpdates => 5,
        }
    }
}
