//! Conversions between the engine's internal [`Job`] and the wire
//! [`WireJob`]. A destination-addressed `Resolve` doesn't carry a `parent`
//! field internally (the transport already knows who it's talking to), so
//! it round-trips through an unused `0` on the wire.

use engine::Job;
use protocol::{JobKind, WireJob};

pub fn to_wire<Pos>(job: Job<Pos>) -> WireJob<Pos> {
    match job {
        Job::Finished => WireJob {
            kind: JobKind::Finished,
            position: None,
            outcome: None,
            remoteness: None,
            parent: 0,
            job_id: 0,
        },
        Job::LookUp { position, parent, job_id } => WireJob {
            kind: JobKind::LookUp,
            position: Some(position),
            outcome: None,
            remoteness: None,
            parent,
            job_id,
        },
        Job::Resolve { position, outcome, remoteness, job_id } => WireJob {
            kind: JobKind::Resolve,
            position: Some(position),
            outcome: Some(outcome),
            remoteness: Some(remoteness),
            parent: 0,
            job_id,
        },
        Job::SendBack { position, outcome, remoteness, parent, job_id } => WireJob {
            kind: JobKind::SendBack,
            position: Some(position),
            outcome: Some(outcome),
            remoteness: Some(remoteness),
            parent,
            job_id,
        },
        Job::Distribute { position, parent, job_id } => WireJob {
            kind: JobKind::Distribute,
            position: Some(position),
            outcome: None,
            remoteness: None,
            parent,
            job_id,
        },
        Job::CheckForUpdates => WireJob {
            kind: JobKind::CheckForUpdates,
            position: None,
            outcome: None,
            remoteness: None,
            parent: 0,
            job_id: 0,
        },
    }
}

/// Fallible only against a malformed peer: a well-behaved rank never emits
/// a kind without the fields it requires.
pub fn from_wire<Pos>(wire: WireJob<Pos>) -> Result<Job<Pos>, &'static str> {
    Ok(match wire.kind {
        JobKind::Finished => Job::Finished,
        JobKind::LookUp => Job::LookUp {
            position: wire.position.ok_or("LOOK_UP missing position")?,
            parent: wire.parent,
            job_id: wire.job_id,
        },
        JobKind::Resolve => Job::Resolve {
            position: wire.position.ok_or("RESOLVE missing position")?,
            outcome: wire.outcome.ok_or("RESOLVE missing outcome")?,
            remoteness: wire.remoteness.ok_or("RESOLVE missing remoteness")?,
            job_id: wire.job_id,
        },
        JobKind::SendBack => Job::SendBack {
            position: wire.position.ok_or("SEND_BACK missing position")?,
            outcome: wire.outcome.ok_or("SEND_BACK missing outcome")?,
            remoteness: wire.remoteness.ok_or("SEND_BACK missing remoteness")?,
            parent: wire.parent,
            job_id: wire.job_id,
        },
        JobKind::Distribute => Job::Distribute {
            position: wire.position.ok_or("DISTRIBUTE missing position")?,
            parent: wire.parent,
            job_id: wire.job_id,
        },
        JobKind::CheckForUpdates => Job::CheckForUpdates,
    })
}
