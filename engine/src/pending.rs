//! The pending registry (§3, §4.4, §4.6): per-rank bookkeeping for a
//! parent position waiting on results scattered across the fleet.

use protocol::{JobId, Outcome, RankId, Remoteness};
use std::collections::HashMap;

/// Who asked for this position to be resolved, and under which job id they
/// expect the reply.
#[derive(Clone, Copy, Debug)]
pub struct Originator {
    pub parent: RankId,
    pub job_id: JobId,
}

/// One in-flight parent position, waiting on `remaining` more children.
pub struct PendingEntry<Pos> {
    pub position: Pos,
    pub originator: Originator,
    pub remaining: u32,
    pub results: Vec<(Outcome, Remoteness)>,
}

/// What `record` found.
pub enum RecordOutcome<'a, Pos> {
    /// No pending entry exists for that job id: a protocol violation.
    Unknown,
    /// Recorded, but children are still outstanding.
    Waiting,
    /// The last outstanding child just reported in; ready for reduction.
    Ready(&'a PendingEntry<Pos>),
}

/// Per-rank store of in-flight parent jobs, keyed by a locally minted id
/// unique within this rank for the life of the fleet.
pub struct PendingRegistry<Pos> {
    next_id: JobId,
    entries: HashMap<JobId, PendingEntry<Pos>>,
}

impl<Pos> PendingRegistry<Pos> {
    pub fn new() -> Self {
        PendingRegistry {
            next_id: 0,
            entries: HashMap::new(),
        }
    }

    /// Allocates a fresh id and creates the pending entry for it.
    pub fn create(&mut self, position: Pos, originator: Originator, child_count: u32) -> JobId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(
            id,
            PendingEntry {
                position,
                originator,
                remaining: child_count,
                results: Vec::with_capacity(child_count as usize),
            },
        );
        id
    }

    /// Records one child result against `job_id`.
    pub fn record(&mut self, job_id: JobId, result: (Outcome, Remoteness)) -> RecordOutcome<'_, Pos> {
        let Some(entry) = self.entries.get_mut(&job_id) else {
            return RecordOutcome::Unknown;
        };
        entry.results.push(result);
        entry.remaining -= 1;
        if entry.remaining == 0 {
            RecordOutcome::Ready(self.entries.get(&job_id).expect("just inserted"))
        } else {
            RecordOutcome::Waiting
        }
    }

    pub fn remove(&mut self, job_id: JobId) -> Option<PendingEntry<Pos>> {
        self.entries.remove(&job_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<Pos> Default for PendingRegistry<Pos> {
    fn default() -> Self {
        Self::new()
    }
}
