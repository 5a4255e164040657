//! The per-worker job-driven state machine (§4): dispatch and the run
//! loop. One `Worker` lives on one rank for the life of a solve.

use crate::cache::{KeyValueCache, PositionCache};
use crate::error::SolverError;
use crate::job::Job;
use crate::partition;
use crate::pending::{Originator, PendingRegistry, RecordOutcome};
use crate::queue::JobQueue;
use crate::reduction::{reduce_outcome, reduce_remoteness};
use crate::rules::GameRules;
use crate::transport::Transport;
use protocol::{JobId, Outcome, RankId, Remoteness, PRIMITIVE_REMOTENESS};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One rank's solver state: its owned slice of the `resolved`/`remoteness`
/// tables, its pending registry, its local job queue, and the rules and
/// transport it was built with.
pub struct Worker<G: GameRules, T: Transport<G::Position>> {
    rank: RankId,
    root: RankId,
    world_size: u32,
    rules: G,
    transport: T,
    queue: JobQueue<G::Position>,
    pending: PendingRegistry<G::Position>,
    resolved: PositionCache<Outcome>,
    remoteness: PositionCache<Remoteness>,
    initial_hash: u64,
    finished: Arc<AtomicBool>,
}

impl<G, T> Worker<G, T>
where
    G: GameRules,
    T: Transport<G::Position>,
{
    pub fn new(rules: G, transport: T) -> Self {
        Self::with_caches(rules, transport, PositionCache::in_memory(), PositionCache::in_memory())
    }

    /// Builds a worker whose `resolved`/`remoteness` tables spill every
    /// newly written entry to a per-rank log file under `log_dir` (§4.12),
    /// behind the `persistent-cache` feature. The log is write-only and is
    /// never read back during this run -- it exists purely as an offline
    /// recovery aid after a crash.
    #[cfg(feature = "persistent-cache")]
    pub fn with_persistent_cache(
        rules: G,
        transport: T,
        log_dir: &std::path::Path,
    ) -> std::io::Result<Self> {
        let rank = transport.rank();
        let resolved = PositionCache::persistent(&log_dir.join(format!("resolved-{rank}.log")))?;
        let remoteness =
            PositionCache::persistent(&log_dir.join(format!("remoteness-{rank}.log")))?;
        Ok(Self::with_caches(rules, transport, resolved, remoteness))
    }

    fn with_caches(
        rules: G,
        transport: T,
        resolved: PositionCache<Outcome>,
        remoteness: PositionCache<Remoteness>,
    ) -> Self {
        let rank = transport.rank();
        let world_size = transport.world_size();
        let initial_position = rules.initial_position();
        let initial_hash = rules.hash_position(&initial_position);
        let root = partition::owner(initial_hash, world_size);

        let mut queue = JobQueue::new();
        if rank == root {
            // Only the rank that owns the initial position kicks off the
            // solve; every other rank just waits on CHECK_FOR_UPDATES
            // (pushed automatically by `run` once the queue runs dry) until
            // work or FINISHED arrives over the transport.
            queue.push(Job::LookUp { position: initial_position, parent: root, job_id: 0 });
        }

        Worker {
            rank,
            root,
            world_size,
            rules,
            transport,
            queue,
            pending: PendingRegistry::new(),
            resolved,
            remoteness,
            initial_hash,
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn rank(&self) -> RankId {
        self.rank
    }

    /// A handle to this worker's termination flag, for a transport that
    /// needs to stop background work (e.g. a listener task) once the fleet
    /// halts, independent of this loop's own iteration.
    pub fn termination_flag(&self) -> Arc<AtomicBool> {
        self.finished.clone()
    }

    fn owner(&self, position: &G::Position) -> RankId {
        partition::owner(self.rules.hash_position(position), self.world_size)
    }

    /// Runs the worker loop (§4.2) to completion. On the root, returns the
    /// final `(outcome, remoteness)` of the initial position once the fleet
    /// has halted. On every other rank, returns `None` after observing
    /// `FINISHED`.
    pub fn run(&mut self) -> Result<Option<(Outcome, Remoteness)>, SolverError> {
        loop {
            if self.finished.load(Ordering::SeqCst) {
                return Ok(None);
            }

            if self.rank == self.root {
                if let Some(outcome) = self.resolved.get(&self.initial_hash).copied() {
                    let remoteness = *self.remoteness.get(&self.initial_hash).expect(
                        "invariant: a hash present in `resolved` is present in `remoteness`",
                    );
                    tracing::info!(
                        rank = self.rank,
                        outcome = outcome.as_str(),
                        remoteness,
                        "initial position resolved"
                    );
                    self.transport
                        .abort()
                        .map_err(|e| self.transport_error(e))?;
                    self.finished.store(true, Ordering::SeqCst);
                    return Ok(Some((outcome, remoteness)));
                }
            }

            if self.queue.is_empty() {
                self.queue.push(Job::CheckForUpdates);
            }

            let job = self.queue.pop().expect("just ensured the queue is non-empty");
            if let Some(next) = self.dispatch(job)? {
                self.queue.push(next);
            }
        }
    }

    fn transport_error(&self, source: T::Error) -> SolverError {
        SolverError::Transport {
            rank: self.rank,
            source: Box::new(source),
        }
    }

    fn dispatch(&mut self, job: Job<G::Position>) -> Result<Option<Job<G::Position>>, SolverError> {
        match job {
            Job::Finished => {
                self.finished.store(true, Ordering::SeqCst);
                Ok(None)
            }
            Job::LookUp { position, parent, job_id } => self.look_up(position, parent, job_id),
            Job::Resolve { position, outcome, remoteness, job_id } => {
                self.resolve(position, outcome, remoteness, job_id)
            }
            Job::SendBack { position, outcome, remoteness, parent, job_id } => {
                self.send_back(position, outcome, remoteness, parent, job_id)?;
                Ok(None)
            }
            Job::Distribute { position, parent, job_id } => {
                self.distribute(position, parent, job_id)?;
                Ok(None)
            }
            Job::CheckForUpdates => {
                self.check_for_updates()?;
                Ok(None)
            }
        }
    }

    /// §4.3 LOOK_UP: answer from cache if resolved, else expand a primitive
    /// directly, else forward to DISTRIBUTE.
    fn look_up(
        &mut self,
        position: G::Position,
        parent: RankId,
        job_id: JobId,
    ) -> Result<Option<Job<G::Position>>, SolverError> {
        if self.owner(&position) != self.rank {
            return Err(SolverError::position_not_owned(self.rank));
        }
        let hash = self.rules.hash_position(&position);

        if let Some(outcome) = self.resolved.get(&hash).copied() {
            let remoteness = *self
                .remoteness
                .get(&hash)
                .expect("resolved/remoteness invariant");
            return Ok(Some(Job::SendBack { position, outcome, remoteness, parent, job_id }));
        }

        if self.rules.is_primitive(&position) {
            let outcome = self.rules.primitive_value(&position);
            self.resolved.insert_if_absent(hash, outcome);
            self.remoteness.insert_if_absent(hash, PRIMITIVE_REMOTENESS);
            return Ok(Some(Job::SendBack {
                position,
                outcome,
                remoteness: PRIMITIVE_REMOTENESS,
                parent,
                job_id,
            }));
        }

        Ok(Some(Job::Distribute { position, parent, job_id }))
    }

    /// §4.4 DISTRIBUTE: expand successors, open a pending entry, scatter a
    /// LOOK_UP to each child's owner.
    fn distribute(
        &mut self,
        position: G::Position,
        parent: RankId,
        job_id: JobId,
    ) -> Result<(), SolverError> {
        let children = self.rules.successors(&position);
        if children.is_empty() {
            return Err(SolverError::empty_successors(self.rank));
        }

        let child_count = children.len() as u32;
        let my_id = self
            .pending
            .create(position, Originator { parent, job_id }, child_count);

        for child in children {
            let dest = self.owner(&child);
            self.transport
                .send(
                    Job::LookUp { position: child, parent: self.rank, job_id: my_id },
                    dest,
                )
                .map_err(|e| self.transport_error(e))?;
        }
        Ok(())
    }

    /// §4.5 SEND_BACK: forward a resolved value to whoever asked for it, as
    /// a RESOLVE addressed to `parent`.
    fn send_back(
        &mut self,
        position: G::Position,
        outcome: Outcome,
        remoteness: Remoteness,
        parent: RankId,
        job_id: JobId,
    ) -> Result<(), SolverError> {
        self.transport
            .send(Job::Resolve { position, outcome, remoteness, job_id }, parent)
            .map_err(|e| self.transport_error(e))
    }

    /// §4.6 RESOLVE: record one child result; once the last one is in,
    /// reduce and send the parent's own value back up.
    fn resolve(
        &mut self,
        _child_position: G::Position,
        outcome: Outcome,
        remoteness: Remoteness,
        job_id: JobId,
    ) -> Result<Option<Job<G::Position>>, SolverError> {
        match self.pending.record(job_id, (outcome, remoteness)) {
            RecordOutcome::Unknown => Err(SolverError::unknown_pending_job(self.rank, job_id)),
            RecordOutcome::Waiting => Ok(None),
            RecordOutcome::Ready(_) => {
                let entry = self
                    .pending
                    .remove(job_id)
                    .expect("just observed Ready for this id");

                let outcomes: Vec<Outcome> = entry.results.iter().map(|(o, _)| *o).collect();
                let parent_outcome = reduce_outcome(&outcomes);
                let parent_remoteness = reduce_remoteness(&entry.results);

                let hash = self.rules.hash_position(&entry.position);
                self.resolved.insert_if_absent(hash, parent_outcome);
                self.remoteness.insert_if_absent(hash, parent_remoteness);

                tracing::debug!(
                    rank = self.rank,
                    job_id,
                    outcome = parent_outcome.as_str(),
                    remoteness = parent_remoteness,
                    "position resolved"
                );

                Ok(Some(Job::SendBack {
                    position: entry.position,
                    outcome: parent_outcome,
                    remoteness: parent_remoteness,
                    parent: entry.originator.parent,
                    job_id: entry.originator.job_id,
                }))
            }
        }
    }

    /// §4.9 CHECK_FOR_UPDATES: drain every ready message from the transport
    /// into the local queue.
    fn check_for_updates(&mut self) -> Result<(), SolverError> {
        while self.transport.probe().map_err(|e| self.transport_error(e))? {
            let job = self.transport.recv_any().map_err(|e| self.transport_error(e))?;
            self.queue.push(job);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    struct Count(u8);

    /// A trivial "count up to 3" game: primitive at 3, one successor
    /// otherwise. Used to exercise the dispatch handlers without a full
    /// transport.
    struct CountingGame;

    impl GameRules for CountingGame {
        type Position = Count;

        fn initial_position(&self) -> Count {
            Count(0)
        }

        fn is_primitive(&self, position: &Count) -> bool {
            position.0 >= 3
        }

        fn primitive_value(&self, _position: &Count) -> Outcome {
            Outcome::Loss
        }

        fn successors(&self, position: &Count) -> Vec<Count> {
            vec![Count(position.0 + 1)]
        }
    }

    #[derive(Debug)]
    struct LoopbackError;
    impl std::fmt::Display for LoopbackError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "loopback transport error")
        }
    }
    impl std::error::Error for LoopbackError {}

    /// Single-rank loopback transport: every send lands straight back in
    /// this rank's own inbox. Enough to drive a one-rank fleet end to end,
    /// for any position type.
    struct Loopback<Pos> {
        inbox: VecDeque<Job<Pos>>,
    }

    impl<Pos> Loopback<Pos> {
        fn new() -> Self {
            Loopback { inbox: VecDeque::new() }
        }
    }

    impl<Pos> Transport<Pos> for Loopback<Pos> {
        type Error = LoopbackError;

        fn rank(&self) -> RankId {
            0
        }

        fn world_size(&self) -> u32 {
            1
        }

        fn send(&mut self, job: Job<Pos>, _dest: RankId) -> Result<(), Self::Error> {
            self.inbox.push_back(job);
            Ok(())
        }

        fn probe(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.inbox.is_empty())
        }

        fn recv_any(&mut self) -> Result<Job<Pos>, Self::Error> {
            self.inbox.pop_front().ok_or(LoopbackError)
        }

        fn abort(&mut self) -> Result<(), Self::Error> {
            self.inbox.push_back(Job::Finished);
            Ok(())
        }
    }

    #[test]
    fn single_rank_fleet_resolves_the_counting_game() {
        let mut worker = Worker::new(CountingGame, Loopback::new());
        let outcome = worker.run().unwrap();
        // 0 -> 1 -> 2 -> 3 (LOSS, primitive). Negated up three times: the
        // player to move at 0 is the one who eventually loses at 3 after an
        // odd number of negations, so 0 is a WIN, remoteness 3.
        assert_eq!(outcome, Some((Outcome::Win, 3)));
    }

    /// A branching game exercising a real multi-child `DISTRIBUTE`: `Root`
    /// has two children, one an immediate primitive loss, the other a
    /// two-ply chain down to a primitive loss. Root should prefer the
    /// faster of the two forced wins.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
    enum Branch {
        Root,
        A,
        B,
        C,
        D,
    }

    struct BranchGame;

    impl GameRules for BranchGame {
        type Position = Branch;

        fn initial_position(&self) -> Branch {
            Branch::Root
        }

        fn is_primitive(&self, position: &Branch) -> bool {
            matches!(position, Branch::A | Branch::D)
        }

        fn primitive_value(&self, _position: &Branch) -> Outcome {
            Outcome::Loss
        }

        fn successors(&self, position: &Branch) -> Vec<Branch> {
            match position {
                Branch::Root => vec![Branch::A, Branch::B],
                Branch::B => vec![Branch::C],
                Branch::C => vec![Branch::D],
                Branch::A | Branch::D => unreachable!("primitive positions have no successors"),
            }
        }
    }

    #[test]
    fn root_prefers_the_faster_of_two_forced_wins() {
        let mut worker = Worker::new(BranchGame, Loopback::new());
        let outcome = worker.run().unwrap();
        // A is an immediate primitive LOSS (remoteness 0): Root wins in 1.
        // B -> C -> D is a primitive LOSS three plies down, so B itself is
        // a LOSS for its own mover in remoteness 2. Root picks the faster
        // win (through A) over the slower one (through B).
        assert_eq!(outcome, Some((Outcome::Win, 1)));
    }

    /// A mix of a tied and a won primitive child: the mover prefers
    /// denying the opponent a win over taking one, so the position ties.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
    enum TieMix {
        Root,
        Tied,
        Won,
    }

    struct TieMixGame;

    impl GameRules for TieMixGame {
        type Position = TieMix;

        fn initial_position(&self) -> TieMix {
            TieMix::Root
        }

        fn is_primitive(&self, position: &TieMix) -> bool {
            !matches!(position, TieMix::Root)
        }

        fn primitive_value(&self, position: &TieMix) -> Outcome {
            match position {
                TieMix::Tied => Outcome::Tie,
                TieMix::Won => Outcome::Win,
                TieMix::Root => unreachable!(),
            }
        }

        fn successors(&self, position: &TieMix) -> Vec<TieMix> {
            match position {
                TieMix::Root => vec![TieMix::Tied, TieMix::Won],
                _ => unreachable!("primitive positions have no successors"),
            }
        }
    }

    #[test]
    fn a_tied_child_beats_a_won_child_for_the_mover() {
        let mut worker = Worker::new(TieMixGame, Loopback::new());
        let outcome = worker.run().unwrap();
        assert_eq!(outcome, Some((Outcome::Tie, 1)));
    }

    #[test]
    fn distribute_on_a_dead_end_is_a_rules_violation() {
        struct DeadEnd;
        impl GameRules for DeadEnd {
            type Position = Count;
            fn initial_position(&self) -> Count {
                Count(0)
            }
            fn is_primitive(&self, _position: &Count) -> bool {
                false
            }
            fn primitive_value(&self, _position: &Count) -> Outcome {
                unreachable!()
            }
            fn successors(&self, _position: &Count) -> Vec<Count> {
                vec![]
            }
        }

        let mut worker = Worker::new(DeadEnd, Loopback::new());
        let err = worker.distribute(Count(0), 0, 0).unwrap_err();
        assert!(matches!(err, SolverError::RulesViolation { .. }));
    }
}
