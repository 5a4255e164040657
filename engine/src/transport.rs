//! The Transport external interface (§6): non-blocking send, source-agnostic
//! probe/receive, and a broadcast abort. The engine is generic over this so
//! the same worker loop runs over a real TCP mesh or an in-memory mesh for
//! tests.

use crate::job::Job;
use protocol::RankId;

/// The messaging substrate a fleet of workers runs on. Point-to-point
/// delivery is FIFO per ordered pair of ranks; the protocol relies on no
/// ordering guarantee across different destination pairs (§5).
pub trait Transport<Pos> {
    type Error: std::error::Error + Send + Sync + 'static;

    /// This process's rank.
    fn rank(&self) -> RankId;

    /// The fixed fleet size.
    fn world_size(&self) -> u32;

    /// Queues a job for delivery to `dest`. Never blocks.
    fn send(&mut self, job: Job<Pos>, dest: RankId) -> Result<(), Self::Error>;

    /// Non-blocking, source-agnostic: `true` if at least one message is
    /// ready to be received.
    fn probe(&mut self) -> Result<bool, Self::Error>;

    /// Receives one ready message from any source. Only valid to call
    /// immediately after `probe` returned `true`.
    fn recv_any(&mut self) -> Result<Job<Pos>, Self::Error>;

    /// Broadcasts a `FINISHED` job to every rank, including this one.
    fn abort(&mut self) -> Result<(), Self::Error>;
}
