//! The distributed retrograde-analysis solver engine (§1-§5): the
//! per-worker job-driven state machine, position partitioning, pending-task
//! accounting and the reduction kernel. Game definitions, the messaging
//! substrate, and persistent caches are consumed through the thin
//! interfaces in [`rules`], [`transport`] and [`cache`] respectively -- this
//! crate never depends on a concrete game or a concrete network.

pub mod cache;
pub mod error;
pub mod job;
pub mod partition;
pub mod pending;
pub mod queue;
pub mod reduction;
pub mod rules;
pub mod transport;
pub mod worker;

pub use cache::PositionCache;
pub use error::SolverError;
pub use job::Job;
pub use rules::GameRules;
pub use transport::Transport;
pub use worker::Worker;

pub use protocol::{JobId, Outcome, RankId, Remoteness, PRIMITIVE_REMOTENESS};
