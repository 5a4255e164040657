//! Fatal solver errors (§7). None of these are recoverable locally: a
//! worker that hits one logs it and the fleet aborts, since there is no
//! partial-result reporting (see the design notes on cancellation).

use protocol::{JobId, RankId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SolverError {
    /// A `LOOK_UP` named a position this rank doesn't own, or a `RESOLVE`
    /// named an unknown pending job id. A malformed job kind on the wire is
    /// a decode failure at the transport, not this variant -- `JobKind` is a
    /// fixed, typed enum, so nothing downstream of a successful decode can
    /// produce one dispatch doesn't already know how to handle.
    #[error("protocol violation on rank {rank}: {detail}")]
    ProtocolViolation { rank: RankId, detail: String },

    /// `successors` returned no children for a non-primitive position, or a
    /// position reported as primitive had no defined value.
    #[error("rules violation on rank {rank}: {detail}")]
    RulesViolation { rank: RankId, detail: String },

    /// A send, probe or receive on the transport failed.
    #[error("transport failure on rank {rank}: {source}")]
    Transport {
        rank: RankId,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Malformed bootstrap configuration, caught before any networking starts.
    #[error("configuration error: {0}")]
    Config(String),
}

impl SolverError {
    pub fn unknown_pending_job(rank: RankId, job_id: JobId) -> Self {
        SolverError::ProtocolViolation {
            rank,
            detail: format!("RESOLVE for unknown pending job id {job_id}"),
        }
    }

    pub fn position_not_owned(rank: RankId) -> Self {
        SolverError::ProtocolViolation {
            rank,
            detail: "LOOK_UP for a position this rank does not own".to_string(),
        }
    }

    pub fn empty_successors(rank: RankId) -> Self {
        SolverError::RulesViolation {
            rank,
            detail: "successors() returned no children for a non-primitive position".to_string(),
        }
    }
}
