//! The wire format for jobs exchanged between fleet workers.
//!
//! A job on the wire carries a kind, an optional serialized position, an
//! optional outcome/remoteness pair, the parent rank that expects the
//! reply, and the parent's job id. The framing is a 4-byte big-endian
//! length prefix followed by a `postcard`-encoded [`WireJob`]; there is no
//! version byte, since every rank in a fleet starts and ends together.

use serde::{Deserialize, Serialize};

/// A worker's fixed position in the fleet, `0 .. world_size`.
pub type RankId = u32;

/// Originator-local correlation handle, carried unchanged through a
/// `LOOK_UP -> DISTRIBUTE -> SEND_BACK -> RESOLVE` round trip.
pub type JobId = u64;

/// Plies to the deciding terminal position. Zero at primitives.
pub type Remoteness = u32;

/// Sentinel remoteness recorded the moment a primitive position is first
/// observed, numerically identical to a resolved remoteness of zero.
pub const PRIMITIVE_REMOTENESS: Remoteness = 0;

/// The job kinds, in wire order. Discriminants double as dispatch priority:
/// lower kind preempts higher in the per-rank job queue (see [`JobKind::priority`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum JobKind {
    /// Broadcast from the root once the initial position resolves. Halts the fleet.
    Finished = 0,
    /// Resolve-or-expand request for a position owned by the receiving rank.
    LookUp = 1,
    /// One child result arriving at the rank that issued the matching `Distribute`.
    Resolve = 2,
    /// Reply hop: forward a resolved `(outcome, remoteness)` to the original requester.
    SendBack = 3,
    /// Expand a non-primitive position into its successors.
    Distribute = 4,
    /// Synthetic local job that forces a transport poll.
    CheckForUpdates = 5,
}

impl JobKind {
    /// Dispatch priority: smaller is serviced first. Identical to the discriminant,
    /// named separately so callers don't read dispatch order off an implementation detail.
    pub fn priority(self) -> u8 {
        self as u8
    }
}

/// The outcome of a position, from the perspective of the player to move there.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
    Tie,
    Draw,
}

impl Outcome {
    /// Re-expresses a child-perspective outcome from its parent's perspective.
    pub fn negate(self) -> Outcome {
        match self {
            Outcome::Win => Outcome::Loss,
            Outcome::Loss => Outcome::Win,
            Outcome::Tie => Outcome::Tie,
            Outcome::Draw => Outcome::Draw,
        }
    }

    /// Ranking used by the outcome reduction: `LOSS > TIE > DRAW > WIN`.
    /// The parent prefers whichever outcome is worst for the child to move.
    pub fn preference(self) -> u8 {
        match self {
            Outcome::Loss => 3,
            Outcome::Tie => 2,
            Outcome::Draw => 1,
            Outcome::Win => 0,
        }
    }

    /// A human-readable tag matching the final report line, e.g. `"WIN"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Win => "WIN",
            Outcome::Loss => "LOSS",
            Outcome::Tie => "TIE",
            Outcome::Draw => "DRAW",
        }
    }
}

/// A job as it travels the wire. `position` is whatever byte-serializable
/// value a `GameRules` implementation's position type produces; the
/// protocol crate stays game-agnostic by staying generic over it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WireJob<Pos> {
    pub kind: JobKind,
    pub position: Option<Pos>,
    pub outcome: Option<Outcome>,
    pub remoteness: Option<Remoteness>,
    pub parent: RankId,
    pub job_id: JobId,
}

/// Encodes a job as a length-prefixed `postcard` frame: 4-byte big-endian
/// body length, followed by the body. Returns the full frame, ready to push
/// onto a byte stream.
pub fn encode_frame<Pos: Serialize>(job: &WireJob<Pos>) -> Result<Vec<u8>, postcard::Error> {
    let body = postcard::to_allocvec(job)?;
    let mut framed = Vec::with_capacity(4 + body.len());
    framed.extend_from_slice(&(body.len() as u32).to_be_bytes());
    framed.extend_from_slice(&body);
    Ok(framed)
}

/// Decodes a job body (the bytes *after* the length prefix has already been
/// stripped off by the transport's framing reader).
pub fn decode_body<Pos: for<'de> Deserialize<'de>>(
    body: &[u8],
) -> Result<WireJob<Pos>, postcard::Error> {
    postcard::from_bytes(body)
}

/// Size in bytes of the length prefix every frame starts with.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Reads the big-endian body length out of a frame header.
pub fn frame_body_len(header: [u8; FRAME_HEADER_SIZE]) -> u32 {
    u32::from_be_bytes(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_negate_is_involution() {
        for o in [Outcome::Win, Outcome::Loss, Outcome::Tie, Outcome::Draw] {
            assert_eq!(o.negate().negate(), o);
        }
    }

    #[test]
    fn preference_orders_loss_highest() {
        assert!(Outcome::Loss.preference() > Outcome::Tie.preference());
        assert!(Outcome::Tie.preference() > Outcome::Draw.preference());
        assert!(Outcome::Draw.preference() > Outcome::Win.preference());
    }

    #[test]
    fn job_kind_priority_matches_spec_order() {
        let ordered = [
            JobKind::Finished,
            JobKind::LookUp,
            JobKind::Resolve,
            JobKind::SendBack,
            JobKind::Distribute,
            JobKind::CheckForUpdates,
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0].priority() < pair[1].priority());
        }
    }

    #[test]
    fn frame_round_trips() {
        let job: WireJob<Vec<u8>> = WireJob {
            kind: JobKind::LookUp,
            position: Some(vec![1, 2, 3]),
            outcome: None,
            remoteness: None,
            parent: 4,
            job_id: 9,
        };
        let framed = encode_frame(&job).unwrap();
        let (header, body) = framed.split_at(FRAME_HEADER_SIZE);
        let len = frame_body_len(header.try_into().unwrap()) as usize;
        assert_eq!(len, body.len());
        let decoded: WireJob<Vec<u8>> = decode_body(body).unwrap();
        assert_eq!(decoded.parent, job.parent);
        assert_eq!(decoded.job_id, job.job_id);
        assert_eq!(decoded.position, job.position);
    }
}
