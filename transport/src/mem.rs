//! An in-memory mesh for tests: every rank's queues live in the same
//! process, with no network or serialization in the loop at all.

use engine::{Job, Transport};
use protocol::RankId;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};

#[derive(Debug, thiserror::Error)]
pub enum MemError {
    #[error("peer {0} is gone")]
    PeerGone(RankId),
}

pub struct InMemoryTransport<Pos> {
    rank: RankId,
    world_size: u32,
    outbound: Vec<Sender<Job<Pos>>>,
    inbound: Receiver<Job<Pos>>,
    /// `probe` can't consume from `std::sync::mpsc::Receiver` without
    /// losing the message, so a successful probe stashes it here for the
    /// next `recv_any`.
    peeked: Option<Job<Pos>>,
}

/// Builds a fully connected in-memory fleet of `world_size` transports, one
/// per rank, each able to address every rank including itself.
pub fn build_fleet<Pos>(world_size: u32) -> Vec<InMemoryTransport<Pos>> {
    let (senders, receivers): (Vec<_>, Vec<_>) = (0..world_size)
        .map(|_| std::sync::mpsc::channel::<Job<Pos>>())
        .unzip();

    receivers
        .into_iter()
        .enumerate()
        .map(|(rank, inbound)| InMemoryTransport {
            rank: rank as RankId,
            world_size,
            outbound: senders.clone(),
            inbound,
            peeked: None,
        })
        .collect()
}

impl<Pos> Transport<Pos> for InMemoryTransport<Pos> {
    type Error = MemError;

    fn rank(&self) -> RankId {
        self.rank
    }

    fn world_size(&self) -> u32 {
        self.world_size
    }

    fn send(&mut self, job: Job<Pos>, dest: RankId) -> Result<(), Self::Error> {
        self.outbound[dest as usize]
            .send(job)
            .map_err(|_| MemError::PeerGone(dest))
    }

    fn probe(&mut self) -> Result<bool, Self::Error> {
        if self.peeked.is_some() {
            return Ok(true);
        }
        match self.inbound.try_recv() {
            Ok(job) => {
                self.peeked = Some(job);
                Ok(true)
            }
            Err(TryRecvError::Empty) => Ok(false),
            Err(TryRecvError::Disconnected) => Ok(false),
        }
    }

    fn recv_any(&mut self) -> Result<Job<Pos>, Self::Error> {
        if let Some(job) = self.peeked.take() {
            return Ok(job);
        }
        self.inbound
            .try_recv()
            .map_err(|_| MemError::PeerGone(self.rank))
    }

    fn abort(&mut self) -> Result<(), Self::Error> {
        for dest in 0..self.world_size {
            self.send(Job::Finished, dest)?;
        }
        Ok(())
    }
}
