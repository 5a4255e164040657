//! A TCP mesh transport (§4.11): each rank listens on its own address and
//! dials only higher-ranked peers, which avoids every pair connecting
//! twice. Every inbound reader, across every peer connection, funnels into
//! one rank-local channel so `probe`/`recv_any` stay source-agnostic.

use engine::Job;
use protocol::{RankId, WireJob};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::framing::{read_frame, write_frame};
use crate::wire::{from_wire, to_wire};

const CHANNEL_BUFFER_SIZE: usize = 256;
const CONNECT_RETRIES: u32 = 50;
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("peer {0} is gone")]
    PeerGone(RankId),
    #[error("malformed job from peer: {0}")]
    Decode(&'static str),
}

/// A TCP-backed mesh of fleet workers, one instance per rank. `send`,
/// `probe` and `recv_any` are plain non-blocking channel operations; the
/// actual I/O runs on background tasks spawned during `connect`, so this
/// type is meant to be handed to a blocking [`engine::Worker`] loop running
/// on its own thread (see `solver`'s bootstrap).
pub struct TcpTransport<Pos> {
    rank: RankId,
    world_size: u32,
    outbound: Vec<Option<mpsc::Sender<WireJob<Pos>>>>,
    inbound_tx: mpsc::Sender<WireJob<Pos>>,
    inbound_rx: mpsc::Receiver<WireJob<Pos>>,
}

impl<Pos> TcpTransport<Pos>
where
    Pos: Serialize + DeserializeOwned + Send + 'static,
{
    /// Binds this rank's listen address, dials every higher-ranked peer,
    /// and accepts one connection per lower-ranked peer. `peers[r]` is
    /// rank `r`'s listen address; every rank must be given the same list.
    pub async fn connect(rank: RankId, peers: Vec<SocketAddr>) -> Result<Self, MeshError> {
        let world_size = peers.len() as u32;
        let (inbound_tx, inbound_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let mut outbound: Vec<Option<mpsc::Sender<WireJob<Pos>>>> =
            (0..world_size).map(|_| None).collect();

        let listener = TcpListener::bind(peers[rank as usize]).await?;

        for (peer_rank, addr) in peers.iter().enumerate() {
            let peer_rank = peer_rank as RankId;
            if peer_rank <= rank {
                continue;
            }
            let mut stream = connect_with_retry(*addr).await?;
            write_handshake(&mut stream, rank).await?;
            outbound[peer_rank as usize] = Some(spawn_peer(stream, peer_rank, inbound_tx.clone()));
        }

        for _ in 0..rank {
            let (stream, _addr) = listener.accept().await?;
            let (peer_rank, stream) = read_handshake(stream).await?;
            outbound[peer_rank as usize] = Some(spawn_peer(stream, peer_rank, inbound_tx.clone()));
        }

        Ok(TcpTransport { rank, world_size, outbound, inbound_tx, inbound_rx })
    }
}

async fn connect_with_retry(addr: SocketAddr) -> Result<TcpStream, MeshError> {
    let mut attempt = 0;
    loop {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(error) if attempt < CONNECT_RETRIES => {
                attempt += 1;
                tracing::debug!(%addr, attempt, %error, "peer not listening yet, retrying");
                tokio::time::sleep(CONNECT_RETRY_DELAY).await;
            }
            Err(error) => return Err(MeshError::Io(error)),
        }
    }
}

/// The dialer announces its own rank as a bare 4-byte big-endian prefix,
/// since `accept()` alone doesn't tell the listener who just connected.
async fn write_handshake(stream: &mut TcpStream, rank: RankId) -> Result<(), MeshError> {
    use tokio::io::AsyncWriteExt;
    stream.write_all(&rank.to_be_bytes()).await?;
    Ok(())
}

async fn read_handshake(mut stream: TcpStream) -> Result<(RankId, TcpStream), MeshError> {
    use tokio::io::AsyncReadExt;
    let mut buf = [0u8; 4];
    stream.read_exact(&mut buf).await?;
    Ok((RankId::from_be_bytes(buf), stream))
}

fn spawn_peer<Pos>(
    stream: TcpStream,
    peer_rank: RankId,
    inbound_tx: mpsc::Sender<WireJob<Pos>>,
) -> mpsc::Sender<WireJob<Pos>>
where
    Pos: Serialize + DeserializeOwned + Send + 'static,
{
    let (read_half, write_half) = stream.into_split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<WireJob<Pos>>(CHANNEL_BUFFER_SIZE);

    tokio::spawn(async move {
        let mut writer = write_half;
        while let Some(job) = outbound_rx.recv().await {
            if let Err(error) = write_frame(&mut writer, &job).await {
                tracing::warn!(peer_rank, %error, "mesh writer exiting");
                break;
            }
        }
    });

    tokio::spawn(async move {
        let mut reader = read_half;
        loop {
            match read_frame(&mut reader).await {
                Ok(wire) => {
                    if inbound_tx.send(wire).await.is_err() {
                        break;
                    }
                }
                Err(error) => {
                    tracing::warn!(peer_rank, %error, "mesh reader exiting");
                    break;
                }
            }
        }
    });

    outbound_tx
}

impl<Pos> engine::Transport<Pos> for TcpTransport<Pos>
where
    Pos: Serialize + DeserializeOwned + Send + 'static,
{
    type Error = MeshError;

    fn rank(&self) -> RankId {
        self.rank
    }

    fn world_size(&self) -> u32 {
        self.world_size
    }

    fn send(&mut self, job: Job<Pos>, dest: RankId) -> Result<(), Self::Error> {
        let wire = to_wire(job);
        if dest == self.rank {
            return self
                .inbound_tx
                .try_send(wire)
                .map_err(|_| MeshError::PeerGone(dest));
        }
        self.outbound
            .get(dest as usize)
            .and_then(|slot| slot.as_ref())
            .ok_or(MeshError::PeerGone(dest))?
            .try_send(wire)
            .map_err(|_| MeshError::PeerGone(dest))
    }

    fn probe(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.inbound_rx.is_empty())
    }

    fn recv_any(&mut self) -> Result<Job<Pos>, Self::Error> {
        let wire = self
            .inbound_rx
            .try_recv()
            .map_err(|_| MeshError::PeerGone(self.rank))?;
        from_wire(wire).map_err(MeshError::Decode)
    }

    fn abort(&mut self) -> Result<(), Self::Error> {
        for dest in 0..self.world_size {
            self.send(Job::Finished, dest)?;
        }
        Ok(())
    }
}
