//! Async length-prefixed postcard framing over any `AsyncRead`/`AsyncWrite`,
//! reusing `protocol`'s wire schema and 4-byte big-endian length prefix.

use protocol::{WireJob, FRAME_HEADER_SIZE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub async fn write_frame<W, Pos>(writer: &mut W, job: &WireJob<Pos>) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
    Pos: Serialize,
{
    let framed = protocol::encode_frame(job)
        .map_err(|error| std::io::Error::new(std::io::ErrorKind::InvalidData, error))?;
    writer.write_all(&framed).await
}

pub async fn read_frame<R, Pos>(reader: &mut R) -> std::io::Result<WireJob<Pos>>
where
    R: AsyncRead + Unpin,
    Pos: DeserializeOwned,
{
    let mut header = [0u8; FRAME_HEADER_SIZE];
    reader.read_exact(&mut header).await?;
    let len = protocol::frame_body_len(header) as usize;
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    protocol::decode_body(&body).map_err(|error| std::io::Error::new(std::io::ErrorKind::InvalidData, error))
}
