//! Read and write message frames from wire.
//!
//! Every message is preceded by its length as a 32-bit big-endian integer. The decoders in this crate only ever see
//! complete, already-buffered frames; reading them off a stream is the job of the helpers below.
//!
//! # References
//! - <https://kafka.apache.org/protocol#protocol_common>

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Cannot read data")]
    IO(#[from] std::io::Error),

    #[error("Negative message size: {size}")]
    NegativeMessageSize { size: i32 },

    #[error("Message too large, limit is {limit} bytes but got {actual} bytes")]
    MessageTooLarge { limit: usize, actual: usize },
}

#[async_trait]
pub trait AsyncMessageRead {
    /// Read one frame and return it *including* its 4-byte length prefix.
    ///
    /// The result can be handed to decoders that validate the prefix themselves, e.g.
    /// [`MetadataResponse::decode`](crate::protocol::messages::MetadataResponse::decode).
    async fn read_frame(&mut self, max_message_size: usize) -> Result<Vec<u8>, ReadError>;
}

#[async_trait]
impl<R> AsyncMessageRead for R
where
    R: AsyncRead + Send + Unpin,
{
    async fn read_frame(&mut self, max_message_size: usize) -> Result<Vec<u8>, ReadError> {
        let mut len_buf = [0u8; 4];
        self.read_exact(&mut len_buf).await?;
        let len = i32::from_be_bytes(len_buf);

        let len = usize::try_from(len).map_err(|_| ReadError::NegativeMessageSize { size: len })?;
        if len > max_message_size {
            return Err(ReadError::MessageTooLarge {
                limit: max_message_size,
                actual: len,
            });
        }

        let mut buf = vec![0u8; 4 + len];
        buf[..4].copy_from_slice(&len_buf);
        self.read_exact(&mut buf[4..]).await?;
        Ok(buf)
    }
}

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Cannot write data")]
    IO(#[from] std::io::Error),

    #[error("Message too large: {size}")]
    TooLarge { size: usize },
}

#[async_trait]
pub trait AsyncMessageWrite {
    /// Write `msg` preceded by its length.
    async fn write_message(&mut self, msg: &[u8]) -> Result<(), WriteError>;
}

#[async_trait]
impl<W> AsyncMessageWrite for W
where
    W: AsyncWrite + Send + Unpin,
{
    async fn write_message(&mut self, msg: &[u8]) -> Result<(), WriteError> {
        let len = i32::try_from(msg.len()).map_err(|_| WriteError::TooLarge { size: msg.len() })?;

        self.write_all(&len.to_be_bytes()).await?;
        self.write_all(msg).await?;
        self.flush().await?;

        Ok(())
    }
}
