//! Length-prefixed framing.
//!
//! Wire format of one frame:
//! - Bytes 0-3: big-endian `u32` total length, header included (`4 + len(payload)`)
//! - Remaining: the encoded payload
//!
//! The manual transport writes frames built by [`encode_frame`]; the managed
//! transport applies the same framing on both directions.

use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::CodecError;

/// Size of the length prefix.
pub const FRAME_HEADER_LEN: usize = 4;

/// Default upper bound on an inbound frame, header included.
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Prefix `payload` with its framed length.
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, CodecError> {
    let total = payload.len() + FRAME_HEADER_LEN;
    let header = u32::try_from(total).map_err(|_| CodecError::FrameTooLarge {
        len: total,
        max: u32::MAX as usize,
    })?;

    let mut frame = Vec::with_capacity(total);
    frame.extend_from_slice(&header.to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Validate a length prefix and return the payload length it announces.
pub fn parse_header(header: [u8; FRAME_HEADER_LEN], max_frame_len: usize) -> Result<usize, CodecError> {
    let total = u32::from_be_bytes(header) as usize;
    if total < FRAME_HEADER_LEN {
        return Err(CodecError::FrameTooShort { len: total });
    }
    if total > max_frame_len {
        return Err(CodecError::FrameTooLarge {
            len: total,
            max: max_frame_len,
        });
    }
    Ok(total - FRAME_HEADER_LEN)
}

/// Read one frame and return its payload.
///
/// Returns `Ok(None)` when the peer closes the stream before a complete
/// header. Invalid headers surface as `io::ErrorKind::InvalidData`.
pub async fn read_frame<R>(reader: &mut R, max_frame_len: usize) -> io::Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; FRAME_HEADER_LEN];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }

    let len = parse_header(header, max_frame_len)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(payload))
}
