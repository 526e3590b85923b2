//! Packet framing over a byte stream
//!
//! TCP may split or coalesce the greeting and request, so each packet is
//! read until its declared length is available rather than in one read.

use bytes::BytesMut;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Read one packet into `buf` and split it off
///
/// `frame_len` returns the full packet length once the prefix is long enough
/// to tell. Bytes past the packet stay in `buf` for the next phase. At EOF a
/// partial packet is returned as-is so the codec reports what is wrong with
/// it; EOF before any byte is an `UnexpectedEof` error.
pub(crate) async fn read_frame<S, F>(
    stream: &mut S,
    buf: &mut BytesMut,
    max_len: usize,
    frame_len: F,
) -> io::Result<BytesMut>
where
    S: AsyncRead + Unpin,
    F: Fn(&[u8]) -> Option<usize>,
{
    loop {
        if let Some(len) = frame_len(buf) {
            if buf.len() >= len {
                return Ok(buf.split_to(len));
            }
        }
        if buf.len() >= max_len {
            return Ok(buf.split_to(max_len));
        }

        if stream.read_buf(buf).await? == 0 {
            if buf.is_empty() {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "client closed before sending a packet",
                ));
            }
            return Ok(buf.split());
        }
    }
}
