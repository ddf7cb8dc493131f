//! Length-prefixed JSON framing over a single `TcpStream` (spec §6's
//! transport-choice note: one self-describing document per frame, a
//! 4-byte big-endian length prefix ahead of the JSON body).

use tokio::io::{self, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::message::{ControlReply, ControlRequest};

/// Maximum accepted frame size, guarding against a malformed or hostile
/// length prefix causing an unbounded allocation.
const MAX_FRAME_BYTES: u32 = 16 * 1024 * 1024;

/// Read one length-prefixed frame. Returns `Ok(None)` on a clean EOF
/// between frames (the client closed the connection).
pub async fn read_frame(stream: &mut TcpStream) -> io::Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match stream.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("control frame of {len} bytes exceeds the {MAX_FRAME_BYTES} byte limit"),
        ));
    }
    let mut body = vec![0u8; len as usize];
    stream.read_exact(&mut body).await?;
    Ok(Some(body))
}

pub async fn write_reply(stream: &mut TcpStream, reply: &ControlReply) -> io::Result<()> {
    let body = serde_json::to_vec(reply)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    let len = u32::try_from(body.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "reply too large to frame"))?;
    stream.write_all(&len.to_be_bytes()).await?;
    stream.write_all(&body).await?;
    stream.flush().await
}

/// Parse a frame's JSON body into a [`ControlRequest`]. Kept separate
/// from [`read_frame`] so a decode failure can still report whatever
/// `msg_id` the body happened to carry (spec §7 `MessageDecodeFailure`).
pub fn decode_request(body: &[u8]) -> Result<ControlRequest, (u64, String)> {
    match serde_json::from_slice::<ControlRequest>(body) {
        Ok(request) => Ok(request),
        Err(e) => {
            let msg_id = serde_json::from_slice::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v.get("msg_id").and_then(serde_json::Value::as_u64))
                .unwrap_or(0);
            Err((msg_id, e.to_string()))
        }
    }
}
