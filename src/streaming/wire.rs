//! Wire formats for the outbound channels
//!
//! # Frame Channel
//!
//! Each frame is sent as a length prefix followed by the compressed image:
//!
//! ```text
//! ┌──────────────────────┬──────────────────────────┐
//! │ Length (4 bytes)     │ JPEG payload (Length B)  │
//! │ Little-endian u32    │                          │
//! └──────────────────────┴──────────────────────────┘
//! ```
//!
//! - **Byte order**: little-endian, matching the x86 controllers this talks to
//! - **Direction**: server to client only; the client never writes
//! - **Flush**: after every frame
//!
//! # Status Channel
//!
//! UTF-8 text with no length prefix and no delimiter. Each message is one
//! `write` followed by a flush; consumers read opportunistically.
//!
//! # Command Channel
//!
//! Raw ASCII, no framing. Every successful `read` of up to the configured
//! buffer size is one command string (see [`crate::motion::commands`]).

use crate::error::{Error, Result};
use std::io::{Read, Write};

/// Length prefix size in bytes
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Default reader-side limit (64 MiB is far beyond any sane JPEG frame)
pub const DEFAULT_MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Write one length-prefixed frame and flush
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let len = u32::try_from(payload.len()).map_err(|_| Error::FrameTooLarge {
        len: payload.len(),
        limit: u32::MAX as usize,
    })?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

/// Read one length-prefixed frame
///
/// Lengths above `max_len` are rejected before allocating.
pub fn read_frame<R: Read>(reader: &mut R, max_len: usize) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; LENGTH_PREFIX_LEN];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_le_bytes(len_buf) as usize;
    if len > max_len {
        return Err(Error::FrameTooLarge {
            len,
            limit: max_len,
        });
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

/// Write one status message and flush
pub fn write_status<W: Write>(writer: &mut W, message: &str) -> Result<()> {
    writer.write_all(message.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Decode one command read into trimmed text
///
/// Invalid UTF-8 is replaced rather than rejected; it then parses as an
/// unknown command.
pub fn decode_command(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_frame_layout_is_little_endian() {
        let mut out = Vec::new();
        write_frame(&mut out, &[0xAA; 258]).unwrap();
        assert_eq!(&out[..4], &[0x02, 0x01, 0x00, 0x00]);
        assert_eq!(out.len(), 4 + 258);
    }

    #[test]
    fn test_read_back_consecutive_frames() {
        let mut out = Vec::new();
        write_frame(&mut out, b"first").unwrap();
        write_frame(&mut out, b"").unwrap();
        write_frame(&mut out, b"third").unwrap();

        let mut cursor = Cursor::new(out);
        assert_eq!(read_frame(&mut cursor, 1024).unwrap(), b"first");
        assert_eq!(read_frame(&mut cursor, 1024).unwrap(), b"");
        assert_eq!(read_frame(&mut cursor, 1024).unwrap(), b"third");
        assert!(read_frame(&mut cursor, 1024).is_err());
    }

    #[test]
    fn test_read_rejects_oversized_length() {
        let mut cursor = Cursor::new(u32::MAX.to_le_bytes().to_vec());
        let err = read_frame(&mut cursor, 1024).unwrap_err();
        assert!(matches!(err, Error::FrameTooLarge { limit: 1024, .. }));
    }

    #[test]
    fn test_truncated_payload_is_error() {
        let mut bytes = 10u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"abc");
        assert!(read_frame(&mut Cursor::new(bytes), 1024).is_err());
    }

    #[test]
    fn test_status_has_no_framing() {
        let mut out = Vec::new();
        write_status(&mut out, "SIMULATION_ENDED:SUCCESS").unwrap();
        assert_eq!(out, b"SIMULATION_ENDED:SUCCESS");
    }

    #[test]
    fn test_decode_command() {
        assert_eq!(decode_command(b"  W\r\n"), "W");
        assert_eq!(decode_command(b"\xff\xfe"), "\u{fffd}\u{fffd}");
        assert_eq!(decode_command(b""), "");
    }
}
