//! Frame I/O helpers shared by the server and the client

use std::io::{Read, Write};

use crate::error::{OrionError, Result};

/// Read one length-prefixed frame.
///
/// A `max_size` of 0 disables the size check; otherwise an oversized length
/// prefix is a protocol error and the caller should drop the connection.
pub fn read_frame(reader: &mut impl Read, max_size: u64) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf) as u64;

    if max_size > 0 && len > max_size {
        return Err(OrionError::Protocol(format!(
            "frame of {len} bytes exceeds the {max_size} byte limit"
        )));
    }

    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

/// Write one length-prefixed frame
pub fn write_frame(writer: &mut impl Write, payload: &[u8]) -> Result<()> {
    writer.write_all(&(payload.len() as u32).to_be_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}
