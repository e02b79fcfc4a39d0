//! TFRecord framing
//!
//! ```text
//! u64 length (LE) | u32 masked crc32c(length) | payload | u32 masked crc32c(payload)
//! ```

use std::io::{self, Read, Write};

use crate::{Error, Result};

const MASK_DELTA: u32 = 0xa282_ead8;

/// Masked CRC-32C of `data`, as stored in record headers and footers.
#[must_use]
pub fn masked_crc(data: &[u8]) -> u32 {
    crc32c::crc32c(data).rotate_right(15).wrapping_add(MASK_DELTA)
}

/// Write one framed record.
///
/// # Errors
///
/// Propagates write failures.
pub fn write_record<W: Write>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    let len = (payload.len() as u64).to_le_bytes();
    writer.write_all(&len)?;
    writer.write_all(&masked_crc(&len).to_le_bytes())?;
    writer.write_all(payload)?;
    writer.write_all(&masked_crc(payload).to_le_bytes())?;
    Ok(())
}

/// Iterator over record payloads; stops after the first error.
pub struct RecordReader<R> {
    reader: R,
    failed: bool,
}

impl<R: Read> RecordReader<R> {
    /// Wrap a byte source.
    pub const fn new(reader: R) -> Self {
        Self {
            reader,
            failed: false,
        }
    }

    fn next_record(&mut self) -> Result<Option<Vec<u8>>> {
        let mut len = [0u8; 8];
        if !read_exact_or_eof(&mut self.reader, &mut len)? {
            return Ok(None);
        }
        let mut len_crc = [0u8; 4];
        read_exact(&mut self.reader, &mut len_crc, "length checksum")?;
        if u32::from_le_bytes(len_crc) != masked_crc(&len) {
            return Err(Error::DecodeError("record length checksum mismatch".to_string()));
        }

        let len = usize::try_from(u64::from_le_bytes(len))
            .map_err(|_| Error::DecodeError("record length overflows usize".to_string()))?;
        let mut payload = Vec::new();
        let read = (&mut self.reader).take(len as u64).read_to_end(&mut payload)?;
        if read != len {
            return Err(Error::DecodeError(format!(
                "truncated record: expected {len} bytes, found {read}"
            )));
        }

        let mut data_crc = [0u8; 4];
        read_exact(&mut self.reader, &mut data_crc, "payload checksum")?;
        if u32::from_le_bytes(data_crc) != masked_crc(&payload) {
            return Err(Error::DecodeError("record payload checksum mismatch".to_string()));
        }
        Ok(Some(payload))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_record() {
            Ok(Some(payload)) => Some(Ok(payload)),
            Ok(None) => None,
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

/// Fill `buf`; `false` on clean EOF before the first byte.
fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => return Err(Error::DecodeError("truncated record header".to_string())),
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(true)
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|err| {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::DecodeError(format!("truncated record: missing {what}"))
        } else {
            Error::Io(err)
        }
    })
}
