use std::io::{self, Read, Seek, SeekFrom};

use crate::error::Error;

/// Position-tracked byte reader over a seekable stream.
///
/// End-of-stream on a single-byte read is an ordinary `Ok(None)`. Running out
/// of data inside a multi-byte read surfaces as `MalformedContainer`, since
/// that can only happen partway through a record.
pub struct ByteCursor<R> {
    inner: R,
    pos: u64,
}

impl<R: Read + Seek> ByteCursor<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, pos: 0 }
    }

    /// Byte offset from the start of the stream.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Read one byte, or `None` at end-of-stream.
    pub fn read_byte(&mut self) -> Result<Option<u8>, Error> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => {
                    self.pos += 1;
                    return Ok(Some(buf[0]));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Fill as much of `buf` as the stream still holds. A short read is not
    /// an error; the caller decides what an incomplete fill means.
    pub fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => {
                    filled += n;
                    self.pos += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }

    /// Fill `buf` exactly; end-of-stream here means a truncated container.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.pos += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(Error::MalformedContainer { offset: self.pos })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Little-endian u32 at the current position.
    pub fn read_u32_le(&mut self) -> Result<u32, Error> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Skip `n` bytes forward.
    pub fn skip(&mut self, n: u64) -> Result<(), Error> {
        self.inner.seek(SeekFrom::Current(n as i64))?;
        self.pos += n;
        Ok(())
    }

    /// Jump to an absolute byte offset.
    pub fn seek_to(&mut self, pos: u64) -> Result<(), Error> {
        self.inner.seek(SeekFrom::Start(pos))?;
        self.pos = pos;
        Ok(())
    }
}
