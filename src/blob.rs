//! Fixed size packet buffer.

use std::fmt::Write as _;

use bytes::{Buf, Bytes, BytesMut};
use tracing::warn;

use crate::error::{Error, Result};
use crate::types::{Number, ToWire};

/// Size of every report exchanged with the device.
pub const PACKET_SIZE: usize = 64;

/// Cursor over a single 64 byte packet.
///
/// A blob is either filled sequentially with [`Blob::write`] and finalized
/// with [`Blob::bytes`], or created from a received packet and consumed with
/// the `read_*` methods. Received packets are expected to be consumed
/// entirely; a blob dropped before its cursor reached the end of the frame is
/// reported.
pub struct Blob {
    data: BytesMut,
    offset: usize,
    pad: u8,
    strict: bool,
}

impl Blob {
    /// Empty blob for encoding, padded with `pad` when finalized.
    pub fn new(pad: u8) -> Self {
        Self { data: BytesMut::with_capacity(PACKET_SIZE), offset: 0, pad, strict: false }
    }

    /// Blob for decoding a received packet.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PACKET_SIZE {
            return Err(Error::InvalidLength { expected: PACKET_SIZE, actual: bytes.len() });
        }

        Ok(Self { data: BytesMut::from(bytes), offset: 0, pad: 0, strict: true })
    }

    /// Number of bytes written or received.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left before the cursor reaches the end of the frame.
    pub fn remaining(&self) -> usize {
        PACKET_SIZE - self.offset
    }

    /// Skip the end-of-frame check on drop.
    pub fn disarm(&mut self) {
        self.strict = false;
    }

    /// Read `count` raw bytes.
    pub fn read(&mut self, count: usize) -> Result<Bytes> {
        let end = self.offset + count;
        if count == 0 || count >= PACKET_SIZE || end > self.data.len() {
            return Err(Error::OutOfRange { offset: self.offset, requested: count });
        }

        let bytes = Bytes::copy_from_slice(&self.data[self.offset..end]);
        self.offset = end;

        Ok(bytes)
    }

    /// Read a fixed number of raw bytes.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read(N)?;
        let mut array = [0; N];
        array.copy_from_slice(&bytes);
        Ok(array)
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        Ok(self.read(1)?.get_u8())
    }

    pub fn read_word(&mut self) -> Result<u16> {
        Ok(self.read(2)?.get_u16_le())
    }

    pub fn read_dword(&mut self) -> Result<u32> {
        Ok(self.read(4)?.get_u32_le())
    }

    /// Read a byte which must match a known protocol constant.
    pub fn expect_byte(&mut self, field: &'static str, expected: u8) -> Result<u8> {
        let actual = self.read_byte()?;
        check(field, Number::byte(expected), Number::byte(actual))?;
        Ok(actual)
    }

    /// Read a word which must match a known protocol constant.
    pub fn expect_word(&mut self, field: &'static str, expected: u16) -> Result<u16> {
        let actual = self.read_word()?;
        check(field, Number::word(expected), Number::word(actual))?;
        Ok(actual)
    }

    /// Read a dword which must match a known protocol constant.
    pub fn expect_dword(&mut self, field: &'static str, expected: u32) -> Result<u32> {
        let actual = self.read_dword()?;
        check(field, Number::dword(expected), Number::dword(actual))?;
        Ok(actual)
    }

    /// Read whatever is left of the frame.
    pub fn read_rest(&mut self) -> Result<Bytes> {
        match self.remaining() {
            0 => Ok(Bytes::new()),
            count => self.read(count),
        }
    }

    /// Append a value, returning the number of bytes written.
    pub fn write<T: ToWire + ?Sized>(&mut self, value: &T) -> Result<usize> {
        let count = value.wire_len();
        if self.data.len() + count > PACKET_SIZE {
            return Err(Error::BufferOverflow {
                remaining: PACKET_SIZE - self.data.len(),
                requested: count,
            });
        }

        value.put_wire(&mut self.data);
        self.offset += count;

        Ok(count)
    }

    /// Finalized packet, padded to the full frame size.
    pub fn bytes(&self) -> Bytes {
        let mut bytes = self.data.clone();
        bytes.resize(PACKET_SIZE, self.pad);
        bytes.freeze()
    }

    /// Hex dump of the finalized packet, eight bytes per row.
    pub fn dump(&self) -> String {
        dump(&self.bytes())
    }
}

impl Drop for Blob {
    fn drop(&mut self) {
        if self.strict && self.offset != PACKET_SIZE {
            warn!("Not all bytes read, {} remain", self.remaining());
            debug_assert!(
                std::thread::panicking() || self.offset == PACKET_SIZE,
                "Not all bytes read, {} remain",
                self.remaining()
            );
        }
    }
}

/// Hex dump of raw packet bytes, eight bytes per row.
pub fn dump(bytes: &[u8]) -> String {
    let mut out = String::from("[\n");

    for row in bytes.chunks(8) {
        let line: Vec<String> = row.iter().map(|byte| format!("0x{:02X}", byte)).collect();
        let _ = writeln!(out, "    {},", line.join(", "));
    }

    out.push(']');
    out
}

fn check(field: &'static str, expected: Number, actual: Number) -> Result<()> {
    if expected == actual {
        return Ok(());
    }

    Err(Error::ValueMismatch { field, expected: expected.to_string(), actual: actual.to_string() })
}
