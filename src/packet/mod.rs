//! Packet framing shared by all report types.
//!
//! Every packet starts with a four byte header (mode, operation, index and
//! flags) followed by an opcode specific payload and padding up to 64 bytes.
//! Header fields are either pinned by the packet type, in which case they are
//! validated when decoding, or learned from the first decoded reply.

use std::fmt::{self, Debug, Display, Formatter};

use bytes::Bytes;
use tracing::warn;

use crate::blob::{self, Blob, PACKET_SIZE};
use crate::error::{Error, Result};
use crate::types::{Number, Width};

pub mod control;
pub mod firmware;
pub mod profile;

/// Packet header values.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Header {
    pub mode: u8,
    pub operation: u8,
    pub index: u8,
    pub flags: u8,
}

impl Header {
    pub const fn new(mode: u8, operation: u8, index: u8, flags: u8) -> Self {
        Self { mode, operation, index, flags }
    }

    pub const fn bytes(self) -> [u8; 4] {
        [self.mode, self.operation, self.index, self.flags]
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            Number::byte(self.mode),
            Number::byte(self.operation),
            Number::byte(self.index),
            Number::byte(self.flags)
        )
    }
}

/// Header state and trailing bytes of a packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raw {
    mode: Option<u8>,
    operation: Option<u8>,
    index: Option<u8>,
    flags: Option<u8>,
    padding: Bytes,
    pad: u8,
}

impl Raw {
    /// Header with the given fields pinned, `None` fields are learned on decode.
    pub fn new(mode: Option<u8>, operation: Option<u8>, index: Option<u8>, flags: Option<u8>) -> Self {
        Self { mode, operation, index, flags, padding: Bytes::new(), pad: 0x00 }
    }

    /// Header with every field pinned.
    pub fn pinned(mode: u8, operation: u8, index: u8, flags: u8) -> Self {
        Self::new(Some(mode), Some(operation), Some(index), Some(flags))
    }

    /// Fill byte for the space following the payload.
    pub fn with_pad(mut self, pad: u8) -> Self {
        self.pad = pad;
        self
    }

    /// Current header, unknown fields read as zero.
    pub fn header(&self) -> Header {
        Header {
            mode: self.mode.unwrap_or_default(),
            operation: self.operation.unwrap_or_default(),
            index: self.index.unwrap_or_default(),
            flags: self.flags.unwrap_or_default(),
        }
    }

    pub fn set_mode(&mut self, mode: u8) {
        self.mode = Some(mode);
    }

    pub fn set_index(&mut self, index: u8) {
        self.index = Some(index);
    }

    /// Bytes following the decoded payload.
    pub fn padding(&self) -> &Bytes {
        &self.padding
    }

    pub fn set_padding(&mut self, padding: Bytes) {
        self.padding = padding;
    }

    fn read_header(&mut self, blob: &mut Blob) -> Result<()> {
        learn(blob, "Mode", &mut self.mode)?;
        learn(blob, "Operation", &mut self.operation)?;
        learn(blob, "Index", &mut self.index)?;
        learn(blob, "Flags", &mut self.flags)
    }

    fn write_header(&self, blob: &mut Blob) -> Result<()> {
        blob.write(&self.header().bytes())?;
        Ok(())
    }
}

fn learn(blob: &mut Blob, field: &'static str, slot: &mut Option<u8>) -> Result<()> {
    match *slot {
        Some(expected) => {
            blob.expect_byte(field, expected)?;
        },
        None => *slot = Some(blob.read_byte()?),
    }

    Ok(())
}

/// Typed 64 byte report.
///
/// Implementors describe their payload as an ordered sequence of blob reads
/// and writes. Header handling, padding and error recovery are shared.
pub trait Packet: Clone + Debug {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str;

    fn raw(&self) -> &Raw;

    fn raw_mut(&mut self) -> &mut Raw;

    /// Write the payload following the header.
    fn encode_payload(&self, _blob: &mut Blob) -> Result<()> {
        Ok(())
    }

    /// Read the payload following the header.
    fn decode_payload(&mut self, _blob: &mut Blob) -> Result<()> {
        Ok(())
    }

    fn header(&self) -> Header {
        self.raw().header()
    }

    /// Serialize into exactly one 64 byte report.
    fn encode(&self) -> Result<Bytes> {
        let raw = self.raw();
        let mut blob = Blob::new(raw.pad);

        raw.write_header(&mut blob)?;
        self.encode_payload(&mut blob)?;
        if !raw.padding.is_empty() {
            blob.write(&raw.padding)?;
        }

        Ok(blob.bytes())
    }

    /// Decode a reply using this packet as template.
    ///
    /// Replies which do not match the expected layout are returned as
    /// [`ErrorResponse`] rather than an error, only a buffer of the wrong size
    /// fails.
    fn decode(&self, bytes: &[u8]) -> Result<Response<Self>> {
        let mut blob = Blob::from_bytes(bytes)?;
        let mut packet = self.clone();

        match decode_frame(&mut packet, &mut blob) {
            Ok(()) => Ok(Response::Packet(packet)),
            Err(err) => {
                blob.disarm();
                warn!("{}: {}\n{}", self.name(), err, blob::dump(bytes));
                Ok(Response::Error(ErrorResponse::from_bytes(bytes)?))
            },
        }
    }
}

fn decode_frame<P: Packet>(packet: &mut P, blob: &mut Blob) -> Result<()> {
    packet.raw_mut().read_header(blob)?;
    packet.decode_payload(blob)?;

    let padding = blob.read_rest()?;
    packet.raw_mut().padding = padding;

    Ok(())
}

impl Packet for Raw {
    fn name(&self) -> &'static str {
        "Packet.Raw"
    }

    fn raw(&self) -> &Raw {
        self
    }

    fn raw_mut(&mut self) -> &mut Raw {
        self
    }
}

/// Result of decoding a device reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response<P> {
    Packet(P),
    Error(ErrorResponse),
}

impl<P> Response<P> {
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }

    /// Unwrap the typed packet, treating an error response as I/O failure.
    pub fn into_packet(self) -> Result<P> {
        match self {
            Response::Packet(packet) => Ok(packet),
            Response::Error(response) => {
                Err(Error::Io(format!("unexpected reply: {}", response.header())))
            },
        }
    }
}

/// Generic reply substituted for packets which failed to decode.
///
/// Carries the reply header, the header of the request it answers (bytes
/// 4..8, echoed by the device on failures) and the raw reply for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    raw: Raw,
    previous: Header,
    data: Bytes,
}

impl ErrorResponse {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PACKET_SIZE {
            return Err(Error::InvalidLength { expected: PACKET_SIZE, actual: bytes.len() });
        }

        let mut raw = Raw::pinned(bytes[0], bytes[1], bytes[2], bytes[3]);
        raw.padding = Bytes::copy_from_slice(&bytes[8..]);
        let previous = Header::new(bytes[4], bytes[5], bytes[6], bytes[7]);

        Ok(Self { raw, previous, data: Bytes::copy_from_slice(bytes) })
    }

    /// Header echoed from the failed request.
    pub fn previous(&self) -> Header {
        self.previous
    }

    /// Complete reply as received.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn dump(&self) -> String {
        blob::dump(&self.data)
    }
}

impl Packet for ErrorResponse {
    fn name(&self) -> &'static str {
        "Packet.ErrorResponse"
    }

    fn raw(&self) -> &Raw {
        &self.raw
    }

    fn raw_mut(&mut self) -> &mut Raw {
        &mut self.raw
    }

    fn encode_payload(&self, blob: &mut Blob) -> Result<()> {
        blob.write(&self.previous.bytes())?;
        Ok(())
    }

    fn decode_payload(&mut self, blob: &mut Blob) -> Result<()> {
        let [mode, operation, index, flags] = blob.read_array::<4>()?;
        self.previous = Header::new(mode, operation, index, flags);
        Ok(())
    }
}

/// Entry of a fixed packet layout.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub width: Width,
    pub expected: Option<u32>,
}

impl Field {
    /// Known invariant value, any other value signals a protocol change.
    pub const fn constant(name: &'static str, width: Width, value: u32) -> Self {
        Self { name, width, expected: Some(value) }
    }

    pub const fn variable(name: &'static str, width: Width) -> Self {
        Self { name, width, expected: None }
    }
}

/// Values of a fixed field layout, in layout order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fields {
    layout: &'static [Field],
    values: Vec<u32>,
}

impl Fields {
    /// Layout populated with its constants, variable fields zeroed.
    pub fn defaults(layout: &'static [Field]) -> Self {
        let values = layout.iter().map(|field| field.expected.unwrap_or(0)).collect();
        Self { layout, values }
    }

    pub fn decode(layout: &'static [Field], blob: &mut Blob) -> Result<Self> {
        let mut values = Vec::with_capacity(layout.len());

        for field in layout {
            let value = match (field.width, field.expected) {
                (Width::Byte, Some(expected)) => u32::from(blob.expect_byte(field.name, expected as u8)?),
                (Width::Word, Some(expected)) => u32::from(blob.expect_word(field.name, expected as u16)?),
                (Width::Dword, Some(expected)) => blob.expect_dword(field.name, expected)?,
                (Width::Byte, None) => u32::from(blob.read_byte()?),
                (Width::Word, None) => u32::from(blob.read_word()?),
                (Width::Dword, None) => blob.read_dword()?,
            };
            values.push(value);
        }

        Ok(Self { layout, values })
    }

    pub fn encode(&self, blob: &mut Blob) -> Result<()> {
        for (field, value) in self.layout.iter().zip(&self.values) {
            blob.write(&Number::new(*value, field.width))?;
        }

        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.position(name).map(|index| self.values[index])
    }

    pub fn set(&mut self, name: &str, value: u32) -> Result<()> {
        let index = self
            .position(name)
            .ok_or_else(|| Error::InvalidValue(format!("unknown field '{}'", name)))?;
        self.values[index] = Number::new(value, self.layout[index].width).value();
        Ok(())
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.layout.iter().position(|field| field.name == name)
    }
}
