//! Fixed-width wire values.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// Value which can be appended to a packet.
pub trait ToWire {
    /// Number of bytes written by [`ToWire::put_wire`].
    fn wire_len(&self) -> usize;

    /// Append the little endian representation to the buffer.
    fn put_wire(&self, buf: &mut BytesMut);
}

impl ToWire for u8 {
    fn wire_len(&self) -> usize {
        1
    }

    fn put_wire(&self, buf: &mut BytesMut) {
        buf.put_u8(*self);
    }
}

impl ToWire for u16 {
    fn wire_len(&self) -> usize {
        2
    }

    fn put_wire(&self, buf: &mut BytesMut) {
        buf.put_u16_le(*self);
    }
}

impl ToWire for u32 {
    fn wire_len(&self) -> usize {
        4
    }

    fn put_wire(&self, buf: &mut BytesMut) {
        buf.put_u32_le(*self);
    }
}

impl ToWire for [u8] {
    fn wire_len(&self) -> usize {
        self.len()
    }

    fn put_wire(&self, buf: &mut BytesMut) {
        buf.put_slice(self);
    }
}

impl<const N: usize> ToWire for [u8; N] {
    fn wire_len(&self) -> usize {
        N
    }

    fn put_wire(&self, buf: &mut BytesMut) {
        buf.put_slice(&self[..]);
    }
}

impl ToWire for Bytes {
    fn wire_len(&self) -> usize {
        self.len()
    }

    fn put_wire(&self, buf: &mut BytesMut) {
        buf.put_slice(self);
    }
}

/// Byte width of a fixed-width number.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Width {
    Byte = 1,
    Word = 2,
    Dword = 4,
}

impl Width {
    /// Number of bytes on the wire.
    pub const fn len(self) -> usize {
        self as usize
    }

    const fn mask(self) -> u32 {
        match self {
            Width::Byte => 0xff,
            Width::Word => 0xffff,
            Width::Dword => 0xffff_ffff,
        }
    }
}

/// Unsigned integer with a declared byte width.
///
/// Formats as zero-padded hex of its width, which is how packet fields are
/// reported in mismatch errors and dumps.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Number {
    value: u32,
    width: Width,
}

impl Number {
    /// Create a number, truncating the value to its width.
    pub const fn new(value: u32, width: Width) -> Self {
        Self { value: value & width.mask(), width }
    }

    pub const fn byte(value: u8) -> Self {
        Self::new(value as u32, Width::Byte)
    }

    pub const fn word(value: u16) -> Self {
        Self::new(value as u32, Width::Word)
    }

    pub const fn dword(value: u32) -> Self {
        Self::new(value, Width::Dword)
    }

    /// Parse a little endian number from 1, 2 or 4 bytes.
    pub fn from_le_bytes(bytes: &[u8]) -> Result<Self> {
        let width = match bytes.len() {
            1 => Width::Byte,
            2 => Width::Word,
            4 => Width::Dword,
            len => return Err(Error::InvalidValue(format!("invalid number width: {}", len))),
        };

        let value = bytes.iter().rev().fold(0u32, |acc, byte| (acc << 8) | u32::from(*byte));

        Ok(Self::new(value, width))
    }

    pub const fn value(self) -> u32 {
        self.value
    }

    pub const fn width(self) -> Width {
        self.width
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:0width$X}", self.value, width = self.width.len() * 2)
    }
}

impl ToWire for Number {
    fn wire_len(&self) -> usize {
        self.width.len()
    }

    fn put_wire(&self, buf: &mut BytesMut) {
        buf.put_uint_le(u64::from(self.value), self.width.len());
    }
}

/// RGB color.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self { r: bytes[0], g: bytes[1], b: bytes[2] }
    }

    pub const fn bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl FromStr for Rgb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Rgb> {
        let invalid = || Error::InvalidValue(format!("color '{}' does not match 0xRRGGBB", s));

        let chars = if s.starts_with("0x") && s.len() == 8 {
            &s[2..]
        } else {
            return Err(invalid());
        };

        match u32::from_str_radix(chars, 16) {
            Ok(mut color) => {
                let b = (color & 0xff) as u8;
                color >>= 8;
                let g = (color & 0xff) as u8;
                color >>= 8;
                let r = color as u8;
                Ok(Rgb { r, g, b })
            },
            Err(_) => Err(invalid()),
        }
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl ToWire for Rgb {
    fn wire_len(&self) -> usize {
        3
    }

    fn put_wire(&self, buf: &mut BytesMut) {
        buf.put_slice(&self.bytes());
    }
}

/// Number of LED clock ticks between power cycles.
///
/// The tick count for a frequency is `48MHz / frequency`. Only three bytes are
/// available on the wire, so the count is divided by increasing divisors until
/// the quotient fits a word and the divisor is stored in front of it. Values
/// are rounded down to the nearest tick count this encoding can represent.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Resolution(u32);

impl Resolution {
    pub const MIN: u32 = 24_000;
    pub const MAX: u32 = 1_066_666;

    /// LED timer clock.
    pub const TICK_RATE: u32 = 48_000_000;

    pub const MIN_HERTZ: u32 = 45;
    pub const MAX_HERTZ: u32 = 2000;

    /// Create a resolution from a tick count within [`Self::MIN`]..=[`Self::MAX`].
    pub fn new(ticks: u32) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&ticks) {
            return Err(Error::InvalidValue(format!(
                "resolution {} outside of {}..={}",
                ticks,
                Self::MIN,
                Self::MAX
            )));
        }

        Ok(Self(Self::round(ticks)))
    }

    /// Resolution for a frequency, clamped to the supported 45..=2000Hz.
    pub fn from_hertz(hertz: u32) -> Self {
        let hertz = hertz.max(Self::MIN_HERTZ).min(Self::MAX_HERTZ);
        Self(Self::round(Self::TICK_RATE / hertz))
    }

    pub fn to_hertz(self) -> u32 {
        Self::TICK_RATE / self.0
    }

    pub fn ticks(self) -> u32 {
        self.0
    }

    /// Wire format: divisor minus one, followed by the quotient minus one as LE word.
    pub fn encode(self) -> [u8; 3] {
        let (divisor, quotient) = Self::split(self.0);
        let [lo, hi] = ((quotient - 1) as u16).to_le_bytes();
        [(divisor - 1) as u8, lo, hi]
    }

    pub fn decode(bytes: [u8; 3]) -> Result<Self> {
        Self::new(Self::join(bytes))
    }

    /// Raw tick count stored in three bytes, without range validation.
    pub fn join(bytes: [u8; 3]) -> u32 {
        let divisor = u32::from(bytes[0]) + 1;
        let quotient = u32::from(u16::from_le_bytes([bytes[1], bytes[2]])) + 1;
        quotient * divisor
    }

    fn split(ticks: u32) -> (u32, u32) {
        let mut divisor = 1;
        while ticks / divisor > 0xffff {
            divisor += 1;
        }
        (divisor, ticks / divisor)
    }

    /// Largest representable tick count not above `ticks`.
    fn round(mut ticks: u32) -> u32 {
        loop {
            let (divisor, quotient) = Self::split(ticks);
            let rounded = divisor * quotient;
            if rounded == ticks {
                return ticks;
            }
            ticks = rounded;
        }
    }
}

impl Display for Resolution {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToWire for Resolution {
    fn wire_len(&self) -> usize {
        3
    }

    fn put_wire(&self, buf: &mut BytesMut) {
        buf.put_slice(&self.encode());
    }
}
