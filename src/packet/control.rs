//! Control reports.

use crate::blob::Blob;
use crate::error::Result;
use crate::packet::{Field, Fields, Packet, Raw};
use crate::types::Width::{Byte, Dword, Word};

pub const MODE_FIRMWARE: u8 = 0x40;
pub const MODE_WRITE: u8 = 0x41;
pub const MODE_READ: u8 = 0x42;

const ZERO_MEMORY: &[Field] = &[
    Field::constant("Unknown02", Word, 0x0001),
    Field::constant("Unknown03", Word, 0x0100),
    Field::constant("Unknown04", Word, 0x0001),
    Field::constant("Unknown05", Word, 0x0000),
    Field::constant("Unknown06", Word, 0x0000),
    Field::constant("Unknown07", Word, 0x0000),
];

const EFFECT_DETAILS: &[Field] = &[
    Field::variable("Unknown02", Word),
    Field::variable("Unknown03", Byte),
    Field::variable("Count", Byte),
    Field::variable("Unknown04", Dword),
    Field::variable("Unknown05", Dword),
];

const EFFECT_NAME_LEN: usize = 56;

/// Packets consisting of nothing but their header.
macro_rules! command {
    ($(#[$attr:meta])* $name:ident, $mode:expr, $operation:expr) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            raw: Raw,
        }

        impl $name {
            pub fn new() -> Self {
                Self { raw: Raw::pinned($mode, $operation, 0x00, 0x00) }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Packet for $name {
            fn name(&self) -> &'static str {
                concat!("Packet.Control.", stringify!($name))
            }

            fn raw(&self) -> &Raw {
                &self.raw
            }

            fn raw_mut(&mut self) -> &mut Raw {
                &mut self.raw
            }
        }
    };
}

command!(
    /// 0x41 0x00 - Sent once during startup.
    Reset,
    MODE_WRITE,
    0x00
);

command!(
    /// 0x41 0x03 - Reload all stored settings.
    ApplyStored,
    MODE_WRITE,
    0x03
);

command!(
    /// 0x41 0x80 - Announces a change of the active effects.
    SetActive,
    MODE_WRITE,
    0x80
);

/// 0x42 0x00 - Clears the device memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZeroMemory {
    raw: Raw,
    fields: Fields,
}

impl ZeroMemory {
    pub fn new() -> Self {
        Self { raw: Raw::pinned(MODE_READ, 0x00, 0x00, 0x00), fields: Fields::defaults(ZERO_MEMORY) }
    }
}

impl Default for ZeroMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl Packet for ZeroMemory {
    fn name(&self) -> &'static str {
        "Packet.Control.ZeroMemory"
    }

    fn raw(&self) -> &Raw {
        &self.raw
    }

    fn raw_mut(&mut self) -> &mut Raw {
        &mut self.raw
    }

    fn encode_payload(&self, blob: &mut Blob) -> Result<()> {
        self.fields.encode(blob)
    }

    fn decode_payload(&mut self, blob: &mut Blob) -> Result<()> {
        self.fields = Fields::decode(ZERO_MEMORY, blob)?;
        Ok(())
    }
}

/// 0x40 0x20 - Number of effects stored in the firmware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectDetails {
    raw: Raw,
    pub fields: Option<Fields>,
}

impl EffectDetails {
    pub fn new() -> Self {
        Self { raw: Raw::pinned(MODE_FIRMWARE, 0x20, 0x00, 0x00), fields: None }
    }

    /// Number of effect names which can be queried with [`EffectName`].
    pub fn count(&self) -> Option<u8> {
        self.fields.as_ref().and_then(|fields| fields.get("Count")).map(|count| count as u8)
    }
}

impl Default for EffectDetails {
    fn default() -> Self {
        Self::new()
    }
}

impl Packet for EffectDetails {
    fn name(&self) -> &'static str {
        "Packet.Control.EffectDetails"
    }

    fn raw(&self) -> &Raw {
        &self.raw
    }

    fn raw_mut(&mut self) -> &mut Raw {
        &mut self.raw
    }

    fn encode_payload(&self, blob: &mut Blob) -> Result<()> {
        match &self.fields {
            Some(fields) => fields.encode(blob),
            None => Ok(()),
        }
    }

    fn decode_payload(&mut self, blob: &mut Blob) -> Result<()> {
        self.fields = Some(Fields::decode(EFFECT_DETAILS, blob)?);
        Ok(())
    }
}

/// Default field layout of the 0x40 0x20 reply.
pub fn effect_details_defaults(count: u8) -> Result<Fields> {
    let mut fields = Fields::defaults(EFFECT_DETAILS);
    fields.set("Count", u32::from(count))?;
    Ok(fields)
}

/// 0x40 0x21 - Name and flags of a firmware effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectName {
    raw: Raw,
    pub flags: Option<u32>,
    pub name: Option<String>,
}

impl EffectName {
    pub fn new(index: u8) -> Self {
        Self { raw: Raw::pinned(MODE_FIRMWARE, 0x21, index, 0x00), flags: None, name: None }
    }

    pub fn index(&self) -> u8 {
        self.header().index
    }
}

impl Packet for EffectName {
    fn name(&self) -> &'static str {
        "Packet.Control.EffectName"
    }

    fn raw(&self) -> &Raw {
        &self.raw
    }

    fn raw_mut(&mut self) -> &mut Raw {
        &mut self.raw
    }

    fn encode_payload(&self, blob: &mut Blob) -> Result<()> {
        let name = match &self.name {
            Some(name) => name,
            None => return Ok(()),
        };

        blob.write(&self.flags.unwrap_or_default())?;

        let mut bytes = [0; EFFECT_NAME_LEN];
        let len = name.len().min(EFFECT_NAME_LEN - 1);
        bytes[..len].copy_from_slice(&name.as_bytes()[..len]);
        blob.write(&bytes)?;

        Ok(())
    }

    fn decode_payload(&mut self, blob: &mut Blob) -> Result<()> {
        self.flags = Some(blob.read_dword()?);

        let bytes = blob.read_array::<EFFECT_NAME_LEN>()?;
        let end = bytes.iter().position(|byte| *byte == 0).unwrap_or(EFFECT_NAME_LEN);
        self.name = Some(String::from_utf8_lossy(&bytes[..end]).into_owned());

        Ok(())
    }
}
