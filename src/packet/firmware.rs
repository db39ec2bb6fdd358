//! Firmware information reports.

use crate::blob::Blob;
use crate::error::{Error, Result};
use crate::packet::{Field, Fields, Packet, Raw};
use crate::types::Width::{Dword, Word};

/// Mode of all firmware reports.
pub const MODE_READ: u8 = 0x12;

const QUERY_HEAD: &[Field] = &[
    Field::constant("Unknown01", Dword, 0x0000_0000),
    Field::constant("Unknown02", Dword, 0x0000_0000),
    Field::constant("VendorId", Word, 0x2516),
    Field::constant("ProductId", Word, 0x0052),
    Field::constant("Unknown03", Dword, 0x0408_7000),
    Field::constant("Unknown04", Dword, 0xffff_ffff),
    Field::constant("Unknown05", Dword, 0x0000_0001),
    Field::constant("Unknown06", Dword, 0xffff_ffff),
    Field::constant("Unknown07", Dword, 0x0000_00e0),
    Field::constant("Unknown08", Dword, 0x00e7_0200),
    Field::constant("Unknown09", Word, 0x0200),
];

const QUERY_TAIL: &[Field] = &[
    Field::constant("Unknown12", Dword, 0xffff_ffff),
    Field::constant("Unknown13", Dword, 0x0000_0000),
    Field::constant("Unknown14", Dword, 0x0000_0000),
];

const FIRMWARE_NAME: &str = "LM0303";
const FIRMWARE_NAME_LEN: usize = 10;

const CAPABILITIES: &[Field] =
    &[Field::constant("Unknown02", Word, 0x0004), Field::constant("Unknown03", Word, 0x0002)];

const PARAMETERS: &[Field] = &[
    Field::constant("Unknown02", Word, 0x0004),
    Field::constant("Unknown03", Word, 0x0080),
    Field::constant("Unknown04", Word, 0x0100),
    Field::constant("Unknown05", Word, 0x0001),
    Field::constant("Unknown06", Word, 0x00e0),
    Field::constant("Unknown07", Word, 0x0000),
    Field::constant("Unknown08", Dword, 0xefff_ffff),
    Field::constant("Unknown09", Dword, 0x0000_0001),
    Field::constant("Unknown10", Dword, 0x0000_0000),
    Field::constant("VendorId", Word, 0x2516),
    Field::constant("ProductId", Word, 0x0051),
    Field::constant("Unknown11", Dword, 0xffff_ffff),
    Field::constant("Unknown12", Dword, 0xffff_ffff),
    Field::constant("Unknown13", Dword, 0xffff_ffff),
    Field::constant("Unknown14", Dword, 0xffff_ffff),
    Field::constant("Unknown15", Dword, 0xffff_ffff),
    Field::constant("Unknown16", Dword, 0xffff_ffff),
    Field::constant("Unknown17", Dword, 0xffff_ffff),
    Field::constant("Unknown18", Dword, 0x001c_5aa5),
];

/// Firmware details reported by [`Query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Details {
    head: Fields,
    name: String,
    tail: Fields,
}

impl Default for Details {
    fn default() -> Self {
        Self {
            head: Fields::defaults(QUERY_HEAD),
            name: FIRMWARE_NAME.into(),
            tail: Fields::defaults(QUERY_TAIL),
        }
    }
}

impl Details {
    pub fn vendor_id(&self) -> u16 {
        self.head.get("VendorId").unwrap_or_default() as u16
    }

    pub fn product_id(&self) -> u16 {
        self.head.get("ProductId").unwrap_or_default() as u16
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// 0x12 0x00 - Firmware details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    raw: Raw,
    pub details: Option<Details>,
}

impl Query {
    pub fn new() -> Self {
        Self { raw: Raw::new(Some(MODE_READ), Some(0x00), None, None), details: None }
    }
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

impl Packet for Query {
    fn name(&self) -> &'static str {
        "Packet.Firmware.Query"
    }

    fn raw(&self) -> &Raw {
        &self.raw
    }

    fn raw_mut(&mut self) -> &mut Raw {
        &mut self.raw
    }

    fn encode_payload(&self, blob: &mut Blob) -> Result<()> {
        let details = match &self.details {
            Some(details) => details,
            None => return Ok(()),
        };

        details.head.encode(blob)?;

        let mut name = [0; FIRMWARE_NAME_LEN];
        let len = details.name.len().min(FIRMWARE_NAME_LEN);
        name[..len].copy_from_slice(&details.name.as_bytes()[..len]);
        blob.write(&name)?;

        details.tail.encode(blob)
    }

    fn decode_payload(&mut self, blob: &mut Blob) -> Result<()> {
        let head = Fields::decode(QUERY_HEAD, blob)?;

        let name = blob.read_array::<FIRMWARE_NAME_LEN>()?;
        let name = String::from_utf8_lossy(&name).trim_end_matches('\0').to_string();
        if name != FIRMWARE_NAME {
            return Err(Error::ValueMismatch {
                field: "FirmwareName",
                expected: FIRMWARE_NAME.into(),
                actual: name,
            });
        }

        let tail = Fields::decode(QUERY_TAIL, blob)?;

        self.details = Some(Details { head, name, tail });

        Ok(())
    }
}

/// 0x12 0x20 - Firmware version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    raw: Raw,
    pub version: Option<String>,
}

impl Version {
    /// Longest string which fits behind the size field.
    const MAX_SIZE: usize = 56;

    pub fn new() -> Self {
        Self { raw: Raw::new(Some(MODE_READ), Some(0x20), None, None), version: None }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new()
    }
}

impl Packet for Version {
    fn name(&self) -> &'static str {
        "Packet.Firmware.Version"
    }

    fn raw(&self) -> &Raw {
        &self.raw
    }

    fn raw_mut(&mut self) -> &mut Raw {
        &mut self.raw
    }

    fn encode_payload(&self, blob: &mut Blob) -> Result<()> {
        let version = match &self.version {
            Some(version) => version,
            None => return Ok(()),
        };

        let units: Vec<u16> = version.encode_utf16().collect();
        let size = units.len() * 2;
        if size > Self::MAX_SIZE {
            return Err(Error::InvalidValue(format!("version string too long: {} bytes", size)));
        }

        blob.write(&(size as u32))?;
        for unit in units {
            blob.write(&unit)?;
        }

        Ok(())
    }

    fn decode_payload(&mut self, blob: &mut Blob) -> Result<()> {
        let size = blob.read_dword()? as usize;
        if size > Self::MAX_SIZE || size % 2 != 0 {
            return Err(Error::InvalidValue(format!("invalid version size: {}", size)));
        }

        let mut units = Vec::with_capacity(size / 2);
        for _ in 0..size / 2 {
            units.push(blob.read_word()?);
        }

        let version = String::from_utf16(&units)
            .map_err(|err| Error::InvalidValue(format!("invalid version string: {}", err)))?;
        let version = version.trim_start_matches('\u{feff}').trim_end_matches('\0');
        self.version = Some(version.to_string());

        // The string length varies, so padding is not preserved.
        blob.read_rest()?;

        Ok(())
    }
}

/// 0x12 0x01 - Firmware flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capabilities {
    raw: Raw,
    pub fields: Option<Fields>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self { raw: Raw::new(Some(MODE_READ), Some(0x01), None, None), fields: None }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::new()
    }
}

impl Packet for Capabilities {
    fn name(&self) -> &'static str {
        "Packet.Firmware.Capabilities"
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
        self.fields = Some(Fields::decode(CAPABILITIES, blob)?);
        Ok(())
    }
}

/// 0x12 0x22 - Additional firmware parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameters {
    raw: Raw,
    pub fields: Option<Fields>,
}

impl Parameters {
    pub fn new() -> Self {
        Self { raw: Raw::new(Some(MODE_READ), Some(0x22), None, None), fields: None }
    }

    /// Product ID of the LED controller.
    pub fn product_id(&self) -> Option<u16> {
        self.fields.as_ref().and_then(|fields| fields.get("ProductId")).map(|id| id as u16)
    }
}

impl Default for Parameters {
    fn default() -> Self {
        Self::new()
    }
}

impl Packet for Parameters {
    fn name(&self) -> &'static str {
        "Packet.Firmware.Parameters"
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
        self.fields = Some(Fields::decode(PARAMETERS, blob)?);
        Ok(())
    }
}

/// Default field values for the 0x12 0x01 reply.
pub fn capabilities_defaults() -> Fields {
    Fields::defaults(CAPABILITIES)
}

/// Default field values for the 0x12 0x22 reply.
pub fn parameters_defaults() -> Fields {
    Fields::defaults(PARAMETERS)
}
