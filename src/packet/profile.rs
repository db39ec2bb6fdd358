//! Profile reports, storing effect settings and their auxiliary pages.

use crate::blob::Blob;
use crate::error::{Error, Result};
use crate::packet::{Field, Fields, Packet, Raw};
use crate::types::{Resolution, Rgb, Width};

/// Size of the data carried by paged reports.
pub const PAGE_SIZE: usize = 60;

/// Number of ring LEDs in the active zone list.
pub const RING_LEDS: usize = 15;

/// Ring entry of the active zone list while the ring is disabled.
pub const RING_DISABLED: u8 = 0xfe;

/// Profile ID written before and after every update.
pub const ACTIVE_PROFILE: u16 = 0x00e0;

/// Resolution bytes used for the disabled mirage channel.
pub const MIRAGE_OFF: [u8; 3] = [0x00, 0xff, 0x4a];

/// Frequency reported for mirage slots with out of range values.
pub const DEFAULT_HERTZ: u16 = 330;

const PROFILE_PAIR: &[Field] = &[Field::constant("Unknown02", Width::Word, ACTIVE_PROFILE as u32)];

/// Direction of a profile report.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Access {
    Read = 0x52,
    Write = 0x51,
}

impl Access {
    pub const fn mode(self) -> u8 {
        self as u8
    }

    /// Switch an existing packet to this direction.
    ///
    /// Decoded replies are turned into write requests this way, keeping
    /// their padding intact.
    pub fn apply<P: Packet>(self, packet: &mut P) {
        packet.raw_mut().set_mode(self.mode());
    }
}

fn slot(index: usize, max: usize) -> Result<usize> {
    if index < 1 || index > max {
        return Err(Error::IndexOutOfRange { index, min: 1, max });
    }

    Ok(index - 1)
}

/// 0x28 - Active profile ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveProfile {
    raw: Raw,
    pub id: u16,
}

impl ActiveProfile {
    pub fn new(access: Access) -> Self {
        Self { raw: Raw::pinned(access.mode(), 0x28, 0x00, 0x00), id: ACTIVE_PROFILE }
    }
}

impl Packet for ActiveProfile {
    fn name(&self) -> &'static str {
        "Packet.Profile.ActiveProfile"
    }

    fn raw(&self) -> &Raw {
        &self.raw
    }

    fn raw_mut(&mut self) -> &mut Raw {
        &mut self.raw
    }

    fn encode_payload(&self, blob: &mut Blob) -> Result<()> {
        blob.write(&self.id)?;
        Ok(())
    }

    fn decode_payload(&mut self, blob: &mut Blob) -> Result<()> {
        self.id = blob.read_word()?;
        Ok(())
    }
}

/// 0x29 - Read once during startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfilePair {
    raw: Raw,
    pub fields: Option<Fields>,
}

impl ProfilePair {
    pub fn new() -> Self {
        Self { raw: Raw::pinned(Access::Read.mode(), 0x29, 0x00, 0x00), fields: None }
    }
}

impl Default for ProfilePair {
    fn default() -> Self {
        Self::new()
    }
}

impl Packet for ProfilePair {
    fn name(&self) -> &'static str {
        "Packet.Profile.ProfilePair"
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
        self.fields = Some(Fields::decode(PROFILE_PAIR, blob)?);
        Ok(())
    }
}

/// 0x2C - Parameters of a single effect.
///
/// All effects share this layout, the meaning of the five parameter bytes and
/// the two colors depends on the effect stored in `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectSettings {
    raw: Raw,
    request: bool,
    id: u8,
    params: [u8; 5],
    colors: [Rgb; 2],
}

impl EffectSettings {
    pub fn new(access: Access) -> Self {
        Self {
            raw: Raw::pinned(access.mode(), 0x2c, 0x01, 0x00),
            request: false,
            id: 0x00,
            params: [0; 5],
            colors: [Rgb::default(); 2],
        }
    }

    /// Request for the stored settings of an effect.
    pub fn read(id: u8) -> Self {
        let mut settings = Self::new(Access::Read);
        settings.raw = settings.raw.with_pad(0xff);
        settings.request = true;
        settings.id = id;
        settings
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn set_id(&mut self, id: u8) {
        self.id = id;
    }

    /// Parameter byte `p1` through `p5`.
    /// Parameters `p1..p5`.
    pub fn params(&self) -> [u8; 5] {
        self.params
    }

    pub fn set_params(&mut self, params: [u8; 5]) {
        self.params = params;
    }

    pub fn param(&self, index: usize) -> Result<u8> {
        Ok(self.params[slot(index, 5)?])
    }

    pub fn set_param(&mut self, index: usize, value: u8) -> Result<()> {
        self.params[slot(index, 5)?] = value;
        Ok(())
    }

    /// Set the bits of `value` in a parameter.
    pub fn or_param(&mut self, index: usize, value: u8) -> Result<()> {
        self.params[slot(index, 5)?] |= value;
        Ok(())
    }

    /// Clear the bits of `value` in a parameter.
    pub fn not_param(&mut self, index: usize, value: u8) -> Result<()> {
        self.params[slot(index, 5)?] &= !value;
        Ok(())
    }

    /// Color `rgb1` or `rgb2`.
    pub fn rgb(&self, index: usize) -> Result<Rgb> {
        Ok(self.colors[slot(index, 2)?])
    }

    pub fn set_rgb(&mut self, index: usize, value: Rgb) -> Result<()> {
        self.colors[slot(index, 2)?] = value;
        Ok(())
    }
}

impl Packet for EffectSettings {
    fn name(&self) -> &'static str {
        "Packet.Profile.EffectSettings"
    }

    fn raw(&self) -> &Raw {
        &self.raw
    }

    fn raw_mut(&mut self) -> &mut Raw {
        &mut self.raw
    }

    fn encode_payload(&self, blob: &mut Blob) -> Result<()> {
        blob.write(&self.id)?;
        if self.request {
            return Ok(());
        }

        blob.write(&self.params)?;
        blob.write(&self.colors[0])?;
        blob.write(&self.colors[1])?;

        Ok(())
    }

    fn decode_payload(&mut self, blob: &mut Blob) -> Result<()> {
        self.request = false;
        self.id = blob.read_byte()?;
        self.params = blob.read_array::<5>()?;
        self.colors[0] = Rgb::from_bytes(blob.read_array::<3>()?);
        self.colors[1] = Rgb::from_bytes(blob.read_array::<3>()?);

        Ok(())
    }
}

/// 0xA0 - Effects active in each zone.
///
/// The fan and logo entries are fixed, the ring carries one entry per LED.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyActive {
    raw: Raw,
    request: bool,
    ring: [u8; RING_LEDS],
}

impl ApplyActive {
    const ZONE_COUNT: u8 = 0x03;
    const FAN: u8 = 0x05;
    const LOGO: u8 = 0x06;

    pub fn new(access: Access) -> Self {
        Self { raw: Raw::pinned(access.mode(), 0xa0, 0x01, 0x00), request: false, ring: [0; RING_LEDS] }
    }

    /// Request for the current zone list.
    pub fn read() -> Self {
        Self { request: true, ..Self::new(Access::Read) }
    }

    /// Effect ID of the ring, [`RING_DISABLED`] while it is off.
    pub fn ring_id(&self) -> u8 {
        self.ring[0]
    }

    /// Run the same effect on every ring LED.
    pub fn set_ring_id(&mut self, id: u8) {
        self.ring = [id; RING_LEDS];
    }

    pub fn ring_enabled(&self) -> bool {
        self.ring_id() != RING_DISABLED
    }
}

impl Packet for ApplyActive {
    fn name(&self) -> &'static str {
        "Packet.Profile.ApplyActive"
    }

    fn raw(&self) -> &Raw {
        &self.raw
    }

    fn raw_mut(&mut self) -> &mut Raw {
        &mut self.raw
    }

    fn encode_payload(&self, blob: &mut Blob) -> Result<()> {
        blob.write(&0x00u8)?;
        blob.write(&Self::ZONE_COUNT)?;
        if self.request {
            return Ok(());
        }

        blob.write(&0x0000u16)?;
        blob.write(&Self::FAN)?;
        blob.write(&Self::LOGO)?;
        blob.write(&self.ring)?;

        Ok(())
    }

    fn decode_payload(&mut self, blob: &mut Blob) -> Result<()> {
        self.request = false;
        blob.expect_byte("Unknown02", 0x00)?;
        blob.expect_byte("Count", Self::ZONE_COUNT)?;
        blob.expect_word("Unknown03", 0x0000)?;
        blob.expect_byte("Fan", Self::FAN)?;
        blob.expect_byte("Logo", Self::LOGO)?;
        self.ring = blob.read_array::<RING_LEDS>()?;

        Ok(())
    }
}

/// 0x70 - Storage for breathing cycle colors.
///
/// Each zone spans five pages of twenty RGB triplets, the page is stored in
/// the header index and the zone in the header flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreathPage {
    raw: Raw,
    pub data: Option<[u8; PAGE_SIZE]>,
}

impl BreathPage {
    pub fn new(access: Access, zone: u8, page: u8) -> Self {
        Self { raw: Raw::pinned(access.mode(), 0x70, page, zone), data: None }
    }

    pub fn page(&self) -> u8 {
        self.header().index
    }

    pub fn zone(&self) -> u8 {
        self.header().flags
    }

    /// Color at position `index` of the page.
    pub fn color(&self, index: usize) -> Option<Rgb> {
        let data = self.data.as_ref()?;
        let start = index.checked_mul(3)?;
        let bytes = data.get(start..start.checked_add(3)?)?;
        Some(Rgb::new(bytes[0], bytes[1], bytes[2]))
    }
}

impl Packet for BreathPage {
    fn name(&self) -> &'static str {
        "Packet.Profile.BreathPage"
    }

    fn raw(&self) -> &Raw {
        &self.raw
    }

    fn raw_mut(&mut self) -> &mut Raw {
        &mut self.raw
    }

    fn encode_payload(&self, blob: &mut Blob) -> Result<()> {
        if let Some(data) = &self.data {
            blob.write(data)?;
        }

        Ok(())
    }

    fn decode_payload(&mut self, blob: &mut Blob) -> Result<()> {
        self.data = Some(blob.read_array::<PAGE_SIZE>()?);
        Ok(())
    }
}

/// 0x71 - Tick counts of the active mirage channels.
///
/// This report cannot be read back from the device, it is always built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirageResolution {
    raw: Raw,
    resolutions: [[u8; 3]; 3],
}

impl MirageResolution {
    pub fn new(access: Access) -> Self {
        Self { raw: Raw::pinned(access.mode(), 0x71, 0x00, 0x00), resolutions: [MIRAGE_OFF; 3] }
    }

    /// Red, green and blue resolutions, `None` while mirage is off.
    pub fn resolutions(&self) -> Option<[Resolution; 3]> {
        let [r, g, b] = self.resolutions;
        Some([Resolution::decode(r).ok()?, Resolution::decode(g).ok()?, Resolution::decode(b).ok()?])
    }

    pub fn set_resolutions(&mut self, resolutions: Option<[Resolution; 3]>) {
        self.resolutions = match resolutions {
            Some([r, g, b]) => [r.encode(), g.encode(), b.encode()],
            None => [MIRAGE_OFF; 3],
        };
    }
}

impl Packet for MirageResolution {
    fn name(&self) -> &'static str {
        "Packet.Profile.MirageResolution"
    }

    fn raw(&self) -> &Raw {
        &self.raw
    }

    fn raw_mut(&mut self) -> &mut Raw {
        &mut self.raw
    }

    fn encode_payload(&self, blob: &mut Blob) -> Result<()> {
        blob.write(&0x01u8)?;
        blob.write(&MIRAGE_OFF)?;

        for (index, resolution) in (0x02u8..).zip(&self.resolutions) {
            blob.write(&index)?;
            blob.write(resolution)?;
        }

        Ok(())
    }

    fn decode_payload(&mut self, blob: &mut Blob) -> Result<()> {
        blob.expect_byte("Index1", 0x01)?;
        let off = blob.read_array::<3>()?;
        if off != MIRAGE_OFF {
            return Err(Error::ValueMismatch {
                field: "Off",
                expected: format!("{:02X?}", MIRAGE_OFF),
                actual: format!("{:02X?}", off),
            });
        }

        blob.expect_byte("Index2", 0x02)?;
        self.resolutions[0] = blob.read_array::<3>()?;
        blob.expect_byte("Index3", 0x03)?;
        self.resolutions[1] = blob.read_array::<3>()?;
        blob.expect_byte("Index4", 0x04)?;
        self.resolutions[2] = blob.read_array::<3>()?;

        Ok(())
    }
}

/// 0x73 - A page of packed morse code.
///
/// There are eight pages. Pages 0 and 1 hold the active sequence, pages 2
/// through 7 the three stored slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MorsePage {
    raw: Raw,
    pub data: Option<[u8; PAGE_SIZE]>,
}

impl MorsePage {
    pub const COUNT: u8 = 8;

    pub fn new(access: Access, page: u8) -> Self {
        Self { raw: Raw::pinned(access.mode(), 0x73, page, 0x00), data: None }
    }

    pub fn page(&self) -> u8 {
        self.header().index
    }
}

impl Packet for MorsePage {
    fn name(&self) -> &'static str {
        "Packet.Profile.MorsePage"
    }

    fn raw(&self) -> &Raw {
        &self.raw
    }

    fn raw_mut(&mut self) -> &mut Raw {
        &mut self.raw
    }

    fn encode_payload(&self, blob: &mut Blob) -> Result<()> {
        if let Some(data) = &self.data {
            blob.write(data)?;
        }

        Ok(())
    }

    fn decode_payload(&mut self, blob: &mut Blob) -> Result<()> {
        self.data = Some(blob.read_array::<PAGE_SIZE>()?);
        Ok(())
    }
}

/// 0x94 - Frequencies of the three stored mirage slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirageFrequencies {
    raw: Raw,
    request: bool,
    active: Option<usize>,
    slots: [[u16; 3]; 3],
}

impl MirageFrequencies {
    pub const SLOTS: usize = 3;

    pub fn new(access: Access) -> Self {
        Self {
            raw: Raw::pinned(access.mode(), 0x94, 0x00, 0x00),
            request: false,
            active: None,
            slots: [[DEFAULT_HERTZ; 3]; Self::SLOTS],
        }
    }

    /// Request for the stored frequencies.
    pub fn read() -> Self {
        Self { request: true, ..Self::new(Access::Read) }
    }

    /// Slot currently used by the fan, if mirage is enabled.
    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn set_active(&mut self, slot: Option<usize>) -> Result<()> {
        if let Some(slot) = slot {
            Self::check_slot(slot)?;
        }

        self.active = slot;
        Ok(())
    }

    /// Red, green and blue frequency of a slot in Hz.
    pub fn frequency(&self, slot: usize) -> Result<[u16; 3]> {
        Self::check_slot(slot)?;
        Ok(self.slots[slot])
    }

    pub fn set_frequency(&mut self, slot: usize, hertz: [u16; 3]) -> Result<()> {
        Self::check_slot(slot)?;

        let range = Resolution::MIN_HERTZ..=Resolution::MAX_HERTZ;
        if let Some(value) = hertz.iter().find(|value| !range.contains(&u32::from(**value))) {
            return Err(Error::InvalidValue(format!("mirage frequency {}Hz out of range", value)));
        }

        self.slots[slot] = hertz;
        Ok(())
    }

    fn check_slot(slot: usize) -> Result<()> {
        if slot >= Self::SLOTS {
            return Err(Error::IndexOutOfRange { index: slot, min: 0, max: Self::SLOTS - 1 });
        }

        Ok(())
    }

    fn flag(active: Option<usize>) -> u8 {
        match active {
            Some(slot) => 0x03 + 4 * slot as u8,
            None => 0x00,
        }
    }
}

impl Packet for MirageFrequencies {
    fn name(&self) -> &'static str {
        "Packet.Profile.MirageFrequencies"
    }

    fn raw(&self) -> &Raw {
        &self.raw
    }

    fn raw_mut(&mut self) -> &mut Raw {
        &mut self.raw
    }

    fn encode_payload(&self, blob: &mut Blob) -> Result<()> {
        if self.request {
            return Ok(());
        }

        blob.write(&Self::flag(self.active))?;

        // Channel major, all red values come first.
        for channel in 0..3 {
            for slot in &self.slots {
                blob.write(&slot[channel])?;
            }
        }

        Ok(())
    }

    fn decode_payload(&mut self, blob: &mut Blob) -> Result<()> {
        self.request = false;
        self.active = match blob.read_byte()? {
            0x03 => Some(0),
            0x07 => Some(1),
            0x0b => Some(2),
            _ => None,
        };

        let range = Resolution::MIN_HERTZ..=Resolution::MAX_HERTZ;
        for channel in 0..3 {
            for slot in 0..Self::SLOTS {
                let hertz = blob.read_word()?;
                self.slots[slot][channel] =
                    if range.contains(&u32::from(hertz)) { hertz } else { DEFAULT_HERTZ };
            }
        }

        Ok(())
    }
}

/// 0x96 - Always zero, follows every update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZeroBlock {
    raw: Raw,
}

impl ZeroBlock {
    pub fn new(access: Access) -> Self {
        Self { raw: Raw::pinned(access.mode(), 0x96, 0x00, 0x00) }
    }
}

impl Packet for ZeroBlock {
    fn name(&self) -> &'static str {
        "Packet.Profile.ZeroBlock"
    }

    fn raw(&self) -> &Raw {
        &self.raw
    }

    fn raw_mut(&mut self) -> &mut Raw {
        &mut self.raw
    }

    fn encode_payload(&self, blob: &mut Blob) -> Result<()> {
        blob.write(&[0u8; PAGE_SIZE])?;
        Ok(())
    }

    fn decode_payload(&mut self, blob: &mut Blob) -> Result<()> {
        let data = blob.read_array::<PAGE_SIZE>()?;
        if let Some(offset) = data.iter().position(|byte| *byte != 0) {
            return Err(Error::ValueMismatch {
                field: "ZeroBlock",
                expected: "0x00".into(),
                actual: format!("0x{:02X} at offset {}", data[offset], offset + 4),
            });
        }

        Ok(())
    }
}
