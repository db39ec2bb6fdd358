//! Device session.
//!
//! Every report sent to the device is answered by exactly one reply. Read
//! requests are answered with the requested data, write requests are echoed
//! back unless the device rejects them.

use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::blob::PACKET_SIZE;
use crate::controller::Transport;
use crate::effect::{morse, Effect, EffectKind};
use crate::error::{Error, Result};
use crate::mirage::Mirage;
use crate::packet::control::{ApplyStored, EffectDetails, EffectName, SetActive};
use crate::packet::firmware::{Capabilities, Details, Parameters, Query, Version};
use crate::packet::profile::{
    Access, ActiveProfile, ApplyActive, BreathPage, EffectSettings, MirageFrequencies, MorsePage,
    ProfilePair, ZeroBlock, PAGE_SIZE, RING_DISABLED,
};
use crate::packet::{Packet, Response};
use crate::types::Rgb;
use crate::zone::{Zone, ZoneKind};

/// Reply timeout used unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

/// Ring effects stored on the device, in the order they are read.
const RING_EFFECTS: [EffectKind; 8] = [
    EffectKind::Static,
    EffectKind::Rainbow,
    EffectKind::Swirl,
    EffectKind::Chase,
    EffectKind::Bounce,
    EffectKind::Morse,
    EffectKind::Cycle,
    EffectKind::Breathing,
];

/// First two bytes of a reply rejecting a request.
const REJECTED: [u8; 2] = [0xff, 0xaa];

/// Morse page pairs, the active sequence followed by three stored slots.
pub type MorsePages = [[u8; PAGE_SIZE]; MorsePage::COUNT as usize];

/// Complete lighting configuration of the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub ring: Zone,
    pub ring_enabled: bool,
    pub logo: Zone,
    pub fan: Zone,
    pub morse_pages: MorsePages,
}

impl Profile {
    /// Static white light in every zone.
    pub fn new() -> Result<Self> {
        let mut effect = Effect::new(EffectKind::Static);
        effect.set_color(Rgb::new(0xff, 0xff, 0xff))?;

        Ok(Self {
            ring: Zone::new(ZoneKind::Ring, &effect)?,
            ring_enabled: true,
            logo: Zone::new(ZoneKind::Logo, &effect)?,
            fan: Zone::new(ZoneKind::Fan, &effect)?,
            morse_pages: [[0; PAGE_SIZE]; MorsePage::COUNT as usize],
        })
    }

    pub fn zone(&self, kind: ZoneKind) -> &Zone {
        match kind {
            ZoneKind::Ring => &self.ring,
            ZoneKind::Logo => &self.logo,
            ZoneKind::Fan => &self.fan,
        }
    }

    pub fn zone_mut(&mut self, kind: ZoneKind) -> &mut Zone {
        match kind {
            ZoneKind::Ring => &mut self.ring,
            ZoneKind::Logo => &mut self.logo,
            ZoneKind::Fan => &mut self.fan,
        }
    }

    /// Ring entry of the active zone list.
    pub fn ring_id(&self) -> u8 {
        match self.ring.effect().kind().ring_id() {
            Some(id) if self.ring_enabled => id,
            _ => RING_DISABLED,
        }
    }

    /// Store a morse message as the active sequence and in the first slot.
    pub fn set_morse(&mut self, text: &str) {
        let page = morse::to_page(&morse::encode(text));

        for pair in [0, 2].iter() {
            self.morse_pages[*pair] = page;
            self.morse_pages[*pair + 1] = [0; PAGE_SIZE];
        }
    }

    /// Text of the active morse sequence.
    pub fn morse(&self) -> String {
        let bytes: Vec<u8> = self.morse_pages[..2].iter().flat_map(|page| page.iter().copied()).collect();
        morse::decode(&morse::from_bytes(&bytes))
    }
}

/// Firmware information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Firmware {
    pub details: Details,
    pub version: String,
    pub capabilities: Capabilities,
    pub parameters: Parameters,
}

/// Session with the LED controller.
pub struct Device<T: Transport> {
    transport: T,
    timeout: Duration,
}

impl<T: Transport> Device<T> {
    pub fn new(transport: T) -> Self {
        Self { transport, timeout: DEFAULT_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Send a packet and decode the reply with it as template.
    pub fn post<P: Packet>(&mut self, packet: &P) -> Result<Response<P>> {
        let reply = self.exchange(packet)?;
        packet.decode(&reply)
    }

    /// Firmware identification and version.
    pub fn firmware(&mut self) -> Result<Firmware> {
        let details = self
            .read(&Query::new())?
            .details
            .ok_or_else(|| Error::Io("empty firmware query".into()))?;
        let version = self.firmware_version()?;
        let capabilities = self.read(&Capabilities::new())?;
        let parameters = self.read(&Parameters::new())?;

        Ok(Firmware { details, version, capabilities, parameters })
    }

    pub fn firmware_version(&mut self) -> Result<String> {
        self.read(&Version::new())?.version.ok_or_else(|| Error::Io("empty firmware version".into()))
    }

    /// Names of the effects built into the firmware.
    pub fn effect_names(&mut self) -> Result<Vec<String>> {
        let count = self.read(&EffectDetails::new())?.count().unwrap_or_default();

        let mut names = Vec::with_capacity(usize::from(count));
        for index in 0..count {
            let name = self.read(&EffectName::new(index))?;
            names.push(name.name.unwrap_or_default());
        }

        Ok(names)
    }

    /// Read a page of breathing cycle colors.
    pub fn breath_page(&mut self, zone: u8, page: u8) -> Result<BreathPage> {
        self.read(&BreathPage::new(Access::Read, zone, page))
    }

    /// Read the configuration of every zone.
    pub fn load_profile(&mut self) -> Result<Profile> {
        self.read(&ProfilePair::new())?;

        let mut ring_settings = Vec::with_capacity(RING_EFFECTS.len());
        for kind in RING_EFFECTS.iter() {
            if let Some(id) = kind.ring_id() {
                ring_settings.push(self.read_settings(id)?);
            }
        }

        let active = self.read(&ApplyActive::read())?;
        let fan_settings = self.read_settings(zone_id(ZoneKind::Fan))?;
        let logo_settings = self.read_settings(zone_id(ZoneKind::Logo))?;

        let mut morse_pages = [[0; PAGE_SIZE]; MorsePage::COUNT as usize];
        for (page, data) in (0..MorsePage::COUNT).zip(morse_pages.iter_mut()) {
            if let Some(page) = self.read(&MorsePage::new(Access::Read, page))?.data {
                *data = page;
            }
        }

        let frequencies = self.read(&MirageFrequencies::read())?;

        // A disabled ring keeps showing the static effect settings.
        let ring_enabled = active.ring_enabled();
        let ring = match ring_settings.iter().find(|settings| settings.id() == active.ring_id()) {
            Some(settings) => settings.clone(),
            None => {
                if ring_enabled {
                    warn!(
                        "Unknown ring effect {:#04x}, falling back to {}",
                        active.ring_id(),
                        EffectKind::Static
                    );
                }

                ring_settings.first().cloned().ok_or_else(|| Error::Io("no ring effect settings".into()))?
            },
        };

        let mut fan = Zone::from_settings(ZoneKind::Fan, fan_settings)?;
        fan.set_mirage(Some(&Mirage::from_frequencies(frequencies)?))?;

        let profile = Profile {
            ring: Zone::from_settings(ZoneKind::Ring, ring)?,
            ring_enabled,
            logo: Zone::from_settings(ZoneKind::Logo, logo_settings)?,
            fan,
            morse_pages,
        };

        info!(
            "Loaded profile: ring {} ({}), logo {}, fan {}",
            profile.ring.effect().kind(),
            if ring_enabled { "enabled" } else { "disabled" },
            profile.logo.effect().kind(),
            profile.fan.effect().kind()
        );

        Ok(profile)
    }

    /// Write a profile and make it active.
    pub fn apply(&mut self, profile: &Profile) -> Result<()> {
        self.write(&SetActive::new())?;
        self.write(&ZeroBlock::new(Access::Write))?;
        self.write(&ActiveProfile::new(Access::Write))?;

        if let Some(mirage) = profile.fan.mirage() {
            self.write(mirage.resolution())?;
            self.write(mirage.frequencies())?;
        }

        self.write_settings(profile.fan.settings())?;
        self.write_settings(profile.logo.settings())?;

        let ring_kind = profile.ring.effect().kind();
        if profile.ring_enabled && ring_kind == EffectKind::Morse {
            for (page, data) in (0..MorsePage::COUNT).zip(profile.morse_pages.iter()) {
                let mut packet = MorsePage::new(Access::Write, page);
                packet.data = Some(*data);
                self.write(&packet)?;
            }
        }

        if profile.ring_enabled {
            self.write_settings(profile.ring.settings())?;
        }

        let mut active = ApplyActive::new(Access::Write);
        active.set_ring_id(profile.ring_id());
        self.write(&active)?;

        self.write(&ActiveProfile::new(Access::Write))?;

        info!("Applied profile: ring {}, logo {}, fan {}", ring_kind, profile.logo.effect().kind(), profile.fan.effect().kind());

        Ok(())
    }

    /// Reload the settings stored on the device.
    pub fn reload(&mut self) -> Result<()> {
        self.write(&ApplyStored::new())
    }

    fn exchange<P: Packet>(&mut self, packet: &P) -> Result<Bytes> {
        let request = packet.encode()?;
        debug!("{} > {}", packet.name(), packet.header());

        let reply = self.transport.exchange(&request, self.timeout)?;
        if reply.len() != PACKET_SIZE {
            return Err(Error::InvalidLength { expected: PACKET_SIZE, actual: reply.len() });
        }

        debug!("{} < {:02X?}", packet.name(), &reply[..4]);

        Ok(reply)
    }

    /// Send a request and decode the reply, any unexpected reply is an error.
    fn read<P: Packet>(&mut self, packet: &P) -> Result<P> {
        self.post(packet)?.into_packet()
    }

    /// Send a write request, failing if the device rejects it.
    fn write<P: Packet>(&mut self, packet: &P) -> Result<()> {
        let reply = self.exchange(packet)?;

        if reply.starts_with(&REJECTED) {
            return Err(Error::Io(format!("{} rejected ({})", packet.name(), packet.header())));
        }

        Ok(())
    }

    fn read_settings(&mut self, id: u8) -> Result<EffectSettings> {
        let mut settings = self.read(&EffectSettings::read(id))?;
        Access::Write.apply(&mut settings);
        Ok(settings)
    }

    fn write_settings(&mut self, settings: &EffectSettings) -> Result<()> {
        let mut settings = settings.clone();
        Access::Write.apply(&mut settings);
        self.write(&settings)
    }
}

fn zone_id(kind: ZoneKind) -> u8 {
    kind.id().unwrap_or_default()
}
