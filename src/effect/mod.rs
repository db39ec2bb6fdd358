//! Lighting effects.
//!
//! Every effect is stored as the same [`EffectSettings`] report. An [`Effect`]
//! interprets its parameter bytes according to the effect kind, which is
//! derived from the effect ID and the zone code in `p3`.

use std::fmt::{self, Display, Formatter};
use std::ops::BitOr;

use crate::error::{Error, Result};
use crate::packet::profile::{Access, EffectSettings};
use crate::types::Rgb;

pub mod level;
pub mod morse;

pub use level::{Brightness, BrightnessProfile, Speed, SpeedProfile};

/// Zone code of the fan and logo for each effect.
const ZONE_OFF: u8 = 0x00;
const ZONE_STATIC: u8 = 0x01;
const ZONE_CYCLE: u8 = 0x02;
const ZONE_BREATHING: u8 = 0x03;

/// Effect ID used for the fan/logo slots.
const FAN_ID: u8 = 0x05;
const LOGO_ID: u8 = 0x06;

/// Bits of `p2`.
const RANDOM_BIT: u8 = 0x80;
const COUNTER_CLOCKWISE_BIT: u8 = 0x01;

/// Values of `p4`.
const REPEAT_ON: u8 = 0xff;
const REPEAT_ONCE: u8 = 0x01;

/// Settings exposed by an effect.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Caps(u8);

impl Caps {
    pub const COLOR: Caps = Caps(0x01);
    pub const RANDOM: Caps = Caps(0x02);
    pub const BRIGHTNESS: Caps = Caps(0x04);
    pub const SPEED: Caps = Caps(0x08);
    pub const DIRECTION: Caps = Caps(0x10);
    pub const MIRAGE: Caps = Caps(0x20);
    pub const REPEAT: Caps = Caps(0x40);

    pub const fn empty() -> Self {
        Caps(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Caps) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Caps {
    type Output = Caps;

    fn bitor(self, rhs: Caps) -> Caps {
        Caps(self.0 | rhs.0)
    }
}

/// Type of an effect.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Off,
    Static,
    Rainbow,
    Cycle,
    Bounce,
    Breathing,
    Swirl,
    Chase,
    Morse,
}

impl EffectKind {
    pub const ALL: [EffectKind; 9] = [
        EffectKind::Off,
        EffectKind::Static,
        EffectKind::Rainbow,
        EffectKind::Cycle,
        EffectKind::Bounce,
        EffectKind::Breathing,
        EffectKind::Swirl,
        EffectKind::Chase,
        EffectKind::Morse,
    ];

    /// Effect stored in a settings report.
    ///
    /// The fan and logo share their IDs between effects and store the actual
    /// effect in `p3`, the ring uses a dedicated ID per effect.
    pub fn resolve(id: u8, p3: u8) -> Self {
        match (id, p3) {
            (FAN_ID, ZONE_STATIC) | (LOGO_ID, ZONE_STATIC) => EffectKind::Static,
            (FAN_ID, ZONE_CYCLE) | (LOGO_ID, ZONE_CYCLE) => EffectKind::Cycle,
            (FAN_ID, ZONE_BREATHING) | (LOGO_ID, ZONE_BREATHING) => EffectKind::Breathing,
            (0x00, _) => EffectKind::Static,
            (0x01, _) => EffectKind::Breathing,
            (0x02, _) => EffectKind::Cycle,
            (0x07, _) => EffectKind::Rainbow,
            (0x08, _) => EffectKind::Bounce,
            (0x09, _) => EffectKind::Chase,
            (0x0a, _) => EffectKind::Swirl,
            (0x0b, _) => EffectKind::Morse,
            _ => EffectKind::Off,
        }
    }

    /// ID of the effect on the ring.
    pub fn ring_id(self) -> Option<u8> {
        match self {
            EffectKind::Off => None,
            EffectKind::Static => Some(0x00),
            EffectKind::Breathing => Some(0x01),
            EffectKind::Cycle => Some(0x02),
            EffectKind::Rainbow => Some(0x07),
            EffectKind::Bounce => Some(0x08),
            EffectKind::Chase => Some(0x09),
            EffectKind::Swirl => Some(0x0a),
            EffectKind::Morse => Some(0x0b),
        }
    }

    /// Code stored in `p3` by the fan and logo.
    pub fn zone_code(self) -> Option<u8> {
        match self {
            EffectKind::Off => Some(ZONE_OFF),
            EffectKind::Static => Some(ZONE_STATIC),
            EffectKind::Cycle => Some(ZONE_CYCLE),
            EffectKind::Breathing => Some(ZONE_BREATHING),
            _ => None,
        }
    }

    pub fn caps(self) -> Caps {
        match self {
            EffectKind::Off => Caps::empty(),
            EffectKind::Static => Caps::COLOR | Caps::BRIGHTNESS,
            EffectKind::Rainbow | EffectKind::Cycle | EffectKind::Bounce => {
                Caps::SPEED | Caps::BRIGHTNESS
            },
            EffectKind::Breathing => Caps::COLOR | Caps::RANDOM | Caps::SPEED | Caps::BRIGHTNESS,
            EffectKind::Swirl | EffectKind::Chase => {
                Caps::COLOR | Caps::RANDOM | Caps::SPEED | Caps::DIRECTION | Caps::BRIGHTNESS
            },
            EffectKind::Morse => Caps::COLOR | Caps::RANDOM | Caps::REPEAT | Caps::BRIGHTNESS,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EffectKind::Off => "Off",
            EffectKind::Static => "Static",
            EffectKind::Rainbow => "Rainbow",
            EffectKind::Cycle => "Cycle",
            EffectKind::Bounce => "Bounce",
            EffectKind::Breathing => "Breathing",
            EffectKind::Swirl => "Swirl",
            EffectKind::Chase => "Chase",
            EffectKind::Morse => "Morse",
        }
    }

    fn speed_profile(self) -> SpeedProfile {
        match self {
            EffectKind::Rainbow => SpeedProfile::Rainbow,
            EffectKind::Breathing => SpeedProfile::Breathing,
            EffectKind::Cycle => SpeedProfile::Cycle,
            _ => SpeedProfile::Default,
        }
    }

    fn brightness_profile(self) -> BrightnessProfile {
        match self {
            EffectKind::Cycle => BrightnessProfile::Cycle,
            _ => BrightnessProfile::Default,
        }
    }
}

impl Display for EffectKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Effect view over a settings report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effect {
    kind: EffectKind,
    settings: EffectSettings,
}

impl Effect {
    /// Wrap stored settings, deriving the effect kind from their IDs.
    pub fn from_settings(settings: EffectSettings) -> Self {
        let p3 = settings.param(3).unwrap_or_default();
        let kind = EffectKind::resolve(settings.id(), p3);
        Self { kind, settings }
    }

    /// Fresh effect with medium speed and full brightness.
    pub fn new(kind: EffectKind) -> Self {
        let caps = kind.caps();

        // p1 speed, p4 repeat, p5 brightness.
        let mut params = [0; 5];
        if caps.contains(Caps::SPEED) {
            params[0] = Speed::default().value(kind.speed_profile());
        }
        if caps.contains(Caps::REPEAT) {
            params[3] = REPEAT_ON;
        }
        if caps.contains(Caps::BRIGHTNESS) {
            params[4] = Brightness::default().value(kind.brightness_profile());
        }

        let mut settings = EffectSettings::new(Access::Write);
        settings.set_params(params);

        let mut effect = Self { kind, settings };
        effect.reset_ids();
        effect
    }

    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    pub fn caps(&self) -> Caps {
        self.kind.caps()
    }

    pub fn settings(&self) -> &EffectSettings {
        &self.settings
    }

    pub(crate) fn settings_mut(&mut self) -> &mut EffectSettings {
        &mut self.settings
    }

    pub fn into_settings(self) -> EffectSettings {
        self.settings
    }

    /// Write the canonical ring ID of this effect.
    ///
    /// The zone code in `p3` is left untouched, fan and logo overwrite both
    /// when the effect is assigned to them.
    pub fn reset_ids(&mut self) {
        match self.kind.ring_id() {
            Some(id) => self.settings.set_id(id),
            None => {
                self.settings.set_id(FAN_ID);

                let mut params = self.settings.params();
                params[2] = ZONE_OFF;
                self.settings.set_params(params);
            },
        }
    }

    pub fn speed(&self) -> Result<Speed> {
        self.require(Caps::SPEED, "speed")?;
        Ok(Speed::from_byte(self.settings.param(1)?, self.kind.speed_profile()))
    }

    pub fn set_speed(&mut self, speed: Speed) -> Result<()> {
        self.require(Caps::SPEED, "speed")?;
        self.settings.set_param(1, speed.value(self.kind.speed_profile()))
    }

    pub fn brightness(&self) -> Result<Brightness> {
        self.require(Caps::BRIGHTNESS, "brightness")?;
        Ok(Brightness::from_byte(self.settings.param(5)?, self.kind.brightness_profile()))
    }

    pub fn set_brightness(&mut self, brightness: Brightness) -> Result<()> {
        self.require(Caps::BRIGHTNESS, "brightness")?;
        self.settings.set_param(5, brightness.value(self.kind.brightness_profile()))
    }

    pub fn color(&self) -> Result<Rgb> {
        self.require(Caps::COLOR, "color")?;
        self.settings.rgb(1)
    }

    pub fn set_color(&mut self, color: Rgb) -> Result<()> {
        self.require(Caps::COLOR, "color")?;
        self.settings.set_rgb(1, color)
    }

    /// Whether random colors are used instead of the configured one.
    pub fn is_random(&self) -> Result<bool> {
        self.require(Caps::RANDOM, "random")?;
        Ok(self.settings.param(2)? & RANDOM_BIT != 0)
    }

    pub fn set_random(&mut self, on: bool) -> Result<()> {
        self.require(Caps::RANDOM, "random")?;
        if on {
            self.settings.or_param(2, RANDOM_BIT)
        } else {
            self.settings.not_param(2, RANDOM_BIT)
        }
    }

    pub fn is_clockwise(&self) -> Result<bool> {
        self.require(Caps::DIRECTION, "direction")?;
        Ok(self.settings.param(2)? & COUNTER_CLOCKWISE_BIT == 0)
    }

    // TODO: Verify rotation direction against hardware, the flag polarity
    // changed between protocol captures.
    pub fn set_clockwise(&mut self, on: bool) -> Result<()> {
        self.require(Caps::DIRECTION, "direction")?;
        if on {
            self.settings.not_param(2, COUNTER_CLOCKWISE_BIT)
        } else {
            self.settings.or_param(2, COUNTER_CLOCKWISE_BIT)
        }
    }

    /// Whether the morse sequence loops.
    pub fn is_repeat(&self) -> Result<bool> {
        self.require(Caps::REPEAT, "repeat")?;
        Ok(self.settings.param(4)? == REPEAT_ON)
    }

    pub fn set_repeat(&mut self, on: bool) -> Result<()> {
        self.require(Caps::REPEAT, "repeat")?;
        self.settings.set_param(4, if on { REPEAT_ON } else { REPEAT_ONCE })
    }

    fn require(&self, caps: Caps, capability: &'static str) -> Result<()> {
        if self.caps().contains(caps) {
            Ok(())
        } else {
            Err(Error::Unsupported { effect: self.kind.name(), capability })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(id: u8, p3: u8) -> EffectSettings {
        let mut settings = EffectSettings::new(Access::Write);
        settings.set_id(id);
        settings.set_param(3, p3).unwrap();
        settings
    }

    #[test]
    fn factory_dispatch() {
        let table = [
            (0x05, 0x01, EffectKind::Static),
            (0x05, 0x02, EffectKind::Cycle),
            (0x05, 0x03, EffectKind::Breathing),
            (0x06, 0x01, EffectKind::Static),
            (0x06, 0x02, EffectKind::Cycle),
            (0x06, 0x03, EffectKind::Breathing),
            (0x05, 0x00, EffectKind::Off),
            (0x06, 0x04, EffectKind::Off),
            (0x00, 0x00, EffectKind::Static),
            (0x01, 0x00, EffectKind::Breathing),
            (0x02, 0x00, EffectKind::Cycle),
            (0x07, 0x00, EffectKind::Rainbow),
            (0x08, 0x00, EffectKind::Bounce),
            (0x09, 0x00, EffectKind::Chase),
            (0x0a, 0x00, EffectKind::Swirl),
            (0x0b, 0x07, EffectKind::Morse),
            (0x03, 0x00, EffectKind::Off),
            (0x0c, 0x01, EffectKind::Off),
            (0xfe, 0x00, EffectKind::Off),
        ];

        for (id, p3, kind) in table.iter() {
            assert_eq!(EffectKind::resolve(*id, *p3), *kind, "id {:#04x} p3 {:#04x}", id, p3);
            assert_eq!(Effect::from_settings(settings(*id, *p3)).kind(), *kind);
        }
    }

    #[test]
    fn ring_ids_resolve_to_their_kind() {
        for kind in EffectKind::ALL.iter() {
            if let Some(id) = kind.ring_id() {
                assert_eq!(EffectKind::resolve(id, 0x00), *kind);
            }
        }
    }

    #[test]
    fn reset_ids() {
        let mut effect = Effect::from_settings(settings(0x05, 0x03));
        assert_eq!(effect.kind(), EffectKind::Breathing);

        effect.reset_ids();
        assert_eq!(effect.settings().id(), 0x01);
        assert_eq!(effect.settings().param(3).unwrap(), 0x03);

        let mut off = Effect::from_settings(settings(0x42, 0x07));
        off.reset_ids();
        assert_eq!(off.settings().id(), 0x05);
        assert_eq!(off.settings().param(3).unwrap(), 0x00);
    }

    #[test]
    fn fresh_effect_defaults() {
        for kind in EffectKind::ALL.iter() {
            let effect = Effect::new(*kind);
            let caps = effect.caps();

            if caps.contains(Caps::SPEED) {
                assert_eq!(effect.speed().unwrap(), Speed::default());
            } else {
                assert_eq!(effect.settings().param(1).unwrap(), 0);
            }
            if caps.contains(Caps::BRIGHTNESS) {
                assert_eq!(effect.brightness().unwrap(), Brightness::default());
            }
            if caps.contains(Caps::REPEAT) {
                assert!(effect.is_repeat().unwrap());
            }
        }

        let off = Effect::new(EffectKind::Off);
        assert_eq!(off.settings().id(), FAN_ID);
        assert_eq!(off.settings().params(), [0; 5]);
        assert_eq!(EffectKind::resolve(off.settings().id(), off.settings().param(3).unwrap()), EffectKind::Off);
    }

    #[test]
    fn capabilities() {
        assert!(EffectKind::Off.caps().is_empty());
        assert_eq!(EffectKind::Static.caps(), Caps::COLOR | Caps::BRIGHTNESS);
        assert!(EffectKind::Swirl.caps().contains(Caps::DIRECTION | Caps::SPEED));
        assert!(!EffectKind::Breathing.caps().contains(Caps::DIRECTION));
        assert!(EffectKind::Morse.caps().contains(Caps::REPEAT));
        assert!(!EffectKind::Morse.caps().contains(Caps::SPEED));
        assert!(EffectKind::ALL.iter().all(|kind| !kind.caps().contains(Caps::MIRAGE)));
    }

    #[test]
    fn unsupported_settings() {
        let mut effect = Effect::new(EffectKind::Static);

        assert!(matches!(
            effect.set_speed(Speed::new(1)),
            Err(Error::Unsupported { effect: "Static", capability: "speed" })
        ));
        assert!(effect.is_random().is_err());
        assert!(effect.set_clockwise(true).is_err());
        assert!(effect.is_repeat().is_err());

        let off = Effect::new(EffectKind::Off);
        assert!(off.brightness().is_err());
        assert!(off.color().is_err());
    }

    #[test]
    fn speed_uses_effect_profile() {
        let mut effect = Effect::new(EffectKind::Cycle);
        effect.set_speed(Speed::new(1)).unwrap();
        assert_eq!(effect.settings().param(1).unwrap(), 0x96);
        assert_eq!(effect.speed().unwrap(), Speed::new(1));

        let mut effect = Effect::new(EffectKind::Swirl);
        effect.set_speed(Speed::new(5)).unwrap();
        assert_eq!(effect.settings().param(1).unwrap(), 0x67);
        effect.set_speed(effect.speed().unwrap() + 1).unwrap();
        assert_eq!(effect.speed().unwrap().level(), 5);
    }

    #[test]
    fn brightness_uses_effect_profile() {
        let mut effect = Effect::new(EffectKind::Cycle);
        effect.set_brightness(Brightness::new(2)).unwrap();
        assert_eq!(effect.settings().param(5).unwrap(), 0x40);

        let mut effect = Effect::new(EffectKind::Static);
        assert_eq!(effect.settings().param(5).unwrap(), 0xff);
        effect.set_brightness(Brightness::new(1)).unwrap();
        assert_eq!(effect.settings().param(5).unwrap(), 0x4c);
        assert_eq!(effect.brightness().unwrap().level(), 1);
    }

    #[test]
    fn random_and_direction_share_p2() {
        let mut effect = Effect::new(EffectKind::Chase);

        effect.set_random(true).unwrap();
        effect.set_clockwise(false).unwrap();
        assert_eq!(effect.settings().param(2).unwrap(), 0x81);
        assert!(effect.is_random().unwrap());
        assert!(!effect.is_clockwise().unwrap());

        effect.set_clockwise(true).unwrap();
        assert_eq!(effect.settings().param(2).unwrap(), 0x80);
        assert!(effect.is_clockwise().unwrap());

        effect.set_random(false).unwrap();
        assert_eq!(effect.settings().param(2).unwrap(), 0x00);
    }

    #[test]
    fn morse_repeat() {
        let mut effect = Effect::new(EffectKind::Morse);
        assert!(effect.is_repeat().unwrap());
        assert_eq!(effect.settings().param(4).unwrap(), 0xff);

        effect.set_repeat(false).unwrap();
        assert_eq!(effect.settings().param(4).unwrap(), 0x01);
        assert!(!effect.is_repeat().unwrap());
    }

    #[test]
    fn color() {
        let mut effect = Effect::new(EffectKind::Breathing);
        effect.set_color(Rgb::new(0x12, 0x34, 0x56)).unwrap();
        assert_eq!(effect.color().unwrap(), Rgb::new(0x12, 0x34, 0x56));
        assert_eq!(effect.into_settings().rgb(1).unwrap(), Rgb::new(0x12, 0x34, 0x56));
    }
}
