//! Lighting zones.

use std::fmt::{self, Display, Formatter};

use crate::effect::{Effect, EffectKind};
use crate::error::{Error, Result};
use crate::mirage::Mirage;
use crate::packet::profile::EffectSettings;

/// Physical lighting region.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ZoneKind {
    Ring,
    Logo,
    Fan,
}

impl ZoneKind {
    pub const ALL: [ZoneKind; 3] = [ZoneKind::Ring, ZoneKind::Logo, ZoneKind::Fan];

    /// Effects which can be assigned to this zone.
    pub fn effects(self) -> &'static [EffectKind] {
        match self {
            ZoneKind::Ring => &[
                EffectKind::Static,
                EffectKind::Rainbow,
                EffectKind::Swirl,
                EffectKind::Chase,
                EffectKind::Bounce,
                EffectKind::Morse,
                EffectKind::Cycle,
                EffectKind::Breathing,
            ],
            ZoneKind::Logo | ZoneKind::Fan => {
                &[EffectKind::Off, EffectKind::Static, EffectKind::Cycle, EffectKind::Breathing]
            },
        }
    }

    pub fn accepts(self, kind: EffectKind) -> bool {
        self.effects().contains(&kind)
    }

    pub fn supports_mirage(self) -> bool {
        self == ZoneKind::Fan
    }

    /// Effect ID of the zone's settings report, the ring has none.
    pub fn id(self) -> Option<u8> {
        match self {
            ZoneKind::Ring => None,
            ZoneKind::Logo => Some(0x06),
            ZoneKind::Fan => Some(0x05),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ZoneKind::Ring => "Ring",
            ZoneKind::Logo => "Logo",
            ZoneKind::Fan => "Fan",
        }
    }
}

impl Display for ZoneKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Zone with its own copy of an effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    kind: ZoneKind,
    effect: Effect,
    mirage: Option<Mirage>,
}

impl Zone {
    pub fn new(kind: ZoneKind, effect: &Effect) -> Result<Self> {
        let mut zone = Self { kind, effect: Effect::new(EffectKind::Off), mirage: None };
        zone.apply_effect(effect)?;
        Ok(zone)
    }

    /// Zone restored from its stored settings.
    pub fn from_settings(kind: ZoneKind, settings: EffectSettings) -> Result<Self> {
        Self::new(kind, &Effect::from_settings(settings))
    }

    /// Store a copy of the effect, rewritten for this zone.
    pub fn apply_effect(&mut self, effect: &Effect) -> Result<()> {
        if !self.kind.accepts(effect.kind()) {
            return Err(Error::IncompatibleEffect { zone: self.kind.name(), effect: effect.kind().name() });
        }

        let mut effect = effect.clone();
        effect.reset_ids();

        if let (Some(id), Some(code)) = (self.kind.id(), effect.kind().zone_code()) {
            let settings = effect.settings_mut();
            settings.set_id(id);
            settings.set_param(3, code)?;
        }

        self.effect = effect;

        Ok(())
    }

    pub fn kind(&self) -> ZoneKind {
        self.kind
    }

    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    pub fn settings(&self) -> &EffectSettings {
        self.effect.settings()
    }

    pub fn mirage(&self) -> Option<&Mirage> {
        self.mirage.as_ref()
    }

    /// Store a copy of the mirage settings, only the fan supports mirage.
    pub fn set_mirage(&mut self, mirage: Option<&Mirage>) -> Result<()> {
        if mirage.is_some() && !self.kind.supports_mirage() {
            return Err(Error::IncompatibleEffect { zone: self.kind.name(), effect: "Mirage" });
        }

        self.mirage = mirage.cloned();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::Speed;
    use crate::types::Rgb;

    #[test]
    fn ring_rejects_off() {
        let off = Effect::new(EffectKind::Off);
        assert!(matches!(
            Zone::new(ZoneKind::Ring, &off),
            Err(Error::IncompatibleEffect { zone: "Ring", effect: "Off" })
        ));
    }

    #[test]
    fn logo_rejects_ring_effects() {
        let mut zone = Zone::new(ZoneKind::Logo, &Effect::new(EffectKind::Static)).unwrap();

        for kind in [EffectKind::Rainbow, EffectKind::Swirl, EffectKind::Chase, EffectKind::Bounce, EffectKind::Morse].iter() {
            let result = zone.apply_effect(&Effect::new(*kind));
            assert!(matches!(result, Err(Error::IncompatibleEffect { zone: "Logo", .. })));
        }

        // Rejected effects leave the zone untouched.
        assert_eq!(zone.effect().kind(), EffectKind::Static);
    }

    #[test]
    fn accepted_effects() {
        for zone in ZoneKind::ALL.iter() {
            for kind in zone.effects() {
                let zone = Zone::new(*zone, &Effect::new(*kind)).unwrap();
                assert_eq!(zone.effect().kind(), *kind);
            }
        }
    }

    #[test]
    fn fan_and_logo_ids() {
        let breathing = Effect::new(EffectKind::Breathing);
        assert_eq!(breathing.settings().id(), 0x01);

        let fan = Zone::new(ZoneKind::Fan, &breathing).unwrap();
        assert_eq!(fan.settings().id(), 0x05);
        assert_eq!(fan.settings().param(3).unwrap(), 0x03);

        let logo = Zone::new(ZoneKind::Logo, &Effect::new(EffectKind::Cycle)).unwrap();
        assert_eq!(logo.settings().id(), 0x06);
        assert_eq!(logo.settings().param(3).unwrap(), 0x02);

        let off = Zone::new(ZoneKind::Logo, &Effect::new(EffectKind::Off)).unwrap();
        assert_eq!(off.settings().id(), 0x06);
        assert_eq!(off.settings().param(3).unwrap(), 0x00);

        // Stored settings resolve back to the same effect.
        let restored = Zone::from_settings(ZoneKind::Fan, fan.settings().clone()).unwrap();
        assert_eq!(restored.effect().kind(), EffectKind::Breathing);
    }

    #[test]
    fn ring_ids() {
        let fan = Zone::new(ZoneKind::Fan, &Effect::new(EffectKind::Static)).unwrap();

        let ring = Zone::new(ZoneKind::Ring, fan.effect()).unwrap();
        assert_eq!(ring.settings().id(), 0x00);
        assert_eq!(ring.effect().kind(), EffectKind::Static);
    }

    #[test]
    fn zone_owns_its_copy() {
        let mut effect = Effect::new(EffectKind::Swirl);
        effect.set_color(Rgb::new(0xff, 0x00, 0x00)).unwrap();

        let ring = Zone::new(ZoneKind::Ring, &effect).unwrap();

        effect.set_color(Rgb::new(0x00, 0x00, 0xff)).unwrap();
        effect.set_speed(Speed::new(1)).unwrap();

        assert_eq!(ring.effect().color().unwrap(), Rgb::new(0xff, 0x00, 0x00));
        assert_eq!(ring.effect().speed().unwrap(), Speed::default());
    }

    #[test]
    fn mirage_only_on_fan() {
        let mut mirage = Mirage::new();
        mirage.activate(Some(0)).unwrap();

        let mut logo = Zone::new(ZoneKind::Logo, &Effect::new(EffectKind::Static)).unwrap();
        assert!(logo.set_mirage(Some(&mirage)).is_err());
        assert!(logo.set_mirage(None).is_ok());

        let mut fan = Zone::new(ZoneKind::Fan, &Effect::new(EffectKind::Static)).unwrap();
        fan.set_mirage(Some(&mirage)).unwrap();

        mirage.activate(None).unwrap();
        assert_eq!(fan.mirage().and_then(Mirage::active_slot), Some(0));
    }
}
