//! Fan mirage, a flicker effect layered on top of the fan effect.
//!
//! Each color channel is pulsed at its own frequency. Three frequency
//! triplets are stored on the device, the active one is sent as LED clock
//! resolutions.

use crate::error::Result;
use crate::packet::profile::{Access, MirageFrequencies, MirageResolution};
use crate::types::Resolution;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mirage {
    resolution: MirageResolution,
    frequencies: MirageFrequencies,
}

impl Default for Mirage {
    fn default() -> Self {
        Self::new()
    }
}

impl Mirage {
    /// Disabled mirage with default frequencies in every slot.
    pub fn new() -> Self {
        Self {
            resolution: MirageResolution::new(Access::Write),
            frequencies: MirageFrequencies::new(Access::Write),
        }
    }

    /// Mirage restored from the stored frequencies.
    ///
    /// Resolutions cannot be read back, so they are rebuilt from the active
    /// slot.
    pub fn from_frequencies(mut frequencies: MirageFrequencies) -> Result<Self> {
        Access::Write.apply(&mut frequencies);

        let active = frequencies.active();
        let mut mirage = Self { resolution: MirageResolution::new(Access::Write), frequencies };
        mirage.activate(active)?;

        Ok(mirage)
    }

    pub fn frequency(&self, slot: usize) -> Result<[u16; 3]> {
        self.frequencies.frequency(slot)
    }

    /// Store frequencies in a slot, updating the output if the slot is active.
    pub fn set_frequency(&mut self, slot: usize, hertz: [u16; 3]) -> Result<()> {
        self.frequencies.set_frequency(slot, hertz)?;

        if self.frequencies.active() == Some(slot) {
            self.activate(Some(slot))?;
        }

        Ok(())
    }

    /// Switch to a stored slot, `None` disables mirage.
    pub fn activate(&mut self, slot: Option<usize>) -> Result<()> {
        let resolutions = match slot {
            Some(slot) => Some(Self::resolutions(self.frequencies.frequency(slot)?)),
            None => None,
        };

        self.frequencies.set_active(slot)?;
        self.resolution.set_resolutions(resolutions);

        Ok(())
    }

    /// Slot matching the current resolutions.
    pub fn active_slot(&self) -> Option<usize> {
        let current = self.resolution.resolutions()?;

        (0..MirageFrequencies::SLOTS).find(|slot| {
            self.frequencies.frequency(*slot).map_or(false, |hertz| Self::resolutions(hertz) == current)
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.resolution.resolutions().is_some()
    }

    pub fn resolution(&self) -> &MirageResolution {
        &self.resolution
    }

    pub fn frequencies(&self) -> &MirageFrequencies {
        &self.frequencies
    }

    fn resolutions(hertz: [u16; 3]) -> [Resolution; 3] {
        let [r, g, b] = hertz;
        [
            Resolution::from_hertz(u32::from(r)),
            Resolution::from_hertz(u32::from(g)),
            Resolution::from_hertz(u32::from(b)),
        ]
    }
}
