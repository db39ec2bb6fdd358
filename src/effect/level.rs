//! Speed and brightness levels.
//!
//! The firmware stores raw bytes, but only a handful of values per effect
//! produce distinct results. Levels map onto those values through a table
//! selected by the owning effect.

use std::ops::{Add, Sub};

/// Speed table of an effect.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SpeedProfile {
    /// Swirl, Chase and Bounce.
    Default,
    Rainbow,
    Breathing,
    Cycle,
}

impl SpeedProfile {
    /// Bytes for levels 1 (slow) through 5 (fast).
    pub const fn table(self) -> [u8; 5] {
        match self {
            SpeedProfile::Default => [0x77, 0x74, 0x6e, 0x6b, 0x67],
            SpeedProfile::Rainbow => [0x72, 0x68, 0x64, 0x62, 0x61],
            SpeedProfile::Breathing => [0x3c, 0x37, 0x31, 0x2c, 0x26],
            SpeedProfile::Cycle => [0x96, 0x8c, 0x80, 0x6e, 0x68],
        }
    }
}

/// Brightness table of an effect.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BrightnessProfile {
    Default,
    Cycle,
}

impl BrightnessProfile {
    /// Bytes for levels 1 (dim) through 3 (bright).
    pub const fn table(self) -> [u8; 3] {
        match self {
            BrightnessProfile::Default => [0x4c, 0x99, 0xff],
            BrightnessProfile::Cycle => [0x10, 0x40, 0x7f],
        }
    }
}

/// Effect speed, from 1 (slow) to 5 (fast).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Speed(u8);

impl Speed {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Create a speed, clamping the level into range.
    pub fn new(level: u8) -> Self {
        Self(level.max(Self::MIN).min(Self::MAX))
    }

    /// Level of a stored byte, anything faster than level 4 is level 5.
    pub fn from_byte(byte: u8, profile: SpeedProfile) -> Self {
        let level = profile.table().iter().position(|value| *value <= byte).unwrap_or(4);
        Self(level as u8 + 1)
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn value(self, profile: SpeedProfile) -> u8 {
        profile.table()[usize::from(self.0 - 1)]
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self(3)
    }
}

impl Add<u8> for Speed {
    type Output = Speed;

    fn add(self, delta: u8) -> Speed {
        Speed::new(self.0.saturating_add(delta))
    }
}

impl Sub<u8> for Speed {
    type Output = Speed;

    fn sub(self, delta: u8) -> Speed {
        Speed::new(self.0.saturating_sub(delta))
    }
}

/// LED brightness, from 1 (dim) to 3 (bright).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Brightness(u8);

impl Brightness {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 3;

    /// Create a brightness, clamping the level into range.
    pub fn new(level: u8) -> Self {
        Self(level.max(Self::MIN).min(Self::MAX))
    }

    /// Level of a stored byte, anything brighter than level 2 is level 3.
    pub fn from_byte(byte: u8, profile: BrightnessProfile) -> Self {
        let level = profile.table().iter().position(|value| *value >= byte).unwrap_or(2);
        Self(level as u8 + 1)
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn value(self, profile: BrightnessProfile) -> u8 {
        profile.table()[usize::from(self.0 - 1)]
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Self(Self::MAX)
    }
}

impl Add<u8> for Brightness {
    type Output = Brightness;

    fn add(self, delta: u8) -> Brightness {
        Brightness::new(self.0.saturating_add(delta))
    }
}

impl Sub<u8> for Brightness {
    type Output = Brightness;

    fn sub(self, delta: u8) -> Brightness {
        Brightness::new(self.0.saturating_sub(delta))
    }
}
