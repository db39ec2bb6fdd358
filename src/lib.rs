//! Cooler Master Wraith Prism RGB protocol.
//!
//! The LED controller of the cooler is driven through 64 byte HID reports.
//! Every report starts with a four byte header (mode, operation, index and
//! flags) followed by the operation's payload, padded to the full report
//! size.

pub mod blob;
pub mod controller;
pub mod device;
pub mod effect;
pub mod error;
pub mod mirage;
pub mod packet;
pub mod types;
pub mod zone;

pub use crate::controller::{HidTransport, Transport};
pub use crate::device::{Device, Firmware, Profile};
pub use crate::effect::{Brightness, Effect, EffectKind, Speed};
pub use crate::error::{Error, Result};
pub use crate::mirage::Mirage;
pub use crate::types::Rgb;
pub use crate::zone::{Zone, ZoneKind};
