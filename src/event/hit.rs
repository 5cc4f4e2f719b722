use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::Nanosecond;

/// Detector subsystem an optical module belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DetectorKind {
    /// Amanda optical module (OM type)
    Amanda,
    /// InIce digital optical module (DOM type)
    InIce,
}

/// Readout channel of a hit which can be flagged dead by calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Adc,
    Le,
    Tot,
}

/// Dead flags of the three readout channels of a hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeadChannels {
    adc: bool,
    le: bool,
    tot: bool,
}

impl DeadChannels {
    pub fn is_dead(&self, channel: Channel) -> bool {
        match channel {
            Channel::Adc => self.adc,
            Channel::Le => self.le,
            Channel::Tot => self.tot,
        }
    }

    pub fn set_dead(&mut self, channel: Channel, dead: bool) {
        match channel {
            Channel::Adc => self.adc = dead,
            Channel::Le => self.le = dead,
            Channel::Tot => self.tot = dead,
        }
    }

    /// True if any of the ADC, LE or TOT channels is flagged dead.
    pub fn any(&self) -> bool {
        self.adc || self.le || self.tot
    }
}

/// Optical module owning a hit: its subsystem and its position in the detector frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpticalModule {
    pub kind: DetectorKind,
    pub position: Vector3<f64>,
}

impl OpticalModule {
    pub fn new(kind: DetectorKind, position: Vector3<f64>) -> Self {
        OpticalModule { kind, position }
    }
}

/// A calibrated detector hit.
///
/// # Fields
///
/// * `module` - The owning optical module, `None` if the owner could not be resolved
/// * `le` - Leading edge time in ns relative to the event time stamp
/// * `dead` - Dead flags of the readout channels
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub module: Option<OpticalModule>,
    pub le: Nanosecond,
    pub dead: DeadChannels,
}

impl Hit {
    pub fn new(module: OpticalModule, le: Nanosecond) -> Self {
        Hit {
            module: Some(module),
            le,
            dead: DeadChannels::default(),
        }
    }

    /// A hit whose owning module is unknown. Such hits never contribute to a fit.
    pub fn orphan(le: Nanosecond) -> Self {
        Hit {
            module: None,
            le,
            dead: DeadChannels::default(),
        }
    }

    /// Builder-style helper to flag one channel as dead.
    pub fn with_dead(mut self, channel: Channel) -> Self {
        self.dead.set_dead(channel, true);
        self
    }

    pub fn is_dead(&self, channel: Channel) -> bool {
        self.dead.is_dead(channel)
    }

    /// True if none of the ADC, LE or TOT channels is dead.
    pub fn is_alive(&self) -> bool {
        !self.dead.any()
    }

    pub fn kind(&self) -> Option<DetectorKind> {
        self.module.map(|m| m.kind)
    }

    pub fn position(&self) -> Option<Vector3<f64>> {
        self.module.map(|m| m.position)
    }
}
