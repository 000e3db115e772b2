//! Instrument configuration, loadable from JSON or a JS object.

use serde::{Deserialize, Serialize};

use crate::controls::ControlLayout;
use crate::dsp::oscillator::Waveform;
use crate::error::{ConfigError, InstrumentError};

/// Voice settings for the tone chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToneConfig {
    pub waveform: Waveform,
    /// Gain while a note is held.
    pub gain: f64,
    /// Low-pass cutoff in Hz.
    pub cutoff: f64,
    /// Fade-out time in seconds after release.
    pub release: f64,
    /// Gain the release ramp aims for. Exponential ramps cannot reach zero.
    pub release_floor: f64,
}

impl Default for ToneConfig {
    fn default() -> Self {
        ToneConfig {
            waveform: Waveform::Sawtooth,
            gain: 0.3,
            cutoff: 1000.0,
            release: 0.5,
            release_floor: 0.001,
        }
    }
}

impl ToneConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |field: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::InvalidTone { field, value })
            }
        };
        positive("gain", self.gain)?;
        positive("cutoff", self.cutoff)?;
        positive("release", self.release)?;
        positive("releaseFloor", self.release_floor)?;
        if self.release_floor >= self.gain {
            return Err(ConfigError::InvalidTone {
                field: "releaseFloor",
                value: self.release_floor,
            });
        }
        Ok(())
    }
}

/// Everything needed to build an instrument.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    pub layout: ControlLayout,
    pub tone: ToneConfig,
}

impl InstrumentConfig {
    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, InstrumentError> {
        let config: InstrumentConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.layout.validate()?;
        self.tone.validate()
    }
}
