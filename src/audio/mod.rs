//! Audio backends — the host audio subsystem seen through one trait.
//!
//! The tone engine only ever builds `oscillator → gain → low-pass →
//! destination`, so the trait exposes exactly the node types and scheduling
//! calls that chain needs. `WebAudioBackend` drives a real Web Audio graph;
//! `SoftwareBackend` renders the same graph in Rust (AudioWorklet, tests).

pub mod software;
pub mod web;

use crate::dsp::oscillator::Waveform;
use crate::error::InstrumentError;

pub use software::SoftwareBackend;
pub use web::WebAudioBackend;

/// Operations the tone engine needs from the host audio subsystem.
///
/// Times are in seconds on the backend's own clock (`current_time`).
pub trait AudioBackend {
    type Oscillator;
    type Gain;
    type Filter;

    fn current_time(&self) -> f64;

    fn create_oscillator(&mut self, waveform: Waveform) -> Result<Self::Oscillator, InstrumentError>;
    fn create_gain(&mut self) -> Result<Self::Gain, InstrumentError>;
    fn create_lowpass(&mut self, cutoff: f64) -> Result<Self::Filter, InstrumentError>;

    /// Wire `oscillator → gain → filter → destination`.
    fn connect_chain(
        &mut self,
        oscillator: &Self::Oscillator,
        gain: &Self::Gain,
        filter: &Self::Filter,
    ) -> Result<(), InstrumentError>;

    fn set_frequency_at(
        &mut self,
        oscillator: &Self::Oscillator,
        frequency: f64,
        time: f64,
    ) -> Result<(), InstrumentError>;
    fn set_gain_at(&mut self, gain: &Self::Gain, value: f64, time: f64) -> Result<(), InstrumentError>;
    fn ramp_gain_at(&mut self, gain: &Self::Gain, value: f64, end: f64) -> Result<(), InstrumentError>;

    fn start(&mut self, oscillator: &Self::Oscillator) -> Result<(), InstrumentError>;
    fn stop_at(&mut self, oscillator: &Self::Oscillator, time: f64) -> Result<(), InstrumentError>;
}
