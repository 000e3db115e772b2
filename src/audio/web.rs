//! Web Audio backend — builds the tone chain from browser audio nodes.
//!
//! Assumes the `AudioContext` has already been resumed by a user gesture.

use wasm_bindgen::JsValue;
use web_sys::{
    AudioContext, BiquadFilterNode, BiquadFilterType, GainNode, OscillatorNode, OscillatorType,
};

use crate::dsp::oscillator::Waveform;
use crate::error::InstrumentError;

use super::AudioBackend;

fn js_err(context: &str, e: JsValue) -> InstrumentError {
    InstrumentError::Audio(format!("{context}: {e:?}"))
}

fn oscillator_type(waveform: Waveform) -> OscillatorType {
    match waveform {
        Waveform::Sine => OscillatorType::Sine,
        Waveform::Square => OscillatorType::Square,
        Waveform::Sawtooth => OscillatorType::Sawtooth,
        Waveform::Triangle => OscillatorType::Triangle,
    }
}

pub struct WebAudioBackend {
    ctx: AudioContext,
}

impl WebAudioBackend {
    pub fn new(ctx: AudioContext) -> Self {
        WebAudioBackend { ctx }
    }

    pub fn context(&self) -> &AudioContext {
        &self.ctx
    }
}

impl AudioBackend for WebAudioBackend {
    type Oscillator = OscillatorNode;
    type Gain = GainNode;
    type Filter = BiquadFilterNode;

    fn current_time(&self) -> f64 {
        self.ctx.current_time()
    }

    fn create_oscillator(&mut self, waveform: Waveform) -> Result<OscillatorNode, InstrumentError> {
        let osc = self
            .ctx
            .create_oscillator()
            .map_err(|e| js_err("createOscillator", e))?;
        osc.set_type(oscillator_type(waveform));
        Ok(osc)
    }

    fn create_gain(&mut self) -> Result<GainNode, InstrumentError> {
        self.ctx.create_gain().map_err(|e| js_err("createGain", e))
    }

    fn create_lowpass(&mut self, cutoff: f64) -> Result<BiquadFilterNode, InstrumentError> {
        let filter = self
            .ctx
            .create_biquad_filter()
            .map_err(|e| js_err("createBiquadFilter", e))?;
        filter.set_type(BiquadFilterType::Lowpass);
        filter.frequency().set_value(cutoff as f32);
        Ok(filter)
    }

    fn connect_chain(
        &mut self,
        oscillator: &OscillatorNode,
        gain: &GainNode,
        filter: &BiquadFilterNode,
    ) -> Result<(), InstrumentError> {
        oscillator
            .connect_with_audio_node(gain)
            .map_err(|e| js_err("connect oscillator", e))?;
        gain.connect_with_audio_node(filter)
            .map_err(|e| js_err("connect gain", e))?;
        filter
            .connect_with_audio_node(&self.ctx.destination())
            .map_err(|e| js_err("connect filter", e))?;
        Ok(())
    }

    fn set_frequency_at(
        &mut self,
        oscillator: &OscillatorNode,
        frequency: f64,
        time: f64,
    ) -> Result<(), InstrumentError> {
        oscillator
            .frequency()
            .set_value_at_time(frequency as f32, time)
            .map_err(|e| js_err("frequency.setValueAtTime", e))?;
        Ok(())
    }

    fn set_gain_at(&mut self, gain: &GainNode, value: f64, time: f64) -> Result<(), InstrumentError> {
        gain.gain()
            .set_value_at_time(value as f32, time)
            .map_err(|e| js_err("gain.setValueAtTime", e))?;
        Ok(())
    }

    fn ramp_gain_at(&mut self, gain: &GainNode, value: f64, end: f64) -> Result<(), InstrumentError> {
        gain.gain()
            .exponential_ramp_to_value_at_time(value as f32, end)
            .map_err(|e| js_err("gain.exponentialRampToValueAtTime", e))?;
        Ok(())
    }

    fn start(&mut self, oscillator: &OscillatorNode) -> Result<(), InstrumentError> {
        oscillator.start().map_err(|e| js_err("oscillator.start", e))
    }

    fn stop_at(&mut self, oscillator: &OscillatorNode, time: f64) -> Result<(), InstrumentError> {
        oscillator
            .stop_with_when(time)
            .map_err(|e| js_err("oscillator.stop", e))
    }
}
