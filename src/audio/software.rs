//! Software backend — renders the oscillator/gain/low-pass graph in Rust.
//!
//! The clock advances only as blocks are rendered, one sample per frame.
//! A chain keeps sounding until its oscillator's stop time passes; then the
//! chain and its nodes are freed.

use std::collections::BTreeMap;

use crate::dsp::filter::LowpassFilter;
use crate::dsp::oscillator::{Oscillator, Waveform};
use crate::dsp::param::AudioParam;
use crate::error::InstrumentError;

use super::AudioBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OscillatorId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GainId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FilterId(u32);

#[derive(Debug, Clone)]
struct OscillatorNode {
    oscillator: Oscillator,
    frequency: AudioParam,
    started: bool,
    stop: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
struct Chain {
    oscillator: OscillatorId,
    gain: GainId,
    filter: FilterId,
}

/// In-process rendition of the tone graph.
#[derive(Debug, Clone)]
pub struct SoftwareBackend {
    sample_rate: f64,
    frames: u64,
    next_id: u32,
    oscillators: BTreeMap<OscillatorId, OscillatorNode>,
    gains: BTreeMap<GainId, AudioParam>,
    filters: BTreeMap<FilterId, LowpassFilter>,
    chains: Vec<Chain>,
}

impl SoftwareBackend {
    /// `sample_rate` must be finite and positive.
    pub fn new(sample_rate: f64) -> Result<Self, InstrumentError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(InstrumentError::Audio(format!(
                "invalid sample rate {sample_rate}"
            )));
        }
        Ok(SoftwareBackend {
            sample_rate,
            frames: 0,
            next_id: 0,
            oscillators: BTreeMap::new(),
            gains: BTreeMap::new(),
            filters: BTreeMap::new(),
            chains: Vec::new(),
        })
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Number of connected chains still producing sound (held or fading).
    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// Scheduled gain of a node at time `t`.
    pub fn gain_at(&self, gain: GainId, t: f64) -> Option<f64> {
        self.gains.get(&gain).map(|p| p.value_at(t))
    }

    /// Scheduled frequency of an oscillator at time `t`.
    pub fn frequency_at(&self, oscillator: OscillatorId, t: f64) -> Option<f64> {
        self.oscillators.get(&oscillator).map(|n| n.frequency.value_at(t))
    }

    /// Stop time scheduled for an oscillator, if any.
    pub fn stop_time(&self, oscillator: OscillatorId) -> Option<f64> {
        self.oscillators.get(&oscillator).and_then(|n| n.stop)
    }

    /// Render the next `out.len()` frames of mono output.
    pub fn render(&mut self, out: &mut [f32]) {
        for (i, frame) in out.iter_mut().enumerate() {
            let t = (self.frames + i as u64) as f64 / self.sample_rate;
            let mut mix = 0.0;

            for chain in &self.chains {
                let (Some(node), Some(gain), Some(filter)) = (
                    self.oscillators.get_mut(&chain.oscillator),
                    self.gains.get(&chain.gain),
                    self.filters.get_mut(&chain.filter),
                ) else {
                    continue;
                };
                if !node.started || node.stop.is_some_and(|stop| t >= stop) {
                    continue;
                }
                node.oscillator.frequency = node.frequency.value_at(t);
                let sample = node.oscillator.next_sample() * gain.value_at(t);
                mix += filter.process(sample);
            }

            *frame = mix as f32;
        }

        self.frames += out.len() as u64;
        self.collect_finished();
    }

    /// Advance the clock by `seconds`, discarding the output.
    pub fn advance(&mut self, seconds: f64) {
        let mut remaining = (seconds * self.sample_rate).round() as usize;
        let mut scratch = [0.0_f32; 128];
        while remaining > 0 {
            let n = remaining.min(scratch.len());
            self.render(&mut scratch[..n]);
            remaining -= n;
        }
    }

    fn collect_finished(&mut self) {
        let now = self.current_time();
        let oscillators = &mut self.oscillators;
        let gains = &mut self.gains;
        let filters = &mut self.filters;

        self.chains.retain(|chain| {
            let finished = oscillators
                .get(&chain.oscillator)
                .and_then(|n| n.stop)
                .is_some_and(|stop| stop <= now);
            if finished {
                oscillators.remove(&chain.oscillator);
                gains.remove(&chain.gain);
                filters.remove(&chain.filter);
                log::trace!("freed chain for oscillator {:?}", chain.oscillator);
            }
            !finished
        });

        for node in oscillators.values_mut() {
            node.frequency.prune_before(now);
        }
        for gain in gains.values_mut() {
            gain.prune_before(now);
        }
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn oscillator_mut(&mut self, id: OscillatorId) -> Result<&mut OscillatorNode, InstrumentError> {
        self.oscillators
            .get_mut(&id)
            .ok_or_else(|| InstrumentError::Audio(format!("unknown oscillator {id:?}")))
    }

    fn gain_mut(&mut self, id: GainId) -> Result<&mut AudioParam, InstrumentError> {
        self.gains
            .get_mut(&id)
            .ok_or_else(|| InstrumentError::Audio(format!("unknown gain {id:?}")))
    }
}

impl AudioBackend for SoftwareBackend {
    type Oscillator = OscillatorId;
    type Gain = GainId;
    type Filter = FilterId;

    fn current_time(&self) -> f64 {
        self.frames as f64 / self.sample_rate
    }

    fn create_oscillator(&mut self, waveform: Waveform) -> Result<OscillatorId, InstrumentError> {
        let id = OscillatorId(self.next_id());
        self.oscillators.insert(
            id,
            OscillatorNode {
                oscillator: Oscillator::new(waveform, self.sample_rate),
                frequency: AudioParam::new(440.0),
                started: false,
                stop: None,
            },
        );
        Ok(id)
    }

    fn create_gain(&mut self) -> Result<GainId, InstrumentError> {
        let id = GainId(self.next_id());
        self.gains.insert(id, AudioParam::new(1.0));
        Ok(id)
    }

    fn create_lowpass(&mut self, cutoff: f64) -> Result<FilterId, InstrumentError> {
        let id = FilterId(self.next_id());
        self.filters.insert(id, LowpassFilter::new(cutoff, self.sample_rate));
        Ok(id)
    }

    fn connect_chain(
        &mut self,
        oscillator: &OscillatorId,
        gain: &GainId,
        filter: &FilterId,
    ) -> Result<(), InstrumentError> {
        if !self.oscillators.contains_key(oscillator)
            || !self.gains.contains_key(gain)
            || !self.filters.contains_key(filter)
        {
            return Err(InstrumentError::Audio(
                "cannot connect a chain with missing nodes".to_string(),
            ));
        }
        self.chains.push(Chain {
            oscillator: *oscillator,
            gain: *gain,
            filter: *filter,
        });
        Ok(())
    }

    fn set_frequency_at(
        &mut self,
        oscillator: &OscillatorId,
        frequency: f64,
        time: f64,
    ) -> Result<(), InstrumentError> {
        self.oscillator_mut(*oscillator)?
            .frequency
            .set_value_at_time(frequency, time);
        Ok(())
    }

    fn set_gain_at(&mut self, gain: &GainId, value: f64, time: f64) -> Result<(), InstrumentError> {
        self.gain_mut(*gain)?.set_value_at_time(value, time);
        Ok(())
    }

    fn ramp_gain_at(&mut self, gain: &GainId, value: f64, end: f64) -> Result<(), InstrumentError> {
        self.gain_mut(*gain)?.exponential_ramp_to_value_at_time(value, end);
        Ok(())
    }

    fn start(&mut self, oscillator: &OscillatorId) -> Result<(), InstrumentError> {
        self.oscillator_mut(*oscillator)?.started = true;
        Ok(())
    }

    fn stop_at(&mut self, oscillator: &OscillatorId, time: f64) -> Result<(), InstrumentError> {
        self.oscillator_mut(*oscillator)?.stop = Some(time);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_chain(backend: &mut SoftwareBackend) -> (OscillatorId, GainId) {
        let osc = backend.create_oscillator(Waveform::Sawtooth).unwrap();
        let gain = backend.create_gain().unwrap();
        let filter = backend.create_lowpass(1000.0).unwrap();
        backend.connect_chain(&osc, &gain, &filter).unwrap();
        backend.set_gain_at(&gain, 0.3, 0.0).unwrap();
        backend.set_frequency_at(&osc, 110.0, 0.0).unwrap();
        (osc, gain)
    }

    fn peak(out: &[f32]) -> f32 {
        out.iter().fold(0.0_f32, |m, s| m.max(s.abs()))
    }

    #[test]
    fn silent_without_chains() {
        let mut backend = SoftwareBackend::new(44100.0).unwrap();
        let mut out = [1.0_f32; 256];
        backend.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        assert!((backend.current_time() - 256.0 / 44100.0).abs() < 1e-12);
    }

    #[test]
    fn unstarted_oscillator_is_silent() {
        let mut backend = SoftwareBackend::new(44100.0).unwrap();
        build_chain(&mut backend);
        let mut out = [0.0_f32; 512];
        backend.render(&mut out);
        assert_eq!(peak(&out), 0.0);
    }

    #[test]
    fn started_chain_produces_bounded_sound() {
        let mut backend = SoftwareBackend::new(44100.0).unwrap();
        let (osc, _) = build_chain(&mut backend);
        backend.start(&osc).unwrap();

        let mut out = vec![0.0_f32; 4410];
        backend.render(&mut out);
        let p = peak(&out);
        assert!(p > 0.05, "Chain should be audible, peak {p}");
        assert!(p < 0.6, "Gain 0.3 should keep the peak low, got {p}");
    }

    #[test]
    fn stopped_chain_is_freed_after_stop_time() {
        let mut backend = SoftwareBackend::new(44100.0).unwrap();
        let (osc, gain) = build_chain(&mut backend);
        backend.start(&osc).unwrap();
        backend.advance(0.1);

        let now = backend.current_time();
        backend.set_gain_at(&gain, 0.3, now).unwrap();
        backend.ramp_gain_at(&gain, 0.001, now + 0.5).unwrap();
        backend.stop_at(&osc, now + 0.5).unwrap();

        backend.advance(0.25);
        assert_eq!(backend.chain_count(), 1, "Chain should still be fading");
        let g = backend.gain_at(gain, backend.current_time()).unwrap();
        assert!(g < 0.3 && g > 0.001, "Gain should be mid-ramp, got {g}");

        backend.advance(0.3);
        assert_eq!(backend.chain_count(), 0);
        assert_eq!(backend.gain_at(gain, 0.0), None);

        let mut out = [0.0_f32; 128];
        backend.render(&mut out);
        assert_eq!(peak(&out), 0.0);
    }

    #[test]
    fn rejects_unusable_sample_rates() {
        for rate in [0.0, -44100.0, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(SoftwareBackend::new(rate), Err(InstrumentError::Audio(_))),
                "sample rate {rate} should be rejected"
            );
        }
    }

    #[test]
    fn unknown_nodes_are_errors() {
        let mut backend = SoftwareBackend::new(44100.0).unwrap();
        let (osc, gain) = build_chain(&mut backend);
        backend.start(&osc).unwrap();
        backend.stop_at(&osc, 0.0).unwrap();
        backend.advance(0.01);

        assert!(matches!(
            backend.set_gain_at(&gain, 0.5, 0.0),
            Err(InstrumentError::Audio(_))
        ));
        assert!(matches!(backend.start(&osc), Err(InstrumentError::Audio(_))));
    }
}
