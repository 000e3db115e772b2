//! Tone Engine — one monophonic voice: oscillator → gain → low-pass.
//!
//! The chain is built on the first `play_tone` after idle. Further
//! `play_tone` calls only move the pitch, so a held note glides instead of
//! re-attacking. `stop_tone` fades the voice out on the audio clock and
//! forgets it; the fading chain finishes on its own and the next
//! `play_tone` always builds a fresh one.

use crate::audio::AudioBackend;
use crate::config::ToneConfig;
use crate::error::InstrumentError;

/// Handles of a built chain.
pub struct Voice<B: AudioBackend> {
    pub oscillator: B::Oscillator,
    pub gain: B::Gain,
    pub filter: B::Filter,
    frequency: f64,
}

pub enum ToneState<B: AudioBackend> {
    Idle,
    Sounding(Voice<B>),
}

pub struct ToneEngine<B: AudioBackend> {
    backend: B,
    config: ToneConfig,
    state: ToneState<B>,
}

impl<B: AudioBackend> ToneEngine<B> {
    pub fn new(backend: B, config: ToneConfig) -> Self {
        ToneEngine {
            backend,
            config,
            state: ToneState::Idle,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn config(&self) -> &ToneConfig {
        &self.config
    }

    pub fn state(&self) -> &ToneState<B> {
        &self.state
    }

    pub fn is_sounding(&self) -> bool {
        matches!(self.state, ToneState::Sounding(_))
    }

    /// Frequency of the held voice, if any.
    pub fn frequency(&self) -> Option<f64> {
        match &self.state {
            ToneState::Sounding(voice) => Some(voice.frequency),
            ToneState::Idle => None,
        }
    }

    /// Sound `frequency`, building the chain if idle.
    ///
    /// Backend failures are logged and leave the engine idle. A frequency
    /// that is not finite and positive silences the engine.
    pub fn play_tone(&mut self, frequency: f64) {
        if !frequency.is_finite() || frequency <= 0.0 {
            log::warn!("ignoring unplayable frequency {frequency}");
            self.stop_tone();
            return;
        }
        let now = self.backend.current_time();

        if let ToneState::Sounding(voice) = &mut self.state {
            match self
                .backend
                .set_frequency_at(&voice.oscillator, frequency, now)
            {
                Ok(()) => voice.frequency = frequency,
                Err(e) => {
                    log::warn!("failed to retune tone: {e}");
                    self.stop_tone();
                }
            }
            return;
        }

        match self.build_voice(frequency, now) {
            Ok(voice) => {
                log::debug!("tone on at {frequency:.2} Hz");
                self.state = ToneState::Sounding(voice);
            }
            Err(e) => log::warn!("failed to start tone: {e}"),
        }
    }

    /// Fade out and forget the held voice. No-op while idle.
    pub fn stop_tone(&mut self) {
        let ToneState::Sounding(voice) = std::mem::replace(&mut self.state, ToneState::Idle) else {
            return;
        };

        let now = self.backend.current_time();
        let end = now + self.config.release;
        if let Err(e) = self.release_voice(&voice, now, end) {
            log::warn!("failed to release tone: {e}");
        }
        log::debug!("tone off, fading until {end:.3}");
    }

    /// Everything that can fail happens before the chain is connected. Once
    /// connected, a failed start still schedules a stop so the backend can
    /// tear the chain down.
    fn build_voice(&mut self, frequency: f64, now: f64) -> Result<Voice<B>, InstrumentError> {
        let oscillator = self.backend.create_oscillator(self.config.waveform)?;
        self.backend.set_frequency_at(&oscillator, frequency, now)?;
        let gain = self.backend.create_gain()?;
        self.backend.set_gain_at(&gain, self.config.gain, now)?;
        let filter = self.backend.create_lowpass(self.config.cutoff)?;
        self.backend.connect_chain(&oscillator, &gain, &filter)?;
        if let Err(e) = self.backend.start(&oscillator) {
            if let Err(stop_err) = self.backend.stop_at(&oscillator, now) {
                log::warn!("failed to stop abandoned chain: {stop_err}");
            }
            return Err(e);
        }

        Ok(Voice {
            oscillator,
            gain,
            filter,
            frequency,
        })
    }

    /// The gain is pinned at its held level first so the ramp starts from
    /// there and not from whenever the last automation event happened.
    fn release_voice(&mut self, voice: &Voice<B>, now: f64, end: f64) -> Result<(), InstrumentError> {
        self.backend.set_gain_at(&voice.gain, self.config.gain, now)?;
        self.backend
            .ramp_gain_at(&voice.gain, self.config.release_floor, end)?;
        self.backend.stop_at(&voice.oscillator, end)
    }
}
