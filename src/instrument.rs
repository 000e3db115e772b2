//! Instrument — wires the touch resolver to the tone engine.
//!
//! Built once at startup and handed every touch event; there is no global
//! engine instance.

use crate::audio::AudioBackend;
use crate::config::InstrumentConfig;
use crate::error::InstrumentError;
use crate::resolver::{HitTest, TouchResolver};
use crate::tone::ToneEngine;
use crate::touch::{TouchEvent, TouchPhase, TouchPoint};

pub struct Instrument<B: AudioBackend, H: HitTest> {
    resolver: TouchResolver,
    engine: ToneEngine<B>,
    hit_test: H,
}

impl<B: AudioBackend, H: HitTest> Instrument<B, H> {
    /// Validate `config` and assemble the instrument.
    pub fn new(backend: B, hit_test: H, config: InstrumentConfig) -> Result<Self, InstrumentError> {
        config.validate()?;
        Ok(Instrument {
            resolver: TouchResolver::new(config.layout),
            engine: ToneEngine::new(backend, config.tone),
            hit_test,
        })
    }

    pub fn engine(&self) -> &ToneEngine<B> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut ToneEngine<B> {
        &mut self.engine
    }

    pub fn resolver(&self) -> &TouchResolver {
        &self.resolver
    }

    pub fn hit_test(&self) -> &H {
        &self.hit_test
    }

    pub fn set_hit_test(&mut self, hit_test: H) {
        self.hit_test = hit_test;
    }

    /// React to one touch event. Every phase carries the full snapshot of
    /// touches still down, so all phases are handled the same way.
    pub fn handle_touches(&mut self, phase: TouchPhase, touches: &[TouchPoint]) -> Option<f64> {
        let frequency = self.resolver.resolve_frequency(touches, &self.hit_test);
        log::trace!(
            "{phase:?}: {} touches -> {:?}",
            touches.len(),
            frequency
        );

        match frequency {
            Some(hz) => self.engine.play_tone(hz),
            None => self.engine.stop_tone(),
        }
        frequency
    }

    pub fn handle_event(&mut self, event: &TouchEvent) -> Option<f64> {
        self.handle_touches(event.phase, &event.touches)
    }
}
