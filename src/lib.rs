pub mod audio;
pub mod config;
pub mod controls;
pub mod dsp;
pub mod error;
pub mod instrument;
pub mod resolver;
pub mod tone;
pub mod touch;

use std::str::FromStr;

use wasm_bindgen::prelude::*;

use crate::audio::{SoftwareBackend, WebAudioBackend};
use crate::config::InstrumentConfig;
use crate::instrument::Instrument;
use crate::resolver::{HitTest, RegionMap};
use crate::touch::{TouchPhase, TouchPoint};

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the touchstrings-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: route `log` records to the browser console and panics to
/// `console.error`. `level` is a log level name ("info", "debug", ...);
/// defaults to "info". Calling it more than once is harmless.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(level: Option<String>) {
    console_error_panic_hook::set_once();
    let level = level
        .as_deref()
        .and_then(|l| log::Level::from_str(l).ok())
        .unwrap_or(log::Level::Info);
    if console_log::init_with_level(level).is_err() {
        log::debug!("logger already initialized");
    }
}

fn to_js<E: std::fmt::Display>(e: E) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

/// `undefined`/`null` means the default configuration.
fn config_from_js(config: JsValue) -> Result<InstrumentConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(InstrumentConfig::default());
    }
    let config: InstrumentConfig = serde_wasm_bindgen::from_value(config).map_err(to_js)?;
    config.validate().map_err(to_js)?;
    Ok(config)
}

/// Touches arrive as plain objects `{identifier, clientX, clientY, target}`
/// where `target` is the id of the element the touch started on.
fn touches_from_js(touches: JsValue) -> Result<Vec<TouchPoint>, JsValue> {
    serde_wasm_bindgen::from_value(touches).map_err(to_js)
}

/// Hit test backed by a JS callback `(x, y) => id | null`, usually
/// `document.elementFromPoint(x, y)?.id`.
pub struct JsHitTest {
    callback: js_sys::Function,
}

impl HitTest for JsHitTest {
    fn locate(&self, x: f64, y: f64) -> Option<String> {
        match self
            .callback
            .call2(&JsValue::NULL, &JsValue::from_f64(x), &JsValue::from_f64(y))
        {
            Ok(id) => id.as_string(),
            Err(e) => {
                log::warn!("hit test callback threw: {e:?}");
                None
            }
        }
    }
}

/// WASM-exposed instrument playing through a Web Audio node graph.
#[wasm_bindgen]
pub struct WebInstrument {
    inner: Instrument<WebAudioBackend, JsHitTest>,
}

#[wasm_bindgen]
impl WebInstrument {
    /// `ctx` must already be resumed by a user gesture.
    #[wasm_bindgen(constructor)]
    pub fn new(
        ctx: web_sys::AudioContext,
        hit_test: js_sys::Function,
        config: JsValue,
    ) -> Result<WebInstrument, JsValue> {
        let config = config_from_js(config)?;
        let inner = Instrument::new(
            WebAudioBackend::new(ctx),
            JsHitTest { callback: hit_test },
            config,
        )
        .map_err(to_js)?;
        Ok(WebInstrument { inner })
    }

    /// Feed a touch event (`"touchstart"`, `"touchmove"`, ...) with the full
    /// list of active touches. Returns the frequency now sounding, if any.
    #[wasm_bindgen(js_name = handleTouches)]
    pub fn handle_touches(&mut self, phase: &str, touches: JsValue) -> Result<Option<f64>, JsValue> {
        let phase = TouchPhase::from_str(phase).map_err(to_js)?;
        let touches = touches_from_js(touches)?;
        Ok(self.inner.handle_touches(phase, &touches))
    }

    #[wasm_bindgen(js_name = playTone)]
    pub fn play_tone(&mut self, frequency: f64) {
        self.inner.engine_mut().play_tone(frequency);
    }

    #[wasm_bindgen(js_name = stopTone)]
    pub fn stop_tone(&mut self) {
        self.inner.engine_mut().stop_tone();
    }

    #[wasm_bindgen(js_name = isSounding)]
    pub fn is_sounding(&self) -> bool {
        self.inner.engine().is_sounding()
    }

    #[wasm_bindgen(js_name = currentFrequency)]
    pub fn current_frequency(&self) -> Option<f64> {
        self.inner.engine().frequency()
    }
}

/// WASM-exposed instrument rendering samples itself, for use inside an
/// AudioWorklet. Controls are located with rectangles posted from the page.
#[wasm_bindgen]
pub struct WorkletInstrument {
    inner: Instrument<SoftwareBackend, RegionMap>,
}

#[wasm_bindgen]
impl WorkletInstrument {
    /// `regions` is an array of `{id, left, top, width, height}`.
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f32, regions: JsValue, config: JsValue) -> Result<WorkletInstrument, JsValue> {
        let config = config_from_js(config)?;
        let regions: RegionMap = serde_wasm_bindgen::from_value(regions).map_err(to_js)?;
        let backend = SoftwareBackend::new(sample_rate as f64).map_err(to_js)?;
        let inner = Instrument::new(backend, regions, config).map_err(to_js)?;
        Ok(WorkletInstrument { inner })
    }

    /// Replace the control rectangles, e.g. after a layout change.
    #[wasm_bindgen(js_name = setRegions)]
    pub fn set_regions(&mut self, regions: JsValue) -> Result<(), JsValue> {
        let regions: RegionMap = serde_wasm_bindgen::from_value(regions).map_err(to_js)?;
        self.inner.set_hit_test(regions);
        Ok(())
    }

    #[wasm_bindgen(js_name = handleTouches)]
    pub fn handle_touches(&mut self, phase: &str, touches: JsValue) -> Result<Option<f64>, JsValue> {
        let phase = TouchPhase::from_str(phase).map_err(to_js)?;
        let touches = touches_from_js(touches)?;
        Ok(self.inner.handle_touches(phase, &touches))
    }

    /// Render the next block of mono samples into `out`.
    pub fn process(&mut self, out: &mut [f32]) {
        self.inner.engine_mut().backend_mut().render(out);
    }

    #[wasm_bindgen(js_name = isSounding)]
    pub fn is_sounding(&self) -> bool {
        self.inner.engine().is_sounding()
    }
}
