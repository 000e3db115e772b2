//! Automated parameter — the subset of WebAudio `AudioParam` scheduling the
//! tone chain uses: `setValueAtTime` and `exponentialRampToValueAtTime`.

/// A scheduled change.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Automation {
    /// Jump to `value` at `time`.
    Set { value: f64, time: f64 },
    /// Ramp exponentially from the previous event to `value`, arriving at `end`.
    ExponentialRamp { value: f64, end: f64 },
}

impl Automation {
    fn time(&self) -> f64 {
        match *self {
            Automation::Set { time, .. } => time,
            Automation::ExponentialRamp { end, .. } => end,
        }
    }
}

/// A parameter whose value is a function of the audio clock.
#[derive(Debug, Clone)]
pub struct AudioParam {
    default: f64,
    events: Vec<Automation>,
}

impl AudioParam {
    pub fn new(default: f64) -> Self {
        AudioParam {
            default,
            events: Vec::new(),
        }
    }

    pub fn set_value_at_time(&mut self, value: f64, time: f64) {
        self.insert(Automation::Set { value, time });
    }

    pub fn exponential_ramp_to_value_at_time(&mut self, value: f64, end: f64) {
        self.insert(Automation::ExponentialRamp { value, end });
    }

    /// Keep events ordered by time; equal times keep insertion order.
    fn insert(&mut self, event: Automation) {
        let at = self
            .events
            .iter()
            .position(|e| e.time() > event.time())
            .unwrap_or(self.events.len());
        self.events.insert(at, event);
    }

    /// Value at audio time `t` (seconds).
    ///
    /// A ramp starts from the value and time of the event before it. Like
    /// WebAudio, a ramp between values of different sign (or touching zero)
    /// holds the previous value until the ramp's end.
    pub fn value_at(&self, t: f64) -> f64 {
        let mut value = self.default;
        let mut anchor = 0.0;

        for event in &self.events {
            match *event {
                Automation::Set { value: v, time } => {
                    if time > t {
                        break;
                    }
                    value = v;
                    anchor = time;
                }
                Automation::ExponentialRamp { value: v, end } => {
                    if end <= t {
                        value = v;
                        anchor = end;
                        continue;
                    }
                    if t <= anchor || value * v <= 0.0 {
                        return value;
                    }
                    let progress = (t - anchor) / (end - anchor);
                    return value * (v / value).powf(progress);
                }
            }
        }

        value
    }

    /// Drop events that ended before `t`, folding them into the default so
    /// `value_at` is unchanged for times at or after `t`.
    pub fn prune_before(&mut self, t: f64) {
        let settled = self
            .events
            .iter()
            .take_while(|e| e.time() <= t)
            .count();
        if settled == 0 {
            return;
        }
        // A ramp in progress needs its anchor event to stay.
        let keep_from = if settled < self.events.len() { settled - 1 } else { settled };
        if keep_from == 0 {
            return;
        }
        self.default = self.value_at(self.events[keep_from - 1].time());
        self.events.drain(..keep_from);
    }

    #[cfg(test)]
    fn event_count(&self) -> usize {
        self.events.len()
    }
}
