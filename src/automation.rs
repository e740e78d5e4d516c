//! Audio-parameter automation on the audio clock.
//!
//! A timeline is a time-ordered list of events. A ramp event describes how
//! the value travels from the preceding event's (time, value) to its own;
//! after the last event the value holds.

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamEvent {
    /// Jump to `value` at `time`.
    Set { time: f64, value: f64 },
    /// Straight line from the previous event, arriving at `time`.
    LinearRamp { time: f64, value: f64 },
    /// Constant-ratio curve from the previous event, arriving at `time`.
    ExponentialRamp { time: f64, value: f64 },
}

impl ParamEvent {
    pub fn time(&self) -> f64 {
        match *self {
            ParamEvent::Set { time, .. }
            | ParamEvent::LinearRamp { time, .. }
            | ParamEvent::ExponentialRamp { time, .. } => time,
        }
    }

    pub fn value(&self) -> f64 {
        match *self {
            ParamEvent::Set { value, .. }
            | ParamEvent::LinearRamp { value, .. }
            | ParamEvent::ExponentialRamp { value, .. } => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamTimeline {
    default: f64,
    events: Vec<ParamEvent>,
}

impl ParamTimeline {
    pub fn new(default: f64) -> Self {
        Self {
            default,
            events: Vec::with_capacity(4),
        }
    }

    pub fn set_value_at_time(&mut self, value: f64, time: f64) -> &mut Self {
        self.insert(ParamEvent::Set { time, value })
    }

    pub fn linear_ramp_to_value_at_time(&mut self, value: f64, time: f64) -> &mut Self {
        self.insert(ParamEvent::LinearRamp { time, value })
    }

    pub fn exponential_ramp_to_value_at_time(&mut self, value: f64, time: f64) -> &mut Self {
        self.insert(ParamEvent::ExponentialRamp { time, value })
    }

    pub fn events(&self) -> &[ParamEvent] {
        &self.events
    }

    /// Events at the same time keep insertion order.
    fn insert(&mut self, event: ParamEvent) -> &mut Self {
        let t = event.time();
        let idx = self.events.partition_point(|e| e.time() <= t);
        self.events.insert(idx, event);
        self
    }

    /// Parameter value at audio-clock time `t`.
    pub fn value_at(&self, t: f64) -> f64 {
        let next_idx = self.events.partition_point(|e| e.time() <= t);

        let (t0, v0) = match next_idx.checked_sub(1) {
            Some(i) => (self.events[i].time(), self.events[i].value()),
            None => (0.0, self.default),
        };

        let Some(next) = self.events.get(next_idx) else {
            return v0;
        };

        match *next {
            ParamEvent::Set { .. } => v0,
            ParamEvent::LinearRamp { time: t1, value: v1 } => {
                if t1 <= t0 {
                    return v1;
                }
                let frac = ((t - t0) / (t1 - t0)).clamp(0.0, 1.0);
                v0 + (v1 - v0) * frac
            }
            ParamEvent::ExponentialRamp { time: t1, value: v1 } => {
                // An exponential path is undefined through zero or a sign change.
                if v0 == 0.0 || v0 * v1 < 0.0 {
                    return v0;
                }
                if t1 <= t0 {
                    return v1;
                }
                let frac = ((t - t0) / (t1 - t0)).clamp(0.0, 1.0);
                v0 * (v1 / v0).powf(frac)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_before_events() {
        let mut p = ParamTimeline::new(0.5);
        p.set_value_at_time(1.0, 2.0);
        assert_eq!(p.value_at(1.0), 0.5);
        assert_eq!(p.value_at(2.0), 1.0);
        assert_eq!(p.value_at(9.0), 1.0);
    }

    #[test]
    fn test_linear_ramp() {
        let mut p = ParamTimeline::new(0.0);
        p.set_value_at_time(0.0, 1.0).linear_ramp_to_value_at_time(0.8, 1.01);
        assert_eq!(p.value_at(1.0), 0.0);
        assert!((p.value_at(1.005) - 0.4).abs() < 1e-9);
        assert!((p.value_at(1.01) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_exponential_ramp_is_geometric() {
        let mut p = ParamTimeline::new(0.0);
        p.set_value_at_time(3000.0, 0.0)
            .exponential_ramp_to_value_at_time(30.0, 2.0);
        // Halfway in time = geometric mean of endpoints
        assert!((p.value_at(1.0) - 300.0).abs() < 1e-6);
        assert!((p.value_at(2.0) - 30.0).abs() < 1e-9);
        assert!((p.value_at(5.0) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_exponential_ramp_from_zero_holds() {
        let mut p = ParamTimeline::new(0.0);
        p.set_value_at_time(0.0, 0.0)
            .exponential_ramp_to_value_at_time(1.0, 1.0);
        assert_eq!(p.value_at(0.5), 0.0);
        assert_eq!(p.value_at(1.0), 1.0);
    }

    #[test]
    fn test_pluck_envelope_shape() {
        let mut g = ParamTimeline::new(1.0);
        g.set_value_at_time(0.0, 0.0)
            .linear_ramp_to_value_at_time(0.8, 0.015)
            .exponential_ramp_to_value_at_time(0.001, 2.0);
        assert_eq!(g.value_at(0.0), 0.0);
        assert!((g.value_at(0.015) - 0.8).abs() < 1e-12);
        let mut last = g.value_at(0.015);
        let mut t = 0.1;
        while t < 2.0 {
            let v = g.value_at(t);
            assert!(v < last && v > 0.0);
            last = v;
            t += 0.1;
        }
    }

    #[test]
    fn test_insert_keeps_time_order() {
        let mut p = ParamTimeline::new(0.0);
        p.linear_ramp_to_value_at_time(1.0, 2.0);
        p.set_value_at_time(0.0, 1.0);
        let times: Vec<f64> = p.events().iter().map(|e| e.time()).collect();
        assert_eq!(times, vec![1.0, 2.0]);
    }
}
