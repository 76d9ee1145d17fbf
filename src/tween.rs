//! Easing curves and keyframe tracks.
//!
//! The demos animate fuzzy meshes by sampling [`Track`]s every tick and
//! feeding the values to the position and angle setters, so the hair reacts to
//! eased motion.
//!
//! ```
//! use fuzzy_mesh::tween::{Easing, Track};
//!
//! let hop = Track::new(0.0)
//!     .to(0.5, 8.0, Easing::CubicOut)
//!     .to(0.5, 0.0, Easing::CubicIn);
//!
//! assert_eq!(hop.duration(), 1.0);
//! assert_eq!(hop.sample(0.5), 8.0);
//! assert_eq!(hop.sample(2.0), 0.0);
//! ```

/// Acceleration curve of a tween.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    /// Constant speed throughout.
    #[default]
    Linear,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
}

impl Easing {
    /// Maps linear progress in `[0, 1]` to eased progress. Input is clamped.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadIn => t * t,
            Easing::QuadOut => 1.0 - (1.0 - t).powi(2),
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Segment {
    start: f32,
    duration: f32,
    from: f32,
    to: f32,
    easing: Easing,
}

/// A scalar animated through a sequence of eased segments.
///
/// Before the first segment the track holds its initial value; after the last
/// it holds the final target.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    initial: f32,
    segments: Vec<Segment>,
}

impl Track {
    pub fn new(initial: f32) -> Self {
        Self {
            initial,
            segments: Vec::new(),
        }
    }

    /// Value the track ends on.
    pub fn end_value(&self) -> f32 {
        self.segments.last().map_or(self.initial, |s| s.to)
    }

    /// Time at which the last segment finishes.
    pub fn duration(&self) -> f32 {
        self.segments.last().map_or(0.0, |s| s.start + s.duration)
    }

    /// Appends a tween from the current end value to `target`.
    pub fn to(mut self, duration: f32, target: f32, easing: Easing) -> Self {
        let segment = Segment {
            start: self.duration(),
            duration: duration.max(0.0),
            from: self.end_value(),
            to: target,
            easing,
        };
        self.segments.push(segment);
        self
    }

    /// Appends a pause holding the current end value.
    pub fn hold(self, duration: f32) -> Self {
        let value = self.end_value();
        self.to(duration, value, Easing::Linear)
    }

    /// Value at time `t` seconds.
    pub fn sample(&self, t: f32) -> f32 {
        let Some(segment) = self.segments.iter().rev().find(|s| s.start <= t) else {
            return self.initial;
        };

        if segment.duration <= 0.0 || t >= segment.start + segment.duration {
            return segment.to;
        }

        let progress = segment.easing.apply((t - segment.start) / segment.duration);
        segment.from + (segment.to - segment.from) * progress
    }
}

/// Repeating playback of a fixed-length animation.
///
/// Waits `delay` seconds, plays for `duration`, holds the final frame for
/// `repeat_delay`, and starts over.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Repeat {
    pub delay: f32,
    pub duration: f32,
    pub repeat_delay: f32,
}

impl Repeat {
    /// Iteration index and local time within that iteration at `elapsed`.
    pub fn cycle(&self, elapsed: f32) -> (u32, f32) {
        if elapsed < self.delay {
            return (0, 0.0);
        }

        let period = self.duration + self.repeat_delay;
        if period <= 0.0 {
            return (0, self.duration);
        }

        let since = elapsed - self.delay;
        let iteration = (since / period).floor();
        let local = (since - iteration * period).min(self.duration);
        (iteration as u32, local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 7] = [
        Easing::Linear,
        Easing::QuadIn,
        Easing::QuadOut,
        Easing::QuadInOut,
        Easing::CubicIn,
        Easing::CubicOut,
        Easing::CubicInOut,
    ];

    #[test]
    fn easings_hit_endpoints() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 1e-6, "{easing:?}");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{easing:?}");
            assert_eq!(easing.apply(-3.0), easing.apply(0.0));
        }
    }

    #[test]
    fn easings_are_monotonic() {
        for easing in ALL {
            let mut last = 0.0;
            for i in 1..=100 {
                let v = easing.apply(i as f32 / 100.0);
                assert!(v >= last - 1e-6, "{easing:?} at {i}");
                last = v;
            }
        }
    }

    #[test]
    fn in_out_curves_are_symmetric() {
        for easing in [Easing::QuadInOut, Easing::CubicInOut] {
            assert!((easing.apply(0.5) - 0.5).abs() < 1e-6);
            let a = easing.apply(0.2);
            let b = easing.apply(0.8);
            assert!((a + b - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn track_chains_segments() {
        let track = Track::new(0.0)
            .to(0.5, 8.0, Easing::CubicOut)
            .to(0.5, 0.0, Easing::CubicIn)
            .to(0.1, -2.0, Easing::CubicOut)
            .to(0.5, 0.0, Easing::CubicOut);

        assert!((track.duration() - 1.6).abs() < 1e-6);
        assert_eq!(track.sample(-1.0), 0.0);
        assert_eq!(track.sample(0.5), 8.0);
        assert!(track.sample(0.25) > 4.0);
        assert!((track.sample(1.1) + 2.0).abs() < 1e-5);
        assert_eq!(track.sample(10.0), 0.0);
    }

    #[test]
    fn hold_keeps_value() {
        let track = Track::new(1.0).to(1.0, 3.0, Easing::Linear).hold(2.0);
        assert_eq!(track.sample(2.0), 3.0);
        assert_eq!(track.duration(), 3.0);
    }

    #[test]
    fn repeat_cycles_with_delays() {
        let repeat = Repeat {
            delay: 1.0,
            duration: 1.6,
            repeat_delay: 1.0,
        };
        assert_eq!(repeat.cycle(0.5), (0, 0.0));
        let (i, t) = repeat.cycle(2.0);
        assert_eq!(i, 0);
        assert!((t - 1.0).abs() < 1e-6);
        // holding the last frame during the repeat delay
        let (i, t) = repeat.cycle(3.0);
        assert_eq!((i, t), (0, 1.6));
        let (i, t) = repeat.cycle(3.8);
        assert_eq!(i, 1);
        assert!((t - 0.2).abs() < 1e-5);
    }
}
