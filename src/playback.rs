/// The video player as seen by the review core: a clock to read and a
/// transport to drive. Video content is never inspected.
pub trait PlaybackSource {
    /// Current position in seconds.
    fn current_time(&self) -> f64;
    /// Total length in seconds.
    fn duration(&self) -> f64;
    fn is_playing(&self) -> bool;
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, t: f64);
    fn is_muted(&self) -> bool;
    fn set_muted(&mut self, muted: bool);
}

/// Player stand-in whose clock only moves when told to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ManualClock {
    time: f64,
    duration: f64,
    playing: bool,
    muted: bool,
}

impl ManualClock {
    pub fn new(duration: f64) -> Self {
        Self {
            duration: duration.max(0.0),
            ..Self::default()
        }
    }

    /// Advance the clock while playing, stopping at the end.
    pub fn advance(&mut self, dt: f64) {
        if self.playing {
            self.time = (self.time + dt).clamp(0.0, self.duration);
            if self.time >= self.duration {
                self.playing = false;
            }
        }
    }
}

impl PlaybackSource for ManualClock {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek(&mut self, t: f64) {
        if t.is_finite() {
            self.time = t.clamp(0.0, self.duration);
        }
    }

    fn is_muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_only_advances_while_playing() {
        let mut clock = ManualClock::new(10.0);
        clock.advance(1.0);
        assert_eq!(clock.current_time(), 0.0);
        clock.play();
        clock.advance(2.5);
        assert_eq!(clock.current_time(), 2.5);
    }

    #[test]
    fn clock_stops_at_end() {
        let mut clock = ManualClock::new(3.0);
        clock.play();
        clock.advance(5.0);
        assert_eq!(clock.current_time(), 3.0);
        assert!(!clock.is_playing());
    }

    #[test]
    fn seek_is_clamped() {
        let mut clock = ManualClock::new(3.0);
        clock.seek(-1.0);
        assert_eq!(clock.current_time(), 0.0);
        clock.seek(9.0);
        assert_eq!(clock.current_time(), 3.0);
    }
}
