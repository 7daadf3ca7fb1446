/// Output seams between the core and the presentation layer.
///
/// The core computes every new value itself and hands the final value to
/// a plain setter; sinks never see deltas or updater closures.

use super::event::Cue;

/// Receives run-state changes (HUD values and status text).
pub trait OutputSink {
    fn set_score(&mut self, score: u32);
    fn set_coins(&mut self, coins: u32);
    fn set_lives(&mut self, lives: u32);
    fn set_time(&mut self, time: u32);
    fn set_world(&mut self, world: &str);
    fn set_status(&mut self, status: &str);
}

/// Plays named cues. Implementations swallow their own failures.
pub trait AudioSink {
    fn play(&mut self, cue: Cue);
}

/// Discards everything.
pub struct NullSink;

impl OutputSink for NullSink {
    fn set_score(&mut self, _score: u32) {}
    fn set_coins(&mut self, _coins: u32) {}
    fn set_lives(&mut self, _lives: u32) {}
    fn set_time(&mut self, _time: u32) {}
    fn set_world(&mut self, _world: &str) {}
    fn set_status(&mut self, _status: &str) {}
}

impl AudioSink for NullSink {
    fn play(&mut self, _cue: Cue) {}
}
