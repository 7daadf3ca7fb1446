/// HUD model: the terminal's copy of the published run values.
/// The session pushes into it; the renderer reads from it.

use crate::sim::sink::OutputSink;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Hud {
    pub score: u32,
    pub coins: u32,
    pub lives: u32,
    pub time: u32,
    pub world: String,
    pub status: String,
}

impl Hud {
    pub fn new() -> Self {
        Hud::default()
    }

    /// One-line summary for the top of the screen.
    pub fn line(&self) -> String {
        format!(
            " WORLD {:<5} SCORE {:06}  ◎×{:02}  ♥×{}  TIME {:03}  {} ",
            self.world, self.score, self.coins, self.lives, self.time, self.status,
        )
    }
}

impl OutputSink for Hud {
    fn set_score(&mut self, score: u32) { self.score = score; }
    fn set_coins(&mut self, coins: u32) { self.coins = coins; }
    fn set_lives(&mut self, lives: u32) { self.lives = lives; }
    fn set_time(&mut self, time: u32) { self.time = time; }
    fn set_world(&mut self, world: &str) { self.world = world.to_string(); }
    fn set_status(&mut self, status: &str) { self.status = status.to_string(); }
}
