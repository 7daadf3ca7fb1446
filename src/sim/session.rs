/// Session: the run state machine around a `WorldState`.
///
///   Ready ──start / first move──▶ Running ──flag──▶ Won
///                                   │
///                                   └──last life lost──▶ Lost
///
/// Drives the scheduler, routes step events to the audio sink, defers
/// respawns, and publishes run-counter changes to the output sink. Each
/// changed value is pushed once per call, with its final value. The status
/// is pushed whenever an event or command set it, even to the same text.

use crate::config::GameConfig;
use crate::domain::entity::FrameInput;
use super::event::GameEvent;
use super::level::LevelState;
use super::scheduler::{ActionId, CancelToken, Deferred, Fired, Scheduler};
use super::sink::{AudioSink, OutputSink};
use super::step;
use super::world::{Phase, RunState, WorldState};

pub struct Session {
    world: WorldState,
    scheduler: Scheduler,
    muted: bool,
    respawn_delay_ms: u64,
    pending_respawn: Option<ActionId>,
    /// Values last pushed to the output sink. None before the first publish.
    published: Option<RunState>,
    /// Status was set by an event or command since the last publish.
    status_touched: bool,
    stopped: bool,
}

impl Session {
    pub fn new(level: LevelState, config: &GameConfig) -> Self {
        Session {
            world: WorldState::new(level, config),
            scheduler: Scheduler::new(config.physics.tick_rate_ms),
            muted: config.audio.start_muted,
            respawn_delay_ms: config.rules.respawn_delay_ms,
            pending_respawn: None,
            published: None,
            status_touched: false,
            stopped: false,
        }
    }

    pub fn world(&self) -> &WorldState { &self.world }

    pub fn phase(&self) -> Phase { self.world.phase }

    pub fn is_muted(&self) -> bool { self.muted }

    pub fn is_stopped(&self) -> bool { self.stopped || self.scheduler.is_stopped() }

    /// Token that halts the clock from outside (quit handlers).
    pub fn cancel_token(&self) -> CancelToken { self.scheduler.token() }

    // ══════════════════════════════════════════════════════════════
    // Lifecycle
    // ══════════════════════════════════════════════════════════════

    /// Ready → Running. Publishes the world label and every counter not
    /// yet published, then the status moves from "Ready" to "Go!".
    pub fn start(&mut self, out: &mut dyn OutputSink) {
        if self.is_stopped() || self.world.phase != Phase::Ready { return; }
        if self.published.is_none() {
            self.publish(out);
        }
        self.world.phase = Phase::Running;
        self.set_status("Go!");
        log::info!(
            "run started: world {} ({} lives, {} s)",
            self.world.run.world, self.world.run.lives, self.world.run.time_left
        );
        self.publish(out);
    }

    /// Let `elapsed_ms` of real time pass.
    pub fn advance(
        &mut self,
        elapsed_ms: u64,
        input: &FrameInput,
        out: &mut dyn OutputSink,
        audio: &mut dyn AudioSink,
    ) {
        if self.is_stopped() { return; }
        match self.world.phase {
            Phase::Ready => {
                if input.any_action() {
                    self.start(out);
                } else {
                    self.publish(out);
                }
                return;
            }
            Phase::Won | Phase::Lost => return,
            Phase::Running => {}
        }

        self.scheduler.begin_advance(elapsed_ms);
        while let Some(fired) = self.scheduler.poll() {
            let events = match fired {
                Fired::Tick => step::step(&mut self.world, input),
                Fired::Second => step::tick_clock(&mut self.world),
                Fired::Action(Deferred::Respawn { generation }) => self.deferred_respawn(generation),
            };
            self.dispatch(&events, audio);

            if self.world.phase != Phase::Running {
                self.scheduler.stop();
                break;
            }
        }

        self.publish(out);
    }

    /// Halt for good. Later advance / toggle calls do nothing.
    pub fn stop(&mut self) {
        if self.stopped { return; }
        self.stopped = true;
        self.pending_respawn = None;
        self.scheduler.stop();
        log::info!("session stopped at tick {}", self.world.tick);
    }

    // ══════════════════════════════════════════════════════════════
    // Player commands
    // ══════════════════════════════════════════════════════════════

    /// Works in every phase until `stop`.
    pub fn toggle_mute(&mut self, out: &mut dyn OutputSink) {
        if self.stopped { return; }
        self.muted = !self.muted;
        self.set_status(if self.muted { "Muted" } else { "Unmuted" });
        self.publish(out);
    }

    /// Respawn now. Supersedes any respawn already scheduled.
    pub fn manual_respawn(&mut self, out: &mut dyn OutputSink) {
        if self.is_stopped() || self.world.phase != Phase::Running { return; }
        if let Some(id) = self.pending_respawn.take() {
            self.scheduler.cancel(id);
        }
        self.world.death_generation = self.world.death_generation.wrapping_add(1);
        step::respawn(&mut self.world);
        self.status_touched = true;
        log::debug!("manual respawn (generation {})", self.world.death_generation);
        self.publish(out);
    }

    // ══════════════════════════════════════════════════════════════
    // Internals
    // ══════════════════════════════════════════════════════════════

    fn deferred_respawn(&mut self, generation: u32) -> Vec<GameEvent> {
        if generation != self.world.death_generation {
            log::debug!("stale respawn ignored (generation {generation})");
            return vec![];
        }
        self.pending_respawn = None;
        log::debug!("respawn (generation {generation})");
        step::respawn(&mut self.world)
    }

    fn set_status(&mut self, status: &str) {
        self.world.run.status = String::from(status);
        self.status_touched = true;
    }

    fn dispatch(&mut self, events: &[GameEvent], audio: &mut dyn AudioSink) {
        for event in events {
            if event.sets_status() {
                self.status_touched = true;
            }
            match event {
                GameEvent::PlayerHurt { cause } => {
                    log::debug!("player hurt ({cause:?}), {} lives left", self.world.run.lives);
                    if self.world.phase == Phase::Running {
                        let generation = self.world.death_generation;
                        self.pending_respawn = Some(self.scheduler.schedule(
                            self.respawn_delay_ms,
                            Deferred::Respawn { generation },
                        ));
                        log::debug!("respawn scheduled in {} ms", self.respawn_delay_ms);
                    } else {
                        log::info!("game over, final score {}", self.world.run.score);
                    }
                }
                GameEvent::CourseCleared { bonus } => {
                    log::info!("course clear: bonus {bonus}, score {}", self.world.run.score);
                }
                _ => log::trace!("{event:?}"),
            }

            if let Some(cue) = event.cue() {
                if !self.muted { audio.play(cue); }
            }
        }
    }

    /// Push every run value that differs from what the sink last saw.
    fn publish(&mut self, out: &mut dyn OutputSink) {
        let run = &self.world.run;
        let last = self.published.as_ref();

        if last.map_or(true, |l| l.world != run.world) { out.set_world(&run.world); }
        if last.map_or(true, |l| l.score != run.score) { out.set_score(run.score); }
        if last.map_or(true, |l| l.coins != run.coins) { out.set_coins(run.coins); }
        if last.map_or(true, |l| l.lives != run.lives) { out.set_lives(run.lives); }
        if last.map_or(true, |l| l.time_left != run.time_left) { out.set_time(run.time_left); }
        if self.status_touched || last.map_or(true, |l| l.status != run.status) {
            out.set_status(&run.status);
        }

        self.published = Some(run.clone());
        self.status_touched = false;
    }
}
