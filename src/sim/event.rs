/// Events emitted during a simulation step.
/// The session turns these into status text and audio cues.

use crate::domain::physics::Cell;

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    Jumped,
    CoinCollected { cell: Cell },
    BlockRewarded { cell: Cell },
    BlockBumped { cell: Cell },
    EnemyStomped { id: usize },
    PlayerHurt { cause: HurtCause },
    CourseCleared { bonus: u32 },
    Respawned,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HurtCause {
    Enemy,
    Fall,
    TimeUp,
}

/// Named audio cues dispatched to the external player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cue {
    Coin,
    Bump,
    Stomp,
    Flag,
    Die,
    Jump,
}

impl GameEvent {
    /// The cue this event sounds, if any.
    pub fn cue(&self) -> Option<Cue> {
        match self {
            GameEvent::Jumped => Some(Cue::Jump),
            GameEvent::CoinCollected { .. } | GameEvent::BlockRewarded { .. } => Some(Cue::Coin),
            GameEvent::BlockBumped { .. } => Some(Cue::Bump),
            GameEvent::EnemyStomped { .. } => Some(Cue::Stomp),
            GameEvent::PlayerHurt { .. } => Some(Cue::Die),
            GameEvent::CourseCleared { .. } => Some(Cue::Flag),
            GameEvent::Respawned => None,
        }
    }

    /// Events that write the status label.
    pub fn sets_status(&self) -> bool {
        matches!(
            self,
            GameEvent::PlayerHurt { .. } | GameEvent::CourseCleared { .. } | GameEvent::Respawned
        )
    }
}
