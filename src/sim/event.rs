/// Events emitted during a frame.
/// The main loop turns these into log lines and HUD messages.

#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    CoinCollected { score: u32 },
    KeyCollected,
    LiftEngaged,
    LevelComplete { level: u32 },
    HealthLost { health: i32 },
    LifeLost { lives: u32 },
    FellIntoPit,
    /// Lives ran out; the next frame starts over from the first level.
    GameOver { score: u32 },
}
