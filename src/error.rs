/// Error taxonomy.
///
/// `Terminal` and `LogFile` stop the game (exit code 1). `LevelRead` is
/// reported and the level loads empty.

use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),

    #[error("cannot open log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read level file {}: {source}", path.display())]
    LevelRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl GameError {
    /// Does this error end the session?
    pub fn is_fatal(&self) -> bool {
        !matches!(self, GameError::LevelRead { .. })
    }
}

pub type Result<T> = std::result::Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_read_is_recoverable() {
        let err = GameError::LevelRead {
            path: PathBuf::from("levels/9.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("levels/9.txt"));
    }

    #[test]
    fn io_errors_are_terminal_and_fatal() {
        let err: GameError = io::Error::new(io::ErrorKind::Other, "tty").into();
        assert!(matches!(err, GameError::Terminal(_)));
        assert!(err.is_fatal());
    }
}
