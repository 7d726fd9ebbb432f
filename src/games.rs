use std::fmt;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

/// The fixed set of games the portal ships with. Score events and high
/// scores only ever reference one of these ids.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
pub enum GameId {
    #[serde(rename = "tictactoe")]
    TicTacToe,
    PatternMemory,
    QuickMath,
    WordScramble,
    ReactionTime,
    NumberGuessing,
    ColorMatch,
    SimonSays,
    TypingSpeed,
    RockPaperScissors,
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                GameId::TicTacToe => "tictactoe",
                GameId::PatternMemory => "pattern-memory",
                GameId::QuickMath => "quick-math",
                GameId::WordScramble => "word-scramble",
                GameId::ReactionTime => "reaction-time",
                GameId::NumberGuessing => "number-guessing",
                GameId::ColorMatch => "color-match",
                GameId::SimonSays => "simon-says",
                GameId::TypingSpeed => "typing-speed",
                GameId::RockPaperScissors => "rock-paper-scissors",
            }
        )
    }
}

impl TryFrom<&str> for GameId {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "tictactoe" => Ok(GameId::TicTacToe),
            "pattern-memory" => Ok(GameId::PatternMemory),
            "quick-math" => Ok(GameId::QuickMath),
            "word-scramble" => Ok(GameId::WordScramble),
            "reaction-time" => Ok(GameId::ReactionTime),
            "number-guessing" => Ok(GameId::NumberGuessing),
            "color-match" => Ok(GameId::ColorMatch),
            "simon-says" => Ok(GameId::SimonSays),
            "typing-speed" => Ok(GameId::TypingSpeed),
            "rock-paper-scissors" => Ok(GameId::RockPaperScissors),
            _ => Err(s.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Display metadata for the game picker.
#[derive(Debug, Clone, serde::Serialize)]
pub struct GameInfo {
    pub id: GameId,
    pub name: &'static str,
    pub description: &'static str,
    pub difficulty: Difficulty,
}

impl GameId {
    pub fn info(&self) -> GameInfo {
        let (name, description, difficulty) = match self {
            GameId::TicTacToe => (
                "Tic Tac Toe",
                "Classic strategy game vs AI",
                Difficulty::Easy,
            ),
            GameId::PatternMemory => {
                ("Pattern Memory", "Test your memory skills", Difficulty::Medium)
            }
            GameId::QuickMath => ("Quick Math", "Solve math problems fast", Difficulty::Medium),
            GameId::WordScramble => {
                ("Word Scramble", "Unscramble words quickly", Difficulty::Easy)
            }
            GameId::ReactionTime => ("Reaction Time", "Test your reflexes", Difficulty::Easy),
            GameId::NumberGuessing => {
                ("Number Guessing", "Guess the mystery number", Difficulty::Easy)
            }
            GameId::ColorMatch => ("Color Match", "Match colors to names", Difficulty::Medium),
            GameId::SimonSays => ("Simon Says", "Memory pattern game", Difficulty::Hard),
            GameId::TypingSpeed => ("Typing Speed", "Test your typing skills", Difficulty::Medium),
            GameId::RockPaperScissors => (
                "Rock Paper Scissors",
                "Classic hand game vs AI",
                Difficulty::Easy,
            ),
        };

        GameInfo {
            id: *self,
            name,
            description,
            difficulty,
        }
    }

    /// All games in picker order.
    pub fn catalog() -> Vec<GameInfo> {
        GameId::iter().map(|id| id.info()).collect()
    }
}
