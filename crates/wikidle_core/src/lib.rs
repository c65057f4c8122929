pub mod builder;
pub mod domain;
pub mod evaluator;
pub mod markup;
pub mod normalize;
pub mod obscure;
pub mod pipeline;
pub mod ports;
pub mod session;

pub use builder::{ArticleBuilder, BuildError};
pub use domain::{Article, DayKey, GameSession, QueuedTitle};
pub use evaluator::{ClueStatus, GuessOutcome, Rejection, Replay, ScoredGuess};
pub use normalize::{is_excluded, normalize};
pub use pipeline::ArticlePipeline;
pub use ports::{ArticleSource, GameStore, PortError, PortResult};
pub use session::{GameRecord, PlayerData};
