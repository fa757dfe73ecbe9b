//! tutorquest-core: adaptive tutoring engine.
//!
//! Tracks curriculum progress, classifies learner answers, and tunes hint
//! generosity, question depth, and quiz difficulty with an epsilon-greedy
//! policy. Text generation and persistence are injected collaborators.

pub mod bandit;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod events;
pub mod markers;
pub mod orchestrator;
pub mod progress;
pub mod progression;
pub mod prompts;
pub mod providers;
pub mod reward;
pub mod session;
pub mod store;

// Re-export commonly used items at crate root.
pub use bandit::{BanditController, HintPolicy, QuestionDepth, QuizDifficulty, Selections};
pub use catalog::Catalog;
pub use classifier::{check_answer_quality, QuestionKind, TeachingStyle, Verdict};
pub use config::{GeneratorConfig, TutorConfig};
pub use events::Notification;
pub use orchestrator::{ActionOutcome, Tutor, TutorError, TurnOutcome, TutorStats};
pub use progress::{PointStatus, ProgressTracker, SubtopicStatus};
pub use progression::{Badge, DailyAction};
pub use providers::{ChatMessage, ChatOptions, ChatResponse, Provider, ProviderError, ReliableProvider};
pub use reward::Thumb;
pub use session::SessionState;
pub use store::{InMemoryStore, StateStore, StoreError};
