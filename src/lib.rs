// Library interface for wordle-client
// This allows integration tests to drive sessions against a fake server

pub mod cli;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod session;
pub mod solver;
pub mod transport;
pub mod wordbank;

// Re-export commonly used items for easier testing
pub use cli::{ClientConfig, TlsVerification};
pub use error::{ErrorContext, Outcome, SessionError, SessionState};
pub use protocol::{ClientMessage, GuessRecord, ServerMessage};
pub use session::{Session, SessionReport, run};
pub use solver::{Constraints, Feedback, INITIAL_GUESS, Mark, filter_candidates, find_next_guess};
pub use wordbank::{load_wordbank_from_file, load_wordbank_from_str};
