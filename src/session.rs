//! Drives one game against the server.
//!
//! # State Machine
//! `Connecting` → `AwaitingStart` → `Guessing` → `Terminated(Success | Exhausted | Error)`
//!
//! The session owns its transport and shuts it down on every exit path, both at
//! the end of [`Session::play`] and again on drop if play was never reached.

use crate::cli::ClientConfig;
use crate::error::{ErrorContext, Outcome, SessionError, SessionState};
use crate::protocol::{self, ClientMessage, DecodeError, GuessRecord, ServerMessage};
use crate::solver::{INITIAL_GUESS, Mark, WORD_LENGTH, find_next_guess, format_marks};
use crate::transport::{self, Connection, FrameReader, Transport};
use crate::{debug_log, info_log};
use std::io;

/// What a won game leaves behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub id: String,
    pub flag: String,
    /// Every guess in order, the winning one last with all marks `Correct`.
    pub history: Vec<GuessRecord>,
}

pub struct Session<T: Transport> {
    frames: FrameReader<T>,
    closed: bool,
    state: SessionState,
    id: Option<String>,
    guess: String,
    candidates: Vec<String>,
    history: Vec<GuessRecord>,
    last_kind: Option<String>,
}

impl<T: Transport> Session<T> {
    /// Wraps an established transport. The dictionary is copied once and only narrowed from then on.
    pub fn new(transport: T, dictionary: &[String]) -> Self {
        Self {
            frames: FrameReader::new(transport),
            closed: false,
            state: SessionState::Connecting,
            id: None,
            guess: INITIAL_GUESS.to_string(),
            candidates: dictionary.to_vec(),
            history: Vec::new(),
            last_kind: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn history(&self) -> &[GuessRecord] {
        &self.history
    }

    pub fn transport(&self) -> &T {
        self.frames.get_ref()
    }

    /// Plays until the server says `bye` or something goes wrong, then closes the transport.
    pub fn play(&mut self, username: &str) -> Result<SessionReport, SessionError> {
        let result = self.drive(username);
        self.state = SessionState::Terminated(match &result {
            Ok(_) => Outcome::Success,
            Err(e) => e.outcome(),
        });
        info_log!("session {}", self.state);
        self.shutdown();
        result
    }

    fn drive(&mut self, username: &str) -> Result<SessionReport, SessionError> {
        self.send(&ClientMessage::Hello {
            northeastern_username: username.to_string(),
        })?;
        self.state = SessionState::AwaitingStart;

        let id = match self.receive()? {
            Some(ServerMessage::Start { id }) => id,
            Some(other) => {
                return Err(SessionError::HandshakeRejected {
                    detail: format!("expected 'start', got '{}'", other.kind()),
                    context: self.context(),
                });
            }
            None => {
                return Err(SessionError::HandshakeRejected {
                    detail: "connection closed before 'start'".to_string(),
                    context: self.context(),
                });
            }
        };
        info_log!("game started with id {id}");
        self.id = Some(id.clone());
        self.state = SessionState::Guessing;

        loop {
            self.send(&ClientMessage::Guess {
                id: id.clone(),
                word: self.guess.clone(),
            })?;
            match self.receive()? {
                Some(ServerMessage::Retry { guesses }) => self.apply_retry(guesses)?,
                Some(ServerMessage::Bye { flag }) => {
                    self.history.push(GuessRecord {
                        word: self.guess.clone(),
                        marks: [Mark::Correct; WORD_LENGTH],
                    });
                    info_log!("solved with '{}' after {} guesses", self.guess, self.history.len());
                    return Ok(SessionReport {
                        id,
                        flag,
                        history: self.history.clone(),
                    });
                }
                Some(other) => {
                    return Err(SessionError::ProtocolViolation {
                        detail: format!("unexpected '{}' during play", other.kind()),
                        context: self.context(),
                    });
                }
                None => {
                    return Err(SessionError::TransportFailure {
                        source: io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            "server closed the connection mid-game",
                        ),
                        context: self.context(),
                    });
                }
            }
        }
    }

    fn apply_retry(&mut self, guesses: Vec<GuessRecord>) -> Result<(), SessionError> {
        let Some(last) = guesses.last() else {
            return Err(SessionError::ProtocolViolation {
                detail: "'retry' carried no guesses".to_string(),
                context: self.context(),
            });
        };
        if last.word != self.guess {
            log::warn!(
                "server scored '{}' but we guessed '{}'; applying its marks to our guess",
                last.word,
                self.guess
            );
        }
        let marks = last.marks;
        info_log!("'{}' scored {}", self.guess, format_marks(&marks));

        let (next, remaining) = find_next_guess(&self.guess, &marks, &self.candidates);
        self.history = guesses;
        self.candidates = remaining;
        match next {
            Some(word) => {
                debug_log!("{} candidates left, next guess '{word}'", self.candidates.len());
                self.guess = word;
                Ok(())
            }
            None => Err(SessionError::DictionaryExhausted {
                guesses: self.history.len(),
                context: self.context(),
            }),
        }
    }

    fn context(&self) -> ErrorContext {
        ErrorContext {
            state: self.state,
            last_kind: self.last_kind.clone(),
        }
    }

    fn send(&mut self, message: &ClientMessage) -> Result<(), SessionError> {
        let line = protocol::encode(message).map_err(|e| SessionError::ProtocolViolation {
            detail: format!("could not encode message: {e}"),
            context: self.context(),
        })?;
        self.frames
            .write_frame(&line)
            .map_err(|e| SessionError::io(e, self.context()))
    }

    fn receive(&mut self) -> Result<Option<ServerMessage>, SessionError> {
        let line = match self.frames.read_frame() {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(None),
            Err(e) => return Err(SessionError::frame(e, self.context())),
        };
        match protocol::decode(&line) {
            Ok(message) => {
                self.last_kind = Some(message.kind().to_string());
                Ok(Some(message))
            }
            Err(DecodeError::Malformed(e)) => Err(SessionError::DecodeFailure {
                detail: e.to_string(),
                context: self.context(),
            }),
            Err(DecodeError::Invalid { kind, detail }) => {
                self.last_kind.clone_from(&kind);
                let context = self.context();
                if self.state == SessionState::AwaitingStart && kind.as_deref() != Some("start") {
                    Err(SessionError::HandshakeRejected { detail, context })
                } else {
                    Err(SessionError::ProtocolViolation { detail, context })
                }
            }
        }
    }

    fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.frames.close() {
            debug_log!("closing transport: {e}");
        }
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Connects per `config` and plays one game with the given dictionary.
pub fn run(config: &ClientConfig, dictionary: &[String]) -> Result<SessionReport, SessionError> {
    let connection: Connection = transport::connect(config).map_err(|e| {
        SessionError::io(
            e,
            ErrorContext {
                state: SessionState::Connecting,
                last_kind: None,
            },
        )
    })?;
    let mut session = Session::new(connection, dictionary);
    session.play(&config.username)
}
