use crate::transport::FrameError;
use std::fmt;
use std::io;
use thiserror::Error;

/// Where the session was when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Exhausted,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    AwaitingStart,
    Guessing,
    Terminated(Outcome),
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => f.write_str("connecting"),
            Self::AwaitingStart => f.write_str("awaiting start"),
            Self::Guessing => f.write_str("guessing"),
            Self::Terminated(Outcome::Success) => f.write_str("terminated (success)"),
            Self::Terminated(Outcome::Exhausted) => f.write_str("terminated (exhausted)"),
            Self::Terminated(Outcome::Error) => f.write_str("terminated (error)"),
        }
    }
}

/// Session position at the time of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    pub state: SessionState,
    pub last_kind: Option<String>,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(state: {}", self.state)?;
        if let Some(kind) = &self.last_kind {
            write!(f, ", last message: {kind}")?;
        }
        f.write_str(")")
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("protocol violation: {detail} {context}")]
    ProtocolViolation { detail: String, context: ErrorContext },

    #[error("could not decode server message: {detail} {context}")]
    DecodeFailure { detail: String, context: ErrorContext },

    #[error("transport failure: {source} {context}")]
    TransportFailure {
        #[source]
        source: io::Error,
        context: ErrorContext,
    },

    #[error("timed out waiting for the server {context}")]
    Timeout { context: ErrorContext },

    #[error("no dictionary word matches the feedback after {guesses} guesses {context}")]
    DictionaryExhausted { guesses: usize, context: ErrorContext },

    #[error("server did not start a game: {detail} {context}")]
    HandshakeRejected { detail: String, context: ErrorContext },
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}

impl SessionError {
    pub fn io(source: io::Error, context: ErrorContext) -> Self {
        if is_timeout(&source) {
            Self::Timeout { context }
        } else {
            Self::TransportFailure { source, context }
        }
    }

    pub fn frame(err: FrameError, context: ErrorContext) -> Self {
        match err {
            FrameError::Io(source) => Self::io(source, context),
            FrameError::Truncated => Self::TransportFailure {
                source: io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    FrameError::Truncated.to_string(),
                ),
                context,
            },
            FrameError::TooLong | FrameError::NotUtf8 => Self::DecodeFailure {
                detail: err.to_string(),
                context,
            },
        }
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::ProtocolViolation { context, .. }
            | Self::DecodeFailure { context, .. }
            | Self::TransportFailure { context, .. }
            | Self::Timeout { context }
            | Self::DictionaryExhausted { context, .. }
            | Self::HandshakeRejected { context, .. } => context,
        }
    }

    /// The terminal state this error leaves the session in.
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::DictionaryExhausted { .. } => Outcome::Exhausted,
            _ => Outcome::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(state: SessionState, kind: Option<&str>) -> ErrorContext {
        ErrorContext {
            state,
            last_kind: kind.map(str::to_owned),
        }
    }

    #[test]
    fn test_error_display_includes_context() {
        let err = SessionError::ProtocolViolation {
            detail: "retry without guesses".to_string(),
            context: context(SessionState::Guessing, Some("retry")),
        };
        assert_eq!(
            err.to_string(),
            "protocol violation: retry without guesses (state: guessing, last message: retry)"
        );

        let err = SessionError::Timeout {
            context: context(SessionState::AwaitingStart, None),
        };
        assert_eq!(err.to_string(), "timed out waiting for the server (state: awaiting start)");
    }

    #[test]
    fn test_io_timeouts_are_distinct() {
        let ctx = context(SessionState::Guessing, None);
        let timed_out = io::Error::new(io::ErrorKind::TimedOut, "slow");
        assert!(matches!(SessionError::io(timed_out, ctx.clone()), SessionError::Timeout { .. }));

        let would_block = io::Error::new(io::ErrorKind::WouldBlock, "slow");
        assert!(matches!(SessionError::io(would_block, ctx.clone()), SessionError::Timeout { .. }));

        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        assert!(matches!(
            SessionError::io(reset, ctx),
            SessionError::TransportFailure { .. }
        ));
    }

    #[test]
    fn test_frame_errors_map_to_kinds() {
        let ctx = context(SessionState::Guessing, Some("retry"));
        assert!(matches!(
            SessionError::frame(FrameError::TooLong, ctx.clone()),
            SessionError::DecodeFailure { .. }
        ));
        assert!(matches!(
            SessionError::frame(FrameError::NotUtf8, ctx.clone()),
            SessionError::DecodeFailure { .. }
        ));
        let err = SessionError::frame(FrameError::Truncated, ctx.clone());
        assert!(matches!(err, SessionError::TransportFailure { .. }));
        assert_eq!(err.context(), &ctx);
    }

    #[test]
    fn test_outcome() {
        let ctx = context(SessionState::Guessing, Some("retry"));
        let exhausted = SessionError::DictionaryExhausted {
            guesses: 3,
            context: ctx.clone(),
        };
        assert_eq!(exhausted.outcome(), Outcome::Exhausted);
        let rejected = SessionError::HandshakeRejected {
            detail: "closed".to_string(),
            context: ctx,
        };
        assert_eq!(rejected.outcome(), Outcome::Error);
    }
}
