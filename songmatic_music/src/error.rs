// Error taxonomy for snippet generation.
//
// Two families matter to callers. `InvalidInput` covers anything a request
// can get wrong (key selector out of range, unparseable tempo, zero bars);
// the caller decides whether to substitute a randomized default, see
// `params.rs`. `InvariantViolation` means the generator itself produced
// something malformed (a scale without seven distinct letters, a bar layer
// that is not sixteen slots long) and is always fatal to the call. There are
// no partial outputs.

use thiserror::Error;

/// Errors raised while resolving parameters, composing bars or encoding MIDI.
#[derive(Debug, Error)]
pub enum SongError {
    #[error("invalid {field} '{value}': {reason}")]
    InvalidInput {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),
    #[error("invalid composer config: {0}")]
    Config(String),
    #[error("malformed MIDI data: {0}")]
    Midi(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SongError {
    pub(crate) fn invalid(
        field: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        SongError::InvalidInput {
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors the caller may answer with a randomized default.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, SongError::InvalidInput { .. })
    }
}

pub type Result<T> = std::result::Result<T, SongError>;
