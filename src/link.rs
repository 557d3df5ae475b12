//! Radio command codec.
//!
//! Wire format shared by device and hub:
//! ```text
//! ┌─────────┬───┬─────────┐
//! │ COMMAND │ = │ VALUE   │   ASCII, single delimiter
//! └─────────┴───┴─────────┘
//! ```
//!
//! Values are ASCII decimal integers or the literals `"0"`/`"1"` for
//! booleans. The maximum payload length is the radio transport's frame
//! size, supplied by the caller as the output buffer — the codec itself
//! imposes no limit.
//!
//! `=` is not escaped on the wire, so it is forbidden inside values:
//! [`encode`] rejects it and [`decode`] splits on the first occurrence.

use crate::error::ProtocolError;

/// Delimiter between command and value.
const DELIMITER: u8 = b'=';

// ---------------------------------------------------------------------------
// Command set
// ---------------------------------------------------------------------------

/// Commands understood by both ends of the radio link.
///
/// `Reference`, `Mode` and `Rain` travel hub → device; `Value`, `Status`
/// and `Water` travel device → hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Set the moisture reference threshold (percent).
    Reference,
    /// Current averaged moisture reading (percent).
    Value,
    /// Set the watering mode (see [`Mode`](crate::config::Mode)).
    Mode,
    /// Whether the valve is currently commanded open (`"1"`/`"0"`).
    Status,
    /// Whether a water source is available (`"1"`/`"0"`).
    Water,
    /// Whether rain is expected within the forecast window (`"1"`/`"0"`).
    Rain,
}

impl Command {
    /// The ASCII token carried on the wire.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Reference => "REFERENCE",
            Self::Value => "VALUE",
            Self::Mode => "MODE",
            Self::Status => "STATUS",
            Self::Water => "WATER",
            Self::Rain => "RAIN",
        }
    }

    /// Parse a command token. `None` for anything unrecognised — the
    /// receiver logs and drops those without side effects.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "REFERENCE" => Some(Self::Reference),
            "VALUE" => Some(Self::Value),
            "MODE" => Some(Self::Mode),
            "STATUS" => Some(Self::Status),
            "WATER" => Some(Self::Water),
            "RAIN" => Some(Self::Rain),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Encode / decode
// ---------------------------------------------------------------------------

/// Encode `command=value` into `out`.
///
/// Returns the number of bytes written. Fails if the value contains the
/// delimiter, is not ASCII, or the payload does not fit the transport
/// frame (`out`).
pub fn encode(command: Command, value: &str, out: &mut [u8]) -> Result<usize, ProtocolError> {
    if !value.is_ascii() {
        return Err(ProtocolError::NotAscii);
    }
    if value.as_bytes().contains(&DELIMITER) {
        return Err(ProtocolError::DelimiterInValue);
    }

    let token = command.token().as_bytes();
    let total = token.len() + 1 + value.len();
    if total > out.len() {
        return Err(ProtocolError::PayloadTooLong);
    }

    out[..token.len()].copy_from_slice(token);
    out[token.len()] = DELIMITER;
    out[token.len() + 1..total].copy_from_slice(value.as_bytes());
    Ok(total)
}

/// Decode a received payload into `(command, value)`.
///
/// Splits on the **first** `=`; a payload without one is malformed and
/// rejected without side effects, as is a value carrying a second `=`
/// (the no-delimiter-in-values policy, enforced on both ends). The value
/// slice borrows from `payload`.
pub fn decode(payload: &[u8]) -> Result<(Command, &str), ProtocolError> {
    let text = core::str::from_utf8(payload).map_err(|_| ProtocolError::NotAscii)?;
    if !text.is_ascii() {
        return Err(ProtocolError::NotAscii);
    }

    let (token, value) = text
        .split_once('=')
        .ok_or(ProtocolError::MissingDelimiter)?;
    if value.contains('=') {
        return Err(ProtocolError::DelimiterInValue);
    }

    let command = Command::from_token(token).ok_or(ProtocolError::UnknownCommand)?;
    Ok((command, value))
}
