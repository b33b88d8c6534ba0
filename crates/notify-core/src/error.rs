use std::fmt;

use crate::model::NotificationKind;

/// Machine-readable error codes for host-side decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    UnknownKind,
    MalformedPayload,
    WatermarkUnavailable,
    WatermarkWriteFailed,
    InitialLoadFailed,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::UnknownKind => "E2001",
            Self::MalformedPayload => "E2002",
            Self::WatermarkUnavailable => "E3001",
            Self::WatermarkWriteFailed => "E3002",
            Self::InitialLoadFailed => "E4001",
        }
    }

    /// Short human-facing summary for logs.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::UnknownKind => "Unrecognized notification type",
            Self::MalformedPayload => "Malformed notification payload",
            Self::WatermarkUnavailable => "Last-seen watermark unavailable",
            Self::WatermarkWriteFailed => "Last-seen watermark write failed",
            Self::InitialLoadFailed => "Initial notification load failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in the notify config file and retry."),
            Self::UnknownKind | Self::MalformedPayload => None,
            Self::WatermarkUnavailable => Some("Unseen counts fall back to watermark 0."),
            Self::WatermarkWriteFailed => {
                Some("The watermark is kept in memory; it will be written on the next mark-seen.")
            }
            Self::InitialLoadFailed => {
                Some("Notifications stay hidden until a bulk fetch succeeds.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Reasons a raw event never becomes a notification record.
///
/// None of these escape the engine: every variant resolves to "skip".
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The `t` field names a type this engine does not know about.
    #[error("unknown notification type '{raw}'")]
    UnknownKind { raw: String },

    /// The event has no `t` field at all.
    #[error("notification has no type field")]
    MissingKind,

    /// The payload does not match the schema of its type.
    #[error("malformed {kind} payload: {source}")]
    MalformedPayload {
        kind: NotificationKind,
        #[source]
        source: serde_json::Error,
    },
}

impl IngestError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownKind { .. } | Self::MissingKind => ErrorCode::UnknownKind,
            Self::MalformedPayload { .. } => ErrorCode::MalformedPayload,
        }
    }
}
