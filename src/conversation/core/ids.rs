// File: src/conversation/core/ids.rs

//! Identifier types for conversation state.
//!
//! Every identifier the protocol layer hands us is an opaque string. Wrapping
//! them in newtypes keeps an `EventId` from being passed where a
//! `ConversationId` is expected. Timestamps are microseconds since the Unix
//! epoch, which is what the chat service stamps on events and watermarks.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Declare an opaque string identifier with a consistent API.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[repr(transparent)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier.
            #[inline]
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the identifier as a string slice.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = core::convert::Infallible;

            #[inline]
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_string()))
            }
        }
    };
}

define_string_id!(
    /// Identifier of a conversation as assigned by the chat service.
    ConversationId
);

define_string_id!(
    /// Identifier of a single conversation event.
    EventId
);

define_string_id!(
    /// Identifier of a chat user (the service's chat id).
    UserId
);

define_string_id!(
    /// Identifier of an uploaded image, returned by the client after upload.
    ImageId
);

/// Event or watermark timestamp in microseconds since the Unix epoch.
///
/// `Timestamp::ZERO` is the protocol's "unset" value.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// The unset timestamp.
    pub const ZERO: Self = Self(0);

    /// Wrap raw microseconds.
    #[inline]
    #[must_use]
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Raw microseconds.
    #[inline]
    #[must_use]
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// True when this is the protocol's unset value.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Convert from a chrono timestamp, clamping pre-epoch values to zero.
    #[must_use]
    pub fn from_datetime(value: DateTime<Utc>) -> Self {
        Self(u64::try_from(value.timestamp_micros()).unwrap_or(0))
    }

    /// Convert to a chrono timestamp, if representable.
    #[must_use]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let micros = i64::try_from(self.0).ok()?;
        Utc.timestamp_micros(micros).single()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{}us", self.0),
        }
    }
}

impl From<u64> for Timestamp {
    #[inline]
    fn from(value: u64) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_id_roundtrip_display() {
        let id = EventId::new("evt-1");
        assert_eq!(id.as_str(), "evt-1");
        assert_eq!(id.to_string(), "evt-1");
        assert_eq!(EventId::from("evt-1"), id);
    }

    #[test]
    fn test_timestamp_zero_and_ordering() {
        assert!(Timestamp::ZERO.is_zero());
        assert!(Timestamp::from_micros(2) > Timestamp::from_micros(1));
        assert_eq!(Timestamp::default(), Timestamp::ZERO);
    }

    #[test]
    fn test_timestamp_datetime_conversion() {
        let ts = Timestamp::from_micros(1_500_000_000_000_000);
        let dt = ts.to_datetime();
        assert!(dt.is_some());
        assert_eq!(dt.map(Timestamp::from_datetime), Some(ts));
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&ConversationId::new("c1")).unwrap_or_default();
        assert_eq!(json, "\"c1\"");
        let ts: Timestamp = serde_json::from_str("42").unwrap_or_default();
        assert_eq!(ts.as_micros(), 42);
    }
}
