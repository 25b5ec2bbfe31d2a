//! Type-safe identifiers for protocol entities.
//!
//! Chrome assigns most identifiers; the engine passes them through unchanged
//! and never parses or reorders them. Newtype wrappers prevent mixing
//! incompatible IDs at compile time.
//!
//! The one identifier the engine owns is [`CallId`]: the monotonically
//! increasing integer correlating a command with its response frame.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

// ============================================================================
// CallId
// ============================================================================

/// Identifier correlating a command frame with its response frame.
///
/// Assigned by the transport, never by the caller. IDs are unique for the
/// lifetime of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallId(u32);

impl CallId {
    /// Creates a call ID from a raw value.
    #[inline]
    #[must_use]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// CallIdGenerator
// ============================================================================

/// Monotonic generator for [`CallId`]s.
///
/// Wraps on overflow; a connection never has 2^32 requests in flight.
#[derive(Debug, Default)]
pub struct CallIdGenerator {
    next: AtomicU32,
}

impl CallIdGenerator {
    /// Creates a generator starting at 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }

    /// Returns the next call ID.
    #[inline]
    pub fn next(&self) -> CallId {
        CallId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

// ============================================================================
// Opaque string identifiers
// ============================================================================

/// Declares a newtype over an opaque protocol string.
macro_rules! opaque_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an ID from a raw protocol string.
            #[inline]
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Returns the raw string.
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
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

opaque_id! {
    /// CDP session attachment identifier (`sessionId` on frames).
    SessionId
}

opaque_id! {
    /// Debuggable target identifier (page, iframe, worker).
    TargetId
}

opaque_id! {
    /// Parsed script identifier from `Debugger.scriptParsed`.
    ScriptId
}

opaque_id! {
    /// Breakpoint identifier from `Debugger.setBreakpoint*`.
    BreakpointId
}

opaque_id! {
    /// Network request identifier, shared by `Network.*` and `Fetch.*` events.
    RequestId
}

opaque_id! {
    /// Call frame identifier from a pause event.
    CallFrameId
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_id_generator_is_monotonic() {
        let generator = CallIdGenerator::new();
        let a = generator.next();
        let b = generator.next();
        let c = generator.next();

        assert_eq!(a.raw(), 1);
        assert_eq!(b.raw(), 2);
        assert_eq!(c.raw(), 3);
    }

    #[test]
    fn test_call_id_serializes_as_integer() {
        let json = serde_json::to_string(&CallId::new(7)).expect("serialize");
        assert_eq!(json, "7");
    }

    #[test]
    fn test_opaque_id_roundtrip() {
        let id = RequestId::new("req-123");
        assert_eq!(id.as_str(), "req-123");
        assert_eq!(id.to_string(), "req-123");

        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, "\"req-123\"");

        let back: RequestId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, id);
    }

    #[test]
    fn test_ids_are_distinct_types() {
        fn takes_script(_: &ScriptId) {}
        takes_script(&ScriptId::new("42"));
    }
}
