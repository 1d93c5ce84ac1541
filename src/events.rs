//! Notification events emitted by the core at every observable state change.
//!
//! The core only *emits*: delivery, fan-out, and display belong to the
//! notification subsystem outside this crate. Components receive an
//! [`EventSink`] by reference instead of reaching for a global notification
//! hub, which keeps every operation independently testable. Emission must
//! never fail the operation that triggered it, so sinks are infallible and a
//! sink with no listener is a no-op.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

/// Category of an emitted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A booking was created or changed status
    Booking,
    /// Funds moved between two balances
    Payment,
    /// A review was left for a user
    Review,
    /// A direct message was sent (emitted on behalf of the messaging layer)
    Message,
}

impl EventKind {
    /// Stable label used in event payloads and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Booking => "booking",
            Self::Payment => "payment",
            Self::Review => "review",
            Self::Message => "message",
        }
    }
}

/// An outbound notification fact.
#[derive(Debug, Clone)]
pub struct Event {
    /// What happened
    pub kind: EventKind,
    /// User the notification is addressed to
    pub user_id: i64,
    /// Human-readable message for the notification UI
    pub message: String,
    /// Id of the booking/transaction/review the event refers to
    pub related_id: i64,
    /// When the event was emitted
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Builds an event stamped with the current time.
    #[must_use]
    pub fn new(kind: EventKind, user_id: i64, message: String, related_id: i64) -> Self {
        Self {
            kind,
            user_id,
            message,
            related_id,
            timestamp: Utc::now(),
        }
    }
}

/// Injectable destination for emitted events.
pub trait EventSink: Send + Sync {
    /// Accepts one event. Must not block and must not fail the caller.
    fn emit(&self, event: Event);
}

/// Sink that fans events out over an unbounded channel.
///
/// Dropping the receiver turns the sink into a no-op, so emitters never need
/// to know whether anyone is listening.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Event>,
}

impl ChannelSink {
    /// Creates a sink together with the receiving end of its channel.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: Event) {
        // A closed channel means nobody is listening; that is fine.
        let _ = self.tx.send(event);
    }
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: Event) {}
}
