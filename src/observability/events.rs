//! Observable events
//!
//! Every log line names one of these events.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    ConfigLoaded,

    // Point store lifecycle
    StoreOpened,
    StoreUpgraded,
    /// Another context holds an older-version connection
    StoreBlocked,
    StoreClosed,
    /// Checksum failure in the record file
    StoreCorruption,
    /// Incomplete trailing record removed by a writer
    StoreTailTruncated,

    // Point store mutations
    PointCreated,
    PointUpdated,
    PointDeleted,
    StoreReset,
    StoreSeeded,
    UsersSeeded,

    // Bulletin
    BulletinLoaded,
    BulletinReplaced,
    GeometryRejected,

    // Change notification bus
    BusTransportSelected,
    BusPublished,
    BusPublishFailed,
    BusReceived,
    BusReceiveFailed,

    // Session view
    ViewReloaded,
    ViewPointRefreshed,
    ViewApplyFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::StoreOpened => "STORE_OPENED",
            Event::StoreUpgraded => "STORE_UPGRADED",
            Event::StoreBlocked => "STORE_BLOCKED",
            Event::StoreClosed => "STORE_CLOSED",
            Event::StoreCorruption => "STORE_CORRUPTION",
            Event::StoreTailTruncated => "STORE_TAIL_TRUNCATED",

            Event::PointCreated => "POINT_CREATED",
            Event::PointUpdated => "POINT_UPDATED",
            Event::PointDeleted => "POINT_DELETED",
            Event::StoreReset => "STORE_RESET",
            Event::StoreSeeded => "STORE_SEEDED",
            Event::UsersSeeded => "USERS_SEEDED",

            Event::BulletinLoaded => "BULLETIN_LOADED",
            Event::BulletinReplaced => "BULLETIN_REPLACED",
            Event::GeometryRejected => "GEOMETRY_REJECTED",

            Event::BusTransportSelected => "BUS_TRANSPORT_SELECTED",
            Event::BusPublished => "BUS_PUBLISHED",
            Event::BusPublishFailed => "BUS_PUBLISH_FAILED",
            Event::BusReceived => "BUS_RECEIVED",
            Event::BusReceiveFailed => "BUS_RECEIVE_FAILED",

            Event::ViewReloaded => "VIEW_RELOADED",
            Event::ViewPointRefreshed => "VIEW_POINT_REFRESHED",
            Event::ViewApplyFailed => "VIEW_APPLY_FAILED",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::StoreCorruption)
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::StoreCorruption => Severity::Fatal,
            Event::StoreBlocked
            | Event::StoreTailTruncated
            | Event::GeometryRejected
            | Event::BusPublishFailed
            | Event::BusReceiveFailed
            | Event::ViewApplyFailed => Severity::Warn,
            Event::BusPublished | Event::BusReceived | Event::ViewPointRefreshed => {
                Severity::Debug
            }
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
