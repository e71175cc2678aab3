//! Observable events published by a running [`crate::collector::Collector`]
//!
//! A collector's whole purpose is to turn BGP-LS sessions into a stream of
//! these events; nothing about a neighbor's state is otherwise exposed to
//! callers except through [`crate::collector::Collector::neighbors`].

// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::fsm::State;
use crate::{Notification, Update};
use std::net::SocketAddr;

/// Static configuration for one neighbor
#[derive(Clone, Debug, PartialEq)]
pub struct NeighborConfig {
    pub address: SocketAddr,
    /// The peer's ASN, checked against the OPEN it sends.
    pub asn: u32,
    pub hold_time: u16,
}

/// The kind of an [`Event`], independent of its payload.
///
/// Kept as a distinct enum (rather than deriving discriminants straight off
/// `Event`) so every variant's tag is written down once, explicitly, beside
/// the variant it describes -- there is no shared code path between
/// `NotificationReceived` and `UpdateReceived` that could let one's tag leak
/// into the other.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EventType {
    Added,
    Removed,
    StateTransition,
    UpdateReceived,
    NotificationReceived,
    HoldTimerExpired,
    Error,
}

/// One observable occurrence on a neighbor session
#[derive(Clone, Debug)]
pub enum Event {
    /// A neighbor was added to the collector
    Added { address: SocketAddr },
    /// A neighbor was removed from the collector
    Removed { address: SocketAddr },
    /// The neighbor's FSM moved from one state to another
    StateTransition {
        address: SocketAddr,
        from: State,
        to: State,
    },
    /// An UPDATE message was received from an established neighbor
    UpdateReceived { address: SocketAddr, update: Update },
    /// A NOTIFICATION message was received from a neighbor
    NotificationReceived {
        address: SocketAddr,
        notification: Notification,
    },
    /// The neighbor's hold timer expired without a keepalive or update
    HoldTimerExpired { address: SocketAddr },
    /// The neighbor session ended because of an error
    Error { address: SocketAddr, message: String },
}

impl Event {
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::Added { .. } => EventType::Added,
            Self::Removed { .. } => EventType::Removed,
            Self::StateTransition { .. } => EventType::StateTransition,
            Self::UpdateReceived { .. } => EventType::UpdateReceived,
            Self::NotificationReceived { .. } => EventType::NotificationReceived,
            Self::HoldTimerExpired { .. } => EventType::HoldTimerExpired,
            Self::Error { .. } => EventType::Error,
        }
    }

    #[must_use]
    pub const fn address(&self) -> SocketAddr {
        match self {
            Self::Added { address }
            | Self::Removed { address }
            | Self::StateTransition { address, .. }
            | Self::UpdateReceived { address, .. }
            | Self::NotificationReceived { address, .. }
            | Self::HoldTimerExpired { address }
            | Self::Error { address, .. } => *address,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_received_keeps_its_own_tag() {
        let addr: SocketAddr = "192.0.2.1:179".parse().unwrap();
        let notif = Event::NotificationReceived {
            address: addr,
            notification: Notification::new(
                crate::NotificationErrorCode::Cease,
                0,
                bytes::Bytes::new(),
            ),
        };
        let update = Event::UpdateReceived {
            address: addr,
            update: Update {
                withdrawn_routes: bytes::Bytes::new(),
                path_attributes: crate::path::PathAttributes::default(),
                nlri: bytes::Bytes::new(),
            },
        };
        assert_eq!(notif.event_type(), EventType::NotificationReceived);
        assert_eq!(update.event_type(), EventType::UpdateReceived);
        assert_ne!(notif.event_type(), update.event_type());
    }
}
