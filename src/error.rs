//! Crate-wide error types
//!
//! Every decode failure here is expected to reach the peering FSM, which
//! turns it into a NOTIFICATION via [`Error::to_notification`] before
//! closing the session. Nothing in this module panics on peer-controlled
//! input.

// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::{
    CeaseSubcode, MessageHeaderErrorSubcode, NotificationErrorCode, OpenMessageErrorSubcode,
    UpdateMessageErrorSubcode,
};
use bytes::Bytes;
use std::cmp::Ordering;

/// Codec- and protocol-level errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid BGP marker")]
    Marker,
    #[error("message total length {0} out of range 19..=4096")]
    BadLength(usize),
    #[error("unknown message type {0}")]
    MessageType(u8),
    #[error("{0} length should be {1:?}")]
    InternalLength(&'static str, Ordering),
    #[error("unknown {0} value {1}")]
    InternalType(&'static str, u16),
    #[error("path attribute flags invalid for {0}")]
    AttrFlags(&'static str),
    #[error("MP_REACH_NLRI/MP_UNREACH_NLRI must carry AFI=16388/SAFI=71 for this collector")]
    NotBgpLs,
    #[error("malformed BGP-LS {0}: {1}")]
    MalformedLinkState(&'static str, &'static str),
    #[error("BGP-LS attribute sub-TLV type {0} is unknown")]
    UnknownLinkStateTlv(u16),
    #[error("BGP-LS attribute requires a preceding MP_REACH_NLRI/MP_UNREACH_NLRI for protocol-id context")]
    NoNlriProtocolHint,
}

impl Error {
    /// Map this error to the `(code, subcode, data)` triple a NOTIFICATION carries.
    #[must_use]
    pub fn to_notification(&self) -> (NotificationErrorCode, u8, Bytes) {
        match self {
            Self::Io(_) => (
                NotificationErrorCode::Cease,
                CeaseSubcode::OtherConfigurationChange as u8,
                Bytes::new(),
            ),
            Self::Marker => (
                NotificationErrorCode::MessageHeaderError,
                MessageHeaderErrorSubcode::ConnectionNotSynchronized as u8,
                Bytes::new(),
            ),
            Self::BadLength(_) => (
                NotificationErrorCode::MessageHeaderError,
                MessageHeaderErrorSubcode::BadMessageLength as u8,
                Bytes::new(),
            ),
            Self::MessageType(t) => (
                NotificationErrorCode::MessageHeaderError,
                MessageHeaderErrorSubcode::BadMessageType as u8,
                Bytes::copy_from_slice(&[*t]),
            ),
            Self::AttrFlags(_) => (
                NotificationErrorCode::UpdateMessageError,
                UpdateMessageErrorSubcode::AttributeFlagsError as u8,
                Bytes::new(),
            ),
            Self::UnknownLinkStateTlv(_) | Self::NoNlriProtocolHint => (
                NotificationErrorCode::UpdateMessageError,
                UpdateMessageErrorSubcode::OptionalAttributeError as u8,
                Bytes::new(),
            ),
            Self::InternalLength(..)
            | Self::InternalType(..)
            | Self::NotBgpLs
            | Self::MalformedLinkState(..) => (
                NotificationErrorCode::UpdateMessageError,
                UpdateMessageErrorSubcode::MalformedAttributeList as u8,
                Bytes::new(),
            ),
        }
    }
}

/// Errors returned by [`crate::collector::Collector`] operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CollectorError {
    #[error("collector has been stopped")]
    CollectorStopped,
    #[error("neighbor already exists")]
    NeighborExists,
    #[error("neighbor not found")]
    NeighborNotFound,
}

/// Errors a neighbor FSM can terminate with
#[derive(Debug, thiserror::Error)]
pub enum FsmError {
    #[error(transparent)]
    Codec(#[from] Error),
    #[error("TCP error: {0}")]
    Io(#[from] std::io::Error),
    #[error("peer sent unsupported BGP version {0}")]
    UnsupportedVersion(u8),
    #[error("peer ASN mismatch: expected {expected}, got {actual}")]
    BadPeerAs { expected: u32, actual: u32 },
    #[error("peer hold time {0} is neither 0 nor >= 3")]
    UnacceptableHoldTime(u16),
    #[error("peer BGP identifier is zero")]
    BadBgpId,
    #[error("peer did not advertise the BGP-LS multiprotocol capability")]
    UnsupportedCapability,
    #[error("peer closed the connection")]
    ConnectionClosed,
    #[error("peer sent NOTIFICATION: code={0:?} subcode={1}")]
    PeerNotification(NotificationErrorCode, u8),
    #[error("hold timer expired")]
    HoldTimerExpired,
    #[error("unexpected message {0:?} in state {1}")]
    UnexpectedMessage(&'static str, &'static str),
    #[error("session stopped by the collector")]
    Stopped,
}

impl FsmError {
    /// Map this error to the `(code, subcode, data)` triple to send in a NOTIFICATION,
    /// or `None` if no NOTIFICATION should be sent (the socket is already unusable).
    #[must_use]
    pub fn to_notification(&self) -> Option<(NotificationErrorCode, u8, Bytes)> {
        match self {
            Self::Codec(e) => Some(e.to_notification()),
            Self::Io(_) | Self::ConnectionClosed | Self::PeerNotification(..) => None,
            Self::UnsupportedVersion(_) => Some((
                NotificationErrorCode::OpenMessageError,
                OpenMessageErrorSubcode::UnsupportedVersionNumber as u8,
                Bytes::new(),
            )),
            Self::BadPeerAs { .. } => Some((
                NotificationErrorCode::OpenMessageError,
                OpenMessageErrorSubcode::BadPeerAs as u8,
                Bytes::new(),
            )),
            Self::UnacceptableHoldTime(_) => Some((
                NotificationErrorCode::OpenMessageError,
                OpenMessageErrorSubcode::UnacceptableHoldTime as u8,
                Bytes::new(),
            )),
            Self::BadBgpId => Some((
                NotificationErrorCode::OpenMessageError,
                OpenMessageErrorSubcode::BadBgpIdentifier as u8,
                Bytes::new(),
            )),
            Self::UnsupportedCapability => Some((
                NotificationErrorCode::OpenMessageError,
                OpenMessageErrorSubcode::UnsupportedCapability as u8,
                Bytes::new(),
            )),
            Self::HoldTimerExpired => Some((
                NotificationErrorCode::HoldTimerExpired,
                0,
                Bytes::new(),
            )),
            Self::UnexpectedMessage(..) => Some((
                NotificationErrorCode::FiniteStateMachineError,
                0,
                Bytes::new(),
            )),
            Self::Stopped => Some((
                NotificationErrorCode::Cease,
                CeaseSubcode::AdministrativeShutdown as u8,
                Bytes::new(),
            )),
        }
    }
}
