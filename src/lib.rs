//! BGP Link-State (BGP-LS) collector library
//!
//! This crate implements the wire codec for RFC 4271 BGP messages carrying
//! RFC 7752 BGP-LS NLRI, the per-neighbor peering state machine, and a
//! supervisor that owns a set of neighbors and a shared event stream.
//!
//! The crate never originates or re-advertises routes: it is a read-only
//! collector of link-state topology information.

// SPDX-License-Identifier: AGPL-3.0-or-later

pub mod attr;
pub mod capability;
pub mod collector;
pub mod endec;
pub mod error;
pub mod event;
pub mod fsm;
pub mod nlri;
pub mod path;
#[cfg(test)]
mod tests;

pub use collector::{Collector, CollectorConfig};
pub use endec::{BgpCodec as Codec, Component};
pub use error::Error;
pub use event::{Event, NeighborConfig};

use bytes::{Buf, BufMut};
use capability::{Capabilities, OptionalParameters};
use path::PathAttributes;
use std::net::Ipv4Addr;

/// Supported BGP version
pub const BGP_VERSION: u8 = 4;

/// ASN placeholder used in the OPEN message when the real ASN does not fit 16 bits
pub const AS_TRANS: u16 = 23456;

/// The 16-octet BGP marker, always all ones
pub const MARKER: [u8; 16] = [0xFF; 16];

/// BGP message
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    Open(Open),
    Update(Update),
    Notification(Notification),
    Keepalive,
}

/// BGP open message
#[derive(Clone, Debug, PartialEq)]
pub struct Open {
    pub version: u8,
    pub asn: u16,
    pub hold_time: u16,
    pub bgp_id: Ipv4Addr,
    pub opt_params: OptionalParameters,
}

impl Component for Open {
    fn from_bytes(src: &mut bytes::Bytes) -> Result<Self, Error> {
        let version = src.get_u8();
        let asn = src.get_u16();
        let hold_time = src.get_u16();
        let bgp_id = Ipv4Addr::from(src.get_u32());
        let opt_params = OptionalParameters::from_bytes(src)?;
        Ok(Self {
            version,
            asn,
            hold_time,
            bgp_id,
            opt_params,
        })
    }

    fn to_bytes(self, dst: &mut bytes::BytesMut) -> usize {
        let mut len = 0;
        len += self.version.to_bytes(dst);
        len += self.asn.to_bytes(dst);
        len += self.hold_time.to_bytes(dst);
        len += self.bgp_id.to_bytes(dst);
        len += self.opt_params.to_bytes(dst);
        len
    }

    fn encoded_len(&self) -> usize {
        1 + 2 + 2 + 4 + self.opt_params.encoded_len()
    }
}

impl Open {
    /// Build the OPEN this collector always sends: version 4, BGP-LS and
    /// four-octet-ASN capabilities, and `asn` collapsed to `AS_TRANS` if it
    /// does not fit in 16 bits.
    #[must_use]
    pub fn new_easy(asn: u32, hold_time: u16, bgp_id: Ipv4Addr, capabilities: Capabilities) -> Self {
        let compat_asn = u16::try_from(asn).unwrap_or(AS_TRANS);
        Self {
            version: BGP_VERSION,
            asn: compat_asn,
            hold_time,
            bgp_id,
            opt_params: vec![capability::OptionalParameterValue::Capabilities(
                capabilities,
            )]
            .into(),
        }
    }

    /// The real ASN, resolved through the four-octet-ASN capability if the
    /// 16-bit field is the `AS_TRANS` placeholder.
    #[must_use]
    pub fn real_asn(&self) -> u32 {
        if self.asn == AS_TRANS {
            self.opt_params
                .iter()
                .find_map(|p| {
                    let capability::OptionalParameterValue::Capabilities(caps) = p;
                    caps.four_octet_asn()
                })
                .unwrap_or(u32::from(self.asn))
        } else {
            u32::from(self.asn)
        }
    }
}

/// BGP update message
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Update {
    /// Raw withdrawn IPv4 unicast routes; this collector never interprets them
    pub withdrawn_routes: bytes::Bytes,
    pub path_attributes: PathAttributes,
    /// Raw IPv4 unicast NLRI; this collector never originates or interprets them
    pub nlri: bytes::Bytes,
}

impl Component for Update {
    fn from_bytes(src: &mut bytes::Bytes) -> Result<Self, Error> {
        let withdrawn_len = src.get_u16() as usize;
        let withdrawn_routes = src.split_to(withdrawn_len);
        let tpa_len = src.get_u16() as usize;
        let mut tpa_buf = src.split_to(tpa_len);
        let path_attributes = PathAttributes::from_bytes(&mut tpa_buf)?;
        let nlri = src.split_to(src.remaining());
        Ok(Self {
            withdrawn_routes,
            path_attributes,
            nlri,
        })
    }

    fn to_bytes(self, dst: &mut bytes::BytesMut) -> usize {
        let mut len = 0;
        let wdr_len =
            u16::try_from(self.withdrawn_routes.len()).expect("withdrawn routes length overflow");
        len += wdr_len.to_bytes(dst);
        dst.put_slice(&self.withdrawn_routes);
        len += self.withdrawn_routes.len();
        let tpa_len_pos = dst.len();
        len += 0u16.to_bytes(dst); // Placeholder for total path attributes length
        let tpa_len = self.path_attributes.to_bytes(dst);
        len += tpa_len;
        dst[tpa_len_pos..tpa_len_pos + 2].copy_from_slice(
            &(u16::try_from(tpa_len)
                .expect("total path attributes length overflow")
                .to_be_bytes()),
        );
        dst.put_slice(&self.nlri);
        len += self.nlri.len();
        len
    }

    fn encoded_len(&self) -> usize {
        2 + self.withdrawn_routes.len() + 2 + self.path_attributes.encoded_len() + self.nlri.len()
    }
}

/// BGP notification message
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub error_code: NotificationErrorCode,
    pub error_subcode: u8,
    pub data: bytes::Bytes,
}

impl Component for Notification {
    fn from_bytes(src: &mut bytes::Bytes) -> Result<Self, Error> {
        let error_code = src.get_u8();
        let error_subcode = src.get_u8();
        let data = src.copy_to_bytes(src.remaining());
        Ok(Self {
            error_code: NotificationErrorCode::from_u8(error_code)
                .ok_or_else(|| Error::InternalType("error_code", u16::from(error_code)))?,
            error_subcode,
            data,
        })
    }

    fn to_bytes(self, dst: &mut bytes::BytesMut) -> usize {
        let mut len = 0;
        len += (self.error_code as u8).to_bytes(dst);
        len += self.error_subcode.to_bytes(dst);
        len += self.data.len();
        dst.put_slice(&self.data);
        len
    }

    fn encoded_len(&self) -> usize {
        2 + self.data.len()
    }
}

impl Notification {
    #[must_use]
    pub fn new(error_code: NotificationErrorCode, error_subcode: u8, data: bytes::Bytes) -> Self {
        Self {
            error_code,
            error_subcode,
            data,
        }
    }
}

use enum_primitive_derive::Primitive;
use num_traits::FromPrimitive;

/// Notification error codes
#[derive(Copy, Clone, Debug, PartialEq, Eq, Primitive)]
#[repr(u8)]
pub enum NotificationErrorCode {
    MessageHeaderError = 1,
    OpenMessageError = 2,
    UpdateMessageError = 3,
    HoldTimerExpired = 4,
    FiniteStateMachineError = 5,
    Cease = 6,
}

/// Notification error subcodes for `MessageHeaderError`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Primitive)]
#[repr(u8)]
pub enum MessageHeaderErrorSubcode {
    ConnectionNotSynchronized = 1,
    BadMessageLength = 2,
    BadMessageType = 3,
}

/// Notification error subcodes for `OpenMessageError`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Primitive)]
#[repr(u8)]
pub enum OpenMessageErrorSubcode {
    UnsupportedVersionNumber = 1,
    BadPeerAs = 2,
    BadBgpIdentifier = 3,
    UnsupportedOptionalParameter = 4,
    UnacceptableHoldTime = 6,
    UnsupportedCapability = 7,
}

/// Notification error subcodes for `UpdateMessageError`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Primitive)]
#[repr(u8)]
pub enum UpdateMessageErrorSubcode {
    MalformedAttributeList = 1,
    UnrecognizedWellKnownAttribute = 2,
    MissingWellKnownAttribute = 3,
    AttributeFlagsError = 4,
    AttributeLengthError = 5,
    InvalidOriginAttribute = 6,
    AsRoutingLoop = 7,
    InvalidNextHopAttribute = 8,
    OptionalAttributeError = 9,
    InvalidNetworkField = 10,
    MalformedAsPath = 11,
}

/// Notification error subcodes for `Cease`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Primitive)]
#[repr(u8)]
pub enum CeaseSubcode {
    MaximumNumberOfPrefixesReached = 1,
    AdministrativeShutdown = 2,
    PeerDeconfigured = 3,
    AdministrativeReset = 4,
    ConnectionRejected = 5,
    OtherConfigurationChange = 6,
    ConnectionCollisionResolution = 7,
    OutOfResources = 8,
}
