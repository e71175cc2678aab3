//! The BGP-LS path attribute (type 29, RFC 7752 Section 3.3)
//!
//! Unlike every other TLV family in this crate, an unrecognized sub-TLV code
//! here is a decode error rather than an opaque passthrough: RFC 7752 does
//! not define a treat-as-withdraw fallback for this attribute, so a peer
//! advertising a code we don't understand gets a NOTIFICATION. A handful of
//! sub-TLVs (Prefix-Flags, the SR Adjacency-SID flags) additionally depend on
//! the IGP protocol that sourced the enclosing NLRI; callers thread that
//! through as a [`crate::nlri::ProtocolId`] decode-context value rather than
//! having this module guess it.

// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::nlri::ProtocolId;
use crate::Error;
use bytes::{Buf, BufMut, Bytes};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// The packet-loss fixed-point unit: 2^-24 % per count (RFC 7471 Section 4.4)
const LOSS_UNIT: f64 = 0.000003;
const LOSS_MAX_UNITS: u32 = (1 << 24) - 2;

/// A decoded BGP-LS attribute: one flat, ordered list of sub-TLVs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LinkStateAttribute(pub Vec<Tlv>);

impl LinkStateAttribute {
    /// Decode every sub-TLV in `src`, using `protocol_hint` for the handful of
    /// sub-TLVs whose layout depends on the originating IGP.
    pub fn decode(src: &mut Bytes, protocol_hint: ProtocolId) -> Result<Self, Error> {
        let mut tlvs = Vec::new();
        while src.has_remaining() {
            let tlv_type = src.get_u16();
            let len = src.get_u16() as usize;
            let mut value = src.split_to(len);
            tlvs.push(Tlv::decode(tlv_type, &mut value, protocol_hint)?);
        }
        Ok(Self(tlvs))
    }

    #[must_use]
    pub fn encoded_len(&self) -> usize {
        self.0.iter().map(Tlv::encoded_len).sum()
    }

    pub fn encode(self, dst: &mut bytes::BytesMut) -> usize {
        let mut len = 0;
        for tlv in self.0 {
            len += tlv.encode(dst);
        }
        len
    }

    /// Convenience getter used by tests and callers that only care about one bandwidth field.
    #[must_use]
    pub fn max_link_bandwidth(&self) -> Option<f32> {
        self.0.iter().find_map(|t| match t {
            Tlv::Link(LinkAttr::MaxLinkBandwidth(v)) => Some(*v),
            _ => None,
        })
    }
}

/// One decoded sub-TLV, tagged by which family it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub enum Tlv {
    Node(NodeAttr),
    Link(LinkAttr),
    Prefix(PrefixAttr),
}

impl Tlv {
    fn decode(tlv_type: u16, value: &mut Bytes, protocol_hint: ProtocolId) -> Result<Self, Error> {
        if let Some(a) = NodeAttr::try_decode(tlv_type, value)? {
            return Ok(Self::Node(a));
        }
        if let Some(a) = LinkAttr::try_decode(tlv_type, value, protocol_hint)? {
            return Ok(Self::Link(a));
        }
        if let Some(a) = PrefixAttr::try_decode(tlv_type, value, protocol_hint)? {
            return Ok(Self::Prefix(a));
        }
        Err(Error::UnknownLinkStateTlv(tlv_type))
    }

    fn encode(self, dst: &mut bytes::BytesMut) -> usize {
        match self {
            Self::Node(a) => a.encode(dst),
            Self::Link(a) => a.encode(dst),
            Self::Prefix(a) => a.encode(dst),
        }
    }

    fn encoded_len(&self) -> usize {
        match self {
            Self::Node(a) => a.encoded_len(),
            Self::Link(a) => a.encoded_len(),
            Self::Prefix(a) => a.encoded_len(),
        }
    }
}

/// Multi-Topology-ID list, shared by the node/link/prefix families (12-bit IDs).
fn decode_mt_id(value: &mut Bytes) -> Result<Vec<u16>, Error> {
    if value.is_empty() || value.len() % 2 != 0 {
        return Err(Error::MalformedLinkState(
            "Multi-Topology-ID",
            "length must be a positive even number of octets",
        ));
    }
    let mut ids = Vec::with_capacity(value.len() / 2);
    while value.has_remaining() {
        ids.push(value.get_u16() & 0x0FFF);
    }
    Ok(ids)
}

fn encode_mt_id(ids: &[u16], dst: &mut bytes::BytesMut) {
    for id in ids {
        dst.put_u16(id & 0x0FFF);
    }
}

/// A Segment Routing SID/Label sub-field: 3 octets for an MPLS label, 4 for a SID index.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SidLabel {
    Label(u32),
    Index(u32),
}

impl SidLabel {
    fn decode(value: &Bytes) -> Result<Self, Error> {
        match value.len() {
            3 => {
                let label = (u32::from(value[0]) << 16)
                    | (u32::from(value[1]) << 8)
                    | u32::from(value[2]);
                Ok(Self::Label(label & 0x000F_FFFF))
            }
            4 => Ok(Self::Index(u32::from_be_bytes(
                value[..4].try_into().unwrap(),
            ))),
            _ => Err(Error::MalformedLinkState(
                "SID/Label",
                "length must be 3 (label) or 4 (index) octets",
            )),
        }
    }

    fn encode(self, dst: &mut bytes::BytesMut) -> usize {
        match self {
            Self::Label(l) => {
                let b = l.to_be_bytes();
                dst.put_slice(&b[1..4]);
                3
            }
            Self::Index(i) => {
                dst.put_u32(i);
                4
            }
        }
    }

    fn encoded_len(self) -> usize {
        match self {
            Self::Label(_) => 3,
            Self::Index(_) => 4,
        }
    }
}

// ---------------------------------------------------------------- Node ----

/// Node attribute sub-TLVs (RFC 7752 Section 3.3.1)
#[derive(Clone, Debug, PartialEq)]
pub enum NodeAttr {
    MultiTopologyId(Vec<u16>),
    NodeFlags(u8),
    Opaque(Bytes),
    /// Node Name, stored byte-reversed relative to the wire representation
    Name(Bytes),
    IsisAreaId(Bytes),
    Ipv4RouterId(Ipv4Addr),
    Ipv6RouterId(Ipv6Addr),
    SrCapabilities(Bytes),
    SrAlgorithm(Vec<u8>),
    SrLocalBlock(Bytes),
    SrmsPreference(u8),
}

impl NodeAttr {
    fn try_decode(tlv_type: u16, value: &mut Bytes) -> Result<Option<Self>, Error> {
        Ok(Some(match tlv_type {
            263 => Self::MultiTopologyId(decode_mt_id(value)?),
            1024 => {
                require_len("Node-Flag-Bits", value, 1)?;
                Self::NodeFlags(value.get_u8())
            }
            1025 => Self::Opaque(value.split_to(value.len())),
            1026 => Self::Name(reverse_bytes(&value.split_to(value.len()))),
            1027 => Self::IsisAreaId(value.split_to(value.len())),
            1028 => Self::Ipv4RouterId(decode_ipv4(value)?),
            1029 => Self::Ipv6RouterId(decode_ipv6(value)?),
            1034 => Self::SrCapabilities(value.split_to(value.len())),
            1035 => Self::SrAlgorithm(value.split_to(value.len()).to_vec()),
            1036 => Self::SrLocalBlock(value.split_to(value.len())),
            1037 => {
                require_len("SRMS-Preference", value, 1)?;
                Self::SrmsPreference(value.get_u8())
            }
            _ => return Ok(None),
        }))
    }

    fn encode(self, dst: &mut bytes::BytesMut) -> usize {
        let (code, len) = (self.code(), self.encoded_len() - 4);
        dst.put_u16(code);
        dst.put_u16(u16::try_from(len).expect("node attribute length overflow"));
        match self {
            Self::MultiTopologyId(ids) => encode_mt_id(&ids, dst),
            Self::NodeFlags(v) | Self::SrmsPreference(v) => dst.put_u8(v),
            Self::Opaque(b) | Self::IsisAreaId(b) | Self::SrCapabilities(b) | Self::SrLocalBlock(b) => {
                dst.put_slice(&b);
            }
            Self::Name(b) => dst.put_slice(&reverse_bytes(&b)),
            Self::Ipv4RouterId(v) => dst.put_slice(&v.octets()),
            Self::Ipv6RouterId(v) => dst.put_slice(&v.octets()),
            Self::SrAlgorithm(v) => dst.put_slice(&v),
        }
        len + 4
    }

    const fn code(&self) -> u16 {
        match self {
            Self::MultiTopologyId(_) => 263,
            Self::NodeFlags(_) => 1024,
            Self::Opaque(_) => 1025,
            Self::Name(_) => 1026,
            Self::IsisAreaId(_) => 1027,
            Self::Ipv4RouterId(_) => 1028,
            Self::Ipv6RouterId(_) => 1029,
            Self::SrCapabilities(_) => 1034,
            Self::SrAlgorithm(_) => 1035,
            Self::SrLocalBlock(_) => 1036,
            Self::SrmsPreference(_) => 1037,
        }
    }

    fn encoded_len(&self) -> usize {
        4 + match self {
            Self::MultiTopologyId(ids) => ids.len() * 2,
            Self::NodeFlags(_) | Self::SrmsPreference(_) => 1,
            Self::Opaque(b) | Self::IsisAreaId(b) | Self::SrCapabilities(b) | Self::SrLocalBlock(b) => {
                b.len()
            }
            Self::Name(b) => b.len(),
            Self::Ipv4RouterId(_) => 4,
            Self::Ipv6RouterId(_) => 16,
            Self::SrAlgorithm(v) => v.len(),
        }
    }
}

// ---------------------------------------------------------------- Link ----

/// Link attribute sub-TLVs (RFC 7752 Section 3.3.2, RFC 7471 performance metrics)
#[derive(Clone, Debug, PartialEq)]
pub enum LinkAttr {
    RemoteIpv4RouterId(Ipv4Addr),
    RemoteIpv6RouterId(Ipv6Addr),
    AdminGroup(u32),
    MaxLinkBandwidth(f32),
    MaxReservableLinkBandwidth(f32),
    UnreservedBandwidth([f32; 8]),
    TeDefaultMetric(u32),
    LinkProtectionType(u16),
    MplsProtocolMask(u8),
    IgpMetric(IgpMetric),
    SharedRiskLinkGroup(Vec<u32>),
    Opaque(Bytes),
    Name(Bytes),
    SrAdjacencySid { flags: u8, weight: u8, sid: SidLabel },
    SrLanAdjacencySid(Bytes),
    /// Peer-Node-SID (RFC 9086 Section 5)
    PeerNodeSid { flags: u8, weight: u8, sid: SidLabel },
    /// Peer-Adj-SID (RFC 9086 Section 5)
    PeerAdjSid { flags: u8, weight: u8, sid: SidLabel },
    /// Peer-Set-SID (RFC 9086 Section 5)
    PeerSetSid { flags: u8, weight: u8, sid: SidLabel },
    UnidirectionalLinkDelay { anomalous: bool, microseconds: u32 },
    MinMaxUnidirectionalLinkDelay { anomalous: bool, min: u32, max: u32 },
    UnidirectionalDelayVariation(u32),
    UnidirectionalLinkLoss { anomalous: bool, percent: f64 },
    UnidirectionalResidualBandwidth(f32),
    UnidirectionalAvailableBandwidth(f32),
    UnidirectionalUtilizedBandwidth(f32),
    L2BundleMember(Bytes),
}

/// IGP-Metric value, whose width depends on the IGP that produced it
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IgpMetric {
    IsisSmall(u8),
    Ospf(u16),
    IsisWide(u32),
}

impl IgpMetric {
    fn decode(value: &Bytes) -> Result<Self, Error> {
        match value.len() {
            1 => Ok(Self::IsisSmall(value[0])),
            2 => Ok(Self::Ospf(u16::from_be_bytes(value[..2].try_into().unwrap()))),
            3 => {
                let v = (u32::from(value[0]) << 16) | (u32::from(value[1]) << 8) | u32::from(value[2]);
                Ok(Self::IsisWide(v))
            }
            _ => Err(Error::MalformedLinkState(
                "IGP-Metric",
                "length must be 1 (IS-IS narrow), 2 (OSPF), or 3 (IS-IS wide) octets",
            )),
        }
    }

    fn encode(self, dst: &mut bytes::BytesMut) -> usize {
        match self {
            Self::IsisSmall(v) => {
                dst.put_u8(v);
                1
            }
            Self::Ospf(v) => {
                dst.put_u16(v);
                2
            }
            Self::IsisWide(v) => {
                let b = v.to_be_bytes();
                dst.put_slice(&b[1..4]);
                3
            }
        }
    }

    const fn encoded_len(self) -> usize {
        match self {
            Self::IsisSmall(_) => 1,
            Self::Ospf(_) => 2,
            Self::IsisWide(_) => 3,
        }
    }
}

fn decode_f32(value: &mut Bytes) -> Result<f32, Error> {
    require_len("bandwidth", value, 4)?;
    Ok(f32::from_bits(value.get_u32()))
}

fn decode_24bit_delay(value: &mut Bytes) -> Result<(bool, u32), Error> {
    require_len("delay", value, 4)?;
    let raw = value.get_u32();
    Ok((raw & 0x8000_0000 != 0, raw & 0x00FF_FFFF))
}

fn decode_24bit_loss(value: &mut Bytes) -> Result<(bool, f64), Error> {
    require_len("link-loss", value, 4)?;
    let raw = value.get_u32();
    let anomalous = raw & 0x8000_0000 != 0;
    let units = raw & 0x00FF_FFFF;
    if units > LOSS_MAX_UNITS {
        return Err(Error::MalformedLinkState(
            "Unidirectional-Link-Loss",
            "value exceeds 2^24-2 units",
        ));
    }
    Ok((anomalous, f64::from(units) * LOSS_UNIT))
}

impl LinkAttr {
    #[allow(clippy::too_many_lines)]
    fn try_decode(
        tlv_type: u16,
        value: &mut Bytes,
        protocol_hint: ProtocolId,
    ) -> Result<Option<Self>, Error> {
        Ok(Some(match tlv_type {
            1030 => Self::RemoteIpv4RouterId(decode_ipv4(value)?),
            1031 => Self::RemoteIpv6RouterId(decode_ipv6(value)?),
            1088 => {
                require_len("Administrative-Group", value, 4)?;
                Self::AdminGroup(value.get_u32())
            }
            1089 => Self::MaxLinkBandwidth(decode_f32(value)?),
            1090 => Self::MaxReservableLinkBandwidth(decode_f32(value)?),
            1091 => {
                require_len("Unreserved-Bandwidth", value, 32)?;
                let mut bw = [0f32; 8];
                for slot in &mut bw {
                    *slot = f32::from_bits(value.get_u32());
                }
                Self::UnreservedBandwidth(bw)
            }
            1092 => {
                require_len("TE-Default-Metric", value, 4)?;
                Self::TeDefaultMetric(value.get_u32())
            }
            1093 => {
                require_len("Link-Protection-Type", value, 2)?;
                Self::LinkProtectionType(value.get_u16())
            }
            1094 => {
                require_len("MPLS-Protocol-Mask", value, 1)?;
                Self::MplsProtocolMask(value.get_u8())
            }
            1095 => Self::IgpMetric(IgpMetric::decode(value)?),
            1096 => {
                if value.is_empty() || value.len() % 4 != 0 {
                    return Err(Error::MalformedLinkState(
                        "Shared-Risk-Link-Group",
                        "length must be a positive multiple of 4 octets",
                    ));
                }
                let mut groups = Vec::with_capacity(value.len() / 4);
                while value.has_remaining() {
                    groups.push(value.get_u32());
                }
                Self::SharedRiskLinkGroup(groups)
            }
            1097 => Self::Opaque(value.split_to(value.len())),
            1098 => Self::Name(reverse_bytes(&value.split_to(value.len()))),
            1099 => {
                require_sid_tlv_len("SR-Adjacency-SID", value)?;
                let flags = value.get_u8();
                let weight = value.get_u8();
                let _reserved = value.get_u16();
                let sid = SidLabel::decode(&value.split_to(value.len()))?;
                let _ = protocol_hint; // flag-bit meaning differs IS-IS vs OSPF; raw byte preserved
                Self::SrAdjacencySid { flags, weight, sid }
            }
            1100 => Self::SrLanAdjacencySid(value.split_to(value.len())),
            1101 => {
                require_sid_tlv_len("Peer-Node-SID", value)?;
                let flags = value.get_u8();
                let weight = value.get_u8();
                let _reserved = value.get_u16();
                let sid = SidLabel::decode(&value.split_to(value.len()))?;
                Self::PeerNodeSid { flags, weight, sid }
            }
            1102 => {
                require_sid_tlv_len("Peer-Adj-SID", value)?;
                let flags = value.get_u8();
                let weight = value.get_u8();
                let _reserved = value.get_u16();
                let sid = SidLabel::decode(&value.split_to(value.len()))?;
                Self::PeerAdjSid { flags, weight, sid }
            }
            1103 => {
                require_sid_tlv_len("Peer-Set-SID", value)?;
                let flags = value.get_u8();
                let weight = value.get_u8();
                let _reserved = value.get_u16();
                let sid = SidLabel::decode(&value.split_to(value.len()))?;
                Self::PeerSetSid { flags, weight, sid }
            }
            1114 => {
                let (anomalous, microseconds) = decode_24bit_delay(value)?;
                Self::UnidirectionalLinkDelay {
                    anomalous,
                    microseconds,
                }
            }
            1115 => {
                require_len("Min/Max-Unidirectional-Link-Delay", value, 8)?;
                let min_raw = value.get_u32();
                let max_raw = value.get_u32();
                Self::MinMaxUnidirectionalLinkDelay {
                    anomalous: min_raw & 0x8000_0000 != 0,
                    min: min_raw & 0x00FF_FFFF,
                    max: max_raw & 0x00FF_FFFF,
                }
            }
            1116 => {
                require_len("Unidirectional-Delay-Variation", value, 4)?;
                Self::UnidirectionalDelayVariation(value.get_u32() & 0x00FF_FFFF)
            }
            1117 => {
                let (anomalous, percent) = decode_24bit_loss(value)?;
                Self::UnidirectionalLinkLoss { anomalous, percent }
            }
            1118 => Self::UnidirectionalResidualBandwidth(decode_f32(value)?),
            1119 => Self::UnidirectionalAvailableBandwidth(decode_f32(value)?),
            1120 => Self::UnidirectionalUtilizedBandwidth(decode_f32(value)?),
            1172 => Self::L2BundleMember(value.split_to(value.len())),
            _ => return Ok(None),
        }))
    }

    #[allow(clippy::too_many_lines)]
    fn encode(self, dst: &mut bytes::BytesMut) -> usize {
        let (code, len) = (self.code(), self.encoded_len() - 4);
        dst.put_u16(code);
        dst.put_u16(u16::try_from(len).expect("link attribute length overflow"));
        match self {
            Self::RemoteIpv4RouterId(v) => dst.put_slice(&v.octets()),
            Self::RemoteIpv6RouterId(v) => dst.put_slice(&v.octets()),
            Self::AdminGroup(v) | Self::TeDefaultMetric(v) => dst.put_u32(v),
            Self::MaxLinkBandwidth(v)
            | Self::MaxReservableLinkBandwidth(v)
            | Self::UnidirectionalResidualBandwidth(v)
            | Self::UnidirectionalAvailableBandwidth(v)
            | Self::UnidirectionalUtilizedBandwidth(v) => dst.put_u32(v.to_bits()),
            Self::UnreservedBandwidth(bw) => {
                for v in bw {
                    dst.put_u32(v.to_bits());
                }
            }
            Self::LinkProtectionType(v) => dst.put_u16(v),
            Self::MplsProtocolMask(v) => dst.put_u8(v),
            Self::IgpMetric(m) => {
                m.encode(dst);
            }
            Self::SharedRiskLinkGroup(groups) => {
                for g in groups {
                    dst.put_u32(g);
                }
            }
            Self::Opaque(b) | Self::SrLanAdjacencySid(b) | Self::L2BundleMember(b) => {
                dst.put_slice(&b);
            }
            Self::Name(b) => dst.put_slice(&reverse_bytes(&b)),
            Self::SrAdjacencySid { flags, weight, sid }
            | Self::PeerNodeSid { flags, weight, sid }
            | Self::PeerAdjSid { flags, weight, sid }
            | Self::PeerSetSid { flags, weight, sid } => {
                dst.put_u8(flags);
                dst.put_u8(weight);
                dst.put_u16(0);
                sid.encode(dst);
            }
            Self::UnidirectionalLinkDelay {
                anomalous,
                microseconds,
            } => {
                let bit = u32::from(anomalous) << 31;
                dst.put_u32(bit | (microseconds & 0x00FF_FFFF));
            }
            Self::MinMaxUnidirectionalLinkDelay { anomalous, min, max } => {
                let bit = u32::from(anomalous) << 31;
                dst.put_u32(bit | (min & 0x00FF_FFFF));
                dst.put_u32(max & 0x00FF_FFFF);
            }
            Self::UnidirectionalDelayVariation(v) => dst.put_u32(v & 0x00FF_FFFF),
            Self::UnidirectionalLinkLoss { anomalous, percent } => {
                let units = (percent / LOSS_UNIT).round() as u32;
                let bit = u32::from(anomalous) << 31;
                dst.put_u32(bit | (units & 0x00FF_FFFF));
            }
        }
        len + 4
    }

    const fn code(&self) -> u16 {
        match self {
            Self::RemoteIpv4RouterId(_) => 1030,
            Self::RemoteIpv6RouterId(_) => 1031,
            Self::AdminGroup(_) => 1088,
            Self::MaxLinkBandwidth(_) => 1089,
            Self::MaxReservableLinkBandwidth(_) => 1090,
            Self::UnreservedBandwidth(_) => 1091,
            Self::TeDefaultMetric(_) => 1092,
            Self::LinkProtectionType(_) => 1093,
            Self::MplsProtocolMask(_) => 1094,
            Self::IgpMetric(_) => 1095,
            Self::SharedRiskLinkGroup(_) => 1096,
            Self::Opaque(_) => 1097,
            Self::Name(_) => 1098,
            Self::SrAdjacencySid { .. } => 1099,
            Self::SrLanAdjacencySid(_) => 1100,
            Self::PeerNodeSid { .. } => 1101,
            Self::PeerAdjSid { .. } => 1102,
            Self::PeerSetSid { .. } => 1103,
            Self::UnidirectionalLinkDelay { .. } => 1114,
            Self::MinMaxUnidirectionalLinkDelay { .. } => 1115,
            Self::UnidirectionalDelayVariation(_) => 1116,
            Self::UnidirectionalLinkLoss { .. } => 1117,
            Self::UnidirectionalResidualBandwidth(_) => 1118,
            Self::UnidirectionalAvailableBandwidth(_) => 1119,
            Self::UnidirectionalUtilizedBandwidth(_) => 1120,
            Self::L2BundleMember(_) => 1172,
        }
    }

    fn encoded_len(&self) -> usize {
        4 + match self {
            Self::RemoteIpv4RouterId(_) => 4,
            Self::RemoteIpv6RouterId(_) => 16,
            Self::AdminGroup(_) | Self::TeDefaultMetric(_) => 4,
            Self::MaxLinkBandwidth(_)
            | Self::MaxReservableLinkBandwidth(_)
            | Self::UnidirectionalResidualBandwidth(_)
            | Self::UnidirectionalAvailableBandwidth(_)
            | Self::UnidirectionalUtilizedBandwidth(_) => 4,
            Self::UnreservedBandwidth(_) => 32,
            Self::LinkProtectionType(_) => 2,
            Self::MplsProtocolMask(_) => 1,
            Self::IgpMetric(m) => m.encoded_len(),
            Self::SharedRiskLinkGroup(g) => g.len() * 4,
            Self::Opaque(b) | Self::SrLanAdjacencySid(b) | Self::L2BundleMember(b) => b.len(),
            Self::Name(b) => b.len(),
            Self::SrAdjacencySid { sid, .. }
            | Self::PeerNodeSid { sid, .. }
            | Self::PeerAdjSid { sid, .. }
            | Self::PeerSetSid { sid, .. } => 4 + sid.encoded_len(),
            Self::UnidirectionalLinkDelay { .. }
            | Self::UnidirectionalDelayVariation(_)
            | Self::UnidirectionalLinkLoss { .. } => 4,
            Self::MinMaxUnidirectionalLinkDelay { .. } => 8,
        }
    }
}

// -------------------------------------------------------------- Prefix ----

/// Prefix attribute sub-TLVs (RFC 7752 Section 3.3.3)
#[derive(Clone, Debug, PartialEq)]
pub enum PrefixAttr {
    IgpFlags(u8),
    IgpRouteTag(Vec<u32>),
    IgpExtendedRouteTag(Vec<u64>),
    PrefixMetric(u32),
    OspfForwardingAddress(IpAddr),
    Opaque(Bytes),
    PrefixSid { flags: u8, algorithm: u8, sid: SidLabel },
    PrefixFlags(PrefixFlags),
    SourceRouterId(IpAddr),
}

/// Prefix-Flags (RFC 7752 Section 3.3.3.1), whose bit layout is IGP-specific.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PrefixFlags {
    Ospfv2 { attach: bool, node: bool, local_address: bool, no_unicast: bool },
    Ospfv3 { propagate: bool, node: bool, local_address: bool },
    Isis { external_prefix: bool, re_advertisement: bool, node: bool },
}

impl PrefixFlags {
    fn decode(raw: u8, protocol_hint: ProtocolId) -> Self {
        match protocol_hint {
            ProtocolId::Ospfv2 => Self::Ospfv2 {
                attach: raw & 0x80 != 0,
                node: raw & 0x40 != 0,
                local_address: raw & 0x20 != 0,
                no_unicast: raw & 0x10 != 0,
            },
            ProtocolId::Ospfv3 => Self::Ospfv3 {
                propagate: raw & 0x80 != 0,
                node: raw & 0x40 != 0,
                local_address: raw & 0x20 != 0,
            },
            _ => Self::Isis {
                external_prefix: raw & 0x80 != 0,
                re_advertisement: raw & 0x40 != 0,
                node: raw & 0x20 != 0,
            },
        }
    }

    const fn encode_raw(self) -> u8 {
        match self {
            Self::Ospfv2 {
                attach,
                node,
                local_address,
                no_unicast,
            } => {
                (attach as u8) << 7
                    | (node as u8) << 6
                    | (local_address as u8) << 5
                    | (no_unicast as u8) << 4
            }
            Self::Ospfv3 {
                propagate,
                node,
                local_address,
            } => (propagate as u8) << 7 | (node as u8) << 6 | (local_address as u8) << 5,
            Self::Isis {
                external_prefix,
                re_advertisement,
                node,
            } => (external_prefix as u8) << 7 | (re_advertisement as u8) << 6 | (node as u8) << 5,
        }
    }
}

impl PrefixAttr {
    fn try_decode(
        tlv_type: u16,
        value: &mut Bytes,
        protocol_hint: ProtocolId,
    ) -> Result<Option<Self>, Error> {
        Ok(Some(match tlv_type {
            1152 => {
                require_len("IGP-Flags", value, 1)?;
                Self::IgpFlags(value.get_u8())
            }
            1153 => {
                if value.is_empty() || value.len() % 4 != 0 {
                    return Err(Error::MalformedLinkState(
                        "IGP-Route-Tag",
                        "length must be a positive multiple of 4 octets",
                    ));
                }
                let mut tags = Vec::with_capacity(value.len() / 4);
                while value.has_remaining() {
                    tags.push(value.get_u32());
                }
                Self::IgpRouteTag(tags)
            }
            1154 => {
                if value.is_empty() || value.len() % 8 != 0 {
                    return Err(Error::MalformedLinkState(
                        "IGP-Extended-Route-Tag",
                        "length must be a positive multiple of 8 octets",
                    ));
                }
                let mut tags = Vec::with_capacity(value.len() / 8);
                while value.has_remaining() {
                    tags.push(value.get_u64());
                }
                Self::IgpExtendedRouteTag(tags)
            }
            1155 => {
                require_len("Prefix-Metric", value, 4)?;
                Self::PrefixMetric(value.get_u32())
            }
            1156 => {
                let addr = match value.len() {
                    4 => IpAddr::V4(decode_ipv4(value)?),
                    16 => IpAddr::V6(decode_ipv6(value)?),
                    _ => {
                        return Err(Error::MalformedLinkState(
                            "OSPF-Forwarding-Address",
                            "length must be 4 or 16 octets",
                        ))
                    }
                };
                Self::OspfForwardingAddress(addr)
            }
            1157 => Self::Opaque(value.split_to(value.len())),
            1158 => {
                require_sid_tlv_len("Prefix-SID", value)?;
                let flags = value.get_u8();
                let algorithm = value.get_u8();
                let _reserved = value.get_u16();
                let sid = SidLabel::decode(&value.split_to(value.len()))?;
                Self::PrefixSid { flags, algorithm, sid }
            }
            1170 => {
                require_len("Prefix-Flags", value, 1)?;
                Self::PrefixFlags(PrefixFlags::decode(value.get_u8(), protocol_hint))
            }
            1171 => {
                let addr = match value.len() {
                    4 => IpAddr::V4(decode_ipv4(value)?),
                    16 => IpAddr::V6(decode_ipv6(value)?),
                    _ => {
                        return Err(Error::MalformedLinkState(
                            "Source-Router-ID",
                            "length must be 4 or 16 octets",
                        ))
                    }
                };
                Self::SourceRouterId(addr)
            }
            _ => return Ok(None),
        }))
    }

    fn encode(self, dst: &mut bytes::BytesMut) -> usize {
        let (code, len) = (self.code(), self.encoded_len() - 4);
        dst.put_u16(code);
        dst.put_u16(u16::try_from(len).expect("prefix attribute length overflow"));
        match self {
            Self::IgpFlags(v) => dst.put_u8(v),
            Self::IgpRouteTag(tags) => {
                for t in tags {
                    dst.put_u32(t);
                }
            }
            Self::IgpExtendedRouteTag(tags) => {
                for t in tags {
                    dst.put_u64(t);
                }
            }
            Self::PrefixMetric(v) => dst.put_u32(v),
            Self::OspfForwardingAddress(addr) | Self::SourceRouterId(addr) => match addr {
                IpAddr::V4(v) => dst.put_slice(&v.octets()),
                IpAddr::V6(v) => dst.put_slice(&v.octets()),
            },
            Self::Opaque(b) => dst.put_slice(&b),
            Self::PrefixSid {
                flags,
                algorithm,
                sid,
            } => {
                dst.put_u8(flags);
                dst.put_u8(algorithm);
                dst.put_u16(0);
                sid.encode(dst);
            }
            Self::PrefixFlags(f) => dst.put_u8(f.encode_raw()),
        }
        len + 4
    }

    const fn code(&self) -> u16 {
        match self {
            Self::IgpFlags(_) => 1152,
            Self::IgpRouteTag(_) => 1153,
            Self::IgpExtendedRouteTag(_) => 1154,
            Self::PrefixMetric(_) => 1155,
            Self::OspfForwardingAddress(_) => 1156,
            Self::Opaque(_) => 1157,
            Self::PrefixSid { .. } => 1158,
            Self::PrefixFlags(_) => 1170,
            Self::SourceRouterId(_) => 1171,
        }
    }

    fn encoded_len(&self) -> usize {
        4 + match self {
            Self::IgpFlags(_) | Self::PrefixFlags(_) => 1,
            Self::IgpRouteTag(t) => t.len() * 4,
            Self::IgpExtendedRouteTag(t) => t.len() * 8,
            Self::PrefixMetric(_) => 4,
            Self::OspfForwardingAddress(IpAddr::V4(_)) | Self::SourceRouterId(IpAddr::V4(_)) => 4,
            Self::OspfForwardingAddress(IpAddr::V6(_)) | Self::SourceRouterId(IpAddr::V6(_)) => 16,
            Self::Opaque(b) => b.len(),
            Self::PrefixSid { sid, .. } => 4 + sid.encoded_len(),
        }
    }
}

fn require_len(name: &'static str, value: &Bytes, expected: usize) -> Result<(), Error> {
    if value.len() == expected {
        Ok(())
    } else {
        Err(Error::InternalLength(name, value.len().cmp(&expected)))
    }
}

/// A 1-octet flags field + 1-octet field (weight/algorithm) + 2-octet reserved +
/// SID/Label, which is 3 octets (label) or 4 (index) -- 7 or 8 octets total.
fn require_sid_tlv_len(name: &'static str, value: &Bytes) -> Result<(), Error> {
    if matches!(value.len(), 7 | 8) {
        Ok(())
    } else {
        Err(Error::MalformedLinkState(
            name,
            "length must be 7 (3-octet label) or 8 (4-octet index) octets",
        ))
    }
}

fn decode_ipv4(value: &mut Bytes) -> Result<Ipv4Addr, Error> {
    require_len("IPv4 address", value, 4)?;
    Ok(Ipv4Addr::from(value.get_u32()))
}

fn decode_ipv6(value: &mut Bytes) -> Result<Ipv6Addr, Error> {
    require_len("IPv6 address", value, 16)?;
    let mut octets = [0u8; 16];
    value.copy_to_slice(&mut octets);
    Ok(Ipv6Addr::from(octets))
}

fn reverse_bytes(b: &Bytes) -> Bytes {
    let mut v = b.to_vec();
    v.reverse();
    Bytes::from(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_link_bandwidth_roundtrip() {
        let attr = LinkStateAttribute(vec![Tlv::Link(LinkAttr::MaxLinkBandwidth(1e9))]);
        let mut buf = bytes::BytesMut::new();
        let len = attr.clone().encode(&mut buf);
        assert_eq!(len, attr.encoded_len());
        let mut src = buf.freeze();
        let decoded = LinkStateAttribute::decode(&mut src, ProtocolId::IsisL2).unwrap();
        assert_eq!(decoded.max_link_bandwidth(), Some(1e9));
    }

    #[test]
    fn test_unknown_tlv_is_fatal() {
        let mut src = Bytes::from_static(&[0x27, 0x0F, 0x00, 0x01, 0xAB]); // type 9999
        assert!(LinkStateAttribute::decode(&mut src, ProtocolId::IsisL2).is_err());
    }

    #[test]
    fn test_admin_group_wrong_length_is_malformed() {
        let mut value = Bytes::from_static(&[1, 2, 3]); // 3 octets, not 4
        assert!(LinkAttr::try_decode(1088, &mut value, ProtocolId::IsisL2).is_err());
    }

    #[test]
    fn test_igp_metric_length_dispatch() {
        assert!(matches!(
            IgpMetric::decode(&Bytes::from_static(&[5])).unwrap(),
            IgpMetric::IsisSmall(5)
        ));
        assert!(matches!(
            IgpMetric::decode(&Bytes::from_static(&[0, 10])).unwrap(),
            IgpMetric::Ospf(10)
        ));
        assert!(matches!(
            IgpMetric::decode(&Bytes::from_static(&[0, 0, 10])).unwrap(),
            IgpMetric::IsisWide(10)
        ));
        assert!(IgpMetric::decode(&Bytes::from_static(&[0, 0, 0, 10])).is_err());
    }

    #[test]
    fn test_unidirectional_link_loss_scaling() {
        let mut value = Bytes::from_static(&[0x00, 0x00, 0x01, 0x00]); // 256 units
        let (anomalous, percent) = decode_24bit_loss(&mut value).unwrap();
        assert!(!anomalous);
        assert!((percent - 256.0 * LOSS_UNIT).abs() < 1e-12);
    }

    #[test]
    fn test_prefix_flags_protocol_dependent_layout() {
        let ospfv2 = PrefixFlags::decode(0x80, ProtocolId::Ospfv2);
        assert!(matches!(ospfv2, PrefixFlags::Ospfv2 { attach: true, .. }));
        let isis = PrefixFlags::decode(0x80, ProtocolId::IsisL2);
        assert!(matches!(
            isis,
            PrefixFlags::Isis {
                external_prefix: true,
                ..
            }
        ));
    }

    #[test]
    fn test_peer_node_sid_accepts_both_label_and_index_widths() {
        let mut label = Bytes::from_static(&[0, 0, 0, 0, 0x00, 0x01, 0x00]);
        let decoded = LinkAttr::try_decode(1101, &mut label, ProtocolId::Bgp)
            .unwrap()
            .unwrap();
        assert!(matches!(
            decoded,
            LinkAttr::PeerNodeSid {
                sid: SidLabel::Label(256),
                ..
            }
        ));

        let mut index = Bytes::from_static(&[0, 0, 0, 0, 0x00, 0x00, 0x01, 0x00]);
        let decoded = LinkAttr::try_decode(1102, &mut index, ProtocolId::Bgp)
            .unwrap()
            .unwrap();
        assert!(matches!(
            decoded,
            LinkAttr::PeerAdjSid {
                sid: SidLabel::Index(256),
                ..
            }
        ));
    }
}
