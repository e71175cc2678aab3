//! BGP-LS NLRI (RFC 7752 Section 3)
//!
//! Carried inside MP_REACH_NLRI/MP_UNREACH_NLRI for AFI=16388/SAFI=71. Every
//! NLRI names a Node, Link, or Prefix and is built from a protocol-id, an
//! 8-octet identifier, and one or more descriptor TLV blocks.

// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::endec::Component;
use crate::Error;
use bytes::{Buf, BufMut, Bytes};
use enum_primitive_derive::Primitive;
use num_traits::FromPrimitive;
use std::net::{Ipv4Addr, Ipv6Addr};

/// BGP-LS NLRI type (RFC 7752 Section 3.2)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Primitive)]
#[repr(u16)]
pub enum NlriType {
    Node = 1,
    Link = 2,
    Ipv4Prefix = 3,
    Ipv6Prefix = 4,
}

/// The IGP or overlay that sourced a piece of link-state information (RFC 7752 Section 3.2.1.3)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Primitive)]
#[repr(u8)]
pub enum ProtocolId {
    IsisL1 = 1,
    IsisL2 = 2,
    Ospfv2 = 3,
    Direct = 4,
    Static = 5,
    Ospfv3 = 6,
    Bgp = 7,
}

/// Top-level descriptor/NLRI TLV codes
#[derive(Copy, Clone, Debug, PartialEq, Eq, Primitive)]
#[repr(u16)]
enum TopTlv {
    LocalNodeDescriptors = 256,
    RemoteNodeDescriptors = 257,
}

/// A single BGP-LS NLRI
#[derive(Clone, Debug, PartialEq)]
pub struct LinkStateNlri {
    pub nlri_type: NlriType,
    pub protocol_id: ProtocolId,
    pub identifier: u64,
    pub local_node_descriptors: Vec<NodeDescriptor>,
    pub remote_node_descriptors: Vec<NodeDescriptor>,
    pub link_descriptors: Vec<LinkDescriptor>,
    pub prefix_descriptors: Vec<PrefixDescriptor>,
}

impl LinkStateNlri {
    /// The node-descriptor-derived protocol-id hint used by the enclosing
    /// BGP-LS attribute to disambiguate IS-IS/OSPF-dependent sub-TLVs.
    #[must_use]
    pub fn protocol_hint(&self) -> ProtocolId {
        self.protocol_id
    }
}

impl Component for LinkStateNlri {
    fn from_bytes(src: &mut Bytes) -> Result<Self, Error> {
        let nlri_type = src.get_u16();
        let nlri_type = NlriType::from_u16(nlri_type)
            .ok_or(Error::InternalType("NLRI type", nlri_type))?;
        let total_len = src.get_u16() as usize;
        let mut src = src.split_to(total_len);

        let protocol_id = src.get_u8();
        let protocol_id = ProtocolId::from_u8(protocol_id)
            .ok_or(Error::InternalType("protocol-id", u16::from(protocol_id)))?;
        let identifier = src.get_u64();

        let mut local_node_descriptors = Vec::new();
        let mut remote_node_descriptors = Vec::new();
        let mut link_descriptors = Vec::new();
        let mut prefix_descriptors = Vec::new();

        // Node NLRI carries only local node descriptors; Link NLRI carries
        // local+remote node descriptors plus link descriptors; Prefix NLRI
        // carries local node descriptors plus prefix descriptors.
        while src.has_remaining() {
            let tlv_type = src.get_u16();
            let tlv_len = src.get_u16() as usize;
            let mut value = src.split_to(tlv_len);
            match (nlri_type, TopTlv::from_u16(tlv_type)) {
                (_, Some(TopTlv::LocalNodeDescriptors)) => {
                    local_node_descriptors = decode_node_descriptors(&mut value)?;
                }
                (NlriType::Link, Some(TopTlv::RemoteNodeDescriptors)) => {
                    remote_node_descriptors = decode_node_descriptors(&mut value)?;
                }
                (NlriType::Link, None) => {
                    link_descriptors.push(LinkDescriptor::decode_one(tlv_type, &mut value)?);
                }
                (NlriType::Ipv4Prefix | NlriType::Ipv6Prefix, None) => {
                    prefix_descriptors.push(PrefixDescriptor::decode_one(
                        tlv_type, nlri_type, &mut value,
                    )?);
                }
                _ => {
                    return Err(Error::InternalType("NLRI descriptor TLV", tlv_type));
                }
            }
        }

        Ok(Self {
            nlri_type,
            protocol_id,
            identifier,
            local_node_descriptors,
            remote_node_descriptors,
            link_descriptors,
            prefix_descriptors,
        })
    }

    fn to_bytes(self, dst: &mut bytes::BytesMut) -> usize {
        dst.put_u16(self.nlri_type as u16);
        let len_pos = dst.len();
        dst.put_u16(0); // Placeholder for length
        let mut len = 0;
        len += self.protocol_id.to_bytes(dst);
        len += self.identifier.to_bytes(dst);
        len += encode_node_descriptors(
            TopTlv::LocalNodeDescriptors as u16,
            self.local_node_descriptors,
            dst,
        );
        if !self.remote_node_descriptors.is_empty() {
            len += encode_node_descriptors(
                TopTlv::RemoteNodeDescriptors as u16,
                self.remote_node_descriptors,
                dst,
            );
        }
        for d in self.link_descriptors {
            len += d.to_bytes(dst);
        }
        for d in self.prefix_descriptors {
            len += d.to_bytes(dst);
        }
        dst[len_pos..len_pos + 2]
            .copy_from_slice(&u16::try_from(len).expect("NLRI length overflow").to_be_bytes());
        len + 4
    }

    fn encoded_len(&self) -> usize {
        4 + 1
            + 8
            + 4
            + self
                .local_node_descriptors
                .iter()
                .map(Component::encoded_len)
                .sum::<usize>()
            + if self.remote_node_descriptors.is_empty() {
                0
            } else {
                4 + self
                    .remote_node_descriptors
                    .iter()
                    .map(Component::encoded_len)
                    .sum::<usize>()
            }
            + self
                .link_descriptors
                .iter()
                .map(Component::encoded_len)
                .sum::<usize>()
            + self
                .prefix_descriptors
                .iter()
                .map(Component::encoded_len)
                .sum::<usize>()
    }
}

fn decode_node_descriptors(src: &mut Bytes) -> Result<Vec<NodeDescriptor>, Error> {
    let mut out = Vec::new();
    while src.has_remaining() {
        out.push(NodeDescriptor::decode_one(src)?);
    }
    Ok(out)
}

fn encode_node_descriptors(
    wrapper_type: u16,
    descriptors: Vec<NodeDescriptor>,
    dst: &mut bytes::BytesMut,
) -> usize {
    dst.put_u16(wrapper_type);
    let len_pos = dst.len();
    dst.put_u16(0);
    let mut len = 0;
    for d in descriptors {
        len += d.to_bytes(dst);
    }
    dst[len_pos..len_pos + 2]
        .copy_from_slice(&u16::try_from(len).expect("node descriptors length overflow").to_be_bytes());
    len + 4
}

/// Node descriptor sub-TLV codes (RFC 7752 Section 3.2.1)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Primitive)]
#[repr(u16)]
enum NodeDescTlv {
    Asn = 512,
    BgpLsId = 513,
    OspfAreaId = 514,
    IgpRouterId = 515,
    BgpRouterId = 516,
    MemberAsn = 517,
}

/// One node descriptor sub-TLV
#[derive(Clone, Debug, PartialEq)]
pub enum NodeDescriptor {
    Asn(u32),
    BgpLsId(u32),
    OspfAreaId(u32),
    IgpRouterId(IgpRouterId),
    BgpRouterId(Ipv4Addr),
    MemberAsn(u32),
    Unknown(u16, Bytes),
}

impl NodeDescriptor {
    fn decode_one(src: &mut Bytes) -> Result<Self, Error> {
        let tlv_type = src.get_u16();
        let tlv_len = src.get_u16() as usize;
        let mut value = src.split_to(tlv_len);
        Ok(match NodeDescTlv::from_u16(tlv_type) {
            Some(NodeDescTlv::Asn) => Self::Asn(value.get_u32()),
            Some(NodeDescTlv::BgpLsId) => Self::BgpLsId(value.get_u32()),
            Some(NodeDescTlv::OspfAreaId) => Self::OspfAreaId(value.get_u32()),
            Some(NodeDescTlv::IgpRouterId) => Self::IgpRouterId(IgpRouterId::decode(&value)?),
            Some(NodeDescTlv::BgpRouterId) => Self::BgpRouterId(Ipv4Addr::from_bytes(&mut value)?),
            Some(NodeDescTlv::MemberAsn) => Self::MemberAsn(value.get_u32()),
            None => Self::Unknown(tlv_type, value),
        })
    }
}

impl Component for NodeDescriptor {
    fn from_bytes(src: &mut Bytes) -> Result<Self, Error> {
        Self::decode_one(src)
    }

    fn to_bytes(self, dst: &mut bytes::BytesMut) -> usize {
        let (code, len) = match &self {
            Self::Asn(_) => (NodeDescTlv::Asn as u16, 4),
            Self::BgpLsId(_) => (NodeDescTlv::BgpLsId as u16, 4),
            Self::OspfAreaId(_) => (NodeDescTlv::OspfAreaId as u16, 4),
            Self::IgpRouterId(v) => (NodeDescTlv::IgpRouterId as u16, v.encoded_len()),
            Self::BgpRouterId(_) => (NodeDescTlv::BgpRouterId as u16, 4),
            Self::MemberAsn(_) => (NodeDescTlv::MemberAsn as u16, 4),
            Self::Unknown(code, data) => (*code, data.len()),
        };
        dst.put_u16(code);
        dst.put_u16(u16::try_from(len).expect("node descriptor length overflow"));
        match self {
            Self::Asn(v) | Self::BgpLsId(v) | Self::OspfAreaId(v) | Self::MemberAsn(v) => {
                dst.put_u32(v);
            }
            Self::IgpRouterId(v) => {
                v.encode(dst);
            }
            Self::BgpRouterId(v) => {
                v.to_bytes(dst);
            }
            Self::Unknown(_, data) => dst.put_slice(&data),
        }
        len + 4
    }

    fn encoded_len(&self) -> usize {
        4 + match self {
            Self::Asn(_) | Self::BgpLsId(_) | Self::OspfAreaId(_) | Self::MemberAsn(_) => 4,
            Self::IgpRouterId(v) => v.encoded_len(),
            Self::BgpRouterId(_) => 4,
            Self::Unknown(_, data) => data.len(),
        }
    }
}

/// IGP-Router-ID sub-field of the node descriptor (RFC 7752 Section 3.2.1.4)
///
/// Length on the wire disambiguates the variant: 6 octets is an IS-IS
/// non-pseudonode system-ID, 7 octets is an IS-IS pseudonode (system-ID plus
/// a trailing PSN octet), 4 octets is an OSPF non-pseudonode router-ID, and 8
/// octets is an OSPF pseudonode (router-ID plus a DR interface address).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IgpRouterId {
    IsisNonPseudonode([u8; 6]),
    IsisPseudonode { iso_node_id: [u8; 6], psn: u8 },
    OspfNonPseudonode(u32),
    OspfPseudonode { router_id: u32, dr_address: u32 },
}

impl IgpRouterId {
    fn decode(src: &Bytes) -> Result<Self, Error> {
        match src.len() {
            6 => {
                let mut iso = [0u8; 6];
                iso.copy_from_slice(&src[..6]);
                Ok(Self::IsisNonPseudonode(iso))
            }
            7 => {
                let mut iso = [0u8; 6];
                iso.copy_from_slice(&src[..6]);
                // The PSN octet is the 7th octet of the input, never folded
                // into a zero-padded 8-octet integer.
                let psn = src[6];
                Ok(Self::IsisPseudonode {
                    iso_node_id: iso,
                    psn,
                })
            }
            4 => Ok(Self::OspfNonPseudonode(u32::from_be_bytes(
                src[..4].try_into().unwrap(),
            ))),
            8 => Ok(Self::OspfPseudonode {
                router_id: u32::from_be_bytes(src[..4].try_into().unwrap()),
                dr_address: u32::from_be_bytes(src[4..8].try_into().unwrap()),
            }),
            other => Err(Error::MalformedLinkState(
                "IGP-Router-ID",
                match other {
                    0..=3 | 5 | 9.. => "length must be 4, 6, 7, or 8 octets",
                    _ => unreachable!(),
                },
            )),
        }
    }

    fn encode(self, dst: &mut bytes::BytesMut) {
        match self {
            Self::IsisNonPseudonode(iso) => dst.put_slice(&iso),
            Self::IsisPseudonode { iso_node_id, psn } => {
                dst.put_slice(&iso_node_id);
                dst.put_u8(psn);
            }
            Self::OspfNonPseudonode(id) => dst.put_u32(id),
            Self::OspfPseudonode {
                router_id,
                dr_address,
            } => {
                dst.put_u32(router_id);
                dst.put_u32(dr_address);
            }
        }
    }

    fn encoded_len(&self) -> usize {
        match self {
            Self::IsisNonPseudonode(_) => 6,
            Self::IsisPseudonode { .. } => 7,
            Self::OspfNonPseudonode(_) => 4,
            Self::OspfPseudonode { .. } => 8,
        }
    }
}

/// Link descriptor sub-TLV codes (RFC 7752 Section 3.2.2)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Primitive)]
#[repr(u16)]
enum LinkDescTlv {
    LinkLocalRemoteId = 258,
    Ipv4InterfaceAddress = 259,
    Ipv4NeighborAddress = 260,
    Ipv6InterfaceAddress = 261,
    Ipv6NeighborAddress = 262,
    MultiTopologyId = 263,
}

/// One link descriptor sub-TLV
#[derive(Clone, Debug, PartialEq)]
pub enum LinkDescriptor {
    LinkLocalRemoteId { local: u32, remote: u32 },
    Ipv4InterfaceAddress(Ipv4Addr),
    Ipv4NeighborAddress(Ipv4Addr),
    Ipv6InterfaceAddress(Ipv6Addr),
    Ipv6NeighborAddress(Ipv6Addr),
    MultiTopologyId(Vec<u16>),
    Unknown(u16, Bytes),
}

impl LinkDescriptor {
    fn decode_one(tlv_type: u16, value: &mut Bytes) -> Result<Self, Error> {
        Ok(match LinkDescTlv::from_u16(tlv_type) {
            Some(LinkDescTlv::LinkLocalRemoteId) => {
                if value.len() != 8 {
                    return Err(Error::MalformedLinkState(
                        "Link-Local/Remote-Identifiers",
                        "length must be 8 octets",
                    ));
                }
                Self::LinkLocalRemoteId {
                    local: value.get_u32(),
                    remote: value.get_u32(),
                }
            }
            Some(LinkDescTlv::Ipv4InterfaceAddress) => {
                Self::Ipv4InterfaceAddress(Ipv4Addr::from_bytes(value)?)
            }
            Some(LinkDescTlv::Ipv4NeighborAddress) => {
                Self::Ipv4NeighborAddress(Ipv4Addr::from_bytes(value)?)
            }
            Some(LinkDescTlv::Ipv6InterfaceAddress) => {
                Self::Ipv6InterfaceAddress(Ipv6Addr::from_bytes(value)?)
            }
            Some(LinkDescTlv::Ipv6NeighborAddress) => {
                Self::Ipv6NeighborAddress(Ipv6Addr::from_bytes(value)?)
            }
            Some(LinkDescTlv::MultiTopologyId) => {
                Self::MultiTopologyId(decode_multi_topology_id(value)?)
            }
            None => Self::Unknown(tlv_type, value.split_to(value.len())),
        })
    }
}

fn decode_multi_topology_id(value: &mut Bytes) -> Result<Vec<u16>, Error> {
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

impl Component for LinkDescriptor {
    fn from_bytes(src: &mut Bytes) -> Result<Self, Error> {
        let tlv_type = src.get_u16();
        let tlv_len = src.get_u16() as usize;
        let mut value = src.split_to(tlv_len);
        Self::decode_one(tlv_type, &mut value)
    }

    fn to_bytes(self, dst: &mut bytes::BytesMut) -> usize {
        let code = match &self {
            Self::LinkLocalRemoteId { .. } => LinkDescTlv::LinkLocalRemoteId as u16,
            Self::Ipv4InterfaceAddress(_) => LinkDescTlv::Ipv4InterfaceAddress as u16,
            Self::Ipv4NeighborAddress(_) => LinkDescTlv::Ipv4NeighborAddress as u16,
            Self::Ipv6InterfaceAddress(_) => LinkDescTlv::Ipv6InterfaceAddress as u16,
            Self::Ipv6NeighborAddress(_) => LinkDescTlv::Ipv6NeighborAddress as u16,
            Self::MultiTopologyId(_) => LinkDescTlv::MultiTopologyId as u16,
            Self::Unknown(code, _) => *code,
        };
        let len = self.encoded_len() - 4;
        dst.put_u16(code);
        dst.put_u16(u16::try_from(len).expect("link descriptor length overflow"));
        match self {
            Self::LinkLocalRemoteId { local, remote } => {
                dst.put_u32(local);
                dst.put_u32(remote);
            }
            Self::Ipv4InterfaceAddress(v) | Self::Ipv4NeighborAddress(v) => {
                v.to_bytes(dst);
            }
            Self::Ipv6InterfaceAddress(v) | Self::Ipv6NeighborAddress(v) => {
                v.to_bytes(dst);
            }
            Self::MultiTopologyId(ids) => {
                for id in ids {
                    dst.put_u16(id & 0x0FFF);
                }
            }
            Self::Unknown(_, data) => dst.put_slice(&data),
        }
        len + 4
    }

    fn encoded_len(&self) -> usize {
        4 + match self {
            Self::LinkLocalRemoteId { .. } => 8,
            Self::Ipv4InterfaceAddress(_) | Self::Ipv4NeighborAddress(_) => 4,
            Self::Ipv6InterfaceAddress(_) | Self::Ipv6NeighborAddress(_) => 16,
            Self::MultiTopologyId(ids) => ids.len() * 2,
            Self::Unknown(_, data) => data.len(),
        }
    }
}

/// Prefix descriptor sub-TLV codes (RFC 7752 Section 3.2.3)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Primitive)]
#[repr(u16)]
enum PrefixDescTlv {
    MultiTopologyId = 263,
    OspfRouteType = 264,
    IpReachability = 265,
}

/// OSPF route type carried in a prefix descriptor (RFC 7752 Section 3.2.3.2)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Primitive)]
#[repr(u8)]
pub enum OspfRouteType {
    IntraArea = 1,
    InterArea = 2,
    External1 = 3,
    External2 = 4,
    Nssa1 = 5,
    Nssa2 = 6,
}

/// One prefix descriptor sub-TLV
#[derive(Clone, Debug, PartialEq)]
pub enum PrefixDescriptor {
    MultiTopologyId(Vec<u16>),
    OspfRouteType(OspfRouteType),
    IpReachability { prefix_len: u8, prefix: Bytes },
    Unknown(u16, Bytes),
}

impl PrefixDescriptor {
    fn decode_one(tlv_type: u16, nlri_type: NlriType, value: &mut Bytes) -> Result<Self, Error> {
        Ok(match PrefixDescTlv::from_u16(tlv_type) {
            Some(PrefixDescTlv::MultiTopologyId) => {
                Self::MultiTopologyId(decode_multi_topology_id(value)?)
            }
            Some(PrefixDescTlv::OspfRouteType) => {
                let code = value.get_u8();
                Self::OspfRouteType(OspfRouteType::from_u8(code).ok_or(
                    Error::MalformedLinkState("OSPF-Route-Type", "value must be 1..=6"),
                )?)
            }
            Some(PrefixDescTlv::IpReachability) => {
                let prefix_len = value.get_u8();
                let (max_bits, n_octets) = match nlri_type {
                    NlriType::Ipv4Prefix => (32, 4),
                    NlriType::Ipv6Prefix => (128, 16),
                    _ => {
                        return Err(Error::MalformedLinkState(
                            "IP-Reachability",
                            "only valid for Ipv4Prefix/Ipv6Prefix NLRI",
                        ))
                    }
                };
                if prefix_len > max_bits {
                    return Err(Error::MalformedLinkState(
                        "IP-Reachability",
                        "prefix length exceeds address width",
                    ));
                }
                if value.remaining() != n_octets {
                    return Err(Error::MalformedLinkState(
                        "IP-Reachability",
                        "value length must be the full address width (5 octets for IPv4, 17 for IPv6)",
                    ));
                }
                Self::IpReachability {
                    prefix_len,
                    prefix: value.copy_to_bytes(n_octets),
                }
            }
            None => Self::Unknown(tlv_type, value.split_to(value.len())),
        })
    }
}

impl Component for PrefixDescriptor {
    fn from_bytes(_src: &mut Bytes) -> Result<Self, Error> {
        unimplemented!("prefix descriptors require the enclosing NLRI type; use decode_one")
    }

    fn to_bytes(self, dst: &mut bytes::BytesMut) -> usize {
        let code = match &self {
            Self::MultiTopologyId(_) => PrefixDescTlv::MultiTopologyId as u16,
            Self::OspfRouteType(_) => PrefixDescTlv::OspfRouteType as u16,
            Self::IpReachability { .. } => PrefixDescTlv::IpReachability as u16,
            Self::Unknown(code, _) => *code,
        };
        let len = self.encoded_len() - 4;
        dst.put_u16(code);
        dst.put_u16(u16::try_from(len).expect("prefix descriptor length overflow"));
        match self {
            Self::MultiTopologyId(ids) => {
                for id in ids {
                    dst.put_u16(id & 0x0FFF);
                }
            }
            Self::OspfRouteType(t) => dst.put_u8(t as u8),
            Self::IpReachability { prefix_len, prefix } => {
                dst.put_u8(prefix_len);
                dst.put_slice(&prefix);
            }
            Self::Unknown(_, data) => dst.put_slice(&data),
        }
        len + 4
    }

    fn encoded_len(&self) -> usize {
        4 + match self {
            Self::MultiTopologyId(ids) => ids.len() * 2,
            Self::OspfRouteType(_) => 1,
            Self::IpReachability { prefix, .. } => 1 + prefix.len(),
            Self::Unknown(_, data) => data.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isis_pseudonode_psn_octet() {
        // 6-octet ISO node-ID followed by a PSN octet that happens to look
        // like it could be confused with a zero-padded u64 encoding.
        let bytes = Bytes::from_static(&[0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0xAB]);
        let decoded = IgpRouterId::decode(&bytes).unwrap();
        assert_eq!(
            decoded,
            IgpRouterId::IsisPseudonode {
                iso_node_id: [0x00, 0x11, 0x22, 0x33, 0x44, 0x55],
                psn: 0xAB,
            }
        );
    }

    #[test]
    fn test_isis_non_pseudonode_vs_pseudonode_length_dispatch() {
        let six = Bytes::from_static(&[1, 2, 3, 4, 5, 6]);
        let seven = Bytes::from_static(&[1, 2, 3, 4, 5, 6, 7]);
        assert!(matches!(
            IgpRouterId::decode(&six).unwrap(),
            IgpRouterId::IsisNonPseudonode(_)
        ));
        assert!(matches!(
            IgpRouterId::decode(&seven).unwrap(),
            IgpRouterId::IsisPseudonode { .. }
        ));
    }

    #[test]
    fn test_ospf_pseudonode_length_dispatch() {
        let four = Bytes::from_static(&[1, 2, 3, 4]);
        let eight = Bytes::from_static(&[1, 2, 3, 4, 5, 6, 7, 8]);
        assert!(matches!(
            IgpRouterId::decode(&four).unwrap(),
            IgpRouterId::OspfNonPseudonode(_)
        ));
        assert!(matches!(
            IgpRouterId::decode(&eight).unwrap(),
            IgpRouterId::OspfPseudonode { .. }
        ));
    }

    #[test]
    fn test_ip_reachability_full_ipv4() {
        let mut value = Bytes::from_static(&[32, 192, 0, 2, 1]);
        let d = PrefixDescriptor::decode_one(265, NlriType::Ipv4Prefix, &mut value).unwrap();
        assert_eq!(
            d,
            PrefixDescriptor::IpReachability {
                prefix_len: 32,
                prefix: Bytes::from_static(&[192, 0, 2, 1]),
            }
        );
    }

    #[test]
    fn test_ip_reachability_full_ipv6() {
        let mut value = Bytes::from_static(&[
            64, 0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        ]);
        let d = PrefixDescriptor::decode_one(265, NlriType::Ipv6Prefix, &mut value).unwrap();
        assert_eq!(
            d,
            PrefixDescriptor::IpReachability {
                prefix_len: 64,
                prefix: Bytes::from_static(&[
                    0x20, 0x01, 0x0d, 0xb8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0
                ]),
            }
        );
    }

    #[test]
    fn test_ip_reachability_partial_length_is_malformed() {
        // shorter than the full 4-octet IPv4 width is rejected, even though /24 only needs 3 octets
        let mut value = Bytes::from_static(&[24, 192, 0, 2]);
        assert!(PrefixDescriptor::decode_one(265, NlriType::Ipv4Prefix, &mut value).is_err());
    }

    #[test]
    fn test_ip_reachability_bad_length_is_malformed() {
        let mut value = Bytes::from_static(&[32, 192, 0, 2]); // declares /32 but only 3 octets
        assert!(PrefixDescriptor::decode_one(265, NlriType::Ipv4Prefix, &mut value).is_err());
    }

    #[test]
    fn test_multi_topology_id_roundtrip() {
        let mut value = Bytes::from_static(&[0x00, 0x02, 0x00, 0x03]);
        let ids = decode_multi_topology_id(&mut value).unwrap();
        assert_eq!(ids, vec![2, 3]);
    }
}
