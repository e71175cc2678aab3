//! BGP path attributes (RFC 4271 Section 5, RFC 4760 multiprotocol attributes)
//!
//! This collector only models the attributes relevant to BGP-LS sessions:
//! ORIGIN and AS_PATH round out a valid UPDATE, LOCAL_PREF is kept for
//! completeness, and MP_REACH_NLRI/MP_UNREACH_NLRI/BGP-LS carry the actual
//! link-state data. Everything else is preserved as opaque bytes rather than
//! dropped, since a collector must not silently discard attributes it
//! forwards to its own event stream.

// SPDX-License-Identifier: AGPL-3.0-or-later

use crate::attr::LinkStateAttribute;
use crate::capability::{Afi, Safi};
use crate::endec::Component;
use crate::nlri::{LinkStateNlri, ProtocolId};
use crate::Error;
use bytes::{Buf, BufMut, Bytes};
use enum_primitive_derive::Primitive;
use num_traits::FromPrimitive;
use std::ops::Deref;

/// A full set of path attributes attached to an UPDATE message
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathAttributes(pub Vec<Value>);

impl Component for PathAttributes {
    fn from_bytes(src: &mut Bytes) -> Result<Self, Error> {
        // The BGP-LS attribute's protocol-dependent sub-TLVs (Prefix-Flags,
        // SR Adjacency-SID) need to know which IGP sourced the NLRI it
        // describes. That comes from the MP_REACH_NLRI/MP_UNREACH_NLRI
        // attribute in the same UPDATE, which by convention precedes the
        // BGP-LS attribute (type 14/15 sort before type 29); carry it
        // forward here rather than asking the BGP-LS attribute to guess.
        let mut protocol_hint = None;
        let mut attrs = Vec::new();
        while src.has_remaining() {
            let value = Value::decode(src, protocol_hint)?;
            match &value.data {
                Data::MpReachNlri(mp) => {
                    protocol_hint = mp.nlri.first().map(LinkStateNlri::protocol_hint);
                }
                Data::MpUnreachNlri(mp) => {
                    protocol_hint = mp.withdrawn_routes.first().map(LinkStateNlri::protocol_hint);
                }
                _ => {}
            }
            attrs.push(value);
        }
        Ok(Self(attrs))
    }

    fn to_bytes(self, dst: &mut bytes::BytesMut) -> usize {
        let mut len = 0;
        for attr in self.0 {
            len += attr.to_bytes(dst);
        }
        len
    }

    fn encoded_len(&self) -> usize {
        self.0.iter().map(Component::encoded_len).sum()
    }
}

impl Deref for PathAttributes {
    type Target = Vec<Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Path attribute flags (RFC 4271 Section 4.3)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Flags(pub u8);

impl Flags {
    const OPTIONAL: u8 = 0x80;
    const TRANSITIVE: u8 = 0x40;
    const PARTIAL: u8 = 0x20;
    const EXTENDED_LENGTH: u8 = 0x10;

    #[must_use]
    pub const fn is_optional(self) -> bool {
        self.0 & Self::OPTIONAL != 0
    }

    #[must_use]
    pub const fn is_transitive(self) -> bool {
        self.0 & Self::TRANSITIVE != 0
    }

    #[must_use]
    pub const fn is_partial(self) -> bool {
        self.0 & Self::PARTIAL != 0
    }

    #[must_use]
    pub const fn is_extended_length(self) -> bool {
        self.0 & Self::EXTENDED_LENGTH != 0
    }

    #[must_use]
    pub const fn new(optional: bool, transitive: bool, partial: bool, extended_length: bool) -> Self {
        Self(
            (optional as u8) << 7
                | (transitive as u8) << 6
                | (partial as u8) << 5
                | (extended_length as u8) << 4,
        )
    }

    /// Check the flags against what RFC 4271/4760 mandate for `type_`.
    ///
    /// Well-known attributes must be non-optional; well-known mandatory
    /// attributes must additionally be transitive and non-partial. Optional
    /// attributes that are not transitive must not be marked partial either
    /// (RFC 4271 Section 5).
    fn validate(self, type_: Type) -> Result<(), Error> {
        let ok = match type_ {
            Type::Origin | Type::AsPath => !self.is_optional() && self.is_transitive() && !self.is_partial(),
            Type::LocalPref => !self.is_optional(),
            Type::MpReachNlri | Type::MpUnreachNlri | Type::BgpLs => {
                self.is_optional() && !self.is_transitive() && !self.is_partial()
            }
        };
        if ok {
            Ok(())
        } else {
            Err(Error::AttrFlags(type_.name()))
        }
    }
}

/// One decoded path attribute
#[derive(Clone, Debug, PartialEq)]
pub struct Value {
    pub flags: Flags,
    pub data: Data,
}

impl Value {
    /// Decode one attribute, given the IGP protocol-id hint (if any) carried
    /// forward from an earlier MP_REACH_NLRI/MP_UNREACH_NLRI in the same UPDATE.
    fn decode(src: &mut Bytes, protocol_hint: Option<ProtocolId>) -> Result<Self, Error> {
        let flags = Flags(src.get_u8());
        let code = src.get_u8();
        let len = if flags.is_extended_length() {
            src.get_u16() as usize
        } else {
            src.get_u8() as usize
        };
        let mut value = src.split_to(len);
        let data = match Type::from_u8(code) {
            Some(type_) => {
                flags.validate(type_)?;
                Data::decode(type_, &mut value, protocol_hint)?
            }
            None => Data::Unsupported(code, value.copy_to_bytes(value.len())),
        };
        Ok(Self { flags, data })
    }
}

impl Component for Value {
    /// Decode a single attribute with no protocol-id context; used for
    /// standalone attributes that cannot be a BGP-LS attribute. Callers
    /// decoding a full UPDATE should go through [`PathAttributes::from_bytes`]
    /// instead, which threads the context forward from MP_REACH_NLRI.
    fn from_bytes(src: &mut Bytes) -> Result<Self, Error> {
        Self::decode(src, None)
    }

    fn to_bytes(self, dst: &mut bytes::BytesMut) -> usize {
        let len = self.data.encoded_len();
        let extended_length = self.flags.is_extended_length() || len > 255;
        let flags = if extended_length {
            Flags(self.flags.0 | Flags::EXTENDED_LENGTH)
        } else {
            self.flags
        };
        dst.put_u8(flags.0);
        dst.put_u8(self.data.code());
        if extended_length {
            dst.put_u16(u16::try_from(len).expect("path attribute length overflow"));
        } else {
            dst.put_u8(u8::try_from(len).expect("path attribute length overflow"));
        }
        let written = self.data.encode(dst);
        debug_assert_eq!(written, len);
        written + 2 + usize::from(extended_length) + 1
    }

    fn encoded_len(&self) -> usize {
        let len = self.data.encoded_len();
        2 + usize::from(self.flags.is_extended_length() || len > 255) + 1 + len
    }
}

/// Path attribute type codes this collector recognizes
#[derive(Copy, Clone, Debug, PartialEq, Eq, Primitive)]
#[repr(u8)]
pub enum Type {
    Origin = 1,
    AsPath = 2,
    LocalPref = 5,
    MpReachNlri = 14,
    MpUnreachNlri = 15,
    /// BGP-LS attribute (RFC 7752 Section 3.3)
    BgpLs = 29,
}

impl Type {
    const fn name(self) -> &'static str {
        match self {
            Self::Origin => "ORIGIN",
            Self::AsPath => "AS_PATH",
            Self::LocalPref => "LOCAL_PREF",
            Self::MpReachNlri => "MP_REACH_NLRI",
            Self::MpUnreachNlri => "MP_UNREACH_NLRI",
            Self::BgpLs => "BGP-LS",
        }
    }
}

/// One decoded path attribute value
#[derive(Clone, Debug, PartialEq)]
pub enum Data {
    Origin(Origin),
    AsPath(AsPath),
    LocalPref(u32),
    MpReachNlri(MpReachNlri),
    MpUnreachNlri(MpUnreachNlri),
    BgpLs(LinkStateAttribute),
    /// Any attribute this collector does not model, preserved opaque
    Unsupported(u8, Bytes),
}

impl Data {
    fn decode(type_: Type, value: &mut Bytes, protocol_hint: Option<ProtocolId>) -> Result<Self, Error> {
        Ok(match type_ {
            Type::Origin => {
                let code = value.get_u8();
                Self::Origin(
                    Origin::from_u8(code).ok_or(Error::InternalType("ORIGIN", u16::from(code)))?,
                )
            }
            Type::AsPath => Self::AsPath(AsPath::decode(value)?),
            Type::LocalPref => Self::LocalPref(value.get_u32()),
            Type::MpReachNlri => Self::MpReachNlri(MpReachNlri::decode(value)?),
            Type::MpUnreachNlri => Self::MpUnreachNlri(MpUnreachNlri::decode(value)?),
            Type::BgpLs => {
                let hint = protocol_hint.ok_or(Error::NoNlriProtocolHint)?;
                Self::BgpLs(LinkStateAttribute::decode(value, hint)?)
            }
        })
    }

    fn encode(self, dst: &mut bytes::BytesMut) -> usize {
        match self {
            Self::Origin(o) => {
                dst.put_u8(o as u8);
                1
            }
            Self::AsPath(p) => p.encode(dst),
            Self::LocalPref(v) => {
                dst.put_u32(v);
                4
            }
            Self::MpReachNlri(mp) => mp.encode(dst),
            Self::MpUnreachNlri(mp) => mp.encode(dst),
            Self::BgpLs(attr) => attr.encode(dst),
            Self::Unsupported(_, data) => {
                dst.put_slice(&data);
                data.len()
            }
        }
    }

    const fn code(&self) -> u8 {
        match self {
            Self::Origin(_) => Type::Origin as u8,
            Self::AsPath(_) => Type::AsPath as u8,
            Self::LocalPref(_) => Type::LocalPref as u8,
            Self::MpReachNlri(_) => Type::MpReachNlri as u8,
            Self::MpUnreachNlri(_) => Type::MpUnreachNlri as u8,
            Self::BgpLs(_) => Type::BgpLs as u8,
            Self::Unsupported(code, _) => *code,
        }
    }

    fn encoded_len(&self) -> usize {
        match self {
            Self::Origin(_) => 1,
            Self::AsPath(p) => p.encoded_len(),
            Self::LocalPref(_) => 4,
            Self::MpReachNlri(mp) => mp.encoded_len(),
            Self::MpUnreachNlri(mp) => mp.encoded_len(),
            Self::BgpLs(attr) => attr.encoded_len(),
            Self::Unsupported(_, data) => data.len(),
        }
    }
}

/// ORIGIN attribute value (RFC 4271 Section 5.1.1)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Primitive)]
#[repr(u8)]
pub enum Origin {
    Igp = 0,
    Egp = 1,
    Incomplete = 2,
}

/// AS_PATH attribute (RFC 4271 Section 5.1.2)
///
/// ASNs are always decoded as four-octet (RFC 6793); this collector targets
/// BGP-LS deployments where the four-octet AS number capability is assumed,
/// so the legacy two-octet AS_PATH encoding is not modeled.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AsPath(pub Vec<AsSegment>);

impl AsPath {
    fn decode(src: &mut Bytes) -> Result<Self, Error> {
        let mut segments = Vec::new();
        while src.has_remaining() {
            segments.push(AsSegment::decode(src)?);
        }
        Ok(Self(segments))
    }

    fn encode(self, dst: &mut bytes::BytesMut) -> usize {
        let mut len = 0;
        for seg in self.0 {
            len += seg.encode(dst);
        }
        len
    }

    fn encoded_len(&self) -> usize {
        self.0.iter().map(AsSegment::encoded_len).sum()
    }
}

/// One AS_PATH segment
#[derive(Clone, Debug, PartialEq)]
pub struct AsSegment {
    pub type_: AsSegmentType,
    pub asns: Vec<u32>,
}

impl AsSegment {
    fn decode(src: &mut Bytes) -> Result<Self, Error> {
        let code = src.get_u8();
        let type_ = AsSegmentType::from_u8(code)
            .ok_or(Error::InternalType("AS_PATH segment", u16::from(code)))?;
        let count = src.get_u8() as usize;
        let mut asns = Vec::with_capacity(count);
        for _ in 0..count {
            asns.push(src.get_u32());
        }
        Ok(Self { type_, asns })
    }

    fn encode(self, dst: &mut bytes::BytesMut) -> usize {
        dst.put_u8(self.type_ as u8);
        dst.put_u8(u8::try_from(self.asns.len()).expect("AS_PATH segment too long"));
        for asn in &self.asns {
            dst.put_u32(*asn);
        }
        2 + self.asns.len() * 4
    }

    fn encoded_len(&self) -> usize {
        2 + self.asns.len() * 4
    }
}

/// AS_PATH segment type (RFC 4271 Section 4.3)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Primitive)]
#[repr(u8)]
pub enum AsSegmentType {
    AsSet = 1,
    AsSequence = 2,
}

/// MP_REACH_NLRI (RFC 4760 Section 3), restricted to AFI=16388/SAFI=71
#[derive(Clone, Debug, PartialEq)]
pub struct MpReachNlri {
    pub afi: Afi,
    pub safi: Safi,
    pub next_hop: Bytes,
    pub nlri: Vec<LinkStateNlri>,
}

impl MpReachNlri {
    fn decode(src: &mut Bytes) -> Result<Self, Error> {
        let afi = src.get_u16();
        let afi = Afi::from_u16(afi).ok_or(Error::InternalType("MP_REACH_NLRI AFI", afi))?;
        let safi = src.get_u8();
        let safi =
            Safi::from_u8(safi).ok_or(Error::InternalType("MP_REACH_NLRI SAFI", u16::from(safi)))?;
        // Historical bug to avoid: reject anything that is not exactly
        // (BgpLs, BgpLs) with `!=`, never an `==`/`||` combination that can
        // be satisfied by only one of the two fields matching.
        if (afi, safi) != (Afi::BgpLs, Safi::BgpLs) {
            return Err(Error::NotBgpLs);
        }
        let next_hop_len = src.get_u8() as usize;
        let next_hop = src.copy_to_bytes(next_hop_len);
        let _reserved = src.get_u8();
        let mut nlri = Vec::new();
        while src.has_remaining() {
            nlri.push(LinkStateNlri::from_bytes(src)?);
        }
        Ok(Self {
            afi,
            safi,
            next_hop,
            nlri,
        })
    }

    fn encode(self, dst: &mut bytes::BytesMut) -> usize {
        dst.put_u16(self.afi as u16);
        dst.put_u8(self.safi as u8);
        dst.put_u8(u8::try_from(self.next_hop.len()).expect("next hop too long"));
        dst.put_slice(&self.next_hop);
        dst.put_u8(0); // Reserved
        let mut len = 4 + self.next_hop.len();
        for nlri in self.nlri {
            len += nlri.to_bytes(dst);
        }
        len
    }

    fn encoded_len(&self) -> usize {
        4 + self.next_hop.len()
            + self.nlri.iter().map(Component::encoded_len).sum::<usize>()
    }
}

/// MP_UNREACH_NLRI (RFC 4760 Section 4), restricted to AFI=16388/SAFI=71
#[derive(Clone, Debug, PartialEq)]
pub struct MpUnreachNlri {
    pub afi: Afi,
    pub safi: Safi,
    pub withdrawn_routes: Vec<LinkStateNlri>,
}

impl MpUnreachNlri {
    fn decode(src: &mut Bytes) -> Result<Self, Error> {
        let afi = src.get_u16();
        let afi = Afi::from_u16(afi).ok_or(Error::InternalType("MP_UNREACH_NLRI AFI", afi))?;
        let safi = src.get_u8();
        let safi = Safi::from_u8(safi)
            .ok_or(Error::InternalType("MP_UNREACH_NLRI SAFI", u16::from(safi)))?;
        if (afi, safi) != (Afi::BgpLs, Safi::BgpLs) {
            return Err(Error::NotBgpLs);
        }
        let mut withdrawn_routes = Vec::new();
        while src.has_remaining() {
            withdrawn_routes.push(LinkStateNlri::from_bytes(src)?);
        }
        Ok(Self {
            afi,
            safi,
            withdrawn_routes,
        })
    }

    fn encode(self, dst: &mut bytes::BytesMut) -> usize {
        dst.put_u16(self.afi as u16);
        dst.put_u8(self.safi as u8);
        let mut len = 3;
        for nlri in self.withdrawn_routes {
            len += nlri.to_bytes(dst);
        }
        len
    }

    fn encoded_len(&self) -> usize {
        3 + self
            .withdrawn_routes
            .iter()
            .map(Component::encoded_len)
            .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::hex_to_bytes;

    #[test]
    fn test_origin_roundtrip() {
        let value = Value {
            flags: Flags::new(false, true, false, false),
            data: Data::Origin(Origin::Igp),
        };
        let mut buf = bytes::BytesMut::new();
        let len = value.clone().to_bytes(&mut buf);
        assert_eq!(len, value.encoded_len());
        let mut src = buf.freeze();
        let decoded = Value::from_bytes(&mut src).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_origin_bad_flags_is_rejected() {
        // ORIGIN is well-known mandatory: optional bit must be clear.
        let mut buf = bytes::BytesMut::new();
        buf.put_u8(0x80); // optional=true, wrong for ORIGIN
        buf.put_u8(Type::Origin as u8);
        buf.put_u8(1);
        buf.put_u8(Origin::Igp as u8);
        let mut src = buf.freeze();
        assert!(matches!(Value::from_bytes(&mut src), Err(Error::AttrFlags(_))));
    }

    #[test]
    fn test_as_path_roundtrip() {
        let path = AsPath(vec![AsSegment {
            type_: AsSegmentType::AsSequence,
            asns: vec![65001, 65002],
        }]);
        let mut buf = bytes::BytesMut::new();
        let len = path.clone().encode(&mut buf);
        assert_eq!(len, path.encoded_len());
        let mut src = buf.freeze();
        let decoded = AsPath::decode(&mut src).unwrap();
        assert_eq!(decoded, path);
    }

    #[test]
    fn test_mp_reach_nlri_rejects_non_bgp_ls_afi_safi() {
        // AFI=1 (IPv4), SAFI=71 (BGP-LS) — only one half matches, must still error.
        let mut buf = bytes::BytesMut::new();
        buf.put_u16(1);
        buf.put_u8(71);
        buf.put_u8(4);
        buf.put_slice(&[0, 0, 0, 0]);
        buf.put_u8(0);
        let mut src = buf.freeze();
        assert!(matches!(MpReachNlri::decode(&mut src), Err(Error::NotBgpLs)));
    }

    #[test]
    fn test_mp_reach_nlri_bgp_ls_roundtrip() {
        // AFI=16388, SAFI=71, next-hop-len=0, reserved=0, no NLRI.
        let mut src = hex_to_bytes("4004 47 00 00").freeze();
        let mp = MpReachNlri::decode(&mut src).unwrap();
        assert_eq!(mp.afi, Afi::BgpLs);
        assert_eq!(mp.safi, Safi::BgpLs);
        assert!(mp.nlri.is_empty());
    }
}
