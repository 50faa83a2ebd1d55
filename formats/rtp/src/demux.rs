//! RTP/RTCP de-multiplexing on a shared port.
//!
//! @see: RFC 5761 4. Distinguishable RTP and RTCP Packets

/// The rtcp packet types a receiver cares about: SR, RR, SDES, BYE,
/// RTPFB and PSFB. Everything else in the version-2 first-byte range is
/// treated as rtp.
const RTCP_PACKET_TYPES: [u8; 6] = [200, 201, 202, 203, 205, 206];

const MIN_DATAGRAM_SIZE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiplexedKind {
    Rtp,
    Rtcp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemuxReject {
    /// shorter than a fixed rtp header
    TooShort(usize),
    /// top two bits of the first byte are not 0b10
    BadVersion(u8),
}

/// Classify a udp datagram as rtp or rtcp.
///
/// The first byte must carry version 2 (any padding/extension/CC combination,
/// i.e. a value in `[128, 191]`); the second byte then separates the rtcp
/// packet-type space from the rtp payload-type space.
pub fn classify(datagram: &[u8]) -> Result<MultiplexedKind, DemuxReject> {
    if datagram.len() < MIN_DATAGRAM_SIZE {
        return Err(DemuxReject::TooShort(datagram.len()));
    }
    let first_byte = datagram[0];
    if !(128..=191).contains(&first_byte) {
        return Err(DemuxReject::BadVersion(first_byte >> 6));
    }
    if RTCP_PACKET_TYPES.contains(&datagram[1]) {
        Ok(MultiplexedKind::Rtcp)
    } else {
        Ok(MultiplexedKind::Rtp)
    }
}
