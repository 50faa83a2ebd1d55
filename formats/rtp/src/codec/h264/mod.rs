pub mod aggregation;
pub mod depacketizer;
pub mod errors;
pub mod fragmented;
pub mod single_nalu;

use crate::codec::h264::errors::RtpH264Error;

/// @see: RFC 6184 5.2 Payload Structures, dispatched on the low five bits
/// of the first payload byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadStructureType {
    /// types 1..=23, the payload is one nal unit
    SingleNalUnit(u8),
    StapA,
    StapB,
    Mtap16,
    Mtap24,
    FuA,
    FuB,
}

impl TryFrom<u8> for PayloadStructureType {
    type Error = RtpH264Error;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value & 0b1_1111 {
            v if (1..=23).contains(&v) => Ok(Self::SingleNalUnit(v)),
            24 => Ok(Self::StapA),
            25 => Ok(Self::StapB),
            26 => Ok(Self::Mtap16),
            27 => Ok(Self::Mtap24),
            28 => Ok(Self::FuA),
            29 => Ok(Self::FuB),
            v => Err(RtpH264Error::InvalidH264PacketType(v)),
        }
    }
}
