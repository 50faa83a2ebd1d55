use utils::traits::fixed_packet::FixedPacket;

use crate::{
    errors::H264CodecError,
    nalu_type::{H264_NALU_TYPE_U8_MASK, NALUType},
};

/// The single header byte in front of every nal unit:
/// forbidden_zero_bit (1 bit), nal_ref_idc (2 bits), nal_unit_type (5 bits).
#[derive(Debug, Clone, Copy)]
pub struct NaluHeader {
    pub forbidden_zero_bit: bool,
    pub nal_ref_idc: u8,
    pub nal_unit_type: NALUType,
}

impl NaluHeader {
    /// Assemble a header from its parts, as when rebuilding the original
    /// header of a fragmented nal unit.
    pub fn new(forbidden_zero_bit: bool, nal_ref_idc: u8, nal_unit_type: NALUType) -> Self {
        Self {
            forbidden_zero_bit,
            nal_ref_idc: nal_ref_idc & 0b11,
            nal_unit_type,
        }
    }
}

impl From<NaluHeader> for u8 {
    fn from(value: NaluHeader) -> Self {
        ((value.forbidden_zero_bit as u8) << 7)
            | ((value.nal_ref_idc & 0b11) << 5)
            | (Into::<u8>::into(value.nal_unit_type) & H264_NALU_TYPE_U8_MASK)
    }
}

impl TryFrom<u8> for NaluHeader {
    type Error = H264CodecError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(Self::new(
            ((value >> 7) & 0b1) == 0b1,
            (value >> 5) & 0b11,
            value.try_into()?,
        ))
    }
}

impl FixedPacket for NaluHeader {
    fn bytes_count() -> usize {
        1
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_header_byte_round_trip() {
        // 0x65: nri 3, idr slice
        let header = NaluHeader::try_from(0x65).unwrap();
        assert!(!header.forbidden_zero_bit);
        assert_eq!(header.nal_ref_idc, 3);
        assert_eq!(header.nal_unit_type, NALUType::IDRSlice);
        assert_eq!(u8::from(header), 0x65);

        let built = NaluHeader::new(false, 2, NALUType::SPS);
        assert_eq!(u8::from(built), 0x47);
    }
}
