use crate::errors::H264CodecError;

pub const H264_NALU_TYPE_U8_MASK: u8 = 0b11111;

/// The five bit nal_unit_type code space.
///
/// @see: Recommendation ITU-T H.264, Table 7-1 – NAL unit type codes,
/// syntax element categories, and NAL unit type classes
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NALUType {
    NonIDRSlice = 1,
    DataPartitionASlice = 2,
    DataPartitionBSlice = 3,
    DataPartitionCSlice = 4,
    IDRSlice = 5,
    SEI = 6,
    SPS = 7,
    PPS = 8,
    AccessUnitDelimiter = 9,
    EndOfSequence = 10,
    EndOfStream = 11,
    FillerData = 12,
    SPSExtension = 13,
    PrefixNALU = 14,
    SubsetSPS = 15,
    DPS = 16,
    SliceWithoutPartitioning = 19,
    SliceExtension = 20,
    SliceExtensionForDepthView = 21,
    Unspecified(u8),
    Reserved(u8),
}

impl NALUType {
    /// SPS and PPS, the units a decoder needs before any key frame.
    pub fn is_parameter_set(self) -> bool {
        matches!(self, Self::SPS | Self::PPS)
    }

    /// Coded slice of a picture, IDR or not.
    pub fn is_slice(self) -> bool {
        matches!(self, Self::NonIDRSlice | Self::IDRSlice)
    }
}

impl TryFrom<u8> for NALUType {
    type Error = H264CodecError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let code = value & H264_NALU_TYPE_U8_MASK;
        if code == 0 || (24..=31).contains(&code) {
            return Ok(Self::Unspecified(code));
        }
        if (17..=18).contains(&code) || (22..=23).contains(&code) {
            return Ok(Self::Reserved(code));
        }
        match code {
            1 => Ok(Self::NonIDRSlice),
            2 => Ok(Self::DataPartitionASlice),
            3 => Ok(Self::DataPartitionBSlice),
            4 => Ok(Self::DataPartitionCSlice),
            5 => Ok(Self::IDRSlice),
            6 => Ok(Self::SEI),
            7 => Ok(Self::SPS),
            8 => Ok(Self::PPS),
            9 => Ok(Self::AccessUnitDelimiter),
            10 => Ok(Self::EndOfSequence),
            11 => Ok(Self::EndOfStream),
            12 => Ok(Self::FillerData),
            13 => Ok(Self::SPSExtension),
            14 => Ok(Self::PrefixNALU),
            15 => Ok(Self::SubsetSPS),
            16 => Ok(Self::DPS),
            19 => Ok(Self::SliceWithoutPartitioning),
            20 => Ok(Self::SliceExtension),
            21 => Ok(Self::SliceExtensionForDepthView),
            other => Err(H264CodecError::UnknownNaluType(other)),
        }
    }
}

impl From<NALUType> for u8 {
    fn from(value: NALUType) -> Self {
        match value {
            NALUType::Unspecified(code) | NALUType::Reserved(code) => code,
            NALUType::NonIDRSlice => 1,
            NALUType::DataPartitionASlice => 2,
            NALUType::DataPartitionBSlice => 3,
            NALUType::DataPartitionCSlice => 4,
            NALUType::IDRSlice => 5,
            NALUType::SEI => 6,
            NALUType::SPS => 7,
            NALUType::PPS => 8,
            NALUType::AccessUnitDelimiter => 9,
            NALUType::EndOfSequence => 10,
            NALUType::EndOfStream => 11,
            NALUType::FillerData => 12,
            NALUType::SPSExtension => 13,
            NALUType::PrefixNALU => 14,
            NALUType::SubsetSPS => 15,
            NALUType::DPS => 16,
            NALUType::SliceWithoutPartitioning => 19,
            NALUType::SliceExtension => 20,
            NALUType::SliceExtensionForDepthView => 21,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_code_space_round_trip() {
        for code in 0..=31_u8 {
            let nalu_type = NALUType::try_from(code).unwrap();
            assert_eq!(u8::from(nalu_type), code);
        }
        // the high bits of a full header byte are ignored
        assert_eq!(NALUType::try_from(0x65).unwrap(), NALUType::IDRSlice);
        assert_eq!(NALUType::try_from(0x67).unwrap(), NALUType::SPS);
    }

    #[test]
    fn test_classification() {
        assert!(NALUType::SPS.is_parameter_set());
        assert!(NALUType::PPS.is_parameter_set());
        assert!(!NALUType::IDRSlice.is_parameter_set());
        assert!(NALUType::IDRSlice.is_slice());
        assert!(NALUType::NonIDRSlice.is_slice());
        assert!(!NALUType::SEI.is_slice());
        assert!(!NALUType::Unspecified(0).is_slice());
    }
}
