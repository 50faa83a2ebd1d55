use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io;
use tokio_util::bytes::Bytes;
use utils::traits::{
    dynamic_sized_packet::DynamicSizedPacket, fixed_packet::FixedPacket,
    reader::ReadRemainingFrom, writer::WriteTo,
};

use super::errors::RtpH264Error;

// @see: RFC 6184 5.8 Fragmentation Units (FUs)
/// +---------------+
/// |0|1|2|3|4|5|6|7|
/// +-+-+-+-+-+-+-+-+
/// |S|E|R|   Type  |
/// +---------------+
#[derive(Debug, Clone, Copy)]
pub struct FuHeader {
    pub start_bit: bool,
    pub end_bit: bool,
    pub reserved_bit: bool,
    pub nalu_type: u8,
}

impl From<FuHeader> for u8 {
    fn from(value: FuHeader) -> Self {
        ((value.start_bit as u8) << 7)
            | ((value.end_bit as u8) << 6)
            | ((value.reserved_bit as u8) << 5)
            | (value.nalu_type & 0b1_1111)
    }
}

impl From<u8> for FuHeader {
    fn from(value: u8) -> Self {
        Self {
            start_bit: ((value >> 7) & 0b1) == 0b1,
            end_bit: ((value >> 6) & 0b1) == 0b1,
            reserved_bit: ((value >> 5) & 0b1) == 0b1,
            nalu_type: value & 0b1_1111,
        }
    }
}

impl FixedPacket for FuHeader {
    fn bytes_count() -> usize {
        1
    }
}

///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// | FU indicator  |   FU header   |                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+                               |
/// |                                                               |
/// |                          FU payload                           |
/// |                                                               |
/// |                               +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                               :...OPTIONAL RTP padding        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug)]
pub struct FuAPacket {
    pub indicator: u8,
    pub fu_header: FuHeader,
    pub payload: Bytes,
}

impl FuAPacket {
    /// The nal unit header byte this fragment run reconstructs:
    /// F and NRI from the indicator, the type from the FU header.
    pub fn reconstructed_nalu_header_byte(&self) -> u8 {
        (self.indicator & 0b1110_0000) | (self.fu_header.nalu_type & 0b1_1111)
    }
}

impl<R: io::Read> ReadRemainingFrom<u8, R> for FuAPacket {
    type Error = RtpH264Error;
    fn read_remaining_from(indicator: u8, mut reader: R) -> Result<Self, Self::Error> {
        let fu_header: FuHeader = reader.read_u8()?.into();
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self {
            indicator,
            fu_header,
            payload: Bytes::from(bytes),
        })
    }
}

impl<W: io::Write> WriteTo<W> for FuAPacket {
    type Error = RtpH264Error;
    fn write_to(&self, mut writer: W) -> Result<(), Self::Error> {
        writer.write_u8(self.indicator)?;
        writer.write_u8(self.fu_header.into())?;
        writer.write_all(&self.payload)?;
        Ok(())
    }
}

impl DynamicSizedPacket for FuAPacket {
    fn get_packet_bytes_count(&self) -> usize {
        1 // FU indicator
        + FuHeader::bytes_count()
        + self.payload.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fu_header_bits() {
        let header = FuHeader::from(0x85);
        assert!(header.start_bit);
        assert!(!header.end_bit);
        assert!(!header.reserved_bit);
        assert_eq!(header.nalu_type, 5);
        assert_eq!(u8::from(header), 0x85);

        let header = FuHeader::from(0x45);
        assert!(!header.start_bit);
        assert!(header.end_bit);
        assert_eq!(header.nalu_type, 5);
    }

    #[test]
    fn test_reconstructed_nalu_header() {
        // FU indicator 0x7C: F=0, NRI=3, type 28; original type 5
        let packet = FuAPacket::read_remaining_from(0x7C, &[0x85, 1, 2, 3][..]).unwrap();
        assert_eq!(packet.reconstructed_nalu_header_byte(), 0x65);
        assert_eq!(packet.payload.as_ref(), &[1, 2, 3]);
    }
}
