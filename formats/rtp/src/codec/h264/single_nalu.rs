use std::io;

use codec_h264::nalu::NalUnit;
use utils::traits::{
    dynamic_sized_packet::DynamicSizedPacket, reader::ReadFrom, writer::WriteTo,
};

use super::errors::RtpH264Error;

// @see: RFC 6184 5.6 Single NAL Unit Packet
/// the rtp payload is exactly one nal unit, header byte included
#[derive(Debug)]
pub struct SingleNalUnit(pub NalUnit);

impl<R: io::Read> ReadFrom<R> for SingleNalUnit {
    type Error = RtpH264Error;
    fn read_from(reader: R) -> Result<Self, Self::Error> {
        Ok(Self(NalUnit::read_from(reader)?))
    }
}

impl<W: io::Write> WriteTo<W> for SingleNalUnit {
    type Error = RtpH264Error;
    fn write_to(&self, writer: W) -> Result<(), Self::Error> {
        self.0.write_to(writer)?;
        Ok(())
    }
}

impl DynamicSizedPacket for SingleNalUnit {
    fn get_packet_bytes_count(&self) -> usize {
        self.0.get_packet_bytes_count()
    }
}
