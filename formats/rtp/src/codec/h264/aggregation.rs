use std::io::{self, Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use codec_h264::nalu::NalUnit;
use tokio_util::bytes::Buf;
use utils::traits::{
    dynamic_sized_packet::DynamicSizedPacket,
    reader::{ReadExactFrom, ReadRemainingFrom},
    writer::WriteTo,
};

use super::errors::RtpH264Error;

// @see: RFC 6184 5.7.1 Single-Time Aggregation Packet (STAP), Figure 7
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         RTP Header                            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |STAP-A NAL HDR |        NALU 1 Size            |   NALU 1 HDR  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                        NALU 1 Data                            |
/// :                                                               :
/// +               +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |               |            NALU 2 Size        |  NALU 2 HDR   |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                        NALU 2 Data                            |
/// :                                                               :
/// |                               +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                               :...OPTIONAL RTP padding        |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug)]
pub struct StapAPacket {
    pub header: u8,
    pub nal_units: Vec<NalUnit>,
}

impl<R: io::Read> ReadRemainingFrom<u8, R> for StapAPacket {
    type Error = RtpH264Error;
    fn read_remaining_from(header: u8, mut reader: R) -> Result<Self, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let mut cursor = Cursor::new(&bytes);

        // a truncated trailing entry terminates the packet, it is not an error
        let mut nal_units = Vec::new();
        while cursor.remaining() >= 2 {
            let nal_size = cursor.read_u16::<BigEndian>()? as usize;
            if nal_size == 0 {
                continue;
            }
            if cursor.remaining() < nal_size {
                break;
            }
            nal_units.push(NalUnit::read_exact_from(nal_size, cursor.by_ref())?);
        }

        Ok(Self { header, nal_units })
    }
}

impl<W: io::Write> WriteTo<W> for StapAPacket {
    type Error = RtpH264Error;
    fn write_to(&self, mut writer: W) -> Result<(), Self::Error> {
        writer.write_u8(self.header)?;
        self.nal_units.iter().try_for_each(|nalu| {
            writer.write_u16::<BigEndian>(nalu.get_packet_bytes_count() as u16)?;
            nalu.write_to(writer.by_ref())?;
            Ok::<(), RtpH264Error>(())
        })?;
        Ok(())
    }
}

impl DynamicSizedPacket for StapAPacket {
    fn get_packet_bytes_count(&self) -> usize {
        1 // STAP-A NAL HDR
        + self.nal_units.iter().fold(
            0,
            |prev, cur|
                prev
                    + 2 // nalu size
                    + cur.get_packet_bytes_count(),
        )
    }
}
