use std::io;

use byteorder::{ReadBytesExt, WriteBytesExt};
use tokio_util::bytes::Bytes;
use utils::traits::{
    dynamic_sized_packet::DynamicSizedPacket,
    reader::{ReadExactFrom, ReadFrom, ReadRemainingFrom},
    writer::WriteTo,
};

use crate::{errors::H264CodecError, nalu_header::NaluHeader};

#[derive(Debug, Clone)]
pub struct NalUnit {
    pub header: NaluHeader,
    // bytes in body does not include the header byte
    pub body: Bytes,
}

impl DynamicSizedPacket for NalUnit {
    fn get_packet_bytes_count(&self) -> usize {
        1 + self.body.len()
    }
}

/// read all the remaining bytes as body, the header was read ahead
impl<R: io::Read> ReadRemainingFrom<NaluHeader, R> for NalUnit {
    type Error = H264CodecError;
    fn read_remaining_from(header: NaluHeader, mut reader: R) -> Result<Self, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self {
            header,
            body: Bytes::from(bytes),
        })
    }
}

/// read exact bytes as body, the header was read ahead
impl<R: io::Read> ReadRemainingFrom<(NaluHeader, usize), R> for NalUnit {
    type Error = H264CodecError;
    fn read_remaining_from(
        (header, body_size): (NaluHeader, usize),
        mut reader: R,
    ) -> Result<Self, Self::Error> {
        let mut bytes = vec![0; body_size];
        reader.read_exact(&mut bytes)?;
        Ok(Self {
            header,
            body: Bytes::from(bytes),
        })
    }
}

/// read all from reader, including the header,
/// assumes all bytes from the reader consists the nalu
impl<R: io::Read> ReadFrom<R> for NalUnit {
    type Error = H264CodecError;
    fn read_from(mut reader: R) -> Result<Self, Self::Error> {
        let header: NaluHeader = reader.read_u8()?.try_into()?;
        Self::read_remaining_from(header, reader)
    }
}

/// read exact bytes to consist a nalu, header byte included in the length
impl<R: io::Read> ReadExactFrom<R> for NalUnit {
    type Error = H264CodecError;
    fn read_exact_from(length: usize, mut reader: R) -> Result<Self, Self::Error> {
        let header: NaluHeader = reader.read_u8()?.try_into()?;
        Self::read_remaining_from((header, length - 1), reader)
    }
}

impl<W: io::Write> WriteTo<W> for NalUnit {
    type Error = H264CodecError;
    fn write_to(&self, mut writer: W) -> Result<(), Self::Error> {
        writer.write_u8(self.header.into())?;
        writer.write_all(&self.body)?;
        Ok(())
    }
}
