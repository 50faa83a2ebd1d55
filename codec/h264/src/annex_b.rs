use std::io;

use utils::traits::{dynamic_sized_packet::DynamicSizedPacket, writer::WriteTo};

use crate::{errors::H264CodecResult, nalu::NalUnit};

/// @see: Recommendation ITU-T H.264, Annex B byte stream format
pub const ANNEX_B_START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

pub fn annex_b_bytes_count(nal_units: &[NalUnit]) -> usize {
    nal_units.iter().fold(0, |sum, nalu| {
        sum + ANNEX_B_START_CODE.len() + nalu.get_packet_bytes_count()
    })
}

/// serialize each nalu behind a four byte start code
pub fn write_annex_b<W: io::Write>(mut writer: W, nal_units: &[NalUnit]) -> H264CodecResult<()> {
    for nalu in nal_units {
        writer.write_all(&ANNEX_B_START_CODE)?;
        nalu.write_to(writer.by_ref())?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use tokio_util::bytes::Bytes;

    use super::*;
    use crate::nalu_header::NaluHeader;

    #[test]
    fn test_write_annex_b() {
        let nalu = NalUnit {
            header: NaluHeader::try_from(0x65).unwrap(),
            body: Bytes::from_static(&[0x11, 0x22, 0x33]),
        };
        let mut bytes = Vec::new();
        write_annex_b(&mut bytes, &[nalu.clone(), nalu]).unwrap();
        assert_eq!(
            bytes,
            vec![0, 0, 0, 1, 0x65, 0x11, 0x22, 0x33, 0, 0, 0, 1, 0x65, 0x11, 0x22, 0x33]
        );
    }

    #[test]
    fn test_annex_b_bytes_count() {
        let nalu = NalUnit {
            header: NaluHeader::try_from(0x67).unwrap(),
            body: Bytes::from_static(&[0xFF; 10]),
        };
        assert_eq!(annex_b_bytes_count(&[nalu]), 4 + 1 + 10);
        assert_eq!(annex_b_bytes_count(&[]), 0);
    }
}
