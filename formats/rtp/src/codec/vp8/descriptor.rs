use byteorder::{ReadBytesExt, WriteBytesExt};
use std::io;
use utils::traits::{
    dynamic_sized_packet::DynamicSizedPacket, reader::ReadFrom, writer::WriteTo,
};

use super::errors::RtpVp8Error;

// @see: RFC 7741 4.2 VP8 Payload Descriptor
/// ```text
///       0 1 2 3 4 5 6 7
///      +-+-+-+-+-+-+-+-+
///      |X|R|N|S| PartID| (REQUIRED)
///      +-+-+-+-+-+-+-+-+
/// X:   |I|L|T|K|  RSV  | (OPTIONAL)
///      +-+-+-+-+-+-+-+-+
/// I:   |M|  PictureID  | (OPTIONAL)
///      +-+-+-+-+-+-+-+-+
///      |   PictureID   | (M set)
///      +-+-+-+-+-+-+-+-+
/// L:   |   TL0PICIDX   | (OPTIONAL)
///      +-+-+-+-+-+-+-+-+
/// T/K: |TID|Y| KEYIDX  | (OPTIONAL)
///      +-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Default)]
pub struct Vp8PayloadDescriptor {
    pub extended: bool,
    pub non_reference: bool,
    pub start_of_partition: bool,
    pub partition_index: u8,
    pub picture_id: Option<u16>,
    /// picture id carried in the two byte form on the wire
    pub long_picture_id: bool,
    pub tl0_pic_idx: Option<u8>,
    pub temporal_layer_index: Option<u8>,
    pub layer_sync: bool,
    pub key_index: Option<u8>,
}

impl Vp8PayloadDescriptor {
    /// True when this packet opens a new vp8 frame.
    pub fn starts_frame(&self) -> bool {
        self.start_of_partition && self.partition_index == 0
    }
}

impl DynamicSizedPacket for Vp8PayloadDescriptor {
    fn get_packet_bytes_count(&self) -> usize {
        let mut count = 1;
        if self.extended {
            count += 1;
            if self.picture_id.is_some() {
                count += if self.long_picture_id { 2 } else { 1 };
            }
            if self.tl0_pic_idx.is_some() {
                count += 1;
            }
            if self.temporal_layer_index.is_some() || self.key_index.is_some() {
                count += 1;
            }
        }
        count
    }
}

impl<R: io::Read> ReadFrom<R> for Vp8PayloadDescriptor {
    type Error = RtpVp8Error;
    fn read_from(mut reader: R) -> Result<Self, Self::Error> {
        let first_byte = reader.read_u8()?;
        let mut descriptor = Self {
            extended: ((first_byte >> 7) & 0b1) == 0b1,
            non_reference: ((first_byte >> 5) & 0b1) == 0b1,
            start_of_partition: ((first_byte >> 4) & 0b1) == 0b1,
            partition_index: first_byte & 0b1111,
            ..Default::default()
        };
        if !descriptor.extended {
            return Ok(descriptor);
        }

        let extension_byte = reader.read_u8()?;
        let has_picture_id = ((extension_byte >> 7) & 0b1) == 0b1;
        let has_tl0_pic_idx = ((extension_byte >> 6) & 0b1) == 0b1;
        let has_tid = ((extension_byte >> 5) & 0b1) == 0b1;
        let has_key_idx = ((extension_byte >> 4) & 0b1) == 0b1;

        if has_picture_id {
            let first = reader.read_u8()?;
            descriptor.long_picture_id = (first & 0x80) == 0x80;
            descriptor.picture_id = Some(if descriptor.long_picture_id {
                (((first & 0x7F) as u16) << 8) | (reader.read_u8()? as u16)
            } else {
                first as u16
            });
        }
        if has_tl0_pic_idx {
            descriptor.tl0_pic_idx = Some(reader.read_u8()?);
        }
        if has_tid || has_key_idx {
            let byte = reader.read_u8()?;
            if has_tid {
                descriptor.temporal_layer_index = Some(byte >> 6);
                descriptor.layer_sync = ((byte >> 5) & 0b1) == 0b1;
            }
            if has_key_idx {
                descriptor.key_index = Some(byte & 0b1_1111);
            }
        }
        Ok(descriptor)
    }
}

impl<W: io::Write> WriteTo<W> for Vp8PayloadDescriptor {
    type Error = RtpVp8Error;
    fn write_to(&self, mut writer: W) -> Result<(), Self::Error> {
        let first_byte = ((self.extended as u8) << 7)
            | ((self.non_reference as u8) << 5)
            | ((self.start_of_partition as u8) << 4)
            | (self.partition_index & 0b1111);
        writer.write_u8(first_byte)?;
        if !self.extended {
            return Ok(());
        }

        let has_tid = self.temporal_layer_index.is_some();
        let has_key_idx = self.key_index.is_some();
        let extension_byte = ((self.picture_id.is_some() as u8) << 7)
            | ((self.tl0_pic_idx.is_some() as u8) << 6)
            | ((has_tid as u8) << 5)
            | ((has_key_idx as u8) << 4);
        writer.write_u8(extension_byte)?;

        if let Some(picture_id) = self.picture_id {
            if self.long_picture_id || picture_id > 0x7F {
                writer.write_u8(0x80 | ((picture_id >> 8) as u8 & 0x7F))?;
                writer.write_u8((picture_id & 0xFF) as u8)?;
            } else {
                writer.write_u8(picture_id as u8)?;
            }
        }
        if let Some(tl0_pic_idx) = self.tl0_pic_idx {
            writer.write_u8(tl0_pic_idx)?;
        }
        if has_tid || has_key_idx {
            let byte = (self.temporal_layer_index.unwrap_or(0) << 6)
                | ((self.layer_sync as u8) << 5)
                | (self.key_index.unwrap_or(0) & 0b1_1111);
            writer.write_u8(byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_minimal_descriptor() {
        let descriptor = Vp8PayloadDescriptor::read_from(&[0x10_u8, 0x9D][..]).unwrap();
        assert!(!descriptor.extended);
        assert!(descriptor.start_of_partition);
        assert_eq!(descriptor.partition_index, 0);
        assert!(descriptor.starts_frame());
        assert_eq!(descriptor.get_packet_bytes_count(), 1);
    }

    #[test]
    fn test_descriptor_with_long_picture_id() {
        // X set, I set, 15-bit picture id 0x1234
        let bytes = [0x90_u8, 0x80, 0x80 | 0x12, 0x34, 0xFF];
        let descriptor = Vp8PayloadDescriptor::read_from(&bytes[..]).unwrap();
        assert!(descriptor.extended);
        assert_eq!(descriptor.picture_id, Some(0x1234));
        assert_eq!(descriptor.get_packet_bytes_count(), 4);
    }

    #[test]
    fn test_descriptor_with_all_extensions() {
        let descriptor = Vp8PayloadDescriptor {
            extended: true,
            start_of_partition: true,
            picture_id: Some(0x55),
            tl0_pic_idx: Some(9),
            temporal_layer_index: Some(2),
            layer_sync: true,
            key_index: Some(3),
            ..Default::default()
        };
        let mut bytes = Vec::new();
        descriptor.write_to(&mut bytes).unwrap();
        assert_eq!(bytes.len(), descriptor.get_packet_bytes_count());

        let parsed = Vp8PayloadDescriptor::read_from(&bytes[..]).unwrap();
        assert_eq!(parsed.picture_id, Some(0x55));
        assert_eq!(parsed.tl0_pic_idx, Some(9));
        assert_eq!(parsed.temporal_layer_index, Some(2));
        assert!(parsed.layer_sync);
        assert_eq!(parsed.key_index, Some(3));
    }

    #[test]
    fn test_non_start_descriptor() {
        let descriptor = Vp8PayloadDescriptor::read_from(&[0x01_u8][..]).unwrap();
        assert!(!descriptor.starts_frame());
        assert_eq!(descriptor.partition_index, 1);
    }
}
