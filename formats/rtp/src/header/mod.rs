use tokio_util::bytes::BytesMut;
use utils::traits::dynamic_sized_packet::DynamicSizedPacket;

pub mod reader;
pub mod writer;

// @see: RFC 3550 5.1 RTP Fixed Header Fields
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |V=2|P|X|  CC   |M|     PT      |       sequence number         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           timestamp                           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           synchronization source (SSRC) identifier            |
/// +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
/// |            contributing source (CSRC) identifiers             |
/// |                             ....                              |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug, Clone)]
pub struct RtpHeader {
    pub version: u8,
    pub padding: bool,
    pub extension: bool,
    pub csrc_count: u8,
    pub marker: bool,
    pub payload_type: u8,
    pub sequence_number: u16,
    pub timestamp: u32,
    pub ssrc: u32,
    pub csrc_list: Vec<u32>,
    pub header_extension: Option<RtpHeaderExtension>,
}

impl Default for RtpHeader {
    fn default() -> Self {
        Self {
            version: 2,
            padding: false,
            extension: false,
            csrc_count: 0,
            marker: false,
            payload_type: 0,
            sequence_number: 0,
            timestamp: 0,
            ssrc: 0,
            csrc_list: vec![],
            header_extension: None,
        }
    }
}

// @see: RFC 3550 5.3.1 RTP Header Extension
/// profile defined (16 bits), length in 32-bit words (16 bits), then
/// length words of extension data
#[derive(Debug, Clone)]
pub struct RtpHeaderExtension {
    pub profile_defined: u16,
    pub length: u16,
    pub bytes: BytesMut,
}

impl DynamicSizedPacket for RtpHeaderExtension {
    fn get_packet_bytes_count(&self) -> usize {
        4 + (self.length as usize) * 4
    }
}

impl DynamicSizedPacket for RtpHeader {
    fn get_packet_bytes_count(&self) -> usize {
        12 + self.csrc_list.len() * 4
            + self
                .header_extension
                .as_ref()
                .map_or(0, |extension| extension.get_packet_bytes_count())
    }
}
