pub(crate) fn rtp_need_padding(size: usize) -> bool {
    !size.is_multiple_of(4)
}

pub(crate) fn rtp_get_padding_size(size: usize) -> usize {
    (4 - (size % 4)) % 4
}

pub(crate) fn rtp_make_padding_bytes(size: usize) -> Option<Vec<u8>> {
    if !rtp_need_padding(size) {
        return None;
    }

    let padding_size = rtp_get_padding_size(size);
    let mut bytes = vec![0; padding_size];
    bytes[padding_size - 1] = padding_size as u8;
    Some(bytes)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_padding_size() {
        assert_eq!(rtp_get_padding_size(4), 0);
        assert_eq!(rtp_get_padding_size(5), 3);
        assert_eq!(rtp_get_padding_size(6), 2);
        assert_eq!(rtp_get_padding_size(7), 1);
        assert!(!rtp_need_padding(8));
        assert!(rtp_need_padding(9));
    }

    #[test]
    fn test_padding_bytes() {
        assert!(rtp_make_padding_bytes(8).is_none());
        assert_eq!(rtp_make_padding_bytes(5), Some(vec![0, 0, 3]));
        assert_eq!(rtp_make_padding_bytes(7), Some(vec![1]));
    }
}
