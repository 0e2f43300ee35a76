pub const ADDRESS_PREFIX: u8 = b'/';
pub const TYPE_TAG_PREFIX: u8 = b',';
pub const TERMINATOR: u8 = 0;

/// Segments are aligned to this many bytes.
pub const ALIGNMENT: usize = 4;
/// Width of the blob length prefix.
pub const BLOB_LENGTH_WIDTH: usize = 4;

pub const PADDING: [u8; ALIGNMENT] = [0; ALIGNMENT];

/// Zero bytes needed to bring `len` to the next multiple of four.
pub fn pad_size(len: usize) -> usize {
    (ALIGNMENT - (len % ALIGNMENT)) % ALIGNMENT
}

/// Padding after the type-tag string for `arg_count` tags.
///
/// The unpadded segment is the comma plus one byte per tag. When that is
/// already aligned a full word is added so the string stays terminated.
pub fn type_tag_padding(arg_count: usize) -> usize {
    match pad_size(arg_count + 1) {
        0 => ALIGNMENT,
        pad => pad,
    }
}

/// Encoded length of the address segment, terminator and padding included.
pub fn address_segment_len(address_len: usize) -> usize {
    let len = address_len + 1;
    len + pad_size(len)
}

/// Encoded length of the type-tag segment.
pub fn type_tag_segment_len(arg_count: usize) -> usize {
    1 + arg_count + type_tag_padding(arg_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_size_rounds_up_to_word() {
        assert_eq!(pad_size(0), 0);
        assert_eq!(pad_size(1), 3);
        assert_eq!(pad_size(4), 0);
        assert_eq!(pad_size(6), 2);
    }

    #[test]
    fn aligned_type_tags_get_a_full_word() {
        assert_eq!(type_tag_padding(0), 3);
        assert_eq!(type_tag_padding(2), 1);
        assert_eq!(type_tag_padding(3), 4);
        assert_eq!(type_tag_padding(7), 4);
        assert_eq!(type_tag_segment_len(3), 8);
    }

    #[test]
    fn address_segment_includes_terminator() {
        assert_eq!(address_segment_len(3), 4);
        assert_eq!(address_segment_len(4), 8);
    }
}
