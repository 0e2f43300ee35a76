pub const SEPARATOR: u8 = b'/';
pub const WILDCARD: u8 = b'*';
pub const ANY_CHAR: u8 = b'?';

pub const CLASS_OPEN: u8 = b'[';
pub const CLASS_CLOSE: u8 = b']';
pub const CLASS_NEGATE: u8 = b'!';
pub const CLASS_RANGE: u8 = b'-';

pub const ALT_OPEN: u8 = b'{';
pub const ALT_CLOSE: u8 = b'}';
pub const ALT_SEPARATOR: u8 = b',';

/// Value returned for positions outside the string, like a C terminator.
pub const END: u8 = 0;
