use crate::timing::OscTime;

pub struct WireReader<'a> {
    payload: &'a [u8],
}

impl<'a> WireReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    pub fn read_array<const N: usize>(&self, offset: usize) -> Option<[u8; N]> {
        self.payload
            .get(offset..offset.checked_add(N)?)
            .and_then(|bytes| bytes.try_into().ok())
    }

    pub fn read_u32_be(&self, offset: usize) -> Option<u32> {
        self.read_array(offset).map(u32::from_be_bytes)
    }

    pub fn read_i32_be(&self, offset: usize) -> Option<i32> {
        self.read_array(offset).map(i32::from_be_bytes)
    }

    pub fn read_f32_be(&self, offset: usize) -> Option<f32> {
        self.read_array(offset).map(f32::from_be_bytes)
    }

    pub fn read_f64_be(&self, offset: usize) -> Option<f64> {
        self.read_array(offset).map(f64::from_be_bytes)
    }

    pub fn read_time(&self, offset: usize) -> Option<OscTime> {
        Some(OscTime {
            seconds: self.read_u32_be(offset)?,
            fraction: self.read_u32_be(offset + 4)?,
        })
    }

    pub fn read_slice(&self, range: std::ops::Range<usize>) -> Option<&'a [u8]> {
        self.payload.get(range)
    }
}

#[cfg(test)]
mod tests {
    use super::WireReader;
    use crate::timing::OscTime;

    #[test]
    fn reads_big_endian_numbers() {
        let bytes = [0x00, 0x00, 0x01, 0x02, 0xff, 0xff, 0xff, 0xfe];
        let reader = WireReader::new(&bytes);
        assert_eq!(reader.read_u32_be(0), Some(0x0102));
        assert_eq!(reader.read_i32_be(4), Some(-2));
        assert_eq!(reader.read_time(0), Some(OscTime::new(0x0102, 0xffff_fffe)));
    }

    #[test]
    fn short_reads_are_none() {
        let reader = WireReader::new(&[1, 2, 3]);
        assert_eq!(reader.read_u32_be(0), None);
        assert_eq!(reader.read_f64_be(0), None);
        assert_eq!(reader.read_slice(1..3), Some(&[2u8, 3][..]));
        assert_eq!(reader.read_slice(2..5), None);
    }
}
