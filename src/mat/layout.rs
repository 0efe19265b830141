use clap::{builder::PossibleValue, ValueEnum};

const FLAGS_OFFSET: usize = 0;
const DIMS_OFFSET: usize = 4;
const ROWS_OFFSET: usize = 8;
const COLS_OFFSET: usize = 12;
const DATA_OFFSET: usize = 16;

/// Field offsets of `cv::Mat` for a target pointer width.
///
/// The fields read here sit at the same offsets in the 2.4 and the 3.x/4.x
/// headers: `refcount` in 2.4 and `u` in later versions both come after
/// `data` and before `step`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum MatLayout {
    #[default]
    Bits64,
    Bits32,
}

impl ValueEnum for MatLayout {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Bits64, Self::Bits32]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        match self {
            Self::Bits64 => Some(PossibleValue::new("64")),
            Self::Bits32 => Some(PossibleValue::new("32")),
        }
    }
}

impl MatLayout {
    pub fn pointer_size(&self) -> usize {
        match self {
            Self::Bits64 => 8,
            Self::Bits32 => 4,
        }
    }

    pub fn flags_offset(&self) -> usize {
        FLAGS_OFFSET
    }

    pub fn dims_offset(&self) -> usize {
        DIMS_OFFSET
    }

    pub fn rows_offset(&self) -> usize {
        ROWS_OFFSET
    }

    pub fn cols_offset(&self) -> usize {
        COLS_OFFSET
    }

    pub fn data_offset(&self) -> usize {
        DATA_OFFSET
    }

    /// Offset of `step.p`, the pointer to the per-dimension strides.
    pub fn step_offset(&self) -> usize {
        // data, datastart, dataend, datalimit, allocator, u and size.p
        DATA_OFFSET + 7 * self.pointer_size()
    }

    /// Number of bytes to fetch to cover every field read from the header.
    pub fn header_size(&self) -> usize {
        self.step_offset() + self.pointer_size()
    }

    /// Reads a pointer-sized little-endian value at `offset`.
    pub fn read_pointer(&self, bytes: &[u8], offset: usize) -> Option<u64> {
        match self {
            Self::Bits64 => bytes
                .get(offset..offset + 8)
                .and_then(|b| b.try_into().ok())
                .map(u64::from_le_bytes),
            Self::Bits32 => bytes
                .get(offset..offset + 4)
                .and_then(|b| b.try_into().ok())
                .map(|b| u32::from_le_bytes(b) as u64),
        }
    }
}

pub fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    bytes
        .get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
}

pub fn read_i32(bytes: &[u8], offset: usize) -> Option<i32> {
    read_u32(bytes, offset).map(|value| value as i32)
}

#[cfg(test)]
mod test {
    use super::{read_i32, read_u32, MatLayout};

    #[test]
    fn offsets_64_bit() {
        let layout = MatLayout::Bits64;
        assert_eq!(layout.data_offset(), 16);
        assert_eq!(layout.step_offset(), 72);
        assert_eq!(layout.header_size(), 80);
    }

    #[test]
    fn offsets_32_bit() {
        let layout = MatLayout::Bits32;
        assert_eq!(layout.data_offset(), 16);
        assert_eq!(layout.step_offset(), 44);
        assert_eq!(layout.header_size(), 48);
    }

    #[test]
    fn read_pointers() {
        let bytes = [0x78, 0x56, 0x34, 0x12, 0xEF, 0xCD, 0xAB, 0x89];
        assert_eq!(
            MatLayout::Bits64.read_pointer(&bytes, 0),
            Some(0x89ABCDEF12345678)
        );
        assert_eq!(MatLayout::Bits32.read_pointer(&bytes, 4), Some(0x89ABCDEF));
        assert_eq!(MatLayout::Bits64.read_pointer(&bytes, 1), None);
    }

    #[test]
    fn read_scalars() {
        let bytes = [0xFF, 0xFF, 0xFF, 0xFF, 0x02, 0x00, 0x00, 0x00];
        assert_eq!(read_i32(&bytes, 0), Some(-1));
        assert_eq!(read_u32(&bytes, 4), Some(2));
        assert_eq!(read_u32(&bytes, 6), None);
    }

    #[test]
    fn default_layout_is_64_bit() {
        assert_eq!(MatLayout::default(), MatLayout::Bits64);
    }
}
