/// A matrix element as stored in the debuggee (little-endian).
pub trait Element: Copy {
    const SIZE: usize;

    /// Decodes one element from exactly `SIZE` bytes.
    fn from_le_slice(bytes: &[u8]) -> Self;
}

macro_rules! impl_element {
    ($($type:ty),*) => {
        $(
            impl Element for $type {
                const SIZE: usize = std::mem::size_of::<$type>();

                fn from_le_slice(bytes: &[u8]) -> Self {
                    let mut buffer = [0_u8; std::mem::size_of::<$type>()];
                    buffer.copy_from_slice(bytes);
                    <$type>::from_le_bytes(buffer)
                }
            }
        )*
    };
}

impl_element!(u8, i8, u16, i16, i32, f32, f64);

/// Integer elements map onto 8 bits with a fixed offset and shift.
pub trait FixedScale {
    fn to_display(self) -> u8;
}

impl FixedScale for u8 {
    fn to_display(self) -> u8 {
        self
    }
}

impl FixedScale for i8 {
    fn to_display(self) -> u8 {
        (self as i16 + 128) as u8
    }
}

impl FixedScale for u16 {
    fn to_display(self) -> u8 {
        (self >> 8) as u8
    }
}

impl FixedScale for i16 {
    fn to_display(self) -> u8 {
        ((self as i32 + 32768) >> 8) as u8
    }
}

impl FixedScale for i32 {
    fn to_display(self) -> u8 {
        ((self as i64 + 2147483648) >> 24) as u8
    }
}
