use std::fmt::Display;
use std::io::Write;

use crate::{
    debugger::{Session, Variable},
    logger::log_header_bytes,
    Error,
};

pub mod layout;

use layout::{read_i32, read_u32, MatLayout};

const MAGIC_MASK: u32 = 0xFFFF_0000;
const MAGIC_VALUE: u32 = 0x42FF_0000;
const DEPTH_MASK: u32 = 7;
const CHANNEL_SHIFT: u32 = 3;
const CHANNEL_MASK: u32 = 63;

/// Element type of a matrix, taken from the low bits of its flags.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Depth {
    U8,
    I8,
    U16,
    I16,
    I32,
    F32,
    F64,
}

impl Depth {
    pub fn from_code(code: u32) -> crate::Result<Self> {
        match code {
            0 => Ok(Self::U8),
            1 => Ok(Self::I8),
            2 => Ok(Self::U16),
            3 => Ok(Self::I16),
            4 => Ok(Self::I32),
            5 => Ok(Self::F32),
            6 => Ok(Self::F64),
            _ => Err(Error::UnsupportedDepth(code)),
        }
    }

    pub fn element_size(&self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::I32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

impl Display for Depth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::U8 => write!(f, "CV_8U"),
            Self::I8 => write!(f, "CV_8S"),
            Self::U16 => write!(f, "CV_16U"),
            Self::I16 => write!(f, "CV_16S"),
            Self::I32 => write!(f, "CV_32S"),
            Self::F32 => write!(f, "CV_32F"),
            Self::F64 => write!(f, "CV_64F"),
        }
    }
}

pub fn depth_code(flags: u32) -> u32 {
    flags & DEPTH_MASK
}

pub fn channel_count(flags: u32) -> u32 {
    ((flags >> CHANNEL_SHIFT) & CHANNEL_MASK) + 1
}

pub fn has_magic_signature(flags: u32) -> bool {
    flags & MAGIC_MASK == MAGIC_VALUE
}

/// Header fields before the row stride has been dereferenced.
#[derive(Debug, PartialEq)]
struct HeaderFields {
    flags: u32,
    dims: i32,
    rows: i32,
    cols: i32,
    data_address: u64,
    step_address: u64,
}

impl HeaderFields {
    fn parse(layout: MatLayout, bytes: &[u8]) -> crate::Result<Self> {
        Ok(Self {
            flags: read_u32(bytes, layout.flags_offset())
                .ok_or(Error::InvalidMatrixHeader("flags"))?,
            dims: read_i32(bytes, layout.dims_offset())
                .ok_or(Error::InvalidMatrixHeader("dims"))?,
            rows: read_i32(bytes, layout.rows_offset())
                .ok_or(Error::InvalidMatrixHeader("rows"))?,
            cols: read_i32(bytes, layout.cols_offset())
                .ok_or(Error::InvalidMatrixHeader("cols"))?,
            data_address: layout
                .read_pointer(bytes, layout.data_offset())
                .ok_or(Error::InvalidMatrixHeader("data"))?,
            step_address: layout
                .read_pointer(bytes, layout.step_offset())
                .ok_or(Error::InvalidMatrixHeader("step"))?,
        })
    }
}

/// Geometry and element type of a matrix living in the debuggee.
#[derive(Clone, Debug, PartialEq)]
pub struct MatInfo {
    pub cols: usize,
    pub rows: usize,
    pub channels: usize,
    /// bytes between the starts of two consecutive rows
    pub step: usize,
    pub data_address: u64,
    pub depth: Depth,
}

impl MatInfo {
    /// Reads the header of the matrix stored in `variable`.
    pub fn read<E: Write>(session: &Session<E>, variable: &Variable) -> crate::Result<Self> {
        let layout = session.layout();
        let header = session.read_memory(variable.address, layout.header_size())?;
        log_header_bytes(variable.address, &header);
        let fields = HeaderFields::parse(layout, &header)?;
        Self::check_depth_and_dimensions(&fields)?;
        let step_bytes = session.read_memory(fields.step_address, layout.pointer_size())?;
        let step = layout
            .read_pointer(&step_bytes, 0)
            .ok_or(Error::InvalidMatrixHeader("step"))?;
        let info = Self::from_fields(&fields, step)?;
        log::debug!(
            "{}: {}x{} {} with {} channel(s), step {}, data at {:#x}",
            variable.name,
            info.cols,
            info.rows,
            info.depth,
            info.channels,
            info.step,
            info.data_address
        );
        Ok(info)
    }

    fn check_depth_and_dimensions(fields: &HeaderFields) -> crate::Result<()> {
        if !has_magic_signature(fields.flags) {
            log::warn!(
                "Flags {:#010x} lack the matrix signature, the variable may not be a cv::Mat",
                fields.flags
            );
        }
        Depth::from_code(depth_code(fields.flags))?;
        if fields.dims > 2 {
            return Err(Error::UnsupportedDimensions(fields.dims));
        }
        Ok(())
    }

    fn from_fields(fields: &HeaderFields, step: u64) -> crate::Result<Self> {
        let depth = Depth::from_code(depth_code(fields.flags))?;
        let rows = usize::try_from(fields.rows).map_err(|_| Error::InvalidMatrixHeader("rows"))?;
        let cols = usize::try_from(fields.cols).map_err(|_| Error::InvalidMatrixHeader("cols"))?;
        let step = usize::try_from(step).map_err(|_| Error::InvalidMatrixHeader("step"))?;
        Ok(Self {
            cols,
            rows,
            channels: channel_count(fields.flags) as usize,
            step,
            data_address: fields.data_address,
            depth,
        })
    }

    /// Size of one row without padding.
    pub fn row_bytes(&self) -> crate::Result<usize> {
        self.cols
            .checked_mul(self.channels)
            .and_then(|n| n.checked_mul(self.depth.element_size()))
            .ok_or(Error::MatrixTooLarge)
    }

    /// Number of bytes spanned by the element data, up to the last element
    /// of the last row.
    pub fn data_size(&self) -> crate::Result<usize> {
        if self.rows == 0 || self.cols == 0 {
            return Err(Error::EmptyMatrix);
        }
        let row_bytes = self.row_bytes()?;
        if self.step < row_bytes {
            return Err(Error::InvalidStride(self.step, row_bytes));
        }
        self.step
            .checked_mul(self.rows - 1)
            .and_then(|n| n.checked_add(row_bytes))
            .filter(|&size| size <= isize::MAX as usize)
            .ok_or(Error::MatrixTooLarge)
    }
}

#[cfg(test)]
mod test {
    use super::{channel_count, depth_code, has_magic_signature, Depth, HeaderFields, MatInfo};
    use crate::{
        debugger::{snapshot::MemorySnapshot, symbols::SymbolTable, Session, Variable},
        mat::layout::MatLayout,
        viewer::DisplaySettings,
        Error,
    };

    const CV_8UC3_FLAGS: u32 = 0x42FF_4010;

    fn header_64(flags: u32, dims: i32, rows: i32, cols: i32, data: u64, step_p: u64) -> Vec<u8> {
        let mut header = vec![0_u8; 96];
        header[0..4].copy_from_slice(&flags.to_le_bytes());
        header[4..8].copy_from_slice(&dims.to_le_bytes());
        header[8..12].copy_from_slice(&rows.to_le_bytes());
        header[12..16].copy_from_slice(&cols.to_le_bytes());
        header[16..24].copy_from_slice(&data.to_le_bytes());
        header[72..80].copy_from_slice(&step_p.to_le_bytes());
        header
    }

    fn session_with(header: Vec<u8>, step: u64) -> Session<Vec<u8>> {
        let mut snapshot = MemorySnapshot::new();
        snapshot
            .add_region(0x1000, header)
            .add_region(0x2000, step.to_le_bytes().to_vec());
        Session::new(
            Box::new(snapshot),
            SymbolTable::new(),
            MatLayout::Bits64,
            DisplaySettings::default(),
            Vec::new(),
        )
    }

    fn variable() -> Variable {
        Variable {
            name: "img".to_owned(),
            address: 0x1000,
        }
    }

    #[test]
    fn decode_flags() {
        assert_eq!(depth_code(CV_8UC3_FLAGS), 0);
        assert_eq!(channel_count(CV_8UC3_FLAGS), 3);
        assert!(has_magic_signature(CV_8UC3_FLAGS));
        // CV_32FC1
        assert_eq!(depth_code(0x42FF_4005), 5);
        assert_eq!(channel_count(0x42FF_4005), 1);
        assert!(!has_magic_signature(0x0000_0005));
    }

    #[test]
    fn channel_count_uses_six_bits() {
        // bit 9 is outside the channel field
        assert_eq!(channel_count(63 << 3), 64);
        assert_eq!(channel_count(1 << 9), 1);
    }

    #[test]
    fn depth_codes() {
        assert_eq!(Depth::from_code(2).unwrap(), Depth::U16);
        assert_eq!(Depth::F64.element_size(), 8);
        assert_eq!(Depth::I16.to_string(), "CV_16S");
        assert!(matches!(Depth::from_code(7), Err(Error::UnsupportedDepth(7))));
    }

    #[test]
    fn parse_header_fields() {
        let header = header_64(CV_8UC3_FLAGS, 2, 480, 640, 0xDEAD_0000, 0x2000);
        let fields = HeaderFields::parse(MatLayout::Bits64, &header).unwrap();
        assert_eq!(
            fields,
            HeaderFields {
                flags: CV_8UC3_FLAGS,
                dims: 2,
                rows: 480,
                cols: 640,
                data_address: 0xDEAD_0000,
                step_address: 0x2000,
            }
        );
    }

    #[test]
    fn parse_truncated_header() {
        let header = header_64(CV_8UC3_FLAGS, 2, 1, 1, 0, 0);
        let result = HeaderFields::parse(MatLayout::Bits64, &header[..40]);
        assert!(matches!(result, Err(Error::InvalidMatrixHeader("step"))));
    }

    #[test]
    fn read_mat_info() {
        let header = header_64(CV_8UC3_FLAGS, 2, 480, 640, 0xDEAD_0000, 0x2000);
        let session = session_with(header, 1920);
        let info = MatInfo::read(&session, &variable()).unwrap();
        assert_eq!(
            info,
            MatInfo {
                cols: 640,
                rows: 480,
                channels: 3,
                step: 1920,
                data_address: 0xDEAD_0000,
                depth: Depth::U8,
            }
        );
    }

    #[test]
    fn read_mat_info_32_bit() {
        let mut header = vec![0_u8; 56];
        header[0..4].copy_from_slice(&0x42FF_0002_u32.to_le_bytes());
        header[4..8].copy_from_slice(&2_i32.to_le_bytes());
        header[8..12].copy_from_slice(&4_i32.to_le_bytes());
        header[12..16].copy_from_slice(&5_i32.to_le_bytes());
        header[16..20].copy_from_slice(&0x8000_u32.to_le_bytes());
        header[44..48].copy_from_slice(&0x2000_u32.to_le_bytes());
        let mut snapshot = MemorySnapshot::new();
        snapshot
            .add_region(0x1000, header)
            .add_region(0x2000, 12_u32.to_le_bytes().to_vec());
        let session = Session::new(
            Box::new(snapshot),
            SymbolTable::new(),
            MatLayout::Bits32,
            DisplaySettings::default(),
            Vec::new(),
        );
        let info = MatInfo::read(&session, &variable()).unwrap();
        assert_eq!(info.depth, Depth::U16);
        assert_eq!((info.cols, info.rows, info.step), (5, 4, 12));
        assert_eq!(info.data_address, 0x8000);
    }

    #[test]
    fn unsupported_depth() {
        let header = header_64(0x42FF_4007, 2, 2, 2, 0, 0x2000);
        let session = session_with(header, 4);
        assert!(matches!(
            MatInfo::read(&session, &variable()),
            Err(Error::UnsupportedDepth(7))
        ));
    }

    #[test]
    fn unsupported_dimensions() {
        let header = header_64(CV_8UC3_FLAGS, 3, -1, -1, 0, 0x2000);
        let session = session_with(header, 4);
        assert!(matches!(
            MatInfo::read(&session, &variable()),
            Err(Error::UnsupportedDimensions(3))
        ));
    }

    #[test]
    fn negative_rows() {
        let header = header_64(CV_8UC3_FLAGS, 2, -4, 2, 0, 0x2000);
        let session = session_with(header, 6);
        assert!(matches!(
            MatInfo::read(&session, &variable()),
            Err(Error::InvalidMatrixHeader("rows"))
        ));
    }

    #[test]
    fn data_size_skips_trailing_padding() {
        let info = MatInfo {
            cols: 3,
            rows: 2,
            channels: 1,
            step: 8,
            data_address: 0,
            depth: Depth::U16,
        };
        assert_eq!(info.row_bytes().unwrap(), 6);
        assert_eq!(info.data_size().unwrap(), 14);
    }

    #[test]
    fn data_size_rejects_short_stride() {
        let info = MatInfo {
            cols: 4,
            rows: 2,
            channels: 3,
            step: 8,
            data_address: 0,
            depth: Depth::U8,
        };
        assert!(matches!(info.data_size(), Err(Error::InvalidStride(8, 12))));
    }

    #[test]
    fn data_size_of_empty_matrix() {
        let info = MatInfo {
            cols: 0,
            rows: 0,
            channels: 1,
            step: 0,
            data_address: 0,
            depth: Depth::U8,
        };
        assert!(matches!(info.data_size(), Err(Error::EmptyMatrix)));
    }

    #[test]
    fn data_size_beyond_allocation_limit() {
        let info = MatInfo {
            cols: 1,
            rows: 4,
            channels: 1,
            step: 1 << (usize::BITS - 2),
            data_address: 0,
            depth: Depth::U8,
        };
        assert!(matches!(info.data_size(), Err(Error::MatrixTooLarge)));
    }
}
