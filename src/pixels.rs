use crate::{
    mat::{Depth, MatInfo},
    Error,
};

pub mod element;

use element::{Element, FixedScale};

const DISPLAY_MAX: f64 = 255.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PixelFormat {
    Gray,
    Rgb,
}

impl PixelFormat {
    pub fn from_channels(channels: usize) -> crate::Result<Self> {
        match channels {
            1 => Ok(Self::Gray),
            3 => Ok(Self::Rgb),
            _ => Err(Error::UnsupportedChannelCount(channels as u32)),
        }
    }
}

/// 8-bit image data ready to be encoded, rows packed without padding.
#[derive(Debug)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    samples: Vec<u8>,
}

impl PixelBuffer {
    /// Converts the raw element data of a matrix, as read from `info.data_address`,
    /// into displayable pixels.
    pub fn decode(info: &MatInfo, bytes: &[u8]) -> crate::Result<Self> {
        let format = PixelFormat::from_channels(info.channels)?;
        let data_size = info.data_size()?;
        if bytes.len() < data_size {
            return Err(Error::MemoryReadFailed(info.data_address, data_size));
        }
        let width = u32::try_from(info.cols).map_err(|_| Error::MatrixTooLarge)?;
        let height = u32::try_from(info.rows).map_err(|_| Error::MatrixTooLarge)?;
        let row_bytes = info.row_bytes()?;
        let rows = || {
            bytes[..data_size]
                .chunks(info.step)
                .map(move |row| &row[..row_bytes])
        };

        let mut samples = match info.depth {
            Depth::U8 => scale_fixed::<u8, _>(rows()),
            Depth::I8 => scale_fixed::<i8, _>(rows()),
            Depth::U16 => scale_fixed::<u16, _>(rows()),
            Depth::I16 => scale_fixed::<i16, _>(rows()),
            Depth::I32 => scale_fixed::<i32, _>(rows()),
            Depth::F32 => normalize(
                decode_elements::<f32, _>(rows())
                    .map(f64::from)
                    .collect(),
            ),
            Depth::F64 => normalize(decode_elements::<f64, _>(rows()).collect()),
        };
        if format == PixelFormat::Rgb {
            swap_blue_and_red(&mut samples);
        }

        Ok(Self {
            width,
            height,
            format,
            samples,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }
}

fn decode_elements<'a, T, I>(rows: I) -> impl Iterator<Item = T> + 'a
where
    T: Element + 'a,
    I: Iterator<Item = &'a [u8]> + 'a,
{
    rows.flat_map(|row| row.chunks_exact(T::SIZE).map(T::from_le_slice))
}

fn scale_fixed<'a, T, I>(rows: I) -> Vec<u8>
where
    T: Element + FixedScale + 'a,
    I: Iterator<Item = &'a [u8]> + 'a,
{
    decode_elements::<T, I>(rows)
        .map(FixedScale::to_display)
        .collect()
}

/// Stretches the finite value range linearly onto 0..=255.
fn normalize(values: Vec<f64>) -> Vec<u8> {
    let (min, max) = values
        .iter()
        .filter(|value| value.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &value| {
            (min.min(value), max.max(value))
        });
    let range = max - min;
    if !(range > 0.0 && range.is_finite()) {
        return vec![0; values.len()];
    }
    values
        .into_iter()
        .map(|value| {
            if value.is_nan() {
                0
            } else {
                // `as` saturates, so infinities land on 0 and 255
                ((value - min) / range * DISPLAY_MAX) as u8
            }
        })
        .collect()
}

fn swap_blue_and_red(samples: &mut [u8]) {
    for pixel in samples.chunks_exact_mut(3) {
        pixel.swap(0, 2);
    }
}
