use std::{
    fs::{File, OpenOptions},
    io::{BufWriter, Write},
    path::Path,
};

use image::{codecs::png::PngEncoder, ImageBuffer, Luma, Pixel, PixelWithColorType, Rgb};

use crate::{
    pixels::{PixelBuffer, PixelFormat},
    Error,
};

pub trait ImageWriter {
    fn write_image(&mut self) -> crate::Result<()>;
}

pub struct PngImageWriter<'a, T: Write> {
    writer: T,
    image: &'a PixelBuffer,
}

impl<'a, T: Write> PngImageWriter<'a, T> {
    pub fn new(writer: T, image: &'a PixelBuffer) -> Self {
        Self { writer, image }
    }

    fn encode<P>(&mut self) -> crate::Result<()>
    where
        P: Pixel<Subpixel = u8> + PixelWithColorType,
    {
        let image = self.image;
        let buffer =
            ImageBuffer::<P, &[u8]>::from_raw(image.width(), image.height(), image.samples())
                .ok_or_else(|| {
                    Error::FailedToEncodeImage(
                        "Buffer size does not match image dimensions".to_owned(),
                    )
                })?;
        buffer
            .write_with_encoder(PngEncoder::new(&mut self.writer))
            .map_err(|e| Error::FailedToEncodeImage(e.to_string()))
    }
}

impl<T: Write> ImageWriter for PngImageWriter<'_, T> {
    fn write_image(&mut self) -> crate::Result<()> {
        match self.image.format() {
            PixelFormat::Gray => self.encode::<Luma<u8>>()?,
            PixelFormat::Rgb => self.encode::<Rgb<u8>>()?,
        }
        self.writer
            .flush()
            .map_err(|e| Error::FailedToEncodeImage(e.to_string()))
    }
}

fn open_output_file(file_path: &Path) -> crate::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(file_path)
        .map_err(|e| Error::UnableToOpenOutputFileForWriting(file_path.display().to_string(), e))
}

/// Writes `image` as a PNG file, replacing any previous file at `file_path`.
pub fn save_png(file_path: &Path, image: &PixelBuffer) -> crate::Result<()> {
    let output_file = open_output_file(file_path)?;
    let mut writer = PngImageWriter::new(BufWriter::new(output_file), image);
    writer.write_image()
}
