use jpeg_encoder::{ColorType, Encoder};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};

pub const JPEG_QUALITY: u8 = 100;

pub fn write_rgb_jpeg(output: &Path, cols: u32, rows: u32, rgb_data: &[u8]) -> Result<()> {
    let (Ok(cols16), Ok(rows16)) = (u16::try_from(cols), u16::try_from(rows)) else {
        return Err(Error::Processing(format!(
            "{}x{} exceeds the JPEG dimension limit",
            cols, rows
        )));
    };
    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);
    let encoder = Encoder::new(&mut writer, JPEG_QUALITY);
    encoder.encode(rgb_data, cols16, rows16, ColorType::Rgb)?;
    writer.flush()?;
    Ok(())
}
