use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tiff::encoder::{TiffEncoder, colortype};

use crate::error::Result;

pub fn write_tiff_rgba8(output: &Path, cols: u32, rows: u32, data: &[u8]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(output)?);
    let mut encoder = TiffEncoder::new(&mut writer)?;
    encoder.write_image::<colortype::RGBA8>(cols, rows, data)?;
    drop(encoder);
    writer.flush()?;
    Ok(())
}

pub fn write_tiff_rgb8(output: &Path, cols: u32, rows: u32, data: &[u8]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(output)?);
    let mut encoder = TiffEncoder::new(&mut writer)?;
    encoder.write_image::<colortype::RGB8>(cols, rows, data)?;
    drop(encoder);
    writer.flush()?;
    Ok(())
}
