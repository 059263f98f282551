//! PNG coding for tile payloads. Every colour type is normalised to RGBA8.

use std::io::{Read, Write};

use ndarray::Array3;
use png::{BitDepth, ColorType, Transformations};

use crate::error::TileError;

/// Decode a PNG stream into an RGBA8 array of shape `(height, width, 4)`.
///
/// Reading stops at the end of the first frame, so `reader` may be a live
/// socket with trailing data.
pub fn decode_png<R: Read>(reader: R) -> Result<Array3<u8>, TileError> {
    let mut decoder = png::Decoder::new(reader);
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0_u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;

    if info.bit_depth != BitDepth::Eight {
        return Err(TileError::Shape(format!(
            "unsupported bit depth {:?} after expansion",
            info.bit_depth
        )));
    }

    let (width, height) = (info.width as usize, info.height as usize);
    let channels = info.color_type.samples();
    let mut rgba = Vec::with_capacity(width * height * 4);
    for row in buf.chunks(info.line_size).take(height) {
        for px in row[..width * channels].chunks_exact(channels) {
            match info.color_type {
                ColorType::Rgba => rgba.extend_from_slice(px),
                ColorType::Rgb => rgba.extend_from_slice(&[px[0], px[1], px[2], u8::MAX]),
                ColorType::GrayscaleAlpha => rgba.extend_from_slice(&[px[0], px[0], px[0], px[1]]),
                ColorType::Grayscale => rgba.extend_from_slice(&[px[0], px[0], px[0], u8::MAX]),
                ColorType::Indexed => {
                    return Err(TileError::Shape("palette was not expanded".into()));
                }
            }
        }
    }

    Array3::from_shape_vec((height, width, 4), rgba).map_err(|e| TileError::Shape(e.to_string()))
}

/// Encode an RGBA8 array of shape `(height, width, 4)` as PNG.
pub fn encode_png<W: Write>(writer: W, pixels: &Array3<u8>) -> Result<(), TileError> {
    let (height, width, channels) = pixels.dim();
    if channels != 4 {
        return Err(TileError::Shape(format!("expected 4 channels, got {channels}")));
    }
    let data: Vec<u8> = pixels.iter().copied().collect();

    let mut encoder = png::Encoder::new(writer, width as u32, height as u32);
    encoder.set_color(ColorType::Rgba);
    encoder.set_depth(BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&data)?;
    writer.finish()?;
    Ok(())
}
