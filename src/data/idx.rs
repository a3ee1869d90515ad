//! Parsing of the big-endian IDX files MNIST ships in.

use crate::error::{Result, TrainErr};

/// Magic number of an IDX file holding unsigned bytes in one dimension.
pub const LABELS_MAGIC: u32 = 0x801;

/// Magic number of an IDX file holding unsigned bytes in three dimensions.
pub const IMAGES_MAGIC: u32 = 0x803;

const LABELS_HEADER: usize = 8;
const IMAGES_HEADER: usize = 16;

/// A decoded image file: `count` images of `rows * cols` pixels scaled to `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Images {
    pub rows: usize,
    pub cols: usize,
    pub pixels: Vec<Vec<f64>>,
}

fn read_u32(bytes: &[u8], at: usize, what: &'static str) -> Result<u32> {
    bytes
        .get(at..at + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_be_bytes)
        .ok_or_else(|| TrainErr::malformed(what, format!("truncated header at byte {at}")))
}

fn check_magic(bytes: &[u8], expected: u32, what: &'static str) -> Result<()> {
    let magic = read_u32(bytes, 0, what)?;
    if magic != expected {
        return Err(TrainErr::malformed(
            what,
            format!("bad magic number {magic:#x}, expected {expected:#x}"),
        ));
    }
    Ok(())
}

fn overflow(what: &'static str) -> TrainErr {
    TrainErr::malformed(what, "size overflows")
}

fn body<'a>(bytes: &'a [u8], header: usize, len: usize, what: &'static str) -> Result<&'a [u8]> {
    let end = header.checked_add(len).ok_or_else(|| overflow(what))?;
    bytes.get(header..end).ok_or_else(|| {
        TrainErr::malformed(
            what,
            format!(
                "expected {len} bytes of data, found {}",
                bytes.len().saturating_sub(header)
            ),
        )
    })
}

/// Parses an IDX label file.
///
/// # Errors
/// `MalformedData` if the magic number is wrong or the file is shorter than its header
/// claims.
pub fn parse_labels(bytes: &[u8]) -> Result<Vec<u8>> {
    const WHAT: &str = "label file";

    check_magic(bytes, LABELS_MAGIC, WHAT)?;
    let count = read_u32(bytes, 4, WHAT)? as usize;

    Ok(body(bytes, LABELS_HEADER, count, WHAT)?.to_vec())
}

/// Parses an IDX image file, scaling every pixel by `1 / 255`.
///
/// # Errors
/// `MalformedData` if the magic number is wrong, the header's dimensions overflow or
/// the file is shorter than its header claims.
pub fn parse_images(bytes: &[u8]) -> Result<Images> {
    const WHAT: &str = "image file";

    check_magic(bytes, IMAGES_MAGIC, WHAT)?;
    let count = read_u32(bytes, 4, WHAT)? as usize;
    let rows = read_u32(bytes, 8, WHAT)? as usize;
    let cols = read_u32(bytes, 12, WHAT)? as usize;

    let size = rows.checked_mul(cols).ok_or_else(|| overflow(WHAT))?;
    let len = count.checked_mul(size).ok_or_else(|| overflow(WHAT))?;
    let data = body(bytes, IMAGES_HEADER, len, WHAT)?;

    let pixels = data
        .chunks_exact(size.max(1))
        .take(count)
        .map(|img| img.iter().map(|&p| p as f64 / 255.).collect())
        .collect();

    Ok(Images { rows, cols, pixels })
}
