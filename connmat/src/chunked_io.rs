//! Positioned, size-capped transfers between files and element buffers
//!
//! No single read or write call ever exceeds [`MAX_IO_CHUNK_BYTES`], and a
//! transfer that ends early is reported as [`Error::ShortTransfer`] rather
//! than retried.

use crate::error::{Error, Result};
use connmat_core::{swap_in_place, MatrixElement, MatrixLayout, MAX_IO_CHUNK_BYTES};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};

/// Seek `handle` to an absolute byte position
pub(crate) fn seek_to<S: Seek>(
    handle: &mut S,
    position: u64,
    context: &'static str,
) -> Result<()> {
    let landed = handle
        .seek(SeekFrom::Start(position))
        .map_err(Error::io(context))?;
    if landed != position {
        return Err(Error::Io {
            context,
            source: std::io::Error::other("seek landed at the wrong position"),
        });
    }
    Ok(())
}

fn read_piece<R: Read>(reader: &mut R, piece: &mut [u8], context: &'static str) -> Result<()> {
    let mut filled = 0;
    while filled < piece.len() {
        match reader.read(&mut piece[filled..]) {
            Ok(0) => {
                return Err(Error::ShortTransfer {
                    context,
                    expected: piece.len(),
                    transferred: filled,
                })
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(Error::Io { context, source: e }),
        }
    }
    Ok(())
}

fn write_piece<W: Write>(writer: &mut W, piece: &[u8], context: &'static str) -> Result<()> {
    let mut written = 0;
    while written < piece.len() {
        match writer.write(&piece[written..]) {
            Ok(0) => {
                return Err(Error::ShortTransfer {
                    context,
                    expected: piece.len(),
                    transferred: written,
                })
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(Error::Io { context, source: e }),
        }
    }
    Ok(())
}

/// Fill `buf` from the current position, in pieces of at most `max_piece` bytes
pub(crate) fn read_exact_in_pieces<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    max_piece: usize,
    context: &'static str,
) -> Result<()> {
    for piece in buf.chunks_mut(max_piece) {
        read_piece(reader, piece, context)?;
    }
    Ok(())
}

/// Write all of `buf` at the current position, in pieces of at most `max_piece` bytes
pub(crate) fn write_all_in_pieces<W: Write>(
    writer: &mut W,
    buf: &[u8],
    max_piece: usize,
    context: &'static str,
) -> Result<()> {
    for piece in buf.chunks(max_piece) {
        write_piece(writer, piece, context)?;
    }
    Ok(())
}

/// Fill `buf` from the current position, in pieces of at most [`MAX_IO_CHUNK_BYTES`]
pub fn read_exact_chunked<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    context: &'static str,
) -> Result<()> {
    read_exact_in_pieces(reader, buf, MAX_IO_CHUNK_BYTES, context)
}

/// Write all of `buf` at the current position, in pieces of at most [`MAX_IO_CHUNK_BYTES`]
pub fn write_all_chunked<W: Write>(
    writer: &mut W,
    buf: &[u8],
    context: &'static str,
) -> Result<()> {
    write_all_in_pieces(writer, buf, MAX_IO_CHUNK_BYTES, context)
}

/// Read from the current position until `buf` is full or the file ends
///
/// Returns the number of bytes filled. Reaching end of file is not an error.
pub fn read_available_chunked<R: Read>(
    reader: &mut R,
    buf: &mut [u8],
    context: &'static str,
) -> Result<usize> {
    let mut filled = 0;
    for piece in buf.chunks_mut(MAX_IO_CHUNK_BYTES) {
        match read_piece(reader, piece, context) {
            Ok(()) => filled += piece.len(),
            Err(Error::ShortTransfer { transferred, .. }) => return Ok(filled + transferred),
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Read `out.len()` elements starting at `position`, converting to host order if `swap`
pub fn read_elements<T, R>(
    handle: &mut R,
    position: u64,
    out: &mut [T],
    swap: bool,
    context: &'static str,
) -> Result<()>
where
    T: MatrixElement,
    R: Read + Seek,
{
    seek_to(handle, position, context)?;
    read_exact_chunked(handle, bytemuck::cast_slice_mut(out), context)?;
    if swap {
        swap_in_place(out);
    }
    Ok(())
}

/// Write elements already in file byte order starting at `position`
pub fn write_elements<T, W>(
    handle: &mut W,
    position: u64,
    data: &[T],
    context: &'static str,
) -> Result<()>
where
    T: MatrixElement,
    W: Write + Seek,
{
    seek_to(handle, position, context)?;
    write_all_chunked(handle, bytemuck::cast_slice(data), context)
}

/// Load a whole matrix one row per read call, leaving values in file byte order
pub fn read_rows_into<T, R>(reader: &mut R, layout: &MatrixLayout, out: &mut [T]) -> Result<()>
where
    T: MatrixElement,
    R: Read + Seek,
{
    MatrixLayout::check_len(layout.element_count(), out.len())?;
    if layout.cols() == 0 {
        return Ok(());
    }
    seek_to(reader, layout.offset(), "Failed to seek to matrix data")?;
    for row in out.chunks_exact_mut(layout.cols()) {
        read_exact_chunked(reader, bytemuck::cast_slice_mut(row), "Failed to read matrix row")?;
    }
    Ok(())
}

/// Copy every row of a matrix from `src` to `dst`, one row at a time
///
/// Rows are read at `src_layout` and written at `dst_layout`; both must
/// describe the same shape. When `swap` is set each row's byte order is
/// reversed in transit.
pub fn copy_rows<T, R, W>(
    src: &mut R,
    dst: &mut W,
    src_layout: &MatrixLayout,
    dst_layout: &MatrixLayout,
    swap: bool,
) -> Result<()>
where
    T: MatrixElement,
    R: Read + Seek,
    W: Write + Seek,
{
    MatrixLayout::check_len(src_layout.element_count(), dst_layout.element_count())?;
    if src_layout.cols() == 0 {
        return Ok(());
    }
    seek_to(src, src_layout.offset(), "Failed to seek source matrix data")?;
    seek_to(dst, dst_layout.offset(), "Failed to seek destination matrix data")?;
    let mut row = vec![T::default(); src_layout.cols()];
    for _ in 0..src_layout.rows() {
        read_exact_chunked(src, bytemuck::cast_slice_mut(&mut row), "Failed to read row for copy")?;
        if swap {
            swap_in_place(&mut row);
        }
        write_all_chunked(dst, bytemuck::cast_slice(&row), "Failed to write row for copy")?;
    }
    Ok(())
}
