//! Dense connectivity-matrix store with in-memory and on-disk caching
//!
//! A [`MatrixStore`] serves row, column and whole-matrix access to a
//! row-major matrix of floating-point values held in a file that may use
//! either byte order.
//!
//! In [`CacheMode::InMemory`] the file is read once at setup and every later
//! operation works on an owned buffer. In [`CacheMode::OnDisk`] reads go to
//! the original file until the first write, which copies the matrix into a
//! writable cache file; from then on the cache serves everything.

use crate::chunked_io::{
    copy_rows, read_available_chunked, read_elements, read_rows_into, seek_to, write_elements,
};
use crate::config::{CachePolicy, MatrixSetup};
use crate::error::{Error, Result};
use connmat_core::{swap_in_place, CacheMode, MatrixElement, MatrixError, MatrixLayout, SwapGuard};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Which file services reads in on-disk mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadTarget {
    /// The original, read-only matrix file
    Source,
    /// The writable cache file
    Cache,
}

/// Whether two paths name the same existing file
fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn open_destination(path: &Path) -> Result<File> {
    // No truncation: the region before the data offset belongs to the header writer
    OpenOptions::new()
        .write(true)
        .create(true)
        .open(path)
        .map_err(Error::io("Failed to open destination file"))
}

/// File handles of an on-disk store
struct DiskBacking {
    source: Option<File>,
    cache: File,
    cache_path: Option<PathBuf>,
    read_target: ReadTarget,
    promoted: bool,
    column_warned: bool,
}

impl DiskBacking {
    fn open(matrix_file: Option<&Path>, policy: &CachePolicy) -> Result<Self> {
        let cache = match policy {
            CachePolicy::Anonymous => tempfile::tempfile()
                .map_err(Error::io("Failed to create temporary cache file"))?,
            CachePolicy::Named(path) => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .open(path)
                .map_err(Error::io("Failed to open cache file"))?,
        };

        // A cache that is the matrix file itself is already the writable copy
        let source = match matrix_file {
            Some(path)
                if path.exists()
                    && !policy
                        .path()
                        .is_some_and(|cache_path| same_file(path, cache_path)) =>
            {
                Some(File::open(path).map_err(Error::io("Failed to open matrix file"))?)
            }
            _ => None,
        };

        let read_target = if source.is_some() {
            ReadTarget::Source
        } else {
            ReadTarget::Cache
        };

        Ok(Self {
            source,
            cache,
            cache_path: policy.path().map(Path::to_path_buf),
            read_target,
            promoted: false,
            column_warned: false,
        })
    }

    fn reader(&mut self) -> &mut File {
        match (self.read_target, self.source.as_mut()) {
            (ReadTarget::Source, Some(source)) => source,
            _ => &mut self.cache,
        }
    }

    /// Make the cache the sole read and write target, copying the matrix into it once
    fn promote<T: MatrixElement>(&mut self, layout: &MatrixLayout) -> Result<()> {
        if self.promoted {
            return Ok(());
        }
        if self.read_target == ReadTarget::Source {
            if let Some(source) = self.source.as_mut() {
                log::debug!(
                    "Copying {}x{} matrix into cache before first write",
                    layout.rows(),
                    layout.cols()
                );
                // Bytes are copied verbatim; source and cache share a byte order
                copy_rows::<T, _, _>(source, &mut self.cache, layout, layout, false)?;
            }
            self.read_target = ReadTarget::Cache;
            self.source = None;
        }
        self.promoted = true;
        Ok(())
    }

    fn warn_column_access(&mut self) {
        if !self.column_warned {
            log::warn!("Column access on an on-disk matrix seeks once per element and is slow");
            self.column_warned = true;
        }
    }

    fn sync(&mut self) -> Result<()> {
        self.cache
            .sync_data()
            .map_err(Error::io("Failed to flush cache file"))
    }
}

enum Backing<T> {
    Memory(Vec<T>),
    Disk(DiskBacking),
}

/// State established by a successful `setup`
struct ActiveMatrix<T> {
    layout: MatrixLayout,
    needs_swap: bool,
    backing: Backing<T>,
}

fn load_memory<T: MatrixElement>(
    matrix_file: Option<&Path>,
    layout: &MatrixLayout,
    needs_swap: bool,
) -> Result<Vec<T>> {
    let mut data = Vec::new();
    data.try_reserve_exact(layout.element_count())
        .map_err(|_| MatrixError::SizeOverflow)?;
    data.resize(layout.element_count(), T::default());

    match matrix_file {
        Some(path) if path.exists() => {
            let mut file = File::open(path).map_err(Error::io("Failed to open matrix file"))?;
            read_rows_into(&mut file, layout, &mut data)?;
            if needs_swap {
                swap_in_place(&mut data);
            }
        }
        _ => log::debug!("Matrix file absent, starting from a zeroed buffer"),
    }
    Ok(data)
}

/// Row-major matrix store over a backing file
///
/// Construct with [`MatrixStore::new`], name the file with
/// [`set_matrix_file`](Self::set_matrix_file), then call
/// [`setup`](Self::setup) with the header-supplied shape. Every other
/// operation fails with [`MatrixError::Uninitialized`] until setup succeeds.
///
/// Not safe for concurrent use; every operation takes `&mut self`.
pub struct MatrixStore<T: MatrixElement = f32> {
    matrix_file: Option<PathBuf>,
    cache_policy: CachePolicy,
    active: Option<ActiveMatrix<T>>,
}

impl<T: MatrixElement> Default for MatrixStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: MatrixElement> MatrixStore<T> {
    /// Create an empty, uninitialized store
    pub fn new() -> Self {
        Self {
            matrix_file: None,
            cache_policy: CachePolicy::Anonymous,
            active: None,
        }
    }

    /// Name the backing file and cache policy, resetting the store
    ///
    /// Any open handles are released and the store returns to the
    /// uninitialized state.
    pub fn set_matrix_file<P: AsRef<Path>>(&mut self, path: P, cache_policy: CachePolicy) {
        self.active = None;
        self.matrix_file = Some(path.as_ref().to_path_buf());
        self.cache_policy = cache_policy;
    }

    /// The backing file, if one was named
    pub fn matrix_file(&self) -> Option<&Path> {
        self.matrix_file.as_deref()
    }

    pub fn cache_policy(&self) -> &CachePolicy {
        &self.cache_policy
    }

    /// Establish the matrix shape, data offset, caching strategy and byte order
    ///
    /// `dimensions` must hold exactly `[rows, cols]`. A previous setup is torn
    /// down first, releasing its handles. In memory mode an existing backing
    /// file is read in one row per call; a missing file yields a zeroed
    /// matrix. In on-disk mode the cache file is opened (or created) and the
    /// backing file, if it exists, becomes the initial read target.
    pub fn setup(
        &mut self,
        dimensions: &[usize],
        offset: u64,
        cache_mode: CacheMode,
        needs_swap: bool,
    ) -> Result<()> {
        self.active = None;

        let layout = MatrixLayout::from_dimensions(dimensions, offset, T::size_bytes())?;
        let backing = match cache_mode {
            CacheMode::InMemory => {
                Backing::Memory(load_memory(self.matrix_file.as_deref(), &layout, needs_swap)?)
            }
            CacheMode::OnDisk => {
                Backing::Disk(DiskBacking::open(self.matrix_file.as_deref(), &self.cache_policy)?)
            }
        };

        log::debug!(
            "Matrix store ready: {}x{} at offset {}, {:?}, swap={}",
            layout.rows(),
            layout.cols(),
            offset,
            cache_mode,
            needs_swap
        );

        self.active = Some(ActiveMatrix {
            layout,
            needs_swap,
            backing,
        });
        Ok(())
    }

    /// [`setup`](Self::setup) from a bundled parameter set
    pub fn setup_from(&mut self, setup: &MatrixSetup) -> Result<()> {
        self.setup(
            &setup.dimensions,
            setup.offset,
            setup.cache_mode,
            setup.needs_swap,
        )
    }

    fn active(&self) -> Result<&ActiveMatrix<T>> {
        Ok(self.active.as_ref().ok_or(MatrixError::Uninitialized)?)
    }

    fn active_mut(&mut self) -> Result<&mut ActiveMatrix<T>> {
        Ok(self.active.as_mut().ok_or(MatrixError::Uninitialized)?)
    }

    pub fn is_initialized(&self) -> bool {
        self.active.is_some()
    }

    /// Matrix dimensions as (rows, cols)
    pub fn dimensions(&self) -> Result<(usize, usize)> {
        Ok(self.active()?.layout.dimensions())
    }

    pub fn layout(&self) -> Result<MatrixLayout> {
        Ok(self.active()?.layout)
    }

    pub fn cache_mode(&self) -> Result<CacheMode> {
        Ok(match self.active()?.backing {
            Backing::Memory(_) => CacheMode::InMemory,
            Backing::Disk(_) => CacheMode::OnDisk,
        })
    }

    /// Whether the backing file byte order differs from the host
    pub fn needs_byte_swap(&self) -> Result<bool> {
        Ok(self.active()?.needs_swap)
    }

    /// Whether an on-disk store has switched to its cache for good
    pub fn is_promoted(&self) -> bool {
        matches!(
            &self.active,
            Some(ActiveMatrix {
                backing: Backing::Disk(DiskBacking { promoted: true, .. }),
                ..
            })
        )
    }

    /// The file currently servicing reads, for on-disk stores
    pub fn read_target(&self) -> Option<ReadTarget> {
        match &self.active {
            Some(ActiveMatrix {
                backing: Backing::Disk(disk),
                ..
            }) => Some(disk.read_target),
            _ => None,
        }
    }

    /// Read one row into a new vector
    pub fn get_row(&mut self, row: usize) -> Result<Vec<T>> {
        let cols = self.dimensions()?.1;
        let mut out = vec![T::default(); cols];
        self.read_row_into(row, &mut out)?;
        Ok(out)
    }

    /// Read one row into `out`, which must hold exactly one row
    pub fn read_row_into(&mut self, row: usize, out: &mut [T]) -> Result<()> {
        let active = self.active_mut()?;
        let layout = active.layout;
        layout.check_row(row)?;
        MatrixLayout::check_len(layout.cols(), out.len())?;

        match &mut active.backing {
            Backing::Memory(data) => {
                let start = layout.flat_index(row, 0);
                out.copy_from_slice(&data[start..start + layout.cols()]);
            }
            Backing::Disk(disk) => read_elements(
                disk.reader(),
                layout.row_position(row),
                out,
                active.needs_swap,
                "Failed to read matrix row",
            )?,
        }
        Ok(())
    }

    /// Read one row, zero-filling whatever lies past the end of the file
    ///
    /// Lets a truncated on-disk matrix still serve its leading rows. Only
    /// whole elements are kept; a trailing partial element reads as zero.
    /// In memory this is the same as [`read_row_into`](Self::read_row_into).
    pub fn read_row_into_tolerant(&mut self, row: usize, out: &mut [T]) -> Result<()> {
        let active = self.active_mut()?;
        let layout = active.layout;
        layout.check_row(row)?;
        MatrixLayout::check_len(layout.cols(), out.len())?;

        match &mut active.backing {
            Backing::Memory(data) => {
                let start = layout.flat_index(row, 0);
                out.copy_from_slice(&data[start..start + layout.cols()]);
            }
            Backing::Disk(disk) => {
                let context = "Failed to read matrix row";
                let reader = disk.reader();
                seek_to(reader, layout.row_position(row), context)?;
                let filled =
                    read_available_chunked(reader, bytemuck::cast_slice_mut(out), context)?;
                let whole = filled / layout.element_size();
                if whole < out.len() {
                    log::debug!("Row {row} ends past end of file, zero-filling");
                    out[whole..].fill(T::default());
                }
                if active.needs_swap {
                    swap_in_place(out);
                }
            }
        }
        Ok(())
    }

    /// Overwrite one row
    ///
    /// On a foreign-endian on-disk store `data` is swapped in place for the
    /// write and swapped back before returning, on success or failure.
    pub fn set_row(&mut self, row: usize, data: &mut [T]) -> Result<()> {
        let active = self.active_mut()?;
        let layout = active.layout;
        layout.check_row(row)?;
        MatrixLayout::check_len(layout.cols(), data.len())?;

        match &mut active.backing {
            Backing::Memory(buffer) => {
                let start = layout.flat_index(row, 0);
                buffer[start..start + layout.cols()].copy_from_slice(data);
            }
            Backing::Disk(disk) => {
                disk.promote::<T>(&layout)?;
                let guard = SwapGuard::new(data, active.needs_swap);
                write_elements(
                    &mut disk.cache,
                    layout.row_position(row),
                    &guard[..],
                    "Failed to write matrix row",
                )?;
            }
        }
        Ok(())
    }

    /// Read one column into a new vector
    pub fn get_column(&mut self, col: usize) -> Result<Vec<T>> {
        let rows = self.dimensions()?.0;
        let mut out = vec![T::default(); rows];
        self.read_column_into(col, &mut out)?;
        Ok(out)
    }

    /// Read one column into `out`, which must hold exactly one column
    ///
    /// On-disk stores perform one seek and one element read per row.
    pub fn read_column_into(&mut self, col: usize, out: &mut [T]) -> Result<()> {
        let active = self.active_mut()?;
        let layout = active.layout;
        layout.check_col(col)?;
        MatrixLayout::check_len(layout.rows(), out.len())?;

        match &mut active.backing {
            Backing::Memory(data) => {
                for (row, slot) in out.iter_mut().enumerate() {
                    *slot = data[layout.flat_index(row, col)];
                }
            }
            Backing::Disk(disk) => {
                disk.warn_column_access();
                let reader = disk.reader();
                for (row, slot) in out.iter_mut().enumerate() {
                    read_elements(
                        reader,
                        layout.element_position(row, col),
                        std::slice::from_mut(slot),
                        false,
                        "Failed to read matrix column element",
                    )?;
                }
                if active.needs_swap {
                    swap_in_place(out);
                }
            }
        }
        Ok(())
    }

    /// Overwrite one column
    ///
    /// Same buffer guarantee as [`set_row`](Self::set_row). On-disk stores
    /// perform one seek and one element write per row.
    pub fn set_column(&mut self, col: usize, data: &mut [T]) -> Result<()> {
        let active = self.active_mut()?;
        let layout = active.layout;
        layout.check_col(col)?;
        MatrixLayout::check_len(layout.rows(), data.len())?;

        match &mut active.backing {
            Backing::Memory(buffer) => {
                for (row, value) in data.iter().enumerate() {
                    buffer[layout.flat_index(row, col)] = *value;
                }
            }
            Backing::Disk(disk) => {
                disk.promote::<T>(&layout)?;
                disk.warn_column_access();
                let guard = SwapGuard::new(data, active.needs_swap);
                for row in 0..layout.rows() {
                    write_elements(
                        &mut disk.cache,
                        layout.element_position(row, col),
                        &guard[row..row + 1],
                        "Failed to write matrix column element",
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Read a single element
    pub fn get_element(&mut self, row: usize, col: usize) -> Result<T> {
        let active = self.active_mut()?;
        let layout = active.layout;
        layout.check_row(row)?;
        layout.check_col(col)?;

        match &mut active.backing {
            Backing::Memory(data) => Ok(data[layout.flat_index(row, col)]),
            Backing::Disk(disk) => {
                let mut value = [T::default()];
                read_elements(
                    disk.reader(),
                    layout.element_position(row, col),
                    &mut value,
                    active.needs_swap,
                    "Failed to read matrix element",
                )?;
                Ok(value[0])
            }
        }
    }

    /// Read the whole matrix into a new row-major vector
    pub fn get_matrix(&mut self) -> Result<Vec<T>> {
        let count = self.active()?.layout.element_count();
        let mut out = vec![T::default(); count];
        self.read_matrix_into(&mut out)?;
        Ok(out)
    }

    /// Read the whole matrix into `out` in row-major order
    pub fn read_matrix_into(&mut self, out: &mut [T]) -> Result<()> {
        let active = self.active_mut()?;
        let layout = active.layout;
        MatrixLayout::check_len(layout.element_count(), out.len())?;

        match &mut active.backing {
            Backing::Memory(data) => out.copy_from_slice(data),
            Backing::Disk(disk) => read_elements(
                disk.reader(),
                layout.offset(),
                out,
                active.needs_swap,
                "Failed to read matrix",
            )?,
        }
        Ok(())
    }

    /// Overwrite the whole matrix from a row-major buffer
    ///
    /// Same buffer guarantee as [`set_row`](Self::set_row).
    pub fn set_matrix(&mut self, data: &mut [T]) -> Result<()> {
        let active = self.active_mut()?;
        let layout = active.layout;
        MatrixLayout::check_len(layout.element_count(), data.len())?;

        match &mut active.backing {
            Backing::Memory(buffer) => buffer.copy_from_slice(data),
            Backing::Disk(disk) => {
                disk.promote::<T>(&layout)?;
                let guard = SwapGuard::new(data, active.needs_swap);
                write_elements(
                    &mut disk.cache,
                    layout.offset(),
                    &guard[..],
                    "Failed to write matrix",
                )?;
            }
        }
        Ok(())
    }

    /// Write the current matrix contents to `path` at `offset`
    ///
    /// `needs_swap` gives the byte order wanted at the destination, relative
    /// to the host. Bytes before `offset` are left untouched and the file is
    /// cut to end with the last matrix element.
    ///
    /// When an on-disk store is asked to write to its own named cache file
    /// this only flushes the cache; the byte order and offset must then match
    /// the store's own, otherwise [`MatrixError::ByteOrderMismatch`] or
    /// [`MatrixError::OffsetMismatch`] is returned.
    pub fn write_to_new_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        offset: u64,
        needs_swap: bool,
    ) -> Result<()> {
        let path = path.as_ref();
        let Self {
            matrix_file,
            active,
            ..
        } = self;
        let active = active.as_mut().ok_or(MatrixError::Uninitialized)?;
        let layout = active.layout;
        let dest_layout = layout.with_offset(offset)?;

        let mut dest = match &mut active.backing {
            Backing::Memory(data) => {
                let mut dest = open_destination(path)?;
                let guard = SwapGuard::new(data.as_mut_slice(), needs_swap);
                write_elements(
                    &mut dest,
                    offset,
                    &guard[..],
                    "Failed to write matrix to destination",
                )?;
                dest
            }
            Backing::Disk(disk) => {
                let writes_cache = disk
                    .cache_path
                    .as_deref()
                    .is_some_and(|cache_path| same_file(cache_path, path));
                if writes_cache {
                    if needs_swap != active.needs_swap {
                        return Err(MatrixError::ByteOrderMismatch.into());
                    }
                    if offset != layout.offset() {
                        return Err(MatrixError::OffsetMismatch.into());
                    }
                    log::debug!("Destination is the cache file, flushing in place");
                    disk.promote::<T>(&layout)?;
                    return disk.sync();
                }

                // Never read rows from the file being overwritten
                let overwrites_source = disk.read_target == ReadTarget::Source
                    && matrix_file
                        .as_deref()
                        .is_some_and(|source_path| same_file(source_path, path));
                if overwrites_source {
                    disk.promote::<T>(&layout)?;
                }

                log::debug!("Copying matrix to {}", path.display());
                let mut dest = open_destination(path)?;
                copy_rows::<T, _, _>(
                    disk.reader(),
                    &mut dest,
                    &layout,
                    &dest_layout,
                    active.needs_swap != needs_swap,
                )?;
                dest
            }
        };

        // Drop any tail left by a larger matrix previously stored there
        dest.set_len(offset + dest_layout.total_bytes())
            .map_err(Error::io("Failed to size destination file"))?;
        dest.sync_data()
            .map_err(Error::io("Failed to flush destination file"))
    }

    /// Whether the store currently holds the matrix in memory
    pub fn is_in_memory(&self) -> bool {
        matches!(
            &self.active,
            Some(ActiveMatrix {
                backing: Backing::Memory(_),
                ..
            })
        )
    }

    /// Load an on-disk matrix into memory and release its file handles
    ///
    /// Rows are read one per call from the current read target, so unsaved
    /// cache contents are kept. An anonymous cache is deleted on release; a
    /// named one stays in place. A store already in memory is left as is.
    pub fn convert_to_in_memory(&mut self) -> Result<()> {
        let active = self.active_mut()?;
        let layout = active.layout;
        let Backing::Disk(disk) = &mut active.backing else {
            return Ok(());
        };

        let mut data = Vec::new();
        data.try_reserve_exact(layout.element_count())
            .map_err(|_| MatrixError::SizeOverflow)?;
        data.resize(layout.element_count(), T::default());
        read_rows_into(disk.reader(), &layout, &mut data)?;
        if active.needs_swap {
            swap_in_place(&mut data);
        }

        log::debug!(
            "Converted {}x{} matrix to in-memory storage",
            layout.rows(),
            layout.cols()
        );
        active.backing = Backing::Memory(data);
        Ok(())
    }

    /// Sync the cache file of an on-disk store; no-op in memory
    pub fn flush_cache(&mut self) -> Result<()> {
        match &mut self.active_mut()?.backing {
            Backing::Memory(_) => Ok(()),
            Backing::Disk(disk) => disk.sync(),
        }
    }
}
