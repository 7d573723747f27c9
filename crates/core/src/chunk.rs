//! Chunk addressing for recordings split into fixed-size chunk files.
//!
//! A recording of `N` frames is stored as `ceil(N / chunk_size)` files named
//! after their zero-padded chunk index (`000050.mp4`). Every global frame
//! number maps to exactly one `(chunk_index, offset)` pair.

use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::types::FrameNumber;

/// Width of the zero-padded chunk index in chunk file names.
pub const CHUNK_INDEX_WIDTH: usize = 6;

/// Default chunk file extension.
pub const DEFAULT_CHUNK_EXTENSION: &str = "mp4";

/// Location of a frame inside the chunked store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkAddress {
    pub chunk_index: i64,
    pub offset: i64,
}

impl ChunkAddress {
    /// Global frame number of this address.
    pub fn frame_number(&self, chunk_size: i64) -> FrameNumber {
        self.chunk_index * chunk_size + self.offset
    }
}

/// Map a global frame number to its chunk and intra-chunk offset.
pub fn address(frame_number: FrameNumber, chunk_size: i64) -> Result<ChunkAddress, CoreError> {
    if frame_number < 0 {
        return Err(CoreError::InvalidFrameNumber(frame_number));
    }
    if chunk_size <= 0 {
        return Err(CoreError::Validation(format!(
            "chunk size must be positive, got {chunk_size}"
        )));
    }
    Ok(ChunkAddress {
        chunk_index: frame_number / chunk_size,
        offset: frame_number % chunk_size,
    })
}

/// File name of a chunk, e.g. `000050.mp4`.
///
/// ```
/// use trackval_core::chunk::chunk_file_name;
///
/// assert_eq!(chunk_file_name(50, "mp4"), "000050.mp4");
/// assert_eq!(chunk_file_name(1234567, "avi"), "1234567.avi");
/// ```
pub fn chunk_file_name(chunk_index: i64, extension: &str) -> String {
    format!(
        "{chunk_index:0width$}.{extension}",
        width = CHUNK_INDEX_WIDTH
    )
}

/// Full path of a chunk file below the store's base directory.
pub fn chunk_path(basedir: &Path, chunk_index: i64, extension: &str) -> PathBuf {
    basedir.join(chunk_file_name(chunk_index, extension))
}
