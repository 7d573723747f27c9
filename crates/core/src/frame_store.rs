//! Stateful frame access over a chunked recording.
//!
//! [`FrameStore`] keeps at most one decoder handle open, bound to the chunk
//! that was read last. Requests are served on one of three paths:
//!
//! - **cold**: no handle is open, or the frame lives in another chunk. The
//!   open handle is released, the target chunk opened, positioned and read.
//! - **sequential**: same chunk, offset is exactly one past the last decoded
//!   offset. The next frame is decoded without seeking.
//! - **seek**: same chunk, any other offset. The handle is repositioned first.
//!
//! Decoding is abstracted behind [`ChunkSource`] / [`ChunkReader`] so the
//! store can be driven by the ffmpeg decoder in production and by an
//! in-memory fake in tests.

use std::future::Future;
use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::chunk::{self, ChunkAddress};
use crate::error::CoreError;
use crate::metadata::ExperimentMetadata;
use crate::types::{FrameNumber, Timestamp};

/// Placeholder size used before any frame has been decoded.
pub const DEFAULT_PLACEHOLDER_SIZE: (u32, u32) = (1024, 1024);

// ---------------------------------------------------------------------------
// Decoder seam
// ---------------------------------------------------------------------------

/// Errors raised by a chunk decoder.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("chunk file not found: {0}")]
    ChunkMissing(PathBuf),

    #[error("no frame at offset {offset}: end of chunk")]
    EndOfChunk { offset: i64 },

    #[error("decoder failed: {0}")]
    Decoder(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One image produced by a [`ChunkReader`].
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub image: RgbImage,
    /// Offset inside the chunk the decoder actually produced. It may differ
    /// from the requested offset when the decoder snaps to an available frame.
    pub offset: i64,
}

/// An open decoder positioned inside one chunk file.
pub trait ChunkReader: Send {
    /// Reposition so that the next [`read_next`](Self::read_next) yields `offset`.
    fn seek(&mut self, offset: i64) -> impl Future<Output = Result<(), DecodeError>> + Send;

    /// Decode the frame at the current position and advance by one.
    fn read_next(&mut self) -> impl Future<Output = Result<DecodedFrame, DecodeError>> + Send;

    /// Release the decoder and any process or file it holds.
    fn close(self) -> impl Future<Output = ()> + Send
    where
        Self: Sized;
}

/// Factory of [`ChunkReader`]s.
pub trait ChunkSource: Send + Sync {
    type Reader: ChunkReader;

    fn open(&self, path: &Path) -> impl Future<Output = Result<Self::Reader, DecodeError>> + Send;
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Which path served a frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPath {
    Cold,
    Sequential,
    Seek,
}

/// A frame returned by [`FrameStore::get_image`].
#[derive(Debug, Clone)]
pub struct FetchedFrame {
    pub image: RgbImage,
    /// Frame number actually decoded. Use this, not the requested number, for
    /// annotation lookups.
    pub frame_number: FrameNumber,
    pub timestamp: Timestamp,
    pub path: FetchPath,
}

/// Where the chunk files of a recording live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    pub basedir: PathBuf,
    pub extension: String,
}

struct OpenChunk<R> {
    chunk_index: i64,
    last_offset: i64,
    reader: R,
}

pub struct FrameStore<S: ChunkSource> {
    source: S,
    layout: StoreLayout,
    metadata: ExperimentMetadata,
    current: Option<OpenChunk<S::Reader>>,
    last_dimensions: Option<(u32, u32)>,
}

impl<S: ChunkSource> FrameStore<S> {
    pub fn new(source: S, layout: StoreLayout, metadata: ExperimentMetadata) -> Self {
        Self {
            source,
            layout,
            metadata,
            current: None,
            last_dimensions: None,
        }
    }

    /// Chunk index of the open decoder handle, if any.
    pub fn current_chunk(&self) -> Option<i64> {
        self.current.as_ref().map(|c| c.chunk_index)
    }

    /// Decode the frame `frame_number`.
    pub async fn get_image(&mut self, frame_number: FrameNumber) -> Result<FetchedFrame, CoreError> {
        let target = chunk::address(frame_number, self.metadata.chunk_size)?;

        let fetch_path = match &self.current {
            Some(open) if open.chunk_index == target.chunk_index => {
                if target.offset == open.last_offset + 1 {
                    FetchPath::Sequential
                } else {
                    FetchPath::Seek
                }
            }
            _ => FetchPath::Cold,
        };

        let result = match fetch_path {
            FetchPath::Cold => self.read_cold(target).await,
            FetchPath::Sequential => self.read_current(None).await,
            FetchPath::Seek => self.read_current(Some(target.offset)).await,
        };

        let decoded = match result {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!(
                    frame_number,
                    chunk = target.chunk_index,
                    offset = target.offset,
                    error = %e,
                    "Frame decode failed"
                );
                // The handle position is unknown after a failure.
                self.release().await;
                return Err(CoreError::FrameNotFound {
                    frame_number,
                    reason: e.to_string(),
                });
            }
        };

        if let Some(open) = self.current.as_mut() {
            open.last_offset = decoded.offset;
        }
        self.last_dimensions = Some(decoded.image.dimensions());

        let resolved = ChunkAddress {
            chunk_index: target.chunk_index,
            offset: decoded.offset,
        }
        .frame_number(self.metadata.chunk_size);

        if resolved != frame_number {
            tracing::debug!(requested = frame_number, resolved, "Decoder snapped to nearby frame");
        }

        Ok(FetchedFrame {
            image: decoded.image,
            frame_number: resolved,
            timestamp: self.metadata.timestamp(resolved),
            path: fetch_path,
        })
    }

    /// A blank frame standing in for `frame_number`, sized like the last decoded frame.
    pub fn placeholder(&self, frame_number: FrameNumber) -> FetchedFrame {
        let (width, height) = self.last_dimensions.unwrap_or(DEFAULT_PLACEHOLDER_SIZE);
        FetchedFrame {
            image: RgbImage::new(width, height),
            frame_number,
            timestamp: self.metadata.timestamp(frame_number),
            path: FetchPath::Cold,
        }
    }

    /// Close the open decoder handle, if any.
    pub async fn release(&mut self) {
        if let Some(open) = self.current.take() {
            tracing::debug!(chunk = open.chunk_index, "Releasing chunk decoder");
            open.reader.close().await;
        }
    }

    async fn read_cold(&mut self, target: ChunkAddress) -> Result<DecodedFrame, DecodeError> {
        self.release().await;

        let path = chunk::chunk_path(&self.layout.basedir, target.chunk_index, &self.layout.extension);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(DecodeError::ChunkMissing(path));
        }

        tracing::debug!(chunk = target.chunk_index, path = %path.display(), "Opening chunk");
        let mut reader = self.source.open(&path).await?;
        let decoded = async {
            reader.seek(target.offset).await?;
            reader.read_next().await
        }
        .await;

        match decoded {
            Ok(frame) => {
                self.current = Some(OpenChunk {
                    chunk_index: target.chunk_index,
                    last_offset: frame.offset,
                    reader,
                });
                Ok(frame)
            }
            Err(e) => {
                reader.close().await;
                Err(e)
            }
        }
    }

    async fn read_current(&mut self, seek_to: Option<i64>) -> Result<DecodedFrame, DecodeError> {
        let open = self
            .current
            .as_mut()
            .ok_or_else(|| DecodeError::Decoder("no chunk is open".into()))?;
        if let Some(offset) = seek_to {
            open.reader.seek(offset).await?;
        }
        open.reader.read_next().await
    }
}
