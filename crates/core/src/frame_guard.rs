//! Serialised access to a [`FrameStore`].
//!
//! The store's decoder handle is stateful, so concurrent requests must not
//! interleave. [`FrameGuard`] holds the store behind an async mutex and
//! performs decode, segmentation and JPEG encoding inside one critical
//! section.

use std::sync::Arc;

use image::RgbImage;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::encoding::encode_jpeg;
use crate::error::CoreError;
use crate::frame_store::{ChunkSource, FetchPath, FrameStore};
use crate::segmentation::{Contour, SegmentationParams, Segmenter};
use crate::types::{FrameNumber, Timestamp};

/// A frame ready to be sent to a client.
#[derive(Debug, Clone)]
pub struct ServedFrame {
    pub image: RgbImage,
    pub jpeg: Vec<u8>,
    pub frame_number: FrameNumber,
    pub timestamp: Timestamp,
    /// `true` when the frame could not be decoded and a blank image was served.
    pub placeholder: bool,
    pub path: FetchPath,
    /// Contours found by the segmenter; empty for placeholders.
    pub contours: Vec<Contour>,
}

/// Contours of the most recently served real frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameContours {
    pub frame_number: FrameNumber,
    pub contours: Vec<Contour>,
}

struct Segmentation {
    segmenter: Arc<dyn Segmenter>,
    params: SegmentationParams,
}

struct Guarded<S: ChunkSource> {
    store: FrameStore<S>,
    last_contours: Option<FrameContours>,
}

pub struct FrameGuard<S: ChunkSource> {
    inner: Mutex<Guarded<S>>,
    segmentation: Option<Segmentation>,
}

impl<S: ChunkSource> FrameGuard<S> {
    pub fn new(store: FrameStore<S>) -> Self {
        Self {
            inner: Mutex::new(Guarded {
                store,
                last_contours: None,
            }),
            segmentation: None,
        }
    }

    /// Run `segmenter` on every real frame served.
    pub fn with_segmenter(mut self, segmenter: Arc<dyn Segmenter>, params: SegmentationParams) -> Self {
        self.segmentation = Some(Segmentation { segmenter, params });
        self
    }

    /// Decode and encode `frame_number`.
    ///
    /// A frame that cannot be decoded is replaced by a black placeholder of
    /// the last known size. Invalid frame numbers are still errors.
    pub async fn serve(&self, frame_number: FrameNumber, quality: u8) -> Result<ServedFrame, CoreError> {
        let mut guarded = self.inner.lock().await;

        let (fetched, placeholder) = match guarded.store.get_image(frame_number).await {
            Ok(fetched) => (fetched, false),
            Err(CoreError::FrameNotFound { reason, .. }) => {
                tracing::warn!(frame_number, %reason, "Serving placeholder frame");
                (guarded.store.placeholder(frame_number), true)
            }
            Err(e) => return Err(e),
        };

        let contours = match (&self.segmentation, placeholder) {
            (Some(seg), false) => {
                let contours = seg.segmenter.segment(&fetched.image, &seg.params);
                guarded.last_contours = Some(FrameContours {
                    frame_number: fetched.frame_number,
                    contours: contours.clone(),
                });
                contours
            }
            _ => Vec::new(),
        };

        let jpeg = encode_jpeg(&fetched.image, quality)?;
        Ok(ServedFrame {
            image: fetched.image,
            jpeg,
            frame_number: fetched.frame_number,
            timestamp: fetched.timestamp,
            placeholder,
            path: fetched.path,
            contours,
        })
    }

    pub async fn last_contours(&self) -> Option<FrameContours> {
        self.inner.lock().await.last_contours.clone()
    }

    /// Close the decoder handle. Waits for any in-flight request.
    pub async fn release(&self) {
        self.inner.lock().await.store.release().await;
    }

    pub async fn current_chunk(&self) -> Option<i64> {
        self.inner.lock().await.store.current_chunk()
    }
}
