//! FFmpeg/FFprobe backed chunk decoding.
//!
//! A chunk is decoded by an `ffmpeg` child process writing raw `rgb24` frames
//! to its stdout. Sequential reads consume the pipe; a seek kills the child
//! and starts a new one positioned with `-ss` before `-i`.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use image::RgbImage;
use serde::Deserialize;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStdout};

use crate::frame_store::{ChunkReader, ChunkSource, DecodeError, DecodedFrame};

/// Error type for FFmpeg/FFprobe operations.
#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("ffprobe/ffmpeg binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffprobe/ffmpeg execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse ffprobe output: {0}")]
    ParseError(String),

    #[error("video file not found: {0}")]
    VideoNotFound(String),
}

impl From<FfmpegError> for DecodeError {
    fn from(e: FfmpegError) -> Self {
        match e {
            FfmpegError::VideoNotFound(path) => DecodeError::ChunkMissing(PathBuf::from(path)),
            other => DecodeError::Decoder(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// ffprobe JSON output structures
// ---------------------------------------------------------------------------

/// Top-level ffprobe JSON output (`-print_format json -show_streams`).
#[derive(Debug, Deserialize)]
pub struct FfprobeOutput {
    pub streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
pub struct FfprobeStream {
    pub codec_type: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    /// e.g. "150/1" or "24000/1001"
    pub r_frame_rate: Option<String>,
}

/// Run `ffprobe` on a video file and return the parsed JSON output.
pub async fn probe_video(path: &Path) -> Result<FfprobeOutput, FfmpegError> {
    if !path.exists() {
        return Err(FfmpegError::VideoNotFound(path.to_string_lossy().to_string()));
    }

    let output = tokio::process::Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_streams"])
        .arg(path)
        .output()
        .await
        .map_err(FfmpegError::NotFound)?;

    if !output.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str::<FfprobeOutput>(&stdout)
        .map_err(|e| FfmpegError::ParseError(format!("{e}: {stdout}")))
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn first_video_stream(probe: &FfprobeOutput) -> Option<&FfprobeStream> {
    probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
}

/// Parse the video framerate from ffprobe output.
pub fn parse_framerate(probe: &FfprobeOutput) -> f64 {
    first_video_stream(probe)
        .and_then(|s| s.r_frame_rate.as_deref())
        .map(parse_fraction)
        .unwrap_or(0.0)
}

/// Parse a fraction string like `"30/1"` into a float.
fn parse_fraction(s: &str) -> f64 {
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() == 2 {
        let num = parts[0].parse::<f64>().unwrap_or(0.0);
        let den = parts[1].parse::<f64>().unwrap_or(1.0);
        if den > 0.0 {
            return num / den;
        }
    }
    s.parse::<f64>().unwrap_or(0.0)
}

/// Find the first video stream's resolution.
pub fn parse_resolution(probe: &FfprobeOutput) -> (i32, i32) {
    first_video_stream(probe)
        .map(|s| (s.width.unwrap_or(0), s.height.unwrap_or(0)))
        .unwrap_or((0, 0))
}

/// Seek position for `offset`, in seconds, as passed to `-ss`.
fn seek_argument(offset: i64, fps: f64) -> String {
    format!("{:.6}", offset as f64 / fps)
}

// ---------------------------------------------------------------------------
// Chunk decoding
// ---------------------------------------------------------------------------

/// Opens chunk files with the `ffmpeg` binary found on `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegChunkSource;

impl ChunkSource for FfmpegChunkSource {
    type Reader = FfmpegChunkReader;

    async fn open(&self, path: &Path) -> Result<FfmpegChunkReader, DecodeError> {
        let probe = probe_video(path).await?;
        let (width, height) = parse_resolution(&probe);
        let fps = parse_framerate(&probe);

        if width <= 0 || height <= 0 || fps <= 0.0 {
            return Err(DecodeError::Decoder(format!(
                "{} has no usable video stream ({width}x{height} @ {fps} fps)",
                path.display()
            )));
        }

        Ok(FfmpegChunkReader {
            path: path.to_path_buf(),
            width: width as u32,
            height: height as u32,
            fps,
            process: None,
            next_offset: 0,
        })
    }
}

#[derive(Debug)]
struct DecoderProcess {
    child: Child,
    stdout: ChildStdout,
}

/// A decoder positioned inside one chunk.
///
/// The child process is started lazily on the first read after a seek.
#[derive(Debug)]
pub struct FfmpegChunkReader {
    path: PathBuf,
    width: u32,
    height: u32,
    fps: f64,
    process: Option<DecoderProcess>,
    next_offset: i64,
}

impl FfmpegChunkReader {
    fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    fn spawn(&self, offset: i64) -> Result<DecoderProcess, DecodeError> {
        let mut child = tokio::process::Command::new("ffmpeg")
            .args(["-v", "error", "-nostdin", "-ss", &seek_argument(offset, self.fps), "-i"])
            .arg(&self.path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DecodeError::from(FfmpegError::NotFound(e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DecodeError::Decoder("ffmpeg stdout was not captured".into()))?;

        tracing::trace!(path = %self.path.display(), offset, "Spawned ffmpeg decoder");
        Ok(DecoderProcess { child, stdout })
    }

    async fn stop(&mut self) {
        if let Some(mut process) = self.process.take() {
            if let Err(e) = process.child.kill().await {
                tracing::debug!(error = %e, "ffmpeg decoder already exited");
            }
        }
    }
}

impl ChunkReader for FfmpegChunkReader {
    async fn seek(&mut self, offset: i64) -> Result<(), DecodeError> {
        self.stop().await;
        self.next_offset = offset;
        Ok(())
    }

    async fn read_next(&mut self) -> Result<DecodedFrame, DecodeError> {
        if self.process.is_none() {
            self.process = Some(self.spawn(self.next_offset)?);
        }

        let mut buffer = vec![0u8; self.frame_len()];
        let offset = self.next_offset;
        let read = match self.process.as_mut() {
            Some(process) => process.stdout.read_exact(&mut buffer).await,
            None => return Err(DecodeError::Decoder("decoder process missing".into())),
        };

        match read {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                self.stop().await;
                return Err(DecodeError::EndOfChunk { offset });
            }
            Err(e) => {
                self.stop().await;
                return Err(DecodeError::Io(e));
            }
        }

        let image = RgbImage::from_raw(self.width, self.height, buffer)
            .ok_or_else(|| DecodeError::Decoder("frame buffer has the wrong size".into()))?;
        self.next_offset += 1;
        Ok(DecodedFrame { image, offset })
    }

    async fn close(mut self) {
        self.stop().await;
    }
}
