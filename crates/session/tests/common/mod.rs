#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::RgbImage;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use tempfile::TempDir;
use trackval_core::chunk;
use trackval_core::frame_store::{ChunkReader, ChunkSource, DecodeError, DecodedFrame};
use trackval_core::segmentation::NoSegmentation;
use trackval_session::{ExperimentRegistry, RegistryConfig};

pub const EXPERIMENT_A: &str = "FlyHostel1/5X/2023-05-23_14-00-00";
pub const EXPERIMENT_B: &str = "FlyHostel2/6X/2023-06-01_09-30-00";

/// Chunk size used by every fixture experiment.
pub const CHUNK_SIZE: i64 = 100;
pub const FRAME_RATE: i64 = 10;

pub const TRACKING_CONFIG: &str = r#"{
    "_number_of_animals": {"value": 2},
    "_intensity": {"value": [0, 135]},
    "_area": {"value": [80, 2000]}
}"#;

// ---------------------------------------------------------------------------
// Fake decoder
// ---------------------------------------------------------------------------

/// Decodes synthetic 6x4 frames whose first pixel encodes `(chunk, offset)`.
#[derive(Clone, Default)]
pub struct FakeSource {
    pub opened: Arc<Mutex<Vec<PathBuf>>>,
}

pub struct FakeReader {
    chunk: i64,
    position: i64,
}

pub fn fake_frame(chunk: i64, offset: i64) -> RgbImage {
    RgbImage::from_fn(6, 4, |x, y| {
        if (x, y) == (0, 0) {
            image::Rgb([chunk as u8, offset as u8, 0])
        } else {
            image::Rgb([(x * 40) as u8, (y * 60) as u8, 128])
        }
    })
}

impl ChunkSource for FakeSource {
    type Reader = FakeReader;

    async fn open(&self, path: &Path) -> Result<FakeReader, DecodeError> {
        self.opened.lock().unwrap().push(path.to_path_buf());
        let chunk = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| DecodeError::Decoder(format!("bad chunk name {}", path.display())))?;
        Ok(FakeReader { chunk, position: 0 })
    }
}

impl ChunkReader for FakeReader {
    async fn seek(&mut self, offset: i64) -> Result<(), DecodeError> {
        self.position = offset;
        Ok(())
    }

    async fn read_next(&mut self) -> Result<DecodedFrame, DecodeError> {
        if self.position >= CHUNK_SIZE {
            return Err(DecodeError::EndOfChunk {
                offset: self.position,
            });
        }
        let offset = self.position;
        self.position += 1;
        Ok(DecodedFrame {
            image: fake_frame(self.chunk, offset),
            offset,
        })
    }

    async fn close(self) {}
}

// ---------------------------------------------------------------------------
// Videos root fixture
// ---------------------------------------------------------------------------

pub struct VideosRoot {
    pub dir: TempDir,
}

impl VideosRoot {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn experiment_dir(&self, key: &str) -> PathBuf {
        self.path().join(key)
    }

    /// Create an experiment with chunk files `0..chunks` and the given
    /// extra METADATA rows. Returns a writer pool for seeding annotations.
    pub async fn experiment(&self, key: &str, chunks: i64, extra_metadata: &[(&str, &str)]) -> SqlitePool {
        let dir = self.experiment_dir(key);
        std::fs::create_dir_all(&dir).unwrap();
        for index in 0..chunks {
            std::fs::write(chunk::chunk_path(&dir, index, "mp4"), b"").unwrap();
        }

        let db_path = dir.join(format!("{}.db", key.replace('/', "_")));
        let options = SqliteConnectOptions::new().filename(&db_path).create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await.unwrap();

        for statement in [
            "CREATE TABLE METADATA (field TEXT PRIMARY KEY, value TEXT)",
            "CREATE TABLE ROI_0 (id INTEGER PRIMARY KEY, frame_number INTEGER, in_frame_index INTEGER, x INTEGER, y INTEGER, modified TEXT, area INTEGER)",
            "CREATE TABLE IDENTITY (id INTEGER PRIMARY KEY, frame_number INTEGER, in_frame_index INTEGER, local_identity INTEGER, identity INTEGER)",
            "CREATE TABLE CONCATENATION (id INTEGER PRIMARY KEY, chunk INTEGER, local_identity INTEGER, local_identity_after INTEGER, is_inferred INTEGER, is_broken INTEGER)",
        ] {
            sqlx::query(statement).execute(&pool).await.unwrap();
        }

        let chunk_size = CHUNK_SIZE.to_string();
        let frame_rate = FRAME_RATE.to_string();
        let mut metadata = vec![
            ("chunksize", chunk_size.as_str()),
            ("framerate", frame_rate.as_str()),
            // 1684850400 % 86400 == 50400
            ("date_time", "1684850400"),
        ];
        metadata.extend_from_slice(extra_metadata);
        for (field, value) in metadata {
            sqlx::query("INSERT INTO METADATA (field, value) VALUES ($1, $2)")
                .bind(field)
                .bind(value)
                .execute(&pool)
                .await
                .unwrap();
        }
        pool
    }

    /// A complete experiment with a tracking configuration.
    pub async fn tracked_experiment(&self, key: &str, chunks: i64) -> SqlitePool {
        self.experiment(key, chunks, &[("idtrackerai_conf", TRACKING_CONFIG)]).await
    }

    pub fn write_index(&self, lines: &[&str]) {
        std::fs::write(self.path().join("index.txt"), lines.join("\n")).unwrap();
    }

    pub fn config(&self) -> RegistryConfig {
        let mut config = RegistryConfig::new(self.path());
        config.warm_chunk = None;
        config.db_max_connections = 2;
        config
    }

    pub fn registry(&self) -> ExperimentRegistry<FakeSource> {
        self.registry_with(self.config(), FakeSource::default())
    }

    pub fn registry_with(&self, config: RegistryConfig, source: FakeSource) -> ExperimentRegistry<FakeSource> {
        ExperimentRegistry::new(config, source, Arc::new(NoSegmentation))
    }
}

pub async fn insert_identity(pool: &SqlitePool, frame: i64, index: i64, identity: i64) {
    sqlx::query("INSERT INTO IDENTITY (frame_number, in_frame_index, local_identity, identity) VALUES ($1, $2, $3, $4)")
        .bind(frame)
        .bind(index)
        .bind(index + 1)
        .bind(identity)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn insert_detection(pool: &SqlitePool, frame: i64, index: i64, x: i64, y: i64) {
    sqlx::query("INSERT INTO ROI_0 (frame_number, in_frame_index, x, y, modified, area) VALUES ($1, $2, $3, $4, '0', 120)")
        .bind(frame)
        .bind(index)
        .bind(x)
        .bind(y)
        .execute(pool)
        .await
        .unwrap();
}
