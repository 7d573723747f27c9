#![allow(dead_code)]

use std::path::PathBuf;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use tempfile::TempDir;
use trackval_core::navigation::RejectionList;
use trackval_db::AnnotationIndex;

const SCHEMA: &[&str] = &[
    "CREATE TABLE METADATA (field TEXT PRIMARY KEY, value TEXT)",
    "CREATE TABLE ROI_0 (id INTEGER PRIMARY KEY, frame_number INTEGER, in_frame_index INTEGER, \
     x INTEGER, y INTEGER, modified TEXT, area INTEGER)",
    "CREATE TABLE IDENTITY (id INTEGER PRIMARY KEY, frame_number INTEGER, in_frame_index INTEGER, \
     local_identity INTEGER, identity INTEGER)",
    "CREATE TABLE CONCATENATION (id INTEGER PRIMARY KEY, chunk INTEGER, local_identity INTEGER, \
     local_identity_after INTEGER, is_inferred INTEGER, is_broken INTEGER)",
];

/// A writable experiment database in a temporary directory.
pub struct DbFixture {
    pub dir: TempDir,
    pub path: PathBuf,
    pub writer: SqlitePool,
}

impl DbFixture {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("experiment.db");
        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        let writer = SqlitePool::connect_with(options).await.unwrap();
        let fixture = Self { dir, path, writer };
        for statement in SCHEMA {
            fixture.exec(statement).await;
        }
        fixture
    }

    pub async fn exec(&self, sql: &str) {
        sqlx::query(sql)
            .execute(&self.writer)
            .await
            .unwrap_or_else(|e| panic!("{sql} failed: {e}"));
    }

    pub async fn metadata(&self, field: &str, value: &str) {
        sqlx::query("INSERT INTO METADATA (field, value) VALUES ($1, $2)")
            .bind(field)
            .bind(value)
            .execute(&self.writer)
            .await
            .unwrap();
    }

    pub async fn detection(&self, table: &str, frame: i64, index: i64, x: i64, y: i64) {
        sqlx::query(&format!(
            "INSERT INTO {table} (frame_number, in_frame_index, x, y, modified, area) \
             VALUES ($1, $2, $3, $4, 'False', 100)"
        ))
        .bind(frame)
        .bind(index)
        .bind(x)
        .bind(y)
        .execute(&self.writer)
        .await
        .unwrap();
    }

    pub async fn identity(&self, table: &str, frame: i64, index: i64, identity: i64) {
        sqlx::query(&format!(
            "INSERT INTO {table} (frame_number, in_frame_index, local_identity, identity) \
             VALUES ($1, $2, $3, $4)"
        ))
        .bind(frame)
        .bind(index)
        .bind(index + 1)
        .bind(identity)
        .execute(&self.writer)
        .await
        .unwrap();
    }

    /// Identity rows for `frame`, one per entry of `identities`.
    pub async fn frame_identities(&self, frame: i64, identities: &[i64]) {
        for (index, identity) in identities.iter().enumerate() {
            self.identity("IDENTITY", frame, index as i64, *identity).await;
        }
    }

    pub async fn ai_table(&self, rows: &[(i64, &str)]) {
        self.exec("CREATE TABLE AI (frame_number INTEGER PRIMARY KEY, ai TEXT)").await;
        for (frame, label) in rows {
            sqlx::query("INSERT INTO AI (frame_number, ai) VALUES ($1, $2)")
                .bind(frame)
                .bind(label)
                .execute(&self.writer)
                .await
                .unwrap();
        }
    }

    /// Open the database read-only, the way the server does.
    pub async fn open(&self) -> AnnotationIndex {
        self.open_with(RejectionList::default()).await
    }

    pub async fn open_with(&self, rejections: RejectionList) -> AnnotationIndex {
        AnnotationIndex::open(&self.path, 2, rejections).await.unwrap()
    }
}
