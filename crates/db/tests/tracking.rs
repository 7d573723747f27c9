mod common;

use assert_matches::assert_matches;
use common::DbFixture;
use trackval_db::SchemaVariant;

#[tokio::test]
async fn tracking_rows_are_joined_and_sorted_by_identity() {
    let fixture = DbFixture::new().await;
    fixture.detection("ROI_0", 7, 0, 10, 20).await;
    fixture.detection("ROI_0", 7, 1, 30, 40).await;
    fixture.detection("ROI_0", 7, 2, 50, 60).await;
    fixture.detection("ROI_0", 8, 0, 1, 1).await;
    fixture.identity("IDENTITY", 7, 0, 3).await;
    fixture.identity("IDENTITY", 7, 1, 1).await;
    let index = fixture.open().await;

    let rows = index.tracking_at(7).await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows.iter().map(|r| r.identity).collect::<Vec<_>>(), vec![Some(1), Some(3), None]);
    assert_eq!((rows[0].x, rows[0].y), (30.0, 40.0));
    assert_eq!(rows[2].in_frame_index, 2);
    assert_eq!(rows[2].local_identity, None);
    assert!(rows.iter().all(|r| !r.modified && r.fragment.is_none()));
}

#[tokio::test]
async fn failed_identity_is_zero_not_null() {
    let fixture = DbFixture::new().await;
    fixture.detection("ROI_0", 3, 0, 0, 0).await;
    fixture.identity("IDENTITY", 3, 0, 0).await;
    let index = fixture.open().await;

    let rows = index.tracking_at(3).await.unwrap();
    assert_eq!(rows[0].identity, Some(0));
}

#[tokio::test]
async fn fragment_and_modified_columns_are_read() {
    let fixture = DbFixture::new().await;
    fixture.exec("ALTER TABLE ROI_0 ADD COLUMN fragment TEXT").await;
    fixture
        .exec("INSERT INTO ROI_0 (frame_number, in_frame_index, x, y, modified, area, fragment) VALUES (1, 0, 5, 6, 'True', 80, '12')")
        .await;
    let index = fixture.open().await;

    assert!(index.tables().has_fragment);
    let rows = index.tracking_at(1).await.unwrap();
    assert_eq!(rows[0].fragment, Some(12));
    assert!(rows[0].modified);
    assert_eq!(rows[0].area, 80);
}

#[tokio::test]
async fn empty_frame_has_no_rows() {
    let fixture = DbFixture::new().await;
    let index = fixture.open().await;
    assert!(index.tracking_at(12345).await.unwrap().is_empty());
}

#[tokio::test]
async fn validated_variant_uses_validated_tables() {
    let fixture = DbFixture::new().await;
    fixture.metadata("schema_variant", "validated").await;
    fixture
        .exec("CREATE TABLE ROI_0_VAL AS SELECT * FROM ROI_0 WHERE 0")
        .await;
    fixture
        .exec("CREATE TABLE IDENTITY_VAL AS SELECT * FROM IDENTITY WHERE 0")
        .await;
    fixture.detection("ROI_0", 4, 0, 1, 1).await;
    fixture.detection("ROI_0_VAL", 4, 0, 9, 9).await;
    fixture.identity("IDENTITY_VAL", 4, 0, 2).await;
    let index = fixture.open().await;

    assert_eq!(index.tables().variant, SchemaVariant::Validated);
    assert_eq!(index.tables().tracking, "ROI_0_VAL");
    let rows = index.tracking_at(4).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].x, rows[0].identity), (9.0, Some(2)));
}

#[tokio::test]
async fn validated_variant_without_tables_falls_back_to_raw() {
    let fixture = DbFixture::new().await;
    fixture.metadata("schema_variant", "validated").await;
    let index = fixture.open().await;

    assert_eq!(index.tables().variant, SchemaVariant::Raw);
    assert_eq!(index.tables().identity, "IDENTITY");
}

#[tokio::test]
async fn metadata_and_concatenation_are_exposed() {
    let fixture = DbFixture::new().await;
    fixture.metadata("framerate", "150").await;
    fixture.metadata("chunksize", "45000").await;
    fixture
        .exec("INSERT INTO CONCATENATION (chunk, local_identity, local_identity_after, is_inferred, is_broken) VALUES (50, 2, 1, 0, 1), (50, 1, 2, 1, 0), (51, 1, 1, 0, 0)")
        .await;
    let index = fixture.open().await;
    index.health_check().await.unwrap();

    let entries = index.metadata_entries().await.unwrap();
    assert_eq!(entries.iter().map(|e| e.field.as_str()).collect::<Vec<_>>(), vec!["chunksize", "framerate"]);
    assert_eq!(entries[1].value.as_deref(), Some("150"));

    let links = index.concatenation_for_chunk(50).await.unwrap();
    assert_eq!(links.len(), 2);
    assert_eq!(links[0].local_identity, Some(1));
    assert!(links[0].is_inferred && !links[0].is_broken);
    assert!(links[1].is_broken);
}

#[tokio::test]
async fn pool_is_read_only() {
    let fixture = DbFixture::new().await;
    let pool = trackval_db::open_pool(&fixture.path, 1).await.unwrap();

    let result = sqlx::query("INSERT INTO METADATA (field, value) VALUES ('x', 'y')")
        .execute(&pool)
        .await;
    assert_matches!(result, Err(_));
}

#[tokio::test]
async fn missing_database_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let result = trackval_db::open_pool(&dir.path().join("nope.db"), 1).await;
    assert_matches!(result, Err(_));
}
