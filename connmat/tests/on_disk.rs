mod common;

use common::*;
use connmat::{
    CacheMode, CachePolicy, Error, ErrorCategory, MatrixError, MatrixSetup, MatrixStore,
    ReadTarget,
};

fn on_disk_store(path: &std::path::Path, policy: CachePolicy, needs_swap: bool) -> MatrixStore {
    let mut store = MatrixStore::new();
    store.set_matrix_file(path, policy);
    store
        .setup(&[3, 4], HEADER_LEN as u64, CacheMode::OnDisk, needs_swap)
        .unwrap();
    store
}

#[test]
fn test_missing_source_uses_cache_directly() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = on_disk_store(&dir.path().join("absent.bin"), CachePolicy::Anonymous, false);
    assert_eq!(store.read_target(), Some(ReadTarget::Cache));
    assert!(!store.is_promoted());

    let values = sequential(12);
    for (row, chunk) in values.chunks(4).enumerate() {
        store.set_row(row, &mut chunk.to_vec()).unwrap();
    }
    store.set_row(1, &mut [4.0, 5.0, 6.0, 7.0]).unwrap();
    assert_eq!(store.get_row(1).unwrap(), vec![4.0, 5.0, 6.0, 7.0]);
    assert_eq!(store.get_column(2).unwrap(), vec![2.0, 6.0, 10.0]);
    assert_eq!(store.get_matrix().unwrap(), values);
    assert!(store.is_promoted());
    // The source was never created
    assert!(!dir.path().join("absent.bin").exists());
}

#[test]
fn test_swapped_write_lands_reversed_and_restores_caller() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("cache.bin");
    let mut store = on_disk_store(
        &dir.path().join("absent.bin"),
        CachePolicy::named(&cache),
        true,
    );

    let mut row = [1.5f32, 2.5, 3.5, 4.5];
    store.set_row(0, &mut row).unwrap();
    assert_eq!(row, [1.5, 2.5, 3.5, 4.5]);

    store.flush_cache().unwrap();
    let bytes = std::fs::read(&cache).unwrap();
    assert_eq!(&bytes[HEADER_LEN..HEADER_LEN + 16], &encode(&row, 0, true)[..]);
    assert_eq!(store.get_row(0).unwrap(), row.to_vec());
}

#[test]
fn test_set_paths_leave_caller_buffers_intact() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("matrix.bin");
    write_matrix_file(&source, &sequential(12), HEADER_LEN, true);
    let mut store = on_disk_store(&source, CachePolicy::Anonymous, true);

    let mut matrix = random_matrix(12);
    let matrix_copy = matrix.clone();
    store.set_matrix(&mut matrix).unwrap();
    assert_eq!(matrix, matrix_copy);
    assert_eq!(store.get_matrix().unwrap(), matrix_copy);

    let mut column = vec![9.0f32, 10.0, 11.0];
    store.set_column(3, &mut column).unwrap();
    assert_eq!(column, vec![9.0, 10.0, 11.0]);
    assert_eq!(store.get_column(3).unwrap(), column);
    assert_eq!(store.get_element(2, 3).unwrap(), 11.0);
}

#[test]
fn test_promotion_copies_once() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("matrix.bin");
    let values = sequential(12);
    write_matrix_file(&source, &values, HEADER_LEN, false);

    let mut store = on_disk_store(&source, CachePolicy::Anonymous, false);
    assert_eq!(store.read_target(), Some(ReadTarget::Source));
    assert_eq!(store.get_row(2).unwrap(), vec![8.0, 9.0, 10.0, 11.0]);

    store.set_row(0, &mut [-1.0, -2.0, -3.0, -4.0]).unwrap();
    assert!(store.is_promoted());
    assert_eq!(store.read_target(), Some(ReadTarget::Cache));

    // Later changes to the source must not be copied again
    write_matrix_file(&source, &random_matrix(12), HEADER_LEN, false);
    store.set_row(1, &mut [-5.0, -6.0, -7.0, -8.0]).unwrap();
    assert_eq!(store.get_row(2).unwrap(), vec![8.0, 9.0, 10.0, 11.0]);
    assert_eq!(store.get_row(0).unwrap(), vec![-1.0, -2.0, -3.0, -4.0]);
    assert_eq!(store.get_row(1).unwrap(), vec![-5.0, -6.0, -7.0, -8.0]);
}

#[test]
fn test_source_file_untouched_by_writes() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("matrix.bin");
    write_matrix_file(&source, &sequential(12), HEADER_LEN, false);
    let original = std::fs::read(&source).unwrap();

    let mut store = on_disk_store(&source, CachePolicy::Anonymous, false);
    store.set_column(0, &mut [100.0, 200.0, 300.0]).unwrap();
    assert_eq!(store.get_row(1).unwrap(), vec![200.0, 5.0, 6.0, 7.0]);
    assert_eq!(std::fs::read(&source).unwrap(), original);
}

#[test]
fn test_row_column_consistency_before_and_after_promotion() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("matrix.bin");
    let values = random_matrix(12);
    write_matrix_file(&source, &values, HEADER_LEN, true);
    let mut store = on_disk_store(&source, CachePolicy::Anonymous, true);

    let check = |store: &mut MatrixStore| {
        let rows: Vec<Vec<f32>> = (0..3).map(|r| store.get_row(r).unwrap()).collect();
        for c in 0..4 {
            let column = store.get_column(c).unwrap();
            for r in 0..3 {
                assert_eq!(column[r], rows[r][c]);
            }
        }
    };

    check(&mut store);
    assert_eq!(store.get_matrix().unwrap(), values);
    store.set_row(2, &mut random_matrix(4)).unwrap();
    check(&mut store);
}

#[test]
fn test_truncated_source_reports_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("short.bin");
    write_matrix_file(&source, &sequential(9), HEADER_LEN, false);
    let mut store = on_disk_store(&source, CachePolicy::Anonymous, false);

    assert_eq!(store.get_row(1).unwrap(), vec![4.0, 5.0, 6.0, 7.0]);
    let err = store.get_row(2).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Io);

    // A failed promotion leaves the store reading from the source
    assert!(store.set_row(0, &mut [0.0; 4]).is_err());
    assert!(!store.is_promoted());
    assert_eq!(store.read_target(), Some(ReadTarget::Source));
}

#[test]
fn test_write_to_new_file_converts_byte_order_only_when_needed() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("matrix.bin");
    let values = sequential(12);
    write_matrix_file(&source, &values, HEADER_LEN, true);
    let mut store = on_disk_store(&source, CachePolicy::Anonymous, true);

    let same_order = dir.path().join("same.bin");
    store.write_to_new_file(&same_order, 8, true).unwrap();
    assert_eq!(read_values(&same_order, 8, 12, true), values);

    let host_order = dir.path().join("host.bin");
    store.write_to_new_file(&host_order, 0, false).unwrap();
    assert_eq!(read_values(&host_order, 0, 12, false), values);
    assert!(!store.is_promoted());
}

#[test]
fn test_write_to_new_file_after_promotion() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("matrix.bin");
    write_matrix_file(&source, &sequential(12), HEADER_LEN, false);
    let mut store = on_disk_store(&source, CachePolicy::Anonymous, false);
    store.set_row(1, &mut [0.5, 0.5, 0.5, 0.5]).unwrap();

    let dest = dir.path().join("out.bin");
    store.write_to_new_file(&dest, 4, false).unwrap();
    assert_eq!(
        read_values(&dest, 4, 12, false),
        vec![0.0, 1.0, 2.0, 3.0, 0.5, 0.5, 0.5, 0.5, 8.0, 9.0, 10.0, 11.0]
    );
}

#[test]
fn test_overwriting_source_reads_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("matrix.bin");
    let values = sequential(12);
    write_matrix_file(&source, &values, HEADER_LEN, false);
    let mut store = on_disk_store(&source, CachePolicy::Anonymous, false);

    store
        .write_to_new_file(&source, HEADER_LEN as u64, true)
        .unwrap();
    assert!(store.is_promoted());
    assert_eq!(read_values(&source, HEADER_LEN, 12, true), values);
    assert_eq!(store.get_matrix().unwrap(), values);
}

#[test]
fn test_in_place_flush_requires_matching_layout() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("matrix.bin");
    let cache = dir.path().join("cache.bin");
    write_matrix_file(&source, &sequential(12), HEADER_LEN, false);
    let mut store = on_disk_store(&source, CachePolicy::named(&cache), false);

    let err = store
        .write_to_new_file(&cache, HEADER_LEN as u64, true)
        .unwrap_err();
    assert!(matches!(err, Error::Matrix(MatrixError::ByteOrderMismatch)));
    assert_eq!(err.category(), ErrorCategory::Configuration);

    let err = store.write_to_new_file(&cache, 0, false).unwrap_err();
    assert!(matches!(err, Error::Matrix(MatrixError::OffsetMismatch)));
    assert!(!store.is_promoted());

    store
        .write_to_new_file(&cache, HEADER_LEN as u64, false)
        .unwrap();
    assert!(store.is_promoted());
    assert_eq!(read_values(&cache, HEADER_LEN, 12, false), sequential(12));
}

#[test]
fn test_named_cache_persists() {
    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("cache.bin");
    {
        let absent = dir.path().join("absent.bin");
        let mut store = on_disk_store(&absent, CachePolicy::named(&cache), false);
        store.set_matrix(&mut sequential(12)).unwrap();
    }
    assert_eq!(read_values(&cache, HEADER_LEN, 12, false), sequential(12));
}

#[test]
fn test_cache_aliasing_matrix_file_edits_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("matrix.bin");
    write_matrix_file(&path, &sequential(12), HEADER_LEN, false);

    let mut store = on_disk_store(&path, CachePolicy::named(&path), false);
    assert_eq!(store.read_target(), Some(ReadTarget::Cache));
    assert_eq!(store.get_row(2).unwrap(), vec![8.0, 9.0, 10.0, 11.0]);
    store.set_row(2, &mut [1.0, 1.0, 1.0, 1.0]).unwrap();
    store.flush_cache().unwrap();
    assert_eq!(read_values(&path, HEADER_LEN + 32, 4, false), vec![1.0; 4]);
}

#[test]
fn test_setup_from_parameters() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("matrix.bin");
    write_matrix_file(&source, &sequential(12), HEADER_LEN, true);

    let setup = MatrixSetup::new(4, 3)
        .with_offset(HEADER_LEN as u64)
        .with_cache_mode(CacheMode::OnDisk)
        .with_needs_swap(true);
    let mut store = MatrixStore::<f32>::new();
    store.set_matrix_file(&source, CachePolicy::Anonymous);
    store.setup_from(&setup).unwrap();
    assert_eq!(store.dimensions().unwrap(), (4, 3));
    assert_eq!(store.cache_mode().unwrap(), CacheMode::OnDisk);
    assert_eq!(store.get_row(3).unwrap(), vec![9.0, 10.0, 11.0]);
}

#[test]
fn test_write_to_new_file_trims_larger_previous_matrix() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("matrix.bin");
    write_matrix_file(&source, &sequential(12), HEADER_LEN, false);
    let dest = dir.path().join("out.bin");
    write_matrix_file(&dest, &random_matrix(40), HEADER_LEN, false);
    let header = std::fs::read(&dest).unwrap()[..HEADER_LEN].to_vec();

    let mut store = on_disk_store(&source, CachePolicy::Anonymous, false);
    store
        .write_to_new_file(&dest, HEADER_LEN as u64, true)
        .unwrap();

    let bytes = std::fs::read(&dest).unwrap();
    assert_eq!(bytes.len(), HEADER_LEN + 12 * 4);
    assert_eq!(&bytes[..HEADER_LEN], &header[..]);
    assert_eq!(read_values(&dest, HEADER_LEN, 12, true), sequential(12));
}

#[test]
fn test_convert_to_in_memory_from_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("matrix.bin");
    let values = sequential(12);
    write_matrix_file(&source, &values, HEADER_LEN, true);
    let mut store = on_disk_store(&source, CachePolicy::Anonymous, true);
    assert!(!store.is_in_memory());

    store.convert_to_in_memory().unwrap();
    assert!(store.is_in_memory());
    assert_eq!(store.cache_mode().unwrap(), CacheMode::InMemory);
    assert_eq!(store.read_target(), None);
    assert_eq!(store.get_matrix().unwrap(), values);

    // Further writes stay in memory
    let original = std::fs::read(&source).unwrap();
    store.set_row(0, &mut [7.0; 4]).unwrap();
    assert_eq!(store.get_column(0).unwrap(), vec![7.0, 4.0, 8.0]);
    assert_eq!(std::fs::read(&source).unwrap(), original);
}

#[test]
fn test_convert_to_in_memory_keeps_cache_edits() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("matrix.bin");
    let cache = dir.path().join("cache.bin");
    write_matrix_file(&source, &sequential(12), HEADER_LEN, false);
    let mut store = on_disk_store(&source, CachePolicy::named(&cache), false);
    store.set_row(1, &mut [-1.0, -2.0, -3.0, -4.0]).unwrap();

    store.convert_to_in_memory().unwrap();
    assert!(!store.is_promoted());
    assert_eq!(
        store.get_matrix().unwrap(),
        vec![0.0, 1.0, 2.0, 3.0, -1.0, -2.0, -3.0, -4.0, 8.0, 9.0, 10.0, 11.0]
    );
    // A named cache outlives the conversion
    assert!(cache.exists());
}

#[test]
fn test_tolerant_row_read_zero_fills_past_end_of_file() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("short.bin");
    write_matrix_file(&source, &sequential(6), HEADER_LEN, true);
    // Half of element 6 is present
    let mut bytes = std::fs::read(&source).unwrap();
    bytes.extend_from_slice(&[0x12, 0x34]);
    std::fs::write(&source, bytes).unwrap();
    let mut store = on_disk_store(&source, CachePolicy::Anonymous, true);

    let mut row = [f32::NAN; 4];
    store.read_row_into_tolerant(0, &mut row).unwrap();
    assert_eq!(row.to_vec(), store.get_row(0).unwrap());

    store.read_row_into_tolerant(1, &mut row).unwrap();
    assert_eq!(row, [4.0, 5.0, 0.0, 0.0]);

    store.read_row_into_tolerant(2, &mut row).unwrap();
    assert_eq!(row, [0.0; 4]);

    assert_eq!(store.get_row(1).unwrap_err().category(), ErrorCategory::Io);
    let err = store.read_row_into_tolerant(3, &mut row).unwrap_err();
    assert!(matches!(err, Error::Matrix(MatrixError::IndexOutOfBounds { .. })));
}

#[test]
fn test_failed_swapped_writes_restore_caller_buffers() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = MatrixStore::<f32>::new();
    store.set_matrix_file(&dir.path().join("absent.bin"), CachePolicy::Anonymous);
    // Positions past i64::MAX cannot be sought to
    store
        .setup(&[2, 4], u64::MAX - 1024, CacheMode::OnDisk, true)
        .unwrap();

    let mut row = [1.5f32, -2.0, 3.25, 4.0];
    let err = store.set_row(1, &mut row).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Io);
    assert_eq!(row, [1.5, -2.0, 3.25, 4.0]);

    let mut column = [0.5f32, 6.0];
    let err = store.set_column(2, &mut column).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Io);
    assert_eq!(column, [0.5, 6.0]);

    let mut matrix = random_matrix(8);
    let expected = matrix.clone();
    let err = store.set_matrix(&mut matrix).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Io);
    assert_eq!(matrix, expected);
}
