//! Integration tests for the feature table pipeline

use std::fs;
use std::path::Path;

use image::{DynamicImage, GrayImage, Luma};

use featurescope::errors::FeatureError;
use featurescope::imaging::decode_thumbnail;
use featurescope::io::read_table;
use featurescope::{FeatureScope, LabelImage, Params, PipelineConfig, Record, RegionProperty, RowTable, Value};

fn min_max(image: &DynamicImage, _: &Params) -> Result<Record, String> {
    let grey = image.to_luma8();
    let min = grey.pixels().map(|p| p[0]).min().ok_or("empty image")?;
    let max = grey.pixels().map(|p| p[0]).max().ok_or("empty image")?;
    Ok(Record::new().with("min", min as i64).with("max", max as i64))
}

fn write_gradient(dir: &Path, name: &str, offset: u8) {
    GrayImage::from_fn(6, 4, |x, y| Luma([offset.saturating_add((x * 10 + y) as u8)]))
        .save(dir.join(name))
        .unwrap();
}

fn numbers(table: &RowTable, column: &str) -> Vec<f64> {
    table.column(column).map(|v| v.and_then(Value::as_f64).unwrap()).collect()
}

fn labels_125() -> LabelImage {
    LabelImage::from_rows(&[
        vec![1, 1, 0, 0, 5],
        vec![1, 0, 0, 5, 5],
        vec![0, 0, 0, 0, 0],
        vec![2, 2, 2, 0, 0],
    ])
    .unwrap()
}

fn label_table(labels: &[i64]) -> RowTable {
    RowTable::from_rows(
        labels
            .iter()
            .map(|&l| Record::new().with("label", l).with("roundness", 1.0 / l as f64))
            .collect(),
    )
}

#[test]
fn test_directory_scan_ignores_non_image_files() {
    let dir = tempfile::tempdir().unwrap();
    write_gradient(dir.path(), "a.png", 0);
    write_gradient(dir.path(), "b.tif", 40);
    write_gradient(dir.path(), "c.jpg", 90);
    fs::write(dir.path().join("notes.txt"), "not an image").unwrap();
    fs::write(dir.path().join("old.csv"), "x,y\n1,2\n").unwrap();

    let csv_path = FeatureScope::default()
        .apply_to_images(&min_max, dir.path(), Params::new())
        .unwrap()
        .unwrap();
    assert!(csv_path.is_absolute());
    assert_eq!(csv_path, fs::canonicalize(dir.path().join("features.csv")).unwrap());

    let table = read_table(&csv_path).unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.columns(), &["min", "max", "id", "thumbnail", "image_file"]);
    for column in ["min", "max"] {
        for v in numbers(&table, column) {
            assert!((0.1 - 1e-9..=0.9 + 1e-9).contains(&v), "{} = {}", column, v);
        }
    }
    assert_eq!(numbers(&table, "id"), vec![0.0, 1.0, 2.0]);
    for file in table.column("image_file") {
        let file = file.and_then(Value::as_text).unwrap();
        assert!(Path::new(file).is_absolute());
        assert!(Path::new(file).exists());
    }
}

#[test]
fn test_empty_directory_produces_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let result = FeatureScope::default().apply_to_images(&min_max, dir.path(), Params::new()).unwrap();
    assert!(result.is_none());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_thumbnails_round_trip_through_csv() {
    let dir = tempfile::tempdir().unwrap();
    write_gradient(dir.path(), "wide.png", 10);
    GrayImage::from_pixel(3, 9, Luma([200])).save(dir.path().join("tall.png")).unwrap();

    let scope = FeatureScope::new(PipelineConfig::new(24, 0.2).unwrap());
    let csv_path = scope.apply_to_images(&min_max, dir.path(), Params::new()).unwrap().unwrap();

    let table = read_table(&csv_path).unwrap();
    for cell in table.column("thumbnail") {
        let thumbnail = decode_thumbnail(cell.and_then(Value::as_text).unwrap()).unwrap();
        assert_eq!((thumbnail.width(), thumbnail.height()), (24, 24));
    }
}

#[test]
fn test_inconsistent_featurizer_keys_abort_the_run() {
    let dir = tempfile::tempdir().unwrap();
    write_gradient(dir.path(), "a.png", 0);
    write_gradient(dir.path(), "b.png", 50);
    let ragged = |image: &DynamicImage, _: &Params| -> Result<Record, String> {
        let first = image.to_luma8().get_pixel(0, 0)[0];
        if first == 0 {
            Ok(Record::new().with("a", 1))
        } else {
            Ok(Record::new().with("b", 2))
        }
    };

    let result = FeatureScope::default().apply_to_images(&ragged, dir.path(), Params::new());
    assert!(matches!(result, Err(FeatureError::FeaturizerContractViolation { .. })));
    assert!(!dir.path().join("features.csv").exists());
}

#[test]
fn test_label_image_one_crop_per_object() {
    let root = tempfile::tempdir().unwrap();
    let out = root.path().join("crops");
    let labels = labels_125();
    let intensity = DynamicImage::ImageLuma8(GrayImage::from_fn(5, 4, |x, y| Luma([(x * 40 + y * 5) as u8])));

    let csv_path = FeatureScope::default()
        .apply_to_label_image(
            &labels,
            &out,
            Some(&intensity),
            &[RegionProperty::Area, RegionProperty::IntensityMean],
            None,
        )
        .unwrap()
        .unwrap();

    let crops: Vec<_> = fs::read_dir(&out)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "png"))
        .collect();
    assert_eq!(crops.len(), 3);

    let table = read_table(&csv_path).unwrap();
    assert_eq!(table.len(), 3);
    assert!(table.has_column("area"));
    assert!(table.has_column("intensity_mean"));
    assert!(!table.has_column("image_intensity"));
    let files: Vec<&str> = table.column("image_file").map(|v| v.and_then(Value::as_text).unwrap()).collect();
    assert!(files[0].ends_with("000.png"));
    assert!(files[2].ends_with("002.png"));
}

#[test]
fn test_label_table_matching_labels() {
    let root = tempfile::tempdir().unwrap();
    let out = root.path().join("objects");
    let labels = labels_125();

    let csv_path = FeatureScope::default()
        .apply_from_label_image_table(label_table(&[5, 1, 2]), &out, &labels, None)
        .unwrap()
        .unwrap();

    for name in ["000.png", "001.png", "002.png"] {
        assert!(out.join(name).exists());
    }
    assert!(!out.join("003.png").exists());
    let table = read_table(&csv_path).unwrap();
    assert_eq!(table.len(), 3);
    for v in numbers(&table, "roundness") {
        assert!((0.1 - 1e-9..=0.9 + 1e-9).contains(&v));
    }
}

#[test]
fn test_label_table_mismatch_writes_nothing() {
    let root = tempfile::tempdir().unwrap();
    let out = root.path().join("objects");
    let labels = labels_125();

    let result = FeatureScope::default().apply_from_label_image_table(label_table(&[1, 2, 6]), &out, &labels, None);
    assert!(matches!(result, Err(FeatureError::LabelMismatch { .. })));
    assert!(!out.exists());
}

#[test]
fn test_label_table_repeated_label_writes_nothing() {
    let root = tempfile::tempdir().unwrap();
    let out = root.path().join("objects");
    let labels = labels_125();

    let result = FeatureScope::default().apply_from_label_image_table(label_table(&[1, 1, 2, 5]), &out, &labels, None);
    assert!(matches!(result, Err(FeatureError::LabelMismatch { .. })));
    assert!(!out.exists());
}

#[test]
fn test_label_table_refuses_populated_directory() {
    let out = tempfile::tempdir().unwrap();
    write_gradient(out.path(), "earlier.png", 0);
    let labels = labels_125();

    let result = FeatureScope::default().apply_from_label_image_table(label_table(&[5, 1, 2]), out.path(), &labels, None);
    assert!(matches!(result, Err(FeatureError::PrecautionaryRefusal { .. })));
    assert!(!out.path().join("features.csv").exists());
    assert!(!out.path().join("000.png").exists());
}

#[test]
fn test_unknown_referenced_file_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_gradient(dir.path(), "present.png", 0);
    let table = RowTable::from_rows(vec![
        Record::new().with("file", "present.png").with("score", 0.5),
        Record::new().with("file", "absent.png").with("score", 0.7),
    ]);

    let result = FeatureScope::default().apply_from_images_table(table, dir.path(), Some("file"), None);
    match result {
        Err(FeatureError::MissingReferencedFile { file, .. }) => assert_eq!(file, "absent.png"),
        other => panic!("expected MissingReferencedFile, got {:?}", other),
    }
    assert!(!dir.path().join("features.csv").exists());
}

#[test]
fn test_user_csv_drives_table_matching() {
    let dir = tempfile::tempdir().unwrap();
    write_gradient(dir.path(), "x.png", 0);
    write_gradient(dir.path(), "y.png", 100);
    let user_csv = tempfile::NamedTempFile::new().unwrap();
    fs::write(user_csv.path(), "name,speed,kind\ny.png,3.5,fast\nx.png,1.0,slow\n").unwrap();

    let table = read_table(user_csv.path()).unwrap();
    let csv_path = FeatureScope::default()
        .apply_from_images_table(table, dir.path(), Some("name"), None)
        .unwrap()
        .unwrap();

    let out = read_table(&csv_path).unwrap();
    assert_eq!(out.columns(), &["speed", "id", "thumbnail", "image_file"]);
    assert_eq!(numbers(&out, "speed"), vec![0.9, 0.1]);
}

#[test]
fn test_dataset_writes_dataset_csv() {
    let dir = tempfile::tempdir().unwrap();
    let table = RowTable::from_rows(vec![
        Record::new()
            .with("image_intensity", DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([10]))))
            .with("size", 16),
        Record::new()
            .with("image_intensity", DynamicImage::ImageLuma8(GrayImage::from_pixel(2, 3, Luma([90]))))
            .with("size", 6),
    ]);

    let csv_path = FeatureScope::default().apply_dataset(table, dir.path()).unwrap().unwrap();
    assert_eq!(csv_path.file_name().unwrap(), "dataset.csv");
    assert!(dir.path().join("000.png").exists());
    assert!(dir.path().join("001.png").exists());
    assert!(!dir.path().join("features.csv").exists());
}
