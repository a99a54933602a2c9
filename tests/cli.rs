use std::path::{Path, PathBuf};

use assert_cmd::Command;
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use tempfile::TempDir;

fn ortholay() -> Command {
    Command::cargo_bin("ortholay").unwrap()
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

/// Writes a photograph, an asset directory with both bracket kinds, and a
/// detections file into a fresh temp dir.
fn scaffold(detections_json: &str) -> (TempDir, PathBuf, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();

    let photo_path = dir.path().join("photo.png");
    RgbImage::from_pixel(64, 48, Rgb([180, 160, 150]))
        .save(&photo_path)
        .unwrap();

    let assets_dir = dir.path().join("assets");
    std::fs::create_dir(&assets_dir).unwrap();
    RgbaImage::from_pixel(8, 8, Rgba([120, 120, 130, 255]))
        .save(assets_dir.join("metal.png"))
        .unwrap();
    RgbaImage::from_pixel(8, 8, Rgba([210, 205, 200, 255]))
        .save(assets_dir.join("ceramic.png"))
        .unwrap();

    let detections_path = dir.path().join("detections.json");
    std::fs::write(&detections_path, detections_json).unwrap();

    (dir, photo_path, assets_dir, detections_path)
}

const TWO_TEETH: &str = r#"{"predictions": [
    {"x": 20.0, "y": 24.0, "width": 10.0, "height": 12.0, "confidence": 0.92},
    {"x": 44.0, "y": 24.0, "width": 10.0, "height": 12.0, "confidence": 0.88}
]}"#;

#[test]
fn runs() {
    ortholay().assert().success();
}

#[test]
fn outputs_tool_name() {
    let mut cmd = ortholay();
    cmd.arg("-V");
    cmd.assert().success().stdout("ortholay 0.1.0\n");
}

// Inspect subcommand tests

#[test]
fn inspect_valid_detections_succeeds() {
    let mut cmd = ortholay();
    cmd.args(["inspect", "--detections", "tests/fixtures/detections_valid.json"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Normalized 3 region(s)"))
        .stdout(predicates::str::contains("skipped 0 malformed record(s)"));
}

#[test]
fn inspect_reports_malformed_records() {
    let mut cmd = ortholay();
    cmd.args([
        "inspect",
        "--detections",
        "tests/fixtures/detections_malformed.json",
    ]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Normalized 1 region(s)"))
        .stdout(predicates::str::contains("skipped 2 malformed record(s)"))
        .stdout(predicates::str::contains("MissingField"));
}

#[test]
fn inspect_strict_fails_on_malformed_records() {
    let mut cmd = ortholay();
    cmd.args([
        "inspect",
        "--detections",
        "tests/fixtures/detections_malformed.json",
        "--strict",
    ]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("malformed record(s)"));
}

#[test]
fn inspect_json_output_format() {
    let mut cmd = ortholay();
    cmd.args([
        "inspect",
        "--detections",
        "tests/fixtures/detections_valid.json",
        "--report",
        "json",
    ]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"accepted\": 3"))
        .stdout(predicates::str::contains("\"skipped_malformed\": 0"));
}

#[test]
fn inspect_reads_csv_detections() {
    let mut cmd = ortholay();
    cmd.args([
        "inspect",
        "--detections",
        "tests/fixtures/detections_valid.csv",
        "--format",
        "csv",
    ]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Normalized 2 region(s)"));
}

#[test]
fn inspect_unknown_format_fails() {
    let mut cmd = ortholay();
    cmd.args([
        "inspect",
        "--detections",
        "tests/fixtures/detections_valid.json",
        "--format",
        "xml",
    ]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Unsupported detections format"));
}

#[test]
fn inspect_nonexistent_file_fails() {
    let mut cmd = ortholay();
    cmd.args(["inspect", "--detections", "nonexistent_detections.json"]);
    cmd.assert().failure();
}

#[test]
fn inspect_reports_image_dimensions() {
    let (_dir, photo_path, _assets, detections_path) = scaffold(TWO_TEETH);

    let mut cmd = ortholay();
    cmd.args([
        "inspect",
        "--detections",
        arg(&detections_path),
        "--image",
        arg(&photo_path),
    ]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Photograph dimensions: 64x48"));
}

#[test]
fn inspect_render_writes_outline_image() {
    let (dir, photo_path, _assets, detections_path) = scaffold(TWO_TEETH);
    let render_path = dir.path().join("outlined.png");

    let mut cmd = ortholay();
    cmd.args([
        "inspect",
        "--detections",
        arg(&detections_path),
        "--image",
        arg(&photo_path),
        "--render",
        arg(&render_path),
    ]);
    cmd.assert().success();

    let outlined = image::open(&render_path).unwrap().to_rgb8();
    assert_eq!(outlined.dimensions(), (64, 48));
    // Something was drawn.
    let original = image::open(&photo_path).unwrap().to_rgb8();
    assert_ne!(outlined, original);
}

// Apply subcommand tests

#[test]
fn apply_composites_and_reports_counts() {
    let (dir, photo_path, assets_dir, detections_path) = scaffold(TWO_TEETH);
    let output_path = dir.path().join("preview.png");

    let mut cmd = ortholay();
    cmd.args([
        "apply",
        "--image",
        arg(&photo_path),
        "--detections",
        arg(&detections_path),
        "--bracket",
        "metal",
        "--assets",
        arg(&assets_dir),
        "--output",
        arg(&output_path),
    ]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Painted 2 bracket(s)"))
        .stdout(predicates::str::contains("Bracket type: metal"));

    let preview = image::open(&output_path).unwrap().to_rgb8();
    assert_eq!(preview.dimensions(), (64, 48));
    // The bracket color shows at a detected tooth center.
    assert_eq!(preview.get_pixel(20, 24), &Rgb([120, 120, 130]));
}

#[test]
fn apply_zero_detections_leaves_photo_identical() {
    let (dir, photo_path, assets_dir, detections_path) = scaffold(r#"{"predictions": []}"#);
    let output_path = dir.path().join("preview.png");

    let mut cmd = ortholay();
    cmd.args([
        "apply",
        "--image",
        arg(&photo_path),
        "--detections",
        arg(&detections_path),
        "--bracket",
        "ceramic",
        "--assets",
        arg(&assets_dir),
        "--output",
        arg(&output_path),
    ]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Painted 0 bracket(s)"));

    let preview = image::open(&output_path).unwrap().to_rgb8();
    let original = image::open(&photo_path).unwrap().to_rgb8();
    assert_eq!(preview, original);
}

#[test]
fn apply_unknown_bracket_type_fails() {
    let (dir, photo_path, assets_dir, detections_path) = scaffold(TWO_TEETH);
    let output_path = dir.path().join("preview.png");

    let mut cmd = ortholay();
    cmd.args([
        "apply",
        "--image",
        arg(&photo_path),
        "--detections",
        arg(&detections_path),
        "--bracket",
        "gold",
        "--assets",
        arg(&assets_dir),
        "--output",
        arg(&output_path),
    ]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Unsupported bracket type"));
    assert!(!output_path.exists());
}

#[test]
fn apply_missing_asset_file_fails() {
    let (dir, photo_path, assets_dir, detections_path) = scaffold(TWO_TEETH);
    std::fs::remove_file(assets_dir.join("metal.png")).unwrap();
    let output_path = dir.path().join("preview.png");

    let mut cmd = ortholay();
    cmd.args([
        "apply",
        "--image",
        arg(&photo_path),
        "--detections",
        arg(&detections_path),
        "--bracket",
        "metal",
        "--assets",
        arg(&assets_dir),
        "--output",
        arg(&output_path),
    ]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Missing bracket asset"));
}

#[test]
fn apply_json_report_includes_counts() {
    let (dir, photo_path, assets_dir, detections_path) = scaffold(TWO_TEETH);
    let output_path = dir.path().join("preview.png");

    let mut cmd = ortholay();
    cmd.args([
        "apply",
        "--image",
        arg(&photo_path),
        "--detections",
        arg(&detections_path),
        "--bracket",
        "metal",
        "--assets",
        arg(&assets_dir),
        "--output",
        arg(&output_path),
        "--report",
        "json",
    ]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"painted\": 2"))
        .stdout(predicates::str::contains("\"bracket_type\": \"metal\""))
        .stdout(predicates::str::contains("\"skipped_degenerate\": 0"));
}

#[test]
fn apply_malformed_records_are_skipped_not_fatal() {
    let (dir, photo_path, assets_dir, _) = scaffold(TWO_TEETH);
    let detections_path = dir.path().join("mixed.json");
    std::fs::write(
        &detections_path,
        r#"{"predictions": [
            {"x": 20.0, "y": 24.0, "width": 10.0, "height": 12.0},
            {"y": 24.0, "width": 10.0, "height": 12.0}
        ]}"#,
    )
    .unwrap();
    let output_path = dir.path().join("preview.png");

    let mut cmd = ortholay();
    cmd.args([
        "apply",
        "--image",
        arg(&photo_path),
        "--detections",
        arg(&detections_path),
        "--bracket",
        "metal",
        "--assets",
        arg(&assets_dir),
        "--output",
        arg(&output_path),
    ]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Painted 1 bracket(s)"))
        .stdout(predicates::str::contains("skipped 1 malformed record(s)"));
}
