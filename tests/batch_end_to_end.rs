//! End-to-end batch runs against real files with the production codec.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, GenericImageView, ImageEncoder, Rgb, RgbImage};
use imgbatch::config::{BatchConfig, ProcessingConfig};
use imgbatch::process::{self, CancelToken};
use imgbatch::{
    BatchRequest, FailureKind, ItemStatus, OutputFormat, PrivacyMode, QualityTier, RawRequest,
    RequestError,
};
use img_parts::ImageEXIF;
use img_parts::jpeg::Jpeg;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =========================================================================
// Fixtures
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 3 % 256) as u8, ((x + y) % 256) as u8])
    })
}

fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 92)
        .write_image(gradient(width, height).as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(gradient(width, height).as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// Little-endian TIFF: orientation tag + GPS pointer to an empty GPS IFD.
fn exif_with_gps(orientation: u16) -> Vec<u8> {
    let mut b = Vec::new();
    b.extend_from_slice(b"II\x2a\x00\x08\x00\x00\x00");
    b.extend_from_slice(&2u16.to_le_bytes());
    b.extend_from_slice(&[0x12, 0x01, 3, 0, 1, 0, 0, 0]);
    b.extend_from_slice(&orientation.to_le_bytes());
    b.extend_from_slice(&[0, 0]);
    b.extend_from_slice(&[0x25, 0x88, 4, 0, 1, 0, 0, 0]);
    b.extend_from_slice(&38u32.to_le_bytes());
    b.extend_from_slice(&[0, 0, 0, 0]);
    b.extend_from_slice(&[0, 0, 0, 0, 0, 0]);
    b
}

fn jpeg_with_exif(width: u32, height: u32, exif: &[u8]) -> Vec<u8> {
    let mut jpeg = Jpeg::from_bytes(jpeg_bytes(width, height).into()).unwrap();
    jpeg.set_exif(Some(exif.to_vec().into()));
    let mut buf = Vec::new();
    jpeg.encoder().write_to(&mut buf).unwrap();
    buf
}

fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, bytes).unwrap();
    path
}

fn request(paths: Vec<PathBuf>, output_dir: &Path) -> BatchRequest {
    BatchRequest {
        paths,
        quality: QualityTier::Medium,
        format: OutputFormat::Jpeg,
        privacy: PrivacyMode::KeepAll,
        width: None,
        output_dir: output_dir.to_path_buf(),
    }
}

fn dimensions_of(path: &Path) -> (u32, u32) {
    image::open(path).unwrap().dimensions()
}

fn exif_of(path: &Path) -> Option<Vec<u8>> {
    let jpeg = Jpeg::from_bytes(fs::read(path).unwrap().into()).unwrap();
    jpeg.exif().map(|b| b.to_vec())
}

// =========================================================================
// Batch-level properties
// =========================================================================

#[test]
fn mixed_batch_reports_every_item_in_order() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("src");
    let paths = vec![
        write(&src, "good.jpg", &jpeg_bytes(64, 48)),
        write(&src, "empty.jpg", b""),
        write(&src, "garbage.png", b"this is plainly not an image"),
        src.join("missing.jpg"),
        // PNG content behind a JPEG name: detected by content
        write(&src, "mislabeled.jpg", &png_bytes(32, 32)),
    ];
    let out = tmp.path().join("out");

    let result = process::run(&request(paths.clone(), &out), &BatchConfig::default(), None, None)
        .unwrap();

    assert_eq!(result.total(), paths.len());
    assert_eq!(result.succeeded() + result.failed(), result.total());
    assert_eq!(result.succeeded(), 2);

    let kinds: Vec<Option<FailureKind>> =
        result.outcomes().iter().map(|o| o.failure_kind()).collect();
    assert_eq!(
        kinds,
        [
            None,
            Some(FailureKind::Decode),
            Some(FailureKind::Decode),
            Some(FailureKind::Read),
            None,
        ]
    );
    for (outcome, input) in result.outcomes().iter().zip(&paths) {
        assert_eq!(&outcome.input, input);
    }

    let mut written: Vec<String> = fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    written.sort();
    assert_eq!(written, ["good.jpg", "mislabeled.jpg"]);
}

#[test]
fn summary_and_json_shape() {
    let tmp = TempDir::new().unwrap();
    let paths = vec![
        write(tmp.path(), "a.png", &png_bytes(16, 16)),
        write(tmp.path(), "b.png", b"nope"),
    ];
    let result = process::run(
        &request(paths, &tmp.path().join("out")),
        &BatchConfig::default(),
        None,
        None,
    )
    .unwrap();

    let summary = result.summary();
    assert_eq!((summary.total_images, summary.successful, summary.failed), (2, 1, 1));

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["total"], 2);
    assert_eq!(json["outcomes"][0]["status"], "succeeded");
    assert_eq!(json["outcomes"][1]["status"], "failed");
    assert_eq!(json["outcomes"][1]["kind"], "decode");
}

#[test]
fn empty_request_is_rejected_before_any_work() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out");

    let err = process::run(&request(vec![], &out), &BatchConfig::default(), None, None)
        .unwrap_err();
    assert!(matches!(err, RequestError::NoInputs));
    assert!(!out.exists());
}

#[test]
fn output_path_that_is_a_file_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let input = write(tmp.path(), "a.jpg", &jpeg_bytes(8, 8));
    let not_a_dir = write(tmp.path(), "occupied", b"file");

    let err = process::run(&request(vec![input], &not_a_dir), &BatchConfig::default(), None, None)
        .unwrap_err();
    assert!(matches!(err, RequestError::OutputNotDirectory(_)));
}

#[test]
fn raw_request_round_trip() {
    let tmp = TempDir::new().unwrap();
    let input = write(tmp.path(), "photo.jpg", &jpeg_bytes(40, 30));
    let raw: RawRequest = serde_json::from_value(serde_json::json!({
        "paths": [input.to_string_lossy()],
        "quality": "Alta",
        "format": "webp",
        "privacy": "nada",
        "output_dir": tmp.path().join("out").to_string_lossy(),
    }))
    .unwrap();

    let req = BatchRequest::try_from(raw).unwrap();
    assert_eq!(req.quality, QualityTier::High);
    assert_eq!(req.privacy, PrivacyMode::StripAll);

    let result = process::run(&req, &BatchConfig::default(), None, None).unwrap();
    let output = result.outcomes()[0].output().unwrap();
    assert_eq!(output, tmp.path().join("out/photo.webp"));
    assert_eq!(image::guess_format(&fs::read(output).unwrap()).unwrap(), image::ImageFormat::WebP);
}

// =========================================================================
// Resize
// =========================================================================

#[test]
fn width_downscales_and_never_upscales() {
    let tmp = TempDir::new().unwrap();
    let paths = vec![
        write(tmp.path(), "big.png", &png_bytes(400, 300)),
        write(tmp.path(), "small.png", &png_bytes(100, 80)),
    ];
    let mut req = request(paths, &tmp.path().join("out"));
    req.width = Some(200);
    req.format = OutputFormat::Png;

    let result = process::run(&req, &BatchConfig::default(), None, None).unwrap();
    assert_eq!(result.succeeded(), 2);

    let dims: Vec<(u32, u32)> = result
        .outcomes()
        .iter()
        .map(|o| match &o.status {
            ItemStatus::Succeeded { output, width, height, .. } => {
                assert_eq!(dimensions_of(output), (*width, *height));
                (*width, *height)
            }
            ItemStatus::Failed { cause, .. } => panic!("unexpected failure: {cause}"),
        })
        .collect();
    assert_eq!(dims, [(200, 150), (100, 80)]);
}

// =========================================================================
// Determinism and naming
// =========================================================================

#[test]
fn identical_runs_produce_identical_files() {
    let tmp = TempDir::new().unwrap();
    let paths = vec![
        write(tmp.path(), "src/a.jpg", &jpeg_bytes(120, 90)),
        write(tmp.path(), "src/b.png", &png_bytes(90, 120)),
        write(tmp.path(), "src/c.jpg", &jpeg_bytes(50, 50)),
    ];

    let single = BatchConfig {
        processing: ProcessingConfig {
            max_workers: Some(1),
            ..ProcessingConfig::default()
        },
        ..BatchConfig::default()
    };
    for format in [OutputFormat::Jpeg, OutputFormat::Png, OutputFormat::Gif] {
        let mut first = request(paths.clone(), &tmp.path().join(format!("one-{format}")));
        first.format = format;
        first.width = Some(60);
        let mut second = first.clone();
        second.output_dir = tmp.path().join(format!("two-{format}"));

        let a = process::run(&first, &single, None, None).unwrap();
        let b = process::run(&second, &BatchConfig::default(), None, None).unwrap();

        for (x, y) in a.outcomes().iter().zip(b.outcomes()) {
            let (x, y) = (x.output().unwrap(), y.output().unwrap());
            assert_eq!(x.file_name(), y.file_name());
            assert_eq!(fs::read(x).unwrap(), fs::read(y).unwrap(), "{format}");
        }
    }
}

#[test]
fn colliding_stems_never_overwrite() {
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("out");
    fs::create_dir(&out).unwrap();
    fs::write(out.join("shot.jpg"), b"precious").unwrap();

    let paths = vec![
        write(tmp.path(), "day1/shot.png", &png_bytes(10, 10)),
        write(tmp.path(), "day2/shot.jpg", &jpeg_bytes(10, 10)),
    ];
    let result = process::run(&request(paths, &out), &BatchConfig::default(), None, None).unwrap();

    assert_eq!(fs::read(out.join("shot.jpg")).unwrap(), b"precious");
    let outputs: Vec<&Path> = result.outcomes().iter().filter_map(|o| o.output()).collect();
    assert_eq!(outputs, [out.join("shot-1.jpg").as_path(), out.join("shot-2.jpg").as_path()]);
}

// =========================================================================
// Privacy
// =========================================================================

#[test]
fn keep_all_carries_exif_bit_for_bit() {
    let tmp = TempDir::new().unwrap();
    let exif = exif_with_gps(6);
    let input = write(tmp.path(), "gps.jpg", &jpeg_with_exif(40, 20, &exif));

    let result = process::run(
        &request(vec![input], &tmp.path().join("out")),
        &BatchConfig::default(),
        None,
        None,
    )
    .unwrap();

    let output = result.outcomes()[0].output().unwrap();
    assert_eq!(exif_of(output), Some(exif));
    // Orientation stays in the tag, pixels stay as stored
    assert_eq!(dimensions_of(output), (40, 20));
}

#[test]
fn strip_all_removes_exif_and_bakes_orientation() {
    let tmp = TempDir::new().unwrap();
    let input = write(tmp.path(), "gps.jpg", &jpeg_with_exif(40, 20, &exif_with_gps(6)));
    let mut req = request(vec![input], &tmp.path().join("out"));
    req.privacy = PrivacyMode::StripAll;

    let result = process::run(&req, &BatchConfig::default(), None, None).unwrap();

    let output = result.outcomes()[0].output().unwrap();
    assert_eq!(exif_of(output), None);
    assert_eq!(dimensions_of(output), (20, 40));
    assert!(matches!(
        result.outcomes()[0].status,
        ItemStatus::Succeeded { width: 20, height: 40, .. }
    ));
}

#[test]
fn width_applies_to_the_displayed_orientation() {
    // Stored 400x200 with orientation 6: a phone portrait that displays 200x400
    let tmp = TempDir::new().unwrap();
    let input = write(tmp.path(), "portrait.jpg", &jpeg_with_exif(400, 200, &exif_with_gps(6)));

    let cases = [
        (PrivacyMode::StripAll, OutputFormat::Jpeg, (100, 200)),
        (PrivacyMode::KeepAll, OutputFormat::Gif, (100, 200)),
        // Pixels stay as stored; the kept orientation tag turns them upright
        (PrivacyMode::KeepAll, OutputFormat::Jpeg, (200, 100)),
    ];
    for (privacy, format, stored) in cases {
        let mut req = request(vec![input.clone()], &tmp.path().join(format!("{privacy}-{format}")));
        req.privacy = privacy;
        req.format = format;
        req.width = Some(100);

        let result = process::run(&req, &BatchConfig::default(), None, None).unwrap();
        let output = result.outcomes()[0].output().unwrap();
        assert_eq!(dimensions_of(output), stored, "{privacy} {format}");
    }
}

// =========================================================================
// Cancellation
// =========================================================================

#[test]
fn cancelled_batch_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let paths: Vec<PathBuf> = (0..5)
        .map(|i| write(tmp.path(), &format!("img{i}.png"), &png_bytes(8, 8)))
        .collect();
    let out = tmp.path().join("out");
    let token = CancelToken::new();
    token.cancel();

    let result =
        process::run(&request(paths, &out), &BatchConfig::default(), Some(&token), None).unwrap();

    assert_eq!(result.total(), 5);
    assert_eq!(result.failed(), 5);
    assert!(
        result
            .outcomes()
            .iter()
            .all(|o| o.failure_kind() == Some(FailureKind::Cancelled))
    );
    assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
}
