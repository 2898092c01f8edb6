use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use whiteout::pipeline::{process_logo, ExportOptions, LogoJob, RemovalMode};
use whiteout::{BackgroundRemover, Error};

/// White 64x64 backdrop with a dark 24x24 square in the middle.
fn write_logo_jpeg(path: &Path) {
    let mut logo = RgbImage::from_pixel(64, 64, Rgb([255, 255, 255]));
    draw_filled_rect_mut(&mut logo, Rect::at(20, 20).of_size(24, 24), Rgb([20, 20, 30]));
    logo.save(path).unwrap();
}

fn job(dir: &Path, input: &Path) -> LogoJob {
    LogoJob {
        input: input.to_path_buf(),
        output: dir.join("logo-primary.png"),
        thumbnail: None,
        mask: None,
    }
}

#[test]
fn test_jpeg_backdrop_becomes_transparent() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("logo.jpg");
    write_logo_jpeg(&input);

    let mut job = job(dir.path(), &input);
    job.thumbnail = Some(dir.path().join("assets").join("logo-small.png"));
    job.mask = Some(dir.path().join("logo_mask.png"));
    let options = ExportOptions { thumbnail_size: 16, ..Default::default() };

    let outcome = process_logo(&job, &BackgroundRemover::default(), &options).unwrap();
    assert_eq!((outcome.width, outcome.height), (64, 64));
    assert_eq!(outcome.thumbnail_dimensions, Some((16, 16)));
    let report = outcome.report.expect("removal should run for JPEG input");
    assert!(report.removed() > 64 * 64 / 2);

    let output = image::open(&job.output).unwrap().to_rgba8();
    assert_eq!(output.dimensions(), (64, 64));
    for (x, y) in [(0, 0), (63, 0), (0, 63), (63, 63), (32, 5)] {
        assert_eq!(output.get_pixel(x, y).0[3], 0, "backdrop pixel ({x}, {y})");
    }
    assert_eq!(output.get_pixel(32, 32).0[3], 255);

    let thumb = image::open(job.thumbnail.as_ref().unwrap()).unwrap();
    assert_eq!((thumb.width(), thumb.height()), (16, 16));

    let mask = image::open(job.mask.as_ref().unwrap()).unwrap().to_luma8();
    assert_eq!(mask.get_pixel(0, 0).0[0], 0);
    assert_eq!(mask.get_pixel(32, 32).0[0], 255);
}

#[test]
fn test_auto_mode_passes_alpha_sources_through() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("logo.png");
    RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255])).save(&input).unwrap();

    let job = job(dir.path(), &input);
    let outcome = process_logo(&job, &BackgroundRemover::default(), &ExportOptions::default()).unwrap();
    assert!(outcome.report.is_none());

    let output = image::open(&job.output).unwrap().to_rgba8();
    assert!(output.pixels().all(|p| p.0[3] == 255));
}

#[test]
fn test_always_mode_cleans_alpha_sources() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("logo.png");
    RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255])).save(&input).unwrap();

    let job = job(dir.path(), &input);
    let options = ExportOptions { mode: RemovalMode::Always, ..Default::default() };
    let outcome = process_logo(&job, &BackgroundRemover::default(), &options).unwrap();
    assert_eq!(outcome.report.map(|r| r.removed()), Some(64));

    let output = image::open(&job.output).unwrap().to_rgba8();
    assert!(output.pixels().all(|p| p.0[3] == 0));
}

#[test]
fn test_never_mode_adds_opaque_alpha() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("logo.jpg");
    write_logo_jpeg(&input);

    let job = job(dir.path(), &input);
    let options = ExportOptions { mode: RemovalMode::Never, ..Default::default() };
    process_logo(&job, &BackgroundRemover::default(), &options).unwrap();

    let output = image::open(&job.output).unwrap();
    assert!(output.color().has_alpha());
    assert!(output.to_rgba8().pixels().all(|p| p.0[3] == 255));
}

#[test]
fn test_missing_input_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let job = job(dir.path(), &dir.path().join("absent.jpg"));

    let err = process_logo(&job, &BackgroundRemover::default(), &ExportOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Missing { .. }));
    assert!(!job.output.exists());
}

#[test]
fn test_undecodable_input_is_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.png");
    fs::write(&input, b"definitely not a png").unwrap();

    let job = job(dir.path(), &input);
    let err = process_logo(&job, &BackgroundRemover::default(), &ExportOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Input { .. }));
    assert!(err.to_string().contains("broken.png"));
    assert!(!job.output.exists());
}

#[test]
fn test_failed_write_leaves_no_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("logo.jpg");
    write_logo_jpeg(&input);

    // A regular file where the thumbnail directory should be
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"").unwrap();

    let mut job = job(dir.path(), &input);
    job.thumbnail = Some(blocker.join("logo-small.png"));

    let err = process_logo(&job, &BackgroundRemover::default(), &ExportOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Encoding { .. }));
    assert!(!job.output.exists());
}

#[test]
fn test_failed_write_keeps_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("logo.jpg");
    write_logo_jpeg(&input);

    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"").unwrap();

    let mut job = job(dir.path(), &input);
    fs::write(&job.output, b"last release").unwrap();
    job.thumbnail = Some(blocker.join("logo-small.png"));

    let err = process_logo(&job, &BackgroundRemover::default(), &ExportOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Encoding { .. }));
    assert_eq!(fs::read(&job.output).unwrap(), b"last release");

    // No staging files left behind
    let mut names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect();
    names.sort();
    assert_eq!(names, ["blocker", "logo-primary.png", "logo.jpg"]);
}

#[test]
fn test_successful_run_replaces_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("logo.jpg");
    write_logo_jpeg(&input);

    let job = job(dir.path(), &input);
    fs::write(&job.output, b"last release").unwrap();

    process_logo(&job, &BackgroundRemover::default(), &ExportOptions::default()).unwrap();
    let output = image::open(&job.output).unwrap();
    assert_eq!((output.width(), output.height()), (64, 64));
}
