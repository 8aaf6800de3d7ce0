//! End-to-end tests driving the `bmp-converter` binary with process workers.

use image::{ImageFormat, Rgb, RgbImage};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_bmp-converter");

fn write_bmp(path: &Path, shade: u8) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let img = RgbImage::from_pixel(3, 3, Rgb([shade, shade, shade]));
    img.save_with_format(path, ImageFormat::Bmp).unwrap();
}

fn run_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(BIN).current_dir(dir).args(args).output().unwrap()
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn converts_directory_with_process_workers() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_bmp(&root.join("input/img1.bmp"), 10);
    write_bmp(&root.join("input/img2.bmp"), 20);
    write_bmp(&root.join("input/nested/img3.bmp"), 30);
    fs::write(root.join("input/readme.txt"), b"not an image").unwrap();

    let output = run_in(root, &["input", "2"]);
    assert_eq!(output.status.code(), Some(0), "{:?}", output);

    let out_dir = root.join("converted_multi");
    assert_eq!(listing(&out_dir), vec!["img1.png", "img2.png", "img3.png"]);

    let img3 = image::open(out_dir.join("img3.png")).unwrap().to_rgb8();
    assert_eq!(img3.get_pixel(1, 1), &Rgb([30, 30, 30]));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Conversion finished in"), "{}", stdout);
    assert!(stdout.contains("converted_multi"), "{}", stdout);
}

#[test]
fn empty_directory_creates_empty_output() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("empty")).unwrap();

    let output = run_in(root, &["empty", "3"]);
    assert_eq!(output.status.code(), Some(0), "{:?}", output);

    let out_dir = root.join("converted_multi");
    assert!(out_dir.is_dir());
    assert!(listing(&out_dir).is_empty());
}

#[test]
fn corrupt_file_is_reported_and_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_bmp(&root.join("input/a.bmp"), 1);
    fs::write(root.join("input/broken.bmp"), b"BM but not really").unwrap();
    write_bmp(&root.join("input/c.bmp"), 3);

    let output = run_in(root, &["input", "1"]);
    assert_eq!(output.status.code(), Some(0), "{:?}", output);

    assert_eq!(listing(&root.join("converted_multi")), vec!["a.png", "c.png"]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("broken.bmp"), "{}", stderr);
}

#[test]
fn single_file_input() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_bmp(&root.join("only.bmp"), 5);

    let output = run_in(root, &["only.bmp", "4", "--isolation", "thread"]);
    assert_eq!(output.status.code(), Some(0), "{:?}", output);
    assert_eq!(listing(&root.join("converted_multi")), vec!["only.png"]);
}

#[test]
fn input_directory_named_worker_is_converted() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_bmp(&root.join("worker/a.bmp"), 7);

    let output = run_in(root, &["worker", "2"]);
    assert_eq!(output.status.code(), Some(0), "{:?}", output);
    assert_eq!(listing(&root.join("converted_multi")), vec!["a.png"]);
}

#[cfg(unix)]
#[test]
fn non_utf8_file_name_is_converted() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_bmp(&root.join("in/good.bmp"), 1);
    write_bmp(&root.join("in").join(OsStr::from_bytes(b"bad\xff.bmp")), 2);

    let output = run_in(root, &["in", "2"]);
    assert_eq!(output.status.code(), Some(0), "{:?}", output);

    let out_dir = root.join("converted_multi");
    assert!(out_dir.join("good.png").is_file());
    assert!(out_dir.join(OsStr::from_bytes(b"bad\xff.png")).is_file());
}

#[cfg(unix)]
#[test]
fn symlinked_bitmap_is_converted() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write_bmp(&root.join("real/a.bmp"), 9);
    fs::create_dir_all(root.join("in")).unwrap();
    std::os::unix::fs::symlink(root.join("real/a.bmp"), root.join("in/link.bmp")).unwrap();

    let output = run_in(root, &["in", "1"]);
    assert_eq!(output.status.code(), Some(0), "{:?}", output);
    assert_eq!(listing(&root.join("converted_multi")), vec!["link.png"]);
}

#[test]
fn configuration_errors_exit_with_one() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("input")).unwrap();

    let cases: &[&[&str]] = &[
        &[],
        &["input"],
        &["input", "two"],
        &["input", "0"],
        &["input", "-3"],
        &["input", "2", "extra"],
    ];

    for args in cases {
        let output = run_in(root, args);
        assert_eq!(output.status.code(), Some(1), "args {:?}: {:?}", args, output);
    }

    assert!(!root.join("converted_multi").exists());
}

#[test]
fn missing_input_exits_with_one() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_in(temp_dir.path(), &["does-not-exist", "2"]);
    assert_eq!(output.status.code(), Some(1), "{:?}", output);
}

#[test]
fn help_exits_cleanly() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_in(temp_dir.path(), &["--help"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("WORKER_COUNT"));
}
