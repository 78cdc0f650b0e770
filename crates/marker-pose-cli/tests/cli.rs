use assert_cmd::Command;
use predicates::prelude::*;

const FRONTAL: &str = "240,320,400,320,400,160,240,160";

#[test]
fn solve_reports_the_frontal_pose() {
    let output = Command::cargo_bin("marker-pose")
        .expect("binary builds")
        .args([
            "solve",
            "--corners",
            FRONTAL,
            "--intrinsics",
            "800,800,320,240",
        ])
        .output()
        .expect("runs");
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json report");
    let t = report["translation"].as_array().expect("translation");
    assert!((t[2].as_f64().unwrap() - 5.0).abs() < 1e-3);
    let pos = report["camera_position"].as_array().expect("camera_position");
    assert!((pos[2].as_f64().unwrap() + 5.0).abs() < 1e-3);
}

#[test]
fn solve_rejects_truncated_corners() {
    Command::cargo_bin("marker-pose")
        .expect("binary builds")
        .args(["solve", "--corners", "1,2,3", "--intrinsics", "800,800,320,240"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("corner"));
}

#[test]
fn solve_rejects_collinear_corners() {
    Command::cargo_bin("marker-pose")
        .expect("binary builds")
        .args([
            "solve",
            "--corners",
            "10,10,20,10,30,10,40,10",
            "--intrinsics",
            "800,800,320,240",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("degenerate"));
}

#[test]
fn overlay_writes_an_annotated_png() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("frame.png");
    let out = dir.path().join("out.png");
    image::RgbaImage::new(640, 480).save(&input).expect("input png");

    Command::cargo_bin("marker-pose")
        .expect("binary builds")
        .args([
            "overlay",
            "--image",
            input.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--corners",
            FRONTAL,
            "--intrinsics",
            "800,800,320,240",
            "--label",
            "TAG 0",
        ])
        .assert()
        .success();

    let written = image::open(&out).expect("output png").to_rgba8();
    assert!(written.pixels().any(|p| p.0 != [0, 0, 0, 0]));
}
