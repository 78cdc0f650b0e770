use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::{info, LevelFilter};
use nalgebra::Point2;
use serde::Serialize;

use marker_pose::convert::rgba_view_mut;
use marker_pose::core::init_with_level;
use marker_pose::{
    draw_label, CameraIntrinsics, DistortionCoeffs, LabelOrientation, LabelStyle, MarkerSquare,
    PoseEstimator, Stroke,
};

#[derive(Parser)]
#[command(
    name = "marker-pose",
    about = "Square-marker pose estimation and AR overlay",
    version
)]
struct Cli {
    /// Log verbosity: off, error, warn, info, debug, trace.
    #[arg(long, global = true, default_value = "warn")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve the marker pose from four pixel corners and print a JSON report.
    Solve(SolveArgs),
    /// Draw the marker outline (and optional extras) over a PNG image.
    Overlay(OverlayArgs),
}

#[derive(Args)]
struct PoseInputs {
    /// Corner pixels as 8 comma-separated values x0,y0,...,x3,y3 in marker
    /// order: top-left, top-right, bottom-right, bottom-left.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    corners: Vec<f64>,

    /// Intrinsics: 9 row-major 3x3 values, or 4 values fx,fy,cx,cy.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    intrinsics: Vec<f64>,

    /// Marker side length in physical units.
    #[arg(long, default_value_t = 1.0)]
    side_length: f64,

    /// Optional Brown-Conrady coefficients k1,k2,p1,p2,k3.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    distortion: Option<Vec<f64>>,
}

#[derive(Args)]
struct SolveArgs {
    #[command(flatten)]
    inputs: PoseInputs,
}

#[derive(Args)]
struct OverlayArgs {
    #[command(flatten)]
    inputs: PoseInputs,

    /// Input image (any format `image` can decode).
    #[arg(long)]
    image: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Optional flat 3D points (x,y,z triples, marker-local) to project and
    /// stroke as a closed polyline.
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    draw: Option<Vec<f64>>,

    /// Optional text label.
    #[arg(long)]
    label: Option<String>,

    /// Label anchor in pixels.
    #[arg(long, value_delimiter = ',', num_args = 2, default_values_t = [16, 16])]
    label_pos: Vec<i32>,

    /// Stroke diameter in pixels.
    #[arg(long, default_value_t = 2)]
    stroke_width: u32,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("expected 8 corner values (x0,y0,...,x3,y3), got {0}")]
    BadCorners(usize),
    #[error("expected 9 (row-major 3x3) or 4 (fx,fy,cx,cy) intrinsic values, got {0}")]
    BadIntrinsics(usize),
    #[error("expected 5 distortion coefficients (k1,k2,p1,p2,k3), got {0}")]
    BadDistortion(usize),
    #[error("draw points must come as x,y,z triples, got {0} values")]
    BadDrawPoints(usize),
    #[error(transparent)]
    Pose(#[from] marker_pose::PoseError),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct SolveReport {
    /// Axis-angle (Rodrigues) rotation of the marker in the camera frame.
    rvec: [f64; 3],
    translation: [f64; 3],
    /// Camera position in marker-local coordinates.
    camera_position: [f64; 3],
    reprojection_rmse_px: f64,
    has_alternate: bool,
    alternate_rmse_px: Option<f64>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _ = init_with_level(cli.log_level);

    let result = match cli.command {
        Command::Solve(args) => run_solve(args),
        Command::Overlay(args) => run_overlay(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn estimator_from(inputs: &PoseInputs) -> Result<PoseEstimator, CliError> {
    let intrinsics = match inputs.intrinsics.len() {
        9 => {
            let mut k = [0.0; 9];
            k.copy_from_slice(&inputs.intrinsics);
            CameraIntrinsics::from_row_array(&k)
        }
        4 => CameraIntrinsics::from_params(
            inputs.intrinsics[0],
            inputs.intrinsics[1],
            inputs.intrinsics[2],
            inputs.intrinsics[3],
        ),
        n => return Err(CliError::BadIntrinsics(n)),
    };

    let distortion = match &inputs.distortion {
        None => DistortionCoeffs::ZERO,
        Some(c) if c.len() == 5 => {
            DistortionCoeffs::from_array(&[c[0], c[1], c[2], c[3], c[4]])
        }
        Some(c) => return Err(CliError::BadDistortion(c.len())),
    };

    Ok(
        PoseEstimator::new(intrinsics, MarkerSquare::new(inputs.side_length))
            .with_distortion(distortion),
    )
}

fn corners_from(inputs: &PoseInputs) -> Result<[Point2<f64>; 4], CliError> {
    if inputs.corners.len() != 8 {
        return Err(CliError::BadCorners(inputs.corners.len()));
    }
    let c = &inputs.corners;
    Ok([
        Point2::new(c[0], c[1]),
        Point2::new(c[2], c[3]),
        Point2::new(c[4], c[5]),
        Point2::new(c[6], c[7]),
    ])
}

fn run_solve(args: SolveArgs) -> Result<(), CliError> {
    let estimator = estimator_from(&args.inputs)?;
    let corners = corners_from(&args.inputs)?;
    let solution = estimator.estimate(&corners)?;

    let pose = solution.pose();
    let rvec = pose.rvec();
    let pos = pose.camera_position();
    let report = SolveReport {
        rvec: [rvec.x, rvec.y, rvec.z],
        translation: [pose.translation.x, pose.translation.y, pose.translation.z],
        camera_position: [pos.x, pos.y, pos.z],
        reprojection_rmse_px: solution.best_rmse,
        has_alternate: solution.alternate.is_some(),
        alternate_rmse_px: solution.alternate_rmse,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_overlay(args: OverlayArgs) -> Result<(), CliError> {
    let estimator = estimator_from(&args.inputs)?;
    let corners = corners_from(&args.inputs)?;
    let stroke = Stroke {
        width: args.stroke_width,
        ..Stroke::default()
    };

    let draw_points = match &args.draw {
        Some(flat) if flat.len() % 3 != 0 => return Err(CliError::BadDrawPoints(flat.len())),
        Some(flat) => flat
            .chunks_exact(3)
            .map(|p| nalgebra::Point3::new(p[0], p[1], p[2]))
            .collect(),
        None => Vec::new(),
    };

    let mut frame = image::open(&args.image)?.to_rgba8();
    {
        let mut view = rgba_view_mut(&mut frame);
        let pos = estimator.estimate_and_draw(&mut view, &corners, &stroke)?;
        info!("camera position: {:.4} {:.4} {:.4}", pos.x, pos.y, pos.z);

        if !draw_points.is_empty() {
            estimator.draw_projected_polyline(&mut view, &corners, &draw_points, &stroke)?;
        }

        if let Some(text) = &args.label {
            draw_label(
                &mut view,
                text,
                [args.label_pos[0], args.label_pos[1]],
                LabelOrientation::Horizontal,
                &LabelStyle::default(),
            );
        }
    }

    frame.save(&args.out)?;
    info!("wrote overlay to {}", args.out.display());
    Ok(())
}
