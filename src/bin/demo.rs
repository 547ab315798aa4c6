//! demo - run the red light pipeline on a synthetic frame or an image file

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};

use signal_witness::{
    AnchorPrediction, ClassificationPipeline, ClassifierConfig, ColorClassifier, Frame,
    LightState, ObjectLocalizer, StubBackend, TRAFFIC_LIGHT_CLASS_ID,
};

const SYNTHETIC_WIDTH: u32 = 320;
const SYNTHETIC_HEIGHT: u32 = 240;
const COCO_CLASSES: usize = 80;
const COCO_CAR: usize = 2;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Image to classify. Needs the backend-tract feature and the model artifacts.
    #[arg(long)]
    image: Option<PathBuf>,
    /// TOML config file.
    #[arg(long, env = "TL_CONFIG")]
    config: Option<PathBuf>,
    /// Synthetic frame only: leave the top bulb dark.
    #[arg(long)]
    dark: bool,
    /// Print a JSON report.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report {
    state: LightState,
    code: u8,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = ClassifierConfig::load_from(args.config.as_deref())?;
    let state = match &args.image {
        Some(path) => classify_image(&config, path)?,
        None => classify_synthetic(&config, !args.dark)?,
    };

    if args.json {
        let report = Report {
            state,
            code: state.code(),
        };
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("{:?}", state);
    }
    Ok(())
}

fn stage(msg: &str) {
    eprintln!("demo: {}", msg);
}

#[cfg(feature = "backend-tract")]
fn classify_image(config: &ClassifierConfig, path: &Path) -> Result<LightState> {
    use anyhow::Context;

    stage("load detector");
    let pipeline = ClassificationPipeline::from_config(config)?;
    stage("decode image");
    let image = image::open(path)
        .with_context(|| format!("failed to decode {}", path.display()))?
        .to_rgb8();
    let frame = Frame::from_rgb_image(&image);
    stage("classify");
    Ok(pipeline.get_classification(&frame))
}

#[cfg(not(feature = "backend-tract"))]
fn classify_image(_config: &ClassifierConfig, _path: &Path) -> Result<LightState> {
    Err(anyhow::anyhow!(
        "image classification requires the backend-tract feature"
    ))
}

fn classify_synthetic(config: &ClassifierConfig, lit: bool) -> Result<LightState> {
    stage("build synthetic frame");
    let frame = synthetic_frame(lit)?;

    // Housing at x 200..220, y 60..120, plus a car elsewhere in the scene.
    let anchors = vec![
        scripted_anchor(0.25, 0.75, 0.25, 0.125, COCO_CAR, 0.92),
        scripted_anchor(0.65625, 0.375, 0.0625, 0.25, TRAFFIC_LIGHT_CLASS_ID, 0.81),
    ];
    let localizer = ObjectLocalizer::new(StubBackend::new(anchors), config.confidence_threshold)?
        .with_class_id(config.traffic_light_class_id);
    let pipeline =
        ClassificationPipeline::new(localizer, ColorClassifier::new(config.intensity_threshold));

    stage("classify");
    Ok(pipeline.get_classification(&frame))
}

fn scripted_anchor(
    cx: f32,
    cy: f32,
    w: f32,
    h: f32,
    class_id: usize,
    score: f32,
) -> AnchorPrediction {
    let mut class_scores = vec![0.0; COCO_CLASSES];
    class_scores[class_id] = score;
    AnchorPrediction {
        center_x: cx,
        center_y: cy,
        width: w,
        height: h,
        objectness: score,
        class_scores,
    }
}

fn synthetic_frame(lit: bool) -> Result<Frame> {
    let mut data = Vec::with_capacity((SYNTHETIC_WIDTH * SYNTHETIC_HEIGHT * 3) as usize);
    for y in 0..SYNTHETIC_HEIGHT {
        for x in 0..SYNTHETIC_WIDTH {
            let housing = (200..220).contains(&x) && (60..120).contains(&y);
            let pixel = if housing {
                if lit && y < 80 {
                    [20, 20, 235]
                } else {
                    [15, 15, 15]
                }
            } else {
                let clutter = ((x * 7 + y * 13) % 97) as u8;
                [clutter, clutter.wrapping_mul(2), 90]
            };
            data.extend_from_slice(&pixel);
        }
    }
    Frame::bgr(data, SYNTHETIC_WIDTH, SYNTHETIC_HEIGHT)
}
