//! Plant Analysis Example
//!
//! This example runs one full analysis cycle: it loads a TFLite species model
//! and its labels, classifies a single image, and, when a plant is detected,
//! asks the diagnostic server for care recommendations.
//!
//! Usage:
//!   cargo run --example analyze_plant -- --model <model.tflite> --labels <labels.txt> \
//!       --image <photo.jpg> [--server http://localhost:8080] [--threshold 0.55]

use clap::Parser;
use plant_care_runner::{
    AnalysisConfig, AnalysisController, AnalysisState, ClassifierConfig, ClassifierHandle,
    DiagnosticClient, LoadStatus,
};
use std::error::Error;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Command line parameters for the plant analysis example
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the .tflite species model
    #[arg(short, long)]
    model: String,

    /// Path to the label file (one species per line)
    #[arg(short, long)]
    labels: String,

    /// Path to the image file to analyze
    #[arg(short, long)]
    image: String,

    /// Base URL of the diagnostic server
    #[arg(short, long, default_value = "http://localhost:8080")]
    server: String,

    /// Minimum confidence to treat the photo as a detected plant
    #[arg(short, long, default_value_t = plant_care_runner::DEFAULT_DETECTION_THRESHOLD)]
    threshold: f32,

    /// Number of ranked predictions to keep
    #[arg(short = 'k', long, default_value_t = plant_care_runner::DEFAULT_TOP_K)]
    top_k: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config = AnalysisConfig::default()
        .with_detection_threshold(args.threshold)
        .with_top_k(args.top_k);

    let classifier = ClassifierHandle::spawn(ClassifierConfig::tflite(&args.model, &args.labels));
    let client = DiagnosticClient::new(args.server.clone())?;

    match client.health().await {
        Ok(health) if health.is_healthy() => println!("Diagnostic server is healthy"),
        Ok(health) => println!("Diagnostic server reported: {:?}", health),
        Err(e) => println!("Diagnostic server unreachable: {}", e),
    }

    if let LoadStatus::Failed(e) = classifier.wait_ready().await {
        return Err(format!("Error loading model: {}", e).into());
    }

    let bytes = std::fs::read(&args.image)?;
    let mut controller = AnalysisController::new(classifier, Arc::new(client), config)?;
    if let Some(message) = controller.capture_bytes(&bytes).user_message() {
        println!("{}", message);
        return Ok(());
    }

    let state = controller.run_cycle().await?.clone();

    if let Some(predictions) = controller.predictions() {
        println!("\nPredictions:");
        for prediction in predictions {
            println!("  {}", prediction);
        }
    }

    match &state {
        AnalysisState::Completed {
            label,
            confidence,
            diagnostic,
        } => {
            println!("\nSpecies: {} ({:.1}%)", label, confidence * 100.0);
            if let Some(species) = &diagnostic.validated_species {
                println!("Validated species: {}", species);
            }
            if let Some(urgency) = diagnostic.urgency() {
                println!("Urgency: {}", urgency);
            }
            for symptom in diagnostic.symptoms() {
                println!("  symptom: {}", symptom);
            }
            for cause in diagnostic.causes() {
                println!("  likely cause: {}", cause);
            }
            println!("\nCare tips:\n{}", diagnostic.care_tips());
        }
        other => {
            if let Some(message) = other.user_message() {
                println!("\n{}", message);
            }
        }
    }

    Ok(())
}
