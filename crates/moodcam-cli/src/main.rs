use anyhow::{Context, Result};
use clap::Parser;
use moodcam_core::capture::QUIT_KEY;
use moodcam_core::{CaptureError, CaptureLoop, DetectorBackend, FaceEmotionAnalyzer, HistoryPlotter, SourceSpec};
use moodcam_hw::OpenCvBackend;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod config;

#[derive(Parser)]
#[command(name = "moodcam", about = "Live facial emotion analysis with a rolling history plot")]
struct Cli {
    /// Camera index (e.g. 0) or path to a video file
    #[arg(default_value = "0")]
    source: SourceSpec,

    /// Directory containing det_500m.onnx and emotion.onnx
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Where the emotion_analysis_<timestamp>.png plot is written
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Face detector backend: scrfd, or skip to classify whole frames
    #[arg(long, default_value = "scrfd")]
    detector: DetectorBackend,

    /// Drop frames with no detected face instead of classifying the whole frame
    #[arg(long)]
    enforce_detection: bool,

    /// Write a JSON session summary to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

/// How a session ended, as seen by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Finished,
    SourceUnavailable,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli, &mut io::stdout(), &mut io::stderr()) {
        Ok(Outcome::Finished) => ExitCode::SUCCESS,
        Ok(Outcome::SourceUnavailable) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, out: &mut impl Write, err: &mut impl Write) -> Result<Outcome> {
    let config = config::Config::from_env().with_model_dir(cli.model_dir);
    let analyzer_config = config.analyzer_config(cli.detector, cli.enforce_detection);

    let report = {
        let start = || {
            if let Err(e) = writeln!(out, "Starting video analysis... Press '{QUIT_KEY}' to quit") {
                tracing::warn!(error = %e, "failed to write to stdout");
            }
            tracing::info!(
                model_dir = %config.model_dir.display(),
                detector = ?analyzer_config.backend,
                "loading models"
            );
            FaceEmotionAnalyzer::load(&analyzer_config)
        };
        let capture = CaptureLoop::new(OpenCvBackend, start, HistoryPlotter::new(&cli.output_dir));

        match capture.run(&cli.source) {
            Ok(report) => report,
            Err(CaptureError::SourceUnavailable(e)) => {
                tracing::debug!(error = %e, source = %cli.source, "open failed");
                writeln!(err, "Error: Could not open video source")?;
                return Ok(Outcome::SourceUnavailable);
            }
            Err(e) => return Err(e.into()),
        }
    };

    writeln!(out, "\nEmotion analysis plot saved as {}", report.plot.display())?;

    if let Some(path) = cli.report {
        let json = serde_json::to_vec_pretty(&report)?;
        std::fs::write(&path, json).with_context(|| format!("failed to write report {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote session report");
    }

    Ok(Outcome::Finished)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unopenable_source_prints_single_error_line() {
        let cli = Cli::try_parse_from([
            "moodcam",
            "/no/such/dir/clip.mp4",
            "--model-dir",
            "/no/such/models",
        ])
        .unwrap();
        let mut out = Vec::new();
        let mut err = Vec::new();

        let outcome = run(cli, &mut out, &mut err).unwrap();

        assert_eq!(outcome, Outcome::SourceUnavailable);
        assert!(out.is_empty(), "{}", String::from_utf8_lossy(&out));
        assert_eq!(String::from_utf8(err).unwrap(), "Error: Could not open video source\n");
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["moodcam"]).unwrap();
        assert_eq!(cli.source, SourceSpec::Device(0));
        assert_eq!(cli.output_dir, PathBuf::from("."));
        assert_eq!(cli.detector, DetectorBackend::Scrfd);
        assert!(!cli.enforce_detection);
        assert!(cli.report.is_none());
    }
}
