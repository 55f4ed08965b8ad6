//! Capture loop: read → sample → classify → overlay → display, then plot.
//!
//! The loop runs through three phases. `Opening` acquires the video source,
//! then starts the analyzer and the window; failing to open the source is the
//! only fatal error and happens before anything else is touched. `Running`
//! processes frames until the stream ends or the quit key is pressed.
//! `Closing` releases the source and window, then hands the rolling history
//! to the plotter.
//!
//! Video I/O is reached through [`VideoBackend`] so the loop itself has no
//! dependency on a particular capture or GUI library.

use crate::analyzer::{AnalyzeError, EmotionAnalyzer};
use crate::classifier::{FailureCounts, FrameClassifier};
use crate::fps::FpsMeter;
use crate::frame::{FrameError, VideoFrame};
use crate::history::EmotionHistory;
use crate::overlay;
use crate::plot::{PlotError, SummaryPlotter};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Classify every Nth frame.
pub const SAMPLE_STRIDE: u64 = 3;
/// Key that ends the session.
pub const QUIT_KEY: char = 'q';
pub const WINDOW_TITLE: &str = "Emotion Analysis";

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("could not open video source {0}")]
    Open(String),
    #[error("frame read failed: {0}")]
    Read(String),
    #[error("release failed: {0}")]
    Release(String),
}

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("could not open window: {0}")]
    Open(String),
    #[error("display failed: {0}")]
    Show(String),
}

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Could not open video source")]
    SourceUnavailable(#[source] SourceError),
    #[error("display: {0}")]
    Display(#[from] DisplayError),
    #[error("overlay: {0}")]
    Overlay(#[from] FrameError),
    #[error("plot: {0}")]
    Plot(#[from] PlotError),
}

/// Where frames come from: a capture device index or a video file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    Device(i32),
    File(PathBuf),
}

impl FromStr for SourceSpec {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().parse::<i32>() {
            Ok(index) => SourceSpec::Device(index),
            Err(_) => SourceSpec::File(PathBuf::from(s)),
        })
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSpec::Device(index) => write!(f, "device {index}"),
            SourceSpec::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// An opened stream of frames.
pub trait FrameSource {
    type Frame: VideoFrame;

    /// Next frame, or `None` at end of stream.
    fn read_frame(&mut self) -> Result<Option<Self::Frame>, SourceError>;

    fn release(&mut self) -> Result<(), SourceError>;
}

/// An on-screen window showing annotated frames.
pub trait FrameSink<F> {
    fn show(&mut self, frame: &F) -> Result<(), DisplayError>;

    /// Pump window events once and return the key pressed, if any.
    fn poll_key(&mut self) -> Result<Option<char>, DisplayError>;

    fn close(&mut self) -> Result<(), DisplayError>;
}

/// Factory for the capture and display halves of a session.
pub trait VideoBackend {
    type Source: FrameSource;
    type Sink: FrameSink<<Self::Source as FrameSource>::Frame>;

    fn open_source(&mut self, spec: &SourceSpec) -> Result<Self::Source, SourceError>;
    fn open_sink(&mut self, title: &str) -> Result<Self::Sink, DisplayError>;
}

/// Session state. Each phase owns the resources that are live in it.
enum Phase<S, K, A> {
    Opening,
    Running {
        source: S,
        sink: K,
        classifier: FrameClassifier<Option<A>>,
    },
    Closing {
        source: S,
        sink: K,
        classifier: FrameClassifier<Option<A>>,
        streamed: Result<EndReason, CaptureError>,
        elapsed: Duration,
    },
}

impl<S, K, A> Phase<S, K, A> {
    fn name(&self) -> &'static str {
        match self {
            Phase::Opening => "opening",
            Phase::Running { .. } => "running",
            Phase::Closing { .. } => "closing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    EndOfStream,
    UserQuit,
}

/// Summary of a finished session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub source: String,
    pub end_reason: EndReason,
    pub frames_read: u64,
    pub frames_sampled: u64,
    pub frames_classified: u64,
    pub failures: FailureCounts,
    pub elapsed_secs: f64,
    pub average_fps: f64,
    pub plot: PathBuf,
    pub history: EmotionHistory,
}

#[derive(Debug, Default)]
struct Counters {
    frames_read: u64,
    frames_sampled: u64,
    frames_classified: u64,
}

/// Single-threaded capture session.
///
/// `load_analyzer` runs once, after the source has opened and before the
/// window appears. If it fails the session still runs and every sampled
/// frame yields no result.
pub struct CaptureLoop<B, L, P> {
    backend: B,
    load_analyzer: Option<L>,
    plotter: P,
    history: EmotionHistory,
    counters: Counters,
}

impl<B, L, A, P> CaptureLoop<B, L, P>
where
    B: VideoBackend,
    L: FnOnce() -> Result<A, AnalyzeError>,
    A: EmotionAnalyzer,
    P: SummaryPlotter,
{
    pub fn new(backend: B, load_analyzer: L, plotter: P) -> Self {
        Self {
            backend,
            load_analyzer: Some(load_analyzer),
            plotter,
            history: EmotionHistory::new(),
            counters: Counters::default(),
        }
    }

    /// Run the session to completion.
    ///
    /// Returns [`CaptureError::SourceUnavailable`] without loading models,
    /// opening a window or writing a plot when the source cannot be opened.
    pub fn run(mut self, spec: &SourceSpec) -> Result<SessionReport, CaptureError> {
        let mut phase: Phase<B::Source, B::Sink, A> = Phase::Opening;

        loop {
            tracing::debug!(phase = phase.name(), "capture phase");
            phase = match phase {
                Phase::Opening => {
                    let source = self
                        .backend
                        .open_source(spec)
                        .map_err(CaptureError::SourceUnavailable)?;
                    tracing::debug!(source = %spec, "video source opened");

                    let classifier = FrameClassifier::new(self.start_analyzer());
                    let sink = self.backend.open_sink(WINDOW_TITLE)?;
                    Phase::Running { source, sink, classifier }
                }
                Phase::Running { mut source, mut sink, mut classifier } => {
                    let started = Instant::now();
                    let streamed = self.stream(&mut source, &mut sink, &mut classifier, started);
                    Phase::Closing {
                        source,
                        sink,
                        classifier,
                        streamed,
                        elapsed: started.elapsed(),
                    }
                }
                Phase::Closing { mut source, mut sink, classifier, streamed, elapsed } => {
                    if let Err(e) = source.release() {
                        tracing::warn!(error = %e, "failed to release video source");
                    }
                    if let Err(e) = sink.close() {
                        tracing::warn!(error = %e, "failed to close display");
                    }
                    let end_reason = streamed?;
                    return self.finish(spec, end_reason, classifier.failures(), elapsed);
                }
            };
        }
    }

    fn start_analyzer(&mut self) -> Option<A> {
        match self.load_analyzer.take().map(|load| load()) {
            Some(Ok(analyzer)) => Some(analyzer),
            Some(Err(e)) => {
                tracing::error!(error = %e, "emotion models unavailable, frames will not be classified");
                None
            }
            None => None,
        }
    }

    fn finish(
        mut self,
        spec: &SourceSpec,
        end_reason: EndReason,
        failures: FailureCounts,
        elapsed: Duration,
    ) -> Result<SessionReport, CaptureError> {
        let plot = self.plotter.save(&self.history)?;

        let elapsed_secs = elapsed.as_secs_f64();
        let report = SessionReport {
            source: spec.to_string(),
            end_reason,
            frames_read: self.counters.frames_read,
            frames_sampled: self.counters.frames_sampled,
            frames_classified: self.counters.frames_classified,
            failures,
            elapsed_secs,
            average_fps: if elapsed_secs > 0.0 {
                self.counters.frames_read as f64 / elapsed_secs
            } else {
                0.0
            },
            plot,
            history: self.history,
        };

        tracing::info!(
            reason = ?report.end_reason,
            frames = report.frames_read,
            classified = report.frames_classified,
            dropped = report.failures.total(),
            "capture session finished"
        );
        Ok(report)
    }

    fn stream(
        &mut self,
        source: &mut B::Source,
        sink: &mut B::Sink,
        classifier: &mut FrameClassifier<Option<A>>,
        started: Instant,
    ) -> Result<EndReason, CaptureError> {
        let mut fps = FpsMeter::start(started);

        loop {
            let mut frame = match source.read_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => return Ok(EndReason::EndOfStream),
                Err(e) => {
                    tracing::warn!(error = %e, "frame read failed, treating as end of stream");
                    return Ok(EndReason::EndOfStream);
                }
            };

            self.counters.frames_read += 1;
            let frame_number = self.counters.frames_read;

            if frame_number % SAMPLE_STRIDE == 0 {
                self.counters.frames_sampled += 1;
                let scores = classifier.classify(&frame).filter(|scores| !scores.is_empty());
                if let Some(scores) = &scores {
                    self.history.update(scores);
                    self.counters.frames_classified += 1;
                    tracing::debug!(
                        frame = frame_number,
                        dominant = ?scores.dominant().map(|(e, _)| e),
                        "frame classified"
                    );
                }
                overlay::render_emotions(&mut frame, scores.as_ref())?;
            }

            let rate = fps.tick(Instant::now());
            overlay::render_fps(&mut frame, rate)?;

            sink.show(&frame)?;

            if sink.poll_key()? == Some(QUIT_KEY) {
                tracing::info!(frame = frame_number, "quit requested");
                return Ok(EndReason::UserQuit);
            }
        }
    }
}
