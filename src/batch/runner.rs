use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::batch::cancel::CancelFlag;
use crate::batch::events::{
    BatchEvent, BatchSummary, EventSender, EventSink, FileFailure, FileReport, SkippedFile,
};
use crate::config::BatchConfig;
use crate::detection::{diff, ClipFlush, StrikeDetector, StrikeTracker};
use crate::error::{ConfigError, Result, StrikeError, VideoError};
use crate::output::{OutputLayout, OutputNamer, ScoreLog};
use crate::video::VideoBackend;

/// Share of the progress bar spent before the first file
const STARTUP_PROGRESS: f64 = 10.0;

enum FileOutcome {
    Processed(FileReport),
    Skipped(String),
}

/// Runs strike detection over every file of the input folder
///
/// The pipeline for one file is:
/// 1. Open the file through the [`VideoBackend`] and reject non-videos
/// 2. Score every consecutive frame pair
/// 3. Feed the scores through a [`StrikeDetector`]
/// 4. Write stills, clips and the score log
///
/// `run` never fails: problems are reported as [`BatchEvent`]s and recorded
/// in the returned [`BatchSummary`].
pub struct BatchRunner<B: VideoBackend> {
    backend: B,
    config: BatchConfig,
    layout: OutputLayout,
    namer: OutputNamer,
    events: EventSink,
    cancel: CancelFlag,
    /// Strikes of every file processed so far
    total_strikes: u64,
}

impl<B: VideoBackend> BatchRunner<B> {
    pub fn new(backend: B, config: BatchConfig, events: EventSender) -> Self {
        let layout = OutputLayout::new(&config.output_dir, &config.config.output);
        let namer = layout.namer(&config.config.output.clip_extension);
        Self {
            backend,
            config,
            layout,
            namer,
            events: EventSink::new(events),
            cancel: CancelFlag::new(),
            total_strikes: 0,
        }
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn run(mut self) -> BatchSummary {
        let mut summary = BatchSummary::start();

        info!("🔍 Starting strike scan");
        info!("   Input: {:?}", self.config.input_dir);
        info!("   Output: {:?}", self.config.output_dir);
        info!("   Threshold: {}", self.config.threshold());
        info!("   Naming: {}", self.config.naming());

        if self.config.config.detection.auto_threshold {
            warn!("Automatic threshold is not available yet, using manual threshold {}",
                  self.config.threshold());
        }

        let entries = match self.prepare() {
            Ok(entries) => entries,
            Err(e) => {
                error!("Batch aborted: {}", e);
                self.events.error(e.user_message());
                self.events.progress(0.0);
                summary.aborted = Some(e.to_string());
                return self.finish(summary);
            }
        };

        self.events.progress(STARTUP_PROGRESS);
        summary.entries = entries.len();
        let per_file = (100.0 - STARTUP_PROGRESS) / entries.len().max(1) as f64;

        for (index, path) in entries.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!("Cancelled before {}", path.display());
                summary.cancelled = true;
                break;
            }

            let file_base = STARTUP_PROGRESS + index as f64 * per_file;
            self.events.progress(file_base);

            let name = display_name(path);
            info!("Processing {} ({}/{})", name, index + 1, entries.len());
            self.events.send(BatchEvent::FileStarted {
                index,
                total: entries.len(),
                name: name.clone(),
            });

            match self.process_file(path, &name, file_base, per_file) {
                Ok(FileOutcome::Processed(report)) => {
                    info!("   ✅ {}: {} strikes, {} images, {} clips",
                          report.name, report.strikes, report.images, report.clips);
                    summary.total_strikes = self.total_strikes;
                    summary.cancelled |= report.cancelled;
                    self.events.send(BatchEvent::FileFinished(report.clone()));
                    summary.processed.push(report);
                }
                Ok(FileOutcome::Skipped(reason)) => {
                    info!("   Skipping {}: {}", name, reason);
                    let skipped = SkippedFile { name, reason };
                    self.events.send(BatchEvent::FileSkipped(skipped.clone()));
                    summary.skipped.push(skipped);
                }
                Err(e) if e.is_fatal_to_batch() => {
                    error!("Batch aborted on {}: {}", name, e);
                    self.events.error(e.user_message());
                    summary.aborted = Some(e.to_string());
                    break;
                }
                Err(e) => {
                    warn!("   ❌ {} failed: {}", name, e);
                    self.events.error(format!("{}: {}", name, e.user_message()));
                    let failure = FileFailure { name, error: e.to_string() };
                    self.events.send(BatchEvent::FileFailed(failure.clone()));
                    summary.failures.push(failure);
                }
            }
        }

        if summary.aborted.is_none() && !summary.cancelled {
            self.events.progress(100.0);
        }
        self.finish(summary)
    }

    fn finish(self, mut summary: BatchSummary) -> BatchSummary {
        summary.finish();
        info!("🏁 Scan finished: {}", summary);
        self.events.send(BatchEvent::Finished(summary.clone()));
        summary
    }

    /// Validate folders, create output subfolders and list the input entries
    fn prepare(&self) -> Result<Vec<PathBuf>> {
        self.config.config.validate()?;

        if !self.config.input_dir.is_dir() {
            return Err(ConfigError::InvalidInputFolder {
                path: self.config.input_dir.display().to_string(),
            }.into());
        }
        if !self.config.output_dir.is_dir() {
            return Err(ConfigError::InvalidOutputFolder {
                path: self.config.output_dir.display().to_string(),
            }.into());
        }

        self.layout.ensure_dirs()?;

        // Listed after creating the output folders, which may live inside the input
        let entries = std::fs::read_dir(&self.config.input_dir)
            .map_err(|_| ConfigError::InvalidInputFolder {
                path: self.config.input_dir.display().to_string(),
            })?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;

        debug!("Found {} entries in {}", entries.len(), self.config.input_dir.display());
        Ok(entries)
    }

    fn process_file(
        &mut self,
        path: &Path,
        name: &str,
        file_base: f64,
        per_file: f64,
    ) -> Result<FileOutcome> {
        if !path.is_file() {
            return Ok(FileOutcome::Skipped("not a file".to_string()));
        }

        let mut source = match self.backend.open(path) {
            Ok(source) => source,
            Err(StrikeError::Video(VideoError::OpenFailed { .. })) => {
                return Ok(FileOutcome::Skipped("could not be opened".to_string()));
            }
            Err(e) => return Err(e),
        };

        let meta = *source.meta();
        if let Some(rejection) = meta.rejection() {
            debug!("{}: {} frames, {} fps", name, meta.frame_count, meta.fps);
            return Ok(FileOutcome::Skipped(rejection.to_string()));
        }

        let threshold = self.config.threshold();
        let naming = self.config.naming();
        let expected_pairs = meta.exact_pair_count();
        let mut report = FileReport::new(name, meta);
        let mut log = ScoreLog::create(self.layout.log_prefix(name))?;
        let mut detector = StrikeDetector::with_tracker(StrikeTracker::continuing(self.total_strikes));

        let Some(mut prev) = source.next_frame()? else {
            return match expected_pairs {
                Some(pairs) if pairs > 0 => Err(VideoError::Truncated {
                    read: 0,
                    expected: meta.frame_count as u64,
                }.into()),
                _ => Ok(FileOutcome::Processed(report)),
            };
        };

        let mut index: u64 = 0;
        let mut ended_early = false;
        loop {
            if expected_pairs.is_some_and(|pairs| index >= pairs) {
                break;
            }
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            if meta.frame_count_known() {
                let done = (index as f64 / (meta.frame_count as f64 + 1.0)).min(1.0);
                self.events.progress(file_base + done * per_file);
            }

            let Some(curr) = source.next_frame()? else {
                ended_early = expected_pairs.is_some();
                break;
            };

            let score = diff::score(&prev, &curr)?;
            let decision = detector.process(index, score, threshold, &curr);

            if decision.strike {
                debug!("Strike in {} at frame {} (score {})", name, index, score);
            }
            if decision.overflowed {
                report.overflows += 1;
            }
            if let Some(clip) = decision.clip_flush {
                self.write_clip(name, meta.fps, clip)?;
                report.clips += 1;
            }
            if decision.save_frame {
                let paths = self.namer.name_for(name, index, meta.fps, naming);
                curr.save_png(&paths.image)?;
                report.images += 1;
            }

            log.record(score)?;
            report.pairs += 1;
            prev = curr;
            index += 1;
        }

        // The last event is written out even when the stream came up short
        if let Some(clip) = detector.finish() {
            self.write_clip(name, meta.fps, clip)?;
            report.clips += 1;
        }

        if ended_early {
            return Err(VideoError::Truncated {
                read: index + 1,
                expected: meta.frame_count as u64,
            }.into());
        }
        if meta.frame_count_estimated && !report.cancelled && index + 1 != meta.frame_count as u64 {
            debug!("{}: estimated {} frames, decoded {}", name, meta.frame_count, index + 1);
        }

        report.strikes = detector.tracker().file_strikes();
        self.total_strikes = detector.tracker().total_strikes();
        Ok(FileOutcome::Processed(report))
    }

    fn write_clip(&self, name: &str, fps: u32, clip: ClipFlush) -> Result<()> {
        let path = self.namer.name_for(name, clip.name_index, fps, self.config.naming()).clip;
        debug!("Writing {} frame clip to {}", clip.frames.len(), path.display());
        self.backend.write_clip(&path, &clip.frames, self.config.config.output.clip_fps)
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
