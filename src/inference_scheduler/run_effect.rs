use crate::error::Error;
use crate::inference_scheduler::core::{Effect, Event, TriggerOutcome};
use crate::inference_scheduler::main::InferenceScheduler;
use crate::result_store::interface::ScoringResult;
use chrono::Local;
use std::path::PathBuf;
use std::time::Instant;

impl InferenceScheduler {
    pub fn run_effect(&self, effect: Effect) -> Result<Option<Event>, Error> {
        match effect {
            Effect::SelectFrame => self.select_frame().map(Some),
            Effect::Score { path } => self.score(path).map(Some),
            Effect::RecordResult(result) => {
                self.record_result(&result)?;
                Ok(None)
            }
            Effect::CaptureContext => {
                self.capture_context();
                Ok(None)
            }
            Effect::RunDownstreamAction => Ok(Some(self.run_downstream_action())),
        }
    }

    fn select_frame(&self) -> Result<Event, Error> {
        let frame = match self.frame_buffer.select(self.config.frame_offset) {
            Ok(frame) => frame,
            Err(buffered) => {
                self.logger.warn(&format!(
                    "Only {} frames buffered, need {}. Retrying in {:?}",
                    buffered,
                    self.frame_buffer.min_len(),
                    self.config.starvation_backoff()
                ));
                return Ok(Event::BufferStarved {
                    now: Instant::now(),
                    buffered,
                });
            }
        };

        let path = self.config.input_file_path.clone();
        std::fs::write(&path, frame.as_bytes())?;
        Ok(Event::FrameMaterialized { path })
    }

    fn score(&self, path: PathBuf) -> Result<Event, Error> {
        let start = Instant::now();
        let score = self
            .image_classifier
            .score(&path)
            .map_err(Error::Classifier)?;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        self.logger
            .info(&format!("Prediction {:.5} in {:.1} ms", score, elapsed_ms));

        Ok(Event::ScoreDone {
            now: Instant::now(),
            result: ScoringResult {
                timestamp: Local::now(),
                score,
                elapsed_ms,
            },
        })
    }

    fn record_result(&self, result: &ScoringResult) -> Result<(), Error> {
        self.latency_stats.record(result.elapsed_ms);
        self.result_store.insert(result).map_err(Error::Store)
    }

    /// Snapshots the oldest `min_len` frames after scoring, so they are the
    /// frames buffered now rather than the ones the score was computed on.
    fn capture_context(&self) {
        let frames = self.frame_buffer.peek_context(self.frame_buffer.min_len());
        let mut written = 0;
        for (index, frame) in frames.iter().enumerate() {
            let path = self.config.context_file_path(index);
            match std::fs::write(&path, frame.as_bytes()) {
                Ok(()) => written += 1,
                Err(err) => self.logger.warn(&format!(
                    "Failed to write context frame {}: {}",
                    path.display(),
                    err
                )),
            }
        }
        self.logger.info(&format!(
            "Wrote {} context frames to {}",
            written,
            self.config.context_dir.display()
        ));
    }

    fn run_downstream_action(&self) -> Event {
        self.logger.info("Detection, running downstream action");

        let outcome = match self.downstream_action.run() {
            Ok(output) => {
                if !output.stdout.is_empty() {
                    self.logger
                        .info(&format!("Downstream stdout: {}", output.stdout.trim_end()));
                }
                if !output.stderr.is_empty() {
                    self.logger
                        .info(&format!("Downstream stderr: {}", output.stderr.trim_end()));
                }
                if !output.success() {
                    self.logger.warn(&format!(
                        "Downstream action exited with status {:?}",
                        output.status
                    ));
                }
                TriggerOutcome::Completed {
                    status: output.status,
                }
            }
            Err(err) => {
                self.logger
                    .warn(&format!("Downstream action failed: {}", err));
                TriggerOutcome::Failed(err.to_string())
            }
        };

        self.logger.info(&format!(
            "Cooling down for {:?}",
            self.config.cooldown()
        ));

        Event::TriggerDone {
            now: Instant::now(),
            outcome,
        }
    }
}
