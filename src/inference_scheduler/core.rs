use crate::config::SchedulerConfig;
use crate::result_store::interface::ScoringResult;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub enum State {
    Selecting,
    Starved { since: Instant },
    Scoring,
    Triggering,
    CoolingDown { since: Instant },
    Waiting { since: Instant },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    Completed { status: Option<i32> },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Tick { now: Instant, cadence: Duration },
    BufferStarved { now: Instant, buffered: usize },
    FrameMaterialized { path: PathBuf },
    ScoreDone { now: Instant, result: ScoringResult },
    TriggerDone { now: Instant, outcome: TriggerOutcome },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SelectFrame,
    Score { path: PathBuf },
    RecordResult(ScoringResult),
    CaptureContext,
    RunDownstreamAction,
}

pub fn init() -> (State, Vec<Effect>) {
    (State::Selecting, vec![Effect::SelectFrame])
}

pub fn transition(config: &SchedulerConfig, state: State, event: Event) -> (State, Vec<Effect>) {
    match (state, event) {
        (State::Selecting, Event::BufferStarved { now, .. }) => {
            (State::Starved { since: now }, vec![])
        }
        (State::Selecting, Event::FrameMaterialized { path }) => {
            (State::Scoring, vec![Effect::Score { path }])
        }

        (State::Scoring, Event::ScoreDone { now, result }) => {
            if result.score > config.detection_threshold {
                (
                    State::Triggering,
                    vec![
                        Effect::RecordResult(result),
                        Effect::CaptureContext,
                        Effect::RunDownstreamAction,
                    ],
                )
            } else {
                (
                    State::Waiting { since: now },
                    vec![Effect::RecordResult(result)],
                )
            }
        }

        (State::Triggering, Event::TriggerDone { now, .. }) => {
            (State::CoolingDown { since: now }, vec![])
        }

        (State::Starved { since }, Event::Tick { now, .. })
            if now.saturating_duration_since(since) >= config.starvation_backoff() =>
        {
            (State::Selecting, vec![Effect::SelectFrame])
        }
        (State::CoolingDown { since }, Event::Tick { now, .. })
            if now.saturating_duration_since(since) >= config.cooldown() =>
        {
            (State::Waiting { since: now }, vec![])
        }
        (State::Waiting { since }, Event::Tick { now, cadence })
            if now.saturating_duration_since(since) >= cadence =>
        {
            (State::Selecting, vec![Effect::SelectFrame])
        }

        (state, _) => (state, vec![]),
    }
}

/// How long the driver may sleep before the next tick can change `state`.
/// `None` for states that only advance on effect events.
pub fn time_until_due(
    config: &SchedulerConfig,
    state: &State,
    now: Instant,
    cadence: Duration,
) -> Option<Duration> {
    let (since, wait) = match state {
        State::Starved { since } => (*since, config.starvation_backoff()),
        State::CoolingDown { since } => (*since, config.cooldown()),
        State::Waiting { since } => (*since, cadence),
        State::Selecting | State::Scoring | State::Triggering => return None,
    };
    Some(wait.saturating_sub(now.saturating_duration_since(since)))
}
