use crate::config::SchedulerConfig;
use crate::inference_scheduler::core::{
    init, time_until_due, transition, Effect, Event, State, TriggerOutcome,
};
use crate::result_store::interface::ScoringResult;
use chrono::Local;
use std::path::PathBuf;
use std::time::{Duration, Instant};

fn result(score: f32) -> ScoringResult {
    ScoringResult {
        timestamp: Local::now(),
        score,
        elapsed_ms: 10.0,
    }
}

fn tick(now: Instant, cadence: Duration) -> Event {
    Event::Tick { now, cadence }
}

#[test]
fn test_init_selects_immediately() {
    let (state, effects) = init();

    assert_eq!(state, State::Selecting);
    assert_eq!(effects, vec![Effect::SelectFrame]);
}

#[test]
fn test_materialized_frame_is_scored() {
    let config = SchedulerConfig::default();
    let path = PathBuf::from("/tmp/in.jpg");

    let (state, effects) = transition(
        &config,
        State::Selecting,
        Event::FrameMaterialized { path: path.clone() },
    );

    assert_eq!(state, State::Scoring);
    assert_eq!(effects, vec![Effect::Score { path }]);
}

#[test]
fn test_starvation_backs_off_then_retries_without_cadence_wait() {
    let config = SchedulerConfig::default();
    let t0 = Instant::now();
    let long_cadence = Duration::from_secs(3600);

    let (state, effects) = transition(
        &config,
        State::Selecting,
        Event::BufferStarved {
            now: t0,
            buffered: 2,
        },
    );
    assert_eq!(state, State::Starved { since: t0 });
    assert!(effects.is_empty());

    let (state, effects) = transition(&config, state, tick(t0 + Duration::from_secs(4), long_cadence));
    assert_eq!(state, State::Starved { since: t0 });
    assert!(effects.is_empty());

    let (state, effects) = transition(&config, state, tick(t0 + Duration::from_secs(5), long_cadence));
    assert_eq!(state, State::Selecting);
    assert_eq!(effects, vec![Effect::SelectFrame]);
}

#[test]
fn test_score_at_threshold_is_not_a_detection() {
    let config = SchedulerConfig::default();
    let now = Instant::now();
    let r = result(0.5);

    let (state, effects) = transition(
        &config,
        State::Scoring,
        Event::ScoreDone {
            now,
            result: r.clone(),
        },
    );

    assert_eq!(state, State::Waiting { since: now });
    assert_eq!(effects, vec![Effect::RecordResult(r)]);
}

#[test]
fn test_detection_records_captures_and_triggers_in_order() {
    let config = SchedulerConfig::default();
    let r = result(0.93);

    let (state, effects) = transition(
        &config,
        State::Scoring,
        Event::ScoreDone {
            now: Instant::now(),
            result: r.clone(),
        },
    );

    assert_eq!(state, State::Triggering);
    assert_eq!(
        effects,
        vec![
            Effect::RecordResult(r),
            Effect::CaptureContext,
            Effect::RunDownstreamAction
        ]
    );
}

#[test]
fn test_cooldown_suppresses_scoring() {
    let config = SchedulerConfig::default();
    let t0 = Instant::now();
    let zero_cadence = Duration::ZERO;

    let (state, _) = transition(
        &config,
        State::Triggering,
        Event::TriggerDone {
            now: t0,
            outcome: TriggerOutcome::Failed("spawn failed".into()),
        },
    );
    assert_eq!(state, State::CoolingDown { since: t0 });

    let mut state = state;
    for secs in [1, 30, 89] {
        let (next, effects) = transition(&config, state, tick(t0 + Duration::from_secs(secs), zero_cadence));
        assert!(matches!(next, State::CoolingDown { .. }));
        assert!(effects.is_empty());
        state = next;
    }

    let resumed_at = t0 + Duration::from_secs(90);
    let (state, effects) = transition(&config, state, tick(resumed_at, zero_cadence));
    assert_eq!(state, State::Waiting { since: resumed_at });
    assert!(effects.is_empty());
}

#[test]
fn test_waiting_uses_cadence_from_each_tick() {
    let config = SchedulerConfig::default();
    let t0 = Instant::now();
    let state = State::Waiting { since: t0 };

    let (state, effects) = transition(
        &config,
        state,
        tick(t0 + Duration::from_secs(2), Duration::from_secs(600)),
    );
    assert_eq!(state, State::Waiting { since: t0 });
    assert!(effects.is_empty());

    // cadence lowered while waiting
    let (state, effects) = transition(
        &config,
        state,
        tick(t0 + Duration::from_secs(3), Duration::from_secs(2)),
    );
    assert_eq!(state, State::Selecting);
    assert_eq!(effects, vec![Effect::SelectFrame]);
}

#[test]
fn test_unexpected_events_are_ignored() {
    let config = SchedulerConfig::default();

    let (state, effects) = transition(
        &config,
        State::Scoring,
        tick(Instant::now(), Duration::ZERO),
    );

    assert_eq!(state, State::Scoring);
    assert!(effects.is_empty());
}

#[test]
fn test_time_until_due() {
    let config = SchedulerConfig::default();
    let t0 = Instant::now();
    let later = t0 + Duration::from_secs(2);

    assert_eq!(
        time_until_due(&config, &State::Waiting { since: t0 }, later, Duration::from_secs(10)),
        Some(Duration::from_secs(8))
    );
    assert_eq!(
        time_until_due(&config, &State::Starved { since: t0 }, later, Duration::ZERO),
        Some(Duration::from_secs(3))
    );
    assert_eq!(
        time_until_due(&config, &State::CoolingDown { since: t0 }, t0 + Duration::from_secs(120), Duration::ZERO),
        Some(Duration::ZERO)
    );
    assert_eq!(time_until_due(&config, &State::Scoring, later, Duration::ZERO), None);
}
