use crate::error::Error;
use crate::inference_scheduler::core::{init, time_until_due, transition, Event, State};
use crate::inference_scheduler::main::InferenceScheduler;
use crate::library::state_machine::StateMachine;
use std::time::Instant;

impl InferenceScheduler {
    /// Scores frames until shutdown is triggered or an effect fails.
    pub fn run(&self) -> Result<(), Error> {
        self.logger.info(&format!(
            "Starting with prediction_interval {} sec",
            self.cadence.seconds()
        ));

        let machine = StateMachine::new(
            init(),
            |state: State, event: Event| {
                let (new_state, effects) = transition(&self.config, state, event);
                self.logger.debug(&format!("-> {:?} {:?}", new_state, effects));
                (new_state, effects)
            },
            |effect| self.run_effect(effect),
        );

        let result = machine.run(|state| self.next_tick(state));

        match &result {
            Ok(_) => self.logger.info("Inference scheduler exited gracefully"),
            Err(err) => self
                .logger
                .error(&format!("Inference scheduler exited with error: {}", err)),
        }
        result.map(|_| ())
    }

    /// Sleeps on the shutdown flag for at most one tick, then re-reads the
    /// cadence so an update applies to the wait in progress.
    fn next_tick(&self, state: &State) -> Option<Event> {
        let cadence = self.cadence.as_duration();
        let wait = time_until_due(&self.config, state, Instant::now(), cadence)
            .unwrap_or_default()
            .min(self.config.tick());

        if self.shutdown.wait_timeout(wait) {
            return None;
        }
        Some(Event::Tick {
            now: Instant::now(),
            cadence: self.cadence.as_duration(),
        })
    }
}
