use std::collections::VecDeque;
use std::marker::PhantomData;

/// Drives a pure `transition` function on the calling thread.
///
/// Effects run one after another, in the order the transition produced them.
/// An effect may answer with an event, which is fed back before any external
/// event is requested. When nothing is pending, `next_event` is asked for the
/// next external event; returning `None` stops the machine.
pub struct StateMachine<TState, TEvent, TEffect, TError, T, E>
where
    T: Fn(TState, TEvent) -> (TState, Vec<TEffect>),
    E: FnMut(TEffect) -> Result<Option<TEvent>, TError>,
{
    pub init: (TState, Vec<TEffect>),
    pub transition_fn: T,
    pub run_effect_fn: E,
    _event: PhantomData<fn(TEvent) -> TError>,
}

impl<TState, TEvent, TEffect, TError, T, E> StateMachine<TState, TEvent, TEffect, TError, T, E>
where
    T: Fn(TState, TEvent) -> (TState, Vec<TEffect>),
    E: FnMut(TEffect) -> Result<Option<TEvent>, TError>,
{
    pub fn new(init: (TState, Vec<TEffect>), transition_fn: T, run_effect_fn: E) -> Self {
        Self {
            init,
            transition_fn,
            run_effect_fn,
            _event: PhantomData,
        }
    }

    pub fn run<N>(self, mut next_event: N) -> Result<TState, TError>
    where
        N: FnMut(&TState) -> Option<TEvent>,
    {
        let StateMachine {
            init: (mut state, effects),
            transition_fn,
            mut run_effect_fn,
            ..
        } = self;

        let mut effects: VecDeque<TEffect> = effects.into();
        let mut events: VecDeque<TEvent> = VecDeque::new();

        loop {
            while let Some(effect) = effects.pop_front() {
                if let Some(event) = run_effect_fn(effect)? {
                    events.push_back(event);
                }
            }

            let event = match events.pop_front() {
                Some(event) => event,
                None => match next_event(&state) {
                    Some(event) => event,
                    None => return Ok(state),
                },
            };

            let (new_state, new_effects) = transition_fn(state, event);
            state = new_state;
            effects.extend(new_effects);
        }
    }
}
