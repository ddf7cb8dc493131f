use parking_lot::Mutex;

use daq_core::error::{EngineError, EngineResult};

/// The three camera states (spec §4.3). `Off` is the construction-time
/// default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraState {
    Off,
    Connected,
    Capturing,
}

impl CameraState {
    /// Fixed name map used for status reporting, grounded on the
    /// original's `stateName()` lookup table.
    pub fn name(self) -> &'static str {
        match self {
            CameraState::Off => "disconnected",
            CameraState::Connected => "connected",
            CameraState::Capturing => "capturing",
        }
    }
}

/// Commands accepted by [`StateMachine::execute`], mapped 1:1 to events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Connect,
    Disconnect,
    Capture,
    EndCapture,
}

impl Event {
    fn parse(command: &str) -> Option<Self> {
        match command {
            "connect" => Some(Event::Connect),
            "disconnect" => Some(Event::Disconnect),
            "capture" => Some(Event::Capture),
            "end_capture" => Some(Event::EndCapture),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Event::Connect => "connect",
            Event::Disconnect => "disconnect",
            Event::Capture => "capture",
            Event::EndCapture => "end_capture",
        }
    }
}

/// Controller-side hooks invoked by a transition before it commits. Each
/// hook returning `false` discards the event without mutating state
/// (spec §4.3: "Each transition calls the controller hook ... **before**
/// committing the state change. If the hook returns false, the event is
/// discarded and the state is unchanged").
pub trait TransitionHooks {
    fn connect(&mut self) -> bool;
    fn disconnect(&mut self) -> bool;
    fn start_capture(&mut self) -> bool;
    fn end_capture(&mut self) -> bool;
}

/// The camera connection/capture state machine. Transitions are
/// serialised under an internal mutex (spec §4.3: "Transitions execute
/// under a mutex, making the machine serialisable against concurrent
/// command arrivals on the control loop").
pub struct StateMachine {
    state: Mutex<CameraState>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self {
            state: Mutex::new(CameraState::Off),
        }
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CameraState {
        *self.state.lock()
    }

    /// Parse `command`, look up the legal transition for the current
    /// state, invoke its hook, and on success commit the new state.
    /// Returns the new state's name on success.
    pub fn execute(
        &self,
        command: &str,
        hooks: &mut dyn TransitionHooks,
    ) -> EngineResult<&'static str> {
        let event =
            Event::parse(command).ok_or_else(|| EngineError::UnknownCommand(command.to_string()))?;

        let mut state = self.state.lock();
        let (next, hook_ok): (CameraState, bool) = match (*state, event) {
            (CameraState::Off, Event::Connect) => (CameraState::Connected, hooks.connect()),
            (CameraState::Connected, Event::Disconnect) => {
                (CameraState::Off, hooks.disconnect())
            }
            (CameraState::Connected, Event::Capture) => {
                (CameraState::Capturing, hooks.start_capture())
            }
            (CameraState::Capturing, Event::EndCapture) => {
                (CameraState::Connected, hooks.end_capture())
            }
            (current, event) => {
                return Err(EngineError::IllegalTransition {
                    event: event.name().to_string(),
                    state: current.name().to_string(),
                })
            }
        };

        if !hook_ok {
            return Err(EngineError::CameraNotReady);
        }

        *state = next;
        Ok(next.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysOk;
    impl TransitionHooks for AlwaysOk {
        fn connect(&mut self) -> bool {
            true
        }
        fn disconnect(&mut self) -> bool {
            true
        }
        fn start_capture(&mut self) -> bool {
            true
        }
        fn end_capture(&mut self) -> bool {
            true
        }
    }

    struct AlwaysReject;
    impl TransitionHooks for AlwaysReject {
        fn connect(&mut self) -> bool {
            false
        }
        fn disconnect(&mut self) -> bool {
            false
        }
        fn start_capture(&mut self) -> bool {
            false
        }
        fn end_capture(&mut self) -> bool {
            false
        }
    }

    #[test]
    fn legal_path_through_all_three_states() {
        let sm = StateMachine::new();
        let mut hooks = AlwaysOk;
        assert_eq!(sm.state(), CameraState::Off);

        assert_eq!(sm.execute("connect", &mut hooks).unwrap(), "connected");
        assert_eq!(sm.execute("capture", &mut hooks).unwrap(), "capturing");
        assert_eq!(sm.execute("end_capture", &mut hooks).unwrap(), "connected");
        assert_eq!(sm.execute("disconnect", &mut hooks).unwrap(), "disconnected");
    }

    #[test]
    fn illegal_transition_reports_exact_message_and_does_not_mutate_state() {
        let sm = StateMachine::new();
        let mut hooks = AlwaysOk;

        let err = sm.execute("capture", &mut hooks).unwrap_err();
        assert_eq!(err.to_string(), "capture is not valid in disconnected state");
        assert_eq!(sm.state(), CameraState::Off);
    }

    #[test]
    fn unknown_command_is_rejected_before_any_state_inspection() {
        let sm = StateMachine::new();
        let mut hooks = AlwaysOk;
        assert!(matches!(
            sm.execute("reticulate_splines", &mut hooks),
            Err(EngineError::UnknownCommand(_))
        ));
        assert_eq!(sm.state(), CameraState::Off);
    }

    #[test]
    fn rejected_hook_discards_the_event_without_mutating_state() {
        let sm = StateMachine::new();
        let mut hooks = AlwaysReject;
        assert!(matches!(
            sm.execute("connect", &mut hooks),
            Err(EngineError::CameraNotReady)
        ));
        assert_eq!(sm.state(), CameraState::Off);
    }

    #[test]
    fn end_to_end_scenario_s1_fresh_controller_rejects_capture() {
        let sm = StateMachine::new();
        let mut hooks = AlwaysOk;
        let err = sm.execute("capture", &mut hooks).unwrap_err();
        assert_eq!(err.to_string(), "capture is not valid in disconnected state");
        assert_eq!(sm.state().name(), "disconnected");
    }

    #[test]
    fn end_to_end_scenario_s2_connect_then_capture() {
        let sm = StateMachine::new();
        let mut hooks = AlwaysOk;
        sm.execute("connect", &mut hooks).unwrap();
        assert_eq!(sm.state().name(), "connected");
        sm.execute("capture", &mut hooks).unwrap();
        assert_eq!(sm.state().name(), "capturing");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Independent re-derivation of the legal transition table, used as
    /// an oracle so the property test doesn't just re-check the
    /// implementation against itself.
    fn expected_next(state: CameraState, command: &str) -> Option<CameraState> {
        match (state, command) {
            (CameraState::Off, "connect") => Some(CameraState::Connected),
            (CameraState::Connected, "disconnect") => Some(CameraState::Off),
            (CameraState::Connected, "capture") => Some(CameraState::Capturing),
            (CameraState::Capturing, "end_capture") => Some(CameraState::Connected),
            _ => None,
        }
    }

    fn command_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("connect".to_string()),
            Just("disconnect".to_string()),
            Just("capture".to_string()),
            Just("end_capture".to_string()),
            Just("reticulate_splines".to_string()),
        ]
    }

    struct AlwaysOk;
    impl TransitionHooks for AlwaysOk {
        fn connect(&mut self) -> bool {
            true
        }
        fn disconnect(&mut self) -> bool {
            true
        }
        fn start_capture(&mut self) -> bool {
            true
        }
        fn end_capture(&mut self) -> bool {
            true
        }
    }

    proptest! {
        /// For any sequence of commands run against a fresh state
        /// machine, the state after each command is either the unique
        /// state the legal transition table names, or unchanged if the
        /// command was illegal (spec §8 property 1).
        #[test]
        fn observed_state_always_matches_the_legal_transition_table(
            commands in prop::collection::vec(command_strategy(), 0..20)
        ) {
            let sm = StateMachine::new();
            let mut hooks = AlwaysOk;
            let mut model = CameraState::Off;

            for command in commands {
                let before = sm.state();
                prop_assert_eq!(before, model);
                let result = sm.execute(&command, &mut hooks);
                match expected_next(model, &command) {
                    Some(next) => {
                        prop_assert_eq!(result.unwrap(), next.name());
                        model = next;
                    }
                    None => {
                        prop_assert!(result.is_err());
                        prop_assert_eq!(sm.state(), model);
                    }
                }
            }
        }
    }
}
