use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Listening,
    Draining,
    Stopped,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransitionError {
    #[error("invalid transition: {0:?} -> {1:?}")]
    InvalidTransition(State, State),
}

pub struct StateMachine {
    pub state: State,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self { state: State::Idle }
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_transition(&self, to: &State) -> bool {
        matches!(
            (&self.state, to),
            (State::Idle, State::Listening)
                | (State::Listening, State::Draining)
                // 인터럽트 없이 리스너가 스스로 종료된 경우
                | (State::Listening, State::Stopped)
                | (State::Draining, State::Stopped)
        )
    }

    pub fn transition(&mut self, to: State) -> Result<(), TransitionError> {
        if self.can_transition(&to) {
            tracing::info!("Server state transition: {:?} -> {:?}", self.state, to);
            self.state = to;
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition(self.state, to))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_transitions() {
        let mut sm = StateMachine::new();
        assert_eq!(sm.state, State::Idle);
        assert!(sm.transition(State::Listening).is_ok());
        assert!(sm.transition(State::Draining).is_ok());
        assert!(sm.transition(State::Stopped).is_ok());
    }

    #[test]
    fn invalid_transition() {
        let mut sm = StateMachine::new();
        // cannot drain a server that never listened
        let res = sm.transition(State::Draining);
        assert_eq!(res, Err(TransitionError::InvalidTransition(State::Idle, State::Draining)));
        assert_eq!(sm.state, State::Idle);
    }

    #[test]
    fn stopped_is_terminal() {
        let mut sm = StateMachine::new();
        sm.transition(State::Listening).unwrap();
        sm.transition(State::Stopped).unwrap();
        assert!(sm.transition(State::Listening).is_err());
        assert!(sm.transition(State::Draining).is_err());
    }
}
