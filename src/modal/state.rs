use std::collections::VecDeque;
use std::fmt;

const HISTORY_LIMIT: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModalState {
    #[default]
    Closed,
    /// Show animation running. Close requests are dropped.
    Opening,
    Open,
    Closing,
}

impl ModalState {
    /// The only state reachable from `self`.
    pub const fn next(self) -> Self {
        match self {
            Self::Closed => Self::Opening,
            Self::Opening => Self::Open,
            Self::Open => Self::Closing,
            Self::Closing => Self::Closed,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Open => "open",
            Self::Closing => "closing",
        }
    }
}

impl fmt::Display for ModalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid modal transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: ModalState,
    pub to: ModalState,
}

/// Strictly cyclic state holder with a bounded history of entered states.
#[derive(Debug, Clone)]
pub struct ModalMachine {
    state: ModalState,
    history: VecDeque<ModalState>,
}

impl Default for ModalMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ModalMachine {
    pub fn new() -> Self {
        Self {
            state: ModalState::Closed,
            history: VecDeque::from([ModalState::Closed]),
        }
    }

    pub const fn state(&self) -> ModalState {
        self.state
    }

    pub const fn is_transitioning(&self) -> bool {
        matches!(self.state, ModalState::Opening)
    }

    pub fn enter(&mut self, to: ModalState) -> Result<(), InvalidTransition> {
        if self.state.next() != to {
            return Err(InvalidTransition {
                from: self.state,
                to,
            });
        }

        self.state = to;
        self.history.push_back(to);
        if self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }
        Ok(())
    }

    pub fn history(&self) -> impl Iterator<Item = ModalState> + '_ {
        self.history.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_cycle() {
        let mut machine = ModalMachine::new();
        for state in [
            ModalState::Opening,
            ModalState::Open,
            ModalState::Closing,
            ModalState::Closed,
        ] {
            machine.enter(state).unwrap();
        }

        assert_eq!(
            machine.history().collect::<Vec<_>>(),
            vec![
                ModalState::Closed,
                ModalState::Opening,
                ModalState::Open,
                ModalState::Closing,
                ModalState::Closed,
            ]
        );
    }

    #[test]
    fn test_skipping_a_state_is_rejected() {
        let mut machine = ModalMachine::new();

        let error = machine.enter(ModalState::Open).unwrap_err();

        assert_eq!(error.from, ModalState::Closed);
        assert_eq!(machine.state(), ModalState::Closed);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut machine = ModalMachine::new();
        let mut state = machine.state();
        for _ in 0..100 {
            state = state.next();
            machine.enter(state).unwrap();
        }

        assert_eq!(machine.history().count(), HISTORY_LIMIT);
    }
}
