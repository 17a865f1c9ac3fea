//!
//! Hidden states of the profile HMM
//!
//! One MATCH and one INSERT state per alignment column boundary. DELETE
//! states exist only while the model is under construction; finalization
//! eliminates them. START is folded into the initial distribution.
//!

///
/// A state identifier: role tag plus column index.
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum State {
    Start,
    /// emits the consensus of one alignment column
    Match(usize),
    /// emits extra symbols between columns; uniform emission
    Insert(usize),
    /// skips columns; transient, construction-only
    Delete(usize),
    Stop,
}

impl State {
    pub fn is_start(&self) -> bool {
        matches!(self, State::Start)
    }
    pub fn is_match(&self) -> bool {
        matches!(self, State::Match(_))
    }
    pub fn is_insert(&self) -> bool {
        matches!(self, State::Insert(_))
    }
    pub fn is_delete(&self) -> bool {
        matches!(self, State::Delete(_))
    }
    pub fn is_stop(&self) -> bool {
        matches!(self, State::Stop)
    }
    ///
    /// Column index for the column-bound roles.
    ///
    pub fn col(&self) -> Option<usize> {
        match self {
            State::Match(c) | State::Insert(c) | State::Delete(c) => Some(*c),
            _ => None,
        }
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            State::Start => write!(f, "START"),
            State::Match(c) => write!(f, "M_{}", c),
            State::Insert(c) => write!(f, "I_{}", c),
            State::Delete(c) => write!(f, "D_{}", c),
            State::Stop => write!(f, "STOP"),
        }
    }
}
