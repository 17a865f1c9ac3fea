//!
//! frequently used structs and functions
//!
pub use crate::alignment::{Alignment, AlignmentError};
pub use crate::classify::{Classification, Gallery};
pub use crate::common::{sequence_to_string, Sequence};
pub use crate::phmm::{BuildError, DecodeError, ModelParams, ProfileModel, State, ViterbiResult};
pub use crate::prob::{lo, LogOdds};
