//!
//! Profile HMM: state machine synthesis from a training alignment and
//! log-domain Viterbi scoring/decoding of queries against it
//!
pub mod build;
pub mod mocks;
pub mod params;
pub mod state;
pub mod viterbi;

pub use build::{BuildError, ProfileModel};
pub use params::ModelParams;
pub use state::State;
pub use viterbi::{DecodeError, ViterbiResult};
