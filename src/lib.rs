//!
//! taxphmm: taxonomic classification of DNA sequences with profile HMMs
//!
//! A model is trained per taxonomic group from a multiple-sequence
//! alignment (`alignment`, `phmm::build`), queries are scored/decoded in
//! the log10 domain (`prob`, `phmm::viterbi`), and a gallery of models
//! classifies each query to its best-scoring group (`classify`).
//!
#[cfg_attr(test, macro_use)]
extern crate approx;

pub mod alignment;
pub mod classify;
pub mod common;
pub mod distribution;
pub mod phmm;
pub mod prelude;
pub mod prob;
