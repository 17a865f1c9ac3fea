//!
//! mock alignments and models for testing
//!
use crate::alignment::Alignment;
use crate::phmm::build::ProfileModel;

///
/// two near-identical ungapped rows; disagreement only in the last column
///
pub fn mock_pair_alignment() -> Alignment {
    Alignment::from_strs(&["AACGT", "AACGA"]).unwrap()
}

pub fn mock_pair_model() -> ProfileModel {
    ProfileModel::from_alignment(&mock_pair_alignment()).unwrap()
}

///
/// three rows with gap runs, so the model carries hard deletes
///
pub fn mock_gapped_alignment() -> Alignment {
    Alignment::from_strs(&["ACGTACGT", "ACG--CGT", "ACGTA-GT"]).unwrap()
}

pub fn mock_gapped_model() -> ProfileModel {
    ProfileModel::from_alignment(&mock_gapped_alignment()).unwrap()
}
