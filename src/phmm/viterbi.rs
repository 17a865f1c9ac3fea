//!
//! Log-domain Viterbi scoring and decoding against a ProfileModel
//!
//! One DP stage per observed symbol. A stage maps each reachable state to a
//! cell of per-predecessor scores; the cell caches its best predecessor so
//! traceback is a chain of lookups. Score-only evaluation drops stages as it
//! goes and runs in constant memory over the query length.
//!
use crate::common::{strip_gaps, Sequence};
use crate::phmm::build::ProfileModel;
use crate::phmm::state::State;
use crate::prob::LogOdds;
use fnv::FnvHashMap as HashMap;
use log::trace;

///
/// Decoding failure for one query. Expected at runtime (short reads, queries
/// foreign to the model); callers skip or log, they do not abort.
///
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// fewer than two usable symbols after gap stripping
    TooShort { n_symbols: usize },
    /// no state path reaches STOP with nonzero probability
    NoPath,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DecodeError::TooShort { n_symbols } => {
                write!(f, "query holds {} usable symbols, need at least 2", n_symbols)
            }
            DecodeError::NoPath => write!(f, "no path through the model reaches STOP"),
        }
    }
}

impl std::error::Error for DecodeError {}

///
/// Outcome of a successful decode: the joint log10 probability of the best
/// path, and the path itself when it was retained. The path holds one state
/// per observed symbol plus the final STOP.
///
#[derive(Debug, Clone, PartialEq)]
pub struct ViterbiResult {
    pub score: LogOdds,
    pub path: Option<Vec<State>>,
}

impl std::fmt::Display for ViterbiResult {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "score={}", self.score)?;
        if let Some(path) = &self.path {
            write!(f, " path=")?;
            for (i, state) in path.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{}", state)?;
            }
        }
        Ok(())
    }
}

///
/// One DP cell: candidate scores keyed by predecessor state (`None` marks
/// entry via the initial distribution), plus the cached argmax.
///
#[derive(Debug, Clone)]
struct DpCell {
    scores: HashMap<Option<State>, LogOdds>,
    best_prev: Option<State>,
    best: LogOdds,
}

impl DpCell {
    fn new() -> DpCell {
        DpCell {
            scores: HashMap::default(),
            best_prev: None,
            best: LogOdds::zero(),
        }
    }
    /// record a candidate, keeping the argmax cached
    fn put(&mut self, prev: Option<State>, score: LogOdds) {
        if score > self.best {
            self.best = score;
            self.best_prev = prev;
        }
        self.scores.insert(prev, score);
    }
    fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// all reachable states after consuming a prefix of the query
type DpStage = HashMap<State, DpCell>;

impl ProfileModel {
    ///
    /// Joint log10 probability of the best path explaining the query.
    /// Constant memory over the query length.
    ///
    pub fn score(&self, query: &[u8]) -> Result<LogOdds, DecodeError> {
        Ok(self.viterbi(query, false)?.score)
    }
    ///
    /// Best path and its score. Retains all DP stages for traceback.
    ///
    pub fn decode(&self, query: &[u8]) -> Result<ViterbiResult, DecodeError> {
        self.viterbi(query, true)
    }

    fn viterbi(&self, query: &[u8], retain_path: bool) -> Result<ViterbiResult, DecodeError> {
        let obs: Sequence = strip_gaps(query);
        if obs.len() < 2 {
            return Err(DecodeError::TooShort {
                n_symbols: obs.len(),
            });
        }

        // stage 0: states reachable from the initial distribution
        let mut stage = DpStage::default();
        for (&state, p_init) in self.log_init().iter() {
            let p_emit = match self.log_emit().get(&state, &obs[0]) {
                Some(p) if !p.is_zero() => p,
                _ => continue,
            };
            if p_init.is_zero() {
                continue;
            }
            let mut cell = DpCell::new();
            cell.put(None, p_init * p_emit);
            stage.insert(state, cell);
        }
        trace!("stage 0: {} reachable states", stage.len());

        let mut stages: Vec<DpStage> = Vec::new();
        for &symbol in &obs[1..] {
            let next = self.next_viterbi_stage(&stage, symbol);
            if retain_path {
                stages.push(std::mem::replace(&mut stage, next));
            } else {
                stage = next;
            }
            if stage.is_empty() {
                return Err(DecodeError::NoPath);
            }
        }

        // termination: best final state with a transition into STOP
        let mut best_final: Option<State> = None;
        let mut best_score = LogOdds::zero();
        for (&state, cell) in stage.iter() {
            let p_stop = match self.log_trans().get(&state, &State::Stop) {
                Some(p) if !p.is_zero() => p,
                _ => continue,
            };
            let score = cell.best * p_stop;
            if score > best_score {
                best_score = score;
                best_final = Some(state);
            }
        }
        let best_final = best_final.ok_or(DecodeError::NoPath)?;

        let path = if retain_path {
            let mut rev_path = vec![State::Stop, best_final];
            let mut prev = stage[&best_final].best_prev;
            for old_stage in stages.iter().rev() {
                let state = match prev {
                    Some(s) => s,
                    None => break,
                };
                rev_path.push(state);
                prev = old_stage[&state].best_prev;
            }
            rev_path.reverse();
            Some(rev_path)
        } else {
            None
        };
        Ok(ViterbiResult {
            score: best_score,
            path,
        })
    }

    ///
    /// Extend every path in `stage` by one observed symbol. A state enters
    /// the next stage iff it emits the symbol with nonzero probability and
    /// some predecessor reaches it over a nonzero transition.
    ///
    fn next_viterbi_stage(&self, stage: &DpStage, symbol: u8) -> DpStage {
        let mut next = DpStage::default();
        for &state in self.log_emit().majors() {
            let p_emit = match self.log_emit().get(&state, &symbol) {
                Some(p) if !p.is_zero() => p,
                _ => continue,
            };
            let mut cell = DpCell::new();
            for (&prev, prev_cell) in stage.iter() {
                let p_trans = match self.log_trans().get(&prev, &state) {
                    Some(p) if !p.is_zero() => p,
                    _ => continue,
                };
                cell.put(Some(prev), prev_cell.best * p_trans * p_emit);
            }
            if !cell.is_empty() {
                next.insert(state, cell);
            }
        }
        next
    }
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phmm::mocks::{mock_gapped_model, mock_pair_model};

    #[test]
    fn training_rows_round_trip() {
        // a training row decodes to the all-match path through its columns
        let model = mock_pair_model();
        let result = model.decode(b"AACGT").unwrap();
        assert!(!result.score.is_zero());
        println!("{}", result);
        let path = result.path.unwrap();
        assert_eq!(path.len(), 6);
        assert_eq!(
            path,
            vec![
                State::Match(0),
                State::Match(1),
                State::Match(2),
                State::Match(3),
                State::Match(4),
                State::Stop,
            ]
        );
    }
    #[test]
    fn score_matches_decode() {
        let model = mock_pair_model();
        let decoded = model.decode(b"AACGA").unwrap();
        let scored = model.score(b"AACGA").unwrap();
        assert_eq!(decoded.score, scored);
    }
    #[test]
    fn score_is_path_product() {
        // the reported score reproduces the product of the path's own
        // init/transition/emission terms
        let model = mock_pair_model();
        let query = b"AACGT";
        let result = model.decode(query).unwrap();
        let path = result.path.unwrap();
        let mut expected = model.log_init().get(&path[0]).unwrap()
            * model.log_emit().get(&path[0], &query[0]).unwrap();
        for i in 1..query.len() {
            expected = expected
                * model.log_trans().get(&path[i - 1], &path[i]).unwrap()
                * model.log_emit().get(&path[i], &query[i]).unwrap();
        }
        expected = expected * model.log_trans().get(&path[4], &State::Stop).unwrap();
        assert_abs_diff_eq!(
            result.score.to_log10().unwrap(),
            expected.to_log10().unwrap(),
            epsilon = 1e-10
        );
    }
    #[test]
    fn decoding_is_deterministic() {
        let model = mock_gapped_model();
        let a = model.decode(b"ACGTACGT").unwrap();
        let b = model.decode(b"ACGTACGT").unwrap();
        assert_eq!(a, b);
    }
    #[test]
    fn mutations_degrade_the_score() {
        let model = mock_pair_model();
        let exact = model.score(b"AACGT").unwrap();
        let one_off = model.score(b"AACGG").unwrap();
        let two_off = model.score(b"AAGGG").unwrap();
        assert!(exact > one_off);
        assert!(one_off > two_off);
    }
    #[test]
    fn gaps_are_stripped_before_decoding() {
        let model = mock_pair_model();
        let plain = model.decode(b"AACGT").unwrap();
        let gapped = model.decode(b"AA-CG-T").unwrap();
        assert_eq!(plain, gapped);
    }
    #[test]
    fn short_queries_are_rejected() {
        let model = mock_pair_model();
        assert_eq!(
            model.score(b"A").unwrap_err(),
            DecodeError::TooShort { n_symbols: 1 }
        );
        // gap-only input strips down to nothing
        assert_eq!(
            model.score(b"--A--").unwrap_err(),
            DecodeError::TooShort { n_symbols: 1 }
        );
    }
    #[test]
    fn overlong_foreign_query_still_scores() {
        // insert self-loops absorb extra symbols; the score is poor but
        // finite because every emission carries pseudocount mass
        let model = mock_pair_model();
        let result = model.decode(b"AACGTTTTTT").unwrap();
        assert!(!result.score.is_zero());
        let path = result.path.unwrap();
        assert_eq!(path.len(), 11);
        assert!(path.iter().any(|s| s.is_insert()));
    }
    #[test]
    fn deletion_takes_the_shortcut() {
        // gapped training rows leave a strong skip edge; a query missing
        // the skipped columns should still align column-correctly
        let model = mock_gapped_model();
        let full = model.score(b"ACGTACGT").unwrap();
        let skipped = model.score(b"ACGCGT").unwrap();
        assert!(!skipped.is_zero());
        assert!(full > skipped);
    }
}
