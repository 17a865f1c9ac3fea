//!
//! ProfileModel construction from a training alignment
//!
//! One MATCH state per alignment column, trained by frequency counting; one
//! INSERT state per column boundary with a uniform emission; DELETE states
//! wired from the observed gap runs (hard) or as low-probability shortcuts
//! (soft), then eliminated by edge composition so the finalized machine
//! holds emitting states only. START is folded into the initial
//! distribution last. Log-odds mirrors are derived once, at the end.
//!
use crate::alignment::Alignment;
use crate::common::{Sequence, GAP, VALID_BASES};
use crate::distribution::{
    Distribution, IntegrityError, JointTable, LogOddsDistribution, LogOddsJointTable,
};
use crate::phmm::params::ModelParams;
use crate::phmm::state::State;
use fnv::FnvHashSet as HashSet;
use log::debug;
use rand::Rng;

///
/// Model construction failure. Integrity violations signal a defect in
/// construction logic, not an expected runtime condition.
///
#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
    /// the alignment has zero rows
    EmptyAlignment,
    /// a row failed the sum-to-one check during finalization
    Integrity(IntegrityError),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            BuildError::EmptyAlignment => write!(f, "cannot train a model on zero sequences"),
            BuildError::Integrity(err) => write!(f, "model integrity violated: {}", err),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Integrity(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IntegrityError> for BuildError {
    fn from(err: IntegrityError) -> Self {
        BuildError::Integrity(err)
    }
}

///
/// A finalized profile HMM. Immutable once built; the log-odds tables are a
/// derived view computed exactly once, never mutated independently of their
/// linear-probability source.
///
#[derive(Debug, Clone)]
pub struct ProfileModel {
    pub param: ModelParams,
    n_training_rows: usize,
    n_cols: usize,
    /// columns whose DELETE state was forced by observed gap runs
    hard_delete_cols: Vec<usize>,
    init: Distribution<State>,
    trans: JointTable<State, State>,
    emit: JointTable<State, u8>,
    log_init: LogOddsDistribution<State>,
    log_trans: LogOddsJointTable<State, State>,
    log_emit: LogOddsJointTable<State, u8>,
}

impl ProfileModel {
    ///
    /// Build a model from an alignment with the default rates.
    ///
    pub fn from_alignment(alignment: &Alignment) -> Result<ProfileModel, BuildError> {
        ProfileModel::from_alignment_with(alignment, ModelParams::default())
    }

    ///
    /// Build a model from an alignment. Fails iff the alignment has zero
    /// rows; any row-sum violation on the way out is an internal defect
    /// surfaced as `BuildError::Integrity`.
    ///
    pub fn from_alignment_with(
        alignment: &Alignment,
        param: ModelParams,
    ) -> Result<ProfileModel, BuildError> {
        if alignment.n_rows() == 0 {
            return Err(BuildError::EmptyAlignment);
        }
        let n_rows = alignment.n_rows();
        let n_cols = alignment.n_cols();
        debug!("building model from {} rows x {} cols", n_rows, n_cols);

        // Emission distributions for MATCH states: per-column symbol
        // frequencies, gap-blind, then pseudocount smoothing. A fully
        // gapped column has no training signal and falls back to uniform.
        let mut emit: JointTable<State, u8> = JointTable::new();
        for col in 0..n_cols {
            let match_state = State::Match(col);
            let mut counts = alignment.column_counts(col);
            counts.remove(&GAP);
            let total: usize = counts.values().sum();
            emit.ensure_major(match_state);
            if total == 0 {
                emit.row_mut(&match_state)
                    .unwrap()
                    .assign_remaining_equally(VALID_BASES.iter().copied());
            } else {
                for (symbol, count) in counts {
                    emit.put(match_state, symbol, count as f64 / total as f64);
                }
            }
            let row = emit.row_mut(&match_state).unwrap();
            row.set_pseudocounts(&VALID_BASES, param.pseudo_prob);
            row.check_integrity()?;
        }

        // Skeleton transitions plus hard DELETE states, per column boundary.
        // Boundary b sits before column b; b = 0 and b = n_cols are the
        // virtual boundaries outside the alignment.
        let mut trans: JointTable<State, State> = JointTable::new();
        let gap_runs = alignment.gap_runs_by_start_col();
        let mut hard_delete_cols = Vec::new();
        for boundary in 0..=n_cols {
            let from = if boundary == 0 {
                State::Start
            } else {
                State::Match(boundary - 1)
            };
            let to = if boundary == n_cols {
                State::Stop
            } else {
                State::Match(boundary)
            };

            // The from state is always followed by an INSERT state, which
            // emits uniformly (no training signal).
            let insert = State::Insert(boundary);
            trans.put(from, insert, param.p_match_to_insert);
            trans.put(insert, insert, param.p_insert_to_self);
            trans.put(insert, to, 1.0 - param.p_insert_to_self);
            emit.ensure_major(insert);
            emit.row_mut(&insert)
                .unwrap()
                .assign_remaining_equally(VALID_BASES.iter().copied());

            // Default from->to mass, reduced below if a hard DELETE claims
            // part of it.
            trans.put(from, to, 1.0 - param.p_match_to_insert);

            if boundary == n_cols {
                continue;
            }
            let runs = &gap_runs[boundary];
            if runs.is_empty() {
                continue;
            }
            // A DELETE state is hard if any gap run opens at this boundary.
            let delete = State::Delete(boundary);
            hard_delete_cols.push(boundary);
            let old_from_to = trans.get(&from, &to).unwrap();
            // when every row opens a run of a distinct length the raw ratio
            // reaches 1.0; the incoming mass is capped by the direct edge
            // it is deducted from, which then drops to zero
            let p_to_delete = (runs.len() as f64 / n_rows as f64).min(old_from_to);
            trans.put(from, delete, p_to_delete);
            trans.put(from, to, old_from_to - p_to_delete);
            debug_assert!(trans.row(&from).unwrap().check_integrity().is_ok());
            // Outgoing mass proportional to the run-length histogram: a run
            // of length k lands k columns ahead, or at STOP past the end.
            let total_opens: usize = runs.values().sum();
            for (&run_len, &count) in runs {
                debug_assert!(run_len > 0);
                let dest_col = boundary + run_len;
                let dest = if dest_col < n_cols {
                    State::Match(dest_col)
                } else {
                    State::Stop
                };
                trans.put(delete, dest, count as f64 / total_opens as f64);
            }
        }

        // Soft DELETE states above every column that has no hard one:
        // a low-probability shortcut around the column, funded by taxing
        // the preceding row, routed by linear descent so nearer MATCH
        // states are favored.
        for col in 0..n_cols {
            let delete = State::Delete(col);
            if trans.contains_major(&delete) {
                continue;
            }
            let prev = if col == 0 {
                State::Start
            } else {
                State::Match(col - 1)
            };
            let prev_row = trans.row_mut(&prev).unwrap();
            prev_row.tax(param.soft_delete_tax);
            prev_row.put(delete, param.soft_delete_tax);

            let mut dests: Vec<State> = (col + 1..n_cols).map(State::Match).collect();
            dests.push(State::Stop);
            let mut from_delete = Distribution::new();
            from_delete.assign_remaining_linear_descent(&dests);
            from_delete.check_integrity()?;
            for (&dest, p) in from_delete.iter() {
                trans.put(delete, dest, p);
            }
        }

        // DELETE states do not emit, which would complicate the decoder.
        // Each source has at most one DELETE successor; replace every
        // src -> D -> dest two-hop with a direct src -> dest edge carrying
        // the product probability, then drop the unreachable DELETE rows.
        let majors: Vec<State> = trans.majors().copied().collect();
        for src in majors {
            let delete_dests: Vec<State> = trans
                .row(&src)
                .unwrap()
                .keys()
                .filter(|s| s.is_delete())
                .copied()
                .collect();
            if delete_dests.is_empty() {
                continue;
            }
            debug_assert!(src.is_match() || src.is_start());
            debug_assert_eq!(delete_dests.len(), 1);
            let middle = delete_dests[0];
            let p_src_to_delete = trans.get(&src, &middle).unwrap();
            let bypasses: Vec<(State, f64)> = trans
                .row(&middle)
                .unwrap()
                .iter()
                .map(|(&dest, p)| (dest, p_src_to_delete * p))
                .collect();
            for (dest, p) in bypasses {
                debug_assert!(dest.is_match() || dest.is_stop());
                trans.put(src, dest, p);
            }
            trans.unmap(&src, &middle);
            trans.row(&src).unwrap().check_integrity()?;
        }
        let delete_rows: Vec<State> = trans.majors().filter(|s| s.is_delete()).copied().collect();
        for d in &delete_rows {
            trans.remove_major(d);
        }

        // Fold START: its outgoing row becomes the initial distribution.
        let init = trans
            .remove_major(&State::Start)
            .expect("START row exists until folding");

        init.check_integrity()?;
        trans.check_integrity()?;
        emit.check_integrity()?;
        debug_assert!(trans.majors().all(|s| !s.is_delete() && !s.is_start()));
        debug_assert!(trans
            .all_minor_keys()
            .iter()
            .all(|s| !s.is_delete() && !s.is_start()));
        debug_assert!(!init.contains_key(&State::Start));
        debug_assert!(emit.majors().all(|s| s.is_match() || s.is_insert()));

        // Derived log-odds mirrors, in case the decoder needs them (it
        // always does). Computed once; the model is immutable afterwards.
        let log_init = init.to_log_odds();
        let log_trans = trans.to_log_odds();
        let log_emit = emit.to_log_odds();

        debug!(
            "finished construction: {} hard deletes eliminated over {} boundaries",
            hard_delete_cols.len(),
            n_cols + 1
        );
        Ok(ProfileModel {
            param,
            n_training_rows: n_rows,
            n_cols,
            hard_delete_cols,
            init,
            trans,
            emit,
            log_init,
            log_trans,
            log_emit,
        })
    }

    pub fn n_training_rows(&self) -> usize {
        self.n_training_rows
    }
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }
    ///
    /// Columns whose DELETE state was forced by training gaps. The states
    /// themselves are gone from the finalized tables.
    ///
    pub fn hard_delete_cols(&self) -> &[usize] {
        &self.hard_delete_cols
    }
    pub fn init(&self) -> &Distribution<State> {
        &self.init
    }
    pub fn trans(&self) -> &JointTable<State, State> {
        &self.trans
    }
    pub fn emit(&self) -> &JointTable<State, u8> {
        &self.emit
    }
    pub fn log_init(&self) -> &LogOddsDistribution<State> {
        &self.log_init
    }
    pub fn log_trans(&self) -> &LogOddsJointTable<State, State> {
        &self.log_trans
    }
    pub fn log_emit(&self) -> &LogOddsJointTable<State, u8> {
        &self.log_emit
    }
    ///
    /// Every state referenced anywhere in the finalized tables, sorted.
    ///
    pub fn states(&self) -> Vec<State> {
        let mut set: HashSet<State> = HashSet::default();
        set.extend(self.init.keys().copied());
        set.extend(self.trans.majors().copied());
        set.extend(self.trans.all_minor_keys());
        set.extend(self.emit.majors().copied());
        let mut states: Vec<State> = set.into_iter().collect();
        states.sort();
        states
    }
    pub fn n_match_states(&self) -> usize {
        self.emit.majors().filter(|s| s.is_match()).count()
    }
    pub fn n_insert_states(&self) -> usize {
        self.emit.majors().filter(|s| s.is_insert()).count()
    }

    ///
    /// Generate one sequence from the model by walking the state machine to
    /// STOP, emitting a symbol per state. The rng is injected so callers
    /// can seed it; `max_len` caps runaway INSERT self-loops.
    ///
    /// This is the only randomized operation on a model. Decoding never
    /// consults an rng.
    ///
    pub fn sample<R: Rng>(&self, rng: &mut R, max_len: usize) -> (Sequence, Vec<State>) {
        let mut seq = Sequence::new();
        let mut path = Vec::new();
        let mut state = match self.init.sample_with(rng) {
            Some(&s) => s,
            None => return (seq, path),
        };
        while !state.is_stop() && seq.len() < max_len {
            path.push(state);
            if let Some(&symbol) = self.emit.row(&state).and_then(|row| row.sample_with(rng)) {
                seq.push(symbol);
            }
            state = match self.trans.row(&state).and_then(|row| row.sample_with(rng)) {
                Some(&s) => s,
                None => break,
            };
        }
        if state.is_stop() {
            path.push(State::Stop);
        }
        (seq, path)
    }
}

impl std::fmt::Display for ProfileModel {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ProfileModel: {} match + {} insert states, trained on {} rows x {} cols",
            self.n_match_states(),
            self.n_insert_states(),
            self.n_training_rows,
            self.n_cols
        )
    }
}

//
// tests
//
