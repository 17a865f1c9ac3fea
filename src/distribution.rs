//!
//! Discrete probability distributions keyed by arbitrary hashable keys
//!
//! * `Distribution<K>`: one distribution, with the smoothing/redistribution
//!   operations used during model construction.
//! * `JointTable<K, V>`: a distribution per major key. Transition tables
//!   (state -> state) and emission tables (state -> symbol) both use it.
//! * `LogOddsDistribution` / `LogOddsJointTable`: read-only log-odds views,
//!   derived once at model finalization and never mutated independently.
//!
use crate::prob::LogOdds;
use fnv::FnvHashMap as HashMap;
use fnv::FnvHashSet as HashSet;
use rand::Rng;
use std::hash::Hash;

/// A finalized distribution must sum to 1 within this tolerance.
pub const INTEGRITY_TOLERANCE: f64 = 1e-4;

///
/// A distribution whose values do not sum to ~1.
///
/// Construction-time occurrences signal a defect in construction logic,
/// not an expected runtime condition.
///
#[derive(Debug, Clone, PartialEq)]
pub struct IntegrityError {
    pub sum: f64,
}

impl std::fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "excessive delta: probabilities sum to {} but should be within {} of 1",
            self.sum, INTEGRITY_TOLERANCE
        )
    }
}

impl std::error::Error for IntegrityError {}

///
/// Mapping from keys to probabilities.
///
#[derive(Debug, Clone, Default)]
pub struct Distribution<K: Eq + Hash + Clone> {
    probs: HashMap<K, f64>,
}

impl<K: Eq + Hash + Clone> Distribution<K> {
    pub fn new() -> Self {
        Distribution {
            probs: HashMap::default(),
        }
    }
    ///
    /// Uniform distribution: all keys are equiprobable.
    ///
    pub fn uniform<I: IntoIterator<Item = K>>(keys: I) -> Self {
        let keys: Vec<K> = keys.into_iter().collect();
        assert!(!keys.is_empty(), "uniform distribution over no keys");
        let p = 1.0 / keys.len() as f64;
        let mut dist = Distribution::new();
        for k in keys {
            dist.put(k, p);
        }
        dist
    }
    ///
    /// Set (or overwrite) the probability of one key.
    ///
    pub fn put(&mut self, key: K, prob: f64) {
        self.probs.insert(key, prob);
    }
    pub fn get(&self, key: &K) -> Option<f64> {
        self.probs.get(key).copied()
    }
    pub fn contains_key(&self, key: &K) -> bool {
        self.probs.contains_key(key)
    }
    pub fn remove(&mut self, key: &K) -> Option<f64> {
        self.probs.remove(key)
    }
    pub fn len(&self) -> usize {
        self.probs.len()
    }
    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.probs.keys()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> {
        self.probs.iter().map(|(k, &p)| (k, p))
    }
    ///
    /// Sum of all stored probabilities.
    ///
    pub fn sum(&self) -> f64 {
        self.probs.values().sum()
    }
    ///
    /// Scale every value by `(1 - rate)`, freeing `rate` probability mass.
    /// E.g. at a tax rate of 0.1, a probability of 0.5 becomes 0.45.
    ///
    pub fn tax(&mut self, rate: f64) {
        for p in self.probs.values_mut() {
            *p *= 1.0 - rate;
        }
    }
    ///
    /// Spread the leftover mass uniformly over the given keys that are not
    /// yet present.
    ///
    pub fn assign_remaining_equally<I: IntoIterator<Item = K>>(&mut self, keys: I) {
        let missing: Vec<K> = keys
            .into_iter()
            .filter(|k| !self.probs.contains_key(k))
            .collect();
        if missing.is_empty() {
            return;
        }
        let remaining = (1.0 - self.sum()).max(0.0);
        let p = remaining / missing.len() as f64;
        for k in missing {
            self.put(k, p);
        }
    }
    ///
    /// Spread the leftover mass over the given (absent) keys in strictly
    /// decreasing weights: with n keys the weight ratios are n : n-1 : ... : 1,
    /// normalized by the arithmetic series n(n+1)/2. The first key gets the
    /// largest share.
    ///
    pub fn assign_remaining_linear_descent(&mut self, ordered_keys: &[K]) {
        let remaining = (1.0 - self.sum()).max(0.0);
        let n = ordered_keys.len();
        let denom = (n * (n + 1) / 2) as f64;
        let mut numer = n as f64;
        for k in ordered_keys {
            self.put(k.clone(), remaining * numer / denom);
            numer -= 1.0;
        }
    }
    ///
    /// Pseudocount smoothing: tax the existing entries by `total_mass`, then
    /// spread that mass uniformly over the keys of `all_keys` that are absent.
    /// No-op if no key is absent.
    ///
    pub fn set_pseudocounts(&mut self, all_keys: &[K], total_mass: f64) {
        let missing: Vec<&K> = all_keys
            .iter()
            .filter(|k| !self.probs.contains_key(k))
            .collect();
        if missing.is_empty() {
            return;
        }
        self.tax(total_mass);
        let p = total_mass / missing.len() as f64;
        for k in missing {
            self.put(k.clone(), p);
        }
    }
    ///
    /// Check the sum-to-one invariant.
    ///
    pub fn check_integrity(&self) -> Result<(), IntegrityError> {
        let sum = self.sum();
        if (1.0 - sum).abs() < INTEGRITY_TOLERANCE {
            Ok(())
        } else {
            Err(IntegrityError { sum })
        }
    }
    ///
    /// Walk keys in iteration order, subtracting probabilities from `draw`
    /// until one key's probability meets the remaining draw.
    ///
    /// Returns `None` only if the distribution is empty or `draw` exceeds
    /// the stored mass (possible for an unfinalized distribution).
    ///
    pub fn sample(&self, mut draw: f64) -> Option<&K> {
        for (k, &p) in self.probs.iter() {
            if p >= draw {
                return Some(k);
            }
            draw -= p;
        }
        None
    }
    ///
    /// `sample` with the draw taken from an injected rng, so callers that
    /// need reproducibility can pass a seeded generator.
    ///
    pub fn sample_with<R: Rng>(&self, rng: &mut R) -> Option<&K> {
        self.sample(rng.gen::<f64>())
    }
    ///
    /// Derive the read-only log-odds view.
    ///
    pub fn to_log_odds(&self) -> LogOddsDistribution<K> {
        LogOddsDistribution {
            probs: self
                .probs
                .iter()
                .map(|(k, &p)| (k.clone(), LogOdds::from_prob(p)))
                .collect(),
        }
    }
}

///
/// A distribution per major key.
///
#[derive(Debug, Clone, Default)]
pub struct JointTable<K: Eq + Hash + Clone, V: Eq + Hash + Clone> {
    rows: HashMap<K, Distribution<V>>,
}

impl<K: Eq + Hash + Clone, V: Eq + Hash + Clone> JointTable<K, V> {
    pub fn new() -> Self {
        JointTable {
            rows: HashMap::default(),
        }
    }
    ///
    /// Set (or overwrite) one entry, auto-creating the nested distribution.
    ///
    pub fn put(&mut self, major: K, minor: V, prob: f64) {
        self.rows
            .entry(major)
            .or_insert_with(Distribution::new)
            .put(minor, prob);
    }
    pub fn get(&self, major: &K, minor: &V) -> Option<f64> {
        self.rows.get(major).and_then(|d| d.get(minor))
    }
    pub fn contains(&self, major: &K, minor: &V) -> bool {
        self.get(major, minor).is_some()
    }
    pub fn contains_major(&self, major: &K) -> bool {
        self.rows.contains_key(major)
    }
    ///
    /// Create an empty nested distribution if the major key is absent.
    ///
    pub fn ensure_major(&mut self, major: K) {
        self.rows.entry(major).or_insert_with(Distribution::new);
    }
    ///
    /// Remove one entry without deleting the major key.
    ///
    pub fn unmap(&mut self, major: &K, minor: &V) {
        if let Some(row) = self.rows.get_mut(major) {
            row.remove(minor);
        }
    }
    pub fn remove_major(&mut self, major: &K) -> Option<Distribution<V>> {
        self.rows.remove(major)
    }
    pub fn row(&self, major: &K) -> Option<&Distribution<V>> {
        self.rows.get(major)
    }
    pub fn row_mut(&mut self, major: &K) -> Option<&mut Distribution<V>> {
        self.rows.get_mut(major)
    }
    pub fn majors(&self) -> impl Iterator<Item = &K> {
        self.rows.keys()
    }
    pub fn n_majors(&self) -> usize {
        self.rows.len()
    }
    ///
    /// Union of minor keys across all major keys.
    ///
    pub fn all_minor_keys(&self) -> HashSet<V> {
        let mut set = HashSet::default();
        for row in self.rows.values() {
            for k in row.keys() {
                set.insert(k.clone());
            }
        }
        set
    }
    ///
    /// Aggregate integrity check over every nested distribution.
    ///
    pub fn check_integrity(&self) -> Result<(), IntegrityError> {
        for row in self.rows.values() {
            row.check_integrity()?;
        }
        Ok(())
    }
    ///
    /// Derive the read-only log-odds view.
    ///
    pub fn to_log_odds(&self) -> LogOddsJointTable<K, V> {
        LogOddsJointTable {
            rows: self
                .rows
                .iter()
                .map(|(k, d)| (k.clone(), d.to_log_odds()))
                .collect(),
        }
    }
}

///
/// Log-odds mirror of a `Distribution`. Derived, read-only.
///
#[derive(Debug, Clone)]
pub struct LogOddsDistribution<K: Eq + Hash + Clone> {
    probs: HashMap<K, LogOdds>,
}

impl<K: Eq + Hash + Clone> LogOddsDistribution<K> {
    pub fn get(&self, key: &K) -> Option<LogOdds> {
        self.probs.get(key).copied()
    }
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.probs.keys()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&K, LogOdds)> {
        self.probs.iter().map(|(k, &p)| (k, p))
    }
    pub fn len(&self) -> usize {
        self.probs.len()
    }
    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }
}

///
/// Log-odds mirror of a `JointTable`. Derived, read-only.
///
#[derive(Debug, Clone)]
pub struct LogOddsJointTable<K: Eq + Hash + Clone, V: Eq + Hash + Clone> {
    rows: HashMap<K, LogOddsDistribution<V>>,
}

impl<K: Eq + Hash + Clone, V: Eq + Hash + Clone> LogOddsJointTable<K, V> {
    pub fn get(&self, major: &K, minor: &V) -> Option<LogOdds> {
        self.rows.get(major).and_then(|d| d.get(minor))
    }
    pub fn row(&self, major: &K) -> Option<&LogOddsDistribution<V>> {
        self.rows.get(major)
    }
    pub fn majors(&self) -> impl Iterator<Item = &K> {
        self.rows.keys()
    }
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;
    use test_case::test_case;

    #[test]
    fn uniform_is_normalized() {
        let d = Distribution::uniform(vec!["a", "b", "c", "d"]);
        assert_abs_diff_eq!(d.get(&"a").unwrap(), 0.25);
        assert!(d.check_integrity().is_ok());
    }
    #[test]
    fn tax_frees_mass() {
        let mut d = Distribution::new();
        d.put('x', 0.5);
        d.put('y', 0.5);
        d.tax(0.1);
        assert_abs_diff_eq!(d.get(&'x').unwrap(), 0.45);
        assert_abs_diff_eq!(d.sum(), 0.9);
    }
    #[test]
    fn remaining_equally() {
        let mut d = Distribution::new();
        d.put(b'A', 0.5);
        d.assign_remaining_equally(vec![b'A', b'C', b'G', b'T']);
        assert_abs_diff_eq!(d.get(&b'C').unwrap(), 0.5 / 3.0);
        assert!(d.check_integrity().is_ok());

        // empty distribution becomes uniform
        let mut d: Distribution<u8> = Distribution::new();
        d.assign_remaining_equally(vec![b'A', b'C', b'G', b'T']);
        assert_abs_diff_eq!(d.get(&b'G').unwrap(), 0.25);
        assert!(d.check_integrity().is_ok());
    }
    #[test]
    fn linear_descent_favors_near_keys() {
        let mut d: Distribution<usize> = Distribution::new();
        let keys: Vec<usize> = (0..5).collect();
        d.assign_remaining_linear_descent(&keys);
        // ratios 5:4:3:2:1 over denominator 15
        assert_abs_diff_eq!(d.get(&0).unwrap(), 5.0 / 15.0);
        assert_abs_diff_eq!(d.get(&4).unwrap(), 1.0 / 15.0);
        for w in keys.windows(2) {
            assert!(d.get(&w[0]).unwrap() > d.get(&w[1]).unwrap());
        }
        assert!(d.check_integrity().is_ok());
    }
    #[test]
    fn linear_descent_single_key_takes_all() {
        let mut d: Distribution<&str> = Distribution::new();
        d.assign_remaining_linear_descent(&["stop"]);
        assert_abs_diff_eq!(d.get(&"stop").unwrap(), 1.0);
    }
    #[test_case(&[b'A'] ; "one observed symbol")]
    #[test_case(&[b'A', b'C'] ; "two observed symbols")]
    #[test_case(&[b'A', b'C', b'G'] ; "three observed symbols")]
    fn pseudocounts_keep_integrity(observed: &[u8]) {
        let mut d = Distribution::new();
        let p = 1.0 / observed.len() as f64;
        for &s in observed {
            d.put(s, p);
        }
        d.set_pseudocounts(&[b'A', b'C', b'G', b'T'], 0.01);
        assert!(d.check_integrity().is_ok());
        let n_missing = 4 - observed.len();
        for &s in &[b'A', b'C', b'G', b'T'] {
            let got = d.get(&s).unwrap();
            if observed.contains(&s) {
                assert_abs_diff_eq!(got, p * 0.99, epsilon = 1e-12);
            } else {
                assert_abs_diff_eq!(got, 0.01 / n_missing as f64, epsilon = 1e-12);
            }
        }
    }
    #[test]
    fn pseudocounts_noop_when_nothing_missing() {
        let mut d = Distribution::uniform(vec![b'A', b'C', b'G', b'T']);
        let before: Vec<f64> = [b'A', b'C', b'G', b'T']
            .iter()
            .map(|s| d.get(s).unwrap())
            .collect();
        d.set_pseudocounts(&[b'A', b'C', b'G', b'T'], 0.01);
        for (s, b) in [b'A', b'C', b'G', b'T'].iter().zip(before) {
            assert_eq!(d.get(s).unwrap(), b);
        }
        assert!(d.check_integrity().is_ok());
    }
    #[test]
    fn integrity_violation_reported() {
        let mut d = Distribution::new();
        d.put("x", 0.5);
        let err = d.check_integrity().unwrap_err();
        println!("{}", err);
        assert_abs_diff_eq!(err.sum, 0.5);
    }
    #[test]
    fn sampling_walk() {
        let mut d = Distribution::new();
        d.put("only", 1.0);
        assert_eq!(d.sample(0.0), Some(&"only"));
        assert_eq!(d.sample(0.999), Some(&"only"));

        let empty: Distribution<&str> = Distribution::new();
        assert_eq!(empty.sample(0.5), None);

        // seeded rng draws are reproducible
        let d = Distribution::uniform(vec![b'A', b'C', b'G', b'T']);
        let mut rng1 = Xoshiro256PlusPlus::seed_from_u64(7);
        let mut rng2 = Xoshiro256PlusPlus::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(d.sample_with(&mut rng1), d.sample_with(&mut rng2));
        }
    }
    #[test]
    fn joint_table_ops() {
        let mut t: JointTable<&str, u8> = JointTable::new();
        t.put("m0", b'A', 0.7);
        t.put("m0", b'C', 0.3);
        t.put("m1", b'G', 1.0);
        assert_eq!(t.get(&"m0", &b'A'), Some(0.7));
        assert!(t.contains(&"m1", &b'G'));
        assert!(!t.contains(&"m1", &b'A'));
        assert!(t.check_integrity().is_ok());

        let minors = t.all_minor_keys();
        assert_eq!(minors.len(), 3);
        assert!(minors.contains(&b'A') && minors.contains(&b'G'));

        // unmap removes the entry but keeps the major key
        t.unmap(&"m1", &b'G');
        assert!(!t.contains(&"m1", &b'G'));
        assert!(t.contains_major(&"m1"));

        t.ensure_major("m2");
        assert!(t.contains_major(&"m2"));
        assert!(t.row(&"m2").unwrap().is_empty());

        // deep copy is independent
        let copy = t.clone();
        t.put("m0", b'A', 0.0);
        assert_eq!(copy.get(&"m0", &b'A'), Some(0.7));
    }
    #[test]
    fn joint_integrity_aggregates() {
        let mut t: JointTable<&str, &str> = JointTable::new();
        t.put("good", "x", 1.0);
        t.put("bad", "y", 0.5);
        assert!(t.check_integrity().is_err());
    }
    #[test]
    fn log_odds_views() {
        let mut d = Distribution::new();
        d.put("half", 0.5);
        d.put("none", 0.0);
        let l = d.to_log_odds();
        assert_abs_diff_eq!(
            l.get(&"half").unwrap().to_log10().unwrap(),
            (0.5f64).log10()
        );
        assert!(l.get(&"none").unwrap().is_zero());
        assert_eq!(l.get(&"absent"), None);

        let mut t: JointTable<&str, &str> = JointTable::new();
        t.put("m", "a", 0.25);
        let lt = t.to_log_odds();
        assert_abs_diff_eq!(
            lt.get(&"m", &"a").unwrap().to_log10().unwrap(),
            (0.25f64).log10()
        );
        assert_eq!(lt.get(&"m", &"b"), None);
        assert_eq!(lt.get(&"q", &"a"), None);
    }
}
