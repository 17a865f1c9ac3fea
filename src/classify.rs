//!
//! Taxonomic classification: score a query against a gallery of per-group
//! models and report the best-scoring group
//!
//! Scoring different models is embarrassingly parallel, so the gallery fans
//! out over rayon's thread pool. Queries a model cannot explain are skipped;
//! classification fails only when every model rejects the query.
//!
use crate::phmm::build::ProfileModel;
use crate::prob::LogOdds;
use log::{debug, info};
use rayon::prelude::*;
use std::sync::Mutex;

///
/// The winning group for one query.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    pub score: LogOdds,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}\t{}", self.label, self.score)
    }
}

///
/// A labeled collection of trained models, one per taxonomic group.
///
#[derive(Debug, Clone, Default)]
pub struct Gallery {
    entries: Vec<(String, ProfileModel)>,
}

impl Gallery {
    pub fn new() -> Gallery {
        Gallery {
            entries: Vec::new(),
        }
    }
    pub fn push(&mut self, label: String, model: ProfileModel) {
        self.entries.push((label, model));
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }
    pub fn model(&self, label: &str) -> Option<&ProfileModel> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, m)| m)
    }

    ///
    /// Score the query against every model in parallel and return the
    /// best-scoring label. `None` if the gallery is empty or no model
    /// admits the query.
    ///
    /// An update requires a strictly greater score, so on an exact tie
    /// serial mode keeps the earlier-pushed entry while parallel mode
    /// keeps whichever tied entry reported first.
    ///
    pub fn classify(&self, query: &[u8]) -> Option<Classification> {
        let best: Mutex<Option<Classification>> = Mutex::new(None);
        self.entries.par_iter().for_each(|(label, model)| {
            let score = match model.score(query) {
                Ok(score) => score,
                Err(err) => {
                    debug!("skipping model {}: {}", label, err);
                    return;
                }
            };
            let mut best = best.lock().unwrap();
            let improved = match best.as_ref() {
                Some(current) => score > current.score,
                None => true,
            };
            if improved {
                info!("new best {} score={}", label, score);
                *best = Some(Classification {
                    label: label.clone(),
                    score,
                });
            }
        });
        best.into_inner().unwrap()
    }

    ///
    /// `classify` on the calling thread. Same result, useful under an
    /// outer parallel layer or when profiling.
    ///
    pub fn classify_serial(&self, query: &[u8]) -> Option<Classification> {
        let mut best: Option<Classification> = None;
        for (label, model) in &self.entries {
            let score = match model.score(query) {
                Ok(score) => score,
                Err(err) => {
                    debug!("skipping model {}: {}", label, err);
                    continue;
                }
            };
            let improved = match best.as_ref() {
                Some(current) => score > current.score,
                None => true,
            };
            if improved {
                best = Some(Classification {
                    label: label.to_string(),
                    score,
                });
            }
        }
        best
    }

    ///
    /// Score the query against every model, labeled, best first. Models
    /// that reject the query are omitted.
    ///
    pub fn rank(&self, query: &[u8]) -> Vec<Classification> {
        let mut scores: Vec<Classification> = self
            .entries
            .par_iter()
            .filter_map(|(label, model)| match model.score(query) {
                Ok(score) => Some(Classification {
                    label: label.clone(),
                    score,
                }),
                Err(err) => {
                    debug!("skipping model {}: {}", label, err);
                    None
                }
            })
            .collect();
        scores.sort_by(|a, b| b.score.cmp(&a.score));
        scores
    }
}

//
// tests
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::Alignment;
    use crate::phmm::ProfileModel;

    fn gallery() -> Gallery {
        let mut gallery = Gallery::new();
        for (label, rows) in [
            ("alpha", ["AACGT", "AACGA"]),
            ("beta", ["CCGTA", "CCGTT"]),
            ("gamma", ["GGGGG", "GGGGG"]),
        ]
        .iter()
        {
            let al = Alignment::from_strs(rows).unwrap();
            gallery.push(label.to_string(), ProfileModel::from_alignment(&al).unwrap());
        }
        gallery
    }

    #[test]
    fn query_lands_on_its_own_group() {
        let gallery = gallery();
        assert_eq!(gallery.len(), 3);
        let hit = gallery.classify(b"AACGT").unwrap();
        assert_eq!(hit.label, "alpha");
        let hit = gallery.classify(b"CCGTT").unwrap();
        assert_eq!(hit.label, "beta");
        let hit = gallery.classify(b"GGGGG").unwrap();
        assert_eq!(hit.label, "gamma");
        println!("{}", hit);
    }
    #[test]
    fn parallel_and_serial_agree() {
        let gallery = gallery();
        for query in [b"AACGA", b"CCGTA", b"GGGGT"].iter() {
            let par = gallery.classify(*query).unwrap();
            let ser = gallery.classify_serial(*query).unwrap();
            assert_eq!(par, ser);
        }
    }
    #[test]
    fn empty_gallery_classifies_nothing() {
        let gallery = Gallery::new();
        assert!(gallery.is_empty());
        assert_eq!(gallery.classify(b"AACGT"), None);
    }
    #[test]
    fn too_short_query_is_skipped_everywhere() {
        let gallery = gallery();
        assert_eq!(gallery.classify(b"A"), None);
        assert_eq!(gallery.classify_serial(b"---"), None);
    }
    #[test]
    fn ranking_orders_all_groups() {
        let gallery = gallery();
        let ranked = gallery.rank(b"AACGT");
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].label, "alpha");
        for w in ranked.windows(2) {
            assert!(w[0].score >= w[1].score);
        }
    }
    #[test]
    fn labels_and_lookup() {
        let gallery = gallery();
        let labels: Vec<&str> = gallery.labels().collect();
        assert_eq!(labels, vec!["alpha", "beta", "gamma"]);
        assert!(gallery.model("beta").is_some());
        assert!(gallery.model("delta").is_none());
    }
}
