//!
//! Construction parameters for ProfileModel
//!
use serde::{Deserialize, Serialize};

///
/// Rates used while wiring the state machine. All default to 0.01.
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    /// total pseudocount mass spread over symbols unseen in a match column
    pub pseudo_prob: f64,
    /// MATCH (or START) to INSERT
    pub p_match_to_insert: f64,
    /// INSERT self-loop
    pub p_insert_to_self: f64,
    /// mass taxed off a row to fund its soft-delete shortcut
    pub soft_delete_tax: f64,
}

impl ModelParams {
    pub fn new(
        pseudo_prob: f64,
        p_match_to_insert: f64,
        p_insert_to_self: f64,
        soft_delete_tax: f64,
    ) -> ModelParams {
        assert!(pseudo_prob > 0.0 && pseudo_prob < 1.0);
        assert!(p_match_to_insert > 0.0 && p_match_to_insert < 1.0);
        assert!(p_insert_to_self > 0.0 && p_insert_to_self < 1.0);
        assert!(soft_delete_tax > 0.0 && soft_delete_tax < 1.0);
        ModelParams {
            pseudo_prob,
            p_match_to_insert,
            p_insert_to_self,
            soft_delete_tax,
        }
    }
    /// one rate for everything
    pub fn uniform(rate: f64) -> ModelParams {
        ModelParams::new(rate, rate, rate, rate)
    }
}

impl Default for ModelParams {
    fn default() -> Self {
        ModelParams::uniform(0.01)
    }
}

impl std::fmt::Display for ModelParams {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "pseudo_prob: {}", self.pseudo_prob)?;
        writeln!(f, "p_match_to_insert: {}", self.p_match_to_insert)?;
        writeln!(f, "p_insert_to_self: {}", self.p_insert_to_self)?;
        writeln!(f, "soft_delete_tax: {}", self.soft_delete_tax)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p = ModelParams::default();
        assert_eq!(p.pseudo_prob, 0.01);
        assert_eq!(p.p_match_to_insert, 0.01);
        assert_eq!(p.p_insert_to_self, 0.01);
        assert_eq!(p.soft_delete_tax, 0.01);
        println!("{}", p);
    }
    #[test]
    #[should_panic]
    fn rejects_out_of_range() {
        ModelParams::uniform(1.0);
    }
    #[test]
    fn params_serialize() {
        let p = ModelParams::uniform(0.05);
        let json = serde_json::to_string(&p).unwrap();
        let q: ModelParams = serde_json::from_str(&json).unwrap();
        assert_eq!(p, q);
    }
}
