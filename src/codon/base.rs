use std::sync::Arc;

use crate::alphabet::Alphabet;
use crate::error::{Error, Result};
use crate::numeric::logsumexp;

/// A nucleotide alphabet, validated to have exactly four ordinary symbols.
///
/// Mirrors the distinction the original C library drew between a generic
/// `imm_abc` and a `nmm_base_abc` built on top of one: a [`BaseTable`] or
/// [`CodonTable`](crate::codon::CodonTable) only makes sense over a
/// 4-symbol alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseAbc(Arc<Alphabet>);

impl BaseAbc {
    pub fn create(abc: Arc<Alphabet>) -> Result<Self> {
        if abc.len() != 4 {
            return Err(Error::InvalidBaseAlphabet(abc.len()));
        }
        Ok(BaseAbc(abc))
    }

    pub fn alphabet(&self) -> &Arc<Alphabet> {
        &self.0
    }
}

/// Four log-probabilities, one per nucleotide, in the base alphabet's order.
///
/// Used by [`crate::state::FrameState`] as the marginal distribution over
/// an inserted (spurious) base. Its wildcard value is the marginal mass
/// `logsumexp(a, b, c, d)` — not stored separately, since "any base"
/// always has the full probability mass of a well-formed distribution.
#[derive(Debug, Clone)]
pub struct BaseTable {
    base: Arc<BaseAbc>,
    lprobs: [f64; 4],
}

impl BaseTable {
    pub fn create(base: Arc<BaseAbc>, a: f64, b: f64, c: f64, d: f64) -> Self {
        BaseTable {
            base,
            lprobs: [a, b, c, d],
        }
    }

    pub fn base_abc(&self) -> &Arc<BaseAbc> {
        &self.base
    }

    /// Log-probability of `nucleotide`. The wildcard maps to the
    /// logsumexp of all four concrete entries; a foreign byte is `-inf`.
    pub fn lprob(&self, nucleotide: u8) -> f64 {
        let abc = self.base.alphabet();
        if nucleotide == abc.any_symbol() {
            return logsumexp(self.lprobs);
        }
        match abc.symbol_idx(nucleotide) {
            Some(idx) if idx < 4 => self.lprobs[idx],
            _ => crate::numeric::LN_ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::presets;

    #[test]
    fn create_rejects_non_four_symbol_alphabets() {
        let amino = Arc::new(presets::amino_acids());
        let err = BaseAbc::create(amino).unwrap_err();
        assert_eq!(err, Error::InvalidBaseAlphabet(20));
    }

    #[test]
    fn lprob_of_wildcard_is_logsumexp_of_four() {
        let base = Arc::new(BaseAbc::create(Arc::new(presets::nucleotides())).unwrap());
        let table = BaseTable::create(base, 0.25_f64.ln(), 0.25_f64.ln(), 0.25_f64.ln(), 0.25_f64.ln());
        assert!((table.lprob(b'*') - 0.0).abs() < 1e-9);
    }

    #[test]
    fn lprob_of_foreign_byte_is_neg_infinity() {
        let base = Arc::new(BaseAbc::create(Arc::new(presets::nucleotides())).unwrap());
        let table = BaseTable::create(base, 0.0, 0.0, 0.0, 0.0);
        assert_eq!(table.lprob(b'X'), f64::NEG_INFINITY);
    }
}
