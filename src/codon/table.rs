use std::sync::Arc;

use crate::alphabet::Alphabet;
use crate::error::{Error, Result};
use crate::numeric::{logsumexp, LN_ZERO};

/// An ordered triplet of base-alphabet symbols (nucleotides or the
/// wildcard), per `spec.md` §3 "Codon".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Codon {
    pub a: u8,
    pub b: u8,
    pub c: u8,
}

impl Codon {
    pub fn new(a: u8, b: u8, c: u8) -> Self {
        Codon { a, b, c }
    }

    pub fn triplet(&self) -> (u8, u8, u8) {
        (self.a, self.b, self.c)
    }
}

/// A user-built joint distribution over the `|base|^3` *concrete*
/// (non-wildcard) codons, normalisable before being frozen into a
/// [`CodonTable`].
#[derive(Debug, Clone)]
pub struct CodonLprob {
    base: Arc<Alphabet>,
    lprobs: Vec<f64>,
}

impl CodonLprob {
    pub fn create(base: Arc<Alphabet>) -> Self {
        let l = base.len();
        CodonLprob {
            base,
            lprobs: vec![LN_ZERO; l * l * l],
        }
    }

    pub fn base_alphabet(&self) -> &Arc<Alphabet> {
        &self.base
    }

    fn concrete_index(&self, codon: Codon) -> Option<usize> {
        let l = self.base.len();
        let idx = |s: u8| self.base.symbol_idx(s).filter(|&i| i < l);
        let (a, b, c) = (idx(codon.a)?, idx(codon.b)?, idx(codon.c)?);
        Some(a * l * l + b * l + c)
    }

    /// The first of `codon.a`/`codon.b`/`codon.c` that isn't a concrete
    /// (non-wildcard) member of the base alphabet, for error reporting.
    fn first_invalid_byte(&self, codon: Codon) -> u8 {
        let l = self.base.len();
        let valid = |s: u8| self.base.symbol_idx(s).is_some_and(|i| i < l);
        [codon.a, codon.b, codon.c]
            .into_iter()
            .find(|&s| !valid(s))
            .unwrap_or(codon.a)
    }

    /// Sets the log-probability of a concrete (non-wildcard) codon.
    pub fn set(&mut self, codon: Codon, lprob: f64) -> Result<()> {
        let idx = self
            .concrete_index(codon)
            .ok_or_else(|| Error::SymbolNotInAlphabet(self.first_invalid_byte(codon)))?;
        self.lprobs[idx] = lprob;
        Ok(())
    }

    /// Log-probability of a concrete codon, or `-inf` if `codon` contains a
    /// wildcard or a foreign byte.
    pub fn get(&self, codon: Codon) -> f64 {
        self.concrete_index(codon)
            .map(|idx| self.lprobs[idx])
            .unwrap_or(LN_ZERO)
    }

    /// Subtracts `logsumexp` of all `|base|^3` entries from each entry.
    pub fn normalize(&mut self) -> Result<()> {
        let z = logsumexp(self.lprobs.iter().copied());
        if z == LN_ZERO {
            return Err(Error::EmptyDistribution);
        }
        for v in self.lprobs.iter_mut() {
            *v -= z;
        }
        Ok(())
    }
}

/// A dense, pre-computed lookup over every triplet in `(base ∪ {any})^3`,
/// built once from a [`CodonLprob`] (`spec.md` §3, §4.1, §8 scenario 4).
///
/// Wildcard entries are the logsumexp of the concrete entries they
/// marginalise over, composably across positions: `c[(*, y, z)] =
/// logsumexp_x c[(x, y, z)]`, and likewise when more than one position is
/// a wildcard.
#[derive(Debug, Clone)]
pub struct CodonTable {
    base: Arc<Alphabet>,
    lprobs: Vec<f64>,
}

impl CodonTable {
    pub fn build(codon_lprob: &CodonLprob) -> Self {
        let base = codon_lprob.base.clone();
        let l = base.len();
        let dim = l + 1;
        let mut lprobs = vec![LN_ZERO; dim * dim * dim];

        let axis_range = |idx: usize| -> std::ops::Range<usize> {
            if idx == l {
                0..l
            } else {
                idx..idx + 1
            }
        };

        for i in 0..dim {
            for j in 0..dim {
                for k in 0..dim {
                    let mut vals = Vec::new();
                    for a in axis_range(i) {
                        for b in axis_range(j) {
                            for c in axis_range(k) {
                                vals.push(codon_lprob.lprobs[a * l * l + b * l + c]);
                            }
                        }
                    }
                    lprobs[i * dim * dim + j * dim + k] = logsumexp(vals);
                }
            }
        }

        CodonTable { base, lprobs }
    }

    pub fn base_alphabet(&self) -> &Arc<Alphabet> {
        &self.base
    }

    /// Log-probability of `codon` (wildcard components included), or
    /// `-inf` if any byte is foreign to the base alphabet.
    pub fn lprob(&self, codon: Codon) -> f64 {
        let dim = self.base.len() + 1;
        let idx = |s: u8| self.base.symbol_idx(s);
        match (idx(codon.a), idx(codon.b), idx(codon.c)) {
            (Some(i), Some(j), Some(k)) => self.lprobs[i * dim * dim + j * dim + k],
            _ => LN_ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::presets;

    fn uniform_table() -> (Arc<Alphabet>, CodonTable) {
        let base = Arc::new(presets::nucleotides());
        let mut codon_lprob = CodonLprob::create(base.clone());
        let syms = base.symbols().to_vec();
        for &x in &syms {
            for &y in &syms {
                for &z in &syms {
                    codon_lprob.set(Codon::new(x, y, z), -(64_f64.ln())).unwrap();
                }
            }
        }
        (base, CodonTable::build(&codon_lprob))
    }

    #[test]
    fn concrete_entry_is_preserved() {
        let (_base, table) = uniform_table();
        let lp = table.lprob(Codon::new(b'A', b'C', b'G'));
        assert!((lp - (-64_f64.ln())).abs() < 1e-9);
    }

    #[test]
    fn full_wildcard_sums_to_one() {
        let (_base, table) = uniform_table();
        let lp = table.lprob(Codon::new(b'*', b'*', b'*'));
        assert!(lp.abs() < 1e-9);
    }

    #[test]
    fn single_wildcard_marginalises_one_axis() {
        let base = Arc::new(presets::nucleotides());
        let mut codon_lprob = CodonLprob::create(base.clone());
        for &y in base.symbols() {
            for &z in base.symbols() {
                codon_lprob.set(Codon::new(b'A', y, z), 0.25_f64.ln()).unwrap();
            }
        }
        // leaves all other first-position entries at -inf (already default)
        let table = CodonTable::build(&codon_lprob);
        for &y in base.symbols() {
            for &z in base.symbols() {
                let lp = table.lprob(Codon::new(b'*', y, z));
                assert!((lp - 0.25_f64.ln()).abs() < 1e-9, "y={y} z={z} lp={lp}");
            }
        }
        let lp_all = table.lprob(Codon::new(b'*', b'*', b'*'));
        assert!(lp_all.abs() < 1e-9);
    }

    #[test]
    fn foreign_byte_is_neg_infinity() {
        let (_base, table) = uniform_table();
        assert_eq!(table.lprob(Codon::new(b'X', b'A', b'C')), LN_ZERO);
    }

    #[test]
    fn normalize_rejects_all_zero_mass() {
        let base = Arc::new(presets::nucleotides());
        let mut codon_lprob = CodonLprob::create(base);
        let err = codon_lprob.normalize().unwrap_err();
        assert_eq!(err, Error::EmptyDistribution);
    }

    #[test]
    fn set_blames_the_actual_invalid_position_not_always_the_first() {
        let base = Arc::new(presets::nucleotides());
        let mut codon_lprob = CodonLprob::create(base);

        let err = codon_lprob.set(Codon::new(b'A', b'*', b'C'), 0.0).unwrap_err();
        assert_eq!(err, Error::SymbolNotInAlphabet(b'*'));

        let err = codon_lprob.set(Codon::new(b'A', b'C', b'X'), 0.0).unwrap_err();
        assert_eq!(err, Error::SymbolNotInAlphabet(b'X'));

        let err = codon_lprob.set(Codon::new(b'X', b'C', b'G'), 0.0).unwrap_err();
        assert_eq!(err, Error::SymbolNotInAlphabet(b'X'));
    }

    #[test]
    fn get_of_codon_with_non_first_wildcard_is_neg_infinity() {
        let (_base, table) = uniform_table();
        assert_eq!(table.lprob(Codon::new(b'A', b'X', b'C')), LN_ZERO);
    }
}
