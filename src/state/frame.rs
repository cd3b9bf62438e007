//! The frame-shift-aware codon emitter (`spec.md` §4.5).
//!
//! A gene's codons are not always observed intact: sequencing indels can
//! drop a codon position or splice in a spurious base. `FrameState` marginalises
//! over every such hypothesis, for every observed run length in `1..=5`,
//! given a single indel rate `eps`.
//!
//! The per-length formula is the one enumeration principle applied at every
//! length: pick which of the codon's 3 positions survive (probability
//! `1 - eps` each) versus are deleted (`eps` each), then interleave the
//! survivors — in their original order — with however many spurious
//! insertions (`eps` each, drawn from the base marginal) are needed to reach
//! the observed length. Hypotheses that can't reproduce the observed bytes
//! (a surviving position whose base doesn't match, short of a wildcard) drop
//! out; what remains is summed in log-space.

use std::sync::Arc;

use crate::codon::{BaseTable, Codon, CodonTable};
use crate::error::{Error, Result};
use crate::numeric::{logsumexp, log_mul, LN_ZERO};
use crate::sequence::Subsequence;
use crate::state::Emission;

/// Emits an observed run of `1..=5` bases standing in for one intended
/// codon, under a single indel rate `eps`.
#[derive(Debug, Clone)]
pub struct FrameState {
    name: String,
    base_table: Arc<BaseTable>,
    codon_table: Arc<CodonTable>,
    eps: f64,
    /// `ln(1 - eps)`: the per-position survival log-probability.
    lsurvive: f64,
    /// `ln(eps)`: the per-event indel (deletion or insertion) log-probability.
    lindel: f64,
}

impl FrameState {
    /// `eps` is the per-position probability of an indel event and must lie
    /// in `[0, 0.5)` — at `0.5` a position is as likely to be lost as kept,
    /// which degenerates the length marginal.
    pub fn create(
        name: impl Into<String>,
        base_table: Arc<BaseTable>,
        codon_table: Arc<CodonTable>,
        eps: f64,
    ) -> Result<Self> {
        if !(eps >= 0.0 && eps < 0.5) {
            return Err(Error::InvalidEpsilon(eps));
        }
        Ok(FrameState {
            name: name.into(),
            base_table,
            codon_table,
            eps,
            lsurvive: (1.0 - eps).ln(),
            lindel: eps.ln(),
        })
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    pub fn base_table(&self) -> &Arc<BaseTable> {
        &self.base_table
    }

    pub fn codon_table(&self) -> &Arc<CodonTable> {
        &self.codon_table
    }

    /// Every concrete codon the base alphabet can form (no wildcards: the
    /// intended codon is always a definite hypothesis).
    fn concrete_codons(&self) -> impl Iterator<Item = Codon> + '_ {
        let abc = self.codon_table.base_alphabet();
        let symbols = abc.symbols();
        symbols.iter().flat_map(move |&a| {
            symbols.iter().flat_map(move |&b| symbols.iter().map(move |&c| Codon::new(a, b, c)))
        })
    }

    /// `L_n(sigma | codon)`: log-likelihood of observing `sigma` (length
    /// `1..=5`) given that `codon` was the intended, possibly-corrupted,
    /// emission.
    fn length_loglik(&self, codon: Codon, sigma: &[u8]) -> f64 {
        let n = sigma.len();
        let positions = [codon.a, codon.b, codon.c];
        let any = self.codon_table.base_alphabet().any_symbol();
        let mut terms = Vec::new();

        for mask in 0u8..8 {
            let deleted = [mask & 1 != 0, mask & 2 != 0, mask & 4 != 0];
            let d = deleted.iter().filter(|&&x| x).count();
            let survivors: Vec<usize> = (0..3).filter(|&p| !deleted[p]).collect();
            let k = survivors.len();
            if n < k {
                continue;
            }
            let i = n - k;

            for insert_mask in 0u32..(1u32 << n) {
                if insert_mask.count_ones() as usize != i {
                    continue;
                }
                let mut term = (k as f64) * self.lsurvive + ((d + i) as f64) * self.lindel;
                let mut survivor_idx = 0;
                let mut feasible = true;
                for pos in 0..n {
                    let observed = sigma[pos];
                    if insert_mask & (1 << pos) != 0 {
                        term = log_mul(term, self.base_table.lprob(observed));
                    } else {
                        let intended = positions[survivors[survivor_idx]];
                        survivor_idx += 1;
                        if observed == any {
                            term = log_mul(term, self.base_table.lprob(observed));
                        } else if observed != intended {
                            feasible = false;
                            break;
                        }
                    }
                }
                if feasible {
                    terms.push(term);
                }
            }
        }

        logsumexp(terms)
    }

    /// Joint log-probability `P(codon, sigma)`, i.e. the codon's prior
    /// combined with `L_n(sigma | codon)`.
    fn ljoint(&self, codon: Codon, sigma: &[u8]) -> f64 {
        log_mul(self.codon_table.lprob(codon), self.length_loglik(codon, sigma))
    }

    /// `log P(codon | sigma)`. `-inf` if `sigma`'s length lies outside
    /// `[1, 5]`, matching `Emission::lprob`'s domain restriction.
    pub fn lposterior(&self, codon: Codon, subseq: Subsequence<'_>) -> f64 {
        if !(1..=5).contains(&subseq.len()) {
            return LN_ZERO;
        }
        let sigma = subseq.as_bytes();
        let joint = self.ljoint(codon, sigma);
        if joint == LN_ZERO {
            return LN_ZERO;
        }
        joint - self.lprob(subseq)
    }

    /// The MAP codon and its joint log-probability. Ties break on the
    /// lexicographically-earliest triplet under the base alphabet's order.
    /// `-inf` if `subseq`'s length lies outside `[1, 5]`, matching
    /// `Emission::lprob`'s domain restriction.
    pub fn decode(&self, subseq: Subsequence<'_>) -> (Codon, f64) {
        if !(1..=5).contains(&subseq.len()) {
            return (Codon::new(0, 0, 0), LN_ZERO);
        }
        let sigma = subseq.as_bytes();
        let mut best_codon = Codon::new(0, 0, 0);
        let mut best_lp = LN_ZERO;
        let mut first = true;
        for codon in self.concrete_codons() {
            let lp = self.ljoint(codon, sigma);
            if first || lp > best_lp {
                best_codon = codon;
                best_lp = lp;
                first = false;
            }
        }
        (best_codon, best_lp)
    }
}

impl Emission for FrameState {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_seq(&self) -> usize {
        1
    }

    fn max_seq(&self) -> usize {
        5
    }

    /// `logsumexp` of the joint over every concrete codon hypothesis.
    fn lprob(&self, subseq: Subsequence<'_>) -> f64 {
        let len = subseq.len();
        if len < 1 || len > 5 {
            return LN_ZERO;
        }
        let sigma = subseq.as_bytes();
        logsumexp(self.concrete_codons().map(|codon| self.ljoint(codon, sigma)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::presets;
    use crate::codon::{BaseAbc, CodonLprob};
    use crate::sequence::Sequence;

    fn uniform_frame(eps: f64) -> (Arc<crate::alphabet::Alphabet>, FrameState) {
        let abc = Arc::new(presets::nucleotides());
        let base_abc = Arc::new(BaseAbc::create(abc.clone()).unwrap());
        let base_table = Arc::new(BaseTable::create(
            base_abc,
            0.25_f64.ln(),
            0.25_f64.ln(),
            0.25_f64.ln(),
            0.25_f64.ln(),
        ));

        let mut codon_lprob = CodonLprob::create(abc.clone());
        let syms = abc.symbols().to_vec();
        for &x in &syms {
            for &y in &syms {
                for &z in &syms {
                    codon_lprob.set(Codon::new(x, y, z), -(64_f64.ln())).unwrap();
                }
            }
        }
        let codon_table = Arc::new(CodonTable::build(&codon_lprob));

        let state = FrameState::create("F", base_table, codon_table, eps).unwrap();
        (abc, state)
    }

    #[test]
    fn create_rejects_out_of_range_epsilon() {
        let abc = Arc::new(presets::nucleotides());
        let base_abc = Arc::new(BaseAbc::create(abc.clone()).unwrap());
        let base_table = Arc::new(BaseTable::create(base_abc, 0.0, 0.0, 0.0, 0.0));
        let codon_table = Arc::new(CodonTable::build(&CodonLprob::create(abc)));
        assert_eq!(
            FrameState::create("F", base_table, codon_table, 0.5).unwrap_err(),
            Error::InvalidEpsilon(0.5)
        );
    }

    #[test]
    fn near_zero_epsilon_concentrates_on_exact_length_three_match() {
        let (abc, state) = uniform_frame(1e-12);
        let seq = Sequence::new(abc, b"ACG".to_vec()).unwrap();
        let lp = state.lprob(seq.as_subseq());
        assert!((lp - (-(64_f64.ln()))).abs() < 1e-6, "lp={lp}");
    }

    #[test]
    fn near_zero_epsilon_suppresses_non_length_three_runs() {
        let (abc, state) = uniform_frame(1e-12);
        let seq = Sequence::new(abc, b"AC".to_vec()).unwrap();
        let lp = state.lprob(seq.as_subseq());
        assert!(lp < -20.0, "lp={lp}");
    }

    #[test]
    fn lprob_is_out_of_bounds_outside_one_to_five() {
        let (abc, state) = uniform_frame(0.01);
        let seq = Sequence::new(abc, Vec::new()).unwrap();
        assert_eq!(state.lprob(seq.as_subseq()), LN_ZERO);
    }

    #[test]
    fn decode_recovers_exact_codon_when_epsilon_tiny() {
        let (abc, state) = uniform_frame(1e-12);
        let seq = Sequence::new(abc, b"ACG".to_vec()).unwrap();
        let (codon, lp) = state.decode(seq.as_subseq());
        assert_eq!(codon.triplet(), (b'A', b'C', b'G'));
        assert!(lp.is_finite());
    }

    #[test]
    fn posterior_of_matching_codon_dominates_when_epsilon_tiny() {
        let (abc, state) = uniform_frame(1e-12);
        let seq = Sequence::new(abc, b"ACG".to_vec()).unwrap();
        let lpost = state.lposterior(Codon::new(b'A', b'C', b'G'), seq.as_subseq());
        assert!((lpost - 0.0).abs() < 1e-6, "lpost={lpost}");
    }

    #[test]
    fn posteriors_over_every_codon_sum_to_one() {
        let (abc, state) = uniform_frame(0.02);
        let seq = Sequence::new(abc, b"ACGA".to_vec()).unwrap();
        let total = logsumexp(
            state
                .concrete_codons()
                .map(|codon| state.lposterior(codon, seq.as_subseq())),
        );
        assert!((total - 0.0).abs() < 1e-6, "total={total}");
    }

    #[test]
    fn lposterior_is_out_of_bounds_outside_one_to_five() {
        let (abc, state) = uniform_frame(0.01);
        let seq = Sequence::new(abc, Vec::new()).unwrap();
        let lpost = state.lposterior(Codon::new(b'A', b'C', b'G'), seq.as_subseq());
        assert_eq!(lpost, LN_ZERO);
        assert!(!lpost.is_nan() && lpost != f64::INFINITY);
    }

    #[test]
    fn decode_is_out_of_bounds_outside_one_to_five() {
        let (abc, state) = uniform_frame(0.01);
        let seq = Sequence::new(abc, b"ACGTAA".to_vec()).unwrap();
        let (_, lp) = state.decode(seq.as_subseq());
        assert_eq!(lp, LN_ZERO);
    }
}
