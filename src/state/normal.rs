use crate::dist::SymbolDist;
use crate::numeric::LN_ZERO;
use crate::sequence::Subsequence;
use crate::state::Emission;

/// A single-symbol emitter: emission length is fixed at 1.
#[derive(Debug, Clone)]
pub struct NormalState {
    name: String,
    dist: SymbolDist,
}

impl NormalState {
    pub fn new(name: impl Into<String>, dist: SymbolDist) -> Self {
        NormalState {
            name: name.into(),
            dist,
        }
    }

    pub fn dist(&self) -> &SymbolDist {
        &self.dist
    }
}

impl Emission for NormalState {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_seq(&self) -> usize {
        1
    }

    fn max_seq(&self) -> usize {
        1
    }

    fn lprob(&self, subseq: Subsequence<'_>) -> f64 {
        if subseq.len() != 1 {
            return LN_ZERO;
        }
        self.dist.lprob(subseq.as_bytes()[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::presets;
    use crate::sequence::Sequence;
    use std::sync::Arc;

    #[test]
    fn lprob_requires_exactly_one_symbol() {
        let abc = Arc::new(presets::nucleotides());
        let dist = SymbolDist::new(abc.clone(), vec![0.25_f64.ln(); 5]);
        let state = NormalState::new("S1", dist);

        let seq = Sequence::new(abc, b"AC".to_vec()).unwrap();
        assert_eq!(state.lprob(seq.slice(0, 2).unwrap()), LN_ZERO);
        assert!((state.lprob(seq.slice(0, 1).unwrap()) - 0.25_f64.ln()).abs() < 1e-12);
    }
}
