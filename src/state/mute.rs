use crate::numeric::LN_ZERO;
use crate::sequence::Subsequence;
use crate::state::Emission;

/// A zero-length emitter (ε-transition node).
#[derive(Debug, Clone)]
pub struct MuteState {
    name: String,
}

impl MuteState {
    pub fn new(name: impl Into<String>) -> Self {
        MuteState { name: name.into() }
    }
}

impl Emission for MuteState {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_seq(&self) -> usize {
        0
    }

    fn max_seq(&self) -> usize {
        0
    }

    fn lprob(&self, subseq: Subsequence<'_>) -> f64 {
        if subseq.is_empty() {
            0.0
        } else {
            LN_ZERO
        }
    }
}
