//! Windowed Viterbi results (`spec.md` §3, §4.7).

use std::ops::Deref;

use crate::path::Path;
use crate::sequence::Subsequence;

/// One decode: the log-likelihood of the winning path, the path itself,
/// and the window of the original sequence it was decoded over.
///
/// `subseq` borrows from the [`crate::sequence::Sequence`] passed to
/// [`crate::viterbi::viterbi`] — a result never copies the observation.
#[derive(Debug, Clone)]
pub struct Rslt<'a> {
    loglik: f64,
    path: Path,
    subseq: Subsequence<'a>,
}

impl<'a> Rslt<'a> {
    pub(crate) fn new(loglik: f64, path: Path, subseq: Subsequence<'a>) -> Self {
        Rslt { loglik, path, subseq }
    }

    pub fn loglik(&self) -> f64 {
        self.loglik
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn subseq(&self) -> Subsequence<'a> {
        self.subseq
    }
}

/// The windowed results of one `viterbi` call: one [`Rslt`] per window, or
/// exactly one covering the whole sequence when `window == 0`.
#[derive(Debug, Clone)]
pub struct Results<'a> {
    items: Vec<Rslt<'a>>,
}

impl<'a> Results<'a> {
    pub(crate) fn new(items: Vec<Rslt<'a>>) -> Self {
        Results { items }
    }
}

impl<'a> Deref for Results<'a> {
    type Target = [Rslt<'a>];

    fn deref(&self) -> &Self::Target {
        &self.items
    }
}
