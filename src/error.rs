//! Error conventions (`spec.md` §7).
//!
//! Domain and graph violations are surfaced immediately as `Err`, with no
//! partial mutation. Impossibility (an event with zero probability) is
//! never an error: it flows out of `lprob`/`likelihood`/`viterbi` as
//! `f64::NEG_INFINITY`, per [`crate::numeric`].

use thiserror::Error;

/// Everything that can go wrong building or mutating this crate's types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A symbol appears more than once in an alphabet.
    #[error("duplicate symbol {0:?} in alphabet")]
    DuplicateSymbol(u8),

    /// The wildcard symbol was also listed among the ordinary symbols.
    #[error("wildcard symbol {0:?} may not also appear in the alphabet's symbol list")]
    WildcardInAlphabet(u8),

    /// A byte outside the alphabet (and not the wildcard) was used to build a sequence.
    #[error("symbol {0:?} is not a member of the alphabet")]
    SymbolNotInAlphabet(u8),

    /// A subsequence's `start + length` exceeds its parent sequence's length.
    #[error("subsequence range [{start}, {start}+{length}) exceeds sequence length {seq_len}")]
    SequenceOutOfRange {
        start: usize,
        length: usize,
        seq_len: usize,
    },

    /// A nucleotide (base) alphabet must have exactly four ordinary symbols.
    #[error("base alphabet must have exactly 4 symbols, got {0}")]
    InvalidBaseAlphabet(usize),

    /// `Hmm::add_state` was called with a state already present.
    #[error("state {0:?} is already a member of this HMM")]
    DuplicateState(String),

    /// A transition, deletion, or start-probability mutation referenced a
    /// state that is not a member of the HMM.
    #[error("state {0:?} is not a member of this HMM")]
    UnknownState(String),

    /// `normalize()` was asked to normalize a distribution whose total
    /// mass is `-inf` (nothing to normalize).
    #[error("cannot normalize a distribution with zero total mass")]
    EmptyDistribution,

    /// A cycle was detected in the mute (zero-emission) subgraph, either
    /// proven at `normalize()` time or defended against at `viterbi()` time.
    #[error("cycle detected in the mute-state subgraph")]
    MuteCycle,

    /// A frame state's indel rate was outside `[0, 1/2)`.
    #[error("epsilon {0} is not in [0, 0.5)")]
    InvalidEpsilon(f64),
}

pub type Result<T> = std::result::Result<T, Error>;
