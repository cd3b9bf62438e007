//! The polymorphic emission-state abstraction (`spec.md` §3, §4, §9).
//!
//! A faithful re-architecture of the source's function-pointer vtable: a
//! tagged `enum State` over four variants, dispatching through one
//! `Emission` trait so the HMM graph and the Viterbi engine stay agnostic
//! to which kind of state they're holding.

mod frame;
mod mute;
mod normal;
mod table;

pub use frame::FrameState;
pub use mute::MuteState;
pub use normal::NormalState;
pub use table::TableState;

use crate::sequence::Subsequence;

/// Uniform interface every state variant implements.
pub trait Emission {
    fn name(&self) -> &str;
    fn min_seq(&self) -> usize;
    fn max_seq(&self) -> usize;
    /// Log-probability of emitting `subseq` from this state. `-inf` when
    /// `subseq`'s length lies outside `[min_seq, max_seq]` or the
    /// emission is otherwise impossible — never an error.
    fn lprob(&self, subseq: Subsequence<'_>) -> f64;
}

/// A state in an [`crate::hmm::Hmm`] graph.
///
/// Identity for graph membership purposes is by `Arc` pointer, not by
/// `name()` (names are advisory labels, not keys).
#[derive(Debug, Clone)]
pub enum State {
    Normal(NormalState),
    Mute(MuteState),
    Table(TableState),
    Frame(FrameState),
}

impl Emission for State {
    fn name(&self) -> &str {
        match self {
            State::Normal(s) => s.name(),
            State::Mute(s) => s.name(),
            State::Table(s) => s.name(),
            State::Frame(s) => s.name(),
        }
    }

    fn min_seq(&self) -> usize {
        match self {
            State::Normal(s) => s.min_seq(),
            State::Mute(s) => s.min_seq(),
            State::Table(s) => s.min_seq(),
            State::Frame(s) => s.min_seq(),
        }
    }

    fn max_seq(&self) -> usize {
        match self {
            State::Normal(s) => s.max_seq(),
            State::Mute(s) => s.max_seq(),
            State::Table(s) => s.max_seq(),
            State::Frame(s) => s.max_seq(),
        }
    }

    fn lprob(&self, subseq: Subsequence<'_>) -> f64 {
        match self {
            State::Normal(s) => s.lprob(subseq),
            State::Mute(s) => s.lprob(subseq),
            State::Table(s) => s.lprob(subseq),
            State::Frame(s) => s.lprob(subseq),
        }
    }
}

impl State {
    /// `true` for [`State::Mute`] — the only variant the Viterbi engine's
    /// mute-subgraph handling and `spec.md` §4.6 chaining applies to.
    pub fn is_mute(&self) -> bool {
        matches!(self, State::Mute(_))
    }
}
