//! Discrete Hidden Markov Models over finite symbol alphabets, with native
//! support for codon-emitting states under frame-shift noise.
//!
//! Every probability in this crate is stored and combined in natural-log
//! space ([`numeric`]); `-inf` is a legal value meaning "impossible", never
//! an error. Alphabets, distributions, and tables ([`alphabet`], [`dist`],
//! [`seqtable`], [`codon`]) are immutable once built and shared by
//! reference. States ([`state`]) are a uniform emission interface over
//! four variants — fixed-length, zero-length, table-backed, and the
//! frame-shift-aware codon emitter. An [`hmm::Hmm`] ties states together
//! with start- and transition-log-probabilities; [`viterbi::viterbi`] finds
//! the MAP state path for an observation.

pub mod alphabet;
pub mod codon;
pub mod dist;
pub mod error;
pub mod hmm;
pub mod numeric;
pub mod path;
pub mod results;
pub mod sequence;
pub mod seqtable;
pub mod state;
pub mod viterbi;

pub use error::{Error, Result};
pub use hmm::Hmm;
pub use path::{Path, Step};
pub use results::{Results, Rslt};
pub use sequence::{Sequence, Subsequence};
pub use viterbi::viterbi;
