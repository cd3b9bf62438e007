//! The Viterbi dynamic programme over variable-length emissions
//! (`spec.md` §4.6).
//!
//! `V[t][s]`, the max log-probability of any path emitting the window's
//! first `t` symbols and ending in state `s`, is filled column by column.
//! Within a column, non-mute states are resolved first (they only ever
//! depend on strictly earlier columns); mute states are then resolved in
//! topological order over the mute subgraph, since a zero-length emission
//! leaves the column unchanged and lets one mute state feed directly into
//! another at the same `t`.

use std::sync::Arc;

use log::debug;

use crate::error::{Error, Result};
use crate::hmm::Hmm;
use crate::numeric::{log_mul, LN_ZERO};
use crate::path::{Path, Step};
use crate::results::{Results, Rslt};
use crate::sequence::Sequence;
use crate::state::{Emission, State};

/// `(k, source)` back-pointer: `source = None` means this step is the
/// first in its path (start-lprob was the winning term), `Some(p)` names
/// the predecessor's arena index.
type BackPointer = Option<(usize, Option<usize>)>;

/// Best `(value, source)` feeding into `v[window_start][s_idx]`: either the
/// virtual start (only live when `window_start == 0`) or a registered
/// predecessor, compared by `spec.md` §4.6's tie-break (lower `k` wins by
/// construction here; ties at equal value keep the first candidate seen).
fn best_incoming(hmm: &Hmm, v: &[Vec<f64>], window_start: usize, s_idx: usize) -> (f64, Option<usize>) {
    let mut best_val = LN_ZERO;
    let mut best_src = None;

    if window_start == 0 {
        let val = hmm.start_at(s_idx);
        if val > best_val {
            best_val = val;
            best_src = None;
        }
    }

    for &p in hmm.predecessors(s_idx) {
        let vp = v[window_start][p];
        if vp == LN_ZERO {
            continue;
        }
        let val = log_mul(vp, hmm.trans_at(p, s_idx));
        if val > best_val {
            best_val = val;
            best_src = Some(p);
        }
    }

    (best_val, best_src)
}

/// `V[t][s_idx]` and its back-pointer, maximising over every legal
/// emission length `k ∈ [min_seq, max_seq]` for this state.
fn compute_state(
    hmm: &Hmm,
    v: &[Vec<f64>],
    state: &Arc<State>,
    s_idx: usize,
    t: usize,
    seq: &Sequence,
    woff: usize,
) -> (f64, BackPointer) {
    let min_k = state.min_seq();
    let max_k = state.max_seq().min(t);
    if min_k > max_k {
        return (LN_ZERO, None);
    }

    let mut best_val = LN_ZERO;
    let mut best_bp: BackPointer = None;

    for k in min_k..=max_k {
        let window_start = t - k;
        let subseq = match seq.slice(woff + window_start, k) {
            Ok(s) => s,
            Err(_) => continue,
        };
        let emit = state.lprob(subseq);
        if emit == LN_ZERO {
            continue;
        }

        let (incoming, src) = best_incoming(hmm, v, window_start, s_idx);
        if incoming == LN_ZERO {
            continue;
        }

        let val = log_mul(incoming, emit);
        if val > best_val {
            best_val = val;
            best_bp = Some((k, src));
        }
    }

    (best_val, best_bp)
}

fn reconstruct(hmm: &Hmm, b: &[Vec<BackPointer>], end_t: usize, end_idx: usize) -> Path {
    let mut path = Path::new();
    let mut t = end_t;
    let mut s_idx = end_idx;

    while let Some((k, src)) = b[t][s_idx] {
        path.prepend(Step::new(hmm.state_at(s_idx).clone(), k));
        t -= k;
        match src {
            Some(p) => s_idx = p,
            None => break,
        }
    }

    path
}

/// Decodes a single window `seq[woff..woff+wlen)`, returning its
/// log-likelihood (`-inf` if no path reaches `end_idx`) and winning path.
fn decode_window(hmm: &Hmm, seq: &Sequence, woff: usize, wlen: usize, end_idx: usize, mute_order: &[usize]) -> (f64, Path) {
    let n = hmm.arena_len();
    let mut v = vec![vec![LN_ZERO; n]; wlen + 1];
    let mut b: Vec<Vec<BackPointer>> = vec![vec![None; n]; wlen + 1];
    let live = hmm.live_index_list();

    for t in 0..=wlen {
        for &s_idx in &live {
            let state = hmm.state_at(s_idx);
            if state.is_mute() {
                continue;
            }
            let (val, bp) = compute_state(hmm, &v, state, s_idx, t, seq, woff);
            v[t][s_idx] = val;
            b[t][s_idx] = bp;
        }
        for &s_idx in mute_order {
            let state = hmm.state_at(s_idx);
            let (val, bp) = compute_state(hmm, &v, state, s_idx, t, seq, woff);
            v[t][s_idx] = val;
            b[t][s_idx] = bp;
        }
    }

    let loglik = v[wlen][end_idx];
    let path = if loglik == LN_ZERO {
        Path::new()
    } else {
        reconstruct(hmm, &b, wlen, end_idx)
    };
    (loglik, path)
}

/// Non-overlapping strided windows of `seq`: `⌈T/window⌉` windows of
/// length `window` (the last one possibly shorter), or one window
/// covering the whole sequence when `window == 0`.
fn windows_of(total: usize, window: usize) -> Vec<(usize, usize)> {
    if window == 0 {
        return vec![(0, total)];
    }
    let mut out = Vec::new();
    let mut start = 0;
    while start < total {
        let len = window.min(total - start);
        out.push((start, len));
        start += window;
    }
    if out.is_empty() {
        out.push((0, 0));
    }
    out
}

/// Finds the MAP path to `end` for every window of `seq`, per `spec.md`
/// §4.6. `window == 0` decodes the whole sequence in one result; `window
/// > 0` returns one result per non-overlapping stride of that length.
///
/// Fails only on a graph-structure problem (`end` foreign to `hmm`, or a
/// cycle in the mute subgraph); a window with no valid path to `end` is
/// not an error; it surfaces as `-inf` log-likelihood with an empty path,
/// per `spec.md` §7.4.
pub fn viterbi<'a>(hmm: &Hmm, seq: &'a Sequence, end: &Arc<State>, window: usize) -> Result<Results<'a>> {
    debug!("viterbi entry: seq_len={} window={window}", seq.len());

    let end_idx = hmm
        .idx_of(end)
        .ok_or_else(|| Error::UnknownState(end.name().to_string()))?;
    let mute_order = hmm.topological_mute_order()?;

    let windows = windows_of(seq.len(), window);
    let mut items = Vec::with_capacity(windows.len());
    for (woff, wlen) in windows {
        let (loglik, path) = decode_window(hmm, seq, woff, wlen, end_idx, &mute_order);
        let subseq = seq.slice(woff, wlen)?;
        items.push(Rslt::new(loglik, path, subseq));
    }

    debug!(
        "viterbi exit: {} window(s), final loglik={}",
        items.len(),
        items.last().map(Rslt::loglik).unwrap_or(LN_ZERO)
    );
    Ok(Results::new(items))
}
