//! The HMM graph: states, start-probabilities, transitions (`spec.md` §3, §4.3).

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use log::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::numeric::{log_mul, logsumexp, sanitize, LN_ZERO};
use crate::path::Path;
use crate::sequence::Sequence;
use crate::state::{Emission, State};

fn state_key(state: &Arc<State>) -> usize {
    Arc::as_ptr(state) as usize
}

/// A directed graph of states with start- and transition-log-probabilities.
///
/// States are held by `Arc`, never owned outright; membership is keyed by
/// the `Arc`'s pointer identity, not `name()` (`spec.md` §3, "identity is
/// by object"). Indices are a dense arena with tombstones for deleted
/// slots (`spec.md` §9 "HMM graph"), so indices handed to an in-progress
/// Viterbi decode never get renumbered out from under it.
#[derive(Debug, Clone, Default)]
pub struct Hmm {
    arena: Vec<Option<Arc<State>>>,
    index: HashMap<usize, usize>,
    start: Vec<f64>,
    trans: HashMap<(usize, usize), f64>,
    out_edges: HashMap<usize, Vec<usize>>,
    in_edges: HashMap<usize, Vec<usize>>,
}

impl Hmm {
    pub fn new() -> Self {
        Hmm::default()
    }

    pub(crate) fn idx_of(&self, state: &Arc<State>) -> Option<usize> {
        self.index.get(&state_key(state)).copied()
    }

    /// Registers `state` with the given start log-probability (`-inf` by
    /// default if the caller has no opinion). Fails if `state` is already
    /// a member.
    pub fn add_state(&mut self, state: Arc<State>, start_lprob: f64) -> Result<()> {
        let key = state_key(&state);
        if self.index.contains_key(&key) {
            return Err(Error::DuplicateState(state.name().to_string()));
        }
        let idx = self.arena.len();
        debug!("add_state {:?} at index {idx}", state.name());
        self.arena.push(Some(state));
        self.start.push(start_lprob);
        self.index.insert(key, idx);
        Ok(())
    }

    /// Removes `state` and every transition incident to it.
    pub fn del_state(&mut self, state: &Arc<State>) -> Result<()> {
        let idx = self
            .idx_of(state)
            .ok_or_else(|| Error::UnknownState(state.name().to_string()))?;
        debug!("del_state {:?} at index {idx}", state.name());
        self.arena[idx] = None;
        self.start[idx] = LN_ZERO;
        self.index.remove(&state_key(state));

        if let Some(outs) = self.out_edges.remove(&idx) {
            for dst in outs {
                self.trans.remove(&(idx, dst));
                if let Some(v) = self.in_edges.get_mut(&dst) {
                    v.retain(|&s| s != idx);
                }
            }
        }
        if let Some(ins) = self.in_edges.remove(&idx) {
            for src in ins {
                self.trans.remove(&(src, idx));
                if let Some(v) = self.out_edges.get_mut(&src) {
                    v.retain(|&d| d != idx);
                }
            }
        }
        Ok(())
    }

    /// Sets `trans(src, dst) = lp`. Both states must already be members.
    pub fn set_trans(&mut self, src: &Arc<State>, dst: &Arc<State>, lp: f64) -> Result<()> {
        let si = self
            .idx_of(src)
            .ok_or_else(|| Error::UnknownState(src.name().to_string()))?;
        let di = self
            .idx_of(dst)
            .ok_or_else(|| Error::UnknownState(dst.name().to_string()))?;
        debug!("set_trans {:?} -> {:?} = {lp}", src.name(), dst.name());
        if self.trans.insert((si, di), lp).is_none() {
            self.out_edges.entry(si).or_default().push(di);
            self.in_edges.entry(di).or_default().push(si);
        }
        Ok(())
    }

    /// Stored transition log-probability, or `-inf` if unset or either
    /// state is foreign to this graph.
    pub fn get_trans(&self, src: &Arc<State>, dst: &Arc<State>) -> f64 {
        match (self.idx_of(src), self.idx_of(dst)) {
            (Some(si), Some(di)) => self.trans.get(&(si, di)).copied().unwrap_or(LN_ZERO),
            _ => LN_ZERO,
        }
    }

    /// Stored start log-probability, or `-inf` if unset or foreign.
    pub fn start_lprob(&self, state: &Arc<State>) -> f64 {
        self.idx_of(state).map(|i| self.start[i]).unwrap_or(LN_ZERO)
    }

    fn live_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.arena.iter().enumerate().filter_map(|(i, s)| s.as_ref().map(|_| i))
    }

    /// Normalises the start row and every state's outgoing row so each
    /// sums to `1` (`0` in log-space), then checks the mute subgraph for
    /// cycles. A state with no recorded outgoing transitions (a terminal
    /// state) has no row to normalise and is left untouched.
    pub fn normalize(&mut self) -> Result<()> {
        let indices: Vec<usize> = self.live_indices().collect();

        let z_start = logsumexp(indices.iter().map(|&i| self.start[i]));
        if z_start == LN_ZERO {
            return Err(Error::EmptyDistribution);
        }
        for &i in &indices {
            self.start[i] = sanitize(self.start[i] - z_start);
        }
        trace!("normalized start row over {} states", indices.len());

        for &src in &indices {
            let outs = match self.out_edges.get(&src) {
                Some(outs) if !outs.is_empty() => outs.clone(),
                _ => continue,
            };
            let z = logsumexp(outs.iter().map(|&dst| self.trans[&(src, dst)]));
            if z == LN_ZERO {
                return Err(Error::EmptyDistribution);
            }
            for &dst in &outs {
                let v = self.trans.get_mut(&(src, dst)).expect("edge in out_edges is in trans");
                *v = sanitize(*v - z);
            }
            trace!("normalized outgoing row for state index {src}");
        }

        self.check_mute_acyclic()
    }

    /// Kahn's algorithm over the subgraph induced by mute states and
    /// `mute -> mute` transitions. `spec.md` §9 mandates this check both
    /// here and defensively inside `viterbi`, which calls
    /// [`Hmm::topological_mute_order`] directly.
    fn check_mute_acyclic(&self) -> Result<()> {
        self.topological_mute_order().map(|_| ())
    }

    /// A topological order of the mute subgraph, or `Error::MuteCycle` if
    /// Kahn's algorithm can't drain every mute state.
    pub(crate) fn topological_mute_order(&self) -> Result<Vec<usize>> {
        let mute: Vec<usize> = self
            .live_indices()
            .filter(|&i| self.arena[i].as_ref().unwrap().is_mute())
            .collect();
        let mute_set: HashSet<usize> = mute.iter().copied().collect();

        let mut in_deg: HashMap<usize, usize> = mute.iter().map(|&i| (i, 0)).collect();
        for &i in &mute {
            for &dst in self.out_edges.get(&i).into_iter().flatten() {
                if mute_set.contains(&dst) {
                    *in_deg.get_mut(&dst).expect("dst is in mute_set") += 1;
                }
            }
        }

        let mut queue: VecDeque<usize> = in_deg
            .iter()
            .filter(|&(_, &deg)| deg == 0)
            .map(|(&i, _)| i)
            .collect();
        let mut order = Vec::with_capacity(mute.len());
        while let Some(i) = queue.pop_front() {
            order.push(i);
            for &dst in self.out_edges.get(&i).into_iter().flatten() {
                if mute_set.contains(&dst) {
                    let deg = in_deg.get_mut(&dst).expect("dst is in mute_set");
                    *deg -= 1;
                    if *deg == 0 {
                        queue.push_back(dst);
                    }
                }
            }
        }

        if order.len() != mute.len() {
            warn!("cycle detected in mute-state subgraph");
            return Err(Error::MuteCycle);
        }
        Ok(order)
    }

    /// Live predecessors of arena index `dst`, in the order their
    /// transitions were first registered (`spec.md` §4.6 tie-break rule).
    pub(crate) fn predecessors(&self, dst: usize) -> &[usize] {
        self.in_edges.get(&dst).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn state_at(&self, idx: usize) -> &Arc<State> {
        self.arena[idx]
            .as_ref()
            .expect("viterbi only dereferences indices returned by live_index_list/predecessors")
    }

    pub(crate) fn live_index_list(&self) -> Vec<usize> {
        self.live_indices().collect()
    }

    pub(crate) fn start_at(&self, idx: usize) -> f64 {
        self.start[idx]
    }

    pub(crate) fn trans_at(&self, src: usize, dst: usize) -> f64 {
        self.trans.get(&(src, dst)).copied().unwrap_or(LN_ZERO)
    }

    pub(crate) fn arena_len(&self) -> usize {
        self.arena.len()
    }

    /// Sum of the start log-probability, each step's emission
    /// log-probability, and each transition log-probability along `path`.
    /// `-inf` if any term is `-inf` or the path's total emission length
    /// doesn't equal `seq.len()`.
    pub fn likelihood(&self, seq: &Sequence, path: &Path) -> f64 {
        if path.total_seq_len() != seq.len() {
            return LN_ZERO;
        }

        let mut total = 0.0_f64;
        let mut offset = 0usize;
        let mut prev: Option<&Arc<State>> = None;

        for step in path.iter() {
            let subseq = match seq.slice(offset, step.seq_len()) {
                Ok(s) => s,
                Err(_) => return LN_ZERO,
            };
            offset += step.seq_len();

            let emit = step.state().lprob(subseq);
            let transition = match prev {
                None => self.start_lprob(step.state()),
                Some(p) => self.get_trans(p, step.state()),
            };
            total = log_mul(total, log_mul(transition, emit));
            prev = Some(step.state());
        }

        total
    }
}
