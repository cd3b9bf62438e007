use crate::numeric::LN_ZERO;
use crate::seqtable::SeqTable;
use crate::sequence::Subsequence;
use crate::state::Emission;

/// An emitter backed by an explicit [`SeqTable`] of fixed-length-range
/// sequences.
#[derive(Debug, Clone)]
pub struct TableState {
    name: String,
    table: SeqTable,
}

impl TableState {
    pub fn new(name: impl Into<String>, table: SeqTable) -> Self {
        TableState {
            name: name.into(),
            table,
        }
    }

    pub fn table(&self) -> &SeqTable {
        &self.table
    }
}

impl Emission for TableState {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_seq(&self) -> usize {
        self.table.min_len()
    }

    fn max_seq(&self) -> usize {
        self.table.max_len()
    }

    fn lprob(&self, subseq: Subsequence<'_>) -> f64 {
        let len = subseq.len();
        if len < self.min_seq() || len > self.max_seq() {
            return LN_ZERO;
        }
        self.table.lprob_subseq(subseq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::presets;
    use crate::sequence::Sequence;
    use std::sync::Arc;

    #[test]
    fn lprob_respects_table_length_bounds() {
        let abc = Arc::new(presets::nucleotides());
        let mut table = SeqTable::new(abc.clone());
        table.add(b"AC", -1.0);
        table.add(b"ACGT", -2.0);
        let state = TableState::new("T", table);

        let seq = Sequence::new(abc, b"ACGT".to_vec()).unwrap();
        assert_eq!(state.lprob(seq.slice(0, 1).unwrap()), LN_ZERO);
        assert_eq!(state.lprob(seq.slice(0, 2).unwrap()), -1.0);
        assert_eq!(state.lprob(seq.slice(0, 4).unwrap()), -2.0);
    }

    #[test]
    fn lprob_of_absent_sequence_within_bounds_is_neg_infinity() {
        let abc = Arc::new(presets::nucleotides());
        let mut table = SeqTable::new(abc.clone());
        table.add(b"AC", -1.0);
        table.add(b"GT", -1.0);
        let state = TableState::new("T", table);

        let seq = Sequence::new(abc, b"AG".to_vec()).unwrap();
        assert_eq!(state.lprob(seq.slice(0, 2).unwrap()), LN_ZERO);
    }
}
