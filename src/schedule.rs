/// Bases always clipped from the 5' end before alignment.
pub const ANCHOR5: usize = 1;

/// Bases added to the 3' trim in each round after the first.
pub const TRIM_STEP: usize = 5;

/// Subtracted from the read length before counting trimmed rounds, so reads shorter
/// than 30 bases are aligned once.
pub const MIN_TRIMMED_LEN: usize = 20;

/// How many bases to clip from each end of a read before aligning it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TrimSpec {
    pub anchor5: usize,
    pub trim3: usize,
}

impl TrimSpec {
    /// Number of bases left to align for a read of length `read_len`.
    pub fn effective_len(&self, read_len: usize) -> usize {
        read_len.saturating_sub(self.anchor5 + self.trim3)
    }
}

/// The rounds of progressive 3' trimming for one read length.
///
/// Round 0 only clips the 5' anchor. Round `k` additionally clips `5 * k` bases
/// from the 3' end, for `k` up to `(read_len - 20) / 10`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TrimSchedule {
    read_len: usize,
    rounds: usize,
}

impl TrimSchedule {
    pub fn new(read_len: usize) -> Self {
        let trimmed_rounds = read_len.saturating_sub(MIN_TRIMMED_LEN) / 10;
        Self {
            read_len,
            rounds: trimmed_rounds + 1,
        }
    }

    pub fn read_len(&self) -> usize {
        self.read_len
    }

    /// Total number of rounds, including the untrimmed round 0.
    pub fn len(&self) -> usize {
        self.rounds
    }

    pub fn is_empty(&self) -> bool {
        self.rounds == 0
    }

    pub fn get(&self, round: usize) -> Option<TrimSpec> {
        (round < self.rounds).then(|| TrimSpec {
            anchor5: ANCHOR5,
            trim3: TRIM_STEP * round,
        })
    }

    /// Iterate over the rounds in order. Each call starts again from round 0.
    pub fn iter(&self) -> impl Iterator<Item = TrimSpec> + '_ {
        (0..self.rounds).filter_map(|round| self.get(round))
    }
}

impl<'a> IntoIterator for &'a TrimSchedule {
    type Item = TrimSpec;
    type IntoIter = Box<dyn Iterator<Item = TrimSpec> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trims(read_len: usize) -> Vec<usize> {
        TrimSchedule::new(read_len).iter().map(|t| t.trim3).collect()
    }

    #[test]
    fn schedule_for_100bp() {
        let schedule = TrimSchedule::new(100);
        assert_eq!(schedule.len(), 9);
        assert_eq!(trims(100), (0..=8).map(|k| 5 * k).collect::<Vec<_>>());
        assert!(schedule.iter().all(|t| t.anchor5 == 1));
    }

    #[test]
    fn short_reads_get_one_round() {
        assert_eq!(trims(20), vec![0]);
        assert_eq!(trims(15), vec![0]);
        assert_eq!(trims(1), vec![0]);
        assert_eq!(trims(29), vec![0]);
        assert_eq!(trims(30), vec![0, 5]);
    }

    #[test]
    fn effective_lengths_for_50bp() {
        let schedule = TrimSchedule::new(50);
        let lens = schedule
            .iter()
            .map(|t| t.effective_len(schedule.read_len()))
            .collect::<Vec<_>>();
        assert_eq!(lens, vec![49, 44, 39, 34]);
    }

    #[test]
    fn restartable_and_pure() {
        let schedule = TrimSchedule::new(76);
        let first = schedule.iter().collect::<Vec<_>>();
        let second = (&schedule).into_iter().collect::<Vec<_>>();
        assert_eq!(first, second);
        assert_eq!(TrimSchedule::new(76), schedule);
        assert_eq!(schedule.get(first.len()), None);
    }
}
