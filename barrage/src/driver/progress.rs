use std::collections::BTreeSet;

/// Percentages announced during a run, in increasing order.
pub const MILESTONES: [u8; 4] = [25, 50, 75, 100];

/// Tracks which progress milestones have already been announced.
///
/// Milestones are only ever added, so each one is reported at most once and
/// always after the ones below it, whatever order progress is fed in.
#[derive(Debug, Clone)]
pub struct Progress {
    total: usize,
    announced: BTreeSet<u8>,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            announced: BTreeSet::new(),
        }
    }

    /// Returns the milestones crossed by `done` that were not announced yet.
    pub fn advance(&mut self, done: usize) -> Vec<u8> {
        if self.total == 0 {
            return Vec::new();
        }
        let mut crossed = Vec::new();
        for milestone in MILESTONES {
            if done.saturating_mul(100) < usize::from(milestone) * self.total {
                break;
            }
            if self.announced.insert(milestone) {
                crossed.push(milestone);
            }
        }
        crossed
    }

    pub fn announced(&self) -> impl Iterator<Item = u8> + '_ {
        self.announced.iter().copied()
    }
}
