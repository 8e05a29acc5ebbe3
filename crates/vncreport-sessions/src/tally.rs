use std::collections::BTreeMap;

/// Sessions attributed to each user. Counts only go up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserTally {
    counts: BTreeMap<String, u64>,
}

impl UserTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more session for `user`.
    pub fn record(&mut self, user: &str) {
        match self.counts.get_mut(user) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(user.to_string(), 1);
            }
        }
    }

    pub fn count(&self, user: &str) -> u64 {
        self.counts.get(user).copied().unwrap_or(0)
    }

    pub fn into_counts(self) -> BTreeMap<String, u64> {
        self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_count() {
        let mut tally = UserTally::new();
        tally.record("alice");
        tally.record("bob");
        tally.record("alice");

        assert_eq!(tally.count("alice"), 2);
        assert_eq!(tally.count("bob"), 1);
        assert_eq!(tally.count("carol"), 0);

        let counts = tally.into_counts();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts.values().sum::<u64>(), 3);
    }

    #[test]
    fn test_empty_tally() {
        let tally = UserTally::new();
        assert_eq!(tally.count("alice"), 0);
        assert!(tally.into_counts().is_empty());
    }
}
