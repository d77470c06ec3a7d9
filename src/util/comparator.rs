use std::cmp::Ordering;

/// Total order over keys, plus the two key-shortening operations the table
/// builder uses to keep index entries small.
///
/// Both shortening operations return a new key; the inputs are never touched.
pub trait Comparator: Send + Sync {
    fn name(&self) -> &str;

    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;

    /// Shortest key `k` with `a <= k < b`. Requires `a < b`.
    fn separator(&self, a: &[u8], b: &[u8]) -> Vec<u8>;

    /// Shortest key `k` with `k >= a`.
    fn successor(&self, a: &[u8]) -> Vec<u8>;
}

/// Lexicographic byte order.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytewiseComparator;

impl Comparator for BytewiseComparator {
    fn name(&self) -> &str {
        "sstkv.BytewiseComparator"
    }

    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }

    fn separator(&self, a: &[u8], b: &[u8]) -> Vec<u8> {
        let min_len = a.len().min(b.len());
        let mut diff = 0usize;
        while diff < min_len && a[diff] == b[diff] {
            diff += 1;
        }

        // one is a prefix of the other: no shortening possible
        if diff >= min_len {
            return a.to_vec();
        }

        let c = a[diff];
        if c < 0xff && c + 1 < b[diff] {
            let mut sep = a[..=diff].to_vec();
            sep[diff] += 1;
            debug_assert!(self.compare(&sep, b) == Ordering::Less);
            return sep;
        }
        a.to_vec()
    }

    fn successor(&self, a: &[u8]) -> Vec<u8> {
        for (i, &c) in a.iter().enumerate() {
            if c != 0xff {
                let mut succ = a[..=i].to_vec();
                succ[i] += 1;
                return succ;
            }
        }
        // a is a run of 0xff
        a.to_vec()
    }
}
