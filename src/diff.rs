//! Shortest edit script between two sequences.
//!
//! This is the O(NP) algorithm by Wu, Manber, Myers and Miller, used to show how the object structures of sibling charts differ.

/// An operation of an edit script, which turns the first sequence into the second one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EditOp {
    /// Keep the element of both sequences.
    Equal,
    /// Insert the element of the second sequence.
    Insert,
    /// Delete the element of the first sequence.
    Delete,
}

impl EditOp {
    /// One character symbol, `=`, `+` or `-`.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Equal => '=',
            Self::Insert => '+',
            Self::Delete => '-',
        }
    }
}

struct Onp<'a, T> {
    short: &'a [T],
    long: &'a [T],
    offset: isize,
    fp: Vec<isize>,
    paths: Vec<Vec<EditOp>>,
    insert: EditOp,
    delete: EditOp,
}

impl<T: PartialEq> Onp<'_, T> {
    fn snake(&self, k: isize, mut y: isize) -> isize {
        let mut x = y - k;
        while let (Some(a), Some(b)) = (self.short.get(x as usize), self.long.get(y as usize)) {
            if a != b {
                break;
            }
            x += 1;
            y += 1;
        }
        y
    }

    fn step(&mut self, k: isize) {
        let idx = (k + self.offset) as usize;
        let below = self.fp[idx - 1];
        let above = self.fp[idx + 1];
        let is_origin = k == 0 && below == -1;
        let start = (below + 1).max(above);
        let mut path = if below + 1 > above {
            let mut path = self.paths[idx - 1].clone();
            if !is_origin {
                path.push(self.insert);
            }
            path
        } else {
            let mut path = self.paths[idx + 1].clone();
            path.push(self.delete);
            path
        };
        let end = self.snake(k, start);
        path.extend(std::iter::repeat_n(EditOp::Equal, (end - start) as usize));
        self.fp[idx] = end;
        self.paths[idx] = path;
    }
}

/// Computes the edit distance and the shortest edit script from `a` to `b`.
///
/// ```rust
/// use bms_check::diff::{EditOp, onp};
///
/// let (distance, ops) = onp(&["a", "b", "c"], &["a", "c", "d"]);
/// assert_eq!(distance, 2);
/// assert_eq!(ops.iter().filter(|&&op| op == EditOp::Equal).count(), 2);
/// ```
#[must_use]
pub fn onp<T: PartialEq>(a: &[T], b: &[T]) -> (usize, Vec<EditOp>) {
    let reversed = a.len() > b.len();
    let (short, long) = if reversed { (b, a) } else { (a, b) };
    let (m, n) = (short.len() as isize, long.len() as isize);
    let delta = n - m;
    let size = short.len() + long.len() + 3;
    let (insert, delete) = if reversed {
        (EditOp::Delete, EditOp::Insert)
    } else {
        (EditOp::Insert, EditOp::Delete)
    };
    let mut state = Onp {
        short,
        long,
        offset: m + 1,
        fp: vec![-1; size],
        paths: vec![Vec::new(); size],
        insert,
        delete,
    };
    let delta_idx = (delta + state.offset) as usize;
    let mut p = 0;
    loop {
        for k in -p..delta {
            state.step(k);
        }
        for k in (delta + 1..=delta + p).rev() {
            state.step(k);
        }
        state.step(delta);
        if state.fp[delta_idx] == n {
            let ops = std::mem::take(&mut state.paths[delta_idx]);
            return ((delta + 2 * p) as usize, ops);
        }
        p += 1;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn lcs_len(a: &[char], b: &[char]) -> usize {
        let mut table = vec![vec![0; b.len() + 1]; a.len() + 1];
        for (i, x) in a.iter().enumerate() {
            for (j, y) in b.iter().enumerate() {
                table[i + 1][j + 1] = if x == y {
                    table[i][j] + 1
                } else {
                    table[i][j + 1].max(table[i + 1][j])
                };
            }
        }
        table[a.len()][b.len()]
    }

    /// Replays `ops`, asserting that it consumes both sequences consistently.
    fn replay(a: &[char], b: &[char], ops: &[EditOp]) {
        let (mut i, mut j) = (0, 0);
        for op in ops {
            match op {
                EditOp::Equal => {
                    assert_eq!(a[i], b[j]);
                    i += 1;
                    j += 1;
                }
                EditOp::Insert => j += 1,
                EditOp::Delete => i += 1,
            }
        }
        assert_eq!((i, j), (a.len(), b.len()));
    }

    fn check(a: &str, b: &str) {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        let (distance, ops) = onp(&a, &b);
        replay(&a, &b, &ops);
        assert_eq!(distance, a.len() + b.len() - 2 * lcs_len(&a, &b));
        assert_eq!(
            distance,
            ops.iter().filter(|&&op| op != EditOp::Equal).count()
        );
    }

    #[test]
    fn small_cases() {
        check("", "");
        check("abc", "");
        check("", "abc");
        check("abc", "abc");
        check("abcdef", "abc");
        check("acbdeacbed", "acebdabbabed");
        check("kitten", "sitting");
        check("aaaa", "bbbb");
    }

    #[test]
    fn symbols() {
        let (distance, ops) = onp(&[1, 2], &[1, 3]);
        let script: String = ops.iter().map(|op| op.symbol()).collect();
        assert_eq!(distance, 2);
        assert_eq!(script.chars().filter(|&c| c == '=').count(), 1);
        assert!(script.starts_with('='));
    }

    #[test]
    fn pseudo_random_sequences() {
        let mut seed: u32 = 12345;
        let mut next = || {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
            (seed >> 16) % 4
        };
        for _ in 0..50 {
            let a: String = (0..next() * 3).map(|_| char::from(b'a' + next() as u8)).collect();
            let b: String = (0..next() * 3).map(|_| char::from(b'a' + next() as u8)).collect();
            check(&a, &b);
        }
    }
}
