//! Packrat memoization.
//!
//! Productions are cached by `(key, start position)`. Two strategies exist:
//!
//! - [`memoize`] caches the result and end position of a production so that
//!   retrying it from the same position is free.
//! - [`memoize_left_rec`] additionally terminates productions that invoke
//!   themselves at their own start position. The cache is primed with a
//!   failure, so the innermost recursive call fails and a non-recursive
//!   alternative produces a seed. The body is then re-run, each round
//!   feeding the best result so far back through the cache, for as long as
//!   a round consumes strictly more input than the previous best.

use std::collections::HashMap;
use std::hash::Hash;

/// A cached production outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Memo<V> {
    /// The production's result, `None` for a failed match
    pub result: Option<V>,
    /// Cursor position after the production
    pub end: usize,
}

/// Cache of production outcomes keyed by production and start position.
#[derive(Debug, Clone)]
pub struct MemoTable<K, V> {
    entries: HashMap<(K, usize), Memo<V>>,
}

impl<K: Eq + Hash, V> Default for MemoTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash, V> MemoTable<K, V> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Look up the outcome of `key` started at `pos`.
    pub fn get(&self, key: K, pos: usize) -> Option<&Memo<V>> {
        self.entries.get(&(key, pos))
    }

    /// Record the outcome of `key` started at `pos`.
    pub fn insert(&mut self, key: K, pos: usize, memo: Memo<V>) {
        self.entries.insert((key, pos), memo);
    }

    /// Number of cached outcomes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached outcome.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A backtracking cursor with a memo table.
pub trait Packrat {
    /// Identifies a production (and its argument, if any).
    type Key: Copy + Eq + Hash;
    /// Result type shared by all memoized productions.
    type Value: Clone;
    /// Fatal error type.
    type Error;

    /// Current cursor position.
    fn mark(&self) -> usize;

    /// Move the cursor back (or forward) to `pos`.
    fn reset(&mut self, pos: usize);

    /// The memo table.
    fn memos(&mut self) -> &mut MemoTable<Self::Key, Self::Value>;
}

type Outcome<P> = Result<Option<<P as Packrat>::Value>, <P as Packrat>::Error>;

fn replay<P: Packrat>(state: &mut P, key: P::Key, pos: usize) -> Option<Option<P::Value>> {
    let memo = state.memos().get(key, pos).cloned()?;
    state.reset(memo.end);
    Some(memo.result)
}

/// Run `body` at most once per position, replaying its cached outcome.
pub fn memoize<P, F>(state: &mut P, key: P::Key, body: F) -> Outcome<P>
where
    P: Packrat,
    F: FnOnce(&mut P) -> Outcome<P>,
{
    let pos = state.mark();
    if let Some(result) = replay(state, key, pos) {
        return Ok(result);
    }

    let result = body(state)?;
    let end = state.mark();
    state.memos().insert(
        key,
        pos,
        Memo {
            result: result.clone(),
            end,
        },
    );
    Ok(result)
}

/// Run a directly left recursive `body` by growing a seed.
///
/// Ties between equally long parses go to whichever round reached that
/// length first, so the grammar's alternative order decides.
pub fn memoize_left_rec<P, F>(state: &mut P, key: P::Key, mut body: F) -> Outcome<P>
where
    P: Packrat,
    F: FnMut(&mut P) -> Outcome<P>,
{
    let pos = state.mark();
    if let Some(result) = replay(state, key, pos) {
        return Ok(result);
    }

    // Prime the cache with a failure so the recursive call bottoms out.
    let mut best: Option<P::Value> = None;
    let mut best_end = pos;
    state.memos().insert(key, pos, Memo { result: None, end: pos });

    loop {
        state.reset(pos);
        let result = body(state)?;
        let end = state.mark();
        if result.is_none() || end <= best_end {
            break;
        }
        best = result;
        best_end = end;
        state.memos().insert(
            key,
            pos,
            Memo {
                result: best.clone(),
                end,
            },
        );
    }

    state.reset(best_end);
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Rule {
        Sum,
        Digit,
        Chain,
    }

    /// A cursor over single characters, counting how often bodies run.
    struct Chars {
        input: Vec<char>,
        pos: usize,
        memos: MemoTable<Rule, String>,
        calls: usize,
    }

    impl Chars {
        fn new(input: &str) -> Self {
            Self {
                input: input.chars().collect(),
                pos: 0,
                memos: MemoTable::new(),
                calls: 0,
            }
        }

        fn eat(&mut self, c: char) -> bool {
            if self.input.get(self.pos) == Some(&c) {
                self.pos += 1;
                true
            } else {
                false
            }
        }

        fn digit(&mut self) -> Result<Option<String>, String> {
            memoize(self, Rule::Digit, |p| {
                p.calls += 1;
                match p.input.get(p.pos) {
                    Some(c) if c.is_ascii_digit() => {
                        let c = *c;
                        p.pos += 1;
                        Ok(Some(c.to_string()))
                    }
                    _ => Ok(None),
                }
            })
        }

        /// sum -> sum '-' digit | digit, left associative.
        fn sum(&mut self) -> Result<Option<String>, String> {
            memoize_left_rec(self, Rule::Sum, |p| {
                p.calls += 1;
                let pos = p.mark();
                if let Some(lhs) = p.sum()? {
                    if p.eat('-') {
                        if let Some(rhs) = p.digit()? {
                            return Ok(Some(format!("({}-{})", lhs, rhs)));
                        }
                    }
                }
                p.reset(pos);
                p.digit()
            })
        }

        /// chain -> chain chain | 'a', the shape of the action rule.
        fn chain(&mut self) -> Result<Option<String>, String> {
            memoize_left_rec(self, Rule::Chain, |p| {
                let pos = p.mark();
                if let Some(a) = p.chain()? {
                    if let Some(b) = p.chain()? {
                        return Ok(Some(format!("{}{}", a, b)));
                    }
                }
                p.reset(pos);
                if p.eat('a') {
                    return Ok(Some("a".to_string()));
                }
                if p.eat('!') {
                    return Err("bang".to_string());
                }
                Ok(None)
            })
        }
    }

    impl Packrat for Chars {
        type Key = Rule;
        type Value = String;
        type Error = String;

        fn mark(&self) -> usize {
            self.pos
        }

        fn reset(&mut self, pos: usize) {
            self.pos = pos;
        }

        fn memos(&mut self) -> &mut MemoTable<Rule, String> {
            &mut self.memos
        }
    }

    #[test]
    fn test_plain_memo_replays_result_and_position() {
        let mut p = Chars::new("7x");
        assert_eq!(p.digit().unwrap(), Some("7".to_string()));
        assert_eq!(p.mark(), 1);

        p.reset(0);
        assert_eq!(p.digit().unwrap(), Some("7".to_string()));
        assert_eq!(p.mark(), 1);
        assert_eq!(p.calls, 1);
    }

    #[test]
    fn test_plain_memo_caches_failure() {
        let mut p = Chars::new("x");
        assert_eq!(p.digit().unwrap(), None);
        assert_eq!(p.digit().unwrap(), None);
        assert_eq!(p.mark(), 0);
        assert_eq!(p.calls, 1);
        assert_eq!(p.memos.get(Rule::Digit, 0).unwrap().end, 0);
    }

    #[test]
    fn test_seed_growing_is_left_associative() {
        let mut p = Chars::new("1-2-3-4");
        assert_eq!(p.sum().unwrap(), Some("(((1-2)-3)-4)".to_string()));
        assert_eq!(p.mark(), 7);
    }

    #[test]
    fn test_seed_growing_depths() {
        for depth in 0..20 {
            let input = std::iter::once("0".to_string())
                .chain((1..=depth).map(|i| format!("-{}", i % 10)))
                .collect::<String>();
            let mut p = Chars::new(&input);
            let result = p.sum().unwrap().unwrap();
            assert_eq!(result.matches('(').count(), depth);
            assert_eq!(p.mark(), input.len());
        }
    }

    #[test]
    fn test_seed_growing_stops_at_longest_parse() {
        // The trailing '-' cannot extend the sum and must not be consumed.
        let mut p = Chars::new("1-2-");
        assert_eq!(p.sum().unwrap(), Some("(1-2)".to_string()));
        assert_eq!(p.mark(), 3);
    }

    #[test]
    fn test_left_rec_failure_leaves_cursor() {
        let mut p = Chars::new("x");
        assert_eq!(p.sum().unwrap(), None);
        assert_eq!(p.mark(), 0);
    }

    #[test]
    fn test_left_rec_final_entry_is_not_stale() {
        let mut p = Chars::new("1-2-3");
        p.sum().unwrap();
        let memo = p.memos.get(Rule::Sum, 0).unwrap();
        assert_eq!(memo.end, 5);
        assert_eq!(memo.result.as_deref(), Some("((1-2)-3)"));

        // A second call replays without re-running the body.
        let calls = p.calls;
        p.reset(0);
        assert_eq!(p.sum().unwrap(), Some("((1-2)-3)".to_string()));
        assert_eq!(p.mark(), 5);
        assert_eq!(p.calls, calls);
    }

    #[test]
    fn test_self_concatenation_terminates() {
        let mut p = Chars::new("aaaa");
        assert_eq!(p.chain().unwrap(), Some("aaaa".to_string()));
        assert_eq!(p.mark(), 4);
    }

    #[test]
    fn test_errors_propagate() {
        let mut p = Chars::new("a!");
        assert_eq!(p.chain(), Err("bang".to_string()));
    }

    #[test]
    fn test_table_bookkeeping() {
        let mut table: MemoTable<Rule, String> = MemoTable::default();
        assert!(table.is_empty());
        table.insert(Rule::Digit, 3, Memo { result: None, end: 3 });
        assert_eq!(table.len(), 1);
        assert!(table.get(Rule::Digit, 2).is_none());
        table.clear();
        assert!(table.is_empty());
    }
}
