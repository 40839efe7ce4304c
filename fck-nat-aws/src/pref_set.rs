//! Preferential set
//!
//! Picks the value registered under the requested key when there is one,
//! otherwise distributes picks evenly over every registered value.

use std::collections::HashMap;

use crate::error::NatError;

#[derive(Debug, Clone)]
pub struct PrefSet<V> {
    map: HashMap<String, V>,
    vals: Vec<(String, V)>,
    next: usize,
}

impl<V> Default for PrefSet<V> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
            vals: Vec::new(),
            next: 0,
        }
    }
}

impl<V: Clone> PrefSet<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` under `pref`. A repeated key replaces the exact-match
    /// entry but every registration stays in the fallback rotation.
    pub fn add(&mut self, pref: impl Into<String>, value: V) {
        let pref = pref.into();
        self.map.insert(pref.clone(), value.clone());
        self.vals.push((pref, value));
    }

    /// Exact match on `pref` without moving the cursor, or the next value in
    /// round-robin order. The cursor is shared across all fallback picks.
    pub fn pick(&mut self, pref: &str) -> Result<&V, NatError> {
        if self.vals.is_empty() {
            return Err(NatError::EmptyCollection);
        }

        if let Some(value) = self.map.get(pref) {
            return Ok(value);
        }
        let idx = self.next % self.vals.len();
        self.next += 1;
        Ok(&self.vals[idx].1)
    }

    /// Every registration in insertion order, duplicates included
    pub fn values(&self) -> &[(String, V)] {
        &self.vals
    }

    pub fn len(&self) -> usize {
        self.vals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(entries: &[(&str, u32)]) -> PrefSet<u32> {
        let mut s = PrefSet::new();
        for (k, v) in entries {
            s.add(*k, *v);
        }
        s
    }

    #[test]
    fn pick_on_empty_set_fails() {
        let mut s: PrefSet<u32> = PrefSet::new();
        assert!(matches!(s.pick("us-east-1a"), Err(NatError::EmptyCollection)));
        assert!(matches!(s.pick(""), Err(NatError::EmptyCollection)));
    }

    #[test]
    fn exact_match_returns_registered_value() {
        let mut s = set(&[("a", 1), ("b", 2)]);
        assert_eq!(*s.pick("b").unwrap(), 2);
        assert_eq!(*s.pick("a").unwrap(), 1);
        assert_eq!(*s.pick("b").unwrap(), 2);
    }

    #[test]
    fn duplicate_key_is_last_write_wins_but_kept_in_values() {
        let mut s = set(&[("a", 1), ("b", 2), ("a", 3)]);
        assert_eq!(*s.pick("a").unwrap(), 3);
        let keys: Vec<_> = s.values().iter().map(|(k, v)| (k.as_str(), *v)).collect();
        assert_eq!(keys, vec![("a", 1), ("b", 2), ("a", 3)]);
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn fallback_cycles_through_every_registration_in_order() {
        let mut s = set(&[("a", 1), ("b", 2), ("a", 3)]);
        let first: Vec<_> = (0..3).map(|_| *s.pick("z").unwrap()).collect();
        let second: Vec<_> = (0..3).map(|_| *s.pick("y").unwrap()).collect();
        assert_eq!(first, vec![1, 2, 3]);
        assert_eq!(second, first);
    }

    #[test]
    fn exact_matches_do_not_move_the_cursor() {
        let mut s = set(&[("a", 1), ("b", 2), ("c", 3)]);
        assert_eq!(*s.pick("x").unwrap(), 1);
        assert_eq!(*s.pick("a").unwrap(), 1);
        assert_eq!(*s.pick("c").unwrap(), 3);
        assert_eq!(*s.pick("y").unwrap(), 2);
        assert_eq!(*s.pick("b").unwrap(), 2);
        assert_eq!(*s.pick("z").unwrap(), 3);
        assert_eq!(*s.pick("x").unwrap(), 1);
    }

    #[test]
    fn single_registration_serves_every_zone() {
        let mut s = set(&[("a", 7)]);
        for zone in ["a", "b", "c", "d"] {
            assert_eq!(*s.pick(zone).unwrap(), 7);
        }
    }
}
