use std::hash::Hash;

/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
pub type Set<S> = fxhash::FxHashSet<S>;
/// Type alias for maps, we use this to hide which type of `HashMap` we are actually using.
pub type Map<K, V> = fxhash::FxHashMap<K, V>;
/// A map that remembers the order in which its keys were inserted. Iteration order over
/// states must be reproducible, which is why the automaton stores its states in one of these.
pub type OrderedMap<K, V> = indexmap::IndexMap<K, V, fxhash::FxBuildHasher>;

/// Groups the given `(key, value)` pairs by key, preserving the order in which keys are
/// first seen and the order of the values within each group.
pub fn group_ordered<K, V, I>(iter: I) -> OrderedMap<K, Vec<V>>
where
    K: Hash + Eq,
    I: IntoIterator<Item = (K, V)>,
{
    let mut map = OrderedMap::default();
    for (key, value) in iter {
        map.entry(key).or_insert_with(Vec::new).push(value);
    }
    map
}

#[cfg(test)]
mod tests {
    #[test]
    fn grouping_keeps_first_seen_order() {
        let grouped = super::group_ordered([('b', 1), ('a', 2), ('b', 3)]);
        let keys: Vec<_> = grouped.keys().copied().collect();
        assert_eq!(keys, vec!['b', 'a']);
        assert_eq!(grouped[&'b'], vec![1, 3]);
    }
}
