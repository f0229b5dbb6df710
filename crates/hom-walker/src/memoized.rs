/// A value derived from `S`, recomputed only when the key extracted from
/// `S` changes.
pub struct Memoized<S, K, V> {
    version: u64,
    cached: Option<(K, V)>,
    get_key: Box<dyn Fn(&S) -> K>,
    calc: Box<dyn Fn(&S) -> V>,
}

impl<S, K, V> Memoized<S, K, V>
where
    K: PartialEq,
{
    pub fn new(
        get_key: impl Fn(&S) -> K + 'static,
        calc: impl Fn(&S) -> V + 'static,
    ) -> Self {
        Self {
            version: 0,
            cached: None,
            get_key: Box::new(get_key),
            calc: Box::new(calc),
        }
    }

    pub fn get<'a>(&'a mut self, source: &S) -> &'a V {
        self.get_mut(source)
    }

    /// Mutable access to the cached value. Edits (node positions, colours)
    /// survive until the key changes.
    pub fn get_mut<'a>(&'a mut self, source: &S) -> &'a mut V {
        let key = (self.get_key)(source);
        if self.cached.as_ref().is_some_and(|(k, _)| *k != key) {
            self.cached = None;
        }
        let calc = &self.calc;
        let version = &mut self.version;
        let (_, value) = self.cached.get_or_insert_with(|| {
            *version = version.wrapping_add(1);
            (key, calc(source))
        });
        value
    }

    /// Bumped on every recomputation.
    pub fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_recomputes_only_on_key_change() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut doubled = Memoized::new(
            |s: &(u64, i32)| s.0,
            move |s: &(u64, i32)| {
                counter.set(counter.get() + 1);
                s.1 * 2
            },
        );

        assert_eq!(*doubled.get(&(1, 4)), 8);
        assert_eq!(*doubled.get(&(1, 5)), 8);
        assert_eq!(calls.get(), 1);
        assert_eq!(doubled.version(), 1);

        assert_eq!(*doubled.get(&(2, 5)), 10);
        assert_eq!(calls.get(), 2);
        assert_eq!(doubled.version(), 2);
    }

    #[test]
    fn test_edits_survive_until_key_changes() {
        let mut cell = Memoized::new(|s: &u64| *s, |_: &u64| 0);
        *cell.get_mut(&7) = 42;
        assert_eq!(*cell.get(&7), 42);
        assert_eq!(*cell.get(&8), 0);
    }
}
