/// A value paired with a revision counter that moves on every write.
///
/// Readers that derive something expensive from the value (display graphs,
/// layouts) key their caches on `revision()` instead of comparing contents.
#[derive(Debug, Clone, Default)]
pub struct Versioned<T> {
    revision: u64,
    data: T,
}

impl<T> Versioned<T> {
    pub fn new(data: T) -> Self {
        Self { revision: 0, data }
    }

    pub fn get(&self) -> &T {
        &self.data
    }

    /// Replace the value. Equal values still count as a change.
    pub fn set(&mut self, data: T) {
        self.data = data;
        self.revision += 1;
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}
