/// Hands out the temporaries that hold constructed nodes.
///
/// One allocator lives for exactly one transpile run, so names are
/// reproducible across runs and never shared between them.
#[derive(Debug, Clone)]
pub struct NameAllocator {
    prefix: String,
    counter: u64,
}

impl NameAllocator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
        }
    }

    pub fn next(&mut self) -> String {
        let name = format!("{}{}", self.prefix, self.counter);
        self.counter += 1;
        name
    }

    /// Number of names handed out so far.
    pub fn allocated(&self) -> u64 {
        self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sequence() {
        let mut names = NameAllocator::new("$$");
        assert_eq!(names.next(), "$$0");
        assert_eq!(names.next(), "$$1");
        assert_eq!(names.next(), "$$2");
        assert_eq!(names.allocated(), 3);
    }

    #[test]
    fn test_never_repeats() {
        let mut names = NameAllocator::new("_n");
        let seen: HashSet<String> = (0..500).map(|_| names.next()).collect();
        assert_eq!(seen.len(), 500);
    }

    #[test]
    fn test_fresh_allocators_are_independent() {
        let mut first = NameAllocator::new("$$");
        first.next();
        first.next();
        let mut second = NameAllocator::new("$$");
        assert_eq!(second.next(), "$$0");
    }
}
