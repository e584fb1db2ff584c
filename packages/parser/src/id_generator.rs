/// Sequential ID generator for document nodes.
///
/// IDs are local to a single parse call: two parses of identical text yield
/// identical ID sequences, but IDs are not stable across independent edits
/// unless tracked by a session.
#[derive(Clone, Default)]
pub struct IdGenerator {
    count: u32,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { count: 0 }
    }

    /// Generate the next sequential node ID
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("node-{}", self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let mut gen = IdGenerator::new();

        assert_eq!(gen.new_id(), "node-1");
        assert_eq!(gen.new_id(), "node-2");
        assert_eq!(gen.new_id(), "node-3");
    }

    #[test]
    fn test_fresh_generators_repeat_sequences() {
        let mut a = IdGenerator::new();
        let mut b = IdGenerator::new();

        assert_eq!(a.new_id(), b.new_id());
        assert_eq!(a.new_id(), b.new_id());
    }
}
