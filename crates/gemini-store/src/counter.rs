use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use gemini_typedef::OpType;

/// Counter vector keyed by (cluster system, operation type), incremented per
/// executed query. Cloning shares the underlying counters.
#[derive(Debug, Clone, Default)]
pub struct OpsCounter(Arc<Mutex<BTreeMap<(String, OpType), u64>>>);

impl OpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc(&self, system: &str, op: OpType) {
        let mut counters = self.0.lock();
        *counters.entry((system.to_owned(), op)).or_insert(0) += 1;
    }

    pub fn get(&self, system: &str, op: OpType) -> u64 {
        self.0
            .lock()
            .get(&(system.to_owned(), op))
            .copied()
            .unwrap_or(0)
    }

    /// Stable snapshot for logging at the end of a run.
    pub fn snapshot(&self) -> Vec<((String, OpType), u64)> {
        self.0
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_are_keyed_by_system_and_op() {
        let ops = OpsCounter::new();
        ops.inc("test", OpType::Insert);
        ops.inc("test", OpType::Insert);
        ops.inc("oracle", OpType::Insert);
        ops.inc("test", OpType::Select);
        assert_eq!(ops.get("test", OpType::Insert), 2);
        assert_eq!(ops.get("oracle", OpType::Insert), 1);
        assert_eq!(ops.get("test", OpType::Select), 1);
        assert_eq!(ops.get("oracle", OpType::Delete), 0);
        assert_eq!(ops.snapshot().len(), 3);
    }
}
