//! Limit executor.

use strata_core::Table;

/// Limit executor - keeps the first `n` rows.
pub struct LimitExecutor {
    n: usize,
}

impl LimitExecutor {
    /// Creates a new limit executor.
    pub fn new(n: usize) -> Self {
        Self { n }
    }

    /// Executes the limit on the input table.
    pub fn execute(&self, input: &Table) -> Table {
        input.slice(0, self.n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::Column;

    #[test]
    fn test_limit_executor() {
        let table = Table::new(vec![Column::new("a", vec![1i64, 2, 3]).unwrap()]).unwrap();
        assert_eq!(LimitExecutor::new(2).execute(&table).num_rows(), 2);
        assert_eq!(LimitExecutor::new(10).execute(&table).num_rows(), 3);
        assert_eq!(LimitExecutor::new(0).execute(&table).num_rows(), 0);
    }
}
