//! Sort executor.

use super::evaluate::evaluate_to_column;
use crate::ast::{Expr, SortOrder};
use core::cmp::Ordering;
use strata_core::{Result, Table, Value};

/// Sort executor - stable sort by one or more keys.
///
/// Missing values sort first in ascending order and last in descending order.
pub struct SortExecutor<'a> {
    by: &'a [(Expr, SortOrder)],
}

impl<'a> SortExecutor<'a> {
    /// Creates a new sort executor.
    pub fn new(by: &'a [(Expr, SortOrder)]) -> Self {
        Self { by }
    }

    /// Executes the sort on the input table.
    pub fn execute(&self, input: &Table) -> Result<Table> {
        let keys: Vec<(Vec<Value>, SortOrder)> = self
            .by
            .iter()
            .map(|(expr, order)| {
                let column = evaluate_to_column(expr, input)?;
                Ok((column.iter().collect(), *order))
            })
            .collect::<Result<_>>()?;

        let mut indices: Vec<usize> = (0..input.num_rows()).collect();
        indices.sort_by(|&a, &b| compare_rows(&keys, a, b));
        input.take(&indices)
    }
}

fn compare_rows(keys: &[(Vec<Value>, SortOrder)], a: usize, b: usize) -> Ordering {
    for (values, order) in keys {
        let cmp = values[a].cmp(&values[b]);
        if cmp != Ordering::Equal {
            return match order {
                SortOrder::Asc => cmp,
                SortOrder::Desc => cmp.reverse(),
            };
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::col;
    use strata_core::Column;

    fn table() -> Table {
        Table::new(vec![
            Column::new("k", vec![Some(2i64), None, Some(1), Some(2)]).unwrap(),
            Column::new("tag", vec!["a", "b", "c", "d"]).unwrap(),
        ])
        .unwrap()
    }

    fn tags(table: &Table) -> Vec<Value> {
        table.column("tag").unwrap().iter().collect()
    }

    #[test]
    fn test_sort_ascending_nulls_first_and_stable() {
        let by = [(col("k"), SortOrder::Asc)];
        let out = SortExecutor::new(&by).execute(&table()).unwrap();
        assert_eq!(
            tags(&out),
            vec!["b", "c", "a", "d"].into_iter().map(Value::from).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_sort_descending_nulls_last() {
        let by = [(col("k"), SortOrder::Desc)];
        let out = SortExecutor::new(&by).execute(&table()).unwrap();
        assert_eq!(
            tags(&out),
            vec!["a", "d", "c", "b"].into_iter().map(Value::from).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_multi_key_sort() {
        let by = [(col("k"), SortOrder::Desc), (col("tag"), SortOrder::Desc)];
        let out = SortExecutor::new(&by).execute(&table()).unwrap();
        assert_eq!(
            tags(&out),
            vec!["d", "a", "c", "b"].into_iter().map(Value::from).collect::<Vec<_>>()
        );
    }
}
