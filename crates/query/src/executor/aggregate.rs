//! Aggregate executor.
//!
//! Aggregation is built on [`Accumulator`]s: per-group states that fold
//! values one at a time and can be merged with the state of a later batch.
//! Streaming execution uses the merge only where it is exact.

use super::evaluate::evaluate_to_column;
use crate::ast::{aggregate_output_type, AggregateFunc, Expr};
use hashbrown::{HashMap, HashSet};
use strata_core::{Column, ColumnBuilder, DataType, Error, Result, Schema, Table, Value};

#[derive(Clone, Debug)]
enum AggState {
    Count(i64),
    Len(i64),
    SumInt(i128),
    SumFloat(f64),
    SumNull,
    MeanInt { sum: i128, count: i64 },
    MeanFloat { sum: f64, count: i64 },
    Min(Option<Value>),
    Max(Option<Value>),
    First(Option<Value>),
    Last(Option<Value>),
    Distinct(HashSet<Value>),
    /// Welford's running mean and sum of squared deviations.
    Std { count: i64, mean: f64, m2: f64 },
}

/// Running state of one aggregate function.
#[derive(Clone, Debug)]
pub struct Accumulator {
    state: AggState,
}

impl Accumulator {
    /// Creates an empty accumulator for `func` over values of type `input`.
    pub fn new(func: AggregateFunc, input: DataType) -> Self {
        let integral = matches!(input, DataType::Int64 | DataType::Boolean);
        let state = match func {
            AggregateFunc::Count => AggState::Count(0),
            AggregateFunc::Len => AggState::Len(0),
            AggregateFunc::Sum if integral => AggState::SumInt(0),
            AggregateFunc::Sum if input == DataType::Float64 => AggState::SumFloat(0.0),
            AggregateFunc::Sum => AggState::SumNull,
            AggregateFunc::Mean if integral => AggState::MeanInt { sum: 0, count: 0 },
            AggregateFunc::Mean => AggState::MeanFloat { sum: 0.0, count: 0 },
            AggregateFunc::Min => AggState::Min(None),
            AggregateFunc::Max => AggState::Max(None),
            AggregateFunc::First => AggState::First(None),
            AggregateFunc::Last => AggState::Last(None),
            AggregateFunc::NUnique => AggState::Distinct(HashSet::new()),
            AggregateFunc::Std => AggState::Std {
                count: 0,
                mean: 0.0,
                m2: 0.0,
            },
        };
        Self { state }
    }

    /// Returns whether partial states of `func` over `input` merge to exactly
    /// the result of a single sequential fold.
    ///
    /// Float sums, means and deviations depend on summation order and are not.
    pub fn is_mergeable(func: AggregateFunc, input: DataType) -> bool {
        match func {
            AggregateFunc::Sum | AggregateFunc::Mean => input != DataType::Float64,
            AggregateFunc::Std => false,
            _ => true,
        }
    }

    /// Folds one value. `Len` counts every call, missing values included.
    pub fn update(&mut self, value: &Value) {
        match &mut self.state {
            AggState::Len(n) => *n += 1,
            AggState::First(first) => {
                if first.is_none() {
                    *first = Some(value.clone());
                }
            }
            AggState::Last(last) => *last = Some(value.clone()),
            AggState::Distinct(seen) => {
                if !seen.contains(value) {
                    seen.insert(value.clone());
                }
            }
            _ if value.is_null() => {}
            AggState::Count(n) => *n += 1,
            AggState::SumInt(sum) => *sum += integral(value),
            AggState::SumFloat(sum) => *sum += value.to_f64().unwrap_or(0.0),
            AggState::SumNull => {}
            AggState::MeanInt { sum, count } => {
                *sum += integral(value);
                *count += 1;
            }
            AggState::MeanFloat { sum, count } => {
                *sum += value.to_f64().unwrap_or(0.0);
                *count += 1;
            }
            AggState::Min(min) => {
                if min.as_ref().map_or(true, |m| value < m) {
                    *min = Some(value.clone());
                }
            }
            AggState::Max(max) => {
                if max.as_ref().map_or(true, |m| value > m) {
                    *max = Some(value.clone());
                }
            }
            AggState::Std { count, mean, m2 } => {
                let x = value.to_f64().unwrap_or(0.0);
                *count += 1;
                let delta = x - *mean;
                *mean += delta / *count as f64;
                *m2 += delta * (x - *mean);
            }
        }
    }

    /// Folds a whole column, or `num_rows` rows when there is no input column.
    pub fn update_column(&mut self, column: Option<&Column>, num_rows: usize) {
        match column {
            Some(c) => c.iter().for_each(|v| self.update(&v)),
            None => {
                if let AggState::Len(n) = &mut self.state {
                    *n += num_rows as i64;
                } else {
                    (0..num_rows).for_each(|_| self.update(&Value::Null));
                }
            }
        }
    }

    /// Merges the state of rows that came after the rows folded into `self`.
    pub fn merge(&mut self, other: Accumulator) {
        match (&mut self.state, other.state) {
            (AggState::Count(a), AggState::Count(b)) | (AggState::Len(a), AggState::Len(b)) => {
                *a += b
            }
            (AggState::SumInt(a), AggState::SumInt(b)) => *a += b,
            (AggState::SumFloat(a), AggState::SumFloat(b)) => *a += b,
            (
                AggState::MeanInt { sum, count },
                AggState::MeanInt {
                    sum: s2,
                    count: c2,
                },
            ) => {
                *sum += s2;
                *count += c2;
            }
            (
                AggState::MeanFloat { sum, count },
                AggState::MeanFloat {
                    sum: s2,
                    count: c2,
                },
            ) => {
                *sum += s2;
                *count += c2;
            }
            (AggState::Min(a), AggState::Min(Some(b))) => {
                if a.as_ref().map_or(true, |m| b < *m) {
                    *a = Some(b);
                }
            }
            (AggState::Max(a), AggState::Max(Some(b))) => {
                if a.as_ref().map_or(true, |m| b > *m) {
                    *a = Some(b);
                }
            }
            (AggState::First(a), AggState::First(b)) => {
                if a.is_none() {
                    *a = b;
                }
            }
            (AggState::Last(a), AggState::Last(b)) => {
                if b.is_some() {
                    *a = b;
                }
            }
            (AggState::Distinct(a), AggState::Distinct(b)) => a.extend(b),
            (
                AggState::Std { count, mean, m2 },
                AggState::Std {
                    count: c2,
                    mean: mean2,
                    m2: m2b,
                },
            ) => {
                if c2 > 0 {
                    let total = *count + c2;
                    let delta = mean2 - *mean;
                    *m2 += m2b + delta * delta * (*count as f64) * (c2 as f64) / total as f64;
                    *mean += delta * c2 as f64 / total as f64;
                    *count = total;
                }
            }
            _ => {}
        }
    }

    /// Produces the aggregate value.
    pub fn finish(&self) -> Result<Value> {
        Ok(match &self.state {
            AggState::Count(n) | AggState::Len(n) => Value::Int64(*n),
            AggState::SumInt(sum) => Value::Int64(i64::try_from(*sum).map_err(|_| {
                Error::invalid_operation(format!("sum {} overflows i64", sum))
            })?),
            AggState::SumFloat(sum) => Value::Float64(*sum),
            AggState::SumNull => Value::Null,
            AggState::MeanInt { count: 0, .. } | AggState::MeanFloat { count: 0, .. } => {
                Value::Null
            }
            AggState::MeanInt { sum, count } => Value::Float64(*sum as f64 / *count as f64),
            AggState::MeanFloat { sum, count } => Value::Float64(sum / *count as f64),
            AggState::Min(v) | AggState::Max(v) | AggState::First(v) | AggState::Last(v) => {
                v.clone().unwrap_or(Value::Null)
            }
            AggState::Distinct(seen) => Value::Int64(seen.len() as i64),
            AggState::Std { count, m2, .. } => {
                if *count < 2 {
                    Value::Null
                } else {
                    Value::Float64((m2 / (*count - 1) as f64).sqrt())
                }
            }
        })
    }
}

fn integral(value: &Value) -> i128 {
    match value {
        Value::Int64(i) => *i as i128,
        Value::Boolean(b) => *b as i128,
        _ => 0,
    }
}

/// One aggregation of a group-by: function, input and output column.
#[derive(Clone, Debug)]
struct AggSpec {
    func: AggregateFunc,
    input: Option<Expr>,
    input_type: DataType,
    name: String,
    output_type: DataType,
}

/// Hash aggregation state over one or more batches.
///
/// Groups are emitted in the order their key first appeared. Without keys
/// there is exactly one group, even over zero rows.
#[derive(Clone, Debug)]
pub struct GroupedAggregation {
    keys: Vec<Expr>,
    key_fields: Vec<(String, DataType)>,
    specs: Vec<AggSpec>,
    index: HashMap<Vec<Value>, usize>,
    groups: Vec<Vec<Value>>,
    accumulators: Vec<Vec<Accumulator>>,
}

impl GroupedAggregation {
    /// Prepares an aggregation over input with `schema`.
    pub fn new(keys: &[Expr], aggs: &[Expr], schema: &Schema) -> Result<Self> {
        let mut key_fields = Vec::with_capacity(keys.len());
        for key in keys {
            if key.has_aggregate() {
                return Err(Error::invalid_schema(format!(
                    "group key '{}' contains an aggregation",
                    key
                )));
            }
            key_fields.push((key.output_name(), key.data_type(schema)?));
        }

        let mut specs = Vec::with_capacity(aggs.len());
        for agg in aggs {
            let (func, input) = agg.as_aggregate().ok_or_else(|| {
                Error::invalid_schema(format!("'{}' is not an aggregation", agg))
            })?;
            let input_type = match input {
                Some(e) => e.data_type(schema)?,
                None => DataType::Null,
            };
            specs.push(AggSpec {
                func,
                input: input.cloned(),
                input_type,
                name: agg.output_name(),
                output_type: aggregate_output_type(func, input_type)?,
            });
        }

        {
            let mut names: HashSet<&str> = HashSet::new();
            for name in key_fields
                .iter()
                .map(|(n, _)| n.as_str())
                .chain(specs.iter().map(|s| s.name.as_str()))
            {
                if !names.insert(name) {
                    return Err(Error::duplicate_column(name));
                }
            }
        }

        Ok(Self {
            keys: keys.to_vec(),
            key_fields,
            specs,
            index: HashMap::new(),
            groups: Vec::new(),
            accumulators: Vec::new(),
        })
    }

    /// Returns whether partial aggregations of consecutive batches can be
    /// merged without changing the result.
    pub fn is_mergeable(&self) -> bool {
        self.specs
            .iter()
            .all(|s| Accumulator::is_mergeable(s.func, s.input_type))
    }

    /// Returns an aggregation with the same definition and no groups.
    pub fn empty_like(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            key_fields: self.key_fields.clone(),
            specs: self.specs.clone(),
            index: HashMap::new(),
            groups: Vec::new(),
            accumulators: Vec::new(),
        }
    }

    fn new_accumulators(&self) -> Vec<Accumulator> {
        self.specs
            .iter()
            .map(|s| Accumulator::new(s.func, s.input_type))
            .collect()
    }

    fn group_index(&mut self, key: Vec<Value>) -> usize {
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.groups.len();
        let accumulators = self.new_accumulators();
        self.index.insert(key.clone(), idx);
        self.groups.push(key);
        self.accumulators.push(accumulators);
        idx
    }

    /// Folds the rows of `batch`.
    pub fn update(&mut self, batch: &Table) -> Result<()> {
        let key_columns = self
            .keys
            .iter()
            .map(|k| evaluate_to_column(k, batch))
            .collect::<Result<Vec<_>>>()?;
        let inputs = self
            .specs
            .iter()
            .map(|s| {
                s.input
                    .as_ref()
                    .map(|e| evaluate_to_column(e, batch))
                    .transpose()
            })
            .collect::<Result<Vec<_>>>()?;

        if self.keys.is_empty() {
            if batch.num_rows() > 0 || self.groups.is_empty() {
                let idx = self.group_index(Vec::new());
                for (acc, input) in self.accumulators[idx].iter_mut().zip(&inputs) {
                    acc.update_column(input.as_ref(), batch.num_rows());
                }
            }
            return Ok(());
        }

        for row in 0..batch.num_rows() {
            let key: Vec<Value> = key_columns
                .iter()
                .map(|c| c.get(row).unwrap_or(Value::Null))
                .collect();
            let idx = self.group_index(key);
            for (acc, input) in self.accumulators[idx].iter_mut().zip(&inputs) {
                match input {
                    Some(c) => acc.update(&c.get(row).unwrap_or(Value::Null)),
                    None => acc.update(&Value::Null),
                }
            }
        }
        Ok(())
    }

    /// Merges the groups of an aggregation over later rows.
    pub fn merge(&mut self, other: GroupedAggregation) {
        for (key, accumulators) in other.groups.into_iter().zip(other.accumulators) {
            let idx = self.group_index(key);
            for (acc, partial) in self.accumulators[idx].iter_mut().zip(accumulators) {
                acc.merge(partial);
            }
        }
    }

    /// Produces one row per group: keys, then aggregates.
    pub fn finish(mut self) -> Result<Table> {
        if self.keys.is_empty() && self.groups.is_empty() {
            self.group_index(Vec::new());
        }
        let num_groups = self.groups.len();

        let mut columns = Vec::with_capacity(self.key_fields.len() + self.specs.len());
        for (i, (name, data_type)) in self.key_fields.iter().enumerate() {
            let mut builder = ColumnBuilder::new(*data_type, num_groups);
            for key in &self.groups {
                builder.push(key[i].clone())?;
            }
            columns.push(builder.finish(name.as_str()));
        }
        for (j, spec) in self.specs.iter().enumerate() {
            let mut builder = ColumnBuilder::new(spec.output_type, num_groups);
            for accumulators in &self.accumulators {
                builder.push(accumulators[j].finish()?)?;
            }
            columns.push(builder.finish(spec.name.as_str()));
        }
        Table::with_row_count(columns, num_groups)
    }
}

/// Aggregate executor - groups rows and computes aggregate functions.
pub struct AggregateExecutor<'a> {
    keys: &'a [Expr],
    aggs: &'a [Expr],
}

impl<'a> AggregateExecutor<'a> {
    /// Creates a new aggregate executor.
    pub fn new(keys: &'a [Expr], aggs: &'a [Expr]) -> Self {
        Self { keys, aggs }
    }

    /// Executes the aggregation on the input table.
    pub fn execute(&self, input: &Table) -> Result<Table> {
        let mut state = GroupedAggregation::new(self.keys, self.aggs, &input.schema())?;
        state.update(input)?;
        state.finish()
    }
}
