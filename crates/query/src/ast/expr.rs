//! Expression AST definitions.

use core::fmt;
use std::ops;
use strata_core::{DataType, Value};

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    /// Returns true for `Eq Ne Lt Le Gt Ge`.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    /// Returns true for `And Or`.
    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    /// Returns true for `Add Sub Mul Div Mod`.
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }

    fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
    IsNull,
    IsNotNull,
}

/// Row-wise scalar functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarFunc {
    Abs,
    Sqrt,
    /// Natural logarithm.
    Log,
    Exp,
    /// Round half away from zero.
    Round,
    Upper,
    Lower,
    /// Length of a string in characters.
    StrLen,
}

impl ScalarFunc {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarFunc::Abs => "abs",
            ScalarFunc::Sqrt => "sqrt",
            ScalarFunc::Log => "log",
            ScalarFunc::Exp => "exp",
            ScalarFunc::Round => "round",
            ScalarFunc::Upper => "upper",
            ScalarFunc::Lower => "lower",
            ScalarFunc::StrLen => "str_len",
        }
    }
}

/// Aggregate functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggregateFunc {
    /// Number of non-missing values.
    Count,
    /// Number of rows, missing values included.
    Len,
    Sum,
    Mean,
    Min,
    Max,
    First,
    Last,
    /// Number of distinct values, missing counted once.
    NUnique,
    /// Sample standard deviation.
    Std,
}

impl AggregateFunc {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunc::Count => "count",
            AggregateFunc::Len => "len",
            AggregateFunc::Sum => "sum",
            AggregateFunc::Mean => "mean",
            AggregateFunc::Min => "min",
            AggregateFunc::Max => "max",
            AggregateFunc::First => "first",
            AggregateFunc::Last => "last",
            AggregateFunc::NUnique => "n_unique",
            AggregateFunc::Std => "std",
        }
    }
}

/// Sort order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Expression AST node.
///
/// Expressions are immutable trees. Building one performs no work; they are
/// evaluated against a table by the executor.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Column reference by name.
    Column(String),
    /// Literal value.
    Literal(Value),
    /// Renames the output of an expression.
    Alias { expr: Box<Expr>, name: String },
    /// Binary operation.
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// Unary operation.
    UnaryOp { op: UnaryOp, expr: Box<Expr> },
    /// Scalar function call.
    Function { func: ScalarFunc, expr: Box<Expr> },
    /// Type conversion.
    Cast { expr: Box<Expr>, data_type: DataType },
    /// Aggregate function. `expr` is `None` only for `len()`.
    Aggregate {
        func: AggregateFunc,
        expr: Option<Box<Expr>>,
    },
}

/// Creates a column reference expression.
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// Creates a literal expression.
pub fn lit(value: impl Into<Value>) -> Expr {
    Expr::Literal(value.into())
}

/// Counts rows, missing values included.
pub fn len() -> Expr {
    Expr::Aggregate {
        func: AggregateFunc::Len,
        expr: None,
    }
}

impl Expr {
    fn binary(self, op: BinaryOp, right: Expr) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    fn unary(self, op: UnaryOp) -> Expr {
        Expr::UnaryOp {
            op,
            expr: Box::new(self),
        }
    }

    fn function(self, func: ScalarFunc) -> Expr {
        Expr::Function {
            func,
            expr: Box::new(self),
        }
    }

    fn aggregate(self, func: AggregateFunc) -> Expr {
        Expr::Aggregate {
            func,
            expr: Some(Box::new(self)),
        }
    }

    /// Creates an equality expression.
    pub fn eq(self, right: Expr) -> Expr {
        self.binary(BinaryOp::Eq, right)
    }

    /// Creates a not-equal expression.
    pub fn ne(self, right: Expr) -> Expr {
        self.binary(BinaryOp::Ne, right)
    }

    /// Creates a less-than expression.
    pub fn lt(self, right: Expr) -> Expr {
        self.binary(BinaryOp::Lt, right)
    }

    /// Creates a less-than-or-equal expression.
    pub fn le(self, right: Expr) -> Expr {
        self.binary(BinaryOp::Le, right)
    }

    /// Creates a greater-than expression.
    pub fn gt(self, right: Expr) -> Expr {
        self.binary(BinaryOp::Gt, right)
    }

    /// Creates a greater-than-or-equal expression.
    pub fn ge(self, right: Expr) -> Expr {
        self.binary(BinaryOp::Ge, right)
    }

    /// Creates an AND expression.
    pub fn and(self, right: Expr) -> Expr {
        self.binary(BinaryOp::And, right)
    }

    /// Creates an OR expression.
    pub fn or(self, right: Expr) -> Expr {
        self.binary(BinaryOp::Or, right)
    }

    /// Creates a NOT expression.
    pub fn not(self) -> Expr {
        self.unary(UnaryOp::Not)
    }

    /// Creates an IS NULL expression.
    pub fn is_null(self) -> Expr {
        self.unary(UnaryOp::IsNull)
    }

    /// Creates an IS NOT NULL expression.
    pub fn is_not_null(self) -> Expr {
        self.unary(UnaryOp::IsNotNull)
    }

    /// Names the output of this expression.
    pub fn alias(self, name: impl Into<String>) -> Expr {
        Expr::Alias {
            expr: Box::new(self),
            name: name.into(),
        }
    }

    /// Converts the result to `data_type`.
    pub fn cast(self, data_type: DataType) -> Expr {
        Expr::Cast {
            expr: Box::new(self),
            data_type,
        }
    }

    pub fn abs(self) -> Expr {
        self.function(ScalarFunc::Abs)
    }

    pub fn sqrt(self) -> Expr {
        self.function(ScalarFunc::Sqrt)
    }

    /// Natural logarithm.
    pub fn log(self) -> Expr {
        self.function(ScalarFunc::Log)
    }

    pub fn exp(self) -> Expr {
        self.function(ScalarFunc::Exp)
    }

    pub fn round(self) -> Expr {
        self.function(ScalarFunc::Round)
    }

    pub fn upper(self) -> Expr {
        self.function(ScalarFunc::Upper)
    }

    pub fn lower(self) -> Expr {
        self.function(ScalarFunc::Lower)
    }

    pub fn str_len(self) -> Expr {
        self.function(ScalarFunc::StrLen)
    }

    /// Creates a COUNT aggregate over non-missing values.
    pub fn count(self) -> Expr {
        self.aggregate(AggregateFunc::Count)
    }

    /// Creates a SUM aggregate.
    pub fn sum(self) -> Expr {
        self.aggregate(AggregateFunc::Sum)
    }

    /// Creates a MEAN aggregate.
    pub fn mean(self) -> Expr {
        self.aggregate(AggregateFunc::Mean)
    }

    /// Creates a MIN aggregate.
    pub fn min(self) -> Expr {
        self.aggregate(AggregateFunc::Min)
    }

    /// Creates a MAX aggregate.
    pub fn max(self) -> Expr {
        self.aggregate(AggregateFunc::Max)
    }

    pub fn first(self) -> Expr {
        self.aggregate(AggregateFunc::First)
    }

    pub fn last(self) -> Expr {
        self.aggregate(AggregateFunc::Last)
    }

    pub fn n_unique(self) -> Expr {
        self.aggregate(AggregateFunc::NUnique)
    }

    /// Sample standard deviation.
    pub fn std(self) -> Expr {
        self.aggregate(AggregateFunc::Std)
    }

    /// Returns the name of the column this expression produces.
    ///
    /// An alias wins; otherwise the name of the leftmost column reference.
    pub fn output_name(&self) -> String {
        match self {
            Expr::Column(name) => name.clone(),
            Expr::Literal(_) => "literal".into(),
            Expr::Alias { name, .. } => name.clone(),
            Expr::BinaryOp { left, .. } => left.output_name(),
            Expr::UnaryOp { expr, .. }
            | Expr::Function { expr, .. }
            | Expr::Cast { expr, .. } => expr.output_name(),
            Expr::Aggregate { expr: Some(expr), .. } => expr.output_name(),
            Expr::Aggregate { func, expr: None } => func.name().into(),
        }
    }

    /// Returns the distinct column names this expression reads, in first-seen order.
    pub fn referenced_columns(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns(&self, out: &mut Vec<String>) {
        match self {
            Expr::Column(name) => {
                if !out.iter().any(|c| c == name) {
                    out.push(name.clone());
                }
            }
            Expr::Literal(_) => {}
            Expr::BinaryOp { left, right, .. } => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
            Expr::Alias { expr, .. }
            | Expr::UnaryOp { expr, .. }
            | Expr::Function { expr, .. }
            | Expr::Cast { expr, .. } => expr.collect_columns(out),
            Expr::Aggregate { expr, .. } => {
                if let Some(e) = expr {
                    e.collect_columns(out);
                }
            }
        }
    }

    /// Returns true if any node of this expression is an aggregate.
    pub fn has_aggregate(&self) -> bool {
        match self {
            Expr::Aggregate { .. } => true,
            Expr::Column(_) | Expr::Literal(_) => false,
            Expr::BinaryOp { left, right, .. } => left.has_aggregate() || right.has_aggregate(),
            Expr::Alias { expr, .. }
            | Expr::UnaryOp { expr, .. }
            | Expr::Function { expr, .. }
            | Expr::Cast { expr, .. } => expr.has_aggregate(),
        }
    }

    /// Returns the expression under any aliases.
    pub fn strip_alias(&self) -> &Expr {
        match self {
            Expr::Alias { expr, .. } => expr.strip_alias(),
            other => other,
        }
    }

    /// Returns the column name if this is a bare column reference (aliases allowed).
    pub fn as_column(&self) -> Option<&str> {
        match self.strip_alias() {
            Expr::Column(name) => Some(name),
            _ => None,
        }
    }

    /// Splits an (optionally aliased) aggregate into its function and input.
    ///
    /// Returns `None` if the expression under its aliases is not an aggregate.
    pub fn as_aggregate(&self) -> Option<(AggregateFunc, Option<&Expr>)> {
        match self.strip_alias() {
            Expr::Aggregate { func, expr } => Some((*func, expr.as_deref())),
            _ => None,
        }
    }

    /// Returns true if the expression contains no column reference or aggregate.
    pub fn is_constant(&self) -> bool {
        !self.has_aggregate() && self.referenced_columns().is_empty()
    }
}

impl ops::Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Add, rhs)
    }
}

impl ops::Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Sub, rhs)
    }
}

impl ops::Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Mul, rhs)
    }
}

impl ops::Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Div, rhs)
    }
}

impl ops::Rem for Expr {
    type Output = Expr;

    fn rem(self, rhs: Expr) -> Expr {
        self.binary(BinaryOp::Mod, rhs)
    }
}

impl ops::Neg for Expr {
    type Output = Expr;

    fn neg(self) -> Expr {
        self.unary(UnaryOp::Neg)
    }
}

impl ops::Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        self.unary(UnaryOp::Not)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => write!(f, "col(\"{}\")", name),
            Expr::Literal(Value::String(s)) => write!(f, "\"{}\"", s),
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Alias { expr, name } => write!(f, "{}.alias(\"{}\")", expr, name),
            Expr::BinaryOp { left, op, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expr::UnaryOp { op, expr } => match op {
                UnaryOp::Not => write!(f, "not({})", expr),
                UnaryOp::Neg => write!(f, "-({})", expr),
                UnaryOp::IsNull => write!(f, "{}.is_null()", expr),
                UnaryOp::IsNotNull => write!(f, "{}.is_not_null()", expr),
            },
            Expr::Function { func, expr } => write!(f, "{}.{}()", expr, func.name()),
            Expr::Cast { expr, data_type } => write!(f, "{}.cast({})", expr, data_type),
            Expr::Aggregate {
                func,
                expr: Some(expr),
            } => write!(f, "{}.{}()", expr, func.name()),
            Expr::Aggregate { func, expr: None } => write!(f, "{}()", func.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_builders() {
        let e = col("Electric Range").lt(lit(100i64));
        assert!(matches!(e, Expr::BinaryOp { op: BinaryOp::Lt, .. }));

        let lit_expr = lit(42i64);
        assert!(matches!(lit_expr, Expr::Literal(Value::Int64(42))));

        let arith = col("a") * lit(2i64) + col("b");
        assert!(matches!(arith, Expr::BinaryOp { op: BinaryOp::Add, .. }));
    }

    #[test]
    fn test_output_name() {
        assert_eq!(col("a").output_name(), "a");
        assert_eq!((col("a") + col("b")).output_name(), "a");
        assert_eq!(col("b").sum().output_name(), "b");
        assert_eq!(col("a").lt(lit(1i64)).alias("flag").output_name(), "flag");
        assert_eq!(len().output_name(), "len");
        assert_eq!(lit(1i64).output_name(), "literal");
    }

    #[test]
    fn test_referenced_columns() {
        let e = (col("a") + col("b")).gt(col("a")).and(col("c").is_null());
        assert_eq!(e.referenced_columns(), vec!["a", "b", "c"]);
        assert!(lit(1i64).referenced_columns().is_empty());
        assert!(len().referenced_columns().is_empty());
    }

    #[test]
    fn test_has_aggregate() {
        assert!(col("a").sum().alias("s").has_aggregate());
        assert!((col("a").sum() / col("a").count()).has_aggregate());
        assert!(!col("a").log().has_aggregate());
        assert!(lit(1i64).is_constant());
    }

    #[test]
    fn test_display() {
        let e = col("a").gt(lit(500i64));
        assert_eq!(e.to_string(), "(col(\"a\") > 500)");
        assert_eq!(
            col("b").mean().alias("b_mean").to_string(),
            "col(\"b\").mean().alias(\"b_mean\")"
        );
        assert_eq!(len().to_string(), "len()");
        assert_eq!(lit("x").to_string(), "\"x\"");
    }

    #[test]
    fn test_as_column() {
        assert_eq!(col("a").alias("b").as_column(), Some("a"));
        assert_eq!((col("a") + lit(1i64)).as_column(), None);
    }
}
