//! Expression tree for WHERE clauses and select lists.
//!
//! Expressions form a small closed union. Each node renders a SQL
//! fragment together with the parameter values it binds, in strict
//! left-to-right order. Placeholders stand in for value operands only;
//! column references, aggregates, and nested queries contribute bare SQL
//! text.

use std::fmt;

use crate::query::Query;
use crate::value::{ToValue, Value};

/// Creates an unqualified column reference.
#[must_use]
pub fn col(name: &str) -> ColumnRef {
    ColumnRef {
        table: None,
        name: String::from(name),
    }
}

/// A reference to a column, used both in select lists and in filters.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    /// Optional table qualifier.
    pub table: Option<String>,
    /// Column name.
    pub name: String,
}

impl ColumnRef {
    /// Creates a table-qualified column reference.
    #[must_use]
    pub fn qualified(table: &str, name: &str) -> Self {
        Self {
            table: Some(String::from(table)),
            name: String::from(name),
        }
    }

    /// Returns the SQL representation.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match &self.table {
            Some(t) => format!("{t}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// `column = value`
    #[must_use]
    pub fn eq<V: ToValue>(self, value: V) -> Expr {
        Expr::compare(self, CompareOp::Eq, Expr::Literal(value.to_value()))
    }

    /// `column <> value`
    #[must_use]
    pub fn ne<V: ToValue>(self, value: V) -> Expr {
        Expr::compare(self, CompareOp::Ne, Expr::Literal(value.to_value()))
    }

    /// `column < value`
    #[must_use]
    pub fn lt<V: ToValue>(self, value: V) -> Expr {
        Expr::compare(self, CompareOp::Lt, Expr::Literal(value.to_value()))
    }

    /// `column <= value`
    #[must_use]
    pub fn le<V: ToValue>(self, value: V) -> Expr {
        Expr::compare(self, CompareOp::Le, Expr::Literal(value.to_value()))
    }

    /// `column > value`
    #[must_use]
    pub fn gt<V: ToValue>(self, value: V) -> Expr {
        Expr::compare(self, CompareOp::Gt, Expr::Literal(value.to_value()))
    }

    /// `column >= value`
    #[must_use]
    pub fn ge<V: ToValue>(self, value: V) -> Expr {
        Expr::compare(self, CompareOp::Ge, Expr::Literal(value.to_value()))
    }

    /// `column IN (v1, v2, …)`
    #[must_use]
    pub fn in_values<V: ToValue>(self, values: Vec<V>) -> Expr {
        let values = values.into_iter().map(ToValue::to_value).collect();
        Expr::compare(self, CompareOp::In, Expr::List(values))
    }

    /// `column IN (SELECT …)`
    #[must_use]
    pub fn in_query(self, query: Query) -> Expr {
        Expr::compare(self, CompareOp::In, Expr::Subquery(Box::new(query)))
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (`=`)
    Eq,
    /// Less than (`<`)
    Lt,
    /// Greater than (`>`)
    Gt,
    /// Less than or equal (`<=`)
    Le,
    /// Greater than or equal (`>=`)
    Ge,
    /// Not equal (`<>`)
    Ne,
    /// Membership (`IN`)
    In,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Lt => write!(f, "<"),
            Self::Gt => write!(f, ">"),
            Self::Le => write!(f, "<="),
            Self::Ge => write!(f, ">="),
            Self::Ne => write!(f, "<>"),
            Self::In => write!(f, "IN"),
        }
    }
}

/// A composable SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A bare column reference. Contributes no parameters.
    Column(ColumnRef),
    /// A single bound value, rendered as `?`.
    Literal(Value),
    /// A parenthesized list of bound values, rendered as `(?, ?, …)`.
    List(Vec<Value>),
    /// A comparison. With no left operand the operator renders prefix.
    Comparison {
        /// Left operand, absent for the unary form.
        left: Option<Box<Expr>>,
        /// The operator.
        op: CompareOp,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Operands conjoined with `AND`.
    Conjunction(Vec<Expr>),
    /// An aggregate function call.
    Aggregate(Aggregate),
    /// A nested query, rendered parenthesized with its own parameters.
    Subquery(Box<Query>),
}

impl Expr {
    fn compare(left: ColumnRef, op: CompareOp, right: Expr) -> Self {
        Self::Comparison {
            left: Some(Box::new(Self::Column(left))),
            op,
            right: Box::new(right),
        }
    }

    /// Creates a comparison with no left operand.
    #[must_use]
    pub fn unary(op: CompareOp, right: Expr) -> Self {
        Self::Comparison {
            left: None,
            op,
            right: Box::new(right),
        }
    }

    /// Conjoins this expression with another.
    #[must_use]
    pub fn and(self, other: Expr) -> Expr {
        match self {
            Self::Conjunction(mut parts) => {
                parts.push(other);
                Self::Conjunction(parts)
            }
            first => Self::Conjunction(vec![first, other]),
        }
    }

    /// Renders the expression to a SQL fragment and its parameters.
    ///
    /// Parameters appear in the order their placeholders appear in the
    /// fragment.
    #[must_use]
    pub fn render(&self) -> (String, Vec<Value>) {
        match self {
            Self::Column(c) => (c.to_sql(), vec![]),
            Self::Literal(v) => (String::from("?"), vec![v.clone()]),
            Self::List(values) => {
                let placeholders: Vec<&str> = values.iter().map(|_| "?").collect();
                (format!("({})", placeholders.join(", ")), values.clone())
            }
            Self::Comparison { left, op, right } => {
                let (right_sql, right_params) = right.render();
                match left {
                    Some(l) => {
                        let (left_sql, mut params) = l.render();
                        params.extend(right_params);
                        (format!("{left_sql} {op} {right_sql}"), params)
                    }
                    None => (format!("{op}{right_sql}"), right_params),
                }
            }
            Self::Conjunction(parts) => {
                let mut params = vec![];
                let fragments: Vec<String> = parts
                    .iter()
                    .map(|p| {
                        let (sql, part_params) = p.render();
                        params.extend(part_params);
                        sql
                    })
                    .collect();
                (fragments.join(" AND "), params)
            }
            Self::Aggregate(agg) => (agg.to_sql(), vec![]),
            Self::Subquery(q) => {
                let (sql, params) = q.render();
                (format!("({sql})"), params)
            }
        }
    }
}

impl From<ColumnRef> for Expr {
    fn from(c: ColumnRef) -> Self {
        Self::Column(c)
    }
}

impl From<Query> for Expr {
    fn from(q: Query) -> Self {
        Self::Subquery(Box::new(q))
    }
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggFunc {
    /// COUNT
    Count,
    /// SUM
    Sum,
    /// AVG
    Avg,
    /// MIN
    Min,
    /// MAX
    Max,
}

impl fmt::Display for AggFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count => write!(f, "COUNT"),
            Self::Sum => write!(f, "SUM"),
            Self::Avg => write!(f, "AVG"),
            Self::Min => write!(f, "MIN"),
            Self::Max => write!(f, "MAX"),
        }
    }
}

/// An aggregate function over an optional column, with an optional
/// grouping column that the query builder hoists into GROUP BY.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    /// The function.
    pub func: AggFunc,
    /// Column to aggregate over; `None` renders `*`.
    pub column: Option<String>,
    /// Grouping column, if any.
    pub group_by: Option<String>,
}

impl Aggregate {
    fn new(func: AggFunc, column: Option<&str>) -> Self {
        Self {
            func,
            column: column.map(String::from),
            group_by: None,
        }
    }

    /// `COUNT(*)`
    #[must_use]
    pub fn count() -> Self {
        Self::new(AggFunc::Count, None)
    }

    /// `COUNT(column)`
    #[must_use]
    pub fn count_col(column: &str) -> Self {
        Self::new(AggFunc::Count, Some(column))
    }

    /// `SUM(column)`
    #[must_use]
    pub fn sum(column: &str) -> Self {
        Self::new(AggFunc::Sum, Some(column))
    }

    /// `AVG(column)`
    #[must_use]
    pub fn avg(column: &str) -> Self {
        Self::new(AggFunc::Avg, Some(column))
    }

    /// `MIN(column)`
    #[must_use]
    pub fn min(column: &str) -> Self {
        Self::new(AggFunc::Min, Some(column))
    }

    /// `MAX(column)`
    #[must_use]
    pub fn max(column: &str) -> Self {
        Self::new(AggFunc::Max, Some(column))
    }

    /// Attaches a grouping column.
    #[must_use]
    pub fn per(mut self, column: &str) -> Self {
        self.group_by = Some(String::from(column));
        self
    }

    /// Returns the SQL representation of the function call.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match &self.column {
            Some(c) => format!("{}({c})", self.func),
            None => format!("{}(*)", self.func),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_eq() {
        let (sql, params) = col("status").eq("active").render();
        assert_eq!(sql, "status = ?");
        assert_eq!(params, vec![Value::Text(String::from("active"))]);
    }

    #[test]
    fn comparison_operators() {
        assert_eq!(col("age").gt(18).render().0, "age > ?");
        assert_eq!(col("age").le(65).render().0, "age <= ?");
        assert_eq!(col("age").ne(0).render().0, "age <> ?");
    }

    #[test]
    fn in_values_renders_placeholder_per_value() {
        let (sql, params) = col("status").in_values(vec!["active", "pending"]).render();
        assert_eq!(sql, "status IN (?, ?)");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn conjunction_params_are_left_to_right() {
        let expr = col("a").eq(1).and(col("b").eq(2)).and(col("c").eq(3));
        let (sql, params) = expr.render();
        assert_eq!(sql, "a = ? AND b = ? AND c = ?");
        assert_eq!(params, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn unary_comparison_renders_prefix() {
        let expr = Expr::unary(CompareOp::In, Expr::List(vec![Value::Int(1)]));
        assert_eq!(expr.render().0, "IN(?)");
    }

    #[test]
    fn aggregate_sql() {
        assert_eq!(Aggregate::count().to_sql(), "COUNT(*)");
        assert_eq!(Aggregate::sum("price").to_sql(), "SUM(price)");
        assert_eq!(Aggregate::count_col("id").to_sql(), "COUNT(id)");
    }

    #[test]
    fn qualified_column() {
        let (sql, _) = ColumnRef::qualified("album", "title").eq("Hot Pink").render();
        assert_eq!(sql, "album.title = ?");
    }

    #[test]
    fn injection_stays_parameterized() {
        let malicious = "'; DROP TABLE artist; --";
        let (sql, params) = col("name").eq(malicious).render();
        assert_eq!(sql, "name = ?");
        assert!(matches!(&params[0], Value::Text(s) if s == malicious));
    }
}
