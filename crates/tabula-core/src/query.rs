//! Immutable SELECT/DELETE statement builder.
//!
//! A [`Query`] is a value object: every clause-adding method borrows the
//! query and returns a new one, so a query held by the caller is never
//! changed behind its back. Rendering produces the SQL text and the
//! parameter sequence as parallel artifacts; the number of `?`
//! placeholders in the text always equals the number of parameters, in
//! the same left-to-right order.

use std::fmt;
use std::ops::Bound;
use std::ops::RangeBounds;

use crate::expr::{Aggregate, ColumnRef, Expr};
use crate::value::Value;

/// Order direction for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order (ASC)
    Asc,
    /// Descending order (DESC)
    Desc,
}

/// An ordering specification.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    /// Column to order by.
    pub column: String,
    /// Order direction.
    pub direction: OrderDirection,
}

impl OrderBy {
    /// Creates an ascending order specification.
    #[must_use]
    pub fn asc(column: &str) -> Self {
        Self {
            column: String::from(column),
            direction: OrderDirection::Asc,
        }
    }

    /// Creates a descending order specification.
    #[must_use]
    pub fn desc(column: &str) -> Self {
        Self {
            column: String::from(column),
            direction: OrderDirection::Desc,
        }
    }

    /// Parses an order specification; prefix with `-` for descending.
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        match spec.strip_prefix('-') {
            Some(column) => Self::desc(column),
            None => Self::asc(spec),
        }
    }

    /// Returns the SQL representation.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self.direction {
            OrderDirection::Asc => format!("{} ASC", self.column),
            OrderDirection::Desc => format!("{} DESC", self.column),
        }
    }
}

/// One entry of a select list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// A plain column.
    Column(ColumnRef),
    /// An aggregate function call.
    Aggregate(Aggregate),
}

impl SelectItem {
    /// Returns the SQL representation.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Column(c) => c.to_sql(),
            Self::Aggregate(a) => a.to_sql(),
        }
    }
}

impl From<ColumnRef> for SelectItem {
    fn from(c: ColumnRef) -> Self {
        Self::Column(c)
    }
}

impl From<Aggregate> for SelectItem {
    fn from(a: Aggregate) -> Self {
        Self::Aggregate(a)
    }
}

impl From<&str> for SelectItem {
    fn from(name: &str) -> Self {
        Self::Column(crate::expr::col(name))
    }
}

/// An immutable accumulation of query clauses over one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    table: String,
    columns: Vec<SelectItem>,
    filters: Vec<Expr>,
    order_by: Vec<OrderBy>,
    distinct: bool,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Query {
    /// Creates a whole-row query over a table.
    #[must_use]
    pub fn new(table: &str) -> Self {
        Self {
            table: String::from(table),
            columns: vec![],
            filters: vec![],
            order_by: vec![],
            distinct: false,
            limit: None,
            offset: None,
        }
    }

    /// Returns the target table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns whether the select list has been narrowed.
    #[must_use]
    pub fn is_projected(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Adds a WHERE filter. Filters are conjoined with `AND`.
    #[must_use]
    pub fn filter(&self, expr: Expr) -> Self {
        let mut q = self.clone();
        q.filters.push(expr);
        q
    }

    /// Narrows the select list, changing the result shape from whole
    /// rows to the given column/aggregate tuple.
    #[must_use]
    pub fn project<I, T>(&self, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SelectItem>,
    {
        let mut q = self.clone();
        q.columns.extend(items.into_iter().map(Into::into));
        q
    }

    /// Adds an ordering; prefix the column with `-` for descending.
    #[must_use]
    pub fn order_by(&self, spec: &str) -> Self {
        let mut q = self.clone();
        q.order_by.push(OrderBy::parse(spec));
        q
    }

    /// Makes the query return distinct rows.
    #[must_use]
    pub fn distinct(&self) -> Self {
        let mut q = self.clone();
        q.distinct = true;
        q
    }

    /// Sets the LIMIT clause.
    #[must_use]
    pub fn limit(&self, n: u64) -> Self {
        let mut q = self.clone();
        q.limit = Some(n);
        q
    }

    /// Sets the OFFSET, rendered through the `LIMIT offset, …` form.
    #[must_use]
    pub fn offset(&self, n: u64) -> Self {
        let mut q = self.clone();
        q.offset = Some(n);
        q
    }

    /// Applies a row range: `offset = start`, `limit = end - start`.
    ///
    /// Open-ended ranges leave the corresponding clause unset, so
    /// `2..` keeps an unbounded limit and `..5` keeps a zero offset.
    #[must_use]
    pub fn slice<R: RangeBounds<u64>>(&self, range: R) -> Self {
        let start = match range.start_bound() {
            Bound::Included(s) => Some(*s),
            Bound::Excluded(s) => Some(s + 1),
            Bound::Unbounded => None,
        };
        let end = match range.end_bound() {
            Bound::Included(e) => Some(e + 1),
            Bound::Excluded(e) => Some(*e),
            Bound::Unbounded => None,
        };
        let mut q = self.clone();
        q.offset = start;
        q.limit = end.map(|e| e.saturating_sub(start.unwrap_or(0)));
        q
    }

    /// Returns the COUNT(*) form of this query: same table and filters,
    /// projected through the aggregate builder.
    #[must_use]
    pub fn count_query(&self) -> Self {
        Self {
            table: self.table.clone(),
            columns: vec![SelectItem::Aggregate(Aggregate::count())],
            filters: self.filters.clone(),
            order_by: vec![],
            distinct: false,
            limit: None,
            offset: None,
        }
    }

    /// Renders the WHERE clause, if any filters are present.
    #[must_use]
    pub fn render_where(&self) -> Option<(String, Vec<Value>)> {
        if self.filters.is_empty() {
            return None;
        }
        let mut params = vec![];
        let fragments: Vec<String> = self
            .filters
            .iter()
            .map(|f| {
                let (sql, filter_params) = f.render();
                params.extend(filter_params);
                sql
            })
            .collect();
        Some((fragments.join(" AND "), params))
    }

    /// Renders the complete SELECT statement and its parameters.
    #[must_use]
    pub fn render(&self) -> (String, Vec<Value>) {
        let mut sql = String::from("SELECT ");
        let mut params = vec![];

        if self.distinct {
            sql.push_str("DISTINCT ");
        }

        if self.columns.is_empty() {
            sql.push('*');
        } else {
            let items: Vec<String> = self.columns.iter().map(SelectItem::to_sql).collect();
            sql.push_str(&items.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        if let Some((where_sql, where_params)) = self.render_where() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
            params.extend(where_params);
        }

        let group_by = self.hoisted_group_columns();
        if !group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&group_by.join(", "));
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            let parts: Vec<String> = self.order_by.iter().map(OrderBy::to_sql).collect();
            sql.push_str(&parts.join(", "));
        }

        match (self.offset, self.limit) {
            (Some(offset), Some(limit)) => sql.push_str(&format!(" LIMIT {offset}, {limit}")),
            (Some(offset), None) => sql.push_str(&format!(" LIMIT {offset}, -1")),
            (None, Some(limit)) => sql.push_str(&format!(" LIMIT {limit}")),
            (None, None) => {}
        }

        (sql, params)
    }

    /// Renders only the SQL text.
    #[must_use]
    pub fn render_sql(&self) -> String {
        self.render().0
    }

    /// Renders only the parameter sequence, in placeholder order.
    #[must_use]
    pub fn render_params(&self) -> Vec<Value> {
        self.render().1
    }

    /// Renders the DELETE form of this query: same table and filters.
    #[must_use]
    pub fn render_delete(&self) -> (String, Vec<Value>) {
        let mut sql = String::from("DELETE FROM ");
        let mut params = vec![];
        sql.push_str(&self.table);
        if let Some((where_sql, where_params)) = self.render_where() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
            params.extend(where_params);
        }
        (sql, params)
    }

    /// Grouping columns hoisted from aggregates in the select list, in
    /// order of first appearance.
    fn hoisted_group_columns(&self) -> Vec<String> {
        let mut group_by: Vec<String> = vec![];
        for item in &self.columns {
            if let SelectItem::Aggregate(agg) = item {
                if let Some(g) = &agg.group_by {
                    if !group_by.iter().any(|existing| existing == g) {
                        group_by.push(g.clone());
                    }
                }
            }
        }
        group_by
    }
}

/// Debug expansion: the SQL with parameters inlined as literals.
impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sql, params) = self.render();
        let mut params = params.iter();
        for ch in sql.chars() {
            if ch == '?' {
                match params.next() {
                    Some(v) => f.write_str(&v.to_literal())?,
                    None => f.write_str("?")?,
                }
            } else {
                write!(f, "{ch}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::col;
    use crate::value::Value;

    #[test]
    fn bare_select() {
        let q = Query::new("artist");
        assert_eq!(q.render_sql(), "SELECT * FROM artist");
        assert!(q.render_params().is_empty());
    }

    #[test]
    fn filters_conjoin_with_and() {
        let q = Query::new("artist")
            .filter(col("first_name").eq("Mario"))
            .filter(col("id").gt(10));
        let (sql, params) = q.render();
        assert_eq!(sql, "SELECT * FROM artist WHERE first_name = ? AND id > ?");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn builder_calls_leave_the_original_unchanged() {
        let q = Query::new("artist").filter(col("id").eq(1));
        let before = q.render();
        let _ = q.filter(col("id").eq(2));
        let _ = q.order_by("-id");
        let _ = q.limit(3);
        let _ = q.project(["first_name"]);
        let _ = q.distinct();
        assert_eq!(q.render(), before);
    }

    #[test]
    fn placeholder_count_matches_param_count() {
        let sub = Query::new("artist")
            .project(["id"])
            .filter(col("birthday").ne("1995-10-21"));
        let q = Query::new("album")
            .filter(col("artist").in_query(sub))
            .filter(col("title").eq("Hot Pink"))
            .order_by("title");
        let (sql, params) = q.render();
        let placeholders = sql.matches('?').count();
        assert_eq!(placeholders, params.len());
        assert_eq!(
            sql,
            "SELECT * FROM album WHERE artist IN (SELECT id FROM artist \
             WHERE birthday <> ?) AND title = ? ORDER BY title ASC"
        );
        assert_eq!(
            params,
            vec![
                Value::Text(String::from("1995-10-21")),
                Value::Text(String::from("Hot Pink")),
            ]
        );
    }

    #[test]
    fn limit_offset_forms() {
        let q = Query::new("artist");
        assert_eq!(q.limit(5).render_sql(), "SELECT * FROM artist LIMIT 5");
        assert_eq!(q.offset(3).render_sql(), "SELECT * FROM artist LIMIT 3, -1");
        assert_eq!(
            q.offset(3).limit(5).render_sql(),
            "SELECT * FROM artist LIMIT 3, 5"
        );
    }

    #[test]
    fn slice_sets_offset_and_limit() {
        let q = Query::new("artist");
        assert_eq!(q.slice(2..7).render_sql(), "SELECT * FROM artist LIMIT 2, 5");
        assert_eq!(q.slice(..5).render_sql(), "SELECT * FROM artist LIMIT 5");
        assert_eq!(q.slice(2..).render_sql(), "SELECT * FROM artist LIMIT 2, -1");
    }

    #[test]
    fn nth_equivalent_slice_renders_single_row_window() {
        let q = Query::new("artist");
        assert_eq!(q.slice(5..6).render_sql(), "SELECT * FROM artist LIMIT 5, 1");
    }

    #[test]
    fn projection_narrows_select_list() {
        let q = Query::new("artist").project(["first_name", "last_name"]);
        assert_eq!(q.render_sql(), "SELECT first_name, last_name FROM artist");
    }

    #[test]
    fn distinct_renders_before_columns() {
        let q = Query::new("album").project(["artist"]).distinct();
        assert_eq!(q.render_sql(), "SELECT DISTINCT artist FROM album");
    }

    #[test]
    fn aggregate_group_column_is_hoisted() {
        let q = Query::new("album").project([
            SelectItem::from(col("artist")),
            SelectItem::from(Aggregate::count().per("artist")),
        ]);
        assert_eq!(
            q.render_sql(),
            "SELECT artist, COUNT(*) FROM album GROUP BY artist"
        );
    }

    #[test]
    fn count_query_goes_through_the_builder() {
        let q = Query::new("artist")
            .filter(col("last_name").eq("Cat"))
            .order_by("-id")
            .limit(10);
        let (sql, params) = q.count_query().render();
        assert_eq!(sql, "SELECT COUNT(*) FROM artist WHERE last_name = ?");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn delete_renders_table_and_filters_only() {
        let q = Query::new("artist").filter(col("last_name").eq("Peach"));
        let (sql, params) = q.render_delete();
        assert_eq!(sql, "DELETE FROM artist WHERE last_name = ?");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn display_inlines_literals() {
        let q = Query::new("artist").filter(col("birthday").eq("1000-01-01"));
        assert_eq!(
            q.to_string(),
            "SELECT * FROM artist WHERE birthday = '1000-01-01'"
        );
    }

    #[test]
    fn order_by_parse_directions() {
        assert_eq!(OrderBy::parse("-id").direction, OrderDirection::Desc);
        assert_eq!(OrderBy::parse("title").direction, OrderDirection::Asc);
    }
}
