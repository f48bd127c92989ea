//! Query engine
//!
//! A query runs in two stages:
//!
//! 1. **Resolve** a [`Query`] to the matching row identifiers, in ascending
//!    identifier order.
//! 2. **Select** those rows: copy them, sort by each [`SortKey`] in turn,
//!    apply each distinct field in turn, then paginate with `start`/`limit`.
//!
//! ## Sorting
//!
//! Every sort key is applied as its own stable sort, in the order given.
//! The last key therefore decides the final order and earlier keys only
//! break its ties: `[age ASC, name ASC]` yields rows ordered by name, with
//! equal names ordered by age.
//!
//! ## Pagination
//!
//! A `start` or `limit` of `0` counts as absent. `start` alone skips rows,
//! `limit` alone keeps the first `limit` rows, both keep `limit` rows
//! beginning at `start`. Out-of-range values clamp to the result length.

use std::collections::HashSet;
use std::fmt;
use tablestore_core::{valid_fields, Row, RowId, TableDef, TableRows};

// =============================================================================
// Row selection
// =============================================================================

/// Row predicate used by [`Query::Predicate`]
pub type Predicate<'a> = Box<dyn Fn(&Row) -> bool + 'a>;

/// Which rows of a table an operation applies to
#[derive(Default)]
pub enum Query<'a> {
    /// Every row
    #[default]
    All,
    /// Rows whose fields equal the given values
    ///
    /// Keys that are not declared fields are ignored. String values match
    /// case-insensitively.
    Values(Row),
    /// Rows for which the predicate returns `true`
    Predicate(Predicate<'a>),
}

impl<'a> Query<'a> {
    /// Match every row
    pub fn all() -> Self {
        Query::All
    }

    /// Match rows by field values
    pub fn values(row: Row) -> Self {
        Query::Values(row)
    }

    /// Match rows by a predicate
    pub fn predicate(f: impl Fn(&Row) -> bool + 'a) -> Self {
        Query::Predicate(Box::new(f))
    }

    /// Identifiers of the rows in `rows` matched by this query
    pub fn resolve(&self, def: &TableDef, rows: &TableRows) -> Vec<RowId> {
        match self {
            Query::All => rows.keys().copied().collect(),
            Query::Values(wanted) => {
                let wanted = valid_fields(def, wanted);
                rows.iter()
                    .filter(|(_, row)| {
                        wanted
                            .iter()
                            .all(|(field, value)| row.get_or_null(field).matches_query(value))
                    })
                    .map(|(id, _)| *id)
                    .collect()
            }
            Query::Predicate(f) => rows
                .iter()
                .filter(|&(_, row)| f(row))
                .map(|(id, _)| *id)
                .collect(),
        }
    }
}

impl From<Row> for Query<'_> {
    fn from(row: Row) -> Self {
        Query::Values(row)
    }
}

impl fmt::Debug for Query<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::All => f.write_str("All"),
            Query::Values(row) => f.debug_tuple("Values").field(row).finish(),
            Query::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

// =============================================================================
// Sorting
// =============================================================================

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending (default)
    #[default]
    Asc,
    /// Descending
    Desc,
}

impl From<&str> for SortOrder {
    /// Exactly `"DESC"` is descending; everything else, `"desc"` included,
    /// is ascending.
    fn from(s: &str) -> Self {
        if s == "DESC" {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

/// One `[field, order]` sort instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Field to sort on
    pub field: String,
    /// Direction
    pub order: SortOrder,
}

impl SortKey {
    /// Sort key with an explicit order
    pub fn new(field: impl Into<String>, order: impl Into<SortOrder>) -> Self {
        Self {
            field: field.into(),
            order: order.into(),
        }
    }

    /// Ascending sort on `field`
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortOrder::Asc)
    }

    /// Descending sort on `field`
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortOrder::Desc)
    }

    fn apply(&self, results: &mut [Row]) {
        let field = self.field.as_str();
        match self.order {
            SortOrder::Asc => {
                results.sort_by(|a, b| a.get_or_null(field).sort_cmp(b.get_or_null(field)))
            }
            SortOrder::Desc => {
                results.sort_by(|a, b| b.get_or_null(field).sort_cmp(a.get_or_null(field)))
            }
        }
    }
}

// =============================================================================
// Select pipeline
// =============================================================================

/// Keep the first row for each value of `field`, dropping later repeats
///
/// Rows that do not carry `field` are always kept.
fn distinct_pass(results: Vec<Row>, field: &str) -> Vec<Row> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|row| match row.get(field) {
            Some(value) => seen.insert(value.distinct_key()),
            None => true,
        })
        .collect()
}

fn paginate(results: Vec<Row>, start: Option<usize>, limit: Option<usize>) -> Vec<Row> {
    let start = start.filter(|s| *s > 0).unwrap_or(0);
    let limit = limit.filter(|l| *l > 0);
    results
        .into_iter()
        .skip(start)
        .take(limit.unwrap_or(usize::MAX))
        .collect()
}

/// Copy the rows named by `ids` and shape them into a result set
///
/// Identifiers without a row are skipped.
pub fn select(
    rows: &TableRows,
    ids: &[RowId],
    start: Option<usize>,
    limit: Option<usize>,
    sort: &[SortKey],
    distinct: &[String],
) -> Vec<Row> {
    let mut results: Vec<Row> = ids.iter().filter_map(|id| rows.get(id).cloned()).collect();

    for key in sort {
        key.apply(&mut results);
    }
    for field in distinct {
        results = distinct_pass(results, field);
    }
    paginate(results, start, limit)
}

// =============================================================================
// Keyword-style parameters
// =============================================================================

/// Named query parameters for [`TableStore::query_all`](crate::TableStore::query_all)
///
/// # Example
///
/// ```
/// use tablestore_engine::{Query, QueryParams, SortKey};
/// use tablestore_core::Row;
///
/// let params = QueryParams::new()
///     .query(Query::values(Row::new().with("city", "lisbon")))
///     .sort(SortKey::desc("age"))
///     .distinct("name")
///     .start(10)
///     .limit(5);
/// assert_eq!(params.limit, Some(5));
/// ```
#[derive(Debug, Default)]
pub struct QueryParams<'a> {
    /// Row selection
    pub query: Query<'a>,
    /// Maximum number of rows returned
    pub limit: Option<usize>,
    /// Number of leading rows skipped
    pub start: Option<usize>,
    /// Sort keys, applied in order
    pub sort: Vec<SortKey>,
    /// Distinct fields, applied in order
    pub distinct: Vec<String>,
}

impl<'a> QueryParams<'a> {
    /// Parameters selecting every row, unsorted and unpaginated
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the row selection
    pub fn query(mut self, query: Query<'a>) -> Self {
        self.query = query;
        self
    }

    /// Set the row limit
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the start offset
    pub fn start(mut self, start: usize) -> Self {
        self.start = Some(start);
        self
    }

    /// Append a sort key
    pub fn sort(mut self, key: SortKey) -> Self {
        self.sort.push(key);
        self
    }

    /// Append a distinct field
    pub fn distinct(mut self, field: impl Into<String>) -> Self {
        self.distinct.push(field.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablestore_core::{FieldList, Value};

    fn table(rows: &[Row]) -> (TableDef, TableRows) {
        let mut def = TableDef::new(FieldList::new(["name", "age", "k"]).unwrap());
        let mut data = TableRows::new();
        for row in rows {
            let id = def.next_id().unwrap();
            let mut row = row.clone();
            row.set("ID", id);
            data.insert(id, row);
        }
        (def, data)
    }

    fn ids(rows: &[Row]) -> Vec<RowId> {
        rows.iter().filter_map(Row::id).collect()
    }

    #[test]
    fn resolve_all_returns_every_id_in_order() {
        let (def, rows) = table(&[Row::new(), Row::new(), Row::new()]);
        assert_eq!(Query::all().resolve(&def, &rows), vec![1, 2, 3]);
    }

    #[test]
    fn resolve_values_is_case_insensitive_for_strings() {
        let (def, rows) = table(&[
            Row::new().with("name", "Bob"),
            Row::new().with("name", "Alice"),
        ]);
        let q = Query::values(Row::new().with("name", "bOB"));
        assert_eq!(q.resolve(&def, &rows), vec![1]);
    }

    #[test]
    fn resolve_values_ignores_undeclared_keys() {
        let (def, rows) = table(&[Row::new().with("age", 3), Row::new().with("age", 4)]);
        let q = Query::values(Row::new().with("age", 4).with("nonsense", "x"));
        assert_eq!(q.resolve(&def, &rows), vec![2]);

        let only_unknown = Query::values(Row::new().with("nonsense", "x"));
        assert_eq!(only_unknown.resolve(&def, &rows), vec![1, 2]);
    }

    #[test]
    fn resolve_values_does_not_coerce_strings_to_numbers() {
        let (def, rows) = table(&[Row::new().with("age", 25)]);
        let q = Query::values(Row::new().with("age", "25"));
        assert!(q.resolve(&def, &rows).is_empty());
        let q = Query::values(Row::new().with("age", 25.0));
        assert_eq!(q.resolve(&def, &rows), vec![1]);
    }

    #[test]
    fn resolve_values_treats_missing_field_as_null() {
        let (def, rows) = table(&[Row::new().with("name", "x"), Row::new()]);
        let q = Query::values(Row::new().with("age", Value::Null));
        assert_eq!(q.resolve(&def, &rows), vec![1, 2]);
        let q = Query::values(Row::new().with("name", Value::Null));
        assert_eq!(q.resolve(&def, &rows), vec![2]);
    }

    #[test]
    fn resolve_predicate() {
        let (def, rows) = table(&[
            Row::new().with("age", 10),
            Row::new().with("age", 40),
            Row::new().with("age", 70),
        ]);
        let q = Query::predicate(|row| row.get("age").and_then(Value::as_int) > Some(30));
        assert_eq!(q.resolve(&def, &rows), vec![2, 3]);
    }

    #[test]
    fn select_sorts_ascending_and_descending() {
        let (_, rows) = table(&[
            Row::new().with("name", "carol"),
            Row::new().with("name", "Alice"),
            Row::new().with("name", "bob"),
        ]);
        let all = [1, 2, 3];
        let asc = select(&rows, &all, None, None, &[SortKey::asc("name")], &[]);
        assert_eq!(ids(&asc), vec![2, 3, 1]);
        let desc = select(&rows, &all, None, None, &[SortKey::desc("name")], &[]);
        assert_eq!(ids(&desc), vec![1, 3, 2]);
    }

    #[test]
    fn select_successive_sorts_last_key_dominates() {
        let (_, rows) = table(&[
            Row::new().with("name", "b").with("age", 2),
            Row::new().with("name", "a").with("age", 2),
            Row::new().with("name", "b").with("age", 1),
            Row::new().with("name", "a").with("age", 1),
        ]);
        let sorted = select(
            &rows,
            &[1, 2, 3, 4],
            None,
            None,
            &[SortKey::asc("age"), SortKey::asc("name")],
            &[],
        );
        // Ordered by name; ties keep the age order from the first pass
        assert_eq!(ids(&sorted), vec![4, 2, 3, 1]);
    }

    #[test]
    fn select_sort_is_stable_for_ties() {
        let (_, rows) = table(&[
            Row::new().with("k", "x"),
            Row::new().with("k", "X"),
            Row::new().with("k", "x"),
        ]);
        let desc = select(&rows, &[1, 2, 3], None, None, &[SortKey::desc("k")], &[]);
        assert_eq!(ids(&desc), vec![1, 2, 3]);
    }

    #[test]
    fn select_sort_with_nan_keeps_numbers_ordered() {
        let input: Vec<Row> = (0..200)
            .map(|i| {
                let age = if i % 3 == 0 {
                    Value::Float(f64::NAN)
                } else {
                    Value::Int((i * 7919) % 211)
                };
                Row::new().with("age", age)
            })
            .collect();
        let (_, rows) = table(&input);
        let all: Vec<RowId> = (1..=200).collect();

        let asc = select(&rows, &all, None, None, &[SortKey::asc("age")], &[]);
        let ages: Vec<&Value> = asc.iter().map(|r| r.get_or_null("age")).collect();
        let numbers: Vec<i64> = ages.iter().filter_map(|v| v.as_int()).collect();
        assert_eq!(numbers.len(), 133);
        assert!(numbers.windows(2).all(|w| w[0] <= w[1]));
        // NaN rows gather after every number
        assert!(ages[133..].iter().all(|v| matches!(v, Value::Float(f) if f.is_nan())));

        let desc = select(&rows, &all, None, None, &[SortKey::desc("age")], &[]);
        let numbers: Vec<i64> = desc.iter().filter_map(|r| r.get_or_null("age").as_int()).collect();
        assert!(numbers.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn select_distinct_keeps_first_occurrence() {
        let (_, rows) = table(&[
            Row::new().with("k", "a"),
            Row::new().with("k", "a"),
            Row::new().with("k", "b"),
        ]);
        let out = select(&rows, &[1, 2, 3], None, None, &[], &["k".to_string()]);
        assert_eq!(ids(&out), vec![1, 3]);
    }

    #[test]
    fn select_distinct_passes_apply_in_order() {
        let (_, rows) = table(&[
            Row::new().with("k", "a").with("name", "x"),
            Row::new().with("k", "b").with("name", "x"),
            Row::new().with("k", "b").with("name", "y"),
        ]);
        let out = select(
            &rows,
            &[1, 2, 3],
            None,
            None,
            &[],
            &["k".to_string(), "name".to_string()],
        );
        // k pass drops 3, name pass drops 2
        assert_eq!(ids(&out), vec![1]);
    }

    #[test]
    fn select_distinct_keeps_rows_without_the_field() {
        let (_, rows) = table(&[Row::new(), Row::new()]);
        let out = select(&rows, &[1, 2], None, None, &[], &["city".to_string()]);
        assert_eq!(ids(&out), vec![1, 2]);
    }

    #[test]
    fn paginate_variants() {
        let rows: Vec<Row> = (1..=10).map(|i| Row::new().with("ID", i)).collect();
        let page = |start, limit| ids(&paginate(rows.clone(), start, limit));

        assert_eq!(page(Some(3), Some(4)), vec![4, 5, 6, 7]);
        assert_eq!(page(Some(8), None), vec![9, 10]);
        assert_eq!(page(None, Some(2)), vec![1, 2]);
        assert_eq!(page(None, None).len(), 10);
        assert_eq!(page(Some(0), Some(3)), vec![1, 2, 3]);
        assert_eq!(page(None, Some(0)).len(), 10);
        assert!(page(Some(20), Some(5)).is_empty());
        assert_eq!(page(Some(9), Some(5)), vec![10]);
    }

    #[test]
    fn select_skips_unknown_ids() {
        let (_, rows) = table(&[Row::new()]);
        assert_eq!(ids(&select(&rows, &[1, 9], None, None, &[], &[])), vec![1]);
    }

    #[test]
    fn sort_order_parsing() {
        assert_eq!(SortOrder::from("DESC"), SortOrder::Desc);
        assert_eq!(SortOrder::from("desc"), SortOrder::Asc);
        assert_eq!(SortOrder::from("Desc"), SortOrder::Asc);
        assert_eq!(SortOrder::from("ASC"), SortOrder::Asc);
        assert_eq!(SortOrder::from("sideways"), SortOrder::Asc);
    }
}
