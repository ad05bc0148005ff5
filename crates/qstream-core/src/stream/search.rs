use qstream_criteria::{CriteriaQuery, EntityType, Expr, Order, Selection, Source};

use super::{step::Step, Stream};
use crate::{
    context::BuildContext,
    error::Result,
    exec::{FromRow, TypedQuery},
    query_kind::Search,
    refs::Ref,
};

/// Clauses only a SELECT has.
impl<S: Selection> Stream<S, Search> {
    pub fn distinct(&self) -> Self {
        self.append(Step::Distinct)
    }

    /// Sorts by one key, replacing any earlier ordering.
    pub fn order_by<F>(&self, key: F) -> Self
    where
        F: Fn(S) -> Order + Send + Sync + 'static,
    {
        self.order_by_multi(move |selected| vec![key(selected)])
    }

    /// Sorts by several keys, replacing any earlier ordering.
    pub fn order_by_multi<F>(&self, keys: F) -> Self
    where
        F: Fn(S) -> Vec<Order> + Send + Sync + 'static,
    {
        self.append(Step::order_by(move |selected, _| {
            Ok(keys(S::from_selected(selected.clone())?))
        }))
    }

    /// Adds a grouping key after any earlier ones.
    pub fn group_by<F>(&self, key: F) -> Self
    where
        F: Fn(S) -> Expr + Send + Sync + 'static,
    {
        self.group_by_multi(move |selected| vec![key(selected)])
    }

    pub fn group_by_multi<F>(&self, keys: F) -> Self
    where
        F: Fn(S) -> Vec<Expr> + Send + Sync + 'static,
    {
        self.append(Step::group_by(move |selected, _| {
            Ok(keys(S::from_selected(selected.clone())?))
        }))
    }

    /// Restricts groups; repeated calls are combined with AND.
    pub fn having<F>(&self, predicate: F) -> Self
    where
        F: Fn(S) -> Expr + Send + Sync + 'static,
    {
        self.append(Step::having(move |selected, _| {
            Ok(predicate(S::from_selected(selected.clone())?))
        }))
    }

    pub fn having_with<F>(&self, predicate: F) -> Self
    where
        F: Fn(S, &mut BuildContext) -> Result<Expr> + Send + Sync + 'static,
    {
        self.append(Step::having(move |selected, ctx| {
            predicate(S::from_selected(selected.clone())?, ctx)
        }))
    }

    /// Adds an unconstrained root (a cross join) bound to `r`. Constrain it
    /// with a later `filter`.
    pub fn add_root(&self, r: &Ref<Source>, entity: EntityType) -> Result<Self> {
        entity.validate()?;
        Ok(self.append(Step::AddRoot {
            entity,
            slot: r.clone(),
        }))
    }

    /// Keeps at most `n` rows. Limits compose to the smallest.
    pub fn limit(&self, n: u64) -> Self {
        self.append(Step::Limit(n))
    }

    /// Skips the first `n` rows.
    pub fn skip(&self, n: u64) -> Self {
        self.append(Step::Skip(n))
    }
}

/// Terminal operations of a search.
impl<S: Selection> Stream<S, Search> {
    pub fn to_criteria_query(&self) -> Result<CriteriaQuery> {
        self.to_target()?.into_query()
    }

    pub fn to_query(&self) -> Result<TypedQuery> {
        let statement = self.to_statement()?;
        Ok(TypedQuery::new(statement, self.manager.clone()))
    }

    pub fn get_result_list<R: FromRow>(&self) -> Result<Vec<R>> {
        self.to_query()?.get_result_list()
    }

    /// The first row, if any. A single NULL read into a scalar is `None`,
    /// so an aggregate over no rows falls through to `or_else`.
    pub fn value<R: FromRow>(&self) -> Result<Option<R>> {
        self.to_query()?.single_result()
    }

    /// The first row, or `default` when there are none.
    pub fn or_else<R: FromRow>(&self, default: R) -> Result<R> {
        Ok(self.value()?.unwrap_or(default))
    }

    pub fn find_first<R: FromRow>(&self) -> Result<Option<R>> {
        self.limit(1).value()
    }

    pub fn find_any<R: FromRow>(&self) -> Result<Option<R>> {
        self.find_first()
    }

    /// Number of rows the stream selects, distinct rows for a distinct
    /// stream. Fails for limited, skipped or grouped streams; see
    /// [`Stream::count`].
    pub fn count_rows(&self) -> Result<u64> {
        let count: Option<i64> = self.count().value()?;
        Ok(count.map_or(0, |n| u64::try_from(n).unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use qstream_criteria::{define_entity, Value};

    use super::*;
    use crate::{
        builder::Builder,
        error::StreamError,
        exec::{RecordingEntityManager, Row},
        test_utils::init_tracing,
    };

    define_entity!(
        employee {
            table: "employee",
            columns: {
                NAME: String => "name",
                SALARY: f64 => "salary",
                DEPARTMENT_ID: i64 => "department_id",
            }
        }
    );

    fn recording() -> (Arc<RecordingEntityManager>, Builder) {
        init_tracing();
        let manager = Arc::new(RecordingEntityManager::new());
        (manager.clone(), Builder::new(manager))
    }

    #[test]
    fn test_order_by_replaces() {
        let (_, builder) = recording();
        let stream = builder
            .stream(employee::ENTITY)
            .unwrap()
            .order_by(|e| e.get(employee::NAME).asc())
            .order_by(|e| e.get(employee::SALARY).desc());

        let sql = stream.to_statement().unwrap().sql;
        assert_eq!(sql, "SELECT e0.* FROM employee e0 ORDER BY e0.salary DESC");
    }

    #[test]
    fn test_group_by_accumulates_and_having_ands() {
        let (_, builder) = recording();
        let stream = builder
            .stream(employee::ENTITY)
            .unwrap()
            .group_by(|e| e.get(employee::DEPARTMENT_ID))
            .group_by(|e| e.get(employee::NAME))
            .having(|_| Expr::literal(1).eq(1))
            .having(|e| e.get(employee::NAME).ne("x"))
            .map(|e| e.get(employee::DEPARTMENT_ID));

        let sql = stream.to_statement().unwrap().sql;
        assert_eq!(
            sql,
            "SELECT e0.department_id FROM employee e0 GROUP BY e0.department_id, e0.name \
             HAVING ? = ? AND e0.name <> ?"
        );
    }

    #[test]
    fn test_add_root_cross_join() {
        let (_, builder) = recording();
        let boss = Ref::named("boss");
        let b = boss.clone();
        let stream = builder
            .stream(employee::ENTITY)
            .unwrap()
            .add_root(&boss, employee::ENTITY)
            .unwrap()
            .filter_with(move |e, ctx| {
                let boss = ctx.get(&b)?;
                Ok(e.get(employee::SALARY).gt(boss.get(employee::SALARY)))
            });

        let sql = stream.to_statement().unwrap().sql;
        assert_eq!(
            sql,
            "SELECT e0.* FROM employee e0, employee e1 WHERE e0.salary > e1.salary"
        );

        let invalid = builder
            .stream(employee::ENTITY)
            .unwrap()
            .add_root(&Ref::new(), EntityType::new("no such"));
        assert!(matches!(invalid, Err(StreamError::Criteria(_))));
    }

    #[test]
    fn test_terminals_fetch_through_manager() {
        let (manager, builder) = recording();
        manager.push_rows(vec![
            Row::new([Value::from("ann")]),
            Row::new([Value::from("bob")]),
        ]);
        manager.push_rows(vec![]);

        let names = builder
            .stream(employee::ENTITY)
            .unwrap()
            .select(employee::NAME);

        let all: Vec<String> = names.get_result_list().unwrap();
        assert_eq!(all, vec!["ann", "bob"]);

        let fallback = names.or_else("nobody".to_string()).unwrap();
        assert_eq!(fallback, "nobody");

        let statements = manager.statements();
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].sql, "SELECT e0.name FROM employee e0");
    }

    #[test]
    fn test_find_first_and_count_rows() {
        let (manager, builder) = recording();
        manager.push_rows(vec![Row::new([Value::Int(42)])]);
        manager.push_rows(vec![Row::new([Value::Int(3)])]);

        let stream = builder
            .stream(employee::ENTITY)
            .unwrap()
            .filter(|e| e.get(employee::SALARY).gt(10))
            .select(employee::DEPARTMENT_ID);

        let first: Option<i64> = stream.find_first().unwrap();
        assert_eq!(first, Some(42));
        assert_eq!(stream.count_rows().unwrap(), 3);

        let statements = manager.statements();
        assert_eq!(
            statements[0].sql,
            "SELECT e0.department_id FROM employee e0 WHERE e0.salary > ? LIMIT 1"
        );
        assert_eq!(
            statements[1].sql,
            "SELECT COUNT(e0.department_id) FROM employee e0 WHERE e0.salary > ?"
        );
    }

    #[test]
    fn test_count_rows_respects_distinct_and_window() {
        let (manager, builder) = recording();
        manager.push_rows(vec![Row::new([Value::Int(2)])]);

        let departments = builder
            .stream(employee::ENTITY)
            .unwrap()
            .select(employee::DEPARTMENT_ID)
            .distinct();
        assert_eq!(departments.count_rows().unwrap(), 2);
        assert_eq!(
            manager.last_statement().unwrap().sql,
            "SELECT COUNT(DISTINCT e0.department_id) FROM employee e0"
        );

        let err = departments.limit(3).count_rows().unwrap_err();
        assert!(matches!(err, StreamError::Argument { op: "count", .. }));
        assert_eq!(manager.statements().len(), 1);
    }

    #[test]
    fn test_skip_offset_saturates() {
        let (_, builder) = recording();
        let statement = builder
            .stream(employee::ENTITY)
            .unwrap()
            .skip(u64::MAX)
            .skip(1)
            .to_statement()
            .unwrap();
        assert!(statement.sql.ends_with(&format!("OFFSET {}", u64::MAX)));
    }
}
