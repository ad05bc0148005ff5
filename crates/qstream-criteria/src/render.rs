//! SQL rendering of query objects.
//!
//! Rendering walks a finished query object once, writing SQL text and
//! collecting bound parameters in placeholder order.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    entity::validate_identifier,
    error::{CriteriaError, Result},
    expr::{BinaryOp, Direction, Expr, UnaryOp},
    query::{CriteriaDelete, CriteriaQuery, CriteriaUpdate},
    traits::CommonCriteria,
    value::Value,
};

/// SQL flavor, affecting placeholders and offset handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `?` placeholders.
    #[default]
    Generic,
    /// `?` placeholders.
    Sqlite,
    /// `$1, $2, ...` placeholders.
    Postgres,
}

impl Dialect {
    fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Generic | Dialect::Sqlite => "?".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub dialect: Dialect,
    /// Wrap table and column names in double quotes.
    pub quote_identifiers: bool,
}

/// Rendered SQL plus its bound parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

pub fn render_query(query: &CriteriaQuery, options: RenderOptions) -> Result<Statement> {
    let mut renderer = Renderer::new(options);
    renderer.query(query)?;
    Ok(renderer.finish())
}

pub fn render_update(update: &CriteriaUpdate, options: RenderOptions) -> Result<Statement> {
    let mut renderer = Renderer::new(options);
    renderer.update(update)?;
    Ok(renderer.finish())
}

pub fn render_delete(delete: &CriteriaDelete, options: RenderOptions) -> Result<Statement> {
    let mut renderer = Renderer::new(options);
    renderer.delete(delete)?;
    Ok(renderer.finish())
}

// Binding strength, loosest first.
const PREC_OR: u8 = 1;
const PREC_AND: u8 = 2;
const PREC_NOT: u8 = 3;
const PREC_CMP: u8 = 4;
const PREC_ADD: u8 = 5;
const PREC_MUL: u8 = 6;
const PREC_NEG: u8 = 7;
const PREC_ATOM: u8 = 8;

fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Or(items) if items.len() > 1 => PREC_OR,
        Expr::And(items) if items.len() > 1 => PREC_AND,
        Expr::Or(items) | Expr::And(items) => items.first().map_or(PREC_ATOM, precedence),
        Expr::Unary { op, .. } => match op {
            UnaryOp::Not => PREC_NOT,
            UnaryOp::Neg => PREC_NEG,
            UnaryOp::IsNull | UnaryOp::IsNotNull => PREC_CMP,
        },
        Expr::Binary { op, .. } => match op {
            BinaryOp::Add | BinaryOp::Sub => PREC_ADD,
            BinaryOp::Mul | BinaryOp::Div => PREC_MUL,
            _ => PREC_CMP,
        },
        Expr::InList { .. } | Expr::InSubquery { .. } => PREC_CMP,
        _ => PREC_ATOM,
    }
}

struct Renderer {
    options: RenderOptions,
    sql: String,
    params: Vec<Value>,
}

impl Renderer {
    fn new(options: RenderOptions) -> Self {
        Self {
            options,
            sql: String::new(),
            params: vec![],
        }
    }

    fn finish(self) -> Statement {
        trace!(
            dialect = ?self.options.dialect,
            params = self.params.len(),
            "rendered statement"
        );
        Statement {
            sql: self.sql,
            params: self.params,
        }
    }

    fn ident(&mut self, name: &str) -> Result<()> {
        validate_identifier(name)?;
        if self.options.quote_identifiers {
            self.sql.push('"');
            self.sql.push_str(name);
            self.sql.push('"');
        } else {
            self.sql.push_str(name);
        }
        Ok(())
    }

    fn bind(&mut self, value: &Value) {
        self.params.push(value.clone());
        let placeholder = self.options.dialect.placeholder(self.params.len());
        self.sql.push_str(&placeholder);
    }

    fn query(&mut self, query: &CriteriaQuery) -> Result<()> {
        let Some(first_root) = query.roots().first() else {
            return Err(CriteriaError::MissingRoot(query.kind_name()));
        };

        self.sql.push_str("SELECT ");
        if query.is_distinct() {
            self.sql.push_str("DISTINCT ");
        }

        if query.selection().is_empty() {
            self.expr(&first_root.source.all(), 0)?;
        } else {
            self.list(query.selection())?;
        }

        self.sql.push_str(" FROM ");
        for (i, root) in query.roots().iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.ident(root.source.entity().table())?;
            self.sql.push(' ');
            self.sql.push_str(root.source.alias());

            for join in &root.joins {
                self.sql.push(' ');
                self.sql.push_str(join.kind.keyword());
                self.sql.push(' ');
                self.ident(join.source.entity().table())?;
                self.sql.push(' ');
                self.sql.push_str(join.source.alias());
                self.sql.push_str(" ON ");
                self.expr(&join.on, 0)?;
            }
        }

        self.restriction(query.restriction())?;

        if !query.group_by().is_empty() {
            self.sql.push_str(" GROUP BY ");
            self.list(query.group_by())?;
        }

        if let Some(having) = query.having() {
            self.sql.push_str(" HAVING ");
            self.expr(having, 0)?;
        }

        if !query.order_by().is_empty() {
            self.sql.push_str(" ORDER BY ");
            for (i, order) in query.order_by().iter().enumerate() {
                if i > 0 {
                    self.sql.push_str(", ");
                }
                self.expr(&order.expr, 0)?;
                self.sql.push_str(match order.direction {
                    Direction::Asc => " ASC",
                    Direction::Desc => " DESC",
                });
            }
        }

        match (query.limit(), query.offset()) {
            (Some(limit), Some(offset)) => {
                self.sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
            }
            (Some(limit), None) => self.sql.push_str(&format!(" LIMIT {limit}")),
            (None, Some(offset)) => match self.options.dialect {
                Dialect::Postgres => self.sql.push_str(&format!(" OFFSET {offset}")),
                Dialect::Generic | Dialect::Sqlite => {
                    self.sql.push_str(&format!(" LIMIT -1 OFFSET {offset}"))
                }
            },
            (None, None) => {}
        }

        Ok(())
    }

    fn update(&mut self, update: &CriteriaUpdate) -> Result<()> {
        if update.assignments().is_empty() {
            return Err(CriteriaError::EmptyUpdate);
        }

        let root = update.root_source();
        self.sql.push_str("UPDATE ");
        self.ident(root.entity().table())?;
        self.sql.push_str(" AS ");
        self.sql.push_str(root.alias());
        self.sql.push_str(" SET ");
        for (i, (column, value)) in update.assignments().iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.ident(column)?;
            self.sql.push_str(" = ");
            self.expr(value, 0)?;
        }

        self.restriction(update.restriction())
    }

    fn delete(&mut self, delete: &CriteriaDelete) -> Result<()> {
        let root = delete.root_source();
        self.sql.push_str("DELETE FROM ");
        self.ident(root.entity().table())?;
        self.sql.push_str(" AS ");
        self.sql.push_str(root.alias());

        self.restriction(delete.restriction())
    }

    fn restriction(&mut self, restriction: Option<&Expr>) -> Result<()> {
        if let Some(restriction) = restriction {
            self.sql.push_str(" WHERE ");
            self.expr(restriction, 0)?;
        }
        Ok(())
    }

    fn list(&mut self, items: &[Expr]) -> Result<()> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.expr(item, 0)?;
        }
        Ok(())
    }

    fn subquery(&mut self, query: &CriteriaQuery) -> Result<()> {
        self.sql.push('(');
        self.query(query)?;
        self.sql.push(')');
        Ok(())
    }

    /// Writes `expr`, parenthesized when it binds looser than `min_prec`.
    fn expr(&mut self, expr: &Expr, min_prec: u8) -> Result<()> {
        let prec = precedence(expr);
        let wrap = prec < min_prec;
        if wrap {
            self.sql.push('(');
        }

        match expr {
            Expr::Column { alias, column } => {
                self.sql.push_str(alias);
                self.sql.push('.');
                self.ident(column)?;
            }
            Expr::Entity { alias } => {
                self.sql.push_str(alias);
                self.sql.push_str(".*");
            }
            Expr::Literal(Value::Null) => self.sql.push_str("NULL"),
            Expr::Literal(value) => self.bind(value),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => {
                    self.sql.push_str("NOT ");
                    self.expr(operand, PREC_NOT)?;
                }
                UnaryOp::Neg => {
                    self.sql.push('-');
                    self.expr(operand, PREC_NEG)?;
                }
                UnaryOp::IsNull => {
                    self.expr(operand, PREC_ADD)?;
                    self.sql.push_str(" IS NULL");
                }
                UnaryOp::IsNotNull => {
                    self.expr(operand, PREC_ADD)?;
                    self.sql.push_str(" IS NOT NULL");
                }
            },
            Expr::Binary { op, left, right } => {
                let (left_prec, right_prec) = if op.is_predicate() {
                    (prec + 1, prec + 1)
                } else {
                    (prec, prec + 1)
                };
                self.expr(left, left_prec)?;
                self.sql.push(' ');
                self.sql.push_str(op.symbol());
                self.sql.push(' ');
                self.expr(right, right_prec)?;
            }
            Expr::And(items) => self.junction(items, " AND ", "1 = 1", PREC_AND)?,
            Expr::Or(items) => self.junction(items, " OR ", "1 = 0", PREC_OR)?,
            Expr::InList {
                operand,
                list,
                negated,
            } => {
                if list.is_empty() {
                    self.sql.push_str(if *negated { "1 = 1" } else { "1 = 0" });
                } else {
                    self.expr(operand, PREC_ADD)?;
                    self.sql.push_str(if *negated { " NOT IN (" } else { " IN (" });
                    self.list(list)?;
                    self.sql.push(')');
                }
            }
            Expr::Aggregate {
                func,
                arg,
                distinct,
            } => {
                self.sql.push_str(func.name());
                self.sql.push('(');
                match arg {
                    Some(arg) => {
                        if *distinct {
                            self.sql.push_str("DISTINCT ");
                        }
                        self.expr(arg, 0)?;
                    }
                    None => self.sql.push('*'),
                }
                self.sql.push(')');
            }
            Expr::Function { func, args } => {
                self.sql.push_str(func.name());
                self.sql.push('(');
                self.list(args)?;
                self.sql.push(')');
            }
            Expr::Subquery(query) => self.subquery(query)?,
            Expr::Exists(query) => {
                self.sql.push_str("EXISTS ");
                self.subquery(query)?;
            }
            Expr::InSubquery {
                operand,
                subquery,
                negated,
            } => {
                self.expr(operand, PREC_ADD)?;
                self.sql.push_str(if *negated { " NOT IN " } else { " IN " });
                self.subquery(subquery)?;
            }
        }

        if wrap {
            self.sql.push(')');
        }
        Ok(())
    }

    fn junction(&mut self, items: &[Expr], sep: &str, empty: &str, prec: u8) -> Result<()> {
        match items {
            [] => self.sql.push_str(empty),
            [single] => self.expr(single, 0)?,
            _ => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.sql.push_str(sep);
                    }
                    self.expr(item, prec + 1)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        builder::CriteriaBuilder,
        entity::{Assoc, Attr, EntityType},
        expr::{JoinKind, Order},
    };

    const EMPLOYEE: EntityType = EntityType::new("employee");
    const SALARY: Attr<f64> = Attr::new("employee", "salary");
    const NAME: Attr<String> = Attr::new("employee", "name");
    const DEPARTMENT: Assoc = Assoc::to_one("employee", "department", "department", "department_id");

    #[test]
    fn test_render_select_with_join_and_clauses() {
        let mut cb = CriteriaBuilder::new();
        let mut q = cb.create_query();
        let e = q.from(EMPLOYEE, &mut cb).unwrap();
        let d = q.join(&e, &DEPARTMENT, JoinKind::Inner, &mut cb).unwrap();
        q.select(vec![d.column("name"), cb.avg(e.get(SALARY))]);
        q.set_restriction(e.get(SALARY).gt(1000).and(e.get(NAME).like("A%")));
        q.set_group_by(vec![d.column("name")]);
        q.set_having(cb.count_all().gt(2));
        q.set_order_by(vec![Order::desc(d.column("name"))]);
        q.set_limit(Some(5));

        let stmt = render_query(&q, RenderOptions::default()).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT d1.name, AVG(e0.salary) FROM employee e0 \
             INNER JOIN department d1 ON d1.id = e0.department_id \
             WHERE e0.salary > ? AND e0.name LIKE ? \
             GROUP BY d1.name HAVING COUNT(*) > ? ORDER BY d1.name DESC LIMIT 5"
        );
        assert_eq!(
            stmt.params,
            vec![Value::Int(1000), Value::Text("A%".into()), Value::Int(2)]
        );
    }

    #[test]
    fn test_render_defaults_to_root_selection() {
        let mut cb = CriteriaBuilder::new();
        let mut q = cb.create_query();
        q.from(EMPLOYEE, &mut cb).unwrap();
        q.set_distinct(true);

        let stmt = render_query(&q, RenderOptions::default()).unwrap();
        assert_eq!(stmt.sql, "SELECT DISTINCT e0.* FROM employee e0");
    }

    #[test]
    fn test_render_precedence() {
        let mut cb = CriteriaBuilder::new();
        let mut q = CriteriaQuery::new();
        let e = q.from(EMPLOYEE, &mut cb).unwrap();
        let or = e.get(SALARY).lt(10).or(e.get(SALARY).gt(20));
        q.set_restriction(or.and(e.get(NAME).is_not_null()).and(
            e.get(SALARY).add(1).mul(2).ge(7).not(),
        ));

        let stmt = render_query(&q, RenderOptions::default()).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT e0.* FROM employee e0 WHERE (e0.salary < ? OR e0.salary > ?) \
             AND e0.name IS NOT NULL AND NOT (e0.salary + ?) * ? >= ?"
        );
    }

    #[test]
    fn test_render_postgres_placeholders_and_offset() {
        let mut cb = CriteriaBuilder::new();
        let mut q = cb.create_query();
        let e = q.from(EMPLOYEE, &mut cb).unwrap();
        q.set_restriction(e.get(SALARY).gt(1).and(e.get(SALARY).lt(9)));
        q.set_offset(Some(10));

        let options = RenderOptions {
            dialect: Dialect::Postgres,
            quote_identifiers: true,
        };
        let stmt = render_query(&q, options).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT e0.* FROM \"employee\" e0 WHERE e0.\"salary\" > $1 AND e0.\"salary\" < $2 OFFSET 10"
        );

        q.set_offset(Some(3));
        let sqlite = render_query(&q, RenderOptions::default()).unwrap();
        assert!(sqlite.sql.ends_with("LIMIT -1 OFFSET 3"));
    }

    #[test]
    fn test_render_update_and_delete() {
        let mut cb = CriteriaBuilder::new();
        let mut update = cb.create_update(EMPLOYEE);
        let root = update.root_source().clone();
        update.set(SALARY, root.get(SALARY).mul(1.1));
        update.set_restriction(root.column("department_id").is_null());
        let stmt = render_update(&update, RenderOptions::default()).unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE employee AS e0 SET salary = e0.salary * ? WHERE e0.department_id IS NULL"
        );

        let mut cb = CriteriaBuilder::new();
        let mut delete = cb.create_delete(EMPLOYEE);
        let root = delete.root_source().clone();
        delete.set_restriction(root.get(NAME).in_list(["a", "b"]));
        let stmt = render_delete(&delete, RenderOptions::default()).unwrap();
        assert_eq!(stmt.sql, "DELETE FROM employee AS e0 WHERE e0.name IN (?, ?)");
        assert_eq!(stmt.params.len(), 2);
    }

    #[test]
    fn test_render_errors() {
        let q = CriteriaQuery::new();
        assert_eq!(
            render_query(&q, RenderOptions::default()).unwrap_err(),
            CriteriaError::MissingRoot("select")
        );

        let mut cb = CriteriaBuilder::new();
        let update = cb.create_update(EMPLOYEE);
        assert_eq!(
            render_update(&update, RenderOptions::default()).unwrap_err(),
            CriteriaError::EmptyUpdate
        );
    }

    #[test]
    fn test_render_exists_subquery_shares_params() {
        let mut cb = CriteriaBuilder::new();
        let mut q = cb.create_query();
        let e = q.from(EMPLOYEE, &mut cb).unwrap();

        let mut sub = cb.create_subquery();
        let d = sub.from(EntityType::new("department"), &mut cb).unwrap();
        sub.set_restriction(
            d.id()
                .eq(e.column("department_id"))
                .and(d.column("budget").gt(100)),
        );
        q.set_restriction(e.get(SALARY).gt(5).and(cb.exists(sub)));

        let stmt = render_query(&q, RenderOptions::default()).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT e0.* FROM employee e0 WHERE e0.salary > ? AND EXISTS \
             (SELECT d1.* FROM department d1 WHERE d1.id = e0.department_id AND d1.budget > ?)"
        );
        assert_eq!(stmt.params, vec![Value::Int(5), Value::Int(100)]);
        assert!(stmt.to_json().unwrap().contains("\"params\":[5,100]"));
    }
}
