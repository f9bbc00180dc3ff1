//! SQL parsing and read-only classification.
//!
//! Uses sqlparser-rs with the dialect of the connected database.

use sqlparser::ast::{Query, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::{Dialect, GenericDialect, MySqlDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;
use tracing::debug;

use crate::connection::DatabaseKind;
use crate::error::{ChatDbError, Result};

use super::StatementKind;

/// Rejects queries that could modify the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOnlyGuard {
    kind: DatabaseKind,
}

impl ReadOnlyGuard {
    /// Creates a guard that parses with the dialect of `kind`.
    pub fn new(kind: DatabaseKind) -> Self {
        Self { kind }
    }

    fn dialect(&self) -> Box<dyn Dialect> {
        match self.kind {
            DatabaseKind::MySql => Box::new(MySqlDialect {}),
            DatabaseKind::PostgreSql => Box::new(PostgreSqlDialect {}),
            DatabaseKind::Oracle => Box::new(GenericDialect {}),
        }
    }

    /// Classifies every statement in `sql`.
    ///
    /// Text that does not parse is an `Unsafe` error.
    pub fn classify(&self, sql: &str) -> Result<Vec<StatementKind>> {
        let dialect = self.dialect();
        let statements = Parser::parse_sql(dialect.as_ref(), sql).map_err(|e| {
            ChatDbError::unsafe_query(format!("Could not parse generated query: {e}"))
        })?;

        Ok(statements.iter().map(classify_statement).collect())
    }

    /// Returns `Ok` only if `sql` is one or more read-only statements.
    pub fn check(&self, sql: &str) -> Result<()> {
        let kinds = self.classify(sql)?;

        if kinds.is_empty() {
            return Err(ChatDbError::unsafe_query("Generated query is empty"));
        }

        if let Some(kind) = kinds.iter().find(|k| !k.is_read_only()) {
            return Err(ChatDbError::unsafe_query(format!(
                "{kind} is not allowed in read-only mode"
            )));
        }

        debug!("Read-only check passed for {} statement(s)", kinds.len());
        Ok(())
    }
}

fn classify_statement(statement: &Statement) -> StatementKind {
    match statement {
        Statement::Query(query) => classify_query(query),
        Statement::Explain {
            analyze, statement, ..
        } => {
            // EXPLAIN ANALYZE runs the statement
            if *analyze {
                classify_statement(statement)
            } else {
                StatementKind::Read
            }
        }
        Statement::ShowVariable { .. }
        | Statement::ShowTables { .. }
        | Statement::ShowColumns { .. }
        | Statement::ShowCreate { .. }
        | Statement::ShowFunctions { .. }
        | Statement::ShowStatus { .. }
        | Statement::ShowCollation { .. } => StatementKind::Read,

        Statement::Insert(_) => StatementKind::Insert,
        Statement::Update { .. } => StatementKind::Update,
        Statement::Delete(_) => StatementKind::Delete,
        Statement::Merge { .. } => StatementKind::Merge,

        Statement::Drop { .. }
        | Statement::Truncate { .. }
        | Statement::AlterTable { .. }
        | Statement::AlterIndex { .. }
        | Statement::AlterView { .. }
        | Statement::AlterRole { .. }
        | Statement::CreateTable { .. }
        | Statement::CreateIndex { .. }
        | Statement::CreateView { .. }
        | Statement::CreateSchema { .. }
        | Statement::CreateDatabase { .. }
        | Statement::CreateFunction { .. }
        | Statement::CreateRole { .. }
        | Statement::Grant { .. }
        | Statement::Revoke { .. } => StatementKind::Schema,

        _ => StatementKind::Other,
    }
}

fn classify_query(query: &Query) -> StatementKind {
    // FOR UPDATE / FOR SHARE take row locks
    if !query.locks.is_empty() {
        return StatementKind::LockingRead;
    }

    let ctes = query
        .with
        .iter()
        .flat_map(|with| with.cte_tables.iter())
        .map(|cte| classify_query(&cte.query));

    first_write(ctes.chain(std::iter::once(classify_set_expr(&query.body))))
}

fn classify_set_expr(set_expr: &SetExpr) -> StatementKind {
    match set_expr {
        SetExpr::Select(select) => {
            if select.into.is_some() {
                return StatementKind::SelectInto;
            }
            first_write(select.from.iter().map(classify_table_with_joins))
        }
        SetExpr::Query(query) => classify_query(query),
        SetExpr::SetOperation { left, right, .. } => {
            first_write([classify_set_expr(left), classify_set_expr(right)])
        }
        SetExpr::Values(_) | SetExpr::Table(_) => StatementKind::Read,
        // INSERT/UPDATE/DELETE bodies inside CTEs
        _ => StatementKind::DataModifyingCte,
    }
}

fn classify_table_with_joins(twj: &TableWithJoins) -> StatementKind {
    first_write(
        std::iter::once(&twj.relation)
            .chain(twj.joins.iter().map(|join| &join.relation))
            .map(classify_table_factor),
    )
}

fn classify_table_factor(factor: &TableFactor) -> StatementKind {
    match factor {
        TableFactor::Derived { subquery, .. } => classify_query(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => classify_table_with_joins(table_with_joins),
        _ => StatementKind::Read,
    }
}

/// Returns the first kind that is not a read, or `Read`.
fn first_write(kinds: impl IntoIterator<Item = StatementKind>) -> StatementKind {
    kinds
        .into_iter()
        .find(|kind| !kind.is_read_only())
        .unwrap_or(StatementKind::Read)
}
