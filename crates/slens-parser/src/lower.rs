//! Lowering from the raw syntax tree to the span-free statement model.
//!
//! This pass is total: every well-formed tree lowers without error, so
//! the functions here return their models directly. Spans are dropped,
//! aliases are applied, and dotted qualifiers land in named slots.

use slens_ast::{
    ConditionAst, LiteralAst, OperandAst, ResultColumnAst, ScriptAst, SelectAst, StatementAst,
    TableRefAst,
};
use slens_model::{
    Column, ColumnContent, Condition, FromClause, Operand, SelectResult, SelectStatement,
    Statement, TableRef, Value,
};

/// Lower every statement of a script, preserving order.
#[must_use]
pub fn lower_script(script: ScriptAst) -> Vec<Statement> {
    script.statements.into_iter().map(lower_statement).collect()
}

/// Lower one statement. Commands without a parsed body keep only their
/// classification.
#[must_use]
pub fn lower_statement(statement: StatementAst) -> Statement {
    match statement {
        StatementAst::Select(select) => Statement::Select(lower_select(select)),
        StatementAst::CreateTable => Statement::CreateTable,
        StatementAst::Grant => Statement::Grant,
        StatementAst::Rollback => Statement::Rollback,
        StatementAst::Update => Statement::Update,
    }
}

#[must_use]
pub fn lower_select(select: SelectAst) -> SelectStatement {
    SelectStatement {
        result: SelectResult {
            columns: select
                .columns
                .into_iter()
                .map(lower_result_column)
                .collect(),
        },
        from: FromClause {
            table: lower_table_ref(select.from.table),
        },
        where_clause: select
            .where_clause
            .map(|clause| lower_condition(clause.condition)),
    }
}

#[must_use]
pub fn lower_condition(condition: ConditionAst) -> Condition {
    Condition {
        left: lower_operand(condition.left),
        op: condition.op.op,
        right: lower_operand(condition.right),
    }
}

/// The projected column's display name follows the alias when one was
/// written, else the referenced column's own name, else `*`.
fn lower_result_column(column: ResultColumnAst) -> Column {
    match column {
        ResultColumnAst::Wildcard(wildcard) => Column {
            name: "*".to_owned(),
            content: ColumnContent::Wildcard {
                schema: wildcard.schema.map(|id| id.name),
                table: wildcard.table.map(|id| id.name),
            },
        },
        ResultColumnAst::Column { column, alias } => {
            let name = alias
                .map(|alias| alias.name)
                .unwrap_or_else(|| column.column.name.clone());
            Column {
                name,
                content: ColumnContent::ColumnReference {
                    schema: column.schema.map(|id| id.name),
                    table: column.table.map(|id| id.name),
                    column: column.column.name,
                },
            }
        }
    }
}

fn lower_table_ref(table: TableRefAst) -> TableRef {
    TableRef {
        schema: table.schema.map(|id| id.name),
        entity: table.table.name,
    }
}

fn lower_operand(operand: OperandAst) -> Operand {
    match operand {
        OperandAst::Literal(literal) => Operand::Value {
            value: lower_literal(literal),
        },
        OperandAst::Column(column) => Operand::Column {
            schema: column.schema.map(|id| id.name),
            table: column.table.map(|id| id.name),
            column: column.column.name,
        },
    }
}

fn lower_literal(literal: LiteralAst) -> Value {
    match literal {
        LiteralAst::Integer { value, .. } => Value::Integer(value),
        LiteralAst::Float { value, .. } => Value::Float(value),
        LiteralAst::String { value, .. } => Value::String(value),
        LiteralAst::Boolean { value, .. } => Value::Boolean(value),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
