//! Span-free statement model consumed by SchemaLens analyzers and
//! generators.
//!
//! This is the resolved counterpart of the raw tree in `slens-ast`: aliases
//! are already applied, dotted qualifiers sit in named `schema` / `table`
//! slots, and nothing here remembers where in the source it came from.
//! Everything serializes to the documented JSON wire shape, so the model
//! doubles as the interchange format between the parsing engine and
//! downstream tooling.

use serde::{Deserialize, Serialize};
use std::fmt;

pub use slens_ast::{CompareOp, StatementLanguage, StatementOperation};

// ---------------------------------------------------------------------------
// Values and references
// ---------------------------------------------------------------------------

/// A literal scalar, serialized as the bare JSON value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::String(s) => write!(f, "'{s}'"),
        }
    }
}

/// A table, named by its `entity` and optionally pinned to a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub entity: String,
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(schema) = &self.schema {
            write!(f, "{schema}.")?;
        }
        f.write_str(&self.entity)
    }
}

// ---------------------------------------------------------------------------
// SELECT
// ---------------------------------------------------------------------------

/// What a projected column actually selects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ColumnContent {
    /// Everything the source row offers, optionally scoped to one table.
    Wildcard {
        #[serde(skip_serializing_if = "Option::is_none")]
        schema: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        table: Option<String>,
    },
    /// A single named column.
    ColumnReference {
        #[serde(skip_serializing_if = "Option::is_none")]
        schema: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        table: Option<String>,
        column: String,
    },
    /// A computed projection kept as its source text.
    Expression { expression: String },
}

/// One projected column: the display name the result set will use, plus
/// what it selects. `name` is the alias when one was written, otherwise
/// the referenced column's own name, otherwise `*`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub content: ColumnContent,
}

/// The projection list of a `SELECT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectResult {
    pub columns: Vec<Column>,
}

/// The `FROM` clause. A single table for now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FromClause {
    pub table: TableRef,
}

/// One side of a filter comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Operand {
    Value { value: Value },
    Column {
        #[serde(skip_serializing_if = "Option::is_none")]
        schema: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        table: Option<String>,
        column: String,
    },
}

/// A binary filter comparison from a `WHERE` clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub left: Operand,
    pub op: CompareOp,
    pub right: Operand,
}

/// A resolved `SELECT` statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectStatement {
    pub result: SelectResult,
    pub from: FromClause,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Condition>,
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// A classified statement, tagged on the wire by its `command`.
///
/// Commands without a parsed body carry their classification and nothing
/// else; consumers that only group by language or operation can treat all
/// variants uniformly through [`Statement::language`] and
/// [`Statement::operation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum Statement {
    #[serde(rename = "SELECT")]
    Select(SelectStatement),
    #[serde(rename = "CREATE TABLE")]
    CreateTable,
    #[serde(rename = "GRANT")]
    Grant,
    #[serde(rename = "ROLLBACK")]
    Rollback,
    #[serde(rename = "UPDATE")]
    Update,
}

impl Statement {
    /// The command verb, exactly as it appears in the wire tag.
    #[must_use]
    pub const fn command(&self) -> &'static str {
        match self {
            Self::Select(_) => "SELECT",
            Self::CreateTable => "CREATE TABLE",
            Self::Grant => "GRANT",
            Self::Rollback => "ROLLBACK",
            Self::Update => "UPDATE",
        }
    }

    #[must_use]
    pub const fn language(&self) -> StatementLanguage {
        match self {
            Self::Select(_) | Self::Update => StatementLanguage::Dml,
            Self::CreateTable => StatementLanguage::Ddl,
            Self::Grant => StatementLanguage::Dcl,
            Self::Rollback => StatementLanguage::Tcl,
        }
    }

    #[must_use]
    pub const fn operation(&self) -> StatementOperation {
        match self {
            Self::Select(_) => StatementOperation::Read,
            Self::CreateTable => StatementOperation::Create,
            Self::Update => StatementOperation::Update,
            Self::Grant => StatementOperation::Rights,
            Self::Rollback => StatementOperation::Transaction,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn select_all_users() -> Statement {
        Statement::Select(SelectStatement {
            result: SelectResult {
                columns: vec![Column {
                    name: "*".into(),
                    content: ColumnContent::Wildcard {
                        schema: None,
                        table: None,
                    },
                }],
            },
            from: FromClause {
                table: TableRef {
                    schema: None,
                    entity: "users".into(),
                },
            },
            where_clause: None,
        })
    }

    #[test]
    fn classification_triples() {
        let cases = [
            (select_all_users(), "SELECT", StatementLanguage::Dml, StatementOperation::Read),
            (
                Statement::CreateTable,
                "CREATE TABLE",
                StatementLanguage::Ddl,
                StatementOperation::Create,
            ),
            (
                Statement::Grant,
                "GRANT",
                StatementLanguage::Dcl,
                StatementOperation::Rights,
            ),
            (
                Statement::Rollback,
                "ROLLBACK",
                StatementLanguage::Tcl,
                StatementOperation::Transaction,
            ),
            (
                Statement::Update,
                "UPDATE",
                StatementLanguage::Dml,
                StatementOperation::Update,
            ),
        ];
        for (statement, command, language, operation) in cases {
            assert_eq!(statement.command(), command);
            assert_eq!(statement.language(), language);
            assert_eq!(statement.operation(), operation);
        }
    }

    #[test]
    fn select_wire_shape_matches_documented_form() {
        let wire = serde_json::to_value(select_all_users()).unwrap();
        assert_eq!(
            wire,
            json!({
                "command": "SELECT",
                "result": { "columns": [ { "name": "*", "content": { "kind": "wildcard" } } ] },
                "from": { "table": { "entity": "users" } }
            })
        );
    }

    #[test]
    fn stub_statements_serialize_as_bare_commands() {
        let wire = serde_json::to_value(Statement::Rollback).unwrap();
        assert_eq!(wire, json!({ "command": "ROLLBACK" }));
        let back: Statement = serde_json::from_value(wire).unwrap();
        assert_eq!(back, Statement::Rollback);
    }

    #[test]
    fn where_clause_serializes_under_its_sql_name() {
        let statement = Statement::Select(SelectStatement {
            result: SelectResult {
                columns: vec![Column {
                    name: "name".into(),
                    content: ColumnContent::ColumnReference {
                        schema: None,
                        table: None,
                        column: "name".into(),
                    },
                }],
            },
            from: FromClause {
                table: TableRef {
                    schema: Some("public".into()),
                    entity: "users".into(),
                },
            },
            where_clause: Some(Condition {
                left: Operand::Column {
                    schema: None,
                    table: None,
                    column: "age".into(),
                },
                op: CompareOp::Gt,
                right: Operand::Value {
                    value: Value::Integer(21),
                },
            }),
        });

        let wire = serde_json::to_value(&statement).unwrap();
        assert_eq!(wire["where"]["op"], ">");
        assert_eq!(wire["where"]["left"]["kind"], "column");
        assert_eq!(wire["where"]["right"]["kind"], "value");
        assert_eq!(wire["where"]["right"]["value"], 21);
        assert_eq!(wire["from"]["table"]["schema"], "public");

        let back: Statement = serde_json::from_value(wire).unwrap();
        assert_eq!(back, statement);
    }

    #[test]
    fn values_round_trip_untagged() {
        for (value, wire) in [
            (Value::Integer(42), json!(42)),
            (Value::Float(4.5), json!(4.5)),
            (Value::Boolean(true), json!(true)),
            (Value::String("It's".into()), json!("It's")),
        ] {
            assert_eq!(serde_json::to_value(&value).unwrap(), wire);
            let back: Value = serde_json::from_value(wire).unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn display_forms_read_like_source_text() {
        let table = TableRef {
            schema: Some("public".into()),
            entity: "users".into(),
        };
        assert_eq!(table.to_string(), "public.users");
        assert_eq!(Value::String("ok".into()).to_string(), "'ok'");
        assert_eq!(StatementLanguage::Tcl.to_string(), "TCL");
        assert_eq!(StatementOperation::Rights.to_string(), "rights");
    }
}
