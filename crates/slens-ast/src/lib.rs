//! Span-tracked raw syntax tree for SchemaLens statement parsing.
//!
//! Every leaf node in this tree carries a [`Span`] recording exactly where
//! its text sits in the original input. Composite nodes do not store their
//! own span; they derive one on demand by merging the spans of their
//! children, so a node's span always covers everything underneath it.
//!
//! The tree is deliberately syntax-faithful: qualifiers, aliases, and
//! keyword positions survive parsing untouched. Resolution into the
//! span-free statement model happens in a separate lowering pass.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Source positions
// ---------------------------------------------------------------------------

/// An inclusive `start..=end` range over one positional dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    pub start: usize,
    pub end: usize,
}

impl Extent {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Location of a run of source text, tracked along three parallel axes:
/// byte offset, 1-based line, and 1-based column. All three ranges are
/// inclusive, so a single-character token has `start == end` on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub offset: Extent,
    pub line: Extent,
    pub column: Extent,
}

impl Span {
    #[must_use]
    pub const fn new(offset: Extent, line: Extent, column: Extent) -> Self {
        Self { offset, line, column }
    }

    /// Smallest span covering both `self` and `other`.
    ///
    /// The span that begins earlier in the input contributes every `start`,
    /// and the span that reaches further contributes every `end`, keeping
    /// the three axes consistent with each other regardless of argument
    /// order or overlap.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        let head = if self.offset.start <= other.offset.start {
            self
        } else {
            other
        };
        let tail = if self.offset.end >= other.offset.end {
            self
        } else {
            other
        };
        Self {
            offset: Extent::new(head.offset.start, tail.offset.end),
            line: Extent::new(head.line.start, tail.line.end),
            column: Extent::new(head.column.start, tail.column.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line.start == self.line.end && self.column.start == self.column.end {
            write!(f, "{}:{}", self.line.start, self.column.start)
        } else {
            write!(
                f,
                "{}:{}-{}:{}",
                self.line.start, self.column.start, self.line.end, self.column.end
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Leaves
// ---------------------------------------------------------------------------

/// A bare or quoted identifier with its quoting already resolved: `name`
/// holds the effective text (escapes unfolded, delimiters stripped) while
/// `span` still covers the full source form including any delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierAst {
    pub name: String,
    pub span: Span,
}

impl IdentifierAst {
    #[must_use]
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

impl fmt::Display for IdentifierAst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A literal scalar. String values are stored unescaped.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralAst {
    Integer { value: i64, span: Span },
    Float { value: f64, span: Span },
    String { value: String, span: Span },
    Boolean { value: bool, span: Span },
}

impl LiteralAst {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Integer { span, .. }
            | Self::Float { span, .. }
            | Self::String { span, .. }
            | Self::Boolean { span, .. } => *span,
        }
    }
}

/// Comparison operator usable in a `WHERE` condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
}

impl CompareOp {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// ---------------------------------------------------------------------------
// References
// ---------------------------------------------------------------------------

/// Reference to a table, optionally qualified by its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRefAst {
    pub schema: Option<IdentifierAst>,
    pub table: IdentifierAst,
}

impl TableRefAst {
    #[must_use]
    pub fn span(&self) -> Span {
        match &self.schema {
            Some(schema) => schema.span.merge(self.table.span),
            None => self.table.span,
        }
    }
}

/// Reference to a column, optionally qualified by table and schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRefAst {
    pub schema: Option<IdentifierAst>,
    pub table: Option<IdentifierAst>,
    pub column: IdentifierAst,
}

impl ColumnRefAst {
    #[must_use]
    pub fn span(&self) -> Span {
        let mut span = self.column.span;
        if let Some(table) = &self.table {
            span = table.span.merge(span);
        }
        if let Some(schema) = &self.schema {
            span = schema.span.merge(span);
        }
        span
    }
}

/// A `*` projection, optionally qualified: `*`, `t.*`, or `s.t.*`.
/// `star` is the span of the asterisk itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardAst {
    pub schema: Option<IdentifierAst>,
    pub table: Option<IdentifierAst>,
    pub star: Span,
}

impl WildcardAst {
    #[must_use]
    pub fn span(&self) -> Span {
        let mut span = self.star;
        if let Some(table) = &self.table {
            span = table.span.merge(span);
        }
        if let Some(schema) = &self.schema {
            span = schema.span.merge(span);
        }
        span
    }
}

// ---------------------------------------------------------------------------
// SELECT clauses
// ---------------------------------------------------------------------------

/// One entry of a `SELECT` projection list.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultColumnAst {
    Wildcard(WildcardAst),
    Column {
        column: ColumnRefAst,
        alias: Option<IdentifierAst>,
    },
}

impl ResultColumnAst {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Wildcard(wildcard) => wildcard.span(),
            Self::Column { column, alias } => match alias {
                Some(alias) => column.span().merge(alias.span),
                None => column.span(),
            },
        }
    }
}

/// A comparison operator token together with where it appeared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComparatorAst {
    pub op: CompareOp,
    pub span: Span,
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum OperandAst {
    Literal(LiteralAst),
    Column(ColumnRefAst),
}

impl OperandAst {
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(literal) => literal.span(),
            Self::Column(column) => column.span(),
        }
    }
}

/// A binary comparison, e.g. `age > 21` or `a.id = b.id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionAst {
    pub left: OperandAst,
    pub op: ComparatorAst,
    pub right: OperandAst,
}

impl ConditionAst {
    #[must_use]
    pub fn span(&self) -> Span {
        self.left.span().merge(self.right.span())
    }
}

/// `FROM` clause; `keyword` is the span of the `FROM` keyword itself.
#[derive(Debug, Clone, PartialEq)]
pub struct FromClauseAst {
    pub keyword: Span,
    pub table: TableRefAst,
}

impl FromClauseAst {
    #[must_use]
    pub fn span(&self) -> Span {
        self.keyword.merge(self.table.span())
    }
}

/// `WHERE` clause; `keyword` is the span of the `WHERE` keyword itself.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClauseAst {
    pub keyword: Span,
    pub condition: ConditionAst,
}

impl WhereClauseAst {
    #[must_use]
    pub fn span(&self) -> Span {
        self.keyword.merge(self.condition.span())
    }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// SQL sub-language a command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatementLanguage {
    Ddl,
    Dml,
    Dcl,
    Tcl,
}

impl StatementLanguage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ddl => "DDL",
            Self::Dml => "DML",
            Self::Dcl => "DCL",
            Self::Tcl => "TCL",
        }
    }
}

impl fmt::Display for StatementLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad effect of a command, independent of its concrete syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementOperation {
    Read,
    Create,
    Update,
    Rights,
    Transaction,
}

impl StatementOperation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Rights => "rights",
            Self::Transaction => "transaction",
        }
    }
}

impl fmt::Display for StatementOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `SELECT` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectAst {
    /// Span of the `SELECT` keyword.
    pub keyword: Span,
    pub columns: Vec<ResultColumnAst>,
    pub from: FromClauseAst,
    pub where_clause: Option<WhereClauseAst>,
}

impl SelectAst {
    #[must_use]
    pub fn span(&self) -> Span {
        let mut span = self.keyword.merge(self.from.span());
        if let Some(clause) = &self.where_clause {
            span = span.merge(clause.span());
        }
        for column in &self.columns {
            span = span.merge(column.span());
        }
        span
    }

    /// Every identifier in the statement, in source order: projection
    /// qualifiers, column names and aliases first, then the table
    /// reference, then identifiers on either side of the `WHERE`
    /// comparison.
    #[must_use]
    pub fn identifiers(&self) -> Vec<&IdentifierAst> {
        let mut out = Vec::new();
        for column in &self.columns {
            match column {
                ResultColumnAst::Wildcard(wildcard) => {
                    out.extend(wildcard.schema.as_ref());
                    out.extend(wildcard.table.as_ref());
                }
                ResultColumnAst::Column { column, alias } => {
                    collect_column_ref(column, &mut out);
                    out.extend(alias.as_ref());
                }
            }
        }
        out.extend(self.from.table.schema.as_ref());
        out.push(&self.from.table.table);
        if let Some(clause) = &self.where_clause {
            collect_operand(&clause.condition.left, &mut out);
            collect_operand(&clause.condition.right, &mut out);
        }
        out
    }
}

fn collect_column_ref<'a>(column: &'a ColumnRefAst, out: &mut Vec<&'a IdentifierAst>) {
    out.extend(column.schema.as_ref());
    out.extend(column.table.as_ref());
    out.push(&column.column);
}

fn collect_operand<'a>(operand: &'a OperandAst, out: &mut Vec<&'a IdentifierAst>) {
    if let OperandAst::Column(column) = operand {
        collect_column_ref(column, out);
    }
}

/// One statement of a script.
///
/// Only `SELECT` carries a body today. The remaining commands are
/// recognized for classification purposes and hold no structure yet.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementAst {
    Select(SelectAst),
    CreateTable,
    Grant,
    Rollback,
    Update,
}

impl StatementAst {
    /// The command verb this statement was classified as.
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

    /// The sub-language the command belongs to.
    #[must_use]
    pub const fn language(&self) -> StatementLanguage {
        match self {
            Self::Select(_) | Self::Update => StatementLanguage::Dml,
            Self::CreateTable => StatementLanguage::Ddl,
            Self::Grant => StatementLanguage::Dcl,
            Self::Rollback => StatementLanguage::Tcl,
        }
    }

    /// The broad effect of the command.
    #[must_use]
    pub const fn operation(&self) -> StatementOperation {
        match self {
            Self::Select(_) => StatementOperation::Read,
            Self::CreateTable => StatementOperation::Create,
            Self::Grant => StatementOperation::Rights,
            Self::Rollback => StatementOperation::Transaction,
            Self::Update => StatementOperation::Update,
        }
    }

    /// Source coverage of the statement, when it has a parsed body.
    #[must_use]
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::Select(select) => Some(select.span()),
            _ => None,
        }
    }

    #[must_use]
    pub fn identifiers(&self) -> Vec<&IdentifierAst> {
        match self {
            Self::Select(select) => select.identifiers(),
            _ => Vec::new(),
        }
    }
}

/// A whole input: zero or more statements in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScriptAst {
    pub statements: Vec<StatementAst>,
}

impl ScriptAst {
    #[must_use]
    pub fn identifiers(&self) -> Vec<&IdentifierAst> {
        self.statements
            .iter()
            .flat_map(StatementAst::identifiers)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
