//! Recursive-descent parser over the token stream.
//!
//! Every grammar rule is a method returning `Result<Node, ParserError>`,
//! so a failure unwinds the whole rule stack without leaving a partial
//! tree behind. The parser also keeps a scratch list of diagnostics:
//! alternations that reject several branches record what each branch
//! expected before the summarizing error, and [`Parser::into_failure`]
//! drains the lot into one [`ParseFailure`].

use slens_ast::{
    ColumnRefAst, ComparatorAst, CompareOp, ConditionAst, Extent, FromClauseAst, IdentifierAst,
    LiteralAst, OperandAst, ResultColumnAst, ScriptAst, SelectAst, Span, StatementAst,
    TableRefAst, WhereClauseAst, WildcardAst,
};
use slens_error::{ParseFailure, ParserError};
use tracing::trace;

use crate::token::{Token, TokenKind};

const FALLBACK_SPAN: Span = Span::new(Extent::new(0, 0), Extent::new(1, 1), Extent::new(1, 1));

/// Pull-based parser over a lexed token stream.
///
/// The stream is expected to end with [`TokenKind::Eof`]; the cursor
/// never moves past it.
#[derive(Debug)]
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParserError>,
}

impl Parser {
    #[must_use]
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Cursor helpers
    // -----------------------------------------------------------------------

    fn peek(&self) -> &TokenKind {
        self.current().map_or(&TokenKind::Eof, |t| &t.kind)
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    pub(crate) fn at_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len().saturating_sub(1) {
            self.pos += 1;
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }

    fn check_identifier(&self) -> bool {
        matches!(self.peek(), TokenKind::Id(_) | TokenKind::QuotedId(_))
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_token(&mut self, kind: &TokenKind, what: &str) -> Result<Span, ParserError> {
        if self.check(kind) {
            let span = self.current_span();
            self.advance();
            Ok(span)
        } else {
            Err(self.err_expected(what))
        }
    }

    fn current_span(&self) -> Span {
        self.current().map_or(FALLBACK_SPAN, |t| t.span)
    }

    fn describe_current(&self) -> String {
        self.current()
            .map_or_else(|| "end of input".to_owned(), Token::describe)
    }

    /// A required token was something else.
    fn err_expected(&self, what: &str) -> ParserError {
        ParserError::mismatched_token(
            format!("expected {what}, found {}", self.describe_current()),
            self.current_span(),
        )
    }

    /// None of an alternation's branches could start here.
    fn err_no_viable(&self, what: &str) -> ParserError {
        ParserError::no_viable_alternative(
            format!("expected {what}, found {}", self.describe_current()),
            self.current_span(),
        )
    }

    /// Require that the whole token stream was consumed.
    pub fn expect_end(&mut self) -> Result<(), ParserError> {
        if self.at_eof() {
            Ok(())
        } else {
            Err(ParserError::redundant_input(
                format!("expected end of input, found {}", self.describe_current()),
                self.current_span(),
            ))
        }
    }

    /// Close out a failed parse: every recorded branch diagnostic plus the
    /// terminal error, in the order they were hit.
    #[must_use]
    pub fn into_failure(mut self, terminal: ParserError) -> ParseFailure {
        self.errors.push(terminal);
        ParseFailure::new(self.errors)
    }

    fn parse_comma_sep<T>(
        &mut self,
        f: fn(&mut Self) -> Result<T, ParserError>,
    ) -> Result<Vec<T>, ParserError> {
        let mut items = vec![f(self)?];
        while self.eat(&TokenKind::Comma) {
            items.push(f(self)?);
        }
        Ok(items)
    }

    // -----------------------------------------------------------------------
    // Script and statement rules
    // -----------------------------------------------------------------------

    /// `script := (statement? `;`)* statement?`
    ///
    /// Empty input and bare separators are valid scripts.
    pub fn parse_script(&mut self) -> Result<ScriptAst, ParserError> {
        let mut statements = Vec::new();
        while self.eat(&TokenKind::Semicolon) {}
        while !self.at_eof() {
            statements.push(self.parse_statement()?);
            if !self.at_eof() && !self.eat(&TokenKind::Semicolon) {
                return Err(self.err_expected("`;` between statements"));
            }
            while self.eat(&TokenKind::Semicolon) {}
        }
        Ok(ScriptAst { statements })
    }

    /// Dispatch on the statement's first token.
    pub fn parse_statement(&mut self) -> Result<StatementAst, ParserError> {
        match self.peek() {
            TokenKind::KwSelect => Ok(StatementAst::Select(self.parse_select()?)),
            _ => Err(self.err_no_viable("a statement starting with `SELECT`")),
        }
    }

    /// `select := SELECT result_column (`,` result_column)* from_clause where_clause?`
    pub fn parse_select(&mut self) -> Result<SelectAst, ParserError> {
        let keyword = self.expect_token(&TokenKind::KwSelect, "`SELECT`")?;
        let columns = self.parse_comma_sep(Self::parse_result_column)?;
        let from = self.parse_from_clause()?;
        let where_clause = if self.check(&TokenKind::KwWhere) {
            Some(self.parse_where_clause()?)
        } else {
            None
        };
        trace!(columns = columns.len(), "parsed select statement");
        Ok(SelectAst {
            keyword,
            columns,
            from,
            where_clause,
        })
    }

    /// `FROM` plus a single table reference. Table aliases and joins are
    /// recognized extension points that the grammar does not accept yet.
    pub fn parse_from_clause(&mut self) -> Result<FromClauseAst, ParserError> {
        let keyword = self.expect_token(&TokenKind::KwFrom, "`FROM`")?;
        let table = self.parse_table_ref()?;
        Ok(FromClauseAst { keyword, table })
    }

    pub fn parse_where_clause(&mut self) -> Result<WhereClauseAst, ParserError> {
        let keyword = self.expect_token(&TokenKind::KwWhere, "`WHERE`")?;
        let condition = self.parse_condition()?;
        Ok(WhereClauseAst { keyword, condition })
    }

    // -----------------------------------------------------------------------
    // Projection rules
    // -----------------------------------------------------------------------

    /// One projection entry: `*`, a qualified wildcard, or a column
    /// reference with an optional `AS` alias.
    pub fn parse_result_column(&mut self) -> Result<ResultColumnAst, ParserError> {
        if self.check(&TokenKind::Star) {
            let star = self.current_span();
            self.advance();
            return Ok(ResultColumnAst::Wildcard(WildcardAst {
                schema: None,
                table: None,
                star,
            }));
        }
        if !self.check_identifier() {
            return Err(self.err_no_viable("`*` or a column reference"));
        }

        // Dotted chain that may end in `*` instead of a column name.
        let mut segments = Vec::new();
        loop {
            if self.check(&TokenKind::Star) {
                let star = self.current_span();
                self.advance();
                let quals = resolve_qualifiers(segments, QualifierArity::Column);
                return Ok(ResultColumnAst::Wildcard(WildcardAst {
                    schema: quals.schema,
                    table: quals.table,
                    star,
                }));
            }
            let ident = self.parse_identifier()?;
            if segments.len() < 2 && self.eat(&TokenKind::Dot) {
                segments.push(ident);
                continue;
            }
            let quals = resolve_qualifiers(segments, QualifierArity::Column);
            let column = ColumnRefAst {
                schema: quals.schema,
                table: quals.table,
                column: ident,
            };
            let alias = if self.eat(&TokenKind::KwAs) {
                Some(self.parse_identifier()?)
            } else {
                None
            };
            return Ok(ResultColumnAst::Column { column, alias });
        }
    }

    // -----------------------------------------------------------------------
    // Reference rules
    // -----------------------------------------------------------------------

    /// `table_ref := (identifier `.`)? identifier`
    pub fn parse_table_ref(&mut self) -> Result<TableRefAst, ParserError> {
        let (segments, table) = self.parse_qualified_name(1)?;
        let quals = resolve_qualifiers(segments, QualifierArity::Table);
        Ok(TableRefAst {
            schema: quals.schema,
            table,
        })
    }

    /// `column_ref := (identifier `.`)? (identifier `.`)? identifier`
    pub fn parse_column_ref(&mut self) -> Result<ColumnRefAst, ParserError> {
        let (segments, column) = self.parse_qualified_name(2)?;
        let quals = resolve_qualifiers(segments, QualifierArity::Column);
        Ok(ColumnRefAst {
            schema: quals.schema,
            table: quals.table,
            column,
        })
    }

    /// Consume a dotted name, treating identifiers followed by `.` as
    /// qualifiers until the budget runs out. The final identifier is the
    /// referenced name itself; which slot each qualifier lands in is
    /// decided afterwards by [`resolve_qualifiers`].
    fn parse_qualified_name(
        &mut self,
        max_qualifiers: usize,
    ) -> Result<(Vec<IdentifierAst>, IdentifierAst), ParserError> {
        let mut segments = Vec::new();
        loop {
            let ident = self.parse_identifier()?;
            if segments.len() < max_qualifiers && self.eat(&TokenKind::Dot) {
                segments.push(ident);
                continue;
            }
            return Ok((segments, ident));
        }
    }

    // -----------------------------------------------------------------------
    // Condition rules
    // -----------------------------------------------------------------------

    /// `condition := operand comparator operand`
    pub fn parse_condition(&mut self) -> Result<ConditionAst, ParserError> {
        let left = self.parse_operand()?;
        let op = self.parse_comparator()?;
        let right = self.parse_operand()?;
        Ok(ConditionAst { left, op, right })
    }

    /// Literal first, then column reference, backtracking in between.
    /// When both branches reject, each branch's own diagnostic is kept
    /// and the summarizing error becomes the terminal one.
    pub fn parse_operand(&mut self) -> Result<OperandAst, ParserError> {
        let checkpoint = self.pos;
        let first = match self.parse_literal() {
            Ok(literal) => return Ok(OperandAst::Literal(literal)),
            Err(err) => err,
        };
        self.pos = checkpoint;
        let second = match self.parse_column_ref() {
            Ok(column) => return Ok(OperandAst::Column(column)),
            Err(err) => err,
        };
        self.pos = checkpoint;
        self.errors.push(first);
        self.errors.push(second);
        Err(self.err_no_viable("a literal or a column reference"))
    }

    fn parse_comparator(&mut self) -> Result<ComparatorAst, ParserError> {
        let span = self.current_span();
        let op = match self.peek() {
            TokenKind::Eq => CompareOp::Eq,
            TokenKind::Ne => CompareOp::Ne,
            TokenKind::Lt => CompareOp::Lt,
            TokenKind::Gt => CompareOp::Gt,
            _ => return Err(self.err_no_viable("one of `=`, `!=`, `<`, `>`")),
        };
        self.advance();
        Ok(ComparatorAst { op, span })
    }

    // -----------------------------------------------------------------------
    // Leaf rules
    // -----------------------------------------------------------------------

    pub fn parse_identifier(&mut self) -> Result<IdentifierAst, ParserError> {
        let (name, span) = match self.peek() {
            TokenKind::Id(name) | TokenKind::QuotedId(name) => {
                (name.clone(), self.current_span())
            }
            _ => return Err(self.err_expected("an identifier")),
        };
        self.advance();
        Ok(IdentifierAst::new(name, span))
    }

    pub fn parse_literal(&mut self) -> Result<LiteralAst, ParserError> {
        let span = self.current_span();
        let literal = match self.peek() {
            TokenKind::Integer(value) => LiteralAst::Integer {
                value: *value,
                span,
            },
            TokenKind::Float(value) => LiteralAst::Float {
                value: *value,
                span,
            },
            TokenKind::String(value) => LiteralAst::String {
                value: value.clone(),
                span,
            },
            TokenKind::Boolean(value) => LiteralAst::Boolean {
                value: *value,
                span,
            },
            _ => return Err(self.err_expected("a literal")),
        };
        self.advance();
        Ok(literal)
    }
}

// ---------------------------------------------------------------------------
// Qualifier resolution
// ---------------------------------------------------------------------------

/// How many leading qualifier slots a dotted reference offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QualifierArity {
    /// `[schema .] table`
    Table,
    /// `[[schema .] table .] column` (also used for qualified wildcards)
    Column,
}

/// Leading qualifiers bound to their named slots.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ResolvedQualifiers {
    pub schema: Option<IdentifierAst>,
    pub table: Option<IdentifierAst>,
}

/// Bind optimistically consumed qualifiers to slots, most general first,
/// then shift toward the specific end when slots went unfilled. A lone
/// qualifier ahead of a column names the immediately-enclosing table, so
/// `users.id` is table `users` and column `id`, never schema `users`.
pub(crate) fn resolve_qualifiers(
    segments: Vec<IdentifierAst>,
    arity: QualifierArity,
) -> ResolvedQualifiers {
    let mut segments = segments.into_iter();
    match arity {
        QualifierArity::Table => ResolvedQualifiers {
            schema: segments.next(),
            table: None,
        },
        QualifierArity::Column => match (segments.next(), segments.next()) {
            (Some(schema), Some(table)) => ResolvedQualifiers {
                schema: Some(schema),
                table: Some(table),
            },
            (Some(table), None) => ResolvedQualifiers {
                schema: None,
                table: Some(table),
            },
            _ => ResolvedQualifiers::default(),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use slens_error::ErrorName;

    fn parser(sql: &str) -> Parser {
        Parser::new(Lexer::tokenize(sql).unwrap())
    }

    fn ident(name: &str) -> IdentifierAst {
        IdentifierAst::new(name, FALLBACK_SPAN)
    }

    fn names(quals: &ResolvedQualifiers) -> (Option<&str>, Option<&str>) {
        (
            quals.schema.as_ref().map(|id| id.name.as_str()),
            quals.table.as_ref().map(|id| id.name.as_str()),
        )
    }

    #[test]
    fn qualifier_resolution_shifts_on_underfill() {
        let quals = resolve_qualifiers(vec![], QualifierArity::Column);
        assert_eq!(names(&quals), (None, None));

        // One qualifier before a column is its table, not a schema.
        let quals = resolve_qualifiers(vec![ident("users")], QualifierArity::Column);
        assert_eq!(names(&quals), (None, Some("users")));

        let quals =
            resolve_qualifiers(vec![ident("public"), ident("users")], QualifierArity::Column);
        assert_eq!(names(&quals), (Some("public"), Some("users")));

        // One qualifier before a table really is the schema.
        let quals = resolve_qualifiers(vec![ident("public")], QualifierArity::Table);
        assert_eq!(names(&quals), (Some("public"), None));
    }

    #[test]
    fn column_ref_rule_applies_the_shift() {
        let column = parser("users.id").parse_column_ref().unwrap();
        assert!(column.schema.is_none());
        assert_eq!(column.table.unwrap().name, "users");
        assert_eq!(column.column.name, "id");

        let column = parser("public.users.id").parse_column_ref().unwrap();
        assert_eq!(column.schema.unwrap().name, "public");
        assert_eq!(column.table.unwrap().name, "users");
        assert_eq!(column.column.name, "id");
    }

    #[test]
    fn table_ref_rule_keeps_single_qualifier_as_schema() {
        let table = parser("public.users").parse_table_ref().unwrap();
        assert_eq!(table.schema.unwrap().name, "public");
        assert_eq!(table.table.name, "users");

        let table = parser("users").parse_table_ref().unwrap();
        assert!(table.schema.is_none());
    }

    #[test]
    fn chains_beyond_the_qualifier_budget_are_left_unconsumed() {
        let mut p = parser("a.b.c.d");
        let column = p.parse_column_ref().unwrap();
        assert_eq!(column.column.name, "c");
        assert!(!p.at_eof());
        assert!(p.expect_end().is_err());
    }

    #[test]
    fn result_column_parses_wildcards_with_shifted_qualifiers() {
        let column = parser("*").parse_result_column().unwrap();
        let ResultColumnAst::Wildcard(wildcard) = column else {
            unreachable!("expected wildcard");
        };
        assert!(wildcard.schema.is_none() && wildcard.table.is_none());

        let column = parser("users.*").parse_result_column().unwrap();
        let ResultColumnAst::Wildcard(wildcard) = column else {
            unreachable!("expected wildcard");
        };
        assert!(wildcard.schema.is_none());
        assert_eq!(wildcard.table.unwrap().name, "users");

        let column = parser("public.users.*").parse_result_column().unwrap();
        let ResultColumnAst::Wildcard(wildcard) = column else {
            unreachable!("expected wildcard");
        };
        assert_eq!(wildcard.schema.unwrap().name, "public");
    }

    #[test]
    fn result_column_takes_an_optional_alias() {
        let column = parser("id AS key").parse_result_column().unwrap();
        let ResultColumnAst::Column { column, alias } = column else {
            unreachable!("expected column");
        };
        assert_eq!(column.column.name, "id");
        assert_eq!(alias.unwrap().name, "key");
    }

    #[test]
    fn select_parses_all_clauses() {
        let select = parser("SELECT id, u.name AS n FROM public.users WHERE age > 21")
            .parse_select()
            .unwrap();
        assert_eq!(select.columns.len(), 2);
        assert_eq!(select.from.table.schema.as_ref().unwrap().name, "public");
        let clause = select.where_clause.unwrap();
        assert_eq!(clause.condition.op.op, CompareOp::Gt);
        let OperandAst::Literal(LiteralAst::Integer { value, .. }) = clause.condition.right
        else {
            unreachable!("expected integer literal");
        };
        assert_eq!(value, 21);
    }

    #[test]
    fn select_span_covers_keyword_through_last_clause() {
        let sql = "SELECT *\nFROM users";
        let select = parser(sql).parse_select().unwrap();
        let span = select.span();
        assert_eq!(span.offset, Extent::new(0, sql.len() - 1));
        assert_eq!(span.line, Extent::new(1, 2));
    }

    #[test]
    fn script_accepts_empty_input_and_stray_separators() {
        assert!(parser("").parse_script().unwrap().statements.is_empty());
        assert!(parser(";;  ;").parse_script().unwrap().statements.is_empty());

        let script = parser("SELECT * FROM a; SELECT * FROM b;")
            .parse_script()
            .unwrap();
        assert_eq!(script.statements.len(), 2);
    }

    #[test]
    fn script_requires_separators_between_statements() {
        let err = parser("SELECT * FROM a SELECT * FROM b")
            .parse_script()
            .unwrap_err();
        assert_eq!(err.name, ErrorName::MismatchedToken);
        assert!(err.message.contains("`;` between statements"));
    }

    #[test]
    fn statement_dispatch_rejects_unknown_commands() {
        let err = parser("DELETE FROM users").parse_statement().unwrap_err();
        assert_eq!(err.name, ErrorName::NoViableAlternative);
        assert!(err.message.contains("`SELECT`"));
        assert!(err.message.contains("identifier `DELETE`"));
    }

    #[test]
    fn missing_from_is_a_mismatched_token() {
        let err = parser("SELECT id name FROM users")
            .parse_select()
            .unwrap_err();
        assert_eq!(err.name, ErrorName::MismatchedToken);
        assert!(err.message.contains("expected `FROM`"));
        assert!(err.message.contains("identifier `name`"));
    }

    #[test]
    fn truncated_input_reports_end_of_input() {
        let err = parser("SELECT * FROM").parse_select().unwrap_err();
        assert_eq!(err.name, ErrorName::MismatchedToken);
        assert!(err.message.contains("found end of input"));
    }

    #[test]
    fn comparator_alternation_lists_supported_operators() {
        let err = parser("a <= 1").parse_condition().unwrap_err();
        assert_eq!(err.name, ErrorName::NoViableAlternative);
        assert!(err.message.contains("`=`, `!=`, `<`, `>`"));
    }

    #[test]
    fn operand_failure_keeps_both_branch_diagnostics() {
        let mut p = parser("a > >");
        let terminal = p.parse_condition().unwrap_err();
        assert_eq!(terminal.name, ErrorName::NoViableAlternative);
        let failure = p.into_failure(terminal);
        assert_eq!(failure.errors().len(), 3);
        assert_eq!(failure.errors()[0].name, ErrorName::MismatchedToken);
        assert!(failure.errors()[0].message.contains("a literal"));
        assert_eq!(failure.errors()[1].name, ErrorName::MismatchedToken);
        assert!(failure.errors()[1].message.contains("an identifier"));
        assert_eq!(failure.first().position.column.start, 5);
    }

    #[test]
    fn where_clause_condition_compares_two_columns() {
        let clause = parser("WHERE a.id = b.id").parse_where_clause().unwrap();
        let OperandAst::Column(left) = clause.condition.left else {
            unreachable!("expected column operand");
        };
        assert_eq!(left.table.unwrap().name, "a");
        assert_eq!(clause.condition.op.op, CompareOp::Eq);
    }
}
