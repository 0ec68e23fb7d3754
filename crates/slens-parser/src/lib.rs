//! Statement parsing engine for SchemaLens.
//!
//! The pipeline has three stages. A hand-built maximal-munch lexer turns
//! source text into spanned tokens, a recursive-descent [`Parser`] builds
//! the syntax-faithful tree from `slens-ast`, and the lowering pass
//! resolves that tree into the span-free statement model from
//! `slens-model`.
//!
//! Each grammar rule doubles as an entry point: [`parse_script`] accepts
//! whole inputs, while [`parse_condition`], [`parse_identifier`], &c.
//! parse exactly one fragment and fail with `RedundantInput` if anything
//! is left over. All entry points share one result envelope, so staged
//! pipelines compose with plain `Result` combinators:
//!
//! ```
//! use slens_parser::{lower_script, parse_script};
//!
//! let statements = parse_script("SELECT * FROM users;").map(lower_script)?;
//! assert_eq!(statements[0].command(), "SELECT");
//! # Ok::<(), slens_parser::ParseFailure>(())
//! ```

mod lexer;
mod lower;
mod parser;
mod token;

pub use crate::lexer::Lexer;
pub use crate::lower::{lower_condition, lower_script, lower_select, lower_statement};
pub use crate::parser::Parser;
pub use crate::token::{Token, TokenKind};
pub use slens_error::{ErrorName, ParseFailure, ParserError, ParserResult, Severity};

use slens_ast::{
    ColumnRefAst, ConditionAst, IdentifierAst, LiteralAst, ResultColumnAst, ScriptAst,
    SelectAst, StatementAst, TableRefAst, WhereClauseAst,
};
use slens_model::Statement;
use tracing::debug;

/// Lex the input, run one grammar rule, and require end of input.
fn run_rule<T>(
    sql: &str,
    rule: impl FnOnce(&mut Parser) -> Result<T, ParserError>,
) -> ParserResult<T> {
    let tokens = Lexer::tokenize(sql).map_err(ParseFailure::single)?;
    let mut parser = Parser::new(tokens);
    match rule(&mut parser) {
        Ok(node) => match parser.expect_end() {
            Ok(()) => Ok(node),
            Err(leftover) => Err(parser.into_failure(leftover)),
        },
        Err(err) => Err(parser.into_failure(err)),
    }
}

/// Parse and lower a whole input in one call.
pub fn parse(sql: &str) -> ParserResult<Vec<Statement>> {
    parse_script(sql).map(lower_script)
}

/// Parse a whole input: statements separated by `;`. Empty input, bare
/// separators, and a missing final `;` are all accepted.
pub fn parse_script(sql: &str) -> ParserResult<ScriptAst> {
    let result = run_rule(sql, Parser::parse_script);
    match &result {
        Ok(script) => debug!(statements = script.statements.len(), "parsed script"),
        Err(failure) => debug!(errors = failure.errors().len(), "script parse failed"),
    }
    result
}

/// Parse exactly one statement, without a trailing separator.
pub fn parse_statement(sql: &str) -> ParserResult<StatementAst> {
    run_rule(sql, Parser::parse_statement)
}

/// Parse one `SELECT` statement.
pub fn parse_select(sql: &str) -> ParserResult<SelectAst> {
    run_rule(sql, Parser::parse_select)
}

/// Parse one projection entry: `*`, a qualified wildcard, or a column
/// reference with an optional alias.
pub fn parse_result_column(sql: &str) -> ParserResult<ResultColumnAst> {
    run_rule(sql, Parser::parse_result_column)
}

/// Parse a table reference such as `users` or `public.users`.
pub fn parse_table_ref(sql: &str) -> ParserResult<TableRefAst> {
    run_rule(sql, Parser::parse_table_ref)
}

/// Parse a column reference such as `id`, `users.id`, or
/// `public.users.id`.
pub fn parse_column_ref(sql: &str) -> ParserResult<ColumnRefAst> {
    run_rule(sql, Parser::parse_column_ref)
}

/// Parse a `WHERE` clause including its keyword.
pub fn parse_where_clause(sql: &str) -> ParserResult<WhereClauseAst> {
    run_rule(sql, Parser::parse_where_clause)
}

/// Parse a bare comparison such as `age > 21`.
pub fn parse_condition(sql: &str) -> ParserResult<ConditionAst> {
    run_rule(sql, Parser::parse_condition)
}

/// Parse a single bare or quoted identifier.
pub fn parse_identifier(sql: &str) -> ParserResult<IdentifierAst> {
    run_rule(sql, Parser::parse_identifier)
}

/// Parse a single literal scalar.
pub fn parse_literal(sql: &str) -> ParserResult<LiteralAst> {
    run_rule(sql, Parser::parse_literal)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use slens_ast::Extent;

    #[test]
    fn empty_input_parses_to_an_empty_script() {
        let script = parse_script("").unwrap();
        assert!(script.statements.is_empty());
        assert_eq!(parse("").unwrap(), Vec::new());
    }

    #[test]
    fn fragment_entry_points_reject_leftover_input() {
        let failure = parse_identifier("bad col").unwrap_err();
        assert_eq!(failure.errors().len(), 1);
        let err = failure.first();
        assert_eq!(err.name, ErrorName::RedundantInput);
        assert!(err.message.contains("expected end of input"));
        assert!(err.message.contains("identifier `col`"));
        assert_eq!(err.position.column.start, 5);
        assert_eq!(err.position.offset, Extent::new(4, 6));
    }

    #[test]
    fn fragment_entry_points_parse_their_fragment() {
        assert_eq!(parse_identifier("users").unwrap().name, "users");

        let column = parse_column_ref("users.id").unwrap();
        assert_eq!(column.table.unwrap().name, "users");
        assert!(column.schema.is_none());

        let table = parse_table_ref("public.users").unwrap();
        assert_eq!(table.schema.unwrap().name, "public");

        let clause = parse_where_clause("WHERE id = 1").unwrap();
        assert_eq!(clause.condition.op.op, slens_ast::CompareOp::Eq);
    }

    #[test]
    fn quoted_forms_reach_the_caller_unescaped() {
        let literal = parse_literal(r"'It\'s'").unwrap();
        let LiteralAst::String { value, .. } = literal else {
            unreachable!("expected string literal");
        };
        assert_eq!(value, "It's");

        let ident = parse_identifier(r#""my \"new\" col""#).unwrap();
        assert_eq!(ident.name, r#"my "new" col"#);
    }

    #[test]
    fn lexer_failures_use_the_same_envelope() {
        let failure = parse_select("SELECT # FROM t").unwrap_err();
        assert_eq!(failure.errors().len(), 1);
        assert_eq!(failure.first().name, ErrorName::LexingError);
    }

    #[test]
    fn map_over_a_failure_is_absorbing() {
        let statements = parse_script("SELECT").map(lower_script);
        let failure = statements.unwrap_err();
        assert_eq!(failure.first().name, ErrorName::NoViableAlternative);
        assert!(failure.first().message.contains("found end of input"));
    }

    #[test]
    fn parse_lowers_whole_scripts() {
        let statements = parse("SELECT id FROM a; SELECT name FROM b;").unwrap();
        assert_eq!(statements.len(), 2);
        assert!(statements.iter().all(|s| s.command() == "SELECT"));
    }
}
