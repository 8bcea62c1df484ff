use rox::ast_printer::AstPrinter;
use rox::error::ErrorReporter;
use rox::parser::Parser;
use rox::scanner::Scanner;
use rox::stmt::Stmt;
use rox::token::Token;

fn parse(source: &str) -> (Vec<Stmt>, bool) {
    let reporter = ErrorReporter::new();

    let tokens: Vec<Token> = Scanner::new(source.as_bytes())
        .filter_map(Result::ok)
        .collect();

    let mut parser = Parser::new(tokens, &reporter, false);
    let statements = parser.parse();

    (statements, reporter.had_error())
}

/// Parse a single expression statement and render it in prefix form.
fn parse_expr(source: &str) -> String {
    let (statements, had_error) = parse(source);

    assert!(!had_error, "unexpected parse error in {:?}", source);
    assert_eq!(statements.len(), 1);

    match &statements[0] {
        Stmt::Expression(expr) => AstPrinter::print(expr),
        other => panic!("expected expression statement, got {:?}", other),
    }
}

#[test]
fn precedence_factor_binds_tighter_than_term() {
    assert_eq!(parse_expr("1 + 2 * 3;"), "(+ 1.0 (* 2.0 3.0))");
}

#[test]
fn grouping_overrides_precedence() {
    assert_eq!(parse_expr("(1 + 2) * 3;"), "(* (group (+ 1.0 2.0)) 3.0)");
}

#[test]
fn unary_is_right_associative() {
    assert_eq!(parse_expr("!!true;"), "(! (! true))");
    assert_eq!(parse_expr("--1;"), "(- (- 1.0))");
}

#[test]
fn comparison_and_equality_chain_left() {
    assert_eq!(parse_expr("1 < 2 == 3 >= 4;"), "(== (< 1.0 2.0) (>= 3.0 4.0))");
}

#[test]
fn logical_or_binds_looser_than_and() {
    assert_eq!(parse_expr("a or b and c;"), "(or a (and b c))");
}

#[test]
fn assignment_is_right_associative() {
    assert_eq!(parse_expr("a = b = 1;"), "(= a (= b 1.0))");
}

#[test]
fn property_chains_and_calls() {
    assert_eq!(parse_expr("obj.field;"), "(. obj field)");
    assert_eq!(parse_expr("obj.method(1, 2);"), "(call (. obj method) 1.0 2.0)");
    assert_eq!(parse_expr("f()();"), "(call (call f))");
    assert_eq!(parse_expr("obj.a.b = 1;"), "(= (. (. obj a) b) 1.0)");
}

#[test]
fn this_and_super_parse_inside_expressions() {
    assert_eq!(parse_expr("this.x;"), "(. this x)");
    assert_eq!(parse_expr("super.cook();"), "(call (super cook))");
}

#[test]
fn invalid_assignment_target_is_reported_but_parsing_continues() {
    let (statements, had_error) = parse("1 + 2 = 3; print 4;");

    assert!(had_error);
    // The bad assignment still yields its LHS, and the next statement parses.
    assert_eq!(statements.len(), 2);
}

#[test]
fn for_loop_desugars_to_while() {
    let (statements, had_error) = parse("for (var i = 0; i < 3; i = i + 1) print i;");

    assert!(!had_error);
    assert_eq!(statements.len(), 1);

    // { var i = 0; while (i < 3) { print i; i = i + 1; } }
    let Stmt::Block(outer) = &statements[0] else {
        panic!("expected desugared block, got {:?}", statements[0]);
    };

    assert_eq!(outer.len(), 2);
    assert!(matches!(outer[0], Stmt::Var { .. }));

    let Stmt::While { body, .. } = &outer[1] else {
        panic!("expected while loop, got {:?}", outer[1]);
    };

    let Stmt::Block(inner) = body.as_ref() else {
        panic!("expected block body, got {:?}", body);
    };

    assert_eq!(inner.len(), 2);
    assert!(matches!(inner[0], Stmt::Print(_)));
    assert!(matches!(inner[1], Stmt::Expression(_)));
}

#[test]
fn for_loop_without_clauses_desugars_to_bare_while() {
    let (statements, had_error) = parse("for (;;) print 1;");

    assert!(!had_error);
    assert!(matches!(statements[0], Stmt::While { .. }));
}

#[test]
fn class_with_superclass_and_methods() {
    let (statements, had_error) = parse("class B < A { init(x) {} cook() {} }");

    assert!(!had_error);

    let Stmt::Class {
        name,
        superclass,
        methods,
    } = &statements[0]
    else {
        panic!("expected class declaration, got {:?}", statements[0]);
    };

    assert_eq!(name.lexeme, "B");
    assert!(superclass.is_some());
    assert_eq!(methods.len(), 2);
    assert_eq!(methods[0].name.lexeme, "init");
    assert_eq!(methods[0].params.len(), 1);
    assert_eq!(methods[1].name.lexeme, "cook");
}

#[test]
fn parse_error_synchronizes_to_next_statement() {
    let (statements, had_error) = parse("var = 1; print 2;");

    assert!(had_error);
    assert_eq!(statements.len(), 1);
    assert!(matches!(statements[0], Stmt::Print(_)));
}

#[test]
fn missing_semicolon_is_an_error_in_file_mode() {
    let (_, had_error) = parse("1 + 2");

    assert!(had_error);
}

#[test]
fn repl_mode_allows_trailing_expression_without_semicolon() {
    let reporter = ErrorReporter::new();

    let tokens: Vec<Token> = Scanner::new(b"1 + 2".as_slice())
        .filter_map(Result::ok)
        .collect();

    let mut parser = Parser::new(tokens, &reporter, true);
    let statements = parser.parse();

    assert!(!reporter.had_error());
    assert_eq!(statements.len(), 1);
    assert!(matches!(statements[0], Stmt::Expression(_)));
}

#[test]
fn return_without_value_parses() {
    let (statements, had_error) = parse("fun f() { return; }");

    assert!(!had_error);

    let Stmt::Function(decl) = &statements[0] else {
        panic!("expected function declaration");
    };

    assert!(matches!(decl.body[0], Stmt::Return { value: None, .. }));
}
