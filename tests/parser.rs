#[cfg(test)]
mod parser_tests {
    use treelox as lox;

    use lox::ast::{Expr, LiteralValue, Stmt};
    use lox::ast_printer::AstPrinter;
    use lox::parser::Parser;
    use lox::scanner::Scanner;
    use lox::token::Token;

    fn tokens(source: &str) -> Vec<Token> {
        Scanner::new(source.as_bytes())
            .filter_map(Result::ok)
            .collect()
    }

    /// Parse one expression and render it in prefix form.
    fn printed(source: &str) -> String {
        let toks = tokens(source);
        let mut parser = Parser::new(&toks);
        let expr = parser.parse_expression().unwrap();

        AstPrinter::print(&expr)
    }

    fn parse_program(source: &str) -> Vec<Stmt> {
        let toks = tokens(source);
        Parser::new(&toks).parse().unwrap()
    }

    #[test]
    fn test_parser_01_term_vs_factor_precedence() {
        assert_eq!(printed("1 + 2 * 3"), "(+ 1.0 (* 2.0 3.0))");
        assert_eq!(printed("1 * 2 + 3"), "(+ (* 1.0 2.0) 3.0)");
    }

    #[test]
    fn test_parser_02_left_associativity() {
        assert_eq!(printed("1 - 2 - 3"), "(- (- 1.0 2.0) 3.0)");
        assert_eq!(printed("8 / 4 / 2"), "(/ (/ 8.0 4.0) 2.0)");
    }

    #[test]
    fn test_parser_03_grouping_overrides_precedence() {
        assert_eq!(printed("(1 + 2) * 3"), "(* (group (+ 1.0 2.0)) 3.0)");
    }

    #[test]
    fn test_parser_04_unary_binds_tighter_than_binary() {
        assert_eq!(printed("-1 - -2"), "(- (- 1.0) (- 2.0))");
        assert_eq!(printed("!true == false"), "(== (! true) false)");
    }

    #[test]
    fn test_parser_05_comparison_vs_equality() {
        assert_eq!(printed("1 < 2 == 3 >= 4"), "(== (< 1.0 2.0) (>= 3.0 4.0))");
    }

    #[test]
    fn test_parser_06_logical_or_binds_looser_than_and() {
        assert_eq!(printed("a or b and c"), "(or a (and b c))");
    }

    #[test]
    fn test_parser_07_assignment_is_right_associative() {
        assert_eq!(printed("a = b = 1"), "(= a (= b 1.0))");
    }

    #[test]
    fn test_parser_08_calls_and_properties_chain() {
        assert_eq!(printed("a.b(1).c"), "(. (call (. a b) 1.0) c)");
        assert_eq!(printed("f()()"), "(call (call f))");
    }

    #[test]
    fn test_parser_09_set_expression() {
        assert_eq!(printed("a.b = 2"), "(= (. a b) 2.0)");
    }

    #[test]
    fn test_parser_10_super_and_this() {
        assert_eq!(printed("super.greet(this)"), "(call (super greet) this)");
    }

    #[test]
    fn test_parser_11_invalid_assignment_target() {
        let toks = tokens("1 = 2;");
        let errors = Parser::new(&toks).parse().unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("Invalid assignment target"));
    }

    #[test]
    fn test_parser_12_errors_accumulate_across_statements() {
        // Two independent malformed statements, a valid one in between.
        let toks = tokens("var 1 = 2;\nprint 3;\nvar = 4;");
        let errors = Parser::new(&toks).parse().unwrap_err();

        assert_eq!(errors.len(), 2);

        for err in &errors {
            assert!(err.to_string().contains("Expected variable name"));
        }
    }

    #[test]
    fn test_parser_13_for_desugars_to_block_and_while() {
        let program = parse_program("for (var i = 0; i < 3; i = i + 1) print i;");

        assert_eq!(program.len(), 1);

        // { var i = 0; while (i < 3) { print i; i = i + 1; } }
        let outer = match &program[0] {
            Stmt::Block(stmts) => stmts,
            other => panic!("expected Block, got {:?}", other),
        };

        assert_eq!(outer.len(), 2);
        assert!(matches!(outer[0], Stmt::Var { .. }));

        let (condition, body) = match &outer[1] {
            Stmt::While { condition, body } => (condition, body),
            other => panic!("expected While, got {:?}", other),
        };

        assert!(matches!(condition, Expr::Binary { .. }));

        let inner = match body.as_ref() {
            Stmt::Block(stmts) => stmts,
            other => panic!("expected Block body, got {:?}", other),
        };

        assert_eq!(inner.len(), 2);
        assert!(matches!(inner[0], Stmt::Print(_)));
        assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
    }

    #[test]
    fn test_parser_14_for_without_clauses_is_bare_while_true() {
        let program = parse_program("for (;;) print 1;");

        assert_eq!(program.len(), 1);

        // No initializer and no increment: no wrapping blocks appear.
        match &program[0] {
            Stmt::While { condition, body } => {
                assert!(matches!(condition, Expr::Literal(LiteralValue::True)));
                assert!(matches!(body.as_ref(), Stmt::Print(_)));
            }

            other => panic!("expected While, got {:?}", other),
        }
    }

    #[test]
    fn test_parser_15_class_declaration_shape() {
        let program = parse_program("class B < A { init(x) { this.x = x; } greet() {} }");

        match &program[0] {
            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                assert_eq!(name.lexeme, "B");
                assert!(matches!(superclass, Some(Expr::Variable { .. })));
                assert_eq!(methods.len(), 2);
                assert_eq!(methods[0].name.lexeme, "init");
                assert_eq!(methods[0].params.len(), 1);
                assert_eq!(methods[1].name.lexeme, "greet");
            }

            other => panic!("expected Class, got {:?}", other),
        }
    }

    #[test]
    fn test_parser_16_argument_limit() {
        let args = (0..256)
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let source = format!("f({});", args);

        let toks = tokens(&source);
        let errors = Parser::new(&toks).parse().unwrap_err();

        assert!(errors[0]
            .to_string()
            .contains("Cannot have more than 255 arguments"));
    }

    #[test]
    fn test_parser_17_expression_ids_are_unique() {
        let toks = tokens("a = a + b;");
        let mut parser = Parser::new(&toks);
        let program = parser.parse().unwrap();

        // Four ids: the target parsed as a variable before rewriting into
        // an assignment, the two reads on the right, and the assignment.
        assert_eq!(parser.next_id(), 4);
        drop(program);

        // A second parser threading the counter starts past them.
        let toks2 = tokens("c;");
        let mut parser2 = Parser::with_start_id(&toks2, parser.next_id());
        parser2.parse().unwrap();

        assert_eq!(parser2.next_id(), 5);
    }
}
