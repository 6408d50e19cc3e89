#[cfg(test)]
mod scanner_tests {
    use treelox as lox;

    use lox::scanner::*;
    use lox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source.as_bytes());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_operators_maximal_munch() {
        assert_token_sequence(
            "! != = == < <= > >=",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_keywords_and_identifiers() {
        assert_token_sequence(
            "var language = lox;",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "language"),
                (TokenType::EQUAL, "="),
                (TokenType::IDENTIFIER, "lox"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_string_literal_value() {
        let scanner = Scanner::new(b"\"hello world\"");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].lexeme, "\"hello world\"");

        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "hello world"),
            other => panic!("expected STRING, got {:?}", other),
        }
    }

    #[test]
    fn test_scanner_05_multiline_string_tracks_lines() {
        let scanner = Scanner::new(b"\"line one\nline two\"\nfoo");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].line, 2); // string token reported at its closing line
        assert_eq!(tokens[1].lexeme, "foo");
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn test_scanner_06_unterminated_string() {
        let scanner = Scanner::new(b"\"never closed");
        let results: Vec<_> = scanner.collect();

        // One error, then the EOF token.
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert!(results[0]
            .as_ref()
            .unwrap_err()
            .to_string()
            .contains("Unterminated string"));
        assert_eq!(results[1].as_ref().unwrap().token_type, TokenType::EOF);
    }

    #[test]
    fn test_scanner_07_number_values() {
        let scanner = Scanner::new(b"123 3.14");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), 3);

        match tokens[0].token_type {
            TokenType::NUMBER(n) => assert_eq!(n, 123.0),
            ref other => panic!("expected NUMBER, got {:?}", other),
        }

        match tokens[1].token_type {
            TokenType::NUMBER(n) => assert_eq!(n, 3.14),
            ref other => panic!("expected NUMBER, got {:?}", other),
        }
    }

    #[test]
    fn test_scanner_08_trailing_dot_not_consumed() {
        // "123." is NUMBER(123) followed by DOT; the fraction needs a digit.
        assert_token_sequence(
            "123.",
            &[
                (TokenType::NUMBER(0.0), "123"),
                (TokenType::DOT, "."),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_09_line_comment_skipped() {
        assert_token_sequence(
            "1 // 2 3 4\n5",
            &[
                (TokenType::NUMBER(0.0), "1"),
                (TokenType::NUMBER(0.0), "5"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_10_nested_block_comment_is_one_comment() {
        assert_token_sequence(
            "before /* a /* b */ c */ after",
            &[
                (TokenType::IDENTIFIER, "before"),
                (TokenType::IDENTIFIER, "after"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_11_unterminated_block_comment_single_error() {
        let scanner = Scanner::new(b"x /* never\ncloses");
        let results: Vec<_> = scanner.collect();

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 1, "Expected exactly 1 error message");

        let err = results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .next()
            .unwrap();
        assert!(err.to_string().contains("Unterminated block comment"));
        assert!(err.to_string().contains("[line 2]"));
    }

    #[test]
    fn test_scanner_12_eof_exactly_once_with_final_line() {
        let scanner = Scanner::new(b"var a = 1;\nvar b = 2;\n");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        let eofs: Vec<_> = tokens
            .iter()
            .filter(|t| t.token_type == TokenType::EOF)
            .collect();

        assert_eq!(eofs.len(), 1);
        assert_eq!(tokens.last().unwrap().token_type, TokenType::EOF);
        assert_eq!(tokens.last().unwrap().line, 3);
    }

    #[test]
    fn test_scanner_13_errors_do_not_stop_scanning() {
        let source = ",.$(#";
        let scanner = Scanner::new(source.as_bytes());
        let results: Vec<_> = scanner.collect();

        // 3 tokens, 2 errors, 1 EOF.
        assert_eq!(results.len(), 6);

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2);

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character"),
                "Error message should contain 'Unexpected character', got: {}",
                err
            );
        }

        assert_eq!(
            results.last().unwrap().as_ref().unwrap().token_type,
            TokenType::EOF
        );
    }

    #[test]
    fn test_scanner_14_token_display_form() {
        let scanner = Scanner::new(b"3 2.5 \"hi\" var");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        let rendered: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();

        assert_eq!(rendered[0], "NUMBER 3 3.0");
        assert_eq!(rendered[1], "NUMBER 2.5 2.5");
        assert_eq!(rendered[2], "STRING \"hi\" hi");
        assert_eq!(rendered[3], "VAR var null");
        assert_eq!(rendered[4], "EOF  null");
    }

    #[test]
    fn test_scanner_15_token_serializes_to_json() {
        let scanner = Scanner::new(b"print");
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        let json = serde_json::to_string(&tokens[0]).unwrap();

        assert!(json.contains("\"lexeme\":\"print\""));
        assert!(json.contains("\"line\":1"));
    }
}
