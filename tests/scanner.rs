#[cfg(test)]
mod scanner_tests {
    use rox::error::LoxError;
    use rox::scanner::*;
    use rox::token::*;

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
    fn test_scanner_02_operators() {
        assert_token_sequence(
            "! != = == < <= > >= - + ; /",
            &[
                (TokenType::BANG, "!"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::EQUAL, "="),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::LESS, "<"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::GREATER, ">"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::MINUS, "-"),
                (TokenType::PLUS, "+"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::SLASH, "/"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_03_comments_are_skipped() {
        assert_token_sequence(
            "var x; // the rest of this line disappears\nprint x;",
            &[
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::PRINT, "print"),
                (TokenType::IDENTIFIER, "x"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_04_keywords_and_identifiers() {
        assert_token_sequence(
            "class fun for if nil orchid whileAway _under score99",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::FUN, "fun"),
                (TokenType::FOR, "for"),
                (TokenType::IF, "if"),
                (TokenType::NIL, "nil"),
                (TokenType::IDENTIFIER, "orchid"),
                (TokenType::IDENTIFIER, "whileAway"),
                (TokenType::IDENTIFIER, "_under"),
                (TokenType::IDENTIFIER, "score99"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_05_number_literals() {
        let scanner = Scanner::new(b"12 3.5 0.25 7.".as_slice());
        let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

        let numbers: Vec<f64> = tokens
            .iter()
            .filter_map(|t| match t.token_type {
                TokenType::NUMBER(n) => Some(n),
                _ => None,
            })
            .collect();

        assert_eq!(numbers, vec![12.0, 3.5, 0.25, 7.0]);

        // The trailing '.' is its own token, not part of the number.
        assert!(tokens
            .iter()
            .any(|t| t.token_type == TokenType::DOT && t.lexeme == "."));
    }

    #[test]
    fn test_scanner_06_string_literals() {
        let scanner = Scanner::new(b"\"hello world\"".as_slice());
        let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), 2);

        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "hello world"),
            other => panic!("expected string token, got {:?}", other),
        }

        assert_eq!(tokens[0].lexeme, "\"hello world\"");
    }

    #[test]
    fn test_scanner_07_multiline_string_counts_lines() {
        let scanner = Scanner::new(b"\"one\ntwo\"\nident".as_slice());
        let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

        // The string closes on line 2, the identifier sits on line 3.
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn test_scanner_08_unterminated_string() {
        let scanner = Scanner::new(b"\"not closed".as_slice());
        let results: Vec<_> = scanner.collect();

        let err = results
            .iter()
            .find_map(|r| r.as_ref().err())
            .expect("expected a lexical error");

        assert_eq!(err.to_string(), "[line 1] Error: Unterminated string.");
    }

    #[test]
    fn test_scanner_09_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source.as_bytes());

        let results: Vec<Result<Token, LoxError>> = scanner.collect();

        // ',', '.', error for '$', '(', error for '#', EOF.
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character."),
                "Error message should contain 'Unexpected character.', got: {}",
                err
            );
        }

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(token.token_type, expected_type);
                    assert_eq!(token.lexeme, expected_lexeme);
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_scanner_10_token_display_format() {
        let scanner = Scanner::new(b"foo 1.5 25 \"hi\"".as_slice());
        let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens[0].to_string(), "IDENTIFIER foo null");
        assert_eq!(tokens[1].to_string(), "NUMBER 1.5 1.5");
        assert_eq!(tokens[2].to_string(), "NUMBER 25 25.0");
        assert_eq!(tokens[3].to_string(), "STRING \"hi\" hi");
    }

    #[test]
    fn test_scanner_11_line_numbers() {
        let scanner = Scanner::new(b"one\ntwo\n\nthree".as_slice());
        let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 2, 4, 4]);
    }

    #[test]
    fn test_scanner_12_eof_is_final_token() {
        let scanner = Scanner::new(b"1 + 2".as_slice());
        let tokens: Vec<Token> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.last().map(|t| t.token_type.clone()), Some(TokenType::EOF));
        assert_eq!(tokens.last().map(|t| t.lexeme.clone()), Some(String::new()));
    }
}
