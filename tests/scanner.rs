#[cfg(test)]
mod scanner_tests {
    use lazy_fstring as lf;

    use lf::error::LazyError;
    use lf::scanner::*;
    use lf::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source, 0);
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
            "([*.,+%])",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACKET, "["),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::PERCENT, "%"),
                (TokenType::RIGHT_BRACKET, "]"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_scanner_02_operators_and_keywords() {
        assert_token_sequence(
            "a != b == not c <= 1.5 and true or nil",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::NOT, "not"),
                (TokenType::IDENTIFIER, "c"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::NUMBER(0.0), "1.5"),
                (TokenType::AND, "and"),
                (TokenType::TRUE, "true"),
                (TokenType::OR, "or"),
                (TokenType::NIL, "nil"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_string_literals_and_escapes() {
        let tokens = tokenize(r#"'it\'s' "a\tb""#, 0).unwrap();

        assert_eq!(tokens.len(), 3);
        match &tokens[0].token_type {
            TokenType::STRING(s) => assert_eq!(s, "it's"),
            other => panic!("expected string, got {:?}", other),
        }
        match &tokens[1].token_type {
            TokenType::STRING(s) => assert_eq!(s, "a\tb"),
            other => panic!("expected string, got {:?}", other),
        }
    }

    #[test]
    fn test_offsets_are_template_relative() {
        let tokens = tokenize("x + y", 10).unwrap();

        let offsets: Vec<usize> = tokens.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![10, 12, 14, 15]);
    }

    #[test]
    fn test_assignment_and_format_spec_rejected() {
        let err = tokenize("x = 1", 0).unwrap_err();
        assert!(matches!(err, LazyError::Lex { offset: 2, .. }), "{:?}", err);
        assert!(err.to_string().contains("Assignment is not allowed"));

        let err = tokenize("x:>10", 0).unwrap_err();
        assert!(err.to_string().contains("Format specifiers are not supported"));
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("'abc", 4).unwrap_err();
        assert!(matches!(err, LazyError::Lex { offset: 4, .. }), "{:?}", err);
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let results: Vec<_> = Scanner::new(",.$(#é", 0).collect();

        // COMMA, DOT, error '$', LEFT_PAREN, error '#', error 'é', EOF
        assert_eq!(results.len(), 7, "Expected 7 items in result");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 3, "Expected 3 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character"),
                "got: {}",
                err
            );
        }

        assert!(matches!(
            results.last(),
            Some(Ok(Token {
                token_type: TokenType::EOF,
                ..
            }))
        ));
    }

    #[test]
    fn test_token_display() {
        let tokens = tokenize("3 'hi' name", 0).unwrap();
        let printed: Vec<String> = tokens.iter().map(ToString::to_string).collect();

        assert_eq!(
            printed,
            vec!["NUMBER 3 3.0", "STRING 'hi' hi", "IDENTIFIER name null", "EOF  null"]
        );
    }

    #[test]
    fn test_large_whole_number_display() {
        let tokens = tokenize("99999999999999999999 12", 0).unwrap();

        assert_eq!(
            tokens[0].to_string(),
            "NUMBER 99999999999999999999 100000000000000000000.0"
        );
        assert_eq!(tokens[1].to_string(), "NUMBER 12 12.0");
    }
}
