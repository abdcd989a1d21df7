#[cfg(test)]
mod tests {
    use super::super::tokens::{Lex, Token};
    use super::super::{Lexer, LexerError};

    fn ok_tokens(text: &str) -> Vec<Token> {
        Lexer::new(text)
            .tokenize()
            .into_iter()
            .map(|t| t.expect("expected a valid token"))
            .collect()
    }

    #[test]
    fn scans_integers() {
        let tokens = ok_tokens("5 0 123");
        assert_eq!(tokens[0], Token::new(Lex::IntLit("5".into()), 1));
        assert_eq!(tokens[1], Token::new(Lex::IntLit("0".into()), 1));
        assert_eq!(tokens[2], Token::new(Lex::IntLit("123".into()), 1));
    }

    #[test]
    fn rejects_leading_zero_integers() {
        let items = Lexer::new("012").tokenize();
        assert_eq!(
            items[0],
            Err(LexerError::InvalidNumber("012".into(), 1))
        );
    }

    #[test]
    fn scans_floats_with_exponents() {
        let tokens = ok_tokens("1.05 12.0 1.5e-7");
        assert_eq!(tokens[0], Token::new(Lex::FloatLit("1.05".into()), 1));
        assert_eq!(tokens[1], Token::new(Lex::FloatLit("12.0".into()), 1));
        assert_eq!(tokens[2], Token::new(Lex::FloatLit("1.5e-7".into()), 1));
    }

    #[test]
    fn rejects_trailing_zero_fractions() {
        let items = Lexer::new("1.50").tokenize();
        assert!(matches!(items[0], Err(LexerError::InvalidNumber(..))));
    }

    #[test]
    fn scans_keywords_and_identifiers() {
        let tokens = ok_tokens("struct POINT inherits SHAPE self x1");
        assert_eq!(tokens[0].lex, Lex::Struct);
        assert_eq!(tokens[1].lex, Lex::Id("POINT".into()));
        assert_eq!(tokens[2].lex, Lex::Inherits);
        assert_eq!(tokens[3].lex, Lex::Id("SHAPE".into()));
        assert_eq!(tokens[4].lex, Lex::SelfWord);
        assert_eq!(tokens[5].lex, Lex::Id("x1".into()));
    }

    #[test]
    fn distinguishes_compound_operators() {
        let tokens = ok_tokens("= == <> < <= > >=");
        let expected = [
            Lex::Assign,
            Lex::Eq,
            Lex::NEq,
            Lex::Lt,
            Lex::LEq,
            Lex::Gt,
            Lex::GEq,
        ];
        for (token, lex) in tokens.iter().zip(expected.iter()) {
            assert_eq!(&token.lex, lex);
        }
    }

    #[test]
    fn skips_comments_and_counts_lines() {
        let text = "let // trailing\n/* block\nspanning */ x";
        let tokens = ok_tokens(text);
        assert_eq!(tokens[0], Token::new(Lex::Let, 1));
        assert_eq!(tokens[1], Token::new(Lex::Id("x".into()), 3));
    }

    #[test]
    fn block_comments_nest() {
        let tokens = ok_tokens("/* outer /* inner */ still out */ 7");
        assert_eq!(tokens[0].lex, Lex::IntLit("7".into()));
    }

    #[test]
    fn reports_unterminated_comment() {
        let items = Lexer::new("/* never closed").tokenize();
        assert_eq!(items[0], Err(LexerError::UnterminatedComment(1)));
    }

    #[test]
    fn reports_invalid_characters() {
        let items = Lexer::new("a # b").tokenize();
        assert!(items
            .iter()
            .any(|t| matches!(t, Err(LexerError::InvalidCharacter('#', 1)))));
    }
}
