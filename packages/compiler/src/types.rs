//! Skipping of TypeScript type syntax. Types are never checked, only
//! recognised well enough to step over them.

use crate::error::CompileResult;
use crate::parser::Parser;
use crate::tokenizer::Token;

impl<'src> Parser<'src> {
    /// Skip a type annotation
    pub(crate) fn skip_type(&mut self) -> CompileResult<()> {
        self.skip_union(true)
    }

    /// Skip an arrow function's return type. A parenthesised group followed
    /// by `=>` belongs to the arrow, not to the type.
    pub(crate) fn skip_return_type(&mut self) -> CompileResult<()> {
        self.skip_union(false)
    }

    fn skip_union(&mut self, allow_function: bool) -> CompileResult<()> {
        let _ = self.match_token(Token::Pipe) || self.match_token(Token::Amp);
        self.skip_type_operand(allow_function)?;
        while self.match_token(Token::Pipe) || self.match_token(Token::Amp) {
            self.skip_type_operand(allow_function)?;
        }
        Ok(())
    }

    fn skip_type_operand(&mut self, allow_function: bool) -> CompileResult<()> {
        match self.peek() {
            Some(Token::LParen) => {
                self.skip_balanced()?;
                if allow_function && self.match_token(Token::Arrow) {
                    self.skip_union(allow_function)?;
                }
            }
            Some(Token::Lt) if allow_function => {
                // Generic function type: `<T>(value: T) => T`
                self.skip_type_params()?;
                self.skip_balanced()?;
                self.expect(Token::Arrow, "'=>'")?;
                self.skip_union(allow_function)?;
            }
            Some(Token::LBrace) | Some(Token::LBracket) => self.skip_balanced()?,
            Some(Token::String(_))
            | Some(Token::Number(_))
            | Some(Token::Template(_))
            | Some(Token::True)
            | Some(Token::False)
            | Some(Token::Null)
            | Some(Token::Undefined) => {
                self.advance()?;
            }
            Some(Token::Minus) => {
                self.advance()?;
                self.advance()?;
            }
            Some(Token::Typeof) => {
                self.advance()?;
                self.skip_dotted_name()?;
            }
            Some(Token::New) => {
                self.advance()?;
                self.skip_balanced()?;
                self.expect(Token::Arrow, "'=>'")?;
                self.skip_union(allow_function)?;
            }
            Some(Token::Ident("keyof")) | Some(Token::Ident("readonly")) | Some(Token::Ident("unique")) => {
                self.advance()?;
                self.skip_type_operand(allow_function)?;
            }
            Some(Token::Ident(_)) | Some(Token::Function) => {
                self.skip_dotted_name()?;
                if self.check(Token::Lt) {
                    self.skip_type_args()?;
                }
            }
            _ => return Err(self.unexpected("type")),
        }

        // Array and indexed access types: `T[]`, `T["key"]`
        while self.check(Token::LBracket) && !self.newline_before() {
            self.skip_balanced()?;
        }
        Ok(())
    }

    fn skip_dotted_name(&mut self) -> CompileResult<()> {
        self.advance()?;
        while self.check(Token::Dot) {
            self.advance()?;
            self.advance()?;
        }
        Ok(())
    }

    /// Skip `<A, B<C>>` type arguments
    pub(crate) fn skip_type_args(&mut self) -> CompileResult<()> {
        self.expect(Token::Lt, "'<'")?;
        loop {
            self.skip_type()?;
            if !self.match_token(Token::Comma) {
                break;
            }
            if self.check(Token::Gt) {
                break;
            }
        }
        self.expect(Token::Gt, "'>'")?;
        Ok(())
    }

    /// Skip `<T extends X = Y, U>` type parameters
    pub(crate) fn skip_type_params(&mut self) -> CompileResult<()> {
        self.expect(Token::Lt, "'<'")?;
        while !self.match_token(Token::Gt) {
            self.expect_ident()?;
            if self.match_ident("extends") {
                self.skip_type()?;
            }
            if self.match_token(Token::Eq) {
                self.skip_type()?;
            }
            if !self.match_token(Token::Comma) {
                self.expect(Token::Gt, "'>'")?;
                break;
            }
        }
        Ok(())
    }

    /// Skip a bracketed group, including everything nested inside it
    pub(crate) fn skip_balanced(&mut self) -> CompileResult<()> {
        let mut stack = Vec::new();
        loop {
            let (token, span) = self.advance()?;
            match token {
                Token::LParen => stack.push(Token::RParen),
                Token::LBracket => stack.push(Token::RBracket),
                Token::LBrace => stack.push(Token::RBrace),
                Token::RParen | Token::RBracket | Token::RBrace => {
                    if stack.pop() != Some(token) {
                        return Err(crate::error::CompileError::syntax(
                            self.source,
                            span.start,
                            format!("Unexpected {}", token.describe()),
                        ));
                    }
                }
                _ => {}
            }
            if stack.is_empty() {
                return Ok(());
            }
        }
    }

    /// Skip `type Name<T> = ...;`
    pub(crate) fn skip_type_alias(&mut self) -> CompileResult<()> {
        self.advance()?;
        self.expect_ident()?;
        if self.check(Token::Lt) {
            self.skip_type_params()?;
        }
        self.expect(Token::Eq, "'='")?;
        self.skip_type()?;
        self.match_token(Token::Semicolon);
        Ok(())
    }

    /// Skip `interface Name<T> extends A, B { ... }`
    pub(crate) fn skip_interface(&mut self) -> CompileResult<()> {
        self.advance()?;
        self.expect_ident()?;
        if self.check(Token::Lt) {
            self.skip_type_params()?;
        }
        if self.match_ident("extends") {
            loop {
                self.skip_type_operand(true)?;
                if !self.match_token(Token::Comma) {
                    break;
                }
            }
        }
        if !self.check(Token::LBrace) {
            return Err(self.unexpected("'{'"));
        }
        self.skip_balanced()
    }
}
