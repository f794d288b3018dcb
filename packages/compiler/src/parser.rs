use crate::ast::*;
use crate::error::{CompileError, CompileResult};
use crate::tokenizer::{lex_at, Lexed, Token};
use std::ops::Range;
use std::sync::Arc;

/// Recursive-descent parser for application source files.
///
/// Tokens are lexed on demand from `pos` rather than up front, because
/// markup text between tags is not expressible as expression tokens; the
/// markup parser switches to raw scanning at those points.
#[derive(Clone)]
pub struct Parser<'src> {
    pub(crate) source: &'src str,
    pub(crate) pos: usize,
    pub(crate) end: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            end: source.len(),
        }
    }

    /// Parse a complete file
    pub fn parse_program(&mut self) -> CompileResult<Program> {
        let mut body = Vec::new();

        loop {
            match self.peek_full() {
                Lexed::Eof(_) => break,
                Lexed::Error(span) => return Err(self.bad_char(span.start)),
                Lexed::Token(Token::Import, _) => {
                    if let Some(import) = self.parse_import()? {
                        body.push(Stmt::Import(import));
                    }
                }
                Lexed::Token(Token::Export, _) => {
                    if let Some(export) = self.parse_export()? {
                        body.push(Stmt::Export(export));
                    }
                }
                _ => match self.parse_statement()? {
                    Stmt::Empty => {}
                    stmt => body.push(stmt),
                },
            }
        }

        Ok(Program { body })
    }

    // ---------------------------------------------------------------
    // Token helpers
    // ---------------------------------------------------------------

    pub(crate) fn peek_full(&self) -> Lexed<'src> {
        lex_at(self.source, self.pos, self.end)
    }

    pub(crate) fn peek(&self) -> Option<Token<'src>> {
        match self.peek_full() {
            Lexed::Token(token, _) => Some(token),
            _ => None,
        }
    }

    /// Offset where the next token starts
    pub(crate) fn peek_start(&self) -> usize {
        match self.peek_full() {
            Lexed::Token(_, span) | Lexed::Error(span) => span.start,
            Lexed::Eof(at) => at,
        }
    }

    /// The token after the next one
    pub(crate) fn peek_second(&self) -> Option<Token<'src>> {
        let mut lookahead = self.clone();
        lookahead.advance().ok()?;
        lookahead.peek()
    }

    pub(crate) fn check(&self, token: Token<'_>) -> bool {
        self.peek() == Some(token)
    }

    pub(crate) fn check_ident(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(name)) if name == word)
    }

    /// Whether a line break separates the previous token from the next one
    pub(crate) fn newline_before(&self) -> bool {
        let start = self.peek_start();
        self.source[self.pos..start].contains('\n')
    }

    pub(crate) fn advance(&mut self) -> CompileResult<(Token<'src>, Range<usize>)> {
        match self.peek_full() {
            Lexed::Token(token, span) => {
                self.pos = span.end;
                Ok((token, span))
            }
            Lexed::Error(span) => Err(self.bad_char(span.start)),
            Lexed::Eof(at) => Err(CompileError::syntax(self.source, at, "Unexpected end of input")),
        }
    }

    pub(crate) fn match_token(&mut self, token: Token<'_>) -> bool {
        match self.peek_full() {
            Lexed::Token(next, span) if next == token => {
                self.pos = span.end;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn match_ident(&mut self, word: &str) -> bool {
        if self.check_ident(word) {
            self.match_token(Token::Ident(word))
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, token: Token<'_>, expected: &str) -> CompileResult<Range<usize>> {
        if let Lexed::Token(next, span) = self.peek_full() {
            if next == token {
                self.pos = span.end;
                return Ok(span);
            }
        }
        Err(self.unexpected(expected))
    }

    pub(crate) fn expect_ident(&mut self) -> CompileResult<String> {
        match self.peek_full() {
            Lexed::Token(Token::Ident(name), span) => {
                self.pos = span.end;
                Ok(name.to_string())
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn expect_word(&mut self, word: &str) -> CompileResult<()> {
        if self.match_ident(word) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", word)))
        }
    }

    fn expect_string(&mut self) -> CompileResult<String> {
        match self.peek_full() {
            Lexed::Token(Token::String(raw), span) => {
                self.pos = span.end;
                Ok(unescape(&raw[1..raw.len() - 1]))
            }
            _ => Err(self.unexpected("string literal")),
        }
    }

    /// Property names may be identifiers, keywords or string/number literals
    fn expect_property_name(&mut self) -> CompileResult<String> {
        let (token, _) = match self.peek_full() {
            Lexed::Token(token, span) => (token, span),
            _ => return Err(self.unexpected("property name")),
        };
        let name = match token {
            Token::Ident(name) => name.to_string(),
            Token::String(raw) => unescape(&raw[1..raw.len() - 1]),
            Token::Number(raw) => format_number_key(raw),
            other => match other.keyword_text() {
                Some(keyword) => keyword.to_string(),
                None => return Err(self.unexpected("property name")),
            },
        };
        self.advance()?;
        Ok(name)
    }

    /// Statement terminator: `;`, or implied by a line break, `}` or end of input
    fn consume_semicolon(&mut self) -> CompileResult<()> {
        if self.match_token(Token::Semicolon) {
            return Ok(());
        }
        match self.peek_full() {
            Lexed::Eof(_) | Lexed::Token(Token::RBrace, _) => Ok(()),
            _ if self.newline_before() => Ok(()),
            _ => Err(self.unexpected("';'")),
        }
    }

    pub(crate) fn unexpected(&self, expected: &str) -> CompileError {
        match self.peek_full() {
            Lexed::Token(token, span) => CompileError::syntax(
                self.source,
                span.start,
                format!("Expected {}, found {}", expected, token.describe()),
            ),
            Lexed::Error(span) => self.bad_char(span.start),
            Lexed::Eof(at) => CompileError::syntax(
                self.source,
                at,
                format!("Expected {}, found end of input", expected),
            ),
        }
    }

    pub(crate) fn bad_char(&self, at: usize) -> CompileError {
        let ch = self.source[at..].chars().next().unwrap_or(' ');
        let message = match ch {
            '"' | '\'' => "Unterminated string literal".to_string(),
            '`' => "Unterminated template literal".to_string(),
            '/' => "Regular expression literals are not supported".to_string(),
            '#' | '@' => format!("Unexpected character '{}' (decorators and private fields are not supported)", ch),
            _ => format!("Unexpected character '{}'", ch),
        };
        CompileError::syntax(self.source, at, message)
    }

    fn unsupported_here(&self, what: &str) -> CompileError {
        CompileError::unsupported(self.source, self.peek_start(), format!("{} is not supported", what))
    }

    /// Run `f` speculatively; on failure the position is restored
    pub(crate) fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> CompileResult<T>) -> Option<T> {
        let saved = self.pos;
        match f(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.pos = saved;
                None
            }
        }
    }

    // ---------------------------------------------------------------
    // Modules
    // ---------------------------------------------------------------

    /// Parse an import declaration; type-only imports yield `None`
    fn parse_import(&mut self) -> CompileResult<Option<ImportDecl>> {
        let start = self.expect(Token::Import, "'import'")?.start;

        if self.check(Token::LParen) {
            return Err(self.unsupported_here("Dynamic import()"));
        }

        if self.check_ident("type") {
            let saved = self.pos;
            self.advance()?;
            let type_only = matches!(
                self.peek(),
                Some(Token::LBrace) | Some(Token::Star)
            ) || matches!(self.peek(), Some(Token::Ident(name)) if name != "from");
            if type_only {
                while !matches!(self.peek(), Some(Token::String(_))) {
                    self.advance()?;
                }
                self.advance()?;
                self.consume_semicolon()?;
                return Ok(None);
            }
            self.pos = saved;
        }

        let mut import = ImportDecl {
            specifier: String::new(),
            default: None,
            namespace: None,
            named: Vec::new(),
            span: Span::default(),
        };

        if matches!(self.peek(), Some(Token::String(_))) {
            import.specifier = self.expect_string()?;
            import.span = Span::new(start, self.pos);
            self.consume_semicolon()?;
            return Ok(Some(import));
        }

        if let Some(Token::Ident(_)) = self.peek() {
            import.default = Some(self.expect_ident()?);
            if !self.match_token(Token::Comma) {
                return self.finish_import(import, start);
            }
        }

        if self.match_token(Token::Star) {
            self.expect_word("as")?;
            import.namespace = Some(self.expect_ident()?);
        } else {
            self.expect(Token::LBrace, "'{'")?;
            while !self.match_token(Token::RBrace) {
                // `import { type Props, Card }` drops the type-only name
                let type_modifier = self.check_ident("type")
                    && match self.peek_second() {
                        Some(Token::Ident(next)) => next != "as",
                        Some(Token::Default) => true,
                        _ => false,
                    };
                if type_modifier {
                    self.advance()?;
                }
                let imported = self.expect_property_name()?;
                let local = if self.match_ident("as") {
                    self.expect_ident()?
                } else {
                    imported.clone()
                };
                if !type_modifier {
                    import.named.push(ImportSpecifier { imported, local });
                }
                if !self.match_token(Token::Comma) {
                    self.expect(Token::RBrace, "'}'")?;
                    break;
                }
            }
        }

        self.finish_import(import, start)
    }

    fn finish_import(&mut self, mut import: ImportDecl, start: usize) -> CompileResult<Option<ImportDecl>> {
        self.expect_word("from")?;
        import.specifier = self.expect_string()?;
        import.span = Span::new(start, self.pos);
        self.consume_semicolon()?;
        Ok(Some(import))
    }

    /// Parse an export declaration; type-only exports yield `None`
    fn parse_export(&mut self) -> CompileResult<Option<ExportDecl>> {
        let start = self.expect(Token::Export, "'export'")?.start;

        match self.peek() {
            Some(Token::Default) => {
                self.advance()?;
                if self.check(Token::Function) || self.is_async_function() {
                    self.match_ident("async");
                    let function = self.parse_function(false)?;
                    return Ok(Some(ExportDecl::DefaultFunction {
                        function,
                        span: Span::new(start, self.pos),
                    }));
                }
                if self.check_ident("interface") {
                    self.skip_interface()?;
                    return Ok(None);
                }
                let expr = self.parse_assignment()?;
                self.consume_semicolon()?;
                Ok(Some(ExportDecl::DefaultExpr {
                    expr,
                    span: Span::new(start, self.pos),
                }))
            }
            Some(Token::Const) | Some(Token::Let) | Some(Token::Var) => {
                let decl = self.parse_var_decl()?;
                Ok(Some(ExportDecl::Decl {
                    stmt: Box::new(Stmt::Var(decl)),
                    span: Span::new(start, self.pos),
                }))
            }
            Some(Token::Function) => {
                let function = self.parse_function(true)?;
                Ok(Some(ExportDecl::Decl {
                    stmt: Box::new(Stmt::Function(function)),
                    span: Span::new(start, self.pos),
                }))
            }
            Some(Token::Ident("async")) if self.is_async_function() => {
                self.advance()?;
                let function = self.parse_function(true)?;
                Ok(Some(ExportDecl::Decl {
                    stmt: Box::new(Stmt::Function(function)),
                    span: Span::new(start, self.pos),
                }))
            }
            Some(Token::Ident("type")) => {
                let saved = self.pos;
                self.advance()?;
                if self.check(Token::LBrace) {
                    self.skip_balanced()?;
                    if self.match_ident("from") {
                        self.expect_string()?;
                    }
                    self.consume_semicolon()?;
                } else {
                    self.pos = saved;
                    self.skip_type_alias()?;
                }
                Ok(None)
            }
            Some(Token::Ident("interface")) => {
                self.skip_interface()?;
                Ok(None)
            }
            Some(Token::LBrace) => {
                self.advance()?;
                let mut specifiers = Vec::new();
                while !self.match_token(Token::RBrace) {
                    let local = self.expect_property_name()?;
                    let exported = if self.match_ident("as") {
                        self.expect_property_name()?
                    } else {
                        local.clone()
                    };
                    specifiers.push(ExportSpecifier { local, exported });
                    if !self.match_token(Token::Comma) {
                        self.expect(Token::RBrace, "'}'")?;
                        break;
                    }
                }
                let from = if self.match_ident("from") {
                    Some(self.expect_string()?)
                } else {
                    None
                };
                self.consume_semicolon()?;
                Ok(Some(ExportDecl::Named {
                    specifiers,
                    from,
                    span: Span::new(start, self.pos),
                }))
            }
            Some(Token::Star) => Err(self.unsupported_here("'export *'")),
            Some(Token::Ident("class")) => Err(self.unsupported_here("Class declaration")),
            Some(Token::Ident("enum")) => Err(self.unsupported_here("Enum declaration")),
            _ => Err(self.unexpected("declaration after 'export'")),
        }
    }

    // ---------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------

    pub(crate) fn parse_statement(&mut self) -> CompileResult<Stmt> {
        let token = match self.peek_full() {
            Lexed::Token(token, _) => token,
            Lexed::Error(span) => return Err(self.bad_char(span.start)),
            Lexed::Eof(at) => return Err(CompileError::syntax(self.source, at, "Unexpected end of input")),
        };

        match token {
            Token::Const | Token::Let | Token::Var => Ok(Stmt::Var(self.parse_var_decl()?)),
            Token::Function => Ok(Stmt::Function(self.parse_function(true)?)),
            Token::Ident("async") if self.is_async_function() => {
                self.advance()?;
                Ok(Stmt::Function(self.parse_function(true)?))
            }
            Token::Return => {
                self.advance()?;
                let value = match self.peek_full() {
                    Lexed::Eof(_) | Lexed::Token(Token::Semicolon, _) | Lexed::Token(Token::RBrace, _) => None,
                    _ if self.newline_before() => None,
                    _ => Some(self.parse_expression()?),
                };
                self.consume_semicolon()?;
                Ok(Stmt::Return(value))
            }
            Token::If => {
                self.advance()?;
                self.expect(Token::LParen, "'('")?;
                let test = self.parse_expression()?;
                self.expect(Token::RParen, "')'")?;
                let consequent = Box::new(self.parse_statement()?);
                let alternate = if self.match_token(Token::Else) {
                    Some(Box::new(self.parse_statement()?))
                } else {
                    None
                };
                Ok(Stmt::If {
                    test,
                    consequent,
                    alternate,
                })
            }
            Token::For => self.parse_for(),
            Token::While => {
                self.advance()?;
                self.expect(Token::LParen, "'('")?;
                let test = self.parse_expression()?;
                self.expect(Token::RParen, "')'")?;
                let body = Box::new(self.parse_statement()?);
                Ok(Stmt::While { test, body })
            }
            Token::Break => {
                self.advance()?;
                self.consume_semicolon()?;
                Ok(Stmt::Break)
            }
            Token::Continue => {
                self.advance()?;
                self.consume_semicolon()?;
                Ok(Stmt::Continue)
            }
            Token::Throw => {
                self.advance()?;
                let value = self.parse_expression()?;
                self.consume_semicolon()?;
                Ok(Stmt::Throw(value))
            }
            Token::Try => self.parse_try(),
            Token::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            Token::Semicolon => {
                self.advance()?;
                Ok(Stmt::Empty)
            }
            Token::Import | Token::Export => Err(CompileError::syntax(
                self.source,
                self.peek_start(),
                "import and export are only allowed at the top level of a file",
            )),
            Token::Ident("type") if self.is_type_declaration() => {
                self.skip_type_alias()?;
                Ok(Stmt::Empty)
            }
            Token::Ident("interface") if self.is_type_declaration() => {
                self.skip_interface()?;
                Ok(Stmt::Empty)
            }
            Token::Ident("class") if self.is_type_declaration() => Err(self.unsupported_here("Class declaration")),
            Token::Ident("enum") if self.is_type_declaration() => Err(self.unsupported_here("Enum declaration")),
            _ => {
                let expr = self.parse_expression()?;
                self.consume_semicolon()?;
                Ok(Stmt::Expr(expr))
            }
        }
    }

    /// `type X`, `interface X`, ... : a contextual keyword followed by a name on the same line
    fn is_type_declaration(&self) -> bool {
        let mut lookahead = self.clone();
        lookahead.advance().is_ok() && !lookahead.newline_before() && matches!(lookahead.peek(), Some(Token::Ident(_)))
    }

    fn is_async_function(&self) -> bool {
        if !self.check_ident("async") {
            return false;
        }
        let mut lookahead = self.clone();
        lookahead.advance().is_ok() && !lookahead.newline_before() && lookahead.check(Token::Function)
    }

    pub(crate) fn parse_block(&mut self) -> CompileResult<Vec<Stmt>> {
        self.expect(Token::LBrace, "'{'")?;
        let mut body = Vec::new();
        while !self.match_token(Token::RBrace) {
            match self.parse_statement()? {
                Stmt::Empty => {}
                stmt => body.push(stmt),
            }
        }
        Ok(body)
    }

    fn parse_var_decl(&mut self) -> CompileResult<VarDecl> {
        let kind = match self.advance()? {
            (Token::Const, _) => DeclKind::Const,
            (Token::Let, _) => DeclKind::Let,
            _ => DeclKind::Var,
        };

        let mut declarators = Vec::new();
        loop {
            let pattern_start = self.peek_start();
            let pattern = self.parse_binding_pattern()?;
            self.match_token(Token::Bang);
            if self.match_token(Token::Colon) {
                self.skip_type()?;
            }
            let init = if self.match_token(Token::Eq) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            if init.is_none() && (kind == DeclKind::Const || !matches!(pattern, Pattern::Ident(_))) {
                return Err(CompileError::syntax(
                    self.source,
                    pattern_start,
                    "Missing initializer in declaration",
                ));
            }
            declarators.push(Declarator { pattern, init });
            if !self.match_token(Token::Comma) {
                break;
            }
        }

        self.consume_semicolon()?;
        Ok(VarDecl { kind, declarators })
    }

    fn parse_for(&mut self) -> CompileResult<Stmt> {
        self.expect(Token::For, "'for'")?;
        self.expect(Token::LParen, "'('")?;
        let kind = match self.peek() {
            Some(Token::Const) => DeclKind::Const,
            Some(Token::Let) => DeclKind::Let,
            Some(Token::Var) => DeclKind::Var,
            _ => return Err(self.unsupported_here("A for loop without a declaration")),
        };
        self.advance()?;
        let pattern = self.parse_binding_pattern()?;
        let each = if self.match_ident("of") {
            LoopEach::Of
        } else if self.match_ident("in") {
            LoopEach::In
        } else {
            return Err(self.unsupported_here("A C-style for loop (use for...of)"));
        };
        let iterable = self.parse_expression()?;
        self.expect(Token::RParen, "')'")?;
        let body = Box::new(self.parse_statement()?);
        Ok(Stmt::Loop {
            kind,
            each,
            pattern,
            iterable,
            body,
        })
    }

    fn parse_try(&mut self) -> CompileResult<Stmt> {
        let start = self.expect(Token::Try, "'try'")?.start;
        let block = self.parse_block()?;

        let mut param = None;
        let mut handler = None;
        if self.match_token(Token::Catch) {
            if self.match_token(Token::LParen) {
                param = Some(self.parse_binding_pattern()?);
                if self.match_token(Token::Colon) {
                    self.skip_type()?;
                }
                self.expect(Token::RParen, "')'")?;
            }
            handler = Some(self.parse_block()?);
        }

        let finalizer = if self.match_token(Token::Finally) {
            Some(self.parse_block()?)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(CompileError::syntax(self.source, start, "Missing catch or finally after try"));
        }

        Ok(Stmt::Try {
            block,
            param,
            handler,
            finalizer,
        })
    }

    // ---------------------------------------------------------------
    // Functions and patterns
    // ---------------------------------------------------------------

    /// Parse `function name(params) { body }`; a leading `async` is already consumed
    fn parse_function(&mut self, require_name: bool) -> CompileResult<Arc<Function>> {
        let start = self.expect(Token::Function, "'function'")?.start;
        if self.check(Token::Star) {
            return Err(self.unsupported_here("Generator function"));
        }
        let name = match self.peek() {
            Some(Token::Ident(_)) => Some(self.expect_ident()?),
            _ if require_name => return Err(self.unexpected("function name")),
            _ => None,
        };
        self.parse_function_tail(name, start)
    }

    /// Type parameters, parameter list, return type and block body
    fn parse_function_tail(&mut self, name: Option<String>, start: usize) -> CompileResult<Arc<Function>> {
        if self.check(Token::Lt) {
            self.skip_type_params()?;
        }
        let params = self.parse_params()?;
        if self.match_token(Token::Colon) {
            self.skip_type()?;
        }
        let body = self.parse_block()?;
        Ok(Arc::new(Function {
            name,
            params,
            body: FunctionBody::Block(body),
            is_arrow: false,
            span: Span::new(start, self.pos),
        }))
    }

    fn parse_params(&mut self) -> CompileResult<Vec<Param>> {
        self.expect(Token::LParen, "'('")?;
        let mut params = Vec::new();
        while !self.match_token(Token::RParen) {
            let rest = self.match_token(Token::Ellipsis);
            let pattern = self.parse_binding_pattern()?;
            self.match_token(Token::Question);
            if self.match_token(Token::Colon) {
                self.skip_type()?;
            }
            let default = if self.match_token(Token::Eq) {
                Some(self.parse_assignment()?)
            } else {
                None
            };
            params.push(Param {
                pattern,
                default,
                rest,
            });
            if !self.match_token(Token::Comma) {
                self.expect(Token::RParen, "')'")?;
                break;
            }
        }
        Ok(params)
    }

    pub(crate) fn parse_binding_pattern(&mut self) -> CompileResult<Pattern> {
        match self.peek() {
            Some(Token::Ident(_)) => Ok(Pattern::Ident(self.expect_ident()?)),
            Some(Token::LBrace) => {
                self.advance()?;
                let mut props = Vec::new();
                let mut rest = None;
                while !self.match_token(Token::RBrace) {
                    if self.match_token(Token::Ellipsis) {
                        rest = Some(self.expect_ident()?);
                    } else {
                        let key_is_ident = matches!(self.peek(), Some(Token::Ident(_)));
                        let key = self.expect_property_name()?;
                        let pattern = if self.match_token(Token::Colon) {
                            self.parse_binding_pattern()?
                        } else if key_is_ident {
                            Pattern::Ident(key.clone())
                        } else {
                            return Err(self.unexpected("':'"));
                        };
                        let default = self.parse_pattern_default()?;
                        props.push((key, PatternElem { pattern, default }));
                    }
                    if !self.match_token(Token::Comma) {
                        self.expect(Token::RBrace, "'}'")?;
                        break;
                    }
                }
                Ok(Pattern::Object { props, rest })
            }
            Some(Token::LBracket) => {
                self.advance()?;
                let mut elements = Vec::new();
                let mut rest = None;
                while !self.match_token(Token::RBracket) {
                    if self.match_token(Token::Comma) {
                        elements.push(None);
                        continue;
                    }
                    if self.match_token(Token::Ellipsis) {
                        rest = Some(Box::new(self.parse_binding_pattern()?));
                    } else {
                        let pattern = self.parse_binding_pattern()?;
                        let default = self.parse_pattern_default()?;
                        elements.push(Some(PatternElem { pattern, default }));
                    }
                    if !self.match_token(Token::Comma) {
                        self.expect(Token::RBracket, "']'")?;
                        break;
                    }
                }
                Ok(Pattern::Array { elements, rest })
            }
            _ => Err(self.unexpected("binding name or pattern")),
        }
    }

    fn parse_pattern_default(&mut self) -> CompileResult<Option<Expr>> {
        if self.match_token(Token::Eq) {
            Ok(Some(self.parse_assignment()?))
        } else {
            Ok(None)
        }
    }

    /// Try to read an arrow function head (`(a, b): T =>`, `x =>`, `<T,>(x) =>`)
    fn try_arrow_head(&mut self) -> Option<Vec<Param>> {
        self.attempt(|p| {
            if p.check(Token::Lt) {
                p.skip_type_params()?;
            }
            let params = if p.check(Token::LParen) {
                p.parse_params()?
            } else {
                let name = p.expect_ident()?;
                vec![Param {
                    pattern: Pattern::Ident(name),
                    default: None,
                    rest: false,
                }]
            };
            if p.match_token(Token::Colon) {
                p.skip_return_type()?;
            }
            p.expect(Token::Arrow, "'=>'")?;
            Ok(params)
        })
    }

    fn parse_arrow_body(&mut self, params: Vec<Param>, start: usize) -> CompileResult<Expr> {
        let body = if self.check(Token::LBrace) {
            FunctionBody::Block(self.parse_block()?)
        } else {
            FunctionBody::Expr(Box::new(self.parse_assignment()?))
        };
        Ok(Expr::Function(Arc::new(Function {
            name: None,
            params,
            body,
            is_arrow: true,
            span: Span::new(start, self.pos),
        })))
    }

    // ---------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------

    pub(crate) fn parse_expression(&mut self) -> CompileResult<Expr> {
        self.parse_assignment()
    }

    pub(crate) fn parse_assignment(&mut self) -> CompileResult<Expr> {
        let start = self.peek_start();

        // Arrow functions
        let arrow_candidate = match self.peek() {
            Some(Token::LParen) | Some(Token::Lt) => true,
            Some(Token::Ident(_)) => self.peek_second() == Some(Token::Arrow),
            _ => false,
        };
        if arrow_candidate {
            if let Some(params) = self.try_arrow_head() {
                return self.parse_arrow_body(params, start);
            }
        }
        if self.check_ident("async") {
            let saved = self.pos;
            self.advance()?;
            if !self.newline_before() {
                if let Some(params) = self.try_arrow_head() {
                    return self.parse_arrow_body(params, start);
                }
            }
            self.pos = saved;
        }

        let target = self.parse_conditional()?;

        let op = match self.peek() {
            Some(Token::Eq) => AssignOp::Assign,
            Some(Token::PlusEq) => AssignOp::AddAssign,
            Some(Token::MinusEq) => AssignOp::SubAssign,
            _ => return Ok(target),
        };
        match &target {
            Expr::Ident(_) | Expr::Member { optional: false, .. } => {}
            _ => {
                return Err(CompileError::syntax(self.source, start, "Invalid assignment target"));
            }
        }
        self.advance()?;
        let value = self.parse_assignment()?;
        Ok(Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn parse_conditional(&mut self) -> CompileResult<Expr> {
        let test = self.parse_logical_or()?;
        if !self.match_token(Token::Question) {
            return Ok(test);
        }
        let consequent = self.parse_assignment()?;
        self.expect(Token::Colon, "':'")?;
        let alternate = self.parse_assignment()?;
        Ok(Expr::Conditional {
            test: Box::new(test),
            consequent: Box::new(consequent),
            alternate: Box::new(alternate),
        })
    }

    fn parse_logical_or(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_logical_and()?;
        loop {
            let op = match self.peek() {
                Some(Token::OrOr) => LogicalOp::Or,
                Some(Token::Nullish) => LogicalOp::Nullish,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_logical_and()?;
            left = Expr::Logical {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_logical_and(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_equality()?;
        while self.match_token(Token::AndAnd) {
            let right = self.parse_equality()?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::StrictEq) => BinaryOp::StrictEq,
                Some(Token::StrictNotEq) => BinaryOp::StrictNotEq,
                Some(Token::EqEq) => BinaryOp::LooseEq,
                Some(Token::NotEq) => BinaryOp::LooseNotEq,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_relational()?;
            left = binary(op, left, right);
        }
    }

    fn parse_relational(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::LtEq) => BinaryOp::LtEq,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::GtEq) => BinaryOp::GtEq,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
    }

    fn parse_additive(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
    }

    fn parse_multiplicative(&mut self) -> CompileResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(left),
            };
            self.advance()?;
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
    }

    fn parse_unary(&mut self) -> CompileResult<Expr> {
        let op = match self.peek() {
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Plus,
            Some(Token::Typeof) => UnaryOp::Typeof,
            Some(Token::Ident("void")) => UnaryOp::Void,
            Some(Token::Ident("await")) => {
                // Workflow calls settle through hook state, so awaiting is a no-op
                self.advance()?;
                return self.parse_unary();
            }
            _ => return self.parse_postfix(),
        };
        self.advance()?;
        let arg = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            arg: Box::new(arg),
        })
    }

    fn parse_postfix(&mut self) -> CompileResult<Expr> {
        let mut expr = if self.check(Token::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        let mut in_optional_chain = false;

        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    self.advance()?;
                    let name = self.expect_property_name()?;
                    expr = member(expr, MemberProp::Named(name), false);
                }
                Some(Token::QuestionDot) => {
                    self.advance()?;
                    in_optional_chain = true;
                    if self.check(Token::LParen) {
                        let args = self.parse_arguments()?;
                        expr = Expr::Call {
                            callee: Box::new(expr),
                            args,
                            optional: true,
                        };
                    } else if self.match_token(Token::LBracket) {
                        let index = self.parse_expression()?;
                        self.expect(Token::RBracket, "']'")?;
                        expr = member(expr, MemberProp::Computed(Box::new(index)), true);
                    } else {
                        let name = self.expect_property_name()?;
                        expr = member(expr, MemberProp::Named(name), true);
                    }
                }
                Some(Token::LBracket) if !self.newline_before() => {
                    self.advance()?;
                    let index = self.parse_expression()?;
                    self.expect(Token::RBracket, "']'")?;
                    expr = member(expr, MemberProp::Computed(Box::new(index)), false);
                }
                Some(Token::LParen) if !self.newline_before() => {
                    let args = self.parse_arguments()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                        optional: false,
                    };
                }
                // Explicit type arguments on a call: `useState<string>("")`
                Some(Token::Lt) => {
                    let generic_call = self.attempt(|p| {
                        p.skip_type_args()?;
                        if p.check(Token::LParen) {
                            Ok(())
                        } else {
                            Err(p.unexpected("'('"))
                        }
                    });
                    if generic_call.is_none() {
                        break;
                    }
                    let args = self.parse_arguments()?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                        optional: false,
                    };
                }
                // Non-null assertion
                Some(Token::Bang) if !self.newline_before() => {
                    self.advance()?;
                }
                Some(Token::Ident("as")) | Some(Token::Ident("satisfies")) if !self.newline_before() => {
                    self.advance()?;
                    if !self.match_token(Token::Const) {
                        self.skip_type()?;
                    }
                }
                Some(Token::Template(_)) if !self.newline_before() => {
                    return Err(self.unsupported_here("Tagged template"));
                }
                _ => break,
            }
        }

        if in_optional_chain {
            expr = Expr::OptionalChain(Box::new(expr));
        }
        Ok(expr)
    }

    fn parse_new(&mut self) -> CompileResult<Expr> {
        self.expect(Token::New, "'new'")?;
        let mut callee = self.parse_primary()?;
        while self.match_token(Token::Dot) {
            let name = self.expect_property_name()?;
            callee = member(callee, MemberProp::Named(name), false);
        }
        if self.check(Token::Lt) {
            self.skip_type_args()?;
        }
        let args = if self.check(Token::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        Ok(Expr::New {
            callee: Box::new(callee),
            args,
        })
    }

    fn parse_arguments(&mut self) -> CompileResult<Vec<Argument>> {
        self.expect(Token::LParen, "'('")?;
        let mut args = Vec::new();
        while !self.match_token(Token::RParen) {
            if self.match_token(Token::Ellipsis) {
                args.push(Argument::Spread(self.parse_assignment()?));
            } else {
                args.push(Argument::Expr(self.parse_assignment()?));
            }
            if !self.match_token(Token::Comma) {
                self.expect(Token::RParen, "')'")?;
                break;
            }
        }
        Ok(args)
    }

    fn parse_primary(&mut self) -> CompileResult<Expr> {
        let (token, span) = match self.peek_full() {
            Lexed::Token(token, span) => (token, span),
            Lexed::Error(span) => return Err(self.bad_char(span.start)),
            Lexed::Eof(at) => {
                return Err(CompileError::syntax(self.source, at, "Unexpected end of input"));
            }
        };

        match token {
            Token::Number(raw) => {
                self.advance()?;
                let value = parse_number(raw)
                    .ok_or_else(|| CompileError::syntax(self.source, span.start, format!("Invalid number '{}'", raw)))?;
                Ok(Expr::Number(value))
            }
            Token::String(raw) => {
                self.advance()?;
                Ok(Expr::String(unescape(&raw[1..raw.len() - 1])))
            }
            Token::Template(raw) => {
                self.advance()?;
                self.parse_template(raw, span.start)
            }
            Token::True => {
                self.advance()?;
                Ok(Expr::Bool(true))
            }
            Token::False => {
                self.advance()?;
                Ok(Expr::Bool(false))
            }
            Token::Null => {
                self.advance()?;
                Ok(Expr::Null)
            }
            Token::Undefined => {
                self.advance()?;
                Ok(Expr::Undefined)
            }
            Token::Ident("async") if self.is_async_function() => {
                self.advance()?;
                Ok(Expr::Function(self.parse_function(false)?))
            }
            Token::Ident("class") => Err(self.unsupported_here("Class expression")),
            Token::Ident(name) => {
                self.advance()?;
                Ok(Expr::Ident(name.to_string()))
            }
            Token::Function => Ok(Expr::Function(self.parse_function(false)?)),
            Token::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                if self.check(Token::Comma) {
                    return Err(self.unsupported_here("The comma operator"));
                }
                self.expect(Token::RParen, "')'")?;
                Ok(expr)
            }
            Token::LBracket => self.parse_array(),
            Token::LBrace => self.parse_object(),
            Token::Lt => self.parse_markup(),
            Token::Slash => Err(self.bad_char(span.start)),
            other => Err(CompileError::syntax(
                self.source,
                span.start,
                format!("Unexpected {}", other.describe()),
            )),
        }
    }

    fn parse_array(&mut self) -> CompileResult<Expr> {
        self.expect(Token::LBracket, "'['")?;
        let mut items = Vec::new();
        while !self.match_token(Token::RBracket) {
            if self.match_token(Token::Ellipsis) {
                items.push(ArrayItem::Spread(self.parse_assignment()?));
            } else {
                items.push(ArrayItem::Item(self.parse_assignment()?));
            }
            if !self.match_token(Token::Comma) {
                self.expect(Token::RBracket, "']'")?;
                break;
            }
        }
        Ok(Expr::Array(items))
    }

    fn parse_object(&mut self) -> CompileResult<Expr> {
        self.expect(Token::LBrace, "'{'")?;
        let mut props = Vec::new();
        while !self.match_token(Token::RBrace) {
            if self.match_token(Token::Ellipsis) {
                props.push(Property::Spread(self.parse_assignment()?));
            } else {
                let key_start = self.peek_start();
                let key_is_ident = matches!(self.peek(), Some(Token::Ident(_)));
                let key = if self.match_token(Token::LBracket) {
                    let key = self.parse_assignment()?;
                    self.expect(Token::RBracket, "']'")?;
                    PropKey::Computed(key)
                } else {
                    PropKey::Named(self.expect_property_name()?)
                };

                if self.match_token(Token::Colon) {
                    let value = self.parse_assignment()?;
                    props.push(Property::KeyValue { key, value });
                } else if self.check(Token::LParen) || self.check(Token::Lt) {
                    let name = match &key {
                        PropKey::Named(name) => Some(name.clone()),
                        PropKey::Computed(_) => None,
                    };
                    let method = self.parse_function_tail(name, key_start)?;
                    props.push(Property::KeyValue {
                        key,
                        value: Expr::Function(method),
                    });
                } else {
                    match key {
                        PropKey::Named(name) if key_is_ident => props.push(Property::Shorthand(name)),
                        _ => return Err(self.unexpected("':'")),
                    }
                }
            }
            if !self.match_token(Token::Comma) {
                self.expect(Token::RBrace, "'}'")?;
                break;
            }
        }
        Ok(Expr::Object(props))
    }

    /// Split a template literal into text and `${}` parts; `start` is the
    /// offset of the opening backtick
    fn parse_template(&self, raw: &str, start: usize) -> CompileResult<Expr> {
        let inner_end = start + raw.len() - 1;
        let mut parts = Vec::new();
        let mut text = String::new();
        let mut i = start + 1;

        while i < inner_end {
            let rest = &self.source[i..inner_end];
            if rest.starts_with("${") {
                if !text.is_empty() {
                    parts.push(TemplatePart::Str(std::mem::take(&mut text)));
                }
                let mut inner = Parser {
                    source: self.source,
                    pos: i + 2,
                    end: inner_end,
                };
                let expr = inner.parse_expression()?;
                inner.expect(Token::RBrace, "'}' closing template expression")?;
                parts.push(TemplatePart::Expr(expr));
                i = inner.pos;
            } else if rest.starts_with('\\') {
                let (decoded, consumed) = decode_escape(&rest[1..]);
                if let Some(ch) = decoded {
                    text.push(ch);
                }
                i += 1 + consumed;
            } else {
                let ch = rest.chars().next().unwrap_or(' ');
                text.push(ch);
                i += ch.len_utf8();
            }
        }
        if !text.is_empty() || parts.is_empty() {
            parts.push(TemplatePart::Str(text));
        }

        Ok(Expr::Template(parts))
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn member(object: Expr, property: MemberProp, optional: bool) -> Expr {
    Expr::Member {
        object: Box::new(object),
        property,
        optional,
    }
}

pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != '_').collect();
    if let Some(hex) = cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok().map(|v| v as f64);
    }
    cleaned.parse::<f64>().ok()
}

fn format_number_key(raw: &str) -> String {
    match parse_number(raw) {
        Some(value) if value.fract() == 0.0 && value.abs() < 1e15 => format!("{}", value as i64),
        Some(value) => value.to_string(),
        None => raw.to_string(),
    }
}

/// Decode the escape sequence following a backslash. Returns the decoded
/// character (`None` for a line continuation) and the bytes consumed.
fn decode_escape(rest: &str) -> (Option<char>, usize) {
    let mut chars = rest.chars();
    let Some(first) = chars.next() else {
        return (Some('\\'), 0);
    };
    match first {
        'n' => (Some('\n'), 1),
        't' => (Some('\t'), 1),
        'r' => (Some('\r'), 1),
        'b' => (Some('\u{8}'), 1),
        'f' => (Some('\u{c}'), 1),
        'v' => (Some('\u{b}'), 1),
        '0' => (Some('\0'), 1),
        '\n' => (None, 1),
        'x' => {
            let hex = rest.get(1..3).unwrap_or("");
            match u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                Some(ch) if hex.len() == 2 => (Some(ch), 3),
                _ => (Some('x'), 1),
            }
        }
        'u' => {
            if let Some(body) = rest.strip_prefix("u{") {
                if let Some(close) = body.find('}') {
                    if let Some(ch) = u32::from_str_radix(&body[..close], 16).ok().and_then(char::from_u32) {
                        return (Some(ch), 2 + close + 1);
                    }
                }
                return (Some('u'), 1);
            }
            let hex = rest.get(1..5).unwrap_or("");
            match u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                Some(ch) if hex.len() == 4 => (Some(ch), 5),
                _ => (Some('u'), 1),
            }
        }
        other => (Some(other), other.len_utf8()),
    }
}

/// Unescape the body of a quoted string literal
pub(crate) fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut i = 0;
    while i < body.len() {
        let rest = &body[i..];
        if let Some(after) = rest.strip_prefix('\\') {
            let (decoded, consumed) = decode_escape(after);
            if let Some(ch) = decoded {
                out.push(ch);
            }
            i += 1 + consumed;
        } else {
            let ch = rest.chars().next().unwrap_or(' ');
            out.push(ch);
            i += ch.len_utf8();
        }
    }
    out
}
