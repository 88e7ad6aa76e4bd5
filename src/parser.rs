use crate::ast::*;
use crate::lexer::{Token, TokenKind};
use crate::types::Type;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ParseError {
    #[error("Parse error [{line}:{col}]: {msg}")]
    Error {
        msg: String,
        line: usize,
        col: usize,
    },
}

impl ParseError {
    pub fn position(&self) -> (usize, usize) {
        match self {
            ParseError::Error { line, col, .. } => (*line, *col),
        }
    }
}

/// Recursive-descent parser over the lexer's token stream.
///
/// Individual productions return `Result`; the top-level loop records any
/// error and resynchronizes at the next statement keyword or line boundary,
/// so a single bad construct does not hide the rest of the file.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    fn error_at(&self, tok: &Token, msg: impl Into<String>) -> ParseError {
        ParseError::Error {
            msg: msg.into(),
            line: tok.line,
            col: tok.col,
        }
    }

    fn error(&self, msg: impl Into<String>) -> ParseError {
        let tok = self.current().clone();
        self.error_at(&tok, msg)
    }

    fn current(&self) -> &Token {
        if self.pos < self.tokens.len() {
            &self.tokens[self.pos]
        } else {
            // The token vector always ends in Eof
            self.tokens.last().expect("token stream is never empty")
        }
    }

    fn peek(&self, offset: usize) -> &Token {
        let idx = self.pos + offset;
        if idx < self.tokens.len() {
            &self.tokens[idx]
        } else {
            self.tokens.last().expect("token stream is never empty")
        }
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, msg: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!("{}, found '{}'", msg, self.current().kind)))
        }
    }

    fn is_eof(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    /// Skip ahead to a statement boundary after an error: stop past a
    /// newline or in front of the next `fn`/`let`/`if`/`while`/`return`.
    fn synchronize(&mut self) {
        while !self.is_eof() {
            if self.pos > 0 && self.tokens[self.pos - 1].kind == TokenKind::Newline {
                return;
            }
            match self.current().kind {
                TokenKind::Fn
                | TokenKind::Let
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Top level
    // -----------------------------------------------------------------------

    pub fn parse(&mut self) -> (Program, Vec<ParseError>) {
        let mut program = Program::default();

        while !self.is_eof() {
            match self.current().kind {
                TokenKind::Pure | TokenKind::Fn => match self.parse_function() {
                    Ok(func) => program.functions.push(func),
                    Err(e) => {
                        self.errors.push(e);
                        self.synchronize();
                    }
                },
                TokenKind::Let => {
                    self.advance();
                    match self.parse_var_decl() {
                        Ok(decl) => program.globals.push(decl),
                        Err(e) => {
                            self.errors.push(e);
                            self.synchronize();
                        }
                    }
                }
                TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent => {
                    self.advance();
                }
                TokenKind::Struct
                | TokenKind::Enum
                | TokenKind::Match
                | TokenKind::For
                | TokenKind::Import
                | TokenKind::SideEffect => {
                    let e = self.reserved_keyword_error();
                    self.errors.push(e);
                    self.advance();
                    self.synchronize();
                }
                _ => {
                    let e = self.error("Expected function or global variable declaration");
                    self.errors.push(e);
                    self.advance();
                    self.synchronize();
                }
            }
        }

        (program, std::mem::take(&mut self.errors))
    }

    fn reserved_keyword_error(&self) -> ParseError {
        self.error(format!(
            "'{}' is reserved but not yet supported",
            self.current().kind
        ))
    }

    fn parse_function(&mut self) -> Result<FunctionDecl, ParseError> {
        let is_pure = self.match_kind(TokenKind::Pure);
        if is_pure {
            self.expect(TokenKind::Fn, "Expected 'fn' after 'pure'")?;
        } else {
            self.expect(TokenKind::Fn, "Expected 'fn'")?;
        }

        let name_tok = self.expect(TokenKind::Ident, "Expected function name")?;

        self.expect(TokenKind::LParen, "Expected '(' after function name")?;
        let params = self.parse_params()?;
        self.expect(TokenKind::RParen, "Expected ')' after parameters")?;

        let return_type = if self.match_kind(TokenKind::Arrow) {
            self.parse_type()?
        } else {
            Type::Void
        };

        self.expect(TokenKind::Colon, "Expected ':' before function body")?;
        let body = self.parse_block()?;

        Ok(FunctionDecl {
            name: name_tok.value,
            params,
            return_type,
            body,
            is_pure,
            line: name_tok.line,
            col: name_tok.col,
        })
    }

    fn parse_params(&mut self) -> Result<Vec<Param>, ParseError> {
        let mut params = Vec::new();

        if self.check(TokenKind::RParen) {
            return Ok(params);
        }

        loop {
            let name_tok = self.expect(TokenKind::Ident, "Expected parameter name")?;
            self.expect(TokenKind::Colon, "Expected ':' after parameter name")?;
            let ty = self.parse_type()?;
            params.push(Param {
                name: name_tok.value,
                ty,
            });

            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }

        Ok(params)
    }

    fn parse_type(&mut self) -> Result<Type, ParseError> {
        let ty = match self.current().kind {
            TokenKind::TypeI8 => Type::I8,
            TokenKind::TypeI16 => Type::I16,
            TokenKind::TypeI32 => Type::I32,
            TokenKind::TypeI64 => Type::I64,
            TokenKind::TypeU8 => Type::U8,
            TokenKind::TypeU16 => Type::U16,
            TokenKind::TypeU32 => Type::U32,
            TokenKind::TypeU64 => Type::U64,
            TokenKind::TypeF32 => Type::F32,
            TokenKind::TypeF64 => Type::F64,
            TokenKind::TypeBool => Type::Bool,
            TokenKind::TypeVoid => Type::Void,
            TokenKind::TypeStr => Type::Str,
            _ => {
                return Err(self.error(format!("Expected type, found '{}'", self.current().kind)))
            }
        };
        self.advance();
        Ok(ty)
    }

    // -----------------------------------------------------------------------
    // Blocks and statements
    // -----------------------------------------------------------------------

    /// Either an `INDENT .. DEDENT` statement sequence or, when no indent
    /// follows the colon, a single statement on the same line.
    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.skip_newlines();

        if !self.match_kind(TokenKind::Indent) {
            return Ok(vec![self.parse_statement()?]);
        }

        let mut statements = Vec::new();
        self.skip_newlines();

        while !self.check(TokenKind::Dedent) && !self.is_eof() {
            if self.match_kind(TokenKind::Newline) {
                continue;
            }
            statements.push(self.parse_statement()?);
        }

        self.expect(TokenKind::Dedent, "Expected dedent after block")?;
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        self.skip_newlines();

        let tok = self.current().clone();
        match tok.kind {
            TokenKind::Let => {
                self.advance();
                let decl = self.parse_var_decl()?;
                let (line, col) = (decl.line, decl.col);
                Ok(Stmt {
                    kind: StmtKind::Let(decl),
                    line,
                    col,
                })
            }
            TokenKind::If => {
                self.advance();
                self.parse_if_statement(tok.line, tok.col)
            }
            TokenKind::While => {
                self.advance();
                self.parse_while_statement(tok.line, tok.col)
            }
            TokenKind::Return => {
                self.advance();
                self.parse_return_statement(tok.line, tok.col)
            }
            TokenKind::Struct
            | TokenKind::Enum
            | TokenKind::Match
            | TokenKind::For
            | TokenKind::Import
            | TokenKind::SideEffect => {
                let e = self.reserved_keyword_error();
                self.advance();
                Err(e)
            }
            // Assignment is recognized by one-token lookahead
            TokenKind::Ident if self.peek(1).kind == TokenKind::Assign => {
                let name_tok = self.advance();
                self.advance(); // consume '='
                let value = self.parse_expr()?;
                Ok(Stmt {
                    kind: StmtKind::Assign {
                        name: name_tok.value,
                        value,
                    },
                    line: name_tok.line,
                    col: name_tok.col,
                })
            }
            _ => {
                let expr = self.parse_expr()?;
                let (line, col) = (expr.line, expr.col);
                Ok(Stmt {
                    kind: StmtKind::Expr(expr),
                    line,
                    col,
                })
            }
        }
    }

    fn parse_var_decl(&mut self) -> Result<VarDecl, ParseError> {
        let mut is_mutable = false;
        let mut is_pure_local = false;

        if self.match_kind(TokenKind::Mut) {
            is_mutable = true;
        } else if self.match_kind(TokenKind::PureLocal) {
            is_pure_local = true;
        }

        let name_tok = self.expect(TokenKind::Ident, "Expected variable name")?;
        self.expect(TokenKind::Colon, "Expected ':' after variable name")?;
        let ty = self.parse_type()?;

        let init = if self.match_kind(TokenKind::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(VarDecl {
            name: name_tok.value,
            ty,
            is_mutable,
            is_pure_local,
            init,
            line: name_tok.line,
            col: name_tok.col,
        })
    }

    fn parse_if_statement(&mut self, line: usize, col: usize) -> Result<Stmt, ParseError> {
        let condition = self.parse_expr()?;
        self.expect(TokenKind::Colon, "Expected ':' after if condition")?;
        let then_body = self.parse_block()?;

        self.skip_newlines();
        let else_body = if self.match_kind(TokenKind::Else) {
            self.expect(TokenKind::Colon, "Expected ':' after else")?;
            self.parse_block()?
        } else {
            Vec::new()
        };

        Ok(Stmt {
            kind: StmtKind::If {
                condition,
                then_body,
                else_body,
            },
            line,
            col,
        })
    }

    fn parse_while_statement(&mut self, line: usize, col: usize) -> Result<Stmt, ParseError> {
        let condition = self.parse_expr()?;
        self.expect(TokenKind::Colon, "Expected ':' after while condition")?;
        let body = self.parse_block()?;

        Ok(Stmt {
            kind: StmtKind::While { condition, body },
            line,
            col,
        })
    }

    fn parse_return_statement(&mut self, line: usize, col: usize) -> Result<Stmt, ParseError> {
        let value = match self.current().kind {
            TokenKind::Newline | TokenKind::Dedent | TokenKind::Eof => None,
            _ => Some(self.parse_expr()?),
        };

        Ok(Stmt {
            kind: StmtKind::Return(value),
            line,
            col,
        })
    }

    // -----------------------------------------------------------------------
    // Expressions — one function per precedence level, low to high;
    // every binary level is left-associative.
    // -----------------------------------------------------------------------

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_logical_or()
    }

    fn parse_logical_or(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_logical_and()?;
        while self.check(TokenKind::OrOr) {
            self.advance();
            let right = self.parse_logical_and()?;
            expr = binary(BinOp::Or, expr, right);
        }
        Ok(expr)
    }

    fn parse_logical_and(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_bitwise_or()?;
        while self.check(TokenKind::AndAnd) {
            self.advance();
            let right = self.parse_bitwise_or()?;
            expr = binary(BinOp::And, expr, right);
        }
        Ok(expr)
    }

    fn parse_bitwise_or(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_bitwise_xor()?;
        while self.check(TokenKind::BitOr) {
            self.advance();
            let right = self.parse_bitwise_xor()?;
            expr = binary(BinOp::BitOr, expr, right);
        }
        Ok(expr)
    }

    fn parse_bitwise_xor(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_bitwise_and()?;
        while self.check(TokenKind::BitXor) {
            self.advance();
            let right = self.parse_bitwise_and()?;
            expr = binary(BinOp::BitXor, expr, right);
        }
        Ok(expr)
    }

    fn parse_bitwise_and(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_equality()?;
        while self.check(TokenKind::BitAnd) {
            self.advance();
            let right = self.parse_equality()?;
            expr = binary(BinOp::BitAnd, expr, right);
        }
        Ok(expr)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_comparison()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Equal => BinOp::Eq,
                TokenKind::NotEqual => BinOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            expr = binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_shift()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Less => BinOp::Lt,
                TokenKind::LessEqual => BinOp::Le,
                TokenKind::Greater => BinOp::Gt,
                TokenKind::GreaterEqual => BinOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_shift()?;
            expr = binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_shift(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_additive()?;
        loop {
            let op = match self.current().kind {
                TokenKind::ShiftLeft => BinOp::Shl,
                TokenKind::ShiftRight => BinOp::Shr,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            expr = binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_multiplicative()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            expr = binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_unary()?;
        loop {
            let op = match self.current().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary()?;
            expr = binary(op, expr, right);
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.current().kind {
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Not => Some(UnOp::Not),
            TokenKind::BitNot => Some(UnOp::BitNot),
            _ => None,
        };

        if let Some(op) = op {
            let tok = self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                tok.line,
                tok.col,
            ));
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::Integer => {
                self.advance();
                let value: i64 = tok
                    .value
                    .parse()
                    .map_err(|_| self.error_at(&tok, "Invalid integer literal"))?;
                Ok(Expr::typed(
                    ExprKind::IntLiteral(value),
                    tok.line,
                    tok.col,
                    Type::I32,
                ))
            }
            TokenKind::Float => {
                self.advance();
                let value: f64 = tok
                    .value
                    .parse()
                    .map_err(|_| self.error_at(&tok, "Invalid floating-point literal"))?;
                Ok(Expr::typed(
                    ExprKind::FloatLiteral(value),
                    tok.line,
                    tok.col,
                    Type::F64,
                ))
            }
            TokenKind::Str => {
                self.advance();
                Ok(Expr::typed(
                    ExprKind::StrLiteral(tok.value),
                    tok.line,
                    tok.col,
                    Type::Str,
                ))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::typed(
                    ExprKind::BoolLiteral(true),
                    tok.line,
                    tok.col,
                    Type::Bool,
                ))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::typed(
                    ExprKind::BoolLiteral(false),
                    tok.line,
                    tok.col,
                    Type::Bool,
                ))
            }
            TokenKind::Ident => {
                self.advance();
                if self.match_kind(TokenKind::LParen) {
                    let mut args = Vec::new();
                    if !self.check(TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expr()?);
                            if !self.match_kind(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen, "Expected ')' after arguments")?;
                    return Ok(Expr::new(
                        ExprKind::Call {
                            name: tok.value,
                            args,
                        },
                        tok.line,
                        tok.col,
                    ));
                }
                Ok(Expr::new(ExprKind::Ident(tok.value), tok.line, tok.col))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen, "Expected ')' after expression")?;
                Ok(expr)
            }
            TokenKind::Invalid => {
                self.advance();
                Err(self.error_at(&tok, "Invalid token"))
            }
            _ => Err(self.error(format!("Expected expression, found '{}'", tok.kind))),
        }
    }
}

fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    let (line, col) = (left.line, left.col);
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        line,
        col,
    )
}
