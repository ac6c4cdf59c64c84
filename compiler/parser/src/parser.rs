use std::iter::Peekable;

use thiserror::Error;

use ast::*;
use lexer::*;
use ty::{Constant, FuncType, Type};

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected {expected}, but found {found}")]
    ExpectedToken { expected: String, found: String },
    #[error("expected an expression, but found {found}")]
    ExpectedExpression { found: String },
    #[error("unexpected token {found}")]
    UnexpectedToken { found: String },
    #[error("expression is not assignable")]
    InvalidLValue,
}

macro_rules! match_token_types {
    ($( $token:pat ),+ ) => {
        $(
        Some(Token{ kind: $token, ..})
        )|+
    };
}

/// Diagnostic spelling of a token ("'while'", "identifier 'foo'", ...)
fn describe(token: Option<&Token>) -> String {
    match token {
        None => "end of file".to_string(),
        Some(Token {
            kind: TokenType::Identifier,
            value: TokenValue::Ident(name),
            ..
        }) => format!("identifier '{}'", name),
        Some(Token {
            kind: TokenType::Constant,
            value: TokenValue::Integer(value),
            ..
        }) => format!("constant '{}'", value),
        Some(t) => format!("'{}'", t),
    }
}

pub struct Parser {
    tokens: Peekable<std::vec::IntoIter<Token>>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: tokens.into_iter().peekable(),
        }
    }

    pub fn parse(&mut self) -> Result<TranslationUnit, ParseError> {
        let mut decls = vec![];

        while self.peek().is_some() {
            decls.push(self.parse_decl()?);
        }

        Ok(TranslationUnit { decls })
    }

    fn parse_block(&mut self) -> Result<Block, ParseError> {
        self.expect(TokenType::OpenBrace)?;

        let mut body = vec![];

        while self
            .tokens
            .peek()
            .is_some_and(|t| t.kind != TokenType::CloseBrace)
        {
            let next_block = self.parse_block_item()?;
            body.push(next_block);
        }

        self.expect(TokenType::CloseBrace)?;

        Ok(Block { items: body })
    }

    fn parse_block_item(&mut self) -> Result<BlockItem, ParseError> {
        match self.tokens.peek() {
            match_token_types!(
                TokenType::Int,
                TokenType::Long,
                TokenType::Unsigned,
                TokenType::Static
            ) => Ok(BlockItem::D(self.parse_var_decl()?)),
            Some(_) => Ok(BlockItem::S(self.parse_stmt()?)),
            None => Err(ParseError::ExpectedToken {
                expected: "'}'".to_string(),
                found: "end of file".to_string(),
            }),
        }
    }

    /// Shared look-ahead for the top level: specifiers, then a name, then `(`
    /// begins a function definition and anything else a variable declaration
    pub fn parse_decl(&mut self) -> Result<Decl, ParseError> {
        let specifiers = self.parse_specifier_list();
        let (t, is_static) = self.parse_type_and_storage(specifiers)?;

        let ident = self.parse_ident()?;

        match self.peek() {
            Some(Token {
                kind: TokenType::OpenParen,
                ..
            }) => Ok(Decl::FuncDecl(self.parse_rest_func_decl(ident, t)?)),
            _ => Ok(Decl::VarDecl(self.parse_rest_var_decl(ident, is_static, t)?)),
        }
    }

    fn parse_var_decl(&mut self) -> Result<VarDecl, ParseError> {
        let specifiers = self.parse_specifier_list();
        let (t, is_static) = self.parse_type_and_storage(specifiers)?;

        let ident = self.parse_ident()?;

        self.parse_rest_var_decl(ident, is_static, t)
    }

    fn parse_specifier_list(&mut self) -> Vec<Token> {
        let mut specifiers = vec![];

        loop {
            match self.peek() {
                match_token_types!(
                    TokenType::Int,
                    TokenType::Long,
                    TokenType::Unsigned,
                    TokenType::Static
                ) => {
                    specifiers.push(self.tokens.next().unwrap());
                }
                _ => break,
            }
        }

        specifiers
    }

    fn parse_type_and_storage(
        &mut self,
        specifiers: Vec<Token>,
    ) -> Result<(Type, bool), ParseError> {
        let (types, storage_classes): (Vec<_>, Vec<_>) = specifiers
            .into_iter()
            .partition(|spec| spec.kind != TokenType::Static);

        if storage_classes.len() > 1 {
            return Err(ParseError::UnexpectedToken {
                found: "'static'".to_string(),
            });
        }

        let ty = self.parse_type(types.iter().map(|t| t.kind).collect())?;

        Ok((ty, !storage_classes.is_empty()))
    }

    fn parse_type(&mut self, types: Vec<TokenType>) -> Result<Type, ParseError> {
        match types.as_slice() {
            [TokenType::Int] => Ok(Type::Int),
            [TokenType::Long]
            | [TokenType::Int, TokenType::Long]
            | [TokenType::Long, TokenType::Int] => Ok(Type::Long),
            [TokenType::Unsigned] | [TokenType::Unsigned, TokenType::Int] => Ok(Type::UInt),
            [TokenType::Unsigned, TokenType::Long] => Ok(Type::ULong),
            [] => Err(ParseError::ExpectedToken {
                expected: "a type specifier".to_string(),
                found: describe(self.tokens.peek()),
            }),
            [tokens @ ..] => {
                let invalid = tokens
                    .iter()
                    .map(|t| format!("{:?}", t))
                    .collect::<Vec<String>>()
                    .join(" ");

                Err(ParseError::UnexpectedToken {
                    found: format!("'{}'", invalid),
                })
            }
        }
    }

    fn parse_param_list(&mut self) -> Result<Vec<(Type, String)>, ParseError> {
        match self.peek() {
            Some(Token {
                kind: TokenType::Void,
                ..
            }) => {
                self.expect(TokenType::Void)?;
                Ok(vec![])
            }
            Some(Token {
                kind: TokenType::CloseParen,
                ..
            }) => Ok(vec![]),
            _ => {
                let mut params = vec![];

                loop {
                    let type_specs = self.parse_specifier_list();
                    let next_param_type = self.parse_type(type_specs.iter().map(|t| t.kind).collect())?;
                    let next_param_name = self.parse_ident()?;
                    params.push((next_param_type, next_param_name));

                    if self
                        .peek()
                        .is_some_and(|token| token.kind == TokenType::Comma)
                    {
                        self.expect(TokenType::Comma)?;
                    } else {
                        break;
                    }
                }

                Ok(params)
            }
        }
    }

    fn parse_rest_func_decl(
        &mut self,
        name: String,
        return_type: Type,
    ) -> Result<FuncDecl, ParseError> {
        self.expect(TokenType::OpenParen)?;

        let params_with_types = self.parse_param_list()?;

        self.expect(TokenType::CloseParen)?;

        let (param_types, param_names) = params_with_types.into_iter().unzip();
        let func_type = FuncType {
            param_types,
            return_type: Box::from(return_type),
        };

        let body = self.parse_block()?;

        Ok(FuncDecl {
            ident: name,
            params: param_names,
            func_type,
            body,
        })
    }

    fn parse_rest_var_decl(
        &mut self,
        name: String,
        is_static: bool,
        var_type: Type,
    ) -> Result<VarDecl, ParseError> {
        let init;

        match self.tokens.peek() {
            Some(Token {
                kind: TokenType::Equal,
                ..
            }) => {
                self.expect(TokenType::Equal)?;
                init = Some(self.parse_expr(0)?);
                self.expect(TokenType::Semicolon)?;
            }
            Some(Token {
                kind: TokenType::Semicolon,
                ..
            }) => {
                self.expect(TokenType::Semicolon)?;
                init = None;
            }
            t => {
                return Err(ParseError::ExpectedToken {
                    expected: "'=' or ';'".to_string(),
                    found: describe(t),
                });
            }
        }

        Ok(VarDecl {
            name,
            init,
            var_type,
            is_static,
        })
    }

    fn parse_ident(&mut self) -> Result<String, ParseError> {
        match self.tokens.next() {
            Some(Token {
                kind: TokenType::Identifier,
                value: TokenValue::Ident(ident),
                ..
            }) => Ok(ident),
            t => Err(ParseError::ExpectedToken {
                expected: "an identifier".to_string(),
                found: describe(t.as_ref()),
            }),
        }
    }

    pub fn parse_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.peek() {
            Some(Token {
                kind: TokenType::Return,
                ..
            }) => {
                self.expect(TokenType::Return)?;

                let expr = self.parse_expr(0)?;

                self.expect(TokenType::Semicolon)?;

                Ok(Stmt::Return { expr })
            }
            Some(Token {
                kind: TokenType::Semicolon,
                ..
            }) => {
                self.expect(TokenType::Semicolon)?;
                Ok(Stmt::Null)
            }
            Some(Token {
                kind: TokenType::If,
                ..
            }) => {
                self.expect(TokenType::If)?;
                self.expect(TokenType::OpenParen)?;

                let condition = self.parse_expr(0)?;

                self.expect(TokenType::CloseParen)?;

                let then = self.parse_stmt()?;

                let otherwise = match self.peek() {
                    Some(Token {
                        kind: TokenType::Else,
                        ..
                    }) => {
                        self.expect(TokenType::Else)?;

                        Some(Box::from(self.parse_stmt()?))
                    }
                    _ => None,
                };

                Ok(Stmt::If {
                    condition,
                    then: Box::from(then),
                    otherwise,
                })
            }
            Some(Token {
                kind: TokenType::OpenBrace,
                ..
            }) => Ok(Stmt::Compound {
                block: self.parse_block()?,
            }),
            Some(Token {
                kind: TokenType::Break,
                ..
            }) => {
                self.expect(TokenType::Break)?;
                self.expect(TokenType::Semicolon)?;
                Ok(Stmt::Break)
            }
            Some(Token {
                kind: TokenType::Continue,
                ..
            }) => {
                self.expect(TokenType::Continue)?;
                self.expect(TokenType::Semicolon)?;
                Ok(Stmt::Continue)
            }
            Some(Token {
                kind: TokenType::While,
                ..
            }) => {
                self.expect(TokenType::While)?;
                self.expect(TokenType::OpenParen)?;

                let condition = self.parse_expr(0)?;

                self.expect(TokenType::CloseParen)?;

                let body = self.parse_stmt()?;

                Ok(Stmt::While {
                    condition,
                    body: Box::from(body),
                })
            }
            Some(Token {
                kind: TokenType::Do,
                ..
            }) => {
                self.expect(TokenType::Do)?;

                let body = self.parse_stmt()?;

                self.expect(TokenType::While)?;
                self.expect(TokenType::OpenParen)?;

                let condition = self.parse_expr(0)?;

                self.expect(TokenType::CloseParen)?;
                self.expect(TokenType::Semicolon)?;

                Ok(Stmt::DoWhile {
                    body: Box::from(body),
                    condition,
                })
            }
            Some(Token {
                kind: TokenType::For,
                ..
            }) => {
                self.expect(TokenType::For)?;
                self.expect(TokenType::OpenParen)?;

                let init = self.parse_for_init()?;
                let condition = self.parse_optional_expr(TokenType::Semicolon)?;
                let post = self.parse_optional_expr(TokenType::CloseParen)?;
                let body = self.parse_stmt()?;

                Ok(Stmt::For {
                    init,
                    condition,
                    post,
                    body: Box::from(body),
                })
            }
            _ => {
                let expr = Stmt::Expression {
                    expr: self.parse_expr(0)?,
                };
                self.expect(TokenType::Semicolon)?;
                Ok(expr)
            }
        }
    }

    fn parse_for_init(&mut self) -> Result<ForInit, ParseError> {
        match self.peek() {
            match_token_types!(
                TokenType::Int,
                TokenType::Long,
                TokenType::Unsigned,
                TokenType::Static
            ) => Ok(ForInit::Decl(self.parse_var_decl()?)),
            _ => Ok(ForInit::Expr(
                self.parse_optional_expr(TokenType::Semicolon)?,
            )),
        }
    }

    fn parse_optional_expr(&mut self, delim: TokenType) -> Result<Option<Expr>, ParseError> {
        match self.peek() {
            Some(token) => {
                if token.kind == delim {
                    self.expect(delim)?;
                    Ok(None)
                } else {
                    let expr = self.parse_expr(0)?;
                    self.expect(delim)?;
                    Ok(Some(expr))
                }
            }
            None => Err(ParseError::ExpectedToken {
                expected: "an expression".to_string(),
                found: "end of file".to_string(),
            }),
        }
    }

    pub fn parse_expr(&mut self, min_prec: i32) -> Result<Expr, ParseError> {
        let mut left = self.parse_factor()?;

        while let Some(next) = self.peek() {
            if let Some(prec) = get_precedence(next.kind) {
                if prec >= min_prec {
                    if is_assignment(next.kind) {
                        self.tokens.next();

                        if !left.is_lvalue() {
                            return Err(ParseError::InvalidLValue);
                        }

                        let right = self.parse_expr(prec)?;
                        left = match get_compound(next.kind) {
                            None => Expr::Assignment {
                                lvalue: Box::from(left),
                                expr: Box::from(right),
                            },
                            // `lhs op= rhs` is sugar for `lhs = lhs op rhs`
                            Some(op) => {
                                let combined = Expr::Binary {
                                    op,
                                    left: Box::from(left.clone()),
                                    right: Box::from(right),
                                };

                                Expr::Assignment {
                                    lvalue: Box::from(left),
                                    expr: Box::from(combined),
                                }
                            }
                        }
                    } else if next.kind == TokenType::Question {
                        self.expect(TokenType::Question)?;
                        let middle = self.parse_expr(0)?;
                        self.expect(TokenType::Colon)?;

                        let right = self.parse_expr(prec)?;

                        left = Expr::Conditional {
                            condition: Box::from(left),
                            then: Box::from(middle),
                            otherwise: Box::from(right),
                        }
                    } else {
                        let operator = self.parse_binop()?;
                        let right = self.parse_expr(prec + 1)?;
                        left = Expr::Binary {
                            op: operator,
                            left: Box::new(left),
                            right: Box::new(right),
                        }
                    }
                } else {
                    break;
                }
            } else {
                break;
            }
        }

        Ok(left)
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        match self.tokens.peek() {
            match_token_types!(TokenType::Minus, TokenType::Tilde, TokenType::Bang) => {
                let unop = self.parse_unop()?;
                let expr = self.parse_factor()?;

                Ok(Expr::Unary {
                    op: unop,
                    expr: Box::new(expr),
                })
            }
            // prefix `++x` is sugar for `x = x + 1`, and `--x` likewise
            match_token_types!(TokenType::PlusPlus, TokenType::MinusMinus) => {
                let op = match self.tokens.next().unwrap().kind {
                    TokenType::PlusPlus => BinaryOp::Add,
                    TokenType::MinusMinus => BinaryOp::Subtract,
                    _ => unreachable!("Internal Error: peeked ++/-- and found something else"),
                };

                let operand = self.parse_factor()?;

                if !operand.is_lvalue() {
                    return Err(ParseError::InvalidLValue);
                }

                let combined = Expr::Binary {
                    op,
                    left: Box::from(operand.clone()),
                    right: Box::from(Expr::Constant(Constant::Int(1))),
                };

                Ok(Expr::Assignment {
                    lvalue: Box::from(operand),
                    expr: Box::from(combined),
                })
            }
            Some(_) => self.parse_postfix_expr(),
            None => Err(ParseError::ExpectedExpression {
                found: "end of file".to_string(),
            }),
        }
    }

    fn parse_postfix_expr(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary_expr()?;

        loop {
            match self.tokens.peek() {
                Some(Token {
                    kind: TokenType::PlusPlus,
                    ..
                }) => {
                    self.tokens.next();

                    if !expr.is_lvalue() {
                        return Err(ParseError::InvalidLValue);
                    }

                    expr = Expr::PostfixInc(Box::from(expr));
                }
                Some(Token {
                    kind: TokenType::MinusMinus,
                    ..
                }) => {
                    self.tokens.next();

                    if !expr.is_lvalue() {
                        return Err(ParseError::InvalidLValue);
                    }

                    expr = Expr::PostfixDec(Box::from(expr));
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Some(Token {
                kind: TokenType::OpenParen,
                ..
            }) => {
                self.tokens.next();
                let expr = self.parse_expr(0)?;
                self.expect(TokenType::CloseParen)?;

                Ok(expr)
            }
            Some(Token {
                kind: TokenType::Constant,
                ..
            }) => {
                let value = self.parse_constant()?;
                Ok(Expr::Constant(value))
            }
            Some(Token {
                kind: TokenType::Identifier,
                value: TokenValue::Ident(ident),
                ..
            }) => {
                let ident = ident.clone();
                self.expect(TokenType::Identifier)?;

                if let Some(Token {
                    kind: TokenType::OpenParen,
                    ..
                }) = self.peek()
                {
                    let args = self.parse_arg_list()?;

                    Ok(Expr::FunctionCall { func: ident, args })
                } else {
                    Ok(Expr::Var(ident))
                }
            }
            t => Err(ParseError::ExpectedExpression {
                found: describe(t.as_ref()),
            }),
        }
    }

    fn parse_constant(&mut self) -> Result<Constant, ParseError> {
        match self.tokens.next() {
            Some(Token {
                kind: TokenType::Constant,
                value: TokenValue::Integer(value),
                ..
            }) => {
                // a literal that does not fit in an int is a long
                if let Ok(int) = i32::try_from(value) {
                    Ok(Constant::Int(int))
                } else {
                    Ok(Constant::Long(value))
                }
            }
            t => Err(ParseError::ExpectedToken {
                expected: "a constant".to_string(),
                found: describe(t.as_ref()),
            }),
        }
    }

    fn parse_arg_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(TokenType::OpenParen)?;

        let mut args = vec![];

        loop {
            match self.peek() {
                None => {
                    return Err(ParseError::ExpectedToken {
                        expected: "')'".to_string(),
                        found: "end of file".to_string(),
                    })
                }
                Some(Token {
                    kind: TokenType::Comma,
                    ..
                }) => {
                    self.expect(TokenType::Comma)?;

                    if self
                        .peek()
                        .is_some_and(|token| token.kind == TokenType::CloseParen)
                    {
                        return Err(ParseError::UnexpectedToken {
                            found: "','".to_string(),
                        });
                    }
                }
                Some(Token {
                    kind: TokenType::CloseParen,
                    ..
                }) => {
                    self.expect(TokenType::CloseParen)?;
                    break;
                }
                Some(_) => {
                    args.push(self.parse_expr(0)?);
                }
            }
        }

        Ok(args)
    }

    fn parse_unop(&mut self) -> Result<UnaryOp, ParseError> {
        match self.tokens.next() {
            Some(Token {
                kind: TokenType::Minus,
                ..
            }) => Ok(UnaryOp::Negate),
            Some(Token {
                kind: TokenType::Tilde,
                ..
            }) => Ok(UnaryOp::Complement),
            Some(Token {
                kind: TokenType::Bang,
                ..
            }) => Ok(UnaryOp::Not),
            t => Err(ParseError::ExpectedToken {
                expected: "a unary operator".to_string(),
                found: describe(t.as_ref()),
            }),
        }
    }

    fn parse_binop(&mut self) -> Result<BinaryOp, ParseError> {
        let t = self.tokens.next();

        match t {
            Some(Token {
                kind: TokenType::Plus,
                ..
            }) => Ok(BinaryOp::Add),
            Some(Token {
                kind: TokenType::Minus,
                ..
            }) => Ok(BinaryOp::Subtract),
            Some(Token {
                kind: TokenType::Star,
                ..
            }) => Ok(BinaryOp::Multiply),
            Some(Token {
                kind: TokenType::Slash,
                ..
            }) => Ok(BinaryOp::Divide),
            Some(Token {
                kind: TokenType::Percent,
                ..
            }) => Ok(BinaryOp::Modulo),

            Some(Token {
                kind: TokenType::Less,
                ..
            }) => Ok(BinaryOp::Less),
            Some(Token {
                kind: TokenType::LessEqual,
                ..
            }) => Ok(BinaryOp::LessEqual),
            Some(Token {
                kind: TokenType::Greater,
                ..
            }) => Ok(BinaryOp::Greater),
            Some(Token {
                kind: TokenType::GreaterEqual,
                ..
            }) => Ok(BinaryOp::GreaterEqual),
            Some(Token {
                kind: TokenType::AmpAmp,
                ..
            }) => Ok(BinaryOp::And),
            Some(Token {
                kind: TokenType::PipePipe,
                ..
            }) => Ok(BinaryOp::Or),
            Some(Token {
                kind: TokenType::EqualEqual,
                ..
            }) => Ok(BinaryOp::Equal),
            Some(Token {
                kind: TokenType::BangEqual,
                ..
            }) => Ok(BinaryOp::NotEqual),

            // Bitwise
            Some(Token {
                kind: TokenType::Amp,
                ..
            }) => Ok(BinaryOp::BitwiseAnd),
            Some(Token {
                kind: TokenType::Pipe,
                ..
            }) => Ok(BinaryOp::BitwiseOr),
            Some(Token {
                kind: TokenType::Xor,
                ..
            }) => Ok(BinaryOp::BitwiseXor),
            Some(Token {
                kind: TokenType::LessLess,
                ..
            }) => Ok(BinaryOp::BitshiftLeft),
            Some(Token {
                kind: TokenType::GreaterGreater,
                ..
            }) => Ok(BinaryOp::BitshiftRight),
            _ => Err(ParseError::ExpectedToken {
                expected: "a binary operator".to_string(),
                found: describe(t.as_ref()),
            }),
        }
    }

    /// Checks if next token is of correct expected type
    fn expect(&mut self, expected: TokenType) -> Result<Token, ParseError> {
        match self.tokens.next() {
            Some(t) if t.kind == expected => Ok(t),
            t => Err(ParseError::ExpectedToken {
                expected: describe_kind(expected),
                found: describe(t.as_ref()),
            }),
        }
    }

    fn peek(&mut self) -> Option<Token> {
        self.tokens.peek().cloned()
    }
}

fn describe_kind(kind: TokenType) -> String {
    match kind {
        TokenType::Identifier => "an identifier".to_string(),
        TokenType::Constant => "a constant".to_string(),
        _ => {
            let token = Token {
                kind,
                start: 0,
                end: 0,
                value: TokenValue::None,
                line: 0,
                col: 0,
            };
            format!("'{}'", token)
        }
    }
}

fn get_precedence(token: TokenType) -> Option<i32> {
    match token {
        TokenType::Star | TokenType::Slash | TokenType::Percent => Some(50),
        TokenType::Plus | TokenType::Minus => Some(45),
        TokenType::LessLess | TokenType::GreaterGreater => Some(40),
        TokenType::Less | TokenType::LessEqual | TokenType::Greater | TokenType::GreaterEqual => {
            Some(35)
        }
        TokenType::EqualEqual | TokenType::BangEqual => Some(30),
        TokenType::Amp => Some(25),
        TokenType::Xor => Some(20),
        TokenType::Pipe => Some(15),
        TokenType::AmpAmp => Some(10),
        TokenType::PipePipe => Some(5),
        TokenType::Question => Some(3),
        TokenType::Equal
        | TokenType::PlusEqual
        | TokenType::MinusEqual
        | TokenType::StarEqual
        | TokenType::SlashEqual
        | TokenType::PercentEqual
        | TokenType::AmpEqual
        | TokenType::XorEqual
        | TokenType::PipeEqual
        | TokenType::LessLessEqual
        | TokenType::GreaterGreaterEqual => Some(1),
        _ => None,
    }
}

fn is_assignment(token_type: TokenType) -> bool {
    matches!(
        token_type,
        TokenType::Equal
            | TokenType::PlusEqual
            | TokenType::MinusEqual
            | TokenType::StarEqual
            | TokenType::SlashEqual
            | TokenType::PercentEqual
            | TokenType::AmpEqual
            | TokenType::XorEqual
            | TokenType::PipeEqual
            | TokenType::LessLessEqual
            | TokenType::GreaterGreaterEqual
    )
}

fn get_compound(token_type: TokenType) -> Option<BinaryOp> {
    match token_type {
        TokenType::Equal => None,

        TokenType::PlusEqual => Some(BinaryOp::Add),
        TokenType::MinusEqual => Some(BinaryOp::Subtract),
        TokenType::SlashEqual => Some(BinaryOp::Divide),
        TokenType::StarEqual => Some(BinaryOp::Multiply),
        TokenType::PercentEqual => Some(BinaryOp::Modulo),
        TokenType::AmpEqual => Some(BinaryOp::BitwiseAnd),
        TokenType::PipeEqual => Some(BinaryOp::BitwiseOr),
        TokenType::XorEqual => Some(BinaryOp::BitwiseXor),
        TokenType::LessLessEqual => Some(BinaryOp::BitshiftLeft),
        TokenType::GreaterGreaterEqual => Some(BinaryOp::BitshiftRight),

        _ => unreachable!("Not an assignment operator: '{:?}'", token_type),
    }
}

#[cfg(test)]
mod tests {
    use lexer::*;
    use ty::Constant;

    use super::*;

    macro_rules! constant {
        ($expr:expr, i32) => {
            Expr::Constant(Constant::Int($expr))
        };
        ($expr:expr, i64) => {
            Expr::Constant(Constant::Long($expr))
        };
    }

    macro_rules! var {
        ($expr:literal) => {
            // String::from() so only string literals are accepted
            Expr::Var(String::from($expr))
        };
    }

    /// Macro for generating a binary expression
    /// left and right expressions do NOT need to be boxed, the macro handles that
    macro_rules! binary {
        ($op:expr, $left:expr, $right:expr) => {
            Expr::Binary {
                op: $op,
                left: Box::new($left),
                right: Box::new($right),
            }
        };
    }

    /// Macro for generating a unary expression
    /// expr does NOT need to be boxed, the macro handles that
    macro_rules! unary {
        ($op:expr, $expr:expr) => {
            Expr::Unary {
                op: $op,
                expr: Box::new($expr),
            }
        };
    }

    /// Macro for generating a conditional expression
    /// condition, then, and otherwise do NOT need to be boxed, the macro handles that
    macro_rules! conditional {
        ($cond:expr, $then:expr, $otherwise:expr) => {
            Expr::Conditional {
                condition: Box::new($cond),
                then: Box::new($then),
                otherwise: Box::new($otherwise),
            }
        };
    }

    macro_rules! assignment {
        ($lvalue:expr, $expr:expr) => {
            Expr::Assignment {
                lvalue: Box::new($lvalue),
                expr: Box::new($expr),
            }
        };
    }

    fn parse_expr_src(src: &str) -> Expr {
        let tokens = Lexer::new(src).tokenize().collect();
        Parser::new(tokens).parse_expr(0).unwrap()
    }

    #[test]
    fn simple_add() {
        assert_eq!(
            parse_expr_src("3 + 5"),
            binary!(BinaryOp::Add, constant!(3, i32), constant!(5, i32))
        )
    }

    #[test]
    fn triple_add_groups_left() {
        assert_eq!(
            parse_expr_src("3 + 5 + 6"),
            binary!(
                BinaryOp::Add,
                binary!(BinaryOp::Add, constant!(3, i32), constant!(5, i32)),
                constant!(6, i32)
            )
        )
    }

    #[test]
    fn add_mul() {
        assert_eq!(
            parse_expr_src("3 + 5 + 6 * 2"),
            binary!(
                BinaryOp::Add,
                binary!(BinaryOp::Add, constant!(3, i32), constant!(5, i32)),
                binary!(BinaryOp::Multiply, constant!(6, i32), constant!(2, i32))
            )
        )
    }

    #[test]
    fn mul_binds_tighter_on_the_left() {
        assert_eq!(
            parse_expr_src("3 * 5 + 6"),
            binary!(
                BinaryOp::Add,
                binary!(BinaryOp::Multiply, constant!(3, i32), constant!(5, i32)),
                constant!(6, i32)
            )
        )
    }

    #[test]
    fn shift_binds_looser_than_add() {
        assert_eq!(
            parse_expr_src("1 << 2 + 3"),
            binary!(
                BinaryOp::BitshiftLeft,
                constant!(1, i32),
                binary!(BinaryOp::Add, constant!(2, i32), constant!(3, i32))
            )
        )
    }

    #[test]
    fn bitwise_tower() {
        // & binds tighter than ^, which binds tighter than |
        assert_eq!(
            parse_expr_src("1 | 2 ^ 3 & 4"),
            binary!(
                BinaryOp::BitwiseOr,
                constant!(1, i32),
                binary!(
                    BinaryOp::BitwiseXor,
                    constant!(2, i32),
                    binary!(BinaryOp::BitwiseAnd, constant!(3, i32), constant!(4, i32))
                )
            )
        )
    }

    #[test]
    fn relational_vs_logical() {
        assert_eq!(
            parse_expr_src("1 < 2 && 3 > 4"),
            binary!(
                BinaryOp::And,
                binary!(BinaryOp::Less, constant!(1, i32), constant!(2, i32)),
                binary!(BinaryOp::Greater, constant!(3, i32), constant!(4, i32))
            )
        )
    }

    #[test]
    fn add_with_unary() {
        assert_eq!(
            parse_expr_src("3 + 5 + (-6)"),
            binary!(
                BinaryOp::Add,
                binary!(BinaryOp::Add, constant!(3, i32), constant!(5, i32)),
                unary!(UnaryOp::Negate, constant!(6, i32))
            )
        )
    }

    #[test]
    fn ternary_expr() {
        assert_eq!(
            parse_expr_src("a ? 1 : 0"),
            conditional!(var!("a"), constant!(1, i32), constant!(0, i32))
        )
    }

    #[test]
    fn ternary_groups_right() {
        assert_eq!(
            parse_expr_src("a ? 1 : b ? 2 : 3"),
            conditional!(
                var!("a"),
                constant!(1, i32),
                conditional!(var!("b"), constant!(2, i32), constant!(3, i32))
            )
        )
    }

    #[test]
    fn assignment_groups_right() {
        assert_eq!(
            parse_expr_src("a = b = 1"),
            assignment!(var!("a"), assignment!(var!("b"), constant!(1, i32)))
        )
    }

    #[test]
    fn compound_assignment_desugars() {
        assert_eq!(
            parse_expr_src("a += 2"),
            assignment!(
                var!("a"),
                binary!(BinaryOp::Add, var!("a"), constant!(2, i32))
            )
        )
    }

    #[test]
    fn shift_assignment_desugars() {
        assert_eq!(
            parse_expr_src("a <<= 3"),
            assignment!(
                var!("a"),
                binary!(BinaryOp::BitshiftLeft, var!("a"), constant!(3, i32))
            )
        )
    }

    #[test]
    fn prefix_inc_desugars() {
        assert_eq!(
            parse_expr_src("++x"),
            assignment!(
                var!("x"),
                binary!(BinaryOp::Add, var!("x"), constant!(1, i32))
            )
        )
    }

    #[test]
    fn postfix_inc() {
        assert_eq!(parse_expr_src("x++"), Expr::PostfixInc(Box::new(var!("x"))))
    }

    #[test]
    fn long_literal() {
        assert_eq!(parse_expr_src("4294967296"), constant!(4294967296, i64))
    }

    #[test]
    fn int_literal_boundary() {
        assert_eq!(parse_expr_src("2147483647"), constant!(2147483647, i32));
        assert_eq!(parse_expr_src("2147483648"), constant!(2147483648, i64));
    }

    #[test]
    fn assignment_requires_lvalue() {
        let tokens = Lexer::new("1 = 2").tokenize().collect();
        let result = Parser::new(tokens).parse_expr(0);

        assert_eq!(result, Err(ParseError::InvalidLValue));
    }

    #[test]
    fn postfix_requires_lvalue() {
        let tokens = Lexer::new("3++").tokenize().collect();
        let result = Parser::new(tokens).parse_expr(0);

        assert_eq!(result, Err(ParseError::InvalidLValue));
    }

    fn parse_stmt_src(src: &str) -> Stmt {
        let tokens = Lexer::new(src).tokenize().collect();
        Parser::new(tokens).parse_stmt().unwrap()
    }

    #[test]
    fn if_stmt() {
        assert_eq!(
            parse_stmt_src("if (a == 0) return 5;"),
            Stmt::If {
                condition: binary!(BinaryOp::Equal, var!("a"), constant!(0, i32)),
                then: Box::new(Stmt::Return {
                    expr: constant!(5, i32)
                }),
                otherwise: None,
            }
        )
    }

    #[test]
    fn if_else_stmt() {
        assert_eq!(
            parse_stmt_src("if (a == 0) return 5; else return 4;"),
            Stmt::If {
                condition: binary!(BinaryOp::Equal, var!("a"), constant!(0, i32)),
                then: Box::new(Stmt::Return {
                    expr: constant!(5, i32)
                }),
                otherwise: Some(Box::new(Stmt::Return {
                    expr: constant!(4, i32)
                })),
            }
        )
    }

    #[test]
    fn while_stmt() {
        assert_eq!(
            parse_stmt_src("while(x > 0) x--;"),
            Stmt::While {
                condition: binary!(BinaryOp::Greater, var!("x"), constant!(0, i32)),
                body: Box::new(Stmt::Expression {
                    expr: Expr::PostfixDec(Box::new(var!("x"))),
                }),
            }
        )
    }

    #[test]
    fn do_while_break() {
        assert_eq!(
            parse_stmt_src("do break; while(1);"),
            Stmt::DoWhile {
                body: Box::new(Stmt::Break),
                condition: constant!(1, i32),
            }
        )
    }

    #[test]
    fn empty_for_loop() {
        assert_eq!(
            parse_stmt_src("for (;;) ;"),
            Stmt::For {
                init: ForInit::Expr(None),
                condition: None,
                post: None,
                body: Box::new(Stmt::Null),
            }
        )
    }

    fn parse_decl_src(src: &str) -> Decl {
        let tokens = Lexer::new(src).tokenize().collect();
        Parser::new(tokens).parse_decl().unwrap()
    }

    #[test]
    fn static_var_decl() {
        assert_eq!(
            parse_decl_src("static int a = 3;"),
            Decl::VarDecl(VarDecl {
                name: "a".to_string(),
                init: Some(constant!(3, i32)),
                var_type: Type::Int,
                is_static: true,
            })
        )
    }

    #[test]
    fn static_var_decl_reversed_specifiers() {
        assert_eq!(
            parse_decl_src("int static a = 3;"),
            Decl::VarDecl(VarDecl {
                name: "a".to_string(),
                init: Some(constant!(3, i32)),
                var_type: Type::Int,
                is_static: true,
            })
        )
    }

    #[test]
    fn long_int_decl() {
        assert_eq!(
            parse_decl_src("long int a = 3;"),
            Decl::VarDecl(VarDecl {
                name: "a".to_string(),
                init: Some(constant!(3, i32)),
                var_type: Type::Long,
                is_static: false,
            })
        )
    }

    #[test]
    fn unsigned_decls() {
        assert_eq!(
            parse_decl_src("unsigned int a;"),
            Decl::VarDecl(VarDecl {
                name: "a".to_string(),
                init: None,
                var_type: Type::UInt,
                is_static: false,
            })
        );

        assert_eq!(
            parse_decl_src("unsigned long b;"),
            Decl::VarDecl(VarDecl {
                name: "b".to_string(),
                init: None,
                var_type: Type::ULong,
                is_static: false,
            })
        );

        assert_eq!(
            parse_decl_src("unsigned c;"),
            Decl::VarDecl(VarDecl {
                name: "c".to_string(),
                init: None,
                var_type: Type::UInt,
                is_static: false,
            })
        );
    }

    #[test]
    fn function_with_typed_params() {
        let decl = parse_decl_src("int my_function(long a, unsigned long b) { return 0; }");

        match decl {
            Decl::FuncDecl(func) => {
                assert_eq!(func.ident, "my_function");
                assert_eq!(func.params, vec!["a".to_string(), "b".to_string()]);
                assert_eq!(
                    func.func_type,
                    FuncType {
                        param_types: vec![Type::Long, Type::ULong],
                        return_type: Box::new(Type::Int),
                    }
                );
            }
            Decl::VarDecl(_) => panic!("parsed a variable declaration instead of a function"),
        }
    }

    #[test]
    fn function_with_empty_params() {
        let decl = parse_decl_src("int foo() { return 1; }");

        match decl {
            Decl::FuncDecl(func) => {
                assert_eq!(func.ident, "foo");
                assert!(func.params.is_empty());
            }
            Decl::VarDecl(_) => panic!("parsed a variable declaration instead of a function"),
        }
    }

    #[test]
    fn parse_is_deterministic() {
        let src = "int main(void) { int a = 1; if (a) return a; return 1 + 2 * 3; }";

        let first_tokens: Vec<Token> = Lexer::new(src).tokenize().collect();
        let second_tokens: Vec<Token> = Lexer::new(src).tokenize().collect();

        let first = Parser::new(first_tokens).parse().unwrap();
        let second = Parser::new(second_tokens).parse().unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn missing_semicolon_is_reported() {
        let tokens = Lexer::new("int main(void) { return 2 }").tokenize().collect();
        let result = Parser::new(tokens).parse();

        assert!(matches!(result, Err(ParseError::ExpectedToken { .. })));
    }

    #[test]
    fn prototypes_are_rejected() {
        let tokens = Lexer::new("int foo(void);").tokenize().collect();
        let result = Parser::new(tokens).parse();

        assert!(matches!(result, Err(ParseError::ExpectedToken { .. })));
    }
}
