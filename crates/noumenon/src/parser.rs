//! The recursive-descent parser.
//!
//! Tokens are pulled from the lexer on demand, so statements can be parsed
//! one at a time and evaluated as they complete; interactive mode depends on
//! this. The grammar has exactly three binary precedence levels (comparisons;
//! `+ - ||`; `* / % &&`) and each level consumes at most one operator, so
//! `a + b + c` parses as `a + b` and leaves `+ c` in the stream. Operator
//! chaining requires explicit parentheses.

use std::{collections::BTreeMap, rc::Rc};

use smallvec::SmallVec;

use crate::{
    ast::{BinaryOp, Expr, FunctionDef, Stmt, UnaryOp, Variable},
    error::ParseError,
    lexer::{Lexer, Token},
};

pub(crate) struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self { lexer, current }
    }

    /// Parses the next statement, or `None` at end of input.
    pub fn next_statement(&mut self) -> Result<Option<Stmt>, ParseError> {
        if self.current == Token::Eof {
            return Ok(None);
        }
        self.parse_statement().map(Some)
    }

    fn eat(&mut self, token: Token) -> Result<(), ParseError> {
        if self.current == token {
            self.current = self.lexer.next_token();
            return Ok(());
        }

        Err(self.error(format!(
            "unexpected token \"{}\" instead of \"{}\"",
            self.current.name(),
            token.name()
        )))
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.lexer.row, self.lexer.col, message)
    }

    fn parse_identifier(&mut self) -> Result<Rc<str>, ParseError> {
        let identifier: Rc<str> = Rc::from(self.lexer.lexeme());
        self.eat(Token::Identifier)?;
        Ok(identifier)
    }

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_operand()?;

        let op = match self.current {
            Token::EqualEqual => BinaryOp::Equ,
            Token::NotEqual => BinaryOp::Neq,
            Token::Less => BinaryOp::Les,
            Token::LessEqual => BinaryOp::Leq,
            Token::Greater => BinaryOp::Grt,
            Token::GreaterEqual => BinaryOp::Geq,
            _ => return Ok(lhs),
        };
        self.eat(self.current)?;

        let rhs = self.parse_operand()?;
        Ok(Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn parse_operand(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_term()?;

        let op = match self.current {
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Sub,
            Token::OrOr => BinaryOp::Or,
            _ => return Ok(lhs),
        };
        self.eat(self.current)?;

        let rhs = self.parse_term()?;
        Ok(Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_unary()?;

        let op = match self.current {
            Token::Star => BinaryOp::Mul,
            Token::Slash => BinaryOp::Div,
            Token::Percent => BinaryOp::Mod,
            Token::AndAnd => BinaryOp::And,
            _ => return Ok(lhs),
        };
        self.eat(self.current)?;

        let rhs = self.parse_unary()?;
        Ok(Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.current {
            Token::Minus => UnaryOp::Neg,
            Token::Not => UnaryOp::Not,
            _ => return self.parse_factor(),
        };
        self.eat(self.current)?;

        let rhs = self.parse_factor()?;
        Ok(Expr::Unary {
            op,
            rhs: Box::new(rhs),
        })
    }

    fn parse_factor(&mut self) -> Result<Expr, ParseError> {
        match self.current {
            Token::Integer => {
                let value: i64 = self
                    .lexer
                    .lexeme()
                    .parse()
                    .map_err(|_| self.error("integer literal out of range"))?;
                self.eat(Token::Integer)?;
                Ok(Expr::Int(value))
            }
            Token::Float => {
                let value: f64 = self
                    .lexer
                    .lexeme()
                    .parse()
                    .map_err(|_| self.error("malformed float literal"))?;
                self.eat(Token::Float)?;
                Ok(Expr::Float(value))
            }
            Token::Str => {
                let value: Rc<str> = Rc::from(self.lexer.lexeme());
                self.eat(Token::Str)?;
                Ok(Expr::Str(value))
            }
            Token::True => {
                self.eat(Token::True)?;
                Ok(Expr::Bool(true))
            }
            Token::False => {
                self.eat(Token::False)?;
                Ok(Expr::Bool(false))
            }
            Token::Null => {
                self.eat(Token::Null)?;
                Ok(Expr::Null)
            }
            Token::SquareLeft => {
                self.eat(Token::SquareLeft)?;
                let mut elements = vec![];
                if self.current != Token::SquareRight {
                    elements.push(self.parse_expression()?);
                    while self.current == Token::Comma {
                        self.eat(Token::Comma)?;
                        elements.push(self.parse_expression()?);
                    }
                }
                self.eat(Token::SquareRight)?;
                Ok(Expr::Array(elements))
            }
            Token::CurlyLeft => {
                self.eat(Token::CurlyLeft)?;
                let mut entries = BTreeMap::new();
                if self.current != Token::CurlyRight {
                    let key = self.parse_identifier()?;
                    self.eat(Token::Colon)?;
                    entries.insert(key, self.parse_expression()?);

                    while self.current == Token::Comma {
                        self.eat(Token::Comma)?;
                        let key = self.parse_identifier()?;
                        self.eat(Token::Colon)?;
                        entries.insert(key, self.parse_expression()?);
                    }
                }
                self.eat(Token::CurlyRight)?;
                Ok(Expr::Object(entries))
            }
            Token::Function => {
                self.eat(Token::Function)?;
                self.eat(Token::RoundLeft)?;
                let mut parameters = SmallVec::new();
                if self.current != Token::RoundRight {
                    parameters.push(self.parse_identifier()?);
                    while self.current == Token::Comma {
                        self.eat(Token::Comma)?;
                        parameters.push(self.parse_identifier()?);
                    }
                }
                self.eat(Token::RoundRight)?;

                let body = self.parse_block()?;
                Ok(Expr::Function(Rc::new(FunctionDef { parameters, body })))
            }
            Token::RoundLeft => {
                self.eat(Token::RoundLeft)?;
                let expression = self.parse_expression()?;
                self.eat(Token::RoundRight)?;
                Ok(expression)
            }
            _ => {
                let variable = self.parse_variable()?;
                if self.current == Token::RoundLeft {
                    let args = self.parse_arguments()?;
                    Ok(Expr::Call {
                        callee: variable,
                        args,
                    })
                } else {
                    Ok(Expr::Variable(variable))
                }
            }
        }
    }

    fn parse_variable(&mut self) -> Result<Variable, ParseError> {
        let identifier = self.parse_identifier()?;
        let mut selectors = vec![];
        while self.current == Token::SquareLeft {
            self.eat(Token::SquareLeft)?;
            selectors.push(self.parse_expression()?);
            self.eat(Token::SquareRight)?;
        }

        Ok(Variable {
            identifier,
            selectors,
        })
    }

    /// Parses a parenthesized, comma-separated argument list.
    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.eat(Token::RoundLeft)?;
        let mut args = vec![];
        if self.current != Token::RoundRight {
            args.push(self.parse_expression()?);
            while self.current == Token::Comma {
                self.eat(Token::Comma)?;
                args.push(self.parse_expression()?);
            }
        }
        self.eat(Token::RoundRight)?;
        Ok(args)
    }

    fn parse_block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        self.eat(Token::CurlyLeft)?;
        let mut statements = vec![];
        while self.current != Token::CurlyRight {
            if self.current == Token::Eof {
                // fail with the expected-brace message instead of looping
                self.eat(Token::CurlyRight)?;
            }
            statements.push(self.parse_statement()?);
        }
        self.eat(Token::CurlyRight)?;
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        match self.current {
            Token::Semicolon => {
                self.eat(Token::Semicolon)?;
                Ok(Stmt::Empty)
            }
            Token::If => self.parse_if(),
            Token::For => self.parse_for(),
            Token::Return => self.parse_return(),
            Token::Var => self.parse_var(),
            Token::While => self.parse_while(),
            _ => {
                let variable = self.parse_variable()?;
                if self.current == Token::Assign {
                    self.parse_assignment(variable)
                } else {
                    self.parse_call(variable)
                }
            }
        }
    }

    fn parse_assignment(&mut self, target: Variable) -> Result<Stmt, ParseError> {
        self.eat(Token::Assign)?;
        let value = self.parse_expression()?;
        self.eat(Token::Semicolon)?;
        Ok(Stmt::Assign { target, value })
    }

    fn parse_call(&mut self, callee: Variable) -> Result<Stmt, ParseError> {
        let args = self.parse_arguments()?;
        self.eat(Token::Semicolon)?;
        Ok(Stmt::Call { callee, args })
    }

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        self.eat(Token::For)?;
        self.eat(Token::RoundLeft)?;
        self.eat(Token::Var)?;
        let first = self.parse_identifier()?;
        let (key, value) = if self.current == Token::Comma {
            self.eat(Token::Comma)?;
            (Some(first), self.parse_identifier()?)
        } else {
            (None, first)
        };

        self.eat(Token::Colon)?;
        let iterable = self.parse_expression()?;
        self.eat(Token::RoundRight)?;
        let body = self.parse_block()?;

        Ok(Stmt::For {
            key,
            value,
            iterable,
            body,
        })
    }

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        self.eat(Token::If)?;
        self.eat(Token::RoundLeft)?;
        let condition = self.parse_expression()?;
        self.eat(Token::RoundRight)?;
        let then_body = self.parse_block()?;

        if self.current != Token::Else {
            return Ok(Stmt::If {
                condition,
                then_body,
                else_body: vec![],
            });
        }

        self.eat(Token::Else)?;
        let else_body = if self.current == Token::If {
            vec![self.parse_if()?]
        } else {
            self.parse_block()?
        };

        Ok(Stmt::If {
            condition,
            then_body,
            else_body,
        })
    }

    fn parse_return(&mut self) -> Result<Stmt, ParseError> {
        self.eat(Token::Return)?;
        let expression = self.parse_expression()?;
        self.eat(Token::Semicolon)?;
        Ok(Stmt::Return(expression))
    }

    fn parse_var(&mut self) -> Result<Stmt, ParseError> {
        self.eat(Token::Var)?;
        let name = self.parse_identifier()?;
        self.eat(Token::Assign)?;
        let init = self.parse_expression()?;
        self.eat(Token::Semicolon)?;
        Ok(Stmt::Var { name, init })
    }

    fn parse_while(&mut self) -> Result<Stmt, ParseError> {
        self.eat(Token::While)?;
        self.eat(Token::RoundLeft)?;
        let condition = self.parse_expression()?;
        self.eat(Token::RoundRight)?;
        let body = self.parse_block()?;
        Ok(Stmt::While { condition, body })
    }
}

#[cfg(test)]
mod tests {
    use super::Parser;
    use crate::ast::{BinaryOp, Expr, Stmt};

    fn parse_all(source: &str) -> Result<Vec<Stmt>, crate::ParseError> {
        let mut parser = Parser::new(source);
        let mut statements = vec![];
        while let Some(statement) = parser.next_statement()? {
            statements.push(statement);
        }
        Ok(statements)
    }

    #[test]
    fn empty_program() {
        assert!(parse_all("").unwrap().is_empty());
        assert_eq!(parse_all(";;;").unwrap().len(), 3);
    }

    #[test]
    fn precedence_of_term_over_operand() {
        // 1 + 2 * 3 groups as 1 + (2 * 3)
        let statements = parse_all("var x = 1 + 2 * 3;").unwrap();
        let Stmt::Var { init, .. } = &statements[0] else {
            panic!("expected var statement");
        };
        let Expr::Binary { op: BinaryOp::Add, rhs, .. } = init else {
            panic!("expected addition at the top");
        };
        assert!(matches!(**rhs, Expr::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn no_chaining_without_parentheses() {
        // the grammar consumes a single operator per level; the dangling
        // `+ c` is reported at the statement boundary
        let err = parse_all("var x = a + b + c;").unwrap_err();
        assert!(err.message().contains("unexpected token \"+\""));

        assert!(parse_all("var x = (a + b) + c;").is_ok());
    }

    #[test]
    fn for_loop_desugaring() {
        let statements = parse_all("for (var v : e) {} for (var k, v : e) {}").unwrap();
        let Stmt::For { key, .. } = &statements[0] else {
            panic!("expected for statement");
        };
        assert!(key.is_none());
        let Stmt::For { key, value, .. } = &statements[1] else {
            panic!("expected for statement");
        };
        assert_eq!(key.as_deref(), Some("k"));
        assert_eq!(&**value, "v");
    }

    #[test]
    fn else_if_chain() {
        let statements = parse_all("if (a) {} else if (b) {} else {}").unwrap();
        let Stmt::If { else_body, .. } = &statements[0] else {
            panic!("expected if statement");
        };
        assert!(matches!(else_body[0], Stmt::If { .. }));
    }

    #[test]
    fn variable_selectors() {
        let statements = parse_all("a[0][\"k\"] = 1;").unwrap();
        let Stmt::Assign { target, .. } = &statements[0] else {
            panic!("expected assignment");
        };
        assert_eq!(target.selectors.len(), 2);
    }

    #[test]
    fn call_expression_and_statement() {
        let statements = parse_all("f(1, 2); var x = g();").unwrap();
        assert!(matches!(&statements[0], Stmt::Call { args, .. } if args.len() == 2));
        let Stmt::Var { init, .. } = &statements[1] else {
            panic!("expected var statement");
        };
        assert!(matches!(init, Expr::Call { .. }));
    }

    #[test]
    fn error_position_and_message() {
        let err = parse_all("var x 1;").unwrap_err();
        assert_eq!(err.row(), 1);
        assert_eq!(
            err.to_string(),
            format!("1:{}: unexpected token \"integer\" instead of \"=\"", err.col())
        );
    }

    #[test]
    fn integer_overflow_is_reported_with_position() {
        let err = parse_all("var x = 99999999999999999999;").unwrap_err();
        assert!(err.to_string().starts_with("1:"));
        assert!(err.message().contains("out of range"));
    }

    #[test]
    fn object_literal_duplicate_key_overwrites() {
        let statements = parse_all("var o = {a: 1, a: 2};").unwrap();
        let Stmt::Var { init: Expr::Object(entries), .. } = &statements[0] else {
            panic!("expected object literal");
        };
        assert_eq!(entries.len(), 1);
    }
}
