//! KGraph DSL parser - converts query text to an AST
//!
//! Recursive descent with a one-token lookahead. Precedence, loosest to
//! tightest:
//! 1. `;` (disjunction)
//! 2. `,` (conjunction)
//! 3. statement operators (`is`, `=`, comparisons, `in`, `subset`)
//! 4. `+` / `-`
//! 5. `*` / `/`
//! 6. `not(...)`, grouping, bracketed collections, aggregations
//!
//! A query is a single expression terminated by `.`.

use crate::ast::{AggregateOp, ArithOp, AstNode, CompareOp};
use crate::error::{Error, Result};
use crate::lexer::Lexer;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Parser for KGraph queries
pub struct Parser {
    lexer: Lexer,
    current: Token,
    peek: Token,
    recursion_depth: usize,
}

const MAX_RECURSION_DEPTH: usize = 200;

/// Parse a complete query (expression plus `.` terminator).
pub fn parse_query(input: &str) -> Result<AstNode> {
    Parser::new(input).parse()
}

impl Parser {
    /// Create a new parser for the given input
    pub fn new(input: &str) -> Self {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token();
        let peek = lexer.next_token();
        Self {
            lexer,
            current,
            peek,
            recursion_depth: 0,
        }
    }

    /// Consume the current token and advance, returning the consumed token.
    fn bump(&mut self) -> Token {
        let next = self.lexer.next_token();
        let peeked = std::mem::replace(&mut self.peek, next);
        std::mem::replace(&mut self.current, peeked)
    }

    fn current_is(&self, token_type: TokenType) -> bool {
        self.current.token_type == token_type
    }

    /// Expect a specific token type and advance
    fn expect(&mut self, token_type: TokenType) -> Result<Token> {
        if self.current.token_type == token_type {
            Ok(self.bump())
        } else {
            Err(self.unexpected(&format!("{:?}", token_type)))
        }
    }

    /// Error for the current token, folding in lexer errors.
    fn unexpected(&self, expected: &str) -> Error {
        if self.current.token_type == TokenType::Error {
            return Error::Parse(format!(
                "{} at line {}, column {}",
                self.current.value, self.current.line, self.current.column
            ));
        }
        if self.current.token_type == TokenType::Eof {
            return Error::Parse(format!("expected {}, but reached end of input", expected));
        }
        Error::Parse(format!(
            "expected {}, got {:?} ('{}') at line {}, column {}",
            expected, self.current.token_type, self.current.value, self.current.line,
            self.current.column
        ))
    }

    fn check_recursion_depth(&mut self) -> Result<()> {
        self.recursion_depth += 1;
        if self.recursion_depth > MAX_RECURSION_DEPTH {
            return Err(Error::Parse(format!(
                "expression too deeply nested (max depth: {})",
                MAX_RECURSION_DEPTH
            )));
        }
        Ok(())
    }

    /// Parse the entire query: expression "." EOF
    pub fn parse(&mut self) -> Result<AstNode> {
        let expr = self.parse_expression()?;
        self.expect(TokenType::Dot)
            .map_err(|_| self.unexpected("'.' terminator"))?;
        if !self.current_is(TokenType::Eof) {
            return Err(self.unexpected("end of input"));
        }
        Ok(expr)
    }

    /// expression := and_expr (";" and_expr)*
    fn parse_expression(&mut self) -> Result<AstNode> {
        self.check_recursion_depth()?;
        let mut branches = vec![self.parse_and_expression()?];
        while self.current_is(TokenType::Semicolon) {
            self.bump();
            branches.push(self.parse_and_expression()?);
        }
        self.recursion_depth -= 1;
        if branches.len() == 1 {
            Ok(branches.pop().expect("non-empty"))
        } else {
            Ok(AstNode::Or(branches))
        }
    }

    /// and_expr := statement ("," statement)*
    fn parse_and_expression(&mut self) -> Result<AstNode> {
        let mut terms = vec![self.parse_statement()?];
        while self.current_is(TokenType::Comma) {
            self.bump();
            terms.push(self.parse_statement()?);
        }
        if terms.len() == 1 {
            Ok(terms.pop().expect("non-empty"))
        } else {
            Ok(AstNode::And(terms))
        }
    }

    /// statement := math_assign | "not" "(" expr ")" | "(" expr ")"
    ///            | value [op value]
    fn parse_statement(&mut self) -> Result<AstNode> {
        match self.current.token_type {
            TokenType::Error => Err(self.unexpected("statement")),
            TokenType::Not => {
                self.bump();
                self.expect(TokenType::OpenParen)?;
                let inner = self.parse_expression()?;
                self.expect(TokenType::CloseParen)?;
                Ok(AstNode::Not(Box::new(inner)))
            }
            TokenType::OpenParen => {
                self.bump();
                let inner = self.parse_expression()?;
                self.expect(TokenType::CloseParen)?;
                Ok(AstNode::Group(Box::new(inner)))
            }
            TokenType::Var if self.peek.token_type == TokenType::Is => {
                let var = self.bump().value;
                self.bump(); // Skip 'is'
                let expr = self.parse_arith_expression()?;
                Ok(AstNode::MathAssign {
                    var,
                    expr: Box::new(expr),
                })
            }
            _ => {
                let operand = self.parse_value()?;
                match self.current.token_type {
                    TokenType::Equal => {
                        self.bump();
                        let rhs = self.parse_value()?;
                        if operand.is_var() {
                            Ok(AstNode::Unify {
                                lhs: Box::new(operand),
                                rhs: Box::new(rhs),
                            })
                        } else {
                            Ok(AstNode::Equal {
                                lhs: Box::new(operand),
                                rhs: Box::new(rhs),
                            })
                        }
                    }
                    TokenType::EqualEqual
                    | TokenType::NotEqual
                    | TokenType::LessThan
                    | TokenType::LessThanOrEqual
                    | TokenType::GreaterThan
                    | TokenType::GreaterThanOrEqual => {
                        let op = self.compare_op();
                        self.bump();
                        let rhs = self.parse_value()?;
                        validate_compare_rhs(op, &rhs)?;
                        Ok(AstNode::Compare {
                            lhs: Box::new(operand),
                            op,
                            rhs: Box::new(rhs),
                        })
                    }
                    TokenType::In => {
                        self.bump();
                        let rhs = self.parse_value()?;
                        Ok(AstNode::In {
                            lhs: Box::new(operand),
                            rhs: Box::new(rhs),
                        })
                    }
                    TokenType::Subset => {
                        self.bump();
                        let rhs = self.parse_value()?;
                        Ok(AstNode::Subset {
                            lhs: Box::new(operand),
                            rhs: Box::new(rhs),
                        })
                    }
                    _ => {
                        if standalone_term_allowed(&operand) {
                            Ok(operand)
                        } else {
                            Err(self.unexpected("an operator after value"))
                        }
                    }
                }
            }
        }
    }

    fn compare_op(&self) -> CompareOp {
        match self.current.token_type {
            TokenType::EqualEqual => CompareOp::Equal,
            TokenType::NotEqual => CompareOp::NotEqual,
            TokenType::LessThan => CompareOp::LessThan,
            TokenType::LessThanOrEqual => CompareOp::LessThanOrEqual,
            TokenType::GreaterThan => CompareOp::GreaterThan,
            TokenType::GreaterThanOrEqual => CompareOp::GreaterThanOrEqual,
            _ => unreachable!("caller checked for a comparison operator"),
        }
    }

    /// value := arith_expr | STRING | boolean | typed scalar | bracketed
    ///        | predicate_call | atom | aggregation
    fn parse_value(&mut self) -> Result<AstNode> {
        self.check_recursion_depth()?;
        let value = self.parse_value_inner();
        self.recursion_depth -= 1;
        value
    }

    fn parse_value_inner(&mut self) -> Result<AstNode> {
        match self.current.token_type {
            TokenType::Error => Err(self.unexpected("value")),
            TokenType::NumberLiteral
            | TokenType::Var
            | TokenType::OpenParen
            | TokenType::Minus => self.parse_arith_expression(),
            TokenType::StringLiteral => Ok(AstNode::Literal(Value::Str(self.bump().value))),
            TokenType::True => {
                self.bump();
                Ok(AstNode::Literal(Value::Bool(true)))
            }
            TokenType::False => {
                self.bump();
                Ok(AstNode::Literal(Value::Bool(false)))
            }
            TokenType::DateLiteral => Ok(AstNode::Literal(Value::Date(self.bump().value))),
            TokenType::DateTimeLiteral => Ok(AstNode::Literal(Value::DateTime(self.bump().value))),
            TokenType::TimeLiteral => Ok(AstNode::Literal(Value::Time(self.bump().value))),
            TokenType::DurationLiteral => Ok(AstNode::Literal(Value::Duration(self.bump().value))),
            TokenType::UriLiteral => Ok(AstNode::Literal(Value::Uri(self.bump().value))),
            TokenType::CurrencyLiteral => {
                let token = self.bump();
                let code = token.param.unwrap_or_default();
                Ok(AstNode::Literal(Value::Currency {
                    amount: token.value,
                    code,
                }))
            }
            TokenType::UnitLiteral => {
                let token = self.bump();
                let unit = token.param.unwrap_or_default();
                Ok(AstNode::Literal(Value::Unit {
                    amount: token.value,
                    unit,
                }))
            }
            TokenType::GeoLocationLiteral => {
                let token = self.bump();
                let geo = parse_geolocation(&token.value)?;
                Ok(AstNode::Literal(geo))
            }
            TokenType::OpenBracket => self.parse_bracketed_collection(),
            TokenType::Name => {
                if self.peek.token_type == TokenType::OpenParen {
                    self.parse_predicate_call()
                } else {
                    Ok(AstNode::Literal(Value::Atom(self.bump().value)))
                }
            }
            TokenType::Collection
            | TokenType::Set
            | TokenType::Count
            | TokenType::Sum
            | TokenType::Average
            | TokenType::Min
            | TokenType::Max => self.parse_aggregation(),
            _ => Err(self.unexpected("a value")),
        }
    }

    /// predicate_call := NAME "(" [value ("," value)*] ")"
    ///
    /// Nested predicate calls and aggregations are rejected as arguments.
    fn parse_predicate_call(&mut self) -> Result<AstNode> {
        let name = self.bump().value;
        self.expect(TokenType::OpenParen)?;

        let mut args = Vec::new();
        if !self.current_is(TokenType::CloseParen) {
            loop {
                let arg = self.parse_value()?;
                match &arg {
                    AstNode::Predicate { .. } => {
                        return Err(Error::Parse(format!(
                            "nested predicate calls are disallowed: found nested call in {}()",
                            name
                        )));
                    }
                    AstNode::Aggregate { .. } => {
                        return Err(Error::Parse(format!(
                            "aggregations are not allowed as predicate arguments in {}()",
                            name
                        )));
                    }
                    _ => {}
                }
                args.push(arg);
                if self.current_is(TokenType::Comma) {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        self.expect(TokenType::CloseParen)?;

        Ok(AstNode::Predicate { name, args })
    }

    /// aggregation := AGGOP "{" VAR "|" expression ("," expression)* "}"
    fn parse_aggregation(&mut self) -> Result<AstNode> {
        let op = match self.current.token_type {
            TokenType::Collection => AggregateOp::Collection,
            TokenType::Set => AggregateOp::Set,
            TokenType::Count => AggregateOp::Count,
            TokenType::Sum => AggregateOp::Sum,
            TokenType::Average => AggregateOp::Average,
            TokenType::Min => AggregateOp::Min,
            TokenType::Max => AggregateOp::Max,
            _ => unreachable!("caller checked for an aggregation operator"),
        };
        self.bump();

        self.expect(TokenType::OpenBrace)?;
        let var = self.expect(TokenType::Var)?.value;
        self.expect(TokenType::Pipe)?;

        let mut body = vec![self.parse_expression()?];
        while self.current_is(TokenType::Comma) {
            self.bump();
            body.push(self.parse_expression()?);
        }
        self.expect(TokenType::CloseBrace)?;

        Ok(AstNode::Aggregate { op, var, body })
    }

    /// bracketed := "[" "]" | "[" map_item ("," map_item)* "]"
    ///            | "[" value ("," value)* "]"
    ///
    /// The first item decides the shape: a `key = value` pair makes the
    /// whole bracket a map, anything else a list.
    fn parse_bracketed_collection(&mut self) -> Result<AstNode> {
        self.expect(TokenType::OpenBracket)?;

        if self.current_is(TokenType::CloseBracket) {
            self.bump();
            return Ok(AstNode::List(Vec::new()));
        }

        let first = self.parse_value()?;

        if self.current_is(TokenType::Equal) {
            // Map: first item was the first key
            validate_map_key(&first)?;
            self.bump();
            let first_value = self.parse_value()?;
            let mut pairs = vec![(first, first_value)];

            while self.current_is(TokenType::Comma) {
                self.bump();
                let key = self.parse_value()?;
                validate_map_key(&key)?;
                self.expect(TokenType::Equal)?;
                let value = self.parse_value()?;
                pairs.push((key, value));
            }
            self.expect(TokenType::CloseBracket)?;
            Ok(AstNode::Map(pairs))
        } else {
            let mut items = vec![first];
            while self.current_is(TokenType::Comma) {
                self.bump();
                items.push(self.parse_value()?);
            }
            self.expect(TokenType::CloseBracket)?;
            Ok(AstNode::List(items))
        }
    }

    /// arith_expr := arith_term (("+" | "-") arith_term)*
    fn parse_arith_expression(&mut self) -> Result<AstNode> {
        let mut left = self.parse_arith_term()?;
        loop {
            let op = match self.current.token_type {
                TokenType::Plus => ArithOp::Add,
                TokenType::Minus => ArithOp::Sub,
                _ => break,
            };
            self.bump();
            let right = self.parse_arith_term()?;
            left = AstNode::Arith {
                op,
                lhs: Box::new(left),
                rhs: Box::new(right),
            };
        }
        Ok(left)
    }

    /// arith_term := arith_factor (("*" | "/") arith_factor)*
    fn parse_arith_term(&mut self) -> Result<AstNode> {
        let mut left = self.parse_arith_factor()?;
        loop {
            let op = match self.current.token_type {
                TokenType::Multiply => ArithOp::Mul,
                TokenType::Divide => ArithOp::Div,
                _ => break,
            };
            self.bump();
            let right = self.parse_arith_factor()?;
            left = AstNode::Arith {
                op,
                lhs: Box::new(left),
                rhs: Box::new(right),
            };
        }
        Ok(left)
    }

    /// arith_factor := NUMBER | "-" NUMBER | VAR | "(" arith_expr ")"
    fn parse_arith_factor(&mut self) -> Result<AstNode> {
        match self.current.token_type {
            TokenType::NumberLiteral => {
                let token = self.bump();
                Ok(AstNode::Literal(parse_number(&token.value)?))
            }
            TokenType::Minus => {
                self.bump();
                let token = self.expect(TokenType::NumberLiteral)?;
                let negated = match parse_number(&token.value)? {
                    Value::Int(i) => Value::Int(-i),
                    Value::Float(f) => Value::Float(-f),
                    other => other,
                };
                Ok(AstNode::Literal(negated))
            }
            TokenType::Var => Ok(AstNode::Var(self.bump().value)),
            TokenType::OpenParen => {
                self.bump();
                let inner = self.parse_arith_expression()?;
                self.expect(TokenType::CloseParen)?;
                // Grouping is re-derived from precedence when unparsing
                Ok(inner)
            }
            _ => Err(self.unexpected("a number, variable, or parenthesised expression")),
        }
    }
}

fn parse_number(text: &str) -> Result<Value> {
    if text.contains('.') {
        text.parse::<f64>()
            .map(Value::Float)
            .map_err(|_| Error::Parse(format!("invalid number literal: {}", text)))
    } else {
        match text.parse::<i64>() {
            Ok(i) => Ok(Value::Int(i)),
            // Out-of-range integers degrade to floats
            Err(_) => text
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| Error::Parse(format!("invalid number literal: {}", text))),
        }
    }
}

fn parse_geolocation(text: &str) -> Result<Value> {
    let parts: Vec<&str> = text.split(',').collect();
    if parts.len() != 2 {
        return Err(Error::Parse(
            "GeoLocation must contain exactly two comma-separated values (latitude and longitude)"
                .into(),
        ));
    }
    let lat: f64 = parts[0].trim().parse().map_err(|_| {
        Error::Parse(format!("invalid GeoLocation latitude: '{}'", parts[0].trim()))
    })?;
    let lon: f64 = parts[1].trim().parse().map_err(|_| {
        Error::Parse(format!("invalid GeoLocation longitude: '{}'", parts[1].trim()))
    })?;
    Ok(Value::Geo { lat, lon })
}

/// A boolean, list, or map literal may only appear on the right of `!=`.
fn validate_compare_rhs(op: CompareOp, rhs: &AstNode) -> Result<()> {
    if op == CompareOp::NotEqual {
        return Ok(());
    }
    let offending = match rhs {
        AstNode::Literal(Value::Bool(_)) => Some("boolean"),
        AstNode::List(_) => Some("list"),
        AstNode::Map(_) => Some("map"),
        _ => None,
    };
    match offending {
        Some(kind) => Err(Error::Parse(format!(
            "invalid comparison: cannot compare {} values with '{}'",
            kind,
            op.as_str()
        ))),
        None => Ok(()),
    }
}

fn validate_map_key(key: &AstNode) -> Result<()> {
    match key {
        AstNode::Var(_)
        | AstNode::Literal(Value::Str(_))
        | AstNode::Literal(Value::Uri(_)) => Ok(()),
        other => Err(Error::Parse(format!(
            "invalid map key: expected string, URI, or variable, got {:?}",
            other
        ))),
    }
}

/// Statements without an operator are only valid for the term forms the
/// grammar allows standalone.
fn standalone_term_allowed(node: &AstNode) -> bool {
    matches!(
        node,
        AstNode::Predicate { .. }
            | AstNode::Aggregate { .. }
            | AstNode::Literal(Value::Str(_))
            | AstNode::Literal(Value::Atom(_))
            | AstNode::Literal(Value::Date(_))
            | AstNode::Literal(Value::DateTime(_))
            | AstNode::Literal(Value::Time(_))
            | AstNode::Literal(Value::Duration(_))
            | AstNode::Literal(Value::Uri(_))
            | AstNode::Literal(Value::Currency { .. })
            | AstNode::Literal(Value::Unit { .. })
            | AstNode::Literal(Value::Geo { .. })
    )
}
