use stdext::function_name;

use crate::compiler::ast::{NodeId, NodeKind};
use crate::compiler::lexer::tokens::Lex;

use super::{Parser, ParserResult};

macro_rules! trace {
    ($p:expr) => {
        if $p.tracing.matches($p.stream.line() as usize) {
            println!(
                "{} <- L{}:{:?}",
                function_name!(),
                $p.stream.line(),
                $p.stream.peek_lex()
            )
        }
    };
}

impl Parser {
    /// An expression is an arithmetic expression optionally compared against
    /// a second one; the comparison form is the `RelExpr` node.
    pub(super) fn expr(&mut self) -> ParserResult<NodeId> {
        trace!(self);
        let left = self.arith_expr()?;
        if let Some(glyph) = self.rel_op_glyph() {
            let line = self.stream.line();
            self.stream.next();
            let op = self.ast.add(NodeKind::RelOp, glyph, line);
            let right = self.arith_expr()?;
            let node = self.ast.add(NodeKind::RelExpr, "", line);
            self.ast.attach(node, left);
            self.ast.attach(node, op);
            self.ast.attach(node, right);
            return Ok(node);
        }
        Ok(left)
    }

    /// A required comparison, as the conditions of `if` and `while` demand.
    pub(super) fn rel_expr(&mut self) -> ParserResult<NodeId> {
        trace!(self);
        let left = self.arith_expr()?;
        let glyph = match self.rel_op_glyph() {
            Some(glyph) => glyph,
            None => return self.stream.unexpected("a relational operator"),
        };
        let line = self.stream.line();
        self.stream.next();
        let op = self.ast.add(NodeKind::RelOp, glyph, line);
        let right = self.arith_expr()?;

        let node = self.ast.add(NodeKind::RelExpr, "", line);
        self.ast.attach(node, left);
        self.ast.attach(node, op);
        self.ast.attach(node, right);
        Ok(node)
    }

    fn rel_op_glyph(&self) -> Option<&'static str> {
        match self.stream.peek_lex() {
            Some(Lex::Eq) => Some("=="),
            Some(Lex::NEq) => Some("<>"),
            Some(Lex::Lt) => Some("<"),
            Some(Lex::Gt) => Some(">"),
            Some(Lex::LEq) => Some("<="),
            Some(Lex::GEq) => Some(">="),
            _ => None,
        }
    }

    fn arith_expr(&mut self) -> ParserResult<NodeId> {
        trace!(self);
        let mut left = self.term()?;
        loop {
            let glyph = match self.stream.peek_lex() {
                Some(Lex::Plus) => "+",
                Some(Lex::Minus) => "-",
                Some(Lex::Or) => "|",
                _ => break,
            };
            let line = self.stream.line();
            self.stream.next();
            let right = self.term()?;
            let node = self.ast.add(NodeKind::AddOp, glyph, line);
            self.ast.attach(node, left);
            self.ast.attach(node, right);
            left = node;
        }
        Ok(left)
    }

    fn term(&mut self) -> ParserResult<NodeId> {
        trace!(self);
        let mut left = self.factor()?;
        loop {
            let glyph = match self.stream.peek_lex() {
                Some(Lex::Mul) => "*",
                Some(Lex::Div) => "/",
                Some(Lex::And) => "&",
                _ => break,
            };
            let line = self.stream.line();
            self.stream.next();
            let right = self.factor()?;
            let node = self.ast.add(NodeKind::MultOp, glyph, line);
            self.ast.attach(node, left);
            self.ast.attach(node, right);
            left = node;
        }
        Ok(left)
    }

    fn factor(&mut self) -> ParserResult<NodeId> {
        trace!(self);
        let line = self.stream.line();
        match self.stream.peek_lex() {
            Some(Lex::IntLit(lexeme)) => {
                let lexeme = lexeme.clone();
                self.stream.next();
                Ok(self.ast.add(NodeKind::IntLit, &lexeme, line))
            }
            Some(Lex::FloatLit(lexeme)) => {
                let lexeme = lexeme.clone();
                self.stream.next();
                Ok(self.ast.add(NodeKind::FloatLit, &lexeme, line))
            }
            Some(Lex::LParen) => {
                self.stream.next();
                let inner = self.arith_expr()?;
                self.stream.expect(&Lex::RParen, "\")\"")?;
                Ok(inner)
            }
            Some(Lex::Not) => {
                self.stream.next();
                let operand = self.factor()?;
                let node = self.ast.add(NodeKind::Not, "!", line);
                self.ast.attach(node, operand);
                Ok(node)
            }
            Some(Lex::Plus) | Some(Lex::Minus) => {
                let glyph = if self.stream.peek_lex() == Some(&Lex::Plus) {
                    "+"
                } else {
                    "-"
                };
                self.stream.next();
                let operand = self.factor()?;
                let node = self.ast.add(NodeKind::Sign, glyph, line);
                self.ast.attach(node, operand);
                Ok(node)
            }
            Some(Lex::Id(_)) | Some(Lex::SelfWord) => self.idnest(),
            _ => self.stream.unexpected("an expression"),
        }
    }

    /// A possibly dotted chain of variables and calls: `a.b[1].get(x)`.
    /// Dots associate left, so `a.b.c` is `Dot(Dot(a, b), c)`.
    pub(super) fn idnest(&mut self) -> ParserResult<NodeId> {
        trace!(self);
        let mut left = self.primary()?;
        while self.stream.next_if(&Lex::Dot) {
            let line = self.stream.line();
            let right = self.primary()?;
            let node = self.ast.add(NodeKind::Dot, "", line);
            self.ast.attach(node, left);
            self.ast.attach(node, right);
            left = node;
        }
        Ok(left)
    }

    pub(super) fn primary(&mut self) -> ParserResult<NodeId> {
        let line = self.stream.line();
        if self.stream.next_if(&Lex::SelfWord) {
            let node = self.ast.add(NodeKind::Variable, "", line);
            let id = self.ast.add(NodeKind::Id, "self", line);
            let indices = self.ast.add(NodeKind::IndiceList, "", line);
            self.ast.attach(node, id);
            self.ast.attach(node, indices);
            return Ok(node);
        }

        let (name, name_line) = self.stream.expect_id("an identifier")?;
        let id = self.ast.add(NodeKind::Id, &name, name_line);

        if self.stream.next_if(&Lex::LParen) {
            let args = self.ast.add(NodeKind::AParamsList, "", line);
            if self.stream.peek_lex() != Some(&Lex::RParen) {
                loop {
                    let arg = self.expr()?;
                    self.ast.attach(args, arg);
                    if !self.stream.next_if(&Lex::Comma) {
                        break;
                    }
                }
            }
            self.stream.expect(&Lex::RParen, "\")\"")?;
            let node = self.ast.add(NodeKind::FunctionCall, "", line);
            self.ast.attach(node, id);
            self.ast.attach(node, args);
            return Ok(node);
        }

        let node = self.ast.add(NodeKind::Variable, "", line);
        let indices = self.ast.add(NodeKind::IndiceList, "", line);
        while self.stream.next_if(&Lex::LBracket) {
            let index = self.arith_expr()?;
            self.ast.attach(indices, index);
            self.stream.expect(&Lex::RBracket, "\"]\"")?;
        }
        self.ast.attach(node, id);
        self.ast.attach(node, indices);
        Ok(node)
    }
}
