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
    pub(super) fn statement(&mut self) -> ParserResult<NodeId> {
        trace!(self);
        match self.stream.peek_lex() {
            Some(Lex::If) => self.if_stat(),
            Some(Lex::While) => self.while_stat(),
            Some(Lex::Read) => self.read_stat(),
            Some(Lex::Write) => self.write_stat(),
            Some(Lex::Return) => self.return_stat(),
            Some(Lex::Id(_)) | Some(Lex::SelfWord) => self.assign_or_call_stat(),
            _ => self.stream.unexpected("a statement"),
        }
    }

    fn if_stat(&mut self) -> ParserResult<NodeId> {
        let line = self.stream.line();
        self.stream.expect(&Lex::If, "\"if\"")?;
        self.stream.expect(&Lex::LParen, "\"(\"")?;
        let cond = self.rel_expr()?;
        self.stream.expect(&Lex::RParen, "\")\"")?;
        self.stream.expect(&Lex::Then, "\"then\"")?;
        let then_block = self.stat_block()?;
        self.stream.expect(&Lex::Else, "\"else\"")?;
        let else_block = self.stat_block()?;
        self.stream.expect(&Lex::Semicolon, "\";\" after if statement")?;

        let node = self.ast.add(NodeKind::IfStat, "", line);
        self.ast.attach(node, cond);
        self.ast.attach(node, then_block);
        self.ast.attach(node, else_block);
        Ok(node)
    }

    fn while_stat(&mut self) -> ParserResult<NodeId> {
        let line = self.stream.line();
        self.stream.expect(&Lex::While, "\"while\"")?;
        self.stream.expect(&Lex::LParen, "\"(\"")?;
        let cond = self.rel_expr()?;
        self.stream.expect(&Lex::RParen, "\")\"")?;
        let body = self.stat_block()?;
        self.stream.expect(&Lex::Semicolon, "\";\" after while statement")?;

        let node = self.ast.add(NodeKind::WhileStat, "", line);
        self.ast.attach(node, cond);
        self.ast.attach(node, body);
        Ok(node)
    }

    fn read_stat(&mut self) -> ParserResult<NodeId> {
        let line = self.stream.line();
        self.stream.expect(&Lex::Read, "\"read\"")?;
        self.stream.expect(&Lex::LParen, "\"(\"")?;
        // a read target is a plain variable, never a member access or call
        let target = self.primary()?;
        if self.ast.kind(target) != NodeKind::Variable {
            return self.stream.unexpected("a variable as the read target");
        }
        self.stream.expect(&Lex::RParen, "\")\"")?;
        self.stream.expect(&Lex::Semicolon, "\";\" after read statement")?;

        let node = self.ast.add(NodeKind::ReadStat, "", line);
        self.ast.attach(node, target);
        Ok(node)
    }

    fn write_stat(&mut self) -> ParserResult<NodeId> {
        let line = self.stream.line();
        self.stream.expect(&Lex::Write, "\"write\"")?;
        self.stream.expect(&Lex::LParen, "\"(\"")?;
        let value = self.expr()?;
        self.stream.expect(&Lex::RParen, "\")\"")?;
        self.stream.expect(&Lex::Semicolon, "\";\" after write statement")?;

        let node = self.ast.add(NodeKind::WriteStat, "", line);
        self.ast.attach(node, value);
        Ok(node)
    }

    fn return_stat(&mut self) -> ParserResult<NodeId> {
        let line = self.stream.line();
        self.stream.expect(&Lex::Return, "\"return\"")?;
        self.stream.expect(&Lex::LParen, "\"(\"")?;
        let value = self.expr()?;
        self.stream.expect(&Lex::RParen, "\")\"")?;
        self.stream.expect(&Lex::Semicolon, "\";\" after return statement")?;

        let node = self.ast.add(NodeKind::ReturnStat, "", line);
        self.ast.attach(node, value);
        Ok(node)
    }

    /// A statement that begins with an identifier is an assignment or a bare
    /// call; which one is only known after the target has been parsed.
    fn assign_or_call_stat(&mut self) -> ParserResult<NodeId> {
        trace!(self);
        let line = self.stream.line();
        let target = self.idnest()?;

        if self.stream.next_if(&Lex::Assign) {
            let value = self.expr()?;
            self.stream.expect(&Lex::Semicolon, "\";\" after assignment")?;
            let node = self.ast.add(NodeKind::AssignStat, "", line);
            self.ast.attach(node, target);
            self.ast.attach(node, value);
            return Ok(node);
        }

        let callable = match self.ast.kind(target) {
            NodeKind::FunctionCall => true,
            NodeKind::Dot => {
                let children = self.ast.children(target);
                self.ast.kind(children[1]) == NodeKind::FunctionCall
            }
            _ => false,
        };
        if !callable {
            return self.stream.unexpected("\"=\" or a call argument list");
        }
        self.stream.expect(&Lex::Semicolon, "\";\" after call statement")?;
        Ok(target)
    }

    /// `{ statements }`, a single statement, or nothing at all.
    fn stat_block(&mut self) -> ParserResult<NodeId> {
        trace!(self);
        let line = self.stream.line();
        let block = self.ast.add(NodeKind::StatBlock, "", line);
        if self.stream.next_if(&Lex::LBrace) {
            while !self.stream.next_if(&Lex::RBrace) {
                let stmt = self.statement()?;
                self.ast.attach(block, stmt);
            }
        } else if !matches!(self.stream.peek_lex(), Some(Lex::Semicolon) | Some(Lex::Else)) {
            let stmt = self.statement()?;
            self.ast.attach(block, stmt);
        }
        Ok(block)
    }
}
