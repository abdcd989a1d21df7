use log::debug;
use stdext::function_name;

use crate::compiler::ast::{Ast, NodeId, NodeKind};
use crate::compiler::lexer::tokens::Lex;
use crate::diagnostics::config::{Tracing, TracingConfig};

use super::{ParserResult, TokenStream};

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

/// Recursive-descent parser. Consumes the token stream and grows the arena
/// AST; every node records the line of the token that introduced it. The
/// parser stops at the first syntax error. Continuation after errors is the
/// business of the semantic passes, not the front end.
pub struct Parser {
    pub(super) ast: Ast,
    pub(super) stream: TokenStream,
    pub(super) tracing: TracingConfig,
}

impl Parser {
    pub fn new(stream: TokenStream) -> Parser {
        Parser {
            ast: Ast::new(),
            stream,
            tracing: TracingConfig::Off,
        }
    }

    /// Parse a whole program: a sequence of struct declarations, impl
    /// blocks, and free function definitions in source order.
    pub fn parse(mut self) -> ParserResult<(Ast, NodeId)> {
        let root = self.ast.add(NodeKind::Prog, "", 1);
        while !self.stream.at_end() {
            let child = match self.stream.peek_lex() {
                Some(Lex::Struct) => self.struct_decl()?,
                Some(Lex::Impl) => self.impl_def()?,
                Some(Lex::Func) => self.func_def()?,
                _ => self.stream.unexpected("a struct, impl, or func definition")?,
            };
            self.ast.attach(root, child);
        }
        debug!("parsed {} AST nodes", self.ast.len());
        Ok((self.ast, root))
    }

    pub(super) fn struct_decl(&mut self) -> ParserResult<NodeId> {
        trace!(self);
        let line = self.stream.line();
        self.stream.expect(&Lex::Struct, "\"struct\"")?;
        let (name, name_line) = self.stream.expect_id("a struct name")?;

        let node = self.ast.add(NodeKind::StructDecl, "", line);
        let id = self.ast.add(NodeKind::Id, &name, name_line);
        self.ast.attach(node, id);

        let inherit_list = self.ast.add(NodeKind::InheritList, "", self.stream.line());
        if self.stream.next_if(&Lex::Inherits) {
            loop {
                let (parent, parent_line) = self.stream.expect_id("an inherited struct name")?;
                let parent_id = self.ast.add(NodeKind::Id, &parent, parent_line);
                self.ast.attach(inherit_list, parent_id);
                if !self.stream.next_if(&Lex::Comma) {
                    break;
                }
            }
        }
        self.ast.attach(node, inherit_list);

        self.stream.expect(&Lex::LBrace, "\"{\"")?;
        let members = self.ast.add(NodeKind::MemberList, "", self.stream.line());
        while !self.stream.next_if(&Lex::RBrace) {
            let member = self.member_decl()?;
            self.ast.attach(members, member);
        }
        self.ast.attach(node, members);

        self.stream.expect(&Lex::Semicolon, "\";\" after struct declaration")?;
        Ok(node)
    }

    fn member_decl(&mut self) -> ParserResult<NodeId> {
        trace!(self);
        let line = self.stream.line();
        let visibility = match self.stream.peek_lex() {
            Some(Lex::Public) => {
                self.stream.next();
                "public"
            }
            Some(Lex::Private) => {
                self.stream.next();
                "private"
            }
            _ => self.stream.unexpected("\"public\" or \"private\"")?,
        };

        let member = self.ast.add(NodeKind::Member, "", line);
        let vis = self.ast.add(NodeKind::Visibility, visibility, line);
        self.ast.attach(member, vis);

        let decl = match self.stream.peek_lex() {
            Some(Lex::Func) => self.member_func_decl()?,
            Some(Lex::Let) => self.var_decl()?,
            _ => self.stream.unexpected("a member declaration")?,
        };
        self.ast.attach(member, decl);
        Ok(member)
    }

    fn member_func_decl(&mut self) -> ParserResult<NodeId> {
        trace!(self);
        let line = self.stream.line();
        let (id, params, ret) = self.func_head()?;
        self.stream.expect(&Lex::Semicolon, "\";\" after member function declaration")?;

        let node = self.ast.add(NodeKind::FuncDecl, "", line);
        self.ast.attach(node, id);
        self.ast.attach(node, params);
        self.ast.attach(node, ret);
        Ok(node)
    }

    pub(super) fn func_def(&mut self) -> ParserResult<NodeId> {
        trace!(self);
        let line = self.stream.line();
        let (id, params, ret) = self.func_head()?;
        let body = self.func_body()?;

        let node = self.ast.add(NodeKind::FuncDef, "", line);
        self.ast.attach(node, id);
        self.ast.attach(node, params);
        self.ast.attach(node, ret);
        self.ast.attach(node, body);
        Ok(node)
    }

    /// `func id ( fParams ) : returnType`, shared by declarations and
    /// definitions.
    fn func_head(&mut self) -> ParserResult<(NodeId, NodeId, NodeId)> {
        self.stream.expect(&Lex::Func, "\"func\"")?;
        let (name, name_line) = self.stream.expect_id("a function name")?;
        let id = self.ast.add(NodeKind::Id, &name, name_line);

        self.stream.expect(&Lex::LParen, "\"(\"")?;
        let params = self.ast.add(NodeKind::FParamList, "", self.stream.line());
        if self.stream.peek_lex() != Some(&Lex::RParen) {
            loop {
                let param = self.f_param()?;
                self.ast.attach(params, param);
                if !self.stream.next_if(&Lex::Comma) {
                    break;
                }
            }
        }
        self.stream.expect(&Lex::RParen, "\")\"")?;
        self.stream.expect(&Lex::Colon, "\":\" before the return type")?;

        let ret_line = self.stream.line();
        let ret_word = self.return_type_word()?;
        let ret = self.ast.add(NodeKind::Type, &ret_word, ret_line);
        Ok((id, params, ret))
    }

    fn f_param(&mut self) -> ParserResult<NodeId> {
        trace!(self);
        let line = self.stream.line();
        let (name, name_line) = self.stream.expect_id("a parameter name")?;
        self.stream.expect(&Lex::Colon, "\":\" after the parameter name")?;
        let ty_line = self.stream.line();
        let ty_word = self.type_word()?;

        let node = self.ast.add(NodeKind::FParam, "", line);
        let id = self.ast.add(NodeKind::Id, &name, name_line);
        let ty = self.ast.add(NodeKind::Type, &ty_word, ty_line);
        let sizes = self.array_size_list()?;
        self.ast.attach(node, id);
        self.ast.attach(node, ty);
        self.ast.attach(node, sizes);
        Ok(node)
    }

    pub(super) fn var_decl(&mut self) -> ParserResult<NodeId> {
        trace!(self);
        let line = self.stream.line();
        self.stream.expect(&Lex::Let, "\"let\"")?;
        let (name, name_line) = self.stream.expect_id("a variable name")?;
        self.stream.expect(&Lex::Colon, "\":\" after the variable name")?;
        let ty_line = self.stream.line();
        let ty_word = self.type_word()?;

        let node = self.ast.add(NodeKind::VarDecl, "", line);
        let id = self.ast.add(NodeKind::Id, &name, name_line);
        let ty = self.ast.add(NodeKind::Type, &ty_word, ty_line);
        let sizes = self.array_size_list()?;
        self.ast.attach(node, id);
        self.ast.attach(node, ty);
        self.ast.attach(node, sizes);
        self.stream.expect(&Lex::Semicolon, "\";\" after variable declaration")?;
        Ok(node)
    }

    fn array_size_list(&mut self) -> ParserResult<NodeId> {
        let node = self.ast.add(NodeKind::ArraySizeList, "", self.stream.line());
        while self.stream.next_if(&Lex::LBracket) {
            let (lexeme, line) = self.stream.expect_int_lit("an array dimension")?;
            let lit = self.ast.add(NodeKind::IntLit, &lexeme, line);
            self.ast.attach(node, lit);
            self.stream.expect(&Lex::RBracket, "\"]\"")?;
        }
        Ok(node)
    }

    fn func_body(&mut self) -> ParserResult<NodeId> {
        trace!(self);
        let line = self.stream.line();
        self.stream.expect(&Lex::LBrace, "\"{\"")?;
        let body = self.ast.add(NodeKind::VarDeclOrStatBlock, "", line);
        while !self.stream.next_if(&Lex::RBrace) {
            let item = if self.stream.peek_lex() == Some(&Lex::Let) {
                self.var_decl()?
            } else {
                self.statement()?
            };
            self.ast.attach(body, item);
        }
        Ok(body)
    }

    pub(super) fn impl_def(&mut self) -> ParserResult<NodeId> {
        trace!(self);
        let line = self.stream.line();
        self.stream.expect(&Lex::Impl, "\"impl\"")?;
        let (name, name_line) = self.stream.expect_id("a struct name")?;

        let node = self.ast.add(NodeKind::ImplDef, "", line);
        let id = self.ast.add(NodeKind::Id, &name, name_line);
        self.ast.attach(node, id);

        self.stream.expect(&Lex::LBrace, "\"{\"")?;
        let funcs = self.ast.add(NodeKind::ImplFuncList, "", self.stream.line());
        while !self.stream.next_if(&Lex::RBrace) {
            let func = self.func_def()?;
            self.ast.attach(funcs, func);
        }
        self.ast.attach(node, funcs);
        Ok(node)
    }

    fn type_word(&mut self) -> ParserResult<String> {
        match self.stream.peek_lex() {
            Some(Lex::Integer) => {
                self.stream.next();
                Ok("integer".into())
            }
            Some(Lex::Float) => {
                self.stream.next();
                Ok("float".into())
            }
            Some(Lex::Id(name)) => {
                let name = name.clone();
                self.stream.next();
                Ok(name)
            }
            _ => self.stream.unexpected("a type name"),
        }
    }

    fn return_type_word(&mut self) -> ParserResult<String> {
        if self.stream.next_if(&Lex::Void) {
            Ok("void".into())
        } else {
            self.type_word()
        }
    }
}

impl Tracing for Parser {
    fn set_tracing(&mut self, config: TracingConfig) {
        self.tracing = config;
    }
}
