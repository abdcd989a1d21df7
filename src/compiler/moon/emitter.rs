use log::debug;

use crate::compiler::ast::{Ast, NodeId, NodeKind};
use crate::compiler::memory::layout::sizeof_resolved;
use crate::compiler::moon::registers::{Reg, RegisterPool, FRAME, LINK, RETVAL, STACK, ZERO};
use crate::compiler::semantics::symbol_table::{EntryId, EntryKind, ScopeId, ScopeKind, ScopeTree};
use crate::compiler::semantics::types::SemType;

/// Where a value lives in the current frame: a displacement below the frame
/// pointer, plus an optional register holding a run-time byte offset for
/// indexed accesses. The register, when present, is owned by the location
/// and released by the load or store that consumes it.
struct Location {
    disp: i32,
    index: Option<Reg>,
}

struct FnCtx {
    /// Frame size as a negative stack adjustment.
    frame: i32,
    /// Offset of the return-value slot, for non-main functions.
    ret_offset: i32,
    end_label: String,
    is_main: bool,
}

/// Walks the annotated AST and emits Moon assembly: an instruction section
/// followed by a data section. Every expression result funnels through the
/// temporary the layout pass reserved for it; scratch registers come from
/// the fixed pool and are released in LIFO order.
pub struct MoonEmitter<'a> {
    ast: &'a Ast,
    tree: &'a ScopeTree,
    global: ScopeId,
    pool: RegisterPool,
    exec: String,
    labels: usize,
}

pub fn emit_program(ast: &Ast, root: NodeId, tree: &ScopeTree, global: ScopeId) -> String {
    debug!("emitting moon assembly");
    let mut emitter = MoonEmitter {
        ast,
        tree,
        global,
        pool: RegisterPool::new(),
        exec: String::new(),
        labels: 0,
    };
    emitter.program(root);
    emitter.finish()
}

impl<'a> MoonEmitter<'a> {
    fn program(&mut self, root: NodeId) {
        let has_main = self
            .tree
            .lookup_all(self.global, "main", EntryKind::Func)
            .into_iter()
            .any(|f| self.tree.entry(f).link.is_some());
        if !has_main {
            self.comment("no main function, nothing to run");
            return;
        }

        for child in self.ast.children(root) {
            match self.ast.kind(child) {
                NodeKind::FuncDef => self.function(child),
                NodeKind::ImplDef => {
                    for method in self.ast.children(self.ast.child(child, 1)) {
                        self.function(method);
                    }
                }
                _ => {}
            }
        }
    }

    fn finish(&mut self) -> String {
        let mut out = String::new();
        out.push_str(&self.exec);
        out.push_str("% data section\n");
        out.push_str(&format!("{:<10}{}\n", "buf", "res 20"));
        out.push_str(&format!("{:<10}{}\n", "cr", "db 13,10,0"));
        out
    }

    // ------------------------------------------------------------------
    // text helpers

    fn emit(&mut self, instr: String) {
        self.exec.push_str(&format!("{:<10}{}\n", "", instr));
    }

    fn emit_labeled(&mut self, label: &str, instr: &str) {
        self.exec.push_str(&format!("{:<10}{}\n", label, instr));
    }

    fn comment(&mut self, text: &str) {
        self.exec.push_str(&format!("% {}\n", text));
    }

    fn new_label(&mut self) -> String {
        let label = format!("tag{}", self.labels);
        self.labels += 1;
        label
    }

    // ------------------------------------------------------------------
    // functions

    fn function(&mut self, node: NodeId) {
        let entry = match self.ast.node(node).entry {
            Some(e) => e,
            None => return,
        };
        let scope = match self.tree.entry(entry).link {
            Some(s) => s,
            None => return,
        };
        let holder = self.tree.containing_scope(entry).unwrap_or(self.global);
        let is_main = self.tree.scope(holder).kind == ScopeKind::Global
            && self.tree.entry(entry).name.eq_ignore_ascii_case("main");
        let label = self.function_label(entry);
        let end_label = self.new_label();

        let ret_size = sizeof_resolved(&self.tree.entry(entry).ty, self.tree, self.global);
        let ctx = FnCtx {
            frame: if is_main {
                -self.tree.scope(scope).size
            } else {
                self.tree.scope(scope).size
            },
            ret_offset: -ret_size,
            end_label: end_label.clone(),
            is_main,
        };

        let body = self.ast.child(node, 3);
        if is_main {
            self.comment("begin function main");
            self.emit("align".into());
            self.emit_labeled(&label, "entry");
            self.emit(format!("addi {},{},topaddr", STACK, ZERO));
            self.emit(format!("addi {},{},topaddr", FRAME, ZERO));
            self.statements(body, &ctx);
            self.emit_labeled(&end_label, "hlt");
        } else {
            let retaddr = -(ret_size + 4);
            let savedfp = -(ret_size + 8);
            self.comment(&format!("begin function {}", label));
            self.emit_labeled(&label, &format!("sw {}({}),{}", retaddr, STACK, LINK));
            self.emit(format!("sw {}({}),{}", savedfp, STACK, FRAME));
            self.emit(format!("addi {},{},0", FRAME, STACK));
            self.statements(body, &ctx);
            self.emit_labeled(&end_label, "nop");
            self.emit(format!("addi {},{},0", STACK, FRAME));
            self.emit(format!("lw {},{}({})", FRAME, savedfp, STACK));
            self.emit(format!("lw {},{}({})", LINK, retaddr, STACK));
            self.emit(format!("jr {}", LINK));
        }
    }

    /// Free functions keep their source name; methods are prefixed with
    /// their struct; overloads past the first get their ordinal. A method's
    /// declaration entry and definition entry both carry the struct's name
    /// as their holder's name, so call sites (which resolve declarations)
    /// and bodies (emitted from definitions) agree on the label.
    fn function_label(&self, entry: EntryId) -> String {
        let name = self.tree.entry(entry).name.clone();
        let holder = match self.tree.containing_scope(entry) {
            Some(s) => s,
            None => return name,
        };
        let mut label = match self.tree.scope(holder).kind {
            ScopeKind::Impl | ScopeKind::Struct => {
                format!("{}_{}", self.tree.scope(holder).name, name)
            }
            _ => name.clone(),
        };
        let overloads = self.tree.lookup_all(holder, &name, EntryKind::Func);
        if let Some(ordinal) = overloads.iter().position(|f| *f == entry) {
            if ordinal > 0 {
                label.push_str(&format!("_{}", ordinal));
            }
        }
        label
    }

    // ------------------------------------------------------------------
    // statements

    fn statements(&mut self, node: NodeId, ctx: &FnCtx) {
        for child in self.ast.children(node) {
            match self.ast.kind(child) {
                NodeKind::VarDecl => {}
                NodeKind::StatBlock => self.statements(child, ctx),
                NodeKind::AssignStat => self.assign(child, ctx),
                NodeKind::IfStat => self.if_stat(child, ctx),
                NodeKind::WhileStat => self.while_stat(child, ctx),
                NodeKind::WriteStat => self.write_stat(child, ctx),
                NodeKind::ReadStat => self.comment("read statement not emitted"),
                NodeKind::ReturnStat => self.return_stat(child, ctx),
                NodeKind::FunctionCall | NodeKind::Dot => {
                    self.gen_expr(child, ctx);
                }
                _ => {}
            }
        }
    }

    fn assign(&mut self, node: NodeId, ctx: &FnCtx) {
        let lhs = self.ast.child(node, 0);
        let rhs = self.ast.child(node, 1);
        self.gen_expr(lhs, ctx);
        self.gen_expr(rhs, ctx);

        let size = sizeof_resolved(&self.ast.sem_type(lhs), self.tree, self.global);
        if size <= 4 {
            let value = self.load_value(rhs, ctx);
            self.store_value(lhs, value, ctx);
            self.pool.release(value);
        } else {
            self.block_copy(lhs, rhs, size, ctx);
        }
    }

    /// Word-by-word copy for struct, array, and float assignment targets.
    fn block_copy(&mut self, lhs: NodeId, rhs: NodeId, size: i32, ctx: &FnCtx) {
        self.comment("block copy");
        let (ldisp, lbase) = self.materialize_base(lhs, ctx);
        let (rdisp, rbase) = self.materialize_base(rhs, ctx);
        let word = self.pool.acquire();
        let mut at = 0;
        while at < size {
            self.emit(format!("lw {},{}({})", word, rdisp + at, rbase));
            self.emit(format!("sw {}({}),{}", ldisp + at, lbase, word));
            at += 4;
        }
        self.pool.release(word);
        if rbase != FRAME {
            self.pool.release(rbase);
        }
        if lbase != FRAME {
            self.pool.release(lbase);
        }
    }

    /// A location collapsed to `(displacement, base register)`. The base is
    /// the frame pointer unless the access is indexed, in which case the
    /// caller releases the returned register.
    fn materialize_base(&mut self, node: NodeId, ctx: &FnCtx) -> (i32, Reg) {
        let loc = self.location(node, ctx);
        match loc.index {
            None => (loc.disp, FRAME),
            Some(reg) => {
                self.emit(format!("add {},{},{}", reg, FRAME, reg));
                (loc.disp, reg)
            }
        }
    }

    fn if_stat(&mut self, node: NodeId, ctx: &FnCtx) {
        let cond = self.ast.child(node, 0);
        self.gen_expr(cond, ctx);
        let else_label = self.new_label();
        let end_label = self.new_label();

        let value = self.load_value(cond, ctx);
        self.emit(format!("bz {},{}", value, else_label));
        self.pool.release(value);

        self.statements(self.ast.child(node, 1), ctx);
        self.emit(format!("j {}", end_label));
        self.emit_labeled(&else_label, "nop");
        self.statements(self.ast.child(node, 2), ctx);
        self.emit_labeled(&end_label, "nop");
    }

    fn while_stat(&mut self, node: NodeId, ctx: &FnCtx) {
        let top_label = self.new_label();
        let end_label = self.new_label();
        self.emit_labeled(&top_label, "nop");

        let cond = self.ast.child(node, 0);
        self.gen_expr(cond, ctx);
        let value = self.load_value(cond, ctx);
        self.emit(format!("bz {},{}", value, end_label));
        self.pool.release(value);

        self.statements(self.ast.child(node, 1), ctx);
        self.emit(format!("j {}", top_label));
        self.emit_labeled(&end_label, "nop");
    }

    /// Convert the value to a decimal string in `buf` and print it, then
    /// print CR/LF. The conversion arguments travel on the stack just past
    /// the current frame.
    fn write_stat(&mut self, node: NodeId, ctx: &FnCtx) {
        let value_node = self.ast.child(node, 0);
        self.gen_expr(value_node, ctx);
        let value = self.load_value(value_node, ctx);

        self.comment("put value on stack for intstr");
        self.emit(format!("addi {},{},{}", STACK, STACK, ctx.frame));
        self.emit(format!("sw -8({}),{}", STACK, value));
        self.emit(format!("addi {},{},buf", value, ZERO));
        self.emit(format!("sw -12({}),{}", STACK, value));
        self.emit(format!("jl {},intstr", LINK));
        self.emit(format!("sw -8({}),{}", STACK, RETVAL));
        self.emit(format!("jl {},putstr", LINK));
        self.emit(format!("subi {},{},{}", STACK, STACK, ctx.frame));
        self.comment("print a newline");
        self.emit(format!("addi {},{},13", value, ZERO));
        self.emit(format!("putc {}", value));
        self.emit(format!("addi {},{},10", value, ZERO));
        self.emit(format!("putc {}", value));
        self.pool.release(value);
    }

    fn return_stat(&mut self, node: NodeId, ctx: &FnCtx) {
        let value_node = self.ast.child(node, 0);
        self.gen_expr(value_node, ctx);
        if !ctx.is_main {
            let value = self.load_value(value_node, ctx);
            self.emit(format!("sw {}({}),{}", ctx.ret_offset, FRAME, value));
            self.pool.release(value);
        }
        self.emit(format!("j {}", ctx.end_label));
    }

    // ------------------------------------------------------------------
    // expressions

    /// Emit the code that computes a subexpression into its reserved
    /// temporary. Loading the value back is a separate step so parents can
    /// sequence their operands.
    fn gen_expr(&mut self, node: NodeId, ctx: &FnCtx) {
        match self.ast.kind(node) {
            NodeKind::IntLit => {
                if let Some(temp) = self.ast.node(node).temp {
                    let reg = self.pool.acquire();
                    self.emit(format!("addi {},{},{}", reg, ZERO, self.ast.value(node)));
                    self.emit(format!(
                        "sw {}({}),{}",
                        self.tree.entry(temp).offset,
                        FRAME,
                        reg
                    ));
                    self.pool.release(reg);
                }
            }
            NodeKind::FloatLit => {
                self.comment(&format!(
                    "float literal {} reserved, arithmetic not emitted",
                    self.ast.value(node)
                ));
            }
            NodeKind::AddOp | NodeKind::MultOp => self.binary_op(node, ctx),
            NodeKind::RelExpr => self.rel_expr(node, ctx),
            NodeKind::Not | NodeKind::Sign => {
                self.gen_expr(self.ast.child(node, 0), ctx);
            }
            NodeKind::Variable => {
                for ix in self.ast.children(self.ast.child(node, 1)) {
                    self.gen_expr(ix, ctx);
                }
            }
            NodeKind::Dot => {
                self.gen_expr(self.ast.child(node, 0), ctx);
                let right = self.ast.child(node, 1);
                match self.ast.kind(right) {
                    NodeKind::FunctionCall => self.call(right, ctx),
                    NodeKind::Variable => {
                        for ix in self.ast.children(self.ast.child(right, 1)) {
                            self.gen_expr(ix, ctx);
                        }
                    }
                    _ => {}
                }
            }
            NodeKind::FunctionCall => self.call(node, ctx),
            _ => {}
        }
    }

    fn binary_op(&mut self, node: NodeId, ctx: &FnCtx) {
        let left = self.ast.child(node, 0);
        let right = self.ast.child(node, 1);
        self.gen_expr(left, ctx);
        self.gen_expr(right, ctx);

        if self.ast.sem_type(node) == SemType::Float {
            self.comment("float arithmetic not emitted");
            return;
        }
        let temp = match self.ast.node(node).temp {
            Some(t) => self.tree.entry(t).offset,
            None => return,
        };

        match self.ast.value(node) {
            "|" | "&" => self.logical_op(node, temp, ctx),
            glyph => {
                let instr = match glyph {
                    "+" => "add",
                    "-" => "sub",
                    "*" => "mul",
                    _ => "div",
                };
                let lhs = self.load_value(left, ctx);
                let rhs = self.load_value(right, ctx);
                self.emit(format!("{} {},{},{}", instr, lhs, lhs, rhs));
                self.emit(format!("sw {}({}),{}", temp, FRAME, lhs));
                self.pool.release(rhs);
                self.pool.release(lhs);
            }
        }
    }

    /// `|` and `&` branch over two labels to produce exactly 0 or 1.
    fn logical_op(&mut self, node: NodeId, temp: i32, ctx: &FnCtx) {
        let left = self.ast.child(node, 0);
        let right = self.ast.child(node, 1);
        let taken = self.new_label();
        let done = self.new_label();

        let lhs = self.load_value(left, ctx);
        let rhs = self.load_value(right, ctx);
        let result = self.pool.acquire();
        if self.ast.value(node) == "|" {
            self.emit(format!("bnz {},{}", lhs, taken));
            self.emit(format!("bnz {},{}", rhs, taken));
            self.emit(format!("addi {},{},0", result, ZERO));
            self.emit(format!("j {}", done));
            self.emit_labeled(&taken, &format!("addi {},{},1", result, ZERO));
        } else {
            self.emit(format!("bz {},{}", lhs, taken));
            self.emit(format!("bz {},{}", rhs, taken));
            self.emit(format!("addi {},{},1", result, ZERO));
            self.emit(format!("j {}", done));
            self.emit_labeled(&taken, &format!("addi {},{},0", result, ZERO));
        }
        self.emit_labeled(&done, &format!("sw {}({}),{}", temp, FRAME, result));
        self.pool.release(result);
        self.pool.release(rhs);
        self.pool.release(lhs);
    }

    fn rel_expr(&mut self, node: NodeId, ctx: &FnCtx) {
        let left = self.ast.child(node, 0);
        let right = self.ast.child(node, 2);
        self.gen_expr(left, ctx);
        self.gen_expr(right, ctx);

        if self.ast.sem_type(left) == SemType::Float {
            self.comment("float comparison not emitted");
            return;
        }
        let temp = match self.ast.node(node).temp {
            Some(t) => self.tree.entry(t).offset,
            None => return,
        };
        let instr = match self.ast.value(self.ast.child(node, 1)) {
            "==" => "ceq",
            "<>" => "cne",
            "<" => "clt",
            "<=" => "cle",
            ">" => "cgt",
            _ => "cge",
        };

        let lhs = self.load_value(left, ctx);
        let rhs = self.load_value(right, ctx);
        self.emit(format!("{} {},{},{}", instr, lhs, lhs, rhs));
        self.emit(format!("sw {}({}),{}", temp, FRAME, lhs));
        self.pool.release(rhs);
        self.pool.release(lhs);
    }

    /// Call sequence: store each argument into the callee's parameter slot,
    /// advance SP past this frame, link-jump, retreat SP, then fetch the
    /// return value into the call's temporary.
    fn call(&mut self, node: NodeId, ctx: &FnCtx) {
        let args = self.ast.children(self.ast.child(node, 1));
        for arg in &args {
            self.gen_expr(*arg, ctx);
        }

        let callee = match self.ast.node(node).entry {
            Some(e) => e,
            None => return,
        };
        let callee_scope = match self.tree.entry(callee).link {
            Some(s) => s,
            None => return,
        };
        let label = self.function_label(callee);
        let params = self.tree.lookup_all_of_kind(callee_scope, EntryKind::Param);
        let ret_size = sizeof_resolved(&self.tree.entry(callee).ty, self.tree, self.global);

        self.comment(&format!("call to {}", label));
        for (arg, param) in args.iter().zip(params.iter()) {
            let value = self.load_value(*arg, ctx);
            let slot = self.tree.entry(*param).offset;
            self.emit(format!("sw {}({}),{}", ctx.frame + slot, STACK, value));
            self.pool.release(value);
        }
        self.emit(format!("addi {},{},{}", STACK, STACK, ctx.frame));
        self.emit(format!("jl {},{}", LINK, label));
        self.emit(format!("subi {},{},{}", STACK, STACK, ctx.frame));

        if let Some(temp) = self.ast.node(node).temp {
            let value = self.pool.acquire();
            self.emit(format!("lw {},{}({})", value, ctx.frame - ret_size, STACK));
            self.emit(format!(
                "sw {}({}),{}",
                self.tree.entry(temp).offset,
                FRAME,
                value
            ));
            self.pool.release(value);
        }
    }

    // ------------------------------------------------------------------
    // value plumbing

    /// Load a computed value into a fresh scratch register.
    fn load_value(&mut self, node: NodeId, ctx: &FnCtx) -> Reg {
        match self.ast.kind(node) {
            NodeKind::Variable => {
                let loc = self.location(node, ctx);
                self.load_from(loc)
            }
            NodeKind::Dot => {
                let right = self.ast.child(node, 1);
                if self.ast.kind(right) == NodeKind::FunctionCall {
                    self.load_value(right, ctx)
                } else {
                    let loc = self.location(node, ctx);
                    self.load_from(loc)
                }
            }
            NodeKind::Not => {
                let value = self.load_value(self.ast.child(node, 0), ctx);
                self.emit(format!("ceq {},{},{}", value, value, ZERO));
                value
            }
            NodeKind::Sign => {
                let value = self.load_value(self.ast.child(node, 0), ctx);
                if self.ast.value(node) == "-" {
                    self.emit(format!("sub {},{},{}", value, ZERO, value));
                }
                value
            }
            _ => {
                let reg = self.pool.acquire();
                if let Some(temp) = self.ast.node(node).temp {
                    self.emit(format!(
                        "lw {},{}({})",
                        reg,
                        self.tree.entry(temp).offset,
                        FRAME
                    ));
                }
                reg
            }
        }
    }

    fn load_from(&mut self, loc: Location) -> Reg {
        let dest = self.pool.acquire();
        match loc.index {
            None => self.emit(format!("lw {},{}({})", dest, loc.disp, FRAME)),
            Some(base) => {
                self.emit(format!("add {},{},{}", base, FRAME, base));
                self.emit(format!("lw {},{}({})", dest, loc.disp, base));
                self.pool.release(base);
            }
        }
        dest
    }

    fn store_value(&mut self, node: NodeId, value: Reg, ctx: &FnCtx) {
        let loc = self.location(node, ctx);
        match loc.index {
            None => self.emit(format!("sw {}({}),{}", loc.disp, FRAME, value)),
            Some(base) => {
                self.emit(format!("add {},{},{}", base, FRAME, base));
                self.emit(format!("sw {}({}),{}", loc.disp, base, value));
                self.pool.release(base);
            }
        }
    }

    /// Resolve an l-value shaped expression to a frame location. Member
    /// accesses add the member's offset past the top of the variable's
    /// storage block; indexed accesses accumulate a run-time byte offset.
    fn location(&mut self, node: NodeId, ctx: &FnCtx) -> Location {
        match self.ast.kind(node) {
            NodeKind::Variable => {
                if self.ast.value(self.ast.child(node, 0)) == "self" {
                    return Location {
                        disp: 0,
                        index: None,
                    };
                }
                let entry = self
                    .ast
                    .node(node)
                    .entry
                    .expect("variable resolved during semantic checking");
                let indices = self.ast.children(self.ast.child(node, 1));
                let index = if indices.is_empty() {
                    None
                } else {
                    Some(self.index_offset(entry, &indices, ctx))
                };
                Location {
                    disp: self.tree.entry(entry).offset,
                    index,
                }
            }
            NodeKind::Dot => {
                let left = self.ast.child(node, 0);
                let right = self.ast.child(node, 1);
                let member = self
                    .ast
                    .node(right)
                    .entry
                    .expect("member resolved during semantic checking");

                let self_base = self.ast.kind(left) == NodeKind::Variable
                    && self.ast.value(self.ast.child(left, 0)) == "self";
                let (mut disp, mut index) = if self_base {
                    // members of the current object share the frame-relative
                    // addressing of bare member references
                    (0, None)
                } else {
                    let base = self.location(left, ctx);
                    let owner = match self.ast.sem_type(left) {
                        SemType::Struct(name) => self
                            .tree
                            .lookup(self.global, &name, EntryKind::Struct)
                            .and_then(|e| self.tree.entry(e).link)
                            .map(|s| self.tree.scope(s).size)
                            .unwrap_or(0),
                        _ => panic!("dot base must be a struct after semantic checking"),
                    };
                    (base.disp + owner, base.index)
                };
                disp += self.tree.entry(member).offset;

                let indices = self.ast.children(self.ast.child(right, 1));
                if !indices.is_empty() {
                    let member_index = self.index_offset(member, &indices, ctx);
                    index = match index {
                        None => Some(member_index),
                        Some(existing) => {
                            self.emit(format!(
                                "add {},{},{}",
                                existing, existing, member_index
                            ));
                            self.pool.release(member_index);
                            Some(existing)
                        }
                    };
                }
                Location { disp, index }
            }
            _ => {
                let temp = self
                    .ast
                    .node(node)
                    .temp
                    .expect("expression owns a temporary after layout");
                Location {
                    disp: self.tree.entry(temp).offset,
                    index: None,
                }
            }
        }
    }

    /// Row-major byte offset for an indexed access: the sum over every
    /// index of `index * stride`, with strides derived from the declared
    /// shape. The result register holds a pure byte offset.
    fn index_offset(&mut self, entry: EntryId, indices: &[NodeId], ctx: &FnCtx) -> Reg {
        let ty = self.tree.entry(entry).ty.clone();
        let shape = ty.shape().to_vec();
        let elem_size = sizeof_resolved(&ty.trim(), self.tree, self.global);

        let offset = self.pool.acquire();
        self.emit(format!("addi {},{},0", offset, ZERO));
        for (at, ix) in indices.iter().enumerate() {
            let stride: i32 = shape[at + 1..].iter().map(|d| *d as i32).product::<i32>() * elem_size;
            let value = self.load_value(*ix, ctx);
            self.emit(format!("muli {},{},{}", value, value, stride));
            self.emit(format!("add {},{},{}", offset, offset, value));
            self.pool.release(value);
        }
        offset
    }
}
