mod compiled_prog;
mod preresolved;

pub use compiled_prog::{CompiledProg, NodeValue};
pub use preresolved::{PreResolvedByteCode, PreResolvedCodePoint};

use std::rc::Rc;

use crate::{
    interp::{ByteCode, JmpWhen},
    parser::{self, CompOp, NodeKind, ParseNode, PathSegment, ProdOp, SumOp},
    Context, EelError, EelResult, Program,
};

/// Turns parse trees into stack machine programs.
///
/// Every node is emitted exactly once. `||`, `&&` and `?:` keep their operands behind
/// conditional jumps, so a skipped operand never runs.
pub struct CodeGenerator {
    next_label: u32,
}

impl CodeGenerator {
    pub fn new() -> CodeGenerator {
        CodeGenerator { next_label: 0 }
    }

    /// Parses and compiles `source`.
    pub fn compile(source: &str) -> EelResult<Program> {
        let source = source.trim();
        let root = parser::parse(source)?;
        let bytecode = CodeGenerator::new().generate(&root)?.into_code().resolve()?;

        if bytecode.is_empty() {
            return Err(EelError::compile("code generation produced no result"));
        }

        Ok(Program::new(source.to_owned(), bytecode))
    }

    fn new_label(&mut self) -> u32 {
        let label = self.next_label;
        self.next_label += 1;
        label
    }

    pub fn generate(&mut self, node: &ParseNode) -> EelResult<CompiledProg> {
        if let Some(literal) = node.literal() {
            return Ok(CompiledProg::with_const(literal));
        }

        match node.kind() {
            NodeKind::Number(_) | NodeKind::String(_) | NodeKind::Boolean(_) => {
                Err(EelError::internal("Literal node without a value"))
            }
            NodeKind::Identifier(name) => {
                let mut code = PreResolvedByteCode::new();
                code.push(ByteCode::Load(name.clone()));
                Ok(CompiledProg::with_code(code))
            }
            NodeKind::Conditional { cond, then, else_ } => self.conditional(cond, then, else_),
            NodeKind::Disjunction { lft, rgt } => self.short_circuit(lft, rgt, JmpWhen::True),
            NodeKind::Conjunction { lft, rgt } => self.short_circuit(lft, rgt, JmpWhen::False),
            NodeKind::Comparison { op, lft, rgt } => {
                let op = *op;
                let children = vec![self.generate(lft)?, self.generate(rgt)?];
                Ok(CompiledProg::from_children_w_bytecode(
                    children,
                    comp_bytecode(op),
                    |c| op.apply(c[0], c[1]),
                ))
            }
            NodeKind::Sum { op, lft, rgt } => {
                let op = *op;
                let children = vec![self.generate(lft)?, self.generate(rgt)?];
                let bytecode = match op {
                    SumOp::Add => ByteCode::Add,
                    SumOp::Sub => ByteCode::Sub,
                };
                Ok(CompiledProg::from_children_w_bytecode(
                    children,
                    bytecode,
                    |c| op.apply(c[0].clone(), c[1].clone()),
                ))
            }
            NodeKind::Prod { op, lft, rgt } => {
                let op = *op;
                let children = vec![self.generate(lft)?, self.generate(rgt)?];
                let bytecode = match op {
                    ProdOp::Div => ByteCode::Div,
                    ProdOp::Mul => ByteCode::Mul,
                    ProdOp::Mod => ByteCode::Mod,
                };
                Ok(CompiledProg::from_children_w_bytecode(
                    children,
                    bytecode,
                    |c| op.apply(c[0].clone(), c[1].clone()),
                ))
            }
            NodeKind::Not { exp } => {
                let children = vec![self.generate(exp)?];
                Ok(CompiledProg::from_children_w_bytecode(
                    children,
                    ByteCode::Not,
                    |c| Ok(!c[0].clone()),
                ))
            }
            NodeKind::ArrayLiteral { items } => {
                let children = items
                    .iter()
                    .map(|item| self.generate(item))
                    .collect::<EelResult<Vec<_>>>()?;
                let size = u32::try_from(children.len())
                    .map_err(|_| EelError::compile("Array literal too large"))?;

                Ok(CompiledProg::from_children_w_bytecode(
                    children,
                    ByteCode::MkList(size),
                    |c| {
                        let mut list = Context::empty_list();
                        for item in c {
                            list.push(Context::new((*item).clone()), None)?;
                        }
                        Ok(list.into_value())
                    },
                ))
            }
            NodeKind::ObjectLiteral { properties } => {
                let keys: Vec<String> = properties.iter().map(|(k, _)| k.clone()).collect();
                let children = properties
                    .iter()
                    .map(|(_, value)| self.generate(value))
                    .collect::<EelResult<Vec<_>>>()?;

                Ok(CompiledProg::from_children_w_bytecode(
                    children,
                    ByteCode::MkMap(keys.clone()),
                    |c| {
                        let mut map = Context::empty_map();
                        for (key, value) in keys.iter().zip(c) {
                            map.push(Context::new((*value).clone()), Some(key))?;
                        }
                        Ok(map.into_value())
                    },
                ))
            }
            NodeKind::ObjectPath { segments } => self.object_path(segments),
        }
    }

    /// `[lft] DUP JMP <when> end POP [rgt] end:`
    fn short_circuit(
        &mut self,
        lft: &ParseNode,
        rgt: &ParseNode,
        when: JmpWhen,
    ) -> EelResult<CompiledProg> {
        let lft = self.generate(lft)?;

        if let Some(l) = lft.foldable() {
            if when.taken(l) {
                return Ok(lft);
            }
            return self.generate(rgt);
        }

        let rgt = self.generate(rgt)?;
        let end = self.new_label();

        let mut code = lft.into_code();
        code.push(ByteCode::Dup);
        code.push(PreResolvedCodePoint::JmpCond { when, label: end });
        code.push(ByteCode::Pop);
        code.append(rgt.into_code());
        code.push(PreResolvedCodePoint::Label(end));

        Ok(CompiledProg::with_code(code))
    }

    /// `[cond] JMP FALSE else [then] JMP end else: [else] end:`
    fn conditional(
        &mut self,
        cond: &ParseNode,
        then: &ParseNode,
        else_: &ParseNode,
    ) -> EelResult<CompiledProg> {
        let cond = self.generate(cond)?;

        if let Some(c) = cond.foldable() {
            return if c.is_truthy() {
                self.generate(then)
            } else {
                self.generate(else_)
            };
        }

        let then = self.generate(then)?;
        let else_ = self.generate(else_)?;
        let else_label = self.new_label();
        let end_label = self.new_label();

        let mut code = cond.into_code();
        code.push(PreResolvedCodePoint::JmpCond {
            when: JmpWhen::False,
            label: else_label,
        });
        code.append(then.into_code());
        code.push(PreResolvedCodePoint::Jmp { label: end_label });
        code.push(PreResolvedCodePoint::Label(else_label));
        code.append(else_.into_code());
        code.push(PreResolvedCodePoint::Label(end_label));

        Ok(CompiledProg::with_code(code))
    }

    fn arguments(&mut self, arguments: &[Rc<ParseNode>]) -> EelResult<(PreResolvedByteCode, u32)> {
        let mut code = PreResolvedByteCode::new();
        for arg in arguments {
            code.append(self.generate(arg)?.into_code());
        }

        let argc = u32::try_from(arguments.len())
            .map_err(|_| EelError::compile("Too many method arguments"))?;

        Ok((code, argc))
    }

    fn object_path(&mut self, segments: &[PathSegment]) -> EelResult<CompiledProg> {
        let mut code = PreResolvedByteCode::new();

        for (i, segment) in segments.iter().enumerate() {
            match (i, segment) {
                (0, PathSegment::Property(name)) => code.push(ByteCode::Load(name.clone())),
                (0, PathSegment::Method { method, arguments }) => {
                    let (args, argc) = self.arguments(arguments)?;
                    code.append(args);
                    code.push(ByteCode::LoadCall {
                        method: method.clone(),
                        argc,
                    });
                }
                (0, PathSegment::Offset(_)) => {
                    return Err(EelError::compile("Object path must start with an identifier"))
                }
                (_, PathSegment::Property(name)) => code.push(ByteCode::Access(name.clone())),
                (_, PathSegment::Offset(offset)) => {
                    code.append(self.generate(offset)?.into_code());
                    code.push(ByteCode::Index);
                }
                (_, PathSegment::Method { method, arguments }) => {
                    let (args, argc) = self.arguments(arguments)?;
                    code.append(args);
                    code.push(ByteCode::Call {
                        method: method.clone(),
                        argc,
                    });
                }
            }
        }

        Ok(CompiledProg::with_code(code))
    }
}

impl Default for CodeGenerator {
    fn default() -> Self {
        CodeGenerator::new()
    }
}

fn comp_bytecode(op: CompOp) -> ByteCode {
    match op {
        CompOp::Eq => ByteCode::Eq,
        CompOp::Ne => ByteCode::Ne,
        CompOp::Le => ByteCode::Le,
        CompOp::Ge => ByteCode::Ge,
        CompOp::Lt => ByteCode::Lt,
        CompOp::Gt => ByteCode::Gt,
    }
}
