mod bytecode;

pub use bytecode::{ByteCode, JmpWhen};

use crate::{Context, EelError, EelResult, EelValue};

struct InterpStack {
    stack: Vec<Context>,
}

impl InterpStack {
    fn new() -> InterpStack {
        InterpStack { stack: Vec::new() }
    }

    fn push(&mut self, val: Context) {
        self.stack.push(val);
    }

    fn push_val(&mut self, val: EelValue) {
        self.stack.push(Context::new(val));
    }

    fn pop(&mut self) -> EelResult<Context> {
        self.stack
            .pop()
            .ok_or_else(|| EelError::internal("No value on stack"))
    }

    fn pop_val(&mut self) -> EelResult<EelValue> {
        self.pop().map(Context::into_value)
    }

    fn pop_n(&mut self, n: u32) -> EelResult<Vec<Context>> {
        let n = n as usize;
        if n > self.stack.len() {
            return Err(EelError::internal("Not enough values on stack"));
        }

        Ok(self.stack.split_off(self.stack.len() - n))
    }

    fn top(&self) -> EelResult<&Context> {
        self.stack
            .last()
            .ok_or_else(|| EelError::internal("No value on stack"))
    }
}

/// Stack machine running compiled bytecode against one evaluation context.
pub struct Interpreter<'a> {
    root: &'a Context,
}

impl<'a> Interpreter<'a> {
    pub fn new(root: &'a Context) -> Interpreter<'a> {
        Interpreter { root }
    }

    pub fn run(&self, prog: &[ByteCode]) -> EelResult<EelValue> {
        let mut pc: usize = 0;
        let mut stack = InterpStack::new();

        while pc < prog.len() {
            let oldpc = pc;
            pc += 1;
            match &prog[oldpc] {
                ByteCode::Push(val) => stack.push_val(val.clone()),
                ByteCode::Load(name) => {
                    stack.push(self.root.get_and_wrap(&EelValue::from(name.as_str()))?)
                }
                ByteCode::LoadCall { method, argc } => {
                    let args = stack.pop_n(*argc)?;
                    stack.push(self.root.call_and_wrap(method, args)?);
                }
                ByteCode::Access(name) => {
                    let recv = stack.pop()?;
                    stack.push(recv.get_and_wrap(&EelValue::from(name.as_str()))?);
                }
                ByteCode::Index => {
                    let index = stack.pop_val()?;
                    let recv = stack.pop()?;
                    stack.push(recv.get_and_wrap(&index)?);
                }
                ByteCode::Call { method, argc } => {
                    let args = stack.pop_n(*argc)?;
                    let recv = stack.pop()?;
                    stack.push(recv.call_and_wrap(method, args)?);
                }
                ByteCode::Dup => {
                    let top = stack.top()?.clone();
                    stack.push(top);
                }
                ByteCode::Pop => {
                    stack.pop()?;
                }
                ByteCode::Not => {
                    let v1 = stack.pop_val()?;

                    stack.push_val(!v1);
                }
                ByteCode::Add => {
                    let v2 = stack.pop_val()?;
                    let v1 = stack.pop_val()?;

                    stack.push_val((v1 + v2)?);
                }
                ByteCode::Sub => {
                    let v2 = stack.pop_val()?;
                    let v1 = stack.pop_val()?;

                    stack.push_val((v1 - v2)?);
                }
                ByteCode::Mul => {
                    let v2 = stack.pop_val()?;
                    let v1 = stack.pop_val()?;

                    stack.push_val((v1 * v2)?);
                }
                ByteCode::Div => {
                    let v2 = stack.pop_val()?;
                    let v1 = stack.pop_val()?;

                    stack.push_val((v1 / v2)?);
                }
                ByteCode::Mod => {
                    let v2 = stack.pop_val()?;
                    let v1 = stack.pop_val()?;

                    stack.push_val((v1 % v2)?);
                }
                ByteCode::Eq => {
                    let v2 = stack.pop_val()?;
                    let v1 = stack.pop_val()?;

                    stack.push_val(v1.eq_(&v2));
                }
                ByteCode::Ne => {
                    let v2 = stack.pop_val()?;
                    let v1 = stack.pop_val()?;

                    stack.push_val(v1.neq(&v2));
                }
                ByteCode::Lt => {
                    let v2 = stack.pop_val()?;
                    let v1 = stack.pop_val()?;

                    stack.push_val(v1.lt(&v2)?);
                }
                ByteCode::Le => {
                    let v2 = stack.pop_val()?;
                    let v1 = stack.pop_val()?;

                    stack.push_val(v1.le(&v2)?);
                }
                ByteCode::Ge => {
                    let v2 = stack.pop_val()?;
                    let v1 = stack.pop_val()?;

                    stack.push_val(v1.ge(&v2)?);
                }
                ByteCode::Gt => {
                    let v2 = stack.pop_val()?;
                    let v1 = stack.pop_val()?;

                    stack.push_val(v1.gt(&v2)?);
                }
                ByteCode::Jmp(dist) => pc = jump(pc, *dist, prog.len())?,
                ByteCode::JmpCond { when, dist } => {
                    let v1 = stack.pop_val()?;
                    if when.taken(&v1) {
                        pc = jump(pc, *dist, prog.len())?;
                    }
                }
                ByteCode::MkList(size) => {
                    let mut list = Context::empty_list();
                    for item in stack.pop_n(*size)? {
                        list.push(item, None)?;
                    }
                    stack.push(list);
                }
                ByteCode::MkMap(keys) => {
                    let mut map = Context::empty_map();
                    let values = stack.pop_n(keys.len() as u32)?;
                    for (key, value) in keys.iter().zip(values) {
                        map.push(value, Some(key))?;
                    }
                    stack.push(map);
                }
            }
        }

        let result = stack.pop().map_err(|_| {
            EelError::compile("code generation produced no result")
        })?;

        if !stack.stack.is_empty() {
            return Err(EelError::internal("Values left on stack after evaluation"));
        }

        Ok(result.into_value())
    }
}

fn jump(pc: usize, dist: i32, len: usize) -> EelResult<usize> {
    match pc.checked_add_signed(dist as isize) {
        Some(target) if target <= len => Ok(target),
        _ => Err(EelError::internal("Jump out of program bounds")),
    }
}
