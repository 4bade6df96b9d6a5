use std::fmt;

use serde::{Deserialize, Serialize};

use crate::EelValue;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JmpWhen {
    True,
    False,
}

impl JmpWhen {
    /// Whether a jump with this condition is taken for `value`.
    pub fn taken(self, value: &EelValue) -> bool {
        match self {
            JmpWhen::True => value.is_truthy(),
            JmpWhen::False => !value.is_truthy(),
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub enum ByteCode {
    Push(EelValue),
    /// Reads a variable from the evaluation context.
    Load(String),
    /// Calls a function stored in the evaluation context.
    LoadCall {
        method: String,
        argc: u32,
    },
    Access(String),
    Index,
    Call {
        method: String,
        argc: u32,
    },
    Dup,
    Pop,
    Not,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Ge,
    Gt,
    Jmp(i32),
    /// Pops the condition and jumps `dist` when it matches `when`.
    JmpCond {
        when: JmpWhen,
        dist: i32,
    },
    MkList(u32),
    MkMap(Vec<String>),
}

impl fmt::Debug for ByteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ByteCode::*;

        match self {
            Push(val) => write!(f, "PUSH {:?}", val),
            Load(name) => write!(f, "LOAD {}", name),
            LoadCall { method, argc } => write!(f, "LOADCALL {} {}", method, argc),
            Access(name) => write!(f, "ACCESS {}", name),
            Index => write!(f, "INDEX"),
            Call { method, argc } => write!(f, "CALL {} {}", method, argc),
            Dup => write!(f, "DUP"),
            Pop => write!(f, "POP"),
            Not => write!(f, "NOT"),
            Add => write!(f, "ADD"),
            Sub => write!(f, "SUB"),
            Mul => write!(f, "MUL"),
            Div => write!(f, "DIV"),
            Mod => write!(f, "MOD"),
            Eq => write!(f, "EQ"),
            Ne => write!(f, "NE"),
            Lt => write!(f, "LT"),
            Le => write!(f, "LE"),
            Ge => write!(f, "GE"),
            Gt => write!(f, "GT"),
            Jmp(dist) => write!(f, "JMP {}", dist),
            JmpCond { when, dist } => write!(f, "JMP {:?} {}", when, dist),
            MkList(size) => write!(f, "MKLIST {}", size),
            MkMap(keys) => write!(f, "MKMAP {}", keys.join(",")),
        }
    }
}
