mod cache;
mod store;

pub use cache::ProgramCache;
pub use store::{ExpressionStore, FileExpressionStore, MemoryExpressionStore};

use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
};

use serde::{Deserialize, Serialize};

use crate::{
    compiler::CodeGenerator,
    interp::{ByteCode, Interpreter},
    Context, EelResult, EelValue,
};

/// Content hash of a trimmed expression text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExpressionKey(u64);

impl ExpressionKey {
    pub fn of(expression: &str) -> ExpressionKey {
        let mut hasher = DefaultHasher::new();
        expression.trim().hash(&mut hasher);
        ExpressionKey(hasher.finish())
    }
}

impl fmt::Display for ExpressionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A compiled expression: resolved bytecode plus the source it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    source: String,
    bytecode: Vec<ByteCode>,
}

impl Program {
    pub fn new(source: String, bytecode: Vec<ByteCode>) -> Program {
        Program { source, bytecode }
    }

    pub fn from_source(source: &str) -> EelResult<Program> {
        CodeGenerator::compile(source)
    }

    /// Derived from the source, so it is never trusted from storage.
    pub fn key(&self) -> ExpressionKey {
        ExpressionKey::of(&self.source)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn bytecode(&self) -> &[ByteCode] {
        &self.bytecode
    }

    pub fn run(&self, context: &Context) -> EelResult<EelValue> {
        Interpreter::new(context).run(&self.bytecode)
    }

    pub fn dumps_bc(&self) -> String {
        let mut lines = Vec::new();

        for code in self.bytecode.iter() {
            lines.push(format!("{:?}", code))
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::{ExpressionKey, Program};
    use crate::Context;

    #[test]
    fn test_key_ignores_surrounding_whitespace() {
        assert_eq!(ExpressionKey::of(" a + 1\n"), ExpressionKey::of("a + 1"));
        assert_ne!(ExpressionKey::of("a + 1"), ExpressionKey::of("a + 2"));
    }

    #[test]
    fn test_run() {
        let prog = Program::from_source("a.b + 1").unwrap();
        let ctx = Context::new(json!({"a": {"b": 41}}));

        assert_eq!(prog.source(), "a.b + 1");
        assert_eq!(prog.run(&ctx).unwrap(), 42.into());
        assert_eq!(prog.dumps_bc(), "LOAD a\nACCESS b\nPUSH Int(1)\nADD");
    }

    #[test]
    fn test_serde() {
        let prog = Program::from_source("x ? [1, 'a'] : {k: 2.5}").unwrap();
        let line = serde_json::to_string(&prog).unwrap();

        assert_eq!(serde_json::from_str::<Program>(&line).unwrap(), prog);
    }

    #[test]
    fn test_serde_keeps_float_literals() {
        let huge = format!("1{} * a", "0".repeat(400));
        let ctx = Context::new(json!({"a": 1}));

        for source in ["110932.01402194171 * a", "0.30000000000000004 + a", huge.as_str()] {
            let prog = Program::from_source(source).unwrap();
            let line = serde_json::to_string(&prog).unwrap();
            let back = serde_json::from_str::<Program>(&line).unwrap();

            assert_eq!(back, prog, "{}", line);
            assert_eq!(back.run(&ctx).unwrap(), prog.run(&ctx).unwrap());
        }
    }
}
