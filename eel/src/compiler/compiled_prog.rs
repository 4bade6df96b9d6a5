use super::preresolved::{PreResolvedByteCode, PreResolvedCodePoint};
use crate::{interp::ByteCode, EelResult, EelValue};

#[derive(Debug, Clone)]
pub enum NodeValue {
    Bytecode(PreResolvedByteCode),
    ConstExpr(EelValue),
}

/// Result of compiling one parse node: either a value known at compile time or the code
/// that leaves the value on the stack.
#[derive(Debug, Clone)]
pub struct CompiledProg {
    pub inner: NodeValue,
}

impl CompiledProg {
    pub fn with_const(val: EelValue) -> CompiledProg {
        CompiledProg {
            inner: NodeValue::ConstExpr(val),
        }
    }

    pub fn with_code(code: PreResolvedByteCode) -> CompiledProg {
        CompiledProg {
            inner: NodeValue::Bytecode(code),
        }
    }

    /// Constant only when folding is compiled in. Literals stay constants either way, they
    /// just do not combine.
    pub fn foldable(&self) -> Option<&EelValue> {
        match &self.inner {
            NodeValue::ConstExpr(c) if cfg!(feature = "const_fold") => Some(c),
            _ => None,
        }
    }

    /// Folds `children` with `resolve` when all are constant, otherwise emits their code
    /// followed by `bytecode`. A fold that fails or yields a host value is deferred to run
    /// time.
    pub fn from_children_w_bytecode<F>(
        children: Vec<CompiledProg>,
        bytecode: ByteCode,
        resolve: F,
    ) -> CompiledProg
    where
        F: FnOnce(&[&EelValue]) -> EelResult<EelValue>,
    {
        let consts: Option<Vec<&EelValue>> = children.iter().map(|c| c.foldable()).collect();

        if let Some(consts) = consts {
            if let Ok(res) = resolve(&consts) {
                if is_storable(&res) {
                    return CompiledProg::with_const(res);
                }
            }
        }

        let mut code = PreResolvedByteCode::new();
        for child in children {
            code.append(child.into_code());
        }
        code.push(bytecode);

        CompiledProg::with_code(code)
    }

    pub fn into_code(self) -> PreResolvedByteCode {
        match self.inner {
            NodeValue::Bytecode(b) => b,
            NodeValue::ConstExpr(c) => [PreResolvedCodePoint::Bytecode(ByteCode::Push(c))]
                .into_iter()
                .collect(),
        }
    }

    pub fn is_const(&self) -> bool {
        matches!(self.inner, NodeValue::ConstExpr(_))
    }
}

fn is_storable(value: &EelValue) -> bool {
    match value {
        EelValue::List(list) => list.iter().all(is_storable),
        EelValue::Map(map) => map.values().all(is_storable),
        EelValue::Object(_) | EelValue::Function(_) => false,
        _ => true,
    }
}

#[cfg(test)]
mod test {
    use super::{CompiledProg, NodeValue};
    use crate::{interp::ByteCode, EelValue};

    #[test]
    fn test_folds_constants() {
        let prog = CompiledProg::from_children_w_bytecode(
            vec![
                CompiledProg::with_const(2.into()),
                CompiledProg::with_const(3.into()),
            ],
            ByteCode::Add,
            |c| c[0].clone() + c[1].clone(),
        );

        if cfg!(feature = "const_fold") {
            assert!(matches!(prog.inner, NodeValue::ConstExpr(EelValue::Int(5))));
        } else {
            assert_eq!(prog.into_code().len(), 3);
        }
    }

    #[test]
    fn test_failed_fold_is_deferred() {
        let prog = CompiledProg::from_children_w_bytecode(
            vec![
                CompiledProg::with_const(1.into()),
                CompiledProg::with_const(0.into()),
            ],
            ByteCode::Div,
            |c| c[0].clone() / c[1].clone(),
        );

        assert!(!prog.is_const());
        assert_eq!(prog.into_code().len(), 3);
    }
}
