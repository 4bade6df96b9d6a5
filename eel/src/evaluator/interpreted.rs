use super::EelEvaluator;
use crate::{
    parser::{self, NodeKind, ParseNode, PathSegment},
    Context, EelError, EelResult, EelValue,
};

/// Parses the expression on every call and walks the tree directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpretedEvaluator;

impl InterpretedEvaluator {
    pub fn new() -> InterpretedEvaluator {
        InterpretedEvaluator
    }
}

impl EelEvaluator for InterpretedEvaluator {
    fn evaluate(&self, expression: &str, context: &Context) -> EelResult<EelValue> {
        let root = parser::parse(expression.trim())?;

        TreeWalker { root: context }
            .eval(&root)
            .map(Context::into_value)
    }
}

struct TreeWalker<'a> {
    root: &'a Context,
}

impl<'a> TreeWalker<'a> {
    fn eval(&self, node: &ParseNode) -> EelResult<Context> {
        if let Some(literal) = node.literal() {
            return Ok(Context::new(literal));
        }

        match node.kind() {
            NodeKind::Number(_) | NodeKind::String(_) | NodeKind::Boolean(_) => {
                Err(EelError::internal("Literal node without a value"))
            }
            NodeKind::Identifier(name) => self.root.get_and_wrap(&EelValue::from(name.as_str())),
            NodeKind::Conditional { cond, then, else_ } => {
                if self.eval(cond)?.value().is_truthy() {
                    self.eval(then)
                } else {
                    self.eval(else_)
                }
            }
            NodeKind::Disjunction { lft, rgt } => {
                let lft = self.eval(lft)?;
                if lft.value().is_truthy() {
                    Ok(Context::new(lft.into_value()))
                } else {
                    self.eval(rgt)
                }
            }
            NodeKind::Conjunction { lft, rgt } => {
                let lft = self.eval(lft)?;
                if lft.value().is_truthy() {
                    self.eval(rgt)
                } else {
                    Ok(Context::new(lft.into_value()))
                }
            }
            NodeKind::Comparison { op, lft, rgt } => {
                let lft = self.eval(lft)?;
                let rgt = self.eval(rgt)?;
                op.apply(lft.value(), rgt.value()).map(Context::new)
            }
            NodeKind::Sum { op, lft, rgt } => {
                let lft = self.eval(lft)?.into_value();
                let rgt = self.eval(rgt)?.into_value();
                op.apply(lft, rgt).map(Context::new)
            }
            NodeKind::Prod { op, lft, rgt } => {
                let lft = self.eval(lft)?.into_value();
                let rgt = self.eval(rgt)?.into_value();
                op.apply(lft, rgt).map(Context::new)
            }
            NodeKind::Not { exp } => Ok(Context::new(!self.eval(exp)?.into_value())),
            NodeKind::ArrayLiteral { items } => {
                let mut list = Context::empty_list();
                for item in items {
                    list.push(self.eval(item)?, None)?;
                }
                Ok(list)
            }
            NodeKind::ObjectLiteral { properties } => {
                let mut map = Context::empty_map();
                for (key, value) in properties {
                    map.push(self.eval(value)?, Some(key))?;
                }
                Ok(map)
            }
            NodeKind::ObjectPath { segments } => self.object_path(segments),
        }
    }

    /// Threads the receiver through the segments, starting at the evaluation context.
    fn object_path(&self, segments: &[PathSegment]) -> EelResult<Context> {
        let mut receiver: Option<Context> = None;

        for segment in segments {
            let current = receiver.as_ref().unwrap_or(self.root);

            let next = match segment {
                PathSegment::Property(name) => {
                    current.get_and_wrap(&EelValue::from(name.as_str()))?
                }
                PathSegment::Offset(offset) => {
                    let index = self.eval(offset)?.into_value();
                    current.get_and_wrap(&index)?
                }
                PathSegment::Method { method, arguments } => {
                    let args = arguments
                        .iter()
                        .map(|arg| self.eval(arg))
                        .collect::<EelResult<Vec<_>>>()?;
                    current.call_and_wrap(method, args)?
                }
            };

            receiver = Some(next);
        }

        match receiver {
            Some(receiver) => Ok(receiver),
            None => Ok(self.root.clone()),
        }
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::InterpretedEvaluator;
    use crate::{Context, EelError, EelEvaluator, EelValue};

    #[test]
    fn test_reparses_every_call() {
        let eval = InterpretedEvaluator::new();
        let ctx = Context::new(json!({"a": 2}));

        assert_eq!(eval.evaluate("a * 3", &ctx).unwrap(), 6.into());
        assert_eq!(eval.evaluate(" a * 3 ", &ctx).unwrap(), 6.into());
    }

    #[test]
    fn test_offset_uses_root_context() {
        let eval = InterpretedEvaluator::new();
        let ctx = Context::new(json!({"list": ["x", "y"], "i": 1}));

        assert_eq!(eval.evaluate("list[i]", &ctx).unwrap(), "y".into());
    }

    #[test]
    fn test_parse_error() {
        let eval = InterpretedEvaluator::new();

        assert!(matches!(
            eval.evaluate("1 +", &Context::new(EelValue::Null)),
            Err(EelError::Parse(_))
        ));
    }
}
