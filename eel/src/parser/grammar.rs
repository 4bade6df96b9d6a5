use serde::{Deserialize, Serialize};
use std::rc::Rc;

use crate::{EelResult, EelValue};

/// Grammar rules, used as the rule half of packrat memo keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rule {
    Expression,
    ConditionalExpression,
    Disjunction,
    Conjunction,
    Comparison,
    SumCalculation,
    ProdCalculation,
    SimpleExpression,
    WrappedExpression,
    NotExpression,
    ArrayLiteral,
    ObjectLiteral,
    Term,
    BooleanLiteral,
    NumberLiteral,
    StringLiteral,
    ObjectPath,
    MethodCall,
    Identifier,
}

/// Matched byte range `(start, len)` in the expression text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span(usize, usize);

impl Span {
    pub fn new(start: usize, len: usize) -> Span {
        Span(start, len)
    }

    pub fn between(start: usize, end: usize) -> Span {
        Span(start, end - start)
    }

    pub fn start(&self) -> usize {
        self.0
    }

    pub fn len(&self) -> usize {
        self.1
    }

    pub fn is_empty(&self) -> bool {
        self.1 == 0
    }

    pub fn end(&self) -> usize {
        self.0 + self.1
    }

    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start()..self.end()).unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompOp {
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
}

impl CompOp {
    /// Operator tokens in the order they are tried.
    pub const TOKENS: [(&'static str, CompOp); 6] = [
        ("==", CompOp::Eq),
        ("!=", CompOp::Ne),
        ("<=", CompOp::Le),
        (">=", CompOp::Ge),
        ("<", CompOp::Lt),
        (">", CompOp::Gt),
    ];

    pub fn apply(self, lhs: &EelValue, rhs: &EelValue) -> EelResult<EelValue> {
        match self {
            CompOp::Eq => Ok(lhs.eq_(rhs)),
            CompOp::Ne => Ok(lhs.neq(rhs)),
            CompOp::Le => lhs.le(rhs),
            CompOp::Ge => lhs.ge(rhs),
            CompOp::Lt => lhs.lt(rhs),
            CompOp::Gt => lhs.gt(rhs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SumOp {
    Add,
    Sub,
}

impl SumOp {
    pub fn apply(self, lhs: EelValue, rhs: EelValue) -> EelResult<EelValue> {
        match self {
            SumOp::Add => lhs + rhs,
            SumOp::Sub => lhs - rhs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProdOp {
    Div,
    Mul,
    Mod,
}

impl ProdOp {
    pub fn apply(self, lhs: EelValue, rhs: EelValue) -> EelResult<EelValue> {
        match self {
            ProdOp::Div => lhs / rhs,
            ProdOp::Mul => lhs * rhs,
            ProdOp::Mod => lhs % rhs,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NumberLiteral {
    Int(i64),
    Float(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    Property(String),
    Offset(Rc<ParseNode>),
    Method {
        method: String,
        arguments: Vec<Rc<ParseNode>>,
    },
}

/// The synthesized attributes of a rule application. Rules that matched no operator pass
/// their child node through, so the tree only holds nodes that carry meaning.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Number(NumberLiteral),
    String(String),
    Boolean(bool),
    Identifier(String),
    Conditional {
        cond: Rc<ParseNode>,
        then: Rc<ParseNode>,
        else_: Rc<ParseNode>,
    },
    Disjunction {
        lft: Rc<ParseNode>,
        rgt: Rc<ParseNode>,
    },
    Conjunction {
        lft: Rc<ParseNode>,
        rgt: Rc<ParseNode>,
    },
    Comparison {
        op: CompOp,
        lft: Rc<ParseNode>,
        rgt: Rc<ParseNode>,
    },
    Sum {
        op: SumOp,
        lft: Rc<ParseNode>,
        rgt: Rc<ParseNode>,
    },
    Prod {
        op: ProdOp,
        lft: Rc<ParseNode>,
        rgt: Rc<ParseNode>,
    },
    Not {
        exp: Rc<ParseNode>,
    },
    ArrayLiteral {
        items: Vec<Rc<ParseNode>>,
    },
    ObjectLiteral {
        properties: Vec<(String, Rc<ParseNode>)>,
    },
    ObjectPath {
        segments: Vec<PathSegment>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseNode {
    rule: Rule,
    span: Span,
    kind: NodeKind,
}

impl ParseNode {
    pub fn new(rule: Rule, span: Span, kind: NodeKind) -> ParseNode {
        ParseNode { rule, span, kind }
    }

    pub fn rule(&self) -> Rule {
        self.rule
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Literal value of the node, if it is a scalar literal.
    pub fn literal(&self) -> Option<EelValue> {
        match &self.kind {
            NodeKind::Number(NumberLiteral::Int(i)) => Some(EelValue::Int(*i)),
            NodeKind::Number(NumberLiteral::Float(f)) => Some(EelValue::Float(*f)),
            NodeKind::String(s) => Some(EelValue::String(s.clone())),
            NodeKind::Boolean(b) => Some(EelValue::Bool(*b)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{CompOp, Span};
    use crate::EelValue;

    #[test]
    fn test_span() {
        let span = Span::between(2, 5);

        assert_eq!(span.start(), 2);
        assert_eq!(span.len(), 3);
        assert_eq!(span.end(), 5);
        assert_eq!(span.text("a + bcd"), "+ b");
    }

    #[test]
    fn test_comp_op_tokens_try_two_char_first() {
        let first_single = CompOp::TOKENS
            .iter()
            .position(|(tok, _)| tok.len() == 1)
            .unwrap();

        assert!(CompOp::TOKENS[..first_single]
            .iter()
            .all(|(tok, _)| tok.len() == 2));
        assert_eq!(
            CompOp::Ne.apply(&1.into(), &"1".into()).unwrap(),
            EelValue::Bool(true)
        );
    }
}
