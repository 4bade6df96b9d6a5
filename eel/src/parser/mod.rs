mod grammar;
mod packrat;
mod parse_error;
mod scanner;
mod source_location;

use std::{cell::RefCell, rc::Rc};

pub use grammar::{
    CompOp, NodeKind, NumberLiteral, ParseNode, PathSegment, ProdOp, Rule, Span, SumOp,
};
pub use packrat::{MemoEntry, MemoTable};
pub use parse_error::ParseError;
pub use scanner::InputScanner;
pub use source_location::SourceLocation;

use crate::utils::{ScopedCounter, ScopedCounterGuard};

const LOG_TARGET: &str = "eel::parser";

/// Maximum nesting depth of parentheses, literals, arguments and negations in one input.
pub const MAX_NESTING: usize = 64;

pub type ParseResult<T> = Result<T, ParseError>;

type Match = Option<(Rc<ParseNode>, usize)>;

/// Parses a complete expression. Trailing input that the grammar did not consume is an
/// error even when a prefix matched.
pub fn parse(text: &str) -> ParseResult<Rc<ParseNode>> {
    EelParser::with_input(text).parse()
}

/// Packrat recursive descent parser. Alternatives are tried in order and the first match
/// wins; every rule application is memoized by `(rule, offset)`.
pub struct EelParser<'l> {
    scanner: InputScanner<'l>,
    memo: RefCell<MemoTable>,
    depth: ScopedCounter,
}

impl<'l> EelParser<'l> {
    pub fn with_input(input: &'l str) -> EelParser<'l> {
        EelParser {
            scanner: InputScanner::new(input),
            memo: RefCell::new(MemoTable::new()),
            depth: ScopedCounter::with_limit(MAX_NESTING),
        }
    }

    pub fn parse(self) -> ParseResult<Rc<ParseNode>> {
        let input = self.scanner.input();
        let start = self.scanner.skip_ws(0);

        let res = match self.parse_expression(start)? {
            Some((node, end)) => {
                let end = self.scanner.skip_ws(end);
                if end == input.len() {
                    Ok(node)
                } else {
                    Err(self.failure(end.max(self.scanner.furthest_failure())))
                }
            }
            None => Err(self.failure(self.scanner.furthest_failure())),
        };

        if let Err(ref err) = res {
            log::debug!(target: LOG_TARGET, "{}", err);
        }

        res
    }

    fn failure(&self, offset: usize) -> ParseError {
        let input = self.scanner.input();
        let message = match input.get(offset..) {
            Some(rest) if !rest.is_empty() => format!("Unexpected input \"{}\"", rest),
            _ => "Unexpected end of expression".to_owned(),
        };

        ParseError::at_offset(input, offset).with_message(message)
    }

    /// Parses the longest expression starting at `pos` without requiring full consumption.
    pub fn parse_expression(&self, pos: usize) -> ParseResult<Match> {
        let _guard = self.nested(pos)?;

        self.memoized(Rule::Expression, pos, |p| p.conditional_expression(pos))
    }

    fn nested(&self, pos: usize) -> ParseResult<ScopedCounterGuard<'_>> {
        self.depth.enter().ok_or_else(|| {
            ParseError::at_offset(self.scanner.input(), pos)
                .with_message("Expression nesting too deep".to_owned())
        })
    }

    /// Number of memoized rule applications, for inspecting packrat behaviour.
    pub fn memo_size(&self) -> usize {
        self.memo.borrow().len()
    }

    fn memoized<F>(&self, rule: Rule, pos: usize, apply: F) -> ParseResult<Match>
    where
        F: FnOnce(&Self) -> ParseResult<Match>,
    {
        if let Some(entry) = self.memo.borrow_mut().get(rule, pos) {
            return Ok(match entry {
                MemoEntry::Success { node, end } => Some((node, end)),
                MemoEntry::Failure => None,
            });
        }

        let res = apply(self)?;

        let entry = match &res {
            Some((node, end)) => MemoEntry::Success {
                node: node.clone(),
                end: *end,
            },
            None => MemoEntry::Failure,
        };
        self.memo.borrow_mut().set(rule, pos, entry);

        Ok(res)
    }

    fn node(&self, rule: Rule, start: usize, end: usize, kind: NodeKind) -> Rc<ParseNode> {
        Rc::new(ParseNode::new(rule, Span::between(start, end), kind))
    }

    fn conditional_expression(&self, pos: usize) -> ParseResult<Match> {
        self.memoized(Rule::ConditionalExpression, pos, |p| {
            let (cond, end) = match p.disjunction(pos)? {
                Some(m) => m,
                None => return Ok(None),
            };

            let Some(q) = p.scanner.exact(p.scanner.skip_ws(end), "?") else {
                return Ok(Some((cond, end)));
            };
            let Some((then, then_end)) = p.parse_expression(p.scanner.skip_ws(q))? else {
                return Ok(Some((cond, end)));
            };
            let Some(colon) = p.scanner.exact(p.scanner.skip_ws(then_end), ":") else {
                return Ok(Some((cond, end)));
            };
            let Some((else_, else_end)) = p.parse_expression(p.scanner.skip_ws(colon))? else {
                return Ok(Some((cond, end)));
            };

            Ok(Some((
                p.node(
                    Rule::ConditionalExpression,
                    pos,
                    else_end,
                    NodeKind::Conditional { cond, then, else_ },
                ),
                else_end,
            )))
        })
    }

    fn disjunction(&self, pos: usize) -> ParseResult<Match> {
        self.memoized(Rule::Disjunction, pos, |p| {
            p.left_assoc(
                pos,
                Rule::Disjunction,
                |p, pos| p.conjunction(pos),
                |p, pos| {
                    p.scanner
                        .exact(pos, "||")
                        .or_else(|| p.scanner.word_op(pos, "or"))
                        .map(|end| ((), end))
                },
                |_, lft, rgt| NodeKind::Disjunction { lft, rgt },
            )
        })
    }

    fn conjunction(&self, pos: usize) -> ParseResult<Match> {
        self.memoized(Rule::Conjunction, pos, |p| {
            p.left_assoc(
                pos,
                Rule::Conjunction,
                |p, pos| p.comparison(pos),
                |p, pos| {
                    p.scanner
                        .exact(pos, "&&")
                        .or_else(|| p.scanner.word_op(pos, "and"))
                        .map(|end| ((), end))
                },
                |_, lft, rgt| NodeKind::Conjunction { lft, rgt },
            )
        })
    }

    /// At most one comparison operator, so `a < b < c` leaves `< c` unconsumed.
    fn comparison(&self, pos: usize) -> ParseResult<Match> {
        self.memoized(Rule::Comparison, pos, |p| {
            let (lft, end) = match p.sum_calculation(pos)? {
                Some(m) => m,
                None => return Ok(None),
            };

            let Some((op, op_end)) = p.scanner.one_of(p.scanner.skip_ws(end), &CompOp::TOKENS)
            else {
                return Ok(Some((lft, end)));
            };
            let Some((rgt, rgt_end)) = p.sum_calculation(p.scanner.skip_ws(op_end))? else {
                return Ok(Some((lft, end)));
            };

            Ok(Some((
                p.node(
                    Rule::Comparison,
                    pos,
                    rgt_end,
                    NodeKind::Comparison { op, lft, rgt },
                ),
                rgt_end,
            )))
        })
    }

    fn sum_calculation(&self, pos: usize) -> ParseResult<Match> {
        self.memoized(Rule::SumCalculation, pos, |p| {
            p.left_assoc(
                pos,
                Rule::SumCalculation,
                |p, pos| p.prod_calculation(pos),
                |p, pos| p.scanner.one_of(pos, &[("+", SumOp::Add), ("-", SumOp::Sub)]),
                |op, lft, rgt| NodeKind::Sum { op, lft, rgt },
            )
        })
    }

    fn prod_calculation(&self, pos: usize) -> ParseResult<Match> {
        self.memoized(Rule::ProdCalculation, pos, |p| {
            p.left_assoc(
                pos,
                Rule::ProdCalculation,
                |p, pos| p.simple_expression(pos),
                |p, pos| {
                    p.scanner.one_of(
                        pos,
                        &[("/", ProdOp::Div), ("*", ProdOp::Mul), ("%", ProdOp::Mod)],
                    )
                },
                |op, lft, rgt| NodeKind::Prod { op, lft, rgt },
            )
        })
    }

    /// `operand (op operand)*` folded to the left. Whitespace is allowed around operators.
    fn left_assoc<O, Operand, Operator, Build>(
        &self,
        pos: usize,
        rule: Rule,
        operand: Operand,
        operator: Operator,
        build: Build,
    ) -> ParseResult<Match>
    where
        Operand: Fn(&Self, usize) -> ParseResult<Match>,
        Operator: Fn(&Self, usize) -> Option<(O, usize)>,
        Build: Fn(O, Rc<ParseNode>, Rc<ParseNode>) -> NodeKind,
    {
        let (mut lft, mut end) = match operand(self, pos)? {
            Some(m) => m,
            None => return Ok(None),
        };

        loop {
            let Some((op, op_end)) = operator(self, self.scanner.skip_ws(end)) else {
                break;
            };
            let Some((rgt, rgt_end)) = operand(self, self.scanner.skip_ws(op_end))? else {
                break;
            };

            lft = self.node(rule, pos, rgt_end, build(op, lft, rgt));
            end = rgt_end;
        }

        Ok(Some((lft, end)))
    }

    fn simple_expression(&self, pos: usize) -> ParseResult<Match> {
        self.memoized(Rule::SimpleExpression, pos, |p| {
            if let Some(m) = p.wrapped_expression(pos)? {
                return Ok(Some(m));
            }
            if let Some(m) = p.not_expression(pos)? {
                return Ok(Some(m));
            }
            if let Some(m) = p.array_literal(pos)? {
                return Ok(Some(m));
            }
            if let Some(m) = p.object_literal(pos)? {
                return Ok(Some(m));
            }
            p.term(pos)
        })
    }

    fn wrapped_expression(&self, pos: usize) -> ParseResult<Match> {
        self.memoized(Rule::WrappedExpression, pos, |p| {
            let Some(open) = p.scanner.exact(pos, "(") else {
                return Ok(None);
            };
            let Some((exp, end)) = p.parse_expression(p.scanner.skip_ws(open))? else {
                return Ok(None);
            };
            let Some(close) = p.scanner.exact(p.scanner.skip_ws(end), ")") else {
                return Ok(None);
            };

            Ok(Some((exp, close)))
        })
    }

    fn not_expression(&self, pos: usize) -> ParseResult<Match> {
        self.memoized(Rule::NotExpression, pos, |p| {
            let Some(op_end) = p.scanner.not_op(pos) else {
                return Ok(None);
            };
            let _guard = p.nested(pos)?;
            let Some((exp, end)) = p.simple_expression(op_end)? else {
                return Ok(None);
            };

            Ok(Some((
                p.node(Rule::NotExpression, pos, end, NodeKind::Not { exp }),
                end,
            )))
        })
    }

    /// `open (Expression (',' Expression)*)? close`, returning the items and the end offset.
    fn expression_list(
        &self,
        pos: usize,
        open: &str,
        close: &str,
    ) -> ParseResult<Option<(Vec<Rc<ParseNode>>, usize)>> {
        let Some(open_end) = self.scanner.exact(pos, open) else {
            return Ok(None);
        };

        let mut items = Vec::new();
        let mut cur = self.scanner.skip_ws(open_end);

        if let Some((item, end)) = self.parse_expression(cur)? {
            items.push(item);
            cur = self.scanner.skip_ws(end);

            while let Some(comma) = self.scanner.exact(cur, ",") {
                let Some((item, end)) = self.parse_expression(self.scanner.skip_ws(comma))? else {
                    return Ok(None);
                };
                items.push(item);
                cur = self.scanner.skip_ws(end);
            }
        }

        match self.scanner.exact(cur, close) {
            Some(end) => Ok(Some((items, end))),
            None => Ok(None),
        }
    }

    fn array_literal(&self, pos: usize) -> ParseResult<Match> {
        self.memoized(Rule::ArrayLiteral, pos, |p| {
            Ok(p.expression_list(pos, "[", "]")?.map(|(items, end)| {
                (
                    p.node(Rule::ArrayLiteral, pos, end, NodeKind::ArrayLiteral { items }),
                    end,
                )
            }))
        })
    }

    fn object_key(&self, pos: usize) -> Option<(String, usize)> {
        self.scanner.string(pos).or_else(|| {
            self.scanner
                .identifier(pos)
                .map(|(ident, end)| (ident.to_owned(), end))
        })
    }

    fn object_property(&self, pos: usize) -> ParseResult<Option<((String, Rc<ParseNode>), usize)>> {
        let Some((key, key_end)) = self.object_key(pos) else {
            return Ok(None);
        };
        let Some(colon) = self.scanner.exact(self.scanner.skip_ws(key_end), ":") else {
            return Ok(None);
        };
        let Some((value, end)) = self.parse_expression(self.scanner.skip_ws(colon))? else {
            return Ok(None);
        };

        Ok(Some(((key, value), end)))
    }

    fn object_literal(&self, pos: usize) -> ParseResult<Match> {
        self.memoized(Rule::ObjectLiteral, pos, |p| {
            let Some(open) = p.scanner.exact(pos, "{") else {
                return Ok(None);
            };

            let mut properties = Vec::new();
            let mut cur = p.scanner.skip_ws(open);

            if let Some((prop, end)) = p.object_property(cur)? {
                properties.push(prop);
                cur = p.scanner.skip_ws(end);

                while let Some(comma) = p.scanner.exact(cur, ",") {
                    let Some((prop, end)) = p.object_property(p.scanner.skip_ws(comma))? else {
                        return Ok(None);
                    };
                    properties.push(prop);
                    cur = p.scanner.skip_ws(end);
                }
            }

            let Some(end) = p.scanner.exact(cur, "}") else {
                return Ok(None);
            };

            Ok(Some((
                p.node(
                    Rule::ObjectLiteral,
                    pos,
                    end,
                    NodeKind::ObjectLiteral { properties },
                ),
                end,
            )))
        })
    }

    fn term(&self, pos: usize) -> ParseResult<Match> {
        self.memoized(Rule::Term, pos, |p| {
            if let Some((b, end)) = p.scanner.boolean(pos) {
                return Ok(Some((
                    p.node(Rule::BooleanLiteral, pos, end, NodeKind::Boolean(b)),
                    end,
                )));
            }
            if let Some(m) = p.number_literal(pos) {
                return Ok(Some(m));
            }
            if let Some((s, end)) = p.scanner.string(pos) {
                return Ok(Some((
                    p.node(Rule::StringLiteral, pos, end, NodeKind::String(s)),
                    end,
                )));
            }
            p.object_path(pos)
        })
    }

    fn number_literal(&self, pos: usize) -> Match {
        let (text, end) = self.scanner.number(pos)?;

        let value = if text.contains('.') {
            NumberLiteral::Float(text.parse().ok()?)
        } else {
            match text.parse::<i64>() {
                Ok(i) => NumberLiteral::Int(i),
                Err(_) => NumberLiteral::Float(text.parse().ok()?),
            }
        };

        Some((
            self.node(Rule::NumberLiteral, pos, end, NodeKind::Number(value)),
            end,
        ))
    }

    fn identifier(&self, pos: usize) -> ParseResult<Match> {
        self.memoized(Rule::Identifier, pos, |p| {
            Ok(p.scanner.identifier(pos).map(|(ident, end)| {
                (
                    p.node(
                        Rule::Identifier,
                        pos,
                        end,
                        NodeKind::Identifier(ident.to_owned()),
                    ),
                    end,
                )
            }))
        })
    }

    fn method_call(&self, pos: usize) -> ParseResult<Option<(PathSegment, usize)>> {
        let Some((ident, ident_end)) = self.identifier(pos)? else {
            return Ok(None);
        };
        let NodeKind::Identifier(method) = ident.kind() else {
            return Ok(None);
        };

        Ok(self
            .expression_list(ident_end, "(", ")")?
            .map(|(arguments, end)| {
                (
                    PathSegment::Method {
                        method: method.clone(),
                        arguments,
                    },
                    end,
                )
            }))
    }

    /// `MethodCall | Identifier`, tried in that order.
    fn path_member(&self, pos: usize) -> ParseResult<Option<(PathSegment, usize)>> {
        if let Some(m) = self.method_call(pos)? {
            return Ok(Some(m));
        }

        Ok(self.identifier(pos)?.and_then(|(node, end)| match node.kind() {
            NodeKind::Identifier(ident) => Some((PathSegment::Property(ident.clone()), end)),
            _ => None,
        }))
    }

    fn object_path(&self, pos: usize) -> ParseResult<Match> {
        self.memoized(Rule::ObjectPath, pos, |p| {
            let Some((first, mut end)) = p.path_member(pos)? else {
                return Ok(None);
            };
            let mut segments = vec![first];

            loop {
                if let Some(dot) = p.scanner.exact(end, ".") {
                    if let Some((seg, seg_end)) = p.path_member(dot)? {
                        segments.push(seg);
                        end = seg_end;
                        continue;
                    }
                    break;
                }

                if let Some(open) = p.scanner.exact(end, "[") {
                    let Some((index, index_end)) = p.parse_expression(p.scanner.skip_ws(open))?
                    else {
                        break;
                    };
                    let Some(close) = p.scanner.exact(p.scanner.skip_ws(index_end), "]") else {
                        break;
                    };
                    segments.push(PathSegment::Offset(index));
                    end = close;
                    continue;
                }

                break;
            }

            Ok(Some((
                p.node(Rule::ObjectPath, pos, end, NodeKind::ObjectPath { segments }),
                end,
            )))
        })
    }
}

#[cfg(test)]
mod test {
    use super::{parse, CompOp, EelParser, NodeKind, NumberLiteral, PathSegment, Rule, SumOp};
    use test_case::test_case;

    #[test_case("3", NumberLiteral::Int(3); "int")]
    #[test_case("3.0", NumberLiteral::Float(3.0); "float")]
    #[test_case("-12", NumberLiteral::Int(-12); "negative")]
    #[test_case("99999999999999999999", NumberLiteral::Float(1e20); "overflowing int")]
    fn test_number_literals(input: &str, expected: NumberLiteral) {
        let node = parse(input).unwrap();

        assert_eq!(node.kind(), &NodeKind::Number(expected));
    }

    #[test]
    fn test_precedence() {
        let node = parse("2 + 3 * 4").unwrap();

        let NodeKind::Sum { op, lft, rgt } = node.kind() else {
            panic!("expected sum, got {:?}", node);
        };
        assert_eq!(*op, SumOp::Add);
        assert_eq!(lft.kind(), &NodeKind::Number(NumberLiteral::Int(2)));
        assert_eq!(rgt.rule(), Rule::ProdCalculation);
    }

    #[test]
    fn test_left_associative() {
        let node = parse("1 - 2 - 3").unwrap();

        let NodeKind::Sum { lft, rgt, .. } = node.kind() else {
            panic!("expected sum");
        };
        assert_eq!(lft.rule(), Rule::SumCalculation);
        assert_eq!(rgt.kind(), &NodeKind::Number(NumberLiteral::Int(3)));
        assert_eq!(node.span().len(), 9);
    }

    #[test]
    fn test_pass_through() {
        let node = parse("(foo)").unwrap();

        assert_eq!(node.rule(), Rule::ObjectPath);
        assert_eq!(node.span().start(), 1);
    }

    #[test]
    fn test_object_path_segments() {
        let node = parse("foo.bar[1 + 1].baz(1, 'a').qux").unwrap();

        let NodeKind::ObjectPath { segments } = node.kind() else {
            panic!("expected path");
        };
        assert_eq!(segments.len(), 5);
        assert_eq!(segments[0], PathSegment::Property("foo".to_owned()));
        assert!(matches!(segments[2], PathSegment::Offset(_)));
        assert!(
            matches!(&segments[3], PathSegment::Method { method, arguments } if method == "baz" && arguments.len() == 2)
        );
    }

    #[test]
    fn test_ternary_is_right_associative() {
        let node = parse("a ? b : c ? d : e").unwrap();

        let NodeKind::Conditional { else_, .. } = node.kind() else {
            panic!("expected conditional");
        };
        assert_eq!(else_.rule(), Rule::ConditionalExpression);
    }

    #[test]
    fn test_word_operators() {
        let node = parse("a or b and not c").unwrap();

        let NodeKind::Disjunction { rgt, .. } = node.kind() else {
            panic!("expected disjunction");
        };
        let NodeKind::Conjunction { rgt, .. } = rgt.kind() else {
            panic!("expected conjunction");
        };
        assert!(matches!(rgt.kind(), NodeKind::Not { .. }));
    }

    #[test]
    fn test_comparison() {
        let node = parse("a <= 1").unwrap();

        assert!(matches!(
            node.kind(),
            NodeKind::Comparison {
                op: CompOp::Le,
                ..
            }
        ));
    }

    #[test]
    fn test_literals() {
        let node = parse("{a: [1, 'x'], \"b c\": {}, d: []}").unwrap();

        let NodeKind::ObjectLiteral { properties } = node.kind() else {
            panic!("expected object literal");
        };
        let keys: Vec<&str> = properties.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "b c", "d"]);
        assert!(
            matches!(properties[0].1.kind(), NodeKind::ArrayLiteral { items } if items.len() == 2)
        );
    }

    #[test]
    fn test_boolean_word_boundary() {
        assert_eq!(parse("TRUE").unwrap().kind(), &NodeKind::Boolean(true));
        assert_eq!(
            parse("trueish").unwrap().kind(),
            &NodeKind::ObjectPath {
                segments: vec![PathSegment::Property("trueish".to_owned())]
            }
        );
    }

    #[test_case("1 + 2 extra", 6; "trailing input")]
    #[test_case("a < b < c", 6; "chained comparison")]
    #[test_case("1 +", 3; "dangling operator")]
    #[test_case("!", 1; "bang without operand")]
    #[test_case("foo(1,)", 6; "trailing comma")]
    #[test_case("", 0; "empty")]
    fn test_parse_errors(input: &str, offset: usize) {
        let err = parse(input).unwrap_err();

        assert_eq!(err.offset(), offset, "{}", err);
        assert!(err.message().is_some());
        assert_eq!(err.expression(), input);
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        let err = parse(&deep).unwrap_err();

        assert_eq!(err.message(), Some("Expression nesting too deep"));

        let shallow = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert!(parse(&shallow).is_ok());
    }

    #[test]
    fn test_not_chain_nesting_limit() {
        let deep = format!("{}true", "!".repeat(10_000));
        let err = parse(&deep).unwrap_err();

        assert_eq!(err.message(), Some("Expression nesting too deep"));

        let words = format!("{}true", "not ".repeat(10_000));
        assert!(parse(&words).is_err());

        let shallow = format!("{}true", "!".repeat(20));
        assert!(matches!(parse(&shallow).unwrap().kind(), NodeKind::Not { .. }));
    }

    #[test]
    fn test_memoization_reuses_identifier() {
        let parser = EelParser::with_input("foo.bar");
        let (_, end) = parser.parse_expression(0).unwrap().unwrap();

        assert_eq!(end, 7);
        assert!(parser.memo.borrow().hits() > 0);
        assert!(parser.memo_size() > 0);
    }
}
