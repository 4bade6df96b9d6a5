use std::{collections::HashMap, rc::Rc};

use super::grammar::{ParseNode, Rule};

/// Result of one rule application at one offset.
#[derive(Debug, Clone)]
pub enum MemoEntry {
    Success { node: Rc<ParseNode>, end: usize },
    Failure,
}

/// Packrat memo table, `(rule, offset) -> result`, scoped to a single parse.
#[derive(Debug, Default)]
pub struct MemoTable {
    entries: HashMap<(Rule, usize), MemoEntry>,
    hits: usize,
}

impl MemoTable {
    pub fn new() -> MemoTable {
        MemoTable::default()
    }

    pub fn get(&mut self, rule: Rule, pos: usize) -> Option<MemoEntry> {
        let entry = self.entries.get(&(rule, pos)).cloned();
        if entry.is_some() {
            self.hits += 1;
        }
        entry
    }

    pub fn set(&mut self, rule: Rule, pos: usize, entry: MemoEntry) {
        self.entries.insert((rule, pos), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use super::{MemoEntry, MemoTable};
    use crate::parser::grammar::{NodeKind, ParseNode, Rule, Span};

    #[test]
    fn test_memo_table() {
        let mut table = MemoTable::new();
        let node = Rc::new(ParseNode::new(
            Rule::Identifier,
            Span::new(0, 3),
            NodeKind::Identifier("foo".to_owned()),
        ));

        assert!(table.get(Rule::Identifier, 0).is_none());

        table.set(Rule::Identifier, 0, MemoEntry::Success { node, end: 3 });
        table.set(Rule::Identifier, 4, MemoEntry::Failure);

        assert!(matches!(
            table.get(Rule::Identifier, 0),
            Some(MemoEntry::Success { end: 3, .. })
        ));
        assert!(matches!(
            table.get(Rule::Identifier, 4),
            Some(MemoEntry::Failure)
        ));
        assert_eq!(table.len(), 2);
        assert_eq!(table.hits(), 2);
    }
}
