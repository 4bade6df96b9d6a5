use serde::{Deserialize, Serialize};

/// Zero based line and column (in characters) of a byte offset in an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation(usize, usize);

impl SourceLocation {
    pub fn new(line: usize, col: usize) -> SourceLocation {
        SourceLocation(line, col)
    }

    pub fn from_offset(text: &str, offset: usize) -> SourceLocation {
        let mut offset = offset.min(text.len());
        while !text.is_char_boundary(offset) {
            offset -= 1;
        }

        let before = &text[..offset];
        let line = before.matches('\n').count();
        let col = match before.rfind('\n') {
            Some(nl) => before[nl + 1..].chars().count(),
            None => before.chars().count(),
        };

        SourceLocation(line, col)
    }

    pub fn line(&self) -> usize {
        self.0
    }

    pub fn col(&self) -> usize {
        self.1
    }
}

#[cfg(test)]
mod test {
    use super::SourceLocation;

    #[test]
    fn test_source_location() {
        let loc1 = SourceLocation(0, 1);
        let loc2 = SourceLocation(1, 1);

        assert!(loc1 < loc2);
        assert_eq!(loc1.line(), 0);
        assert_eq!(loc1.col(), 1);
    }

    #[test]
    fn test_from_offset() {
        let text = "a +\n  bé + c";

        assert_eq!(SourceLocation::from_offset(text, 0), SourceLocation::new(0, 0));
        assert_eq!(SourceLocation::from_offset(text, 2), SourceLocation::new(0, 2));
        assert_eq!(SourceLocation::from_offset(text, 6), SourceLocation::new(1, 2));
        // 'é' is two bytes wide
        assert_eq!(SourceLocation::from_offset(text, 9), SourceLocation::new(1, 4));
        assert_eq!(SourceLocation::from_offset(text, 100), SourceLocation::new(1, 8));
    }
}
