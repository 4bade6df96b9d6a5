use std::collections::HashMap;

use crate::{
    interp::{ByteCode, JmpWhen},
    EelError, EelResult,
};

/// Bytecode with symbolic jump targets.
#[derive(Debug, Clone, PartialEq)]
pub enum PreResolvedCodePoint {
    Bytecode(ByteCode),
    Jmp { label: u32 },
    JmpCond { when: JmpWhen, label: u32 },
    Label(u32),
}

#[derive(Debug, Clone, Default)]
pub struct PreResolvedByteCode {
    inner: Vec<PreResolvedCodePoint>,
    len: usize,
}

impl From<ByteCode> for PreResolvedCodePoint {
    fn from(value: ByteCode) -> Self {
        PreResolvedCodePoint::Bytecode(value)
    }
}

impl PreResolvedByteCode {
    pub fn new() -> Self {
        PreResolvedByteCode::default()
    }

    pub fn push(&mut self, val: impl Into<PreResolvedCodePoint>) {
        let v = val.into();
        if !matches!(v, PreResolvedCodePoint::Label(_)) {
            self.len += 1;
        }
        self.inner.push(v);
    }

    pub fn append(&mut self, other: PreResolvedByteCode) {
        self.len += other.len;
        self.inner.extend(other.inner);
    }

    /// Number of instructions once labels are dropped.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Replaces labels with relative jump distances, measured from the instruction after
    /// the jump.
    pub fn resolve(self) -> EelResult<Vec<ByteCode>> {
        let mut curr_loc: usize = 0;
        let mut locations = HashMap::<u32, usize>::new();
        let mut ret = Vec::with_capacity(self.len);

        for c in self.inner.iter() {
            match c {
                PreResolvedCodePoint::Label(i) => {
                    if locations.insert(*i, curr_loc).is_some() {
                        return Err(EelError::Internal(format!("Duplicate label {}", i)));
                    }
                }
                _ => curr_loc += 1,
            }
        }

        let distance = |label: u32, from: usize| -> EelResult<i32> {
            let target = locations
                .get(&label)
                .ok_or_else(|| EelError::Internal(format!("Unknown label {}", label)))?;

            i32::try_from((*target as isize) - (from as isize))
                .map_err(|_| EelError::internal("Attempt to jump farther than possible"))
        };

        curr_loc = 0;

        for c in self.inner.into_iter() {
            match c {
                PreResolvedCodePoint::Bytecode(byte_code) => {
                    curr_loc += 1;
                    ret.push(byte_code);
                }
                PreResolvedCodePoint::Jmp { label } => {
                    curr_loc += 1;
                    ret.push(ByteCode::Jmp(distance(label, curr_loc)?));
                }
                PreResolvedCodePoint::JmpCond { when, label } => {
                    curr_loc += 1;
                    ret.push(ByteCode::JmpCond {
                        when,
                        dist: distance(label, curr_loc)?,
                    });
                }
                PreResolvedCodePoint::Label(_) => {}
            }
        }

        Ok(ret)
    }
}

impl FromIterator<PreResolvedCodePoint> for PreResolvedByteCode {
    fn from_iter<T: IntoIterator<Item = PreResolvedCodePoint>>(iter: T) -> Self {
        let mut code = PreResolvedByteCode::new();
        for code_point in iter {
            code.push(code_point);
        }
        code
    }
}

#[cfg(test)]
mod test {
    use super::{PreResolvedByteCode, PreResolvedCodePoint};
    use crate::{
        interp::{ByteCode, JmpWhen},
        EelError, EelValue,
    };

    #[test]
    fn test_basic() {
        let code: PreResolvedByteCode = [
            PreResolvedCodePoint::Label(0),
            PreResolvedCodePoint::Bytecode(ByteCode::Push(2.into())),
            PreResolvedCodePoint::Jmp { label: 0 },
        ]
        .into_iter()
        .collect();

        assert_eq!(code.len(), 2);

        let resolved = code.resolve().unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0], ByteCode::Push(EelValue::Int(2)));
        assert_eq!(resolved[1], ByteCode::Jmp(-2));
    }

    #[test]
    fn test_forward_jump() {
        let mut code = PreResolvedByteCode::new();
        code.push(ByteCode::Push(true.into()));
        code.push(PreResolvedCodePoint::JmpCond {
            when: JmpWhen::False,
            label: 1,
        });
        code.push(ByteCode::Push(1.into()));
        code.push(ByteCode::Push(2.into()));
        code.push(PreResolvedCodePoint::Label(1));

        let resolved = code.resolve().unwrap();
        assert_eq!(
            resolved[1],
            ByteCode::JmpCond {
                when: JmpWhen::False,
                dist: 2
            }
        );
    }

    #[test]
    fn test_dup_label_fails() {
        let code: PreResolvedByteCode = [
            PreResolvedCodePoint::Label(0),
            PreResolvedCodePoint::Bytecode(ByteCode::Push(2.into())),
            PreResolvedCodePoint::Jmp { label: 0 },
            PreResolvedCodePoint::Label(0),
        ]
        .into_iter()
        .collect();

        assert!(matches!(code.resolve(), Err(EelError::Internal(_))));
    }
}
