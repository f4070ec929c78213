use std::fmt;

use crate::{BOOLEAN_TYPE, NUMBER_TYPE, OBJECT_TYPE, REG_EXP_TYPE, STRING_TYPE};

/// The types a literal can evaluate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveTy {
    Boolean,
    Number,
    Object,
    RegExp,
    String,
}

impl PrimitiveTy {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveTy::Boolean => BOOLEAN_TYPE,
            PrimitiveTy::Number => NUMBER_TYPE,
            PrimitiveTy::Object => OBJECT_TYPE,
            PrimitiveTy::RegExp => REG_EXP_TYPE,
            PrimitiveTy::String => STRING_TYPE,
        }
    }
}

impl fmt::Display for PrimitiveTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl AsRef<str> for PrimitiveTy {
    fn as_ref(&self) -> &str {
        self.name()
    }
}
