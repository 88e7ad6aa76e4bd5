/// Hash static type representation.
///
/// Types are value objects: two types are equal iff their tags (and, for the
/// reserved compound constructors, their components) are equal. The compound
/// constructors exist so the data model matches the language surface the
/// grammar reserves, but nothing in the current front end produces them.
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
    Void,
    Str,
    // Reserved constructors, unused by the current front end
    Pointer(Box<Type>),
    Array(Box<Type>, Option<usize>),
    Struct(String),
    Function(Vec<Type>, Box<Type>),
}

impl Type {
    pub fn display(&self) -> String {
        match self {
            Type::I8 => "i8".to_string(),
            Type::I16 => "i16".to_string(),
            Type::I32 => "i32".to_string(),
            Type::I64 => "i64".to_string(),
            Type::U8 => "u8".to_string(),
            Type::U16 => "u16".to_string(),
            Type::U32 => "u32".to_string(),
            Type::U64 => "u64".to_string(),
            Type::F32 => "f32".to_string(),
            Type::F64 => "f64".to_string(),
            Type::Bool => "bool".to_string(),
            Type::Void => "void".to_string(),
            Type::Str => "str".to_string(),
            Type::Pointer(inner) => format!("*{}", inner.display()),
            Type::Array(inner, Some(n)) => format!("[{}; {}]", inner.display(), n),
            Type::Array(inner, None) => format!("[{}]", inner.display()),
            Type::Struct(name) => name.clone(),
            Type::Function(params, ret) => {
                let ps: Vec<String> = params.iter().map(|p| p.display()).collect();
                format!("fn({}) -> {}", ps.join(", "), ret.display())
            }
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::F32 | Type::F64)
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Type::I8
                | Type::I16
                | Type::I32
                | Type::I64
                | Type::U8
                | Type::U16
                | Type::U32
                | Type::U64
        )
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Result type of a mixed-type arithmetic expression.
///
/// Equal types produce themselves. Otherwise `f64` wins over everything,
/// `f32` over the integers, and any remaining mixed-integer pair widens to
/// `i64`. There is no implicit narrowing; the analyzer reports mismatches
/// where exact equality is required.
pub fn common_type(a: &Type, b: &Type) -> Type {
    if a == b {
        return a.clone();
    }
    if matches!(a, Type::F64) || matches!(b, Type::F64) {
        return Type::F64;
    }
    if matches!(a, Type::F32) || matches!(b, Type::F32) {
        return Type::F32;
    }
    Type::I64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_types_produce_themselves() {
        assert_eq!(common_type(&Type::I32, &Type::I32), Type::I32);
        assert_eq!(common_type(&Type::F64, &Type::F64), Type::F64);
        assert_eq!(common_type(&Type::Bool, &Type::Bool), Type::Bool);
    }

    #[test]
    fn f64_wins_over_everything() {
        assert_eq!(common_type(&Type::I32, &Type::F64), Type::F64);
        assert_eq!(common_type(&Type::F64, &Type::I64), Type::F64);
        assert_eq!(common_type(&Type::F32, &Type::F64), Type::F64);
    }

    #[test]
    fn f32_wins_over_integers() {
        assert_eq!(common_type(&Type::F32, &Type::I32), Type::F32);
        assert_eq!(common_type(&Type::U8, &Type::F32), Type::F32);
    }

    #[test]
    fn mixed_integers_widen_to_i64() {
        assert_eq!(common_type(&Type::I32, &Type::I64), Type::I64);
        assert_eq!(common_type(&Type::I8, &Type::U16), Type::I64);
        assert_eq!(common_type(&Type::U32, &Type::I32), Type::I64);
    }

    #[test]
    fn equality_is_by_tag() {
        assert_eq!(Type::I32, Type::I32);
        assert_ne!(Type::I32, Type::U32);
        assert_ne!(Type::F32, Type::F64);
    }
}
