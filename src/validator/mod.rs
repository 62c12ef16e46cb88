//! 인자 개수·타입 검증 모듈
//!
//! - `ArgSpec`: 메서드가 받는 인자의 선언적 제약 (정확한 개수 + 위치별 타입)
//! - `check`: 제약에 맞지 않으면 `ValidationError`를 반환합니다. 개수를 먼저 검사합니다.
//! - `expect_*`: 범용 `Object`에서 타입이 지정된 값을 꺼냅니다.
//!
//! Every dispatched plugin method validates through here so the error text
//! is uniform across `listen`, `handle` and construction.

use crate::object::{Function, Hash, Object, ObjectType};

/// 인자 검증 실패
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{name}: wrong number of arguments. got={got}, want={want}")]
    WrongCount {
        name: String,
        got: usize,
        want: usize,
    },

    #[error("{name}: argument #{position} should be {expected}, got={actual}")]
    TypeMismatch {
        name: String,
        /// 1-based
        position: usize,
        expected: ObjectType,
        actual: ObjectType,
    },

    #[error("{name}: argument #{position} must not be empty")]
    EmptyArgument { name: String, position: usize },
}

/// Declarative constraint over a positional argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    count: usize,
    types: Vec<ObjectType>,
}

impl ArgSpec {
    pub fn exact(count: usize) -> Self {
        Self {
            count,
            types: Vec::new(),
        }
    }

    /// Allowed type per position. Positions past the list are unconstrained.
    pub fn with_types(mut self, types: &[ObjectType]) -> Self {
        self.types = types.to_vec();
        self
    }
}

/// `args`를 `spec`에 대해 검증합니다.
///
/// # Returns
/// * `Ok(())` - 유효한 인자
/// * `Err(ValidationError)` - 개수 불일치(우선) 또는 타입 불일치
pub fn check(name: &str, args: &[Object], spec: &ArgSpec) -> Result<(), ValidationError> {
    if args.len() != spec.count {
        return Err(ValidationError::WrongCount {
            name: name.to_string(),
            got: args.len(),
            want: spec.count,
        });
    }

    for (index, (arg, expected)) in args.iter().zip(spec.types.iter()).enumerate() {
        let actual = arg.object_type();
        if actual != *expected {
            return Err(ValidationError::TypeMismatch {
                name: name.to_string(),
                position: index + 1,
                expected: *expected,
                actual,
            });
        }
    }

    Ok(())
}

fn mismatch(name: &str, position: usize, expected: ObjectType, value: &Object) -> ValidationError {
    ValidationError::TypeMismatch {
        name: name.to_string(),
        position,
        expected,
        actual: value.object_type(),
    }
}

pub fn expect_str<'a>(name: &str, position: usize, value: &'a Object) -> Result<&'a str, ValidationError> {
    match value {
        Object::String(s) => Ok(s.as_str()),
        other => Err(mismatch(name, position, ObjectType::String, other)),
    }
}

/// Like `expect_str`, additionally rejecting `""`.
pub fn expect_non_empty_str<'a>(
    name: &str,
    position: usize,
    value: &'a Object,
) -> Result<&'a str, ValidationError> {
    let s = expect_str(name, position, value)?;
    if s.is_empty() {
        return Err(ValidationError::EmptyArgument {
            name: name.to_string(),
            position,
        });
    }
    Ok(s)
}

pub fn expect_function<'a>(
    name: &str,
    position: usize,
    value: &'a Object,
) -> Result<&'a Function, ValidationError> {
    match value {
        Object::Function(func) => Ok(func),
        other => Err(mismatch(name, position, ObjectType::Function, other)),
    }
}

pub fn expect_hash<'a>(name: &str, position: usize, value: &'a Object) -> Result<&'a Hash, ValidationError> {
    match value {
        Object::Hash(hash) => Ok(hash),
        other => Err(mismatch(name, position, ObjectType::Hash, other)),
    }
}
