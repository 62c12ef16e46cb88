//! Host value system contract.
//!
//! Only the part of the interpreter's value model this plugin touches lives
//! here: the value kinds it validates against, hash lookups for settings,
//! function values crossing into native code, and the two collaborator
//! traits (`Evaluator`, `NativePlugin`).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 인터프리터 값 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    Array,
    Hash,
    Function,
    Error,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "NULL",
            Self::Boolean => "BOOLEAN",
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::String => "STRING",
            Self::Array => "ARRAY",
            Self::Hash => "HASH",
            Self::Function => "FUNCTION",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// A value as the interpreter sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Object>),
    Hash(Hash),
    Function(Function),
    Error(String),
}

impl Object {
    pub fn object_type(&self) -> ObjectType {
        match self {
            Self::Null => ObjectType::Null,
            Self::Boolean(_) => ObjectType::Boolean,
            Self::Integer(_) => ObjectType::Integer,
            Self::Float(_) => ObjectType::Float,
            Self::String(_) => ObjectType::String,
            Self::Array(_) => ObjectType::Array,
            Self::Hash(_) => ObjectType::Hash,
            Self::Function(_) => ObjectType::Function,
            Self::Error(_) => ObjectType::Error,
        }
    }

    /// Script-visible rendering. Strings render without quotes.
    pub fn inspect(&self) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => s.clone(),
            Self::Array(items) => {
                let inner: Vec<String> = items.iter().map(Object::inspect).collect();
                format!("[{}]", inner.join(", "))
            }
            Self::Hash(hash) => hash.inspect(),
            Self::Function(func) => format!("fn({}) {{ {} }}", func.parameters.join(", "), func.body.source()),
            Self::Error(message) => format!("ERROR: {}", message),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<&str> for Object {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Hashable key. Only strings, integers and booleans can key a hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    String(String),
    Integer(i64),
    Boolean(bool),
}

impl HashKey {
    pub fn from_object(object: &Object) -> Option<Self> {
        match object {
            Object::String(s) => Some(Self::String(s.clone())),
            Object::Integer(i) => Some(Self::Integer(*i)),
            Object::Boolean(b) => Some(Self::Boolean(*b)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: Object,
    pub value: Object,
}

/// Key-value mapping value (`{"port": 9091}` in script).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hash {
    pairs: HashMap<HashKey, HashPair>,
}

impl Hash {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a pair; returns `false` when the key kind is not hashable.
    pub fn insert(&mut self, key: Object, value: Object) -> bool {
        match HashKey::from_object(&key) {
            Some(hash_key) => {
                self.pairs.insert(hash_key, HashPair { key, value });
                true
            }
            None => false,
        }
    }

    pub fn get(&self, key: &HashKey) -> Option<&Object> {
        self.pairs.get(key).map(|pair| &pair.value)
    }

    pub fn get_str(&self, key: &str) -> Option<&Object> {
        self.get(&HashKey::String(key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn inspect(&self) -> String {
        let mut entries: Vec<String> = self
            .pairs
            .values()
            .map(|pair| format!("{}: {}", pair.key.inspect(), pair.value.inspect()))
            .collect();
        entries.sort();
        format!("{{{}}}", entries.join(", "))
    }
}

impl<K: Into<Object>, V: Into<Object>> FromIterator<(K, V)> for Hash {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut hash = Hash::new();
        for (key, value) in iter {
            hash.insert(key.into(), value.into());
        }
        hash
    }
}

/// Handle to a function body's script source.
///
/// The body is opaque to native code; only the evaluator knows how to run it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionBody(Arc<str>);

impl FunctionBody {
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        Self(source.into())
    }

    pub fn source(&self) -> &str {
        &self.0
    }
}

/// Function literal as a first-class value.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub parameters: Vec<String>,
    pub body: FunctionBody,
}

impl Function {
    pub fn new(parameters: Vec<String>, body: impl Into<Arc<str>>) -> Self {
        Self {
            parameters,
            body: FunctionBody::new(body),
        }
    }
}

/// Variable bindings a body is evaluated against.
#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Object>,
}

impl Environment {
    /// Fresh, empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Object> {
        self.store.get(name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Object) {
        self.store.insert(name.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

/// The interpreter's evaluator, seen from native code.
///
/// Implementations may block; callers run them off the async workers.
pub trait Evaluator: Send + Sync + 'static {
    fn eval(&self, body: &FunctionBody, env: &mut Environment) -> Object;
}

/// Uniform shape every native plugin exposes to scripts.
pub trait NativePlugin: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn inspect(&self) -> String;

    /// Dispatches `method` by name. Failures come back as `Object::Error`.
    fn call(&self, method: &str, args: &[Object]) -> Object;
}
