//! The BSON tree: the typed object/array/property graph a parse produces,
//! plus the scalar/vector/object accessors and builders from spec §4.3.

use std::fmt;

/// Whether an [`Object`]'s properties are named (`object`) or positional
/// (`array`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Properties carry a name; order is not significant.
    Object,
    /// Properties carry no name; order is significant.
    Array,
}

/// The union of value kinds a [`Property`] can hold (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Signed 64-bit integer.
    Int(i64),
    /// 32-bit float.
    Float(f32),
    /// A heap-owned string.
    String(String),
    /// A boolean.
    Bool(bool),
    /// A nested object or array.
    Object(Object),
}

/// One property of an [`Object`]: a name (or `None` for array elements) and
/// a typed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// The property's name, or `None` if it is an unnamed array element.
    pub name: Option<String>,
    /// The property's value.
    pub value: Value,
}

/// A BSON object: either object-kind (named properties) or array-kind
/// (positional properties), per spec §3.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    /// Whether this is an object or an array.
    pub kind: ObjectKind,
    /// The object's properties, in source order.
    pub properties: Vec<Property>,
}

/// Error returned by a tree accessor: value missing, wrong type, or index
/// out of range. Spec §4.3: out-of-range/missing/type-mismatched reads
/// return failure without mutating the caller's previous value except to
/// zero it, which in Rust terms means: return `Err`, touch nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    /// No property by that name/index exists.
    Missing,
    /// The property exists but isn't the requested kind (and no automatic
    /// conversion applies).
    WrongType,
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessError::Missing => write!(f, "property missing"),
            AccessError::WrongType => write!(f, "property has the wrong type"),
        }
    }
}
impl std::error::Error for AccessError {}

/// A tiny 2-float vector, used only for the vec2 accessor's text format.
pub type Vec2 = [f32; 2];
/// A tiny 3-float vector.
pub type Vec3 = [f32; 3];
/// A tiny 4-float vector.
pub type Vec4 = [f32; 4];
/// A 4x4 matrix stored row-major.
pub type Mat4 = [f32; 16];

fn format_floats(values: &[f32]) -> String {
    values
        .iter()
        .map(|v| crate::bson::writer::format_number(*v as f64, true))
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_floats<const N: usize>(text: &str) -> Option<[f32; N]> {
    let mut out = [0.0f32; N];
    let mut count = 0;
    for piece in text.split_whitespace() {
        if count >= N {
            return None;
        }
        out[count] = piece.parse().ok()?;
        count += 1;
    }
    if count == N {
        Some(out)
    } else {
        None
    }
}

impl Object {
    /// Build an empty object-kind object.
    pub fn new_object() -> Self {
        Object {
            kind: ObjectKind::Object,
            properties: Vec::new(),
        }
    }

    /// Build an empty array-kind object.
    pub fn new_array() -> Self {
        Object {
            kind: ObjectKind::Array,
            properties: Vec::new(),
        }
    }

    /// Number of elements/properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether there are no elements/properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    fn find(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.name.as_deref() == Some(name))
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties
            .iter_mut()
            .find(|p| p.name.as_deref() == Some(name))
    }

    // -- scalar getters (by name, on an object) --------------------------

    /// Get an `int` property by name, with int<->bool/int<->float coercion.
    pub fn get_int(&self, name: &str) -> Result<i64, AccessError> {
        match &self.find(name).ok_or(AccessError::Missing)?.value {
            Value::Int(i) => Ok(*i),
            Value::Bool(b) => Ok(*b as i64),
            Value::Float(f) => Ok(*f as i64),
            _ => Err(AccessError::WrongType),
        }
    }

    /// Get a `float` property by name, with int<->float coercion.
    pub fn get_float(&self, name: &str) -> Result<f32, AccessError> {
        match &self.find(name).ok_or(AccessError::Missing)?.value {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f32),
            _ => Err(AccessError::WrongType),
        }
    }

    /// Get a `bool` property by name, with int<->bool coercion (nonzero is
    /// `true`).
    pub fn get_bool(&self, name: &str) -> Result<bool, AccessError> {
        match &self.find(name).ok_or(AccessError::Missing)?.value {
            Value::Bool(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            _ => Err(AccessError::WrongType),
        }
    }

    /// Get a `string` property by name.
    pub fn get_string(&self, name: &str) -> Result<&str, AccessError> {
        match &self.find(name).ok_or(AccessError::Missing)?.value {
            Value::String(s) => Ok(s.as_str()),
            _ => Err(AccessError::WrongType),
        }
    }

    /// Get a nested object/array property by name.
    pub fn get_object(&self, name: &str) -> Result<&Object, AccessError> {
        match &self.find(name).ok_or(AccessError::Missing)?.value {
            Value::Object(o) => Ok(o),
            _ => Err(AccessError::WrongType),
        }
    }

    /// Get a `vec2` property (stored as a formatted string) by name.
    pub fn get_vec2(&self, name: &str) -> Result<Vec2, AccessError> {
        parse_floats(self.get_string(name)?).ok_or(AccessError::WrongType)
    }

    /// Get a `vec3` property (stored as a formatted string) by name.
    pub fn get_vec3(&self, name: &str) -> Result<Vec3, AccessError> {
        parse_floats(self.get_string(name)?).ok_or(AccessError::WrongType)
    }

    /// Get a `vec4` property (stored as a formatted string) by name.
    pub fn get_vec4(&self, name: &str) -> Result<Vec4, AccessError> {
        parse_floats(self.get_string(name)?).ok_or(AccessError::WrongType)
    }

    /// Get a `mat4` property (stored as a formatted string) by name.
    pub fn get_mat4(&self, name: &str) -> Result<Mat4, AccessError> {
        parse_floats(self.get_string(name)?).ok_or(AccessError::WrongType)
    }

    /// Get a `name` property, read back as its interned text.
    pub fn get_name(&self, name: &str) -> Result<crate::name::Name, AccessError> {
        Ok(crate::name::Name::new(self.get_string(name)?))
    }

    /// Get a `string-id` property, read back as its interned text.
    pub fn get_string_id(&self, name: &str) -> Result<crate::name::StringId, AccessError> {
        Ok(crate::name::StringId::new(self.get_string(name)?))
    }

    // -- indexed getters (by position, on an array) ----------------------

    fn at(&self, index: usize) -> Result<&Property, AccessError> {
        self.properties.get(index).ok_or(AccessError::Missing)
    }

    /// Get an `int` element by index.
    pub fn get_int_at(&self, index: usize) -> Result<i64, AccessError> {
        match &self.at(index)?.value {
            Value::Int(i) => Ok(*i),
            Value::Bool(b) => Ok(*b as i64),
            Value::Float(f) => Ok(*f as i64),
            _ => Err(AccessError::WrongType),
        }
    }

    /// Get a `float` element by index.
    pub fn get_float_at(&self, index: usize) -> Result<f32, AccessError> {
        match &self.at(index)?.value {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f32),
            _ => Err(AccessError::WrongType),
        }
    }

    /// Get a `string` element by index.
    pub fn get_string_at(&self, index: usize) -> Result<&str, AccessError> {
        match &self.at(index)?.value {
            Value::String(s) => Ok(s.as_str()),
            _ => Err(AccessError::WrongType),
        }
    }

    /// Get a nested object/array element by index.
    pub fn get_object_at(&self, index: usize) -> Result<&Object, AccessError> {
        match &self.at(index)?.value {
            Value::Object(o) => Ok(o),
            _ => Err(AccessError::WrongType),
        }
    }

    /// Iterate this object's elements as a slice of values (useful for
    /// array-kind objects whose elements are all the same kind).
    pub fn elements(&self) -> impl Iterator<Item = &Value> {
        self.properties.iter().map(|p| &p.value)
    }

    // -- builders ----------------------------------------------------------

    fn upsert(&mut self, name: Option<String>, value: Value) {
        if let Some(n) = &name {
            if let Some(existing) = self.find_mut(n) {
                tracing::trace!(property = %n, "replacing existing property");
                existing.value = value;
                return;
            }
        }
        self.properties.push(Property { name, value });
    }

    /// Set (or append, for arrays) an `int` property.
    pub fn set_int(&mut self, name: Option<&str>, value: i64) {
        self.upsert(name.map(String::from), Value::Int(value));
    }

    /// Set (or append) a `float` property.
    pub fn set_float(&mut self, name: Option<&str>, value: f32) {
        self.upsert(name.map(String::from), Value::Float(value));
    }

    /// Set (or append) a `bool` property.
    pub fn set_bool(&mut self, name: Option<&str>, value: bool) {
        self.upsert(name.map(String::from), Value::Bool(value));
    }

    /// Set (or append) a `string` property.
    pub fn set_string(&mut self, name: Option<&str>, value: impl Into<String>) {
        self.upsert(name.map(String::from), Value::String(value.into()));
    }

    /// Set (or append) a `vec3` property as a formatted string.
    pub fn set_vec3(&mut self, name: Option<&str>, value: Vec3) {
        self.set_string(name, format_floats(&value));
    }

    /// Set (or append) a `vec4` property as a formatted string.
    pub fn set_vec4(&mut self, name: Option<&str>, value: Vec4) {
        self.set_string(name, format_floats(&value));
    }

    /// Set (or append) a `mat4` property as a formatted string.
    pub fn set_mat4(&mut self, name: Option<&str>, value: Mat4) {
        self.set_string(name, format_floats(&value));
    }

    /// Set (or append) a nested object/array property.
    pub fn set_object(&mut self, name: Option<&str>, value: Object) {
        self.upsert(name.map(String::from), Value::Object(value));
    }
}

/// A parsed BSON document: a tree whose root is always object-kind (spec
/// §4.2 contract).
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    /// The root object.
    pub root: Object,
}

impl Tree {
    /// Build an empty tree (empty object-kind root).
    pub fn new() -> Self {
        Tree {
            root: Object::new_object(),
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
