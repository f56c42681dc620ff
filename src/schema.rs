//! Static descriptions of how a domain type maps onto CBOR.
//!
//! A [`TypeSpec`] is pure data: it is produced once per type by
//! [`CborSchema::describe`](crate::registry::CborSchema::describe), validated and then
//! shared immutably through the [registry](crate::registry).

use serde::Serialize;
use std::fmt;

/// The CBOR item kinds a decoder can observe with a peek.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WireType {
    UInt,
    SInt,
    Bool,
    Text,
    Bytes,
    Float,
    Array,
    Map,
    Tag,
    Null,
    /// `undefined` and unassigned simple values.
    Simple,
    /// The `0xFF` break terminating an indefinite-length item.
    Break,
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The encoding shape of a schema type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    /// Keyed fields, one `key => value` pair per field.
    Map,
    /// Fixed-arity ordered fields.
    Array,
    /// Plutus constructor: `tag(121 + i | 1280 + i - 7) [fields...]`.
    Constr,
    /// Closed set of alternative variants, resolved on decode.
    Union,
    /// A map or array record with null semantics; the map shape writes absent
    /// fields as explicit `null`.
    Nullable,
    /// Single-field wrapper, encoded exactly as its inner field.
    Container,
}

/// Wire key of a field: a position (array/constr) or a map key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum WireKey {
    Int(i64),
    Text(&'static str),
}

impl fmt::Display for WireKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WireKey::Int(i) => write!(f, "{i}"),
            WireKey::Text(s) => write!(f, "\"{s}\""),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    /// Rust field name, used in error messages.
    pub name: &'static str,
    /// `None` for positional fields that follow declaration order.
    pub key: Option<WireKey>,
    /// Nullable fields may be absent; they are skipped or written as null.
    pub nullable: bool,
    /// Name of the field's own type, for diagnostics.
    pub type_name: &'static str,
}

impl FieldSpec {
    pub fn new(name: &'static str, type_name: &'static str, nullable: bool) -> Self {
        FieldSpec {
            name,
            key: None,
            nullable,
            type_name,
        }
    }

    pub fn with_key(mut self, key: WireKey) -> Self {
        self.key = Some(key);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeSpec {
    pub name: &'static str,
    pub category: Category,
    /// For [`Category::Nullable`], the record shape being wrapped (`Map` or `Array`).
    pub inner: Option<Category>,
    /// Explicit CBOR tag written before the item (e.g. 30, 258).
    pub tag: Option<u64>,
    pub constructor_index: Option<u64>,
    /// Definite-length framing for arrays and maps.
    pub definite: bool,
    pub fields: Vec<FieldSpec>,
    /// Variant names in resolution order, for unions.
    pub variants: Vec<&'static str>,
}

impl TypeSpec {
    pub fn new(name: &'static str, category: Category) -> Self {
        TypeSpec {
            name,
            category,
            inner: None,
            tag: None,
            constructor_index: None,
            definite: true,
            fields: Vec::new(),
            variants: Vec::new(),
        }
    }

    // Option setters, called by name from the `[name = value]` macro headers.

    pub fn tag(mut self, tag: u64) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn index(mut self, index: u64) -> Self {
        self.constructor_index = Some(index);
        self
    }

    /// Turns a map or array record into a nullable one that writes absent fields as `null`.
    pub fn nullable(mut self) -> Self {
        self.inner = Some(self.category);
        self.category = Category::Nullable;
        self
    }

    pub fn with_inner(mut self, inner: Category) -> Self {
        self.inner = Some(inner);
        self
    }

    pub fn indefinite(mut self) -> Self {
        self.definite = false;
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn variant(mut self, name: &'static str) -> Self {
        self.variants.push(name);
        self
    }

    /// The category that decides framing: the wrapped shape for nullable records.
    pub fn shape(&self) -> Category {
        match (self.category, self.inner) {
            (Category::Nullable, Some(inner)) => inner,
            (category, _) => category,
        }
    }

    /// Whether absent fields are written as explicit nulls.
    ///
    /// Only nullable map records do this; array records always drop absent fields.
    pub fn writes_nulls(&self) -> bool {
        self.category == Category::Nullable && self.inner == Some(Category::Map)
    }

    /// The tag that must lead an encoded value of this type, if any.
    pub fn leading_tag(&self) -> Option<u64> {
        match (self.category, self.constructor_index) {
            (Category::Constr, Some(index)) => Some(crate::constr::resolve_tag(index)),
            _ => self.tag,
        }
    }

    /// Field indices in wire order.
    ///
    /// Positional fields keep declaration order; index-mapped fields are sorted by
    /// their explicit position, whatever order they were declared in.
    pub fn wire_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.fields.len()).collect();
        if self.fields.iter().all(|f| f.key.is_some()) {
            order.sort_by_key(|&i| match &self.fields[i].key {
                Some(WireKey::Int(position)) => *position,
                _ => i64::MAX,
            });
        }
        order
    }

    /// Index of the field carrying `key`, for map records.
    pub fn field_by_key(&self, key: &WireKey) -> Option<usize> {
        self.fields.iter().position(|f| f.key.as_ref() == Some(key))
    }

    /// Checks the structural invariants of the description.
    pub fn validate(&self) -> Result<(), String> {
        match self.category {
            Category::Constr if self.constructor_index.is_none() => {
                return Err("constr type without a constructor index".into());
            }
            Category::Union if self.variants.is_empty() => {
                return Err("union type without variants".into());
            }
            Category::Union if !self.fields.is_empty() => {
                return Err("union type with own fields".into());
            }
            Category::Container if self.fields.len() != 1 => {
                return Err(format!(
                    "container type must wrap exactly one field, found {}",
                    self.fields.len()
                ));
            }
            Category::Nullable if !matches!(self.inner, Some(Category::Map | Category::Array)) => {
                return Err("nullable record must wrap a map or array shape".into());
            }
            _ => {}
        }
        if self.category != Category::Nullable && self.inner.is_some() {
            return Err("only nullable records wrap an inner shape".into());
        }

        if self.shape() == Category::Map {
            if let Some(field) = self.fields.iter().find(|f| f.key.is_none()) {
                return Err(format!("map field `{}` has no key", field.name));
            }
        }

        let keyed = self.fields.iter().filter(|f| f.key.is_some()).count();
        if keyed != 0 && keyed != self.fields.len() {
            return Err("fields mix explicit keys and declaration order".into());
        }
        for (i, field) in self.fields.iter().enumerate() {
            if let Some(key) = &field.key {
                if self.fields[..i].iter().any(|f| f.key.as_ref() == Some(key)) {
                    return Err(format!("duplicate wire key {key}"));
                }
            }
        }
        Ok(())
    }
}
