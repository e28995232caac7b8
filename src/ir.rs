// Owned type tree the renderer walks. No serde_json::Value here.
use indexmap::IndexMap;

#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    Record(Record),          // inline record, expanded where it appears
    Named(String),           // reference into a `Registry` (may be recursive)
    List(Box<Ty>),
    Union(Vec<Ty>),          // member order is kept; `Null` members are dropped at render time
    Null,                    // the none/null alternative
    Primitive(String),       // display name, rendered verbatim
    Other(String),           // anything outside the shape vocabulary; rendered as text
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub name: Option<String>,
    pub fields: Vec<Field>,  // declaration order, never reordered
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Ty,
}

/// Named record definitions, in definition order.
///
/// `Ty::Named` points in here; this is also the only way to build a
/// self-referential type.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    records: IndexMap<String, Record>,
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

impl Ty {
    pub fn primitive(name: impl Into<String>) -> Self {
        Ty::Primitive(name.into())
    }
    pub fn named(name: impl Into<String>) -> Self {
        Ty::Named(name.into())
    }
    pub fn other(text: impl Into<String>) -> Self {
        Ty::Other(text.into())
    }
    pub fn list(item: Ty) -> Self {
        Ty::List(Box::new(item))
    }
    pub fn union(members: impl IntoIterator<Item = Ty>) -> Self {
        Ty::Union(members.into_iter().collect())
    }
    /// `Union[T, None]`
    pub fn optional(inner: Ty) -> Self {
        Ty::Union(vec![inner, Ty::Null])
    }
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), fields: Vec::new() }
    }
    /// Builder-style field append.
    pub fn field(mut self, name: impl Into<String>, ty: Ty) -> Self {
        self.push(name, ty);
        self
    }
    pub fn push(&mut self, name: impl Into<String>, ty: Ty) {
        self.fields.push(Field { name: name.into(), ty });
    }
}

impl From<Record> for Ty {
    fn from(record: Record) -> Self {
        Ty::Record(record)
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a named definition. The record's own `name` is
    /// set to `name`. Returns a `Ty::Named` handle to it.
    pub fn define(&mut self, name: impl Into<String>, mut record: Record) -> Ty {
        let name = name.into();
        record.name = Some(name.clone());
        self.records.insert(name.clone(), record);
        Ty::Named(name)
    }

    /// Reserve a name before its fields are known, so that fields can refer
    /// back to it. Returns `false` if the name was already present.
    pub fn declare(&mut self, name: &str) -> bool {
        if self.records.contains_key(name) {
            return false;
        }
        self.records.insert(name.to_string(), Record::named(name));
        true
    }

    pub fn get(&self, name: &str) -> Option<&Record> {
        self.records.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
