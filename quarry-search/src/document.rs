//! Document trait and schema descriptors.
//!
//! A [`Schema`] is derived once per document type. It records which body
//! fields to request from the engine and which struct fields receive
//! engine-assigned metadata instead of stored content.

use crate::error::{Result, SearchError};
use serde::{
    Deserializer, Serialize,
    de::{self, DeserializeOwned, Visitor},
};
use serde_json::{Map, Value, json};
use std::{collections::BTreeMap, fmt, marker::PhantomData};

/// Trait for documents stored in an index.
///
/// Metadata slots are bound by their serialized field name. Mark them
/// `#[serde(default, skip_serializing)]` so they are filled from the hit
/// envelope and never written back into the stored body.
///
/// # Example
///
/// ```rust
/// use quarry_search::{Document, MetaField};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// struct Product {
///     name: String,
///     price: f64,
///     #[serde(default, skip_serializing)]
///     id: String,
///     #[serde(default, skip_serializing)]
///     score: f64,
/// }
///
/// impl Document for Product {
///     fn metadata() -> Vec<(MetaField, &'static str)> {
///         vec![(MetaField::Id, "id"), (MetaField::Score, "score")]
///     }
/// }
/// ```
pub trait Document: Serialize + DeserializeOwned + Default + Send + 'static {
    /// Struct fields that receive hit metadata.
    fn metadata() -> Vec<(MetaField, &'static str)> {
        Vec::new()
    }
}

/// Engine-assigned metadata that can be copied into a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetaField {
    /// `_id`, text.
    Id,
    /// `_index`, text.
    Index,
    /// `_type`, text.
    Type,
    /// `_version`, integer.
    Version,
    /// `_score`, floating point.
    Score,
}

impl MetaField {
    /// Value kind the bound slot must accept.
    pub fn kind(&self) -> SlotKind {
        match self {
            MetaField::Id | MetaField::Index | MetaField::Type => SlotKind::Text,
            MetaField::Version => SlotKind::Integer,
            MetaField::Score => SlotKind::Float,
        }
    }

    /// Engine field name.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetaField::Id => "_id",
            MetaField::Index => "_index",
            MetaField::Type => "_type",
            MetaField::Version => "_version",
            MetaField::Score => "_score",
        }
    }
}

/// Value kind of a metadata slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// String.
    Text,
    /// Signed 64-bit integer.
    Integer,
    /// Floating point.
    Float,
}

impl SlotKind {
    fn sample(&self) -> Value {
        match self {
            SlotKind::Text => json!("quarry"),
            SlotKind::Integer => json!(i64::MIN),
            SlotKind::Float => json!(0.5),
        }
    }
}

/// Hit envelope handed to [`Schema::to_document`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// Document id.
    pub id: String,
    /// Index name.
    pub index: String,
    /// Document type.
    pub doc_type: String,
    /// Version, when the engine reported one.
    pub version: Option<i64>,
    /// Score, absent for unscored queries.
    pub score: Option<f64>,
}

impl Metadata {
    fn value(&self, field: MetaField) -> Option<Value> {
        match field {
            MetaField::Id => Some(json!(self.id)),
            MetaField::Index => Some(json!(self.index)),
            MetaField::Type => Some(json!(self.doc_type)),
            MetaField::Version => self.version.map(|v| json!(v)),
            MetaField::Score => self.score.map(|s| json!(s)),
        }
    }
}

/// Field projection and metadata bindings for one document type.
pub struct Schema<T> {
    fields: Option<Vec<String>>,
    bindings: BTreeMap<MetaField, String>,
    defaults: Map<String, Value>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> Schema<T> {
    /// Derive the schema from the fields `T` declares and `T::metadata()`.
    pub fn of() -> Self {
        let mut builder = Self::builder();
        for (field, slot) in T::metadata() {
            builder = builder.bind(field, slot);
        }
        builder.build()
    }

    /// Start a hand-built schema.
    pub fn builder() -> SchemaBuilder<T> {
        SchemaBuilder {
            fields: None,
            bindings: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Body fields requested from the engine. `None` requests the whole
    /// stored body, which is the case for types that do not declare a plain
    /// field list (maps, flattened structs).
    pub fn projection(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    /// Struct field bound to a metadata slot, if the binding was accepted.
    pub fn binding(&self, field: MetaField) -> Option<&str> {
        self.bindings.get(&field).map(String::as_str)
    }

    /// Build a document from a stored body and its metadata envelope.
    ///
    /// An absent or null body yields a document with default-valued fields.
    pub fn to_document(&self, body: Option<&Value>, meta: &Metadata) -> Result<T> {
        let mut doc = self.defaults.clone();

        match body {
            None | Some(Value::Null) => {}
            Some(Value::Object(fields)) => {
                for (key, value) in fields {
                    doc.insert(key.clone(), value.clone());
                }
            }
            Some(other) => {
                return Err(SearchError::Decode(serde::de::Error::custom(format!(
                    "document body must be a JSON object, got {}",
                    other
                ))));
            }
        }

        for (field, slot) in &self.bindings {
            if let Some(value) = meta.value(*field) {
                doc.insert(slot.clone(), value);
            }
        }

        Ok(serde_json::from_value(Value::Object(doc))?)
    }

    /// Serialize a document for storage, leaving out metadata slots.
    pub fn to_body(&self, doc: &T) -> Result<Value> {
        let mut body = serde_json::to_value(doc)?;
        if let Value::Object(map) = &mut body {
            for slot in self.bindings.values() {
                map.remove(slot);
            }
        }
        Ok(body)
    }
}

impl<T> Clone for Schema<T> {
    fn clone(&self) -> Self {
        Self {
            fields: self.fields.clone(),
            bindings: self.bindings.clone(),
            defaults: self.defaults.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("fields", &self.fields)
            .field("bindings", &self.bindings)
            .finish()
    }
}

/// Builder for [`Schema`].
pub struct SchemaBuilder<T> {
    fields: Option<Vec<String>>,
    bindings: Vec<(MetaField, String)>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Document> SchemaBuilder<T> {
    /// Request `name` from the engine. Once called, only listed fields are
    /// projected instead of every serialized field.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.get_or_insert_with(Vec::new).push(name.into());
        self
    }

    /// Request several fields.
    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields
            .get_or_insert_with(Vec::new)
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Bind a metadata slot to a struct field. A later accepted binding of
    /// the same slot replaces the earlier one.
    pub fn bind(mut self, field: MetaField, slot: impl Into<String>) -> Self {
        self.bindings.push((field, slot.into()));
        self
    }

    /// Finish the schema. Bindings whose struct field cannot hold the slot's
    /// value kind are dropped.
    pub fn build(self) -> Schema<T> {
        let defaults = match serde_json::to_value(T::default()) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };

        let mut bindings = BTreeMap::new();
        for (field, slot) in self.bindings {
            if slot_accepts::<T>(&defaults, &slot, field.kind()) {
                bindings.insert(field, slot);
            }
        }

        let fields = self.fields.or_else(declared_fields::<T>).map(|candidates| {
            let mut fields: Vec<String> = Vec::with_capacity(candidates.len());
            for name in candidates {
                let bound = bindings.values().any(|slot| *slot == name);
                if !bound && !fields.contains(&name) {
                    fields.push(name);
                }
            }
            fields
        });

        Schema {
            fields,
            bindings,
            defaults,
            _marker: PhantomData,
        }
    }
}

/// Field names `T` declares to serde, in declaration order and after renames.
/// Includes fields skipped on serialization.
fn declared_fields<T: DeserializeOwned>() -> Option<Vec<String>> {
    let mut declared = None;
    let _ = T::deserialize(FieldNames(&mut declared));
    declared.map(|names| names.iter().map(|name| name.to_string()).collect())
}

// Captures the field list a derived `Deserialize` hands to
// `deserialize_struct`, then aborts.
struct FieldNames<'a>(&'a mut Option<&'static [&'static str]>);

#[derive(Debug)]
struct Captured;

impl fmt::Display for Captured {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("field names captured")
    }
}

impl std::error::Error for Captured {}

impl de::Error for Captured {
    fn custom<M: fmt::Display>(_msg: M) -> Self {
        Captured
    }
}

impl<'de> Deserializer<'de> for FieldNames<'_> {
    type Error = Captured;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> std::result::Result<V::Value, Captured> {
        Err(Captured)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        _visitor: V,
    ) -> std::result::Result<V::Value, Captured> {
        *self.0 = Some(fields);
        Err(Captured)
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }
}

fn slot_accepts<T: DeserializeOwned>(
    defaults: &Map<String, Value>,
    slot: &str,
    kind: SlotKind,
) -> bool {
    let accepts = |sample: Value| {
        let mut trial = defaults.clone();
        trial.insert(slot.to_string(), sample);
        serde_json::from_value::<T>(Value::Object(trial)).is_ok()
    };

    match kind {
        // A float slot would also take an integer sample.
        SlotKind::Integer => accepts(kind.sample()) && !accepts(SlotKind::Float.sample()),
        _ => accepts(kind.sample()),
    }
}
