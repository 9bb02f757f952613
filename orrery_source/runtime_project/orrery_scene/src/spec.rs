use std::collections::BTreeMap;
use std::sync::Arc;

use orrery_structs::Vector3;
use orrery_variant::Variant;

use crate::SpecIssue;

/// One declarative scene element: `{type, name?, parent?, position?, ...}`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Spec {
    fields: BTreeMap<Arc<str>, Variant>,
}

impl Spec {
    pub fn new(type_tag: &str) -> Self {
        Self::default().with("type", type_tag)
    }

    pub fn with(mut self, key: &str, value: impl Into<Variant>) -> Self {
        self.fields.insert(Arc::from(key), value.into());
        self
    }

    pub fn from_variant(value: &Variant) -> Result<Self, SpecIssue> {
        match value.as_object() {
            Some(fields) => Ok(Self {
                fields: fields.clone(),
            }),
            None => Err(SpecIssue::NotAnObject(value.to_string())),
        }
    }

    pub fn into_variant(self) -> Variant {
        Variant::Object(self.fields)
    }

    #[inline]
    pub fn fields(&self) -> &BTreeMap<Arc<str>, Variant> {
        &self.fields
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Variant> {
        self.fields.get(key)
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn type_tag(&self) -> Option<&str> {
        self.str_field("type")
    }

    pub fn name(&self) -> Option<&str> {
        self.str_field("name").filter(|s| !s.is_empty())
    }

    pub fn parent(&self) -> Option<&str> {
        self.str_field("parent").filter(|s| !s.is_empty())
    }

    pub fn children(&self) -> Option<&Variant> {
        self.fields.get("children")
    }

    /// Name used in log lines: the spec name, else its type.
    pub fn label(&self) -> &str {
        self.name().or(self.type_tag()).unwrap_or("<untyped>")
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Variant::as_str)
    }

    pub fn f64_field(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(Variant::as_f64_lossy)
    }

    pub fn bool_field(&self, key: &str) -> Option<bool> {
        self.fields.get(key).and_then(Variant::as_bool)
    }

    pub fn vec3_field(&self, key: &str) -> Option<Vector3> {
        self.fields.get(key).and_then(Variant::as_vec3)
    }

    /// Typed read that reports a present-but-wrong value as a [`SpecIssue`].
    /// Absent fields are `Ok(None)`.
    pub fn read<T>(
        &self,
        field: &'static str,
        expected: &'static str,
        convert: impl FnOnce(&Variant) -> Option<T>,
    ) -> Result<Option<T>, SpecIssue> {
        match self.fields.get(field) {
            None | Some(Variant::Null) => Ok(None),
            Some(value) => convert(value).map(Some).ok_or_else(|| SpecIssue::InvalidField {
                owner: self.label().to_string(),
                field,
                expected,
            }),
        }
    }
}

/// Appends `value` to `out`, flattening nested sequences in order.
pub fn flatten_specs<'a>(value: &'a Variant, out: &mut Vec<&'a Variant>) {
    match value {
        Variant::Array(items) => {
            for item in items {
                flatten_specs(item, out);
            }
        }
        other => out.push(other),
    }
}
