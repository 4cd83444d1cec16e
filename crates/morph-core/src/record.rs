//! Runtime instances of a model.

use serde_json::Value as Json;

use crate::data_type::{DataType, Primitive};
use crate::error::CoreError;
use crate::model::Model;
use crate::value::{Opaque, Value};

/// One object of a graph: a slot per field of its model, in declaration order.
///
/// Slots start out [`Value::Null`]. Cloning a record deep-copies nested records
/// and collections; opaque values keep their identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    model: Model,
    slots: Vec<Value>,
}

impl Record {
    #[must_use]
    pub fn new(model: &Model) -> Self {
        Self {
            model: model.clone(),
            slots: vec![Value::Null; model.fields().len()],
        }
    }

    #[must_use]
    pub const fn model(&self) -> &Model {
        &self.model
    }

    /// Value of a field by name; `None` if the model has no such field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.model.field_index(field).and_then(|i| self.slots.get(i))
    }

    /// # Errors
    ///
    /// Returns [`CoreError::UnknownField`] if the model has no such field.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<(), CoreError> {
        let slot = self
            .model
            .field_index(field)
            .and_then(|i| self.slots.get_mut(i))
            .ok_or_else(|| CoreError::UnknownField {
                model: self.model.name().to_string(),
                field: field.to_string(),
            })?;
        *slot = value.into();
        Ok(())
    }

    /// Builder-style [`Record::set`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownField`] if the model has no such field.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Result<Self, CoreError> {
        self.set(field, value)?;
        Ok(self)
    }

    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&Value> {
        self.slots.get(index)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.slots.get_mut(index)
    }

    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.slots
    }

    /// Build a graph from a JSON object shaped like `model`.
    ///
    /// Missing keys and `null` leave the slot null. Keys the model does not
    /// declare are ignored. Opaque fields hold the JSON value itself.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Json`] if a value does not fit its field type.
    pub fn from_json(model: &Model, json: &Json) -> Result<Self, CoreError> {
        let object = json
            .as_object()
            .ok_or_else(|| CoreError::Json(format!("{} expects a JSON object", model.name())))?;
        let mut record = Self::new(model);
        for (slot, field) in record.slots.iter_mut().zip(model.fields()) {
            if let Some(value) = object.get(field.name()) {
                *slot = value_from_json(field.data_type(), field.model(), value)
                    .map_err(|reason| {
                        CoreError::Json(format!("{}.{}: {reason}", model.name(), field.name()))
                    })?;
            }
        }
        Ok(record)
    }

    /// JSON projection; null slots are emitted as `null`.
    #[must_use]
    pub fn to_json(&self) -> Json {
        let object = self
            .model
            .fields()
            .iter()
            .zip(&self.slots)
            .map(|(field, value)| (field.name().to_string(), value.to_json()))
            .collect();
        Json::Object(object)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn value_from_json(ty: &DataType, model: Option<&Model>, json: &Json) -> Result<Value, String> {
    if json.is_null() {
        return Ok(Value::Null);
    }
    let mismatch = || format!("expected {ty}, found {json}");
    match ty {
        DataType::Primitive(Primitive::Bool) => json.as_bool().map(Value::Bool).ok_or_else(mismatch),
        DataType::Primitive(Primitive::Int32) => json
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Value::Int32)
            .ok_or_else(mismatch),
        DataType::Primitive(Primitive::Int64) => {
            json.as_i64().map(Value::Int64).ok_or_else(mismatch)
        }
        DataType::Primitive(Primitive::Float32) => json
            .as_f64()
            .map(|v| Value::Float32(v as f32))
            .ok_or_else(mismatch),
        DataType::Primitive(Primitive::Float64) => {
            json.as_f64().map(Value::Float64).ok_or_else(mismatch)
        }
        DataType::Primitive(Primitive::Text) => json
            .as_str()
            .map(|s| Value::Text(s.to_string()))
            .ok_or_else(mismatch),
        DataType::Opaque(_) => Ok(Value::Opaque(Opaque::new(json.clone()))),
        DataType::Object(_) => {
            let model = model.ok_or_else(mismatch)?;
            Record::from_json(model, json)
                .map(Value::Object)
                .map_err(|e| e.to_string())
        }
        DataType::Collection { kind, element } => {
            let items = json
                .as_array()
                .ok_or_else(mismatch)?
                .iter()
                .map(|item| value_from_json(element, model, item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::collection(*kind, items))
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::data_type::ContainerKind;
    use crate::field::Field;

    fn models() -> (Model, Model) {
        let item = Model::builder("Item")
            .field(Field::new("Name", Primitive::Text))
            .build()
            .unwrap();
        let order = Model::builder("Order")
            .field(Field::new("Id", Primitive::Int64))
            .field(Field::new("Total", Primitive::Float64))
            .field(Field::collection("Items", ContainerKind::Array, &item))
            .field(Field::opaque("Extra", "Json"))
            .build()
            .unwrap();
        (order, item)
    }

    #[test]
    fn new_record_is_all_null() {
        let (order, _) = models();
        let record = Record::new(&order);
        assert_eq!(record.values().len(), 4);
        assert!(record.values().iter().all(Value::is_null));
    }

    #[test]
    fn set_rejects_unknown_fields() {
        let (order, _) = models();
        let mut record = Record::new(&order);
        record.set("Id", 7_i64).unwrap();
        assert_eq!(record.get("Id"), Some(&Value::Int64(7)));
        assert!(matches!(
            record.set("Missing", 1),
            Err(CoreError::UnknownField { .. })
        ));
    }

    #[test]
    fn json_round_trip_keeps_shape() {
        let (order, item) = models();
        let input = json!({
            "Id": 42,
            "Total": 9.5,
            "Items": [{ "Name": "a" }, { "Name": "b" }],
            "Extra": { "note": "kept" },
        });
        let record = Record::from_json(&order, &input).unwrap();
        let items = record.get("Items").and_then(Value::elements).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_record().map(Record::model), Some(&item));
        assert_eq!(record.to_json(), input);
    }

    #[test]
    fn json_type_mismatch_is_reported() {
        let (order, _) = models();
        let err = Record::from_json(&order, &json!({ "Id": "nope" })).unwrap_err();
        assert!(matches!(err, CoreError::Json(msg) if msg.starts_with("Order.Id")));
    }
}
