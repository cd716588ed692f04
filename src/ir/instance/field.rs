//! Field instances: concrete values shaped by a [`FieldClass`] (spec §3,
//! §4.3).
//!
//! Mutability is enforced by Rust's own aliasing rules rather than a
//! runtime "is this instance under construction" flag: a component holds
//! `&mut Field` while building an event/packet, and once the containing
//! event is wrapped into a [`crate::message::Message`] only shared
//! references are ever handed back out. This is a stronger, statically
//! checked version of "`set_*` mutators work only on mutable instances"
//! (spec §4.3).

use super::super::class::field_class::{FieldClass, RealPrecision, VariantFieldClass};

/// A field instance. Structurally mirrors whichever [`FieldClass`]
/// variant produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Bool(bool),
    Integer(i128),
    Real(f64),
    String(String),
    Structure(Vec<(String, Field)>),
    StaticArray(Vec<Field>),
    DynamicArray(Vec<Field>),
    Option(Option<Box<Field>>),
    Variant { selected: String, value: Box<Field> },
}

/// Returns a zero-initialized field whose structural shape matches
/// `field_class` (spec §4.3 `create_field`).
pub fn create_field(field_class: &FieldClass) -> Field {
    match field_class {
        FieldClass::Bool => Field::Bool(false),
        FieldClass::Integer(_) => Field::Integer(0),
        FieldClass::Real(RealPrecision::Single | RealPrecision::Double) => Field::Real(0.0),
        FieldClass::String => Field::String(String::new()),
        FieldClass::Structure(s) => Field::Structure(
            s.members
                .iter()
                .map(|m| (m.name.clone(), create_field(&m.field_class)))
                .collect(),
        ),
        FieldClass::StaticArray(a) => {
            let element = create_field(&a.element);
            Field::StaticArray(vec![element; a.length as usize])
        }
        FieldClass::DynamicArray(_) => Field::DynamicArray(Vec::new()),
        FieldClass::Option(_) => Field::Option(None),
        FieldClass::Variant(v) => Field::Variant {
            selected: default_variant_option(v),
            value: Box::new(
                v.options
                    .first()
                    .map(|o| create_field(&o.field_class))
                    .unwrap_or(Field::Bool(false)),
            ),
        },
    }
}

fn default_variant_option(v: &VariantFieldClass) -> String {
    v.options.first().map(|o| o.name.clone()).unwrap_or_default()
}

impl Field {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Field::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn set_bool(&mut self, value: bool) -> Result<(), FieldTypeError> {
        match self {
            Field::Bool(b) => {
                *b = value;
                Ok(())
            }
            _ => Err(FieldTypeError),
        }
    }

    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Field::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn set_integer(&mut self, value: i128) -> Result<(), FieldTypeError> {
        match self {
            Field::Integer(v) => {
                *v = value;
                Ok(())
            }
            _ => Err(FieldTypeError),
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Field::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn set_real(&mut self, value: f64) -> Result<(), FieldTypeError> {
        match self {
            Field::Real(v) => {
                *v = value;
                Ok(())
            }
            _ => Err(FieldTypeError),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Field::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn set_string(&mut self, value: impl Into<String>) -> Result<(), FieldTypeError> {
        match self {
            Field::String(s) => {
                *s = value.into();
                Ok(())
            }
            _ => Err(FieldTypeError),
        }
    }

    pub fn member_by_index(&self, index: usize) -> Option<&Field> {
        match self {
            Field::Structure(members) => members.get(index).map(|(_, f)| f),
            _ => None,
        }
    }

    pub fn member_by_index_mut(&mut self, index: usize) -> Option<&mut Field> {
        match self {
            Field::Structure(members) => members.get_mut(index).map(|(_, f)| f),
            _ => None,
        }
    }

    pub fn member_by_name(&self, name: &str) -> Option<&Field> {
        match self {
            Field::Structure(members) => members.iter().find(|(n, _)| n == name).map(|(_, f)| f),
            _ => None,
        }
    }

    pub fn element_by_index(&self, index: usize) -> Option<&Field> {
        match self {
            Field::StaticArray(items) | Field::DynamicArray(items) => items.get(index),
            _ => None,
        }
    }

    pub fn element_by_index_mut(&mut self, index: usize) -> Option<&mut Field> {
        match self {
            Field::StaticArray(items) | Field::DynamicArray(items) => items.get_mut(index),
            _ => None,
        }
    }

    pub fn length(&self) -> Option<usize> {
        match self {
            Field::StaticArray(items) | Field::DynamicArray(items) => Some(items.len()),
            _ => None,
        }
    }

    /// Appends `value` to a dynamic array, growing its length (spec D:
    /// "Field instance ... concrete value matching a field class").
    pub fn push_element(&mut self, value: Field) -> Result<(), FieldTypeError> {
        match self {
            Field::DynamicArray(items) => {
                items.push(value);
                Ok(())
            }
            _ => Err(FieldTypeError),
        }
    }

    pub fn has_value(&self) -> Option<bool> {
        match self {
            Field::Option(o) => Some(o.is_some()),
            _ => None,
        }
    }

    pub fn set_has_value(&mut self, has_value: bool, default: impl FnOnce() -> Field) -> Result<(), FieldTypeError> {
        match self {
            Field::Option(o) => {
                *o = if has_value { Some(Box::new(default())) } else { None };
                Ok(())
            }
            _ => Err(FieldTypeError),
        }
    }

    pub fn option_value(&self) -> Option<&Field> {
        match self {
            Field::Option(o) => o.as_deref(),
            _ => None,
        }
    }

    pub fn option_value_mut(&mut self) -> Option<&mut Field> {
        match self {
            Field::Option(o) => o.as_deref_mut(),
            _ => None,
        }
    }

    pub fn variant_selected(&self) -> Option<&str> {
        match self {
            Field::Variant { selected, .. } => Some(selected.as_str()),
            _ => None,
        }
    }

    pub fn select_variant_option(
        &mut self,
        name: impl Into<String>,
        value: Field,
    ) -> Result<(), FieldTypeError> {
        match self {
            Field::Variant { selected, value: slot } => {
                *selected = name.into();
                *slot = Box::new(value);
                Ok(())
            }
            _ => Err(FieldTypeError),
        }
    }

    pub fn variant_value(&self) -> Option<&Field> {
        match self {
            Field::Variant { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Resets this field back to its class's zero value, reusing the
    /// allocation where possible (spec §4.3 "Event recycling": "the
    /// event's fields are reset (not deallocated)").
    pub fn reset(&mut self, field_class: &FieldClass) {
        match (self, field_class) {
            (Field::Bool(b), FieldClass::Bool) => *b = false,
            (Field::Integer(v), FieldClass::Integer(_)) => *v = 0,
            (Field::Real(v), FieldClass::Real(_)) => *v = 0.0,
            (Field::String(s), FieldClass::String) => s.clear(),
            (Field::Structure(members), FieldClass::Structure(sfc)) => {
                for ((_, field), member_fc) in members.iter_mut().zip(sfc.members.iter()) {
                    field.reset(&member_fc.field_class);
                }
            }
            (Field::StaticArray(items), FieldClass::StaticArray(afc)) => {
                for item in items.iter_mut() {
                    item.reset(&afc.element);
                }
            }
            (Field::DynamicArray(items), FieldClass::DynamicArray(_)) => items.clear(),
            (Field::Option(opt), FieldClass::Option(_)) => *opt = None,
            (slot @ Field::Variant { .. }, FieldClass::Variant(vfc)) => {
                *slot = create_field(&FieldClass::Variant(vfc.clone()));
            }
            (slot, fc) => *slot = create_field(fc),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("field instance does not match the requested accessor's field class")]
pub struct FieldTypeError;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::class::field_class::{FieldPath, ScopeRoot};

    #[test]
    fn create_field_zero_initializes_a_nested_structure() {
        let mut s = crate::ir::class::field_class::StructureFieldClass::default();
        s.append("flag", FieldClass::Bool);
        s.append("count", FieldClass::unsigned_integer(32));
        let fc = FieldClass::Structure(s);
        let field = create_field(&fc);
        assert_eq!(field.member_by_name("flag").unwrap().as_bool(), Some(false));
        assert_eq!(field.member_by_name("count").unwrap().as_integer(), Some(0));
    }

    #[test]
    fn dynamic_array_grows_by_pushing_elements() {
        let fc = FieldClass::dynamic_array(
            FieldClass::unsigned_integer(8),
            Some(FieldPath::new(ScopeRoot::EventPayload, vec![])),
        );
        let mut field = create_field(&fc);
        assert_eq!(field.length(), Some(0));
        field.push_element(Field::Integer(7)).unwrap();
        assert_eq!(field.length(), Some(1));
        assert_eq!(field.element_by_index(0).unwrap().as_integer(), Some(7));
    }

    #[test]
    fn reset_clears_a_dynamic_array_without_touching_its_class() {
        let fc = FieldClass::dynamic_array(FieldClass::unsigned_integer(8), None);
        let mut field = create_field(&fc);
        field.push_element(Field::Integer(1)).unwrap();
        field.push_element(Field::Integer(2)).unwrap();
        field.reset(&fc);
        assert_eq!(field.length(), Some(0));
    }
}
