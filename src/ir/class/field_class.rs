//! Field classes: the recursive sum-type schema for structured values
//! (spec §3, §4.3).

use crate::error::GraphError;
use std::collections::HashMap;

/// The scope a [`FieldPath`] is rooted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeRoot {
    PacketHeader,
    PacketContext,
    EventHeader,
    EventCommonContext,
    EventSpecificContext,
    EventPayload,
}

/// `(scope_root, [index...])`: a path into a field-class tree, stepping
/// into structures/variants/arrays by member/option index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    pub scope_root: ScopeRoot,
    pub indexes: Vec<u32>,
}

impl FieldPath {
    pub fn new(scope_root: ScopeRoot, indexes: impl Into<Vec<u32>>) -> Self {
        Self {
            scope_root,
            indexes: indexes.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signedness {
    Unsigned,
    Signed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayBase {
    Binary,
    Octal,
    Decimal,
    Hexadecimal,
}

/// An inclusive integer range, used both by enumeration mapping labels and
/// by variant selector ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegerRange {
    pub lower: i128,
    pub upper: i128,
}

impl IntegerRange {
    pub fn new(lower: i128, upper: i128) -> Self {
        Self { lower, upper }
    }

    pub fn overlaps(&self, other: &IntegerRange) -> bool {
        self.lower <= other.upper && other.lower <= self.upper
    }

    pub fn contains(&self, value: i128) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// `name -> [(lo, hi)...]` enumeration labels. Ranges belonging to
/// different labels may overlap (spec §4.3).
#[derive(Debug, Clone, Default)]
pub struct MappingLabels(pub Vec<(String, Vec<IntegerRange>)>);

impl MappingLabels {
    pub fn labels_for(&self, value: i128) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(_, ranges)| ranges.iter().any(|r| r.contains(value)))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct IntegerFieldClass {
    pub width: u8,
    pub signedness: Signedness,
    pub base: DisplayBase,
    pub mapping_labels: Option<MappingLabels>,
}

impl IntegerFieldClass {
    pub fn new(width: u8, signedness: Signedness) -> Self {
        Self {
            width,
            signedness,
            base: DisplayBase::Decimal,
            mapping_labels: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealPrecision {
    Single,
    Double,
}

#[derive(Debug, Clone)]
pub struct StructureMember {
    pub name: String,
    pub field_class: FieldClass,
}

#[derive(Debug, Clone, Default)]
pub struct StructureFieldClass {
    pub members: Vec<StructureMember>,
}

impl StructureFieldClass {
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.members.iter().position(|m| m.name == name)
    }

    pub fn append(&mut self, name: impl Into<String>, field_class: FieldClass) {
        self.members.push(StructureMember {
            name: name.into(),
            field_class,
        });
    }
}

#[derive(Debug, Clone)]
pub struct StaticArrayFieldClass {
    pub element: Box<FieldClass>,
    pub length: u64,
}

#[derive(Debug, Clone)]
pub struct DynamicArrayFieldClass {
    pub element: Box<FieldClass>,
    pub length_path: Option<FieldPath>,
}

#[derive(Debug, Clone)]
pub struct OptionFieldClass {
    pub content: Box<FieldClass>,
    pub selector_path: Option<FieldPath>,
}

#[derive(Debug, Clone)]
pub struct VariantOption {
    pub name: String,
    pub field_class: FieldClass,
    /// Present only when the selector is integral; absent (e.g. boolean
    /// selector) options are distinguished positionally.
    pub selector_ranges: Option<Vec<IntegerRange>>,
}

#[derive(Debug, Clone, Default)]
pub struct VariantFieldClass {
    pub options: Vec<VariantOption>,
    pub selector_path: Option<FieldPath>,
}

impl VariantFieldClass {
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.options.iter().position(|o| o.name == name)
    }
}

/// The recursive sum type described by spec §3: `Bool | Integer | Real |
/// String | Structure | StaticArray | DynamicArray | Option | Variant`.
#[derive(Debug, Clone)]
pub enum FieldClass {
    Bool,
    Integer(IntegerFieldClass),
    Real(RealPrecision),
    String,
    Structure(StructureFieldClass),
    StaticArray(StaticArrayFieldClass),
    DynamicArray(DynamicArrayFieldClass),
    Option(OptionFieldClass),
    Variant(VariantFieldClass),
}

impl FieldClass {
    pub fn unsigned_integer(width: u8) -> Self {
        FieldClass::Integer(IntegerFieldClass::new(width, Signedness::Unsigned))
    }

    pub fn signed_integer(width: u8) -> Self {
        FieldClass::Integer(IntegerFieldClass::new(width, Signedness::Signed))
    }

    pub fn structure() -> Self {
        FieldClass::Structure(StructureFieldClass::default())
    }

    pub fn static_array(element: FieldClass, length: u64) -> Self {
        FieldClass::StaticArray(StaticArrayFieldClass {
            element: Box::new(element),
            length,
        })
    }

    pub fn dynamic_array(element: FieldClass, length_path: Option<FieldPath>) -> Self {
        FieldClass::DynamicArray(DynamicArrayFieldClass {
            element: Box::new(element),
            length_path,
        })
    }

    pub fn option(content: FieldClass, selector_path: Option<FieldPath>) -> Self {
        FieldClass::Option(OptionFieldClass {
            content: Box::new(content),
            selector_path,
        })
    }

    /// Resolves `path.indexes` against this field class tree, as if this
    /// tree were the scope named by `path.scope_root`. Returns `None` if
    /// any step is out of bounds or steps into a leaf.
    pub fn resolve(&self, path: &FieldPath) -> Option<&FieldClass> {
        let mut current = self;
        for &idx in &path.indexes {
            current = match current {
                FieldClass::Structure(s) => &s.members.get(idx as usize)?.field_class,
                FieldClass::StaticArray(a) => {
                    if idx != 0 {
                        return None;
                    }
                    &a.element
                }
                FieldClass::DynamicArray(a) => {
                    if idx != 0 {
                        return None;
                    }
                    &a.element
                }
                FieldClass::Option(o) => {
                    if idx != 0 {
                        return None;
                    }
                    &o.content
                }
                FieldClass::Variant(v) => &v.options.get(idx as usize)?.field_class,
                _ => return None,
            };
        }
        Some(current)
    }
}

/// Validates freeze-time constraints for a field-class tree rooted at a
/// single scope (spec §4.3 "Validation on freeze"):
///
/// - a dynamic array's length path, and a variant/option's selector path,
///   must resolve to a node that precedes the referencing node in the
///   scope's depth-first, pre-order traversal (i.e. already "visible"
///   when the referencing field would be decoded);
/// - variant options are pairwise disjoint when their selector is
///   integral.
///
/// Field classes referencing a path rooted at a *different* scope (e.g. a
/// payload dynamic array sized from the packet context) cannot be checked
/// from a single scope's tree and are accepted here unconditionally; this
/// crate does not implement the further cross-scope pass the spec leaves
/// open (which scopes precede which at decode time is a property of the
/// owning stream class's scope set as a whole, not of any one field-class
/// tree) — see DESIGN.md.
pub fn validate_scope(root: &FieldClass) -> Result<(), GraphError> {
    let order = preorder_indexes(root);
    check_node(root, &[], &order, root)
}

fn preorder_indexes(root: &FieldClass) -> HashMap<Vec<u32>, usize> {
    let mut map = HashMap::new();
    let mut counter = 0usize;
    walk_indexes(root, Vec::new(), &mut map, &mut counter);
    map
}

fn walk_indexes(
    fc: &FieldClass,
    path: Vec<u32>,
    map: &mut HashMap<Vec<u32>, usize>,
    counter: &mut usize,
) {
    map.insert(path.clone(), *counter);
    *counter += 1;
    match fc {
        FieldClass::Structure(s) => {
            for (i, m) in s.members.iter().enumerate() {
                let mut child = path.clone();
                child.push(i as u32);
                walk_indexes(&m.field_class, child, map, counter);
            }
        }
        FieldClass::StaticArray(a) => {
            let mut child = path.clone();
            child.push(0);
            walk_indexes(&a.element, child, map, counter);
        }
        FieldClass::DynamicArray(a) => {
            let mut child = path.clone();
            child.push(0);
            walk_indexes(&a.element, child, map, counter);
        }
        FieldClass::Option(o) => {
            let mut child = path.clone();
            child.push(0);
            walk_indexes(&o.content, child, map, counter);
        }
        FieldClass::Variant(v) => {
            for (i, opt) in v.options.iter().enumerate() {
                let mut child = path.clone();
                child.push(i as u32);
                walk_indexes(&opt.field_class, child, map, counter);
            }
        }
        FieldClass::Bool | FieldClass::Integer(_) | FieldClass::Real(_) | FieldClass::String => {}
    }
}

fn check_node(
    fc: &FieldClass,
    path: &[u32],
    order: &HashMap<Vec<u32>, usize>,
    scope_root: &FieldClass,
) -> Result<(), GraphError> {
    let my_index = *order
        .get(path)
        .expect("path was produced from the same tree being checked");
    match fc {
        FieldClass::DynamicArray(a) => {
            if let Some(lp) = &a.length_path {
                check_precedes(lp, my_index, order, scope_root, "dynamic array length path")?;
            }
            let mut child = path.to_vec();
            child.push(0);
            check_node(&a.element, &child, order, scope_root)?;
        }
        FieldClass::Option(o) => {
            if let Some(sp) = &o.selector_path {
                check_precedes(sp, my_index, order, scope_root, "option selector path")?;
            }
            let mut child = path.to_vec();
            child.push(0);
            check_node(&o.content, &child, order, scope_root)?;
        }
        FieldClass::Variant(v) => {
            if let Some(sp) = &v.selector_path {
                check_precedes(sp, my_index, order, scope_root, "variant selector path")?;
            }
            validate_variant_disjointness(v)?;
            for (i, opt) in v.options.iter().enumerate() {
                let mut child = path.to_vec();
                child.push(i as u32);
                check_node(&opt.field_class, &child, order, scope_root)?;
            }
        }
        FieldClass::Structure(s) => {
            for (i, m) in s.members.iter().enumerate() {
                let mut child = path.to_vec();
                child.push(i as u32);
                check_node(&m.field_class, &child, order, scope_root)?;
            }
        }
        FieldClass::StaticArray(a) => {
            let mut child = path.to_vec();
            child.push(0);
            check_node(&a.element, &child, order, scope_root)?;
        }
        FieldClass::Bool | FieldClass::Integer(_) | FieldClass::Real(_) | FieldClass::String => {}
    }
    Ok(())
}

fn check_precedes(
    referenced: &FieldPath,
    referencing_index: usize,
    order: &HashMap<Vec<u32>, usize>,
    scope_root: &FieldClass,
    what: &'static str,
) -> Result<(), GraphError> {
    // Paths rooted at a different scope cannot be validated locally.
    let Some(target) = scope_root.resolve(&FieldPath {
        scope_root: referenced.scope_root,
        indexes: referenced.indexes.clone(),
    }) else {
        return Ok(());
    };
    let _ = target;
    match order.get(&referenced.indexes) {
        Some(&target_index) if target_index < referencing_index => Ok(()),
        Some(_) => Err(GraphError::Loading(format!(
            "{what} does not precede its referencing field in pre-order traversal"
        ))),
        None => Err(GraphError::Loading(format!("{what} does not resolve"))),
    }
}

fn validate_variant_disjointness(variant: &VariantFieldClass) -> Result<(), GraphError> {
    for (i, a) in variant.options.iter().enumerate() {
        let Some(a_ranges) = &a.selector_ranges else {
            continue;
        };
        for b in variant.options.iter().skip(i + 1) {
            let Some(b_ranges) = &b.selector_ranges else {
                continue;
            };
            for ra in a_ranges {
                for rb in b_ranges {
                    if ra.overlaps(rb) {
                        return Err(GraphError::Loading(format!(
                            "variant options `{}` and `{}` have overlapping selector ranges",
                            a.name, b.name
                        )));
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sibling_len_u32() -> StructureMember {
        StructureMember {
            name: "len".to_string(),
            field_class: FieldClass::unsigned_integer(32),
        }
    }

    #[test]
    fn dynamic_array_length_may_reference_a_preceding_sibling() {
        let mut s = StructureFieldClass::default();
        s.members.push(sibling_len_u32());
        s.append(
            "payload",
            FieldClass::dynamic_array(
                FieldClass::unsigned_integer(8),
                Some(FieldPath::new(ScopeRoot::EventPayload, vec![0])),
            ),
        );
        let root = FieldClass::Structure(s);
        assert!(validate_scope(&root).is_ok());
    }

    #[test]
    fn dynamic_array_length_may_not_reference_a_following_sibling() {
        let mut s = StructureFieldClass::default();
        s.append(
            "payload",
            FieldClass::dynamic_array(
                FieldClass::unsigned_integer(8),
                Some(FieldPath::new(ScopeRoot::EventPayload, vec![1])),
            ),
        );
        s.members.push(sibling_len_u32());
        let root = FieldClass::Structure(s);
        assert!(validate_scope(&root).is_err());
    }

    #[test]
    fn overlapping_integral_variant_selectors_are_rejected() {
        let variant = VariantFieldClass {
            selector_path: None,
            options: vec![
                VariantOption {
                    name: "a".into(),
                    field_class: FieldClass::Bool,
                    selector_ranges: Some(vec![IntegerRange::new(0, 5)]),
                },
                VariantOption {
                    name: "b".into(),
                    field_class: FieldClass::Bool,
                    selector_ranges: Some(vec![IntegerRange::new(5, 10)]),
                },
            ],
        };
        let root = FieldClass::Variant(variant);
        assert!(validate_scope(&root).is_err());
    }

    #[test]
    fn enumeration_mapping_labels_may_overlap() {
        let labels = MappingLabels(vec![
            ("low".into(), vec![IntegerRange::new(0, 10)]),
            ("mid".into(), vec![IntegerRange::new(5, 15)]),
        ]);
        assert_eq!(labels.labels_for(7), vec!["low", "mid"]);
    }
}
