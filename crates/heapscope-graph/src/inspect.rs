use std::collections::BTreeSet;

use heapscope_types::HistoryLabel;

use crate::ExtractError;

/// Record types a pointer must resolve to in order to be followed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TypeFilter {
    /// Follow pointers to any record type.
    #[default]
    Any,
    /// Follow only pointers to these record type names.
    Only(BTreeSet<String>),
}

impl TypeFilter {
    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(names.into_iter().map(Into::into).collect())
    }

    pub fn allows(&self, type_name: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Only(names) => names.contains(type_name),
        }
    }
}

/// How a field's declared type is classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Pointer to a record type named `pointee`.
    RecordPointer { pointee: String },
    /// An integer scalar; read into node attributes.
    Int,
    /// Anything else (floats, arrays, pointers to scalars...). Ignored.
    Other,
}

/// A field of a record, as reported by an [`Inspector`].
#[derive(Debug, Clone)]
pub struct Field<V> {
    pub name: String,
    /// Declared type, as spelled by the host.
    pub type_name: String,
    pub kind: FieldKind,
    /// Handle to the field's current value.
    pub value: V,
}

/// Value and type introspection provided by the host debugger.
///
/// Everything heapscope knows about the debuggee goes through this trait;
/// the builder never reads memory on its own.
pub trait Inspector {
    /// A handle to a typed value in the debuggee.
    type Value: Clone;

    fn is_valid(&self, value: &Self::Value) -> bool;

    /// Name of the pointee record type, if `value` is a pointer to a record.
    /// Answered from the static type, so null pointers still report it.
    fn pointee_record(&self, value: &Self::Value) -> Option<String>;

    fn is_pointer_to_record(&self, value: &Self::Value, allowed: &TypeFilter) -> bool {
        self.pointee_record(value)
            .is_some_and(|pointee| allowed.allows(&pointee))
    }

    /// Numeric value of a pointer; `0` for null.
    fn address(&self, value: &Self::Value) -> u64;

    /// Fields of the record `value` points at, in declaration order.
    fn fields(&self, value: &Self::Value) -> Vec<Field<Self::Value>>;

    /// Integer readout of a scalar value.
    fn int_value(&self, value: &Self::Value) -> Option<i64>;

    fn evaluate(&self, expr: &str) -> Result<Self::Value, ExtractError>;

    /// Variables of the selected frame, with their names.
    fn frame_variables(&self) -> Vec<(String, Self::Value)>;

    /// Whether the variable behind `value` has been initialized at the
    /// current stop location (declared on an earlier line).
    fn is_initialized_at_current_location(&self, value: &Self::Value) -> bool;

    /// Where the debuggee is currently stopped.
    fn location(&self) -> HistoryLabel;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_filter_allows_everything() {
        assert!(TypeFilter::Any.allows("ListNode"));
        assert!(TypeFilter::default().allows("Whatever"));
    }

    #[test]
    fn only_filter_allows_listed_types() {
        let filter = TypeFilter::only(["ListNode", "TreeNode"]);
        assert!(filter.allows("ListNode"));
        assert!(filter.allows("TreeNode"));
        assert!(!filter.allows("Other"));
    }
}
