//! An in-memory heap that implements [`Inspector`].
//!
//! Records are laid out at fake, stable addresses and hold integer and
//! pointer fields. Frame variables carry the line they were declared on, so
//! the "initialized at the current location" filter behaves like it does
//! under a real debugger. Used by the demo scenarios and by tests.
//!
//! The mutators (`alloc`, `set_int`, `set_ptr`, `assign`) panic when handed
//! an undeclared type, an unallocated address or a field of the wrong kind.
//! Reads through [`Inspector`] never panic.

use std::collections::BTreeMap;

use heapscope_types::HistoryLabel;

use crate::{ExtractError, Field, FieldKind, Inspector};

const HEAP_BASE: u64 = 0x1000;
const RECORD_STRIDE: u64 = 0x20;

pub const LIST_NODE: &str = "ListNode";

/// Declared type of a record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Int,
    /// Pointer to the named type.
    Ptr(String),
    /// Any other type, spelled as given. Its value is opaque.
    Other(String),
}

impl FieldType {
    pub fn ptr(pointee: impl Into<String>) -> Self {
        Self::Ptr(pointee.into())
    }

    fn spelling(&self) -> String {
        match self {
            Self::Int => "int".to_string(),
            Self::Ptr(pointee) => format!("{pointee} *"),
            Self::Other(name) => name.clone(),
        }
    }
}

/// Handle to a value on the synthetic heap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeapValue {
    Pointer {
        pointee: String,
        addr: u64,
        declared_line: Option<u32>,
    },
    Int {
        value: i64,
        declared_line: Option<u32>,
    },
    Opaque {
        type_name: String,
    },
    Invalid,
}

impl HeapValue {
    fn declared_line(&self) -> Option<u32> {
        match self {
            Self::Pointer { declared_line, .. } | Self::Int { declared_line, .. } => *declared_line,
            Self::Opaque { .. } | Self::Invalid => None,
        }
    }

    fn detached(self) -> Self {
        match self {
            Self::Pointer { pointee, addr, .. } => Self::Pointer {
                pointee,
                addr,
                declared_line: None,
            },
            Self::Int { value, .. } => Self::Int {
                value,
                declared_line: None,
            },
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Int(i64),
    Ptr(u64),
    Opaque,
}

#[derive(Debug, Clone)]
struct Record {
    type_name: String,
    slots: BTreeMap<String, Slot>,
}

#[derive(Debug, Clone)]
pub struct SyntheticHeap {
    types: BTreeMap<String, Vec<(String, FieldType)>>,
    records: BTreeMap<u64, Record>,
    next_addr: u64,
    variables: Vec<(String, HeapValue)>,
    location: HistoryLabel,
}

impl Default for SyntheticHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticHeap {
    pub fn new() -> Self {
        Self {
            types: BTreeMap::new(),
            records: BTreeMap::new(),
            next_addr: HEAP_BASE,
            variables: Vec::new(),
            location: HistoryLabel::new("main.cpp", 1, 1, "main"),
        }
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Types and records
    ////////////////////////////////////////////////////////////////////////////////

    /// Declares (or redeclares) a record type with fields in order.
    pub fn declare<I, S>(&mut self, type_name: impl Into<String>, fields: I)
    where
        I: IntoIterator<Item = (S, FieldType)>,
        S: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(name, ty)| (name.into(), ty))
            .collect();
        self.types.insert(type_name.into(), fields);
    }

    pub fn is_declared(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Allocates a zeroed record and returns its address.
    pub fn alloc(&mut self, type_name: &str) -> u64 {
        let Some(decls) = self.types.get(type_name) else {
            panic!("alloc of undeclared record type `{type_name}`");
        };
        let slots = decls
            .iter()
            .map(|(name, ty)| {
                let slot = match ty {
                    FieldType::Int => Slot::Int(0),
                    FieldType::Ptr(_) => Slot::Ptr(0),
                    FieldType::Other(_) => Slot::Opaque,
                };
                (name.clone(), slot)
            })
            .collect();
        let addr = self.next_addr;
        self.next_addr += RECORD_STRIDE;
        self.records.insert(
            addr,
            Record {
                type_name: type_name.to_string(),
                slots,
            },
        );
        addr
    }

    /// Releases a record. Pointers still holding `addr` become dangling.
    pub fn free(&mut self, addr: u64) {
        self.records.remove(&addr);
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn set_int(&mut self, addr: u64, field: &str, value: i64) {
        self.write_slot(addr, field, Slot::Int(value));
    }

    /// Points `field` of the record at `addr` to `target` (`0` for null).
    pub fn set_ptr(&mut self, addr: u64, field: &str, target: u64) {
        self.write_slot(addr, field, Slot::Ptr(target));
    }

    pub fn int(&self, addr: u64, field: &str) -> Option<i64> {
        match self.records.get(&addr)?.slots.get(field)? {
            Slot::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn ptr(&self, addr: u64, field: &str) -> Option<u64> {
        match self.records.get(&addr)?.slots.get(field)? {
            Slot::Ptr(target) => Some(*target),
            _ => None,
        }
    }

    fn write_slot(&mut self, addr: u64, field: &str, slot: Slot) {
        let Some(record) = self.records.get_mut(&addr) else {
            panic!("write to field `{field}` of unallocated address {addr:#x}");
        };
        match record.slots.get_mut(field) {
            Some(existing) if std::mem::discriminant(&*existing) == std::mem::discriminant(&slot) => {
                *existing = slot;
            }
            Some(_) => panic!(
                "field `{field}` of `{}` has a different kind",
                record.type_name
            ),
            None => panic!("`{}` has no field `{field}`", record.type_name),
        }
    }

    /// Declares `ListNode { int val; ListNode *next; }` if needed, then builds
    /// a singly linked list holding `values`. Returns the node addresses in
    /// list order.
    pub fn list(&mut self, values: &[i64]) -> Vec<u64> {
        if !self.is_declared(LIST_NODE) {
            self.declare(
                LIST_NODE,
                [("val", FieldType::Int), ("next", FieldType::ptr(LIST_NODE))],
            );
        }
        let addrs: Vec<u64> = values
            .iter()
            .map(|value| {
                let addr = self.alloc(LIST_NODE);
                self.set_int(addr, "val", *value);
                addr
            })
            .collect();
        for pair in addrs.windows(2) {
            self.set_ptr(pair[0], "next", pair[1]);
        }
        addrs
    }

    /// A pointer handle not tied to any variable.
    pub fn pointer(&self, pointee: &str, addr: u64) -> HeapValue {
        HeapValue::Pointer {
            pointee: pointee.to_string(),
            addr,
            declared_line: None,
        }
    }

    ////////////////////////////////////////////////////////////////////////////////
    // Frame
    ////////////////////////////////////////////////////////////////////////////////

    /// Declares a pointer variable on `line`, or reassigns it if it exists.
    pub fn bind(&mut self, name: &str, pointee: &str, addr: u64, line: u32) {
        let value = HeapValue::Pointer {
            pointee: pointee.to_string(),
            addr,
            declared_line: Some(line),
        };
        self.put_variable(name, value);
    }

    pub fn bind_int(&mut self, name: &str, value: i64, line: u32) {
        let value = HeapValue::Int {
            value,
            declared_line: Some(line),
        };
        self.put_variable(name, value);
    }

    /// Points an existing pointer variable at `addr`, keeping its declaration.
    pub fn assign(&mut self, name: &str, addr: u64) {
        match self.variables.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, HeapValue::Pointer { addr: slot, .. })) => *slot = addr,
            Some(_) => panic!("variable `{name}` is not a pointer"),
            None => panic!("assignment to undeclared variable `{name}`"),
        }
    }

    fn put_variable(&mut self, name: &str, value: HeapValue) {
        match self.variables.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.variables.push((name.to_string(), value)),
        }
    }

    pub fn variable(&self, name: &str) -> Option<&HeapValue> {
        self.variables
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn set_location(&mut self, location: HistoryLabel) {
        self.location = location;
    }

    /// Moves the stop location to `line` of the current function.
    pub fn stop_at(&mut self, line: u32) {
        self.location.line = line;
    }

    fn field_value(&self, record: &Record, field: &str) -> Option<HeapValue> {
        let decls = self.types.get(&record.type_name)?;
        let (_, ty) = decls.iter().find(|(name, _)| name == field)?;
        let slot = record.slots.get(field)?;
        Some(match (ty, slot) {
            (FieldType::Int, Slot::Int(value)) => HeapValue::Int {
                value: *value,
                declared_line: None,
            },
            (FieldType::Ptr(pointee), Slot::Ptr(addr)) => HeapValue::Pointer {
                pointee: pointee.clone(),
                addr: *addr,
                declared_line: None,
            },
            (ty, _) => HeapValue::Opaque {
                type_name: ty.spelling(),
            },
        })
    }
}

impl Inspector for SyntheticHeap {
    type Value = HeapValue;

    fn is_valid(&self, value: &HeapValue) -> bool {
        match value {
            HeapValue::Invalid => false,
            HeapValue::Pointer { addr, .. } => *addr == 0 || self.records.contains_key(addr),
            HeapValue::Int { .. } | HeapValue::Opaque { .. } => true,
        }
    }

    fn pointee_record(&self, value: &HeapValue) -> Option<String> {
        match value {
            HeapValue::Pointer { pointee, .. } if self.types.contains_key(pointee) => {
                Some(pointee.clone())
            }
            _ => None,
        }
    }

    fn address(&self, value: &HeapValue) -> u64 {
        match value {
            HeapValue::Pointer { addr, .. } => *addr,
            _ => 0,
        }
    }

    fn fields(&self, value: &HeapValue) -> Vec<Field<HeapValue>> {
        let HeapValue::Pointer { addr, .. } = value else {
            return Vec::new();
        };
        let Some(record) = self.records.get(addr) else {
            return Vec::new();
        };
        let Some(decls) = self.types.get(&record.type_name) else {
            return Vec::new();
        };
        decls
            .iter()
            .map(|(name, ty)| {
                let kind = match ty {
                    FieldType::Int => FieldKind::Int,
                    FieldType::Ptr(pointee) if self.types.contains_key(pointee) => {
                        FieldKind::RecordPointer {
                            pointee: pointee.clone(),
                        }
                    }
                    FieldType::Ptr(_) | FieldType::Other(_) => FieldKind::Other,
                };
                Field {
                    name: name.clone(),
                    type_name: ty.spelling(),
                    kind,
                    value: self
                        .field_value(record, name)
                        .unwrap_or(HeapValue::Invalid),
                }
            })
            .collect()
    }

    fn int_value(&self, value: &HeapValue) -> Option<i64> {
        match value {
            HeapValue::Int { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Understands variable names followed by `->field` chains.
    fn evaluate(&self, expr: &str) -> Result<HeapValue, ExtractError> {
        let fail = |reason: String| ExtractError::Evaluate {
            expr: expr.to_string(),
            reason,
        };

        let mut parts = expr.trim().split("->").map(str::trim);
        let root = parts.next().unwrap_or_default();
        if root.is_empty() {
            return Err(fail("empty expression".to_string()));
        }
        let mut value = self
            .variable(root)
            .cloned()
            .ok_or_else(|| fail(format!("use of undeclared identifier `{root}`")))?;

        for field in parts {
            let HeapValue::Pointer { addr, .. } = &value else {
                return Err(fail(format!("`->{field}` applied to a non-pointer")));
            };
            if *addr == 0 {
                return Err(fail(format!("null dereference before `->{field}`")));
            }
            let record = self
                .records
                .get(addr)
                .ok_or_else(|| fail(format!("read of unmapped address {addr:#x}")))?;
            value = self.field_value(record, field).ok_or_else(|| {
                fail(format!("no member named `{field}` in `{}`", record.type_name))
            })?;
        }

        Ok(value.detached())
    }

    fn frame_variables(&self) -> Vec<(String, HeapValue)> {
        self.variables.clone()
    }

    fn is_initialized_at_current_location(&self, value: &HeapValue) -> bool {
        value
            .declared_line()
            .is_none_or(|line| self.location.line > line)
    }

    fn location(&self) -> HistoryLabel {
        self.location.clone()
    }
}
