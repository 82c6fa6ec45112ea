//! Runtime values and heap (spec §3 "Runtime values and the heap", §4.4).

use devin_core::Type;
use num_bigint::BigInt;
use num_rational::BigRational;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub usize);

/// A Devin runtime value. `Function` is part of the data model for parity
/// with spec §3 but is never constructed by the current grammar — Devin has
/// no syntax that yields a function as a first-class value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(BigInt),
    Float(BigRational),
    Array(ArrayId),
    Function(FunctionId),
}

impl Value {
    /// The static type of a runtime value; arrays consult the heap for
    /// their declared element type.
    pub fn type_of(&self, heap: &Heap) -> Type {
        match self {
            Value::Unit => Type::Unit,
            Value::Bool(_) => Type::Bool,
            Value::Int(_) => Type::Int,
            Value::Float(_) => Type::Float,
            Value::Array(id) => Type::array(heap.array(*id).element_type.clone()),
            Value::Function(_) => Type::Unknown("Function".to_string()),
        }
    }
}

pub struct ArrayRecord {
    pub element_type: Type,
    pub elements: Vec<Value>,
}

/// A storage slot an l-value resolves to: either a whole cell (a bare
/// variable) or one element of an array record (an access chain like
/// `a[i]`). A `ref` parameter binds its name to the *same* `Location` its
/// argument expression resolved to, so reads/writes through either name see
/// the same storage — this is what makes `ref` aliasing work uniformly for
/// scalars and array elements.
#[derive(Debug, Clone, Copy)]
pub enum Location {
    Cell(CellId),
    ArrayElement(ArrayId, usize),
}

/// A flat arena: cells hold scalar/array-id values, array records hold
/// element vectors. Nothing is ever reclaimed mid-execution (spec §4.4).
#[derive(Default)]
pub struct Heap {
    cells: Vec<Value>,
    arrays: Vec<ArrayRecord>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_cell(&mut self, value: Value) -> CellId {
        self.cells.push(value);
        CellId(self.cells.len() - 1)
    }

    pub fn get(&self, id: CellId) -> &Value {
        &self.cells[id.0]
    }

    pub fn set(&mut self, id: CellId, value: Value) {
        self.cells[id.0] = value;
    }

    pub fn alloc_array(&mut self, element_type: Type, elements: Vec<Value>) -> ArrayId {
        self.arrays.push(ArrayRecord { element_type, elements });
        ArrayId(self.arrays.len() - 1)
    }

    pub fn array(&self, id: ArrayId) -> &ArrayRecord {
        &self.arrays[id.0]
    }

    pub fn array_mut(&mut self, id: ArrayId) -> &mut ArrayRecord {
        &mut self.arrays[id.0]
    }

    pub fn read_location(&self, loc: Location) -> Value {
        match loc {
            Location::Cell(id) => self.get(id).clone(),
            Location::ArrayElement(aid, index) => self.array(aid).elements[index].clone(),
        }
    }

    pub fn write_location(&mut self, loc: Location, value: Value) {
        match loc {
            Location::Cell(id) => self.set(id, value),
            Location::ArrayElement(aid, index) => self.array_mut(aid).elements[index] = value,
        }
    }

    /// Clones a value, recursing into arrays so the copy shares no `ArrayId`
    /// with the original. Used exactly once: binding a `var` whose
    /// initializer is (or contains) an array, per the deep-copy choice in
    /// spec §9's open question on `var` aliasing. `ref` binding and by-value
    /// parameter passing do not call this — they copy the `Value` itself,
    /// which for an array is only its id.
    pub fn deep_copy(&mut self, value: &Value) -> Value {
        match value {
            Value::Array(id) => {
                let element_type = self.array(*id).element_type.clone();
                let elements = self.array(*id).elements.clone();
                let copied: Vec<Value> = elements.iter().map(|e| self.deep_copy(e)).collect();
                Value::Array(self.alloc_array(element_type, copied))
            }
            other => other.clone(),
        }
    }

    /// Element-wise deep equality (spec §4.3 "`==` on arrays"): arrays of
    /// equal id are trivially equal, arrays of equal content but distinct
    /// ids are equal too.
    pub fn values_equal(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(x), Value::Bool(y)) => x == y,
            (Value::Int(x), Value::Int(y)) => x == y,
            (Value::Float(x), Value::Float(y)) => x == y,
            (Value::Array(x), Value::Array(y)) => {
                if x == y {
                    return true;
                }
                let lhs = &self.array(*x).elements;
                let rhs = &self.array(*y).elements;
                lhs.len() == rhs.len()
                    && lhs.iter().zip(rhs).all(|(e1, e2)| self.values_equal(e1, e2))
            }
            (Value::Function(x), Value::Function(y)) => x == y,
            _ => false,
        }
    }
}
