//! Append-only registry of type descriptors.
//!
//! Types are referenced by opaque `TypeId`; equality between
//! descriptors is structural and answered by the predicates here, not
//! by id comparison.

/// Opaque handle into the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(usize);

impl TypeId {
    /// The registry reserves slot 0 for the error type, so the
    /// decoration table can hand out a default without a registry ref.
    pub const ERROR: TypeId = TypeId(0);
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Integer,
    Float,
    Boolean,
    Character,
    Array { size: usize, elem: TypeId },
    Function { params: Vec<TypeId>, ret: TypeId },
    Void,
    Error,
}

pub struct TypeRegistry {
    types: Vec<Type>,
}

// Fixed slots created by `new`, in order.
const ERROR_SLOT: usize = 0;
const VOID_SLOT: usize = 1;
const INTEGER_SLOT: usize = 2;
const FLOAT_SLOT: usize = 3;
const BOOLEAN_SLOT: usize = 4;
const CHARACTER_SLOT: usize = 5;

impl TypeRegistry {
    pub fn new() -> Self {
        Self {
            types: vec![
                Type::Error,
                Type::Void,
                Type::Integer,
                Type::Float,
                Type::Boolean,
                Type::Character,
            ],
        }
    }

    fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0]
    }

    // ── Creation ─────────────────────────────────────────────────────

    pub fn create_error_ty(&self) -> TypeId {
        TypeId(ERROR_SLOT)
    }

    pub fn create_void_ty(&self) -> TypeId {
        TypeId(VOID_SLOT)
    }

    pub fn create_integer_ty(&self) -> TypeId {
        TypeId(INTEGER_SLOT)
    }

    pub fn create_float_ty(&self) -> TypeId {
        TypeId(FLOAT_SLOT)
    }

    pub fn create_boolean_ty(&self) -> TypeId {
        TypeId(BOOLEAN_SLOT)
    }

    pub fn create_character_ty(&self) -> TypeId {
        TypeId(CHARACTER_SLOT)
    }

    pub fn create_array_ty(&mut self, size: usize, elem: TypeId) -> TypeId {
        self.types.push(Type::Array { size, elem });
        TypeId(self.types.len() - 1)
    }

    pub fn create_function_ty(&mut self, params: Vec<TypeId>, ret: TypeId) -> TypeId {
        self.types.push(Type::Function { params, ret });
        TypeId(self.types.len() - 1)
    }

    // ── Classification ───────────────────────────────────────────────

    pub fn is_integer_ty(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Integer)
    }

    pub fn is_float_ty(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Float)
    }

    pub fn is_boolean_ty(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Boolean)
    }

    pub fn is_character_ty(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Character)
    }

    pub fn is_void_ty(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Void)
    }

    pub fn is_error_ty(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Error)
    }

    pub fn is_array_ty(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Array { .. })
    }

    pub fn is_function_ty(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Function { .. })
    }

    pub fn is_primitive_ty(&self, id: TypeId) -> bool {
        matches!(
            self.get(id),
            Type::Integer | Type::Float | Type::Boolean | Type::Character
        )
    }

    pub fn is_numeric_ty(&self, id: TypeId) -> bool {
        matches!(self.get(id), Type::Integer | Type::Float)
    }

    // ── Structural predicates ────────────────────────────────────────

    pub fn equal_types(&self, a: TypeId, b: TypeId) -> bool {
        match (self.get(a), self.get(b)) {
            (Type::Integer, Type::Integer)
            | (Type::Float, Type::Float)
            | (Type::Boolean, Type::Boolean)
            | (Type::Character, Type::Character)
            | (Type::Void, Type::Void) => true,
            (Type::Array { size: s1, elem: e1 }, Type::Array { size: s2, elem: e2 }) => {
                s1 == s2 && self.equal_types(*e1, *e2)
            }
            (Type::Function { params: p1, ret: r1 }, Type::Function { params: p2, ret: r2 }) => {
                p1.len() == p2.len()
                    && self.equal_types(*r1, *r2)
                    && p1.iter().zip(p2).all(|(a, b)| self.equal_types(*a, *b))
            }
            _ => false,
        }
    }

    /// Whether a value of type `src` can be assigned into `dst`
    /// (equal types, or int widened into float).
    pub fn copyable_types(&self, dst: TypeId, src: TypeId) -> bool {
        self.equal_types(dst, src) || (self.is_float_ty(dst) && self.is_integer_ty(src))
    }

    /// Whether `a op b` is a valid comparison. Numerics compare freely;
    /// booleans and characters only under equality operators.
    pub fn comparable_types(&self, a: TypeId, b: TypeId, op: &str) -> bool {
        if self.is_numeric_ty(a) && self.is_numeric_ty(b) {
            return true;
        }
        let equality = op == "==" || op == "!=";
        if !equality {
            return false;
        }
        (self.is_boolean_ty(a) && self.is_boolean_ty(b))
            || (self.is_character_ty(a) && self.is_character_ty(b))
    }

    // ── Component access ─────────────────────────────────────────────

    pub fn get_array_elem_type(&self, id: TypeId) -> TypeId {
        match self.get(id) {
            Type::Array { elem, .. } => *elem,
            _ => TypeId::ERROR,
        }
    }

    pub fn get_array_size(&self, id: TypeId) -> usize {
        match self.get(id) {
            Type::Array { size, .. } => *size,
            _ => 0,
        }
    }

    pub fn get_func_return_type(&self, id: TypeId) -> TypeId {
        match self.get(id) {
            Type::Function { ret, .. } => *ret,
            _ => TypeId::ERROR,
        }
    }

    pub fn get_func_params_types(&self, id: TypeId) -> Vec<TypeId> {
        match self.get(id) {
            Type::Function { params, .. } => params.clone(),
            _ => Vec::new(),
        }
    }

    pub fn get_num_of_parameters(&self, id: TypeId) -> usize {
        match self.get(id) {
            Type::Function { params, .. } => params.len(),
            _ => 0,
        }
    }

    pub fn is_void_function(&self, id: TypeId) -> bool {
        match self.get(id) {
            Type::Function { ret, .. } => self.is_void_ty(*ret),
            _ => false,
        }
    }

    /// Element count for arrays, 1 for everything else.
    pub fn get_size_of_type(&self, id: TypeId) -> usize {
        match self.get(id) {
            Type::Array { size, .. } => *size,
            _ => 1,
        }
    }

    pub fn to_string(&self, id: TypeId) -> String {
        match self.get(id) {
            Type::Integer => "int".to_string(),
            Type::Float => "float".to_string(),
            Type::Boolean => "bool".to_string(),
            Type::Character => "char".to_string(),
            Type::Void => "void".to_string(),
            Type::Error => "<error>".to_string(),
            Type::Array { size, elem } => {
                format!("array [{}] of {}", size, self.to_string(*elem))
            }
            Type::Function { params, ret } => {
                let params = params
                    .iter()
                    .map(|p| self.to_string(*p))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("function ({}) -> {}", params, self.to_string(*ret))
            }
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_slots_are_stable() {
        let types = TypeRegistry::new();
        assert_eq!(types.create_error_ty(), TypeId::ERROR);
        assert!(types.is_integer_ty(types.create_integer_ty()));
        assert!(types.is_void_ty(types.create_void_ty()));
    }

    #[test]
    fn array_equality_is_structural() {
        let mut types = TypeRegistry::new();
        let int = types.create_integer_ty();
        let a = types.create_array_ty(10, int);
        let b = types.create_array_ty(10, int);
        let c = types.create_array_ty(5, int);
        assert_ne!(a, b);
        assert!(types.equal_types(a, b));
        assert!(!types.equal_types(a, c));
    }

    #[test]
    fn copyable_allows_int_to_float() {
        let types = TypeRegistry::new();
        let int = types.create_integer_ty();
        let float = types.create_float_ty();
        assert!(types.copyable_types(float, int));
        assert!(!types.copyable_types(int, float));
    }

    #[test]
    fn comparable_restricts_bools_and_chars() {
        let types = TypeRegistry::new();
        let int = types.create_integer_ty();
        let float = types.create_float_ty();
        let boolean = types.create_boolean_ty();
        let ch = types.create_character_ty();
        assert!(types.comparable_types(int, float, "<"));
        assert!(types.comparable_types(boolean, boolean, "=="));
        assert!(!types.comparable_types(boolean, boolean, "<"));
        assert!(types.comparable_types(ch, ch, "!="));
        assert!(!types.comparable_types(ch, int, "=="));
    }

    #[test]
    fn void_function_detection() {
        let mut types = TypeRegistry::new();
        let void = types.create_void_ty();
        let int = types.create_integer_ty();
        let proc_ty = types.create_function_ty(vec![], void);
        let func_ty = types.create_function_ty(vec![int], int);
        assert!(types.is_void_function(proc_ty));
        assert!(!types.is_void_function(func_ty));
        assert_eq!(types.get_num_of_parameters(func_ty), 1);
    }
}
