//! Side table of derived attributes, keyed by node identity.
//!
//! Symbol collection writes scopes and declaration types; the type
//! checker writes expression types and l-value flags; later passes only
//! read. A missing type reads as the error type and a missing l-value
//! flag as false.

use crate::ast::NodeId;
use crate::sem::symbols::ScopeId;
use crate::sem::types::TypeId;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
struct Decoration {
    scope: Option<ScopeId>,
    ty: Option<TypeId>,
    lvalue: Option<bool>,
}

#[derive(Default)]
pub struct Decorations {
    map: HashMap<NodeId, Decoration>,
}

impl Decorations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_scope(&mut self, node: NodeId, scope: ScopeId) {
        self.map.entry(node).or_default().scope = Some(scope);
    }

    pub fn put_type(&mut self, node: NodeId, ty: TypeId) {
        self.map.entry(node).or_default().ty = Some(ty);
    }

    pub fn put_is_lvalue(&mut self, node: NodeId, lvalue: bool) {
        self.map.entry(node).or_default().lvalue = Some(lvalue);
    }

    pub fn get_scope(&self, node: NodeId) -> Option<ScopeId> {
        self.map.get(&node).and_then(|d| d.scope)
    }

    pub fn get_type(&self, node: NodeId) -> TypeId {
        self.map
            .get(&node)
            .and_then(|d| d.ty)
            .unwrap_or(TypeId::ERROR)
    }

    pub fn get_is_lvalue(&self, node: NodeId) -> bool {
        self.map
            .get(&node)
            .and_then(|d| d.lvalue)
            .unwrap_or(false)
    }
}
