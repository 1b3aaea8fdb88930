use crate::domain::todo::Todo;
use uuid::Uuid;

/// The verified identity of the user making a request. Token verification happens in
/// an outer layer; by the time business logic runs, the caller is already known to
/// be authenticated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub is_superuser: bool,
}

impl Caller {
    /// Ownership check applied before any single-record read or mutation. Superusers
    /// bypass the ownership requirement. Listing is deliberately not guarded by this
    /// rule, as list queries are always scoped to the caller's own records.
    pub fn can_access(&self, todo: &Todo) -> bool {
        self.is_superuser || todo.owner_id == self.id
    }
}
