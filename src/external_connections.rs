use sqlx::PgConnection;

/// Owner of clients for external systems, currently just the database. Driven adapters
/// accept an implementation of this trait rather than a concrete connection so business
/// logic can run against a connection pool, an open transaction, or a test fake without
/// knowing which one it has.
pub trait ExternalConnectivity {
    type DbHandle<'handle>: ConnectionHandle
    where
        Self: 'handle;

    /// Acquires a handle which can be used to communicate with the database
    async fn database_cxn(&mut self) -> Result<Self::DbHandle<'_>, anyhow::Error>;
}

/// A held database connection which queries can be executed against
pub trait ConnectionHandle {
    fn borrow_connection(&mut self) -> &mut PgConnection;
}

/// Implemented by connectivity owners which can open a database transaction. The
/// returned handle is itself an [ExternalConnectivity], so the same driven adapters
/// work inside and outside a transaction.
pub trait Transactable {
    type Handle: ExternalConnectivity + TransactionHandle;

    async fn start_transaction(&self) -> Result<Self::Handle, anyhow::Error>;
}

/// An active transaction context. Dropping the handle without calling [commit](TransactionHandle::commit)
/// rolls the transaction back.
pub trait TransactionHandle {
    async fn commit(self) -> Result<(), anyhow::Error>;
}
