//! Identity table
//!
//! Maps native drawable ids to the one live wrapper for that id, so that two
//! references to the same server resource are the same object. Entries are
//! weak: the table never keeps a drawable alive, and an entry whose wrapper
//! has been dropped is replaced on the next sighting.

use super::connection::{Connection, ConnectionCore};
use super::drawable::{Drawable, DrawableInner};
use super::state::DrawableState;
use crate::error::{Error, Result};
use crate::protocol::XID;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

/// Ids are scoped by the connection that reported them
type Key = (u64, XID);

/// Connection serials are unique across every registry in the process
static NEXT_CONNECTION: AtomicU64 = AtomicU64::new(1);

/// Issue the scope key for a newly opened connection
pub(crate) fn next_connection_serial() -> u64 {
    NEXT_CONNECTION.fetch_add(1, Ordering::Relaxed)
}

#[derive(Default)]
struct RegistryInner {
    entries: RefCell<HashMap<Key, Weak<DrawableInner>>>,
}

/// Registry of live drawable wrappers, shared by every connection opened
/// against it.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Rc<RegistryInner>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `connection` was opened against this registry
    pub fn owns(&self, connection: &Connection) -> bool {
        Rc::ptr_eq(&self.inner, &connection.registry().inner)
    }

    fn check_owner(&self, op: &'static str, connection: &Connection) -> Result<()> {
        if self.owns(connection) {
            Ok(())
        } else {
            Err(Error::ForeignResource { op })
        }
    }

    /// Register a drawable this process created
    pub(crate) fn insert(&self, drawable: &Drawable) {
        let key = (drawable.inner().core.serial, drawable.id());
        log::trace!("registry: insert {} (connection {})", key.1, key.0);
        self.inner
            .entries
            .borrow_mut()
            .insert(key, Rc::downgrade(drawable.inner()));
    }

    /// Look up `id` on `connection`, synthesizing a third-party wrapper on
    /// first sight. The none id yields `None`. The connection must have been
    /// opened against this registry.
    pub fn lookup_or_create(&self, connection: &Connection, id: XID) -> Result<Option<Drawable>> {
        self.check_owner("lookup_or_create", connection)?;
        Ok(self.resolve(connection.core(), id))
    }

    /// Look up `id` without creating anything
    pub fn lookup(&self, connection: &Connection, id: XID) -> Result<Option<Drawable>> {
        self.check_owner("lookup", connection)?;
        let key = (connection.core().serial, id);
        Ok(self
            .inner
            .entries
            .borrow()
            .get(&key)
            .and_then(Weak::upgrade)
            .map(Drawable::from_inner))
    }

    pub(crate) fn resolve(&self, core: &Rc<ConnectionCore>, id: XID) -> Option<Drawable> {
        if id.is_none() {
            return None;
        }

        let key = (core.serial, id);
        let mut entries = self.inner.entries.borrow_mut();
        if let Some(inner) = entries.get(&key).and_then(Weak::upgrade) {
            return Some(Drawable::from_inner(inner));
        }

        log::debug!("registry: first sight of {}, wrapping as third party", id);
        let drawable = Drawable::new(core.clone(), id, DrawableState::THIRD_PARTY);
        entries.insert(key, Rc::downgrade(drawable.inner()));
        Some(drawable)
    }

    /// Drop the entry for a wrapper that is being finalized
    pub(crate) fn forget(&self, serial: u64, id: XID) {
        if let Ok(mut entries) = self.inner.entries.try_borrow_mut() {
            let key = (serial, id);
            if entries.get(&key).map_or(false, |w| w.strong_count() == 0) {
                entries.remove(&key);
            }
        }
    }

    /// Number of entries whose wrapper is still alive
    pub fn live_entries(&self) -> usize {
        self.inner
            .entries
            .borrow()
            .values()
            .filter(|w| w.strong_count() > 0)
            .count()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("entries", &self.inner.entries.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullSession;

    fn open(registry: &Registry) -> Connection {
        Connection::with_session(registry, Box::new(NullSession::new()))
    }

    #[test]
    fn test_none_is_absent() {
        let registry = Registry::new();
        let conn = open(&registry);
        assert!(registry.lookup_or_create(&conn, XID::NONE).unwrap().is_none());
        assert_eq!(registry.live_entries(), 0);
    }

    #[test]
    fn test_dedup() {
        let registry = Registry::new();
        let conn = open(&registry);
        let a = registry.lookup_or_create(&conn, XID(0x1234)).unwrap().unwrap();
        let b = registry.lookup_or_create(&conn, XID(0x1234)).unwrap().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.state(), DrawableState::THIRD_PARTY);
        assert_eq!(registry.live_entries(), 1);
    }

    #[test]
    fn test_expired_entry_is_replaced() {
        let registry = Registry::new();
        let conn = open(&registry);
        let first = registry.lookup_or_create(&conn, XID(0x99)).unwrap().unwrap();
        drop(first);
        assert!(registry.lookup(&conn, XID(0x99)).unwrap().is_none());
        let second = registry.lookup_or_create(&conn, XID(0x99)).unwrap().unwrap();
        assert_eq!(second.state(), DrawableState::THIRD_PARTY);
    }

    #[test]
    fn test_scoped_per_connection() {
        let registry = Registry::new();
        let one = open(&registry);
        let two = open(&registry);
        let a = registry.lookup_or_create(&one, XID(0x50)).unwrap().unwrap();
        let b = registry.lookup_or_create(&two, XID(0x50)).unwrap().unwrap();
        assert_ne!(a, b);
        assert_eq!(b.connection().as_ref(), Some(&two));
    }

    #[test]
    fn test_isolated_registries() {
        let r1 = Registry::new();
        let r2 = Registry::new();
        let c1 = open(&r1);
        let c2 = open(&r2);
        let _w = r1.lookup_or_create(&c1, XID(7)).unwrap().unwrap();
        assert_eq!(r1.live_entries(), 1);
        assert_eq!(r2.live_entries(), 0);
        assert_ne!(c1.core().serial, c2.core().serial);
    }

    #[test]
    fn test_rejects_connection_of_other_registry() {
        let r1 = Registry::new();
        let r2 = Registry::new();
        let c1 = open(&r1);
        let c2 = open(&r2);
        assert!(r1.owns(&c1));
        assert!(!r1.owns(&c2));

        let err = r1.lookup_or_create(&c2, XID(0x42)).unwrap_err();
        assert!(matches!(err, Error::ForeignResource { op: "lookup_or_create" }));
        assert!(r1.lookup(&c2, XID(0x42)).is_err());
        assert_eq!(r1.live_entries(), 0);
    }
}
