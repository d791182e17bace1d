//! Listener dispatch: turns the engine's flat, unscoped event stream into
//! table-scoped notifications.
//!
//! Three entry scopes are built on the engine's single prefix subscription:
//!
//! - **table**: direct children of a table only, never deeper descendants;
//! - **key**: one absolute key, reported under the name it was registered with;
//! - **subtable**: each child subtable announced once per registration.
//!
//! Connection listeners get one engine connection subscription each.
//!
//! Registrations are keyed by listener identity (`Arc` pointer), so every
//! registration made with one listener object is torn down by a single
//! `remove_table_listener`. Bookkeeping is held locked only around map
//! updates, never while the engine or user code runs.

mod adapters;
mod dispatcher;


pub(crate) use dispatcher::ListenerDispatcher;

use crate::ConnectionInfo;
use crate::NotifyFlags;
use crate::Table;
use crate::Value;

/// Receives entry and subtable notifications from a [`Table`].
///
/// Both methods default to doing nothing so a listener only implements the
/// scopes it registers for.
pub trait TableListener: Send + Sync {
    /// A direct child entry (table scope) or the watched key (key scope)
    /// changed.
    fn value_changed(
        &self,
        _source: &Table,
        _key: &str,
        _value: &Value,
        _flags: NotifyFlags,
    ) {
    }

    /// A subtable of `source` was seen for the first time by this
    /// registration.
    fn sub_table_added(
        &self,
        _source: &Table,
        _name: &str,
        _sub_table: &Table,
        _flags: NotifyFlags,
    ) {
    }
}

/// Receives peer connection state changes.
pub trait ConnectionListener: Send + Sync {
    fn connected(
        &self,
        source: &Table,
        info: &ConnectionInfo,
    );

    fn disconnected(
        &self,
        source: &Table,
        info: &ConnectionInfo,
    );
}
