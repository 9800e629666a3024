#![forbid(unsafe_code)]

//! relink public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users: a
//! [`Connection`] maps a store's state into props and its dispatch function
//! into actions, then pushes individual props fields into sinks only when
//! they change.

pub use relink_runtime::{
    Binder, BindingScope, Connection, ConnectionConfig, ConnectionError, Equality, EquatableBox,
    PropsStream, SectionModel, SectionedDataSource, Sink, SinkCell, SinkLog, Subscription,
    SubscriptionHandle, bind, subscribe,
};
#[cfg(feature = "config")]
pub use relink_runtime::ConfigError;
pub use relink_store::{Action, DispatchFn, StateStore, Store, StoreError};

pub mod prelude {
    pub use relink_runtime as runtime;
    pub use relink_runtime::reactive::Optional;
    pub use relink_runtime::{
        Connection, ConnectionConfig, Equality, SectionModel, Sink, SinkCell, bind, subscribe,
    };
    pub use relink_store as store;
    pub use relink_store::{Action, DispatchFn, StateStore, Store};
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[derive(Debug)]
    struct Rename(&'static str);

    impl Action for Rename {}

    #[derive(Debug, Clone)]
    struct Props {
        name: String,
    }

    #[test]
    fn prelude_wires_a_connection() {
        let store = Store::new(|a: &Rename, _: &String| a.0.to_string(), "a".to_string());
        let connection = Connection::new(
            store.clone(),
            |s: &String| Props { name: s.clone() },
            |dispatch: DispatchFn<Rename>| dispatch,
        );
        connection.connect();

        let name: SinkCell<String> = SinkCell::new();
        bind!(connection, name => name.clone());
        connection.actions()(Rename("b"));
        assert_eq!(name.get().as_deref(), Some("b"));
        assert_eq!(connection.props().name, "b");
    }
}
