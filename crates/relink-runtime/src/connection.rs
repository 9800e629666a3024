#![forbid(unsafe_code)]

//! Store-to-view connection.
//!
//! A [`Connection`] subscribes to a [`StateStore`], maps each state snapshot
//! into props, keeps the props in a [`PropsStream`], and hands out
//! change-filtered subscriptions and bindings to individual props fields. It
//! also builds the actions bundle once, from the store's dispatch function.
//!
//! # Lifecycle
//!
//! ```text
//! new ──► connect ──► (state updates: map → props → field fan-out)* ──► disconnect
//!   ▲                                                                     │
//!   └──────────────────────────── connect again ◄────────────────────────┘
//! ```
//!
//! Initial props come from the store's current state at construction time,
//! whether or not the connection is ever connected.
//!
//! # Invariants
//!
//! 1. At most one store registration per connection.
//! 2. After every update, `props()` equals `map_state_to_props(latest)`.
//! 3. After `disconnect`, store transitions have no effect on props or on any
//!    subscription.
//! 4. All delivery happens synchronously, before `new_state`/`set_props`
//!    returns.
//! 5. Dropping the connection unregisters it and releases every subscription.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Store torn down | `connect` after `tear_down` | `try_connect` errors; `connect` logs and stays disconnected |
//! | Mapping panics | Bug in `map_state_to_props` | Propagates; props keep the last value |
//! | Accessor/equality/sink panics | Bug in a subscriber | Propagates through the update |
//! | Redundant lifecycle call | `connect` twice, `disconnect` when idle | No-op |

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use relink_store::{DispatchFn, ListenerId, StateListener, StateStore};

use crate::config::ConnectionConfig;
use crate::error::ConnectionError;
use crate::reactive::binding::{Binder, BindingScope, SubscriptionHandle};
use crate::reactive::equality::Equality;
use crate::reactive::props::PropsStream;
use crate::reactive::sink::Sink;
use crate::reactive::subscription::subscribe_field;

type MapStateToProps<S, P> = Box<dyn Fn(&S) -> P>;

struct ConnectionInner<St: StateStore, P, A> {
    store: St,
    map_state_to_props: MapStateToProps<St::State, P>,
    props: PropsStream<P>,
    actions: A,
    registration: Cell<Option<ListenerId>>,
    scope: Rc<RefCell<BindingScope>>,
    config: ConnectionConfig,
}

impl<St: StateStore, P: 'static, A> ConnectionInner<St, P, A> {
    fn new_state(&self, state: &St::State) {
        let _span = tracing::trace_span!("relink.new_state", connection = %self.config.label)
            .entered();
        let props = (self.map_state_to_props)(state);
        self.props.accept(props);
        tracing::trace!(version = self.props.version(), "props updated");
    }
}

/// Binds one store to one props/actions pair.
///
/// `St` is the store handle, `P` the props type derived from its state, and
/// `A` the actions bundle.
pub struct Connection<St: StateStore, P, A> {
    inner: Rc<ConnectionInner<St, P, A>>,
}

impl<St, P, A> Connection<St, P, A>
where
    St: StateStore + 'static,
    P: 'static,
    A: 'static,
{
    /// Create a connection with the default configuration.
    ///
    /// The connection is not registered with the store until
    /// [`connect`](Self::connect) is called.
    pub fn new(
        store: St,
        map_state_to_props: impl Fn(&St::State) -> P + 'static,
        map_dispatch_to_actions: impl FnOnce(DispatchFn<St::Action>) -> A,
    ) -> Self {
        Self::with_config(
            store,
            map_state_to_props,
            map_dispatch_to_actions,
            ConnectionConfig::default(),
        )
    }

    /// Create a connection with an explicit configuration.
    pub fn with_config(
        store: St,
        map_state_to_props: impl Fn(&St::State) -> P + 'static,
        map_dispatch_to_actions: impl FnOnce(DispatchFn<St::Action>) -> A,
        config: ConnectionConfig,
    ) -> Self {
        let state = store.state();
        let initial = map_state_to_props(state.as_ref());
        let actions = map_dispatch_to_actions(store.dispatch_function());
        Self {
            inner: Rc::new(ConnectionInner {
                store,
                map_state_to_props: Box::new(map_state_to_props),
                props: PropsStream::new(initial),
                actions,
                registration: Cell::new(None),
                scope: Rc::new(RefCell::new(BindingScope::new())),
                config,
            }),
        }
    }

    /// Register with the store.
    ///
    /// Does nothing when already connected. A store that refuses the
    /// registration is logged and the connection stays disconnected.
    pub fn connect(&self) {
        if let Err(err) = self.try_connect() {
            tracing::error!(connection = %self.inner.config.label, error = %err, "connect failed");
        }
    }

    /// Register with the store, reporting refusal.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Store`] if the store does not accept new
    /// listeners (for example after it was torn down).
    pub fn try_connect(&self) -> Result<(), ConnectionError> {
        if self.inner.registration.get().is_some() {
            tracing::trace!(connection = %self.inner.config.label, "already connected");
            return Ok(());
        }
        let weak = Rc::downgrade(&self.inner);
        let listener: StateListener<St::State> = Rc::new(move |state: &St::State| {
            if let Some(inner) = weak.upgrade() {
                inner.new_state(state);
            }
        });
        let id = self.inner.store.subscribe(listener)?;
        self.inner.registration.set(Some(id));
        tracing::debug!(connection = %self.inner.config.label, "connected");
        Ok(())
    }

    /// Recompute props from `state` and notify subscribers.
    ///
    /// This is what a store notification does; calling it directly bypasses
    /// the store.
    pub fn new_state(&self, state: &St::State) {
        self.inner.new_state(state);
    }

    /// Current props.
    #[must_use]
    pub fn props(&self) -> Rc<P> {
        self.inner.props.value()
    }

    /// The underlying props stream.
    #[must_use]
    pub fn props_stream(&self) -> &PropsStream<P> {
        &self.inner.props
    }

    /// Force the props value without going through `map_state_to_props`.
    ///
    /// Subscribers are notified exactly as for a state-driven update.
    pub fn set_props(&self, props: P) {
        self.inner.props.accept(props);
    }

    /// The actions bundle built at construction.
    #[must_use]
    pub fn actions(&self) -> &A {
        &self.inner.actions
    }

    /// The store this connection reads from.
    #[must_use]
    pub fn store(&self) -> &St {
        &self.inner.store
    }

    /// Configuration the connection was created with.
    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    /// Number of live subscriptions and bindings.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.inner.scope.borrow().binding_count()
    }

    /// Call `on_change` whenever the selected field changes.
    pub fn subscribe<T: PartialEq + 'static>(
        &self,
        accessor: impl Fn(&P) -> T + 'static,
        on_change: impl Fn(T) + 'static,
    ) -> SubscriptionHandle {
        self.subscribe_with(accessor, Equality::native(), on_change)
    }

    /// Like [`subscribe`](Self::subscribe), comparing field values with `equality`.
    pub fn subscribe_with<T: 'static>(
        &self,
        accessor: impl Fn(&P) -> T + 'static,
        equality: Equality<T>,
        on_change: impl Fn(T) + 'static,
    ) -> SubscriptionHandle {
        let sub = subscribe_field(
            &self.inner.props,
            Rc::new(accessor),
            equality,
            self.inner.config.emit_current_on_subscribe,
            on_change,
        );
        SubscriptionHandle::register(&self.inner.scope, sub)
    }

    /// Push the selected field into `sink` whenever it changes.
    pub fn bind<T: PartialEq + 'static>(
        &self,
        accessor: impl Fn(&P) -> T + 'static,
        sink: impl Sink<T> + 'static,
    ) -> SubscriptionHandle {
        self.binder(accessor).to(sink)
    }

    /// Like [`bind`](Self::bind), comparing field values with `equality`.
    pub fn bind_with<T: 'static>(
        &self,
        accessor: impl Fn(&P) -> T + 'static,
        equality: Equality<T>,
        sink: impl Sink<T> + 'static,
    ) -> SubscriptionHandle {
        self.binder_with(accessor, equality).to(sink)
    }

    /// Start a binding with native equality; finish it with [`Binder::to`].
    pub fn binder<T: PartialEq + 'static>(
        &self,
        accessor: impl Fn(&P) -> T + 'static,
    ) -> Binder<P, T> {
        self.binder_with(accessor, Equality::native())
    }

    /// Start a binding with a custom equality.
    pub fn binder_with<T: 'static>(
        &self,
        accessor: impl Fn(&P) -> T + 'static,
        equality: Equality<T>,
    ) -> Binder<P, T> {
        Binder::new(
            self.inner.props.clone(),
            Rc::clone(&self.inner.scope),
            Rc::new(accessor),
            equality,
            self.inner.config.emit_current_on_subscribe,
        )
    }
}

impl<St: StateStore, P, A> Connection<St, P, A> {
    /// Remove the store registration. Does nothing when not connected.
    pub fn disconnect(&self) {
        match self.inner.registration.take() {
            Some(id) => {
                self.inner.store.unsubscribe(id);
                tracing::debug!(connection = %self.inner.config.label, "disconnected");
            }
            None => {
                tracing::trace!(connection = %self.inner.config.label, "disconnect while idle");
            }
        }
    }

    /// Whether a store registration is active.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.registration.get().is_some()
    }
}

impl<St: StateStore, P, A> Drop for Connection<St, P, A> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl<St: StateStore, P: fmt::Debug + 'static, A> fmt::Debug for Connection<St, P, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("label", &self.inner.config.label)
            .field("connected", &self.is_connected())
            .field("props", &self.inner.props.value())
            .field("subscriptions", &self.inner.scope.borrow().binding_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::sink::{SinkCell, SinkLog};
    use relink_store::{Action, Store, StoreError};
    use tracing_test::traced_test;

    #[derive(Debug, Clone, PartialEq)]
    enum Msg {
        SetTitle(String),
        Bump,
    }

    impl Action for Msg {}

    #[derive(Debug, Clone, Default)]
    struct State {
        title: String,
        count: u32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Props {
        title: String,
        even: bool,
    }

    struct Actions {
        set_title: Box<dyn Fn(&str)>,
        bump: Box<dyn Fn()>,
    }

    fn reducer(action: &Msg, state: &State) -> State {
        match action {
            Msg::SetTitle(title) => State {
                title: title.clone(),
                ..state.clone()
            },
            Msg::Bump => State {
                count: state.count + 1,
                ..state.clone()
            },
        }
    }

    fn map_state(state: &State) -> Props {
        Props {
            title: state.title.clone(),
            even: state.count % 2 == 0,
        }
    }

    fn map_dispatch(dispatch: DispatchFn<Msg>) -> Actions {
        let d = Rc::clone(&dispatch);
        Actions {
            set_title: Box::new(move |t| d(Msg::SetTitle(t.to_string()))),
            bump: Box::new(move || dispatch(Msg::Bump)),
        }
    }

    type TestConnection = Connection<Store<State, Msg>, Props, Actions>;

    fn setup() -> (Store<State, Msg>, TestConnection) {
        let store = Store::new(
            reducer,
            State {
                title: "initial".into(),
                count: 0,
            },
        );
        let connection = Connection::new(store.clone(), map_state, map_dispatch);
        (store, connection)
    }

    #[test]
    fn initial_props_from_store_state() {
        let (_, conn) = setup();
        assert_eq!(conn.props().title, "initial");
        assert!(!conn.is_connected());
    }

    #[test]
    fn connect_registers_once() {
        let (store, conn) = setup();
        conn.connect();
        conn.connect();
        assert!(conn.is_connected());
        assert_eq!(store.subscriber_count(), 1);
    }

    #[test]
    fn store_updates_flow_into_props() {
        let (store, conn) = setup();
        conn.connect();
        store.dispatch(Msg::SetTitle("next".into()));
        assert_eq!(conn.props().title, "next");
    }

    #[test]
    fn actions_dispatch_to_store() {
        let (store, conn) = setup();
        conn.connect();
        (conn.actions().set_title)("via action");
        (conn.actions().bump)();
        assert_eq!(store.state().title, "via action");
        assert_eq!(store.state().count, 1);
        assert!(!conn.props().even);
    }

    #[test]
    fn disconnect_stops_updates() {
        let (store, conn) = setup();
        conn.connect();
        conn.disconnect();
        conn.disconnect();
        store.dispatch(Msg::SetTitle("ignored".into()));
        assert_eq!(conn.props().title, "initial");
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn reconnect_after_disconnect() {
        let (store, conn) = setup();
        conn.connect();
        conn.disconnect();
        conn.connect();
        store.dispatch(Msg::SetTitle("back".into()));
        assert_eq!(conn.props().title, "back");
    }

    #[test]
    fn drop_unregisters() {
        let (store, conn) = setup();
        conn.connect();
        drop(conn);
        assert_eq!(store.subscriber_count(), 0);
        store.dispatch(Msg::Bump);
    }

    #[test]
    fn try_connect_reports_torn_down_store() {
        let (store, conn) = setup();
        store.tear_down();
        assert_eq!(
            conn.try_connect(),
            Err(ConnectionError::Store(StoreError::TornDown))
        );
        assert!(!conn.is_connected());
    }

    #[test]
    #[traced_test]
    fn connect_logs_refusal() {
        let (store, conn) = setup();
        store.tear_down();
        conn.connect();
        assert!(logs_contain("connect failed"));
    }

    #[test]
    fn set_props_notifies_subscribers() {
        let (_, conn) = setup();
        let sink = SinkCell::new();
        conn.bind(|p: &Props| p.title.clone(), sink.clone());
        conn.set_props(Props {
            title: "forced".into(),
            even: true,
        });
        assert_eq!(conn.props().title, "forced");
        assert_eq!(sink.get(), Some("forced".to_string()));
    }

    #[test]
    fn subscription_counts_and_cancel() {
        let (_, conn) = setup();
        let log = SinkLog::new();
        let handle = conn.bind(|p: &Props| p.even, log.clone());
        let _other = conn.subscribe(|p: &Props| p.title.clone(), |_| {});
        assert_eq!(conn.subscription_count(), 2);
        assert!(handle.cancel());
        assert_eq!(conn.subscription_count(), 1);
        conn.new_state(&State {
            title: "initial".into(),
            count: 1,
        });
        assert!(log.is_empty());
    }

    #[test]
    fn emit_current_from_config() {
        let store = Store::new(reducer, State::default());
        let conn = Connection::with_config(
            store,
            map_state,
            map_dispatch,
            ConnectionConfig::default().with_emit_current_on_subscribe(true),
        );
        let sink = SinkCell::new();
        conn.bind(|p: &Props| p.even, sink.clone());
        assert_eq!(sink.get(), Some(true));
    }

    #[test]
    fn dispatch_from_binding_is_ordered() {
        let (store, conn) = setup();
        conn.connect();
        let bump = Rc::new(map_dispatch(store.dispatch_function()).bump);
        let b = Rc::clone(&bump);
        conn.subscribe(|p: &Props| p.title.clone(), move |title| {
            if title == "go" {
                b();
            }
        });
        let evens = SinkLog::new();
        conn.bind(|p: &Props| p.even, evens.clone());

        store.dispatch(Msg::SetTitle("go".into()));
        assert_eq!(store.state().count, 1);
        assert!(!conn.props().even);
        assert_eq!(evens.values(), vec![false]);
    }

    #[test]
    fn store_listener_dispatch_leaves_props_on_latest_state() {
        let (store, conn) = setup();
        let handle = store.clone();
        store
            .subscribe(Rc::new(move |state: &State| {
                if state.title == "go" && state.count == 0 {
                    handle.dispatch(Msg::Bump);
                }
            }))
            .unwrap();
        conn.connect();
        let evens = SinkLog::new();
        conn.bind(|p: &Props| p.even, evens.clone());

        store.dispatch(Msg::SetTitle("go".into()));
        assert_eq!(*conn.props(), map_state(&store.state()));
        assert!(!conn.props().even);
        assert_eq!(evens.values(), vec![false]);
    }

    #[test]
    fn config_is_exposed() {
        let store = Store::new(reducer, State::default());
        let conn = Connection::with_config(
            store,
            map_state,
            map_dispatch,
            ConnectionConfig::default().with_label("detail"),
        );
        assert_eq!(conn.config().label, "detail");
        assert!(!conn.config().emit_current_on_subscribe);
    }

    #[test]
    fn debug_format() {
        let (_, conn) = setup();
        let dbg = format!("{conn:?}");
        assert!(dbg.contains("Connection"));
        assert!(dbg.contains("connected: false"));
    }
}
