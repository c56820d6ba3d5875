//! Scripted in-memory driver used by the failover tests
//!
//! Every endpoint is given a [`Behavior`]; the driver records each open,
//! query and close in a shared event log so tests can assert ordering and
//! resource hygiene.

use async_trait::async_trait;
use failguard_core::{
    Connection, DatabaseDriver, FailguardError, QueryResult, Result, StatementResult, Value,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// How a scripted endpoint responds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Every open fails
    Unreachable,
    /// Probe reports `off`
    Writable,
    /// Probe reports `on`
    ReadOnly,
    /// The readiness query errors
    QueryFails,
    /// The readiness query returns zero rows
    NoRows,
    /// The readiness query returns a boolean instead of text
    NonText,
    /// Probe reports `off` but every open after the first fails
    LiveOpenFails,
    /// Probe reports `off`, closing any connection errors
    WritableCloseFails,
    /// Probe reports `on`, closing any connection errors
    ReadOnlyCloseFails,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Open { endpoint: String, conn: usize },
    OpenFailed { endpoint: String },
    Query { conn: usize, sql: String },
    Close { conn: usize },
}

#[derive(Default)]
struct Shared {
    events: Mutex<Vec<Event>>,
    next_conn: AtomicUsize,
}

impl Shared {
    fn record(&self, event: Event) {
        self.events.lock().push(event);
    }
}

pub struct ScriptedDriver {
    behaviors: HashMap<String, Behavior>,
    shared: Arc<Shared>,
}

impl ScriptedDriver {
    pub fn new(script: &[(&str, Behavior)]) -> Arc<Self> {
        init_test_logging();
        Arc::new(Self {
            behaviors: script
                .iter()
                .map(|(endpoint, behavior)| (endpoint.to_string(), *behavior))
                .collect(),
            shared: Arc::new(Shared::default()),
        })
    }

    pub fn events(&self) -> Vec<Event> {
        self.shared.events.lock().clone()
    }

    /// Open attempts against `endpoint`, successful or not
    pub fn open_attempts(&self, endpoint: &str) -> usize {
        self.events()
            .iter()
            .filter(|event| match event {
                Event::Open { endpoint: e, .. } | Event::OpenFailed { endpoint: e } => e == endpoint,
                _ => false,
            })
            .count()
    }

    /// Connection ids opened against `endpoint`, in order
    pub fn connections_for(&self, endpoint: &str) -> Vec<usize> {
        self.events()
            .iter()
            .filter_map(|event| match event {
                Event::Open { endpoint: e, conn } if e == endpoint => Some(*conn),
                _ => None,
            })
            .collect()
    }

    pub fn close_count(&self, conn: usize) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, Event::Close { conn: c } if *c == conn))
            .count()
    }

    /// Position of the first event matching `predicate`
    pub fn position(&self, predicate: impl Fn(&Event) -> bool) -> Option<usize> {
        self.events().iter().position(predicate)
    }
}

#[async_trait]
impl DatabaseDriver for ScriptedDriver {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn open(&self, endpoint: &str) -> Result<Box<dyn Connection>> {
        let behavior = self.behaviors.get(endpoint).copied();
        let previous_opens = self.connections_for(endpoint).len();

        let refuse = match behavior {
            None | Some(Behavior::Unreachable) => true,
            Some(Behavior::LiveOpenFails) => previous_opens > 0,
            Some(_) => false,
        };
        if refuse {
            self.shared.record(Event::OpenFailed {
                endpoint: endpoint.to_string(),
            });
            return Err(FailguardError::Connection(format!(
                "{}: connection refused",
                endpoint
            )));
        }

        let conn = self.shared.next_conn.fetch_add(1, Ordering::SeqCst);
        self.shared.record(Event::Open {
            endpoint: endpoint.to_string(),
            conn,
        });

        Ok(Box::new(ScriptedConnection {
            id: conn,
            behavior: behavior.unwrap_or(Behavior::Unreachable),
            shared: Arc::clone(&self.shared),
            closed: AtomicBool::new(false),
        }))
    }
}

pub struct ScriptedConnection {
    id: usize,
    behavior: Behavior,
    shared: Arc<Shared>,
    closed: AtomicBool,
}

#[async_trait]
impl Connection for ScriptedConnection {
    fn driver_name(&self) -> &str {
        "scripted"
    }

    async fn execute(&self, sql: &str, _params: &[Value]) -> Result<StatementResult> {
        self.shared.record(Event::Query {
            conn: self.id,
            sql: sql.to_string(),
        });
        Ok(StatementResult {
            is_query: false,
            result: None,
            affected_rows: 1,
            error: None,
        })
    }

    async fn query(&self, sql: &str, _params: &[Value]) -> Result<QueryResult> {
        self.shared.record(Event::Query {
            conn: self.id,
            sql: sql.to_string(),
        });

        let column = ["transaction_read_only"];
        let indicator = |flag: &str| -> Result<QueryResult> {
            Ok(QueryResult::from_rows(
                &column,
                vec![vec![Value::String(flag.into())]],
            ))
        };
        match self.behavior {
            Behavior::Writable | Behavior::LiveOpenFails | Behavior::WritableCloseFails => {
                indicator("off")
            }
            Behavior::ReadOnly | Behavior::ReadOnlyCloseFails => indicator("on"),
            Behavior::NoRows => Ok(QueryResult::from_rows(&column, Vec::new())),
            Behavior::NonText => Ok(QueryResult::from_rows(
                &column,
                vec![vec![Value::Bool(true)]],
            )),
            Behavior::QueryFails | Behavior::Unreachable => Err(FailguardError::Query(
                "unrecognized configuration parameter".into(),
            )),
        }
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.shared.record(Event::Close { conn: self.id });
        }
        match self.behavior {
            Behavior::WritableCloseFails | Behavior::ReadOnlyCloseFails => Err(
                FailguardError::Connection("broken pipe while closing".into()),
            ),
            _ => Ok(()),
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Install a test-writer tracing subscriber once per test binary
pub fn init_test_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("failguard=debug")),
            )
            .with_test_writer()
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
