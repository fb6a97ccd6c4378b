//! Per-instance actor that owns an [`AtomStore`].
//!
//! A dedicated OS thread drains the mailbox with `blocking_recv`, so SQLite
//! calls never run on the async runtime and requests against one instance are
//! served strictly in arrival order. Dropping every [`AtomSpaceHandle`] closes
//! the mailbox and the thread exits.

use std::sync::Arc;
use std::thread;

use tokio::sync::{mpsc, oneshot};

use super::error::{AtomSpaceError, AtomSpaceResult};
use super::types::{Atom, AtomQuery, AtomType, AttentionValue, Statistics, TruthValue};
use super::AtomStore;

const MAILBOX_CAPACITY: usize = 256;

type Reply<T> = oneshot::Sender<AtomSpaceResult<T>>;

enum Command {
    CreateNode {
        atom_type: AtomType,
        name: String,
        truth_value: Option<TruthValue>,
        attention_value: Option<AttentionValue>,
        reply: Reply<Atom>,
    },
    CreateLink {
        atom_type: AtomType,
        outgoing: Vec<String>,
        truth_value: Option<TruthValue>,
        attention_value: Option<AttentionValue>,
        reply: Reply<Atom>,
    },
    Get {
        id: String,
        reply: Reply<Option<Atom>>,
    },
    Query {
        query: AtomQuery,
        reply: Reply<Vec<Atom>>,
    },
    Incoming {
        id: String,
        reply: Reply<Vec<Atom>>,
    },
    Update {
        id: String,
        truth_value: Option<TruthValue>,
        attention_value: Option<AttentionValue>,
        reply: Reply<bool>,
    },
    Delete {
        id: String,
        reply: Reply<bool>,
    },
    Stats {
        reply: Reply<Statistics>,
    },
}

/// Cloneable async handle to one atomspace instance.
#[derive(Clone)]
pub struct AtomSpaceHandle {
    name: Arc<str>,
    tx: mpsc::Sender<Command>,
}

impl AtomSpaceHandle {
    /// Move `store` onto a new actor thread and return a handle to it.
    pub fn spawn(name: &str, store: AtomStore) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        let actor_name = name.to_string();
        thread::Builder::new()
            .name(format!("atomspace-{name}"))
            .spawn(move || run(actor_name, store, rx))?;

        Ok(Self {
            name: Arc::from(name),
            tx,
        })
    }

    /// A handle whose mailbox is already closed.
    #[cfg(test)]
    pub(crate) fn disconnected(name: &str) -> Self {
        let (tx, _rx) = mpsc::channel(1);
        Self {
            name: Arc::from(name),
            tx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once the actor thread has exited.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> AtomSpaceResult<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| AtomSpaceError::Unavailable(self.name.to_string()))?;
        rx.await
            .map_err(|_| AtomSpaceError::Unavailable(self.name.to_string()))?
    }

    pub async fn create_node(
        &self,
        atom_type: AtomType,
        name: impl Into<String>,
        truth_value: Option<TruthValue>,
        attention_value: Option<AttentionValue>,
    ) -> AtomSpaceResult<Atom> {
        let name = name.into();
        self.request(|reply| Command::CreateNode {
            atom_type,
            name,
            truth_value,
            attention_value,
            reply,
        })
        .await
    }

    pub async fn create_link(
        &self,
        atom_type: AtomType,
        outgoing: Vec<String>,
        truth_value: Option<TruthValue>,
        attention_value: Option<AttentionValue>,
    ) -> AtomSpaceResult<Atom> {
        self.request(|reply| Command::CreateLink {
            atom_type,
            outgoing,
            truth_value,
            attention_value,
            reply,
        })
        .await
    }

    pub async fn get_atom(&self, id: impl Into<String>) -> AtomSpaceResult<Option<Atom>> {
        let id = id.into();
        self.request(|reply| Command::Get { id, reply }).await
    }

    pub async fn query_atoms(&self, query: AtomQuery) -> AtomSpaceResult<Vec<Atom>> {
        self.request(|reply| Command::Query { query, reply }).await
    }

    pub async fn get_incoming(&self, id: impl Into<String>) -> AtomSpaceResult<Vec<Atom>> {
        let id = id.into();
        self.request(|reply| Command::Incoming { id, reply }).await
    }

    pub async fn update_atom(
        &self,
        id: impl Into<String>,
        truth_value: Option<TruthValue>,
        attention_value: Option<AttentionValue>,
    ) -> AtomSpaceResult<bool> {
        let id = id.into();
        self.request(|reply| Command::Update {
            id,
            truth_value,
            attention_value,
            reply,
        })
        .await
    }

    pub async fn delete_atom(&self, id: impl Into<String>) -> AtomSpaceResult<bool> {
        let id = id.into();
        self.request(|reply| Command::Delete { id, reply }).await
    }

    pub async fn statistics(&self) -> AtomSpaceResult<Statistics> {
        self.request(|reply| Command::Stats { reply }).await
    }
}

fn run(name: String, mut store: AtomStore, mut rx: mpsc::Receiver<Command>) {
    tracing::info!(instance = %name, "atomspace actor started");

    while let Some(command) = rx.blocking_recv() {
        // A dropped reply receiver only means the caller gave up waiting.
        match command {
            Command::CreateNode {
                atom_type,
                name,
                truth_value,
                attention_value,
                reply,
            } => {
                let _ = reply.send(store.create_node(atom_type, &name, truth_value, attention_value));
            }
            Command::CreateLink {
                atom_type,
                outgoing,
                truth_value,
                attention_value,
                reply,
            } => {
                let _ = reply.send(store.create_link(atom_type, &outgoing, truth_value, attention_value));
            }
            Command::Get { id, reply } => {
                let _ = reply.send(store.get_atom(&id));
            }
            Command::Query { query, reply } => {
                let _ = reply.send(store.query_atoms(&query));
            }
            Command::Incoming { id, reply } => {
                let _ = reply.send(store.get_incoming(&id));
            }
            Command::Update {
                id,
                truth_value,
                attention_value,
                reply,
            } => {
                let _ = reply.send(store.update_atom(&id, truth_value, attention_value));
            }
            Command::Delete { id, reply } => {
                let _ = reply.send(store.delete_atom(&id));
            }
            Command::Stats { reply } => {
                let _ = reply.send(store.statistics());
            }
        }
    }

    tracing::info!(instance = %name, "atomspace actor stopped");
}
