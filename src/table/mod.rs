//! Table module providing the single-flight round driver.
//!
//! This module implements:
//! - TableActor: async actor owning one round and its timers
//! - Message-based communication with tokio channels
//! - Table configuration and speed presets
//!
//! ## Architecture
//!
//! Each table runs in a separate Tokio task with an mpsc message inbox.
//! Player actions and timer expiries are serialized through the same loop,
//! so round mutations never race. Logical time advances one second per
//! tick; tests can inject [`TableMessage::Tick`] to drive timeouts
//! deterministically.
//!
//! ## Example
//!
//! ```ignore
//! use quiz_poker::table::{TableActor, TableConfig, TableMessage};
//! use quiz_poker::entities::Question;
//! use tokio::sync::oneshot;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, handle) = TableActor::new(TableConfig::default());
//!     tokio::spawn(actor.run());
//!
//!     let (tx, rx) = oneshot::channel();
//!     handle
//!         .send(TableMessage::StartRound {
//!             players: vec![("alice".into(), 100), ("bob".into(), 100)],
//!             question: Question::new("How many keys does a piano have?", 88.0),
//!             response: tx,
//!         })
//!         .await
//!         .unwrap();
//!     assert!(rx.await.unwrap().is_accepted());
//! }
//! ```

pub mod actor;
pub mod config;
pub mod messages;

pub use actor::{TableActor, TableHandle};
pub use config::{TableConfig, TableSpeed};
pub use messages::{TableMessage, TableResponse};
