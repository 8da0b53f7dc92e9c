//! Bootstrap and lifecycle orchestration for the Sidetree node.
//!
//! [`Core`] builds a fixed graph of collaborators from a [`Config`] and a set
//! of protocol versions, then starts them in two phases:
//!
//! ```text
//! Core::new          protocol parameters -> clients -> download manager
//!                    -> batch writer -> operation store -> processor
//!                    -> transaction store -> observer -> request handler
//!                    -> arm download loop -> arm batching loop
//! Core::initialize   transaction store -> operation store -> arm observer
//! ```
//!
//! The observer never scans before both stores are online. The request
//! handler is available right after construction and answers
//! [`HandlerError::NotReady`] until `initialize` succeeds.
//!
//! [`Config`]: sidetree_types::Config

pub mod background;
pub mod batch_writer;
pub mod core;
pub mod download;
pub mod error;
pub mod factory;
pub mod lifecycle;
pub mod observer;
pub mod processor;
pub mod request_handler;

pub use crate::core::Core;
pub use background::LoopHandle;
pub use batch_writer::BatchWriter;
pub use download::DownloadManager;
pub use error::{CoreError, CoreResult, HandlerError, HandlerResult};
pub use factory::{ComponentFactory, DefaultFactory};
pub use lifecycle::{CoreState, Readiness};
pub use observer::Observer;
pub use processor::OperationProcessor;
pub use request_handler::RequestHandler;
