//! Ordered, bounded-memory record ingestion.
//!
//! Records are discovered sequentially and transformed in parallel, and the
//! consumer sees results in the order the records appeared in the file.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐  RawRecord  ┌────────────┐           ┌──────────────┐  PendingResult  ┌──────────┐
//! │  Lexer   │ ──────────► │  Ingestion │ ────────► │  Dispatcher  │ ──────────────► │  Result  │ ──► RecordPipeline
//! │ (thread) │             │   Queue    │           │   (thread)   │                 │  Queue   │     (caller)
//! └──────────┘             └────────────┘           └──────┬───────┘                 └──────────┘
//!                                                          │ submit
//!                                                   ┌──────▼───────┐
//!                                                   │  WorkerPool  │  shared rayon pool
//!                                                   └──────────────┘
//! ```
//!
//! - **Lexer**: exactly one per pipeline; owns the reader and assigns line numbers.
//! - **Ingestion / Result Queue**: fixed-capacity [`BoundedQueue`]s; the only
//!   backpressure. A full queue suspends its writer.
//! - **Dispatcher**: submits one task per record (flat) or per [`Segment`]
//!   (segmented), pushing each handle onto the Result Queue before taking the next
//!   input, so handle order is submission order.
//! - **`RecordPipeline`**: pops handles in order and waits on each.
//!
//! In segmented mode the dispatcher folds records through a [`Segmenter`]: each
//! maximal run of consecutive records with the same key becomes one segment, and
//! a key that reappears later starts a new one.
//!
//! # Errors
//!
//! See [`ErrorPolicy`]. Under the default policy a malformed record stops the
//! lexer but everything lexed before it is still delivered, followed by the error.

pub mod config;
pub mod consumer;
pub mod dispatcher;
pub mod lexer;
pub mod pool;
pub mod queue;
pub mod segmenter;
pub mod state;

pub use config::{ErrorPolicy, PipelineConfig};
pub use consumer::{PartialRead, RecordPipeline};
pub use dispatcher::{AggregateFn, TransformFn};
pub use lexer::{LineSource, RawRecord, RecordLexer};
pub use pool::{PendingResult, WorkerPool};
pub use queue::{BoundedQueue, Popped, QueueStats};
pub use segmenter::{Segment, Segmenter};
pub use state::PipelineState;
