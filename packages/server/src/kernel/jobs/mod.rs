//! Job queue & retry subsystem.
//!
//! Three logical queues live in one `jobs` table: `classify_extract`
//! (intake -> classification worker), `create_record` (the retry boundary
//! around dedup + creation), and the dead-letter pool, which is a status
//! rather than a table. Jobs carry their full original payload so
//! dead-lettered work is replayable byte-for-byte.

pub mod job;
pub mod queue;
pub mod registry;
pub mod runner;
pub mod testing;

pub use job::{ErrorKind, Job, JobStatus};
pub use queue::{enqueue_command, ClaimedJob, CommandMeta, EnqueueResult, JobQueue, PostgresJobQueue};
pub use registry::{JobRegistry, SharedJobRegistry};
pub use runner::{JobRunner, JobRunnerConfig};
pub use testing::MemoryJobQueue;
