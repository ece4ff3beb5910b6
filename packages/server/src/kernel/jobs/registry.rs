//! Maps job types to handler functions.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::Result;
use serde::de::DeserializeOwned;

use super::queue::{ClaimedJob, CommandMeta};
use crate::kernel::deps::ServerDeps;

type BoxedHandler = Box<
    dyn Fn(serde_json::Value, Arc<ServerDeps>) -> Pin<Box<dyn Future<Output = Result<()>> + Send>>
        + Send
        + Sync,
>;

#[derive(Default)]
pub struct JobRegistry {
    handlers: HashMap<&'static str, BoxedHandler>,
}

pub type SharedJobRegistry = Arc<JobRegistry>;

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a command type. The handler receives the
    /// deserialized command and the shared server dependencies.
    pub fn register<C, F, Fut>(&mut self, handler: F)
    where
        C: CommandMeta + DeserializeOwned + Send + 'static,
        F: Fn(C, Arc<ServerDeps>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.handlers.insert(
            C::command_type(),
            Box::new(move |args, deps| {
                match serde_json::from_value::<C>(args) {
                    Ok(command) => Box::pin(handler(command, deps))
                        as Pin<Box<dyn Future<Output = Result<()>> + Send>>,
                    Err(e) => Box::pin(async move {
                        Err(anyhow::anyhow!("failed to deserialize command: {e}"))
                    }),
                }
            }),
        );
    }

    pub fn is_registered(&self, job_type: &str) -> bool {
        self.handlers.contains_key(job_type)
    }

    pub fn registered_types(&self) -> Vec<&'static str> {
        self.handlers.keys().copied().collect()
    }

    pub async fn execute(&self, claimed: &ClaimedJob, deps: Arc<ServerDeps>) -> Result<()> {
        let handler = self
            .handlers
            .get(claimed.job.job_type.as_str())
            .ok_or_else(|| anyhow::anyhow!("no handler for job type: {}", claimed.job.job_type))?;

        let args = claimed
            .job
            .args
            .clone()
            .ok_or_else(|| anyhow::anyhow!("job {} has no args", claimed.id))?;

        handler(args, deps).await
    }
}
