//! `keyline serve`: run the HTTP service.

use std::sync::Arc;

use keyline_api::{DocumentStore, MemoryStore};

use crate::cli::{GlobalOpts, ServeArgs};
use crate::config::{self, Config};
use crate::error::CliError;

use super::util;

pub async fn handle(args: ServeArgs, config: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let server = config::resolve_server_config(config, args.bind)?;

    let store: Arc<dyn DocumentStore> = if args.memory {
        tracing::warn!("serving from an in-memory store; nothing will be persisted");
        Arc::new(MemoryStore::new())
    } else {
        util::open_store(&config::resolve_store_config(global, config)?)?
    };

    keyline_server::serve(store, server).await?;
    Ok(())
}
