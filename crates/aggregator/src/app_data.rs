// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{AggregatorError, AggregatorStore, PublicContextWriter};

/// State shared by every handler
#[derive(Debug, Clone, Default)]
pub struct AppData {
    store: AggregatorStore,
    public_context_writer: Option<PublicContextWriter>,
}

impl AppData {
    pub fn new(store: AggregatorStore, public_context_writer: Option<PublicContextWriter>) -> Self {
        Self {
            store,
            public_context_writer,
        }
    }

    pub fn store(&self) -> &AggregatorStore {
        &self.store
    }

    /// Store a public context and mirror it to disk. Returns whether a previous context was
    /// replaced.
    ///
    /// Uploads are applied one at a time, so the mirror always holds the stored context. A
    /// failed write leaves the new context stored in memory.
    pub async fn set_public_context(&self, context: Vec<u8>) -> Result<bool, AggregatorError> {
        let Some(writer) = &self.public_context_writer else {
            return Ok(self.store.set_public_context(context).await);
        };

        let _order = writer.lock().await;
        let replaced = self.store.set_public_context(context.clone()).await;
        writer.write(&context).await?;
        Ok(replaced)
    }
}
