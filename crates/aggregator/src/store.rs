// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCiphertext {
    /// Zero based arrival position
    pub index: usize,
    pub client_id: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaintextAggregate {
    pub value: f64,
    pub contributions: Option<u32>,
}

/// Everything the aggregator knows. Lives in memory only.
#[derive(Debug, Default)]
pub struct AggregatorState {
    pub public_context: Option<Vec<u8>>,
    pub ciphertexts: Vec<StoredCiphertext>,
    pub plaintext: Option<PlaintextAggregate>,
}

/// Shared handle on the single [`AggregatorState`] of a running service
#[derive(Debug, Clone, Default)]
pub struct AggregatorStore {
    inner: Arc<RwLock<AggregatorState>>,
}

impl AggregatorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` as the public context. Returns whether a previous context was replaced.
    pub async fn set_public_context(&self, bytes: Vec<u8>) -> bool {
        let mut state = self.inner.write().await;
        state.public_context.replace(bytes).is_some()
    }

    pub async fn public_context(&self) -> Option<Vec<u8>> {
        self.inner.read().await.public_context.clone()
    }

    /// Append a ciphertext. Returns the number stored and whether a context was present.
    pub async fn push_ciphertext(&self, bytes: Vec<u8>, client_id: Option<String>) -> (usize, bool) {
        let mut state = self.inner.write().await;
        let index = state.ciphertexts.len();
        state.ciphertexts.push(StoredCiphertext {
            index,
            client_id,
            bytes,
        });
        (state.ciphertexts.len(), state.public_context.is_some())
    }

    /// The context and every ciphertext in arrival order, read under one guard
    pub async fn snapshot(&self) -> (Option<Vec<u8>>, Vec<StoredCiphertext>) {
        let state = self.inner.read().await;
        (state.public_context.clone(), state.ciphertexts.clone())
    }

    pub async fn ciphertext_count(&self) -> usize {
        self.inner.read().await.ciphertexts.len()
    }

    pub async fn set_plaintext(&self, aggregate: PlaintextAggregate) {
        self.inner.write().await.plaintext = Some(aggregate);
    }

    pub async fn plaintext(&self) -> Option<PlaintextAggregate> {
        self.inner.read().await.plaintext
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ciphertexts_keep_arrival_order() {
        let store = AggregatorStore::new();
        assert_eq!(store.push_ciphertext(vec![1], None).await, (1, false));

        assert!(!store.set_public_context(vec![9]).await);
        assert!(store.set_public_context(vec![8]).await);
        assert_eq!(
            store.push_ciphertext(vec![2], Some("b".into())).await,
            (2, true)
        );

        let (context, ciphertexts) = store.snapshot().await;
        assert_eq!(context, Some(vec![8]));
        assert_eq!(
            ciphertexts
                .iter()
                .map(|c| (c.index, c.bytes.clone()))
                .collect::<Vec<_>>(),
            vec![(0, vec![1]), (1, vec![2])]
        );
        assert_eq!(ciphertexts[1].client_id.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn plaintext_is_last_writer_wins() {
        let store = AggregatorStore::new();
        assert_eq!(store.plaintext().await, None);
        store
            .set_plaintext(PlaintextAggregate {
                value: 1.0,
                contributions: None,
            })
            .await;
        store
            .set_plaintext(PlaintextAggregate {
                value: 15.0,
                contributions: Some(2),
            })
            .await;
        assert_eq!(
            store.plaintext().await,
            Some(PlaintextAggregate {
                value: 15.0,
                contributions: Some(2)
            })
        );
    }
}
