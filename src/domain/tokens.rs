// ============================================================
// Layer 3 — Token Batches
// ============================================================
// A rectangular batch of token ids checked against the vocabulary.
// TokenEmbedding trusts its input, so anything coming from a user
// (CLI flags, files) is turned into a TokenBatch first.
//
// Text format accepted by `parse`: rows separated by ';', ids by ','
//   "1,2,3;4,5,6"  → [[1, 2, 3], [4, 5, 6]]

use rand::Rng;

use crate::domain::error::{BlockError, BlockResult};

#[derive(Debug, Clone, PartialEq)]
pub struct TokenBatch {
    ids:     Vec<i64>,
    batch:   usize,
    seq_len: usize,
}

impl TokenBatch {
    /// Rows must be non-empty, equally long, and every id in [0, vocab_size).
    pub fn new(rows: Vec<Vec<i64>>, vocab_size: usize) -> BlockResult<Self> {
        let batch   = rows.len();
        let seq_len = rows.first().map(Vec::len).unwrap_or(0);
        if batch == 0 || seq_len == 0 {
            return Err(BlockError::shape("token batch", &[1, 1], &[batch, seq_len]));
        }

        let mut ids = Vec::with_capacity(batch * seq_len);
        for row in rows {
            if row.len() != seq_len {
                return Err(BlockError::shape("token row", &[seq_len], &[row.len()]));
            }
            if let Some(&id) = row.iter().find(|&&id| id < 0 || id as usize >= vocab_size) {
                return Err(BlockError::TokenOutOfRange { id, vocab_size });
            }
            ids.extend(row);
        }

        Ok(Self { ids, batch, seq_len })
    }

    /// Uniformly random ids, for smoke-testing a checkpoint.
    pub fn random(batch: usize, seq_len: usize, vocab_size: usize) -> BlockResult<Self> {
        if vocab_size == 0 {
            return Err(BlockError::InvalidConfig("vocab_size must be positive".into()));
        }
        let mut rng = rand::thread_rng();
        let rows: Vec<Vec<i64>> = (0..batch)
            .map(|_| (0..seq_len).map(|_| rng.gen_range(0..vocab_size as i64)).collect())
            .collect();
        Self::new(rows, vocab_size)
    }

    /// Parse "1,2,3;4,5,6". Whitespace around ids is ignored.
    pub fn parse(text: &str, vocab_size: usize) -> BlockResult<Self> {
        let mut rows = Vec::new();
        for row in text.split(';').map(str::trim).filter(|r| !r.is_empty()) {
            let ids = row
                .split(',')
                .map(|id| {
                    id.trim().parse::<i64>().map_err(|_| {
                        BlockError::MalformedTokens(format!("'{}' is not a token id", id.trim()))
                    })
                })
                .collect::<BlockResult<Vec<_>>>()?;
            rows.push(ids);
        }
        Self::new(rows, vocab_size)
    }

    pub fn ids(&self) -> &[i64] {
        &self.ids
    }

    pub fn batch(&self) -> usize {
        self.batch
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }
}
