// ============================================================
// Layer 2 — EncodingUseCase
// ============================================================
// Reads rows of the positional table exactly as the model holds
// them (built through PositionalEncoding, not recomputed here).

use anyhow::{ensure, Result};
use burn::prelude::*;
use std::ops::Range;

use crate::ml::config::TransformerConfig;

pub struct EncodingUseCase {
    config: TransformerConfig,
}

impl EncodingUseCase {
    pub fn new(config: TransformerConfig) -> Self {
        Self { config }
    }

    /// One Vec per position in `positions`, each d_model wide.
    pub fn rows<B: Backend>(&self, positions: Range<usize>, device: &B::Device) -> Result<Vec<Vec<f32>>> {
        let cfg = &self.config;
        ensure!(
            positions.start < positions.end && positions.end <= cfg.max_seq_len,
            "positions {:?} must be a non-empty range within 0..{}",
            positions, cfg.max_seq_len
        );

        let encoding = cfg.init_positional_encoding::<B>(device)?;
        let values: Vec<f32> = encoding
            .table()
            .slice([0..1, positions.clone(), 0..cfg.d_model])
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| anyhow::anyhow!("Cannot read positional table: {e:?}"))?;

        Ok(values.chunks(cfg.d_model).map(<[f32]>::to_vec).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::embedding::sinusoidal_table;
    use burn::backend::NdArray;

    #[test]
    fn test_rows_match_table() {
        let cfg = TransformerConfig::new(6, 2).with_max_seq_len(10);
        let rows = EncodingUseCase::new(cfg).rows::<NdArray>(2..5, &Default::default()).unwrap();

        assert_eq!(rows.len(), 3);
        let table = sinusoidal_table(10, 6);
        assert_eq!(rows[0], table[12..18].to_vec());
        assert_eq!(rows[2], table[24..30].to_vec());
    }

    #[test]
    fn test_rejects_out_of_table_positions() {
        let cfg = TransformerConfig::new(6, 2).with_max_seq_len(4);
        let use_case = EncodingUseCase::new(cfg);
        assert!(use_case.rows::<NdArray>(2..5, &Default::default()).is_err());
        assert!(use_case.rows::<NdArray>(3..3, &Default::default()).is_err());
    }
}
