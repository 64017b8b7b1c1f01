pub mod transaction_pipeline;

pub use transaction_pipeline::{summarize_store, PipelineSettings, TransactionPipeline};
