pub mod pipeline;
pub mod reorg;
