mod analyzer;
mod node;
mod source_pipe;

pub use analyzer::{AudioFeatureExtractor, AudioInput, ExtractorConfig};
pub use node::{AnalysisNode, BandRanges, FFT_SIZE};
pub use source_pipe::SourcePipe;
