pub mod huggingface;

pub use huggingface::{HuggingFaceConfig, HuggingFaceEmbedder, HuggingFaceGenerator};
