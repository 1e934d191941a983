pub mod error;

pub mod config {
    pub mod config;
}

pub mod utils {
    pub mod conversion;
    pub mod coordinate;
    pub mod utils;
}

pub mod helper {
    pub mod landmark_facts;
}

pub mod modules {
    pub mod geometry_classifier;
    pub mod hand_tracker;
    pub mod learned_classifier;
    pub mod shape_classifier;
}

pub mod pipeline {
    pub mod fusion;
    pub mod pipeline;
    pub mod session;
    pub mod word_assembler;
}

pub use config::config::PipelineConfig;
pub use error::RecognitionError;
pub use pipeline::pipeline::{ASLPipeline, FrameResult, RecognitionSession};
pub use pipeline::session::{SessionHandle, SessionWorker};
