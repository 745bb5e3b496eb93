pub mod extractor;
pub mod pipeline;
pub mod renamer;
pub mod scanner;
pub mod tagger;
