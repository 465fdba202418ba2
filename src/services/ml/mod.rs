pub mod lstm;
pub mod service;
pub mod stub;

pub use lstm::LstmClassifier;
pub use service::{load_classifier, SignClassifier};
pub use stub::StubClassifier;
