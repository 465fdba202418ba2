pub mod errors;
pub mod features;
pub mod messages;

pub use errors::PipelineError;
pub use features::{FeatureVector, FEATURE_DIM, HAND_DIM};
pub use messages::{ClientMessage, InboundUnit, ServerMessage, DEFAULT_USER_NAME};
