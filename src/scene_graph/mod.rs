pub mod environment;
pub mod light;
pub mod node;
pub mod scene;
pub mod transform;

// Re-export main types for convenience
pub use environment::Environment;
pub use light::{Light, MAX_LIGHTS};
pub use node::{Node, NodeId, NodeKind};
pub use scene::{Descendants, Scene};
pub use transform::Transform;
