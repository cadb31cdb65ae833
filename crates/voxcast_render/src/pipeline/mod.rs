//! Rendering pipeline components
//!
//! Three render passes make up a frame: position (entry/exit points),
//! raycast (the volume itself) and overlay (the cutting plane).

pub mod types;
pub mod position_pass;
pub mod raycast_pass;
pub mod overlay_pass;
pub mod volume_texture;

// Re-export types
pub use types::{
    BoxVertex, OverlayVertex, PositionUniforms, RaycastUniforms, OverlayUniforms, RaycastFlags,
    box_model_matrix, POSITION_FORMAT, DEPTH_FORMAT, VOLUME_FORMAT, TRANSFER_FORMAT,
};

// Re-export passes
pub use position_pass::{PositionPass, RenderTargetPair, BoxFaces, BOX_VERTICES, BOX_INDICES};
pub use raycast_pass::{RaycastPass, RaycastInputs};
pub use overlay_pass::{OverlayPass, overlay_geometry, OVERLAY_VERTEX_COUNT};
pub use volume_texture::{VolumeTexture, TransferTexture};
