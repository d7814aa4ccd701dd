use bevy::prelude::*;

/// Root entity of the loaded model. Its `Transform` is the model world transform.
#[derive(Component, Debug, Default)]
pub struct ModelRoot;

/// Triangle geometry belonging to the model. Hits against it block markers.
#[derive(Component, Debug, Default)]
pub struct ModelMesh;

/// Overlay geometry (edges, helper lines). Hits against it never block markers.
#[derive(Component, Debug, Default)]
pub struct OverlayMesh;
