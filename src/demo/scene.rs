use bevy::prelude::*;

use crate::markers::{MarkerCommand, MarkerData, MarkerId};
use crate::viewer::{ModelMesh, ModelRoot, OverlayMesh, SectionAxis, SectionPlanes, ViewerCamera};
use crate::viewpoint::{Lens, ModelTransform, SectionState, ViewpointSnapshot};

/// Half-extent used when drawing a section plane
const SECTION_GIZMO_SIZE: f32 = 3.0;

pub fn spawn_demo_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let camera = ViewerCamera {
        position: Vec3::new(4.0, 3.0, 6.0),
        ..default()
    };
    commands.spawn((
        Camera3d::default(),
        camera,
        camera.transform(),
        camera.bevy_projection(),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(3.0, 8.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let body = materials.add(StandardMaterial {
        base_color: Color::srgb(0.55, 0.6, 0.68),
        perceptual_roughness: 0.8,
        ..default()
    });
    let roof = materials.add(StandardMaterial {
        base_color: Color::srgb(0.7, 0.35, 0.3),
        ..default()
    });
    let edge = materials.add(StandardMaterial {
        base_color: Color::srgb(0.1, 0.9, 0.9),
        unlit: true,
        ..default()
    });

    commands
        .spawn((ModelRoot, Transform::default(), Visibility::default()))
        .with_children(|parent| {
            parent.spawn((
                ModelMesh,
                Mesh3d(meshes.add(Cuboid::new(2.0, 1.0, 1.5))),
                MeshMaterial3d(body),
                Transform::default(),
            ));
            parent.spawn((
                ModelMesh,
                Mesh3d(meshes.add(Cuboid::new(1.0, 0.6, 1.0))),
                MeshMaterial3d(roof),
                Transform::from_xyz(-0.4, 0.8, 0.0),
            ));
            // Outline along the front top edge; never blocks markers
            parent.spawn((
                OverlayMesh,
                Mesh3d(meshes.add(Cuboid::new(2.1, 0.03, 0.03))),
                MeshMaterial3d(edge),
                Transform::from_xyz(0.0, 0.5, 0.76),
            ));
        });

    info!("Demo scene spawned");
}

/// Two starting markers: one with a saved view, one without.
pub fn seed_demo_markers(mut commands: MessageWriter<MarkerCommand>) {
    let front_view = ViewpointSnapshot {
        lens: Lens::Perspective { fov: 0.6 },
        camera_position: Vec3::new(0.5, 0.6, 4.0),
        pivot: Vec3::new(0.5, 0.0, 0.75),
        view_shift: Vec2::ZERO,
        model: Some(ModelTransform::from(&Transform::default())),
        sections: [SectionState::default(); 3],
    };
    commands.write(MarkerCommand::SetMarkers(vec![
        MarkerData::new(Vec3::new(0.5, 0.0, 0.75))
            .with_id(MarkerId::from("front"))
            .with_snapshot(front_view),
        MarkerData::new(Vec3::new(-0.4, 1.1, 0.0)),
    ]));
}

/// Outline each enabled section plane.
pub fn draw_section_planes(mut gizmos: Gizmos, sections: Res<SectionPlanes>) {
    for axis in SectionAxis::ALL {
        let Some(plane) = sections.get(axis) else {
            continue;
        };
        let Some(normal) = plane.normal.try_normalize() else {
            continue;
        };
        let center = -plane.constant * normal / plane.normal.length();
        let rotation = Quat::from_rotation_arc(Vec3::Z, normal);
        let color = match axis {
            SectionAxis::X => Color::srgb(0.9, 0.3, 0.3),
            SectionAxis::Y => Color::srgb(0.3, 0.9, 0.3),
            SectionAxis::Z => Color::srgb(0.3, 0.5, 0.95),
        };
        gizmos.rect(
            Isometry3d::new(center, rotation),
            Vec2::splat(SECTION_GIZMO_SIZE * 2.0),
            color,
        );
        gizmos.arrow(center, center + normal * 0.5, color);
    }
}
