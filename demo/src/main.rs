use bevy::{
    pbr::{MaterialPipeline, MaterialPipelineKey},
    prelude::*,
    reflect::TypeUuid,
    render::{
        mesh::{MeshVertexBufferLayout, PrimitiveTopology},
        render_resource::{
            AsBindGroup, PolygonMode, RenderPipelineDescriptor, ShaderRef,
            SpecializedMeshPipelineError,
        },
    },
};
use cdt::{triangulate, ConstraintKind, F64Kernel, Kernel, Settings};

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugin(MaterialPlugin::<LineMaterial>::default())
        .add_startup_system(setup)
        .run();
}

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<LineMaterial>>,
) {
    // Outer square boundary plus an inner triangular hole, both marked
    // `ConstrainedAndHoleBoundary`; a seed point inside the inner
    // triangle asks Plant to remove it.
    let positions = [
        (0.0, 0.0),
        (1.0, 0.0),
        (1.0, 1.0),
        (0.0, 1.0),
        (0.3, 0.4),
        (0.5, 0.7),
        (0.7, 0.4),
    ]
    .map(|(x, y)| F64Kernel::from_xy(x, y))
    .to_vec();

    let constraint_edges = vec![0, 1, 1, 2, 2, 3, 3, 0, 4, 5, 5, 6, 6, 4];
    let kinds = vec![ConstraintKind::ConstrainedAndHoleBoundary; 7];
    let hole_seeds = vec![F64Kernel::from_xy(0.5, 0.5)];

    let settings = Settings::builder().refine_mesh(true).refinement(0.02, 15.0_f64.to_radians()).build();

    let out = triangulate::<F64Kernel>(&positions, &constraint_edges, Some(&kinds), &hole_seeds, &settings);
    log::info!("triangulated with status {:?}, {} triangles", out.status, out.mesh.num_triangles());

    let to_vec3 = |v: usize| {
        let p = out.mesh.point(v);
        Vec3::new(F64Kernel::x(p) as f32, F64Kernel::y(p) as f32, 0.0)
    };

    // Unconstrained Delaunay edges in one color, constrained/refined
    // boundary edges in a second color.
    let mut unconstrained = Vec::new();
    let mut constrained = Vec::new();
    for (a, b, kind) in out.mesh.edges() {
        let line = (to_vec3(a), to_vec3(b));
        if kind == ConstraintKind::Unconstrained {
            unconstrained.push(line);
        } else {
            constrained.push(line);
        }
    }

    commands.spawn(MaterialMeshBundle {
        mesh: meshes.add(Mesh::from(LineList { lines: unconstrained })),
        transform: Transform::from_xyz(0.0, 0.0, 0.0),
        material: materials.add(LineMaterial {
            color: Color::GREEN,
        }),
        ..default()
    });
    commands.spawn(MaterialMeshBundle {
        mesh: meshes.add(Mesh::from(LineList { lines: constrained })),
        transform: Transform::from_xyz(0.0, 0.0, 0.0),
        material: materials.add(LineMaterial {
            color: Color::ORANGE_RED,
        }),
        ..default()
    });

    // camera
    commands.spawn(Camera3dBundle {
        transform: Transform::from_xyz(0.5, 0.5, 2.5).looking_at(Vec3::new(0.5, 0.5, 0.0), Vec3::Y),
        ..default()
    });
}

#[derive(Default, AsBindGroup, TypeUuid, Debug, Clone)]
#[uuid = "050ce6ac-080a-4d8c-b6b5-b5bab7560d8f"]
struct LineMaterial {
    #[uniform(0)]
    color: Color,
}

impl Material for LineMaterial {
    fn fragment_shader() -> ShaderRef {
        "shaders/line_material.wgsl".into()
    }

    fn specialize(
        _pipeline: &MaterialPipeline<Self>,
        descriptor: &mut RenderPipelineDescriptor,
        _layout: &MeshVertexBufferLayout,
        _key: MaterialPipelineKey<Self>,
    ) -> Result<(), SpecializedMeshPipelineError> {
        // This is the important part to tell bevy to render this material as a line between vertices
        descriptor.primitive.polygon_mode = PolygonMode::Line;
        Ok(())
    }
}

/// A list of lines with a start and end position
#[derive(Debug, Clone)]
pub struct LineList {
    pub lines: Vec<(Vec3, Vec3)>,
}

impl From<LineList> for Mesh {
    fn from(line: LineList) -> Self {
        // This tells wgpu that the positions are list of lines
        // where every pair is a start and end point
        let mut mesh = Mesh::new(PrimitiveTopology::LineList);

        let vertices: Vec<_> = line.lines.into_iter().flat_map(|(a, b)| [a, b]).collect();
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, vertices);
        mesh
    }
}
