// ============================================================================
// scene.rs
// Procedural mesh generation: sphere, cylinder, cube, disc and the arena
// outline. Meshes are plain vertex/index lists; triangle lists for solids,
// line lists for wireframes.
// ============================================================================

use std::f32::consts::TAU;

/// How a mesh's indices are interpreted by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    Lines,
}

#[derive(Clone, Debug)]
pub struct Mesh {
    pub vertices: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub topology: Topology,
}

impl Mesh {
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

// Soccar field dimensions, arena units. The grid extends past the back
// walls to cover the goal volumes, matching the simulated field.
pub const FIELD_EXTENT_X: f32 = 4096.0;
pub const FIELD_EXTENT_Y: f32 = 5120.0;
pub const GOAL_DEPTH: f32 = 880.0;
pub const GOAL_HALF_WIDTH: f32 = 893.0;
pub const GOAL_HEIGHT: f32 = 643.0;
pub const CEILING_Z: f32 = 2044.0;
const GRID_SPACING: f32 = 512.0;

/// Latitude/longitude sphere as a triangle list.
pub fn sphere(rows: u32, cols: u32, radius: f32) -> Mesh {
    let rows = rows.max(2);
    let cols = cols.max(3);
    let mut vertices = Vec::with_capacity(((rows + 1) * (cols + 1)) as usize);
    for r in 0..=rows {
        let phi = std::f32::consts::PI * r as f32 / rows as f32;
        let (sin_phi, cos_phi) = phi.sin_cos();
        for c in 0..=cols {
            let theta = TAU * c as f32 / cols as f32;
            let (sin_theta, cos_theta) = theta.sin_cos();
            vertices.push([
                radius * sin_phi * cos_theta,
                radius * sin_phi * sin_theta,
                radius * cos_phi,
            ]);
        }
    }

    let stride = cols + 1;
    let mut indices = Vec::new();
    for r in 0..rows {
        for c in 0..cols {
            let a = r * stride + c;
            let b = a + 1;
            let d = a + stride;
            let e = d + 1;
            indices.extend_from_slice(&[a, d, b, b, d, e]);
        }
    }

    Mesh {
        vertices,
        indices,
        topology: Topology::Triangles,
    }
}

/// Latitude/longitude sphere as a line list (the edge overlay).
pub fn sphere_wire(rows: u32, cols: u32, radius: f32) -> Mesh {
    let mut mesh = sphere(rows, cols, radius);
    let stride = cols.max(3) + 1;
    let rows = rows.max(2);
    let cols = cols.max(3);

    let mut indices = Vec::new();
    for r in 0..=rows {
        for c in 0..cols {
            let a = r * stride + c;
            indices.extend_from_slice(&[a, a + 1]);
        }
    }
    for r in 0..rows {
        for c in 0..=cols {
            let a = r * stride + c;
            indices.extend_from_slice(&[a, a + stride]);
        }
    }

    mesh.indices = indices;
    mesh.topology = Topology::Lines;
    mesh
}

/// Open cylinder wireframe: two rings joined by vertical edges, base at
/// z = 0, top at z = `length`. Unit values let instances scale it.
pub fn cylinder_wire(cols: u32, radius: f32, length: f32) -> Mesh {
    let cols = cols.max(3);
    let mut vertices = Vec::with_capacity((cols * 2) as usize);
    for ring in 0..2 {
        let z = ring as f32 * length;
        for c in 0..cols {
            let theta = TAU * c as f32 / cols as f32;
            vertices.push([radius * theta.cos(), radius * theta.sin(), z]);
        }
    }

    let mut indices = Vec::new();
    for ring in 0..2u32 {
        let base = ring * cols;
        for c in 0..cols {
            indices.extend_from_slice(&[base + c, base + (c + 1) % cols]);
        }
    }
    for c in 0..cols {
        indices.extend_from_slice(&[c, c + cols]);
    }

    Mesh {
        vertices,
        indices,
        topology: Topology::Lines,
    }
}

/// Flat circle outline at z = 0, used for the ball's ground projection.
pub fn disc_wire(cols: u32, radius: f32) -> Mesh {
    let cols = cols.max(3);
    let mut vertices = Vec::with_capacity(cols as usize);
    for c in 0..cols {
        let theta = TAU * c as f32 / cols as f32;
        vertices.push([radius * theta.cos(), radius * theta.sin(), 0.0]);
    }
    let mut indices = Vec::new();
    for c in 0..cols {
        indices.extend_from_slice(&[c, (c + 1) % cols]);
    }

    Mesh {
        vertices,
        indices,
        topology: Topology::Lines,
    }
}

const CUBE_CORNERS: [[f32; 3]; 8] = [
    [-0.5, -0.5, -0.5],
    [0.5, -0.5, -0.5],
    [0.5, 0.5, -0.5],
    [-0.5, 0.5, -0.5],
    [-0.5, -0.5, 0.5],
    [0.5, -0.5, 0.5],
    [0.5, 0.5, 0.5],
    [-0.5, 0.5, 0.5],
];

/// Unit cube centered at the origin, triangle list. Instances scale it to a
/// car's hitbox extents.
pub fn cube() -> Mesh {
    let faces: [[u32; 4]; 6] = [
        [0, 1, 2, 3], // bottom
        [4, 7, 6, 5], // top
        [0, 4, 5, 1], // -y
        [2, 6, 7, 3], // +y
        [0, 3, 7, 4], // -x
        [1, 5, 6, 2], // +x
    ];
    let mut indices = Vec::with_capacity(36);
    for face in faces {
        indices.extend_from_slice(&[face[0], face[1], face[2], face[0], face[2], face[3]]);
    }

    Mesh {
        vertices: CUBE_CORNERS.to_vec(),
        indices,
        topology: Topology::Triangles,
    }
}

/// The twelve edges of the unit cube, line list.
pub fn cube_wire() -> Mesh {
    let edges: [[u32; 2]; 12] = [
        [0, 1],
        [1, 2],
        [2, 3],
        [3, 0],
        [4, 5],
        [5, 6],
        [6, 7],
        [7, 4],
        [0, 4],
        [1, 5],
        [2, 6],
        [3, 7],
    ];

    Mesh {
        vertices: CUBE_CORNERS.to_vec(),
        indices: edges.into_iter().flatten().collect(),
        topology: Topology::Lines,
    }
}

/// Arena outline: floor grid, wall and ceiling borders, corner posts and
/// both goal frames. A single static line-list mesh.
pub fn arena_wire() -> Mesh {
    let mut vertices: Vec<[f32; 3]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    let mut line = |a: [f32; 3], b: [f32; 3]| {
        let base = vertices.len() as u32;
        vertices.push(a);
        vertices.push(b);
        indices.push(base);
        indices.push(base + 1);
    };

    let grid_y = FIELD_EXTENT_Y + GOAL_DEPTH;

    // Floor grid.
    let mut x = -FIELD_EXTENT_X;
    while x <= FIELD_EXTENT_X + 1.0 {
        line([x, -grid_y, 0.0], [x, grid_y, 0.0]);
        x += GRID_SPACING;
    }
    let mut y = -grid_y;
    while y <= grid_y + 1.0 {
        line([-FIELD_EXTENT_X, y, 0.0], [FIELD_EXTENT_X, y, 0.0]);
        y += GRID_SPACING;
    }

    // Wall top edge and corner posts.
    let corners = [
        [-FIELD_EXTENT_X, -FIELD_EXTENT_Y],
        [FIELD_EXTENT_X, -FIELD_EXTENT_Y],
        [FIELD_EXTENT_X, FIELD_EXTENT_Y],
        [-FIELD_EXTENT_X, FIELD_EXTENT_Y],
    ];
    for i in 0..4 {
        let [ax, ay] = corners[i];
        let [bx, by] = corners[(i + 1) % 4];
        line([ax, ay, CEILING_Z], [bx, by, CEILING_Z]);
        line([ax, ay, 0.0], [ax, ay, CEILING_Z]);
    }

    // Goal frames at both back walls.
    for sign in [-1.0f32, 1.0] {
        let y = FIELD_EXTENT_Y * sign;
        line([-GOAL_HALF_WIDTH, y, 0.0], [-GOAL_HALF_WIDTH, y, GOAL_HEIGHT]);
        line([GOAL_HALF_WIDTH, y, 0.0], [GOAL_HALF_WIDTH, y, GOAL_HEIGHT]);
        line(
            [-GOAL_HALF_WIDTH, y, GOAL_HEIGHT],
            [GOAL_HALF_WIDTH, y, GOAL_HEIGHT],
        );
    }

    Mesh {
        vertices,
        indices,
        topology: Topology::Lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_indices_are_in_bounds() {
        let mesh = sphere(8, 16, 91.25);
        assert_eq!(mesh.topology, Topology::Triangles);
        assert_eq!(mesh.indices.len() % 3, 0);
        let max = *mesh.indices.iter().max().unwrap() as usize;
        assert!(max < mesh.vertices.len());
    }

    #[test]
    fn sphere_vertices_lie_on_the_radius() {
        let mesh = sphere(8, 16, 100.0);
        for v in &mesh.vertices {
            let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
            assert!((len - 100.0).abs() < 1e-2);
        }
    }

    #[test]
    fn wire_meshes_use_line_pairs() {
        for mesh in [
            sphere_wire(8, 16, 91.25),
            cylinder_wire(4, 160.0, 64.0),
            disc_wire(16, 91.0),
            cube_wire(),
            arena_wire(),
        ] {
            assert_eq!(mesh.topology, Topology::Lines);
            assert_eq!(mesh.indices.len() % 2, 0);
            let max = *mesh.indices.iter().max().unwrap() as usize;
            assert!(max < mesh.vertices.len());
        }
    }

    #[test]
    fn cube_is_a_unit_box() {
        let mesh = cube();
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.indices.len(), 36);
        for v in &mesh.vertices {
            assert!(v.iter().all(|c| c.abs() == 0.5));
        }
    }
}
