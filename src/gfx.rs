/// Render collaborator seam.
///
/// The simulation never touches a frame buffer. It hands mesh data to a
/// backend once (at level load) and gets an opaque handle back, then
/// every frame it asks the backend to draw that handle with a full
/// projection * view * model transform.
///
///   create_renderable(mesh) -> handle     (level load)
///   render(handle, transform)             (every frame, per placement)
///   release_all()                         (before the next level load)

use glam::{Mat4, Vec3};

/// How the vertex list is assembled into triangles.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Primitive {
    /// Every 3 vertices form one triangle.
    Triangles,
    /// Vertex 0 is the hub, each following pair closes a triangle.
    TriangleFan,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FillMode {
    Fill,
    Line,
}

/// Vertex + per-vertex color data for one renderable.
/// Colors are linear RGB in `0.0..=1.0`.
#[derive(Clone, Debug)]
pub struct MeshData {
    pub primitive: Primitive,
    pub vertices: Vec<Vec3>,
    pub colors: Vec<Vec3>,
    pub fill: FillMode,
}

impl MeshData {
    /// Vertex index triples for every triangle in the mesh.
    pub fn triangles(&self) -> Vec<[usize; 3]> {
        let n = self.vertices.len();
        match self.primitive {
            Primitive::Triangles => (0..n / 3).map(|t| [t * 3, t * 3 + 1, t * 3 + 2]).collect(),
            Primitive::TriangleFan => {
                if n < 3 { return vec![]; }
                (1..n - 1).map(|i| [0, i, i + 1]).collect()
            }
        }
    }

    /// Color of vertex `i`, white if the color list is short.
    pub fn color(&self, i: usize) -> Vec3 {
        self.colors.get(i).copied().unwrap_or(Vec3::ONE)
    }
}

/// Uploads every mesh with one fill mode, whatever the mesh asked for.
pub struct ForceFill<'a> {
    pub inner: &'a mut dyn RenderBackend,
    pub fill: FillMode,
}

impl RenderBackend for ForceFill<'_> {
    fn create_renderable(&mut self, mut mesh: MeshData) -> MeshHandle {
        mesh.fill = self.fill;
        self.inner.create_renderable(mesh)
    }

    fn render(&mut self, handle: MeshHandle, transform: Mat4) {
        self.inner.render(handle, transform);
    }

    fn release_all(&mut self) {
        self.inner.release_all();
    }
}

/// Opaque id for a mesh uploaded to a backend.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct MeshHandle(pub u32);

pub trait RenderBackend {
    /// Upload a mesh; the returned handle stays valid until `release_all`.
    fn create_renderable(&mut self, mesh: MeshData) -> MeshHandle;

    /// Draw a previously created mesh with the combined transform.
    fn render(&mut self, handle: MeshHandle, transform: Mat4);

    /// Drop every mesh. Handles issued before this call become invalid.
    fn release_all(&mut self);
}

/// Backend that keeps everything in memory, for tests.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingBackend {
    pub meshes: Vec<MeshData>,
    pub draws: Vec<(MeshHandle, Mat4)>,
    pub releases: usize,
}

#[cfg(test)]
impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draws_of(&self, handle: MeshHandle) -> Vec<Mat4> {
        self.draws.iter().filter(|(h, _)| *h == handle).map(|(_, m)| *m).collect()
    }
}

#[cfg(test)]
impl RenderBackend for RecordingBackend {
    fn create_renderable(&mut self, mesh: MeshData) -> MeshHandle {
        self.meshes.push(mesh);
        MeshHandle(self.meshes.len() as u32 - 1)
    }

    fn render(&mut self, handle: MeshHandle, transform: Mat4) {
        self.draws.push((handle, transform));
    }

    fn release_all(&mut self) {
        self.meshes.clear();
        self.draws.clear();
        self.releases += 1;
    }
}
