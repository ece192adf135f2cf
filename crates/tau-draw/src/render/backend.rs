use crate::batch::FrameBatches;

/// Consumer of one assembled frame of batches.
///
/// `ShapeRenderer::render` flattens its tables and calls [`submit`](DrawBackend::submit)
/// once per frame. Implementations upload the arrays in `frame` and issue
/// `frame.draw_calls` in order, applying each call's key as render state.
pub trait DrawBackend {
    fn submit(&mut self, frame: &FrameBatches<'_>);
}

/// Backend that records what it was given; used by tests in place of a GPU.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingBackend {
    pub submits: usize,
    pub calls: Vec<crate::batch::DrawCall>,
    pub line_vertices: usize,
    pub polygon_vertices: usize,
    pub point_vertices: Vec<crate::batch::PointVertex>,
}

#[cfg(test)]
impl DrawBackend for RecordingBackend {
    fn submit(&mut self, frame: &FrameBatches<'_>) {
        self.submits += 1;
        self.calls = frame.draw_calls.to_vec();
        self.line_vertices = frame.line_vertices.len();
        self.polygon_vertices = frame.polygon_vertices.len();
        self.point_vertices = frame.point_vertices.to_vec();
    }
}
