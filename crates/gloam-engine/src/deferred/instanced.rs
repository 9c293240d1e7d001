use glam::Mat4;

use crate::gfx::{GpuContext, InstanceBuffer, Instances, Mesh};

use super::primitives::create_cube;

/// Many unit cubes drawn with one instanced call.
///
/// The transforms are uploaded once; a batch is immutable and is rebuilt to
/// change its contents.
#[derive(Debug)]
pub struct InstancedBatch {
    cube: Mesh,
    transforms: InstanceBuffer,
    count: u32,
}

impl InstancedBatch {
    pub fn new(ctx: &mut dyn GpuContext, transforms: &[Mat4]) -> Self {
        let cube = create_cube(ctx, "gloam batch cube");
        let buffer = ctx.create_instance_buffer("gloam batch instances", transforms);
        log::debug!("instanced batch with {} transforms", transforms.len());
        Self {
            cube,
            transforms: buffer,
            count: transforms.len() as u32,
        }
    }

    pub fn len(&self) -> u32 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Issues one instanced draw with the active program.
    pub fn draw(&self, ctx: &mut dyn GpuContext) {
        ctx.draw(
            self.cube.id(),
            Instances::Batch {
                buffer: self.transforms.id(),
                count: self.count,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::gfx::recording::RecordingContext;

    #[test]
    fn draw_submits_exactly_one_instanced_call() {
        let mut ctx = RecordingContext::new();
        let transforms: Vec<Mat4> = (0..50)
            .map(|i| Mat4::from_translation(Vec3::new(i as f32, 0.0, 0.0)))
            .collect();
        let batch = InstancedBatch::new(&mut ctx, &transforms);

        ctx.clear_log();
        batch.draw(&mut ctx);

        let draws: Vec<_> = ctx.draws().collect();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].instances, 50);
        assert_eq!(draws[0].vertex_count, 36);

        let buffer = draws[0].instance_buffer.unwrap();
        assert_eq!(ctx.instance_transforms(buffer), Some(&transforms[..]));
    }

    #[test]
    fn dropping_batch_releases_both_buffers() {
        let mut ctx = RecordingContext::new();
        let batch = InstancedBatch::new(&mut ctx, &[Mat4::IDENTITY]);
        assert_eq!(ctx.live_resources(), 2);
        drop(batch);
        assert_eq!(ctx.collect_released(), 2);
        assert_eq!(ctx.live_resources(), 0);
    }
}
