//! Resource ids and single-owner handles.
//!
//! Ids are plain `Copy` values used for binding. Handles own the resource: dropping
//! a handle pushes its id onto the owning context's [`ReleaseQueue`], and the
//! context frees the GPU object on its next `collect_released` call.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

macro_rules! resource_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        pub struct $name(pub(crate) u32);

        impl $name {
            #[inline]
            pub fn raw(self) -> u32 {
                self.0
            }
        }

        impl From<$name> for ResourceId {
            fn from(id: $name) -> Self {
                ResourceId::$name(id)
            }
        }
    };
}

resource_id!(
    /// Sampled image (including render-target attachments).
    TextureId
);
resource_id!(
    /// Off-screen render target (attachment set).
    TargetId
);
resource_id!(
    /// Linked GPU program.
    ProgramId
);
resource_id!(
    /// Static vertex buffer.
    MeshId
);
resource_id!(
    /// Per-instance transform buffer.
    BufferId
);

/// Any releasable resource id.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ResourceId {
    TextureId(TextureId),
    TargetId(TargetId),
    ProgramId(ProgramId),
    MeshId(MeshId),
    BufferId(BufferId),
}

/// Ids of dropped handles awaiting release.
///
/// Contexts are single-threaded, so the queue is a shared `Rc<RefCell<_>>`.
#[derive(Clone, Default)]
pub struct ReleaseQueue {
    inner: Rc<RefCell<Vec<ResourceId>>>,
}

impl ReleaseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, id: ResourceId) {
        self.inner.borrow_mut().push(id);
    }

    /// Takes every pending id in drop order.
    pub fn drain(&self) -> Vec<ResourceId> {
        std::mem::take(&mut *self.inner.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

impl fmt::Debug for ReleaseQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseQueue").field("pending", &self.len()).finish()
    }
}

/// Owning handle for a context resource.
///
/// Not `Clone`: exactly one owner exists per GPU object.
pub struct Owned<I>
where
    I: Copy + Into<ResourceId>,
{
    id: I,
    queue: ReleaseQueue,
}

impl<I> Owned<I>
where
    I: Copy + Into<ResourceId>,
{
    /// Wraps `id`; intended for context implementations.
    pub fn new(id: I, queue: &ReleaseQueue) -> Self {
        Self {
            id,
            queue: queue.clone(),
        }
    }

    #[inline]
    pub fn id(&self) -> I {
        self.id
    }
}

impl<I> Drop for Owned<I>
where
    I: Copy + Into<ResourceId>,
{
    fn drop(&mut self) {
        self.queue.push(self.id.into());
    }
}

impl<I> fmt::Debug for Owned<I>
where
    I: Copy + Into<ResourceId> + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Owned").field(&self.id).finish()
    }
}

pub type Texture = Owned<TextureId>;
pub type Target = Owned<TargetId>;
pub type Program = Owned<ProgramId>;
pub type Mesh = Owned<MeshId>;
pub type InstanceBuffer = Owned<BufferId>;
