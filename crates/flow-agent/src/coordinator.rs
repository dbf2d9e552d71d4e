use flow_core::{AgentSystem, NodeId, PipeHandle, SubjectId};
use serde::{Deserialize, Serialize};

/// A (subject, pipe) pair this node listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipeBinding {
    pub subject: SubjectId,
    pub pipe: PipeHandle,
}

/// Owns the node's pipe listener registration.
///
/// `live` is set while a command is pending. Settlement moves it to the
/// one-generation `pending_unregister` shadow, which is flushed before the
/// entry point returns to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalPipeCoordinator {
    listener: NodeId,
    tag: &'static str,
    live: Option<PipeBinding>,
    pending_unregister: Option<PipeBinding>,
}

impl GoalPipeCoordinator {
    pub fn new(listener: NodeId, tag: &'static str) -> Self {
        Self {
            listener,
            tag,
            live: None,
            pending_unregister: None,
        }
    }

    pub fn live(&self) -> Option<PipeBinding> {
        self.live
    }

    pub fn pending_unregister(&self) -> Option<PipeBinding> {
        self.pending_unregister
    }

    pub fn is_pending(&self) -> bool {
        self.live.is_some()
    }

    pub fn matches(&self, subject: SubjectId, pipe: PipeHandle) -> bool {
        self.live == Some(PipeBinding { subject, pipe })
    }

    /// Releases any previous registration, then allocates and registers a new pipe.
    pub fn begin<W: AgentSystem + ?Sized>(&mut self, world: &mut W, subject: SubjectId) -> PipeBinding {
        self.release_all(world);
        let pipe = world.alloc_pipe();
        world.register_pipe_listener(subject, pipe, self.listener, self.tag);
        let binding = PipeBinding { subject, pipe };
        self.live = Some(binding);
        tracing::debug!(node = %self.listener, subject = %subject, pipe = %pipe, "pipe pending");
        binding
    }

    /// Moves the live binding into the shadow. The caller flushes before returning.
    pub fn settle(&mut self) {
        if let Some(binding) = self.live.take() {
            debug_assert!(self.pending_unregister.is_none());
            self.pending_unregister = Some(binding);
        }
    }

    pub fn flush<W: AgentSystem + ?Sized>(&mut self, world: &mut W) {
        if let Some(binding) = self.pending_unregister.take() {
            world.unregister_pipe_listener(binding.subject, binding.pipe, self.listener);
        }
    }

    /// Unregisters both the live binding and the shadow, each at most once.
    pub fn release_all<W: AgentSystem + ?Sized>(&mut self, world: &mut W) {
        if let Some(binding) = self.live.take() {
            world.unregister_pipe_listener(binding.subject, binding.pipe, self.listener);
        }
        self.flush(world);
    }

    /// Reinstates saved bindings. The live one is registered again, the shadow is flushed.
    pub fn restore<W: AgentSystem + ?Sized>(
        &mut self,
        world: &mut W,
        live: Option<PipeBinding>,
        pending_unregister: Option<PipeBinding>,
    ) {
        self.release_all(world);
        if let Some(binding) = live {
            world.register_pipe_listener(binding.subject, binding.pipe, self.listener, self.tag);
        }
        self.live = live;
        self.pending_unregister = pending_unregister;
        self.flush(world);
    }
}
