use flow_core::{AgentSystem, NodeId, SubjectId, SubjectNotification};
use serde::{Deserialize, Serialize};

/// Subject-local notification tracking shared by the path nodes.
///
/// At most one notice is buffered; it is surfaced on the node's next tick.
/// Any notice other than `CloseToDestination` also stops listening.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathWatch {
    pub listening: Option<SubjectId>,
    pub pending: Option<SubjectNotification>,
    /// Subject already told about the coming command by the sink trigger.
    #[serde(skip)]
    pub announced: Option<SubjectId>,
}

impl PathWatch {
    pub fn start<W: AgentSystem + ?Sized>(&mut self, world: &mut W, node: NodeId, subject: SubjectId) {
        self.stop(world, node);
        world.register_notification_listener(subject, node);
        self.listening = Some(subject);
    }

    pub fn stop<W: AgentSystem + ?Sized>(&mut self, world: &mut W, node: NodeId) {
        self.stop_listening(world, node);
        self.pending = None;
        self.announced = None;
    }

    /// Tells older path nodes on `subject` to stop.
    pub fn announce<W: AgentSystem + ?Sized>(&mut self, world: &mut W, node: NodeId, subject: SubjectId) {
        if world.agent_kind(subject).is_none() {
            return;
        }
        world.broadcast_notification(
            subject,
            SubjectNotification::PathCancelled { sender: Some(node) },
        );
        self.announced = Some(subject);
    }

    /// Announces right before a dispatch unless the sink trigger already did for this subject.
    pub fn supersede<W: AgentSystem + ?Sized>(&mut self, world: &mut W, node: NodeId, subject: SubjectId) {
        if self.announced.take() != Some(subject) {
            self.announce(world, node, subject);
        }
        self.announced = None;
    }

    fn stop_listening<W: AgentSystem + ?Sized>(&mut self, world: &mut W, node: NodeId) {
        if let Some(subject) = self.listening.take() {
            world.unregister_notification_listener(subject, node);
        }
    }

    pub fn is_listening_to(&self, subject: SubjectId) -> bool {
        self.listening == Some(subject)
    }

    /// Buffers a notice from the watched subject. Path cancellations this node sent itself are dropped.
    pub fn offer<W: AgentSystem + ?Sized>(
        &mut self,
        world: &mut W,
        node: NodeId,
        subject: SubjectId,
        notification: SubjectNotification,
    ) -> bool {
        if !self.is_listening_to(subject) {
            return false;
        }
        if notification == (SubjectNotification::PathCancelled { sender: Some(node) }) {
            return false;
        }
        self.pending = Some(notification);
        if notification != SubjectNotification::CloseToDestination {
            self.stop_listening(world, node);
        }
        true
    }

    pub fn take(&mut self) -> Option<SubjectNotification> {
        self.pending.take()
    }

    /// Registers the listener again after a restore.
    pub fn restore<W: AgentSystem + ?Sized>(&mut self, world: &mut W, node: NodeId, saved: PathWatch) {
        self.stop(world, node);
        if let Some(subject) = saved.listening {
            world.register_notification_listener(subject, node);
        }
        *self = saved;
    }
}
