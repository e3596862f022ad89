//! Normalized container lifecycle event and the classification rules applied
//! before an event reaches the dispatcher.

use bollard::models::{EventMessage, EventMessageTypeEnum};

/// A container lifecycle event, normalized from the runtime's own wire shape.
///
/// Mirrors the source's tolerant JSON frame: `id` and `status` are the only
/// fields load-bearing for dispatch, `kind` is used solely to filter out
/// image events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEvent {
    pub id: Option<String>,
    pub status: Option<String>,
    pub kind: Option<String>,
}

impl ContainerEvent {
    /// `true` if this event should never reach a backend: missing required
    /// fields, an image event, or an `exec_*` status.
    pub fn is_filtered(&self) -> bool {
        let (Some(_), Some(status)) = (&self.id, &self.status) else {
            return true;
        };
        if self.kind.as_deref() == Some("image") {
            return true;
        }
        if status.starts_with("exec_") {
            return true;
        }
        false
    }

    /// `true` for `destroy`, where inspection is known to fail.
    pub fn is_destroy(&self) -> bool {
        self.status.as_deref() == Some("destroy")
    }
}

impl From<EventMessage> for ContainerEvent {
    fn from(msg: EventMessage) -> Self {
        let kind = msg.typ.map(|t| match t {
            EventMessageTypeEnum::CONTAINER => "container".to_string(),
            EventMessageTypeEnum::IMAGE => "image".to_string(),
            other => format!("{other:?}").to_lowercase(),
        });
        let id = msg.actor.as_ref().and_then(|a| a.id.clone());
        let status = msg.action;

        Self { id, status, kind }
    }
}
