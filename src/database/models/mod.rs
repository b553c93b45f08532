pub mod comment;
pub mod discussion;
pub mod user;

pub use comment::Comment;
pub use discussion::{Discussion, DiscussionParams};
pub use user::User;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Anything addressable by a store-assigned id
pub trait Entity {
    fn id(&self) -> Uuid;
}

/// Reference field that is either a bare id or the joined entity.
///
/// Serialized untagged, so an unexpanded reference is just the UUID string and
/// an expanded one is the full object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Ref<T> {
    Expanded(T),
    Id(Uuid),
}

impl<T: Entity> Ref<T> {
    pub fn id(&self) -> Uuid {
        match self {
            Ref::Expanded(entity) => entity.id(),
            Ref::Id(id) => *id,
        }
    }

    pub fn is_expanded(&self) -> bool {
        matches!(self, Ref::Expanded(_))
    }

}
