//! Room membership record (§4.2). A thin value type; mutation is
//! serialized by the owning room's lock, not by any lock of its own.

use std::time::Instant;

use crate::error::AgError;
use crate::id::Id;

#[derive(Debug, Clone)]
pub struct RoomUser {
    pub id: Id,
    name: String,
    last_sync_id: Id,
    last_time: Instant,
}

impl RoomUser {
    pub const NAME_MAX_LENGTH: usize = 32;

    pub fn new(name: &str) -> Result<Self, AgError> {
        let mut this = Self {
            id: Id::new(),
            name: String::new(),
            last_sync_id: Id::nil(),
            last_time: Instant::now(),
        };
        this.set_name(name)?;
        Ok(this)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, new_name: &str) -> Result<(), AgError> {
        if new_name.is_empty() || new_name.len() > Self::NAME_MAX_LENGTH {
            return Err(AgError::bad_request(format!(
                "Invalid user name length: {}. Must be between 1 and {}.",
                new_name.len(),
                Self::NAME_MAX_LENGTH
            )));
        }
        self.name = new_name.to_owned();
        Ok(())
    }

    pub fn last_sync_id(&self) -> Id {
        self.last_sync_id
    }

    pub fn last_time(&self) -> Instant {
        self.last_time
    }

    pub fn update_last(&mut self, new_sync_id: Id) {
        self.last_sync_id = new_sync_id;
        self.last_time = Instant::now();
    }
}

impl serde::Serialize for RoomUser {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("RoomUser", 2)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("name", &self.name)?;
        s.end()
    }
}
