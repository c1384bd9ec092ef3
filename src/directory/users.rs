use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::directory::DirectoryError;
use crate::geo::GeoPoint;
use crate::models::user::{NewUser, User};

#[derive(Default)]
pub struct UserDirectory {
    users: DashMap<Uuid, User>,
    phones: DashMap<String, Uuid>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, new_user: NewUser) -> Result<User, DirectoryError> {
        match self.phones.entry(new_user.phone.clone()) {
            Entry::Occupied(_) => Err(DirectoryError::AlreadyExists("user")),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let user = User {
                    id: Uuid::new_v4(),
                    name: new_user.name,
                    phone: new_user.phone,
                    password_hash: new_user.password_hash,
                    location: new_user.location,
                    created_at: now,
                    updated_at: now,
                };
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Option<User> {
        self.users.get(&id).map(|entry| entry.value().clone())
    }

    pub fn find_by_phone(&self, phone: &str) -> Option<User> {
        let id = *self.phones.get(phone)?;
        self.get(id)
    }

    pub fn update_location(&self, id: Uuid, location: GeoPoint) -> Result<User, DirectoryError> {
        let mut user = self
            .users
            .get_mut(&id)
            .ok_or(DirectoryError::NotFound("user"))?;

        user.location = Some(location);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
