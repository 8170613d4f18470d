//! src/domain/new_user.rs

use crate::domain::UserEmail;
use crate::domain::UserName;

#[derive(Debug)]
pub struct NewUser {
    pub username: UserName,
    pub email: UserEmail,
}
