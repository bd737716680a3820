//! Small shared helpers

use uuid::Uuid;

/// Random unique string: a v4 UUID as 32 lowercase hex digits
pub fn generate_uuid() -> String {
    Uuid::new_v4().simple().to_string()
}
