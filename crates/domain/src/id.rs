//! ID generation utilities.

use uuid::Uuid;

/// Generates a new time-ordered identifier.
///
/// Toast ids use this so that sorting by id matches creation order.
#[must_use]
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_format() {
        let id = generate_id();
        assert_eq!(id.len(), 36);
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_generate_id_is_sortable() {
        let first = generate_id();
        let second = generate_id();
        assert_ne!(first, second);
        assert!(first < second);
    }
}
