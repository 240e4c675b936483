#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Project,
    Feature,
    Task,
    Session,
    Message,
}

impl EntityKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Project => "proj",
            Self::Feature => "feat",
            Self::Task => "task",
            Self::Session => "sess",
            Self::Message => "msg",
        }
    }
}

/// Generate a prefixed record id, e.g. `task_1f8a2c9d04b3`.
pub fn generate_id(kind: EntityKind) -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", kind.prefix(), &raw[..12])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_prefixes() {
        assert!(generate_id(EntityKind::Project).starts_with("proj_"));
        assert!(generate_id(EntityKind::Feature).starts_with("feat_"));
        assert!(generate_id(EntityKind::Task).starts_with("task_"));
        assert!(generate_id(EntityKind::Session).starts_with("sess_"));
        assert!(generate_id(EntityKind::Message).starts_with("msg_"));
    }

    #[test]
    fn test_ids_are_unique() {
        let a = generate_id(EntityKind::Task);
        let b = generate_id(EntityKind::Task);
        assert_ne!(a, b);
    }

    #[test]
    fn test_id_length() {
        let id = generate_id(EntityKind::Message);
        assert_eq!(id.len(), "msg_".len() + 12);
    }
}
