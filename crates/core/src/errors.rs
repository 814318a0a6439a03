use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("route origin and destination must differ (city id {city_id})")]
    SelfLoopRoute { city_id: i64 },
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

#[cfg(test)]
mod tests {
    use super::DomainError;

    #[test]
    fn self_loop_message_names_the_city() {
        let error = DomainError::SelfLoopRoute { city_id: 42 };
        assert!(error.to_string().contains("city id 42"));
    }
}
