use super::ApiError;

pub fn validate_ticket_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid ticket ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

pub fn validate_account_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid account ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ticket_id() {
        assert!(validate_ticket_id(1).is_ok());
        assert!(validate_ticket_id(98765).is_ok());
        assert!(validate_ticket_id(0).is_err());
        assert!(validate_ticket_id(-7).is_err());
    }

    #[test]
    fn test_validate_account_id() {
        assert_eq!(validate_account_id(3).unwrap(), 3);
        assert!(matches!(
            validate_account_id(0),
            Err(ApiError::ValidationError(_))
        ));
    }
}
