use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InviteRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Role is required"))]
    pub role: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetPasswordRequest {
    #[validate(length(min = 1, message = "User id is required"))]
    pub user_id: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct OrderActionRequest {
    #[validate(length(min = 1, message = "Order id is required"))]
    pub order_id: String,

    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignSponsorshipRequest {
    #[validate(length(min = 1, message = "Student id is required"))]
    pub student_id: String,

    #[validate(length(min = 1, message = "Donor id is required"))]
    pub donor_id: String,

    #[validate(range(min = 1, message = "Points must be positive"))]
    pub points: i64,
}
