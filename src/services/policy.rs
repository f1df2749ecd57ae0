use crate::models::request::VerificationRequest;
use crate::models::user::Role;
use crate::services::jwt::Principal;

/// Single visibility rule for a verification request, shared by every list
/// and get path that touches one (directly or via evidence):
/// ADMIN sees everything, CLIENT only its own org, FIELD only requests it is
/// assigned to. `is_assigned` is resolved by the caller for FIELD principals.
pub fn request_visible(principal: &Principal, request: &VerificationRequest, is_assigned: bool) -> bool {
    match principal.role {
        Role::Admin => true,
        Role::Client => request.client_org_id == principal.org_id,
        Role::Field => is_assigned,
    }
}
