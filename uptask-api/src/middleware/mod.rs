/// Request extractors for the API server
///
/// - [`context`]: caller, project and task resolution with permission gates
/// - [`validation`]: validated JSON bodies
/// - [`security`]: security response headers

pub mod context;
pub mod security;
pub mod validation;
