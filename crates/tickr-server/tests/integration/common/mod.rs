//! Shared mocks. Not every test binary uses every helper.

#[allow(dead_code)]
pub mod mock_http;
#[allow(dead_code)]
pub mod mock_ws;
