//! Common types used throughout the Gateward server.

use serde::Serialize;
use serde_with::skip_serializing_none;

// ApiResponse //
//*************//
/// The envelope every JSON endpoint replies with
#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
	pub success: bool,
	pub data: T,
	#[serde(rename = "reqId")]
	pub req_id: Option<String>,
}

impl<T> ApiResponse<T> {
	pub fn new(data: T) -> Self {
		Self { success: true, data, req_id: None }
	}

	pub fn with_req_id(mut self, req_id: impl Into<String>) -> Self {
		self.req_id = Some(req_id.into());
		self
	}
}


// vim: ts=4
