use std::cell::RefCell;
use std::collections::VecDeque;

use reqwest::header::HeaderValue;

use crate::fetcher::{PageRequest, Transport, TransportError};
use crate::types::FetchResult;

pub(crate) fn page(status: u16, body: &str) -> FetchResult {
    FetchResult {
        status,
        body: body.to_string(),
        final_url: "https://www.linkedin.com/jobs/view/98765/".to_string(),
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SeenRequest {
    pub user_agent: String,
    pub referer: Option<String>,
    pub cookie_header: Option<String>,
}

/// Replays canned responses in order; answers 500 once the script runs out.
#[derive(Debug, Default)]
pub(crate) struct ScriptedTransport {
    responses: RefCell<VecDeque<FetchResult>>,
    seen: RefCell<Vec<SeenRequest>>,
    fail_transport: bool,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<FetchResult>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            ..Default::default()
        }
    }

    /// Every request fails before a response is produced.
    pub fn failing() -> Self {
        Self {
            fail_transport: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> u32 {
        self.seen.borrow().len() as u32
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.borrow().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: &PageRequest<'_>) -> Result<FetchResult, TransportError> {
        self.seen.borrow_mut().push(SeenRequest {
            user_agent: request.user_agent.to_string(),
            referer: request.referer.map(str::to_string),
            cookie_header: request.cookies.header_value(),
        });

        if self.fail_transport {
            let invalid = HeaderValue::from_str("broken\nheader")
                .expect_err("newline is not a valid header byte");
            return Err(TransportError::InvalidHeader(invalid));
        }

        Ok(self
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| page(500, "")))
    }
}
