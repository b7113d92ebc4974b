// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Method invocation.
//!
//! A call is issued on the object the method proxy was built under. The
//! executable flag is not consulted: the server decides, and a refusal
//! comes back as a bad status inside [`CallOutcome`], not as an error.

use std::fmt;

use tracing::debug;

use crate::client::{CallRequest, CallResponse, CancellationToken, UaValue};
use crate::error::ProxyResult;
use crate::proxy::MethodProxy;
use crate::types::StatusCode;

// =============================================================================
// CallOutcome
// =============================================================================

/// Result of a completed method call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome {
    /// Status decided by the server.
    pub status: StatusCode,

    /// Ordered output arguments.
    pub outputs: Vec<UaValue>,

    /// Per-argument validation statuses.
    pub input_argument_results: Vec<StatusCode>,
}

impl CallOutcome {
    /// Returns `true` if the server accepted the call.
    pub fn is_good(&self) -> bool {
        self.status.is_good()
    }

    /// Returns `true` if the server refused the call.
    pub fn is_bad(&self) -> bool {
        self.status.is_bad()
    }

    /// Returns an output argument by position.
    pub fn output(&self, index: usize) -> Option<&UaValue> {
        self.outputs.get(index)
    }
}

impl From<CallResponse> for CallOutcome {
    fn from(response: CallResponse) -> Self {
        Self {
            status: response.status,
            outputs: response.output_arguments,
            input_argument_results: response.input_argument_results,
        }
    }
}

impl fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status)?;
        if !self.outputs.is_empty() {
            let outputs: Vec<String> = self.outputs.iter().map(|v| v.to_string()).collect();
            write!(f, " -> ({})", outputs.join(", "))?;
        }
        Ok(())
    }
}

// =============================================================================
// Invocation
// =============================================================================

impl MethodProxy {
    /// Calls the method with ordered input arguments.
    ///
    /// Transport failures, timeouts and lifecycle misuse are errors. Any
    /// status the server returns, good or bad, is data.
    pub async fn invoke(&self, args: Vec<UaValue>) -> ProxyResult<CallOutcome> {
        self.call(args, None).await
    }

    /// Like [`invoke`](Self::invoke), released early by `cancel`.
    ///
    /// Cancellation releases the caller only; the server may still execute
    /// the call.
    pub async fn invoke_with(
        &self,
        args: Vec<UaValue>,
        cancel: &CancellationToken,
    ) -> ProxyResult<CallOutcome> {
        self.call(args, Some(cancel)).await
    }

    async fn call(
        &self,
        args: Vec<UaValue>,
        cancel: Option<&CancellationToken>,
    ) -> ProxyResult<CallOutcome> {
        let request = CallRequest {
            object_id: self.object_id.clone(),
            method_id: self.info.node_id.clone(),
            input_arguments: args,
        };

        let outcome = CallOutcome::from(self.session.call(&request, cancel).await?);
        debug!(
            method = %self.info.browse_name,
            object_id = %self.object_id,
            status = %outcome.status,
            "Method call completed"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_response() {
        let response = CallResponse {
            status: StatusCode::BAD_NOT_EXECUTABLE,
            input_argument_results: vec![StatusCode::GOOD],
            output_arguments: vec![],
        };
        let outcome = CallOutcome::from(response);
        assert!(outcome.is_bad());
        assert_eq!(outcome.input_argument_results, vec![StatusCode::GOOD]);
        assert!(outcome.output(0).is_none());
    }

    #[test]
    fn test_outcome_display() {
        let outcome = CallOutcome::from(CallResponse::good(vec![UaValue::Int32(3)]));
        assert!(outcome.is_good());
        assert!(outcome.to_string().ends_with("-> (3)"));
    }
}
