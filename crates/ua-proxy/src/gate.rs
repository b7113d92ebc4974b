// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Executability gate for method proxies.
//!
//! The Executable attribute of a state machine method is volatile: the
//! server flips it as the machine moves between states. A method proxy keeps
//! the last value it saw, but that snapshot is never refreshed implicitly,
//! not even after an invocation of the same method. Decisions that depend on
//! the current state need [`MethodProxy::read_executable_flag`], and
//! asynchronous server transitions need
//! [`MethodProxy::wait_until_executable`].

use std::time::Duration;

use tracing::{debug, trace};

use crate::client::{CancellationToken, ProxySession, UaValue};
use crate::error::{ConversionError, ProxyError, ProxyResult};
use crate::proxy::MethodProxy;
use crate::types::{AttributeId, NodeId};

impl MethodProxy {
    /// Returns the last known executable flag without I/O.
    ///
    /// This is the build snapshot unless a fresh read happened since. `None`
    /// if the flag was never read.
    pub fn executable_flag(&self) -> Option<bool> {
        *self.executable.read()
    }

    /// Reads the executable flag from the server and stores it.
    pub async fn read_executable_flag(&self) -> ProxyResult<bool> {
        self.refresh_flag(None).await
    }

    /// Like [`read_executable_flag`](Self::read_executable_flag), released
    /// early by `cancel`.
    pub async fn read_executable_flag_with(&self, cancel: &CancellationToken) -> ProxyResult<bool> {
        self.refresh_flag(Some(cancel)).await
    }

    async fn refresh_flag(&self, cancel: Option<&CancellationToken>) -> ProxyResult<bool> {
        let flag = read_executable(&self.session, &self.info.node_id, cancel).await?;
        *self.executable.write() = Some(flag);
        Ok(flag)
    }

    /// Polls the executable flag until it equals `expected`.
    ///
    /// Fails with a `Communication` timeout if the flag does not match
    /// within `timeout`. Read failures end the wait immediately.
    pub async fn wait_until_executable(
        &self,
        expected: bool,
        poll_interval: Duration,
        timeout: Duration,
    ) -> ProxyResult<()> {
        let poll = async {
            loop {
                if self.refresh_flag(None).await? == expected {
                    return Ok::<(), ProxyError>(());
                }
                tokio::time::sleep(poll_interval).await;
            }
        };

        match tokio::time::timeout(timeout, poll).await {
            Ok(result) => {
                debug!(method = %self.info.browse_name, expected, "Executable flag reached");
                result
            }
            Err(_) => Err(ProxyError::timeout(
                "wait_until_executable",
                self.info.node_id.to_string(),
                timeout,
            )),
        }
    }
}

/// Reads the Executable attribute, or UserExecutable when configured.
pub(crate) async fn read_executable(
    session: &ProxySession,
    method_id: &NodeId,
    cancel: Option<&CancellationToken>,
) -> ProxyResult<bool> {
    let attribute = if session.config().use_user_executable {
        AttributeId::UserExecutable
    } else {
        AttributeId::Executable
    };

    let value = session.read(method_id, attribute, cancel).await?;
    if value.status.is_bad() {
        return Err(ProxyError::from_status(
            "read",
            method_id.to_string(),
            value.status,
        ));
    }

    match value.value {
        Some(UaValue::Boolean(flag)) => {
            trace!(method_id = %method_id, attribute = %attribute, flag, "Read executable flag");
            Ok(flag)
        }
        other => Err(ProxyError::conversion(ConversionError::type_mismatch(
            method_id.to_string(),
            attribute,
            "Boolean",
            other.as_ref().map(UaValue::type_name).unwrap_or("empty"),
        ))),
    }
}
