//! Deadline enforcement and transport failure classification.
//!
//! Timeouts are counted separately from other transport failures but share
//! their retry policy.

use std::error::Error as StdError;
use std::future::Future;
use std::io;
use std::time::Duration;

use crate::error::ProxyError;

/// Run `fut` under `deadline`, mapping both elapsed deadlines and transport
/// errors into [`ProxyError`].
pub async fn call_with_timeout<F, T, E>(deadline: Duration, fut: F) -> Result<T, ProxyError>
where
    F: Future<Output = Result<T, E>>,
    E: StdError + 'static,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(classify_transport_error(&e)),
        Err(_) => Err(ProxyError::Timeout(format!(
            "no response within {}ms",
            deadline.as_millis()
        ))),
    }
}

/// Map a client error to `Timeout` when any cause in its chain is an I/O
/// timeout, otherwise to `Transport`. The message flattens the cause chain.
pub fn classify_transport_error(err: &(dyn StdError + 'static)) -> ProxyError {
    let mut message = err.to_string();
    let mut timed_out = false;

    let mut source = Some(err);
    while let Some(current) = source {
        if let Some(io_err) = current.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::TimedOut {
                timed_out = true;
            }
        }
        if let Some(next) = current.source() {
            let text = next.to_string();
            if !message.contains(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
        }
        source = current.source();
    }

    if timed_out {
        ProxyError::Timeout(message)
    } else {
        ProxyError::Transport(message)
    }
}
