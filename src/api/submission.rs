//! Attestation submission for backends that demand an explicit subnet but only reveal the right
//! one in the rejection message.

use std::future::Future;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::errors::Result;

pub const DEFAULT_SUBNET: u64 = 0;

lazy_static! {
    static ref EXPECTED_SUBNET: Regex =
        Regex::new(r"expected:\s*SubnetId\((\d+)\)").expect("valid subnet pattern");
}

/// The subnet named by a rejection message such as `... expected: SubnetId(7)`.
pub fn expected_subnet(message: &str) -> Option<u64> {
    EXPECTED_SUBNET
        .captures(message)
        .and_then(|captures| captures.get(1))
        .and_then(|subnet| subnet.as_str().parse().ok())
}

/// Submits on [`DEFAULT_SUBNET`]; if the backend rejects it naming another subnet, resubmits
/// exactly once on that subnet. Every other failure is returned as is.
pub async fn submit_with_subnet_discovery<F, Fut>(submit: F) -> Result<()>
where
    F: Fn(u64) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let err = match submit(DEFAULT_SUBNET).await {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };
    let Some(subnet) = err.rejection_message().and_then(expected_subnet) else {
        return Err(err);
    };
    debug!(subnet, "backend requested another attestation subnet, resubmitting");
    submit(subnet).await
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::errors::ClientError;

    fn rejected(message: &str) -> ClientError {
        ClientError::BackendRejected {
            status: 400,
            message: message.to_string(),
        }
    }

    #[test]
    fn parses_expected_subnet() {
        assert_eq!(
            expected_subnet("Invalid(InvalidSubnetId { received: SubnetId(0), expected: SubnetId(7) })"),
            Some(7)
        );
        assert_eq!(expected_subnet("expected:SubnetId(12)"), Some(12));
        assert_eq!(expected_subnet("expected: SubnetId(x)"), None);
        assert_eq!(expected_subnet("unknown committee"), None);
    }

    #[tokio::test]
    async fn accepted_on_first_attempt() {
        let attempts = Mutex::new(Vec::new());
        submit_with_subnet_discovery(|subnet| {
            attempts.lock().push(subnet);
            async { Ok(()) }
        })
        .await
        .unwrap();
        assert_eq!(*attempts.lock(), vec![0]);
    }

    #[tokio::test]
    async fn retries_once_on_expected_subnet() {
        let attempts = Mutex::new(Vec::new());
        submit_with_subnet_discovery(|subnet| {
            attempts.lock().push(subnet);
            async move {
                match subnet {
                    0 => Err(rejected("InvalidSubnetId { expected: SubnetId(7) }")),
                    _ => Ok(()),
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(*attempts.lock(), vec![0, 7]);
    }

    #[tokio::test]
    async fn second_rejection_is_terminal() {
        let attempts = Mutex::new(Vec::new());
        let err = submit_with_subnet_discovery(|subnet| {
            attempts.lock().push(subnet);
            async { Err(rejected("InvalidSubnetId { expected: SubnetId(7) }")) }
        })
        .await
        .unwrap_err();
        assert_eq!(*attempts.lock(), vec![0, 7]);
        assert!(err.rejection_message().is_some());
    }

    #[tokio::test]
    async fn unparseable_rejection_is_not_retried() {
        let attempts = Mutex::new(Vec::new());
        let err = submit_with_subnet_discovery(|subnet| {
            attempts.lock().push(subnet);
            async { Err(rejected("attestation is too old")) }
        })
        .await
        .unwrap_err();
        assert_eq!(*attempts.lock(), vec![0]);
        assert_eq!(err.rejection_message(), Some("attestation is too old"));
    }

    #[tokio::test]
    async fn transport_errors_are_not_retried() {
        let attempts = Mutex::new(Vec::new());
        let err = submit_with_subnet_discovery(|subnet| {
            attempts.lock().push(subnet);
            async { Err(ClientError::Cancelled) }
        })
        .await
        .unwrap_err();
        assert_eq!(*attempts.lock(), vec![0]);
        assert!(err.is_cancelled());
    }
}
