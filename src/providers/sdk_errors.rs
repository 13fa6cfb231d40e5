use std::error::Error as StdError;
use std::fmt;
use std::io::ErrorKind;

use aws_sdk_bedrockruntime::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_smithy_runtime_api::client::result::SdkError;

use crate::error::ChatError;

fn error_chain_has_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == ErrorKind::ConnectionRefused
        {
            return true;
        }

        if source
            .to_string()
            .to_ascii_lowercase()
            .contains("connection refused")
        {
            return true;
        }

        current = source.source();
    }

    false
}

fn error_chain_has_timeout(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == ErrorKind::TimedOut
        {
            return true;
        }

        if source
            .to_string()
            .to_ascii_lowercase()
            .contains("timed out")
        {
            return true;
        }

        current = source.source();
    }

    false
}

pub(crate) fn model_api_error<E, R>(err: SdkError<E, R>, model_id: &str, region: &str) -> ChatError
where
    E: ProvideErrorMetadata + StdError + Send + Sync + 'static,
    R: fmt::Debug + 'static,
{
    if let SdkError::ServiceError(service_error) = &err {
        let inner = service_error.err();
        let message = inner.message().unwrap_or("unknown error");
        let text = match inner.code() {
            Some("AccessDeniedException") => format!(
                "Access denied calling model '{model_id}' in {region}: {message}. \
                 Check AWS credentials and that model access is enabled for this account."
            ),
            Some("ResourceNotFoundException") => format!(
                "Model '{model_id}' was not found in {region}: {message}. \
                 Check --model-id and --region."
            ),
            Some("ThrottlingException") => {
                format!("Request to model '{model_id}' was throttled: {message}")
            }
            Some("ValidationException") => {
                format!("Model '{model_id}' rejected the request: {message}")
            }
            Some("ModelTimeoutException") => {
                format!("Model '{model_id}' timed out while generating: {message}")
            }
            Some("ServiceUnavailableException") => {
                format!("Bedrock is unavailable in {region}: {message}")
            }
            Some("ModelStreamErrorException") => {
                format!("Model '{model_id}' failed mid-stream: {message}")
            }
            Some(code) => format!("error from Bedrock calling '{model_id}', {code}: {message}"),
            None => format!("error from Bedrock calling '{model_id}': {message}"),
        };
        return ChatError::Transport(text);
    }

    if matches!(err, SdkError::TimeoutError(_)) || error_chain_has_timeout(&err) {
        return ChatError::Transport(format!(
            "Model request to '{model_id}' timed out. \
             Check network connectivity to Bedrock in {region}."
        ));
    }

    if error_chain_has_connection_refused(&err) {
        return ChatError::Transport(format!(
            "Connection refused by Bedrock in {region}. \
             Check AWS_REGION and any endpoint override."
        ));
    }

    if matches!(err, SdkError::DispatchFailure(_)) {
        return ChatError::Transport(format!(
            "Failed to reach Bedrock in {region}: {}. \
             Check AWS_REGION and network connectivity.",
            DisplayErrorContext(&err)
        ));
    }

    ChatError::Transport(format!("error from Bedrock, {}", DisplayErrorContext(&err)))
}

#[cfg(test)]
mod tests {
    use aws_sdk_bedrockruntime::operation::invoke_model::InvokeModelError;
    use aws_smithy_runtime_api::client::result::SdkError;

    use super::{error_chain_has_connection_refused, error_chain_has_timeout, model_api_error};
    use crate::error::ErrorKind;

    #[test]
    fn detects_timeout_from_error_kind() {
        let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        assert!(error_chain_has_timeout(&err));
    }

    #[test]
    fn detects_connection_refused_from_error_kind() {
        let err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "nope");
        assert!(error_chain_has_connection_refused(&err));
        let other = std::io::Error::other("broken pipe");
        assert!(!error_chain_has_connection_refused(&other));
    }

    #[test]
    fn maps_sdk_timeouts_to_actionable_message() {
        let err: SdkError<InvokeModelError, ()> = SdkError::timeout_error(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "timed out",
        ));
        let mapped = model_api_error(err, "anthropic.claude-v2", "us-east-1");

        assert_eq!(mapped.kind(), ErrorKind::Transport);
        let msg = mapped.to_string();
        assert!(msg.contains("timed out"), "unexpected message: {msg}");
        assert!(msg.contains("anthropic.claude-v2"), "unexpected message: {msg}");
    }

    #[test]
    fn construction_failures_keep_the_sdk_context() {
        let err: SdkError<InvokeModelError, ()> =
            SdkError::construction_failure(std::io::Error::other("missing model id"));
        let msg = model_api_error(err, "m", "eu-west-1").to_string();
        assert!(msg.starts_with("error from Bedrock"), "unexpected message: {msg}");
    }
}
