// Trigger delivery policies: what to do with events whose action delivery
// failed, and how much of a backlog to keep while retrying.

use serde::{Deserialize, Serialize};

use crate::error::TransformError;

// ── Domain types ─────────────────────────────────────────────────────

/// A named delivery policy referenced by triggers.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryPolicy {
    pub name: String,
    pub error_handlers: Vec<ErrorHandler>,
    pub maximum_capacity: u64,
    pub retry_times: Option<u32>,
    /// Seconds an undelivered event survives in the backlog.
    pub event_ttl: Option<u32>,
}

/// One error class and the strategy applied to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorHandler {
    pub on: ErrorKind,
    pub strategy: RetryStrategy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    AnyError,
    ClientError,
    ServerError,
    /// Explicit HTTP status codes.
    Custom(Vec<u16>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStrategy {
    Discard,
    Retry,
}

// ── Wire DTOs ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryPolicyDto {
    pub name: String,
    pub error_handlers: Vec<ErrorHandlerDto>,
    pub maximum_capacity: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_times: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_ttl: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorHandlerDto {
    /// Either a keyword (`"any_error"`, ...) or an array of status codes.
    pub on: serde_json::Value,
    pub strategy: String,
}

// ── Conversions ──────────────────────────────────────────────────────

impl TryFrom<DeliveryPolicyDto> for DeliveryPolicy {
    type Error = TransformError;

    fn try_from(dto: DeliveryPolicyDto) -> Result<Self, Self::Error> {
        let error_handlers = dto
            .error_handlers
            .into_iter()
            .map(ErrorHandler::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: dto.name,
            error_handlers,
            maximum_capacity: dto.maximum_capacity,
            retry_times: dto.retry_times,
            event_ttl: dto.event_ttl,
        })
    }
}

impl TryFrom<ErrorHandlerDto> for ErrorHandler {
    type Error = TransformError;

    fn try_from(dto: ErrorHandlerDto) -> Result<Self, Self::Error> {
        let on = match &dto.on {
            serde_json::Value::String(keyword) => match keyword.as_str() {
                "any_error" => ErrorKind::AnyError,
                "client_error" => ErrorKind::ClientError,
                "server_error" => ErrorKind::ServerError,
                other => {
                    return Err(TransformError::UnknownValue {
                        field: "error_handlers[].on",
                        value: other.to_owned(),
                    });
                }
            },
            serde_json::Value::Array(codes) => {
                let codes = codes
                    .iter()
                    .map(|code| {
                        code.as_u64()
                            .and_then(|c| u16::try_from(c).ok())
                            .ok_or_else(|| TransformError::UnknownValue {
                                field: "error_handlers[].on",
                                value: code.to_string(),
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                ErrorKind::Custom(codes)
            }
            other => {
                return Err(TransformError::UnknownValue {
                    field: "error_handlers[].on",
                    value: other.to_string(),
                });
            }
        };

        let strategy = match dto.strategy.as_str() {
            "discard" => RetryStrategy::Discard,
            "retry" => RetryStrategy::Retry,
            other => {
                return Err(TransformError::UnknownValue {
                    field: "error_handlers[].strategy",
                    value: other.to_owned(),
                });
            }
        };

        Ok(Self { on, strategy })
    }
}

impl From<&DeliveryPolicy> for DeliveryPolicyDto {
    fn from(policy: &DeliveryPolicy) -> Self {
        Self {
            name: policy.name.clone(),
            error_handlers: policy
                .error_handlers
                .iter()
                .map(|handler| ErrorHandlerDto {
                    on: match &handler.on {
                        ErrorKind::AnyError => "any_error".into(),
                        ErrorKind::ClientError => "client_error".into(),
                        ErrorKind::ServerError => "server_error".into(),
                        ErrorKind::Custom(codes) => serde_json::json!(codes),
                    },
                    strategy: match handler.strategy {
                        RetryStrategy::Discard => "discard",
                        RetryStrategy::Retry => "retry",
                    }
                    .to_owned(),
                })
                .collect(),
            maximum_capacity: policy.maximum_capacity,
            retry_times: policy.retry_times,
            event_ttl: policy.event_ttl,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn dto_round_trip_preserves_policy() {
        let policy = DeliveryPolicy {
            name: "retry-5xx".to_owned(),
            error_handlers: vec![
                ErrorHandler {
                    on: ErrorKind::ServerError,
                    strategy: RetryStrategy::Retry,
                },
                ErrorHandler {
                    on: ErrorKind::Custom(vec![418, 429]),
                    strategy: RetryStrategy::Discard,
                },
            ],
            maximum_capacity: 512,
            retry_times: Some(5),
            event_ttl: None,
        };

        let back = DeliveryPolicy::try_from(DeliveryPolicyDto::from(&policy)).expect("round trip");
        assert_eq!(policy, back);
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let dto = DeliveryPolicyDto {
            name: "bad".to_owned(),
            error_handlers: vec![ErrorHandlerDto {
                on: "any_error".into(),
                strategy: "maybe".to_owned(),
            }],
            maximum_capacity: 1,
            retry_times: None,
            event_ttl: None,
        };

        assert!(DeliveryPolicy::try_from(dto).is_err());
    }
}
