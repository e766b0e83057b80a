// Trigger definitions: conditions observed by the platform plus the HTTP
// action fired when they match.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransformError;

// ── Domain types ─────────────────────────────────────────────────────

/// A persistent trigger installed in the registry plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub name: String,
    pub action: TriggerAction,
    pub conditions: Vec<SimpleTrigger>,
    /// Optional delivery-policy name governing retries on action failure.
    pub policy: Option<String>,
}

/// What to do when a trigger fires.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerAction {
    HttpPost {
        url: String,
        ignore_ssl_errors: bool,
        custom_headers: Vec<(String, String)>,
    },
}

/// A single matching condition.
#[derive(Debug, Clone, PartialEq)]
pub enum SimpleTrigger {
    /// Fires on device lifecycle changes.
    DeviceTrigger {
        on: DeviceTriggerEvent,
        /// `None` matches any device in the realm.
        device_id: Option<String>,
    },
    /// Fires on data received over an interface.
    DataTrigger {
        on: DataTriggerEvent,
        interface_name: String,
        /// `*` matches any path.
        match_path: String,
        value_match_operator: MatchOperator,
        known_value: Option<Value>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceTriggerEvent {
    DeviceConnected,
    DeviceDisconnected,
    DeviceError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataTriggerEvent {
    IncomingData,
    ValueStored,
    ValueChanged,
    PathCreated,
    PathRemoved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOperator {
    Any,
    EqualTo,
    NotEqualTo,
    GreaterThan,
    GreaterOrEqualTo,
    LessThan,
    LessOrEqualTo,
    Contains,
    NotContains,
}

// ── Wire DTOs ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerDto {
    pub name: String,
    pub action: TriggerActionDto,
    pub simple_triggers: Vec<SimpleTriggerDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerActionDto {
    pub http_url: String,
    pub http_method: String,
    #[serde(default)]
    pub ignore_ssl_errors: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub http_static_headers: Vec<(String, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleTriggerDto {
    #[serde(rename = "type")]
    pub trigger_type: String,
    pub on: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_match_operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_value: Option<Value>,
}

// ── Conversions ──────────────────────────────────────────────────────

impl TryFrom<TriggerDto> for Trigger {
    type Error = TransformError;

    fn try_from(dto: TriggerDto) -> Result<Self, Self::Error> {
        if dto.action.http_method != "post" {
            return Err(TransformError::UnknownValue {
                field: "action.http_method",
                value: dto.action.http_method,
            });
        }

        let conditions = dto
            .simple_triggers
            .into_iter()
            .map(SimpleTrigger::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: dto.name,
            action: TriggerAction::HttpPost {
                url: dto.action.http_url,
                ignore_ssl_errors: dto.action.ignore_ssl_errors,
                custom_headers: dto.action.http_static_headers,
            },
            conditions,
            policy: dto.policy,
        })
    }
}

impl TryFrom<SimpleTriggerDto> for SimpleTrigger {
    type Error = TransformError;

    fn try_from(dto: SimpleTriggerDto) -> Result<Self, Self::Error> {
        match dto.trigger_type.as_str() {
            "device_trigger" => {
                let on = match dto.on.as_str() {
                    "device_connected" => DeviceTriggerEvent::DeviceConnected,
                    "device_disconnected" => DeviceTriggerEvent::DeviceDisconnected,
                    "device_error" => DeviceTriggerEvent::DeviceError,
                    other => {
                        return Err(TransformError::UnknownValue {
                            field: "simple_triggers[].on",
                            value: other.to_owned(),
                        });
                    }
                };
                Ok(Self::DeviceTrigger {
                    on,
                    device_id: dto.device_id,
                })
            }
            "data_trigger" => {
                let on = match dto.on.as_str() {
                    "incoming_data" => DataTriggerEvent::IncomingData,
                    "value_stored" => DataTriggerEvent::ValueStored,
                    "value_changed" => DataTriggerEvent::ValueChanged,
                    "path_created" => DataTriggerEvent::PathCreated,
                    "path_removed" => DataTriggerEvent::PathRemoved,
                    other => {
                        return Err(TransformError::UnknownValue {
                            field: "simple_triggers[].on",
                            value: other.to_owned(),
                        });
                    }
                };
                let interface_name =
                    dto.interface_name
                        .ok_or(TransformError::MissingField {
                            field: "simple_triggers[].interface_name",
                        })?;
                let operator = match dto.value_match_operator.as_deref() {
                    None | Some("*") => MatchOperator::Any,
                    Some("==") => MatchOperator::EqualTo,
                    Some("!=") => MatchOperator::NotEqualTo,
                    Some(">") => MatchOperator::GreaterThan,
                    Some(">=") => MatchOperator::GreaterOrEqualTo,
                    Some("<") => MatchOperator::LessThan,
                    Some("<=") => MatchOperator::LessOrEqualTo,
                    Some("contains") => MatchOperator::Contains,
                    Some("not_contains") => MatchOperator::NotContains,
                    Some(other) => {
                        return Err(TransformError::UnknownValue {
                            field: "simple_triggers[].value_match_operator",
                            value: other.to_owned(),
                        });
                    }
                };
                Ok(Self::DataTrigger {
                    on,
                    interface_name,
                    match_path: dto.match_path.unwrap_or_else(|| "/*".to_owned()),
                    value_match_operator: operator,
                    known_value: dto.known_value,
                })
            }
            other => Err(TransformError::UnknownValue {
                field: "simple_triggers[].type",
                value: other.to_owned(),
            }),
        }
    }
}

impl From<&Trigger> for TriggerDto {
    fn from(trigger: &Trigger) -> Self {
        let TriggerAction::HttpPost {
            url,
            ignore_ssl_errors,
            custom_headers,
        } = &trigger.action;

        Self {
            name: trigger.name.clone(),
            action: TriggerActionDto {
                http_url: url.clone(),
                http_method: "post".to_owned(),
                ignore_ssl_errors: *ignore_ssl_errors,
                http_static_headers: custom_headers.clone(),
            },
            simple_triggers: trigger.conditions.iter().map(SimpleTriggerDto::from).collect(),
            policy: trigger.policy.clone(),
        }
    }
}

impl From<&SimpleTrigger> for SimpleTriggerDto {
    fn from(condition: &SimpleTrigger) -> Self {
        match condition {
            SimpleTrigger::DeviceTrigger { on, device_id } => Self {
                trigger_type: "device_trigger".to_owned(),
                on: match on {
                    DeviceTriggerEvent::DeviceConnected => "device_connected",
                    DeviceTriggerEvent::DeviceDisconnected => "device_disconnected",
                    DeviceTriggerEvent::DeviceError => "device_error",
                }
                .to_owned(),
                device_id: device_id.clone(),
                interface_name: None,
                match_path: None,
                value_match_operator: None,
                known_value: None,
            },
            SimpleTrigger::DataTrigger {
                on,
                interface_name,
                match_path,
                value_match_operator,
                known_value,
            } => Self {
                trigger_type: "data_trigger".to_owned(),
                on: match on {
                    DataTriggerEvent::IncomingData => "incoming_data",
                    DataTriggerEvent::ValueStored => "value_stored",
                    DataTriggerEvent::ValueChanged => "value_changed",
                    DataTriggerEvent::PathCreated => "path_created",
                    DataTriggerEvent::PathRemoved => "path_removed",
                }
                .to_owned(),
                device_id: None,
                interface_name: Some(interface_name.clone()),
                match_path: Some(match_path.clone()),
                value_match_operator: Some(
                    match value_match_operator {
                        MatchOperator::Any => "*",
                        MatchOperator::EqualTo => "==",
                        MatchOperator::NotEqualTo => "!=",
                        MatchOperator::GreaterThan => ">",
                        MatchOperator::GreaterOrEqualTo => ">=",
                        MatchOperator::LessThan => "<",
                        MatchOperator::LessOrEqualTo => "<=",
                        MatchOperator::Contains => "contains",
                        MatchOperator::NotContains => "not_contains",
                    }
                    .to_owned(),
                ),
                known_value: known_value.clone(),
            },
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample_trigger() -> Trigger {
        Trigger {
            name: "high-temperature".to_owned(),
            action: TriggerAction::HttpPost {
                url: "https://hooks.example.com/alerts".to_owned(),
                ignore_ssl_errors: false,
                custom_headers: vec![("x-team".to_owned(), "ops".to_owned())],
            },
            conditions: vec![SimpleTrigger::DataTrigger {
                on: DataTriggerEvent::IncomingData,
                interface_name: "org.stratus.Sampling".to_owned(),
                match_path: "/%{sensor_id}/value".to_owned(),
                value_match_operator: MatchOperator::GreaterThan,
                known_value: Some(serde_json::json!(42.5)),
            }],
            policy: Some("retry-forever".to_owned()),
        }
    }

    #[test]
    fn dto_round_trip_preserves_trigger() {
        let trigger = sample_trigger();
        let dto = TriggerDto::from(&trigger);
        let back = Trigger::try_from(dto).expect("round trip");
        assert_eq!(trigger, back);
    }

    #[test]
    fn device_trigger_round_trip() {
        let trigger = Trigger {
            name: "any-connect".to_owned(),
            action: TriggerAction::HttpPost {
                url: "https://hooks.example.com/connects".to_owned(),
                ignore_ssl_errors: true,
                custom_headers: vec![],
            },
            conditions: vec![SimpleTrigger::DeviceTrigger {
                on: DeviceTriggerEvent::DeviceConnected,
                device_id: None,
            }],
            policy: None,
        };

        let back = Trigger::try_from(TriggerDto::from(&trigger)).expect("round trip");
        assert_eq!(trigger, back);
    }

    #[test]
    fn data_trigger_without_interface_is_rejected() {
        let dto = SimpleTriggerDto {
            trigger_type: "data_trigger".to_owned(),
            on: "incoming_data".to_owned(),
            device_id: None,
            interface_name: None,
            match_path: None,
            value_match_operator: None,
            known_value: None,
        };

        let err = SimpleTrigger::try_from(dto).expect_err("must fail");
        assert!(matches!(err, TransformError::MissingField { .. }));
    }
}
