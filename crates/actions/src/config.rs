//! Typed per-action config payloads.
//!
//! The graph editor stores each node's config as an arbitrary JSON payload
//! next to an `action` string.  That pair is decoded here exactly once, at
//! graph-decode time, into the [`NodeAction`] union — one payload type per
//! action kind — and never re-inspected ad hoc downstream.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Per-action payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallConfig {
    /// Call script the voice provider should run.
    pub script_id: Option<String>,
    pub caller_id: Option<String>,
    /// Skip time-window gating and dial immediately.
    pub force_immediate: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageChannel {
    #[default]
    Whatsapp,
    Sms,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageConfig {
    pub channel: MessageChannel,
    pub template_id: Option<String>,
    pub body: Option<String>,
    /// When positive, the send suspends the run until a reply arrives or
    /// the window elapses.
    pub reply_timeout_minutes: Option<i64>,
    /// Skip time-window gating and send immediately.
    pub force_immediate: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailConfig {
    pub subject: Option<String>,
    pub template_id: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaskConfig {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_in_minutes: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RouteConfig {
    /// Group identifiers in priority order; `"default"` is the explicit
    /// catch-all output.
    pub outputs: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignStrategy {
    #[default]
    LeastLoaded,
    Fixed,
    Heuristic,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssignConfig {
    pub strategy: AssignStrategy,
    /// Agent picked by the `fixed` strategy.
    pub agent_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkLostConfig {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NurtureConfig {
    /// Long-term nurture sequence to enrol the contact in.
    pub sequence_id: Option<String>,
    pub start_delay_days: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateContactConfig {
    /// CRM fields to overwrite, keyed by field name.
    pub fields: HashMap<String, Value>,
}

// ---------------------------------------------------------------------------
// Retry policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    /// Two slots per day (morning/evening) in the operational timezone.
    #[default]
    SmartDaypart,
    /// Flat 24 hours between attempts.
    FixedInterval,
}

/// One-shot side action fired right after a specific failed attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intervention {
    /// Fires once, when the attempt with this number has just failed.
    pub after_attempt: u32,
    #[serde(flatten)]
    pub action: InterventionAction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "snake_case")]
pub enum InterventionAction {
    SendEmail(EmailConfig),
    SendMessage(MessageConfig),
    UpdateContact(UpdateContactConfig),
}

/// Rules governing how many times and when a failed call is retried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryPolicy {
    pub max_attempts: u32,
    #[serde(default)]
    pub backoff: BackoffKind,
    #[serde(default)]
    pub interventions: Vec<Intervention>,
    /// At most one attempt per declared time window: the retry instant is
    /// pushed past the end of the window the failure happened in.
    #[serde(default)]
    pub one_attempt_per_window: bool,
}

// ---------------------------------------------------------------------------
// NodeAction
// ---------------------------------------------------------------------------

/// A node's action with its decoded payload.
///
/// Adding an action kind is a compile-time-checked change: the dispatcher
/// matches this enum exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeAction {
    Call(CallConfig),
    SendMessage(MessageConfig),
    SendEmail(EmailConfig),
    Wait,
    CreateTask(TaskConfig),
    RouteByGroup(RouteConfig),
    AssignAgent(AssignConfig),
    MarkLost(MarkLostConfig),
    StartNurture(NurtureConfig),
    /// Action kind this engine does not know.  Executes as a no-op success
    /// so future editor versions never deadlock a run.
    Unknown(String),
}

impl NodeAction {
    /// Decode the editor's `(action, config)` pair.  A null/missing config
    /// decodes every payload with its defaults.
    pub fn from_parts(kind: &str, config: Value) -> Result<Self, serde_json::Error> {
        let config = if config.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            config
        };
        Ok(match kind {
            "call" => Self::Call(serde_json::from_value(config)?),
            "send_message" => Self::SendMessage(serde_json::from_value(config)?),
            "send_email" => Self::SendEmail(serde_json::from_value(config)?),
            "wait" => Self::Wait,
            "create_task" => Self::CreateTask(serde_json::from_value(config)?),
            "route_by_group" => Self::RouteByGroup(serde_json::from_value(config)?),
            "assign_agent" => Self::AssignAgent(serde_json::from_value(config)?),
            "mark_lost" => Self::MarkLost(serde_json::from_value(config)?),
            "start_nurture" => Self::StartNurture(serde_json::from_value(config)?),
            other => Self::Unknown(other.to_owned()),
        })
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Call(_) => "call",
            Self::SendMessage(_) => "send_message",
            Self::SendEmail(_) => "send_email",
            Self::Wait => "wait",
            Self::CreateTask(_) => "create_task",
            Self::RouteByGroup(_) => "route_by_group",
            Self::AssignAgent(_) => "assign_agent",
            Self::MarkLost(_) => "mark_lost",
            Self::StartNurture(_) => "start_nurture",
            Self::Unknown(kind) => kind,
        }
    }

    /// Calls and messages contact the lead directly and are subject to
    /// time-window gating.
    pub fn is_direct_contact(&self) -> bool {
        matches!(self, Self::Call(_) | Self::SendMessage(_))
    }

    /// Whether the config asks to bypass time-window gating.
    pub fn forces_immediate(&self) -> bool {
        match self {
            Self::Call(cfg) => cfg.force_immediate,
            Self::SendMessage(cfg) => cfg.force_immediate,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_call_config_and_ignores_unknown_fields() {
        let action = NodeAction::from_parts(
            "call",
            json!({ "scriptId": "intro", "forceImmediate": true, "uiColor": "#fff" }),
        )
        .unwrap();
        match action {
            NodeAction::Call(cfg) => {
                assert_eq!(cfg.script_id.as_deref(), Some("intro"));
                assert!(cfg.force_immediate);
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn missing_config_decodes_to_defaults() {
        let action = NodeAction::from_parts("send_message", Value::Null).unwrap();
        match action {
            NodeAction::SendMessage(cfg) => {
                assert_eq!(cfg.channel, MessageChannel::Whatsapp);
                assert!(cfg.reply_timeout_minutes.is_none());
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn unknown_action_kind_is_preserved() {
        let action = NodeAction::from_parts("send_carrier_pigeon", json!({})).unwrap();
        assert_eq!(action, NodeAction::Unknown("send_carrier_pigeon".into()));
        assert_eq!(action.kind(), "send_carrier_pigeon");
    }

    #[test]
    fn retry_policy_decodes_interventions() {
        let policy: RetryPolicy = serde_json::from_value(json!({
            "maxAttempts": 3,
            "backoff": "smart_daypart",
            "oneAttemptPerWindow": true,
            "interventions": [
                { "afterAttempt": 1, "action": "send_message",
                  "payload": { "body": "missed you, call back?" } },
                { "afterAttempt": 2, "action": "update_contact",
                  "payload": { "fields": { "temperature": "cooling" } } }
            ]
        }))
        .unwrap();

        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.backoff, BackoffKind::SmartDaypart);
        assert!(policy.one_attempt_per_window);
        assert_eq!(policy.interventions.len(), 2);
        assert!(matches!(
            policy.interventions[0].action,
            InterventionAction::SendMessage(_)
        ));
    }

    #[test]
    fn direct_contact_classification() {
        assert!(NodeAction::Call(CallConfig::default()).is_direct_contact());
        assert!(NodeAction::SendMessage(MessageConfig::default()).is_direct_contact());
        assert!(!NodeAction::Wait.is_direct_contact());
        assert!(!NodeAction::SendEmail(EmailConfig::default()).is_direct_contact());
    }
}
