//! Correlation and wire transport across the core/bot boundary.
//!
//! Prompts rendered by the bot must be correlatable by the core parser
//! alone, and a parsed input must survive the trip to the worker.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeMap;

use serde_json::json;
use slack_bud_bot::dispatch::ConfirmationPrompt;
use slack_bud_bot::slack::build_prompt_response;
use slack_bud_core::{
    CallbackId, CommandInput, CommandInputError, ExecutionLocation, ParamBag, SessionId,
    SubCommand, classify, command_to_fallback, wire,
};

fn click_bag(payload: &serde_json::Value) -> ParamBag {
    ParamBag::new().with("payload", payload.to_string())
}

#[test]
fn test_rendered_prompt_correlates_in_both_shapes() {
    for (command, sub_command) in [
        ("props", SubCommand::named("set")),
        ("canary", SubCommand::Default),
        ("build", SubCommand::named("with_deps")),
    ] {
        let callback_id = CallbackId::new(sub_command.clone(), command_to_fallback(command))
            .with_action("confirm")
            .with_session(SessionId::generate());
        let prompt = build_prompt_response(&ConfirmationPrompt::new("Sure?", "confirm"), &callback_id);
        let attachment = &prompt.attachments[0];

        let ephemeral = click_bag(&json!({
            "callback_id": attachment.callback_id,
            "actions": [{"value": "yes"}]
        }));
        let in_channel = click_bag(&json!({
            "callback_id": attachment.callback_id,
            "original_message": {"attachments": [{"fallback": attachment.fallback}]},
            "actions": [{"value": "yes"}]
        }));

        for bag in [ephemeral, in_channel] {
            assert!(classify(&bag));
            let input = CommandInput::from_params(&bag, "dev").unwrap();
            assert_eq!(input.command(), Some(command));
            assert_eq!(input.sub_command(), Some(&sub_command));
            assert_eq!(input.callback_value(), Some("yes"));
        }

        let parsed = CallbackId::parse(&attachment.callback_id).unwrap();
        assert_eq!(parsed, callback_id);
    }
}

#[test]
fn test_legacy_callback_ids_still_correlate() {
    let input = CommandInput::from_params(
        &click_bag(&json!({
            "callback_id": "callback_default_CmdCanary_env_ab12",
            "actions": [{"value": "prod"}]
        })),
        "dev",
    )
    .unwrap();

    assert_eq!(input.command(), Some("canary"));
    assert_eq!(input.sub_command(), Some(&SubCommand::Default));
    assert_eq!(input.callback_value(), Some("prod"));
}

#[test]
fn test_click_errors_are_typed() {
    let cases = [
        (json!({"actions": []}), "MalformedPayload"),
        (json!({"callback_id": "callback_set"}), "UnresolvedFallback"),
        (
            json!({"callback_id": "callback_set_props_confirm_ab12"}),
            "InvalidFallbackFormat",
        ),
        (
            json!({
                "callback_id": "cb_set",
                "original_message": {"attachments": [{"fallback": "CmdProps"}]}
            }),
            "InvalidCallbackIdFormat",
        ),
    ];

    for (payload, expected) in cases {
        let err = CommandInput::from_params(&click_bag(&payload), "dev").unwrap_err();
        let matched = match err {
            CommandInputError::MalformedPayload(_) => "MalformedPayload",
            CommandInputError::UnresolvedFallback => "UnresolvedFallback",
            CommandInputError::InvalidFallbackFormat(_) => "InvalidFallbackFormat",
            CommandInputError::InvalidCallbackIdFormat(_) => "InvalidCallbackIdFormat",
            other => panic!("unexpected error {other:?}"),
        };
        assert_eq!(matched, expected, "payload {payload}");
    }
}

#[test]
fn test_worker_receives_what_ingress_parsed() {
    let bag = ParamBag::from_form(
        "text=Props+set+maxRetries+%223+retries%22+-s+content&user_id=U1&user_name=jane&response_url=https%3A%2F%2Fhooks.example%2F1",
    );
    let mut ingress = CommandInput::from_params(&bag, "staging").unwrap();
    ingress.set_execution_location(ExecutionLocation::Sync).unwrap();
    ingress.set_arg_dict(BTreeMap::from([("service".to_string(), "content".to_string())]));
    ingress.set_confirmation_params(BTreeMap::from([("attempt".to_string(), json!(2))]));

    let json = wire::to_json(&ingress).unwrap();
    let mut worker = wire::from_json(&json).unwrap();

    assert_eq!(
        worker.execution_location(),
        Err(CommandInputError::ExecutionLocationNotSet)
    );
    worker.set_execution_location(ExecutionLocation::Async).unwrap();

    assert_eq!(worker.command(), Some("props"));
    assert_eq!(worker.sub_command(), Some(&SubCommand::named("set")));
    assert_eq!(worker.arg_list(), ingress.arg_list());
    assert_eq!(worker.by_index(3), Some("3 retries"));
    assert_eq!(worker.by_key("-service"), Some("content"));
    assert_eq!(worker.environment(), "staging");
    assert_eq!(worker.user_name(), Some("jane"));
    assert_eq!(worker.response_target(), Some("https://hooks.example/1"));
    assert_eq!(worker.confirmation_params().get("attempt"), Some(&json!(2)));
    assert!(worker.raw_command_line().is_some());
    assert!(!worker.is_confirmation());
}

#[test]
fn test_default_marker_survives_transport() {
    let mut ingress = CommandInput::from_text("canary content -e prod", "dev").unwrap();
    ingress.insert_default_sub_command_marker();

    let worker = wire::from_json(&wire::to_json(&ingress).unwrap()).unwrap();
    assert_eq!(worker.sub_command(), Some(&SubCommand::Default));
    assert_eq!(worker.by_index(2), Some("content"));
}
