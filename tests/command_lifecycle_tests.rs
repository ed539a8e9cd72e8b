// Integration tests for the command lifecycle

mod fixtures;

use fixtures::*;
use lifecycle_hooks::command::listener;
use lifecycle_hooks::{
    BaseCommand, Command, CommandError, CommandEvent, CommandSnapshot, CommandStatus, FnHook,
    HookArgs, HookFilter, HookPhase, LifecycleContext, ScopeNode,
};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn test_command_without_business_logic_completes_empty() {
    let mut command = Command::new(BaseCommand, json!({ "x": 1 }), context_with(registry())).unwrap();

    let result = command.execute().await.unwrap();

    assert_eq!(result, None);
    assert_eq!(command.status(), CommandStatus::Completed);
    assert!(command.result().is_none());
    assert!(command.error().is_none());
}

#[tokio::test]
async fn test_termination_is_idempotent() {
    let mut command = Command::new(SendNotification, json!({ "to": "ops" }), context_with(registry())).unwrap();
    command.execute().await.unwrap();
    let ended_at = command.ended_at();
    let result = command.result().cloned();

    command.fail("late failure").await.unwrap();
    command.complete(Some(json!("override"))).await.unwrap();
    command.fail("another").await.unwrap();

    assert_eq!(command.status(), CommandStatus::Completed);
    assert_eq!(command.ended_at(), ended_at);
    assert_eq!(command.result().cloned(), result);
    assert!(command.error().is_none());
}

#[tokio::test]
async fn test_failure_is_also_terminal() {
    let mut command = Command::new(BaseCommand, json!({}), context_with(registry())).unwrap();
    command.init().await.unwrap();
    command.fail("disk full").await.unwrap();
    let error = command.error().cloned();

    command.complete(Some(json!(1))).await.unwrap();
    command.fail("second").await.unwrap();

    assert_eq!(command.status(), CommandStatus::Failed);
    assert_eq!(command.error().cloned(), error);
    assert!(command.result().is_none());
}

#[tokio::test]
async fn test_timing_is_monotonic() {
    let mut command = Command::new(SendNotification, json!({ "to": "ops" }), context_with(registry())).unwrap();
    command.execute().await.unwrap();

    let created = command.created_at();
    let started = command.started_at().unwrap();
    let ended = command.ended_at().unwrap();

    assert!(created <= started);
    assert!(started <= ended);
    assert_eq!(command.duration(), Some(ended - started));
    assert_eq!(command.idle_time(), Some(started - created));
}

#[tokio::test]
async fn test_snapshot_round_trip_drops_params() {
    let mut command = Command::new(SendNotification, json!({ "to": "ops" }), context_with(registry())).unwrap();
    command.execute().await.unwrap();
    let original = command.to_snapshot();

    let json = serde_json::to_string(&original).unwrap();
    let parsed: CommandSnapshot = serde_json::from_str(&json).unwrap();
    let restored = Command::new(SendNotification, parsed, context_with(registry())).unwrap();

    assert_eq!(restored.aseid(), command.aseid());
    assert_eq!(restored.status(), CommandStatus::Completed);
    assert_eq!(restored.started_at(), command.started_at());
    assert_eq!(restored.ended_at(), command.ended_at());
    assert_eq!(restored.duration(), command.duration());
    assert_eq!(restored.result(), Some(&json!({ "sent_to": "ops" })));

    // params are reporting-only: a restored command must have them re-supplied
    assert!(restored.params().is_none());
    let resupplied = restored.with_params(json!({ "to": "ops" }));
    assert_eq!(resupplied.params(), Some(&json!({ "to": "ops" })));
}

#[tokio::test]
async fn test_failed_command_is_inspectable_through_snapshot() {
    let hooks = registry();
    hooks.register(
        HookPhase::OnBeforeExecute,
        HookFilter::kind("notification"),
        FnHook::new("quota", |_args: &mut HookArgs<'_>| {
            anyhow::bail!("quota exceeded")
        }),
    );
    let mut command = Command::new(SendNotification, json!({ "to": "ops" }), context_with(hooks)).unwrap();

    let result = command.execute().await.unwrap();

    assert_eq!(result, None);
    let snapshot = serde_json::to_value(command.to_snapshot()).unwrap();
    assert_eq!(snapshot["status"], "FAILED");
    assert_eq!(snapshot["error"]["code"], "execution-error");
    assert_eq!(snapshot["error"]["cause"], "quota exceeded");
    assert!(snapshot.get("result").is_none());
}

#[tokio::test]
async fn test_shared_hook_sees_each_command_once() {
    let hooks = registry();
    let counter = CountingHook::new();
    hooks.register_arc(HookPhase::OnExecute, HookFilter::kind("command"), counter.clone());

    let mut first = Command::new(BaseCommand, json!({}), context_with(Arc::clone(&hooks))).unwrap();
    let mut second = Command::new(BaseCommand, json!({}), context_with(Arc::clone(&hooks))).unwrap();
    first.execute().await.unwrap();
    second.execute().await.unwrap();

    assert_eq!(first.status(), CommandStatus::Completed);
    assert_eq!(second.status(), CommandStatus::Completed);
    assert_eq!(counter.invocations().len(), 2);
    assert_eq!(counter.count_for(&first.aseid().to_string()), 1);
    assert_eq!(counter.count_for(&second.aseid().to_string()), 1);
}

#[tokio::test]
async fn test_scope_binding_failure_rejects_execute() {
    let root = ScopeNode::root("app");
    let context = LifecycleContext::new(registry(), root);

    let mut command = Command::new(BaseCommand, json!({}), context).unwrap();
    let err = command.execute().await.unwrap_err();

    assert_eq!(err.code(), "command-scope-binding-error");
    assert_eq!(command.status(), CommandStatus::Created);
}

#[tokio::test]
async fn test_execution_scope_is_destroyed_exactly_once() {
    let (root, destroy_calls) = CountingScope::root("app");
    let context = LifecycleContext::new(registry(), Arc::clone(&root)).register_in(root.create_child("feature"));
    let mut command = Command::new(BaseCommand, json!({}), context).unwrap();

    command.execute().await.unwrap();
    command.complete(None).await.unwrap();
    command.fail("ignored").await.unwrap();

    let scope = command.execution_scope().unwrap();
    assert!(scope.is_destroyed());
    assert!(scope.inherits_from(root.as_ref()));
    assert_eq!(destroy_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_init_failure_marks_command_failed() {
    let hooks = registry();
    hooks.register(
        HookPhase::OnInit,
        HookFilter::Any,
        FnHook::new("validate", |args: &mut HookArgs<'_>| {
            let missing = args
                .command()
                .map(|c| c.params().and_then(|p| p.get("to")).is_none())
                .unwrap_or(true);
            if missing {
                anyhow::bail!("recipient required");
            }
            Ok(())
        }),
    );
    let mut command = Command::new(SendNotification, json!({}), context_with(hooks)).unwrap();

    let err = command.execute().await.unwrap_err();

    assert!(matches!(err, CommandError::Execution { .. }));
    assert_eq!(command.status(), CommandStatus::Failed);
    assert_eq!(
        command.error().and_then(|e| e.cause.clone()),
        Some("recipient required".to_string())
    );
}

#[tokio::test]
async fn test_executing_transition_failure_is_captured() {
    let hooks = registry();
    hooks.register(
        HookPhase::OnBeforeTransition,
        HookFilter::Any,
        FnHook::new("freeze", |args: &mut HookArgs<'_>| {
            if args.transition().map(|t| t.name()) == Some("initialized_executing") {
                anyhow::bail!("deploy freeze");
            }
            Ok(())
        }),
    );
    let mut command = Command::new(BaseCommand, json!({}), context_with(hooks)).unwrap();

    let result = command.execute().await.unwrap();

    assert_eq!(result, None);
    assert_eq!(command.status(), CommandStatus::Failed);
    assert!(command.started_at().is_none());
    let error = command.error().unwrap();
    assert_eq!(error.code, "transition-error");
    assert_eq!(error.cause.as_deref(), Some("deploy freeze"));
}

#[tokio::test]
async fn test_listeners_see_error_then_fail() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let mut command = Command::new(
        BaseCommand,
        json!({}),
        {
            let hooks = registry();
            hooks.register(
                HookPhase::OnAfterExecute,
                HookFilter::Any,
                FnHook::new("boom", |_args: &mut HookArgs<'_>| anyhow::bail!("after-step broke")),
            );
            context_with(hooks)
        },
    )
    .unwrap();

    for event in [CommandEvent::OnError, CommandEvent::OnFail, CommandEvent::OnComplete] {
        let events = Arc::clone(&events);
        command.on(
            event,
            listener(move |cmd: &Command| {
                events.lock().unwrap().push((event, cmd.status()));
                Ok(())
            }),
        );
    }

    command.execute().await.unwrap();

    assert_eq!(
        *events.lock().unwrap(),
        vec![
            (CommandEvent::OnError, CommandStatus::Executing),
            (CommandEvent::OnFail, CommandStatus::Failed),
        ]
    );
}

#[tokio::test]
async fn test_removed_listener_is_not_called() {
    let calls = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&calls);
    let handle = listener(move |_cmd: &Command| {
        *counter.lock().unwrap() += 1;
        Ok(())
    });

    let mut command = Command::new(BaseCommand, json!({}), context_with(registry())).unwrap();
    command.on(CommandEvent::OnComplete, Arc::clone(&handle));
    assert!(command.off(CommandEvent::OnComplete, &handle));
    command.execute().await.unwrap();

    assert_eq!(*calls.lock().unwrap(), 0);
}
