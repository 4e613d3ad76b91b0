mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;

use common::{
    content, endpoint, run_config, tasks, FakeClient, Recorder, Script, StopAfterCompleted, LABEL,
};
use tagflow_core::api::{
    BatchEngine, ExecutorError, LiveConfig, Payload, RemoteError, TaskBoard, TaskStatus,
    FALLBACK_MIME_TYPE,
};

fn engine(cfg: tagflow_core::api::RunConfig, client: Arc<FakeClient>) -> BatchEngine {
    BatchEngine::builder(LiveConfig::new(cfg)).client(client).build()
}

#[tokio::test]
async fn every_task_completes_on_second_attempt() {
    let client = Arc::new(FakeClient::new(Script::FailThen {
        failures: 1,
        reply: LABEL.into(),
    }));
    let engine = engine(run_config(3, 2, vec![endpoint("e1")]), client.clone());
    let board = Arc::new(TaskBoard::new(tasks(5)));

    let summary = engine.run(board.clone()).await.unwrap();

    assert_eq!(summary.completed, 5);
    assert_eq!(summary.failed, 0);
    assert_eq!(client.total_calls(), 10);
    for task in board.snapshot() {
        assert_eq!(task.status, TaskStatus::Completed, "{}", task.id);
        assert_eq!(task.attempts, 2, "{}", task.id);
        assert_eq!(task.tags.as_deref(), Some(LABEL));
        assert_eq!(task.error, None);
    }
}

#[tokio::test]
async fn no_eligible_endpoint_fails_without_calls() {
    let mut disabled = endpoint("e1");
    disabled.disabled = true;
    let client = Arc::new(FakeClient::new(Script::Reply(LABEL.into())));
    let engine = engine(run_config(2, 3, vec![disabled]), client.clone());
    let board = Arc::new(TaskBoard::new(tasks(2)));

    let summary = engine.run(board.clone()).await.unwrap();

    assert_eq!(summary.failed, 2);
    assert_eq!(client.total_calls(), 0);
    for task in board.snapshot() {
        assert_eq!(task.status, TaskStatus::Error);
        assert_eq!(task.error.as_deref(), Some("no endpoint available"));
        assert_eq!(task.attempts, 0);
    }
}

#[tokio::test]
async fn global_cancel_reverts_in_flight_and_unclaimed_to_pending() {
    // t1 answers once t2 is in flight; t2 hangs until cancelled.
    let client = Arc::new(
        FakeClient::new(Script::Reply(LABEL.into()))
            .script(
                &content(1),
                Script::AfterInFlight {
                    count: 2,
                    reply: LABEL.into(),
                },
            )
            .script(&content(2), Script::Hang),
    );
    let stopper = StopAfterCompleted::new("t1");
    let engine = Arc::new(
        BatchEngine::builder(LiveConfig::new(run_config(2, 3, vec![endpoint("e1")])))
            .client(client.clone())
            .renderer(stopper.clone())
            .build(),
    );
    stopper.attach(&engine);
    let board = Arc::new(TaskBoard::new(tasks(4)));

    let summary = engine.run(board.clone()).await.unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.pending, 3);
    assert_eq!(client.total_calls(), 2);

    let statuses: Vec<TaskStatus> = board.snapshot().iter().map(|t| t.status).collect();
    assert_eq!(
        statuses,
        vec![
            TaskStatus::Completed,
            TaskStatus::Pending,
            TaskStatus::Pending,
            TaskStatus::Pending,
        ]
    );
    let interrupted = board.get("t2").unwrap();
    assert_eq!(interrupted.error, None);
    assert_eq!(interrupted.attempts, 0);
}

#[tokio::test]
async fn disabled_retry_calls_client_once() {
    let client = Arc::new(FakeClient::new(Script::Fail(RemoteError::from_status(
        503, "busy",
    ))));
    let mut cfg = run_config(1, 5, vec![endpoint("e1")]);
    cfg.retry.enabled = false;
    let engine = engine(cfg, client.clone());
    let board = Arc::new(TaskBoard::new(tasks(1)));

    engine.run(board.clone()).await.unwrap();

    assert_eq!(client.total_calls(), 1);
    let task = board.get("t1").unwrap();
    assert_eq!(task.status, TaskStatus::Error);
    assert_eq!(task.error.as_deref(), Some("API error 503: busy"));
}

#[tokio::test]
async fn unauthorized_is_not_retried() {
    let client = Arc::new(FakeClient::new(Script::Fail(RemoteError::from_status(
        401,
        "invalid api key",
    ))));
    let engine = engine(run_config(1, 3, vec![endpoint("e1")]), client.clone());
    let board = Arc::new(TaskBoard::new(tasks(1)));

    engine.run(board.clone()).await.unwrap();

    assert_eq!(client.total_calls(), 1);
    let task = board.get("t1").unwrap();
    assert_eq!(task.status, TaskStatus::Error);
    assert_eq!(task.attempts, 1);
}

#[tokio::test]
async fn short_results_exhaust_the_budget() {
    let client = Arc::new(FakeClient::new(Script::Reply("cat".into())));
    let engine = engine(run_config(1, 3, vec![endpoint("e1")]), client.clone());
    let board = Arc::new(TaskBoard::new(tasks(1)));

    engine.run(board.clone()).await.unwrap();

    assert_eq!(client.total_calls(), 3);
    let task = board.get("t1").unwrap();
    assert_eq!(task.status, TaskStatus::Error);
    assert_eq!(task.error.as_deref(), Some("too short (3)"));
    assert_eq!(task.attempts, 3);
}

#[tokio::test]
async fn cancel_one_twice_stops_only_that_task() {
    let client = Arc::new(
        FakeClient::new(Script::Reply(LABEL.into())).script(&content(1), Script::Hang),
    );
    let engine = engine(run_config(1, 3, vec![endpoint("e1")]), client.clone());
    let board = Arc::new(TaskBoard::new(tasks(2)));

    let (summary, _) = tokio::join!(engine.run(board.clone()), async {
        client.wait_in_flight(1).await;
        engine.cancel("t1");
        engine.cancel("t1");
    });
    let summary = summary.unwrap();

    assert!(!summary.cancelled);
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.pending, 1);
    assert_eq!(client.calls_for(&content(1)), 1);

    let stopped = board.get("t1").unwrap();
    assert_eq!(stopped.status, TaskStatus::Pending);
    assert_eq!(stopped.error, None);
    assert_eq!(board.get("t2").unwrap().status, TaskStatus::Completed);
}

#[tokio::test]
async fn queued_task_cancelled_before_claim_is_skipped() {
    let client = Arc::new(
        FakeClient::new(Script::Reply(LABEL.into())).script(&content(1), Script::Hang),
    );
    let engine = engine(run_config(1, 3, vec![endpoint("e1")]), client.clone());
    let board = Arc::new(TaskBoard::new(tasks(3)));

    let (summary, _) = tokio::join!(engine.run(board.clone()), async {
        client.wait_in_flight(1).await;
        engine.cancel("t2");
        engine.cancel("t1");
    });
    let summary = summary.unwrap();

    assert_eq!(summary.completed, 1);
    assert_eq!(client.calls_for(&content(2)), 0);
    assert_eq!(board.get("t2").unwrap().status, TaskStatus::Pending);
    assert_eq!(board.get("t3").unwrap().status, TaskStatus::Completed);
}

#[tokio::test]
async fn panicking_task_is_isolated() {
    let client = Arc::new(
        FakeClient::new(Script::Reply(LABEL.into())).script(&content(1), Script::Panic),
    );
    let engine = engine(run_config(1, 3, vec![endpoint("e1")]), client.clone());
    let board = Arc::new(TaskBoard::new(tasks(2)));

    let summary = engine.run(board.clone()).await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.completed, 1);
    let broken = board.get("t1").unwrap();
    assert_eq!(broken.status, TaskStatus::Error);
    assert_eq!(broken.error.as_deref(), Some("internal error: client exploded"));
    assert_eq!(board.get("t2").unwrap().status, TaskStatus::Completed);
}

#[tokio::test]
async fn processing_is_delivered_before_terminal_state() {
    let client = Arc::new(FakeClient::new(Script::FailThen {
        failures: 1,
        reply: LABEL.into(),
    }));
    let recorder = Arc::new(Recorder::default());
    let engine = BatchEngine::builder(LiveConfig::new(run_config(2, 2, vec![endpoint("e1")])))
        .client(client)
        .renderer(recorder.clone())
        .build();
    let board = Arc::new(TaskBoard::new(tasks(3)));

    engine.run(board).await.unwrap();

    for id in ["t1", "t2", "t3"] {
        assert_eq!(
            recorder.statuses_for(id),
            vec![TaskStatus::Processing, TaskStatus::Completed],
            "{id}"
        );
    }
    assert_eq!(*recorder.run_ends.lock().unwrap(), 1);
}

#[tokio::test]
async fn endpoints_rotate_round_robin() {
    let client = Arc::new(FakeClient::new(Script::Reply(LABEL.into())));
    let mut off = endpoint("off");
    off.active = false;
    let cfg = run_config(1, 1, vec![endpoint("a"), off, endpoint("b")]);
    let engine = engine(cfg, client.clone());

    engine
        .run(Arc::new(TaskBoard::new(tasks(4))))
        .await
        .unwrap();

    assert_eq!(client.endpoints_seen(), vec!["a", "b", "a", "b"]);
}

#[tokio::test]
async fn uncompressed_content_reaches_client_unchanged() {
    let client = Arc::new(FakeClient::new(Script::Reply(LABEL.into())));
    let engine = engine(run_config(1, 1, vec![endpoint("e1")]), client.clone());

    engine
        .run(Arc::new(TaskBoard::new(tasks(1))))
        .await
        .unwrap();

    assert_eq!(
        client.payloads(),
        vec![Payload::encode(&content(1), FALLBACK_MIME_TYPE)]
    );
}

#[tokio::test]
async fn second_concurrent_run_is_refused() {
    let client = Arc::new(FakeClient::new(Script::Hang));
    let engine = engine(run_config(1, 1, vec![endpoint("e1")]), client.clone());
    let board = Arc::new(TaskBoard::new(tasks(1)));

    let (first, second) = tokio::join!(engine.run(board.clone()), async {
        client.wait_in_flight(1).await;
        let second = engine.run(board.clone()).await;
        engine.cancel_all();
        second
    });

    assert!(matches!(second, Err(ExecutorError::AlreadyRunning)));
    let first = first.unwrap();
    assert!(first.cancelled);
    assert_eq!(first.pending, 1);
    assert!(!engine.is_running());
}

#[tokio::test]
async fn completed_tasks_are_not_requeued() {
    let client = Arc::new(FakeClient::new(Script::Reply(LABEL.into())));
    let engine = engine(run_config(2, 1, vec![endpoint("e1")]), client.clone());
    let board = Arc::new(TaskBoard::new(tasks(2)));

    engine.run(board.clone()).await.unwrap();
    assert_eq!(client.total_calls(), 2);

    assert!(matches!(
        engine.run(board.clone()).await,
        Err(ExecutorError::NothingToDo)
    ));

    board.reset("t1");
    let summary = engine.run(board).await.unwrap();
    assert_eq!(summary.total, 1);
    assert_eq!(client.total_calls(), 3);
}

#[tokio::test]
async fn endpoint_disabled_mid_run_is_skipped_by_later_dispatches() {
    let client = Arc::new(
        FakeClient::new(Script::Reply(LABEL.into())).script(&content(1), Script::Hang),
    );
    let engine = engine(
        run_config(1, 1, vec![endpoint("a"), endpoint("b")]),
        client.clone(),
    );
    let board = Arc::new(TaskBoard::new(tasks(4)));

    let (summary, _) = tokio::join!(engine.run(board.clone()), async {
        client.wait_in_flight(1).await;
        assert!(engine.live_config().set_endpoint_disabled("b", true));
        engine.cancel("t1");
    });
    let summary = summary.unwrap();

    // A copy taken at run start would have alternated a, b, a, b.
    assert_eq!(client.endpoints_seen(), vec!["a", "a", "a", "a"]);
    assert_eq!(summary.completed, 3);
    assert_eq!(board.get("t1").unwrap().status, TaskStatus::Pending);
}

#[tokio::test]
async fn endpoint_enabled_mid_run_joins_the_rotation() {
    let client = Arc::new(
        FakeClient::new(Script::Reply(LABEL.into())).script(&content(1), Script::Hang),
    );
    let mut b = endpoint("b");
    b.disabled = true;
    let engine = engine(run_config(1, 1, vec![endpoint("a"), b]), client.clone());
    let board = Arc::new(TaskBoard::new(tasks(3)));

    let (summary, _) = tokio::join!(engine.run(board.clone()), async {
        client.wait_in_flight(1).await;
        assert!(engine.live_config().set_endpoint_disabled("b", false));
        engine.cancel("t1");
    });
    summary.unwrap();

    assert_eq!(client.endpoints_seen(), vec!["a", "b", "a"]);
}
