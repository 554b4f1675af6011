//! Exact gateway calls issued by the engine

use async_trait::async_trait;
use cdesk_engine::{EngineConfig, ReconciliationEngine, TracingNotifier};
use cdesk_gateway::{CommentGateway, GatewayError, Listing, VideoId};
use cdesk_store::{CommentId, Thread};
use cdesk_test_utils::{comment, session, settle, thread, video, RESYNC_DELAY};
use mockall::mock;
use mockall::Sequence;
use std::time::Duration;

mock! {
    pub Gateway {}

    #[async_trait]
    impl CommentGateway for Gateway {
        async fn list_threads(&self, video_id: &VideoId) -> Result<Listing, GatewayError>;
        async fn post_top_level_comment(&self, video_id: &VideoId, body: &str) -> Result<(), GatewayError>;
        async fn post_reply(&self, parent_id: &str, body: &str) -> Result<(), GatewayError>;
        async fn delete_by_id(&self, id: &str) -> Result<(), GatewayError>;
    }
}

fn engine(gateway: MockGateway) -> ReconciliationEngine {
    ReconciliationEngine::new(
        gateway,
        TracingNotifier,
        EngineConfig::new().with_resync_delay(RESYNC_DELAY),
    )
}

#[tokio::test(start_paused = true)]
async fn post_lists_then_writes_then_resyncs_once() {
    let mut gateway = MockGateway::new();
    let mut seq = Sequence::new();

    gateway
        .expect_list_threads()
        .withf(|v: &VideoId| v.as_str() == "vid-1")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(Listing::Threads(Vec::new())));
    gateway
        .expect_post_top_level_comment()
        .withf(|v: &VideoId, body: &str| v.as_str() == "vid-1" && body == "hello")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(()));
    gateway
        .expect_list_threads()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(Listing::Threads(vec![thread("c9", &[])])));

    let engine = engine(gateway);
    engine.load_threads_for_video(&session(), video()).await.unwrap();
    engine.post_top_level_comment(&session(), "hello").await.unwrap();

    tokio::time::sleep(RESYNC_DELAY + Duration::from_millis(1)).await;
    settle().await;
    assert_eq!(engine.threads()[0].id, CommentId::confirmed("c9"));
}

#[tokio::test(start_paused = true)]
async fn reply_is_addressed_to_root_comment_id() {
    let mut gateway = MockGateway::new();
    let listed = Thread::new(comment("c1", "Viewer", "root")).with_id(CommentId::confirmed("t1"));

    gateway
        .expect_list_threads()
        .returning(move |_| Ok(Listing::Threads(vec![listed.clone()])));
    gateway
        .expect_post_reply()
        .withf(|parent: &str, body: &str| parent == "c1" && body == "hi")
        .times(1)
        .returning(|_, _| Ok(()));

    let engine = engine(gateway);
    engine.load_threads_for_video(&session(), video()).await.unwrap();
    engine
        .reply_to_thread(&session(), &CommentId::confirmed("t1"), "hi")
        .await
        .unwrap();

    assert_eq!(engine.threads()[0].replies.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn validation_failures_never_reach_gateway() {
    let mut gateway = MockGateway::new();
    gateway
        .expect_list_threads()
        .times(1)
        .returning(|_| Ok(Listing::Threads(vec![thread("c1", &[])])));
    gateway.expect_post_top_level_comment().never();
    gateway.expect_post_reply().never();
    gateway.expect_delete_by_id().never();

    let engine = engine(gateway);
    engine.load_threads_for_video(&session(), video()).await.unwrap();

    assert!(engine.post_top_level_comment(&session(), "").await.is_err());
    assert!(engine
        .reply_to_thread(&session(), &CommentId::confirmed("c1"), " \n ")
        .await
        .is_err());
    assert!(engine
        .delete_comment(&session(), &CommentId::provisional())
        .await
        .is_err());
    assert_eq!(engine.threads().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn delete_of_unlisted_comment_still_goes_remote() {
    let mut gateway = MockGateway::new();
    gateway
        .expect_list_threads()
        .returning(|_| Ok(Listing::Threads(vec![thread("c1", &[])])));
    gateway
        .expect_delete_by_id()
        .withf(|id: &str| id == "elsewhere")
        .times(1)
        .returning(|_| Ok(()));

    let engine = engine(gateway);
    engine.load_threads_for_video(&session(), video()).await.unwrap();
    engine
        .delete_comment(&session(), &CommentId::confirmed("elsewhere"))
        .await
        .unwrap();

    assert_eq!(engine.threads().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn unauthenticated_listing_is_a_fetch_error() {
    let mut gateway = MockGateway::new();
    gateway
        .expect_list_threads()
        .times(1)
        .returning(|_| Err(GatewayError::Unauthenticated));

    let engine = engine(gateway);
    let err = engine
        .load_threads_for_video(&session(), video())
        .await
        .unwrap_err();
    assert_eq!(err.gateway_error(), Some(&GatewayError::Unauthenticated));
    assert!(!engine.is_loading());
}
