use super::*;
use crate::config::EngineConfig;
use crate::context::RequestContext;
use crate::coordinator::{DependencyHandle, LocalCoordinator};
use crate::error::NodeError;
use crate::proto::{
    AddQueryChannelRequest, ErrorCode, GetMetricsRequest, GetSegmentInfoRequest,
    LoadSegmentsRequest, ReleaseCollectionRequest, ReleasePartitionsRequest,
    ReleaseSegmentsRequest, RemoveQueryChannelRequest, SegmentLoadInfo, StateCode,
    VchannelInfo, WatchDeltaChannelsRequest, WatchDmChannelsRequest,
};
use crate::session::SessionRegistry;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct Fixture {
    engine: LocalQueryEngine,
    registry: Arc<SessionRegistry>,
    primary: Arc<dyn DependencyHandle>,
    secondary: Arc<dyn DependencyHandle>,
}

async fn create_fixture() -> Fixture {
    let registry = Arc::new(SessionRegistry::new());
    let primary: Arc<dyn DependencyHandle> = Arc::new(LocalCoordinator::new(
        "rootcoord",
        1,
        "127.0.0.1:53100",
        Arc::clone(&registry),
    ));
    let secondary: Arc<dyn DependencyHandle> = Arc::new(LocalCoordinator::new(
        "indexcoord",
        1,
        "127.0.0.1:31000",
        Arc::clone(&registry),
    ));
    for handle in [&primary, &secondary] {
        handle.init().await.unwrap();
        handle.start().await.unwrap();
    }

    let engine = LocalQueryEngine::new(
        7,
        "127.0.0.1:21123",
        EngineConfig::default(),
        Arc::clone(&registry),
    );

    Fixture {
        engine,
        registry,
        primary,
        secondary,
    }
}

async fn create_started_fixture() -> Fixture {
    let fixture = create_fixture().await;
    fixture
        .engine
        .wire(Dependencies::new(&fixture.primary, &fixture.secondary))
        .await
        .unwrap();
    fixture.engine.init().await.unwrap();
    fixture.engine.start().await.unwrap();
    fixture
}

fn load_request(collection_id: i64, segments: &[(i64, i64, i64)]) -> LoadSegmentsRequest {
    LoadSegmentsRequest {
        dst_node_id: 7,
        collection_id,
        infos: segments
            .iter()
            .map(|&(segment_id, partition_id, num_of_rows)| SegmentLoadInfo {
                segment_id,
                partition_id,
                collection_id,
                insert_channel: format!("dml_{}", collection_id),
                num_of_rows,
                segment_size: num_of_rows * 16,
            })
            .collect(),
    }
}

#[tokio::test]
async fn test_init_requires_wiring() {
    let fixture = create_fixture().await;
    let err = fixture.engine.init().await.unwrap_err();
    assert!(matches!(err, NodeError::NotReady { .. }));

    let err = fixture.engine.start().await.unwrap_err();
    assert!(matches!(err, NodeError::NotReady { .. }));
}

#[tokio::test]
async fn test_init_rejects_unhealthy_dependency() {
    let fixture = create_fixture().await;
    fixture.secondary.stop().await.unwrap();
    fixture
        .engine
        .wire(Dependencies::new(&fixture.primary, &fixture.secondary))
        .await
        .unwrap();

    assert!(fixture.engine.init().await.is_err());
}

#[tokio::test]
async fn test_wire_rejects_dropped_dependency() {
    let fixture = create_fixture().await;
    let dependencies = Dependencies::new(&fixture.primary, &fixture.secondary);
    let Fixture {
        engine, secondary, ..
    } = fixture;
    drop(secondary);

    assert!(dependencies.secondary().is_none());
    assert!(engine.wire(dependencies).await.is_err());
}

#[tokio::test]
async fn test_data_plane_refused_before_start() {
    let fixture = create_fixture().await;
    let ctx = RequestContext::new();

    let status = fixture
        .engine
        .add_query_channel(&ctx, AddQueryChannelRequest::default())
        .await
        .unwrap();
    assert_eq!(status.error_code, ErrorCode::NotReadyServe);

    let resp = fixture.engine.get_statistics_channel(&ctx).await.unwrap();
    assert_eq!(resp.status.error_code, ErrorCode::NotReadyServe);
    assert!(resp.value.is_empty());

    let resp = fixture
        .engine
        .get_segment_info(&ctx, GetSegmentInfoRequest::default())
        .await
        .unwrap();
    assert_eq!(resp.status.error_code, ErrorCode::NotReadyServe);
}

#[tokio::test]
async fn test_lifecycle_and_registration() {
    let fixture = create_started_fixture().await;
    assert_eq!(fixture.engine.state(), StateCode::Healthy);

    fixture.engine.register().await.unwrap();
    let sessions = fixture.registry.get(QUERY_NODE_ROLE);
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].server_id, 7);
    assert_eq!(sessions[0].address, "127.0.0.1:21123");

    let states = fixture
        .engine
        .get_component_states(&RequestContext::new())
        .await
        .unwrap();
    assert!(states.is_healthy());

    fixture.engine.stop().await.unwrap();
    assert_eq!(fixture.engine.state(), StateCode::Abnormal);
    assert!(fixture.registry.get(QUERY_NODE_ROLE).is_empty());
}

#[tokio::test]
async fn test_channels_from_config() {
    let fixture = create_started_fixture().await;
    let ctx = RequestContext::new();

    let stats = fixture.engine.get_statistics_channel(&ctx).await.unwrap();
    assert!(stats.status.is_success());
    assert_eq!(stats.value, EngineConfig::default().stats_channel);

    let tick = fixture.engine.get_time_tick_channel(&ctx).await.unwrap();
    assert!(tick.status.is_success());
    assert_eq!(tick.value, EngineConfig::default().time_tick_channel);
}

#[tokio::test]
async fn test_query_channel_management() {
    let fixture = create_started_fixture().await;
    let ctx = RequestContext::new();
    let add = AddQueryChannelRequest {
        node_id: 7,
        collection_id: 100,
        query_channel: "query-100".to_string(),
        query_result_channel: "query-result-100".to_string(),
    };

    assert!(fixture
        .engine
        .add_query_channel(&ctx, add.clone())
        .await
        .unwrap()
        .is_success());
    // Adding twice is accepted
    assert!(fixture
        .engine
        .add_query_channel(&ctx, add)
        .await
        .unwrap()
        .is_success());

    let remove = RemoveQueryChannelRequest {
        node_id: 7,
        collection_id: 100,
        query_channel: "query-100".to_string(),
        query_result_channel: "query-result-100".to_string(),
    };
    assert!(fixture
        .engine
        .remove_query_channel(&ctx, remove.clone())
        .await
        .unwrap()
        .is_success());

    let unknown = RemoveQueryChannelRequest {
        collection_id: 999,
        ..remove
    };
    let status = fixture
        .engine
        .remove_query_channel(&ctx, unknown)
        .await
        .unwrap();
    assert_eq!(status.error_code, ErrorCode::CollectionNotExists);

    let empty = AddQueryChannelRequest {
        node_id: 7,
        collection_id: 100,
        ..Default::default()
    };
    let status = fixture.engine.add_query_channel(&ctx, empty).await.unwrap();
    assert_eq!(status.error_code, ErrorCode::IllegalArgument);
}

#[tokio::test]
async fn test_requests_for_other_nodes_are_rejected() {
    let fixture = create_started_fixture().await;
    let ctx = RequestContext::new();

    let mut request = load_request(100, &[(1, 10, 100)]);
    request.dst_node_id = 8;
    let status = fixture.engine.load_segments(&ctx, request).await.unwrap();
    assert_eq!(status.error_code, ErrorCode::IllegalArgument);

    let status = fixture
        .engine
        .release_collection(
            &ctx,
            ReleaseCollectionRequest {
                node_id: 8,
                collection_id: 100,
            },
        )
        .await
        .unwrap();
    assert_eq!(status.error_code, ErrorCode::IllegalArgument);
}

#[tokio::test]
async fn test_watch_channels() {
    let fixture = create_started_fixture().await;
    let ctx = RequestContext::new();

    let status = fixture
        .engine
        .watch_dm_channels(
            &ctx,
            WatchDmChannelsRequest {
                node_id: 7,
                collection_id: 100,
                partition_ids: vec![10, 11],
                infos: vec![VchannelInfo {
                    collection_id: 100,
                    channel_name: "dml_0_100v0".to_string(),
                    seek_position: None,
                }],
            },
        )
        .await
        .unwrap();
    assert!(status.is_success());

    let status = fixture
        .engine
        .watch_delta_channels(
            &ctx,
            WatchDeltaChannelsRequest {
                node_id: 7,
                collection_id: 100,
                infos: vec![VchannelInfo {
                    collection_id: 100,
                    channel_name: "delta_0_100v0".to_string(),
                    seek_position: Some(42),
                }],
            },
        )
        .await
        .unwrap();
    assert!(status.is_success());

    let status = fixture
        .engine
        .watch_dm_channels(&ctx, WatchDmChannelsRequest::default())
        .await
        .unwrap();
    assert_eq!(status.error_code, ErrorCode::IllegalArgument);

    let metrics = fixture
        .engine
        .get_metrics(
            &ctx,
            GetMetricsRequest {
                request: r#"{"metric_type": "system_info"}"#.to_string(),
            },
        )
        .await
        .unwrap();
    let info: metrics::SystemInfoMetrics = serde_json::from_str(&metrics.response).unwrap();
    assert_eq!(info.dm_channels, 1);
    assert_eq!(info.delta_channels, 1);
    assert_eq!(info.partitions, 2);
}

#[tokio::test]
async fn test_load_and_release_segments() {
    let fixture = create_started_fixture().await;
    let ctx = RequestContext::new();

    let status = fixture
        .engine
        .load_segments(&ctx, load_request(100, &[(1, 10, 100), (2, 10, 50), (3, 11, 25)]))
        .await
        .unwrap();
    assert!(status.is_success());

    let resp = fixture
        .engine
        .get_segment_info(
            &ctx,
            GetSegmentInfoRequest {
                collection_id: 100,
                segment_ids: vec![],
            },
        )
        .await
        .unwrap();
    assert!(resp.status.is_success());
    let ids: Vec<i64> = resp.infos.iter().map(|info| info.segment_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert!(resp.infos.iter().all(|info| info.node_id == 7));

    let status = fixture
        .engine
        .release_segments(
            &ctx,
            ReleaseSegmentsRequest {
                node_id: 7,
                collection_id: 100,
                partition_ids: vec![],
                segment_ids: vec![2],
            },
        )
        .await
        .unwrap();
    assert!(status.is_success());

    let resp = fixture
        .engine
        .get_segment_info(
            &ctx,
            GetSegmentInfoRequest {
                collection_id: 100,
                segment_ids: vec![2],
            },
        )
        .await
        .unwrap();
    assert_eq!(resp.status.error_code, ErrorCode::SegmentNotFound);
    assert!(resp.infos.is_empty());

    let status = fixture
        .engine
        .release_partitions(
            &ctx,
            ReleasePartitionsRequest {
                node_id: 7,
                collection_id: 100,
                partition_ids: vec![11],
            },
        )
        .await
        .unwrap();
    assert!(status.is_success());

    let resp = fixture
        .engine
        .get_segment_info(
            &ctx,
            GetSegmentInfoRequest {
                collection_id: 100,
                segment_ids: vec![],
            },
        )
        .await
        .unwrap();
    let ids: Vec<i64> = resp.infos.iter().map(|info| info.segment_id).collect();
    assert_eq!(ids, vec![1]);

    let status = fixture
        .engine
        .release_collection(
            &ctx,
            ReleaseCollectionRequest {
                node_id: 7,
                collection_id: 100,
            },
        )
        .await
        .unwrap();
    assert!(status.is_success());

    let resp = fixture
        .engine
        .get_segment_info(
            &ctx,
            GetSegmentInfoRequest {
                collection_id: 100,
                segment_ids: vec![],
            },
        )
        .await
        .unwrap();
    assert_eq!(resp.status.error_code, ErrorCode::CollectionNotExists);
}

#[tokio::test]
async fn test_load_rejects_mixed_collections() {
    let fixture = create_started_fixture().await;
    let mut request = load_request(100, &[(1, 10, 100)]);
    request.infos[0].collection_id = 200;

    let status = fixture
        .engine
        .load_segments(&RequestContext::new(), request)
        .await
        .unwrap();
    assert_eq!(status.error_code, ErrorCode::IllegalArgument);
}

#[tokio::test]
async fn test_metrics() {
    let fixture = create_started_fixture().await;
    let ctx = RequestContext::new();
    fixture
        .engine
        .load_segments(&ctx, load_request(100, &[(1, 10, 100), (2, 10, 50)]))
        .await
        .unwrap();

    let resp = fixture
        .engine
        .get_metrics(
            &ctx,
            GetMetricsRequest {
                request: r#"{"metric_type": "system_info"}"#.to_string(),
            },
        )
        .await
        .unwrap();
    assert!(resp.status.is_success());
    assert_eq!(resp.component_name, "querynode7");

    let info: metrics::SystemInfoMetrics = serde_json::from_str(&resp.response).unwrap();
    assert_eq!(info.node_id, 7);
    assert_eq!(info.state, StateCode::Healthy);
    assert_eq!(info.collections, 1);
    assert_eq!(info.segments, 2);
    assert_eq!(info.total_rows, 150);
    assert_eq!(info.dependencies, vec!["rootcoord", "indexcoord"]);

    let resp = fixture
        .engine
        .get_metrics(
            &ctx,
            GetMetricsRequest {
                request: r#"{"metric_type": "system_load"}"#.to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(resp.status.error_code, ErrorCode::UnexpectedError);

    let resp = fixture
        .engine
        .get_metrics(&ctx, GetMetricsRequest::default())
        .await
        .unwrap();
    assert_eq!(resp.status.error_code, ErrorCode::IllegalArgument);
}

#[tokio::test]
async fn test_load_rejects_negative_sizes() {
    let fixture = create_started_fixture().await;
    let mut request = load_request(100, &[(1, 10, 100)]);
    request.infos[0].num_of_rows = -1;

    let status = fixture
        .engine
        .load_segments(&RequestContext::new(), request)
        .await
        .unwrap();
    assert_eq!(status.error_code, ErrorCode::IllegalArgument);

    let resp = fixture
        .engine
        .get_segment_info(
            &RequestContext::new(),
            GetSegmentInfoRequest {
                collection_id: 100,
                segment_ids: vec![],
            },
        )
        .await
        .unwrap();
    assert_eq!(resp.status.error_code, ErrorCode::CollectionNotExists);
}

#[tokio::test]
async fn test_metrics_totals_saturate() {
    let fixture = create_started_fixture().await;
    let ctx = RequestContext::new();
    let mut request = load_request(100, &[(1, 10, 0), (2, 10, 0)]);
    for info in request.infos.iter_mut() {
        info.num_of_rows = i64::MAX;
        info.segment_size = i64::MAX;
    }
    let status = fixture.engine.load_segments(&ctx, request).await.unwrap();
    assert!(status.is_success());

    let resp = fixture
        .engine
        .get_metrics(
            &ctx,
            GetMetricsRequest {
                request: r#"{"metric_type": "system_info"}"#.to_string(),
            },
        )
        .await
        .unwrap();
    assert!(resp.status.is_success());

    let info: metrics::SystemInfoMetrics = serde_json::from_str(&resp.response).unwrap();
    assert_eq!(info.segments, 2);
    assert_eq!(info.total_rows, i64::MAX);
    assert_eq!(info.total_mem_size, i64::MAX);
}

#[tokio::test]
async fn test_cancelled_request_is_not_served() {
    let fixture = create_started_fixture().await;
    let token = CancellationToken::new();
    token.cancel();
    let ctx = RequestContext::with_cancellation(token);

    let status = fixture
        .engine
        .load_segments(&ctx, load_request(100, &[(1, 10, 100)]))
        .await
        .unwrap();
    assert_eq!(status.error_code, ErrorCode::UnexpectedError);

    let resp = fixture
        .engine
        .get_segment_info(
            &RequestContext::new(),
            GetSegmentInfoRequest {
                collection_id: 100,
                segment_ids: vec![],
            },
        )
        .await
        .unwrap();
    assert_eq!(resp.status.error_code, ErrorCode::CollectionNotExists);
}

#[tokio::test]
async fn test_stop_drops_loaded_state() {
    let fixture = create_started_fixture().await;
    let ctx = RequestContext::new();
    fixture
        .engine
        .load_segments(&ctx, load_request(100, &[(1, 10, 100)]))
        .await
        .unwrap();

    fixture.engine.stop().await.unwrap();

    let status = fixture
        .engine
        .load_segments(&ctx, load_request(100, &[(2, 10, 100)]))
        .await
        .unwrap();
    assert_eq!(status.error_code, ErrorCode::NotReadyServe);
}
