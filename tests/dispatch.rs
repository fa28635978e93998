//! Round-robin dispatch behavior through the front door.

use std::time::Duration;

use cluster_balancer::ipc::Frame;
use tokio::sync::oneshot;

mod common;

use common::{instance_of, start_cluster, tag_factory};

#[tokio::test]
async fn test_round_robin_assignment_order() {
    let cluster = start_cluster(29100, 3, tag_factory()).await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    // Five sequential requests over a pool of three, cursor starting at 0.
    let mut assigned = Vec::new();
    for _ in 0..5 {
        let body = client
            .get(cluster.balancer_url("/api/users"))
            .send()
            .await
            .expect("balancer unreachable")
            .text()
            .await
            .unwrap();
        assigned.push(instance_of(&body));
    }

    assert_eq!(assigned, vec![0, 1, 2, 0, 1]);

    cluster.shutdown.trigger();
}

#[tokio::test]
async fn test_envelope_preserves_method_and_query() {
    let cluster = start_cluster(29130, 2, tag_factory()).await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let body = client
        .delete(cluster.balancer_url("/api/users/42?force=true"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("method=DELETE"));
    assert!(body.contains("url=/api/users/42?force=true"));

    cluster.shutdown.trigger();
}

#[tokio::test]
async fn test_body_not_forwarded_through_balancer() {
    let cluster = start_cluster(29160, 2, tag_factory()).await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    // The dispatch envelope carries method/url/headers only; payload data
    // does not cross the channel.
    let via_balancer = client
        .post(cluster.balancer_url("/api/users"))
        .body("{\"username\":\"ada\"}")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(via_balancer.contains("body=none"), "got: {via_balancer}");

    // The worker's own listener sees the body.
    let direct = client
        .post(cluster.worker_url(0, "/api/users"))
        .body("{\"username\":\"ada\"}")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(direct.contains("body=some("), "got: {direct}");

    cluster.shutdown.trigger();
}

#[tokio::test]
async fn test_malformed_payload_is_dropped_and_worker_survives() {
    let cluster = start_cluster(29400, 2, tag_factory()).await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    // Feed worker 0 a payload that is not an envelope and not the restart
    // sentinel, over its parent link.
    let link = cluster.pool.slot(0).link().expect("worker 0 has no link");
    let (reply_tx, reply_rx) = oneshot::channel();
    link.frames
        .send(Frame::request("{not json".to_string(), reply_tx))
        .expect("parent link closed");

    // The worker logs and drops the frame; the reply channel dies with it,
    // which is what the dispatcher turns into a 502.
    assert!(reply_rx.await.is_err());

    // The worker itself keeps serving: the next dispatch lands on slot 0
    // (fresh cursor) and answers normally.
    let body = client
        .get(cluster.balancer_url("/api/users"))
        .send()
        .await
        .expect("balancer unreachable")
        .text()
        .await
        .unwrap();
    assert_eq!(instance_of(&body), 0);

    cluster.shutdown.trigger();
}

#[tokio::test]
async fn test_workers_answer_on_their_own_ports() {
    let cluster = start_cluster(29190, 2, tag_factory()).await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    for index in 0..2 {
        let body = client
            .get(cluster.worker_url(index, "/ping"))
            .timeout(Duration::from_secs(2))
            .send()
            .await
            .expect("worker port unreachable")
            .text()
            .await
            .unwrap();
        assert_eq!(instance_of(&body), index);
    }

    cluster.shutdown.trigger();
}
