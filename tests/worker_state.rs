//! Workers own independent handler state.

mod common;

use common::{counter_factory, start_cluster};

#[tokio::test]
async fn test_worker_stores_diverge() {
    let cluster = start_cluster(29300, 2, counter_factory()).await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    // Two mutations round-robined onto two different workers.
    for _ in 0..2 {
        let body = client
            .post(cluster.balancer_url("/counter"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        // Each worker sees its own first write, not a shared second one.
        assert_eq!(body, "1");
    }

    // Each worker's private store reflects only its own mutation.
    for index in 0..2 {
        let body = client
            .get(cluster.worker_url(index, "/counter"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "1", "worker {index} leaked state");
    }

    cluster.shutdown.trigger();
}
