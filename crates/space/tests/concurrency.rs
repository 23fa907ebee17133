use registry::Registry;
use space::TupleSpace;
use tuple::{template, tuple, TypeTag};

// Two consumers racing over overlapping templates see any given tuple
// at most once.
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_removal_is_exclusive() {
    let ts = TupleSpace::detached(None, Registry::new());
    for i in 0..200_i64 {
        ts.put_p(tuple![i]).await;
    }

    let tp = template![formal TypeTag::Int];
    let mut claims = Vec::new();
    for _ in 0..4 {
        claims.push(tokio::spawn({
            let (ts, tp) = (ts.clone(), tp.clone());
            async move {
                let mut taken = Vec::new();
                while let Some(t) = ts.get_p(&tp).await {
                    taken.push(t);
                }
                taken
            }
        }));
    }

    let mut all = Vec::new();
    for claim in claims {
        all.extend(claim.await.unwrap());
    }

    assert_eq!(all.len(), 200);
    assert_eq!(ts.size().await, 0);

    // Every tuple was claimed by exactly one consumer.
    let mut seen: Vec<i64> = all
        .iter()
        .map(|t| match t.get(0) {
            Some(tuple::Value::Int(i)) => *i,
            other => panic!("unexpected field {other:?}"),
        })
        .collect();
    seen.sort();
    assert_eq!(seen, (0..200).collect::<Vec<_>>());
}

// Concurrent placements against a parked consumer deliver exactly one
// tuple to it; every other placement lands in the store.
#[tokio::test(flavor = "multi_thread")]
async fn one_delivery_per_waiter() {
    let ts = TupleSpace::detached(None, Registry::new());
    let tp = template![formal TypeTag::Int];

    let consumer = tokio::spawn({
        let (ts, tp) = (ts.clone(), tp.clone());
        async move { ts.get(tp).await }
    });
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;

    let mut placements = Vec::new();
    for i in 0..50_i64 {
        placements.push(tokio::spawn({
            let ts = ts.clone();
            async move { ts.put_p(tuple![i]).await }
        }));
    }
    for p in placements {
        p.await.unwrap();
    }

    let _ = consumer.await.unwrap();
    assert_eq!(ts.size().await, 49);
}

// A consumer which parks just as the producer places its tuple still
// observes it: the miss and the park are atomic against placement.
#[tokio::test(flavor = "multi_thread")]
async fn parking_never_loses_a_racing_placement() {
    for _ in 0..50 {
        let ts = TupleSpace::detached(None, Registry::new());
        let tp = template![formal TypeTag::Int];

        let producer = tokio::spawn({
            let ts = ts.clone();
            async move { ts.put_p(tuple![1_i64]).await }
        });
        let consumer = tokio::spawn({
            let (ts, tp) = (ts.clone(), tp.clone());
            async move { ts.get(tp).await }
        });

        producer.await.unwrap();
        assert_eq!(consumer.await.unwrap(), tuple![1_i64]);
        assert_eq!(ts.size().await, 0);
    }
}

// Size snapshots taken while readers and writers race stay within the
// bounds placed by the operations themselves.
#[tokio::test(flavor = "multi_thread")]
async fn size_is_never_negative_and_settles() {
    let ts = TupleSpace::detached(None, Registry::new());
    let tp = template![formal TypeTag::Int];

    let writer = tokio::spawn({
        let ts = ts.clone();
        async move {
            for i in 0..100_i64 {
                ts.put_p(tuple![i]).await;
            }
        }
    });
    let reader = tokio::spawn({
        let (ts, tp) = (ts.clone(), tp.clone());
        async move {
            let mut removed = 0;
            for _ in 0..100 {
                if ts.get_p(&tp).await.is_some() {
                    removed += 1;
                }
            }
            removed
        }
    });

    writer.await.unwrap();
    let removed = reader.await.unwrap();
    assert_eq!(ts.size().await, 100 - removed);
}
