use dealer_registry::{Asset, Error, LedgerStore, Registry};

pub mod test_postgres;

/// Enough keys to span several scan pages.
pub const BULK_DEALERS: usize = 250;

pub fn dealer_id(n: usize) -> String {
    format!("DEALER{:04}", n)
}

pub async fn collect_keys(store: &dyn LedgerStore, start: &str, end: &str) -> Vec<String> {
    let mut cursor = store.scan(start, end).await.unwrap();
    let mut keys = Vec::new();
    while let Some(kv) = cursor.next().await.unwrap() {
        keys.push(kv.key);
    }
    cursor.close().await.unwrap();
    keys
}

/// Raw get/put/delete semantics every ledger store must share.
pub async fn check_store_primitives(store: &dyn LedgerStore) {
    assert_eq!(store.get("missing").await.unwrap(), None);

    store.put("k", b"first".to_vec()).await.unwrap();
    store.put("k", b"second".to_vec()).await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), Some(b"second".to_vec()));

    store.put("empty", Vec::new()).await.unwrap();
    assert_eq!(store.get("empty").await.unwrap(), Some(Vec::new()));

    store.delete("k").await.unwrap();
    store.delete("empty").await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), None);

    // Deleting an absent key is not an error at the store level.
    store.delete("k").await.unwrap();
}

/// Range scans across page boundaries.
pub async fn check_store_scan(store: &dyn LedgerStore) {
    // Insert in reverse so the store, not insertion order, decides the order.
    for n in (0..BULK_DEALERS).rev() {
        store.put(&dealer_id(n), vec![n as u8]).await.unwrap();
    }

    let expected: Vec<String> = (0..BULK_DEALERS).map(dealer_id).collect();
    assert_eq!(collect_keys(store, "", "").await, expected);

    let bounded = collect_keys(store, &dealer_id(95), &dealer_id(205)).await;
    assert_eq!(bounded, expected[95..205].to_vec());

    assert_eq!(collect_keys(store, &dealer_id(240), "").await, expected[240..].to_vec());
    assert!(collect_keys(store, "ZZZ", "").await.is_empty());

    // Closing early is fine.
    let mut cursor = store.scan("", "").await.unwrap();
    assert_eq!(cursor.next().await.unwrap().map(|kv| kv.key), Some(dealer_id(0)));
    cursor.close().await.unwrap();
}

/// Registry behaviour end to end.
pub async fn check_registry_lifecycle(registry: &Registry) {
    registry.init_ledger().await.unwrap();

    let dealer002 = registry.read_asset("DEALER002").await.unwrap();
    assert_eq!(dealer002.msisdn, "0987654321");
    assert_eq!(dealer002.mpin, "5678");
    assert_eq!(dealer002.balance, 15000);
    assert_eq!(dealer002.status, "Active");
    assert_eq!(dealer002.trans_amount, 2000);
    assert_eq!(dealer002.trans_type, "Debit");
    assert_eq!(dealer002.remarks, "Payment for stock");

    assert_eq!(registry.transfer_asset("DEALER001", 9000).await.unwrap(), "10000");
    assert_eq!(registry.read_asset("DEALER001").await.unwrap().balance, 9000);

    registry
        .create_asset("DEALER006", "1617", "4455667788", "Active", 0, 0, "Credit", "")
        .await
        .unwrap();
    assert!(matches!(
        registry
            .create_asset("DEALER006", "1617", "4455667788", "Active", 0, 0, "Credit", "")
            .await,
        Err(Error::AlreadyExists(_))
    ));

    registry
        .update_asset("DEALER006", "1", "Inactive", -40, "2", 3, "Debit", "frozen")
        .await
        .unwrap();
    assert_eq!(
        registry.read_asset("DEALER006").await.unwrap(),
        Asset {
            balance: -40,
            dealer_id: "DEALER006".to_string(),
            mpin: "2".to_string(),
            msisdn: "1".to_string(),
            remarks: "frozen".to_string(),
            status: "Inactive".to_string(),
            trans_amount: 3,
            trans_type: "Debit".to_string(),
        }
    );

    registry.delete_asset("DEALER005").await.unwrap();
    assert!(!registry.asset_exists("DEALER005").await.unwrap());
    assert!(matches!(
        registry.read_asset("DEALER005").await,
        Err(Error::NotFound(_))
    ));

    let ids: Vec<String> = registry
        .get_all_assets()
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.dealer_id)
        .collect();
    assert_eq!(
        ids,
        vec!["DEALER001", "DEALER002", "DEALER003", "DEALER004", "DEALER006"]
    );
}

/// `get_all_assets` over more records than one scan page holds.
pub async fn check_registry_bulk_enumeration(registry: &Registry) {
    for n in 0..BULK_DEALERS {
        registry
            .create_asset(&dealer_id(n), "0000", "0700", "Active", n as i64, 0, "Credit", "")
            .await
            .unwrap();
    }

    let assets = registry.get_all_assets().await.unwrap();
    assert_eq!(assets.len(), BULK_DEALERS);
    for (n, asset) in assets.iter().enumerate() {
        assert_eq!(asset.dealer_id, dealer_id(n));
        assert_eq!(asset.balance, n as i64);
    }
}

/// A corrupt value stops enumeration with the offending key.
pub async fn check_registry_corrupt_entry(registry: &Registry) {
    registry.init_ledger().await.unwrap();
    registry
        .store()
        .put("DEALER004", b"[1,2,3]".to_vec())
        .await
        .unwrap();

    match registry.get_all_assets().await {
        Err(Error::Decode { key, .. }) => assert_eq!(key, "DEALER004"),
        other => panic!("expected decode error, got {:?}", other),
    }
}
