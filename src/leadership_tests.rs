// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `leadership.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::testing::FakeRunner;

    #[tokio::test]
    async fn follower_cannot_set() {
        let store = MemoryLeaderStore::follower();
        let err = store.set_one("domain-init-done", "abc").await.unwrap_err();
        assert_eq!(
            err,
            LeaderError::NotLeader {
                key: "domain-init-done".to_string()
            }
        );
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn follower_view_reads_leader_writes() {
        let leader = MemoryLeaderStore::leader();
        let follower = leader.follower_view();

        leader.set_one("db-sync-done", "true").await.unwrap();

        assert_eq!(
            follower.get("db-sync-done").await.unwrap().as_deref(),
            Some("true")
        );
        assert!(!follower.is_leader().await.unwrap());
        assert!(follower.set_one("db-sync-done", "x").await.is_err());
    }

    #[tokio::test]
    async fn empty_value_reads_as_unset() {
        let store = MemoryLeaderStore::leader();
        store.seed("pool-yaml-hash", "");
        assert_eq!(store.get("pool-yaml-hash").await.unwrap(), None);
    }

    #[tokio::test]
    async fn juju_store_checks_leadership_before_writing() {
        let runner = Arc::new(FakeRunner::new());
        runner.respond("is-leader", "false\n");
        let store = JujuLeaderStore::new(runner.clone());

        let err = store.set_one("pool-yaml-hash", "abc").await.unwrap_err();
        assert!(matches!(err, LeaderError::NotLeader { .. }));
        assert_eq!(runner.count("leader-set"), 0);
    }

    #[tokio::test]
    async fn juju_store_writes_as_leader() {
        let runner = Arc::new(FakeRunner::new());
        runner.respond("is-leader", "true\n");
        runner.respond("leader-get", r#"{"db-sync-done": "true"}"#);
        let store = JujuLeaderStore::new(runner.clone());

        store.set_one("pool-yaml-hash", "abc").await.unwrap();
        assert_eq!(runner.count("leader-set pool-yaml-hash=abc"), 1);
        assert_eq!(
            store.get("db-sync-done").await.unwrap().as_deref(),
            Some("true")
        );
    }
}
