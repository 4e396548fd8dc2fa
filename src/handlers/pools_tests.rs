// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `pools.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::context::CharmPaths;
    use crate::errors::CommandError;
    use crate::hashing::hash_bytes;
    use crate::leadership::MemoryLeaderStore;
    use crate::testing::FakeRunner;
    use std::path::Path;
    use std::sync::Arc;

    fn context(root: &Path, runner: &Arc<FakeRunner>, leader: &MemoryLeaderStore) -> HookContext {
        HookContext::builder(Arc::clone(runner) as Arc<dyn crate::command::CommandRunner>)
            .leader(Arc::new(leader.clone()))
            .paths(CharmPaths::new(root))
            .build()
            .unwrap()
    }

    fn write_pools(ctx: &HookContext, content: &str) {
        crate::io::atomic_write(&ctx.paths.pools_yaml(), content.as_bytes(), 0o644).unwrap();
    }

    #[tokio::test]
    async fn updates_once_per_content() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new());
        let leader = MemoryLeaderStore::leader();
        let mut ctx = context(dir.path(), &runner, &leader);

        write_pools(&ctx, "- name: default\n");
        UpdatePools.run(&mut ctx).await.unwrap();
        UpdatePools.run(&mut ctx).await.unwrap();
        assert_eq!(runner.count("designate-manage pool update"), 1);
        assert_eq!(
            leader.snapshot().get(LEADER_POOL_YAML_HASH),
            Some(&hash_bytes(b"- name: default\n"))
        );

        write_pools(&ctx, "- name: default\n  description: changed\n");
        UpdatePools.run(&mut ctx).await.unwrap();
        assert_eq!(runner.count("designate-manage pool update"), 2);
    }

    #[tokio::test]
    async fn skips_missing_file_and_followers() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new());
        let leader = MemoryLeaderStore::leader();

        let mut ctx = context(dir.path(), &runner, &leader);
        UpdatePools.run(&mut ctx).await.unwrap();

        let mut follower = context(dir.path(), &runner, &leader.follower_view());
        write_pools(&follower, "- name: default\n");
        UpdatePools.run(&mut follower).await.unwrap();

        assert_eq!(runner.count("designate-manage"), 0);
        assert!(leader.snapshot().is_empty());
    }

    #[tokio::test]
    async fn failed_update_leaves_hash_unrecorded() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeRunner::new());
        runner.fail_once(
            "designate-manage pool update",
            CommandError::NonZeroExit {
                command: "designate-manage pool update".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "pool manager unavailable".to_string(),
            },
        );
        let leader = MemoryLeaderStore::leader();
        let mut ctx = context(dir.path(), &runner, &leader);
        write_pools(&ctx, "- name: default\n");

        assert!(UpdatePools.run(&mut ctx).await.is_err());
        assert!(leader.snapshot().is_empty());

        UpdatePools.run(&mut ctx).await.unwrap();
        assert!(leader.snapshot().contains_key(LEADER_POOL_YAML_HASH));
    }
}
