// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `service.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::errors::CommandError;
    use crate::testing::FakeRunner;
    use std::sync::Arc;

    fn context(runner: &Arc<FakeRunner>) -> HookContext {
        HookContext::builder(Arc::clone(runner) as Arc<dyn crate::command::CommandRunner>)
            .build()
            .unwrap()
    }

    fn timeout() -> CommandError {
        CommandError::Timeout {
            command: "service designate-api restart".to_string(),
            timeout_secs: 120,
        }
    }

    #[tokio::test]
    async fn timeout_defers_remaining_work() {
        let runner = Arc::new(FakeRunner::new());
        runner.fail_once("service designate-api", timeout());
        let mut ctx = context(&runner);

        let completed = restart_services(&mut ctx, &["designate-central", "designate-api"])
            .await
            .unwrap();

        assert!(!completed);
        assert!(ctx.flags.is_set(RESTART_PENDING));
        assert_eq!(runner.count("service "), 2);
    }

    #[tokio::test]
    async fn hard_failure_is_an_error_and_stays_pending() {
        let runner = Arc::new(FakeRunner::new());
        runner.fail(
            "service designate-api",
            CommandError::NonZeroExit {
                command: "service designate-api restart".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "unknown service".to_string(),
            },
        );
        let mut ctx = context(&runner);

        assert!(restart_services(&mut ctx, &["designate-api"]).await.is_err());
        assert!(ctx.flags.is_set(RESTART_PENDING));
    }

    #[tokio::test]
    async fn retry_clears_flag_on_success() {
        let runner = Arc::new(FakeRunner::new());
        let mut ctx = context(&runner);
        ctx.flags.set(RESTART_PENDING).unwrap();

        RetryRestarts.run(&mut ctx).await.unwrap();

        assert!(!ctx.flags.is_set(RESTART_PENDING));
        assert_eq!(runner.count("service "), ctx.release.services.len());
    }

    #[tokio::test]
    async fn retry_includes_haproxy_when_clustered() {
        let runner = Arc::new(FakeRunner::new());
        let mut ctx = HookContext::builder(Arc::clone(&runner) as Arc<dyn crate::command::CommandRunner>)
            .relations(crate::relations::Relations::new().with(
                crate::relations::RelationDescriptor::new(crate::states::CLUSTER).with_unit(
                    "designate/1",
                    crate::testing::unit_data(&[("private-address", "10.0.0.6")]),
                ),
            ))
            .build()
            .unwrap();
        ctx.flags.set(RESTART_PENDING).unwrap();

        assert_eq!(unit_services(&ctx).last(), Some(&"haproxy"));
        RetryRestarts.run(&mut ctx).await.unwrap();

        assert_eq!(runner.count("service haproxy restart"), 1);
        assert_eq!(runner.count("service apache2"), 0);
        assert!(!ctx.flags.is_set(RESTART_PENDING));
    }
}
