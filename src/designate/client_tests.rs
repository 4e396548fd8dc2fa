// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `designate/client.rs`

#[cfg(test)]
mod tests {
    use crate::designate::client::{parse_domain_list, parse_server_list, DesignateClient};
    use crate::errors::{CommandError, DesignateError};
    use crate::testing::FakeRunner;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn client() -> (Arc<FakeRunner>, DesignateClient) {
        let runner = Arc::new(FakeRunner::new());
        let mut env = BTreeMap::new();
        env.insert("OS_USERNAME".to_string(), "designate".to_string());
        (runner.clone(), DesignateClient::new(runner, env))
    }

    #[test]
    fn test_parse_domain_list() {
        let domains = parse_domain_list(
            "0b8e0c04 nova.example.com. 1458000000\n\n5d3f1a2e neutron.example.com. 1458000001\n",
        )
        .unwrap();
        assert_eq!(domains.len(), 2);
        assert_eq!(domains[1].id, "5d3f1a2e");
        assert_eq!(domains[1].name, "neutron.example.com.");
        assert_eq!(domains[1].serial, "1458000001");
    }

    #[test]
    fn test_parse_listing_rejects_short_lines() {
        assert!(matches!(
            parse_domain_list("0b8e0c04 nova.example.com.\n"),
            Err(DesignateError::MalformedListing { .. })
        ));
        assert!(matches!(
            parse_server_list("only-an-id\n"),
            Err(DesignateError::MalformedListing { .. })
        ));
        assert!(parse_server_list("").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_domain_is_idempotent() {
        let (runner, client) = client();

        let first = client
            .create_domain("nova.example.com.", "admin@example.com")
            .await
            .unwrap();
        let second = client
            .create_domain("nova.example.com.", "admin@example.com")
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(runner.domain_names(), vec!["nova.example.com."]);
        assert_eq!(runner.count("designate domain-create"), 1);
    }

    #[tokio::test]
    async fn test_create_domain_skips_existing() {
        let (runner, client) = client();
        runner.add_domain("pre-existing", "nova.example.com.");

        let id = client
            .create_domain("nova.example.com.", "admin@example.com")
            .await
            .unwrap();

        assert_eq!(id, "pre-existing");
        assert_eq!(runner.count("designate domain-create"), 0);
    }

    #[tokio::test]
    async fn test_create_domain_verifies_result() {
        let (runner, client) = client();
        // The create call "succeeds" but nothing appears in the listing
        runner.respond("designate domain-create", "");

        let err = client
            .create_domain("nova.example.com.", "admin@example.com")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DesignateError::DomainNotCreated {
                domain: "nova.example.com.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_create_server_and_lookup() {
        let (runner, client) = client();

        let id = client.create_server("ns1.example.com.").await.unwrap();
        assert_eq!(
            client.server_id("ns1.example.com.").await.unwrap(),
            Some(id)
        );
        assert_eq!(runner.server_names(), vec!["ns1.example.com."]);
    }

    #[tokio::test]
    async fn test_delete_domain() {
        let (runner, client) = client();
        runner.add_domain("abc", "old.example.com.");

        assert!(client.delete_domain("old.example.com.").await.unwrap());
        assert!(!client.delete_domain("old.example.com.").await.unwrap());
        assert!(runner.domain_names().is_empty());
        assert_eq!(runner.count("designate domain-delete abc"), 1);
    }

    #[tokio::test]
    async fn test_client_passes_credentials_env() {
        let (runner, client) = client();
        client.list_domains().await.unwrap();

        let env = runner.last_designate_env().unwrap();
        assert_eq!(env.get("OS_USERNAME").map(String::as_str), Some("designate"));
    }

    #[tokio::test]
    async fn test_api_not_responding() {
        let (runner, client) = client();
        runner.fail(
            "designate server-list",
            CommandError::NonZeroExit {
                command: "designate server-list -f value".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "Unable to establish connection".to_string(),
            },
        );

        assert!(matches!(
            client.ensure_api_responding().await,
            Err(DesignateError::Command(_))
        ));
    }
}
