// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `status.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::relations::RelationDescriptor;
    use crate::testing::{complete_relations, shared_db_relation, unit_data};

    fn flags(names: &[&str]) -> FlagStore {
        let mut store = FlagStore::in_memory();
        for name in names {
            store.set(name).unwrap();
        }
        store
    }

    #[test]
    fn missing_relations_block() {
        let status = compute_status(&CharmConfig::default(), &Relations::new(), &flags(&[]));
        assert_eq!(status.status, WorkloadStatus::Blocked);
        assert_eq!(
            status.message,
            "Missing relations: shared-db, amqp, identity-service, dns-backend"
        );
    }

    #[test]
    fn malformed_dns_slaves_block() {
        let config = CharmConfig {
            dns_slaves: "10.0.0.50:53".to_string(),
            ..CharmConfig::default()
        };
        let status = compute_status(&config, &complete_relations(), &flags(&[INSTALLED]));
        assert_eq!(status.status, WorkloadStatus::Blocked);
        assert!(status.message.starts_with("Invalid configuration"));
    }

    #[test]
    fn incomplete_relations_wait() {
        let relations = complete_relations()
            .with(shared_db_relation(false))
            .with(RelationDescriptor::new("amqp").with_unit("rabbitmq-server/0", unit_data(&[])));
        let status = compute_status(&CharmConfig::default(), &relations, &flags(&[INSTALLED]));
        assert_eq!(status.status, WorkloadStatus::Waiting);
        assert_eq!(status.message, "Incomplete relations: shared-db, amqp");
    }

    #[test]
    fn milestones_then_active() {
        let relations = complete_relations();
        let config = CharmConfig::default();

        let status = compute_status(&config, &relations, &flags(&[INSTALLED]));
        assert_eq!(status.message, "Waiting for database migration");

        let status = compute_status(&config, &relations, &flags(&[INSTALLED, DB_SYNCHED]));
        assert_eq!(status.message, "Waiting for initial domains");

        let all = flags(&[INSTALLED, DB_SYNCHED, DOMAINS_CREATED]);
        assert_eq!(
            compute_status(&config, &relations, &all).status,
            WorkloadStatus::Active
        );
    }
}
